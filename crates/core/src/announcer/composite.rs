use std::io;
use std::sync::Arc;

use super::{AnnouncementKind, Announcer};

/// Broadcasts every message to an ordered list of sinks.
///
/// A failing sink does not stop delivery to the others. `write` only
/// reports an error when every sink failed.
#[derive(Default, Clone)]
pub struct CompositeAnnouncer {
    sinks: Vec<Arc<dyn Announcer>>,
}

impl CompositeAnnouncer {
    pub fn new() -> Self {
        Self { sinks: Vec::new() }
    }

    pub fn add_sink(mut self, sink: Arc<dyn Announcer>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl Announcer for CompositeAnnouncer {
    fn write(&self, kind: AnnouncementKind, message: &str) -> io::Result<()> {
        let mut first_error = None;
        let mut failures = 0;

        for (index, sink) in self.sinks.iter().enumerate() {
            if let Err(e) = sink.write(kind, message) {
                tracing::warn!(sink = index, error = %e, "Announcement sink failed");
                failures += 1;
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) if failures == self.sinks.len() => Err(e),
            _ => Ok(()),
        }
    }
}
