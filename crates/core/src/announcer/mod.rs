//! Announcers
//!
//! Human-readable progress and SQL-trace output of a migration run. Output
//! that is meant for the operator goes through an [`Announcer`]; diagnostics
//! for developers go through `tracing`.

pub mod composite;
pub mod text_writer;

pub use composite::CompositeAnnouncer;
pub use text_writer::TextWriterAnnouncer;

use std::io;
use std::time::Duration;

/// Kind of message being announced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnouncementKind {
    Heading,
    Say,
    Sql,
    ElapsedTime,
    Error,
}

/// Output sink for progress and SQL-trace messages
pub trait Announcer: Send + Sync {
    /// Write a single message to the sink
    fn write(&self, kind: AnnouncementKind, message: &str) -> io::Result<()>;

    fn heading(&self, message: &str) {
        self.deliver(AnnouncementKind::Heading, message);
    }

    fn say(&self, message: &str) {
        self.deliver(AnnouncementKind::Say, message);
    }

    fn sql(&self, sql: &str) {
        self.deliver(AnnouncementKind::Sql, sql);
    }

    fn elapsed_time(&self, elapsed: Duration) {
        self.deliver(
            AnnouncementKind::ElapsedTime,
            &format!("=> {:.4}s", elapsed.as_secs_f64()),
        );
    }

    fn error(&self, message: &str) {
        self.deliver(AnnouncementKind::Error, message);
    }

    /// Write and swallow I/O failures; announcing never aborts a migration
    fn deliver(&self, kind: AnnouncementKind, message: &str) {
        if let Err(e) = self.write(kind, message) {
            tracing::warn!(error = %e, ?kind, "Failed to write announcement");
        }
    }
}

/// Announcer that drops everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullAnnouncer;

impl Announcer for NullAnnouncer {
    fn write(&self, _kind: AnnouncementKind, _message: &str) -> io::Result<()> {
        Ok(())
    }
}
