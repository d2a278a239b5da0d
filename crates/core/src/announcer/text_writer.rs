use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::Mutex;

use super::{AnnouncementKind, Announcer};

const HEADING_WIDTH: usize = 75;

/// Announcer writing plain text to any `Write` sink.
///
/// SQL and elapsed-time messages are only written when enabled.
pub struct TextWriterAnnouncer<W: Write + Send> {
    writer: Mutex<W>,
    show_sql: bool,
    show_elapsed_time: bool,
}

impl<W: Write + Send> TextWriterAnnouncer<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
            show_sql: false,
            show_elapsed_time: false,
        }
    }

    pub fn with_show_sql(mut self, show_sql: bool) -> Self {
        self.show_sql = show_sql;
        self
    }

    pub fn with_show_elapsed_time(mut self, show_elapsed_time: bool) -> Self {
        self.show_elapsed_time = show_elapsed_time;
        self
    }

    /// Flush buffered output
    pub fn flush(&self) -> io::Result<()> {
        self.lock().flush()
    }

    /// Take back the underlying writer
    pub fn into_inner(self) -> W {
        self.writer
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, W> {
        self.writer
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn format(&self, kind: AnnouncementKind, message: &str) -> Option<String> {
        match kind {
            AnnouncementKind::Heading => {
                let pad = HEADING_WIDTH.saturating_sub(message.len() + 1);
                Some(format!("{} {}", message, "=".repeat(pad)))
            }
            AnnouncementKind::Say => Some(format!("-- {}", message)),
            AnnouncementKind::Sql if self.show_sql => Some(message.to_string()),
            AnnouncementKind::ElapsedTime if self.show_elapsed_time => {
                Some(message.to_string())
            }
            AnnouncementKind::Error => Some(format!("!!! {}", message)),
            _ => None,
        }
    }
}

impl TextWriterAnnouncer<io::Stdout> {
    /// Console announcer
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl TextWriterAnnouncer<BufWriter<File>> {
    /// File-backed announcer; the file is closed when the announcer is dropped
    pub fn create_file(path: &Path) -> io::Result<Self> {
        let file = File::create(path)?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write + Send> Announcer for TextWriterAnnouncer<W> {
    fn write(&self, kind: AnnouncementKind, message: &str) -> io::Result<()> {
        match self.format(kind, message) {
            Some(line) => writeln!(self.lock(), "{}", line),
            None => Ok(()),
        }
    }
}
