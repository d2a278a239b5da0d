//! Configuration model and announcers shared by the migrun crates.

pub mod announcer;
pub mod config;

pub use announcer::{
    AnnouncementKind, Announcer, CompositeAnnouncer, NullAnnouncer, TextWriterAnnouncer,
};
pub use config::validation::ConfigError;
pub use config::{
    ConnectionEntry, ConnectionResolution, ConnectionSource, ConnectionsFile, ResolvedConfig,
    RunnerContext, DEFAULT_TIMEOUT_SECS, MAX_TIMEOUT_SECS,
};
