//! Invocation orchestration: connection resolution, task dispatch and the
//! executor tying the stages together.

pub mod connection;
pub mod dispatch;
pub mod executor;

pub use connection::ConnectionResolver;
pub use dispatch::{dispatch, Command};
pub use executor::{mask_password, EngineBuilder, TaskExecutor};
