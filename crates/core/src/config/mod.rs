pub mod connections;
pub mod context;
pub mod resolved;
pub mod sources;
pub mod validation;

pub use connections::*;
pub use context::*;
pub use resolved::*;
pub use sources::*;
pub use validation::*;
