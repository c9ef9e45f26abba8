//! CLI commands implementation

pub mod get;
pub mod index;
pub mod init;
pub mod intent;
pub mod search;
pub mod status;
pub mod store;

pub use get::*;
pub use index::*;
pub use init::*;
pub use intent::*;
pub use search::*;
pub use status::*;
pub use store::*;
