//! Infrastructure layer: storage backends behind the auth and directory traits.

pub mod directory;
pub mod store;

pub use directory::{MessageBoard, NewMessage, Store, UserDirectory};
pub use store::InMemoryStore;
#[cfg(feature = "postgres")]
pub use store::PostgresStore;
