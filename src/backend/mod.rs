pub mod client;
pub mod memory;
pub mod realtime;
pub mod storage;

pub use client::{DataSource, DbPath, ObjectStore, StoredObject};
pub use memory::{MemoryDataSource, MemoryObjectStore};
pub use realtime::RealtimeDbClient;
pub use storage::StorageClient;

#[cfg(test)]
pub use client::MockDataSource;
