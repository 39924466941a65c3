pub mod keys;
pub mod observer;
pub mod persisted;
pub mod storage;

pub use observer::{flush, spawn_writer, PersistenceObserver};
pub use persisted::{load, save, Persisted};
pub use storage::{load_json, save_json, FileStorage, MemoryStorage, StorageBackend};
