pub mod config;
pub mod core;
pub mod storage;

// Re-export commonly used items for convenience
pub use config::T2SConfig;
pub use self::core::*;
pub use storage::{CloudStorage, ObjectStorage, StorageLocation};
