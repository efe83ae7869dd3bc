pub mod memory;
pub mod sqlite;

pub use memory::MemoryContentStore;
pub use sqlite::SqliteContentStore;
