mod models;
mod queries;
mod sqlite;

pub use models::FileRecord;
pub use sqlite::Index;

/// Config key holding the bitmask of the last successful run.
pub const CONFIG_HASH_COMPONENTS: &str = "hash_components";
