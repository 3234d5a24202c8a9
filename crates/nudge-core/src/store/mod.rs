//! Rule store implementations.

mod memory;
mod sqlite;

pub use memory::InMemoryRuleStore;
pub use sqlite::SqliteRuleStore;
