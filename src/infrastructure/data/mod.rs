//! Data-access infrastructure - accessor implementations

mod in_memory;
mod postgres;

pub use in_memory::MemoryAccessor;
pub use postgres::{PostgresAccessor, PostgresConfig};
