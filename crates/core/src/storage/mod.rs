//! Storage - repository trait implementations.

mod memory;

pub use memory::MemoryLedgerStore;
