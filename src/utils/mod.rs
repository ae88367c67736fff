//! Utility modules: rounding, field resolution, and in-memory
//! implementations of the storage traits

pub mod memory;
pub mod resolve;
pub mod rounding;

pub use memory::{MemoryCatalog, MemoryProvider, MemorySubmissionStore};
pub use rounding::{round1, round2, round_money};
