//! Directory service implementations shipped with the core
//!
//! - [`MemoryDirectory`]: In-memory directory with scriptable failures

pub mod memory;

pub use memory::MemoryDirectory;
