//! Core traits for the sidecar
//!
//! This module defines the abstract interfaces that all implementations must follow.
//!
//! - [`AddressSource`]: Determine the address to publish
//! - [`DirectoryService`]: Submit record changes and query their propagation

pub mod address_source;
pub mod directory;

pub use address_source::{AddressSource, AddressSourceFactory};
pub use directory::DirectoryService;
