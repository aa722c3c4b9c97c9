// # sidecar-core
//
// Core library for the Route 53 sidecar.
//
// ## Architecture Overview
//
// The sidecar binds a host's address to a DNS name for as long as the host
// is in service. This library holds everything that coordinates that:
// - **AddressSource**: Trait for determining the address to publish
// - **DirectoryService**: Trait for submitting record changes and polling them
// - **PropagationWaiter**: Polls a change until it is in sync, with a bounded
//   budget for failed queries
// - **LifecycleManager**: Publish → wait for shutdown → retract → drain TTL
// - **ShutdownTrigger**: Turns termination signals into one cancellation
//
// ## Design Principles
//
// 1. **Library-First**: The binary only parses options, resolves the address
//    and calls [`LifecycleManager::run`]
// 2. **Stateless**: Nothing persists between runs; the provider is the source
//    of truth for whether the record exists
// 3. **Teardown Wins**: Once shutdown starts, retraction runs to completion on
//    its own cancellation token

pub mod config;
pub mod directory;
pub mod error;
pub mod lifecycle;
pub mod propagation;
pub mod record;
pub mod shutdown;
pub mod traits;

// Re-export core types for convenience
pub use config::{AddressSourceConfig, PropagationConfig, RunMode, SidecarConfig};
pub use directory::MemoryDirectory;
pub use error::{Error, Result};
pub use lifecycle::{LifecycleManager, LifecyclePhase, PublishOutcome};
pub use propagation::{PollPolicy, PropagationWaiter, WaitOutcome};
pub use record::{ChangeAction, ChangeHandle, ChangeRequest, PropagationStatus, RecordSpec};
pub use shutdown::ShutdownTrigger;
pub use traits::{AddressSource, DirectoryService};
