//! Collaborator interfaces of the console core.
//!
//! The remote task manager is reached only through the traits in this crate.
//! An in-memory implementation, loadable from a JSON fixture, stands in for
//! the remote service in tests and in the terminal driver.

#![warn(missing_docs)]

pub mod trait_;
pub mod bus;
pub mod memory;
pub mod fixture;

pub use trait_::{HierarchyProvider, TaskProvider, ProviderError, Result};
pub use bus::{EventBus, Subscription};
pub use memory::{MemoryProvider, ListCall};
pub use fixture::{Fixture, FixtureError};
