//! Test utilities.
//!
//! This module provides:
//! - Test data factories with closure overrides
//! - `InMemoryPersistence`, one store implementing every repository trait
//! - `InMemoryCacheStore` with an "unreachable" switch
//! - `TestAppStateBuilder` for route tests

mod app_state_builder;
mod cache_mocks;
mod factories;
mod in_memory;

pub use app_state_builder::*;
pub use cache_mocks::*;
pub use factories::*;
pub use in_memory::*;
