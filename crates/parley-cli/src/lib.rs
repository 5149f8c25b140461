//! Parley command-line support
//!
//! Fixture loading and one-shot resolution used by the `parley` binary.

pub mod fixture;
pub mod resolve;
pub mod version;

pub use fixture::Fixture;
pub use resolve::{resolve, ResolveArgs};
