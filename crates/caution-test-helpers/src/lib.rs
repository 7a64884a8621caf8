//! Shared test utilities for the caution engine crates.
//!
//! - [`mod@must`]: unwrap helpers that report the caller's location
//! - [`assertions`]: assertion macros for detector output
//! - [`fixtures`]: driver snapshot and field builders
//! - [`prelude`]: convenience re-exports
//!
//! ```rust,ignore
//! use caution_test_helpers::prelude::*;
//! ```

#![deny(unsafe_op_in_unsafe_fn)]
#![allow(clippy::unwrap_used, clippy::panic)]

pub mod assertions;
pub mod fixtures;
pub mod must;
pub mod prelude;

pub use must::*;
