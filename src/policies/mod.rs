//! Runner policies.
//!
//! ## Contents
//! - [`FailurePolicy`] what happens to sibling tasks when one task fails
//!
//! ## Defaults
//! - `FailurePolicy::Continue`: siblings keep running until they finish on their own
//!   or the caller cancels the shared token.

mod failure;

pub use failure::FailurePolicy;
