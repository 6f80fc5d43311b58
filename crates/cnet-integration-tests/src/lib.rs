//! Integration test crate for the Contract Net workspace.
//!
//! All tests live under `tests/`; this library is intentionally empty.

#![forbid(unsafe_code)]
