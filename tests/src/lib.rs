//! # Liquid Staking Coordinator Test Suite
//!
//! End-to-end tests running the node runtime against a simulated host.
//!
//! ## Structure
//!
//! - `harness/` - host simulator, relayer, invariant checks, test network
//! - `integration/` - multi-epoch scenarios across the whole pipeline
//!
//! ## Running
//!
//! ```bash
//! cargo test -p lsc-tests
//! cargo test -p lsc-tests integration::scenarios
//! ```

#![allow(clippy::unwrap_used, clippy::expect_used)]

pub mod harness;
pub mod integration;
