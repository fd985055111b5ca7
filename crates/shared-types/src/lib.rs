//! # Shared Types Crate
//!
//! Types every subsystem of the coordinator agrees on.
//!
//! ## Design Principles
//!
//! - **One numeric model**: token amounts are [`Int`] (128-bit unsigned),
//!   rates are [`Dec`] (18 fractional digits). All divisions floor; every
//!   multiplication by a rate happens before truncation.
//! - **One event catalogue**: ledgers and the orchestrator emit
//!   [`StakeEvent`]s into the block context; the runtime forwards them to the
//!   shared bus after commit.

pub mod entities;
pub mod errors;
pub mod events;
pub mod math;

pub use entities::*;
pub use errors::*;
pub use events::*;
pub use math::{Dec, Int};
