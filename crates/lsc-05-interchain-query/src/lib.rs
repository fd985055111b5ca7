//! # Interchain Queries
//!
//! Outstanding proof-backed reads of host-chain state. A submitter registers
//! `(chain_id, connection_id, query_type, request_data)` with a callback id
//! and a TTL; the relayer's verified response is accepted while the TTL
//! holds, and the callback id selects the handler on the orchestrator side.

#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod domain;
pub mod error;
pub mod keeper;

pub use domain::{query_id, Query, QueryRequest, BANK_STORE_QUERY, STAKING_STORE_QUERY};
pub use error::{QueryError, QueryResult};
pub use keeper::{accept_response, all_queries, get_query, prune_expired, submit_query};
