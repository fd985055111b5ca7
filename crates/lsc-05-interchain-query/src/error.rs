use lsc_ledger_store::StoreError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// Underlying store failure.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// No outstanding query with this id.
    #[error("Query {0} not found")]
    NotFound(String),

    /// The query's TTL passed before the response arrived.
    #[error("Query {query_id} expired at {ttl}, response at {now}")]
    Expired { query_id: String, ttl: u64, now: u64 },

    /// Request rejected before registration.
    #[error("Invalid query request: {0}")]
    InvalidRequest(String),
}

pub type QueryResult<T> = Result<T, QueryError>;
