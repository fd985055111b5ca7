//! # Query Ledger
//!
//! Rows keyed `Query/<id>`. A query leaves the ledger when a response is
//! accepted or when it is pruned after its TTL.

use crate::domain::{query_id, Query, QueryRequest};
use crate::error::{QueryError, QueryResult};
use lsc_ledger_store::{key, prefix, BlockContext, KvRead, Store};
use shared_types::StakeEvent;
use tracing::{debug, warn};

fn query_key(id: &str) -> Vec<u8> {
    key(prefix::QUERY, id.as_bytes())
}

pub fn get_query(store: &impl KvRead, id: &str) -> QueryResult<Option<Query>> {
    Ok(store.get_value(&query_key(id))?)
}

pub fn set_query(store: &mut Store, query: &Query) -> QueryResult<()> {
    Ok(store.set_value(query_key(&query.id), query)?)
}

pub fn remove_query(store: &mut Store, id: &str) -> QueryResult<()> {
    Ok(store.delete(&query_key(id))?)
}

pub fn all_queries(store: &impl KvRead) -> QueryResult<Vec<Query>> {
    Ok(store
        .values_with_prefix::<Query>(prefix::QUERY.as_bytes())?
        .into_iter()
        .map(|(_, query)| query)
        .collect())
}

/// Registers a query for the relayer to answer.
pub fn submit_query(ctx: &mut BlockContext<'_>, request: QueryRequest) -> QueryResult<Query> {
    if request.connection_id.is_empty() {
        return Err(QueryError::InvalidRequest(format!(
            "no connection for {}",
            request.chain_id
        )));
    }
    if request.timeout_nanos == 0 {
        return Err(QueryError::InvalidRequest("zero timeout".to_string()));
    }

    let query = Query {
        id: query_id(&request, ctx.height()),
        ttl: ctx.block_time_nanos().saturating_add(request.timeout_nanos),
        submission_height: ctx.height(),
        chain_id: request.chain_id,
        connection_id: request.connection_id,
        query_type: request.query_type,
        request_data: request.request_data,
        callback_id: request.callback_id,
        callback_data: request.callback_data,
    };
    set_query(ctx.store_mut(), &query)?;

    debug!(query_id = %query.id, callback_id = %query.callback_id, "Interchain query submitted");
    ctx.emit(StakeEvent::QuerySubmitted {
        chain_id: query.chain_id.clone(),
        query_id: query.id.clone(),
        callback_id: query.callback_id.clone(),
    });
    Ok(query)
}

/// Accepts a response: the query must exist and be within its TTL.
/// The row is removed and returned for the handler.
pub fn accept_response(ctx: &mut BlockContext<'_>, id: &str) -> QueryResult<Query> {
    let query = get_query(ctx.store(), id)?.ok_or_else(|| QueryError::NotFound(id.to_string()))?;
    let now = ctx.block_time_nanos();
    if query.is_expired(now) {
        return Err(QueryError::Expired {
            query_id: query.id,
            ttl: query.ttl,
            now,
        });
    }
    remove_query(ctx.store_mut(), id)?;
    ctx.emit(StakeEvent::QueryResolved {
        chain_id: query.chain_id.clone(),
        query_id: query.id.clone(),
        callback_id: query.callback_id.clone(),
    });
    Ok(query)
}

/// Removes every query whose TTL has passed and returns them.
pub fn prune_expired(ctx: &mut BlockContext<'_>) -> QueryResult<Vec<Query>> {
    let now = ctx.block_time_nanos();
    let expired: Vec<Query> = all_queries(ctx.store())?
        .into_iter()
        .filter(|query| query.is_expired(now))
        .collect();

    for query in &expired {
        remove_query(ctx.store_mut(), &query.id)?;
        warn!(query_id = %query.id, chain_id = %query.chain_id, "Interchain query expired");
        ctx.emit(StakeEvent::QueryExpired {
            chain_id: query.chain_id.clone(),
            query_id: query.id.clone(),
            callback_id: query.callback_id.clone(),
        });
    }
    Ok(expired)
}
