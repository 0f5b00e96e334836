//! TVL endpoints

use crate::{
    state::{ApiState, LISTING_PAGE_SIZE},
    validation::{self, ListingQuery, TvlQuery},
};
use api_types::{ErrorResponse, LockListingItem, LockListingPage, TvlResponse};
use axum::{
    Json,
    extract::{Query, State},
};
use primitives::LockVersion;

fn lookup_error(operation: &str, error: impl std::fmt::Display) -> ErrorResponse {
    tracing::error!(operation, error = %error, "Store lookup failed");
    ErrorResponse::not_found()
}

#[utoipa::path(
    get,
    path = "/tvl/pinklock",
    params(TvlQuery),
    responses(
        (status = 200, description = "Value locked on the chain", body = TvlResponse),
        (
            status = 404,
            description = "Missing or invalid chain id, or lookup failure",
            body = ErrorResponse
        )
    ),
    tag = "pinklock"
)]
/// Native and stablecoin value locked on a chain, across both contract versions.
pub async fn pinklock(
    State(state): State<ApiState>,
    Query(query): Query<TvlQuery>,
) -> Result<Json<TvlResponse>, ErrorResponse> {
    let chain_id = validation::chain_id(query.chain_id.as_deref())?;
    let store = &state.store;

    let (native, stable, native_v2, stable_v2) = futures::try_join!(
        store.sum_tvl(LockVersion::V1, chain_id, false),
        store.sum_tvl(LockVersion::V1, chain_id, true),
        store.sum_tvl(LockVersion::V2, chain_id, false),
        store.sum_tvl(LockVersion::V2, chain_id, true),
    )
    .map_err(|e| lookup_error("sum tvl", e))?;

    Ok(Json(TvlResponse { tvl: native + native_v2, stable_coin_tvl: stable + stable_v2 }))
}

#[utoipa::path(
    get,
    path = "/tvl/dextools",
    params(ListingQuery),
    responses(
        (status = 200, description = "One page of lock records", body = LockListingPage),
        (
            status = 404,
            description = "Missing or invalid parameters, or lookup failure",
            body = ErrorResponse
        )
    ),
    tag = "pinklock"
)]
/// Lock records of a chain, 100 per page.
pub async fn dextools(
    State(state): State<ApiState>,
    Query(query): Query<ListingQuery>,
) -> Result<Json<LockListingPage>, ErrorResponse> {
    let chain_id = validation::chain_id(query.chain_id.as_deref())?;
    let page = validation::page(query.page.as_deref())?;

    let offset = (page - 1).saturating_mul(LISTING_PAGE_SIZE);
    let records = state
        .store
        .records_page(chain_id, offset, LISTING_PAGE_SIZE)
        .await
        .map_err(|e| lookup_error("list lock records", e))?;

    let docs = records.records.iter().map(LockListingItem::from).collect();
    Ok(Json(LockListingPage::new(docs, records.total, LISTING_PAGE_SIZE, page)))
}
