//! Data types for the TVL API.
//!
//! These structs define the JSON responses returned by the API server. They are provided in a
//! separate crate so that consumers can depend on them without pulling in the rest of the
//! server implementation.

#![allow(missing_docs)]

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use primitives::LockRecord;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

/// Locked value of a chain, split by denomination.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TvlResponse {
    /// Native-denominated value locked
    pub tvl: f64,
    /// Stablecoin-denominated value locked
    pub stable_coin_tvl: f64,
}

/// One lock record as listed by the DEXTools feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct LockListingItem {
    pub chain_id: u64,
    /// Locked amount in raw token units, as a decimal string
    pub amount: String,
    /// Unlock timestamp
    pub expired: u64,
    /// Locked token
    pub address: String,
    /// Lock id, as a decimal string
    pub lock_id: String,
    pub owner: String,
    /// Lock timestamp
    pub lock_date: u64,
    pub token_decimals: Option<u8>,
}

impl From<&LockRecord> for LockListingItem {
    fn from(record: &LockRecord) -> Self {
        Self {
            chain_id: record.chain_id,
            amount: record.amount.to_string(),
            expired: record.unlock_date,
            address: record.token.to_string(),
            lock_id: record.lock_id.to_string(),
            owner: record.owner.to_string(),
            lock_date: record.lock_date,
            token_decimals: record.token_decimals,
        }
    }
}

/// One page of lock records with its paging metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LockListingPage {
    pub docs: Vec<LockListingItem>,
    pub total_docs: u64,
    pub limit: u64,
    pub page: u64,
    pub total_pages: u64,
    /// 1-based position of the first item of the page
    pub paging_counter: u64,
    pub has_prev_page: bool,
    pub has_next_page: bool,
    pub prev_page: Option<u64>,
    pub next_page: Option<u64>,
}

impl LockListingPage {
    /// Assemble page `page` (1-based) of `limit` items out of `total_docs`.
    pub fn new(docs: Vec<LockListingItem>, total_docs: u64, limit: u64, page: u64) -> Self {
        let total_pages = if limit == 0 { 1 } else { total_docs.div_ceil(limit).max(1) };
        let has_prev_page = page > 1;
        let has_next_page = page < total_pages;
        Self {
            docs,
            total_docs,
            limit,
            page,
            total_pages,
            paging_counter: page.saturating_sub(1).saturating_mul(limit) + 1,
            has_prev_page,
            has_next_page,
            prev_page: has_prev_page.then(|| page - 1),
            next_page: has_next_page.then(|| page + 1),
        }
    }
}

/// Problem details returned for rejected requests.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ErrorResponse {
    #[serde(rename = "type")]
    pub r#type: String,
    pub title: String,
    pub status: u16,
    pub detail: String,
}

impl ErrorResponse {
    pub fn new(
        r#type: impl Into<String>,
        title: impl Into<String>,
        status: StatusCode,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            r#type: r#type.into(),
            title: title.into(),
            status: status.as_u16(),
            detail: detail.into(),
        }
    }

    /// The response every failed lookup collapses to.
    pub fn not_found() -> Self {
        Self::new("not-found", "Not Found", StatusCode::NOT_FOUND, "Not Found")
    }
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}
