//! Query parameters and their validation.
//!
//! Parameters arrive as raw strings so that malformed values reach the handlers, which reject
//! them with the same 404 as every other failure.

use api_types::ErrorResponse;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

/// Parameters of `/tvl/pinklock`.
#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
pub struct TvlQuery {
    /// EVM chain id
    pub chain_id: Option<String>,
}

/// Parameters of `/tvl/dextools`.
#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
pub struct ListingQuery {
    /// EVM chain id
    pub chain_id: Option<String>,
    /// 1-based page number, defaults to 1
    pub page: Option<String>,
}

fn parse_u64(raw: &str) -> Option<u64> {
    raw.trim().parse().ok()
}

/// Parse a required chain id.
pub fn chain_id(raw: Option<&str>) -> Result<u64, ErrorResponse> {
    raw.and_then(parse_u64).ok_or_else(|| {
        tracing::debug!(chain_id = ?raw, "Rejected chain id");
        ErrorResponse::not_found()
    })
}

/// Parse an optional 1-based page number. Missing and zero pages read as the first page.
pub fn page(raw: Option<&str>) -> Result<u64, ErrorResponse> {
    match raw {
        None => Ok(1),
        Some(raw) => parse_u64(raw).map(|page| page.max(1)).ok_or_else(|| {
            tracing::debug!(page = raw, "Rejected page");
            ErrorResponse::not_found()
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_id_is_required_and_numeric() {
        assert_eq!(chain_id(Some("56")).unwrap(), 56);
        assert_eq!(chain_id(Some(" 1 ")).unwrap(), 1);
        assert!(chain_id(None).is_err());
        assert!(chain_id(Some("")).is_err());
        assert!(chain_id(Some("bsc")).is_err());
        assert!(chain_id(Some("-56")).is_err());
    }

    #[test]
    fn page_defaults_to_first() {
        assert_eq!(page(None).unwrap(), 1);
        assert_eq!(page(Some("0")).unwrap(), 1);
        assert_eq!(page(Some("3")).unwrap(), 3);
        assert!(page(Some("two")).is_err());
    }
}
