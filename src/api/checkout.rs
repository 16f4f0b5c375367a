//! Payment checkout sessions.

use serde::Serialize;

use super::{ApiClient, ApiError};
use crate::models::{CheckoutSession, CreditPack};

#[derive(Debug, Serialize)]
struct CheckoutReq<'a> {
    pack: &'a str,
}

/// Ask the backend for a hosted checkout page for a credit pack.
pub async fn create_checkout(
    api: &ApiClient,
    token: &str,
    pack: CreditPack,
) -> Result<CheckoutSession, ApiError> {
    let req = api
        .post("/api/checkout/creem", token)
        .json(&CheckoutReq { pack: pack.key() });
    api.send_json(req).await
}
