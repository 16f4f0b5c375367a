//! Credit balance and code redemption.

use serde::Serialize;

use super::{ApiClient, ApiError};
use crate::models::{Balance, RedeemResult};

#[derive(Debug, Serialize)]
struct RedeemReq {
    code: String,
}

/// Normalize user input the way the backend matches codes.
pub fn normalize_code(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

pub async fn balance(api: &ApiClient, token: &str) -> Result<Balance, ApiError> {
    api.send_json(api.get("/api/codes/balance", token)).await
}

/// Redeem a code for credits.
pub async fn redeem(api: &ApiClient, token: &str, code: &str) -> Result<RedeemResult, ApiError> {
    let code = normalize_code(code);
    if code.is_empty() {
        return Err(ApiError::InvalidInput("code is empty".into()));
    }
    api.send_json(api.post("/api/codes/redeem", token).json(&RedeemReq { code }))
        .await
}
