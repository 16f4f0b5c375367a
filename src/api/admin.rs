//! Admin console endpoints (codes, users, jobs, stats).

use serde::{Deserialize, Serialize};

use super::{ApiClient, ApiError, segment};
use crate::{
    models::{AdminUser, Job, Page, RedemptionCode, Stats},
    pagination::ListQuery,
};

/// Upper bound on codes generated per request.
pub const MAX_GENERATE: u32 = 100;

/// Body of a code generation request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GenerateCodes {
    pub credits: i64,
    pub count: u32,
    pub prefix: String,
}

impl GenerateCodes {
    /// Clamp the count to 1..=100 as the admin form does.
    pub fn new(credits: i64, count: u32, prefix: &str) -> Self {
        Self {
            credits,
            count: count.clamp(1, MAX_GENERATE),
            prefix: prefix.trim().to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
struct CreditsReq {
    credits: i64,
}

/// Response of a credit update.
#[derive(Clone, Debug, Deserialize)]
pub struct CreditsUpdated {
    #[serde(default)]
    pub message: String,
    pub new_credits: i64,
}

/// New balance after adding `delta`, never below zero.
pub fn adjusted_credits(current: i64, delta: i64) -> i64 {
    current.saturating_add(delta).max(0)
}

pub async fn list_codes(
    api: &ApiClient,
    token: &str,
    query: &ListQuery,
) -> Result<Page<RedemptionCode>, ApiError> {
    api.send_json(api.get("/api/admin/codes", token).query(&query.to_pairs()))
        .await
}

pub async fn generate_codes(
    api: &ApiClient,
    token: &str,
    req: &GenerateCodes,
) -> Result<Vec<RedemptionCode>, ApiError> {
    if req.credits <= 0 {
        return Err(ApiError::InvalidInput("credits must be positive".into()));
    }
    api.send_json(api.post("/api/admin/codes", token).json(req))
        .await
}

pub async fn list_users(
    api: &ApiClient,
    token: &str,
    query: &ListQuery,
) -> Result<Page<AdminUser>, ApiError> {
    api.send_json(api.get("/api/admin/users", token).query(&query.to_pairs()))
        .await
}

/// Set a user's balance to an absolute value.
pub async fn update_user_credits(
    api: &ApiClient,
    token: &str,
    user_id: &str,
    credits: i64,
) -> Result<CreditsUpdated, ApiError> {
    let path = format!("/api/admin/users/{}/credits", segment(user_id));
    api.send_json(api.patch(&path, token).json(&CreditsReq { credits }))
        .await
}

pub async fn list_jobs(
    api: &ApiClient,
    token: &str,
    query: &ListQuery,
) -> Result<Page<Job>, ApiError> {
    api.send_json(api.get("/api/admin/jobs", token).query(&query.to_pairs()))
        .await
}

pub async fn stats(api: &ApiClient, token: &str) -> Result<Stats, ApiError> {
    api.send_json(api.get("/api/admin/stats", token)).await
}
