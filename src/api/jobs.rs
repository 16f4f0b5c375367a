//! Upload, job creation and job lookup.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::{ApiClient, ApiError, segment};
use crate::{
    models::{Job, Page, Quality},
    pagination::ListQuery,
    poller::JobSource,
};

/// Extensions accepted by the upload screen.
const VIDEO_EXTENSIONS: [&str; 7] = ["mp4", "mov", "webm", "mkv", "avi", "m4v", "mpeg"];

#[derive(Debug, Deserialize)]
struct UploadResp {
    key: String,
}

#[derive(Debug, Serialize)]
struct CreateJobReq<'a> {
    quality: &'a Quality,
}

/// Fetch one job owned by the signed-in user.
pub async fn get_job(api: &ApiClient, token: &str, job_id: &str) -> Result<Job, ApiError> {
    let path = format!("/api/jobs/{}", segment(job_id));
    api.send_json(api.get(&path, token)).await
}

/// Paginated list of the user's jobs.
pub async fn list_jobs(
    api: &ApiClient,
    token: &str,
    query: &ListQuery,
) -> Result<Page<Job>, ApiError> {
    api.send_json(api.get("/api/jobs", token).query(&query.to_pairs()))
        .await
}

/// Create a job from an uploaded storage key.
pub async fn create_job(
    api: &ApiClient,
    token: &str,
    input_key: &str,
    quality: &Quality,
) -> Result<Job, ApiError> {
    let req = api
        .post("/api/jobs", token)
        .query(&[("input_key", input_key)])
        .json(&CreateJobReq { quality });
    api.send_json(req).await
}

/// True when the file name has a known video extension.
pub fn is_video_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| VIDEO_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

fn mime_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("mov") => "video/quicktime",
        Some("webm") => "video/webm",
        Some("mkv") => "video/x-matroska",
        Some("avi") => "video/x-msvideo",
        Some("mpeg") => "video/mpeg",
        _ => "video/mp4",
    }
}

/// Upload a local video and return its storage key.
pub async fn upload_video(api: &ApiClient, token: &str, path: &Path) -> Result<String, ApiError> {
    if !is_video_file(path) {
        return Err(ApiError::InvalidInput(format!(
            "not a video file: {}",
            path.display()
        )));
    }
    let bytes = tokio::fs::read(path).await?;
    let filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("video.mp4")
        .to_string();
    tracing::info!("uploading {} ({} bytes)", filename, bytes.len());

    let form = reqwest::multipart::Form::new().part(
        "file",
        reqwest::multipart::Part::bytes(bytes)
            .file_name(filename)
            .mime_str(mime_for(path))?,
    );
    let resp: UploadResp = api
        .send_json(api.post("/api/upload", token).multipart(form))
        .await?;
    Ok(resp.key)
}

#[async_trait]
impl JobSource for ApiClient {
    async fn fetch_job(&self, token: &str, job_id: &str) -> Result<Job, ApiError> {
        get_job(self, token, job_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_video_extension_check() {
        assert!(is_video_file(Path::new("/tmp/clip.MP4")));
        assert!(is_video_file(Path::new("movie.mov")));
        assert!(!is_video_file(Path::new("notes.txt")));
        assert!(!is_video_file(Path::new("noext")));
    }

    #[test]
    fn test_mime_for() {
        assert_eq!(mime_for(Path::new("a.mov")), "video/quicktime");
        assert_eq!(mime_for(Path::new("a.mp4")), "video/mp4");
    }

    #[tokio::test]
    async fn test_upload_rejects_non_video_before_network() {
        let api = ApiClient::new("http://127.0.0.1:9", std::time::Duration::from_secs(1)).unwrap();
        let err = upload_video(&api, "t", Path::new("report.pdf"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidInput(_)));
    }
}
