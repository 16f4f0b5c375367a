//! File exports for redemption codes.

use anyhow::Result;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::models::RedemptionCode;

/// Page size used to pull every unredeemed code in one request.
pub const EXPORT_PAGE_SIZE: u32 = 1000;

/// Name for a freshly generated batch,
/// e.g. `TB_10credits_x5_2025-06-01_12-30-00.csv`.
pub fn batch_file_name(prefix: &str, credits: i64, count: usize, now: DateTime<Utc>) -> String {
    let cleaned: String = prefix.chars().filter(|c| c.is_ascii_alphanumeric()).collect();
    let stem = if cleaned.is_empty() {
        "VANISHLY"
    } else {
        &cleaned
    };
    format!(
        "{stem}_{credits}credits_x{count}_{}_{}.csv",
        now.format("%Y-%m-%d"),
        now.format("%H-%M-%S")
    )
}

/// One code per line, no header. Also what "copy all" puts on the clipboard.
pub fn codes_lines(codes: &[RedemptionCode]) -> String {
    codes
        .iter()
        .map(|c| c.code.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn unredeemed_file_name(now: DateTime<Utc>) -> String {
    format!("vanishly-codes-{}.txt", now.format("%Y-%m-%d"))
}

/// `CODE (N credits)` per line.
pub fn unredeemed_lines(codes: &[RedemptionCode]) -> String {
    codes
        .iter()
        .map(|c| format!("{} ({} credits)", c.code, c.credits))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Write `contents` to `dir/name`, creating `dir` if needed.
pub async fn write_export(dir: &Path, name: &str, contents: &str) -> Result<PathBuf> {
    if !dir.as_os_str().is_empty() {
        fs::create_dir_all(dir).await?;
    }
    let path = dir.join(name);
    fs::write(&path, contents).await?;
    tracing::info!("exported {} bytes to {}", contents.len(), path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn code(code: &str, credits: i64) -> RedemptionCode {
        RedemptionCode {
            code: code.into(),
            credits,
            created_at: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
            redeemed_by: None,
            redeemed_at: None,
        }
    }

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 30, 5).unwrap()
    }

    #[test]
    fn test_batch_file_name() {
        assert_eq!(
            batch_file_name("TB-", 10, 5, noon()),
            "TB_10credits_x5_2025-06-01_12-30-05.csv"
        );
        assert_eq!(
            batch_file_name("--", 200, 1, noon()),
            "VANISHLY_200credits_x1_2025-06-01_12-30-05.csv"
        );
    }

    #[test]
    fn test_lines() {
        let codes = [code("TB-AAAA1111", 10), code("TB-BBBB2222", 50)];
        assert_eq!(codes_lines(&codes), "TB-AAAA1111\nTB-BBBB2222");
        assert_eq!(
            unredeemed_lines(&codes),
            "TB-AAAA1111 (10 credits)\nTB-BBBB2222 (50 credits)"
        );
        assert_eq!(unredeemed_file_name(noon()), "vanishly-codes-2025-06-01.txt");
    }

    #[tokio::test]
    async fn test_write_export_creates_dir() {
        let dir = std::env::temp_dir().join(format!("vanishly-export-{}", uuid::Uuid::new_v4()));
        let path = write_export(&dir, "a.csv", "X\nY").await.unwrap();
        assert_eq!(fs::read_to_string(&path).await.unwrap(), "X\nY");
        let _ = fs::remove_dir_all(&dir).await;
    }
}
