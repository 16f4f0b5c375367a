//! 経過時間から表示用の進捗率を推定する。
//!
//! バックエンドは途中経過を返さないため、ここで返す値は見た目のためだけのもの。

use chrono::{DateTime, Utc};

use crate::models::JobStatus;

/// 典型的なジョブ所要時間（秒）。
pub const EXPECTED_SECS: f64 = 45.0;
/// 所要時間に達した時点の進捗率。
const AT_EXPECTED: f64 = 90.0;
/// 想定時間を超えた後の1秒あたりの伸び。
const CRAWL_PER_SEC: f64 = 0.1;
/// 処理中に表示する上限。
const CEILING: f64 = 95.0;
/// 処理中に表示する下限。
const FLOOR: u8 = 5;

/// アクティビティ表示を切り替える間隔（秒）。
const ACTIVITY_STEP_SECS: f64 = 2.5;

/// 処理中に順に表示する文言。
const ACTIVITY_STEPS: [&str; 16] = [
    "Initializing secure environment...",
    "Allocating dedicated GPU vRAM...",
    "Loading inpainting model...",
    "Analysing video structure...",
    "Detecting static overlays...",
    "Mapping temporal coordinates...",
    "Generating occlusion masks...",
    "Synthesizing texture patches...",
    "Applying flow-guided propagation...",
    "Refinement pass 1/3 (Coarse)...",
    "Refinement pass 2/3 (Detail)...",
    "Refinement pass 3/3 (Temporal)...",
    "Color matching frames...",
    "Re-encoding video stream...",
    "Verifying output quality...",
    "Finalizing render...",
];

/// ジョブ状態と作成時刻から0..=100の進捗率を返す。
pub fn estimate(status: JobStatus, created_at: DateTime<Utc>, now: DateTime<Utc>) -> u8 {
    // 終了済みなら成功・失敗を問わず100。
    if status.is_finished() {
        return 100;
    }

    // 時計のずれで負になった場合は0秒として扱う。
    let elapsed = elapsed_secs(created_at, now);
    let mut raw = elapsed / EXPECTED_SECS * AT_EXPECTED;
    if raw > AT_EXPECTED {
        // 想定時間を超えたらゆっくり進める。
        raw = AT_EXPECTED + (elapsed - EXPECTED_SECS) * CRAWL_PER_SEC;
    }
    let raw = raw.min(CEILING);

    (raw.round() as u8).max(FLOOR)
}

/// 処理中に表示するアクティビティ文言。終了済みならNone。
pub fn activity_line(
    status: JobStatus,
    created_at: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Option<&'static str> {
    if status.is_finished() {
        return None;
    }
    let step = (elapsed_secs(created_at, now) / ACTIVITY_STEP_SECS) as usize;
    Some(ACTIVITY_STEPS[step % ACTIVITY_STEPS.len()])
}

fn elapsed_secs(created_at: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    let ms = (now - created_at).num_milliseconds().max(0);
    ms as f64 / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    fn at(status: JobStatus, elapsed_ms: i64) -> u8 {
        estimate(status, t0(), t0() + Duration::milliseconds(elapsed_ms))
    }

    #[test]
    fn test_finished_is_always_100() {
        for ms in [0, 1_000, 45_000, 3_600_000] {
            assert_eq!(at(JobStatus::Completed, ms), 100);
            assert_eq!(at(JobStatus::Failed, ms), 100);
        }
        // 作成時刻が未来でも100のまま。
        assert_eq!(at(JobStatus::Completed, -10_000), 100);
    }

    #[test]
    fn test_floor_at_start() {
        assert_eq!(at(JobStatus::Pending, 0), 5);
        assert_eq!(at(JobStatus::Processing, 0), 5);
        assert_eq!(at(JobStatus::Pending, -30_000), 5);
    }

    #[test]
    fn test_half_and_full_baseline() {
        assert_eq!(at(JobStatus::Processing, 22_500), 45);
        assert_eq!(at(JobStatus::Processing, 45_000), 90);
    }

    #[test]
    fn test_crawl_after_baseline() {
        // 55秒: 90 + 10 * 0.1 = 91
        assert_eq!(at(JobStatus::Processing, 55_000), 91);
    }

    #[test]
    fn test_clamped_at_95() {
        assert_eq!(at(JobStatus::Processing, 100_000), 95);
        assert_eq!(at(JobStatus::Pending, 86_400_000), 95);
    }

    #[test]
    fn test_non_decreasing() {
        let mut prev = 0;
        for ms in (0..200_000).step_by(250) {
            let p = at(JobStatus::Processing, ms);
            assert!(p >= prev, "dropped from {prev} to {p} at {ms}ms");
            prev = p;
        }
    }

    #[test]
    fn test_deterministic() {
        let now = t0() + Duration::milliseconds(31_337);
        let a = estimate(JobStatus::Pending, t0(), now);
        let b = estimate(JobStatus::Pending, t0(), now);
        assert_eq!(a, b);
    }

    #[test]
    fn test_activity_line_rotates_and_hides_when_finished() {
        let first = activity_line(JobStatus::Processing, t0(), t0()).unwrap();
        let second =
            activity_line(JobStatus::Processing, t0(), t0() + Duration::milliseconds(2_500))
                .unwrap();
        assert_ne!(first, second);
        // 16ステップで一周する。
        let wrapped =
            activity_line(JobStatus::Processing, t0(), t0() + Duration::milliseconds(40_000))
                .unwrap();
        assert_eq!(first, wrapped);
        assert!(activity_line(JobStatus::Completed, t0(), t0()).is_none());
    }
}
