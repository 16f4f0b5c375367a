//! List queries, filters, and the page-number window shown under tables.

use crate::models::{Job, JobStatus, Page};

/// Query string for a paginated list endpoint.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListQuery {
    pub page: u32,
    pub page_size: u32,
    filters: Vec<(&'static str, String)>,
}

impl ListQuery {
    pub fn new(page: u32, page_size: u32) -> Self {
        Self {
            page: page.max(1),
            page_size: page_size.max(1),
            filters: Vec::new(),
        }
    }

    /// Add a filter; empty values are left out of the query string.
    pub fn filter(mut self, key: &'static str, value: Option<String>) -> Self {
        if let Some(v) = value {
            let v = v.trim().to_string();
            if !v.is_empty() {
                self.filters.push((key, v));
            }
        }
        self
    }

    /// Pairs for `reqwest::RequestBuilder::query`.
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("page", self.page.to_string()),
            ("page_size", self.page_size.to_string()),
        ];
        pairs.extend(self.filters.iter().cloned());
        pairs
    }
}

/// Status filter for job lists.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum JobFilter {
    #[default]
    All,
    Only(JobStatus),
}

impl JobFilter {
    /// Cycle order used by the filter key: all, completed, processing, pending, failed.
    pub fn next(self) -> Self {
        match self {
            JobFilter::All => JobFilter::Only(JobStatus::Completed),
            JobFilter::Only(JobStatus::Completed) => JobFilter::Only(JobStatus::Processing),
            JobFilter::Only(JobStatus::Processing) => JobFilter::Only(JobStatus::Pending),
            JobFilter::Only(JobStatus::Pending) => JobFilter::Only(JobStatus::Failed),
            JobFilter::Only(JobStatus::Failed) => JobFilter::All,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            JobFilter::All => "all",
            JobFilter::Only(s) => s.as_str(),
        }
    }

    pub fn apply(self, q: ListQuery) -> ListQuery {
        match self {
            JobFilter::All => q,
            JobFilter::Only(s) => q.filter("status", Some(s.as_str().to_string())),
        }
    }

    /// Drop jobs that do not match. Endpoints that ignore the `status` query
    /// return everything, so counts are rebuilt when anything was removed.
    pub fn retain(self, page: &mut Page<Job>) {
        let JobFilter::Only(status) = self else {
            return;
        };
        let before = page.items.len();
        page.items.retain(|j| j.status == status);
        if page.items.len() != before {
            page.total = page.items.len() as u64;
            page.total_pages = total_pages(page.total, page.page_size);
        }
    }
}

/// Redemption state filter for the codes list.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CodeState {
    #[default]
    All,
    Pending,
    Redeemed,
}

impl CodeState {
    pub fn next(self) -> Self {
        match self {
            CodeState::All => CodeState::Pending,
            CodeState::Pending => CodeState::Redeemed,
            CodeState::Redeemed => CodeState::All,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CodeState::All => "all",
            CodeState::Pending => "pending",
            CodeState::Redeemed => "redeemed",
        }
    }
}

/// Filters on the admin codes list.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CodeFilter {
    pub state: CodeState,
    pub credits: Option<i64>,
    pub search: String,
}

impl CodeFilter {
    pub fn apply(&self, q: ListQuery) -> ListQuery {
        let state = match self.state {
            CodeState::All => None,
            s => Some(s.label().to_string()),
        };
        q.filter("status", state)
            .filter("credits", self.credits.map(|c| c.to_string()))
            .filter("search", Some(self.search.clone()))
    }

    /// Credit amounts offered by the packs; `None` means any.
    pub fn next_credits(&self) -> Option<i64> {
        match self.credits {
            None => Some(10),
            Some(10) => Some(50),
            Some(50) => Some(200),
            _ => None,
        }
    }
}

/// Role filter on the admin users list.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RoleFilter {
    #[default]
    All,
    Admin,
    User,
}

impl RoleFilter {
    pub fn next(self) -> Self {
        match self {
            RoleFilter::All => RoleFilter::Admin,
            RoleFilter::Admin => RoleFilter::User,
            RoleFilter::User => RoleFilter::All,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RoleFilter::All => "all",
            RoleFilter::Admin => "admin",
            RoleFilter::User => "user",
        }
    }
}

/// Filters on the admin users list.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UserFilter {
    pub search: String,
    pub role: RoleFilter,
}

impl UserFilter {
    pub fn apply(&self, q: ListQuery) -> ListQuery {
        let role = match self.role {
            RoleFilter::All => None,
            r => Some(r.label().to_string()),
        };
        q.filter("search", Some(self.search.clone()))
            .filter("role", role)
    }
}

/// Ceiling division used by the backend; never less than one page.
pub fn total_pages(total: u64, page_size: u32) -> u32 {
    if total == 0 || page_size == 0 {
        return 1;
    }
    total.div_ceil(u64::from(page_size)) as u32
}

/// One slot in the page-number strip.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PageSlot {
    Number(u32),
    Gap,
}

/// Pages within two of `current`, plus first and last, with gaps collapsed.
///
/// A gap of exactly one page is shown as that page number instead of `...`.
pub fn visible_pages(current: u32, total_pages: u32) -> Vec<PageSlot> {
    const DELTA: u32 = 2;
    if total_pages <= 1 {
        return Vec::new();
    }

    let lo = current.saturating_sub(DELTA);
    let hi = current.saturating_add(DELTA);
    let mut out = Vec::new();
    let mut last: Option<u32> = None;
    for i in (1..=total_pages).filter(|&i| i == 1 || i == total_pages || (lo..=hi).contains(&i)) {
        if let Some(l) = last {
            if i - l == 2 {
                out.push(PageSlot::Number(l + 1));
            } else if i - l != 1 {
                out.push(PageSlot::Gap);
            }
        }
        out.push(PageSlot::Number(i));
        last = Some(i);
    }
    out
}

/// Render the strip as text, bracketing the current page.
pub fn format_strip(current: u32, total_pages: u32) -> String {
    visible_pages(current, total_pages)
        .into_iter()
        .map(|slot| match slot {
            PageSlot::Number(n) if n == current => format!("[{n}]"),
            PageSlot::Number(n) => n.to_string(),
            PageSlot::Gap => "...".to_string(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use PageSlot::{Gap, Number};

    #[test]
    fn test_query_skips_empty_filters() {
        let q = CodeFilter {
            state: CodeState::Pending,
            credits: None,
            search: "  ".into(),
        }
        .apply(ListQuery::new(2, 20));
        assert_eq!(
            q.to_pairs(),
            vec![
                ("page", "2".to_string()),
                ("page_size", "20".to_string()),
                ("status", "pending".to_string()),
            ]
        );
    }

    #[test]
    fn test_job_filter_cycle_and_query() {
        let mut f = JobFilter::All;
        let mut seen = vec![];
        for _ in 0..5 {
            seen.push(f.label());
            f = f.next();
        }
        assert_eq!(seen, ["all", "completed", "processing", "pending", "failed"]);
        assert_eq!(f, JobFilter::All);

        let q = JobFilter::Only(JobStatus::Failed).apply(ListQuery::new(1, 15));
        assert!(q.to_pairs().contains(&("status", "failed".to_string())));
    }

    #[test]
    fn test_job_filter_retains_matching_jobs() {
        let mut page: Page<Job> = serde_json::from_str(
            r#"[{"id":"a","status":"completed","created_at":"2025-01-01T00:00:00"},
                {"id":"b","status":"processing","created_at":"2025-01-01T00:00:00"}]"#,
        )
        .unwrap();
        JobFilter::All.retain(&mut page);
        assert_eq!(page.items.len(), 2);

        JobFilter::Only(JobStatus::Processing).retain(&mut page);
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].id, "b");
        assert_eq!((page.total, page.total_pages), (1, 1));
    }

    #[test]
    fn test_user_filter_role() {
        let q = UserFilter {
            search: "gmail".into(),
            role: RoleFilter::Admin,
        }
        .apply(ListQuery::new(0, 0));
        assert_eq!(
            q.to_pairs(),
            vec![
                ("page", "1".to_string()),
                ("page_size", "1".to_string()),
                ("search", "gmail".to_string()),
                ("role", "admin".to_string()),
            ]
        );
    }

    #[test]
    fn test_total_pages() {
        assert_eq!(total_pages(0, 20), 1);
        assert_eq!(total_pages(20, 20), 1);
        assert_eq!(total_pages(21, 20), 2);
    }

    #[test]
    fn test_visible_pages_window() {
        assert!(visible_pages(1, 1).is_empty());
        assert_eq!(
            visible_pages(1, 10),
            vec![Number(1), Number(2), Number(3), Gap, Number(10)]
        );
        assert_eq!(
            visible_pages(5, 10),
            vec![
                Number(1),
                Number(2),
                Number(3),
                Number(4),
                Number(5),
                Number(6),
                Number(7),
                Gap,
                Number(10)
            ]
        );
        // A single missing page is shown as a number.
        assert_eq!(
            visible_pages(4, 7),
            vec![
                Number(1),
                Number(2),
                Number(3),
                Number(4),
                Number(5),
                Number(6),
                Number(7)
            ]
        );
    }

    #[test]
    fn test_format_strip() {
        assert_eq!(format_strip(10, 10), "1 ... 8 9 [10]");
    }
}
