//! Background worker executing backend calls for the UI.

use crate::{
    api::{
        self, ApiClient, ApiError,
        admin::{self, GenerateCodes},
    },
    auth::{FileTokenStorage, SessionTokens, TokenProvider},
    config::Config,
    export,
    models::{AdminUser, CreditPack, Job, Page, Quality, RedeemResult, RedemptionCode, Stats},
    pagination::{CodeFilter, CodeState, ListQuery},
    poller::{self, PollHandle, PollUpdate},
};
use anyhow::{Result, anyhow};
use std::{
    path::{Path, PathBuf},
    sync::Arc,
};
use tokio::sync::mpsc;

/// Jobs fetched for the dashboard summary.
const DASHBOARD_JOBS: u32 = 50;

/// Commands sent from the UI to the worker.
#[derive(Debug)]
pub enum WorkerCmd {
    /// Persist and apply updated settings.
    SaveSettings(Config),
    /// Store a bearer token pasted from the sign-in page.
    SignIn(String),
    /// Forget the stored token.
    SignOut,
    /// Balance plus recent jobs.
    RefreshDashboard,
    LoadHistory(ListQuery),
    /// Upload a local file and create a job for it.
    SubmitVideo { path: PathBuf, quality: Quality },
    /// Start polling a job, replacing any current poll.
    WatchJob(String),
    /// Stop polling (job view closed).
    UnwatchJob,
    Redeem(String),
    Checkout(CreditPack),
    LoadStats,
    LoadCodes(ListQuery),
    GenerateCodes(GenerateCodes),
    /// Write every unredeemed code to a text file.
    ExportUnredeemed,
    /// Write arbitrary export contents under the export directory.
    WriteExport { file_name: String, contents: String },
    LoadUsers(ListQuery),
    /// Add `delta` to a user's balance (floored at zero).
    AdjustCredits {
        user_id: String,
        current: i64,
        delta: i64,
    },
    LoadAdminJobs(ListQuery),
    OpenUrl(String),
}

/// Events emitted by the worker for UI updates.
#[derive(Clone, Debug)]
pub enum WorkerEvent {
    SignedIn,
    SignedOut,
    Dashboard { balance: i64, jobs: Page<Job> },
    History(Page<Job>),
    /// A new job was created; the UI switches to it.
    JobCreated(Job),
    /// Output of the job status poller.
    Poll(PollUpdate),
    Redeemed(RedeemResult),
    /// Checkout page opened in the browser.
    CheckoutOpened(String),
    Stats(Stats),
    Codes(Page<RedemptionCode>),
    CodesGenerated(Vec<RedemptionCode>),
    Users(Page<AdminUser>),
    CreditsUpdated { user_id: String, new_credits: i64 },
    AdminJobs(Page<Job>),
    /// A file was written by an export.
    Exported { path: PathBuf, count: usize },
    /// Informational message.
    Log(String),
    /// User-visible error message.
    Error(String),
}

impl From<PollUpdate> for WorkerEvent {
    fn from(u: PollUpdate) -> Self {
        WorkerEvent::Poll(u)
    }
}

/// State owned by the worker task.
struct Worker {
    cfg: Config,
    api: ApiClient,
    storage: FileTokenStorage,
    tokens: Arc<SessionTokens>,
    poll: Option<PollHandle>,
    tx: mpsc::Sender<WorkerEvent>,
}

/// Main worker loop: handle commands sequentially until the UI goes away.
pub async fn run(
    mut rx: mpsc::Receiver<WorkerCmd>,
    tx: mpsc::Sender<WorkerEvent>,
    cfg: Config,
    storage: FileTokenStorage,
) {
    // Client construction only fails on TLS backend init; nothing works without it.
    let api = match ApiClient::new(&cfg.api.base_url, cfg.request_timeout()) {
        Ok(a) => a,
        Err(e) => {
            tracing::error!("http client init failed: {e}");
            let _ = tx
                .send(WorkerEvent::Error(format!("HTTP client init failed: {e}")))
                .await;
            return;
        }
    };
    tracing::info!("worker started against {}", api.base_url());

    let tokens = Arc::new(SessionTokens::new(storage.clone(), api.base_url()));
    let mut worker = Worker {
        cfg,
        api,
        storage,
        tokens,
        poll: None,
        tx,
    };

    while let Some(cmd) = rx.recv().await {
        if let Err(e) = worker.handle(cmd).await {
            let msg = user_message(&e);
            tracing::error!("command failed: {e:#}");
            let _ = worker.tx.send(WorkerEvent::Error(msg)).await;
        }
    }

    if let Some(handle) = worker.poll.take() {
        handle.cancel();
    }
    tracing::info!("worker stopped");
}

impl Worker {
    async fn handle(&mut self, cmd: WorkerCmd) -> Result<()> {
        match cmd {
            WorkerCmd::SaveSettings(new_cfg) => {
                tracing::info!("settings updated");
                if new_cfg.api != self.cfg.api {
                    self.api =
                        ApiClient::new(&new_cfg.api.base_url, new_cfg.request_timeout())?;
                    self.tokens = Arc::new(SessionTokens::new(
                        self.storage.clone(),
                        self.api.base_url(),
                    ));
                }
                self.cfg = new_cfg;
                self.emit(WorkerEvent::Log("settings updated".into())).await;
            }

            WorkerCmd::SignIn(token) => {
                if token.trim().is_empty() {
                    return Err(anyhow!("token is empty"));
                }
                self.tokens.sign_in(&token).await?;
                tracing::info!("token stored for {}", self.api.base_url());
                self.emit(WorkerEvent::SignedIn).await;
            }

            WorkerCmd::SignOut => {
                self.unwatch();
                self.tokens.sign_out().await?;
                tracing::info!("signed out");
                self.emit(WorkerEvent::SignedOut).await;
            }

            WorkerCmd::RefreshDashboard => {
                let token = self.token().await?;
                let balance = api::codes::balance(&self.api, &token).await?;
                let jobs = api::jobs::list_jobs(
                    &self.api,
                    &token,
                    &ListQuery::new(1, DASHBOARD_JOBS),
                )
                .await?;
                tracing::info!("dashboard: {} credits, {} jobs", balance.credits, jobs.total);
                self.emit(WorkerEvent::Dashboard {
                    balance: balance.credits,
                    jobs,
                })
                .await;
            }

            WorkerCmd::LoadHistory(query) => {
                let token = self.token().await?;
                let page = api::jobs::list_jobs(&self.api, &token, &query).await?;
                self.emit(WorkerEvent::History(page)).await;
            }

            WorkerCmd::SubmitVideo { path, quality } => {
                let token = self.token().await?;
                tracing::info!("upload start: {}", path.display());
                let key = api::jobs::upload_video(&self.api, &token, &path).await?;
                self.emit(WorkerEvent::Log(format!("uploaded {}", file_label(&path))))
                    .await;
                let job = api::jobs::create_job(&self.api, &token, &key, &quality).await?;
                tracing::info!("job created: {}", job.id);
                self.emit(WorkerEvent::JobCreated(job)).await;
            }

            WorkerCmd::WatchJob(job_id) => {
                self.unwatch();
                let handle = poller::spawn(
                    Arc::new(self.api.clone()),
                    self.tokens.clone(),
                    job_id,
                    self.cfg.poll_options(),
                    self.tx.clone(),
                );
                self.poll = Some(handle);
            }

            WorkerCmd::UnwatchJob => self.unwatch(),

            WorkerCmd::Redeem(code) => {
                let token = self.token().await?;
                let res = api::codes::redeem(&self.api, &token, &code).await?;
                tracing::info!("redeemed code: +{}", res.credits_added);
                self.emit(WorkerEvent::Redeemed(res)).await;
            }

            WorkerCmd::Checkout(pack) => {
                let token = self.token().await?;
                let session = api::checkout::create_checkout(&self.api, &token, pack).await?;
                tracing::info!("checkout session {} for {}", session.session_id, pack.key());
                open_url(&session.checkout_url)?;
                self.emit(WorkerEvent::CheckoutOpened(session.checkout_url))
                    .await;
            }

            WorkerCmd::LoadStats => {
                let token = self.token().await?;
                let stats = admin::stats(&self.api, &token).await?;
                self.emit(WorkerEvent::Stats(stats)).await;
            }

            WorkerCmd::LoadCodes(query) => {
                let token = self.token().await?;
                let page = admin::list_codes(&self.api, &token, &query).await?;
                self.emit(WorkerEvent::Codes(page)).await;
            }

            WorkerCmd::GenerateCodes(req) => {
                let token = self.token().await?;
                let codes = admin::generate_codes(&self.api, &token, &req).await?;
                tracing::info!("generated {} codes x {} credits", codes.len(), req.credits);
                self.emit(WorkerEvent::CodesGenerated(codes)).await;
            }

            WorkerCmd::ExportUnredeemed => {
                let token = self.token().await?;
                let filter = CodeFilter {
                    state: CodeState::Pending,
                    ..CodeFilter::default()
                };
                let query = filter.apply(ListQuery::new(1, export::EXPORT_PAGE_SIZE));
                let page = admin::list_codes(&self.api, &token, &query).await?;
                let name = export::unredeemed_file_name(chrono::Utc::now());
                let path = export::write_export(
                    Path::new(&self.cfg.codes.export_dir),
                    &name,
                    &export::unredeemed_lines(&page.items),
                )
                .await?;
                self.emit(WorkerEvent::Exported {
                    path,
                    count: page.items.len(),
                })
                .await;
            }

            WorkerCmd::WriteExport {
                file_name,
                contents,
            } => {
                let count = contents.lines().count();
                let path =
                    export::write_export(Path::new(&self.cfg.codes.export_dir), &file_name, &contents)
                        .await?;
                self.emit(WorkerEvent::Exported { path, count }).await;
            }

            WorkerCmd::LoadUsers(query) => {
                let token = self.token().await?;
                let page = admin::list_users(&self.api, &token, &query).await?;
                self.emit(WorkerEvent::Users(page)).await;
            }

            WorkerCmd::AdjustCredits {
                user_id,
                current,
                delta,
            } => {
                let token = self.token().await?;
                let target = admin::adjusted_credits(current, delta);
                let res = admin::update_user_credits(&self.api, &token, &user_id, target).await?;
                tracing::info!(
                    "credits for {user_id}: {current} -> {} ({})",
                    res.new_credits,
                    res.message
                );
                self.emit(WorkerEvent::CreditsUpdated {
                    user_id,
                    new_credits: res.new_credits,
                })
                .await;
            }

            WorkerCmd::LoadAdminJobs(query) => {
                let token = self.token().await?;
                let page = admin::list_jobs(&self.api, &token, &query).await?;
                self.emit(WorkerEvent::AdminJobs(page)).await;
            }

            WorkerCmd::OpenUrl(url) => open_url(&url)?,
        }
        Ok(())
    }

    /// Current bearer token, or an error telling the user to sign in.
    async fn token(&self) -> Result<String> {
        self.tokens
            .token()
            .await?
            .ok_or_else(|| anyhow!("Not signed in"))
    }

    fn unwatch(&mut self) {
        if let Some(handle) = self.poll.take() {
            if handle.is_stopped() {
                tracing::debug!("poll for {} had already stopped", handle.job_id());
            } else {
                tracing::info!("stop polling {}", handle.job_id());
            }
            handle.cancel();
        }
    }

    async fn emit(&self, ev: WorkerEvent) {
        let _ = self.tx.send(ev).await;
    }
}

fn open_url(url: &str) -> Result<()> {
    tracing::info!("opening {url}");
    webbrowser::open(url).map_err(|e| anyhow!("could not open browser: {e}"))
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Toast text for a failed command.
fn user_message(e: &anyhow::Error) -> String {
    match e.downcast_ref::<ApiError>() {
        Some(api_err) => api_err.user_message(),
        None => e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_user_message_prefers_api_detail() {
        let e: anyhow::Error =
            ApiError::from_parts(StatusCode::BAD_REQUEST, r#"{"detail":"Code already redeemed"}"#)
                .into();
        assert_eq!(user_message(&e), "Code already redeemed");
        assert_eq!(user_message(&anyhow!("Not signed in")), "Not signed in");
    }

    #[tokio::test]
    async fn test_sign_in_then_out_round_trip() {
        let path = std::env::temp_dir().join(format!("vanishly-worker-{}.json", uuid::Uuid::new_v4()));
        let (cmd_tx, cmd_rx) = mpsc::channel(8);
        let (ev_tx, mut ev_rx) = mpsc::channel(8);
        tokio::spawn(run(
            cmd_rx,
            ev_tx,
            Config::default(),
            FileTokenStorage::new(&path),
        ));

        cmd_tx.send(WorkerCmd::SignIn("abc".into())).await.unwrap();
        assert!(matches!(ev_rx.recv().await, Some(WorkerEvent::SignedIn)));

        cmd_tx.send(WorkerCmd::SignIn("  ".into())).await.unwrap();
        match ev_rx.recv().await {
            Some(WorkerEvent::Error(msg)) => assert_eq!(msg, "token is empty"),
            other => panic!("unexpected {other:?}"),
        }

        cmd_tx.send(WorkerCmd::SignOut).await.unwrap();
        assert!(matches!(ev_rx.recv().await, Some(WorkerEvent::SignedOut)));
        let _ = tokio::fs::remove_file(&path).await;
    }
}
