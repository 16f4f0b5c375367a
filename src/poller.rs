//! Periodic job-status polling with a cancellation handle.
//!
//! Each fetch runs as its own task, so fetches may overlap when the backend is
//! slow. Every fetch is tagged with a generation; a result is delivered only if
//! the poll is still open and nothing newer has been delivered already.

use async_trait::async_trait;
use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
    time::Duration,
};
use tokio::{sync::mpsc, task::JoinHandle, time::MissedTickBehavior};

use crate::{api::ApiError, auth::TokenProvider, models::Job};

/// Where job snapshots come from. The API client in production.
#[async_trait]
pub trait JobSource: Send + Sync {
    async fn fetch_job(&self, token: &str, job_id: &str) -> Result<Job, ApiError>;
}

/// Outcome delivered to the job view.
#[derive(Clone, Debug)]
pub enum PollEvent {
    /// Fresh snapshot; replaces the local copy wholesale.
    Snapshot(Job),
    /// The backend answered 404. Terminal.
    NotFound,
}

/// A poll event together with the job it belongs to.
///
/// `generation` increases with every fetch of one poll. Delivery through the
/// channel is not atomic with the gate, so receivers keep the highest
/// generation they applied and drop anything lower.
#[derive(Clone, Debug)]
pub struct PollUpdate {
    pub job_id: String,
    pub generation: u64,
    pub event: PollEvent,
}

/// Polling parameters.
#[derive(Clone, Copy, Debug)]
pub struct PollOptions {
    pub interval: Duration,
    /// Stop after delivering a completed or failed snapshot.
    pub stop_when_finished: bool,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(3000),
            stop_when_finished: false,
        }
    }
}

/// Orders fetch results and drops the ones that arrive too late.
#[derive(Debug, Default)]
pub struct GenerationGate {
    issued: AtomicU64,
    applied: AtomicU64,
    closed: AtomicBool,
}

impl GenerationGate {
    /// Tag for a fetch that is about to start.
    pub fn issue(&self) -> u64 {
        self.issued.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Claim delivery for `generation`. False when closed or when a newer
    /// generation was already delivered.
    pub fn accept(&self, generation: u64) -> bool {
        if self.is_closed() {
            return false;
        }
        let mut current = self.applied.load(Ordering::SeqCst);
        loop {
            if generation <= current {
                return false;
            }
            match self.applied.compare_exchange(
                current,
                generation,
                Ordering::SeqCst,
                Ordering::SeqCst,
            ) {
                Ok(_) => return true,
                Err(actual) => current = actual,
            }
        }
    }

    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

/// Running poll. Cancelled on `cancel()` or drop.
pub struct PollHandle {
    job_id: String,
    gate: Arc<GenerationGate>,
    task: JoinHandle<()>,
}

impl PollHandle {
    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    /// Stop the timer and ignore any fetch still in flight.
    pub fn cancel(&self) {
        self.gate.close();
        self.task.abort();
    }

    /// True once the poll has stopped for any reason.
    pub fn is_stopped(&self) -> bool {
        self.gate.is_closed() || self.task.is_finished()
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Start polling `job_id`: one fetch now, then one per interval.
pub fn spawn<E>(
    source: Arc<dyn JobSource>,
    tokens: Arc<dyn TokenProvider>,
    job_id: String,
    opts: PollOptions,
    tx: mpsc::Sender<E>,
) -> PollHandle
where
    E: From<PollUpdate> + Send + 'static,
{
    let gate = Arc::new(GenerationGate::default());
    let task = tokio::spawn(run(
        source,
        tokens,
        job_id.clone(),
        opts,
        tx,
        Arc::clone(&gate),
    ));
    tracing::info!("polling job {job_id} every {:?}", opts.interval);
    PollHandle { job_id, gate, task }
}

async fn run<E>(
    source: Arc<dyn JobSource>,
    tokens: Arc<dyn TokenProvider>,
    job_id: String,
    opts: PollOptions,
    tx: mpsc::Sender<E>,
    gate: Arc<GenerationGate>,
) where
    E: From<PollUpdate> + Send + 'static,
{
    let mut ticker = tokio::time::interval(opts.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        if gate.is_closed() || tx.is_closed() {
            break;
        }
        if job_id.trim().is_empty() {
            continue;
        }
        tokio::spawn(fetch_once(
            Arc::clone(&source),
            Arc::clone(&tokens),
            job_id.clone(),
            opts,
            tx.clone(),
            Arc::clone(&gate),
        ));
    }
    tracing::debug!("poll loop for {job_id} stopped");
}

async fn fetch_once<E>(
    source: Arc<dyn JobSource>,
    tokens: Arc<dyn TokenProvider>,
    job_id: String,
    opts: PollOptions,
    tx: mpsc::Sender<E>,
    gate: Arc<GenerationGate>,
) where
    E: From<PollUpdate> + Send + 'static,
{
    let token = match tokens.token().await {
        Ok(Some(t)) if !t.is_empty() => t,
        Ok(_) => {
            tracing::debug!("poll skipped: not signed in");
            return;
        }
        Err(e) => {
            tracing::warn!("poll skipped: token unavailable: {e}");
            return;
        }
    };

    let generation = gate.issue();
    let event = match source.fetch_job(&token, &job_id).await {
        Ok(job) => PollEvent::Snapshot(job),
        Err(e) if e.is_not_found() => PollEvent::NotFound,
        Err(e) => {
            // Keep the previous snapshot; the next tick retries.
            tracing::warn!("poll {job_id} #{generation} failed: {e}");
            return;
        }
    };

    if !gate.accept(generation) {
        tracing::debug!("poll {job_id} #{generation} discarded");
        return;
    }

    let stop = match &event {
        PollEvent::NotFound => true,
        PollEvent::Snapshot(job) => opts.stop_when_finished && job.status.is_finished(),
    };
    if stop {
        tracing::info!("polling {job_id} finished");
        gate.close();
    }

    let _ = tx
        .send(E::from(PollUpdate {
            job_id,
            generation,
            event,
        }))
        .await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{auth::StaticToken, models::JobStatus};
    use reqwest::StatusCode;
    use std::{
        collections::VecDeque,
        sync::{Mutex, atomic::AtomicUsize},
    };
    use tokio::time::Instant;

    type Step = (Duration, Result<JobStatus, StatusCode>);

    /// Replays scripted responses, then keeps returning `fallback`.
    struct Scripted {
        calls: AtomicUsize,
        script: Mutex<VecDeque<Step>>,
        fallback: JobStatus,
    }

    impl Scripted {
        fn new(script: Vec<Step>, fallback: JobStatus) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                script: Mutex::new(script.into()),
                fallback,
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    fn job(status: JobStatus) -> Job {
        serde_json::from_value(serde_json::json!({
            "id": "job-1",
            "status": status.as_str(),
            "output_url": "https://cdn.example/out.mp4",
            "created_at": "2025-01-01T00:00:00Z",
        }))
        .unwrap()
    }

    #[async_trait]
    impl JobSource for Scripted {
        async fn fetch_job(&self, token: &str, job_id: &str) -> Result<Job, ApiError> {
            assert_eq!(token, "tok");
            assert_eq!(job_id, "job-1");
            self.calls.fetch_add(1, Ordering::SeqCst);
            let step = self.script.lock().unwrap().pop_front();
            let (delay, outcome) = step.unwrap_or((Duration::ZERO, Ok(self.fallback)));
            tokio::time::sleep(delay).await;
            match outcome {
                Ok(status) => Ok(job(status)),
                Err(code) => Err(ApiError::from_parts(code, "")),
            }
        }
    }

    fn start(
        source: Arc<Scripted>,
        token: Option<&str>,
        stop_when_finished: bool,
    ) -> (PollHandle, mpsc::Receiver<PollUpdate>) {
        start_job(source, "job-1", token, stop_when_finished)
    }

    fn start_job(
        source: Arc<Scripted>,
        job_id: &str,
        token: Option<&str>,
        stop_when_finished: bool,
    ) -> (PollHandle, mpsc::Receiver<PollUpdate>) {
        let (tx, rx) = mpsc::channel(16);
        let handle = spawn(
            source,
            Arc::new(StaticToken(token.map(str::to_string))),
            job_id.into(),
            PollOptions {
                interval: Duration::from_millis(3000),
                stop_when_finished,
            },
            tx,
        );
        (handle, rx)
    }

    fn status_of(update: PollUpdate) -> Option<JobStatus> {
        match update.event {
            PollEvent::Snapshot(j) => Some(j.status),
            PollEvent::NotFound => None,
        }
    }

    #[test]
    fn test_gate_orders_generations() {
        let gate = GenerationGate::default();
        let g1 = gate.issue();
        let g2 = gate.issue();
        assert!(gate.accept(g2));
        assert!(!gate.accept(g1));
        let g3 = gate.issue();
        gate.close();
        assert!(!gate.accept(g3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_immediate_fetch_then_fixed_interval() {
        let source = Scripted::new(vec![], JobStatus::Processing);
        let started = Instant::now();
        let (_handle, mut rx) = start(Arc::clone(&source), Some("tok"), false);

        for _ in 0..3 {
            let update = rx.recv().await.unwrap();
            assert_eq!(update.job_id, "job-1");
            assert_eq!(status_of(update), Some(JobStatus::Processing));
        }
        assert_eq!(source.calls(), 3);
        assert_eq!(started.elapsed(), Duration::from_millis(6000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_not_found_is_terminal() {
        let source = Scripted::new(
            vec![(Duration::ZERO, Err(StatusCode::NOT_FOUND))],
            JobStatus::Processing,
        );
        let (handle, mut rx) = start(Arc::clone(&source), Some("tok"), false);

        assert!(status_of(rx.recv().await.unwrap()).is_none());
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(source.calls(), 1);
        assert!(handle.is_stopped());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_error_keeps_polling_silently() {
        let source = Scripted::new(
            vec![(Duration::ZERO, Err(StatusCode::INTERNAL_SERVER_ERROR))],
            JobStatus::Completed,
        );
        let started = Instant::now();
        let (_handle, mut rx) = start(Arc::clone(&source), Some("tok"), false);

        // The first failure produces no event; the next tick succeeds.
        assert_eq!(status_of(rx.recv().await.unwrap()), Some(JobStatus::Completed));
        assert_eq!(started.elapsed(), Duration::from_millis(3000));
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_token_skips_fetch() {
        let source = Scripted::new(vec![], JobStatus::Processing);
        let (_handle, mut rx) = start(Arc::clone(&source), None, false);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(source.calls(), 0);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_response_is_discarded() {
        // Fetch 1 takes 5 s, so fetch 2 (started at 3 s) lands first.
        let source = Scripted::new(
            vec![
                (Duration::from_secs(5), Ok(JobStatus::Processing)),
                (Duration::ZERO, Ok(JobStatus::Completed)),
            ],
            JobStatus::Completed,
        );
        let (_handle, mut rx) = start(Arc::clone(&source), Some("tok"), false);

        let first = rx.recv().await.unwrap();
        assert_eq!(first.generation, 2);
        assert_eq!(status_of(first), Some(JobStatus::Completed));
        let second = rx.recv().await.unwrap();
        assert!(second.generation > 2);
        assert_eq!(status_of(second), Some(JobStatus::Completed));
        assert!(source.calls() >= 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_job_id_skips_every_tick() {
        let source = Scripted::new(vec![], JobStatus::Processing);
        let (handle, mut rx) = start_job(Arc::clone(&source), "  ", Some("tok"), false);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(source.calls(), 0);
        assert!(rx.try_recv().is_err());
        assert!(!handle.is_stopped());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_polling_and_drops_in_flight() {
        let source = Scripted::new(
            vec![
                (Duration::ZERO, Ok(JobStatus::Processing)),
                (Duration::from_secs(2), Ok(JobStatus::Completed)),
            ],
            JobStatus::Completed,
        );
        let (handle, mut rx) = start(Arc::clone(&source), Some("tok"), false);

        assert_eq!(status_of(rx.recv().await.unwrap()), Some(JobStatus::Processing));
        // Close the view right after fetch 2 has started.
        tokio::time::sleep(Duration::from_millis(3500)).await;
        assert_eq!(source.calls(), 2);
        handle.cancel();

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(source.calls(), 2);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels() {
        let source = Scripted::new(vec![], JobStatus::Processing);
        let (handle, mut rx) = start(Arc::clone(&source), Some("tok"), false);
        rx.recv().await.unwrap();
        drop(handle);

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_keeps_polling_after_finish_by_default() {
        let source = Scripted::new(vec![], JobStatus::Completed);
        let (handle, mut rx) = start(Arc::clone(&source), Some("tok"), false);

        for _ in 0..3 {
            assert_eq!(status_of(rx.recv().await.unwrap()), Some(JobStatus::Completed));
        }
        assert!(!handle.is_stopped());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_when_finished() {
        let source = Scripted::new(
            vec![(Duration::ZERO, Ok(JobStatus::Processing))],
            JobStatus::Failed,
        );
        let (handle, mut rx) = start(Arc::clone(&source), Some("tok"), true);

        assert_eq!(status_of(rx.recv().await.unwrap()), Some(JobStatus::Processing));
        assert_eq!(status_of(rx.recv().await.unwrap()), Some(JobStatus::Failed));
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(source.calls(), 2);
        assert!(handle.is_stopped());
    }
}
