use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio::time::interval;
use tokio::time::sleep;

use playpen_backend_client::BackendError;
use playpen_backend_client::ExecBackend;
use playpen_protocol::SessionInfoResponse;

use crate::surface::StatusSurface;

/// Point-in-time view of the remote session, replaced wholesale on every
/// successful refresh.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub session_id: String,
    /// Unix timestamps as reported by the backend.
    pub created_at: f64,
    pub last_used_at: f64,
    pub container: Option<ContainerSnapshot>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContainerSnapshot {
    pub id: String,
    pub status: String,
    pub age_seconds: f64,
}

impl SessionSnapshot {
    fn from_wire(info: SessionInfoResponse) -> Option<Self> {
        let session_id = info.session_id?;
        Some(Self {
            session_id,
            created_at: info.session_created.unwrap_or_default(),
            last_used_at: info.session_last_used.unwrap_or_default(),
            container: info.container.map(|container| ContainerSnapshot {
                id: container.container_id,
                status: container.status,
                age_seconds: container.age_seconds,
            }),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CleanupOutcome {
    /// Container stopped and session invalidated; a replacement session was
    /// fetched after the backend had a moment to issue one.
    Cleaned,
    /// The backend declined; the previous snapshot is kept.
    Refused { message: String },
}

/// Polls and caches ephemeral session/container metadata.
///
/// Runs independently of the execution poll loop; the two touch disjoint
/// state and may interleave freely.
#[derive(Clone)]
pub struct SessionTracker {
    inner: Arc<TrackerInner>,
}

struct TrackerInner {
    backend: Arc<dyn ExecBackend>,
    surface: Arc<dyn StatusSurface>,
    snapshot: Mutex<Option<SessionSnapshot>>,
    cleanup_refresh_delay: Duration,
}

impl SessionTracker {
    pub fn new(backend: Arc<dyn ExecBackend>, surface: Arc<dyn StatusSurface>) -> Self {
        Self::with_cleanup_refresh_delay(backend, surface, Duration::from_secs(1))
    }

    /// The delay before the post-cleanup refresh; the backend creates the
    /// replacement session lazily, so an immediate fetch would miss it.
    pub fn with_cleanup_refresh_delay(
        backend: Arc<dyn ExecBackend>,
        surface: Arc<dyn StatusSurface>,
        delay: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(TrackerInner {
                backend,
                surface,
                snapshot: Mutex::new(None),
                cleanup_refresh_delay: delay,
            }),
        }
    }

    pub async fn snapshot(&self) -> Option<SessionSnapshot> {
        self.inner.snapshot.lock().await.clone()
    }

    /// Fetch current session metadata. An explicit "no session" reply clears
    /// the snapshot and returns `Ok(None)`; transport errors leave the
    /// previous snapshot untouched and propagate.
    pub async fn refresh(&self) -> Result<Option<SessionSnapshot>, BackendError> {
        let info = self.inner.backend.session_info().await?;
        if info.is_no_session() {
            *self.inner.snapshot.lock().await = None;
            self.inner.surface.show_session(None);
            return Ok(None);
        }
        match SessionSnapshot::from_wire(info) {
            Some(snapshot) => {
                *self.inner.snapshot.lock().await = Some(snapshot.clone());
                self.inner.surface.show_session(Some(&snapshot));
                Ok(Some(snapshot))
            }
            None => Ok(None),
        }
    }

    /// Stop the session's container and invalidate the session.
    ///
    /// Irreversible, and it takes down the container of any in-flight
    /// execution; call sites are expected to gate this behind explicit user
    /// confirmation. On success the snapshot is cleared and, after a short
    /// delay, refreshed to pick up the lazily issued replacement session.
    pub async fn cleanup(&self) -> Result<CleanupOutcome, BackendError> {
        let ack = self.inner.backend.session_cleanup().await?;
        if !ack.success {
            tracing::warn!(message = %ack.message, "session cleanup refused");
            return Ok(CleanupOutcome::Refused {
                message: ack.message,
            });
        }

        *self.inner.snapshot.lock().await = None;
        self.inner.surface.show_session(None);
        self.inner.surface.show_status(&ack.message, true);

        sleep(self.inner.cleanup_refresh_delay).await;
        if let Err(err) = self.refresh().await {
            tracing::warn!("session refresh after cleanup failed: {err}");
        }
        Ok(CleanupOutcome::Cleaned)
    }

    /// Start the periodic refresh timer (nominally 30 s).
    pub fn spawn_refresh_task(&self, period: Duration) -> SessionRefreshTask {
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let tracker = self.clone();
        let handle = tokio::spawn(async move {
            run_refresh_loop(tracker, period, shutdown_rx).await;
        });
        SessionRefreshTask {
            handle,
            shutdown_tx,
        }
    }
}

async fn run_refresh_loop(
    tracker: SessionTracker,
    period: Duration,
    mut shutdown: oneshot::Receiver<()>,
) {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // Skip the immediate tick emitted by `interval` so the first refresh
    // happens after `period`.
    ticker.tick().await;
    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            _ = ticker.tick() => {
                if let Err(err) = tracker.refresh().await {
                    tracing::warn!("session refresh failed: {err}");
                }
            }
        }
    }
}

pub struct SessionRefreshTask {
    handle: JoinHandle<()>,
    shutdown_tx: oneshot::Sender<()>,
}

impl SessionRefreshTask {
    pub fn shutdown(self) {
        let _ = self.shutdown_tx.send(());
        self.handle.abort();
    }
}

/// Human-readable duration for session displays: `42s`, `3m 12s`, `2h 05m`.
pub fn format_duration(seconds: u64) -> String {
    if seconds < 60 {
        format!("{seconds}s")
    } else if seconds < 3600 {
        format!("{}m {}s", seconds / 60, seconds % 60)
    } else {
        format!("{}h {:02}m", seconds / 3600, (seconds % 3600) / 60)
    }
}
