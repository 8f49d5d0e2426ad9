use parking_lot::Mutex;
use std::sync::{
    atomic::{AtomicBool, AtomicU8, Ordering},
    Arc,
};
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

type LcResult<T = ()> = std::result::Result<T, LifecycleError>;

/// Result returned by background tasks.
type TaskResult<T = ()> = anyhow::Result<T>;

/// States of a background job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Status {
    Stopped,
    Running,
    Stopping,
}

impl Status {
    #[inline]
    const fn as_u8(self) -> u8 {
        self as u8
    }

    #[inline]
    const fn from_u8(x: u8) -> Self {
        match x {
            1 => Status::Running,
            2 => Status::Stopping,
            _ => Status::Stopped,
        }
    }
}

/// Reason why a task stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Finished,
    Cancelled,
    Timeout,
}

#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    #[error("already started")]
    AlreadyStarted,
}

/// Controller for one background task: start once, stop with a deadline.
///
/// State lives in atomics; `handle` and `cancel` sit behind short-lived locks.
pub struct Lifecycle {
    status: Arc<AtomicU8>,
    handle: Mutex<Option<JoinHandle<()>>>,
    cancel: Mutex<Option<CancellationToken>>,
    finished: Arc<AtomicBool>,
    was_cancelled: Arc<AtomicBool>,
    finished_notify: Arc<Notify>,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self {
            status: Arc::new(AtomicU8::new(Status::Stopped.as_u8())),
            handle: Mutex::new(None),
            cancel: Mutex::new(None),
            finished: Arc::new(AtomicBool::new(false)),
            was_cancelled: Arc::new(AtomicBool::new(false)),
            finished_notify: Arc::new(Notify::new()),
        }
    }

    #[inline]
    fn store_status(&self, s: Status) {
        self.status.store(s.as_u8(), Ordering::Release);
    }

    /// Spawn the job with a fresh token.
    pub fn start<F, Fut>(&self, make: F) -> LcResult
    where
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: std::future::Future<Output = TaskResult<()>> + Send + 'static,
    {
        self.start_with_token(CancellationToken::new(), make)
    }

    /// Spawn the job bound to `token` (usually a child of the runtime token).
    #[tracing::instrument(skip(self, make, token), level = "debug")]
    pub fn start_with_token<F, Fut>(&self, token: CancellationToken, make: F) -> LcResult
    where
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: std::future::Future<Output = TaskResult<()>> + Send + 'static,
    {
        self.status
            .compare_exchange(
                Status::Stopped.as_u8(),
                Status::Running.as_u8(),
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .map_err(|_| LifecycleError::AlreadyStarted)?;

        self.finished.store(false, Ordering::Release);
        self.was_cancelled.store(false, Ordering::Release);
        *self.cancel.lock() = Some(token.clone());

        let finished_flag = self.finished.clone();
        let finished_notify = self.finished_notify.clone();
        let status_on_finish = self.status.clone();

        // The future is built inside the task so a panicking `make` cannot leave us Running.
        let handle = tokio::spawn(async move {
            if let Err(e) = make(token).await {
                tracing::error!(error = %e, "lifecycle task error");
            }
            finished_flag.store(true, Ordering::Release);
            finished_notify.notify_waiters();
            status_on_finish.store(Status::Stopped.as_u8(), Ordering::Release);
            tracing::debug!("lifecycle status -> stopped (finished)");
        });

        *self.handle.lock() = Some(handle);
        Ok(())
    }

    /// Request graceful shutdown and wait up to `timeout`; abort after that.
    #[tracing::instrument(skip(self, timeout), level = "debug")]
    pub async fn stop(&self, timeout: Duration) -> StopReason {
        if self.handle.lock().is_none() {
            return StopReason::Finished;
        }
        if self.finished.load(Ordering::Acquire) {
            let handle_opt = { self.handle.lock().take() };
            if let Some(handle) = handle_opt {
                let _ = handle.await;
            }
            self.cancel.lock().take();
            self.store_status(Status::Stopped);
            return StopReason::Finished;
        }

        self.store_status(Status::Stopping);

        if let Some(tok) = { self.cancel.lock().take() } {
            self.was_cancelled.store(true, Ordering::Release);
            tok.cancel();
        }

        let finished_flag = self.finished.clone();
        let notify = self.finished_notify.clone();
        let finished_wait = async move {
            let notified = notify.notified();
            if finished_flag.load(Ordering::Acquire) {
                return;
            }
            notified.await;
        };

        let reason = tokio::select! {
            _ = finished_wait => {
                if self.was_cancelled.load(Ordering::Acquire) {
                    StopReason::Cancelled
                } else {
                    StopReason::Finished
                }
            }
            _ = tokio::time::sleep(timeout) => StopReason::Timeout,
        };

        let handle_opt = { self.handle.lock().take() };
        if let Some(handle) = handle_opt {
            if reason == StopReason::Timeout && !handle.is_finished() {
                tracing::warn!("lifecycle stop timed out; aborting task");
                handle.abort();
            }
            match handle.await {
                Ok(()) => {}
                Err(e) if e.is_cancelled() => tracing::debug!("task aborted"),
                Err(e) => tracing::warn!(error = %e, "task join error"),
            }
            self.finished.store(true, Ordering::Release);
            self.finished_notify.notify_waiters();
        }

        self.store_status(Status::Stopped);
        tracing::info!(?reason, "lifecycle stopped");
        reason
    }

    #[inline]
    #[must_use]
    pub fn status(&self) -> Status {
        Status::from_u8(self.status.load(Ordering::Acquire))
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.status() == Status::Running
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Lifecycle {
    /// Don't leave an orphaned task behind when the owner forgets `stop()`.
    fn drop(&mut self) {
        if let Some(tok) = self.cancel.get_mut().take() {
            tok.cancel();
        }
        if let Some(handle) = self.handle.get_mut().take() {
            handle.abort();
        }
    }
}
