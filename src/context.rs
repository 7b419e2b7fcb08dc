use parking_lot::Mutex;
use std::fmt;
use std::io::{self, Read};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::{Error, Result};

type Watcher = Box<dyn FnOnce() + Send>;

#[derive(Default)]
struct CancelState {
    cancelled: bool,
    next_id: u64,
    watchers: Vec<(u64, Watcher)>,
}

/// Shared cancellation flag. Clones observe the same flag.
///
/// Cancelling wakes every request currently waiting on the token.
#[derive(Clone, Default)]
pub struct CancelToken(Arc<Mutex<CancelState>>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        let watchers = {
            let mut state = self.0.lock();
            if state.cancelled {
                return;
            }
            state.cancelled = true;
            std::mem::take(&mut state.watchers)
        };
        // Run outside the lock; a watcher may touch the token again.
        for (_, wake) in watchers {
            wake();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.lock().cancelled
    }

    /// Registers `wake` to run once on cancellation. Runs it right away if
    /// the token is already cancelled. Dropping the guard unregisters it.
    pub(crate) fn watch(&self, wake: impl FnOnce() + Send + 'static) -> CancelWatch {
        let mut state = self.0.lock();
        if state.cancelled {
            drop(state);
            wake();
            return CancelWatch { token: None, id: 0 };
        }
        let id = state.next_id;
        state.next_id += 1;
        state.watchers.push((id, Box::new(wake)));
        CancelWatch {
            token: Some(self.clone()),
            id,
        }
    }
}

impl fmt::Debug for CancelToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.0.lock();
        f.debug_struct("CancelToken")
            .field("cancelled", &state.cancelled)
            .field("watchers", &state.watchers.len())
            .finish()
    }
}

/// Keeps a cancellation watcher registered while alive.
#[must_use]
pub(crate) struct CancelWatch {
    token: Option<CancelToken>,
    id: u64,
}

impl Drop for CancelWatch {
    fn drop(&mut self) {
        if let Some(token) = &self.token {
            token.0.lock().watchers.retain(|(id, _)| *id != self.id);
        }
    }
}

/// Per-call cancellation and deadline.
///
/// The transport waits on the context while the request is in flight, so
/// cancelling the token or reaching the deadline ends the call immediately.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    deadline: Option<Instant>,
    cancel: Option<CancelToken>,
}

impl RequestContext {
    /// A context that is never cancelled and has no deadline.
    pub fn background() -> Self {
        Self::default()
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Sets the deadline, keeping the earlier one if already set.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(current) if current < deadline => current,
            _ => deadline,
        });
        self
    }

    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline; `None` when there is no deadline.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancelToken::is_cancelled)
    }

    pub(crate) fn deadline_passed(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Runs `wake` when the context is cancelled; `None` without a token.
    pub(crate) fn on_cancel(&self, wake: impl FnOnce() + Send + 'static) -> Option<CancelWatch> {
        self.cancel.as_ref().map(|token| token.watch(wake))
    }

    pub(crate) fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            return Err(Error::Cancelled);
        }
        if self.deadline_passed() {
            return Err(Error::DeadlineExceeded);
        }
        Ok(())
    }
}

/// Body reader that fails once its context is cancelled or expired.
pub(crate) struct ContextReader<'a, R> {
    inner: R,
    ctx: &'a RequestContext,
}

impl<'a, R: Read> ContextReader<'a, R> {
    pub(crate) fn new(inner: R, ctx: &'a RequestContext) -> Self {
        Self { inner, ctx }
    }
}

impl<R: Read> Read for ContextReader<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if let Err(e) = self.ctx.check() {
            return Err(io::Error::other(e.to_string()));
        }
        self.inner.read(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn background_never_fails() {
        let ctx = RequestContext::background();
        assert!(ctx.check().is_ok());
        assert_eq!(ctx.remaining(), None);
        assert!(ctx.on_cancel(|| {}).is_none());
    }

    #[test]
    fn cancel_is_shared_between_clones() {
        let token = CancelToken::new();
        let ctx = RequestContext::background().with_cancel(token.clone());
        assert!(ctx.check().is_ok());
        token.cancel();
        assert!(matches!(ctx.check(), Err(Error::Cancelled)));
    }

    #[test]
    fn expired_deadline_is_reported() {
        let ctx = RequestContext::background().with_deadline(Instant::now());
        assert!(matches!(ctx.check(), Err(Error::DeadlineExceeded)));
        assert_eq!(ctx.remaining(), Some(Duration::ZERO));
    }

    #[test]
    fn earlier_deadline_wins() {
        let soon = Instant::now() + Duration::from_secs(1);
        let ctx = RequestContext::background()
            .with_deadline(soon)
            .with_timeout(Duration::from_secs(3600));
        assert_eq!(ctx.deadline(), Some(soon));
    }

    #[test]
    fn watchers_run_once_on_cancel() {
        let token = CancelToken::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let _watch = token.watch(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        token.cancel();
        token.cancel();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn watch_after_cancel_runs_immediately() {
        let token = CancelToken::new();
        token.cancel();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let _watch = token.watch(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn dropped_watch_is_unregistered() {
        let token = CancelToken::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        drop(token.watch(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        assert_eq!(token.0.lock().watchers.len(), 0);
        token.cancel();
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn reader_stops_after_cancel() {
        let token = CancelToken::new();
        let ctx = RequestContext::background().with_cancel(token.clone());
        let mut reader = ContextReader::new(&b"{\"type\":"[..], &ctx);
        let mut buf = [0u8; 4];
        assert_eq!(reader.read(&mut buf).unwrap(), 4);
        token.cancel();
        assert!(reader.read(&mut buf).is_err());
    }
}
