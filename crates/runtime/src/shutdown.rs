use std::{
    future::Future,
    io,
    pin::Pin,
    task::{Context, Poll},
    time::Duration,
};

use futures::{FutureExt, future::join_all};
use tokio::{
    signal::unix::{Signal, SignalKind},
    task::JoinHandle,
    time::timeout,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Resolves on the first SIGINT or SIGTERM the process receives.
pub struct ShutdownSignal {
    ctrl_c: Pin<Box<dyn Future<Output = io::Result<()>> + Send>>,
    term_signal: Signal,
}

impl std::fmt::Debug for ShutdownSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShutdownSignal").finish_non_exhaustive()
    }
}

impl ShutdownSignal {
    /// Install the signal handlers.
    pub fn new() -> io::Result<Self> {
        let ctrl_c = Box::pin(tokio::signal::ctrl_c());
        let term_signal = tokio::signal::unix::signal(SignalKind::terminate())?;
        Ok(Self { ctrl_c, term_signal })
    }

    /// Cancel `token` once a signal arrives.
    pub fn cancel_on_signal(self, token: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            tokio::select! {
                _ = self => {
                    info!("Shutdown signal received");
                    token.cancel();
                }
                _ = token.cancelled() => {}
            }
        })
    }
}

impl Future for ShutdownSignal {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();

        if this.ctrl_c.poll_unpin(cx).is_ready() {
            debug!("Received SIGINT signal");
            return Poll::Ready(());
        }

        if this.term_signal.poll_recv(cx).is_ready() {
            debug!("Received SIGTERM signal");
            return Poll::Ready(());
        }

        Poll::Pending
    }
}

/// Wait for `handles` to finish, giving up after `grace`.
///
/// Returns `true` if every task finished in time. Stragglers are aborted.
pub async fn drain(handles: Vec<JoinHandle<()>>, grace: Duration) -> bool {
    let aborts: Vec<_> = handles.iter().map(JoinHandle::abort_handle).collect();
    match timeout(grace, join_all(handles)).await {
        Ok(results) => {
            for e in results.into_iter().filter_map(Result::err) {
                warn!(err = %e, "Task ended abnormally");
            }
            debug!("All tasks drained");
            true
        }
        Err(_) => {
            warn!(grace = ?grace, "Graceful shutdown timeout exceeded, aborting remaining tasks");
            aborts.iter().for_each(|handle| handle.abort());
            false
        }
    }
}
