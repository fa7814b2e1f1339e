//! Background keepalive task
//!
//! Idle IMAP sessions get dropped by servers and middleboxes. The
//! keepalive task periodically borrows a connection from the pool,
//! issues a NOOP, and returns it, so pooled sessions stay warm
//! between sync passes.
//!
//! The task runs until cancelled. Cancellation is observed between
//! cycles, never mid-cycle: after a stop signal at most one in-flight
//! cycle completes before the task exits. A failed cycle (acquire or
//! NOOP) is logged and the loop continues.

use crate::pool::ConnectionPool;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Handle to a running keepalive task.
pub(crate) struct KeepaliveTask {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl KeepaliveTask {
    /// Spawn the keepalive loop. The caller guarantees a non-zero
    /// interval.
    pub(crate) fn start(pool: ConnectionPool, interval: Duration) -> Self {
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    () = token.cancelled() => break,
                    () = tokio::time::sleep(interval) => {}
                }

                match pool.acquire().await {
                    Ok(mut conn) => match conn.noop().await {
                        Ok(()) => debug!("Keepalive NOOP completed"),
                        Err(e) => {
                            warn!("Keepalive NOOP failed: {}", e);
                            // The session is likely dead; do not
                            // return it to the pool.
                            conn.discard();
                        }
                    },
                    Err(e) => warn!("Keepalive could not acquire a connection: {}", e),
                }
            }
            debug!("Keepalive task exiting");
        });

        Self { cancel, handle }
    }

    /// Signal cancellation. With `abrupt` the call returns
    /// immediately; otherwise it waits until the task has observed
    /// the signal and exited.
    pub(crate) async fn stop(self, abrupt: bool) {
        self.cancel.cancel();
        if !abrupt {
            self.handle.await.ok();
        }
    }
}
