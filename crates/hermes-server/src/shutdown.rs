//! Graceful shutdown.
//!
//! [`ShutdownSignal`] stops the accept loop; [`ConnectionTracker`] lets the
//! server wait for in-flight connections to drain before it returns.
//!
//! ```rust,ignore
//! use hermes_server::ShutdownSignal;
//! use std::time::Duration;
//!
//! let shutdown = ShutdownSignal::with_os_signals();
//! tokio::select! {
//!     () = shutdown.recv() => println!("stopping"),
//!     () = tokio::time::sleep(Duration::from_secs(60)) => println!("still running"),
//! }
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};

use tokio::sync::{broadcast, Notify};

/// A cloneable trigger that every server task can await.
///
/// ```rust
/// use hermes_server::ShutdownSignal;
///
/// let shutdown = ShutdownSignal::new();
/// let handle = shutdown.clone();
///
/// handle.trigger();
/// assert!(shutdown.is_shutdown());
/// ```
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    triggered: Arc<AtomicBool>,
    sender: broadcast::Sender<()>,
}

impl ShutdownSignal {
    /// Creates an untriggered signal.
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(1);
        Self {
            triggered: Arc::new(AtomicBool::new(false)),
            sender,
        }
    }

    /// Triggers shutdown. Repeated calls have no further effect.
    pub fn trigger(&self) {
        if self
            .triggered
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            // No receivers is fine.
            let _ = self.sender.send(());
        }
    }

    /// Whether shutdown has been triggered.
    #[must_use]
    pub fn is_shutdown(&self) -> bool {
        self.triggered.load(Ordering::SeqCst)
    }

    /// A future that resolves once shutdown is triggered, immediately if it
    /// already was.
    pub fn recv(&self) -> ShutdownReceiver {
        let triggered = Arc::clone(&self.triggered);
        // Subscribe now so a trigger between this call and the first poll is seen.
        let mut receiver = self.sender.subscribe();
        ShutdownReceiver {
            inner: Box::pin(async move {
                if triggered.load(Ordering::SeqCst) {
                    return;
                }
                // A closed or lagged channel also means the signal fired.
                let _ = receiver.recv().await;
            }),
        }
    }

    /// Creates a signal triggered by SIGTERM or SIGINT (Ctrl+C elsewhere).
    ///
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn with_os_signals() -> Self {
        let signal = Self::new();
        let trigger = signal.clone();

        tokio::spawn(async move {
            if wait_for_os_signal().await {
                trigger.trigger();
            }
        });

        signal
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

/// Future returned by [`ShutdownSignal::recv`].
pub struct ShutdownReceiver {
    inner: Pin<Box<dyn Future<Output = ()> + Send>>,
}

impl std::fmt::Debug for ShutdownReceiver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShutdownReceiver").finish_non_exhaustive()
    }
}

impl Future for ShutdownReceiver {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.inner.as_mut().poll(cx)
    }
}

/// Resolves `true` once an OS shutdown signal arrives, or `false` when the
/// handlers cannot be installed.
async fn wait_for_os_signal() -> bool {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let (mut sigterm, mut sigint) =
            match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
                (Ok(term), Ok(int)) => (term, int),
                (Err(e), _) | (_, Err(e)) => {
                    tracing::error!(error = %e, "failed to install signal handlers");
                    return false;
                }
            };

        tokio::select! {
            _ = sigterm.recv() => tracing::info!("received SIGTERM, shutting down"),
            _ = sigint.recv() => tracing::info!("received SIGINT, shutting down"),
        }
        true
    }

    #[cfg(not(unix))]
    {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("received Ctrl+C, shutting down");
                true
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for Ctrl+C");
                false
            }
        }
    }
}

/// Counts open connections so shutdown can wait for them.
///
/// ```rust
/// use hermes_server::ConnectionTracker;
///
/// let tracker = ConnectionTracker::new();
/// let token = tracker.acquire();
/// assert_eq!(tracker.active_connections(), 1);
/// drop(token);
/// assert_eq!(tracker.active_connections(), 0);
/// ```
#[derive(Debug, Clone)]
pub struct ConnectionTracker {
    active: Arc<AtomicUsize>,
    notify: Arc<Notify>,
}

impl ConnectionTracker {
    /// Creates a tracker with no connections.
    #[must_use]
    pub fn new() -> Self {
        Self {
            active: Arc::new(AtomicUsize::new(0)),
            notify: Arc::new(Notify::new()),
        }
    }

    /// Registers a connection until the returned token is dropped.
    #[must_use]
    pub fn acquire(&self) -> ConnectionToken {
        self.active.fetch_add(1, Ordering::SeqCst);
        ConnectionToken {
            active: Arc::clone(&self.active),
            notify: Arc::clone(&self.notify),
        }
    }

    /// Number of open connections.
    #[must_use]
    pub fn active_connections(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// Waits until every token has been dropped.
    pub async fn wait_for_drain(&self) {
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            // Register before checking so a drop in between is not missed.
            notified.as_mut().enable();
            if self.active.load(Ordering::SeqCst) == 0 {
                return;
            }
            notified.await;
        }
    }
}

impl Default for ConnectionTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// Held for the lifetime of one connection.
#[derive(Debug)]
pub struct ConnectionToken {
    active: Arc<AtomicUsize>,
    notify: Arc<Notify>,
}

impl Drop for ConnectionToken {
    fn drop(&mut self) {
        if self.active.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.notify.notify_waiters();
        }
    }
}
