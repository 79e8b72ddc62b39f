//! Process supervisor for the catalog service.
//!
//! A [`Runner`] owns a set of named, long-running app processes (the HTTP
//! server, for instance) and a set of closers. Processes share one
//! [`CancellationToken`]; the token is cancelled when a process fails, when
//! SIGINT/SIGTERM arrives, or when the caller cancels it. Closers then run
//! concurrently under a timeout, whatever the reason for stopping.
//!
//! # Example
//!
//! ```no_run
//! use rvm_runner::Runner;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() {
//!     let exit_code = Runner::new()
//!         .with_named_process("heartbeat", |ctx| async move {
//!             loop {
//!                 tokio::select! {
//!                     _ = ctx.cancelled() => break,
//!                     _ = tokio::time::sleep(Duration::from_secs(1)) => {
//!                         tracing::info!("still alive");
//!                     }
//!                 }
//!             }
//!             Ok(())
//!         })
//!         .with_closer(|| async move {
//!             tracing::info!("Cleaning up resources");
//!             Ok(())
//!         })
//!         .with_closer_timeout(Duration::from_secs(5))
//!         .run()
//!         .await;
//!
//!     std::process::exit(exit_code);
//! }
//! ```

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

type BoxedResultFuture = Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send>>;

/// An app process: receives the shared cancellation token and runs until it
/// is cancelled or fails
pub type AppProcess = Box<dyn FnOnce(CancellationToken) -> BoxedResultFuture + Send>;

/// A cleanup function run after all app processes have stopped
pub type Closer = Box<dyn FnOnce() -> BoxedResultFuture + Send>;

pub struct Runner {
    app_processes: Vec<(String, AppProcess)>,
    closers: Vec<Closer>,
    closer_timeout: Duration,
    cancellation_token: CancellationToken,
}

impl Default for Runner {
    fn default() -> Self {
        Self::new()
    }
}

impl Runner {
    /// Runner with no processes, no closers and a 10 second closer timeout
    pub fn new() -> Self {
        Self {
            app_processes: Vec::new(),
            closers: Vec::new(),
            closer_timeout: Duration::from_secs(10),
            cancellation_token: CancellationToken::new(),
        }
    }

    /// Adds a named app process. The name shows up in every log line the
    /// runner emits about the process.
    pub fn with_named_process<F, Fut>(mut self, name: impl Into<String>, process: F) -> Self
    where
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let process: AppProcess =
            Box::new(move |token| -> BoxedResultFuture { Box::pin(process(token)) });
        self.app_processes.push((name.into(), process));
        self
    }

    /// Adds a closer. All closers run even if some of them fail.
    pub fn with_closer<F, Fut>(mut self, closer: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let closer: Closer = Box::new(move || -> BoxedResultFuture { Box::pin(closer()) });
        self.closers.push(closer);
        self
    }

    pub fn with_closer_timeout(mut self, timeout: Duration) -> Self {
        self.closer_timeout = timeout;
        self
    }

    /// Use an externally owned token, so callers can stop the runner themselves
    pub fn with_cancellation_token(mut self, token: CancellationToken) -> Self {
        self.cancellation_token = token;
        self
    }

    /// Runs every process until cancellation or the first failure, then the
    /// closers. Returns the process exit code: 1 if a process failed, else 0.
    pub async fn run(self) -> i32 {
        let token = self.cancellation_token;
        let mut join_set = JoinSet::new();

        for (name, process) in self.app_processes {
            let process_token = token.clone();
            join_set.spawn(async move {
                debug!(process = %name, "starting app process");
                let result = process(process_token).await;
                (name, result)
            });
        }

        spawn_signal_handlers(token.clone());

        let mut failed = false;
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((name, Ok(()))) => {
                    debug!(process = %name, "app process completed");
                }
                Ok((name, Err(err))) => {
                    if !token.is_cancelled() {
                        error!(process = %name, "app process error: {:#}", err);
                        failed = true;
                        token.cancel();
                    }
                }
                Err(err) => {
                    error!("app process panicked: {}", err);
                    failed = true;
                    token.cancel();
                }
            }

            if token.is_cancelled() {
                break;
            }
        }

        join_set.shutdown().await;

        Self::run_closers(self.closers, self.closer_timeout).await;

        if failed {
            error!("application exiting with error");
            1
        } else {
            info!("application exiting normally");
            0
        }
    }

    async fn run_closers(closers: Vec<Closer>, timeout: Duration) {
        if closers.is_empty() {
            return;
        }

        info!("running closers with timeout of {:?}", timeout);

        let mut closer_set = JoinSet::new();
        for closer in closers {
            closer_set.spawn(closer());
        }

        let all_closed = async {
            while let Some(result) = closer_set.join_next().await {
                match result {
                    Ok(Ok(())) => debug!("closer completed"),
                    Ok(Err(err)) => error!("closer error: {:#}", err),
                    Err(err) => error!("closer panicked: {}", err),
                }
            }
        };

        match tokio::time::timeout(timeout, all_closed).await {
            Ok(()) => info!("all closers completed"),
            Err(_) => error!("closers timed out after {:?}", timeout),
        }
    }
}

fn spawn_signal_handlers(token: CancellationToken) {
    let ctrl_c_token = token.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("received shutdown signal");
                ctrl_c_token.cancel();
            }
            Err(err) => error!("error setting up signal handler: {}", err),
        }
    });

    #[cfg(unix)]
    tokio::spawn(async move {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
                info!("received SIGTERM signal");
                token.cancel();
            }
            Err(err) => error!("error setting up SIGTERM handler: {}", err),
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_cancellation_runs_closers_and_exits_cleanly() {
        let closer_called = Arc::new(AtomicBool::new(false));
        let flag = closer_called.clone();
        let token = CancellationToken::new();

        let runner = Runner::new()
            .with_named_process("waits", |ctx| async move {
                ctx.cancelled().await;
                Ok(())
            })
            .with_closer(move || async move {
                flag.store(true, Ordering::SeqCst);
                Ok(())
            })
            .with_cancellation_token(token.clone());

        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            canceller.cancel();
        });

        assert_eq!(runner.run().await, 0);
        assert!(closer_called.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_failing_process_cancels_siblings() {
        let runner = Runner::new()
            .with_named_process("sibling", |ctx| async move {
                ctx.cancelled().await;
                Ok(())
            })
            .with_named_process("fails", |_ctx| async move {
                Err::<(), _>(anyhow::anyhow!("boom"))
            });

        assert_eq!(runner.run().await, 1);
    }

    #[tokio::test]
    async fn test_all_closers_run_even_when_one_fails() {
        let counter = Arc::new(AtomicUsize::new(0));
        let first = counter.clone();
        let second = counter.clone();

        let failing: Closer = Box::new(move || -> BoxedResultFuture {
            Box::pin(async move {
                first.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(anyhow::anyhow!("closer failed"))
            })
        });
        let succeeding: Closer = Box::new(move || -> BoxedResultFuture {
            Box::pin(async move {
                second.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
        });

        Runner::run_closers(vec![failing, succeeding], Duration::from_secs(1)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_slow_closers_time_out() {
        let slow: Closer = Box::new(|| -> BoxedResultFuture {
            Box::pin(async move {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(())
            })
        });

        let started = std::time::Instant::now();
        Runner::run_closers(vec![slow], Duration::from_millis(50)).await;
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
