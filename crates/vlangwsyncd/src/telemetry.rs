//! Optional error-event telemetry.
//!
//! Initialized once at startup. Errors are sampled and queued to a
//! background sender task; [`TelemetryGuard::shutdown`] flushes the queue on
//! process exit. When no telemetry endpoint is configured the handle is a
//! no-op. Nothing below the agent level ever reports here.

use crate::config::TelemetryConfig;
use crate::error::{SyncError, SyncResult};
use serde::Serialize;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

const QUEUE_DEPTH: usize = 64;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const FLUSH_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Serialize)]
struct ErrorEvent {
    source: &'static str,
    message: String,
}

/// Cheap, cloneable handle for reporting error events.
#[derive(Clone)]
pub struct TelemetryHandle {
    tx: Option<mpsc::Sender<ErrorEvent>>,
    sample_rate: f64,
}

/// Owns the background sender task.
pub struct TelemetryGuard {
    worker: Option<JoinHandle<()>>,
}

/// Initializes telemetry from configuration. Without configuration the
/// returned handle discards every event and shutdown is immediate.
pub fn init(config: Option<&TelemetryConfig>) -> SyncResult<(TelemetryHandle, TelemetryGuard)> {
    let Some(config) = config else {
        return Ok((
            TelemetryHandle {
                tx: None,
                sample_rate: 0.0,
            },
            TelemetryGuard { worker: None },
        ));
    };

    let http = reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .map_err(|e| SyncError::config("telemetry.endpoint", e.to_string()))?;
    let endpoint = config.endpoint.clone();
    let (tx, mut rx) = mpsc::channel::<ErrorEvent>(QUEUE_DEPTH);

    let worker = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            match http.post(&endpoint).json(&event).send().await {
                Ok(_) => {}
                Err(error) => debug!(%error, "failed to deliver telemetry event"),
            }
        }
    });

    Ok((
        TelemetryHandle {
            tx: Some(tx),
            sample_rate: config.sample_rate,
        },
        TelemetryGuard {
            worker: Some(worker),
        },
    ))
}

impl TelemetryHandle {
    /// Queues an error event, subject to sampling. Never blocks the sync
    /// path; events are dropped when the queue is full.
    pub fn report(&self, error: &SyncError) {
        let Some(tx) = &self.tx else { return };
        if !sampled(self.sample_rate) {
            return;
        }
        let event = ErrorEvent {
            source: "vlangwsyncd",
            message: error.to_string(),
        };
        if tx.try_send(event).is_err() {
            debug!("telemetry queue full, dropping event");
        }
    }
}

impl TelemetryGuard {
    /// Drains queued events and stops the sender task.
    ///
    /// Completes once every [`TelemetryHandle`] clone has been dropped and
    /// the queue is empty, bounded by a flush timeout.
    pub async fn shutdown(mut self) {
        let Some(mut worker) = self.worker.take() else {
            return;
        };
        if tokio::time::timeout(FLUSH_TIMEOUT, &mut worker).await.is_err() {
            debug!("telemetry flush timed out");
            worker.abort();
        }
    }
}

fn sampled(rate: f64) -> bool {
    rand::random::<f64>() < rate
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sampling_extremes() {
        for _ in 0..100 {
            assert!(!sampled(0.0));
            assert!(sampled(1.0));
        }
    }

    #[tokio::test]
    async fn test_unconfigured_telemetry_is_noop() {
        let (handle, guard) = init(None).unwrap();
        handle.report(&SyncError::session("10.20.0.11", "unreachable"));
        guard.shutdown().await;
    }

    #[tokio::test]
    async fn test_shutdown_flushes_after_handles_drop() {
        let config = TelemetryConfig {
            endpoint: "http://127.0.0.1:9/ingest".to_string(),
            sample_rate: 0.0,
        };
        let (handle, guard) = init(Some(&config)).unwrap();
        // Sample rate 0.0: nothing is queued, the worker just drains.
        handle.report(&SyncError::session("10.20.0.11", "unreachable"));
        drop(handle);
        guard.shutdown().await;
    }
}
