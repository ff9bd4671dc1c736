//! Interval polling of `{success, data, error}` endpoints.
//!
//! One background task per feed: an immediate fetch, then one per tick, plus on-demand
//! refetches. Fetches within a feed never overlap. Dropping the feed stops the task.

use serde::de::DeserializeOwned;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::debug;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);
pub const FALLBACK_ERROR: &str = "Failed to fetch data";

#[derive(Debug, Clone, PartialEq)]
pub struct FeedState<T> {
    pub data: Option<T>,
    pub loading: bool,
    pub error: Option<String>,
}

impl<T> Default for FeedState<T> {
    fn default() -> Self {
        Self {
            data: None,
            loading: true,
            error: None,
        }
    }
}

pub struct PollingFeed<T> {
    state: watch::Receiver<FeedState<T>>,
    refetch: mpsc::Sender<()>,
    task: JoinHandle<()>,
}

impl<T> PollingFeed<T>
where
    T: DeserializeOwned + Clone + Send + Sync + 'static,
{
    /// Starts polling `url` every `every`. Must be called inside a Tokio runtime.
    pub fn spawn(client: reqwest::Client, url: impl Into<String>, every: Duration) -> Self {
        let url = url.into();
        let (state_tx, state_rx) = watch::channel(FeedState::default());
        // capacity 1: refetch requests made while one is pending coalesce
        let (refetch_tx, mut refetch_rx) = mpsc::channel::<()>(1);

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {}
                    Some(()) = refetch_rx.recv() => {}
                }
                let outcome = fetch_envelope::<T>(&client, &url).await;
                if let Err(ref e) = outcome {
                    debug!(target: "blox::polling", url = %url, error = %e, "poll failed");
                }
                state_tx.send_modify(|state| {
                    state.loading = false;
                    match outcome {
                        Ok(data) => {
                            state.data = Some(data);
                            state.error = None;
                        }
                        // previous data stays visible
                        Err(e) => state.error = Some(e),
                    }
                });
            }
        });

        Self {
            state: state_rx,
            refetch: refetch_tx,
            task,
        }
    }

    pub fn with_default_interval(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self::spawn(client, url, DEFAULT_POLL_INTERVAL)
    }

    pub fn snapshot(&self) -> FeedState<T> {
        self.state.borrow().clone()
    }

    /// Requests a fetch outside the schedule.
    pub fn refetch(&self) {
        let _ = self.refetch.try_send(());
    }

    /// Waits for the next state change. Returns false once the feed task has ended.
    pub async fn changed(&mut self) -> bool {
        self.state.changed().await.is_ok()
    }

    pub fn stop(self) {}
}

impl<T> Drop for PollingFeed<T> {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// One fetch of a `{success, data}` envelope. Errors are the strings the pages display.
pub async fn fetch_envelope<T: DeserializeOwned>(
    client: &reqwest::Client,
    url: &str,
) -> Result<T, String> {
    let res = client.get(url).send().await.map_err(|e| e.to_string())?;
    if !res.status().is_success() {
        return Err(format!("HTTP error! status: {}", res.status().as_u16()));
    }
    let body: serde_json::Value = res.json().await.map_err(|e| e.to_string())?;
    if body.get("success").and_then(|s| s.as_bool()) == Some(true) {
        let data = body.get("data").cloned().unwrap_or(serde_json::Value::Null);
        return serde_json::from_value(data).map_err(|e| e.to_string());
    }
    Err(envelope_error(&body))
}

fn envelope_error(body: &serde_json::Value) -> String {
    match body.get("error") {
        Some(serde_json::Value::String(s)) if !s.is_empty() => s.clone(),
        Some(serde_json::Value::Object(o)) => o
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap_or(FALLBACK_ERROR)
            .to_string(),
        _ => FALLBACK_ERROR.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_error_messages() {
        assert_eq!(envelope_error(&serde_json::json!({"success": false})), FALLBACK_ERROR);
        assert_eq!(
            envelope_error(&serde_json::json!({"success": false, "error": "Failed to fetch agents"})),
            "Failed to fetch agents"
        );
        assert_eq!(
            envelope_error(&serde_json::json!({"error": {"code": "UNAUTHORIZED", "message": "Unauthorized"}})),
            "Unauthorized"
        );
        assert_eq!(envelope_error(&serde_json::json!({"error": ""})), FALLBACK_ERROR);
    }

    #[test]
    fn initial_state_is_loading() {
        let s: FeedState<u32> = FeedState::default();
        assert!(s.loading);
        assert!(s.data.is_none() && s.error.is_none());
    }
}
