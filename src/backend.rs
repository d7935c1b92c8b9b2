use crate::app::{BackendEvent, BackendTask};
use crate::infra::ChezmoiClient;
use std::sync::Arc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

/// Runs fire-and-forget captured commands off the event loop. Results come
/// back as `BackendEvent`s; the worker never touches `App`.
pub(crate) async fn worker_loop(
    client: Arc<dyn ChezmoiClient>,
    mut task_rx: UnboundedReceiver<BackendTask>,
    event_tx: UnboundedSender<BackendEvent>,
) {
    while let Some(task) = task_rx.recv().await {
        let event = match task {
            BackendTask::RunAction { request } => {
                let c = client.clone();
                let req = request.clone();
                let result = tokio::task::spawn_blocking(move || c.run(&req)).await;
                match result {
                    Ok(Ok(result)) => {
                        tracing::info!(
                            action = request.action.label(),
                            exit = result.exit_code,
                            duration_ms = result.duration_ms,
                            "background action finished"
                        );
                        BackendEvent::ActionFinished { request, result }
                    }
                    other => {
                        let message = flatten_error(other);
                        tracing::warn!(action = request.action.label(), %message, "background action failed");
                        BackendEvent::Error {
                            context: request.action.label().to_string(),
                            message,
                        }
                    }
                }
            }
            BackendTask::Status => {
                let c = client.clone();
                let result = tokio::task::spawn_blocking(move || c.status()).await;
                match result {
                    Ok(Ok(result)) => BackendEvent::StatusChecked { result },
                    other => {
                        let message = flatten_error(other);
                        tracing::warn!(%message, "status probe failed");
                        BackendEvent::Error {
                            context: "status".to_string(),
                            message,
                        }
                    }
                }
            }
        };

        if event_tx.send(event).is_err() {
            break;
        }
    }
}

fn flatten_error<T>(
    res: std::result::Result<crate::error::Result<T>, tokio::task::JoinError>,
) -> String {
    match res {
        Ok(Ok(_)) => "ok".to_string(),
        Ok(Err(err)) => err.to_string(),
        Err(err) => format!("join error: {err}"),
    }
}
