//! Application execution logic.
//!
//! This module runs the selected command: queries and document fetches
//! against the API, or signing and verification of webhook payloads.

use std::io::Read;

use serde_json::Value;
use thiserror::Error;
use tokio::signal;
use tokio_util::sync::CancellationToken;

use sanity_client::config::{Action, BodySource, ConfigError, ValidatedConfig, write_default_config};
use sanity_client::time::{Clock, Sleeper, SystemClock};
use sanity_client::transport::HttpClient;
use sanity_client::webhook::{WebhookError, encode_signature_header, is_valid_signature, sign_now};
use sanity_client::Client;

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;

/// Error type for runtime execution failures.
#[derive(Debug, Error)]
pub enum RunError {
    /// The API request failed.
    #[error("Request failed: {0}")]
    Client(#[from] sanity_client::Error),

    /// The signature header could not be checked.
    #[error("Webhook verification failed: {0}")]
    Webhook(#[from] WebhookError),

    /// The signature header did not match the payload.
    #[error("Signature does not match payload")]
    SignatureMismatch,

    /// Failed to read the webhook payload.
    #[error("Failed to read payload from {from}: {source}")]
    ReadBody {
        /// Where the payload was read from
        from: BodySource,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Failed to write the config template.
    #[error(transparent)]
    Init(#[from] ConfigError),

    /// Failed to render output.
    #[error("Failed to render output: {0}")]
    Output(#[source] serde_json::Error),
}

/// Executes the configured command and prints its output.
///
/// Ctrl+C (or SIGTERM) cancels an in-flight request, including any
/// backoff sleep between retries.
///
/// # Errors
///
/// Returns an error if:
/// - The API responds with an error or cannot be reached
/// - The payload cannot be read
/// - A signature is malformed or does not match
///
/// # Coverage Note
///
/// This function is excluded from coverage because it requires real
/// signal handling and writes to stdout.
#[cfg(not(tarpaulin_include))]
pub async fn execute(config: ValidatedConfig) -> Result<(), RunError> {
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        tracing::info!("Shutdown signal received, cancelling...");
        trigger.cancel();
    });

    let output = match config.action {
        Action::Init { output } => {
            write_default_config(&output)?;
            format!("Configuration template written to: {}", output.display())
        }
        Action::Query {
            client,
            query,
            params,
        } => {
            let client = Client::new(client)?;
            render(&run_query(&client, &query, &params, &cancel).await?)?
        }
        Action::Get { client, ids } => {
            let client = Client::new(client)?;
            render(&run_get(&client, &ids, &cancel).await?)?
        }
        Action::Verify {
            secret,
            signature,
            body,
        } => {
            verify(&secret, &signature, &read_body(&body)?)?;
            "Signature is valid".to_string()
        }
        Action::Sign {
            secret,
            timestamp,
            body,
        } => sign(&secret, timestamp, &read_body(&body)?, &SystemClock),
    };

    println!("{output}");
    Ok(())
}

/// Runs a query and returns its decoded result (`null` when empty).
async fn run_query<H: HttpClient, S: Sleeper>(
    client: &Client<H, S>,
    query: &str,
    params: &[(String, Value)],
    cancel: &CancellationToken,
) -> Result<Value, RunError> {
    let mut builder = client.query(query).with_cancellation(cancel.clone());
    for (name, value) in params {
        builder = builder.param(name.as_str(), value);
    }

    let result = builder.execute().await?;
    tracing::info!("Query took {} ms", result.time.as_millis());

    Ok(result.unmarshal()?)
}

/// Fetches documents, logging any the server omitted.
async fn run_get<H: HttpClient, S: Sleeper>(
    client: &Client<H, S>,
    ids: &[String],
    cancel: &CancellationToken,
) -> Result<Value, RunError> {
    let response = client
        .get_documents(ids.iter().cloned())
        .with_cancellation(cancel.clone())
        .execute()
        .await?;

    for omitted in &response.omitted {
        tracing::warn!("Document {} omitted: {}", omitted.id, omitted.reason);
    }

    Ok(Value::Array(
        response.documents.into_iter().map(Value::Object).collect(),
    ))
}

/// Checks `signature` against `payload`.
fn verify(secret: &str, signature: &str, payload: &[u8]) -> Result<(), RunError> {
    if is_valid_signature(payload, signature, secret)? {
        Ok(())
    } else {
        Err(RunError::SignatureMismatch)
    }
}

/// Produces a signature header, at `timestamp` if given or now.
fn sign(secret: &str, timestamp: Option<u64>, payload: &[u8], clock: &impl Clock) -> String {
    timestamp.map_or_else(
        || sign_now(payload, secret, clock),
        |timestamp| encode_signature_header(payload, timestamp, secret),
    )
}

fn read_body(source: &BodySource) -> Result<Vec<u8>, RunError> {
    let read_error = |e| RunError::ReadBody {
        from: source.clone(),
        source: e,
    };

    match source {
        BodySource::File(path) => std::fs::read(path).map_err(read_error),
        BodySource::Stdin => {
            let mut buf = Vec::new();
            std::io::stdin().read_to_end(&mut buf).map_err(read_error)?;
            Ok(buf)
        }
    }
}

fn render(value: &Value) -> Result<String, RunError> {
    serde_json::to_string_pretty(value).map_err(RunError::Output)
}

/// Returns a future that completes when a shutdown signal is received.
///
/// Excluded from coverage - requires OS signal handling.
#[cfg(not(tarpaulin_include))]
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::warn!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::warn!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
