//! Logging setup and helpers for logging requests to and responses from the Finance Service.

use std::{fs::OpenOptions, path::Path, sync::Arc};

use reqwest::{Method, StatusCode};
use serde_json::Value;
use tracing_subscriber::{EnvFilter, Layer, filter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::Error;

/// Bodies longer than this many bytes are truncated in `info` logs.
///
/// The full body is still logged at the `debug` level.
pub const LOG_BODY_LENGTH_LIMIT: usize = 64;

const REDACTED_FIELDS: [&str; 2] = ["password", "token"];

/// Install the global tracing subscriber.
///
/// Logs go to stderr at `info` and above if `verbose` is set, and at `warn`
/// and above otherwise. If `log_file` is given, logs at `debug` and above are
/// also appended to it. `RUST_LOG` overrides both.
///
/// # Errors
/// Returns [Error::Io] if the log file cannot be opened.
pub fn setup_logging(log_file: Option<&Path>, verbose: bool) -> Result<(), Error> {
    let stderr_level = if verbose {
        filter::LevelFilter::INFO
    } else {
        filter::LevelFilter::WARN
    };

    let stderr_log = tracing_subscriber::fmt::layer()
        .pretty()
        .with_writer(std::io::stderr)
        .with_filter(stderr_level);

    let debug_log = match log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;

            Some(
                tracing_subscriber::fmt::layer()
                    .pretty()
                    .with_ansi(false)
                    .with_writer(Arc::new(file))
                    .with_filter(filter::LevelFilter::DEBUG),
            )
        }
        None => None,
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_log)
        .with(debug_log)
        .try_init()
        .map_err(|error| Error::Io(format!("could not install logger: {error}")))
}

/// Log an outgoing request. Passwords and tokens in JSON bodies are redacted.
pub(crate) fn log_request(method: &Method, url: &str, body: Option<&str>) {
    let body = body.map(redact_secrets).unwrap_or_default();

    if body.len() > LOG_BODY_LENGTH_LIMIT {
        tracing::info!("Sending request: {method} {url}\nbody: {}...", truncate(&body));
        tracing::debug!("Full request body: {body:?}");
    } else {
        tracing::info!("Sending request: {method} {url}\nbody: {body:?}");
    }
}

/// Log a response from the Finance Service. Tokens in JSON bodies are redacted.
pub(crate) fn log_response(status: StatusCode, url: &str, body: &str) {
    let body = redact_secrets(body);

    if body.len() > LOG_BODY_LENGTH_LIMIT {
        tracing::info!("Received response: {status} from {url}\nbody: {}...", truncate(&body));
        tracing::debug!("Full response body: {body:?}");
    } else {
        tracing::info!("Received response: {status} from {url}\nbody: {body:?}");
    }
}

/// Replace the values of sensitive fields in a JSON body with asterisks.
///
/// Bodies that are not JSON are returned unchanged.
fn redact_secrets(body: &str) -> String {
    let Ok(mut value) = serde_json::from_str::<Value>(body) else {
        return body.to_owned();
    };

    if !redact_value(&mut value) {
        return body.to_owned();
    }

    value.to_string()
}

/// Returns whether anything was redacted.
fn redact_value(value: &mut Value) -> bool {
    match value {
        Value::Object(map) => {
            let mut redacted = false;

            for (key, field) in map.iter_mut() {
                if REDACTED_FIELDS.contains(&key.as_str()) {
                    *field = Value::String("********".to_owned());
                    redacted = true;
                } else {
                    redacted |= redact_value(field);
                }
            }

            redacted
        }
        Value::Array(items) => items.iter_mut().fold(false, |redacted, item| {
            redact_value(item) | redacted
        }),
        _ => false,
    }
}

/// Cut `text` to at most [LOG_BODY_LENGTH_LIMIT] bytes without splitting a character.
fn truncate(text: &str) -> &str {
    let mut end = LOG_BODY_LENGTH_LIMIT.min(text.len());

    while !text.is_char_boundary(end) {
        end -= 1;
    }

    &text[..end]
}
