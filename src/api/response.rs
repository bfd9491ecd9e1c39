//! Decoding Finance Service response bodies.

use reqwest::StatusCode;
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::Value;

use crate::Error;

/// The Finance Service sends most payloads as `{"data": ...}`, but some
/// endpoints reply with the bare payload.
#[derive(Deserialize)]
#[serde(untagged)]
enum Envelope<T> {
    Wrapped { data: T },
    Bare(T),
}

impl<T> Envelope<T> {
    fn into_inner(self) -> T {
        match self {
            Envelope::Wrapped { data } => data,
            Envelope::Bare(data) => data,
        }
    }
}

/// Decode a successful response body, with or without the `data` wrapper.
pub(crate) fn decode<T: DeserializeOwned>(body: &str) -> Result<T, Error> {
    serde_json::from_str::<Envelope<T>>(body)
        .map(Envelope::into_inner)
        .map_err(|error| Error::InvalidResponse(error.to_string()))
}

/// The number of transactions a CSV upload imported, read from `data.count`
/// or `count`. Zero if the body has neither.
pub(crate) fn imported_count(body: &str) -> Result<u64, Error> {
    let value: Value =
        serde_json::from_str(body).map_err(|error| Error::InvalidResponse(error.to_string()))?;

    Ok(value
        .pointer("/data/count")
        .or_else(|| value.get("count"))
        .and_then(Value::as_u64)
        .unwrap_or(0))
}

#[derive(Default, Deserialize)]
#[serde(default)]
struct ErrorBody {
    message: Option<String>,
    errors: Vec<FieldError>,
}

#[derive(Deserialize)]
struct FieldError {
    msg: String,
}

/// Build the error for a failed response that does not mean the session expired.
///
/// The message is the body's `message`, else the first field error, else a
/// generic message naming the status code.
pub(crate) fn server_error(status: StatusCode, body: &str) -> Error {
    let body: ErrorBody = serde_json::from_str(body).unwrap_or_default();

    let message = body
        .message
        .filter(|message| !message.trim().is_empty())
        .or_else(|| body.errors.into_iter().next().map(|error| error.msg))
        .unwrap_or_else(|| format!("Request failed with status {}", status.as_u16()));

    Error::Server {
        status: status.as_u16(),
        message,
    }
}

#[cfg(test)]
mod tests {
    use reqwest::StatusCode;

    use super::{decode, imported_count, server_error};
    use crate::{Error, models::User};

    #[test]
    fn decodes_wrapped_and_bare_payloads() {
        let wrapped: Vec<u32> = decode(r#"{"data": [1, 2]}"#).unwrap();
        let bare: Vec<u32> = decode("[3]").unwrap();

        assert_eq!(wrapped, vec![1, 2]);
        assert_eq!(bare, vec![3]);
    }

    #[test]
    fn decodes_bare_object() {
        let user: User = decode(r#"{"_id": "u1", "email": "ada@example.com"}"#).unwrap();

        assert_eq!(user.id, "u1");
        assert_eq!(user.name, "");
    }

    #[test]
    fn undecodable_body_is_invalid_response() {
        let result = decode::<Vec<u32>>("<html>");

        assert!(matches!(result, Err(Error::InvalidResponse(_))));
    }

    #[test]
    fn reads_count_from_either_place() {
        assert_eq!(imported_count(r#"{"data": {"count": 12}}"#), Ok(12));
        assert_eq!(imported_count(r#"{"count": 3}"#), Ok(3));
        assert_eq!(imported_count(r#"{"message": "ok"}"#), Ok(0));
    }

    #[test]
    fn server_message_is_preferred() {
        let error = server_error(
            StatusCode::BAD_REQUEST,
            r#"{"message": "Budget already exists", "errors": [{"msg": "ignored"}]}"#,
        );

        assert_eq!(
            error,
            Error::Server {
                status: 400,
                message: "Budget already exists".to_owned()
            }
        );
    }

    #[test]
    fn first_field_error_is_used_without_message() {
        let error = server_error(
            StatusCode::UNPROCESSABLE_ENTITY,
            r#"{"errors": [{"msg": "Email is invalid"}, {"msg": "Password too short"}]}"#,
        );

        assert_eq!(
            error,
            Error::Server {
                status: 422,
                message: "Email is invalid".to_owned()
            }
        );
    }

    #[test]
    fn falls_back_to_status_code() {
        let error = server_error(StatusCode::INTERNAL_SERVER_ERROR, "oops");

        assert_eq!(
            error,
            Error::Server {
                status: 500,
                message: "Request failed with status 500".to_owned()
            }
        );
    }
}
