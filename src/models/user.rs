//! This file defines a user of the application and the requests used to log in
//! and register.

use serde::{Deserialize, Serialize};

/// The identifier the Finance Service assigns to a user.
pub type UserId = String;

/// A user of the application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// The Finance Service's ID for the user.
    #[serde(alias = "_id")]
    pub id: UserId,
    /// The email address the user logs in with.
    pub email: String,
    /// The display name. Older accounts may not have one.
    #[serde(default)]
    pub name: String,
}

/// The Finance Service's reply to a successful log in or registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthResponse {
    /// The bearer token for subsequent requests.
    pub token: String,
    /// The user that logged in.
    pub user: User,
}

/// The body of a log in request.
#[derive(Clone, Serialize)]
pub struct LogInRequest {
    /// The email address the user logs in with.
    pub email: String,
    /// Never logged.
    pub password: String,
}

impl std::fmt::Debug for LogInRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogInRequest")
            .field("email", &self.email)
            .field("password", &"********")
            .finish()
    }
}

/// The body of a registration request.
#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    /// The name the user picked for their account.
    pub username: String,
    /// The email address the user logs in with.
    pub email: String,
    /// Never logged.
    pub password: String,
    /// The first word of the full name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    /// The rest of the full name, if there is more than one word.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
}

impl RegisterRequest {
    /// Build a registration request, splitting `full_name` at the first
    /// whitespace into a first name and the rest as the last name.
    pub fn new(full_name: &str, username: &str, email: &str, password: &str) -> Self {
        let mut words = full_name.split_whitespace();
        let first_name = words.next().map(str::to_owned);
        let last_name = words.collect::<Vec<_>>().join(" ");
        let last_name = (!last_name.is_empty()).then_some(last_name);

        Self {
            username: username.trim().to_owned(),
            email: email.trim().to_owned(),
            password: password.to_owned(),
            first_name,
            last_name,
        }
    }
}

impl std::fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"********")
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use crate::models::{AuthResponse, LogInRequest, RegisterRequest};

    #[test]
    fn splits_full_name() {
        let request = RegisterRequest::new("Ada King Lovelace", "ada", " ada@example.com ", "hunter2");

        assert_eq!(request.first_name.as_deref(), Some("Ada"));
        assert_eq!(request.last_name.as_deref(), Some("King Lovelace"));
        assert_eq!(request.email, "ada@example.com");
    }

    #[test]
    fn single_word_name_has_no_last_name() {
        let request = RegisterRequest::new("Ada", "ada", "ada@example.com", "hunter2");

        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["firstName"], "Ada");
        assert!(json.get("lastName").is_none());
    }

    #[test]
    fn debug_output_hides_password() {
        let request = LogInRequest {
            email: "ada@example.com".to_owned(),
            password: "hunter2".to_owned(),
        };

        let debug = format!("{request:?}");

        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn deserializes_auth_response() {
        let json = r#"{"token": "abc", "user": {"_id": "u1", "email": "ada@example.com", "name": "Ada"}}"#;

        let response: AuthResponse = serde_json::from_str(json).unwrap();

        assert_eq!(response.token, "abc");
        assert_eq!(response.user.id, "u1");
    }
}
