#![allow(missing_docs)]

pub(crate) mod http;

use std::{
    path::PathBuf,
    sync::atomic::{AtomicUsize, Ordering},
};

use crate::{Credentials, Session, models::User};

pub(crate) use http::{mock_client, mock_service, spawn_mock_server, unused_base_url};

/// A path under the system temp directory that no other test uses.
pub(crate) fn temp_path(file_name: &str) -> PathBuf {
    static COUNTER: AtomicUsize = AtomicUsize::new(0);

    let unique = COUNTER.fetch_add(1, Ordering::SeqCst);

    std::env::temp_dir()
        .join(format!("finboard-test-{}-{unique}", std::process::id()))
        .join(file_name)
}

pub(crate) fn test_user() -> User {
    User {
        id: "user-1".to_owned(),
        email: "test@example.com".to_owned(),
        name: "Test User".to_owned(),
    }
}

pub(crate) fn test_credentials(token: &str) -> Credentials {
    Credentials {
        token: token.to_owned(),
        user: test_user(),
    }
}

/// An in-memory session logged in with `token`.
pub(crate) fn authenticated_session(token: &str) -> Session {
    Session::with_credentials(test_credentials(token))
}
