use std::env;
use std::time::Duration;

use crate::models::AuthUser;

/// Injects a signed-in user without a token. Test and staging use only.
pub const TEST_AUTH_USER_VAR: &str = "BOOKNEST_TEST_AUTH_USER";

/// Wizard sessions untouched for this long are dropped.
pub const DEFAULT_SESSION_IDLE_TTL: Duration = Duration::from_secs(30 * 60);

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database_url: String,
    pub port: u16,
    pub booking_api_url: String,
    pub api_timeout: Duration,
    pub session_idle_ttl: Duration,
    pub seed_providers: bool,
    pub test_auth_user: Option<AuthUser>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://./data/booknest.db".to_string());
        let port = env::var("PORT")
            .ok()
            .and_then(|value| value.parse().ok())
            .unwrap_or(8080);
        let booking_api_url = env::var("BOOKING_API_URL")
            .unwrap_or_else(|_| "http://localhost:4000/api".to_string());
        let api_timeout = env::var("BOOKING_API_TIMEOUT_SECS")
            .ok()
            .and_then(|value| value.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(10));
        let session_idle_ttl = env::var("BOOKING_SESSION_TTL_SECS")
            .ok()
            .and_then(|value| value.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_SESSION_IDLE_TTL);
        let seed_providers = env::var("SEED_PROVIDERS")
            .map(|value| value != "false")
            .unwrap_or(true);

        let test_auth_user = env::var(TEST_AUTH_USER_VAR)
            .ok()
            .and_then(|value| parse_test_user(&value));
        if let Some(user) = &test_auth_user {
            log::warn!(
                "{TEST_AUTH_USER_VAR} is set. Every request is treated as user '{}'. Never enable this in production.",
                user.id
            );
        }

        Self {
            database_url,
            port,
            booking_api_url,
            api_timeout,
            session_idle_ttl,
            seed_providers,
            test_auth_user,
        }
    }
}

/// `id` or `id:Display Name`.
pub fn parse_test_user(raw: &str) -> Option<AuthUser> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    let (id, display_name) = match raw.split_once(':') {
        Some((id, name)) => (id.trim(), name.trim()),
        None => (raw, "Test User"),
    };
    if id.is_empty() {
        return None;
    }
    Some(AuthUser {
        id: id.to_string(),
        display_name: display_name.to_string(),
        email: None,
    })
}
