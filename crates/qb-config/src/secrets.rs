//! Cookie resolution.
//!
//! Config holds only the env var NAME (`backend.cookie_env`). The value is
//! read once at startup and handed to the stream client and loader. Errors
//! and `Debug` output mention the NAME, never the value.

use crate::BoardConfig;

/// Cookie header value for credentialed requests. **Redacted in `Debug`.**
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ResolvedCookie {
    value: Option<String>,
}

impl std::fmt::Debug for ResolvedCookie {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedCookie")
            .field("value", &self.value.as_ref().map(|_| "<REDACTED>"))
            .finish()
    }
}

impl ResolvedCookie {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn new(value: impl Into<String>) -> Self {
        let value = value.into();
        if value.trim().is_empty() {
            Self::none()
        } else {
            Self { value: Some(value) }
        }
    }

    pub fn header_value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    pub fn is_present(&self) -> bool {
        self.value.is_some()
    }
}

/// Resolve the cookie from the process env. A configured but unset variable
/// yields no cookie; requests then go out uncredentialed.
pub fn resolve_cookie(cfg: &BoardConfig) -> ResolvedCookie {
    resolve_cookie_with(cfg, |name| std::env::var(name).ok())
}

pub fn resolve_cookie_with<F>(cfg: &BoardConfig, env: F) -> ResolvedCookie
where
    F: Fn(&str) -> Option<String>,
{
    cfg.cookie_env
        .as_deref()
        .and_then(env)
        .map(ResolvedCookie::new)
        .unwrap_or_default()
}
