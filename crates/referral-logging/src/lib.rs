//! # referral-logging
//!
//! Structured logging with `tracing`, selecting the subscriber's output
//! format from the resolved deployment mode: compact, human-readable lines
//! for development, newline-delimited JSON for production.
//!
//! Request-scoped context (request id, authenticated principal) is attached
//! by the HTTP layer via `tracing::Span::record` on a per-request span, not
//! by this crate — this module only builds and installs the subscriber.

#![deny(unsafe_code)]

use referral_settings::AppEnv;
use tracing_subscriber::EnvFilter;

/// Initialize the global `tracing` subscriber for the given deployment mode.
/// Call once at process startup; subsequent calls are no-ops (the
/// underlying `try_init` swallows the "already set" error so a test harness
/// that initializes logging once per process doesn't need special-casing).
///
/// The minimum level comes from `RUST_LOG` if set, otherwise defaults to
/// `info`.
pub fn init(environment: AppEnv) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match environment {
        AppEnv::Production => {
            let subscriber = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(true)
                .json()
                .flatten_event(true)
                .with_current_span(true);
            let _ = subscriber.try_init();
        }
        AppEnv::Development | AppEnv::Test => {
            let subscriber = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(true)
                .compact();
            let _ = subscriber.try_init();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_does_not_panic_for_either_format() {
        init(AppEnv::Development);
        init(AppEnv::Production);
    }
}
