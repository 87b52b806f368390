//! # referral-settings
//!
//! Layered configuration for the referral reconciler.
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults** — [`Settings::default()`]
//! 2. **Settings file** — `./settings.json` or `$CONFIG_PATH`, deep-merged
//!    over defaults
//! 3. **Environment variables** — `PORT`, `APP_ENV`, `DATABASE_PATH`,
//!    `AUTH_JWT_SECRET` (highest priority)
//!
//! The merged result is parsed once into a typed [`Settings`] and exposed
//! through a process-wide handle; it is not hot-reloaded.
//!
//! # Usage
//!
//! ```no_run
//! use referral_settings::get_settings;
//!
//! let settings = get_settings();
//! println!("listening on port {}", settings.server.port);
//! ```

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{deep_merge, load_settings, load_settings_from_path, settings_path};
pub use types::*;

use std::sync::OnceLock;

static SETTINGS: OnceLock<Settings> = OnceLock::new();

/// Get the global settings snapshot, loading it from the settings file and
/// environment on first access. Falls back to compiled defaults if loading
/// fails, so a handler reading this never observes an error after startup —
/// callers that need to detect a load failure should use [`load_settings`]
/// directly (as the CLI binary does, to map it to exit code 2).
pub fn get_settings() -> &'static Settings {
    SETTINGS.get_or_init(|| load_settings().unwrap_or_default())
}

/// Initialize the global settings with an already-loaded value. Returns the
/// given settings back if the global was already initialized.
///
/// # Errors
///
/// Returns the provided settings back if the global was already initialized.
#[allow(clippy::result_large_err)]
pub fn init_settings(settings: Settings) -> std::result::Result<(), Settings> {
    SETTINGS.set(settings)
}
