//! Shared application state passed to every axum handler.

use std::sync::Arc;

use referral_auth::LocalIdentityProvider;
use referral_settings::AppEnv;
use referral_store::StoreAdapter;

/// State shared across request handlers: the persistence adapter, the
/// bundled identity provider, and the resolved deployment mode (reported by
/// `/health` and nothing else).
#[derive(Clone)]
pub struct AppState {
    pub store: StoreAdapter,
    pub identity: Arc<LocalIdentityProvider>,
    pub environment: AppEnv,
}
