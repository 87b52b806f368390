//! The merged, typed configuration snapshot.

use serde::{Deserialize, Serialize};

/// The deployment mode, selected by `APP_ENV`. Drives the tracing subscriber
/// format (compact for development, JSON for production) and nothing else —
/// there is no behavioral branching on this value inside the core engine.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppEnv {
    #[default]
    Development,
    Production,
    Test,
}

impl std::str::FromStr for AppEnv {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            "test" => Ok(Self::Test),
            _ => Err(()),
        }
    }
}

/// HTTP bind settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerSettings {
    /// Port the HTTP server binds to.
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self { port: 8080 }
    }
}

/// `SQLite` persistence settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DatabaseSettings {
    /// Path to the `SQLite` database file, or `:memory:` for an ephemeral,
    /// process-local database.
    pub path: String,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self { path: "referrals.db".to_string() }
    }
}

/// Local identity-provider settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AuthSettings {
    /// HMAC secret the local JWT issuer/verifier signs and checks tokens
    /// with. The compiled default is only fit for development and tests;
    /// production deployments must override it via `AUTH_JWT_SECRET`.
    pub jwt_secret: String,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self { jwt_secret: "dev-secret-change-me".to_string() }
    }
}

/// The root settings type, merged once at startup and shared read-only for
/// the process lifetime.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub environment: AppEnv,
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub auth: AuthSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            environment: AppEnv::default(),
            server: ServerSettings::default(),
            database: DatabaseSettings::default(),
            auth: AuthSettings::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_development() {
        let s = Settings::default();
        assert_eq!(s.environment, AppEnv::Development);
        assert_eq!(s.server.port, 8080);
        assert_eq!(s.database.path, "referrals.db");
    }

    #[test]
    fn serde_roundtrip() {
        let s = Settings::default();
        let json = serde_json::to_string(&s).unwrap();
        let back: Settings = serde_json::from_str(&json).unwrap();
        assert_eq!(back.server.port, s.server.port);
    }

    #[test]
    fn empty_json_produces_defaults() {
        let s: Settings = serde_json::from_str("{}").unwrap();
        assert_eq!(s.server.port, 8080);
    }

    #[test]
    fn app_env_parses_case_insensitively() {
        assert_eq!("Production".parse::<AppEnv>(), Ok(AppEnv::Production));
        assert_eq!("test".parse::<AppEnv>(), Ok(AppEnv::Test));
        assert!("bogus".parse::<AppEnv>().is_err());
    }

    #[test]
    fn app_env_json_field_is_lowercase() {
        let json = serde_json::to_string(&AppEnv::Production).unwrap();
        assert_eq!(json, "\"production\"");
    }
}
