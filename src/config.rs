//! Service configuration.
//!
//! Defaults match the in-cluster deployment. A TOML file may override any
//! field, and the deployment environment variables override the file.

use std::path::Path;

use serde::{Deserialize, Serialize};
use suggest_aggregator::{
    AggregatorConfig, EndpointConfig, HttpSettings, ProviderConfig, ProviderKind,
};

use crate::error::{Result, ServiceError};

/// Top-level service configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Identity and listener settings.
    pub app: AppConfig,
    /// Shared upstream HTTP client settings.
    pub http: HttpSettings,
    /// Suggestion providers in merge order.
    pub providers: Vec<ProviderConfig>,
    /// Concordance store.
    pub concordance: EndpointConfig,
    /// Broader-relationships source.
    pub broader: EndpointConfig,
    /// Global denylist.
    pub denylist: EndpointConfig,
}

/// Service identity, listener port and log level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// System code reported by the health endpoint.
    pub system_code: String,
    /// Application name reported by the health endpoint.
    pub name: String,
    /// Human-readable description reported by the health endpoint.
    pub description: String,
    /// Address to bind.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Default log filter when `RUST_LOG` is unset.
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            system_code: "public-suggestions-api".into(),
            name: "public-suggestions-api".into(),
            description: "Service serving requests made towards suggestions umbrella".into(),
            host: "0.0.0.0".into(),
            port: 8080,
            log_level: "info".into(),
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        let AggregatorConfig {
            http,
            providers,
            concordance,
            broader,
            denylist,
        } = AggregatorConfig::default();
        Self {
            app: AppConfig::default(),
            http,
            providers,
            concordance,
            broader,
            denylist,
        }
    }
}

impl ServiceConfig {
    /// Load configuration from a TOML file, falling back to defaults for missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| ServiceError::Config(e.to_string()))
    }

    /// Save configuration to a TOML file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or the config cannot be serialized.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| ServiceError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Build the effective configuration for the process.
    ///
    /// Starts from `path` when given (defaults otherwise), applies the
    /// process environment, then validates.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be loaded, an override does not
    /// parse, or the result is invalid.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply deployment overrides looked up through `lookup`.
    ///
    /// Empty values are ignored. Provider overrides update the first
    /// provider of the matching kind, adding one at the end if none exists.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Config`] if `APP_PORT` is not a valid port.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("APP_SYSTEM_CODE") {
            self.app.system_code = v;
        }
        if let Some(v) = get("APP_NAME") {
            self.app.name = v;
        }
        if let Some(v) = get("APP_PORT") {
            self.app.port = v
                .trim()
                .parse()
                .map_err(|e| ServiceError::Config(format!("APP_PORT {v:?}: {e}")))?;
        }
        if let Some(v) = get("LOG_LEVEL") {
            self.app.log_level = v;
        }

        for (kind, base_key, endpoint_key) in [
            (
                ProviderKind::Authors,
                "AUTHORS_SUGGESTION_API_BASE_URL",
                "AUTHORS_SUGGESTION_ENDPOINT",
            ),
            (
                ProviderKind::Ontotext,
                "ONTOTEXT_SUGGESTION_API_BASE_URL",
                "ONTOTEXT_SUGGESTION_ENDPOINT",
            ),
        ] {
            let base = get(base_key);
            let endpoint = get(endpoint_key);
            if base.is_none() && endpoint.is_none() {
                continue;
            }
            let provider = self.provider_mut(kind);
            if let Some(base) = base {
                provider.base_url = base;
            }
            if let Some(endpoint) = endpoint {
                provider.endpoint = endpoint;
            }
        }

        for (endpoint, base_key, path_key) in [
            (
                &mut self.concordance,
                "CONCEPT_CONCORDANCES_API_BASE_URL",
                "CONCEPT_CONCORDANCES_ENDPOINT",
            ),
            (
                &mut self.broader,
                "PUBLIC_THINGS_API_BASE_URL",
                "PUBLIC_THINGS_ENDPOINT",
            ),
            (
                &mut self.denylist,
                "CONCEPT_BLACKLISTER_BASE_URL",
                "CONCEPT_BLACKLISTER_ENDPOINT",
            ),
        ] {
            if let Some(v) = get(base_key) {
                endpoint.base_url = v;
            }
            if let Some(v) = get(path_key) {
                endpoint.endpoint = v;
            }
        }
        Ok(())
    }

    fn provider_mut(&mut self, kind: ProviderKind) -> &mut ProviderConfig {
        let index = match self.providers.iter().position(|p| p.kind == kind) {
            Some(index) => index,
            None => {
                self.providers.push(ProviderConfig {
                    kind,
                    base_url: String::new(),
                    endpoint: String::new(),
                });
                self.providers.len() - 1
            }
        };
        &mut self.providers[index]
    }

    /// The part of the configuration consumed by the aggregation engine.
    pub fn aggregator_config(&self) -> AggregatorConfig {
        AggregatorConfig {
            http: self.http.clone(),
            providers: self.providers.clone(),
            concordance: self.concordance.clone(),
            broader: self.broader.clone(),
            denylist: self.denylist.clone(),
        }
    }

    /// Validates this configuration, returning an error if any field is invalid.
    ///
    /// Checks the listener port and name, then delegates to
    /// [`AggregatorConfig::validate`].
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Config`] describing the first invalid field.
    pub fn validate(&self) -> Result<()> {
        if self.app.port == 0 {
            return Err(ServiceError::Config("port must be greater than 0".into()));
        }
        if self.app.system_code.trim().is_empty() {
            return Err(ServiceError::Config("system_code must not be empty".into()));
        }
        self.aggregator_config()
            .validate()
            .map_err(|e| ServiceError::Config(e.to_string()))
    }
}
