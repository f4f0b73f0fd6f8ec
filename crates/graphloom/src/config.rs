use serde::{Deserialize, Serialize};

use graphloom_schema::BuildOptions;

/// Application configuration, normally loaded from `graphloom.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub schema: SchemaConfig,
    #[serde(default)]
    pub features: FeaturesConfig,
    #[serde(default)]
    pub authorization: AuthorizationConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns a message naming the first invalid key.
    pub fn validate(&self) -> Result<(), String> {
        if let Some(callbacks) = &self.schema.callbacks
            && callbacks.iter().any(|c| c.trim().is_empty())
        {
            return Err("schema.callbacks must not contain empty names".into());
        }

        let lvl = self.logging.level.to_ascii_lowercase();
        let valid_levels = ["trace", "debug", "info", "warn", "error", "off"];
        if !valid_levels.contains(&lvl.as_str()) {
            return Err(format!("logging.level must be one of {valid_levels:?}"));
        }

        if self
            .authorization
            .claims_namespace
            .as_deref()
            .is_some_and(|ns| ns.trim().is_empty())
        {
            return Err("authorization.claims_namespace must not be blank when set".into());
        }
        Ok(())
    }

    /// Options for the schema compiler.
    #[must_use]
    pub fn schema_options(&self) -> BuildOptions {
        BuildOptions {
            sort_sdl: self.schema.sort_sdl,
            subscriptions: self.features.subscriptions,
            callbacks: self.schema.callbacks.clone(),
            max_interface_nesting: self.schema.max_interface_nesting,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaConfig {
    /// Print SDL in lexicographic order.
    /// Default: true
    #[serde(default = "default_sort_sdl")]
    pub sort_sdl: bool,
    /// Registered `@populatedBy` callbacks; unrestricted when unset.
    #[serde(default)]
    pub callbacks: Option<Vec<String>>,
    /// Default: 1
    #[serde(default = "default_max_interface_nesting")]
    pub max_interface_nesting: usize,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            sort_sdl: default_sort_sdl(),
            callbacks: None,
            max_interface_nesting: default_max_interface_nesting(),
        }
    }
}

fn default_sort_sdl() -> bool {
    true
}

fn default_max_interface_nesting() -> usize {
    1
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeaturesConfig {
    /// Emit the event subscription surface.
    #[serde(default)]
    pub subscriptions: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorizationConfig {
    /// When false, snapshots carry no rules and every request is allowed.
    /// Default: true
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Prefix tried on claim names before the plain key, e.g.
    /// `https://example.com/`.
    #[serde(default)]
    pub claims_namespace: Option<String>,
}

impl Default for AuthorizationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            claims_namespace: None,
        }
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default: "info"
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".into()
}

pub mod loader {
    use std::path::{Path, PathBuf};

    use config::{Config, Environment, File};

    use super::AppConfig;
    use crate::error::ConfigError;

    pub const DEFAULT_CONFIG_FILE: &str = "graphloom.toml";

    /// Loads configuration from `path` (or `graphloom.toml` when present)
    /// with `GRAPHLOOM__SECTION__KEY` environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotFound`] for an explicit path that does not
    /// exist, [`ConfigError::Load`] for unreadable sources and
    /// [`ConfigError::Invalid`] when validation fails.
    pub fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
        let mut builder = Config::builder();
        match path {
            Some(p) => {
                if !p.exists() {
                    return Err(ConfigError::NotFound(p.to_path_buf()));
                }
                builder = builder.add_source(File::from(p.to_path_buf()));
            }
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    builder = builder.add_source(File::from(default_path));
                }
            }
        }
        // e.g. GRAPHLOOM__FEATURES__SUBSCRIPTIONS=true
        builder = builder.add_source(
            Environment::with_prefix("GRAPHLOOM")
                .prefix_separator("__")
                .try_parsing(true)
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("schema.callbacks"),
        );

        let merged: AppConfig = builder.build()?.try_deserialize()?;
        merged.validate().map_err(ConfigError::Invalid)?;
        tracing::debug!(
            subscriptions = merged.features.subscriptions,
            authorization = merged.authorization.enabled,
            "Configuration loaded"
        );
        Ok(merged)
    }
}
