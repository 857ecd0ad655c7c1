use anyhow::Result;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure for stagekeeper
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StagekeeperConfig {
    /// Staging workflow settings
    pub staging: StagingConfig,
    /// Observability settings
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StagingConfig {
    /// Labels for the sub-projects created when a caller gives none
    pub default_labels: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log level
    pub log_level: String,
    /// Emit JSON structured logs
    pub structured_logging: bool,
}

impl Default for StagekeeperConfig {
    fn default() -> Self {
        Self {
            staging: StagingConfig {
                default_labels: crate::staging::DEFAULT_STAGING_LABELS
                    .iter()
                    .map(|label| label.to_string())
                    .collect(),
            },
            observability: ObservabilityConfig {
                log_level: "info".to_string(),
                structured_logging: true,
            },
        }
    }
}

impl StagekeeperConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Default values
    /// 2. Configuration files (stagekeeper.toml, .stagekeeper-rc)
    /// 3. Environment variables (prefixed with STAGEKEEPER_)
    pub fn load() -> Result<Self> {
        let defaults = Self::default();
        let mut builder = Config::builder()
            .set_default("staging.default_labels", defaults.staging.default_labels)?
            .set_default("observability.log_level", defaults.observability.log_level)?
            .set_default(
                "observability.structured_logging",
                defaults.observability.structured_logging,
            )?;

        if Path::new("stagekeeper.toml").exists() {
            builder = builder.add_source(File::with_name("stagekeeper"));
        }

        if Path::new(".stagekeeper-rc").exists() {
            builder = builder.add_source(File::with_name(".stagekeeper-rc"));
        }

        // Key names contain underscores, so the level separator must be a
        // double underscore: STAGEKEEPER_OBSERVABILITY__LOG_LEVEL maps to
        // observability.log_level
        builder = builder.add_source(
            Environment::with_prefix("STAGEKEEPER")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("staging.default_labels"),
        );

        let config = builder.build()?;
        Ok(config.try_deserialize()?)
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let toml_content = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_content)?;
        Ok(())
    }

    /// Load .env file if it exists
    pub fn load_env_file() -> Result<()> {
        if Path::new(".env").exists() {
            dotenvy::dotenv()?;
            tracing::info!("Loaded environment variables from .env file");
        }
        Ok(())
    }
}

/// Global configuration instance
static CONFIG: std::sync::LazyLock<Result<StagekeeperConfig, anyhow::Error>> =
    std::sync::LazyLock::new(|| {
        let _ = StagekeeperConfig::load_env_file();
        StagekeeperConfig::load()
    });

/// Get the global configuration
pub fn config() -> Result<&'static StagekeeperConfig> {
    CONFIG
        .as_ref()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))
}

/// Initialize configuration (called at startup)
pub fn init_config() -> Result<()> {
    let _config = config()?;
    tracing::info!("Configuration loaded successfully");
    Ok(())
}
