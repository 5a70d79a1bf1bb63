//! Application configuration
//!
//! Configuration is loaded from multiple sources with the following priority (lowest to highest):
//! 1. `config/default.toml` (version controlled)
//! 2. `config/user.toml` (gitignored, user overrides)
//! 3. Environment variables (`ONCOMING_SECTION__KEY`)

use std::path::{Path, PathBuf};

use color_eyre::eyre::{ensure, WrapErr};
use color_eyre::Result;
use figment::providers::{Env, Format, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::game::Rules;

pub const ENV_PREFIX: &str = "ONCOMING_";

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Movement, spawning and collision rules
    #[serde(default)]
    pub game: Rules,
    /// Session loop configuration
    #[serde(default)]
    pub session: SessionConfig,
    /// Input source configuration
    #[serde(default)]
    pub driver: DriverConfig,
    /// Text rendering configuration
    #[serde(default)]
    pub render: RenderConfig,
    /// Debug configuration
    #[serde(default)]
    pub debug: DebugConfig,
}

impl AppConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self> {
        Self::load_from("config")
    }

    /// Load configuration from a specific config directory
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> Result<Self> {
        let config_dir = config_dir.as_ref();
        let default_path = config_dir.join("default.toml");
        let user_path = config_dir.join("user.toml");

        let mut figment = Figment::new();

        if default_path.exists() {
            figment = figment.merge(Toml::file(&default_path));
        }

        if user_path.exists() {
            figment = figment.merge(Toml::file(&user_path));
        }

        // ONCOMING_SESSION__SEED=7 -> session.seed = 7
        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));

        let config: Self = figment
            .extract()
            .wrap_err_with(|| format!("loading configuration from {}", config_dir.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.game.validate().wrap_err("invalid [game] section")?;
        ensure!(
            self.render.columns > 0 && self.render.rows > 0,
            "render surface must have at least one cell"
        );
        if self.driver.kind == DriverKind::Lua {
            ensure!(
                self.driver.script.is_some(),
                "driver.kind = \"lua\" needs driver.script"
            );
        }
        Ok(())
    }
}

/// Session loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Sleep between ticks so the game runs at wall-clock speed
    pub realtime: bool,
    /// RNG seed; drawn from entropy when absent
    pub seed: Option<u64>,
    /// Stop a run after this many ticks
    pub max_ticks: Option<u64>,
    /// Runs started over after a game over or a restart command
    pub restarts: usize,
    /// Keep a per-tick log of every run
    pub record_ticks: bool,
    /// Print the run log as JSON when the session ends
    pub print_log: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            realtime: true,
            seed: None,
            max_ticks: None,
            restarts: 0,
            record_ticks: true,
            print_log: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DriverKind {
    Lua,
    #[default]
    Scripted,
}

/// Input source configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    pub kind: DriverKind,
    /// Lua script defining `takeYourTurn`
    pub script: Option<PathBuf>,
    /// Commands replayed one per tick by the scripted driver
    pub commands: Vec<String>,
}

/// Text rendering configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub enabled: bool,
    pub columns: usize,
    pub rows: usize,
    /// Clear the terminal between frames
    pub clear: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            columns: 40,
            rows: 20,
            clear: true,
        }
    }
}

/// Debug configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level (error, warn, info, debug, trace)
    pub log_level: String,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}
