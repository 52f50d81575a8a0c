//! Tree settings with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/canopy/canopy.toml`
//! 3. Explicit config file (`--config PATH`)
//! 4. Environment variables: `CANOPY_*` prefix

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment, File};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::dispose::DisposeTraversal;
use crate::errors::{TreeError, TreeResult};

pub const ENV_PREFIX: &str = "CANOPY";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TreeSettings {
    /// Traversal assigned to newly created nodes
    pub dispose_traversal: DisposeTraversal,
    /// Log every dispatched event at debug level instead of trace
    pub log_events: bool,
}

impl Default for TreeSettings {
    fn default() -> Self {
        Self {
            dispose_traversal: DisposeTraversal::BottomUp,
            log_events: false,
        }
    }
}

/// Get the XDG config directory for canopy.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "canopy").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("canopy.toml"))
}

fn config_err(e: ConfigError) -> TreeError {
    TreeError::Config {
        message: e.to_string(),
    }
}

impl TreeSettings {
    /// Load settings with layered precedence, see module docs.
    ///
    /// A missing global file is skipped, a missing explicit file is an error.
    pub fn load(explicit: Option<&Path>) -> TreeResult<Self> {
        Self::load_layers(global_config_path().as_deref(), explicit, ENV_PREFIX)
    }

    #[instrument(level = "debug")]
    pub fn load_layers(
        global: Option<&Path>,
        explicit: Option<&Path>,
        env_prefix: &str,
    ) -> TreeResult<Self> {
        let defaults = Self::default();
        let mut builder = Config::builder()
            .set_default("dispose_traversal", "bottom_up")
            .map_err(config_err)?
            .set_default("log_events", defaults.log_events)
            .map_err(config_err)?;

        if let Some(global) = global {
            if global.exists() {
                debug!(path = %global.display(), "global config");
                builder = builder.add_source(File::from(global).required(false));
            }
        }

        if let Some(explicit) = explicit {
            builder = builder.add_source(File::from(explicit).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix(env_prefix)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().map_err(config_err)?;
        config.try_deserialize().map_err(config_err)
    }
}
