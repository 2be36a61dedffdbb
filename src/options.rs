use std::{fs, path::PathBuf};

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use crate::error::Result;

const DEFAULT_SELECTION: &str = "default";

/// Mutator and pattern selections an [`crate::Engine`] is built from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineOptions {
    /// Mutators to use, e.g. `default` or `num=5,bd,bf=2`
    pub mutators: String,
    /// Patterns to use, e.g. `default` or `od,nd=2,bu`
    pub patterns: String,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            mutators: DEFAULT_SELECTION.to_string(),
            patterns: DEFAULT_SELECTION.to_string(),
        }
    }
}

impl EngineOptions {
    /// Reads options from JSON. Missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<EngineOptions> {
        Ok(serde_json::from_str(json)?)
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List the available mutators and patterns
    List {
        /// Print the catalog as JSON
        #[clap(long)]
        json: bool,
    },
}

/// Options for the standalone mutation driver.
#[derive(Parser, Debug)]
pub struct RuntimeOptions {
    /// Number of seeds to run, starting from 0
    #[clap(long, default_value = "10")]
    pub seeds: usize,

    /// Capacity of the output buffer in bytes
    #[clap(long, default_value = "80")]
    pub max_output_len: usize,

    /// Mutators to use. Overrides the config file.
    #[clap(long, short)]
    pub mutators: Option<String>,

    /// Patterns to use. Overrides the config file.
    #[clap(long, short)]
    pub patterns: Option<String>,

    /// Print outputs as hex instead of escaped text
    #[clap(long)]
    pub hex: bool,

    /// JSON file with engine options
    #[clap(long)]
    pub config: Option<PathBuf>,

    #[clap(subcommand)]
    pub command: Option<Command>,
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        Self {
            seeds: 10,
            max_output_len: 80,
            mutators: None,
            patterns: None,
            hex: false,
            config: None,
            command: None,
        }
    }
}

impl RuntimeOptions {
    /// Engine options from the config file, if any, with command line
    /// selections taking precedence.
    pub fn engine_options(&self) -> Result<EngineOptions> {
        let mut options = match &self.config {
            Some(path) => EngineOptions::from_json(&fs::read_to_string(path)?)?,
            None => EngineOptions::default(),
        };

        if let Some(mutators) = &self.mutators {
            options.mutators = mutators.clone();
        }
        if let Some(patterns) = &self.patterns {
            options.patterns = patterns.clone();
        }

        Ok(options)
    }
}
