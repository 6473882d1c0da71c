use crate::error::{LayoutError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizerConfig {
    /// Cost per unit of intersection area between two node boxes.
    pub overlap_weight: f64,
    /// Cost per unit an edge falls short of the minimum edge length.
    pub edge_length_weight: f64,
    /// Scales the aspect-ratio deviation, which is already measured in
    /// diagram units.
    pub aspect_weight: f64,
    /// Flat cost per crossing edge pair.
    pub crossing_weight: f64,
    /// Cost per unit an edge exceeds the minimum edge length.
    pub stretch_weight: f64,
    pub max_sweeps: usize,
    /// Starting temperature relative to the mean per-node cost.
    pub initial_temperature: f64,
    pub cooling: f64,
    pub min_temperature: f64,
    pub step_decay: f64,
    /// Upper bound on greedy passes run after the annealing schedule.
    pub polish_sweeps: usize,
    pub seed: u64,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            overlap_weight: 1.0,
            edge_length_weight: 50.0,
            aspect_weight: 1.0,
            crossing_weight: 500.0,
            stretch_weight: 0.5,
            max_sweeps: 400,
            initial_temperature: 0.5,
            cooling: 0.97,
            min_temperature: 0.01,
            step_decay: 0.97,
            polish_sweeps: 200,
            seed: 0x5EED_CAFE,
        }
    }
}

impl OptimizerConfig {
    /// Weights and temperatures must be finite and non-negative; `cooling`
    /// and `step_decay` must lie in `(0, 1]`.
    pub fn validate(&self) -> Result<()> {
        let non_negative = [
            ("overlap_weight", self.overlap_weight),
            ("edge_length_weight", self.edge_length_weight),
            ("aspect_weight", self.aspect_weight),
            ("crossing_weight", self.crossing_weight),
            ("stretch_weight", self.stretch_weight),
            ("initial_temperature", self.initial_temperature),
            ("min_temperature", self.min_temperature),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(LayoutError::InvalidArgument(format!(
                    "{name} must be a finite non-negative number, got {value}"
                )));
            }
        }
        for (name, value) in [("cooling", self.cooling), ("step_decay", self.step_decay)] {
            if !(value > 0.0 && value <= 1.0) {
                return Err(LayoutError::InvalidArgument(format!(
                    "{name} must be in (0, 1], got {value}"
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub optimizer: OptimizerConfig,
    pub grid_size: f64,
    pub aspect_ratio: f64,
    pub min_edge_length: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            optimizer: OptimizerConfig::default(),
            grid_size: 20.0,
            aspect_ratio: 1.0,
            min_edge_length: 100.0,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct OptimizerConfigFile {
    overlap_weight: Option<f64>,
    edge_length_weight: Option<f64>,
    aspect_weight: Option<f64>,
    crossing_weight: Option<f64>,
    stretch_weight: Option<f64>,
    max_sweeps: Option<usize>,
    initial_temperature: Option<f64>,
    cooling: Option<f64>,
    min_temperature: Option<f64>,
    step_decay: Option<f64>,
    polish_sweeps: Option<usize>,
    seed: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    optimizer: Option<OptimizerConfigFile>,
    grid_size: Option<f64>,
    aspect_ratio: Option<f64>,
    min_edge_length: Option<f64>,
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let contents = std::fs::read_to_string(path)?;
    parse_config(&contents)
}

/// Applies a JSON (or JSON5) override document on top of the defaults.
pub fn parse_config(contents: &str) -> anyhow::Result<Config> {
    let parsed: ConfigFile = match serde_json::from_str(contents) {
        Ok(parsed) => parsed,
        Err(_) => json5::from_str(contents)?,
    };

    let mut config = Config::default();
    if let Some(v) = parsed.grid_size {
        config.grid_size = v;
    }
    if let Some(v) = parsed.aspect_ratio {
        config.aspect_ratio = v;
    }
    if let Some(v) = parsed.min_edge_length {
        config.min_edge_length = v;
    }

    if let Some(optimizer) = parsed.optimizer {
        if let Some(v) = optimizer.overlap_weight {
            config.optimizer.overlap_weight = v;
        }
        if let Some(v) = optimizer.edge_length_weight {
            config.optimizer.edge_length_weight = v;
        }
        if let Some(v) = optimizer.aspect_weight {
            config.optimizer.aspect_weight = v;
        }
        if let Some(v) = optimizer.crossing_weight {
            config.optimizer.crossing_weight = v;
        }
        if let Some(v) = optimizer.stretch_weight {
            config.optimizer.stretch_weight = v;
        }
        if let Some(v) = optimizer.max_sweeps {
            config.optimizer.max_sweeps = v;
        }
        if let Some(v) = optimizer.initial_temperature {
            config.optimizer.initial_temperature = v;
        }
        if let Some(v) = optimizer.cooling {
            config.optimizer.cooling = v;
        }
        if let Some(v) = optimizer.min_temperature {
            config.optimizer.min_temperature = v;
        }
        if let Some(v) = optimizer.step_decay {
            config.optimizer.step_decay = v;
        }
        if let Some(v) = optimizer.polish_sweeps {
            config.optimizer.polish_sweeps = v;
        }
        if let Some(v) = optimizer.seed {
            config.optimizer.seed = v;
        }
    }

    config.optimizer.validate()?;
    Ok(config)
}
