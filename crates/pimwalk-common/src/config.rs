//! Run configuration for pimwalk.
//!
//! Loads [`PimConfig`] from a TOML file (`pimwalk.toml`) with environment
//! variable overrides via `PIMWALK_*` prefixed variables. Every section falls
//! back to its defaults for missing fields.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::CapacityError;
use crate::kernel_registry::KernelId;
use crate::types::Edge;

/// Hardware limit on tasklets per accelerator.
pub const MAX_TASKLETS: usize = 24;
/// Largest single device-memory DMA the scratch pipeline issues.
pub const MAX_BLOCK_SIZE: usize = 2048;

/// How `run.input_size` relates to the accelerator count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scaling {
    /// `input_size` is the whole dataset.
    Strong,
    /// `input_size` is per accelerator; the dataset grows with the count.
    Weak,
}

impl std::fmt::Display for Scaling {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Strong => write!(f, "strong"),
            Self::Weak => write!(f, "weak"),
        }
    }
}

impl std::str::FromStr for Scaling {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "strong" | "1" => Ok(Self::Strong),
            "weak" | "0" => Ok(Self::Weak),
            other => Err(format!("unknown scaling mode: {other}")),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Compact,
    Json,
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pretty => write!(f, "pretty"),
            Self::Compact => write!(f, "compact"),
            Self::Json => write!(f, "json"),
        }
    }
}

/// Accelerator hardware description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    /// Accelerators to allocate.
    /// Override: `PIMWALK_ACCELERATORS`
    pub accelerators: usize,
    /// Accelerators the (simulated) hardware provides.
    pub available_accelerators: usize,
    /// Tasklets per accelerator.
    /// Override: `PIMWALK_TASKLETS`
    pub tasklets: usize,
    /// Bytes streamed per block.
    /// Override: `PIMWALK_BLOCK_SIZE`
    pub block_size: usize,
    /// Scratch heap bytes per accelerator, shared by its tasklets.
    pub scratch_capacity: usize,
    /// Device memory bytes per accelerator.
    pub device_memory_capacity: usize,
    /// Host/device transfers must be a multiple of this many bytes.
    pub transfer_granularity: usize,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            accelerators: 4,
            available_accelerators: 64,
            tasklets: 16,
            block_size: 1024,
            scratch_capacity: 64 * 1024,
            device_memory_capacity: 64 * 1024 * 1024,
            transfer_granularity: 8,
        }
    }
}

impl SystemConfig {
    /// Scratch bytes `kernel` needs on one accelerator.
    pub fn scratch_requirement(&self, kernel: KernelId) -> usize {
        self.tasklets * kernel.resident_arrays() * self.block_size
    }

    /// Static check that every tasklet's caches fit in scratch.
    pub fn check_scratch(&self, kernel: KernelId) -> Result<(), CapacityError> {
        let required = self.scratch_requirement(kernel);
        if required > self.scratch_capacity {
            return Err(CapacityError::Scratch {
                required,
                capacity: self.scratch_capacity,
                tasklets: self.tasklets,
                arrays: kernel.resident_arrays(),
                block_size: self.block_size,
            });
        }
        Ok(())
    }
}

/// Experiment parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Override: `PIMWALK_KERNEL`
    pub kernel: KernelId,
    /// Elements (vector-add) or edges (edge kernels).
    /// Override: `PIMWALK_INPUT_SIZE`
    pub input_size: usize,
    pub scaling: Scaling,
    /// Rounds excluded from timing.
    /// Override: `PIMWALK_WARMUP`
    pub warmup: usize,
    /// Timed rounds.
    /// Override: `PIMWALK_REPS`
    pub reps: usize,
    /// Seed for the input generator.
    /// Override: `PIMWALK_SEED`
    pub seed: u64,
    /// Distinct node ids generated edges draw from.
    pub graph_nodes: u32,
    /// Node the walker sits on for edge kernels.
    pub walker_node: u32,
    /// Fraction of generated edges tagged special.
    pub special_edge_ratio: f64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            kernel: KernelId::VectorAdd,
            input_size: 512,
            scaling: Scaling::Strong,
            warmup: 1,
            reps: 3,
            seed: 0,
            graph_nodes: 16,
            walker_node: 1,
            special_edge_ratio: 0.125,
        }
    }
}

impl RunConfig {
    /// Dataset size after applying the scaling mode.
    pub fn total_size(&self, accelerators: usize) -> usize {
        match self.scaling {
            Scaling::Strong => self.input_size,
            Scaling::Weak => self.input_size * accelerators,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Override: `PIMWALK_LOG_LEVEL`
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), format: LogFormat::Compact }
    }
}

/// Complete configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PimConfig {
    pub system: SystemConfig,
    pub run: RunConfig,
    pub logging: LoggingConfig,
}

/// Errors that can occur when loading or validating a [`PimConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialize TOML: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("validation failed: {0}")]
    Validation(String),
    #[error(transparent)]
    Capacity(#[from] CapacityError),
    #[error("invalid environment override {key}={value}: {reason}")]
    EnvOverride { key: String, value: String, reason: String },
}

impl PimConfig {
    /// Default configuration as a TOML document.
    pub fn default_toml() -> Result<String, ConfigError> {
        Self::default().to_toml()
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Load from a TOML file, apply environment overrides, then validate.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Load from a TOML string (useful for testing).
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let mut cfg: PimConfig = toml::from_str(toml_str)?;
        cfg.apply_env_overrides()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Defaults plus environment overrides.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut cfg = Self::default();
        cfg.apply_env_overrides()?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let sys = &self.system;
        let run = &self.run;

        if sys.accelerators == 0 {
            return Err(ConfigError::Validation("system.accelerators must be > 0".into()));
        }
        if sys.tasklets == 0 || sys.tasklets > MAX_TASKLETS {
            return Err(ConfigError::Validation(format!(
                "system.tasklets must be in 1..={MAX_TASKLETS}, got {}",
                sys.tasklets
            )));
        }
        if sys.transfer_granularity == 0 || !sys.transfer_granularity.is_power_of_two() {
            return Err(ConfigError::Validation(format!(
                "system.transfer_granularity must be a power of two, got {}",
                sys.transfer_granularity
            )));
        }
        if !sys.block_size.is_power_of_two()
            || sys.block_size < Edge::SIZE
            || sys.block_size > MAX_BLOCK_SIZE
        {
            return Err(ConfigError::Validation(format!(
                "system.block_size must be a power of two in {}..={MAX_BLOCK_SIZE}, got {}",
                Edge::SIZE,
                sys.block_size
            )));
        }
        if sys.block_size % sys.transfer_granularity != 0 {
            return Err(ConfigError::Validation(format!(
                "system.block_size {} is not a multiple of the transfer granularity {}",
                sys.block_size, sys.transfer_granularity
            )));
        }
        if run.input_size == 0 {
            return Err(ConfigError::Validation("run.input_size must be > 0".into()));
        }
        if run.reps == 0 {
            return Err(ConfigError::Validation("run.reps must be > 0".into()));
        }
        if run.kernel.is_walk() {
            if run.graph_nodes == 0 {
                return Err(ConfigError::Validation("run.graph_nodes must be > 0".into()));
            }
            if run.walker_node >= run.graph_nodes {
                return Err(ConfigError::Validation(format!(
                    "run.walker_node {} must be < run.graph_nodes {}",
                    run.walker_node, run.graph_nodes
                )));
            }
        }
        if !(0.0..=1.0).contains(&run.special_edge_ratio) {
            return Err(ConfigError::Validation(format!(
                "run.special_edge_ratio must be in [0, 1], got {}",
                run.special_edge_ratio
            )));
        }
        sys.check_scratch(run.kernel)?;
        Ok(())
    }

    /// Apply `PIMWALK_*` environment variable overrides.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(v) = env_parse::<usize>("PIMWALK_ACCELERATORS")? {
            self.system.accelerators = v;
        }
        if let Some(v) = env_parse::<usize>("PIMWALK_TASKLETS")? {
            self.system.tasklets = v;
        }
        if let Some(v) = env_parse::<usize>("PIMWALK_BLOCK_SIZE")? {
            self.system.block_size = v;
        }
        if let Some(v) = env_parse::<KernelId>("PIMWALK_KERNEL")? {
            self.run.kernel = v;
        }
        if let Some(v) = env_parse::<usize>("PIMWALK_INPUT_SIZE")? {
            self.run.input_size = v;
        }
        if let Some(v) = env_parse::<usize>("PIMWALK_WARMUP")? {
            self.run.warmup = v;
        }
        if let Some(v) = env_parse::<usize>("PIMWALK_REPS")? {
            self.run.reps = v;
        }
        if let Some(v) = env_parse::<u64>("PIMWALK_SEED")? {
            self.run.seed = v;
        }
        if let Ok(level) = std::env::var("PIMWALK_LOG_LEVEL") {
            self.logging.level = level;
        }
        Ok(())
    }
}

fn env_parse<T>(key: &str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(val) => val.trim().parse::<T>().map(Some).map_err(|e| ConfigError::EnvOverride {
            key: key.into(),
            value: val.clone(),
            reason: e.to_string(),
        }),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const ENV_KEYS: [&str; 9] = [
        "PIMWALK_ACCELERATORS",
        "PIMWALK_TASKLETS",
        "PIMWALK_BLOCK_SIZE",
        "PIMWALK_KERNEL",
        "PIMWALK_INPUT_SIZE",
        "PIMWALK_WARMUP",
        "PIMWALK_REPS",
        "PIMWALK_SEED",
        "PIMWALK_LOG_LEVEL",
    ];

    fn cleared_env() -> Vec<(&'static str, Option<&'static str>)> {
        ENV_KEYS.iter().map(|k| (*k, None)).collect()
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(PimConfig::default().validate().is_ok());
    }

    #[test]
    fn test_default_toml_round_trips() {
        let toml_str = PimConfig::default_toml().unwrap();
        let cfg: PimConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(cfg, PimConfig::default());
    }

    #[test]
    #[serial(pimwalk_env)]
    fn test_from_toml_partial_sections() {
        temp_env::with_vars(cleared_env(), || {
            let cfg = PimConfig::from_toml(
                r#"
[system]
accelerators = 8
tasklets = 12

[run]
kernel = "edge-reduce"
scaling = "weak"
input_size = 64
"#,
            )
            .unwrap();
            assert_eq!(cfg.system.accelerators, 8);
            assert_eq!(cfg.system.tasklets, 12);
            assert_eq!(cfg.system.block_size, 1024);
            assert_eq!(cfg.run.kernel, KernelId::EdgeReduce);
            assert_eq!(cfg.run.total_size(cfg.system.accelerators), 512);
            assert_eq!(cfg.logging, LoggingConfig::default());
        });
    }

    #[test]
    fn test_validation_zero_accelerators() {
        let mut cfg = PimConfig::default();
        cfg.system.accelerators = 0;
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("accelerators must be > 0"));
    }

    #[test]
    fn test_validation_block_size_not_power_of_two() {
        let mut cfg = PimConfig::default();
        cfg.system.block_size = 1000;
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("power of two"));
    }

    #[test]
    fn test_validation_too_many_tasklets() {
        let mut cfg = PimConfig::default();
        cfg.system.tasklets = 25;
        assert!(matches!(cfg.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_validation_walker_node_out_of_graph() {
        let mut cfg = PimConfig::default();
        cfg.run.kernel = KernelId::EdgeScan;
        cfg.run.walker_node = 16;
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("walker_node"));
    }

    #[test]
    fn test_scratch_capacity_is_enforced() {
        let mut cfg = PimConfig::default();
        cfg.system.block_size = 2048;
        // 16 tasklets x 2 arrays x 2048 bytes = 64 KiB fits exactly
        assert!(cfg.validate().is_ok());
        cfg.system.tasklets = 17;
        match cfg.validate() {
            Err(ConfigError::Capacity(CapacityError::Scratch { required, capacity, .. })) => {
                assert_eq!(required, 17 * 2 * 2048);
                assert_eq!(capacity, 64 * 1024);
            }
            other => panic!("expected scratch capacity error, got {other:?}"),
        }
    }

    #[test]
    #[serial(pimwalk_env)]
    fn test_env_override_multiple_fields() {
        let mut vars = cleared_env();
        vars.retain(|(k, _)| !matches!(*k, "PIMWALK_ACCELERATORS" | "PIMWALK_KERNEL" | "PIMWALK_SEED"));
        vars.push(("PIMWALK_ACCELERATORS", Some("2")));
        vars.push(("PIMWALK_KERNEL", Some("scan")));
        vars.push(("PIMWALK_SEED", Some("42")));
        temp_env::with_vars(vars, || {
            let cfg = PimConfig::from_env().unwrap();
            assert_eq!(cfg.system.accelerators, 2);
            assert_eq!(cfg.run.kernel, KernelId::EdgeScan);
            assert_eq!(cfg.run.seed, 42);
        });
    }

    #[test]
    #[serial(pimwalk_env)]
    fn test_env_override_invalid_value() {
        let mut vars = cleared_env();
        vars.retain(|(k, _)| *k != "PIMWALK_TASKLETS");
        vars.push(("PIMWALK_TASKLETS", Some("many")));
        temp_env::with_vars(vars, || match PimConfig::from_env().unwrap_err() {
            ConfigError::EnvOverride { key, value, .. } => {
                assert_eq!(key, "PIMWALK_TASKLETS");
                assert_eq!(value, "many");
            }
            other => panic!("expected EnvOverride, got: {other}"),
        });
    }

    #[test]
    #[serial(pimwalk_env)]
    fn test_load_from_tempfile() {
        temp_env::with_vars(cleared_env(), || {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("pimwalk.toml");
            std::fs::write(&path, PimConfig::default_toml().unwrap()).unwrap();
            assert_eq!(PimConfig::load(&path).unwrap(), PimConfig::default());
        });
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = PimConfig::load(Path::new("/nonexistent/pimwalk.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_scaling_display_roundtrip() {
        for mode in [Scaling::Strong, Scaling::Weak] {
            assert_eq!(mode.to_string().parse::<Scaling>().unwrap(), mode);
        }
    }
}
