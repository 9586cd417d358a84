//! Rig configuration.
//!
//! Everything the tool needs to know about the physical setup lives in one
//! TOML file: how many valve lines are wired, which device routes carry each
//! channel, and the timing rules a sequence file must respect. Defaults match
//! a single-device USB-600x rig, so the file is optional.
//!
//! ```text
//! valve_count = 8
//! min_time_step_ms = 50
//! bit_order = "little"
//! valves_port = "Dev1/port0"
//! piezo_line = "Dev1/port1/line0"
//! led_channel = "Dev1/ao0"
//! trigger_line = "Dev1/PFI0"
//! led_max_volts = 10.0
//! ```

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::pack::{BitOrder, ChannelPacker, PackError, WORD_BITS};
use crate::sequence::ParseOptions;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RigConfig {
    /// Number of wired valve lines; sets the record shape of sequence files.
    pub valve_count: usize,
    /// Output clock period. Only the 1 ms quantum is supported.
    pub sample_period_ms: u32,
    /// Minimum increment between consecutive sequence timestamps. Raise this
    /// to cover valve settling time.
    pub min_time_step_ms: u32,
    /// Bit order of the packed digital word.
    pub bit_order: BitOrder,
    /// Digital port carrying the valve lines.
    pub valves_port: String,
    /// Digital line carrying the piezo trigger.
    pub piezo_line: String,
    /// Analog channel driving the LED.
    pub led_channel: String,
    /// Input line the rig watches for the external start trigger.
    pub trigger_line: String,
    /// Full-scale voltage the LED channel is allowed to reach.
    pub led_max_volts: f64,
}

impl Default for RigConfig {
    fn default() -> Self {
        Self {
            valve_count: 8,
            sample_period_ms: 1,
            min_time_step_ms: 1,
            bit_order: BitOrder::LittleEndian,
            valves_port: "Dev1/port0".to_string(),
            piezo_line: "Dev1/port1/line0".to_string(),
            led_channel: "Dev1/ao0".to_string(),
            trigger_line: "Dev1/PFI0".to_string(),
            led_max_volts: 10.0,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io { path, source } => {
                write!(f, "cannot read config {}: {}", path.display(), source)
            }
            ConfigError::Parse { path, source } => {
                write!(f, "cannot parse config {}: {}", path.display(), source)
            }
            ConfigError::Invalid(reason) => write!(f, "invalid config: {reason}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            ConfigError::Parse { source, .. } => Some(source),
            ConfigError::Invalid(_) => None,
        }
    }
}

impl From<PackError> for ConfigError {
    fn from(err: PackError) -> Self {
        ConfigError::Invalid(err.to_string())
    }
}

impl RigConfig {
    /// Load and validate a config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: RigConfig = toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.valve_count == 0 {
            return Err(ConfigError::Invalid("valve_count must be at least 1".into()));
        }
        if self.digital_width() > WORD_BITS {
            return Err(ConfigError::Invalid(format!(
                "{} valve lines plus the piezo flag exceed the {WORD_BITS}-bit sample word",
                self.valve_count
            )));
        }
        if self.sample_period_ms != 1 {
            return Err(ConfigError::Invalid(
                "only a 1 ms sample period is supported".into(),
            ));
        }
        if self.min_time_step_ms == 0 {
            return Err(ConfigError::Invalid(
                "min_time_step_ms must be at least 1".into(),
            ));
        }
        if self.led_max_volts <= 0.0 {
            return Err(ConfigError::Invalid(
                "led_max_volts must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Width of the packed digital word: one bit per valve plus the piezo.
    pub fn digital_width(&self) -> usize {
        self.valve_count + 1
    }

    pub fn packer(&self) -> Result<ChannelPacker, ConfigError> {
        Ok(ChannelPacker::new(self.digital_width(), self.bit_order)?)
    }

    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions {
            valve_count: self.valve_count,
            min_time_step_ms: self.min_time_step_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_validate() {
        let config = RigConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.digital_width(), 9);
        assert_eq!(config.packer().unwrap().width(), 9);
    }

    #[test]
    fn load_round_trips_overrides() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "valve_count = 4\nmin_time_step_ms = 50\nbit_order = \"big\"\nled_max_volts = 5.0"
        )
        .unwrap();

        let config = RigConfig::load(file.path()).unwrap();
        assert_eq!(config.valve_count, 4);
        assert_eq!(config.min_time_step_ms, 50);
        assert_eq!(config.bit_order, BitOrder::BigEndian);
        assert_eq!(config.led_max_volts, 5.0);
        // Untouched fields keep their defaults.
        assert_eq!(config.valves_port, "Dev1/port0");
        assert_eq!(config.parse_options().valve_count, 4);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "valve_cuont = 4").unwrap();
        assert!(matches!(
            RigConfig::load(file.path()),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn zero_valves_is_invalid() {
        let config = RigConfig {
            valve_count: 0,
            ..RigConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn word_width_limit_is_enforced() {
        let config = RigConfig {
            valve_count: 32,
            ..RigConfig::default()
        };
        assert!(config.validate().is_err());

        let config = RigConfig {
            valve_count: 31,
            ..RigConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn only_millisecond_quantum_is_supported() {
        let config = RigConfig {
            sample_period_ms: 2,
            ..RigConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_config_file_is_an_error() {
        assert!(matches!(
            RigConfig::load(Path::new("/no/such/rig.toml")),
            Err(ConfigError::Io { .. })
        ));
    }
}
