//! Runtime configuration.

use crate::error::ConfigError;
use crate::tracer::{parse_endpoint, DEFAULT_ZIPKIN_ENDPOINT};

/// What the binary should do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// No device given: list capture devices and exit
    ListDevices,
    /// Analyze DHCP traffic on the named device
    Analyze(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Capture device, empty for device listing
    pub device: String,
    /// Print decoded packets to stdout
    pub print: bool,
    /// Export transaction spans to Zipkin
    pub zipkin: bool,
    /// Zipkin collector URL
    pub zipkin_endpoint: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            device: String::new(),
            print: true,
            zipkin: false,
            zipkin_endpoint: DEFAULT_ZIPKIN_ENDPOINT.to_string(),
        }
    }
}

impl Config {
    pub fn mode(&self) -> Mode {
        if self.device.is_empty() {
            Mode::ListDevices
        } else {
            Mode::Analyze(self.device.clone())
        }
    }

    /// Check settings that would otherwise fail mid-run.
    ///
    /// The endpoint is only checked when export is enabled.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.zipkin {
            parse_endpoint(&self.zipkin_endpoint).map_err(ConfigError::Endpoint)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(config.print);
        assert!(!config.zipkin);
        assert_eq!(config.zipkin_endpoint, "http://127.0.0.1:9411/api/v2/spans");
        assert_eq!(config.mode(), Mode::ListDevices);
    }

    #[test]
    fn test_mode_with_device() {
        let config = Config {
            device: "eth0".to_string(),
            ..Config::default()
        };
        assert_eq!(config.mode(), Mode::Analyze("eth0".to_string()));
    }

    #[test]
    fn test_invalid_endpoint_only_matters_when_enabled() {
        let mut config = Config {
            zipkin_endpoint: "nonsense".to_string(),
            ..Config::default()
        };
        assert!(config.validate().is_ok());

        config.zipkin = true;
        assert!(matches!(config.validate(), Err(ConfigError::Endpoint(_))));
    }
}
