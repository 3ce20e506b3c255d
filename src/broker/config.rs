//! Broker configuration

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Broker configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrokerConfig {
    /// Channel buffer size for broker requests
    #[serde(default = "default_channel_buffer")]
    pub channel_buffer: usize,

    /// Channel buffer size for per-client reply channels
    #[serde(default = "default_client_channel_buffer")]
    pub client_channel_buffer: usize,
}

fn default_channel_buffer() -> usize {
    debug!("default_channel_buffer: called");
    1000
}

fn default_client_channel_buffer() -> usize {
    debug!("default_client_channel_buffer: called");
    100
}

impl Default for BrokerConfig {
    fn default() -> Self {
        debug!("BrokerConfig::default: called");
        Self {
            channel_buffer: 1000,
            client_channel_buffer: 100,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = BrokerConfig::default();
        assert_eq!(config.channel_buffer, 1000);
        assert_eq!(config.client_channel_buffer, 100);
    }

    #[test]
    fn test_config_deserialization_fills_defaults() {
        let config: BrokerConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.channel_buffer, 1000);
        assert_eq!(config.client_channel_buffer, 100);

        let config: BrokerConfig = serde_json::from_str(r#"{"channel_buffer": 16}"#).unwrap();
        assert_eq!(config.channel_buffer, 16);
        assert_eq!(config.client_channel_buffer, 100);
    }
}
