use std::{net::SocketAddr, path::PathBuf};
use tracing::warn;

/// Listen address, overridden by `CHART_WS_ADDR`.
pub const ENV_WS_ADDR: &str = "CHART_WS_ADDR";
/// Optional JSON array of extra panel descriptors, set by `CHART_PANELS_FILE`.
pub const ENV_PANELS_FILE: &str = "CHART_PANELS_FILE";

/// Server configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// WebSocket listen address
    pub addr: SocketAddr,
    /// Extra panel descriptors loaded on top of the built-in presets
    pub panels_file: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], 9002)),
            panels_file: None,
        }
    }
}

impl ServerConfig {
    /// Read the configuration from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read the configuration through the provided variable lookup. Unparsable values fall back
    /// to the default.
    pub fn from_lookup<Lookup>(lookup: Lookup) -> Self
    where
        Lookup: Fn(&str) -> Option<String>,
    {
        let default = Self::default();

        let addr = match lookup(ENV_WS_ADDR) {
            Some(value) => value.parse().unwrap_or_else(|_| {
                warn!(
                    variable = ENV_WS_ADDR,
                    %value,
                    fallback = %default.addr,
                    "invalid listen address, using default"
                );
                default.addr
            }),
            None => default.addr,
        };

        let panels_file = lookup(ENV_PANELS_FILE)
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from);

        Self { addr, panels_file }
    }

    /// Set listen address
    pub fn with_addr(mut self, addr: SocketAddr) -> Self {
        self.addr = addr;
        self
    }

    /// Set panel descriptor file
    pub fn with_panels_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.panels_file = Some(path.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.addr.to_string(), "0.0.0.0:9002");
        assert_eq!(config.panels_file, None);
    }

    #[test]
    fn test_config_builder() {
        let config = ServerConfig::default()
            .with_addr(SocketAddr::from(([127, 0, 0, 1], 9100)))
            .with_panels_file("/etc/chart-panels/panels.json");

        assert_eq!(config.addr.to_string(), "127.0.0.1:9100");
        assert_eq!(
            config.panels_file,
            Some(PathBuf::from("/etc/chart-panels/panels.json"))
        );
    }

    #[test]
    fn test_config_from_lookup() {
        struct TestCase {
            input: Vec<(&'static str, &'static str)>,
            expected: ServerConfig,
        }

        let tests = vec![
            TestCase {
                // TC0: nothing set
                input: vec![],
                expected: ServerConfig::default(),
            },
            TestCase {
                // TC1: both set
                input: vec![
                    (ENV_WS_ADDR, "127.0.0.1:9100"),
                    (ENV_PANELS_FILE, "panels.json"),
                ],
                expected: ServerConfig::default()
                    .with_addr(SocketAddr::from(([127, 0, 0, 1], 9100)))
                    .with_panels_file("panels.json"),
            },
            TestCase {
                // TC2: invalid address falls back, blank file is ignored
                input: vec![(ENV_WS_ADDR, "localhost"), (ENV_PANELS_FILE, "  ")],
                expected: ServerConfig::default(),
            },
        ];

        for (index, test) in tests.into_iter().enumerate() {
            let actual = ServerConfig::from_lookup(|name| {
                test.input
                    .iter()
                    .find(|(key, _)| *key == name)
                    .map(|(_, value)| value.to_string())
            });
            assert_eq!(actual, test.expected, "TC{} failed", index);
        }
    }
}
