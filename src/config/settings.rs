use serde::Deserialize;

/// Top-level configuration settings for the application.
///
/// Includes settings for the server, the presence gateway and logging.
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub gateway: GatewaySettings,
    pub log: LogSettings,
}

/// Configuration settings for the server.
///
/// Defines the host and port the server will bind to.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

/// Configuration settings for the presence gateway.
#[derive(Debug, Deserialize, Clone)]
pub struct GatewaySettings {
    /// Live connections accepted before new ones are turned away.
    pub max_connections: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LogSettings {
    pub level: String,
}

/// Partial configuration settings loaded from files or environment.
///
/// Allows partial specification of settings. Missing values can be filled using defaults.
#[derive(Debug, Default, Deserialize)]
pub struct PartialSettings {
    pub server: Option<PartialServerSettings>,
    pub gateway: Option<PartialGatewaySettings>,
    pub log: Option<PartialLogSettings>,
}

#[derive(Debug, Deserialize)]
pub struct PartialServerSettings {
    pub host: Option<String>,
    pub port: Option<u16>,
}

#[derive(Debug, Deserialize)]
pub struct PartialGatewaySettings {
    pub max_connections: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct PartialLogSettings {
    pub level: Option<String>,
}

impl Settings {
    /// Socket address string the server binds to.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Fill every value missing from `partial` with the default.
    pub fn merged(partial: PartialSettings) -> Self {
        let default = Self::default();
        let server = partial.server;
        let gateway = partial.gateway;
        let log = partial.log;

        Self {
            server: ServerSettings {
                host: server
                    .as_ref()
                    .and_then(|s| s.host.clone())
                    .unwrap_or(default.server.host),
                port: server
                    .as_ref()
                    .and_then(|s| s.port)
                    .unwrap_or(default.server.port),
            },
            gateway: GatewaySettings {
                max_connections: gateway
                    .as_ref()
                    .and_then(|g| g.max_connections)
                    .unwrap_or(default.gateway.max_connections),
            },
            log: LogSettings {
                level: log
                    .and_then(|l| l.level)
                    .unwrap_or(default.log.level),
            },
        }
    }
}

/// Provides default values for `Settings`.
impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerSettings {
                host: "127.0.0.1".to_string(),
                port: 8080,
            },
            gateway: GatewaySettings {
                max_connections: 1000,
            },
            log: LogSettings {
                level: "info".to_string(),
            },
        }
    }
}
