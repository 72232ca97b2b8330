//! Environment-derived configuration, read once at startup.

/// Endpoint configuration for the openLCA IPC server.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub host: String,
    pub port: u16,
}

impl Config {
    pub const DEFAULT_HOST: &'static str = "localhost";
    pub const DEFAULT_PORT: u16 = 8080;

    /// Reads `OPENLCA_HOST` and `OPENLCA_PORT`, falling back to
    /// `localhost:8080`. An unparsable port is logged and ignored.
    pub fn from_env() -> Self {
        let host =
            std::env::var("OPENLCA_HOST").unwrap_or_else(|_| Self::DEFAULT_HOST.to_string());
        let port = match std::env::var("OPENLCA_PORT") {
            Ok(raw) => raw.parse().unwrap_or_else(|_| {
                tracing::warn!(port = %raw, "invalid OPENLCA_PORT, using default");
                Self::DEFAULT_PORT
            }),
            Err(_) => Self::DEFAULT_PORT,
        };
        Self { host, port }
    }

    pub fn endpoint(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: Self::DEFAULT_HOST.to_string(),
            port: Self::DEFAULT_PORT,
        }
    }
}
