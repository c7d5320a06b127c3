//! Process configuration from flags and environment.

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "cloudcar-server", version, about = "CloudCar dealership back-office API")]
pub struct ServerConfig {
    /// Address to listen on.
    #[arg(long, env = "CLOUDCAR_BIND", default_value = "127.0.0.1:5000")]
    pub bind: SocketAddr,

    /// SQLite database file; must be migrated with `cloudcar migrate` first.
    #[arg(long, env = "CLOUDCAR_DB", default_value = "cloudcar.sqlite3")]
    pub db: PathBuf,

    /// Only origin allowed to call the API from a browser.
    #[arg(
        long,
        env = "CLOUDCAR_ALLOWED_ORIGIN",
        default_value = "http://localhost:3000"
    )]
    pub allowed_origin: String,

    /// trace|debug|info|warn|error; defaults by build profile.
    #[arg(long, env = "CLOUDCAR_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Directory for rotated log files; stderr only when unset.
    #[arg(long, env = "CLOUDCAR_LOG_DIR")]
    pub log_dir: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::ServerConfig;
    use clap::Parser;

    #[test]
    fn flags_override_defaults() {
        let config = ServerConfig::parse_from([
            "cloudcar-server",
            "--bind",
            "0.0.0.0:8080",
            "--db",
            "/tmp/cars.db",
            "--allowed-origin",
            "https://loja.example",
        ]);
        assert_eq!(config.bind.port(), 8080);
        assert_eq!(config.db.to_str(), Some("/tmp/cars.db"));
        assert_eq!(config.allowed_origin, "https://loja.example");
    }

    #[test]
    fn rejects_malformed_bind_address() {
        assert!(ServerConfig::try_parse_from(["cloudcar-server", "--bind", "nope"]).is_err());
    }
}
