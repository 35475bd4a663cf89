//! Runtime configuration.
//!
//! Every setting is a CLI flag with an environment variable fallback:
//! - `ALBOOK_DB` - SQLite database path (default: `./albook.db`)
//! - `ALBOOK_HOST` - Address to bind (default: `127.0.0.1`)
//! - `ALBOOK_PORT` - HTTP port (default: `2100`)
//! - `ALBOOK_STATIC_DIR` - Directory of static files served at `/` (optional)

use std::path::PathBuf;

use clap::Args;

pub const DEFAULT_DB_PATH: &str = "./albook.db";
pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 2100;

/// Database location, shared by every subcommand.
#[derive(Debug, Clone, Args)]
pub struct StoreConfig {
    /// Path to the SQLite database file
    #[arg(long = "db", env = "ALBOOK_DB", default_value = DEFAULT_DB_PATH)]
    pub db_path: PathBuf,
}

/// HTTP server settings.
#[derive(Debug, Clone, Args)]
pub struct ServeConfig {
    #[command(flatten)]
    pub store: StoreConfig,

    /// Address to bind the HTTP server to
    #[arg(long, env = "ALBOOK_HOST", default_value = DEFAULT_HOST)]
    pub host: String,

    /// Port for the HTTP server
    #[arg(short, long, env = "ALBOOK_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Serve files from this directory at `/`
    #[arg(long, env = "ALBOOK_STATIC_DIR")]
    pub static_dir: Option<PathBuf>,
}

impl ServeConfig {
    /// `host:port`, resolved when the listener binds.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig {
                db_path: PathBuf::from(DEFAULT_DB_PATH),
            },
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            static_dir: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_binds_localhost() {
        let config = ServeConfig::default();
        assert_eq!(config.bind_addr(), "127.0.0.1:2100");
        assert_eq!(config.store.db_path, PathBuf::from("./albook.db"));
    }

    #[test]
    fn flags_override_defaults() {
        use clap::Parser;

        #[derive(Parser)]
        struct Harness {
            #[command(flatten)]
            serve: ServeConfig,
        }

        let harness = Harness::parse_from([
            "albook",
            "--db",
            "/tmp/reviews.db",
            "--host",
            "0.0.0.0",
            "-p",
            "8080",
            "--static-dir",
            "public",
        ]);

        assert_eq!(harness.serve.bind_addr(), "0.0.0.0:8080");
        assert_eq!(harness.serve.store.db_path, PathBuf::from("/tmp/reviews.db"));
        assert_eq!(harness.serve.static_dir, Some(PathBuf::from("public")));
    }
}
