use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use crate::errors::LibraryError;

pub const DEFAULT_PORT: u16 = 4000;
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_TITLE: &str = "Private Library";

/// Command line arguments, each backed by an environment variable
#[derive(Debug, Parser)]
#[command(name = "bookshelf")]
#[command(about = "Serve a tree of Markdown books as a browsable library", long_about = None)]
pub struct Args {
    /// Directory holding the books
    #[arg(long, env = "BOOKSHELF_ROOT", default_value = "books")]
    pub root: PathBuf,

    /// Directory served under /static
    #[arg(long, env = "BOOKSHELF_STATIC", default_value = "static")]
    pub static_dir: PathBuf,

    /// Directory containing base.html
    #[arg(long, env = "BOOKSHELF_TEMPLATES", default_value = "templates")]
    pub templates_dir: PathBuf,

    #[arg(long, env = "BOOKSHELF_HOST", default_value = DEFAULT_HOST)]
    pub host: String,

    #[arg(long, env = "BOOKSHELF_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Title shown on the home page and in every page header
    #[arg(long, env = "BOOKSHELF_TITLE", default_value = DEFAULT_TITLE)]
    pub title: String,

    /// Shared password; the gate is disabled when unset
    #[arg(long, env = "BOOKSHELF_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub base_dir: Arc<PathBuf>,
    pub static_dir: Arc<PathBuf>,
    pub templates_dir: Arc<PathBuf>,
    pub port: u16,
    pub host: String,
    pub site_title: String,
    pub password: Option<String>,
}

impl Config {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self {
            base_dir: Arc::new(PathBuf::from("books")),
            static_dir: Arc::new(PathBuf::from("static")),
            templates_dir: Arc::new(PathBuf::from("templates")),
            port: DEFAULT_PORT,
            host: DEFAULT_HOST.to_string(),
            site_title: DEFAULT_TITLE.to_string(),
            password: None,
        }
    }

    /// Create configuration rooted at `base_dir`, everything else defaulted
    pub fn with_custom(
        base_dir: PathBuf,
        static_dir: PathBuf,
        port: Option<u16>,
        host: Option<String>,
    ) -> Self {
        Self {
            base_dir: Arc::new(base_dir),
            static_dir: Arc::new(static_dir),
            port: port.unwrap_or(DEFAULT_PORT),
            host: host.unwrap_or_else(|| DEFAULT_HOST.to_string()),
            ..Self::new()
        }
    }

    pub fn from_args(args: Args) -> Self {
        Self {
            base_dir: Arc::new(args.root),
            static_dir: Arc::new(args.static_dir),
            templates_dir: Arc::new(args.templates_dir),
            port: args.port,
            host: args.host,
            site_title: args.title,
            // An empty password would let anyone in; treat it as unset.
            password: args.password.filter(|p| !p.is_empty()),
        }
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.site_title = title.into();
        self
    }

    /// Get the socket address for binding
    pub fn socket_addr(&self) -> Result<SocketAddr, LibraryError> {
        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|_| LibraryError::Config(format!("invalid host address '{}'", self.host)))?;
        Ok(SocketAddr::new(ip, self.port))
    }

    /// Fail fast when the books directory is missing
    pub fn validate(&self) -> Result<(), LibraryError> {
        if !self.base_dir.is_dir() {
            return Err(LibraryError::Config(format!(
                "books directory {:?} does not exist",
                self.base_dir
            )));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.port, 4000);
        assert_eq!(config.base_dir.as_ref(), &PathBuf::from("books"));
        assert!(config.password.is_none());
    }

    #[test]
    fn test_from_args_drops_empty_password() {
        let args = Args::parse_from(["bookshelf", "--root", "library", "--port", "8080", "--password", ""]);
        let config = Config::from_args(args);
        assert_eq!(config.port, 8080);
        assert_eq!(config.base_dir.as_ref(), &PathBuf::from("library"));
        assert!(config.password.is_none());
    }

    #[test]
    fn test_socket_addr() {
        let config = Config::with_custom(PathBuf::from("books"), PathBuf::from("static"), Some(5000), Some("127.0.0.1".to_string()));
        assert_eq!(config.socket_addr().unwrap().to_string(), "127.0.0.1:5000");

        let bad = Config::with_custom(PathBuf::from("books"), PathBuf::from("static"), None, Some("not-an-ip".to_string()));
        assert!(matches!(bad.socket_addr(), Err(LibraryError::Config(_))));
    }

    #[test]
    fn test_validate_missing_root() {
        let config = Config::with_custom(PathBuf::from("/definitely/not/here"), PathBuf::from("static"), None, None);
        assert!(config.validate().is_err());
    }
}
