use super::types::*;
use crate::error_handling::types::ConfigError;
use clap::Parser;
use log::{debug, info};
use serde::Deserialize;
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application configuration structure that defines all runtime parameters.
///
/// The structure is read from a TOML file with the `toml` crate; every field
/// has a default so an empty file (or no file at all) is a valid
/// configuration. Command-line flags parsed into [`CliArgs`] are layered on
/// top with [`Config::apply_overrides`].
///
/// # Examples
///
/// ```
/// use sharkline::configuration::Config;
///
/// let config = Config::from_toml_str("port = 8080").unwrap();
/// assert_eq!(config.port, 8080);
/// assert_eq!(config.host, "127.0.0.1");
/// ```
///
/// # Fields Overview
///
/// - `tshark_path`: the external packet-analysis executable
/// - `host` / `port`: where the tool server binds
/// - `command_timeout_secs`: hard limit for file-based invocations, `0` disables it
/// - `capture_grace_secs`: slack added to a live capture's own duration
/// - `listing_max_packets`: bound recorded for listing and statistics operations
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Path or bare name of the tshark executable.
    pub tshark_path: PathBuf,

    /// IP address the server binds to.
    pub host: String,

    /// TCP port the server listens on. Must not be 0.
    pub port: u16,

    /// Wall-clock limit applied to every non-capture invocation.
    ///
    /// Setting this to '0' means invocations are bounded only by the tool's
    /// own processing time.
    pub command_timeout_secs: u64,

    /// Seconds granted to a live capture beyond its requested duration before
    /// the child process is killed.
    pub capture_grace_secs: u64,

    /// Packet bound reported in the metadata of listing and statistics results.
    pub listing_max_packets: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tshark_path: PathBuf::from(DEFAULT_TSHARK_PATH),
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            command_timeout_secs: DEFAULT_COMMAND_TIMEOUT_SECS,
            capture_grace_secs: DEFAULT_CAPTURE_GRACE_SECS,
            listing_max_packets: DEFAULT_LISTING_MAX_PACKETS,
        }
    }
}

impl Config {
    /// Builds the effective configuration for a process: the file named by
    /// `--config` (or the defaults), then the command-line overrides.
    pub fn load(args: &CliArgs) -> Result<Self, ConfigError> {
        let base = match &args.config {
            Some(path) => Self::from_file(path)?,
            None => {
                info!("No configuration file given, using defaults");
                Self::default()
            }
        };
        let config = base.apply_overrides(args);
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        info!("Reading configuration from {}", path.display());
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Config =
            toml::from_str(content).map_err(|e| ConfigError::TomlError(e.to_string()))?;
        config.validate()?;
        debug!("Parsed configuration: {:?}", config);
        Ok(config)
    }

    /// Layers the flags that were actually given on top of `self`.
    pub fn apply_overrides(mut self, args: &CliArgs) -> Self {
        if let Some(path) = &args.tshark_path {
            self.tshark_path = path.clone();
        }
        if let Some(host) = &args.host {
            self.host = host.clone();
        }
        if let Some(port) = args.port {
            self.port = port;
        }
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.host
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::BadIPFormatting(format!("{}: {}", self.host, e)))?;
        if self.port == 0 {
            return Err(ConfigError::NotInRange(
                "port must be between 1 and 65535".to_string(),
            ));
        }
        if self.tshark_path.as_os_str().is_empty() {
            return Err(ConfigError::NotInRange(
                "tshark_path must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip = self
            .host
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::BadIPFormatting(format!("{}: {}", self.host, e)))?;
        Ok(SocketAddr::new(ip, self.port))
    }

    pub fn command_timeout(&self) -> Option<Duration> {
        match self.command_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    pub fn capture_grace(&self) -> Duration {
        Duration::from_secs(self.capture_grace_secs)
    }
}

/// Command-line arguments of the `sharkline` binary.
///
/// Every override can also come from the environment, which is how the
/// server is usually configured under a process supervisor.
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "sharkline")]
#[command(version)]
#[command(about = "Packet capture and pcap analysis tools backed by tshark")]
pub struct CliArgs {
    /// TOML configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// tshark executable path
    #[arg(long, env = "SHARKLINE_TSHARK_PATH")]
    pub tshark_path: Option<PathBuf>,

    /// Server host address
    #[arg(long, env = "SHARKLINE_HOST")]
    pub host: Option<String>,

    /// Server port
    #[arg(long, env = "SHARKLINE_PORT")]
    pub port: Option<u16>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn empty_file_yields_defaults() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.command_timeout(), Some(Duration::from_secs(300)));
    }

    #[test]
    fn from_file_reads_toml() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "tshark_path = \"/opt/wireshark/bin/tshark\"\nhost = \"0.0.0.0\"\nport = 8080\ncommand_timeout_secs = 0"
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.tshark_path, PathBuf::from("/opt/wireshark/bin/tshark"));
        assert_eq!(config.socket_addr().unwrap().to_string(), "0.0.0.0:8080");
        assert_eq!(config.command_timeout(), None);
        assert_eq!(config.capture_grace_secs, DEFAULT_CAPTURE_GRACE_SECS);
    }

    #[test]
    fn rejects_bad_host_and_zero_port() {
        assert!(matches!(
            Config::from_toml_str("host = \"localhost:99\""),
            Err(ConfigError::BadIPFormatting(_))
        ));
        assert!(matches!(
            Config::from_toml_str("port = 0"),
            Err(ConfigError::NotInRange(_))
        ));
        assert!(matches!(
            Config::from_toml_str("port = \"abc\""),
            Err(ConfigError::TomlError(_))
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        let result = Config::from_file(Path::new("/definitely/not/here.toml"));
        assert!(matches!(result, Err(ConfigError::IoError(_))));
    }

    #[test]
    #[serial]
    fn cli_flags_override_file_values() {
        std::env::remove_var("SHARKLINE_PORT");
        let args = CliArgs::try_parse_from([
            "sharkline",
            "--tshark-path",
            "/usr/local/bin/tshark",
            "--port",
            "4000",
        ])
        .unwrap_or_else(|e| panic!("{}", e));

        let config = Config::load(&args).unwrap();
        assert_eq!(config.tshark_path, PathBuf::from("/usr/local/bin/tshark"));
        assert_eq!(config.port, 4000);
        assert_eq!(config.host, DEFAULT_HOST);
    }

    #[test]
    #[serial]
    fn environment_supplies_overrides() {
        std::env::set_var("SHARKLINE_PORT", "5050");
        let args = CliArgs::try_parse_from(["sharkline"]).unwrap_or_else(|e| panic!("{}", e));
        std::env::remove_var("SHARKLINE_PORT");

        assert_eq!(args.port, Some(5050));
        assert_eq!(Config::load(&args).unwrap().port, 5050);
    }
}
