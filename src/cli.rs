//! Command-line plumbing shared by the `send_simple` and `calc` binaries.
use std::fmt;
use std::io;
use std::time::Duration;

use clap::Args;
use tracing::info;

use crate::link::exchange::ExchangeDriver;
use crate::link::network_interface::{
    pick_interface, Explicit, FirstMatching, InterfaceSelector, DEFAULT_PATTERN, FALLBACK_INTERFACE,
};
use crate::link::raw_socket::RawSocket;
use crate::utils::eth_utils::{format_mac, parse_ethertype, parse_mac};
use crate::utils::logging::{LogFormat, LogLevel};

pub const SUCCESS: i32 = 0;
pub const TRANSPORT_ERROR: i32 = 3;
pub const PERMISSION_DENIED: i32 = 50;
pub const USAGE: i32 = 64;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::NotFound | io::ErrorKind::InvalidInput => USAGE,
        _ => TRANSPORT_ERROR,
    };
    CliError::new(code, format!("{context}: {err}"))
}

/// Accepts `5`, `5s` or `500ms`.
pub fn parse_duration(input: &str) -> Result<Duration, String> {
    let input = input.trim();
    let (number, millis) = if let Some(num) = input.strip_suffix("ms") {
        (num, true)
    } else if let Some(num) = input.strip_suffix('s') {
        (num, false)
    } else {
        (input, false)
    };

    let value: u64 = number
        .parse()
        .map_err(|_| format!("invalid duration value: {input}"))?;
    if value == 0 {
        return Err("duration must be greater than zero".to_string());
    }

    Ok(if millis {
        Duration::from_millis(value)
    } else {
        Duration::from_secs(value)
    })
}

/// Where and how frames are exchanged.
#[derive(Args, Debug, Clone)]
pub struct LinkArgs {
    /// Network interface to bind. Skips interface discovery.
    #[arg(long, value_name = "NAME")]
    pub iface: Option<String>,

    /// Pick the first interface whose name contains this text.
    #[arg(long, value_name = "TEXT", default_value = DEFAULT_PATTERN)]
    pub iface_match: String,

    /// Destination MAC address of the data-plane device.
    #[arg(long, value_name = "MAC", value_parser = parse_mac, default_value = "e4:5f:01:8d:c8:32")]
    pub dst: [u8; 6],

    /// Private ethertype of the exchanged frames.
    #[arg(long, value_parser = parse_ethertype, default_value = "0x1234")]
    pub ethertype: u16,

    /// How long to wait for a reply (e.g. 5s, 500ms).
    #[arg(long, value_parser = parse_duration, default_value = "5s")]
    pub timeout: Duration,

    /// Print each outgoing frame before sending it.
    #[arg(long)]
    pub show: bool,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text")]
    pub log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "warn")]
    pub log_level: LogLevel,
}

impl LinkArgs {
    pub fn selector(&self) -> Box<dyn InterfaceSelector> {
        match &self.iface {
            Some(name) => Box::new(Explicit(name.clone())),
            None => Box::new(FirstMatching {
                pattern: self.iface_match.clone(),
                fallback: Some(FALLBACK_INTERFACE.to_string()),
            }),
        }
    }

    /// Finds the interface, binds a raw socket on it and reports its MAC.
    pub fn open_driver(&self) -> CliResult<(ExchangeDriver<RawSocket>, [u8; 6])> {
        let name = pick_interface(self.selector().as_ref())
            .map_err(|err| io_error("cannot list interfaces", err))?
            .ok_or_else(|| {
                CliError::new(USAGE, format!("Cannot find {} interface", self.iface_match))
            })?;

        let driver = ExchangeDriver::open(&name, self.ethertype)
            .map_err(|err| io_error(&format!("cannot open interface {name}"), err))?;
        let source = driver.link().hardware_address();
        info!(interface = %name, source = %format_mac(&source), "interface bound");
        println!("{}", name);
        Ok((driver, source))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::config::{DEFAULT_DESTINATION, ETHERTYPE};

    #[test]
    fn parse_duration_seconds_and_millis() {
        assert_eq!(parse_duration("5"), Ok(Duration::from_secs(5)));
        assert_eq!(parse_duration("2s"), Ok(Duration::from_secs(2)));
        assert_eq!(parse_duration("250ms"), Ok(Duration::from_millis(250)));
    }

    #[test]
    fn parse_duration_rejects_invalid_values() {
        assert!(parse_duration("").is_err());
        assert!(parse_duration("0s").is_err());
        assert!(parse_duration("fast").is_err());
    }

    #[test]
    fn io_error_codes() {
        let err = io_error("open", io::Error::from(io::ErrorKind::PermissionDenied));
        assert_eq!(err.code, PERMISSION_DENIED);
        let err = io_error("open", io::Error::from(io::ErrorKind::NotFound));
        assert_eq!(err.code, USAGE);
        assert!(err.message.starts_with("open: "));
    }

    #[test]
    fn explicit_interface_skips_discovery() {
        let args = LinkArgs {
            iface: Some("veth0-1".to_string()),
            iface_match: DEFAULT_PATTERN.to_string(),
            dst: DEFAULT_DESTINATION,
            ethertype: ETHERTYPE,
            timeout: Duration::from_secs(5),
            show: false,
            log_format: LogFormat::Text,
            log_level: LogLevel::Warn,
        };
        assert_eq!(args.selector().select(&[]), Some("veth0-1".to_string()));
    }
}
