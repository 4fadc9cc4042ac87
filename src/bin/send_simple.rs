use clap::Parser;
use p4_frames::api::cipher::Key;
use p4_frames::api::config::{
    DataLayout, DirectionKeys, ExchangeConfig, ProtocolConfig, DATA_WIDTH,
};
use p4_frames::api::dispatcher::Dispatcher;
use p4_frames::api::repl::{repl, SecureShell};
use p4_frames::cli::{CliError, CliResult, LinkArgs, INTERNAL, SUCCESS};
use p4_frames::utils::logging::init_logging;

fn default_encrypt_key() -> Key {
    DirectionKeys::default().encrypt
}

fn default_decrypt_key() -> Key {
    DirectionKeys::default().decrypt
}

/// Scramble, descramble or reflect short messages through a P4 device.
#[derive(Parser, Debug)]
#[command(name = "send_simple", version)]
struct Cli {
    #[command(flatten)]
    link: LinkArgs,

    /// Width of the fixed data field in bytes.
    #[arg(long, default_value_t = DATA_WIDTH)]
    data_width: usize,

    /// Send data unpadded; the peer must know the length out of band.
    #[arg(long, conflicts_with = "data_width")]
    variable: bool,

    /// Key that descrambles `$e` replies.
    #[arg(long, value_name = "HEX", default_value_t = default_encrypt_key())]
    encrypt_key: Key,

    /// Key that scrambles `$d` requests.
    #[arg(long, value_name = "HEX", default_value_t = default_decrypt_key())]
    decrypt_key: Key,
}

impl Cli {
    fn protocol(&self, source: [u8; 6]) -> ProtocolConfig {
        let layout = if self.variable {
            DataLayout::Variable
        } else {
            DataLayout::Fixed(self.data_width)
        };
        ProtocolConfig {
            ethertype: self.link.ethertype,
            layout,
            destination: self.link.dst,
            keys: DirectionKeys {
                encrypt: self.encrypt_key.clone(),
                decrypt: self.decrypt_key.clone(),
            },
            ..ProtocolConfig::default()
        }
        .with_source(source)
    }
}

fn run(cli: Cli) -> CliResult<i32> {
    let (driver, source) = cli.link.open_driver()?;
    let exchange = ExchangeConfig {
        timeout: cli.link.timeout,
    };
    let dispatcher = Dispatcher::new(cli.protocol(source), exchange, driver);
    let mut shell = SecureShell::new(dispatcher, cli.link.show);

    repl(&mut shell).map_err(|err| CliError::new(INTERNAL, format!("shell failed: {err}")))?;
    Ok(SUCCESS)
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.link.log_format, cli.link.log_level);

    match run(cli) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_deployed_program() {
        let cli = Cli::try_parse_from(["send_simple"]).expect("defaults should parse");
        let config = cli.protocol([0; 6]);
        assert_eq!(config, ProtocolConfig::default());
        assert_eq!(cli.link.timeout, std::time::Duration::from_secs(5));
        assert!(!cli.link.show);
    }

    #[test]
    fn parses_overrides() {
        let cli = Cli::try_parse_from([
            "send_simple",
            "--iface",
            "veth0-1",
            "--dst",
            "02:00:00:00:00:01",
            "--data-width",
            "24",
            "--encrypt-key",
            "0x00ff",
            "--timeout",
            "500ms",
            "--show",
        ])
        .expect("overrides should parse");

        let config = cli.protocol([2, 0, 0, 0, 0, 9]);
        assert_eq!(config.layout, DataLayout::Fixed(24));
        assert_eq!(config.destination, [2, 0, 0, 0, 0, 1]);
        assert_eq!(config.source, [2, 0, 0, 0, 0, 9]);
        assert_eq!(config.keys.encrypt.as_bytes(), &[0x00, 0xff]);
        assert_eq!(cli.link.iface.as_deref(), Some("veth0-1"));
        assert!(cli.link.show);
    }

    #[test]
    fn variable_layout() {
        let cli = Cli::try_parse_from(["send_simple", "--variable"]).expect("should parse");
        assert_eq!(cli.protocol([0; 6]).layout, DataLayout::Variable);
    }

    #[test]
    fn rejects_bad_key() {
        let err = Cli::try_parse_from(["send_simple", "--decrypt-key", "0x123"])
            .expect_err("odd-length key should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }
}
