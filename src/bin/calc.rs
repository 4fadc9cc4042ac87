use clap::Parser;
use p4_frames::api::calc::CalcClient;
use p4_frames::api::config::{ExchangeConfig, ProtocolConfig};
use p4_frames::api::repl::{repl, CalcShell};
use p4_frames::cli::{CliError, CliResult, LinkArgs, INTERNAL, SUCCESS};
use p4_frames::utils::logging::init_logging;

/// Evaluate `<num> <op> <num>` on a P4 calculator device.
#[derive(Parser, Debug)]
#[command(name = "calc", version)]
struct Cli {
    #[command(flatten)]
    link: LinkArgs,
}

fn run(cli: Cli) -> CliResult<i32> {
    let (driver, source) = cli.link.open_driver()?;
    let config = ProtocolConfig {
        ethertype: cli.link.ethertype,
        destination: cli.link.dst,
        ..ProtocolConfig::default()
    }
    .with_source(source);
    let exchange = ExchangeConfig {
        timeout: cli.link.timeout,
    };
    let mut shell = CalcShell::new(CalcClient::new(config, exchange, driver), cli.link.show);

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
