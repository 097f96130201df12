use clap::Parser;
use raire_core::config::ServiceConfig;
use tracing_subscriber::{fmt, EnvFilter};

mod cli;

use cli::args::Cli;
use cli::commands::{dispatch, exit_codes};

fn init_logging(log_level: &str) {
    let filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(filter)
        .json()
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .with_target(true)
        .with_current_span(false)
        .with_span_list(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main(flavor = "multi_thread")]
async fn main() {
    let cli = Cli::parse();

    let loaded = match ServiceConfig::load(cli.config.as_deref()) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("config error: {e:?}");
            std::process::exit(exit_codes::CONFIG_ERROR);
        }
    };

    init_logging(&loaded.config.log_level);
    for key in &loaded.ignored_keys {
        tracing::warn!(event = "raire.config.unknown_key", key = %key);
    }

    let code = match dispatch(cli, loaded.config).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("fatal: {e:?}");
            exit_codes::CONFIG_ERROR
        }
    };
    std::process::exit(code);
}
