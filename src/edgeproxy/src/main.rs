mod commands;

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use edgeproxy_config::{load_config, ProxyConfig};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;
use tracing::{error, warn};

#[derive(Parser, Debug)]
#[command(version, about = "EdgeProxy: gateway provisioning and access control")]
struct Args {
    /// Path to config file (yaml/json/toml)
    #[arg(short, long, default_value = "./config.yaml")]
    config: String,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create services, routes and plugins on the gateway
    Init,
    /// Delete every gateway managed object
    Reset,
    /// Create a consumer and print its credential
    Adduser {
        #[arg(long)]
        user: String,
        /// Fallback token lifetime, e.g. 1h
        #[arg(long = "tokenTTL", value_parser = humantime::parse_duration)]
        token_ttl: Option<Duration>,
        #[arg(long = "jwtAudience")]
        jwt_audience: Option<String>,
        #[arg(long = "jwtTTL", value_parser = humantime::parse_duration)]
        jwt_ttl: Option<Duration>,
        #[arg(long = "useRootToken")]
        use_root_token: bool,
    },
    /// Delete a consumer
    Deluser {
        #[arg(long)]
        user: String,
        #[arg(long = "useRootToken")]
        use_root_token: bool,
    },
    /// Install a certificate and key for the gateway
    Tls {
        #[arg(long = "inCert")]
        in_cert: PathBuf,
        #[arg(long = "inKey")]
        in_key: PathBuf,
        #[arg(long = "targetFolder")]
        target_folder: Option<String>,
        #[arg(long = "certFilename")]
        cert_filename: Option<String>,
        #[arg(long = "keyFilename")]
        key_filename: Option<String>,
    },
    /// Sign an admin JWT with a local private key
    Jwt {
        /// RS256 or ES256
        #[arg(long)]
        algorithm: String,
        #[arg(long = "private_key")]
        private_key: PathBuf,
        /// Issuer written to `iss`
        #[arg(long)]
        id: String,
        #[arg(long, value_parser = humantime::parse_duration, default_value = "1h")]
        expiration: Duration,
    },
}

fn load(path: &str) -> Result<(ProxyConfig, bool)> {
    if Path::new(path).exists() {
        Ok((load_config(path)?, true))
    } else {
        Ok((ProxyConfig::default(), false))
    }
}

/// No subcommand given.
const EXIT_USAGE: u8 = 1;
/// Config, transport or gateway failure.
const EXIT_FAILURE: u8 = 2;

async fn execute(args: Args) -> u8 {
    let Some(command) = args.command else {
        let _ = Args::command().print_help();
        return EXIT_USAGE;
    };

    let (mut cfg, found) = match load(&args.config) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("error: {e:#}");
            return EXIT_FAILURE;
        }
    };
    cfg.apply_env();
    // a subscriber installed earlier in the process keeps logging working
    if let Err(e) = edgeproxy_tracing::init(&cfg.logging.level, &cfg.logging.mode) {
        eprintln!("warning: logging not initialised: {e:#}");
    }
    if !found {
        warn!(path = %args.config, "config file not found, using defaults");
    }

    match commands::run(command, &cfg).await {
        Ok(()) => 0,
        Err(e) => {
            error!("{e:#}");
            eprintln!("error: {e:#}");
            EXIT_FAILURE
        }
    }
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    ExitCode::from(execute(Args::parse()).await)
}
