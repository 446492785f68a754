use anyhow::Result;
use clap::Parser;
use env_logger::Env;

use frida_bypass::cli::Cli;

const ENV_FRIDA_BYPASS_LOGLEVEL: &str = "FRIDA_BYPASS_LOGLEVEL";

#[tokio::main]
pub async fn main() -> Result<()> {
    env_logger::init_from_env(Env::new().filter(ENV_FRIDA_BYPASS_LOGLEVEL));
    Cli::parse().run().await
}
