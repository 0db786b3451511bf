//! Editor plugin, package managers and language servers.

use clap::Parser;
use d0tb00t_c0re_lib::prompt;
use d0tb00t_cli::{EnvArgs, logging, run_env};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    logging::init();
    let args = EnvArgs::parse();
    let prompt = prompt::for_stdio();
    run_env(&args, prompt.as_ref()).await
}
