//! Nerd Fonts installer.

use clap::Parser;
use d0tb00t_c0re_lib::prompt;
use d0tb00t_cli::{FontsArgs, logging, run_fonts};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    logging::init();
    let args = FontsArgs::parse();
    let prompt = prompt::for_stdio();
    run_fonts(&args, prompt.as_ref()).await
}
