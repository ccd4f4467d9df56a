use clap::Parser;
use linear_rl::cli::{self, Options};
use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let opts = Options::parse();
    cli::run(&opts)?;
    Ok(())
}
