use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct SpkgArgs {
    /// Path to the config file.
    #[arg(short, long, default_value = "data/config.yml")]
    pub config: PathBuf,
}
