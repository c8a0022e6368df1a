//! ```sh
//! SPKG_AUTH_TOKEN=x cargo r -p spkg-client -F binary -- 'http://localhost:8080' upload foo foo-1.0.pkg
//! ```

use clap::{Parser, Subcommand};
use spkg_client::Client;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(version, about)]
pub struct Args {
    /// Repository http URL (`http://repo.example.com:8080`)
    endpoint: String,
    #[arg(long, env = "SPKG_AUTH_TOKEN", hide_env_values = true)]
    auth_token: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Push a built binpkg for an indexed package.
    Upload { package: String, binpkg: PathBuf },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let client = Client::new(&args.endpoint, args.auth_token);

    match args.command {
        Commands::Upload { package, binpkg } => {
            let msg = client.upload_file(&package, &binpkg).await?;
            println!("{msg}");
        }
    }
    Ok(())
}
