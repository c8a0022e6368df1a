use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let args = spkg::cli::SpkgArgs::parse();

    spkg::start_listening(args).await?.serve().await
}
