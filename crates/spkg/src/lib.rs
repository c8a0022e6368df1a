use anyhow::Context;

cfg_if::cfg_if! {
    if #[cfg(feature = "yes-auth-backend")] {
        use spkg_auth::yes_backend::YesAuthProvider as SelectedAuthProvider;
    } else if #[cfg(feature = "token-auth-backend")] {
        use spkg_auth::token_backend::TokenAuthProvider as SelectedAuthProvider;
    } else {
        compile_error!("Use cargo features to select an auth backend");
    }
}
use axum::Router;
use metrics_exporter_prometheus::PrometheusBuilder;
use spkg_index::JsonIndexProvider;
use spkg_storage::fs::FsStorageProvider;
use std::fs::read_to_string;
use std::net::SocketAddr;
use tokio::net::TcpListener;

pub mod cli;
mod config;

/// A bound listener with its router, ready to serve.
pub struct Listening {
    listener: TcpListener,
    router: Router,
}

impl Listening {
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Serve until SIGTERM or Ctrl-C, then finish in-flight requests.
    pub async fn serve(self) -> anyhow::Result<()> {
        axum::serve(self.listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("spkg server exited with error")?;

        tracing::info!("Completed graceful shutdown");

        Ok(())
    }
}

/// Load the config, index and providers, and bind the listening socket.
///
/// Everything loaded here is immutable for the lifetime of the server.
pub async fn start_listening(args: cli::SpkgArgs) -> anyhow::Result<Listening> {
    let config: config::Config<JsonIndexProvider, SelectedAuthProvider> = serde_yaml::from_str(
        &read_to_string(&args.config)
            .with_context(|| format!("Failed to read config file {}, is it present?", args.config.display()))?,
    )
    .context("Failed to deserialize config file, please make sure its in the right format")?;

    let config::Config {
        service,
        index_config,
        auth_config,
        store,
    } = config;

    if let Some(metrics_address) = service.metrics_address {
        PrometheusBuilder::new()
            .with_http_listener(metrics_address)
            .set_buckets(&[
                100e-6, 500e-6, 1e-3, 5e-3, 1e-2, 5e-2, 1e-1, 2e-1, 3e-1, 4e-1, 5e-1, 6e-1, 7e-1,
                8e-1, 9e-1, 1.0, 5.0, 10.0,
            ])
            .context("Failed to set buckets for prometheus")?
            .install()
            .context("Failed to install prometheus exporter")?;
    }

    let index_client = JsonIndexProvider::new(index_config).context("Failed to load package index")?;
    let storage_client = FsStorageProvider::new(store).context("Failed to open storage root")?;
    let auth_client =
        SelectedAuthProvider::new(auth_config).context("Failed to initialize auth client")?;

    tracing::info!(
        packages = index_client.len(),
        root = %storage_client.root().display(),
        filename_policy = ?storage_client.filename_policy(),
        "Loaded repository"
    );

    let listener = TcpListener::bind((service.address.as_str(), service.port))
        .await
        .with_context(|| format!("Failed to bind {}:{}", service.address, service.port))?;
    let addr = listener.local_addr()?;

    let router = spkg_server::router(service, index_client, storage_client, auth_client);

    tracing::info!(
        ?addr,
        "Starting spkg server with {} auth",
        std::any::type_name::<SelectedAuthProvider>()
    );

    Ok(Listening { listener, router })
}

// Based on: https://github.com/tokio-rs/axum/blob/main/examples/graceful-shutdown/src/main.rs
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal;

        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install signal handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, beginning graceful shutdown");
}
