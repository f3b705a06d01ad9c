use clap::Parser;
use rentctl::{Application, config::Config, telemetry};

/// Wait for shutdown signal (SIGTERM or Ctrl+C)
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, shutting down gracefully...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, shutting down gracefully...");
        },
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // SMTP over TLS needs a process-wide crypto provider
    rustls::crypto::aws_lc_rs::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("Failed to install rustls crypto provider"))?;

    // Flags first: they name the config file to read
    let args = rentctl::config::Args::parse();
    let config = Config::load(&args)?;

    // `--validate` only checks that the file and environment load cleanly
    if args.validate {
        println!("Configuration is valid.");
        return Ok(());
    }

    // Logging (and OTLP export when enabled) must be up before the store connects
    telemetry::init_telemetry(config.enable_otel_export)?;
    tracing::debug!("{:?}", args);
    tracing::info!(
        address = %config.bind_address(),
        email = config.email.enabled,
        "Starting rentctl"
    );

    // Serves until SIGTERM or Ctrl+C, then drains in-flight requests
    Application::new(config).await?.serve(shutdown_signal()).await
}
