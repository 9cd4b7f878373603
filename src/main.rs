// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::error::Error;

use axum::Router;
use axum_server::tls_rustls::RustlsConfig;
use guardian_ledger::{
    api::{cors_layer, router},
    config::{LogFormat, RelayConfig, TlsPaths, DEFAULT_LOG_FILTER},
    gateway::MetaTxGateway,
    ledger::Ledger,
    state::AppState,
};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let config = RelayConfig::from_env()?;
    init_tracing(config.log_format);

    // Must happen before any TLS configuration is built.
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| "failed to install rustls crypto provider")?;

    let relayer = config.relayer_signer()?.address();
    let gateway = MetaTxGateway::new(config.domain(relayer));
    let domain = gateway.config().clone();
    info!(
        name = %domain.name,
        version = %domain.version,
        chain_id = domain.chain_id,
        network = domain.network_name().unwrap_or("custom"),
        verifying_contract = %domain.verifying_contract,
        relayer = %relayer,
        public_host = config.domain_name.as_deref().unwrap_or("-"),
        "Signing domain configured"
    );

    warn!("Ledger state is held in memory; a restart resets nonces and records");
    let state = AppState::new(Ledger::new(), gateway, relayer);
    let app = router(state, cors_layer(&config.cors_origin)?);

    let cancel = CancellationToken::new();
    let https = match &config.tls {
        Some(paths) => {
            let addr = config.https_addr()?;
            Some(tokio::spawn(serve_https(
                addr,
                paths.clone(),
                app.clone(),
                cancel.clone(),
            )))
        }
        None => {
            warn!("TLS_CERT_PATH/TLS_KEY_PATH not set, serving plain HTTP only");
            None
        }
    };

    let http_addr = config.http_addr()?;
    let listener = tokio::net::TcpListener::bind(http_addr).await?;
    info!(address = %http_addr, "Guardian ledger relay listening (docs at /docs)");

    let shutdown = cancel.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            tokio::select! {
                _ = shutdown_signal() => {}
                _ = shutdown.cancelled() => {}
            }
        })
        .await?;

    cancel.cancel();
    if let Some(task) = https {
        match task.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => error!(error = %e, "HTTPS server failed"),
            Err(e) => error!(error = %e, "HTTPS task panicked"),
        }
    }

    info!("Relay shut down");
    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

async fn serve_https(
    addr: std::net::SocketAddr,
    paths: TlsPaths,
    app: Router,
    cancel: CancellationToken,
) -> std::io::Result<()> {
    let tls = RustlsConfig::from_pem_file(&paths.cert_path, &paths.key_path).await?;
    info!(address = %addr, "HTTPS listening");

    let server = axum_server::bind_rustls(addr, tls).serve(app.into_make_service());
    tokio::select! {
        result = server => {
            // A dead HTTPS listener takes the HTTP side down with it.
            cancel.cancel();
            result
        }
        _ = cancel.cancelled() => Ok(()),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}
