use std::sync::Arc;

use anyhow::Context;

use hydro_dashboard::config::Config;
use hydro_dashboard::ingest::ImgwClient;
use hydro_dashboard::logging::{self, Component};
use hydro_dashboard::server::{self, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().context("loading configuration")?;

    logging::init_logger(
        config.log_level()?,
        config.logging.file.as_deref(),
        config.logging.timestamps,
    );

    let client = ImgwClient::new(config.api_url.clone(), config.request_timeout());
    let bind_addr = config.bind_addr;

    logging::info(
        Component::System,
        &format!(
            "Serving {:?} report on http://{} (snapshot {}, source {})",
            config.report_style,
            bind_addr,
            config.snapshot_path.display(),
            client.api_url()
        ),
    );

    let state = Arc::new(AppState::new(config, Arc::new(client)));
    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("binding {}", bind_addr))?;

    axum::serve(listener, server::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    logging::info(Component::System, "Shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        logging::error(Component::System, &format!("Cannot listen for Ctrl-C: {}", e));
        std::future::pending::<()>().await;
    }
}
