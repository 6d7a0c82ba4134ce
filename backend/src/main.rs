use tokio::net::TcpListener;
use tracing::{error, info};

use student_records_backend::config::Config;
use student_records_backend::domain::OrphanReclaimer;
use student_records_backend::logging::init_logging;
use student_records_backend::{create_router, initialize_backend};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    let config = Config::load()?;
    info!("Loaded configuration: {:?}", config);

    let app_state = initialize_backend(&config).await?;

    let reclaimer = OrphanReclaimer::new(
        app_state.student_service.clone(),
        config.orphan_sweep_interval(),
        config.orphan_min_age(),
    )
    .spawn();

    let router = create_router(app_state, &config);

    let addr = config.socket_addr();
    let listener = TcpListener::bind(addr).await?;
    info!("Server running at: http://localhost:{}/", config.port);

    let served = axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    reclaimer.shutdown().await;

    if let Err(e) = served {
        error!("Server error: {}", e);
        return Err(e.into());
    }

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
