use std::net::SocketAddr;

use tokio::signal::ctrl_c;
use warp::Filter;

use crate::{
    config::Config,
    connect::{connect, migrate},
    error::{Error, HtmlError},
    jwt::SessionSigner,
};

use super::{routes::routes, state::AppState};

pub async fn start_server(config: Config) -> Result<(), Error> {
    log::info!("Initializing state...");

    let pool = connect(&config.database_url).await?;
    migrate(&pool).await?;

    let signer = SessionSigner::new(&config.secret, config.session_hours)?;
    let state = AppState::new(pool.clone(), signer, config.limits);

    let app = routes(state).with(warp::log("foodgram"));

    let address = SocketAddr::from(([0, 0, 0, 0], config.port));
    log::info!("Binding to {address}");

    let (address, server) = warp::serve(app)
        .try_bind_with_graceful_shutdown(address, shutdown_signal())
        .map_err(|e| {
            log::error!("Failed to bind {address}: {e}");
            HtmlError::InternalServerError.new("Failed to bind server address")
        })?;

    log::info!("Server running on {address}");
    server.await;

    pool.close().await;
    log::info!("Server shut down");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match ctrl_c().await {
            Ok(()) => log::info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                log::error!("Failed to install Ctrl+C handler: {e}");
                std::future::pending::<()>().await
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                log::info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                log::error!("Failed to install signal handler: {e}");
                std::future::pending::<()>().await
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
