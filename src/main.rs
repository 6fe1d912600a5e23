// Start of file: src/main.rs

use std::sync::Arc;
use axum::{serve, Router};
use tokio::net::TcpListener;
use tracing::info;

use recipe_api::config::{environment::EnvironmentVariables, state::AppState};
use recipe_api::core::{
    logging::init_tracing,
    server::{create_app, setup_listener, shutdown_signal},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // * Loaded once; a broken configuration aborts startup
    let environment: Arc<EnvironmentVariables> = Arc::new(EnvironmentVariables::instance().clone());

    // set up logging
    init_tracing(environment.log_ansi);

    let state: AppState = AppState::from_env(environment.clone()).await?;

    // build our router
    let app: Router = create_app(state.clone());

    let listener: TcpListener = setup_listener(&environment).await?;
    info!("Server listening on: {}", listener.local_addr()?);

    serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(state))
        .await?;

    Ok(())
}

// End of file: src/main.rs
