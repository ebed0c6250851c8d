use hundred_days::{
    config::{Backend, Config},
    identity::{IdentityProvider, SupabaseIdentity},
    load_curriculum, router,
    store::{LocalStore, ProgressStore, RemoteConfig, RemoteStore, Scope},
    AppState,
};
use reqwest::Client;
use std::{net::SocketAddr, sync::Arc};
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let config = Config::from_env()?;
    let curriculum = Arc::new(load_curriculum(&config.curriculum_path).await?);
    info!(days = curriculum.len(), "curriculum loaded");

    let state = build_state(&config, curriculum).await;
    let app = router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn build_state(config: &Config, curriculum: Arc<hundred_days::Curriculum>) -> AppState {
    let timeout = Some(config.store_timeout);

    match (&config.backend, &config.remote) {
        (Backend::Remote, Some(remote)) => {
            let client = Client::new();
            let store: Arc<dyn ProgressStore> = Arc::new(RemoteStore::new(
                client.clone(),
                RemoteConfig {
                    base_url: remote.url.clone(),
                    anon_key: remote.anon_key.clone(),
                    table: remote.table.clone(),
                },
            ));
            let identity: Arc<dyn IdentityProvider> = Arc::new(SupabaseIdentity::new(
                client,
                remote.url.clone(),
                remote.anon_key.clone(),
                remote.redirect_url.clone(),
            ));
            let state = AppState::new(
                Backend::Remote,
                curriculum,
                store,
                Some(Arc::clone(&identity)),
                timeout,
            );

            if let Some(token) = &remote.access_token {
                match identity.current_user(token).await {
                    Ok(user) => {
                        let tracker = state.open_tracker(Scope::User(user)).await;
                        state.install(tracker).await;
                    }
                    Err(err) => error!("configured access token rejected: {err}"),
                }
            }
            info!("using remote progress backend");
            state
        }
        _ => {
            let store: Arc<dyn ProgressStore> = Arc::new(LocalStore::new(&config.data_path));
            let state = AppState::new(Backend::Local, curriculum, store, None, timeout);
            let tracker = state.open_tracker(Scope::Device).await;
            state.install(tracker).await;
            info!(path = %config.data_path.display(), "using local progress backend");
            state
        }
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("failed to listen for shutdown signal: {err}");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}
