mod config;
mod db;
mod domain;
mod routes;
mod services;
mod state;
mod strategy;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let settings = config::Settings::from_env().expect("invalid settings");
    let port = settings.port;

    let pool = db::init_pool(&settings.database_url, settings.db_max_connections)
        .await
        .expect("database init failed");

    if settings.paper_only {
        tracing::info!("PAPER_TRADING is set; orders will never reach the broker");
    }

    let start_scheduler = settings.start_scheduler;
    let state = state::AppState::new(pool, settings);

    if start_scheduler {
        match state.scheduler.start(state.pool.clone(), state.settings.clone()).await {
            Ok(()) => tracing::info!("scheduler started at boot"),
            Err(e) => tracing::warn!(error = %e, "scheduler did not start at boot"),
        }
    }

    let app = routes::leptos_app(state).expect("router init failed");
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .expect("failed to bind");

    tracing::info!(%port, "dhan algo terminal listening");
    axum::serve(listener, app).await.expect("server failed");
}
