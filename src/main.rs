use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Router,
};
use jobboard_backend::services::cleanup_service::CleanupService;
use jobboard_backend::{
    config::{get_config, init_config},
    database::pool::create_pool,
    routes, AppState,
};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    init_config()?;
    let config = get_config();

    let pool = create_pool().await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let app_state = AppState::new(pool);

    {
        let state = app_state.clone();
        tokio::spawn(async move {
            let cleanup = CleanupService::new(state.pool.clone(), state.storage.clone());
            loop {
                match cleanup.run_once().await {
                    Ok(true) => {}
                    Ok(false) => {
                        tokio::time::sleep(Duration::from_secs(5)).await;
                    }
                    Err(e) => {
                        tracing::error!(error = ?e, "Storage cleanup worker error");
                        tokio::time::sleep(Duration::from_secs(5)).await;
                    }
                }
            }
        });
    }

    let base_routes = Router::new().route("/health", get(routes::health::health));

    let auth_api = Router::new()
        .route("/api/auth/signup", post(routes::auth::signup))
        .route("/api/auth/login", post(routes::auth::login));

    // Job routes mix public reads with owner-gated writes on the same paths,
    // so handlers that need a bearer pull `Claims` out themselves.
    let jobs_api = Router::new()
        .route(
            "/api/jobs",
            get(routes::job::list_jobs).post(routes::job::create_job),
        )
        .route("/api/jobs/all", get(routes::job::list_all_jobs))
        .route(
            "/api/jobs/:id",
            get(routes::job::get_job)
                .put(routes::job::update_job)
                .delete(routes::job::delete_job),
        )
        .route(
            "/api/jobs/:id/applications",
            get(routes::job::list_job_applications),
        );

    let applications_api = Router::new()
        .route(
            "/api/applications",
            get(routes::application::list_applications)
                .post(routes::application::submit_application),
        )
        .route(
            "/api/applications/all",
            get(routes::application::list_all_applications),
        )
        .route(
            "/api/applications/:id",
            put(routes::application::update_application_status)
                .delete(routes::application::delete_application),
        )
        .route(
            "/api/applications/:id/download",
            get(routes::application::download_resume),
        );

    let users_api = Router::new()
        .route(
            "/api/users/:id",
            get(routes::user::get_user).put(routes::user::update_profile),
        )
        .route("/api/users/:id/email", put(routes::user::change_email))
        .route(
            "/api/users/:id/password",
            put(routes::user::change_password),
        )
        .layer(axum::middleware::from_fn(
            jobboard_backend::middleware::auth::require_bearer_auth,
        ));

    let app = base_routes
        .merge(auth_api)
        .merge(jobs_api)
        .merge(applications_api)
        .merge(users_api)
        .with_state(app_state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(50 * 1024 * 1024));

    let addr: SocketAddr = config.server_address.parse()?;
    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
