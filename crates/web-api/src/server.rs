use crate::controller::ViewController;
use crate::data_health::{self, DataHealthState};
use crate::handlers::{self, AppState};
use axum::{routing::get, Router};
use sqlx::PgPool;
use std::future::Future;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub struct ApiServer {
    controller: Arc<ViewController>,
    pool: Option<PgPool>,
}

impl ApiServer {
    #[must_use]
    pub const fn new(controller: Arc<ViewController>) -> Self {
        Self {
            controller,
            pool: None,
        }
    }

    /// Enables `/api/data/health` against `pool`.
    #[must_use]
    pub fn with_health(mut self, pool: PgPool) -> Self {
        self.pool = Some(pool);
        self
    }

    pub fn router(&self) -> Router {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        let mut router = Router::new()
            .route("/", get(handlers::dashboard_page))
            .route("/api/dashboard", get(handlers::dashboard_json))
            .with_state(AppState {
                controller: self.controller.clone(),
            });

        if let Some(pool) = &self.pool {
            router = router.merge(
                Router::new()
                    .route("/api/data/health", get(data_health::data_health))
                    .with_state(DataHealthState { pool: pool.clone() }),
            );
        }

        router.layer(cors).layer(TraceLayer::new_for_http())
    }

    /// Serves on `addr` until `shutdown` resolves.
    ///
    /// # Errors
    /// Returns an error if the server fails to bind to the address or serve requests.
    pub async fn serve<F>(self, addr: &str, shutdown: F) -> anyhow::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!("Dashboard listening on http://{}", listener.local_addr()?);

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("Dashboard stopped");
        Ok(())
    }
}
