use std::{
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};

use anyhow::Context;
use axum::{
    Json, Router,
    extract::{Query, State, rejection::QueryRejection},
    routing::get,
};
use serde::{Deserialize, Serialize};
use tldr_snowflake::{LockSnowflakeGenerator, SnowflakeGenerator, SnowflakeId};
use tower_http::cors::{Any, CorsLayer};
use tracing::{debug, instrument};

use crate::server::{
    config::ServerConfig,
    error::{Result, ServiceError},
};

type SharedGenerator = Arc<dyn SnowflakeGenerator + Send + Sync>;

/// State shared by every request handler.
///
/// Holds the process's single generator behind an [`Arc`]. Cloning the state
/// clones the handle, never the generator.
#[derive(Clone)]
pub struct AppState {
    generator: SharedGenerator,
    max_batch: usize,
}

impl AppState {
    /// Builds the wall-clock generator for the configured node.
    ///
    /// # Errors
    ///
    /// Fails if the generator rejects the node identifier or the system
    /// clock has not reached the epoch. Callers treat this as fatal.
    pub fn new(config: &ServerConfig) -> anyhow::Result<Self> {
        let generator = LockSnowflakeGenerator::new(i64::from(config.node_id))
            .context("failed to initialize snowflake generator")?;
        Ok(Self::with_generator(Arc::new(generator), config.max_batch))
    }

    pub fn with_generator(generator: SharedGenerator, max_batch: usize) -> Self {
        Self {
            generator,
            max_batch,
        }
    }

    pub fn node_id(&self) -> u16 {
        self.generator.node_id()
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    service: &'static str,
    timestamp: u64,
}

#[derive(Serialize)]
struct IdResponse {
    #[serde(with = "tldr_snowflake::serde::as_decimal_str")]
    id: SnowflakeId,
}

#[derive(Serialize)]
struct IdsResponse {
    ids: Vec<String>,
}

#[derive(Deserialize, Debug)]
struct BatchQuery {
    count: Option<usize>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/id", get(next_id))
        .route("/ids", get(next_ids))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

#[allow(clippy::cast_possible_truncation)]
async fn health() -> Json<HealthResponse> {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_millis() as u64);
    Json(HealthResponse {
        status: "ok",
        service: "tldr",
        timestamp,
    })
}

// Generation may spin on the clock while holding the generator lock, so it
// runs on the blocking pool and never stalls a runtime worker.
async fn next_id(State(state): State<AppState>) -> Result<Json<IdResponse>> {
    let id = tokio::task::spawn_blocking(move || state.generator.generate()).await?;
    Ok(Json(IdResponse { id }))
}

#[instrument(level = "debug", skip(state))]
async fn next_ids(
    State(state): State<AppState>,
    query: core::result::Result<Query<BatchQuery>, QueryRejection>,
) -> Result<Json<IdsResponse>> {
    let Query(query) = query.map_err(|e| ServiceError::InvalidRequest {
        reason: e.body_text(),
    })?;
    let count = query.count.unwrap_or(1);

    if count == 0 || count > state.max_batch {
        return Err(ServiceError::InvalidRequest {
            reason: format!("count must be between 1 and {}, got {count}", state.max_batch),
        });
    }

    let generator = Arc::clone(&state.generator);
    let ids = tokio::task::spawn_blocking(move || {
        (0..count)
            .map(|_| generator.generate().to_string())
            .collect::<Vec<_>>()
    })
    .await?;
    debug!(count, "generated id batch");

    Ok(Json(IdsResponse { ids }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{Body, to_bytes},
        http::{Request, StatusCode},
    };
    use serde_json::Value;
    use std::sync::atomic::{AtomicU64, Ordering};
    use tldr_snowflake::TimeSource;
    use tower::ServiceExt;

    fn state(node_id: u16, max_batch: usize) -> AppState {
        AppState::new(&ServerConfig {
            node_id,
            max_batch,
            server_addr: String::from("127.0.0.1:0"),
        })
        .unwrap()
    }

    async fn get_json(state: AppState, uri: &str) -> (StatusCode, Value) {
        let response = router(state)
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    fn parse_id(value: &Value) -> SnowflakeId {
        value.as_str().expect("ids are strings").parse().unwrap()
    }

    /// A clock the test moves by hand, counting how often it is read.
    #[derive(Clone, Default)]
    struct SharedClock {
        millis: Arc<AtomicU64>,
        reads: Arc<AtomicU64>,
    }

    impl TimeSource for SharedClock {
        fn current_millis(&self) -> u64 {
            self.reads.fetch_add(1, Ordering::SeqCst);
            self.millis.load(Ordering::SeqCst)
        }
    }

    #[test]
    fn rejects_invalid_node_id() {
        let config = ServerConfig {
            node_id: 1024,
            max_batch: 1,
            server_addr: String::from("127.0.0.1:0"),
        };
        let err = AppState::new(&config).err().unwrap();
        assert!(format!("{err:#}").contains("1024"));
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let (status, body) = get_json(state(1, 10), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "tldr");
        assert!(body["timestamp"].as_u64().unwrap() > 0);
    }

    #[tokio::test]
    async fn id_carries_node_and_increases() {
        let state = state(5, 10);
        let (status, first) = get_json(state.clone(), "/id").await;
        assert_eq!(status, StatusCode::OK);
        let (_, second) = get_json(state.clone(), "/id").await;

        let first = parse_id(&first["id"]);
        let second = parse_id(&second["id"]);
        assert!(second > first);
        assert_eq!((first.to_raw() >> 12) & 1023, 5);
        assert_eq!(state.node_id(), 5);
    }

    #[tokio::test]
    async fn ids_returns_requested_count_in_order() {
        let (status, body) = get_json(state(2, 100), "/ids?count=50").await;
        assert_eq!(status, StatusCode::OK);

        let ids: Vec<SnowflakeId> = body["ids"].as_array().unwrap().iter().map(parse_id).collect();
        assert_eq!(ids.len(), 50);
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
    }

    #[tokio::test]
    async fn ids_defaults_to_one() {
        let (status, body) = get_json(state(2, 100), "/ids").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ids"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn ids_rejects_out_of_range_counts() {
        for uri in ["/ids?count=0", "/ids?count=11"] {
            let (status, body) = get_json(state(2, 10), uri).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert!(
                body["error"]
                    .as_str()
                    .unwrap()
                    .contains("count must be between 1 and 10")
            );
        }
    }

    #[tokio::test]
    async fn ids_rejects_malformed_counts() {
        let (status, body) = get_json(state(2, 10), "/ids?count=abc").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().starts_with("Invalid request"));
    }

    #[tokio::test]
    async fn health_answers_while_generation_waits_on_the_clock() {
        let clock = SharedClock::default();
        clock.millis.store(1_000, Ordering::SeqCst);
        let generator = LockSnowflakeGenerator::with_clock(3, clock.clone()).unwrap();
        assert_eq!(generator.generate().to_raw() >> 22, 1_000);

        // Step the clock back so the next id has to wait for it.
        clock.millis.store(500, Ordering::SeqCst);
        let state = AppState::with_generator(Arc::new(generator), 10);
        let pending = tokio::spawn(get_json(state.clone(), "/id"));

        let reads = clock.reads.load(Ordering::SeqCst);
        while clock.reads.load(Ordering::SeqCst) <= reads + 1 {
            tokio::task::yield_now().await;
        }

        // The test runtime has a single worker; this only completes if the
        // waiting generator is not occupying it.
        let (status, body) = get_json(state, "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert!(!pending.is_finished());

        clock.millis.store(1_001, Ordering::SeqCst);
        let (status, body) = pending.await.unwrap();
        assert_eq!(status, StatusCode::OK);
        let id = parse_id(&body["id"]);
        assert_eq!(id.to_raw() >> 22, 1_001);
        assert_eq!(id.to_raw() & 4095, 0);
    }
}
