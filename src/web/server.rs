use axum::{routing::get, Router};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::orbit::SolarEphemeris;
use crate::telemetry::{
    BroadcastScheduler, ElementsCache, FetchError, HttpElementsSource, HttpPositionSource,
    SubscriberRegistry, Supervisor,
};

use super::api::telemetry as telemetry_handlers;
use super::api_doc::ApiDoc;
use super::config::{Config, ConfigError};
use super::ws;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("HTTP client setup failed: {0}")]
    Client(#[from] FetchError),
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub registry: Arc<SubscriberRegistry>,
    pub elements: Arc<ElementsCache>,
    pub send_timeout: Duration,
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let static_dir = state.config.web.static_dir.clone();

    let app = Router::new()
        // Push channel
        .route("/ws", get(ws::telemetry_socket))
        // Telemetry API endpoints
        .route("/api/snapshot", get(telemetry_handlers::latest_snapshot))
        .route("/api/track/segments", get(telemetry_handlers::track_segments))
        .route("/api/status", get(telemetry_handlers::status))
        // OpenAPI / Swagger
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()));

    let app = match static_dir {
        Some(dir) => app.fallback_service(ServeDir::new(dir)),
        None => app,
    };

    app.layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run_server(
    config: Config,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), ServerError> {
    config.validate()?;
    let bind_addr = config.web.bind.clone();

    let position = HttpPositionSource::new(
        config.sources.position_url.clone(),
        config.sources.timeout,
    )?;
    let elements_source = HttpElementsSource::new(
        config.sources.elements_url.clone(),
        config.sources.timeout,
    )?;

    let registry = Arc::new(SubscriberRegistry::new(config.broadcast.subscriber_buffer));
    let elements = Arc::new(ElementsCache::new(Arc::new(elements_source)));

    let scheduler = Arc::new(BroadcastScheduler {
        elements: elements.clone(),
        position: Arc::new(position),
        registry: registry.clone(),
        oracle: Arc::new(SolarEphemeris),
        window: config.track.window()?,
        crew_count: config.broadcast.crew_count,
    });

    let state = AppState {
        send_timeout: config.broadcast.send_timeout,
        config: Arc::new(config),
        registry,
        elements,
    };

    // Bind first so a bind failure never starts the telemetry tasks.
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    log::info!("Starting server on {}", bind_addr);

    let supervisor = Supervisor::start(
        scheduler,
        state.config.broadcast.elements_refresh,
        state.config.broadcast.interval,
    );

    let served = axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await;

    supervisor.shutdown().await;
    served?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::{PositionSample, Published, ScriptedElements, TelemetrySnapshot};
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use chrono::Utc;
    use futures::StreamExt;
    use serde_json::Value;
    use tokio_tungstenite::tungstenite::Message as WsMessage;
    use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
    use tower::ServiceExt;

    type Client = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

    fn state() -> AppState {
        AppState {
            config: Arc::new(Config::default()),
            registry: Arc::new(SubscriberRegistry::new(4)),
            elements: Arc::new(ElementsCache::new(Arc::new(ScriptedElements::iss()))),
            send_timeout: Duration::from_secs(1),
        }
    }

    fn publish(state: &AppState, lng: f64, track: Vec<[f64; 2]>) {
        let sample = PositionSample {
            latitude: 51.2,
            longitude: lng,
            altitude_km: 420.1,
            velocity: 7.66,
        };
        let track = track.into_iter().map(Into::into).collect();
        let snapshot = TelemetrySnapshot::assemble(sample, track, None, 7, Utc::now());
        state.registry.publish(Published::new(snapshot).unwrap());
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
        let response = app
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn snapshot_is_404_before_first_cycle() {
        let (status, body) = get_json(router(state()), "/api/snapshot").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "no_snapshot");
    }

    #[tokio::test]
    async fn snapshot_matches_push_payload() {
        let state = state();
        publish(&state, 179.5, vec![[51.2, 179.5]]);
        let pushed: Value =
            serde_json::from_str(&state.registry.latest().unwrap().payload).unwrap();

        let (status, body) = get_json(router(state), "/api/snapshot").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, pushed);
    }

    #[tokio::test]
    async fn segments_split_at_antimeridian() {
        let state = state();
        publish(&state, -179.7, vec![[51.2, 179.5], [51.1, -179.7]]);

        let (status, body) = get_json(router(state), "/api/track/segments").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body["segments"],
            serde_json::json!([[[51.2, 179.5]], [[51.1, -179.7]]])
        );
    }

    #[tokio::test]
    async fn status_reports_subscribers_and_elements() {
        let state = state();
        let _sub = state.registry.connect();
        state.elements.refresh().await.unwrap();

        let (status, body) = get_json(router(state), "/api/status").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["subscribers"], 1);
        assert!(body["last_update"].is_null());
        assert!(body["elements_epoch"].as_str().unwrap().starts_with("2020-07-12"));
    }

    async fn serve(state: AppState) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = router(state);
        tokio::spawn(async move { axum::serve(listener, app).await });
        format!("ws://{addr}/ws")
    }

    async fn next_text(client: &mut Client) -> String {
        loop {
            let frame = tokio::time::timeout(Duration::from_secs(5), client.next())
                .await
                .expect("no frame within 5s")
                .expect("stream ended")
                .unwrap();
            if let WsMessage::Text(text) = frame {
                return text.as_str().to_owned();
            }
        }
    }

    async fn wait_for_subscribers(state: &AppState, expected: usize) {
        for _ in 0..500 {
            if state.registry.len() == expected {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!(
            "expected {} subscribers, still {}",
            expected,
            state.registry.len()
        );
    }

    #[tokio::test]
    async fn socket_gets_catch_up_then_broadcasts_and_unregisters_on_close() {
        let state = state();
        publish(&state, 179.5, vec![[51.2, 179.5]]);
        let url = serve(state.clone()).await;

        let (mut client, _) = connect_async(url.as_str()).await.unwrap();
        let catch_up = next_text(&mut client).await;
        assert_eq!(catch_up, &*state.registry.latest().unwrap().payload);
        wait_for_subscribers(&state, 1).await;

        publish(&state, -179.7, vec![[51.1, -179.7]]);
        let next: Value = serde_json::from_str(&next_text(&mut client).await).unwrap();
        assert_eq!(next["iss"]["lng"], -179.7);

        client.close(None).await.unwrap();
        wait_for_subscribers(&state, 0).await;
    }

    #[tokio::test]
    async fn dropped_socket_is_unregistered() {
        let state = state();
        let url = serve(state.clone()).await;

        let (client, _) = connect_async(url.as_str()).await.unwrap();
        wait_for_subscribers(&state, 1).await;

        drop(client);
        wait_for_subscribers(&state, 0).await;

        // publishing afterwards reaches nobody and does not fail
        publish(&state, 10.0, Vec::new());
        assert_eq!(state.registry.len(), 0);
    }
}
