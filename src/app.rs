use std::net::SocketAddr;

use anyhow::Context;
use axum::{extract::State, http::HeaderValue, routing::get, Json, Router};
use serde_json::{json, Value};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::AppConfig;
use crate::state::AppState;
use crate::{auth, bottles, collections, reviews, search, tasting_notes, users};

pub fn build_app(state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors_origins);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .merge(auth::router())
        .merge(users::router())
        .merge(reviews::router())
        .merge(bottles::router())
        .merge(collections::router())
        .merge(tasting_notes::router())
        .merge(search::router())
        .with_state(state)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!(
                        "http_request",
                        %method,
                        uri = %uri,
                        status = tracing::field::Empty
                    )
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        let latency_ms = latency.as_millis() as u64;
                        if status.is_server_error() {
                            tracing::error!(%status, latency_ms, "response");
                        } else {
                            tracing::info!(%status, latency_ms, "response");
                        }
                    },
                ),
        )
}

/// No configured origins means any origin is accepted.
fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::permissive();
    }
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match o.parse::<HeaderValue>() {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!(origin = %o, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods(Any)
        .allow_headers(Any)
}

async fn root(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "message": format!("Welcome to {}", state.config.app_name),
        "version": state.config.app_version,
    }))
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({ "status": "ok", "version": state.config.app_version }))
}

pub async fn serve(app: Router, config: &AppConfig) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("invalid APP_HOST/APP_PORT")?;

    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::services::JwtKeys;
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use axum::extract::FromRef;
    use tower::ServiceExt;

    fn app() -> Router {
        build_app(AppState::fake())
    }

    async fn body_json(res: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let res = app().oneshot(get("/health")).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let v = body_json(res).await;
        assert_eq!(v["status"], "ok");
        assert_eq!(v["version"], "test");
    }

    #[tokio::test]
    async fn root_welcomes() {
        let res = app().oneshot(get("/")).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let v = body_json(res).await;
        assert_eq!(v["message"], "Welcome to DrinkShelf");
    }

    #[tokio::test]
    async fn protected_routes_require_a_token() {
        for uri in [
            "/users/me",
            "/bottles",
            "/bottles/stats",
            "/collections",
            "/tasting-notes/user/statistics",
            "/users/me/flavor-profile",
        ] {
            let res = app().oneshot(get(uri)).await.unwrap();
            assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "{uri}");
            assert_eq!(res.headers()[header::WWW_AUTHENTICATE], "Bearer");
        }
    }

    #[tokio::test]
    async fn garbage_token_is_unauthorized() {
        let req = Request::builder()
            .uri("/bottles")
            .header(header::AUTHORIZATION, "Bearer not.a.jwt")
            .body(Body::empty())
            .unwrap();
        let res = app().oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn malformed_register_body_is_422() {
        let req = Request::builder()
            .method("POST")
            .uri("/auth/register")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"username": "ab"}"#))
            .unwrap();
        let res = app().oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let v = body_json(res).await;
        assert!(v["detail"].is_string());
    }

    #[tokio::test]
    async fn invalid_bottle_is_422_before_touching_db() {
        let state = AppState::fake();
        let token = JwtKeys::from_ref(&state).sign(uuid::Uuid::new_v4()).unwrap();
        let req = Request::builder()
            .method("POST")
            .uri("/bottles")
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"name": "Ardbeg", "spirit_type": "whiskey", "rating": 7}"#))
            .unwrap();
        let res = build_app(state).oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn out_of_range_query_is_422() {
        for uri in [
            "/search/filter?min_rating=9",
            "/search/bottles?q=",
            "/search/popular?limit=0",
            "/search/regions/islay?limit=500",
            "/search/filter?min_proof=abc",
        ] {
            let res = app().oneshot(get(uri)).await.unwrap();
            assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY, "{uri}");
        }
    }

    #[tokio::test]
    async fn non_uuid_path_is_rejected() {
        let res = app()
            .oneshot(get("/tasting-notes/bottle/not-a-uuid/stats"))
            .await
            .unwrap();
        assert!(res.status().is_client_error());
    }
}
