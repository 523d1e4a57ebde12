use crate::{
    controller::{
        health_check_controller, notification_controller, progress_controller, stats_controller,
    },
    protect, AppState,
};
use axum::{
    middleware::from_fn_with_state,
    routing::{get, post, put},
    Router,
};

pub fn define_routes(app_state: AppState) -> Router {
    Router::new()
        .merge(health_routes())
        .merge(stats_routes(app_state.clone()))
        .merge(admin_notification_routes(app_state.clone()))
        .merge(progress_routes(app_state))
}

fn health_routes() -> Router {
    Router::new().route("/health", get(health_check_controller::health_check))
}

fn stats_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/stats", get(stats_controller::index))
        .with_state(app_state)
}

fn admin_notification_routes(app_state: AppState) -> Router {
    Router::new()
        .route(
            "/admin/notifications",
            post(notification_controller::create),
        )
        .route_layer(from_fn_with_state(app_state.clone(), protect::admin))
        .with_state(app_state)
}

fn progress_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/progress", put(progress_controller::update))
        .with_state(app_state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Method, Request, StatusCode},
    };
    use events::{Bridge, BridgeConfig, Relay};
    use jsonwebtoken::{encode, EncodingKey, Header};
    use notification::{NotificationConfig, Notifier, RegistrantRegistry};
    use progress_sync::auth::Claims;
    use progress_sync::{JwtValidator, ProgressSync, SyncConfig};
    use serde_json::{json, Value};
    use std::sync::Arc;
    use std::time::{SystemTime, UNIX_EPOCH};
    use tokio::net::UdpSocket;
    use tower::ServiceExt;

    const SECRET: &str = "router-test-secret";

    struct Harness {
        router: Router,
        // Held so the bridge channels stay open; never run.
        _relay: Relay,
    }

    async fn harness(bridge_capacity: usize) -> Harness {
        let (bridge, relay) = Bridge::new(&BridgeConfig {
            capacity: bridge_capacity,
        });
        let (progress_sync, _fan_out) = ProgressSync::new(&SyncConfig::default());
        let socket = Arc::new(UdpSocket::bind("127.0.0.1:0").await.unwrap());
        let (notifier, _broadcaster) = Notifier::new(
            &NotificationConfig::default(),
            Arc::new(RegistrantRegistry::new()),
            socket,
        );
        let (hub, hub_task) = chat::Hub::new(chat::ChatConfig::default());
        tokio::spawn(hub_task.run(tokio_util::sync::CancellationToken::new()));

        let app_state = AppState::new(
            bridge,
            progress_sync,
            notifier,
            hub,
            Arc::new(JwtValidator::new(SECRET)),
            ["admin-1".to_string()],
        );

        Harness {
            router: define_routes(app_state),
            _relay: relay,
        }
    }

    fn token_for(user_id: &str, username: &str) -> String {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs() as usize;
        let claims = Claims {
            user_id: user_id.to_string(),
            username: username.to_string(),
            exp: now + 3600,
            iat: now,
            nbf: None,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap()
    }

    fn json_request(method: Method, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    fn release() -> Value {
        json!({"manga_id": "one-piece", "manga_title": "One Piece", "chapter_number": 1100})
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_check_reports_healthy() {
        let harness = harness(8).await;
        let response = harness
            .router
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"healthy");
    }

    #[tokio::test]
    async fn test_stats_reports_every_bus() {
        let harness = harness(8).await;
        let response = harness
            .router
            .oneshot(Request::get("/stats").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status_code"], 200);
        assert_eq!(body["data"]["progress_sync"]["total_sessions"], 0);
        assert_eq!(body["data"]["notification"]["total_registrants"], 0);
        assert_eq!(body["data"]["chat"]["total_members"], 0);
        assert_eq!(body["data"]["bridge"]["notification_queued"], 0);
    }

    #[tokio::test]
    async fn test_admin_notification_without_token_is_unauthorized() {
        let harness = harness(8).await;
        let response = harness
            .router
            .oneshot(json_request(
                Method::POST,
                "/admin/notifications",
                None,
                release(),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_admin_notification_with_bad_token_is_unauthorized() {
        let harness = harness(8).await;
        let response = harness
            .router
            .oneshot(json_request(
                Method::POST,
                "/admin/notifications",
                Some("not-a-jwt"),
                release(),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_admin_notification_from_non_admin_is_forbidden() {
        let harness = harness(8).await;
        let token = token_for("reader-7", "reader");
        let response = harness
            .router
            .oneshot(json_request(
                Method::POST,
                "/admin/notifications",
                Some(&token),
                release(),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_admin_notification_is_queued_on_the_bridge() {
        let harness = harness(8).await;
        let token = token_for("admin-1", "ops");
        let response = harness
            .router
            .oneshot(json_request(
                Method::POST,
                "/admin/notifications",
                Some(&token),
                release(),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::ACCEPTED);
        let body = body_json(response).await;
        assert_eq!(body["data"]["message"], "One Piece chapter 1100 is out");
        assert!(body["data"]["release_date"].is_string());
    }

    #[tokio::test]
    async fn test_admin_notification_with_blank_title_is_unprocessable() {
        let harness = harness(8).await;
        let token = token_for("admin-1", "ops");
        let response = harness
            .router
            .oneshot(json_request(
                Method::POST,
                "/admin/notifications",
                Some(&token),
                json!({"manga_id": "one-piece", "manga_title": "", "chapter_number": 1}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_full_bridge_yields_service_unavailable() {
        let harness = harness(1).await;
        let token = token_for("admin-1", "ops");

        let first = harness
            .router
            .clone()
            .oneshot(json_request(
                Method::POST,
                "/admin/notifications",
                Some(&token),
                release(),
            ))
            .await
            .unwrap();
        assert_eq!(first.status(), StatusCode::ACCEPTED);

        let second = harness
            .router
            .oneshot(json_request(
                Method::POST,
                "/admin/notifications",
                Some(&token),
                release(),
            ))
            .await
            .unwrap();
        assert_eq!(second.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_progress_update_is_stamped_with_caller() {
        let harness = harness(8).await;
        let token = token_for("reader-7", "reader");
        let response = harness
            .router
            .oneshot(json_request(
                Method::PUT,
                "/progress",
                Some(&token),
                json!({"manga_id": "berserk", "current_chapter": 42, "status": "on_hold"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::ACCEPTED);
        let body = body_json(response).await;
        assert_eq!(body["data"]["user_id"], "reader-7");
        assert_eq!(body["data"]["username"], "reader");
        assert_eq!(body["data"]["status"], "on_hold");
    }

    #[tokio::test]
    async fn test_progress_update_requires_token() {
        let harness = harness(8).await;
        let response = harness
            .router
            .oneshot(json_request(
                Method::PUT,
                "/progress",
                None,
                json!({"manga_id": "berserk", "current_chapter": 42}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
