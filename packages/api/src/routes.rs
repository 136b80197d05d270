use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use store::Store;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::{warn, Level};

use crate::handlers::{self, auth, placement, projects};
use crate::state::AppState;

fn cors_layer(origin: &str) -> CorsLayer {
    let allow_origin = if origin.trim() == "*" {
        AllowOrigin::any()
    } else {
        match HeaderValue::from_str(origin.trim()) {
            Ok(value) => AllowOrigin::exact(value),
            Err(e) => {
                warn!(origin, error = %e, "Ignoring invalid CORS origin");
                AllowOrigin::list(Vec::<HeaderValue>::new())
            }
        }
    };
    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}

/// Build the application router with all routes and middleware.
pub fn router<S: Store>(state: AppState<S>) -> Router {
    let auth_routes = Router::new()
        .route("/register", post(auth::register::<S>))
        .route("/login", post(auth::login::<S>))
        .route("/me", get(auth::me::<S>));

    let project_routes = Router::new()
        .route("/", get(projects::list::<S>).post(projects::create::<S>))
        .route(
            "/{id}",
            get(projects::get::<S>)
                .put(projects::update::<S>)
                .delete(projects::delete::<S>),
        )
        .route("/{id}/auto-place", post(projects::auto_place::<S>));

    let placement_routes = Router::new()
        .route("/beacons", post(placement::beacons::<S>))
        .route("/antennas", post(placement::antennas::<S>))
        .route("/areas", post(placement::areas));

    let cors = cors_layer(&state.server.cors_origin);
    let body_limit = state.server.body_limit_bytes;

    Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health))
        .nest("/api/auth", auth_routes)
        .nest("/api/projects", project_routes)
        .nest("/api/placement", placement_routes)
        .layer(
            ServiceBuilder::new()
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                        .on_response(DefaultOnResponse::new().level(Level::INFO)),
                )
                .layer(cors)
                .layer(DefaultBodyLimit::max(body_limit)),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{Auth, Database, Server, Settings};
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use store::{Limits, MemoryStore, PlacementDefaults};
    use tower::ServiceExt;

    fn settings() -> Settings {
        Settings {
            server: Server {
                host: "127.0.0.1".into(),
                port: 0,
                cors_origin: "http://localhost:8080".into(),
                body_limit_bytes: 1024 * 1024,
            },
            database: Database {
                url: None,
                user: "u".into(),
                password: "p".into(),
                host: "localhost".into(),
                port: 5432,
                database: "d".into(),
                max_connections: 1,
            },
            auth: Auth {
                token_key: String::new(),
                token_ttl_secs: 3600,
                min_password_len: 8,
            },
            placement: PlacementDefaults::default(),
        }
    }

    fn test_app() -> Router {
        let state = AppState::new(MemoryStore::new(), &settings()).unwrap();
        router(state)
    }

    async fn send(
        app: &Router,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            request = request.header("authorization", format!("Bearer {token}"));
        }
        let body = match body {
            Some(value) => {
                request = request.header("content-type", "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };
        let response = app
            .clone()
            .oneshot(request.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        (status, value)
    }

    async fn sign_up(app: &Router, email: &str) -> String {
        let (status, _) = send(
            app,
            "POST",
            "/api/auth/register",
            None,
            Some(json!({ "email": email, "password": "hunter2hunter2", "name": "Ann" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let (status, body) = send(
            app,
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "email": email, "password": "hunter2hunter2" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        body["token"].as_str().unwrap().to_string()
    }

    fn office() -> Value {
        json!({
            "name": "Office",
            "description": "Ground floor",
            "mapData": {
                "mapImageSrc": "data:image/png;base64,AAAA",
                "mapWidthMeters": 20,
                "mapHeightMeters": 10,
                "beacons": [],
                "antennas": [],
                "barriers": [
                    { "id": "barrier-1", "coordinates": [[[0, 0], [10, 0], [10, 10], [0, 10], [0, 0]]] }
                ]
            }
        })
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = test_app();
        let (status, body) = send(&app, "GET", "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");

        let (status, _) = send(&app, "GET", "/", None, None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_register_login_me() {
        let app = test_app();
        let token = sign_up(&app, "Ann@Example.com").await;

        let (status, body) = send(&app, "GET", "/api/auth/me", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["email"], "ann@example.com");
        assert_eq!(body["name"], "Ann");
        assert!(body.get("password_hash").is_none());
    }

    #[tokio::test]
    async fn test_register_validation() {
        let app = test_app();
        let (status, body) = send(
            &app,
            "POST",
            "/api/auth/register",
            None,
            Some(json!({ "email": "ann@example.com", "password": "short" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].as_str().unwrap().contains("at least 8"));

        let (status, _) = send(
            &app,
            "POST",
            "/api/auth/register",
            None,
            Some(json!({ "email": "not-an-email", "password": "long enough" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        sign_up(&app, "ann@example.com").await;
        let (status, _) = send(
            &app,
            "POST",
            "/api/auth/register",
            None,
            Some(json!({ "email": "ANN@example.com", "password": "another one" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_login_with_wrong_password() {
        let app = test_app();
        sign_up(&app, "ann@example.com").await;
        let (status, body) = send(
            &app,
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "email": "ann@example.com", "password": "wrong password" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Invalid email or password");

        let (status, _) = send(
            &app,
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "email": "nobody@example.com", "password": "whatever1" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_missing_token_is_401_and_bad_token_is_403() {
        let app = test_app();
        let (status, body) = send(&app, "GET", "/api/projects", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body["message"].is_string());

        let (status, _) = send(&app, "GET", "/api/projects", Some("deadbeef"), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        // A token from another server key.
        let other = test_app();
        let token = sign_up(&other, "ann@example.com").await;
        let (status, _) = send(&app, "GET", "/api/projects", Some(&token), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_project_crud() {
        let app = test_app();
        let token = sign_up(&app, "ann@example.com").await;

        let (status, created) = send(&app, "POST", "/api/projects", Some(&token), Some(office())).await;
        assert_eq!(status, StatusCode::CREATED);
        let id = created["id"].as_str().unwrap().to_string();
        assert_eq!(created["name"], "Office");
        assert_eq!(created["mapData"], office()["mapData"]);

        let uri = format!("/api/projects/{id}");
        let (status, fetched) = send(&app, "GET", &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched, created);

        let (status, listed) = send(&app, "GET", "/api/projects", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(listed.as_array().unwrap().len(), 1);

        let (status, updated) = send(
            &app,
            "PUT",
            &uri,
            Some(&token),
            Some(json!({ "name": "Warehouse" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["name"], "Warehouse");
        assert_eq!(updated["description"], "Ground floor");
        assert_eq!(updated["mapData"], created["mapData"]);

        let (status, body) = send(&app, "DELETE", &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert_eq!(body, Value::Null);

        let (status, body) = send(&app, "GET", &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Project not found");
    }

    #[tokio::test]
    async fn test_create_requires_name_and_map_data() {
        let app = test_app();
        let token = sign_up(&app, "ann@example.com").await;
        let (status, body) = send(
            &app,
            "POST",
            "/api/projects",
            Some(&token),
            Some(json!({ "name": "No map" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Project name and map data are required");
    }

    #[tokio::test]
    async fn test_other_users_project_is_forbidden() {
        let app = test_app();
        let ann = sign_up(&app, "ann@example.com").await;
        let bob = sign_up(&app, "bob@example.com").await;

        let (_, created) = send(&app, "POST", "/api/projects", Some(&ann), Some(office())).await;
        let uri = format!("/api/projects/{}", created["id"].as_str().unwrap());

        let (status, body) = send(&app, "GET", &uri, Some(&bob), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["message"], "Forbidden: You do not own this project");

        let (status, _) = send(&app, "DELETE", &uri, Some(&bob), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (_, listed) = send(&app, "GET", "/api/projects", Some(&bob), None).await;
        assert_eq!(listed, json!([]));
    }

    #[tokio::test]
    async fn test_unknown_and_malformed_ids_are_404() {
        let app = test_app();
        let token = sign_up(&app, "ann@example.com").await;
        let (status, _) = send(&app, "GET", "/api/projects/not-a-uuid", Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let uri = format!("/api/projects/{}", uuid::Uuid::new_v4());
        let (status, _) = send(&app, "GET", &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_auto_place_stored_project() {
        let app = test_app();
        let token = sign_up(&app, "ann@example.com").await;
        let (_, created) = send(&app, "POST", "/api/projects", Some(&token), Some(office())).await;
        let uri = format!("/api/projects/{}/auto-place", created["id"].as_str().unwrap());

        let (status, placed) = send(
            &app,
            "POST",
            &uri,
            Some(&token),
            Some(json!({ "devices": "beacons", "step": 5 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let beacons = placed["mapData"]["beacons"].as_array().unwrap();
        assert_eq!(beacons.len(), 4);
        assert_eq!(beacons[0]["id"], "beacon-auto-0");
        assert_eq!(beacons[0]["rssi"], 70.0);

        let (status, _) = send(
            &app,
            "POST",
            &uri,
            Some(&token),
            Some(json!({ "devices": "beacons", "step": 0 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_placement_endpoints() {
        let app = test_app();
        let (status, body) = send(
            &app,
            "POST",
            "/api/placement/beacons",
            None,
            Some(json!({ "mapWidthMeters": 10, "mapHeightMeters": 10, "step": 5 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let beacons = body["beacons"].as_array().unwrap();
        assert_eq!(beacons.len(), 4);
        assert_eq!(beacons[0]["position"], json!([2.5, 2.5]));

        let (status, body) = send(
            &app,
            "POST",
            "/api/placement/antennas",
            None,
            Some(json!({ "mapWidthMeters": 30, "mapHeightMeters": 15, "height": 2, "angle": 0 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["range"], 10.0);
        assert_eq!(body["step"], 7.5);
        assert_eq!(body["antennas"].as_array().unwrap().len(), 8);

        let (status, body) = send(
            &app,
            "POST",
            "/api/placement/areas",
            None,
            Some(office()["mapData"].clone()),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["totalArea"], 200.0);
        assert_eq!(body["barrierArea"], 100.0);
        assert_eq!(body["movableArea"], 100.0);

        let (status, body) = send(
            &app,
            "POST",
            "/api/placement/beacons",
            None,
            Some(json!({ "mapWidthMeters": -1, "mapHeightMeters": 10 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].is_string());
    }

    #[tokio::test]
    async fn test_oversized_barriers_are_400() {
        let mut settings = settings();
        settings.placement.limits = Limits {
            max_barrier_vertices: 8,
            ..Limits::default()
        };
        let app = router(AppState::new(MemoryStore::new(), &settings).unwrap());
        let barriers = json!([
            { "id": "b1", "coordinates": [[[0, 0], [2, 0], [2, 2], [0, 2], [0, 0]]] },
            { "id": "b2", "coordinates": [[[4, 4], [6, 4], [6, 6], [4, 6], [4, 4]]] }
        ]);

        let (status, body) = send(
            &app,
            "POST",
            "/api/placement/beacons",
            None,
            Some(json!({ "mapWidthMeters": 10, "mapHeightMeters": 10, "barriers": barriers })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].as_str().unwrap().contains("limit of 8"));

        let (status, _) = send(
            &app,
            "POST",
            "/api/placement/antennas",
            None,
            Some(json!({ "mapWidthMeters": 10, "mapHeightMeters": 10, "barriers": barriers })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let token = sign_up(&app, "ann@example.com").await;
        let mut project = office();
        project["mapData"]["barriers"] = barriers;
        let (_, created) = send(&app, "POST", "/api/projects", Some(&token), Some(project)).await;
        let uri = format!("/api/projects/{}/auto-place", created["id"].as_str().unwrap());
        let (status, _) = send(
            &app,
            "POST",
            &uri,
            Some(&token),
            Some(json!({ "devices": "beacons" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let project_uri = format!("/api/projects/{}", created["id"].as_str().unwrap());
        let (_, stored) = send(&app, "GET", &project_uri, Some(&token), None).await;
        assert_eq!(stored["mapData"]["beacons"], json!([]));
    }

    #[tokio::test]
    async fn test_malformed_json_is_400() {
        let app = test_app();
        let (status, body) = send(
            &app,
            "POST",
            "/api/placement/beacons",
            None,
            Some(json!({ "mapWidthMeters": "wide" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].is_string());
    }
}
