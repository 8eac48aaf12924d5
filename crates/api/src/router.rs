use axum::{
    Router,
    http::{
        HeaderValue, Method,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    middleware,
    routing::{get, patch, post, put},
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    AppState, auth_handlers, catalog_handlers, middleware as auth_middleware, profile_handlers,
};

pub fn router(state: Arc<AppState>) -> Router {
    // Public routes (no authentication required)
    let public_routes = Router::new()
        .route("/", get(|| async { "DineHub API running" }))
        .route("/api/users/register", post(auth_handlers::register))
        .route("/api/users/login", post(auth_handlers::login_user))
        .route("/api/admin/login", post(auth_handlers::login_admin));

    // Any authenticated principal
    let principal_routes = Router::new()
        .route(
            "/api/users/profile",
            get(profile_handlers::my_profile).put(profile_handlers::update_profile),
        )
        .route(
            "/api/users/profile/{username}",
            get(profile_handlers::profile_by_username),
        )
        .route("/api/users/profile/id/{id}", get(profile_handlers::profile_by_id))
        .route(
            "/api/users/profile/email/{email}",
            get(profile_handlers::profile_by_email),
        )
        .route("/api/users/password", put(auth_handlers::change_password))
        .route("/api/restaurants", get(catalog_handlers::list_restaurants))
        .route("/api/restaurants/{id}", get(catalog_handlers::get_restaurant))
        .route("/api/menu", get(catalog_handlers::list_menu))
        .route("/api/promotions", get(catalog_handlers::list_promotions))
        .route("/api/orders/place", post(catalog_handlers::place_order))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware::require_auth,
        ));

    // Admin-only routes
    let admin_routes = Router::new()
        .route("/api/users", get(profile_handlers::list_users))
        .route("/api/orders", get(catalog_handlers::list_orders))
        .route("/api/restaurants", post(catalog_handlers::add_restaurant))
        .route("/api/restaurants/{id}", put(catalog_handlers::update_restaurant))
        .route(
            "/api/restaurants/{id}/deactivate",
            patch(catalog_handlers::deactivate_restaurant),
        )
        .route("/api/menu", post(catalog_handlers::add_menu_item))
        .route("/api/promotions", post(catalog_handlers::add_promotion))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware::require_admin,
        ));

    Router::new()
        .merge(public_routes)
        .merge(principal_routes)
        .merge(admin_routes)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware::request_timeout,
        ))
        .layer(cors_layer(state.cors_origin.as_ref()))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(origin: Option<&HeaderValue>) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE]);

    match origin {
        Some(origin) => cors.allow_origin(origin.clone()),
        None => cors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use auth::{
        AuthPolicy, AuthService, ExtraClaims, HashParams, PasswordHasher, Registration, Role,
        SigningSecret,
    };
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use chrono::{Duration, Utc};
    use serde_json::{Value, json};
    use storage::MemoryStore;
    use tower::ServiceExt;

    const SECRET: &str = "router-test-secret";

    fn test_state() -> Arc<AppState> {
        let store = Arc::new(MemoryStore::new());
        let secret = SigningSecret::new(SECRET).unwrap();
        let auth_service = AuthService::new(store.clone(), &secret, 3600, AuthPolicy::default())
            .unwrap()
            .with_hasher(PasswordHasher::with_params(HashParams::new(1024, 1, 1, None).unwrap()))
            .unwrap();

        Arc::new(AppState::new(auth_service, store))
    }

    async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));

        (status, value)
    }

    async fn register_alice(state: &AppState) {
        state
            .auth_service
            .register(Registration {
                display_name: "Alice".to_string(),
                login_identifier: "alice@example.com".to_string(),
                password: "correct".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
    }

    async fn admin_token(state: &AppState, app: &Router) -> String {
        state
            .auth_service
            .provision_admin("admin", "admin123")
            .await
            .unwrap();

        let (status, body) = send(
            app,
            Method::POST,
            "/api/admin/login",
            None,
            Some(json!({"username": "admin", "password": "admin123"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        body["token"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_health() {
        let app = router(test_state());

        let (status, body) = send(&app, Method::GET, "/", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, Value::String("DineHub API running".to_string()));
    }

    #[tokio::test]
    async fn test_user_login_and_profile() {
        let state = test_state();
        register_alice(&state).await;
        let app = router(state);

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/users/login",
            None,
            Some(json!({"email": "alice@example.com", "password": "correct"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["principal"]["loginIdentifier"], "alice@example.com");
        assert_eq!(body["principal"]["displayName"], "Alice");

        let token = body["token"].as_str().unwrap();
        assert!(!token.is_empty());

        let (status, profile) = send(&app, Method::GET, "/api/users/profile", Some(token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(profile["email"], "alice@example.com");
        assert!(profile.get("passwordHash").is_none());
    }

    #[tokio::test]
    async fn test_unknown_user_and_wrong_password_look_the_same() {
        let state = test_state();
        register_alice(&state).await;
        let app = router(state);

        let unknown = send(
            &app,
            Method::POST,
            "/api/users/login",
            None,
            Some(json!({"email": "nobody@example.com", "password": "correct"})),
        )
        .await;
        let wrong = send(
            &app,
            Method::POST,
            "/api/users/login",
            None,
            Some(json!({"email": "alice@example.com", "password": "incorrect"})),
        )
        .await;

        assert_eq!(unknown.0, StatusCode::UNAUTHORIZED);
        assert_eq!(unknown, wrong);
        assert_eq!(unknown.1["message"], "Invalid credentials.");
    }

    #[tokio::test]
    async fn test_login_validation() {
        let app = router(test_state());

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/users/login",
            None,
            Some(json!({"email": "", "password": ""})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Login identifier and password are required.");

        let (status, _) = send(&app, Method::POST, "/api/users/login", None, Some(json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_malformed_json_is_bad_request() {
        let app = router(test_state());

        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/users/login")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from("{\"email\": "))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert!(body["message"].is_string());
    }

    #[tokio::test]
    async fn test_register_then_duplicate() {
        let state = test_state();
        let app = router(state.clone());
        let payload = json!({
            "userName": "Bob",
            "email": "bob@example.com",
            "password": "secret1",
            "address": "2 Side St"
        });

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/users/register",
            None,
            Some(payload.clone()),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert!(body["token"].is_string());

        let (status, body) =
            send(&app, Method::POST, "/api/users/register", None, Some(payload)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "User already exists.");

        assert_eq!(state.store.list_principals(Role::User).await.len(), 1);
    }

    #[tokio::test]
    async fn test_register_short_password() {
        let app = router(test_state());

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/users/register",
            None,
            Some(json!({"userName": "Bob", "email": "bob@example.com", "password": "abc"})),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Password must be at least 6 characters long.");
    }

    #[tokio::test]
    async fn test_token_failures() {
        let state = test_state();
        let other_secret = SigningSecret::new("some-other-secret").unwrap();
        let forged = auth::TokenIssuer::new(&other_secret, 3600)
            .unwrap()
            .issue("someone", ExtraClaims::role(Role::User))
            .unwrap();
        let app = router(state);

        let (status, body) = send(&app, Method::GET, "/api/restaurants", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Access denied. No token provided.");

        let (status, body) =
            send(&app, Method::GET, "/api/restaurants", Some("not-a-jwt"), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["message"], "Invalid token.");

        let (status, body) = send(&app, Method::GET, "/api/restaurants", Some(&forged), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["message"], "Invalid token signature.");

        let request = Request::builder()
            .uri("/api/restaurants")
            .header(AUTHORIZATION, HeaderValue::from_bytes(b"Bearer \xffabc").unwrap())
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_expired_admin_token_creates_nothing() {
        let state = test_state();
        let admin = state
            .auth_service
            .provision_admin("admin", "admin123")
            .await
            .unwrap();
        let expired = state
            .auth_service
            .issuer()
            .issue_at(
                &admin.id,
                ExtraClaims::role(Role::Admin),
                Utc::now() - Duration::hours(2),
                Duration::hours(1),
            )
            .unwrap();
        let app = router(state.clone());

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/restaurants",
            Some(&expired),
            Some(json!({"name": "Sneaky Diner"})),
        )
        .await;

        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["message"], "Token expired.");
        assert!(state.store.list_restaurants().await.is_empty());
    }

    #[tokio::test]
    async fn test_user_token_on_admin_route() {
        let state = test_state();
        register_alice(&state).await;
        let (token, _) = state
            .auth_service
            .login(Role::User, "alice@example.com", "correct")
            .await
            .unwrap();
        let app = router(state.clone());

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/restaurants",
            Some(&token),
            Some(json!({"name": "Alice's Bistro"})),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["message"], "Access denied. Admin role required.");
        assert!(state.store.list_restaurants().await.is_empty());

        // Same token is fine on routes open to any principal
        let (status, _) = send(&app, Method::GET, "/api/restaurants", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_admin_restaurant_lifecycle() {
        let state = test_state();
        let app = router(state.clone());
        let token = admin_token(&state, &app).await;

        let (status, created) = send(
            &app,
            Method::POST,
            "/api/restaurants",
            Some(&token),
            Some(json!({"name": "Pasta Place", "cuisine": "Italian"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let id = created["id"].as_str().unwrap().to_string();

        let (status, updated) = send(
            &app,
            Method::PUT,
            &format!("/api/restaurants/{id}"),
            Some(&token),
            Some(json!({"description": "Fresh pasta daily"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["description"], "Fresh pasta daily");

        let (status, deactivated) = send(
            &app,
            Method::PATCH,
            &format!("/api/restaurants/{id}/deactivate"),
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(deactivated["status"], "inactive");

        let (status, fetched) = send(
            &app,
            Method::GET,
            &format!("/api/restaurants/{id}"),
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched["status"], "inactive");

        let (status, body) =
            send(&app, Method::GET, "/api/restaurants/missing", Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Restaurant not found.");

        let (status, _) = send(
            &app,
            Method::PATCH,
            "/api/restaurants/missing/deactivate",
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_menu_promotions_and_orders() {
        let state = test_state();
        register_alice(&state).await;
        let app = router(state.clone());
        let admin = admin_token(&state, &app).await;
        let (user, _) = state
            .auth_service
            .login(Role::User, "alice@example.com", "correct")
            .await
            .unwrap();

        let (_, restaurant) = send(
            &app,
            Method::POST,
            "/api/restaurants",
            Some(&admin),
            Some(json!({"name": "Pasta Place"})),
        )
        .await;
        let restaurant_id = restaurant["id"].as_str().unwrap();

        let (status, item) = send(
            &app,
            Method::POST,
            "/api/menu",
            Some(&admin),
            Some(json!({
                "restaurantId": restaurant_id,
                "name": "Carbonara",
                "price": 12.5,
                "category": "main"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let item_id = item["id"].as_str().unwrap();

        let now = Utc::now();
        let (status, _) = send(
            &app,
            Method::POST,
            "/api/promotions",
            Some(&admin),
            Some(json!({
                "restaurantId": restaurant_id,
                "name": "Lunch deal",
                "discount": 10,
                "startDate": now - Duration::days(1),
                "endDate": now + Duration::days(1)
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, active) =
            send(&app, Method::GET, "/api/promotions?active=true", Some(&user), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(active.as_array().map(Vec::len), Some(1));

        let (status, menu) = send(
            &app,
            Method::GET,
            &format!("/api/menu?restaurantId={restaurant_id}"),
            Some(&user),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(menu[0]["name"], "Carbonara");

        let (status, order) = send(
            &app,
            Method::POST,
            "/api/orders/place",
            Some(&user),
            Some(json!({
                "restaurantId": restaurant_id,
                "items": [{"menuItemId": item_id, "quantity": 2}]
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(order["items"][0]["unitPrice"], 12.5);

        let (status, _) = send(&app, Method::GET, "/api/orders", Some(&user), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, orders) = send(&app, Method::GET, "/api/orders", Some(&admin), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(orders.as_array().map(Vec::len), Some(1));
    }

    #[tokio::test]
    async fn test_profile_update_and_password_change() {
        let state = test_state();
        register_alice(&state).await;
        let (token, alice) = state
            .auth_service
            .login(Role::User, "alice@example.com", "correct")
            .await
            .unwrap();
        let app = router(state.clone());

        let (status, profile) = send(
            &app,
            Method::PUT,
            "/api/users/profile",
            Some(&token),
            Some(json!({"userName": "Alice B", "mobNum": "555-0100"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(profile["userName"], "Alice B");
        assert_eq!(profile["mobNum"], "555-0100");

        let (status, by_id) = send(
            &app,
            Method::GET,
            &format!("/api/users/profile/id/{}", alice.id),
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(by_id["email"], "alice@example.com");

        let (status, by_name) = send(
            &app,
            Method::GET,
            "/api/users/profile/Alice%20B",
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(by_name["id"], alice.id.as_str());

        let (status, body) = send(
            &app,
            Method::GET,
            "/api/users/profile/email/nobody@example.com",
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "User not found.");

        let (status, _) = send(
            &app,
            Method::PUT,
            "/api/users/password",
            Some(&token),
            Some(json!({"currentPassword": "wrong", "newPassword": "brand-new"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = send(
            &app,
            Method::PUT,
            "/api/users/password",
            Some(&token),
            Some(json!({"currentPassword": "correct", "newPassword": "brand-new"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = send(
            &app,
            Method::POST,
            "/api/users/login",
            None,
            Some(json!({"email": "alice@example.com", "password": "brand-new"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }
}
