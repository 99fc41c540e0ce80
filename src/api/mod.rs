//! HTTP gateway to the remote identity service.
//!
//! The `AuthClient` is the only component in the application that performs
//! network I/O. It reads the credential store before every protected call
//! and attaches the token as a bearer authorization header.

pub mod client;
pub mod error;

pub use client::AuthClient;
pub use error::ApiError;

#[cfg(test)]
pub(crate) mod testing {
    //! A small in-process identity service mirroring the real one's routes
    //! and response envelopes, for gateway and flow tests.

    use std::sync::{Arc, Mutex};

    use axum::extract::State;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::{json, Value};

    /// What the mock service observed, shared with the test body.
    #[derive(Clone, Default)]
    pub struct Observed {
        /// Authorization header of each /user/info request, in order.
        pub auth_headers: Arc<Mutex<Vec<Option<String>>>>,
        /// Total requests across all routes.
        pub requests: Arc<Mutex<usize>>,
    }

    impl Observed {
        fn record_request(&self) {
            *self.requests.lock().unwrap() += 1;
        }

        pub fn request_count(&self) -> usize {
            *self.requests.lock().unwrap()
        }

        pub fn last_auth_header(&self) -> Option<Option<String>> {
            self.auth_headers.lock().unwrap().last().cloned()
        }
    }

    async fn signup(
        State(observed): State<Observed>,
        Json(body): Json<Value>,
    ) -> (StatusCode, Json<Value>) {
        observed.record_request();
        if body["email"] == "taken@b.com" {
            return (
                StatusCode::CONFLICT,
                Json(json!({"status": 409, "error": "Account already exists"})),
            );
        }
        (
            StatusCode::CREATED,
            Json(json!({"status": 201, "data": {"message": "User registered successfully."}})),
        )
    }

    async fn confirm(
        State(observed): State<Observed>,
        Json(body): Json<Value>,
    ) -> (StatusCode, Json<Value>) {
        observed.record_request();
        if body["code"] == "123456" {
            (
                StatusCode::OK,
                Json(json!({"status": 200, "data": {"message": "Account confirmed successfully."}})),
            )
        } else {
            (
                StatusCode::BAD_REQUEST,
                Json(json!({"status": 400, "error": "Invalid confirmation code"})),
            )
        }
    }

    async fn login(
        State(observed): State<Observed>,
        Json(body): Json<Value>,
    ) -> (StatusCode, Json<Value>) {
        observed.record_request();
        if body["password"] == "pw" {
            (
                StatusCode::OK,
                Json(json!({
                    "status": 200,
                    "data": {"access_token": "T1", "refresh_token": "R1", "expires_in": 3600}
                })),
            )
        } else {
            (
                StatusCode::UNAUTHORIZED,
                Json(json!({"status": 401, "error": "Invalid credentials"})),
            )
        }
    }

    async fn user_info(
        State(observed): State<Observed>,
        headers: HeaderMap,
    ) -> (StatusCode, Json<Value>) {
        observed.record_request();
        let auth = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        observed.auth_headers.lock().unwrap().push(auth.clone());

        match auth.as_deref() {
            Some("Bearer T1") => (
                StatusCode::OK,
                Json(json!({
                    "status": 200,
                    "data": {
                        "attributes": {
                            "email": "a@b.com",
                            "email_verified": "true",
                            "name": "Joe",
                            "sub": "user-1"
                        },
                        "username": "a@b.com"
                    }
                })),
            ),
            _ => (
                StatusCode::UNAUTHORIZED,
                Json(json!({"status": 401, "error": "invalid token"})),
            ),
        }
    }

    /// Spawn the mock service on an ephemeral port; returns its base URL.
    pub async fn spawn_identity_service(observed: Observed) -> String {
        let app = Router::new()
            .route("/signup", post(signup))
            .route("/confirm", post(confirm))
            .route("/login", post(login))
            .route("/user/info", get(user_info))
            .with_state(observed);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock service");
        let addr = listener.local_addr().expect("mock service addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("serve mock service");
        });
        format!("http://{}", addr)
    }

    /// Base URL nothing listens on, for exercising transport failures.
    pub const UNREACHABLE_URL: &str = "http://127.0.0.1:9";
}
