//! API integration tests.
//!
//! These tests drive the router end to end against a migrated in-memory
//! `SQLite` database and a temporary storage directory.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
    middleware,
};
use serde_json::{Value, json};
use sitecraft_api::{AppState, middleware::auth_middleware, router as api_router};
use sitecraft_common::{
    AdminBootstrapConfig, BundleFile, LocalArtifactStore, LocalStorage, QuestionnaireConfig,
    StorageConfig, archive,
};
use sitecraft_core::{
    AccountService, BundleLimits, DashboardService, FulfillmentService, MessagingService,
    NotificationService, OrderService, TemplateService,
};
use sitecraft_db::repositories::{
    NotificationRepository, OrderMessageRepository, OrderRepository, TemplateRepository,
    UserRepository,
};
use sitecraft_db::test_utils::TestDatabase;
use tempfile::TempDir;
use tower::ServiceExt;

const ADMIN_EMAIL: &str = "admin@sitecraft.test";
const ADMIN_PASSWORD: &str = "admin-secret";
const BOUNDARY: &str = "sitecraft-test-boundary";

struct TestApp {
    router: Router,
    _db: TestDatabase,
    _dir: TempDir,
}

impl TestApp {
    async fn new() -> Self {
        Self::with_storage(StorageConfig::default()).await
    }

    async fn with_storage(storage: StorageConfig) -> Self {
        let db = TestDatabase::new().await.unwrap();
        let dir = tempfile::tempdir().unwrap();
        let conn = db.shared();

        let user_repo = UserRepository::new(Arc::clone(&conn));
        let template_repo = TemplateRepository::new(Arc::clone(&conn));
        let order_repo = OrderRepository::new(Arc::clone(&conn));
        let message_repo = OrderMessageRepository::new(Arc::clone(&conn));
        let notification_repo = NotificationRepository::new(Arc::clone(&conn));

        let notification_service = NotificationService::new(notification_repo);
        let account_service = AccountService::new(user_repo.clone());
        let template_service = TemplateService::new(
            template_repo.clone(),
            Arc::new(LocalStorage::new(
                dir.path().join("uploads"),
                "/uploads".to_string(),
            )),
        );
        let order_service = OrderService::new(
            order_repo.clone(),
            template_repo.clone(),
            notification_service.clone(),
            Arc::new(QuestionnaireConfig::default()),
        );
        let messaging_service = MessagingService::new(
            order_repo.clone(),
            message_repo,
            notification_service.clone(),
        );
        let fulfillment_service = FulfillmentService::new(
            order_repo.clone(),
            Arc::new(LocalArtifactStore::new(dir.path().join("websites"))),
            notification_service.clone(),
            BundleLimits::from(&storage),
        );
        let dashboard_service = DashboardService::new(
            user_repo,
            order_repo,
            template_repo,
            notification_service.clone(),
        );

        account_service
            .ensure_admin(&AdminBootstrapConfig {
                email: ADMIN_EMAIL.to_string(),
                password: ADMIN_PASSWORD.to_string(),
                name: "Main Admin".to_string(),
            })
            .await
            .unwrap();

        let state = AppState {
            account_service,
            template_service,
            order_service,
            messaging_service,
            notification_service,
            fulfillment_service,
            dashboard_service,
        };

        let router = api_router(storage.max_upload_bytes as usize)
            .layer(middleware::from_fn_with_state(
                state.clone(),
                auth_middleware,
            ))
            .with_state(state);

        Self {
            router,
            _db: db,
            _dir: dir,
        }
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
            .to_vec();
        (status, headers, body)
    }

    async fn json(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let (status, _, bytes) = self.send(request).await;
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    async fn signup(&self, email: &str) -> String {
        let (status, body) = self
            .json(
                "POST",
                "/signup",
                None,
                Some(json!({
                    "fullname": "Jane Doe",
                    "email": email,
                    "whatsapp": "+8801700000000",
                    "dob": "1995-04-12",
                    "password": "secret123"
                })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body["data"]["token"].as_str().unwrap().to_string()
    }

    async fn admin_token(&self) -> String {
        let (status, body) = self
            .json(
                "POST",
                "/signin",
                None,
                Some(json!({ "email": ADMIN_EMAIL, "password": ADMIN_PASSWORD })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["data"]["user"]["isAdmin"], true);
        body["data"]["token"].as_str().unwrap().to_string()
    }

    async fn upload(&self, uri: &str, token: &str, file_name: &str, content_type: &str, data: &[u8]) -> (StatusCode, Value) {
        let mut body = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
        )
        .into_bytes();
        body.extend_from_slice(data);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap();

        let (status, _, bytes) = self.send(request).await;
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }
}

#[tokio::test]
async fn test_signup_duplicate_email_echoes_form() {
    let app = TestApp::new().await;
    app.signup("jane@example.com").await;

    let (status, body) = app
        .json(
            "POST",
            "/signup",
            None,
            Some(json!({
                "fullname": "Jane Again",
                "email": "JANE@example.com",
                "password": "secret123"
            })),
        )
        .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "CONFLICT");
    assert_eq!(body["data"]["fullname"], "Jane Again");
    assert!(body["data"].get("password").is_none());
}

#[tokio::test]
async fn test_me_requires_token() {
    let app = TestApp::new().await;

    let (status, body) = app.json("GET", "/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");

    let token = app.signup("jane@example.com").await;
    let (status, body) = app.json("GET", "/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["user"]["email"], "jane@example.com");
    assert_eq!(body["data"]["counts"]["unreadNotifications"], 0);
}

#[tokio::test]
async fn test_signout_invalidates_token() {
    let app = TestApp::new().await;
    let token = app.signup("jane@example.com").await;

    let (status, _) = app.json("POST", "/signout", Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app.json("GET", "/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_area_redirects_customers() {
    let app = TestApp::new().await;
    let token = app.signup("jane@example.com").await;

    for token in [None, Some(token.as_str())] {
        let mut builder = Request::builder().uri("/admin/dashboard");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let (status, headers, _) = app.send(builder.body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::SEE_OTHER);
        assert_eq!(headers[header::LOCATION], "/dashboard");
    }

    let admin = app.admin_token().await;
    let (status, body) = app.json("GET", "/admin/dashboard", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["users"], 2);
    assert_eq!(body["data"]["orders"], 0);
}

#[tokio::test]
async fn test_questionnaire_is_public() {
    let app = TestApp::new().await;

    let (status, body) = app.json("GET", "/questionnaire", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["questions"].as_array().unwrap().len(), 24);
}

#[tokio::test]
async fn test_custom_order_and_admin_transcript() {
    let app = TestApp::new().await;
    let token = app.signup("jane@example.com").await;
    let admin = app.admin_token().await;

    let mut answers = vec![String::new(); 21];
    answers[1] = "Sweet Crumbs".to_string();
    answers[20] = "$500".to_string();

    let (status, body) = app
        .json(
            "POST",
            "/orders/custom",
            Some(&token),
            Some(json!({ "answers": answers })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let code = body["data"]["orderCode"].as_str().unwrap().to_string();
    assert!(code.starts_with("CUST-"));
    assert_eq!(body["data"]["budget"], "$500");
    assert_eq!(body["data"]["status"], "Pending");

    let (status, body) = app
        .json("GET", &format!("/admin/orders/{code}"), Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["customer"]["email"], "jane@example.com");
    assert_eq!(body["data"]["answers"].as_array().unwrap().len(), 21);
    assert_eq!(body["data"]["answers"][20]["answer"], "$500");

    let (status, body) = app
        .json("GET", "/admin/orders?type=custom&status=Pending", Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (status, _) = app
        .json("GET", "/admin/orders?status=Shipped", Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_template_order_to_download() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;
    let token = app.signup("jane@example.com").await;

    let (status, body) = app
        .json(
            "POST",
            "/admin/templates",
            Some(&admin),
            Some(json!({
                "name": "Portfolio",
                "category": "Portfolio",
                "features": ["Gallery Display"],
                "originalPrice": 400,
                "discountPrice": 360
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let template_id = body["data"]["id"].as_str().unwrap().to_string();
    assert_eq!(body["data"]["price"], 360.0);

    let (status, body) = app.json("GET", "/templates", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (status, body) = app
        .json(
            "POST",
            "/orders/template",
            Some(&token),
            Some(json!({
                "templateId": template_id,
                "websiteName": "Studio",
                "requirements": "Dark theme"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let code = body["data"]["orderCode"].as_str().unwrap().to_string();
    assert_eq!(body["data"]["budget"], "360");

    // Chat stays closed until the order is granted.
    let (status, _) = app
        .json(
            "POST",
            &format!("/orders/{code}/messages"),
            Some(&token),
            Some(json!({ "text": "Hello?" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .json(
            "POST",
            &format!("/admin/orders/{code}/progress"),
            Some(&admin),
            Some(json!({ "stage": "Development", "status": "Granted" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["status"], "Granted");

    let (status, body) = app
        .json("GET", "/notifications/counts", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["unreadNotifications"], 1);
    assert_eq!(body["data"]["unreadOrders"], 1);

    let (status, body) = app
        .json("GET", &format!("/orders/{code}"), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["canMessage"], true);

    let (_, body) = app
        .json("GET", "/notifications/counts", Some(&token), None)
        .await;
    assert_eq!(body["data"]["unreadOrders"], 0);

    let (status, _) = app
        .json(
            "POST",
            &format!("/orders/{code}/messages"),
            Some(&token),
            Some(json!({ "text": "Can we add a blog?" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .json("GET", &format!("/websites/{code}/download"), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let zip = archive::pack(&[
        BundleFile::new("index.html", "<h1>Studio</h1>"),
        BundleFile::new("style.css", "h1 {}"),
    ])
    .unwrap();
    let (status, body) = app
        .upload(
            &format!("/admin/orders/{code}/bundle"),
            &admin,
            "studio.zip",
            "application/zip",
            &zip,
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["folderSubmitted"], true);

    let (status, body) = app.json("GET", "/websites", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["orderCode"], code.as_str());

    let request = Request::builder()
        .uri(format!("/websites/{code}/download"))
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    let (status, headers, bytes) = app.send(request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], "application/zip");
    assert_eq!(
        headers[header::CONTENT_DISPOSITION],
        format!("attachment; filename=\"{code}_website.zip\"").as_str()
    );

    let files = archive::unpack(&bytes, u64::MAX).unwrap();
    let paths: Vec<_> = files.iter().map(|f| f.path.as_str()).collect();
    assert_eq!(paths, vec!["index.html", "style.css"]);
}

#[tokio::test]
async fn test_notifications_list_marks_read() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;
    let token = app.signup("jane@example.com").await;

    let mut answers = vec![String::new(); 2];
    answers[0] = "A bakery".to_string();
    let (_, body) = app
        .json(
            "POST",
            "/orders/custom",
            Some(&token),
            Some(json!({ "answers": answers })),
        )
        .await;
    let code = body["data"]["orderCode"].as_str().unwrap().to_string();

    app.json(
        "POST",
        &format!("/admin/orders/{code}/messages"),
        Some(&admin),
        Some(json!({ "text": "We have started" })),
    )
    .await;

    let (status, body) = app.json("GET", "/notifications", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["data"][0]["message"],
        format!("New message from admin regarding order {code}: We have started")
    );
    assert_eq!(body["data"][0]["isRead"], false);

    let (_, body) = app
        .json("GET", "/notifications/counts", Some(&token), None)
        .await;
    assert_eq!(body["data"]["unreadNotifications"], 0);
}

#[tokio::test]
async fn test_template_image_must_be_an_image() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;

    let (_, body) = app
        .json(
            "POST",
            "/admin/templates",
            Some(&admin),
            Some(json!({ "name": "Blog", "category": "Blog", "originalPrice": 350 })),
        )
        .await;
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, _) = app
        .upload(
            &format!("/admin/templates/{id}/image"),
            &admin,
            "notes.txt",
            "text/plain",
            b"hello",
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .upload(
            &format!("/admin/templates/{id}/image"),
            &admin,
            "blog.png",
            "image/png",
            b"\x89PNG",
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert!(
        body["data"]["imageUrl"]
            .as_str()
            .unwrap()
            .starts_with(&format!("/uploads/templates/{id}/"))
    );
}

#[tokio::test]
async fn test_unknown_endpoint_returns_404() {
    let app = TestApp::new().await;

    let (status, _) = app.json("GET", "/nonexistent/endpoint", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_oversized_bundle_returns_413() {
    let app = TestApp::with_storage(StorageConfig {
        max_upload_bytes: 1024,
        ..StorageConfig::default()
    })
    .await;
    let admin = app.admin_token().await;
    let token = app.signup("jane@example.com").await;

    let (status, body) = app
        .json(
            "POST",
            "/orders/custom",
            Some(&token),
            Some(json!({ "answers": ["A bakery", "Sweet Crumbs"] })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let code = body["data"]["orderCode"].as_str().unwrap().to_string();

    let (status, body) = app
        .upload(
            &format!("/admin/orders/{code}/bundle"),
            &admin,
            "index.html",
            "text/html",
            &[b'a'; 2048],
        )
        .await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body["error"]["code"], "PAYLOAD_TOO_LARGE");

    let (_, body) = app
        .json("GET", &format!("/admin/orders/{code}"), Some(&admin), None)
        .await;
    assert_eq!(body["data"]["order"]["folderSubmitted"], false);
}
