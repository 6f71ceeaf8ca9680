//! Common test utilities for integration tests
//!
//! This module provides shared infrastructure for integration tests:
//! - A router backed by a fresh in-memory database per test
//! - Test user creation with ready-made access tokens
//! - Request helpers returning status, headers and parsed JSON

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, HeaderMap, Method, Request, StatusCode};
use bugboard_api::app::{build_router, AppState};
use bugboard_api::config::{ApiConfig, Config, DatabaseSettings, JwtConfig, ListingConfig};
use bugboard_shared::auth::jwt::issue_token_pair;
use bugboard_shared::db::memory_pool;
use bugboard_shared::models::user::{CreateUser, User};
use serde_json::Value;
use sqlx::SqlitePool;
use tower::ServiceExt;

pub const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

/// Test context containing all necessary resources
pub struct TestContext {
    pub db: SqlitePool,
    pub app: axum::Router,
}

/// Response pieces the tests look at
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub json: Value,
}

impl TestResponse {
    /// `Location` header of a redirect
    pub fn location(&self) -> &str {
        self.headers
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
    }
}

pub fn test_config() -> Config {
    Config {
        api: ApiConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            cors_origins: vec!["*".to_string()],
            production: false,
        },
        database: DatabaseSettings {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            connect_timeout_seconds: 5,
        },
        jwt: JwtConfig {
            secret: SECRET.to_string(),
        },
        listing: ListingConfig { per_page: 10 },
    }
}

impl TestContext {
    /// Creates a new test context with a fresh database
    pub async fn new() -> Self {
        let db = memory_pool().await.expect("in-memory database");
        let app = build_router(AppState::new(db.clone(), test_config()));
        Self { db, app }
    }

    /// Creates a user directly in the store and returns an access token
    pub async fn user(&self, name: &str) -> String {
        User::create(
            &self.db,
            CreateUser::regular(name, format!("{name}@example.org"), "unused-hash"),
        )
        .await
        .expect("user created");

        issue_token_pair(name, SECRET).expect("token issued").access_token
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.send(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> TestResponse {
        self.send(Method::POST, uri, token, Some(body)).await
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }

        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        TestResponse {
            status,
            headers,
            json,
        }
    }

    /// Creates a project through the API and returns its id
    pub async fn create_project(&self, token: &str, title: &str) -> i64 {
        let response = self
            .post(
                "/v1/projects",
                Some(token),
                serde_json::json!({ "title": title, "summary": format!("{title} summary") }),
            )
            .await;
        assert_eq!(response.status, StatusCode::SEE_OTHER);
        id_from(response.location())
    }

    /// Creates an issue through the API and returns its id
    pub async fn create_issue(&self, token: &str, project_id: i64, title: &str) -> i64 {
        let response = self
            .post(
                &format!("/v1/projects/{project_id}/issues"),
                Some(token),
                serde_json::json!({ "title": title, "summary": "details", "priority": "High" }),
            )
            .await;
        assert_eq!(response.status, StatusCode::SEE_OTHER);

        sqlx::query_scalar("SELECT MAX(id) FROM issues")
            .fetch_one(&self.db)
            .await
            .unwrap()
    }
}

/// Trailing numeric id of a detail path
pub fn id_from(location: &str) -> i64 {
    location
        .rsplit('/')
        .next()
        .and_then(|id| id.parse().ok())
        .unwrap_or_else(|| panic!("no id in {location}"))
}
