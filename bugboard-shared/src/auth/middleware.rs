/// Authentication middleware for Axum
///
/// Middleware reads the `Authorization: Bearer <token>` header, validates the
/// access token and stores an [`AuthContext`] in the request extensions.
///
/// # Middleware Types
///
/// - **Required**: [`jwt_auth_middleware`] answers 401 when no valid token is sent
/// - **Optional**: [`optional_jwt_middleware`] lets requests without a header
///   through as anonymous, but still rejects a bad token
///
/// # Extractors
///
/// - [`Actor`]: never fails; anonymous when no context was stored
/// - [`AuthContext`]: rejects with 401 when no context was stored
///
/// # Example
///
/// ```no_run
/// use axum::{Router, routing::get, middleware};
/// use bugboard_shared::auth::authorization::Actor;
/// use bugboard_shared::auth::middleware::create_optional_jwt_middleware;
///
/// async fn handler(actor: Actor) -> String {
///     format!("Hello, {}!", actor.name().unwrap_or("stranger"))
/// }
///
/// let app: Router = Router::new()
///     .route("/hello", get(handler))
///     .layer(middleware::from_fn(create_optional_jwt_middleware("secret".to_string())));
/// ```

use axum::{
    async_trait,
    extract::{FromRequestParts, Request},
    http::{header, request::Parts, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use super::authorization::Actor;
use super::jwt::{validate_access_token, JwtError};

/// Authentication context added to request extensions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    /// Authenticated user name
    pub user_name: String,
}

impl AuthContext {
    pub fn new(user_name: impl Into<String>) -> Self {
        Self {
            user_name: user_name.into(),
        }
    }

    pub fn actor(&self) -> Actor {
        Actor::User(self.user_name.clone())
    }
}

/// Error type for authentication middleware
#[derive(Debug)]
pub enum AuthError {
    /// Missing authorization header
    MissingCredentials,

    /// Invalid authorization header format
    InvalidFormat(String),

    /// Token validation failed
    InvalidToken(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthError::MissingCredentials => {
                (StatusCode::UNAUTHORIZED, "Missing credentials".to_string())
            }
            AuthError::InvalidFormat(msg) => (StatusCode::BAD_REQUEST, msg),
            AuthError::InvalidToken(msg) => (StatusCode::UNAUTHORIZED, msg),
        };

        let body = serde_json::json!({
            "error": "unauthorized",
            "message": message,
        });

        (
            status,
            [(header::WWW_AUTHENTICATE, "Bearer realm=\"bugboard\"")],
            axum::Json(body),
        )
            .into_response()
    }
}

/// Parses and validates the bearer token, if one was sent
fn context_from_headers(headers: &HeaderMap, secret: &str) -> Result<Option<AuthContext>, AuthError> {
    let Some(value) = headers.get(header::AUTHORIZATION) else {
        return Ok(None);
    };

    let auth_header = value
        .to_str()
        .map_err(|_| AuthError::InvalidFormat("Authorization header is not valid text".to_string()))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AuthError::InvalidFormat("Expected Bearer token".to_string()))?;

    let claims = validate_access_token(token, secret).map_err(|e| match e {
        JwtError::Expired => AuthError::InvalidToken("Token expired".to_string()),
        JwtError::InvalidIssuer => AuthError::InvalidToken("Invalid issuer".to_string()),
        _ => AuthError::InvalidToken(format!("Invalid token: {}", e)),
    })?;

    Ok(Some(AuthContext::new(claims.sub)))
}

/// JWT authentication middleware
///
/// # Errors
///
/// Returns 401 Unauthorized if the header is missing, the token is invalid or
/// has expired, and 400 if the header is not a Bearer credential.
pub async fn jwt_auth_middleware(
    secret: String,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let context = context_from_headers(req.headers(), &secret)?.ok_or(AuthError::MissingCredentials)?;

    tracing::debug!(user = %context.user_name, "Authenticated request");
    req.extensions_mut().insert(context);

    Ok(next.run(req).await)
}

/// JWT middleware for routes that also serve anonymous readers
pub async fn optional_jwt_middleware(
    secret: String,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    if let Some(context) = context_from_headers(req.headers(), &secret)? {
        tracing::debug!(user = %context.user_name, "Authenticated request");
        req.extensions_mut().insert(context);
    }

    Ok(next.run(req).await)
}

type MiddlewareFuture =
    std::pin::Pin<Box<dyn std::future::Future<Output = Result<Response, AuthError>> + Send>>;

/// Creates a required JWT authentication middleware closure
pub fn create_jwt_middleware(
    secret: String,
) -> impl Fn(Request, Next) -> MiddlewareFuture + Clone {
    move |req, next| {
        let secret = secret.clone();
        Box::pin(jwt_auth_middleware(secret, req, next))
    }
}

/// Creates an optional JWT authentication middleware closure
pub fn create_optional_jwt_middleware(
    secret: String,
) -> impl Fn(Request, Next) -> MiddlewareFuture + Clone {
    move |req, next| {
        let secret = secret.clone();
        Box::pin(optional_jwt_middleware(secret, req, next))
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<AuthContext>()
            .map(AuthContext::actor)
            .unwrap_or_default())
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .ok_or(AuthError::MissingCredentials)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::{create_token, Claims, TokenType};
    use axum::http::HeaderValue;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_context_from_valid_token() {
        let token = create_token(&Claims::new("alice", TokenType::Access), SECRET).unwrap();
        let context = context_from_headers(&headers_with(&format!("Bearer {token}")), SECRET)
            .unwrap()
            .unwrap();

        assert_eq!(context, AuthContext::new("alice"));
        assert_eq!(context.actor(), Actor::user("alice"));
    }

    #[test]
    fn test_missing_header_is_anonymous() {
        assert!(context_from_headers(&HeaderMap::new(), SECRET).unwrap().is_none());
    }

    #[test]
    fn test_bad_credentials_rejected() {
        assert!(matches!(
            context_from_headers(&headers_with("Basic abc"), SECRET),
            Err(AuthError::InvalidFormat(_))
        ));
        assert!(matches!(
            context_from_headers(&headers_with("Bearer not-a-token"), SECRET),
            Err(AuthError::InvalidToken(_))
        ));

        let refresh = create_token(&Claims::new("alice", TokenType::Refresh), SECRET).unwrap();
        assert!(matches!(
            context_from_headers(&headers_with(&format!("Bearer {refresh}")), SECRET),
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_auth_error_into_response() {
        let response = AuthError::MissingCredentials.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response.headers().contains_key(header::WWW_AUTHENTICATE));

        let response = AuthError::InvalidFormat("test".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_extractors() {
        let (mut parts, _) = axum::http::Request::builder()
            .uri("/")
            .body(())
            .unwrap()
            .into_parts();

        let actor = Actor::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(actor, Actor::Anonymous);
        assert!(AuthContext::from_request_parts(&mut parts, &()).await.is_err());

        parts.extensions.insert(AuthContext::new("bob"));
        let actor = Actor::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(actor, Actor::user("bob"));
    }

    async fn greet(actor: Actor) -> String {
        actor.name().unwrap_or("stranger").to_string()
    }

    /// Builds the layered router from a borrowed secret; the router must not
    /// hold on to the borrow
    fn layered_router(secret: &str) -> axum::Router {
        let private = axum::Router::new()
            .route("/private", axum::routing::get(greet))
            .layer(axum::middleware::from_fn(create_jwt_middleware(secret.to_string())));

        axum::Router::new()
            .route("/open", axum::routing::get(greet))
            .merge(private)
            .layer(axum::middleware::from_fn(create_optional_jwt_middleware(
                secret.to_string(),
            )))
    }

    async fn call(app: &axum::Router, uri: &str, token: Option<&str>) -> (StatusCode, String) {
        use tower::ServiceExt;

        let mut builder = axum::http::Request::builder().uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let response = app
            .clone()
            .oneshot(builder.body(axum::body::Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8_lossy(&body).into_owned())
    }

    #[tokio::test]
    async fn test_middleware_layers_on_router() {
        let app = {
            let secret = SECRET.to_string();
            layered_router(&secret)
        };
        let token = create_token(&Claims::new("alice", TokenType::Access), SECRET).unwrap();

        assert_eq!(call(&app, "/open", None).await, (StatusCode::OK, "stranger".to_string()));
        assert_eq!(
            call(&app, "/open", Some(&token)).await,
            (StatusCode::OK, "alice".to_string())
        );
        assert_eq!(call(&app, "/open", Some("garbage")).await.0, StatusCode::UNAUTHORIZED);
        assert_eq!(call(&app, "/private", None).await.0, StatusCode::UNAUTHORIZED);
        assert_eq!(
            call(&app, "/private", Some(&token)).await,
            (StatusCode::OK, "alice".to_string())
        );
    }
}
