//! Authentication middleware for the gateway's own protected routes.
//!
//! Runs the credential through the [`AuthGate`] and, on success, stores the
//! verified [`Claims`](common::jwt::Claims) in request extensions for handlers.

use crate::auth::{extract_credential, AuthGate};
use crate::errors::GatewayError;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::IntoResponse,
};
use std::sync::Arc;
use tracing::instrument;

/// Require a valid bearer token.
///
/// # Response
///
/// - 401 with the rejection reason if the token is missing or invalid
/// - otherwise continues with `Claims` in extensions
#[instrument(skip_all, name = "gateway.middleware.auth")]
pub async fn require_auth(
    State(gate): State<Arc<AuthGate>>,
    mut req: Request,
    next: Next,
) -> Result<impl IntoResponse, GatewayError> {
    let credential = extract_credential(req.headers());

    let claims = gate
        .authenticate_claims(credential.as_deref())
        .map_err(GatewayError::Unauthorized)?;

    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{header, StatusCode},
        middleware,
        routing::get,
        Router,
    };
    use common::clock::FixedClock;
    use common::jwt::{Claims, SigningKey, TokenCodec};
    use std::time::Duration;
    use tower::ServiceExt;

    async fn whoami(req: Request) -> String {
        req.extensions()
            .get::<Claims>()
            .map(|c| c.sub.clone())
            .unwrap_or_else(|| "nobody".to_string())
    }

    fn app() -> (Router, Arc<TokenCodec>) {
        let key = SigningKey::from_bytes(vec![0x42; 32]).unwrap();
        let codec = Arc::new(TokenCodec::with_clock(
            &key,
            Arc::new(FixedClock::new(1_700_000_000)),
        ));
        let gate = Arc::new(AuthGate::new(codec.clone()));

        let router = Router::new()
            .route("/whoami", get(whoami))
            .route_layer(middleware::from_fn_with_state(gate, require_auth));

        (router, codec)
    }

    fn request(auth: Option<&str>) -> axum::http::Request<Body> {
        let mut builder = axum::http::Request::builder().uri("/whoami");
        if let Some(value) = auth {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_valid_token_reaches_handler_with_claims() {
        let (app, codec) = app();
        let token = codec.issue("alice", Duration::from_secs(60)).unwrap();

        let response = app
            .oneshot(request(Some(&format!("Bearer {token}"))))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = http_body_util::BodyExt::collect(response.into_body())
            .await
            .unwrap()
            .to_bytes();
        assert_eq!(body.as_ref(), b"alice");
    }

    #[tokio::test]
    async fn test_missing_token_is_unauthorized() {
        let (app, _) = app();

        let response = app.oneshot(request(None)).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response.headers().contains_key(header::WWW_AUTHENTICATE));
    }

    #[tokio::test]
    async fn test_garbage_token_is_unauthorized() {
        let (app, _) = app();

        let response = app
            .oneshot(request(Some("Bearer not-a-token")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
