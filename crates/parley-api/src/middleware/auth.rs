use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use parley::UserId;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::state::AppState;

/// Claims read from an access token minted by the external auth service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: UserId,
    pub exp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
}

/// Authenticated caller, stored in request extensions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal {
    pub user_id: UserId,
}

/// Verifies HS256 access tokens. Token issuance lives elsewhere.
pub struct JwtVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    pub fn new(secret: &str) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    /// Returns claims if the token is valid, unexpired and an access token
    pub fn verify(&self, token: &str) -> Option<Claims> {
        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .ok()?;
        match claims.token_type.as_deref() {
            None | Some("access") => Some(claims),
            Some(_) => None,
        }
    }
}

/// Reject requests without a valid bearer token
pub async fn require_principal(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if let Some(verifier) = state.jwt.as_deref() {
        let principal = extract_principal(req.headers(), verifier).ok_or(ApiError::Unauthorized)?;
        tracing::Span::current().record("user_id", principal.user_id);
        req.extensions_mut().insert(principal);
    }
    Ok(next.run(req).await)
}

fn extract_principal(headers: &HeaderMap, verifier: &JwtVerifier) -> Option<Principal> {
    let header = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = header.strip_prefix("Bearer ")?.trim();
    let claims = verifier.verify(token)?;
    Some(Principal {
        user_id: claims.user_id,
    })
}
