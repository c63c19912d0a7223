//! Bearer-token authentication.
//!
//! Access tokens are issued by the external identity provider and signed with
//! a shared HS256 secret. This service only verifies them; each verified
//! request refreshes the local `users` row from the token claims.

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::Identity,
    routes::AppState,
};

#[derive(Debug, Default, Deserialize)]
struct UserMetadata {
    #[serde(default)]
    full_name: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    avatar_url: Option<String>,
    #[serde(default)]
    picture: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Claims {
    sub: Uuid,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    user_metadata: UserMetadata,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl From<Claims> for Identity {
    fn from(claims: Claims) -> Self {
        let metadata = claims.user_metadata;
        Identity {
            id: claims.sub,
            email: non_empty(claims.email),
            name: non_empty(metadata.full_name).or_else(|| non_empty(metadata.name)),
            avatar_url: non_empty(metadata.avatar_url).or_else(|| non_empty(metadata.picture)),
        }
    }
}

/// Verifies provider-issued access tokens
pub struct JwtVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    pub fn new(secret: &str, audience: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[audience]);
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    pub fn verify(&self, token: &str) -> AppResult<Identity> {
        decode::<Claims>(token, &self.key, &self.validation)
            .map(|data| data.claims.into())
            .map_err(|e| {
                tracing::debug!(error = %e, "Rejected access token");
                AppError::Unauthorized
            })
    }
}

/// `None` when no bearer token is present, an error when one is malformed
fn bearer_token(parts: &Parts) -> AppResult<Option<&str>> {
    let Some(value) = parts.headers.get(header::AUTHORIZATION) else {
        return Ok(None);
    };
    value
        .to_str()
        .ok()
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(Some)
        .ok_or(AppError::Unauthorized)
}

async fn authenticate(parts: &Parts, state: &AppState) -> AppResult<Option<Identity>> {
    let Some(token) = bearer_token(parts)? else {
        return Ok(None);
    };
    let identity = state.auth.verify(token)?;
    state.users.upsert(identity.clone()).await?;
    Ok(Some(identity))
}

/// Authenticated caller; rejects the request with 401 otherwise
#[derive(Debug, Clone)]
pub struct AuthUser(pub Identity);

#[async_trait::async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let identity = authenticate(parts, state)
            .await?
            .ok_or(AppError::Unauthorized)?;
        parts.extensions.insert(identity.clone());
        Ok(Self(identity))
    }
}

/// Caller that may be a guest. A token that fails verification counts as no
/// token at all.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<Identity>);

#[async_trait::async_trait]
impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        match authenticate(parts, state).await {
            Ok(identity) => Ok(Self(identity)),
            Err(AppError::Unauthorized) => Ok(Self(None)),
            Err(e) => Err(e),
        }
    }
}
