// src/utils/jwt.rs

use std::time::{SystemTime, UNIX_EPOCH};

use axum::{
    body::Body,
    extract::State,
    http::{Request, header},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::{config::Config, error::AppError};

pub const STUDENT_ROLE: &str = "student";

/// JWT Claims structure.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Claims {
    /// Subject - the caller's user id (as string).
    pub sub: String,
    /// Caller's role (e.g., 'student', 'teacher', 'admin').
    pub role: String,
    /// Expiration time as Unix timestamp.
    pub exp: usize,
}

/// Signs a new JWT for a subject.
pub fn sign_jwt(
    subject: &str,
    role: &str,
    secret: &str,
    expiration_seconds: u64,
) -> Result<String, AppError> {
    let expiration = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| AppError::InternalServerError(e.to_string()))?
        .as_secs() as usize
        + expiration_seconds as usize;

    let claims = Claims {
        sub: subject.to_owned(),
        role: role.to_owned(),
        exp: expiration,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::InternalServerError(e.to_string()))
}

/// Verifies and decodes a JWT string.
///
/// Returns the `Claims` if valid, otherwise returns an `AppError`.
pub fn verify_jwt(token: &str, secret: &str) -> Result<Claims, AppError> {
    let token_data = decode(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| AppError::AuthError("Invalid token".to_string()))?;

    Ok(token_data.claims)
}

/// Who is calling, as far as the exam core cares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub subject: String,
    pub role: String,
}

impl Identity {
    pub fn is_student(&self) -> bool {
        self.role == STUDENT_ROLE
    }
}

impl From<Claims> for Identity {
    fn from(claims: Claims) -> Self {
        Self {
            subject: claims.sub,
            role: claims.role,
        }
    }
}

/// Request extension set by `identity_middleware`. `None` means anonymous.
#[derive(Debug, Clone, Default)]
pub struct CurrentUser(pub Option<Identity>);

impl CurrentUser {
    pub fn identity(&self) -> Option<&Identity> {
        self.0.as_ref()
    }

    /// 401 without an identity, 403 for any role other than student.
    pub fn require_student(&self) -> Result<&Identity, AppError> {
        let identity = self
            .identity()
            .ok_or_else(|| AppError::AuthError("Authentication required".to_string()))?;

        if !identity.is_student() {
            return Err(AppError::Forbidden(
                "Only students have exam results".to_string(),
            ));
        }

        Ok(identity)
    }
}

/// Axum Middleware: optional identity.
///
/// Reads 'Authorization: Bearer <token>'. A valid token becomes a `CurrentUser`
/// with an identity; a missing or invalid one leaves the caller anonymous.
/// Never rejects the request itself.
pub async fn identity_middleware(
    State(config): State<Config>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));

    let identity = match token {
        Some(token) => match verify_jwt(token, &config.jwt_secret) {
            Ok(claims) => Some(Identity::from(claims)),
            Err(_) => {
                tracing::debug!("Ignoring invalid bearer token");
                None
            }
        },
        None => None,
    };

    req.extensions_mut().insert(CurrentUser(identity));
    next.run(req).await
}
