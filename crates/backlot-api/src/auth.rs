//! # Authentication & Authorization Middleware
//!
//! Bearer token middleware with role-based access control.
//!
//! ## Token Format
//!
//! Bearer tokens encode role and user identity:
//!
//! ```text
//! Bearer {role}:{user_id}:{secret}   — standard format
//! Bearer {secret}                     — legacy format (treated as Admin)
//! ```
//!
//! A future deployment can swap JWT claims in behind the same
//! [`CallerIdentity`] extractor — only the parsing changes.
//!
//! ## CallerIdentity
//!
//! Every authenticated request gets a [`CallerIdentity`] injected into the
//! request extensions. Handlers extract it via the `FromRequestParts` impl.

use axum::extract::Request;
use axum::http::request::Parts;
use axum::http::{header, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use utoipa::ToSchema;
use uuid::Uuid;

use backlot_core::UserId;

use crate::error::{AppError, ErrorBody, ErrorDetail};

// ── Role ────────────────────────────────────────────────────────────────────

/// Back-office roles, ordered by privilege level.
///
/// The `Ord` derivation respects variant declaration order:
/// `Seller < Manager < Admin`. This enables `>=` comparison for
/// role-based access checks.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Works deals; reads inventory, writes own tasks and chat.
    Seller,
    /// Runs the desk; resolves arbitration cases, edits inventory.
    Manager,
    /// Full access, including user administration.
    Admin,
}

impl Role {
    /// Return the string representation of this role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Seller => "seller",
            Self::Manager => "manager",
            Self::Admin => "admin",
        }
    }

    /// Parse a stored role string.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "seller" => Some(Self::Seller),
            "manager" => Some(Self::Manager),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── CallerIdentity ──────────────────────────────────────────────────────────

/// Identity of the authenticated caller, extracted from the auth context
/// and available to all route handlers via Axum's `FromRequestParts`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity {
    /// The caller's role in the system.
    pub role: Role,
    /// The caller's user account, when the token carries one.
    /// Admin tokens in the legacy format have no user binding.
    pub user_id: Option<UserId>,
}

impl CallerIdentity {
    /// Check if the caller has at least the given minimum role.
    ///
    /// Since `Role` derives `Ord` with `Seller < Manager < Admin`,
    /// this is a single comparison.
    pub fn has_role(&self, minimum: Role) -> bool {
        self.role >= minimum
    }
}

/// Axum `FromRequestParts` implementation for `CallerIdentity`.
///
/// Extracts the identity that the auth middleware injected into extensions.
/// Returns 401 if no identity is present (middleware didn't run or failed).
#[axum::async_trait]
impl<S: Send + Sync> axum::extract::FromRequestParts<S> for CallerIdentity {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CallerIdentity>()
            .cloned()
            .ok_or_else(|| AppError::Unauthorized("no caller identity in request context".into()))
    }
}

/// Check that the caller has at least the required role.
/// Returns 403 Forbidden if the caller's role is insufficient.
pub fn require_role(caller: &CallerIdentity, minimum: Role) -> Result<(), AppError> {
    if caller.has_role(minimum) {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!(
            "role '{}' required, caller has '{}'",
            minimum.as_str(),
            caller.role.as_str()
        )))
    }
}

// ── Auth Configuration ──────────────────────────────────────────────────────

/// Auth configuration injected into request extensions.
///
/// Custom `Debug` redacts the token value to prevent credential leakage in logs.
#[derive(Clone)]
pub struct AuthConfig {
    pub token: Option<String>,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

// ── Token Validation ────────────────────────────────────────────────────────

/// Constant-time comparison of bearer tokens.
///
/// Prevents timing side-channels that could reveal token length or prefix.
/// When lengths differ, performs a dummy comparison to avoid leaking length
/// information through timing variance.
fn constant_time_token_eq(provided: &str, expected: &str) -> bool {
    let provided = provided.as_bytes();
    let expected = expected.as_bytes();
    if provided.len() != expected.len() {
        // Dummy comparison to keep timing constant regardless of length match.
        let _ = expected.ct_eq(expected);
        return false;
    }
    provided.ct_eq(expected).into()
}

/// Parse the bearer token in format `{role}:{user_id}:{secret}` or
/// `{secret}` (legacy).
///
/// Legacy tokens (without role prefix) are treated as `Admin` for backward
/// compatibility with existing deployments.
pub fn parse_bearer_token(provided: &str, expected_secret: &str) -> Result<CallerIdentity, String> {
    let parts: Vec<&str> = provided.splitn(3, ':').collect();

    match parts.len() {
        // Legacy format: just the secret. Treated as admin for backward compat.
        1 => {
            if constant_time_token_eq(provided, expected_secret) {
                Ok(CallerIdentity {
                    role: Role::Admin,
                    user_id: None,
                })
            } else {
                Err("invalid bearer token".into())
            }
        }
        // Standard format: role:user_id:secret (user_id may be empty)
        3 => {
            let role_str = parts[0];
            let user_str = parts[1];
            let secret = parts[2];

            if !constant_time_token_eq(secret, expected_secret) {
                return Err("invalid bearer token".into());
            }

            let role = Role::parse(role_str).ok_or_else(|| format!("unknown role: {role_str}"))?;

            let user_id = if user_str.is_empty() {
                None
            } else {
                Some(
                    user_str
                        .parse::<Uuid>()
                        .map(UserId::from_uuid)
                        .map_err(|e| format!("invalid user_id: {e}"))?,
                )
            };

            Ok(CallerIdentity { role, user_id })
        }
        _ => Err("invalid token format — expected {role}:{user_id}:{secret} or {secret}".into()),
    }
}

// ── Middleware ───────────────────────────────────────────────────────────────

/// Extract and validate the Bearer token from the Authorization header.
///
/// Parses the token to extract `CallerIdentity` (role + user binding) and
/// injects it into request extensions for downstream handlers.
///
/// When `AuthConfig.token` is `None`, all requests are allowed with `Admin`
/// identity (auth disabled / development mode).
pub async fn auth_middleware(mut request: Request, next: Next) -> Response {
    let expected_token = request.extensions().get::<AuthConfig>().cloned();

    match expected_token {
        Some(AuthConfig {
            token: Some(ref expected),
        }) => {
            let auth_header = request
                .headers()
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok());

            match auth_header {
                Some(header_value) if header_value.starts_with("Bearer ") => {
                    let provided = &header_value[7..];
                    match parse_bearer_token(provided, expected) {
                        Ok(identity) => {
                            request.extensions_mut().insert(identity);
                            next.run(request).await
                        }
                        Err(msg) => {
                            tracing::warn!(reason = %msg, "authentication failed: invalid bearer token");
                            unauthorized_response(&msg)
                        }
                    }
                }
                Some(_) => {
                    tracing::warn!("authentication failed: non-Bearer authorization scheme");
                    unauthorized_response("authorization header must use Bearer scheme")
                }
                None => {
                    tracing::warn!("authentication failed: missing authorization header");
                    unauthorized_response("missing authorization header")
                }
            }
        }
        _ => {
            // Auth disabled — inject Admin identity for full access.
            request.extensions_mut().insert(CallerIdentity {
                role: Role::Admin,
                user_id: None,
            });
            next.run(request).await
        }
    }
}

fn unauthorized_response(message: &str) -> Response {
    let body = ErrorBody {
        error: ErrorDetail {
            code: "UNAUTHORIZED".to_string(),
            message: message.to_string(),
            details: None,
        },
    };
    (StatusCode::UNAUTHORIZED, Json(body)).into_response()
}
