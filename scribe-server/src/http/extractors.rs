//! Custom Axum extractors
//!
//! Credentials ride on every request in the `Authorization` header:
//!
//! - `Basic base64(email:password)` authenticates with a password
//! - `Basic base64(token:)` (empty password) or `Bearer token` uses an
//!   auth token from `POST /api/v1/tokens`
//! - no header, or an empty username, is an anonymous viewer
//!
//! The caller is resolved once per request and cached in the request
//! extensions, so stacking extractors costs one lookup.
//!
//! ```ignore
//! async fn create_post(CanWrite(user): CanWrite, ...) -> Result<..., ApiError> {
//!     // only runs for confirmed accounts holding WRITE
//! }
//! ```

use std::sync::Arc;

use axum::extract::{FromRequestParts, Path};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use scribe_core::{Password, Permission, Viewer};

use super::error::ApiError;
use crate::db::repos::{User, UserRepo};
use crate::models::ValidationError;
use crate::state::AppState;

/// Credentials parsed from the `Authorization` header
#[derive(Debug)]
pub enum Credentials {
    Password { email: String, password: Password },
    Token(String),
}

/// Parse an `Authorization` header value.
///
/// `Ok(None)` means anonymous. Unknown schemes and undecodable values are
/// rejected.
pub fn parse_authorization(value: &str) -> Result<Option<Credentials>, ApiError> {
    let (scheme, rest) = value
        .trim()
        .split_once(' ')
        .ok_or_else(ApiError::invalid_credentials)?;
    let rest = rest.trim();

    if scheme.eq_ignore_ascii_case("bearer") {
        if rest.is_empty() {
            return Ok(None);
        }
        return Ok(Some(Credentials::Token(rest.to_string())));
    }

    if !scheme.eq_ignore_ascii_case("basic") {
        return Err(ApiError::invalid_credentials());
    }

    let decoded = STANDARD
        .decode(rest)
        .map_err(|_| ApiError::invalid_credentials())?;
    let decoded = String::from_utf8(decoded).map_err(|_| ApiError::invalid_credentials())?;
    let (user, password) = decoded.split_once(':').unwrap_or((decoded.as_str(), ""));

    if user.is_empty() {
        return Ok(None);
    }
    if password.is_empty() {
        return Ok(Some(Credentials::Token(user.to_string())));
    }
    Ok(Some(Credentials::Password {
        email: user.to_string(),
        password: Password::new(password),
    }))
}

/// An authenticated account, confirmed or not
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user: User,
    /// True when the request authenticated with a token instead of a password
    pub token_used: bool,
}

/// Cached result of resolving the caller
#[derive(Clone)]
struct ResolvedCaller(Option<AuthUser>);

async fn resolve_caller(
    parts: &mut Parts,
    state: &Arc<AppState>,
) -> Result<Option<AuthUser>, ApiError> {
    if let Some(ResolvedCaller(caller)) = parts.extensions.get::<ResolvedCaller>() {
        return Ok(caller.clone());
    }

    let header = match parts.headers.get(AUTHORIZATION) {
        Some(value) => Some(
            value
                .to_str()
                .map_err(|_| ApiError::invalid_credentials())?
                .to_string(),
        ),
        None => None,
    };
    let credentials = match header {
        Some(value) => parse_authorization(&value)?,
        None => None,
    };

    let caller = match credentials {
        None => None,
        Some(credentials) => Some(authenticate(state, credentials).await?),
    };

    parts.extensions.insert(ResolvedCaller(caller.clone()));
    Ok(caller)
}

async fn authenticate(state: &AppState, credentials: Credentials) -> Result<AuthUser, ApiError> {
    let repo = UserRepo::new(&state.pool);

    let (user, token_used) = match credentials {
        Credentials::Token(token) => {
            let id = state
                .tokens
                .verify_auth(&token)
                .ok_or_else(ApiError::invalid_credentials)?;
            (repo.find_by_id(id).await?, true)
        }
        Credentials::Password { email, password } => {
            (repo.authenticate(&email, password).await?, false)
        }
    };

    let mut user = user.ok_or_else(|| {
        tracing::debug!("rejected credentials");
        ApiError::invalid_credentials()
    })?;

    repo.ping(user.id).await?;
    user.last_seen = chrono::Utc::now();

    Ok(AuthUser { user, token_used })
}

/// 403 unless the account is confirmed
pub fn require_confirmed(user: &User) -> Result<(), ApiError> {
    if user.confirmed {
        Ok(())
    } else {
        Err(ApiError::forbidden("Unconfirmed Account"))
    }
}

/// 403 unless the account holds `perm`
pub fn require_permission(user: &User, perm: Permission) -> Result<(), ApiError> {
    if user.can(perm) {
        Ok(())
    } else {
        Err(ApiError::insufficient_permissions())
    }
}

impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        resolve_caller(parts, state)
            .await?
            .ok_or_else(ApiError::authentication_required)
    }
}

/// Anonymous or confirmed caller, for read-only API routes
#[derive(Debug, Clone)]
pub struct ApiViewer(pub Option<User>);

impl ApiViewer {
    pub fn viewer(&self) -> Viewer {
        match &self.0 {
            Some(user) => user.viewer(),
            None => Viewer::Anonymous,
        }
    }

    pub fn user_id(&self) -> Option<i64> {
        self.0.as_ref().map(|u| u.id)
    }
}

impl FromRequestParts<Arc<AppState>> for ApiViewer {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        match resolve_caller(parts, state).await? {
            Some(AuthUser { user, .. }) => {
                require_confirmed(&user)?;
                Ok(Self(Some(user)))
            }
            None => Ok(Self(None)),
        }
    }
}

/// Authenticated and confirmed account
#[derive(Debug, Clone)]
pub struct ConfirmedUser(pub User);

impl FromRequestParts<Arc<AppState>> for ConfirmedUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let AuthUser { user, .. } = AuthUser::from_request_parts(parts, state).await?;
        require_confirmed(&user)?;
        Ok(Self(user))
    }
}

macro_rules! permission_extractor {
    ($(#[$meta:meta])* $name:ident => $perm:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone)]
        pub struct $name(pub User);

        impl FromRequestParts<Arc<AppState>> for $name {
            type Rejection = ApiError;

            async fn from_request_parts(
                parts: &mut Parts,
                state: &Arc<AppState>,
            ) -> Result<Self, Self::Rejection> {
                let ConfirmedUser(user) = ConfirmedUser::from_request_parts(parts, state).await?;
                require_permission(&user, $perm)?;
                Ok(Self(user))
            }
        }
    };
}

permission_extractor!(
    /// Confirmed account holding FOLLOW
    CanFollow => Permission::FOLLOW
);
permission_extractor!(
    /// Confirmed account holding COMMENT
    CanComment => Permission::COMMENT
);
permission_extractor!(
    /// Confirmed account holding WRITE
    CanWrite => Permission::WRITE
);
permission_extractor!(
    /// Confirmed account holding MODERATE
    CanModerate => Permission::MODERATE
);
permission_extractor!(
    /// Confirmed administrator
    Admin => Permission::ADMIN
);

/// Extract and validate a numeric id from path
pub struct IdPath(pub i64);

impl<S> FromRequestParts<S> for IdPath
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(id): Path<String> = Path::from_request_parts(parts, state)
            .await
            .map_err(|_| ApiError::Validation(ValidationError::Empty { field: "id" }))?;

        let id = id.parse::<i64>().map_err(|_| {
            ApiError::Validation(ValidationError::InvalidFormat {
                field: "id",
                reason: "must be an integer",
            })
        })?;

        Ok(Self(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn basic(raw: &str) -> String {
        format!("Basic {}", STANDARD.encode(raw))
    }

    #[test]
    fn basic_with_password() {
        let creds = parse_authorization(&basic("john@example.com:cat"))
            .unwrap()
            .unwrap();
        match creds {
            Credentials::Password { email, password } => {
                assert_eq!(email, "john@example.com");
                assert!(!password.is_empty());
            }
            other => panic!("expected password credentials, got {:?}", other),
        }
    }

    #[test]
    fn basic_with_empty_password_is_token() {
        let creds = parse_authorization(&basic("abc.def.ghi:")).unwrap().unwrap();
        assert!(matches!(creds, Credentials::Token(t) if t == "abc.def.ghi"));
    }

    #[test]
    fn empty_username_is_anonymous() {
        assert!(parse_authorization(&basic(":")).unwrap().is_none());
        assert!(parse_authorization(&basic(":secret")).unwrap().is_none());
    }

    #[test]
    fn bearer_is_token() {
        let creds = parse_authorization("Bearer abc").unwrap().unwrap();
        assert!(matches!(creds, Credentials::Token(t) if t == "abc"));
        assert!(parse_authorization("Bearer").is_err());
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(parse_authorization("Basic !!!not-base64!!!").is_err());
        assert!(parse_authorization("Digest abc").is_err());
        assert!(parse_authorization("Basic").is_err());
    }

    #[test]
    fn confirmation_and_permission_checks() {
        let mut user = User {
            id: 1,
            email: "a@example.com".into(),
            username: "a".into(),
            password_hash: String::new(),
            confirmed: false,
            role_id: Some(1),
            role_name: Some("User".into()),
            permissions: Some(7),
            avatar_hash: None,
            name: None,
            location: None,
            about_me: None,
            member_since: chrono::Utc::now(),
            last_seen: chrono::Utc::now(),
        };

        assert!(require_confirmed(&user).is_err());
        user.confirmed = true;
        assert!(require_confirmed(&user).is_ok());

        assert!(require_permission(&user, Permission::WRITE).is_ok());
        assert!(require_permission(&user, Permission::MODERATE).is_err());

        user.permissions = None;
        assert!(require_permission(&user, Permission::FOLLOW).is_err());
    }
}
