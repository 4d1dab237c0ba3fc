// session.rs
// Session middleware protecting routes, plus the extractor handing handlers
// the caller identity and the resolved tenant. Business logic never reads
// ambient tenant state: the org id resolved here is passed down explicitly.

use std::{str::FromStr, sync::Arc};

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, header::COOKIE, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use futures::future::BoxFuture;
use mongodb::bson::oid::ObjectId;

use crate::error::ApiError;
use crate::models::UserRole;
use crate::state::{ACTIVE_ORG_TTL_SECONDS, AppState, UserWithOrgs, find_user_by_session};

pub const SESSION_COOKIE_NAME: &str = "session";
/// Persisted tenant preference; a plain org-id cookie written by /org/switch.
pub const ACTIVE_ORG_COOKIE_NAME: &str = "active_org";

#[derive(Clone)]
pub struct SessionData {
    pub user: UserWithOrgs,
    pub token: String,
    pub org_id: ObjectId,
    pub org_name: String,
    pub role: UserRole,
}

pub async fn require_session(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, Response> {
    let tokens = extract_cookies(request.headers(), SESSION_COOKIE_NAME);
    if tokens.is_empty() {
        return Err(ApiError::Unauthenticated.into_response());
    }

    // Try all cookies with the session name until one is valid
    let mut found = None;
    for token in tokens {
        match find_user_by_session(&state, &token).await {
            Ok(Some(user)) => {
                found = Some((user, token));
                break;
            }
            Ok(None) => continue,
            Err(err) => return Err(ApiError::Storage(err).into_response()),
        }
    }

    let Some((user, token)) = found else {
        return Err(ApiError::Unauthenticated.into_response());
    };

    // Tenant resolution: the preference cookie wins when it names an org the
    // caller actually belongs to; otherwise the first membership; otherwise
    // the caller has no tenant to operate against.
    let preferred = extract_cookies(request.headers(), ACTIVE_ORG_COOKIE_NAME)
        .into_iter()
        .filter_map(|value| ObjectId::from_str(&value).ok())
        .find_map(|org_id| user.membership_for(&org_id).cloned());

    let membership = match preferred.or_else(|| user.first_membership().cloned()) {
        Some(m) => m,
        None => return Err(ApiError::NoTenant.into_response()),
    };

    request.extensions_mut().insert(SessionData {
        org_id: membership.org_id,
        org_name: membership.org_name.clone(),
        role: membership.role.clone(),
        user,
        token,
    });
    Ok(next.run(request).await)
}

pub struct SessionUser(pub SessionData);

impl SessionUser {
    pub fn user(&self) -> &UserWithOrgs {
        &self.0.user
    }

    pub fn token(&self) -> &str {
        &self.0.token
    }

    pub fn user_id(&self) -> &ObjectId {
        &self.0.user.id
    }

    pub fn org_id(&self) -> &ObjectId {
        &self.0.org_id
    }

    pub fn org_name(&self) -> &str {
        &self.0.org_name
    }

    pub fn is_admin(&self) -> bool {
        self.0.role.is_admin()
    }
}

#[allow(refining_impl_trait)]
impl<S> FromRequestParts<S> for SessionUser
where
    S: Send + Sync,
{
    type Rejection = Response;

    fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> BoxFuture<'static, Result<Self, Self::Rejection>> {
        let data = parts
            .extensions
            .get::<SessionData>()
            .cloned()
            .ok_or_else(|| ApiError::Unauthenticated.into_response());

        Box::pin(async move {
            match data {
                Ok(session) => Ok(SessionUser(session)),
                Err(resp) => Err(resp),
            }
        })
    }
}

pub fn extract_cookies(headers: &HeaderMap, name: &str) -> Vec<String> {
    headers
        .get_all(COOKIE)
        .into_iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| {
            let mut split = pair.trim().splitn(2, '=');
            let key = split.next()?.trim();
            let value = split.next()?.trim();
            if key == name {
                Some(value.to_owned())
            } else {
                None
            }
        })
        .collect()
}

pub fn secure_cookies() -> bool {
    std::env::var("COMMERCEOS_SECURE_COOKIES").is_ok_and(|v| v == "1" || v == "true")
}

/// Set-Cookie value pinning the active tenant for a year.
pub fn active_org_cookie(org_id: &ObjectId) -> String {
    let mut cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        ACTIVE_ORG_COOKIE_NAME,
        org_id.to_hex(),
        ACTIVE_ORG_TTL_SECONDS
    );
    if secure_cookies() {
        cookie.push_str("; Secure");
    }
    cookie
}

/// Set-Cookie value for a fresh login session.
pub fn session_cookie(token: &str, max_age: u64) -> String {
    let mut cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        SESSION_COOKIE_NAME, token, max_age
    );
    if secure_cookies() {
        cookie.push_str("; Secure");
    }
    cookie
}
