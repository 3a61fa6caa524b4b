//! Signed-cookie sessions.
//!
//! The cookie value is `<user-id>.<hex sha256(secret || user-id)>`. A
//! missing cookie means anonymous; a cookie that fails verification is a
//! session-integrity failure and renders the forbidden page. Signatures
//! are compared in constant time.

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request, header::COOKIE},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use thiserror::Error;
use uuid::Uuid;

use crate::application::error::repo_error_to_http;
use crate::domain::entities::UserRecord;
use crate::presentation::views::{ViewerView, render_forbidden_response};

use super::public::HttpState;

pub const SESSION_COOKIE: &str = "piazza_session";

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("malformed session cookie")]
    Malformed,
    #[error("session cookie signature mismatch")]
    BadSignature,
}

/// Signs and verifies session cookie values against the deployment secret.
#[derive(Clone)]
pub struct SessionKeys {
    secret: String,
}

impl SessionKeys {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    pub fn sign(&self, user_id: Uuid) -> String {
        format!("{user_id}.{}", hex::encode(self.digest(user_id)))
    }

    pub fn verify(&self, value: &str) -> Result<Uuid, SessionError> {
        let (id_part, signature_part) = value.split_once('.').ok_or(SessionError::Malformed)?;
        let user_id = Uuid::parse_str(id_part).map_err(|_| SessionError::Malformed)?;
        let provided = hex::decode(signature_part).map_err(|_| SessionError::Malformed)?;

        let expected = self.digest(user_id);
        if provided.ct_eq(&expected).into() {
            Ok(user_id)
        } else {
            Err(SessionError::BadSignature)
        }
    }

    fn digest(&self, user_id: Uuid) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(self.secret.as_bytes());
        hasher.update(user_id.as_bytes());
        hasher.finalize().into()
    }
}

/// Resolved identity of the requesting user, inserted into request
/// extensions by the `authenticate` middleware.
#[derive(Debug, Clone)]
pub enum AuthContext {
    Anonymous,
    User(UserRecord),
}

impl AuthContext {
    pub fn user(&self) -> Option<&UserRecord> {
        match self {
            AuthContext::User(user) => Some(user),
            AuthContext::Anonymous => None,
        }
    }

    pub fn viewer(&self) -> Option<ViewerView> {
        self.user().map(ViewerView::from)
    }

    pub fn viewer_id(&self) -> Option<Uuid> {
        self.user().map(|user| user.id)
    }
}

/// Resolve the session cookie into an [`AuthContext`] for every request.
///
/// A signed cookie naming a user that no longer exists is treated as
/// anonymous rather than locking the browser out of the whole site.
pub async fn authenticate(
    State(state): State<HttpState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let auth = match session_cookie_value(request.headers()) {
        None => AuthContext::Anonymous,
        Some(value) => match state.sessions.verify(&value) {
            Ok(user_id) => match state.users.get_user_by_id(user_id).await {
                Ok(Some(user)) => AuthContext::User(user),
                Ok(None) => AuthContext::Anonymous,
                Err(err) => {
                    return repo_error_to_http("infra::http::auth::authenticate", err)
                        .into_response();
                }
            },
            Err(err) => return render_forbidden_response(&err.to_string()),
        },
    };

    request.extensions_mut().insert(auth);
    next.run(request).await
}

/// Gate for authenticated-only handlers: anonymous requests bounce to
/// the home page with a see-other redirect.
pub fn require_user(auth: &AuthContext) -> Result<UserRecord, Response> {
    match auth {
        AuthContext::User(user) => Ok(user.clone()),
        AuthContext::Anonymous => Err(Redirect::to("/").into_response()),
    }
}

fn session_cookie_value(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get(COOKIE)?.to_str().ok()?;
    raw.split(';').map(str::trim).find_map(|pair| {
        pair.strip_prefix(SESSION_COOKIE)?
            .strip_prefix('=')
            .map(str::to_string)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys() -> SessionKeys {
        SessionKeys::new("test-secret-test-secret-test-secret")
    }

    #[test]
    fn signed_cookie_round_trips() {
        let keys = keys();
        let user_id = Uuid::new_v4();
        let cookie = keys.sign(user_id);
        assert_eq!(keys.verify(&cookie).expect("valid cookie"), user_id);
    }

    #[test]
    fn tampered_signature_is_rejected() {
        let keys = keys();
        let user_id = Uuid::new_v4();
        let mut cookie = keys.sign(user_id);
        let flipped = if cookie.ends_with('0') { '1' } else { '0' };
        cookie.pop();
        cookie.push(flipped);

        assert!(matches!(
            keys.verify(&cookie),
            Err(SessionError::BadSignature)
        ));
    }

    #[test]
    fn swapped_user_id_is_rejected() {
        let keys = keys();
        let cookie = keys.sign(Uuid::new_v4());
        let signature = cookie.split_once('.').expect("dot separator").1;
        let forged = format!("{}.{signature}", Uuid::new_v4());

        assert!(matches!(
            keys.verify(&forged),
            Err(SessionError::BadSignature)
        ));
    }

    #[test]
    fn garbage_cookie_is_malformed() {
        let keys = keys();
        assert!(matches!(keys.verify("not-a-cookie"), Err(SessionError::Malformed)));
        assert!(matches!(
            keys.verify("also.not-hex"),
            Err(SessionError::Malformed)
        ));
    }

    #[test]
    fn cookie_header_parsing_picks_the_session_pair() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            "theme=dark; piazza_session=abc.def; lang=en".parse().expect("header value"),
        );
        assert_eq!(session_cookie_value(&headers).as_deref(), Some("abc.def"));

        let mut other = HeaderMap::new();
        other.insert(COOKIE, "theme=dark".parse().expect("header value"));
        assert!(session_cookie_value(&other).is_none());
    }
}
