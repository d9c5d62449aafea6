//! Connection identity.
//!
//! 認証そのものは上流のプロキシが行い、検証済みのユーザー ID をヘッダーで渡します。

use axum::http::{
    HeaderMap, HeaderName,
    header::InvalidHeaderName,
};

use crate::domain::UserId;

/// Header carrying the authenticated user id.
pub const DEFAULT_IDENTITY_HEADER: &str = "x-user-id";

/// Resolve the user behind an upgrade request.
pub trait Authenticator: Send + Sync {
    /// `None` rejects the request with 401.
    fn authenticate(&self, headers: &HeaderMap) -> Option<UserId>;
}

/// Trusts the user id injected by the authenticating proxy.
#[derive(Debug, Clone)]
pub struct TrustedHeaderAuthenticator {
    header: HeaderName,
}

impl TrustedHeaderAuthenticator {
    pub fn new(header: &str) -> Result<Self, InvalidHeaderName> {
        let header = HeaderName::from_bytes(header.trim().to_ascii_lowercase().as_bytes())?;
        Ok(Self { header })
    }
}

impl Default for TrustedHeaderAuthenticator {
    fn default() -> Self {
        Self {
            header: HeaderName::from_static(DEFAULT_IDENTITY_HEADER),
        }
    }
}

impl Authenticator for TrustedHeaderAuthenticator {
    fn authenticate(&self, headers: &HeaderMap) -> Option<UserId> {
        let value = headers.get(&self.header)?.to_str().ok()?;
        UserId::try_from(value.trim()).ok()
    }
}
