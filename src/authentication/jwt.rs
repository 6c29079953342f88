use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use jwt::{SignWithKey, VerifyWithKey};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::{
    error::{Error, HtmlError},
    permissions::ActionType,
    schema::{Id, User, UserRole},
};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct JwtSessionData {
    pub user_id: Id,
    pub username: String,
    pub role: UserRole,
    iat: i64,
    exp: i64,
}

impl JwtSessionData {
    pub fn new(id: Id, username: String, role: UserRole, lifetime: Duration) -> Self {
        let now = Utc::now();

        Self {
            user_id: id,
            username,
            role,
            iat: now.timestamp(),
            exp: (now + lifetime).timestamp(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SessionData {
    pub user_id: Id,
    pub username: String,
    pub role: UserRole,
}

impl SessionData {
    pub fn authenticate(&self, action: ActionType) -> Result<(), Error> {
        if !action.authenticate(self) {
            return Err(HtmlError::Forbidden.default());
        }
        Ok(())
    }
}

impl From<JwtSessionData> for SessionData {
    fn from(value: JwtSessionData) -> Self {
        SessionData {
            user_id: value.user_id,
            username: value.username,
            role: value.role,
        }
    }
}

/// Signs and verifies session tokens with the configured secret.
#[derive(Clone)]
pub struct SessionSigner {
    key: Hmac<Sha256>,
    lifetime: Duration,
}

impl SessionSigner {
    pub fn new(secret: &str, lifetime_hours: i64) -> Result<Self, Error> {
        let key = Hmac::new_from_slice(secret.as_bytes())
            .map_err(|_| HtmlError::InternalServerError.new("Invalid session secret"))?;

        Ok(Self {
            key,
            lifetime: Duration::hours(lifetime_hours),
        })
    }

    pub fn sign(&self, user: &User) -> Result<String, Error> {
        let claims =
            JwtSessionData::new(user.id, user.username.to_owned(), user.role, self.lifetime);

        claims.sign_with_key(&self.key).map_err(|e| {
            log::error!("Failed to sign session: {e}");
            HtmlError::InternalServerError.default()
        })
    }

    pub fn verify(&self, token: &str) -> Result<SessionData, Error> {
        let session: JwtSessionData = token
            .verify_with_key(&self.key)
            .map_err(|_| HtmlError::InvalidSession.new("Invalid token."))?;

        if session.exp < Utc::now().timestamp() {
            return Err(HtmlError::InvalidSession.new("Token expired."));
        }

        Ok(session.into())
    }
}
