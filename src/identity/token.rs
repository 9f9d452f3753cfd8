use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

use super::principal::{Principal, Role};

/// Claims carried by every session token. The token is a stateless bearer
/// credential: everything needed to identify the caller travels inside it,
/// and there is no server-side revocation list. A compromised token stays
/// valid until `exp`; expiry is the only built-in invalidation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Principal id.
    pub sub: Uuid,
    pub username: String,
    pub role: Role,
    /// Issued-at (Unix seconds).
    pub iat: i64,
    /// Expiry (Unix seconds).
    pub exp: i64,
}

/// Signs and verifies session tokens with the server-held secret (HS256).
/// Verification is self-contained: no credential-store lookup happens here.
#[derive(Clone)]
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenCodec {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn issue(&self, principal: &Principal) -> AppResult<String> {
        let iat = Utc::now().timestamp();
        let claims = Claims {
            sub: principal.id,
            username: principal.username.clone(),
            role: principal.role,
            iat,
            exp: iat + self.ttl.as_secs() as i64,
        };
        self.sign(&claims)
    }

    /// Sign arbitrary claims. Split out from `issue` so tests can mint
    /// already-expired tokens against the same secret.
    pub fn sign(&self, claims: &Claims) -> AppResult<String> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding).map_err(|e| {
            tracing::error!("token encode failed: {e}");
            AppError::infrastructure()
        })
    }

    /// Validate signature and expiry. Signature mismatch, structural
    /// corruption and expiry all collapse into the same error kind; the
    /// caller learns the token is unusable, not why.
    pub fn verify(&self, token: &str) -> AppResult<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);
        decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|_| AppError::unauthenticated("invalid token"))
    }
}
