use std::sync::Arc;

use argon2::{Algorithm, Argon2, Params, PasswordHasher, PasswordVerifier, Version};
use password_hash::{PasswordHash, SaltString};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

use super::principal::{Principal, Role};
use super::store::{CredentialStore, NewPrincipal};
use super::token::TokenCodec;

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    /// Defaults to the lowest-privilege role when unspecified. Typed as the
    /// closed enum, so an out-of-set role never reaches the service.
    #[serde(default)]
    pub role: Option<Role>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub principal: Principal,
}

/// Orchestrates registration and login against the credential store and the
/// token codec. Owns the password-hashing policy: Argon2id, random salt,
/// iteration count from config. Hashing is deliberately slow; that cost is
/// the brute-force defence and must not be tuned away.
pub struct AuthService {
    store: Arc<dyn CredentialStore>,
    codec: TokenCodec,
    hash_cost: u32,
}

impl AuthService {
    pub fn new(store: Arc<dyn CredentialStore>, codec: TokenCodec, hash_cost: u32) -> Self {
        Self { store, codec, hash_cost }
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    pub fn register(&self, req: RegisterRequest) -> AppResult<AuthResponse> {
        if req.username.trim().is_empty() || req.username.len() < 3 {
            return Err(AppError::validation("username must be at least 3 characters"));
        }
        if req.password.len() < 6 {
            return Err(AppError::validation("password must be at least 6 characters"));
        }
        let role = req.role.unwrap_or(Role::Employee);
        let password_hash = self.hash_password(&req.password)?;
        let principal = self.store.insert(NewPrincipal {
            username: req.username,
            password_hash,
            role,
        })?;
        let token = self.codec.issue(&principal)?;
        tracing::info!(username = %principal.username, role = principal.role.as_str(), "principal registered");
        Ok(AuthResponse { token, principal })
    }

    pub fn login(&self, req: LoginRequest) -> AppResult<AuthResponse> {
        // Unknown user and wrong password must be indistinguishable outward.
        let Some(principal) = self.store.find_by_username(&req.username)? else {
            return Err(AppError::invalid_credentials());
        };
        if !verify_password(&principal.password_hash, &req.password) {
            return Err(AppError::invalid_credentials());
        }
        let token = self.codec.issue(&principal)?;
        tracing::info!(username = %principal.username, "login ok");
        Ok(AuthResponse { token, principal })
    }

    /// Refresh principal state from the store. The guard chain calls this for
    /// every authenticated request instead of trusting the role claim, so a
    /// role change or deletion takes effect before token expiry.
    pub fn resolve_principal(&self, id: Uuid) -> AppResult<Option<Principal>> {
        self.store.find_by_id(id)
    }

    fn hash_password(&self, password: &str) -> AppResult<String> {
        let mut salt_bytes = [0u8; 16];
        getrandom::getrandom(&mut salt_bytes).map_err(|e| {
            tracing::error!("salt generation failed: {e}");
            AppError::infrastructure()
        })?;
        let salt = SaltString::encode_b64(&salt_bytes).map_err(|e| {
            tracing::error!("salt encoding failed: {e}");
            AppError::infrastructure()
        })?;
        let params = Params::new(Params::DEFAULT_M_COST, self.hash_cost, Params::DEFAULT_P_COST, None)
            .map_err(|e| {
                tracing::error!("bad argon2 params: {e}");
                AppError::infrastructure()
            })?;
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
        let phc = argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| {
                tracing::error!("password hashing failed: {e}");
                AppError::infrastructure()
            })?
            .to_string();
        Ok(phc)
    }
}

/// Verify a password against a PHC string. The PHC carries its own params,
/// so the default Argon2 instance can check hashes from any cost setting.
pub fn verify_password(hash: &str, password: &str) -> bool {
    if let Ok(parsed) = PasswordHash::new(hash) {
        Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok()
    } else {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::MemoryCredentialStore;
    use std::time::Duration;

    fn service() -> AuthService {
        let store = Arc::new(MemoryCredentialStore::new());
        let codec = TokenCodec::new("unit-secret", Duration::from_secs(3600));
        // t_cost 1 keeps the unit suite quick; production default is 10.
        AuthService::new(store, codec, 1)
    }

    #[test]
    fn register_hashes_and_defaults_role() {
        let svc = service();
        let resp = svc
            .register(RegisterRequest { username: "alice".into(), password: "s3cr3t!".into(), role: None })
            .unwrap();
        assert_eq!(resp.principal.role, Role::Employee);
        assert_ne!(resp.principal.password_hash, "s3cr3t!");
        assert!(resp.principal.password_hash.starts_with("$argon2"));
        let claims = svc.codec().verify(&resp.token).unwrap();
        assert_eq!(claims.sub, resp.principal.id);
    }

    #[test]
    fn register_validates_lengths() {
        let svc = service();
        let short_name = svc.register(RegisterRequest { username: "ab".into(), password: "longenough".into(), role: None });
        assert!(matches!(short_name.unwrap_err(), AppError::Validation { .. }));
        let short_pw = svc.register(RegisterRequest { username: "alice".into(), password: "12345".into(), role: None });
        assert!(matches!(short_pw.unwrap_err(), AppError::Validation { .. }));
    }

    #[test]
    fn login_succeeds_only_with_right_password() {
        let svc = service();
        svc.register(RegisterRequest { username: "bob".into(), password: "hunter22".into(), role: Some(Role::Admin) })
            .unwrap();
        assert!(svc.login(LoginRequest { username: "bob".into(), password: "hunter22".into() }).is_ok());
        let wrong = svc.login(LoginRequest { username: "bob".into(), password: "hunter23".into() }).unwrap_err();
        let unknown = svc.login(LoginRequest { username: "nobody".into(), password: "whatever".into() }).unwrap_err();
        // identical error kind and message for both failure causes
        assert_eq!(wrong.code_str(), unknown.code_str());
        assert_eq!(wrong.message(), unknown.message());
    }

    #[test]
    fn resolve_principal_round_trips() {
        let svc = service();
        let resp = svc
            .register(RegisterRequest { username: "carol".into(), password: "passw0rd".into(), role: None })
            .unwrap();
        let found = svc.resolve_principal(resp.principal.id).unwrap().unwrap();
        assert_eq!(found, resp.principal);
        assert!(svc.resolve_principal(Uuid::new_v4()).unwrap().is_none());
    }
}
