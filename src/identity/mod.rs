//! Central identity management: principals, credential storage, the session
//! token codec, the auth service and the access-control chain.
//! Keep the public surface thin and split implementation across sub-modules.

mod principal;
mod store;
mod token;
mod provider;
mod request_context;
mod authorizer;

pub use principal::{Principal, Role};
pub use store::{CredentialStore, MemoryCredentialStore, NewPrincipal};
pub use token::{Claims, TokenCodec};
pub use provider::{AuthResponse, AuthService, LoginRequest, RegisterRequest};
pub use request_context::RequestContext;
pub use authorizer::{authenticate, authorize, guard, AccessRequirement};
