//! The access-control chain: authentication (token -> principal) followed by
//! authorization (principal role vs the operation's declared requirement).
//! The two stages are independently callable but the order is fixed; a failed
//! authentication short-circuits before authorization ever runs.

use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

use super::principal::Role;
use super::provider::AuthService;
use super::request_context::RequestContext;

/// Declared access requirement for an operation. Built once at startup into
/// the operation catalog; looked up per request. `Authenticated` admits any
/// principal; `Roles` admits only members of the set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccessRequirement {
    Public,
    Authenticated,
    Roles(Vec<Role>),
}

impl AccessRequirement {
    pub fn requires_authentication(&self) -> bool {
        !matches!(self, AccessRequirement::Public)
    }
}

/// Authentication stage. `bearer` is the token extracted from the
/// Authorization header, if any. Absence of a token yields an anonymous
/// context; only a present-but-unusable token is an error. The principal is
/// refreshed from the store so stale role claims never drive a decision.
pub fn authenticate(auth: &AuthService, bearer: Option<&str>) -> AppResult<RequestContext> {
    let Some(token) = bearer else {
        return Ok(RequestContext::anonymous());
    };
    let claims = auth.codec().verify(token)?;
    let Some(principal) = auth.resolve_principal(claims.sub)? else {
        // valid signature but the subject no longer exists
        return Err(AppError::unauthenticated("unknown principal"));
    };
    Ok(RequestContext::for_principal(principal))
}

/// Authorization stage. Assumes authentication already ran; an anonymous
/// context reaching a non-public requirement is rejected here.
pub fn authorize(ctx: &RequestContext, requirement: &AccessRequirement) -> AppResult<()> {
    match requirement {
        AccessRequirement::Public => Ok(()),
        AccessRequirement::Authenticated => {
            if ctx.is_authenticated() {
                Ok(())
            } else {
                Err(AppError::forbidden("authentication required"))
            }
        }
        AccessRequirement::Roles(roles) => match &ctx.principal {
            Some(p) if roles.contains(&p.role) => Ok(()),
            Some(p) => Err(AppError::forbidden(format!(
                "role {} is not permitted for this operation",
                p.role.as_str()
            ))),
            None => Err(AppError::forbidden("authentication required")),
        },
    }
}

/// Full chain for one operation: authenticate, then authorize. A protected
/// operation called without any token fails `Unauthenticated` at this
/// boundary, before the authorization stage is consulted.
pub fn guard(
    auth: &AuthService,
    bearer: Option<&str>,
    requirement: &AccessRequirement,
) -> AppResult<RequestContext> {
    let ctx = authenticate(auth, bearer)?;
    if requirement.requires_authentication() && !ctx.is_authenticated() {
        return Err(AppError::unauthenticated("missing bearer token"));
    }
    authorize(&ctx, requirement)?;
    Ok(ctx)
}
