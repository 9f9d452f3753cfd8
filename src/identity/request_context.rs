use super::Principal;

/// Per-request access decision context. Built at request entry by the
/// authentication stage, threaded explicitly through the guard chain, and
/// discarded when the request completes. `principal: None` means anonymous.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub principal: Option<Principal>,
    pub request_id: Option<String>,
}

impl RequestContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn for_principal(principal: Principal) -> Self {
        Self { principal: Some(principal), request_id: None }
    }

    pub fn is_authenticated(&self) -> bool {
        self.principal.is_some()
    }
}
