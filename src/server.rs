//!
//! rosterd HTTP server
//! -------------------
//! Axum-based HTTP API fronting the guard stack.
//!
//! Responsibilities:
//! - Auth endpoints (register, login, me) backed by the `identity` module.
//! - A guarded operation endpoint (`POST /op`) that runs every request
//!   through the fixed pipeline: parse -> cost admission -> authenticate ->
//!   authorize -> dispatch to the record module.
//! - Stable error bodies via the unified `AppError` model.
//!
//! The pipeline order is load-bearing: cost admission is uniform and needs no
//! authentication, and authorization never runs after a failed
//! authentication.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use axum::extract::State;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use crate::catalog::{catalog, OperationCatalog};
use crate::complexity::{admit, Selection};
use crate::config::Config;
use crate::employee::{CreateEmployee, EmployeeFilter, EmployeeStore, Pagination, UpdateEmployee};
use crate::error::{AppError, AppResult};
use crate::identity::{
    guard, AuthService, LoginRequest, MemoryCredentialStore, RegisterRequest, RequestContext,
    TokenCodec,
};

/// Shared server state injected into all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub auth: Arc<AuthService>,
    pub employees: Arc<EmployeeStore>,
    pub catalog: &'static OperationCatalog,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let codec = TokenCodec::new(&config.signing_secret, config.token_ttl);
        let store = Arc::new(MemoryCredentialStore::new());
        let auth = Arc::new(AuthService::new(store, codec, config.hash_cost));
        Self {
            config: Arc::new(config),
            auth,
            employees: Arc::new(EmployeeStore::new()),
            catalog: catalog(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(json!({ "error": self }))).into_response()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(|| async { "rosterd ok" }))
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/me", get(me))
        .route("/op", post(execute_operation))
        .with_state(state)
}

/// Start the HTTP server on the configured port.
pub async fn run(config: Config) -> anyhow::Result<()> {
    config.warn_if_default_secret();
    let port = config.http_port;
    let state = AppState::new(config);
    let app = router(state);

    let addr: SocketAddr = format!("0.0.0.0:{}", port).parse()?;
    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn bearer_from_headers(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get("authorization").or_else(|| headers.get("Authorization"))?;
    let s = raw.to_str().ok()?;
    let (scheme, token) = s.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    let resp = state.auth.register(payload)?;
    Ok((StatusCode::OK, Json(json!(resp))))
}

async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let resp = state.auth.login(payload)?;
    Ok((StatusCode::OK, Json(json!(resp))))
}

/// Resolve the calling principal from the bearer token. Missing token is
/// `Unauthenticated`; there is no anonymous view of this endpoint.
async fn me(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    let bearer = bearer_from_headers(&headers);
    let Some(token) = bearer else {
        return Err(AppError::unauthenticated("missing bearer token"));
    };
    let claims = state.auth.codec().verify(&token)?;
    let Some(principal) = state.auth.resolve_principal(claims.sub)? else {
        return Err(AppError::unauthenticated("unknown principal"));
    };
    Ok((StatusCode::OK, Json(json!({ "principal": principal }))))
}

/// Wire shape of an incoming operation: its name, the parsed selection tree
/// (drives cost scoring) and the operation arguments.
#[derive(Debug, Deserialize)]
struct OperationRequest {
    operation: String,
    #[serde(default)]
    selections: Vec<Selection>,
    #[serde(default)]
    args: Value,
}

async fn execute_operation(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<OperationRequest>,
) -> Result<impl IntoResponse, AppError> {
    // 1. Cost admission: uniform for all callers, before any auth work.
    let estimate = admit(state.catalog, &req.operation, &req.selections, state.config.max_query_cost)?;

    // 2. Catalog lookup. Unknown operations never reach the guard.
    let Some(requirement) = state.catalog.requirement(&req.operation) else {
        return Err(AppError::not_found(format!("unknown operation '{}'", req.operation)));
    };

    // 3 + 4. Authenticate then authorize.
    let bearer = bearer_from_headers(&headers);
    let ctx = guard(&state.auth, bearer.as_deref(), requirement)?;

    // 5. Business dispatch.
    let data = dispatch(&state, &ctx, &req.operation, req.args)?;
    let mut by_name = serde_json::Map::new();
    by_name.insert(req.operation, data);
    Ok((
        StatusCode::OK,
        Json(json!({ "data": by_name, "cost": estimate.total })),
    ))
}

#[derive(Debug, Deserialize)]
struct IdArg {
    id: Uuid,
}

#[derive(Debug, Deserialize, Default)]
struct ListArgs {
    #[serde(default)]
    filter: Option<EmployeeFilter>,
}

#[derive(Debug, Deserialize, Default)]
struct PaginatedArgs {
    #[serde(default)]
    pagination: Option<Pagination>,
    #[serde(default)]
    filter: Option<EmployeeFilter>,
}

#[derive(Debug, Deserialize)]
struct UpdateArgs {
    id: Uuid,
    input: UpdateEmployee,
}

fn parse_args<T: serde::de::DeserializeOwned>(op: &str, args: Value) -> AppResult<T> {
    // an omitted args block reads the same as an empty one
    let args = if args.is_null() { json!({}) } else { args };
    serde_json::from_value(args)
        .map_err(|e| AppError::validation(format!("bad arguments for '{}': {}", op, e)))
}

fn dispatch(state: &AppState, ctx: &RequestContext, operation: &str, args: Value) -> AppResult<Value> {
    match operation {
        "register" => {
            let input: RegisterRequest = parse_args(operation, args)?;
            Ok(json!(state.auth.register(input)?))
        }
        "login" => {
            let input: LoginRequest = parse_args(operation, args)?;
            Ok(json!(state.auth.login(input)?))
        }
        "me" => {
            // guard guarantees a principal for authenticated-only operations
            let principal = ctx.principal.as_ref().ok_or_else(|| AppError::unauthenticated("missing bearer token"))?;
            Ok(json!(principal))
        }
        "employee" => {
            let IdArg { id } = parse_args(operation, args)?;
            Ok(json!(state.employees.get(id)?))
        }
        "employees" => {
            let ListArgs { filter } = parse_args(operation, args)?;
            Ok(json!(state.employees.list(&filter.unwrap_or_default())))
        }
        "employeesPaginated" => {
            let PaginatedArgs { pagination, filter } = parse_args(operation, args)?;
            Ok(json!(state
                .employees
                .list_paginated(&pagination.unwrap_or_default(), &filter.unwrap_or_default())?))
        }
        "addEmployee" => {
            let input: CreateEmployee = parse_args(operation, args)?;
            Ok(json!(state.employees.create(input)?))
        }
        "updateEmployee" => {
            let UpdateArgs { id, input } = parse_args(operation, args)?;
            Ok(json!(state.employees.update(id, input)?))
        }
        "deleteEmployee" => {
            let IdArg { id } = parse_args(operation, args)?;
            Ok(json!(state.employees.delete(id)?))
        }
        other => Err(AppError::not_found(format!("unknown operation '{}'", other))),
    }
}
