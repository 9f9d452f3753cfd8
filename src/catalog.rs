//! Operation catalog: one inspectable map from operation name to its declared
//! access requirement and static field weights. Built once at startup behind
//! a lazy singleton and looked up by the guard chain and the cost estimator.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::identity::{AccessRequirement, Role};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Query,
    Mutation,
}

#[derive(Debug, Clone)]
pub struct OperationSpec {
    pub name: &'static str,
    pub kind: OperationKind,
    pub requirement: AccessRequirement,
    /// Declared static weight for the operation's root field. Fields without
    /// a declared weight cost the default of 1.
    pub weight: u64,
}

#[derive(Debug, Default)]
pub struct OperationCatalog {
    operations: HashMap<&'static str, OperationSpec>,
    /// Declared weights for non-root fields, keyed by field name.
    field_weights: HashMap<&'static str, u64>,
}

pub const DEFAULT_FIELD_WEIGHT: u64 = 1;

impl OperationCatalog {
    pub fn builder() -> OperationCatalogBuilder {
        OperationCatalogBuilder::default()
    }

    pub fn get(&self, name: &str) -> Option<&OperationSpec> {
        self.operations.get(name)
    }

    pub fn requirement(&self, name: &str) -> Option<&AccessRequirement> {
        self.operations.get(name).map(|s| &s.requirement)
    }

    /// Weight for a selected field. Root operation fields use their declared
    /// operation weight; everything else falls back to the field table, then
    /// to the default of 1.
    pub fn field_weight(&self, field: &str) -> u64 {
        if let Some(op) = self.operations.get(field) {
            return op.weight;
        }
        self.field_weights.get(field).copied().unwrap_or(DEFAULT_FIELD_WEIGHT)
    }

    pub fn operations(&self) -> impl Iterator<Item = &OperationSpec> {
        self.operations.values()
    }
}

#[derive(Default)]
pub struct OperationCatalogBuilder {
    catalog: OperationCatalog,
}

impl OperationCatalogBuilder {
    pub fn operation(
        mut self,
        name: &'static str,
        kind: OperationKind,
        requirement: AccessRequirement,
        weight: u64,
    ) -> Self {
        self.catalog
            .operations
            .insert(name, OperationSpec { name, kind, requirement, weight });
        self
    }

    pub fn field_weight(mut self, field: &'static str, weight: u64) -> Self {
        self.catalog.field_weights.insert(field, weight);
        self
    }

    pub fn build(self) -> OperationCatalog {
        self.catalog
    }
}

/// The standard catalog: auth operations are public, record reads admit any
/// principal, record mutations are admin-only. List operations carry larger
/// declared weights since they fan out over many records.
fn standard_catalog() -> OperationCatalog {
    use OperationKind::{Mutation, Query};
    OperationCatalog::builder()
        .operation("register", Mutation, AccessRequirement::Public, 1)
        .operation("login", Mutation, AccessRequirement::Public, 1)
        .operation("me", Query, AccessRequirement::Authenticated, 1)
        .operation("employee", Query, AccessRequirement::Authenticated, 1)
        .operation("employees", Query, AccessRequirement::Authenticated, 5)
        .operation("employeesPaginated", Query, AccessRequirement::Authenticated, 10)
        .operation("addEmployee", Mutation, AccessRequirement::Roles(vec![Role::Admin]), 1)
        .operation("updateEmployee", Mutation, AccessRequirement::Roles(vec![Role::Admin]), 1)
        .operation("deleteEmployee", Mutation, AccessRequirement::Roles(vec![Role::Admin]), 1)
        .build()
}

static CATALOG: Lazy<OperationCatalog> = Lazy::new(standard_catalog);

/// Process-wide catalog instance. Initialised on first access; torn down only
/// at process exit.
pub fn catalog() -> &'static OperationCatalog {
    &CATALOG
}
