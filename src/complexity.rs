//! Query-cost admission. Scores a parsed operation against the catalog's
//! static weight model and rejects it before any authentication, business
//! logic or store access when the score exceeds the configured maximum.

use serde::{Deserialize, Serialize};

use crate::catalog::OperationCatalog;
use crate::error::{AppError, AppResult};

/// One selected field with its nested sub-selections. This is the post-parse
/// shape of an incoming operation body; the estimator walks it recursively.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Selection {
    pub field: String,
    #[serde(default)]
    pub selections: Vec<Selection>,
}

impl Selection {
    pub fn leaf<S: Into<String>>(field: S) -> Self {
        Self { field: field.into(), selections: Vec::new() }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CostEstimate {
    pub operation: String,
    pub total: u64,
    /// Per-field contributions in walk order, for caller diagnostics.
    pub breakdown: Vec<(String, u64)>,
    pub limit: u64,
}

/// Score an operation: the root field's declared weight plus the weight of
/// every selected field, recursively. Undeclared fields cost 1.
pub fn estimate(catalog: &OperationCatalog, operation: &str, selections: &[Selection]) -> CostEstimate {
    let mut breakdown = Vec::new();
    let root = catalog.field_weight(operation);
    breakdown.push((operation.to_string(), root));
    let mut total = root;
    for sel in selections {
        total = total.saturating_add(walk(catalog, sel, operation, &mut breakdown));
    }
    CostEstimate { operation: operation.to_string(), total, breakdown, limit: 0 }
}

fn walk(
    catalog: &OperationCatalog,
    sel: &Selection,
    parent_path: &str,
    breakdown: &mut Vec<(String, u64)>,
) -> u64 {
    let path = format!("{}.{}", parent_path, sel.field);
    let weight = catalog.field_weight(&sel.field);
    breakdown.push((path.clone(), weight));
    let mut total = weight;
    for child in &sel.selections {
        total = total.saturating_add(walk(catalog, child, &path, breakdown));
    }
    total
}

/// Admission check: estimate, log the score either way, reject iff the score
/// exceeds the limit. A score exactly at the limit is admitted.
pub fn admit(
    catalog: &OperationCatalog,
    operation: &str,
    selections: &[Selection],
    limit: u64,
) -> AppResult<CostEstimate> {
    let mut est = estimate(catalog, operation, selections);
    est.limit = limit;
    tracing::info!(
        operation = %est.operation,
        cost = est.total,
        limit,
        admitted = est.total <= limit,
        "query cost estimate"
    );
    if est.total > limit {
        return Err(AppError::cost_exceeded(est.total, limit));
    }
    Ok(est)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{OperationCatalog, OperationKind};
    use crate::identity::AccessRequirement;

    fn test_catalog() -> OperationCatalog {
        OperationCatalog::builder()
            .operation("employees", OperationKind::Query, AccessRequirement::Authenticated, 5)
            .field_weight("attendance", 3)
            .build()
    }

    #[test]
    fn additive_and_recursive() {
        let c = test_catalog();
        // employees(5) + name(1) + attendance(3) + attendance.monday(1)
        let sels = vec![
            Selection::leaf("name"),
            Selection {
                field: "attendance".into(),
                selections: vec![Selection::leaf("monday")],
            },
        ];
        let est = estimate(&c, "employees", &sels);
        assert_eq!(est.total, 10);
        assert_eq!(est.breakdown.len(), 4);
        assert_eq!(est.breakdown[0], ("employees".to_string(), 5));
        assert_eq!(est.breakdown[2], ("employees.attendance".to_string(), 3));
    }

    #[test]
    fn unknown_operation_costs_default_weight() {
        let c = test_catalog();
        let est = estimate(&c, "whoami", &[]);
        assert_eq!(est.total, 1);
    }

    #[test]
    fn exactly_at_limit_is_admitted() {
        let c = test_catalog();
        let sels: Vec<Selection> = (0..5).map(|i| Selection::leaf(format!("f{i}"))).collect();
        // 5 (root) + 5 leaves = 10
        let est = admit(&c, "employees", &sels, 10).unwrap();
        assert_eq!(est.total, 10);
        assert_eq!(est.limit, 10);
    }

    #[test]
    fn one_over_limit_is_rejected_with_exact_score() {
        let c = test_catalog();
        let sels: Vec<Selection> = (0..6).map(|i| Selection::leaf(format!("f{i}"))).collect();
        let err = admit(&c, "employees", &sels, 10).unwrap_err();
        match err {
            AppError::CostExceeded { cost, limit, .. } => {
                assert_eq!(cost, 11);
                assert_eq!(limit, 10);
            }
            other => panic!("expected CostExceeded, got {other}"),
        }
    }

    #[test]
    fn deep_nesting_sums_every_level() {
        let c = test_catalog();
        let sel = Selection {
            field: "a".into(),
            selections: vec![Selection {
                field: "b".into(),
                selections: vec![Selection::leaf("c")],
            }],
        };
        let est = estimate(&c, "employees", &[sel]);
        // 5 + 1 + 1 + 1
        assert_eq!(est.total, 8);
    }
}
