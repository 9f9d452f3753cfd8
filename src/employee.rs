//! Employee records: the business data the guard stack fronts. In-memory
//! store with create/get/list/paginated-list/update/delete, name and class
//! filters and stable sorting. Reads are open to any authenticated principal;
//! mutations are admin-only (enforced by the catalog, not here).

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Employee {
    pub id: Uuid,
    pub name: String,
    pub age: u32,
    pub class: String,
    #[serde(default)]
    pub subjects: Vec<String>,
    #[serde(default)]
    pub attendance: HashMap<String, bool>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateEmployee {
    pub name: String,
    pub age: u32,
    pub class: String,
    #[serde(default)]
    pub subjects: Vec<String>,
    #[serde(default)]
    pub attendance: HashMap<String, bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateEmployee {
    pub name: Option<String>,
    pub age: Option<u32>,
    pub class: Option<String>,
    pub subjects: Option<Vec<String>>,
    pub attendance: Option<HashMap<String, bool>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EmployeeFilter {
    /// Case-insensitive substring match on name.
    pub name: Option<String>,
    /// Exact class match.
    pub class: Option<String>,
    pub min_age: Option<u32>,
    pub max_age: Option<u32>,
    /// Subject membership.
    pub subject: Option<String>,
}

impl EmployeeFilter {
    fn matches(&self, e: &Employee) -> bool {
        if let Some(name) = &self.name {
            if !e.name.to_lowercase().contains(&name.to_lowercase()) {
                return false;
            }
        }
        if let Some(class) = &self.class {
            if &e.class != class {
                return false;
            }
        }
        if let Some(min) = self.min_age {
            if e.age < min {
                return false;
            }
        }
        if let Some(max) = self.max_age {
            if e.age > max {
                return false;
            }
        }
        if let Some(subject) = &self.subject {
            if !e.subjects.iter().any(|s| s == subject) {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SortOrder {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Pagination {
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default)]
    pub offset: usize,
    #[serde(default = "default_sort_by")]
    pub sort_by: String,
    #[serde(default = "default_sort_order")]
    pub sort_order: SortOrder,
}

fn default_limit() -> usize {
    10
}

fn default_sort_by() -> String {
    "created_at".into()
}

fn default_sort_order() -> SortOrder {
    SortOrder::Desc
}

impl Default for Pagination {
    fn default() -> Self {
        Self { limit: 10, offset: 0, sort_by: default_sort_by(), sort_order: SortOrder::Desc }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PaginatedEmployees {
    pub items: Vec<Employee>,
    pub total: usize,
    pub has_more: bool,
    pub current_page: usize,
    pub total_pages: usize,
}

#[derive(Default)]
pub struct EmployeeStore {
    records: RwLock<HashMap<Uuid, Employee>>,
}

impl EmployeeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&self, input: CreateEmployee) -> AppResult<Employee> {
        if input.name.trim().is_empty() {
            return Err(AppError::validation("employee name must not be empty"));
        }
        let now = Utc::now();
        let employee = Employee {
            id: Uuid::new_v4(),
            name: input.name,
            age: input.age,
            class: input.class,
            subjects: input.subjects,
            attendance: input.attendance,
            created_at: now,
            updated_at: now,
        };
        self.records.write().insert(employee.id, employee.clone());
        Ok(employee)
    }

    pub fn get(&self, id: Uuid) -> AppResult<Employee> {
        self.records
            .read()
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::not_found(format!("Employee with ID {} not found", id)))
    }

    pub fn list(&self, filter: &EmployeeFilter) -> Vec<Employee> {
        let mut out: Vec<Employee> =
            self.records.read().values().filter(|e| filter.matches(e)).cloned().collect();
        // stable default ordering for bare list results
        out.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        out
    }

    pub fn list_paginated(
        &self,
        pagination: &Pagination,
        filter: &EmployeeFilter,
    ) -> AppResult<PaginatedEmployees> {
        if pagination.limit == 0 || pagination.limit > 100 {
            return Err(AppError::validation("limit must be between 1 and 100"));
        }
        let mut all: Vec<Employee> =
            self.records.read().values().filter(|e| filter.matches(e)).cloned().collect();
        sort_employees(&mut all, &pagination.sort_by, pagination.sort_order)?;

        let total = all.len();
        let items: Vec<Employee> =
            all.into_iter().skip(pagination.offset).take(pagination.limit).collect();
        let has_more = pagination.offset + pagination.limit < total;
        let current_page = pagination.offset / pagination.limit + 1;
        let total_pages = total.div_ceil(pagination.limit);
        Ok(PaginatedEmployees { items, total, has_more, current_page, total_pages })
    }

    pub fn update(&self, id: Uuid, input: UpdateEmployee) -> AppResult<Employee> {
        let mut map = self.records.write();
        let Some(e) = map.get_mut(&id) else {
            return Err(AppError::not_found(format!("Employee with ID {} not found", id)));
        };
        if let Some(name) = input.name {
            if name.trim().is_empty() {
                return Err(AppError::validation("employee name must not be empty"));
            }
            e.name = name;
        }
        if let Some(age) = input.age {
            e.age = age;
        }
        if let Some(class) = input.class {
            e.class = class;
        }
        if let Some(subjects) = input.subjects {
            e.subjects = subjects;
        }
        if let Some(attendance) = input.attendance {
            e.attendance = attendance;
        }
        e.updated_at = Utc::now();
        Ok(e.clone())
    }

    pub fn delete(&self, id: Uuid) -> AppResult<Employee> {
        self.records
            .write()
            .remove(&id)
            .ok_or_else(|| AppError::not_found(format!("Employee with ID {} not found", id)))
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

fn sort_employees(items: &mut [Employee], sort_by: &str, order: SortOrder) -> AppResult<()> {
    match sort_by {
        "name" => items.sort_by(|a, b| a.name.cmp(&b.name)),
        "age" => items.sort_by(|a, b| a.age.cmp(&b.age)),
        "class" => items.sort_by(|a, b| a.class.cmp(&b.class)),
        "created_at" => items.sort_by(|a, b| a.created_at.cmp(&b.created_at)),
        "updated_at" => items.sort_by(|a, b| a.updated_at.cmp(&b.updated_at)),
        other => return Err(AppError::validation(format!("cannot sort by '{}'", other))),
    }
    if order == SortOrder::Desc {
        items.reverse();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seed(store: &EmployeeStore, name: &str, age: u32, class: &str, subjects: &[&str]) -> Employee {
        store
            .create(CreateEmployee {
                name: name.into(),
                age,
                class: class.into(),
                subjects: subjects.iter().map(|s| s.to_string()).collect(),
                attendance: HashMap::new(),
            })
            .unwrap()
    }

    #[test]
    fn create_get_update_delete() {
        let store = EmployeeStore::new();
        let e = seed(&store, "John Doe", 30, "A1", &["maths"]);
        assert_eq!(store.get(e.id).unwrap().name, "John Doe");

        let updated = store
            .update(e.id, UpdateEmployee { age: Some(31), ..Default::default() })
            .unwrap();
        assert_eq!(updated.age, 31);
        assert!(updated.updated_at >= updated.created_at);

        assert_eq!(store.len(), 1);
        let removed = store.delete(e.id).unwrap();
        assert_eq!(removed.id, e.id);
        assert!(store.is_empty());
        assert!(matches!(store.get(e.id).unwrap_err(), AppError::NotFound { .. }));
    }

    #[test]
    fn missing_id_is_not_found() {
        let store = EmployeeStore::new();
        let id = Uuid::new_v4();
        assert!(matches!(store.get(id).unwrap_err(), AppError::NotFound { .. }));
        assert!(matches!(store.delete(id).unwrap_err(), AppError::NotFound { .. }));
        assert!(matches!(
            store.update(id, UpdateEmployee::default()).unwrap_err(),
            AppError::NotFound { .. }
        ));
    }

    #[test]
    fn filters_compose() {
        let store = EmployeeStore::new();
        seed(&store, "Alice Smith", 25, "A1", &["maths", "physics"]);
        seed(&store, "Bob Jones", 35, "B2", &["history"]);
        seed(&store, "alison brown", 28, "A1", &["physics"]);

        let by_name = store.list(&EmployeeFilter { name: Some("ali".into()), ..Default::default() });
        assert_eq!(by_name.len(), 2); // case-insensitive substring

        let narrowed = store.list(&EmployeeFilter {
            name: Some("ali".into()),
            class: Some("A1".into()),
            min_age: Some(26),
            ..Default::default()
        });
        assert_eq!(narrowed.len(), 1);
        assert_eq!(narrowed[0].name, "alison brown");

        let by_subject =
            store.list(&EmployeeFilter { subject: Some("physics".into()), ..Default::default() });
        assert_eq!(by_subject.len(), 2);

        let by_age = store.list(&EmployeeFilter { max_age: Some(30), ..Default::default() });
        assert_eq!(by_age.len(), 2);
    }

    #[test]
    fn pagination_arithmetic() {
        let store = EmployeeStore::new();
        for i in 0..7 {
            seed(&store, &format!("emp{i}"), 20 + i, "A1", &[]);
        }
        let page = store
            .list_paginated(
                &Pagination { limit: 3, offset: 3, sort_by: "age".into(), sort_order: SortOrder::Asc },
                &EmployeeFilter::default(),
            )
            .unwrap();
        assert_eq!(page.total, 7);
        assert_eq!(page.items.len(), 3);
        assert_eq!(page.items[0].age, 23);
        assert!(page.has_more);
        assert_eq!(page.current_page, 2);
        assert_eq!(page.total_pages, 3);

        let last = store
            .list_paginated(
                &Pagination { limit: 3, offset: 6, sort_by: "age".into(), sort_order: SortOrder::Asc },
                &EmployeeFilter::default(),
            )
            .unwrap();
        assert_eq!(last.items.len(), 1);
        assert!(!last.has_more);
    }

    #[test]
    fn pagination_rejects_bad_limit_and_sort_key() {
        let store = EmployeeStore::new();
        let bad_limit = store.list_paginated(
            &Pagination { limit: 0, ..Default::default() },
            &EmployeeFilter::default(),
        );
        assert!(matches!(bad_limit.unwrap_err(), AppError::Validation { .. }));
        let bad_sort = store.list_paginated(
            &Pagination { sort_by: "salary".into(), ..Default::default() },
            &EmployeeFilter::default(),
        );
        assert!(matches!(bad_sort.unwrap_err(), AppError::Validation { .. }));
    }

    #[test]
    fn desc_sort_reverses() {
        let store = EmployeeStore::new();
        seed(&store, "young", 20, "A", &[]);
        seed(&store, "old", 60, "A", &[]);
        let page = store
            .list_paginated(
                &Pagination { limit: 10, offset: 0, sort_by: "age".into(), sort_order: SortOrder::Desc },
                &EmployeeFilter::default(),
            )
            .unwrap();
        assert_eq!(page.items[0].name, "old");
    }
}
