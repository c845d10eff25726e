// Table API Port
// Abstraction over the remote hosted data API (row reads and writes per table)

use crate::domain::Classify;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Error returned by the data API, forwarded to callers unmodified
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{}{}{}", code_prefix(.code), .message, details_suffix(.details))]
pub struct ApiError {
    /// Structured code (API error code, transport code, or HTTP status)
    pub code: Option<String>,
    pub message: String,
    pub details: Option<String>,
    pub hint: Option<String>,
    /// HTTP status, when the error came from a response
    pub status: Option<u16>,
}

impl ApiError {
    /// Uncoded error (classified by message)
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
            details: None,
            hint: None,
            status: None,
        }
    }

    pub fn with_code(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            ..Self::new(message)
        }
    }

    pub fn status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

fn code_prefix(code: &Option<String>) -> String {
    code.as_ref().map(|c| format!("[{}] ", c)).unwrap_or_default()
}

fn details_suffix(details: &Option<String>) -> String {
    details.as_ref().map(|d| format!(" ({})", d)).unwrap_or_default()
}

impl Classify for ApiError {
    fn error_code(&self) -> Option<&str> {
        self.code.as_deref()
    }

    fn error_message(&self) -> String {
        self.message.clone()
    }
}

/// Filter operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterOp {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
    Like,
}

impl FilterOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOp::Eq => "eq",
            FilterOp::Neq => "neq",
            FilterOp::Gt => "gt",
            FilterOp::Gte => "gte",
            FilterOp::Lt => "lt",
            FilterOp::Lte => "lte",
            FilterOp::Like => "like",
        }
    }
}

/// Column filter (`column op value`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    pub column: String,
    pub op: FilterOp,
    pub value: String,
}

impl Filter {
    pub fn new(column: impl Into<String>, op: FilterOp, value: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            op,
            value: value.into(),
        }
    }

    pub fn eq(column: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(column, FilterOp::Eq, value)
    }

    pub fn neq(column: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(column, FilterOp::Neq, value)
    }
}

/// Sort order for row reads
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub column: String,
    pub ascending: bool,
}

impl Order {
    /// Parse `column`, `column.asc` or `column.desc`
    pub fn parse(s: &str) -> crate::Result<Self> {
        let (column, ascending) = match s.rsplit_once('.') {
            Some((column, "asc")) => (column, true),
            Some((column, "desc")) => (column, false),
            _ => (s, true),
        };
        if column.is_empty() {
            return Err(crate::AppError::Validation(format!("Invalid order: {}", s)));
        }
        Ok(Self {
            column: column.to_string(),
            ascending,
        })
    }
}

/// Row read query
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowQuery {
    /// Column list (`None` selects all columns)
    pub columns: Option<String>,
    pub filters: Vec<Filter>,
    pub order: Option<Order>,
    pub limit: Option<usize>,
}

impl RowQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select(mut self, columns: impl Into<String>) -> Self {
        self.columns = Some(columns.into());
        self
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn order_by(mut self, column: impl Into<String>, ascending: bool) -> Self {
        self.order = Some(Order {
            column: column.into(),
            ascending,
        });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Table API trait
///
/// Implementations:
/// - RestTableApi: PostgREST-style HTTP API (infra-rest crate)
/// - MockTableApi: in-memory rows with scripted failures (tests)
#[async_trait]
pub trait TableApi: Send + Sync {
    /// Read rows matching the query
    async fn select(&self, table: &str, query: &RowQuery) -> Result<Vec<Value>, ApiError>;

    /// Insert one row (object) or many (array); returns inserted rows
    async fn insert(&self, table: &str, rows: &Value) -> Result<Vec<Value>, ApiError>;

    /// Patch rows matching all filters; returns updated rows
    async fn update(
        &self,
        table: &str,
        filters: &[Filter],
        patch: &Value,
    ) -> Result<Vec<Value>, ApiError>;

    /// Delete rows matching all filters; returns deleted rows
    async fn delete(&self, table: &str, filters: &[Filter]) -> Result<Vec<Value>, ApiError>;

    /// Count rows matching all filters
    async fn count(&self, table: &str, filters: &[Filter]) -> Result<u64, ApiError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::collections::{HashMap, VecDeque};
    use std::sync::Mutex;

    /// In-memory table API with scripted failures
    #[derive(Default)]
    pub struct MockTableApi {
        tables: Mutex<HashMap<String, Vec<Value>>>,
        failures: Mutex<VecDeque<ApiError>>,
        call_count: Mutex<usize>,
    }

    impl MockTableApi {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_rows(self, table: &str, rows: Vec<Value>) -> Self {
            self.tables.lock().unwrap().insert(table.to_string(), rows);
            self
        }

        /// Fail the next call (any method) with `err`; calls queue up in order
        pub fn fail_next(&self, err: ApiError) {
            self.failures.lock().unwrap().push_back(err);
        }

        pub fn call_count(&self) -> usize {
            *self.call_count.lock().unwrap()
        }

        pub fn rows(&self, table: &str) -> Vec<Value> {
            self.tables
                .lock()
                .unwrap()
                .get(table)
                .cloned()
                .unwrap_or_default()
        }

        fn begin_call(&self) -> Result<(), ApiError> {
            *self.call_count.lock().unwrap() += 1;
            match self.failures.lock().unwrap().pop_front() {
                Some(err) => Err(err),
                None => Ok(()),
            }
        }
    }

    fn cell(row: &Value, column: &str) -> Option<String> {
        match row.get(column)? {
            Value::String(s) => Some(s.clone()),
            Value::Null => None,
            other => Some(other.to_string()),
        }
    }

    fn matches(row: &Value, filters: &[Filter]) -> bool {
        filters.iter().all(|f| {
            let actual = cell(row, &f.column);
            let numeric = || {
                let a = actual.as_deref()?.parse::<f64>().ok()?;
                let b = f.value.parse::<f64>().ok()?;
                a.partial_cmp(&b)
            };
            use std::cmp::Ordering::*;
            match f.op {
                FilterOp::Eq => actual.as_deref() == Some(f.value.as_str()),
                FilterOp::Neq => actual.as_deref() != Some(f.value.as_str()),
                FilterOp::Gt => numeric() == Some(Greater),
                FilterOp::Gte => matches!(numeric(), Some(Greater | Equal)),
                FilterOp::Lt => numeric() == Some(Less),
                FilterOp::Lte => matches!(numeric(), Some(Less | Equal)),
                FilterOp::Like => {
                    let needle = f.value.trim_matches(|c| c == '*' || c == '%');
                    actual.map_or(false, |a| a.contains(needle))
                }
            }
        })
    }

    #[async_trait]
    impl TableApi for MockTableApi {
        async fn select(&self, table: &str, query: &RowQuery) -> Result<Vec<Value>, ApiError> {
            self.begin_call()?;
            let rows: Vec<Value> = self
                .rows(table)
                .into_iter()
                .filter(|row| matches(row, &query.filters))
                .take(query.limit.unwrap_or(usize::MAX))
                .collect();
            Ok(rows)
        }

        async fn insert(&self, table: &str, rows: &Value) -> Result<Vec<Value>, ApiError> {
            self.begin_call()?;
            let new_rows = match rows {
                Value::Array(items) => items.clone(),
                other => vec![other.clone()],
            };
            self.tables
                .lock()
                .unwrap()
                .entry(table.to_string())
                .or_default()
                .extend(new_rows.iter().cloned());
            Ok(new_rows)
        }

        async fn update(
            &self,
            table: &str,
            filters: &[Filter],
            patch: &Value,
        ) -> Result<Vec<Value>, ApiError> {
            self.begin_call()?;
            let mut tables = self.tables.lock().unwrap();
            let mut updated = Vec::new();
            for row in tables.entry(table.to_string()).or_default().iter_mut() {
                if !matches(row, filters) {
                    continue;
                }
                if let (Value::Object(target), Value::Object(fields)) = (&mut *row, patch) {
                    for (k, v) in fields {
                        target.insert(k.clone(), v.clone());
                    }
                }
                updated.push(row.clone());
            }
            Ok(updated)
        }

        async fn delete(&self, table: &str, filters: &[Filter]) -> Result<Vec<Value>, ApiError> {
            self.begin_call()?;
            let mut tables = self.tables.lock().unwrap();
            let rows = tables.entry(table.to_string()).or_default();
            let (deleted, kept): (Vec<Value>, Vec<Value>) =
                rows.drain(..).partition(|row| matches(row, filters));
            *rows = kept;
            Ok(deleted)
        }

        async fn count(&self, table: &str, filters: &[Filter]) -> Result<u64, ApiError> {
            self.begin_call()?;
            let count = self
                .rows(table)
                .iter()
                .filter(|row| matches(row, filters))
                .count();
            Ok(count as u64)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mocks::MockTableApi;
    use super::*;
    use crate::domain::ErrorClass;
    use serde_json::json;

    #[test]
    fn test_api_error_display() {
        let err = ApiError::with_code("23505", "duplicate key").details("Key (id)=(1) exists");
        assert_eq!(err.to_string(), "[23505] duplicate key (Key (id)=(1) exists)");
        assert_eq!(ApiError::new("Failed to fetch").to_string(), "Failed to fetch");
    }

    #[test]
    fn test_api_error_classification() {
        assert_eq!(ApiError::with_code("503", "unavailable").classify(), ErrorClass::ServerUnavailable);
        assert_eq!(ApiError::with_code("400", "bad request").classify(), ErrorClass::Other);
        assert_eq!(ApiError::new("NetworkError when attempting to fetch").classify(), ErrorClass::Transport);
    }

    #[test]
    fn test_order_parse() {
        assert_eq!(Order::parse("created_at.desc").unwrap(), Order { column: "created_at".into(), ascending: false });
        assert_eq!(Order::parse("name").unwrap(), Order { column: "name".into(), ascending: true });
        assert!(Order::parse(".asc").is_err());
    }

    #[tokio::test]
    async fn test_mock_select_filters_and_limit() {
        let api = MockTableApi::new().with_rows(
            "tasks",
            vec![
                json!({"id": 1, "status": "open"}),
                json!({"id": 2, "status": "done"}),
                json!({"id": 3, "status": "open"}),
            ],
        );

        let query = RowQuery::new().filter(Filter::eq("status", "open")).limit(1);
        let rows = api.select("tasks", &query).await.unwrap();
        assert_eq!(rows, vec![json!({"id": 1, "status": "open"})]);

        let gt = RowQuery::new().filter(Filter::new("id", FilterOp::Gt, "1"));
        assert_eq!(api.select("tasks", &gt).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_mock_write_paths() {
        let api = MockTableApi::new();
        api.insert("projects", &json!([{"id": 1, "name": "a"}, {"id": 2, "name": "b"}]))
            .await
            .unwrap();

        let updated = api
            .update("projects", &[Filter::eq("id", "2")], &json!({"name": "renamed"}))
            .await
            .unwrap();
        assert_eq!(updated, vec![json!({"id": 2, "name": "renamed"})]);

        let deleted = api.delete("projects", &[Filter::eq("id", "1")]).await.unwrap();
        assert_eq!(deleted.len(), 1);
        assert_eq!(api.count("projects", &[]).await.unwrap(), 1);
        assert_eq!(api.call_count(), 4);
    }

    #[tokio::test]
    async fn test_mock_scripted_failure() {
        let api = MockTableApi::new();
        api.fail_next(ApiError::with_code("503", "unavailable"));

        assert!(api.count("users", &[]).await.is_err());
        assert_eq!(api.count("users", &[]).await.unwrap(), 0);
    }
}
