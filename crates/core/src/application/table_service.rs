// Table Service - typed table access funneled through the request queue

use crate::application::RequestQueue;
use crate::domain::Table;
use crate::error::Result;
use crate::port::{Filter, RowQuery, TableApi};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

/// Row reads and writes against the data API.
///
/// Every call becomes one queued request: it waits for a slot, is retried on
/// transient failures, and surfaces fatal `ApiError`s unchanged.
pub struct TableService {
    queue: Arc<RequestQueue>,
    api: Arc<dyn TableApi>,
}

impl TableService {
    pub fn new(queue: Arc<RequestQueue>, api: Arc<dyn TableApi>) -> Self {
        Self { queue, api }
    }

    pub fn queue(&self) -> &Arc<RequestQueue> {
        &self.queue
    }

    /// Read rows
    pub async fn select(&self, table: Table, query: RowQuery) -> Result<Vec<Value>> {
        let api = Arc::clone(&self.api);
        let handle = self
            .queue
            .enqueue_with_id(format!("select:{}", table), move || {
                let api = Arc::clone(&api);
                let query = query.clone();
                async move { api.select(table.as_str(), &query).await }
            });
        Ok(handle.await?)
    }

    /// Read rows and deserialize each into `T`
    pub async fn select_as<T: DeserializeOwned>(
        &self,
        table: Table,
        query: RowQuery,
    ) -> Result<Vec<T>> {
        let rows = self.select(table, query).await?;
        rows.into_iter()
            .map(|row| serde_json::from_value(row).map_err(Into::into))
            .collect()
    }

    /// Insert one row (object) or many (array)
    pub async fn insert(&self, table: Table, rows: Value) -> Result<Vec<Value>> {
        if !(rows.is_object() || rows.is_array()) {
            return Err(crate::AppError::Validation(
                "Insert payload must be an object or an array of objects".to_string(),
            ));
        }
        let api = Arc::clone(&self.api);
        let rows = Arc::new(rows);
        let handle = self
            .queue
            .enqueue_with_id(format!("insert:{}", table), move || {
                let api = Arc::clone(&api);
                let rows = Arc::clone(&rows);
                async move { api.insert(table.as_str(), &rows).await }
            });
        Ok(handle.await?)
    }

    /// Patch rows matching all filters. At least one filter is required.
    pub async fn update(&self, table: Table, filters: Vec<Filter>, patch: Value) -> Result<Vec<Value>> {
        require_filters("update", &filters)?;
        if !patch.is_object() {
            return Err(crate::AppError::Validation(
                "Update patch must be an object".to_string(),
            ));
        }
        let api = Arc::clone(&self.api);
        let filters = Arc::new(filters);
        let patch = Arc::new(patch);
        let handle = self
            .queue
            .enqueue_with_id(format!("update:{}", table), move || {
                let api = Arc::clone(&api);
                let filters = Arc::clone(&filters);
                let patch = Arc::clone(&patch);
                async move { api.update(table.as_str(), &filters, &patch).await }
            });
        Ok(handle.await?)
    }

    /// Delete rows matching all filters. At least one filter is required.
    pub async fn delete(&self, table: Table, filters: Vec<Filter>) -> Result<Vec<Value>> {
        require_filters("delete", &filters)?;
        let api = Arc::clone(&self.api);
        let filters = Arc::new(filters);
        let handle = self
            .queue
            .enqueue_with_id(format!("delete:{}", table), move || {
                let api = Arc::clone(&api);
                let filters = Arc::clone(&filters);
                async move { api.delete(table.as_str(), &filters).await }
            });
        Ok(handle.await?)
    }

    /// Count rows matching all filters
    pub async fn count(&self, table: Table, filters: Vec<Filter>) -> Result<u64> {
        let api = Arc::clone(&self.api);
        let filters = Arc::new(filters);
        let handle = self
            .queue
            .enqueue_with_id(format!("count:{}", table), move || {
                let api = Arc::clone(&api);
                let filters = Arc::clone(&filters);
                async move { api.count(table.as_str(), &filters).await }
            });
        Ok(handle.await?)
    }
}

/// Unfiltered writes would touch every row
fn require_filters(verb: &str, filters: &[Filter]) -> Result<()> {
    if filters.is_empty() {
        return Err(crate::AppError::Validation(format!(
            "Refusing to {} without a filter",
            verb
        )));
    }
    Ok(())
}
