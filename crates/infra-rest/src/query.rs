// PostgREST query-string construction

use taskboard_core::port::{Filter, RowQuery};

/// `column=op.value` pairs, one per filter
pub fn filter_pairs(filters: &[Filter]) -> Vec<(String, String)> {
    filters
        .iter()
        .map(|f| (f.column.clone(), format!("{}.{}", f.op.as_str(), f.value)))
        .collect()
}

/// Full query string for a row read
pub fn select_pairs(query: &RowQuery) -> Vec<(String, String)> {
    let columns = query.columns.clone().unwrap_or_else(|| "*".to_string());
    let mut pairs = vec![("select".to_string(), columns)];
    pairs.extend(filter_pairs(&query.filters));
    if let Some(order) = &query.order {
        let direction = if order.ascending { "asc" } else { "desc" };
        pairs.push(("order".to_string(), format!("{}.{}", order.column, direction)));
    }
    if let Some(limit) = query.limit {
        pairs.push(("limit".to_string(), limit.to_string()));
    }
    pairs
}

/// Total row count from a `Content-Range` header (`0-24/310` or `*/310`)
pub fn parse_content_range(header: &str) -> Option<u64> {
    let (_, total) = header.rsplit_once('/')?;
    total.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskboard_core::port::FilterOp;

    fn pair(k: &str, v: &str) -> (String, String) {
        (k.to_string(), v.to_string())
    }

    #[test]
    fn test_select_all_by_default() {
        assert_eq!(select_pairs(&RowQuery::new()), vec![pair("select", "*")]);
    }

    #[test]
    fn test_full_query() {
        let query = RowQuery::new()
            .select("id,name")
            .filter(Filter::eq("department_id", "4"))
            .filter(Filter::new("name", FilterOp::Like, "*ops*"))
            .order_by("created_at", false)
            .limit(25);

        assert_eq!(
            select_pairs(&query),
            vec![
                pair("select", "id,name"),
                pair("department_id", "eq.4"),
                pair("name", "like.*ops*"),
                pair("order", "created_at.desc"),
                pair("limit", "25"),
            ]
        );
    }

    #[test]
    fn test_parse_content_range() {
        assert_eq!(parse_content_range("0-24/310"), Some(310));
        assert_eq!(parse_content_range("*/0"), Some(0));
        assert_eq!(parse_content_range("0-24/*"), None);
        assert_eq!(parse_content_range("garbage"), None);
    }
}
