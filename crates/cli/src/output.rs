// Output rendering - JSON rows as terminal tables
use serde_json::Value;
use tabled::builder::Builder;

/// Render rows as a table. Columns follow first appearance across rows.
pub fn rows_table(rows: &[Value]) -> String {
    let mut columns: Vec<String> = Vec::new();
    for row in rows {
        if let Value::Object(map) = row {
            for key in map.keys() {
                if !columns.iter().any(|c| c == key) {
                    columns.push(key.clone());
                }
            }
        }
    }

    let mut builder = Builder::default();
    if columns.is_empty() {
        // Scalars or arrays: single "value" column
        builder.push_record(vec!["value".to_string()]);
        for row in rows {
            builder.push_record(vec![cell(row)]);
        }
        return builder.build().to_string();
    }

    builder.push_record(columns.clone());
    for row in rows {
        let record: Vec<String> = columns
            .iter()
            .map(|column| row.get(column).map(cell).unwrap_or_default())
            .collect();
        builder.push_record(record);
    }
    builder.build().to_string()
}

/// Strings without quotes, null as empty
fn cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_cell_formatting() {
        assert_eq!(cell(&json!(null)), "");
        assert_eq!(cell(&json!("todo")), "todo");
        assert_eq!(cell(&json!(3)), "3");
        assert_eq!(cell(&json!({"a": 1})), r#"{"a":1}"#);
    }

    #[test]
    fn test_columns_union_in_first_seen_order() {
        let rendered = rows_table(&[
            json!({"id": 1, "title": "Write docs"}),
            json!({"id": 2, "assignee": "kim"}),
        ]);
        let header = rendered
            .lines()
            .find(|line| line.contains("id"))
            .unwrap()
            .to_string();
        let id = header.find("id").unwrap();
        let title = header.find("title").unwrap();
        let assignee = header.find("assignee").unwrap();
        assert!(id < title && title < assignee);
        assert!(rendered.contains("Write docs"));
        assert!(rendered.contains("kim"));
    }
}
