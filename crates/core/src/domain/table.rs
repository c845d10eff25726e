// Table Domain Model

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Tables exposed by the data API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Users,
    Departments,
    Projects,
    Tasks,
    RecurringTasks,
}

impl Table {
    pub const ALL: [Table; 5] = [
        Table::Users,
        Table::Departments,
        Table::Projects,
        Table::Tasks,
        Table::RecurringTasks,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Table::Users => "users",
            Table::Departments => "departments",
            Table::Projects => "projects",
            Table::Tasks => "tasks",
            Table::RecurringTasks => "recurring_tasks",
        }
    }
}

impl std::fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Table {
    type Err = crate::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        Table::ALL
            .into_iter()
            .find(|t| t.as_str() == normalized)
            .ok_or_else(|| crate::AppError::Validation(format!("Unknown table: {}", s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_table_names() {
        assert_eq!("projects".parse::<Table>().unwrap(), Table::Projects);
        assert_eq!("Recurring-Tasks".parse::<Table>().unwrap(), Table::RecurringTasks);
        assert!("invoices".parse::<Table>().is_err());
    }

    #[test]
    fn test_display_matches_api_name() {
        for table in Table::ALL {
            assert_eq!(table.to_string(), table.as_str());
        }
    }
}
