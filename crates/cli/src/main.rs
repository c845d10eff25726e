//! Taskboard CLI - table access through the shared request queue
//! Composition root: wires config, the REST adapter and the queue

mod config;
mod logging;
mod output;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use futures::future::join_all;
use serde_json::Value;
use std::sync::Arc;
use tabled::{Table as TextTable, Tabled};
use tracing::{debug, info};

use config::AppConfig;
use taskboard_core::domain::Table;
use taskboard_core::port::{Filter, Order, RowQuery, UuidProvider};
use taskboard_core::{RequestQueue, TableService};
use taskboard_infra_rest::RestTableApi;

#[derive(Parser)]
#[command(name = "taskboard")]
#[command(about = "Taskboard data API client", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Data API base URL
    #[arg(long, global = true, env = "TASKBOARD_API_URL")]
    api_url: Option<String>,

    /// Print raw JSON instead of tables
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List rows
    List {
        /// Table name (users, departments, projects, tasks, recurring_tasks)
        table: Table,

        /// Equality filter, repeatable (column=value)
        #[arg(long = "eq", value_parser = parse_eq)]
        filters: Vec<Filter>,

        /// Sort order (column or column.desc)
        #[arg(long, value_parser = parse_order)]
        order: Option<Order>,

        /// Maximum rows to return
        #[arg(short, long)]
        limit: Option<usize>,

        /// Column list (comma separated)
        #[arg(long)]
        select: Option<String>,
    },

    /// Count rows
    Count {
        table: Table,

        #[arg(long = "eq", value_parser = parse_eq)]
        filters: Vec<Filter>,
    },

    /// Insert a row (object) or rows (array)
    Insert {
        table: Table,

        /// Row data as JSON string
        #[arg(long)]
        data: String,
    },

    /// Update rows matching the filters
    Update {
        table: Table,

        #[arg(long = "eq", value_parser = parse_eq, required = true)]
        filters: Vec<Filter>,

        /// Patch as JSON object
        #[arg(long)]
        data: String,
    },

    /// Delete rows matching the filters
    Delete {
        table: Table,

        #[arg(long = "eq", value_parser = parse_eq, required = true)]
        filters: Vec<Filter>,
    },

    /// Row counts for every table
    Summary,
}

#[derive(Tabled)]
struct SummaryRow {
    #[tabled(rename = "Table")]
    table: String,
    #[tabled(rename = "Rows")]
    rows: String,
}

fn parse_eq(s: &str) -> std::result::Result<Filter, String> {
    match s.split_once('=') {
        Some((column, value)) if !column.trim().is_empty() => {
            Ok(Filter::eq(column.trim(), value))
        }
        _ => Err(format!("expected column=value, got '{}'", s)),
    }
}

fn parse_order(s: &str) -> std::result::Result<Order, String> {
    Order::parse(s).map_err(|e| e.to_string())
}

fn parse_json(data: &str) -> Result<Value> {
    serde_json::from_str(data).context("--data is not valid JSON")
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 1. Initialize logging
    logging::init_logging();

    // 2. Load configuration
    let config = AppConfig::from_env(cli.api_url.clone())?;
    debug!(api_url = %config.rest.base_url, "Configuration loaded");

    // 3. Setup dependencies (DI wiring)
    let api = Arc::new(RestTableApi::new(config.rest.clone())?);
    let queue = Arc::new(RequestQueue::new(config.queue.clone(), Arc::new(UuidProvider))?);
    let service = TableService::new(Arc::clone(&queue), api);

    // 4. Execute command
    let result = run(&service, cli.command, cli.json).await;

    let stats = queue.stats();
    info!(
        waiting = stats.waiting_count,
        running = stats.running_count,
        max_concurrent = stats.max_concurrent,
        "Request queue at shutdown"
    );

    result
}

async fn run(service: &TableService, command: Commands, json: bool) -> Result<()> {
    match command {
        Commands::List {
            table,
            filters,
            order,
            limit,
            select,
        } => {
            let query = RowQuery {
                columns: select,
                filters,
                order,
                limit,
            };
            let rows = service.select(table, query).await?;
            print_rows(&format!("{} ({} rows)", table, rows.len()), &rows, json)?;
        }

        Commands::Count { table, filters } => {
            let count = service.count(table, filters).await?;
            if json {
                println!("{}", serde_json::json!({ "table": table, "count": count }));
            } else {
                println!("{} {}", format!("{}:", table).cyan().bold(), count);
            }
        }

        Commands::Insert { table, data } => {
            let rows = service.insert(table, parse_json(&data)?).await?;
            print_rows(&format!("✓ Inserted {} rows into {}", rows.len(), table), &rows, json)?;
        }

        Commands::Update {
            table,
            filters,
            data,
        } => {
            let rows = service.update(table, filters, parse_json(&data)?).await?;
            print_rows(&format!("✓ Updated {} rows in {}", rows.len(), table), &rows, json)?;
        }

        Commands::Delete { table, filters } => {
            let rows = service.delete(table, filters).await?;
            print_rows(&format!("✓ Deleted {} rows from {}", rows.len(), table), &rows, json)?;
        }

        Commands::Summary => {
            // All counts are submitted at once; the queue bounds how many run
            let counts = join_all(
                Table::ALL
                    .into_iter()
                    .map(|table| async move { (table, service.count(table, vec![]).await) }),
            )
            .await;

            if json {
                let summary: serde_json::Map<String, Value> = counts
                    .iter()
                    .map(|(table, result)| {
                        let value = match result {
                            Ok(count) => Value::from(*count),
                            Err(e) => serde_json::json!({ "error": e.to_string() }),
                        };
                        (table.to_string(), value)
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                println!("{}", "Taskboard Summary".cyan().bold());
                let rows: Vec<SummaryRow> = counts
                    .iter()
                    .map(|(table, result)| SummaryRow {
                        table: table.to_string(),
                        rows: match result {
                            Ok(count) => count.to_string(),
                            Err(e) => format!("error: {}", e).red().to_string(),
                        },
                    })
                    .collect();
                println!("{}", TextTable::new(rows));
            }
        }
    }

    Ok(())
}

fn print_rows(heading: &str, rows: &[Value], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(rows)?);
        return Ok(());
    }
    if heading.starts_with('✓') {
        println!("{}", heading.green().bold());
    } else {
        println!("{}", heading.cyan().bold());
    }
    if !rows.is_empty() {
        println!("{}", output::rows_table(rows));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_eq() {
        assert_eq!(parse_eq("status=done").unwrap(), Filter::eq("status", "done"));
        assert_eq!(parse_eq("note=a=b").unwrap(), Filter::eq("note", "a=b"));
        assert!(parse_eq("status").is_err());
        assert!(parse_eq("=done").is_err());
    }

    #[test]
    fn test_list_arguments() {
        let cli = Cli::try_parse_from([
            "taskboard", "list", "recurring-tasks", "--eq", "active=true", "--order",
            "created_at.desc", "--limit", "5",
        ])
        .unwrap();
        match cli.command {
            Commands::List {
                table,
                filters,
                order,
                limit,
                select,
            } => {
                assert_eq!(table, Table::RecurringTasks);
                assert_eq!(filters, vec![Filter::eq("active", "true")]);
                assert_eq!(order, Some(Order::parse("created_at.desc").unwrap()));
                assert_eq!(limit, Some(5));
                assert_eq!(select, None);
            }
            _ => panic!("expected list"),
        }
    }

    #[test]
    fn test_destructive_commands_require_filter() {
        assert!(Cli::try_parse_from(["taskboard", "delete", "tasks"]).is_err());
        assert!(Cli::try_parse_from(["taskboard", "update", "tasks", "--data", "{}"]).is_err());
        assert!(Cli::try_parse_from(["taskboard", "list", "widgets"]).is_err());
    }
}
