//! minirel - interactive shell

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use minirel::{Database, QueryResult, Row};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing_subscriber::EnvFilter;

/// How query results are printed
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputMode {
    Table,
    Json,
}

/// Interactive shell for the minirel in-memory relational engine
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "minirel", version, about, long_about = None)]
struct ShellConfig {
    /// Prompt for the first line of a statement
    #[arg(long, default_value = "minirel> ")]
    prompt: String,

    /// Load and save line history in FILE
    #[arg(long = "history", value_name = "FILE")]
    history_file: Option<PathBuf>,

    /// Result output mode
    #[arg(short, long, value_enum, ignore_case = true, default_value_t = OutputMode::Table)]
    mode: OutputMode,

    /// Log filter, e.g. debug or minirel=trace (default RUST_LOG, then warn)
    #[arg(long = "log", value_name = "FILTER")]
    log_filter: Option<String>,
}

/// Print help message
fn print_help() {
    println!(
        r#"
Commands:
  .help              Show this help message
  .quit              Exit minirel
  .tables            List all tables
  .schema [table]    Show table schema
  .mode table|json   Switch result output mode

SQL Commands (end with ';'):
  CREATE TABLE t (col TYPE [PRIMARY KEY] [UNIQUE] [REFERENCES p(col)], ...)
  CREATE INDEX name ON t(col)        DROP INDEX name
  DROP TABLE t                       SHOW TABLES
  DESCRIBE t
  INSERT INTO t [(cols)] VALUES (...), (...)
  SELECT cols|* FROM t [JOIN u ON t.a = u.b] [WHERE col op value]
  UPDATE t SET col = value, ... [WHERE col op value]
  DELETE FROM t [WHERE col op value]

Examples:
  CREATE TABLE suppliers (id INT PRIMARY KEY, name VARCHAR, email VARCHAR UNIQUE);
  INSERT INTO suppliers VALUES (1, 'Acme', 'a@x.com');
  SELECT * FROM suppliers WHERE name LIKE 'ac%';
"#
    );
}

/// Format query results as a table
fn format_results(columns: &[String], rows: &[Row]) -> String {
    if columns.is_empty() {
        return String::new();
    }

    let cell = |row: &Row, column: &str| {
        row.get(column)
            .map(|v| v.to_string())
            .unwrap_or_default()
    };

    // Calculate column widths
    let mut widths: Vec<usize> = columns.iter().map(|c| c.chars().count()).collect();
    for row in rows {
        for (i, column) in columns.iter().enumerate() {
            widths[i] = widths[i].max(cell(row, column).chars().count());
        }
    }

    let mut output = String::new();

    let separator: String = widths
        .iter()
        .map(|w| "-".repeat(*w + 2))
        .collect::<Vec<_>>()
        .join("+");
    let separator = format!("+{}+\n", separator);

    // Header
    output.push_str(&separator);
    let header: String = columns
        .iter()
        .zip(&widths)
        .map(|(c, w)| format!(" {:^width$} ", c, width = *w))
        .collect::<Vec<_>>()
        .join("|");
    output.push_str(&format!("|{}|\n", header));
    output.push_str(&separator);

    // Rows
    for row in rows {
        let row_str: String = columns
            .iter()
            .zip(&widths)
            .map(|(c, w)| format!(" {:>width$} ", cell(row, c), width = *w))
            .collect::<Vec<_>>()
            .join("|");
        output.push_str(&format!("|{}|\n", row_str));
    }

    if !rows.is_empty() {
        output.push_str(&separator);
    }

    output.push_str(&format!("{} row(s) returned\n", rows.len()));

    output
}

/// Render a successful result in the chosen mode
fn render(result: &QueryResult, mode: OutputMode) -> anyhow::Result<String> {
    match mode {
        OutputMode::Json => Ok(format!("{}\n", serde_json::to_string_pretty(result)?)),
        OutputMode::Table => Ok(match result {
            QueryResult::Rows { columns, rows } => format_results(columns, rows),
            QueryResult::Affected { message, .. } | QueryResult::Ack { message } => {
                format!("{}\n", message)
            }
        }),
    }
}

/// Execute a SQL statement and print its outcome
fn execute_sql(sql: &str, db: &mut Database, mode: OutputMode) -> anyhow::Result<()> {
    let sql = sql.trim();
    if sql.is_empty() {
        return Ok(());
    }

    match db.execute(sql) {
        Ok(result) => print!("{}", render(&result, mode)?),
        Err(e) => match mode {
            OutputMode::Json => eprintln!(
                "{}",
                serde_json::json!({ "error": e.kind().to_string(), "message": e.to_string() })
            ),
            OutputMode::Table => eprintln!("Error [{}]: {}", e.kind(), e),
        },
    }
    Ok(())
}

/// What the loop should do after a dot command
enum Flow {
    Continue,
    Quit,
}

/// Handle special dot commands
fn handle_special_command(cmd: &str, db: &mut Database, mode: &mut OutputMode) -> Flow {
    let parts: Vec<&str> = cmd.split_whitespace().collect();

    match parts.first().copied() {
        Some(".help") => print_help(),
        Some(".quit") | Some(".exit") => return Flow::Quit,
        Some(".tables") => {
            if let Err(e) = execute_sql("SHOW TABLES", db, *mode) {
                eprintln!("Error: {}", e);
            }
        }
        Some(".schema") => {
            let catalog = db.catalog();
            let names = match parts.get(1) {
                Some(name) => vec![name.to_lowercase()],
                None => catalog.list_tables(),
            };
            if names.is_empty() {
                println!("No tables found.");
            }
            for table_name in names {
                match catalog.get_table_info(&table_name) {
                    Ok(info) => println!("{}", info),
                    Err(e) => eprintln!("Error [{}]: {}", e.kind(), e),
                }
            }
        }
        Some(".mode") => match parts.get(1) {
            Some(m) => match OutputMode::from_str(m, true) {
                Ok(new_mode) => *mode = new_mode,
                Err(_) => eprintln!("Error: unknown output mode '{}' (expected table or json)", m),
            },
            None => println!("{:?}", mode),
        },
        Some(cmd) => {
            eprintln!("Unknown command: {}", cmd);
            eprintln!("Type '.help' for available commands.");
        }
        None => {}
    }
    Flow::Continue
}

/// Main REPL loop
fn run_repl(config: ShellConfig) -> anyhow::Result<()> {
    let mut db = Database::new();
    let mut mode = config.mode;
    let mut editor = DefaultEditor::new().context("failed to initialise line editor")?;

    if let Some(path) = &config.history_file {
        // A missing history file is normal on first run
        let _ = editor.load_history(path);
    }

    println!("minirel - type '.help' for help, '.quit' to exit");

    let continuation = format!("{:>width$}", "...> ", width = config.prompt.len());
    let mut input_buffer = String::new();

    loop {
        let prompt = if input_buffer.is_empty() {
            config.prompt.as_str()
        } else {
            continuation.as_str()
        };

        let line = match editor.readline(prompt) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => {
                input_buffer.clear();
                continue;
            }
            Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e).context("failed to read input"),
        };

        let trimmed = line.trim();

        // Handle special commands
        if input_buffer.is_empty() && trimmed.starts_with('.') {
            let _ = editor.add_history_entry(trimmed);
            match handle_special_command(trimmed, &mut db, &mut mode) {
                Flow::Continue => continue,
                Flow::Quit => break,
            }
        }

        // Handle empty input
        if trimmed.is_empty() {
            if !input_buffer.is_empty() {
                // Empty line in multiline mode - execute the buffer
                let sql = std::mem::take(&mut input_buffer);
                execute_sql(&sql, &mut db, mode)?;
            }
            continue;
        }

        // Accumulate input
        input_buffer.push_str(&line);
        input_buffer.push('\n');

        // Statement is complete once it ends with a semicolon
        if trimmed.ends_with(';') {
            let sql = std::mem::take(&mut input_buffer);
            let _ = editor.add_history_entry(sql.trim());
            execute_sql(&sql, &mut db, mode)?;
        }
    }

    if let Some(path) = &config.history_file {
        editor
            .save_history(path)
            .with_context(|| format!("failed to save history to {}", path.display()))?;
    }

    println!("Goodbye!");
    Ok(())
}

fn init_tracing(config: &ShellConfig) {
    let filter = match &config.log_filter {
        Some(directive) => EnvFilter::new(directive),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let config = ShellConfig::parse();
    init_tracing(&config);
    run_repl(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use minirel::Value;

    #[test]
    fn test_command_definition() {
        ShellConfig::command().debug_assert();
    }

    #[test]
    fn test_config_from_args() {
        let config = ShellConfig::try_parse_from([
            "minirel",
            "--mode",
            "JSON",
            "--history",
            "/tmp/h",
            "--log",
            "debug",
        ])
        .unwrap();
        assert_eq!(config.mode, OutputMode::Json);
        assert_eq!(config.history_file, Some(PathBuf::from("/tmp/h")));
        assert_eq!(config.log_filter.as_deref(), Some("debug"));

        let defaults = ShellConfig::try_parse_from(["minirel"]).unwrap();
        assert_eq!(defaults.prompt, "minirel> ");
        assert_eq!(defaults.mode, OutputMode::Table);
        assert_eq!(defaults.history_file, None);
        assert_eq!(defaults.log_filter, None);

        let short = ShellConfig::try_parse_from(["minirel", "-m", "json"]).unwrap();
        assert_eq!(short.mode, OutputMode::Json);
    }

    #[test]
    fn test_config_rejects_bad_args() {
        assert!(ShellConfig::try_parse_from(["minirel", "--mode", "xml"]).is_err());
        assert!(ShellConfig::try_parse_from(["minirel", "--prompt"]).is_err());
        assert!(ShellConfig::try_parse_from(["minirel", "--bogus"]).is_err());
    }

    #[test]
    fn test_format_results() {
        let mut row = Row::new();
        row.insert("id".to_string(), Value::Int(1));
        row.insert("name".to_string(), Value::from("Acme"));

        let output = format_results(&["id".to_string(), "name".to_string()], &[row]);
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines[0], "+----+------+");
        assert_eq!(lines[1], "| id | name |");
        assert_eq!(lines[3], "|  1 | Acme |");
        assert_eq!(lines[5], "1 row(s) returned");
    }

    #[test]
    fn test_render_modes() {
        let result = QueryResult::with_affected_rows(2, "2 row(s) inserted");
        assert_eq!(render(&result, OutputMode::Table).unwrap(), "2 row(s) inserted\n");

        let json = render(&result, OutputMode::Json).unwrap();
        assert!(json.contains("\"kind\": \"affected\""));
        assert!(json.contains("\"count\": 2"));
    }
}
