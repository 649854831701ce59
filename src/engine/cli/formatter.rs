//! CLI Output Formatting Module
//! Provides consistent, colorized output for terminal UX

use colored::Colorize;

use crate::engine::records::{EntityKind, Record};

pub struct CliFormatter;

impl CliFormatter {
    /// Print a success message
    pub fn success(message: &str) {
        println!("{} {}", "✓".green().bold(), message);
    }

    /// Print an error message
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red().bold(), message);
    }

    /// Print a warning message
    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow().bold(), message);
    }

    /// Print a section header
    pub fn header(title: &str) {
        println!("\n{}", title.bright_cyan().bold());
        println!("{}", "─".repeat(title.chars().count()).bright_black());
    }

    /// Print a key-value pair
    pub fn kv(key: &str, value: &str) {
        println!("  {}: {}", key.bright_white().bold(), value);
    }

    /// Print a list item
    pub fn item(text: &str) {
        println!("  {} {}", "•".bright_black(), text);
    }

    /// Print the rows of an entity as a grid
    pub fn records(kind: EntityKind, rows: &[Record]) {
        let (columns, cells) = record_grid(kind, rows);
        let widths = column_widths(&columns, &cells);

        let header = columns
            .iter()
            .zip(&widths)
            .map(|(c, w)| format!("{:<w$}", c, w = *w).bright_white().bold().to_string())
            .collect::<Vec<_>>()
            .join(" │ ");
        let rule_len = widths.iter().sum::<usize>() + 3 * widths.len().saturating_sub(1);
        println!("  {}", header);
        println!("  {}", "─".repeat(rule_len).bright_black());

        for row in &cells {
            println!("  {}", pad_row(row, &widths).join(" │ "));
        }
        if rows.is_empty() {
            println!("  {}", "(no rows)".bright_black());
        }
    }
}

/// Column labels and display text for every row, id first
pub fn record_grid(kind: EntityKind, rows: &[Record]) -> (Vec<String>, Vec<Vec<String>>) {
    let schema = kind.schema();
    let mut columns = vec!["ID".to_string()];
    columns.extend(schema.fields.iter().map(|f| f.label.to_string()));
    columns.extend(schema.lookups.iter().map(|l| l.alias.to_string()));

    let cells = rows
        .iter()
        .map(|record| {
            let mut row = vec![record.id.to_string()];
            row.extend(
                schema
                    .output_columns()
                    .into_iter()
                    .map(|column| record.display(kind, column)),
            );
            row
        })
        .collect();

    (columns, cells)
}

fn column_widths(columns: &[String], cells: &[Vec<String>]) -> Vec<usize> {
    columns
        .iter()
        .enumerate()
        .map(|(i, c)| {
            cells
                .iter()
                .filter_map(|row| row.get(i))
                .map(|cell| cell.chars().count())
                .chain(std::iter::once(c.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect()
}

fn pad_row(row: &[String], widths: &[usize]) -> Vec<String> {
    row.iter()
        .zip(widths)
        .map(|(cell, w)| format!("{:<w$}", cell, w = *w))
        .collect()
}
