use colored::Colorize;

/// Shorten long ids (Drive folder ids, links) for table output
pub fn shorten(value: &str, max: usize) -> String {
    if value.chars().count() <= max || max < 4 {
        value.to_string()
    } else {
        let head: String = value.chars().take(max - 3).collect();
        format!("{}...", head)
    }
}

/// Format timestamp in human-readable format
pub fn format_timestamp(timestamp: &chrono::DateTime<chrono::Utc>) -> String {
    timestamp.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

/// Green check line used by the CLI
pub fn ok_line(text: &str) -> String {
    format!("✓ {}", text).green().to_string()
}

/// Print a formatted table border
pub fn print_table_border(width: usize) {
    println!("{}", "=".repeat(width));
}

/// Print a table row with columns
pub fn print_table_row(columns: &[&str], widths: &[usize]) {
    println!("{}", table_row(columns, widths));
}

fn table_row(columns: &[&str], widths: &[usize]) -> String {
    let mut row = String::new();
    for (col, width) in columns.iter().zip(widths) {
        row.push_str(&format!("{:<width$}  ", col, width = *width));
    }
    row.trim_end().to_string()
}
