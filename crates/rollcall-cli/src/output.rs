//! Everything the CLI prints: session status, result grids, and errors.
//!
//! All failures go through `report_error`, so a rejected or missing
//! credential always ends with the same pointer back to `rollcall login`.

use rollcall_core::models::{Page, Record};
use rollcall_core::utils::{format_remaining, format_timestamp, pad, truncate_string, Table};
use rollcall_core::{ApiError, SessionStatus};

/// Where users are sent when they need a fresh token
pub const LOGIN_HINT: &str = "Run `rollcall login` to sign in.";

/// Widest a grid column may get before its cells are truncated
const MAX_COLUMN_WIDTH: usize = 40;

/// Gap between grid columns
const COLUMN_GAP: &str = "  ";

pub fn print_status_line(status: &SessionStatus) {
    let marker = if status.is_active() { "●" } else { "○" };
    println!("{} {}", marker, status.label());
}

/// Full token panel: status, owner, issue and expiry times
pub fn print_status(status: &SessionStatus) {
    print_status_line(status);

    if let Some(claims) = status.claims() {
        if let Some(name) = claims.display_name() {
            println!("  User:     {}", name);
        }
        if let Some(iat) = claims.issued_at() {
            println!("  Issued:   {}", format_timestamp(&iat));
        }
        if let Some(exp) = claims.expires_at() {
            match status {
                SessionStatus::Active { remaining_secs, .. } => println!(
                    "  Expires:  {} (in {})",
                    format_timestamp(&exp),
                    format_remaining(*remaining_secs)
                ),
                _ => println!("  Expired:  {}", format_timestamp(&exp)),
            }
        }
    }

    if !status.is_active() {
        println!("{}", LOGIN_HINT);
    }
}

/// Render page items as a grid, followed by a paging summary
pub fn print_page(page: &Page<Record>) {
    if page.is_empty() {
        println!("No records found.");
        return;
    }

    let table = Table::from_records(&page.items);
    let widths: Vec<usize> = table
        .column_widths()
        .into_iter()
        .map(|w| w.min(MAX_COLUMN_WIDTH))
        .collect();

    println!("{}", format_row(&table.headers, &widths));
    println!(
        "{}",
        widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join(COLUMN_GAP)
    );
    for row in &table.rows {
        println!("{}", format_row(row, &widths));
    }

    println!();
    println!("{}", page_summary(page));
}

fn format_row(cells: &[String], widths: &[usize]) -> String {
    cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| pad(&truncate_string(cell, *width), *width))
        .collect::<Vec<_>>()
        .join(COLUMN_GAP)
        .trim_end()
        .to_string()
}

fn page_summary<T>(page: &Page<T>) -> String {
    let shown = format!("{} row(s)", page.items.len());
    match (page.index, page.page_count(), page.total) {
        (Some(index), Some(count), Some(total)) => {
            format!("{} - page {} of {}, {} total", shown, index, count, total)
        }
        (Some(index), _, _) => format!("{} - page {}", shown, index),
        _ => shown,
    }
}

/// The single place errors are shown to the user
pub fn report_error(error: &anyhow::Error) {
    match error.downcast_ref::<ApiError>() {
        Some(api_error) => {
            eprintln!("{}", api_error.user_message());
            if api_error.requires_login() {
                eprintln!("{}", LOGIN_HINT);
            }
        }
        None => eprintln!("Error: {:#}", error),
    }
    tracing::debug!(error = ?error, "Command failed");
}
