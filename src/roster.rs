use std::path::Path;

use anyhow::{bail, Context, Result};

use crate::classify::window::normalize_month_year;
use crate::csv;

const COL_UNIQUE_ID: &str = "Unique ID";
const COL_STUDENT_NAME: &str = "Student Name";
const COL_BATCH_START: &str = "Batch Start Date";
const COL_BATCH_END: &str = "Batch End Date";

/// One input roster row. `cells` keeps every raw cell, required columns
/// included, because any of them may carry profile or document links.
#[derive(Debug, Clone)]
pub struct RosterRow {
    pub unique_id: String,
    pub student_name: String,
    /// Normalized to "MM YYYY" where parseable; raw text otherwise.
    pub batch_start: String,
    pub batch_end: String,
    pub cells: Vec<String>,
}

pub fn load_roster(path: &Path) -> Result<Vec<RosterRow>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read roster file {}", path.display()))?;
    parse_roster(&text)
}

/// Parse roster CSV text. Required columns are matched case-insensitively
/// against the header; window bounds are normalized here, once, before
/// anything downstream looks at them.
pub fn parse_roster(text: &str) -> Result<Vec<RosterRow>> {
    let mut rows = csv::parse(text);
    if rows.is_empty() {
        bail!("Roster is empty");
    }
    let header = rows.remove(0);
    let col = |name: &str| -> Result<usize> {
        header
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name))
            .with_context(|| format!("Roster is missing required column '{}'", name))
    };
    let id_col = col(COL_UNIQUE_ID)?;
    let name_col = col(COL_STUDENT_NAME)?;
    let start_col = col(COL_BATCH_START)?;
    let end_col = col(COL_BATCH_END)?;

    let cell = |row: &[String], idx: usize| -> String {
        row.get(idx).map(|s| s.trim().to_string()).unwrap_or_default()
    };

    Ok(rows
        .into_iter()
        .map(|row| RosterRow {
            unique_id: cell(&row, id_col),
            student_name: cell(&row, name_col),
            batch_start: normalize_month_year(&cell(&row, start_col)),
            batch_end: normalize_month_year(&cell(&row, end_col)),
            cells: row,
        })
        .collect())
}

// ── Tests ──
