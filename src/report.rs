use std::collections::HashMap;

use crate::classify::episodes::{slot_name, SLOT_BACKFILL};
use crate::csv;
use crate::db::{JobPost, ReportRow};

pub struct SummaryRow {
    pub classification: String,
    pub students: Vec<String>,
    pub count: usize,
}

/// Group classified rows by label. Group order and member order both follow
/// first appearance in the report table; unclassified rows are skipped.
pub fn summarize(rows: &[ReportRow]) -> Vec<SummaryRow> {
    let mut order = Vec::new();
    let mut groups: HashMap<String, SummaryRow> = HashMap::new();

    for row in rows {
        let Some(label) = row.classification.as_deref() else { continue };
        let entry = groups.entry(label.to_string()).or_insert_with(|| {
            order.push(label.to_string());
            SummaryRow {
                classification: label.to_string(),
                students: Vec::new(),
                count: 0,
            }
        });
        entry.students.push(row.student_name.clone());
        entry.count += 1;
    }

    order.into_iter().filter_map(|label| groups.remove(&label)).collect()
}

/// Case-insensitive substring search across the textual rendering of every
/// column of every row.
pub fn search<'a>(rows: &'a [ReportRow], query: &str) -> Vec<&'a ReportRow> {
    let q = query.to_lowercase();
    rows.iter()
        .filter(|r| {
            row_cells(r, r.episodes.len())
                .iter()
                .any(|cell| cell.to_lowercase().contains(&q))
        })
        .collect()
}

/// Widest episode slot count across the table; export columns are padded to
/// this width.
pub fn episode_width(rows: &[ReportRow]) -> usize {
    rows.iter().map(|r| r.episodes.len()).max().unwrap_or(0)
}

/// One row's columns in stable export order, episode slots padded to
/// `width` with the back-fill sentinel.
pub fn row_cells(row: &ReportRow, width: usize) -> Vec<String> {
    let mut cells = vec![
        row.unique_id.clone(),
        row.student_name.clone(),
        row.batch_start.clone(),
        row.batch_end.clone(),
        row.link.clone(),
        row.username.clone(),
        row.experience.clone().unwrap_or_default(),
    ];
    for i in 0..width {
        cells.push(
            row.episodes
                .get(i)
                .cloned()
                .unwrap_or_else(|| SLOT_BACKFILL.to_string()),
        );
    }
    cells.push(row.classification.clone().unwrap_or_default());
    cells
}

fn report_header(width: usize) -> Vec<String> {
    let mut header: Vec<String> = [
        "Unique ID",
        "Student Name",
        "Batch Start Date",
        "Batch End Date",
        "Link",
        "Username",
        "Experience",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    for i in 0..width {
        header.push(slot_name(i));
    }
    header.push("Experience Classification".to_string());
    header
}

/// Full report as CSV text: header row first, one data row per
/// (person, discovered-link) pair.
pub fn report_to_csv(rows: &[ReportRow]) -> String {
    let width = episode_width(rows);
    let data: Vec<Vec<String>> = rows.iter().map(|r| row_cells(r, width)).collect();
    csv::to_string(&report_header(width), &data)
}

/// Summary as CSV text: label, member names, count.
pub fn summary_to_csv(summary: &[SummaryRow]) -> String {
    let header: Vec<String> = ["Experience Classification", "Student Name", "Count"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    let data: Vec<Vec<String>> = summary
        .iter()
        .map(|s| {
            vec![
                s.classification.clone(),
                s.students.join("; "),
                s.count.to_string(),
            ]
        })
        .collect();
    csv::to_string(&header, &data)
}

pub fn jobs_to_csv(posts: &[JobPost]) -> String {
    let header: Vec<String> = [
        "Job ID",
        "Job Title",
        "Company Name",
        "Location",
        "Time Posted",
        "Job Description",
        "Apply Link",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    let data: Vec<Vec<String>> = posts
        .iter()
        .map(|p| {
            vec![
                p.job_id.clone(),
                p.title.clone().unwrap_or_default(),
                p.company.clone().unwrap_or_default(),
                p.location.clone().unwrap_or_default(),
                p.posted.clone().unwrap_or_default(),
                p.description.clone().unwrap_or_default(),
                p.apply_link.clone(),
            ]
        })
        .collect();
    csv::to_string(&header, &data)
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    fn row(name: &str, label: Option<&str>, episodes: &[&str]) -> ReportRow {
        ReportRow {
            unique_id: format!("ID-{}", name),
            student_name: name.to_string(),
            batch_start: "01 2022".into(),
            batch_end: "06 2022".into(),
            link: "https://linkedin.com/in/x".into(),
            username: "x".into(),
            experience: Some("Company: Acme, Title: T, Start Date: 3 2022, End Date: Present N/A".into()),
            episodes: episodes.iter().map(|s| s.to_string()).collect(),
            classification: label.map(String::from),
        }
    }

    #[test]
    fn summary_groups_in_first_seen_order() {
        let rows = vec![
            row("Alice", Some("Self Placed"), &["e1"]),
            row("Bob", Some("No experience"), &["e1"]),
            row("Cara", Some("Self Placed"), &["e1"]),
        ];
        let summary = summarize(&rows);
        assert_eq!(summary.len(), 2);
        assert_eq!(summary[0].classification, "Self Placed");
        assert_eq!(summary[0].students, vec!["Alice".to_string(), "Cara".to_string()]);
        assert_eq!(summary[0].count, 2);
        assert_eq!(summary[1].classification, "No experience");
        assert_eq!(summary[1].count, 1);
    }

    #[test]
    fn summary_skips_unclassified_rows() {
        let rows = vec![row("Alice", None, &[])];
        assert!(summarize(&rows).is_empty());
    }

    #[test]
    fn search_is_case_insensitive_across_columns() {
        let rows = vec![
            row("Alice", Some("Self Placed"), &["e1"]),
            row("Bob", Some("No experience"), &["e1"]),
        ];
        assert_eq!(search(&rows, "ALICE").len(), 1);
        assert_eq!(search(&rows, "self placed").len(), 1);
        assert_eq!(search(&rows, "linkedin.com").len(), 2);
        assert!(search(&rows, "zzz").is_empty());
    }

    #[test]
    fn csv_pads_episode_columns_with_backfill() {
        let rows = vec![
            row("Alice", Some("Self Placed"), &["one", "two"]),
            row("Bob", Some("No experience"), &["only"]),
        ];
        let text = report_to_csv(&rows);
        let mut lines = text.lines();
        let header = lines.next().unwrap();
        assert!(header.contains("Episode 1,Episode 2"));
        assert!(header.ends_with("Experience Classification"));
        let bob = lines.nth(1).unwrap();
        assert!(bob.contains(SLOT_BACKFILL));
    }

    #[test]
    fn summary_csv_shape() {
        let rows = vec![row("Alice", Some("Self Placed"), &["e1"])];
        let text = summary_to_csv(&summarize(&rows));
        let mut lines = text.lines();
        assert_eq!(lines.next().unwrap(), "Experience Classification,Student Name,Count");
        assert_eq!(lines.next().unwrap(), "Self Placed,Alice,1");
    }
}
