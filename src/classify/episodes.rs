use serde::Deserialize;

use crate::profile::NO_EXPERIENCE_DATA;

/// First slot of the fixed placeholder pair emitted for the empty-experience
/// sentinel.
pub const PLACEHOLDER_SLOT_1: &str = "No Experience Data";
/// Second slot of the placeholder pair. The text deliberately differs from
/// the first slot; prior reports carry exactly these strings.
pub const PLACEHOLDER_SLOT_2: &str = "No Experience Data found";
/// Back-fill for export columns beyond a row's own slot count.
pub const SLOT_BACKFILL: &str = "No Experience Data found";

/// One raw experience record as returned by the profile provider. Every
/// field is optional; absent sub-fields degrade to "N/A" at render time,
/// never fail the call.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperienceEntry {
    pub company_name: Option<String>,
    pub title: Option<String>,
    #[serde(default)]
    pub time_period: TimePeriod,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimePeriod {
    pub start_date: Option<PartialDate>,
    pub end_date: Option<PartialDate>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PartialDate {
    pub month: Option<u32>,
    pub year: Option<i32>,
}

/// Serialize provider records into the report's fixed textual shape: one
/// line per record, provider order. An empty record list yields the
/// canonical no-experience sentinel; downstream stages detect it by exact
/// string equality.
pub fn format_experience(entries: &[ExperienceEntry]) -> String {
    if entries.is_empty() {
        return NO_EXPERIENCE_DATA.to_string();
    }
    entries.iter().map(format_entry).collect::<Vec<_>>().join("\n")
}

fn format_entry(e: &ExperienceEntry) -> String {
    let company = e.company_name.as_deref().unwrap_or("N/A");
    let title = e.title.as_deref().unwrap_or("N/A");
    let (start_month, start_year) = date_parts(e.time_period.start_date.as_ref(), "N/A");
    // An ongoing role has no end date; its month slot renders as "Present"
    let (end_month, end_year) = date_parts(e.time_period.end_date.as_ref(), "Present");
    format!(
        "Company: {}, Title: {}, Start Date: {} {}, End Date: {} {}",
        company, title, start_month, start_year, end_month, end_year
    )
}

fn date_parts(date: Option<&PartialDate>, month_default: &str) -> (String, String) {
    let month = date
        .and_then(|d| d.month)
        .map(|m| m.to_string())
        .unwrap_or_else(|| month_default.to_string());
    let year = date
        .and_then(|d| d.year)
        .map(|y| y.to_string())
        .unwrap_or_else(|| "N/A".to_string());
    (month, year)
}

/// Project a formatted experience blob onto ordered episode slots, one slot
/// per line, trimmed. The empty-experience sentinel maps to the fixed
/// two-slot placeholder pair instead of a derived split.
pub fn split_episodes(blob: &str) -> Vec<String> {
    if blob == NO_EXPERIENCE_DATA {
        return vec![PLACEHOLDER_SLOT_1.to_string(), PLACEHOLDER_SLOT_2.to_string()];
    }
    blob.lines().map(|l| l.trim().to_string()).collect()
}

/// Positional slot name ("Episode 1", "Episode 2", ...), 1-indexed.
pub fn slot_name(index: usize) -> String {
    format!("Episode {}", index + 1)
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(
        company: Option<&str>,
        title: Option<&str>,
        start: Option<(Option<u32>, Option<i32>)>,
        end: Option<(Option<u32>, Option<i32>)>,
    ) -> ExperienceEntry {
        let date = |d: Option<(Option<u32>, Option<i32>)>| {
            d.map(|(month, year)| PartialDate { month, year })
        };
        ExperienceEntry {
            company_name: company.map(String::from),
            title: title.map(String::from),
            time_period: TimePeriod {
                start_date: date(start),
                end_date: date(end),
            },
        }
    }

    #[test]
    fn formats_full_entry() {
        let e = entry(
            Some("Acme"),
            Some("Engineer"),
            Some((Some(3), Some(2022))),
            Some((Some(6), Some(2023))),
        );
        assert_eq!(
            format_experience(&[e]),
            "Company: Acme, Title: Engineer, Start Date: 3 2022, End Date: 6 2023"
        );
    }

    #[test]
    fn missing_fields_render_na() {
        let e = entry(None, None, Some((None, Some(2022))), None);
        assert_eq!(
            format_experience(&[e]),
            "Company: N/A, Title: N/A, Start Date: N/A 2022, End Date: Present N/A"
        );
    }

    #[test]
    fn ongoing_role_renders_present() {
        let e = entry(Some("Acme"), Some("Engineer"), Some((Some(1), Some(2021))), None);
        let text = format_experience(&[e]);
        assert!(text.ends_with("End Date: Present N/A"));
    }

    #[test]
    fn empty_list_yields_sentinel() {
        assert_eq!(format_experience(&[]), NO_EXPERIENCE_DATA);
    }

    #[test]
    fn entries_join_one_line_each() {
        let a = entry(Some("Acme"), Some("Engineer"), Some((Some(1), Some(2021))), None);
        let b = entry(Some("Globex"), Some("Analyst"), Some((Some(7), Some(2019))), None);
        let text = format_experience(&[a, b]);
        assert_eq!(text.lines().count(), 2);
        assert!(text.lines().next().unwrap().contains("Acme"));
    }

    #[test]
    fn split_one_slot_per_line_trimmed() {
        let slots = split_episodes("  line one  \nline two");
        assert_eq!(slots, vec!["line one".to_string(), "line two".to_string()]);
    }

    #[test]
    fn split_sentinel_yields_placeholder_pair() {
        let slots = split_episodes(NO_EXPERIENCE_DATA);
        assert_eq!(slots, vec![PLACEHOLDER_SLOT_1.to_string(), PLACEHOLDER_SLOT_2.to_string()]);
        // The pair diverges on purpose; both texts are load-bearing
        assert_ne!(slots[0], slots[1]);
    }

    #[test]
    fn split_non_sentinel_text_is_a_single_slot() {
        assert_eq!(split_episodes("API Error"), vec!["API Error".to_string()]);
        assert_eq!(split_episodes("Invalid URL"), vec!["Invalid URL".to_string()]);
    }

    #[test]
    fn slot_names_are_one_indexed() {
        assert_eq!(slot_name(0), "Episode 1");
        assert_eq!(slot_name(4), "Episode 5");
    }
}
