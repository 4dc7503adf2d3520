pub mod episodes;
pub mod window;

use window::MonthYear;

/// Classification outcome for one report row. Closed set; the rendered
/// strings are carried verbatim into reports and exports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Label {
    InvalidBatchDates,
    InvalidBatchDateFormat,
    NoExperience,
    NotPlaced,
    PreImarticus,
    PostImarticus,
    SelfPlaced,
    NoExperienceDataFound,
}

impl Label {
    pub fn as_str(&self) -> &'static str {
        match self {
            Label::InvalidBatchDates => "Invalid Batch Dates",
            Label::InvalidBatchDateFormat => "Invalid Batch Date Format",
            Label::NoExperience => "No experience",
            Label::NotPlaced => "Not placed",
            Label::PreImarticus => "Pre Imarticus",
            Label::PostImarticus => "Post Imarticus",
            Label::SelfPlaced => "Self Placed",
            Label::NoExperienceDataFound => "No experience data found",
        }
    }
}

impl std::fmt::Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify one row's episode slots against its batch window. Terminal on
/// the first decision.
///
/// Only the first slot is ever examined before a verdict is returned, so a
/// row whose real placement sits in a later slot keeps the first slot's
/// outcome. Prior reports were produced this way; keep it unless report
/// continuity stops mattering.
pub fn classify(batch_start: &str, batch_end: &str, slots: &[String]) -> Label {
    if batch_start.trim().is_empty() || batch_end.trim().is_empty() {
        return Label::InvalidBatchDates;
    }
    let (Some(window_start), Some(window_end)) =
        (MonthYear::parse(batch_start), MonthYear::parse(batch_end))
    else {
        return Label::InvalidBatchDateFormat;
    };

    if let Some(slot) = slots.first() {
        if slot.is_empty() || slot.contains("Not placed") || slot.contains("No Experience Data") {
            return Label::NoExperience;
        }
        let Some(start) = extract_start_date(slot) else {
            return Label::NotPlaced;
        };
        // Window bounds are inclusive calendar months
        return if start < window_start {
            Label::PreImarticus
        } else if start > window_end {
            Label::PostImarticus
        } else {
            Label::SelfPlaced
        };
    }

    Label::NoExperienceDataFound
}

/// Pull the embedded start date out of a rendered episode line:
/// the "Start Date: <month> <year>" field, up to the next comma.
fn extract_start_date(slot: &str) -> Option<MonthYear> {
    let rest = slot.split("Start Date:").nth(1)?;
    let field = rest.split(',').next()?.trim();
    MonthYear::parse(field)
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::episodes::{split_episodes, PLACEHOLDER_SLOT_1, PLACEHOLDER_SLOT_2};
    use super::*;
    use crate::profile::NO_EXPERIENCE_DATA;

    fn slots(lines: &[&str]) -> Vec<String> {
        lines.iter().map(|s| s.to_string()).collect()
    }

    const EPISODE: &str =
        "Company: Acme, Title: Engineer, Start Date: 3 2022, End Date: Present N/A";

    #[test]
    fn missing_window_value() {
        assert_eq!(classify("", "06 2022", &slots(&[EPISODE])), Label::InvalidBatchDates);
        assert_eq!(classify("01 2022", "  ", &slots(&[EPISODE])), Label::InvalidBatchDates);
    }

    #[test]
    fn unparseable_window_value() {
        // Independent of any experience data present
        assert_eq!(classify("TBD", "06 2022", &slots(&[EPISODE])), Label::InvalidBatchDateFormat);
        assert_eq!(classify("01 2022", "soon", &slots(&[])), Label::InvalidBatchDateFormat);
    }

    #[test]
    fn window_placement() {
        let within = "Company: A, Title: T, Start Date: 03 2022, End Date: Present N/A";
        let before = "Company: A, Title: T, Start Date: 01 2020, End Date: Present N/A";
        let after = "Company: A, Title: T, Start Date: 01 2024, End Date: Present N/A";
        assert_eq!(classify("01 2022", "06 2022", &slots(&[within])), Label::SelfPlaced);
        assert_eq!(classify("01 2022", "06 2022", &slots(&[before])), Label::PreImarticus);
        assert_eq!(classify("01 2022", "06 2022", &slots(&[after])), Label::PostImarticus);
    }

    #[test]
    fn window_bounds_are_inclusive() {
        let at_start = "Company: A, Title: T, Start Date: 01 2022, End Date: Present N/A";
        let at_end = "Company: A, Title: T, Start Date: 06 2022, End Date: Present N/A";
        assert_eq!(classify("01 2022", "06 2022", &slots(&[at_start])), Label::SelfPlaced);
        assert_eq!(classify("01 2022", "06 2022", &slots(&[at_end])), Label::SelfPlaced);
    }

    #[test]
    fn empty_experience_sentinel_is_no_experience() {
        // Slot 1 carries the placeholder, treated as a no-data marker
        let slots = split_episodes(NO_EXPERIENCE_DATA);
        assert_eq!(slots, vec![PLACEHOLDER_SLOT_1, PLACEHOLDER_SLOT_2]);
        assert_eq!(classify("01 2022", "06 2022", &slots), Label::NoExperience);
    }

    #[test]
    fn not_placed_marker_is_no_experience() {
        assert_eq!(
            classify("01 2022", "06 2022", &slots(&["Not placed yet"])),
            Label::NoExperience
        );
    }

    #[test]
    fn unextractable_start_date_is_not_placed() {
        assert_eq!(classify("01 2022", "06 2022", &slots(&["API Error"])), Label::NotPlaced);
        let na_start = "Company: A, Title: T, Start Date: N/A 2022, End Date: Present N/A";
        assert_eq!(classify("01 2022", "06 2022", &slots(&[na_start])), Label::NotPlaced);
    }

    #[test]
    fn no_slots_at_all() {
        assert_eq!(classify("01 2022", "06 2022", &slots(&[])), Label::NoExperienceDataFound);
    }

    #[test]
    fn only_first_slot_is_evaluated() {
        let real = "Company: A, Title: T, Start Date: 03 2022, End Date: Present N/A";
        // A no-data first slot wins even when slot 2 holds a real placement
        assert_eq!(
            classify("01 2022", "06 2022", &slots(&[PLACEHOLDER_SLOT_1, real])),
            Label::NoExperience
        );
        // And a real first slot decides without looking at slot 2
        assert_eq!(
            classify("01 2022", "06 2022", &slots(&[real, PLACEHOLDER_SLOT_1])),
            Label::SelfPlaced
        );
    }

    #[test]
    fn deterministic() {
        let s = slots(&[EPISODE]);
        let first = classify("01 2022", "06 2022", &s);
        for _ in 0..3 {
            assert_eq!(classify("01 2022", "06 2022", &s), first);
        }
    }
}
