use chrono::{Datelike, NaiveDate};

/// Calendar-month date used for batch window bounds and episode starts.
/// Ordering is chronological (year first, then month).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct MonthYear {
    pub year: i32,
    pub month: u32,
}

impl MonthYear {
    /// Parse "M YYYY" / "MM YYYY" text. Anything else is None.
    pub fn parse(s: &str) -> Option<MonthYear> {
        let mut parts = s.split_whitespace();
        let month: u32 = parts.next()?.parse().ok()?;
        let year: i32 = parts.next()?.parse().ok()?;
        if parts.next().is_some() || !(1..=12).contains(&month) {
            return None;
        }
        Some(MonthYear { year, month })
    }

    pub fn render(&self) -> String {
        format!("{:02} {}", self.month, self.year)
    }
}

// Month-resolution formats tried first, then full dates. First match wins.
const MONTH_FORMATS: &[&str] = &["%b %Y", "%B %Y", "%Y-%m"];
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%d/%m/%Y",
    "%d-%m-%Y",
    "%m/%d/%Y",
    "%d %b %Y",
    "%d %B %Y",
];

/// Normalize free-form date text to "MM YYYY". Unparseable input comes back
/// verbatim so the classifier can tell malformed apart from missing.
pub fn normalize_month_year(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return String::new();
    }

    if let Some(my) = MonthYear::parse(trimmed) {
        return my.render();
    }

    for fmt in MONTH_FORMATS {
        // NaiveDate wants a day; anchor month-only text to the 1st
        let anchored = format!("01 {}", trimmed);
        if let Ok(d) = NaiveDate::parse_from_str(&anchored, &format!("%d {}", fmt)) {
            return MonthYear { year: d.year(), month: d.month() }.render();
        }
    }

    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(trimmed, fmt) {
            return MonthYear { year: d.year(), month: d.month() }.render();
        }
    }

    trimmed.to_string()
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_month_year() {
        assert_eq!(MonthYear::parse("03 2022"), Some(MonthYear { year: 2022, month: 3 }));
        assert_eq!(MonthYear::parse("3 2022"), Some(MonthYear { year: 2022, month: 3 }));
        assert_eq!(MonthYear::parse("12 1999"), Some(MonthYear { year: 1999, month: 12 }));
    }

    #[test]
    fn parse_rejects_garbage() {
        assert_eq!(MonthYear::parse("TBD"), None);
        assert_eq!(MonthYear::parse(""), None);
        assert_eq!(MonthYear::parse("13 2022"), None);
        assert_eq!(MonthYear::parse("0 2022"), None);
        assert_eq!(MonthYear::parse("03 2022 extra"), None);
        assert_eq!(MonthYear::parse("N/A 2022"), None);
    }

    #[test]
    fn ordering_is_chronological() {
        let a = MonthYear { year: 2021, month: 12 };
        let b = MonthYear { year: 2022, month: 1 };
        let c = MonthYear { year: 2022, month: 6 };
        assert!(a < b);
        assert!(b < c);
        assert_eq!(b, MonthYear::parse("01 2022").unwrap());
    }

    #[test]
    fn normalize_variants() {
        assert_eq!(normalize_month_year("03 2022"), "03 2022");
        assert_eq!(normalize_month_year("3 2022"), "03 2022");
        assert_eq!(normalize_month_year("Mar 2022"), "03 2022");
        assert_eq!(normalize_month_year("March 2022"), "03 2022");
        assert_eq!(normalize_month_year("2022-03"), "03 2022");
        assert_eq!(normalize_month_year("2022-03-15"), "03 2022");
        assert_eq!(normalize_month_year("15/03/2022"), "03 2022");
    }

    #[test]
    fn normalize_keeps_unparseable_text() {
        assert_eq!(normalize_month_year("TBD"), "TBD");
        assert_eq!(normalize_month_year("  TBD  "), "TBD");
        assert_eq!(normalize_month_year(""), "");
        assert_eq!(normalize_month_year("   "), "");
    }
}
