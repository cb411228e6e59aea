//! Splits the narrative text into per-day sections.
//!
//! The narrative service is asked to open each day's section with a
//! `Day N (date)` heading line. This module recovers those sections with
//! a line-oriented label scan: a day's section starts at the first line
//! carrying its label and ends just before the first subsequent line
//! carrying any other day's label. The scan is a compatibility fallback,
//! not a structural contract on the model's output — when no label is
//! found the caller gets a fixed placeholder instead.

/// Placeholder returned when the narrative has no section for a day.
pub const MISSING_DAY_TEXT: &str = "No analysis was returned for this day.";

/// The heading label the prompt requests for a 1-based day index.
pub fn day_label(day: usize) -> String {
    format!("Day {}", day)
}

/// Extract the section for 1-based `day` out of `total_days`, or `None`
/// when the narrative carries no matching label.
pub fn day_section(narrative: &str, day: usize, total_days: usize) -> Option<String> {
    let mut span: Vec<&str> = Vec::new();
    let mut capturing = false;

    for line in narrative.lines() {
        if !capturing {
            if contains_label(line, day) {
                capturing = true;
                span.push(line);
            }
            continue;
        }
        let other_day = (1..=total_days).any(|d| d != day && contains_label(line, d));
        if other_day {
            break;
        }
        span.push(line);
    }

    if span.is_empty() {
        None
    } else {
        Some(span.join("\n"))
    }
}

/// Section text for a day, falling back to [`MISSING_DAY_TEXT`].
pub fn analysis_for_day(narrative: &str, day: usize, total_days: usize) -> String {
    day_section(narrative, day, total_days).unwrap_or_else(|| MISSING_DAY_TEXT.to_string())
}

/// Substring label test, rejecting matches where the label is a prefix of
/// a longer day number ("Day 1" must not match a "Day 10" line).
fn contains_label(line: &str, day: usize) -> bool {
    let label = day_label(day);
    let mut search_from = 0;
    while let Some(pos) = line[search_from..].find(&label) {
        let end = search_from + pos + label.len();
        let followed_by_digit = line[end..]
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_digit());
        if !followed_by_digit {
            return true;
        }
        search_from = end;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seven_day_narrative() -> String {
        (1..=7)
            .map(|d| {
                format!(
                    "Day {} (2026-01-{:02}): snapshot\nClosure: low\nReasoning for day {}.",
                    d,
                    16 + d,
                    d
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_sections_are_ordered_nonempty_and_rebuild_the_text() {
        let narrative = seven_day_narrative();
        let sections: Vec<String> = (1..=7)
            .map(|d| day_section(&narrative, d, 7).expect("every day labeled"))
            .collect();

        for section in &sections {
            assert!(!section.trim().is_empty());
        }
        // Spans are non-overlapping and in order: joining them restores
        // the original text.
        assert_eq!(sections.join("\n"), narrative);
    }

    #[test]
    fn test_segmentation_is_idempotent() {
        let narrative = seven_day_narrative();
        let first = analysis_for_day(&narrative, 3, 7);
        let second = analysis_for_day(&narrative, 3, 7);
        assert_eq!(first, second);
        assert!(first.starts_with("Day 3"));
        assert!(first.contains("Reasoning for day 3."));
    }

    #[test]
    fn test_section_runs_to_end_of_text_for_last_day() {
        let narrative = seven_day_narrative();
        let last = day_section(&narrative, 7, 7).unwrap();
        assert!(last.contains("Reasoning for day 7."));
        assert!(narrative.ends_with(&last));
    }

    #[test]
    fn test_missing_label_yields_placeholder() {
        let narrative = "General outlook with no day headings.";
        assert_eq!(analysis_for_day(narrative, 2, 7), MISSING_DAY_TEXT);
        assert_eq!(day_section(narrative, 2, 7), None);
    }

    #[test]
    fn test_day_one_does_not_match_day_ten() {
        assert!(!contains_label("Day 10 could be rough", 1));
        assert!(contains_label("Day 1 looks calm", 1));
        // A later clean match on the same line still counts.
        assert!(contains_label("Day 10, unlike Day 1, is far out", 1));
    }

    #[test]
    fn test_label_mid_line_starts_the_section() {
        let narrative = "Here is Day 2 in detail:\nmore text\nNow Day 3:";
        let section = day_section(narrative, 2, 7).unwrap();
        assert_eq!(section, "Here is Day 2 in detail:\nmore text");
    }

    #[test]
    fn test_single_day_narrative() {
        let narrative = "Day 1 (2026-01-17): quiet\nNothing falling.";
        let section = analysis_for_day(narrative, 1, 1);
        assert_eq!(section, narrative);
    }
}
