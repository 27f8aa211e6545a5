use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

pub const DEFAULT_SECTION_TITLE: &str = "Interview Analysis";

static HEADER_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z][^:]*:$").expect("header pattern is valid"));

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ReportSection {
    pub title: String,
    /// Non-empty trimmed lines, each terminated by a newline.
    pub body: String,
}

impl ReportSection {
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.body.lines().map(str::trim).filter(|line| !line.is_empty())
    }
}

/// Splits report text into titled sections. A trimmed line such as
/// `Strengths:` opens a section; text before the first header is dropped.
/// Text without any header becomes a single "Interview Analysis" section.
pub fn parse_sections(text: &str) -> Vec<ReportSection> {
    let mut sections = Vec::new();
    let mut current: Option<ReportSection> = None;

    for line in text.split('\n').map(str::trim) {
        if HEADER_PATTERN.is_match(line) {
            if let Some(done) = current.take() {
                sections.push(done);
            }
            current = Some(ReportSection {
                title: line.trim_end_matches(':').to_string(),
                body: String::new(),
            });
        } else if let Some(section) = current.as_mut() {
            if !line.is_empty() {
                section.body.push_str(line);
                section.body.push('\n');
            }
        }
    }

    if let Some(done) = current {
        sections.push(done);
    }

    if sections.is_empty() {
        sections.push(ReportSection {
            title: DEFAULT_SECTION_TITLE.to_string(),
            body: text.to_string(),
        });
    }
    sections
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sections_from_headers() {
        let text = "Intro line\nStrengths:\n  Clear communication \n\nGood structure\nAreas to Improve:\nMore examples";
        let sections = parse_sections(text);
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].title, "Strengths");
        assert_eq!(sections[0].body, "Clear communication\nGood structure\n");
        assert_eq!(sections[1].title, "Areas to Improve");
        assert_eq!(sections[1].body, "More examples\n");
        assert_eq!(sections[1].lines().collect::<Vec<_>>(), vec!["More examples"]);
    }

    #[test]
    fn test_no_header_yields_single_section() {
        let text = "overall a solid session: keep practicing";
        let sections = parse_sections(text);
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].title, DEFAULT_SECTION_TITLE);
        assert_eq!(sections[0].body, text);
    }

    #[test]
    fn test_header_rules() {
        // lowercase start, inner colon, and trailing text are not headers
        for line in ["summary:", "Score: 8/10", "Note: a:", "Summary: done"] {
            assert_eq!(parse_sections(line)[0].title, DEFAULT_SECTION_TITLE, "{line}");
        }
        let sections = parse_sections("   Summary:   \nok");
        assert_eq!(sections[0].title, "Summary");
        assert_eq!(sections[0].body, "ok\n");
        // an empty section is still kept
        assert_eq!(parse_sections("Summary:")[0].body, "");
    }
}
