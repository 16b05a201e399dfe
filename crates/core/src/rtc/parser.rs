//! Parser for `scm compare` change-set listings.
//!
//! Each pending change set is printed on its own line as
//! `(<digits>) <comment>`, possibly indented. Anything else is rejected so a
//! change in the tool's output format aborts the run instead of silently
//! dropping revisions.

use std::str::Lines;
use std::sync::OnceLock;

use regex_lite::Regex;
use tracing::debug;

use crate::errors::RtcError;
use crate::models::Revision;

fn revision_line() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\(([0-9]+)\) (.*)").expect("static regex is valid"))
}

/// Parse a single compare line into a [`Revision`].
pub fn parse_revision_line(line: &str, line_number: usize) -> Result<Revision, RtcError> {
    let line = line.trim_end_matches('\r');
    let caps = revision_line()
        .captures(line)
        .ok_or_else(|| RtcError::LogParse {
            line_number,
            line: line.to_string(),
        })?;
    Ok(Revision::new(&caps[1], &caps[2]))
}

/// Lazy iterator over the revisions in a compare listing, in input order.
///
/// Yields one `Err` at the first malformed line; callers are expected to
/// stop there.
pub struct RevisionLog<'a> {
    lines: Lines<'a>,
    line_number: usize,
}

impl<'a> RevisionLog<'a> {
    pub fn new(output: &'a str) -> Self {
        Self {
            lines: output.lines(),
            line_number: 0,
        }
    }
}

impl Iterator for RevisionLog<'_> {
    type Item = Result<Revision, RtcError>;

    fn next(&mut self) -> Option<Self::Item> {
        let line = self.lines.next()?;
        self.line_number += 1;
        // Only trailing blank lines are padding; any other blank line is a
        // malformed entry.
        if line.trim().is_empty() && self.lines.clone().all(|l| l.trim().is_empty()) {
            return None;
        }
        Some(parse_revision_line(line, self.line_number))
    }
}

/// Parse a full compare listing, failing on the first malformed line.
pub fn parse_revision_log(output: &str) -> Result<Vec<Revision>, RtcError> {
    debug!("parsing scm compare output ({} bytes)", output.len());
    let revisions = RevisionLog::new(output).collect::<Result<Vec<_>, _>>()?;
    debug!(count = revisions.len(), "parsed pending revisions");
    Ok(revisions)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_two_revisions_in_order() {
        let revs = parse_revision_log("(101) Fix bug\n(102) Add feature\n").unwrap();
        assert_eq!(
            revs,
            vec![
                Revision::new("101", "Fix bug"),
                Revision::new("102", "Add feature"),
            ]
        );
    }

    #[test]
    fn test_empty_output_is_empty() {
        assert!(parse_revision_log("").unwrap().is_empty());
    }

    #[test]
    fn test_trailing_blank_lines_are_ignored() {
        let revs = parse_revision_log("  (5) Only one\n\n   \n").unwrap();
        assert_eq!(revs, vec![Revision::new("5", "Only one")]);
    }

    #[test]
    fn test_whitespace_only_output_is_empty() {
        assert!(parse_revision_log("\n \n").unwrap().is_empty());
    }

    #[test]
    fn test_interior_blank_line_fails() {
        let err = parse_revision_log("(1) first\n\n(2) second\n").unwrap_err();
        assert!(matches!(err, RtcError::LogParse { line_number: 2, .. }));

        let err = parse_revision_log("\n(1) first\n").unwrap_err();
        assert!(matches!(err, RtcError::LogParse { line_number: 1, .. }));
    }

    #[test]
    fn test_indented_line_with_crlf() {
        let revs = parse_revision_log("    (1234) Tidy build scripts\r\n").unwrap();
        assert_eq!(revs[0].id, "1234");
        assert_eq!(revs[0].message, "Tidy build scripts");
    }

    #[test]
    fn test_message_keeps_parentheses_and_quotes() {
        let revs = parse_revision_log("(9) Merge 'a' (again) \"now\"").unwrap();
        assert_eq!(revs[0].message, "Merge 'a' (again) \"now\"");
    }

    #[test]
    fn test_malformed_line_fails() {
        let err = parse_revision_log("(101) Fix bug\nChange sets:\n(102) Add feature\n")
            .unwrap_err();
        match err {
            RtcError::LogParse { line_number, line } => {
                assert_eq!(line_number, 2);
                assert_eq!(line, "Change sets:");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_non_numeric_id_fails() {
        assert!(parse_revision_log("(abc) Nope").is_err());
    }

    #[test]
    fn test_missing_space_after_id_fails() {
        assert!(parse_revision_log("(12)NoSpace").is_err());
    }

    #[test]
    fn test_iterator_is_lazy() {
        let mut log = RevisionLog::new("(1) first\nbroken\n(3) third\n");
        assert_eq!(log.next().unwrap().unwrap(), Revision::new("1", "first"));
        assert!(log.next().unwrap().is_err());
    }
}
