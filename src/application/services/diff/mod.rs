use serde::{Deserialize, Serialize};
use similar::{Algorithm, ChangeTag, TextDiff};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffOp {
    Equal,
    Insert,
    Delete,
}

/// A run of consecutive lines sharing one op. `text` is the exact source
/// text of those lines, newlines included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffSegment {
    pub op: DiffOp,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffLine {
    pub op: DiffOp,
    pub old_line_number: Option<u32>,
    pub new_line_number: Option<u32>,
    /// Line content without its terminating `\n`.
    pub content: String,
    pub missing_newline: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffResult {
    pub segments: Vec<DiffSegment>,
}

impl DiffResult {
    pub fn is_identical(&self) -> bool {
        self.segments.iter().all(|s| s.op == DiffOp::Equal)
    }

    pub fn inserted_lines(&self) -> usize {
        self.count_lines(DiffOp::Insert)
    }

    pub fn deleted_lines(&self) -> usize {
        self.count_lines(DiffOp::Delete)
    }

    fn count_lines(&self, op: DiffOp) -> usize {
        self.segments
            .iter()
            .filter(|s| s.op == op)
            .map(|s| s.text.split_inclusive('\n').count())
            .sum()
    }

    /// Per-line view with old/new line numbers, for side-by-side display.
    pub fn to_lines(&self) -> Vec<DiffLine> {
        let mut lines = Vec::new();
        let mut old_line = 0u32;
        let mut new_line = 0u32;
        for segment in &self.segments {
            for raw in segment.text.split_inclusive('\n') {
                let (old_no, new_no) = match segment.op {
                    DiffOp::Equal => {
                        old_line += 1;
                        new_line += 1;
                        (Some(old_line), Some(new_line))
                    }
                    DiffOp::Delete => {
                        old_line += 1;
                        (Some(old_line), None)
                    }
                    DiffOp::Insert => {
                        new_line += 1;
                        (None, Some(new_line))
                    }
                };
                let missing_newline = !raw.ends_with('\n');
                lines.push(DiffLine {
                    op: segment.op,
                    old_line_number: old_no,
                    new_line_number: new_no,
                    content: raw.strip_suffix('\n').unwrap_or(raw).to_string(),
                    missing_newline,
                });
            }
        }
        lines
    }
}

/// Line-level edit script from `old` to `new`.
///
/// Lines are compared byte for byte including their terminator, so a change
/// in trailing whitespace or in the final newline shows up as an edit.
pub fn compute_diff(old: &str, new: &str) -> DiffResult {
    let diff = TextDiff::configure()
        .algorithm(Algorithm::Myers)
        .diff_lines(old, new);
    let mut segments: Vec<DiffSegment> = Vec::new();
    for change in diff.iter_all_changes() {
        let op = match change.tag() {
            ChangeTag::Equal => DiffOp::Equal,
            ChangeTag::Insert => DiffOp::Insert,
            ChangeTag::Delete => DiffOp::Delete,
        };
        match segments.last_mut() {
            Some(last) if last.op == op => last.text.push_str(change.value()),
            _ => segments.push(DiffSegment {
                op,
                text: change.value().to_string(),
            }),
        }
    }
    DiffResult { segments }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rebuild(result: &DiffResult, side: DiffOp) -> String {
        result
            .segments
            .iter()
            .filter(|s| s.op == DiffOp::Equal || s.op == side)
            .map(|s| s.text.as_str())
            .collect()
    }

    #[test]
    fn identical_inputs_have_no_edits() {
        let body = "# Title\n\nsome text\n  indented\n";
        let diff = compute_diff(body, body);
        assert!(diff.is_identical());
        assert_eq!(diff.segments.len(), 1);
        assert_eq!(diff.segments[0].text, body);
        assert_eq!(diff.inserted_lines(), 0);
        assert_eq!(diff.deleted_lines(), 0);
    }

    #[test]
    fn empty_inputs() {
        assert!(compute_diff("", "").segments.is_empty());
        let diff = compute_diff("", "a\nb\n");
        assert_eq!(
            diff.segments,
            vec![DiffSegment {
                op: DiffOp::Insert,
                text: "a\nb\n".into()
            }]
        );
    }

    #[test]
    fn single_line_change_is_minimal() {
        let diff = compute_diff("a\nb\nc\n", "a\nB\nc\n");
        let ops: Vec<DiffOp> = diff.segments.iter().map(|s| s.op).collect();
        assert_eq!(
            ops,
            vec![DiffOp::Equal, DiffOp::Delete, DiffOp::Insert, DiffOp::Equal]
        );
        assert_eq!(diff.deleted_lines(), 1);
        assert_eq!(diff.inserted_lines(), 1);
    }

    #[test]
    fn trailing_newline_difference_is_kept() {
        let diff = compute_diff("a\nb\n", "a\nb");
        assert!(!diff.is_identical());
        assert_eq!(rebuild(&diff, DiffOp::Delete), "a\nb\n");
        assert_eq!(rebuild(&diff, DiffOp::Insert), "a\nb");
        let lines = diff.to_lines();
        assert!(lines.last().map(|l| l.missing_newline).unwrap_or(false));
    }

    #[test]
    fn whitespace_only_difference_is_kept() {
        let diff = compute_diff("x\nline\n", "x\nline  \n");
        assert_eq!(diff.deleted_lines(), 1);
        assert_eq!(diff.inserted_lines(), 1);
        assert_eq!(rebuild(&diff, DiffOp::Insert), "x\nline  \n");
    }

    #[test]
    fn both_sides_reconstruct_exactly() {
        let old = "one\ntwo\nthree\r\nfour";
        let new = "zero\none\nthree\r\nfour\nfive\n";
        let diff = compute_diff(old, new);
        assert_eq!(rebuild(&diff, DiffOp::Delete), old);
        assert_eq!(rebuild(&diff, DiffOp::Insert), new);
    }

    #[test]
    fn deterministic() {
        let old = "a\nb\nc\nd\ne\n";
        let new = "a\nc\nb\ne\nd\n";
        assert_eq!(compute_diff(old, new), compute_diff(old, new));
    }

    #[test]
    fn numbered_lines() {
        let diff = compute_diff("a\nb\n", "a\nc\n");
        let lines = diff.to_lines();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].old_line_number, Some(1));
        assert_eq!(lines[0].new_line_number, Some(1));
        assert_eq!(lines[1].op, DiffOp::Delete);
        assert_eq!(lines[1].old_line_number, Some(2));
        assert_eq!(lines[2].op, DiffOp::Insert);
        assert_eq!(lines[2].new_line_number, Some(2));
        assert_eq!(lines[2].content, "c");
    }
}
