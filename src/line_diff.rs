// src/line_diff.rs

use crate::error::{IoContext, Result};
use similar::{Algorithm, ChangeTag, TextDiff};
use std::borrow::Cow;
use std::path::Path;
use std::time::{Duration, Instant};

/// Line counts of the shortest edit script between two files
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LineDiff {
    pub added: u64,
    pub removed: u64,
}

impl LineDiff {
    pub fn is_different(&self) -> bool {
        self.added + self.removed > 0
    }
}

/// Longest time spent on one file pair before settling for a non-minimal diff
const DIFF_DEADLINE: Duration = Duration::from_secs(30);

/// Content with `\r\n` and lone `\r` line endings turned into `\n`
pub fn normalize_newlines(content: &[u8]) -> Cow<'_, [u8]> {
    if !content.contains(&b'\r') {
        return Cow::Borrowed(content);
    }

    let mut normalized = Vec::with_capacity(content.len());
    let mut bytes = content.iter().copied().peekable();
    while let Some(byte) = bytes.next() {
        if byte == b'\r' {
            normalized.push(b'\n');
            bytes.next_if_eq(&b'\n');
        } else {
            normalized.push(byte);
        }
    }
    Cow::Owned(normalized)
}

/// Number of lines, with any of `\n`, `\r\n` or `\r` ending a line.
///
/// A trailing line without terminator counts too.
pub fn count_lines(path: &Path) -> Result<u64> {
    let content = std::fs::read(path).at_path(path)?;
    let content = normalize_newlines(&content);
    Ok(content.split_inclusive(|&b| b == b'\n').count() as u64)
}

/// Compare two files line by line.
///
/// Lines are raw bytes, so content that is not valid UTF-8 is compared as is.
pub fn compare_files(left: &Path, right: &Path) -> Result<LineDiff> {
    let left_content = std::fs::read(left).at_path(left)?;
    let right_content = std::fs::read(right).at_path(right)?;
    Ok(diff_lines(&left_content, &right_content))
}

/// Insertions and deletions of a Myers line diff between two contents
pub fn diff_lines(left: &[u8], right: &[u8]) -> LineDiff {
    let left = normalize_newlines(left);
    let right = normalize_newlines(right);
    if left == right {
        return LineDiff::default();
    }

    let diff = TextDiff::configure()
        .algorithm(Algorithm::Myers)
        .deadline(Instant::now() + DIFF_DEADLINE)
        .diff_lines(&left[..], &right[..]);

    diff.iter_all_changes()
        .fold(LineDiff::default(), |mut counts, change| {
            match change.tag() {
                ChangeTag::Insert => counts.added += 1,
                ChangeTag::Delete => counts.removed += 1,
                ChangeTag::Equal => {}
            }
            counts
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::prelude::*;
    use assert_fs::TempDir;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn diff(a: &str, b: &str) -> LineDiff {
        diff_lines(a.as_bytes(), b.as_bytes())
    }

    #[rstest]
    #[case(b"a\nb\n", b"a\nb\n")]
    #[case(b"a\r\nb\r\n", b"a\nb\n")]
    #[case(b"a\rb\r", b"a\nb\n")]
    #[case(b"a\r\r\nb", b"a\n\nb")]
    #[case(b"a\r", b"a\n")]
    fn line_endings_are_normalized(#[case] content: &[u8], #[case] expected: &[u8]) {
        assert_eq!(&normalize_newlines(content)[..], expected);
    }

    #[rstest]
    #[case("a\nb\nc\n", "a\nx\nc\n", 1, 1)]
    #[case("a\nb\nc\n", "a\nb\nc\n", 0, 0)]
    #[case("", "a\nb\n", 2, 0)]
    #[case("a\nb\n", "", 0, 2)]
    #[case("a\nb\nc\n", "a\nc\n", 0, 1)]
    #[case("a\nb\n", "a\nb", 1, 1)]
    #[case("line1\nline2\nline3\nline4\n", "line2\nline3_modified\nline4\nline5\n", 2, 2)]
    #[case("a\r\nb\r\nc\r\n", "a\nb\nc\n", 0, 0)]
    #[case("a\rb\rc\r", "a\nb\nc\n", 0, 0)]
    #[case("a\r\nx\r\nc\r\n", "a\nb\nc\n", 1, 1)]
    fn counts_insertions_and_deletions(
        #[case] a: &str,
        #[case] b: &str,
        #[case] added: u64,
        #[case] removed: u64,
    ) {
        assert_eq!(diff(a, b), LineDiff { added, removed });
    }

    #[test]
    fn counts_a_shortest_edit_script() {
        // abcabba -> cbabac: three deletions, two insertions
        let a = "a\nb\nc\na\nb\nb\na\n";
        let b = "c\nb\na\nb\na\nc\n";

        assert_eq!(diff(a, b), LineDiff { added: 2, removed: 3 });
    }

    #[test]
    fn compares_files_on_disk() {
        let dir = TempDir::new().unwrap();
        let left = dir.child("left.txt");
        let right = dir.child("right.txt");
        left.write_str("a\nb\nc\n").unwrap();
        right.write_str("a\nx\nc\n").unwrap();

        let result = compare_files(left.path(), right.path()).unwrap();

        assert!(result.is_different());
        assert_eq!(result, LineDiff { added: 1, removed: 1 });
    }

    #[test]
    fn crlf_copy_of_a_file_is_not_different() {
        let dir = TempDir::new().unwrap();
        let left = dir.child("unix.c");
        let right = dir.child("dos.c");
        left.write_str("int main() {\n  return 0;\n}\n").unwrap();
        right.write_str("int main() {\r\n  return 0;\r\n}\r\n").unwrap();

        let result = compare_files(left.path(), right.path()).unwrap();

        assert!(!result.is_different());
    }

    #[rstest]
    #[case("a\nb\nc\n", 3)]
    #[case("a\r\nb\r\nc\r\n", 3)]
    #[case("a\rb\rc\r", 3)]
    #[case("a\nb", 2)]
    #[case("", 0)]
    fn counts_lines_with_any_terminator(#[case] content: &str, #[case] lines: u64) {
        let dir = TempDir::new().unwrap();
        let file = dir.child("file.txt");
        file.write_str(content).unwrap();

        assert_eq!(count_lines(file.path()).unwrap(), lines);
    }

    #[test]
    fn invalid_utf8_is_compared_losslessly() {
        let dir = TempDir::new().unwrap();
        let left = dir.child("left.bin");
        let right = dir.child("right.bin");
        left.write_binary(b"ok\n\xff\xfe\nend\n").unwrap();
        right.write_binary(b"ok\n\xff\xfd\nend\n").unwrap();

        let first = compare_files(left.path(), right.path()).unwrap();
        let second = compare_files(left.path(), right.path()).unwrap();

        assert_eq!(first, LineDiff { added: 1, removed: 1 });
        assert_eq!(first, second);
        assert_eq!(count_lines(left.path()).unwrap(), 3);
    }

    #[test]
    fn missing_file_is_an_error_naming_the_path() {
        let dir = TempDir::new().unwrap();
        let present = dir.child("present.txt");
        present.write_str("a\n").unwrap();
        let missing = dir.path().join("missing.txt");

        let err = compare_files(present.path(), &missing).unwrap_err();
        assert!(err.to_string().contains("missing.txt"));
    }
}
