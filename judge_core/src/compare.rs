pub enum ComparisionResult {
    Same,
    Different,
}

pub trait ComparisionMode: Send + Sync {
    fn compare(&self, expected: &str, actual: &str) -> ComparisionResult;
}

/// Collapses every whitespace run (spaces, tabs, newlines) into one space and
/// trims both ends. Applying it twice yields the same string.
pub fn normalize(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Exact comparison after [`normalize`] on both sides.
pub struct WhitespaceCompare;

impl ComparisionMode for WhitespaceCompare {
    fn compare(&self, expected: &str, actual: &str) -> ComparisionResult {
        if normalize(expected) == normalize(actual) {
            ComparisionResult::Same
        } else {
            ComparisionResult::Different
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapse_runs() {
        assert_eq!(normalize("  1 \t 2\n\n3  "), "1 2 3");
        assert_eq!(normalize("\n\r\n"), "");
        assert_eq!(normalize("42"), "42");
    }

    #[test]
    fn normalize_is_idempotent() {
        for s in &["", " a  b ", "x\ty\nz", "\n42\n", "a\r\nb \u{00a0} c"] {
            let once = normalize(s);
            assert_eq!(normalize(&once), once);
        }
    }

    #[test]
    fn whitespace_insensitive() {
        assert!(matches!(
            WhitespaceCompare {}.compare("42\n", "  42  "),
            ComparisionResult::Same
        ));
        assert!(matches!(
            WhitespaceCompare {}.compare("1 2", "1\n2"),
            ComparisionResult::Same
        ));
        assert!(matches!(
            WhitespaceCompare {}.compare("42", "43"),
            ComparisionResult::Different
        ));
        assert!(matches!(
            WhitespaceCompare {}.compare("12", "1 2"),
            ComparisionResult::Different
        ));
    }
}
