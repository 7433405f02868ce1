// ============================================================
// Layer 4 — Text Preprocessor
// ============================================================
// Cleans corpus text before it is split into words.
//
// Dataset dumps often contain:
//   - Non-breaking or zero-width spaces
//   - Carriage returns from Windows line endings
//   - Tabs and runs of spaces
//   - Stray control characters
//
// Left alone, these would end up inside vocabulary entries.
// Line structure is preserved (one corpus line is one sentence)
// but blank lines carry no sentence and are dropped.

pub struct Preprocessor;

impl Preprocessor {
    pub fn new() -> Self {
        Self
    }

    /// Clean raw corpus text, keeping one sentence per line.
    pub fn clean(&self, text: &str) -> String {
        text.split(['\n', '\r'])
            .map(|line| self.clean_line(line))
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Normalise a single line: odd whitespace and control
    /// characters become spaces, runs of spaces collapse to one.
    pub fn clean_line(&self, line: &str) -> String {
        let words = line
            .split(|c: char| c.is_whitespace() || c.is_control() || is_invisible(c))
            .filter(|w| !w.is_empty());

        words.collect::<Vec<_>>().join(" ")
    }
}

/// Zero-width characters that `char::is_whitespace` does not cover
fn is_invisible(c: char) -> bool {
    matches!(c, '\u{200B}' | '\u{FEFF}')
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapses_multiple_spaces() {
        let p = Preprocessor::new();
        assert_eq!(p.clean("hello   world"), "hello world");
    }

    #[test]
    fn test_trims_edges() {
        let p = Preprocessor::new();
        assert_eq!(p.clean("  hello world  "), "hello world");
    }

    #[test]
    fn test_removes_control_chars() {
        let p = Preprocessor::new();
        assert_eq!(p.clean("hello\x01world"), "hello world");
    }

    #[test]
    fn test_keeps_sentence_lines() {
        let p = Preprocessor::new();
        assert_eq!(p.clean("the cat\r\n\n\na\u{00A0}dog\u{200B}"), "the cat\na dog");
    }

    #[test]
    fn test_keeps_case() {
        let p = Preprocessor::new();
        assert_eq!(p.clean("The Cat"), "The Cat");
    }

    #[test]
    fn test_empty_string() {
        let p = Preprocessor::new();
        assert_eq!(p.clean(""), "");
    }
}
