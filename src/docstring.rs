//! Split documentation text into a summary and a reflowed description.

/// A reflowed docstring.
///
/// The first line is the summary. Every following run of non-blank lines is
/// a paragraph of the description. All paragraphs are wrapped to the same
/// width.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Docstring {
    summary: String,
    description: String,
}

impl Docstring {
    pub fn new(doc: Option<&str>, width: usize) -> Self {
        let (summary, description) = reflow(doc, width);
        Self {
            summary,
            description,
        }
    }

    /// The first paragraph, reflowed.
    pub fn summary(&self) -> &str {
        &self.summary
    }

    /// All paragraphs, reflowed and separated by blank lines.
    pub fn description(&self) -> &str {
        &self.description
    }
}

/// Reflow `doc` to `width` columns, returning `(summary, description)`.
pub fn reflow(doc: Option<&str>, width: usize) -> (String, String) {
    let Some(doc) = doc.map(clean) else {
        return (String::new(), String::new());
    };
    if doc.is_empty() {
        return (String::new(), String::new());
    }

    let mut summary = String::new();
    let mut parts = Vec::new();
    for para in paragraphs(doc) {
        let para = fill(&para, width);
        if summary.is_empty() {
            summary = para.clone();
        }
        parts.push(para);
    }

    (summary, parts.join("\n\n"))
}

// Leading blank lines and trailing whitespace never carry content.
fn clean(doc: &str) -> &str {
    let Some(first) = doc.find(|c: char| !c.is_whitespace()) else {
        return "";
    };
    let start = doc[..first].rfind('\n').map_or(0, |idx| idx + 1);
    doc[start..].trim_end()
}

fn paragraphs(doc: &str) -> Vec<String> {
    let mut lines = doc.lines();
    let mut out = Vec::new();
    if let Some(first) = lines.next() {
        out.push(first.trim().to_string());
    }

    let mut current: Vec<&str> = Vec::new();
    for line in lines {
        let stripped = line.trim();
        if stripped.is_empty() {
            if !current.is_empty() {
                out.push(current.join(" "));
                current.clear();
            }
        } else {
            current.push(stripped);
        }
    }
    if !current.is_empty() {
        out.push(current.join(" "));
    }
    out
}

/// Greedily wrap `text` so that no line exceeds `width` characters.
///
/// Whitespace is collapsed. Words longer than `width` are split, filling
/// whatever room is left on the current line first.
pub fn fill(text: &str, width: usize) -> String {
    let width = width.max(1);
    let mut lines = Vec::new();
    let mut line = String::new();
    let mut len = 0;

    for word in text.split_whitespace() {
        let mut word = word;
        loop {
            let word_len = word.chars().count();
            let sep = usize::from(len > 0);
            if len + sep + word_len <= width {
                if sep == 1 {
                    line.push(' ');
                }
                line.push_str(word);
                len += sep + word_len;
                break;
            }

            if word_len > width {
                let room = width.saturating_sub(len + sep);
                if room > 0 {
                    let split = word
                        .char_indices()
                        .nth(room)
                        .map_or(word.len(), |(idx, _)| idx);
                    if sep == 1 {
                        line.push(' ');
                    }
                    line.push_str(&word[..split]);
                    word = &word[split..];
                }
            }

            lines.push(std::mem::take(&mut line));
            len = 0;
        }
    }

    if !line.is_empty() {
        lines.push(line);
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    const INGEST_DOC: &str = "Load data into a destination.

    The data is read in chunks and each chunk is verified before it is
    written to the destination.

    Nothing is written if verification fails.";

    #[test]
    fn absent_and_empty_text_yield_nothing() {
        assert_eq!(reflow(None, 40), (String::new(), String::new()));
        assert_eq!(reflow(Some(""), 40), (String::new(), String::new()));
        assert_eq!(reflow(Some("  \n\n   "), 40), (String::new(), String::new()));
    }

    #[test]
    fn summary_only_text_has_matching_description() {
        let doc = Docstring::new(Some("Print the status."), 80);
        assert_eq!(doc.summary(), "Print the status.");
        assert_eq!(doc.summary(), doc.description());
    }

    #[test]
    fn first_line_is_its_own_paragraph() {
        let (summary, description) =
            reflow(Some("Short title\nbody text that follows\nwithout a gap"), 80);
        assert_eq!(summary, "Short title");
        assert_eq!(
            description,
            "Short title\n\nbody text that follows without a gap"
        );
    }

    #[test]
    fn paragraphs_are_wrapped_and_separated() {
        let doc = Docstring::new(Some(INGEST_DOC), 30);
        assert_eq!(doc.summary(), "Load data into a destination.");
        assert_eq!(
            doc.description(),
            "Load data into a destination.\n\n\
             The data is read in chunks and\n\
             each chunk is verified before\n\
             it is written to the\n\
             destination.\n\n\
             Nothing is written if\n\
             verification fails."
        );
    }

    #[test]
    fn leading_blank_lines_are_ignored() {
        let (summary, _) = reflow(Some("\n\n   Sync the database.\n"), 80);
        assert_eq!(summary, "Sync the database.");
    }

    #[test]
    fn repeated_blank_lines_separate_once() {
        let (_, description) = reflow(Some("Title\n\none\n\n\n\ntwo"), 80);
        assert_eq!(description, "Title\n\none\n\ntwo");
    }

    #[test]
    fn wrapped_lines_respect_width() {
        for width in [8, 13, 21, 34] {
            let (_, description) = reflow(Some(INGEST_DOC), width);
            for line in description.lines() {
                assert!(
                    line.chars().count() <= width,
                    "{:?} is wider than {}",
                    line,
                    width
                );
            }
        }
    }

    #[test]
    fn long_words_fill_the_current_line_first() {
        assert_eq!(fill("ab cdefghijkl", 5), "ab cd\nefghi\njkl");
        assert_eq!(fill("abcdefghij", 4), "abcd\nefgh\nij");
    }

    #[test]
    fn fill_collapses_whitespace() {
        assert_eq!(fill("  a\tb \n c  ", 80), "a b c");
        assert_eq!(fill("", 10), "");
    }

    #[test]
    fn zero_width_is_treated_as_one() {
        assert_eq!(fill("ab c", 0), "a\nb\nc");
    }
}
