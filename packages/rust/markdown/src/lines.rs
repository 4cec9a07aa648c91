//! Line scanning shared by the locator, normalizer and merge code.
//!
//! Every consumer needs the same two facts about a line: where it starts in
//! the original text, and whether it sits inside a fenced code block.

/// One line of a document, without its line terminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Line<'a> {
    /// Byte offset of the first character of the line.
    pub start: usize,
    /// Line text with `\n` / `\r\n` stripped.
    pub text: &'a str,
    /// True for fence lines and everything between them.
    pub in_code: bool,
}

impl Line<'_> {
    /// Byte offset just past the line text (before its terminator).
    pub fn end(&self) -> usize {
        self.start + self.text.len()
    }
}

/// Iterate over the lines of `text`, tracking fenced code blocks.
pub fn scan_lines(text: &str) -> impl Iterator<Item = Line<'_>> {
    let mut offset = 0;
    let mut fence: Option<(char, usize)> = None;

    text.split_inclusive('\n').map(move |raw| {
        let start = offset;
        offset += raw.len();
        let line = raw.trim_end_matches('\n').trim_end_matches('\r');

        let in_code = match (fence, fence_marker(line)) {
            (None, Some(open)) => {
                fence = Some(open);
                true
            }
            (Some((ch, len)), Some((close_ch, close_len)))
                if ch == close_ch
                    && close_len >= len
                    && line.trim().trim_start_matches(ch).is_empty() =>
            {
                fence = None;
                true
            }
            (Some(_), _) => true,
            (None, None) => false,
        };

        Line {
            start,
            text: line,
            in_code,
        }
    })
}

/// Detect a code fence (```` ``` ```` or `~~~`, up to three spaces of indent).
fn fence_marker(line: &str) -> Option<(char, usize)> {
    let indent = line.len() - line.trim_start_matches(' ').len();
    if indent > 3 {
        return None;
    }
    let rest = &line[indent..];
    let ch = rest.chars().next().filter(|c| *c == '`' || *c == '~')?;
    let len = rest.chars().take_while(|c| *c == ch).count();
    (len >= 3).then_some((ch, len))
}

/// ATX heading level (1–6) of a line, or `None` if it is not a heading.
pub fn heading_level(line: &str) -> Option<usize> {
    let indent = line.len() - line.trim_start_matches(' ').len();
    if indent > 3 {
        return None;
    }
    let rest = &line[indent..];
    let level = rest.chars().take_while(|c| *c == '#').count();
    if !(1..=6).contains(&level) {
        return None;
    }
    match rest[level..].chars().next() {
        None | Some(' ') | Some('\t') => Some(level),
        _ => None,
    }
}

/// Strip whitespace-only lines from both ends of `s`.
///
/// Unlike `str::trim`, indentation of the first content line and trailing
/// spaces of the last content line are kept.
pub fn trim_blank_lines(s: &str) -> &str {
    let Some(first) = s.find(|c: char| !c.is_whitespace()) else {
        return "";
    };
    let start = s[..first].rfind('\n').map_or(0, |i| i + 1);

    let last = s
        .rfind(|c: char| !c.is_whitespace())
        .unwrap_or(first);
    let end = s[last..].find('\n').map_or(s.len(), |i| last + i);
    let end = if s[..end].ends_with('\r') { end - 1 } else { end };

    &s[start..end]
}

/// Join non-empty blocks with exactly one blank line and end with a newline.
pub fn join_blocks<'a>(blocks: impl IntoIterator<Item = &'a str>) -> String {
    let mut out = String::new();
    for block in blocks {
        let block = trim_blank_lines(block);
        if block.is_empty() {
            continue;
        }
        if !out.is_empty() {
            out.push_str("\n\n");
        }
        out.push_str(block);
    }
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scan_tracks_offsets() {
        let text = "a\r\nbb\nccc";
        let lines: Vec<_> = scan_lines(text).collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1].start, 3);
        assert_eq!(lines[1].text, "bb");
        assert_eq!(lines[2].start, 6);
        assert_eq!(&text[lines[2].start..lines[2].end()], "ccc");
    }

    #[test]
    fn scan_marks_fenced_code() {
        let text = "## A\n```sh\n## not a heading\n```\n## B";
        let flags: Vec<bool> = scan_lines(text).map(|l| l.in_code).collect();
        assert_eq!(flags, vec![false, true, true, true, false]);
    }

    #[test]
    fn fence_needs_matching_char() {
        let text = "~~~\n```\nstill code\n~~~\nout";
        let flags: Vec<bool> = scan_lines(text).map(|l| l.in_code).collect();
        assert_eq!(flags, vec![true, true, true, true, false]);
    }

    #[test]
    fn heading_levels() {
        assert_eq!(heading_level("# Title"), Some(1));
        assert_eq!(heading_level("### Deep"), Some(3));
        assert_eq!(heading_level("##"), Some(2));
        assert_eq!(heading_level("#hashtag"), None);
        assert_eq!(heading_level("####### seven"), None);
        assert_eq!(heading_level("    # indented code"), None);
        assert_eq!(heading_level("plain"), None);
    }

    #[test]
    fn trim_blank_lines_keeps_inner_whitespace() {
        assert_eq!(trim_blank_lines("\n\n  indented\nlast  \n\n"), "  indented\nlast  ");
        assert_eq!(trim_blank_lines(" \n\t\n"), "");
        assert_eq!(trim_blank_lines("x\r\n\r\n"), "x");
    }

    #[test]
    fn join_blocks_single_blank_line() {
        let out = join_blocks(["a\n\n\n", "", "\n\nb"]);
        assert_eq!(out, "a\n\nb\n");
    }
}
