//! Section locator: slice a source document between two heading boundaries.

use docsplice_shared::Boundary;

use crate::lines::scan_lines;

/// Return the text from the first line matching `start` (inclusive) up to the
/// first line matching `end` after it (exclusive), or to end of text.
///
/// Returns an empty string when `start` never matches. Lines inside fenced
/// code blocks are never treated as boundaries. The result is trimmed.
pub fn locate(source: &str, start: &Boundary, end: Option<&Boundary>) -> String {
    let mut lines = scan_lines(source).filter(|line| !line.in_code);

    let Some(first) = lines.by_ref().find(|line| start.is_match(line.text)) else {
        return String::new();
    };

    let stop = end
        .and_then(|end| lines.find(|line| end.is_match(line.text)))
        .map_or(source.len(), |line| line.start);

    source[first.start..stop].trim().to_string()
}
