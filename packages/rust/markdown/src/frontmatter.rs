//! Frontmatter header and import/export preamble handling.

use docsplice_shared::PageMetadata;

use crate::lines::scan_lines;

/// A destination document split into its three regions.
///
/// `header` and `preamble` are exact slices of the input so a rewrite can
/// reproduce them byte-for-byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocumentParts<'a> {
    /// `---` fenced metadata block, fences included.
    pub header: Option<&'a str>,
    /// Import/export statements directly after the header.
    pub preamble: Option<&'a str>,
    /// Everything after the preamble, with surrounding blank lines removed.
    pub body: &'a str,
    /// Byte offset where the body region starts.
    pub body_start: usize,
}

/// Split a document into header, preamble and body.
pub fn split_document(text: &str) -> DocumentParts<'_> {
    let (header, mut pos) = match header_end(text) {
        Some(end) => (Some(&text[..end]), end),
        None => (None, 0),
    };

    let mut preamble_span: Option<(usize, usize)> = None;
    let mut depth: i32 = 0;
    let mut in_statement = false;

    for line in scan_lines(&text[pos..]) {
        let start = pos + line.start;
        let end = pos + line.end();
        let trimmed = line.text.trim();

        if in_statement {
            depth += brace_delta(trimmed);
            preamble_span = preamble_span.map(|(s, _)| (s, end));
            in_statement = depth > 0;
            continue;
        }
        if trimmed.is_empty() {
            continue;
        }
        if is_statement_start(trimmed) {
            depth = brace_delta(trimmed);
            in_statement = depth > 0;
            preamble_span = Some(preamble_span.map_or((start, end), |(s, _)| (s, end)));
            continue;
        }
        break;
    }

    let preamble = preamble_span.map(|(s, e)| {
        pos = e;
        &text[s..e]
    });

    let rest = &text[pos..];
    let body = rest.trim();
    let body_start = if body.is_empty() {
        text.len()
    } else {
        pos + (rest.len() - rest.trim_start().len())
    };

    DocumentParts {
        header,
        preamble,
        body,
        body_start,
    }
}

/// Byte offset just past the closing `---` of a leading frontmatter block.
fn header_end(text: &str) -> Option<usize> {
    let mut lines = scan_lines(text);
    let first = lines.next()?;
    if first.text.trim_end() != "---" {
        return None;
    }
    lines
        .find(|line| matches!(line.text.trim_end(), "---" | "..."))
        .map(|line| line.end())
}

fn is_statement_start(line: &str) -> bool {
    ["import ", "import{", "export ", "export{"]
        .iter()
        .any(|prefix| line.starts_with(prefix))
}

fn brace_delta(line: &str) -> i32 {
    line.chars().fold(0, |acc, c| match c {
        '{' => acc + 1,
        '}' => acc - 1,
        _ => acc,
    })
}

/// Build a frontmatter block from page metadata.
///
/// Returns `None` when there is no title or description to write. The block
/// has no trailing newline.
pub fn build_header(metadata: &PageMetadata) -> Option<String> {
    if metadata.is_empty() {
        return None;
    }
    let mut fm = String::from("---\n");
    if let Some(title) = &metadata.title {
        fm.push_str(&format!("title: \"{}\"\n", escape_yaml_string(title)));
    }
    if let Some(description) = &metadata.description {
        fm.push_str(&format!(
            "description: \"{}\"\n",
            escape_yaml_string(description)
        ));
    }
    fm.push_str("---");
    Some(fm)
}

/// Escape special characters in a YAML string value.
fn escape_yaml_string(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}
