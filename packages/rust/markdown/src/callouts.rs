//! Blockquote-to-callout rewriting.
//!
//! Contiguous blockquote lines form one group. The group's first line picks a
//! rule from an ordered table; labelled rules come before the generic
//! fallback so `> **Warning:**` never degrades to a plain note.

use std::sync::LazyLock;

use regex::Regex;

use crate::lines::{Line, scan_lines};

/// Severity tag carried by a callout directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Note,
    Tip,
    Caution,
    Danger,
}

impl Severity {
    const ALL: [Severity; 4] = [Self::Note, Self::Tip, Self::Caution, Self::Danger];

    /// Directive name, e.g. `caution` in `:::caution`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Note => "note",
            Self::Tip => "tip",
            Self::Caution => "caution",
            Self::Danger => "danger",
        }
    }
}

struct Rule {
    pattern: Regex,
    severity: Severity,
}

/// Ordered rules. The last entry matches any blockquote.
static RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    let labelled = [
        ("note", Severity::Note),
        ("tip", Severity::Tip),
        ("warning", Severity::Caution),
        ("caution", Severity::Caution),
        ("important", Severity::Note),
        ("danger", Severity::Danger),
    ];

    labelled
        .into_iter()
        .map(|(label, severity)| Rule {
            // `> **Note:** text`, `> **Note**: text` and `> [!NOTE] text`
            pattern: Regex::new(&format!(
                r"(?i)^>\s*(?:\*\*{label}\s*:?\*\*\s*:?|\[!{label}\])\s*(.*)$"
            ))
            .expect("valid regex"),
            severity,
        })
        .chain(std::iter::once(Rule {
            pattern: Regex::new(r"^>\s?(.*)$").expect("valid regex"),
            severity: Severity::Note,
        }))
        .collect()
});

/// Rewrite every blockquote group outside code fences into a callout.
pub(crate) fn rewrite_callouts(md: &str) -> String {
    let lines: Vec<Line<'_>> = scan_lines(md).collect();
    let mut out: Vec<String> = Vec::with_capacity(lines.len());
    let mut in_callout = false;
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i];

        if !line.in_code {
            let trimmed = line.text.trim();
            if in_callout && trimmed == ":::" {
                in_callout = false;
            } else if !in_callout && is_callout_opener(trimmed) {
                in_callout = true;
            }
        }

        if line.in_code || in_callout || !is_quote(line.text) {
            out.push(line.text.to_string());
            i += 1;
            continue;
        }

        let group_end = lines[i..]
            .iter()
            .position(|l| l.in_code || !is_quote(l.text))
            .map_or(lines.len(), |p| i + p);

        out.extend(render_callout(&lines[i..group_end]));
        i = group_end;
    }

    let mut result = out.join("\n");
    if md.ends_with('\n') {
        result.push('\n');
    }
    result
}

/// `:::note`, `:::tip[Title]` and the like. Other `:::` lines are content.
fn is_callout_opener(trimmed: &str) -> bool {
    trimmed.strip_prefix(":::").is_some_and(|rest| {
        let name = rest.split(['[', '{', ' ']).next().unwrap_or("");
        Severity::ALL.iter().any(|s| s.as_str() == name)
    })
}

/// A blockquote line with at most three spaces of indentation.
fn is_quote(line: &str) -> bool {
    let trimmed = line.trim_start_matches(' ');
    trimmed.starts_with('>') && line.len() - trimmed.len() <= 3
}

/// Remove one level of `>` and the optional space after it.
fn strip_quote(line: &str) -> &str {
    let rest = &line.trim_start()[1..];
    rest.strip_prefix(' ').unwrap_or(rest)
}

fn render_callout(group: &[Line<'_>]) -> Vec<String> {
    let first = group[0].text;
    let indent = &first[..first.len() - first.trim_start().len()];
    let first = first.trim_start();

    let (severity, lead) = RULES
        .iter()
        .find_map(|rule| {
            rule.pattern
                .captures(first)
                .map(|caps| (rule.severity, caps.get(1).map_or("", |m| m.as_str())))
        })
        .unwrap_or((Severity::Note, strip_quote(first)));

    let mut body: Vec<&str> = Vec::with_capacity(group.len());
    if !lead.trim().is_empty() {
        body.push(lead.trim_end());
    }
    body.extend(group[1..].iter().map(|l| strip_quote(l.text).trim_end()));
    while body.last().is_some_and(|l| l.is_empty()) {
        body.pop();
    }
    while body.first().is_some_and(|l| l.is_empty()) {
        body.remove(0);
    }

    let mut out = Vec::with_capacity(body.len() + 2);
    out.push(format!("{indent}:::{}", severity.as_str()));
    out.extend(body.into_iter().map(|l| {
        if l.is_empty() {
            String::new()
        } else {
            format!("{indent}{l}")
        }
    }));
    out.push(format!("{indent}:::"));
    out
}
