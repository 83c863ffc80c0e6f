//! Terminal formatting for model-written Markdown.

use std::sync::LazyLock;

use regex::Regex;

use super::{Line, Span, Style};

/// How Markdown is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkdownMode {
    /// Markers are replaced by styling: headings lose their `#`, bullets become `•`.
    Styled,
    /// Markers are kept and coloured, so the output stays valid Markdown.
    Source,
}

#[allow(clippy::unwrap_used)] // Compile-time constant regex pattern
static HEADING_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(#{1,6})\s+(.*)$").unwrap());

#[allow(clippy::unwrap_used)] // Compile-time constant regex pattern
static BULLET_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\s*)[-*+]\s+(.*)$").unwrap());

#[allow(clippy::unwrap_used)] // Compile-time constant regex pattern
static NUMBERED_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\s*)(\d+)[.)]\s+(.*)$").unwrap());

#[allow(clippy::unwrap_used)] // Compile-time constant regex pattern
static INLINE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\*\*([^*]+)\*\*|`([^`]+)`|\b(\d+(?:\.\d+)?%|\d+ commits?\b|\d+ files?\b)").unwrap()
});

/// Formats Markdown into styled lines.
pub fn format_markdown(text: &str, mode: MarkdownMode) -> Vec<Line> {
    let mut lines = Vec::new();
    let mut in_code = false;

    for raw in text.lines() {
        if raw.trim_start().starts_with("```") {
            in_code = !in_code;
            if mode == MarkdownMode::Source {
                lines.push(vec![Span::new(raw, Style::Code)]);
            }
            continue;
        }
        if in_code {
            lines.push(vec![Span::new(raw, Style::Code)]);
            continue;
        }
        lines.push(format_line(raw, mode));
    }
    lines
}

fn format_line(raw: &str, mode: MarkdownMode) -> Line {
    if raw.trim().is_empty() {
        return Vec::new();
    }

    if let Some(caps) = HEADING_PATTERN.captures(raw) {
        let text = match mode {
            MarkdownMode::Styled => caps[2].trim().to_string(),
            MarkdownMode::Source => raw.to_string(),
        };
        return vec![Span::new(text, Style::Heading)];
    }

    if let Some(caps) = BULLET_PATTERN.captures(raw) {
        let indent = &caps[1];
        let marker = match mode {
            MarkdownMode::Styled if indent.is_empty() => "• ",
            MarkdownMode::Styled => "◦ ",
            MarkdownMode::Source => "- ",
        };
        let mut line = vec![Span::new(format!("{indent}{marker}"), Style::Label)];
        line.extend(inline_spans(&caps[2], mode));
        return line;
    }

    if let Some(caps) = NUMBERED_PATTERN.captures(raw) {
        let mut line = vec![Span::new(format!("{}{}. ", &caps[1], &caps[2]), Style::Label)];
        line.extend(inline_spans(&caps[3], mode));
        return line;
    }

    inline_spans(raw, mode)
}

/// Splits a line into bold, code, metric and plain runs.
pub fn inline_spans(text: &str, mode: MarkdownMode) -> Line {
    let mut spans = Vec::new();
    let mut last = 0;

    for caps in INLINE_PATTERN.captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        if whole.start() > last {
            spans.push(Span::plain(&text[last..whole.start()]));
        }
        let span = if let Some(bold) = caps.get(1) {
            match mode {
                MarkdownMode::Styled => Span::new(bold.as_str(), Style::Bold),
                MarkdownMode::Source => Span::new(whole.as_str(), Style::Bold),
            }
        } else if let Some(code) = caps.get(2) {
            match mode {
                MarkdownMode::Styled => Span::new(code.as_str(), Style::Code),
                MarkdownMode::Source => Span::new(whole.as_str(), Style::Code),
            }
        } else {
            Span::new(whole.as_str(), Style::Metric)
        };
        spans.push(span);
        last = whole.end();
    }

    if last < text.len() {
        spans.push(Span::plain(&text[last..]));
    }
    spans
}
