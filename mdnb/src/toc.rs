//! Table-of-contents generation from the headings in prose segments.

use std::collections::HashMap;
use std::ops::Range;

use pulldown_cmark::{Event, HeadingLevel, Parser as CmarkParser, Tag, TagEnd};

use crate::segment::Segment;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Heading {
    pub level: u8,
    pub text: String,
    /// Unique GitHub-style anchor.
    pub slug: String,
    /// 1-based source line.
    pub line: usize,
}

/// Collect every heading from the prose segments, in document order, with
/// de-duplicated slugs. Headings inside fenced blocks are never seen because
/// code segments are skipped.
pub fn collect_headings(segments: &[Segment]) -> Vec<Heading> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut headings = Vec::new();

    for segment in segments.iter().filter(|s| s.is_prose()) {
        let events: Vec<(Event<'_>, Range<usize>)> =
            CmarkParser::new(&segment.content).into_offset_iter().collect();
        let mut i = 0;
        while i < events.len() {
            let (ref ev, ref range) = events[i];
            i += 1;
            let Event::Start(Tag::Heading { level, .. }) = ev else {
                continue;
            };
            let text = normalize_heading_text(&collect_heading_text(&events, &mut i));
            if text.is_empty() {
                continue;
            }
            let line = segment.start_line + segment.content[..range.start].matches('\n').count();
            let slug = unique_slug(&mut seen, slugify(&text));
            headings.push(Heading {
                level: heading_level_to_u8(level),
                text,
                slug,
                line,
            });
        }
    }

    headings
}

/// Render the TOC cell source: a title and a nested link list.
pub fn render(headings: &[Heading], title: &str, max_level: u8) -> Vec<String> {
    let listed: Vec<&Heading> = headings.iter().filter(|h| h.level <= max_level).collect();
    let Some(top) = listed.iter().map(|h| h.level).min() else {
        return Vec::new();
    };

    let mut lines = vec![format!("## {}", title), String::new()];
    for heading in listed {
        let indent = "  ".repeat(usize::from(heading.level - top));
        lines.push(format!(
            "{}- [{}](#{})",
            indent,
            escape_link_text(&heading.text),
            heading.slug
        ));
    }
    lines
}

/// GitHub-style slug: lowercase alphanumerics, each whitespace character
/// becomes a hyphen, hyphens and underscores are kept, other punctuation is
/// dropped. Runs of hyphens are not collapsed.
pub fn slugify(text: &str) -> String {
    text.trim()
        .chars()
        .flat_map(|c| {
            let mapped = if c.is_alphanumeric() {
                Some(c)
            } else if c.is_whitespace() {
                Some('-')
            } else if c == '-' || c == '_' {
                Some(c)
            } else {
                None
            };
            mapped.into_iter().flat_map(char::to_lowercase)
        })
        .collect()
}

fn unique_slug(seen: &mut HashMap<String, usize>, slug: String) -> String {
    let count = seen.entry(slug.clone()).or_insert(0);
    let unique = if *count == 0 {
        slug
    } else {
        format!("{}-{}", slug, count)
    };
    *count += 1;
    unique
}

fn escape_link_text(text: &str) -> String {
    text.replace('[', "\\[").replace(']', "\\]")
}

fn heading_level_to_u8(level: &HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

/// Collect heading text (all Text and Code events until End(Heading)).
fn collect_heading_text(events: &[(Event<'_>, Range<usize>)], i: &mut usize) -> String {
    let mut text = String::new();
    while *i < events.len() {
        let (ref ev, _) = events[*i];
        *i += 1;
        match ev {
            Event::End(TagEnd::Heading(_)) => break,
            Event::Text(s) | Event::Code(s) => text.push_str(s),
            Event::SoftBreak | Event::HardBreak => text.push(' '),
            _ => {}
        }
    }
    text
}

/// Strip leading/trailing whitespace, collapse interior whitespace.
fn normalize_heading_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
