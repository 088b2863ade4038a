//! Heading-delimited sections of a page's markdown.
//!
//! Sections are recomputed on every call and never stored on the page.

use regex::Regex;
use std::sync::LazyLock;

use crate::models::{derive_section_anchor, Page, Section};

/// Markdown heading line, levels 1 through 4.
static HEADING_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(#{1,4})\s+(.+)$").expect("heading line regex"));

/// Split `page.content` into sections at heading lines.
///
/// Lines before the first heading are discarded, and sections whose body is
/// empty after trimming are dropped.
pub fn extract_sections(page: &Page) -> Vec<Section> {
    let mut sections = Vec::new();
    let mut current: Option<(&str, Vec<&str>)> = None;

    for line in page.content.split('\n') {
        if let Some(caps) = HEADING_LINE.captures(line) {
            if let Some((title, body)) = current.take() {
                push_section(&mut sections, page, title, &body);
            }
            let title = caps.get(2).map_or("", |m| m.as_str());
            current = Some((title, Vec::new()));
        } else if let Some((_, body)) = current.as_mut() {
            body.push(line);
        }
    }

    if let Some((title, body)) = current {
        push_section(&mut sections, page, title, &body);
    }

    sections
}

fn push_section(sections: &mut Vec<Section>, page: &Page, title: &str, body: &[&str]) {
    let content = body.join("\n").trim().to_string();
    if content.is_empty() {
        return;
    }
    sections.push(Section {
        title: title.to_string(),
        anchor: derive_section_anchor(title),
        content,
        page_path: page.path.clone(),
    });
}
