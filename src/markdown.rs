//! HTML to markdown conversion.
//!
//! A deliberately small converter: it walks every element below the selected
//! containers in document order and emits markdown for headings (levels 1-4),
//! paragraphs, preformatted blocks, list items and links. Everything inside
//! `script`, `style` and `nav` is ignored. Output is raw; whitespace cleanup
//! is left to the caller.

use regex::Regex;
use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use std::sync::LazyLock;

static CODE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("code").expect("code selector"));

static LANGUAGE_CLASS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"language-(\w+)").expect("language class regex"));

/// Elements whose subtree never contributes text.
fn is_stripped(tag: &str) -> bool {
    matches!(tag, "script" | "style" | "nav")
}

/// Convert the descendants of every element matching `selector` to markdown.
pub fn convert(document: &Html, selector: &Selector) -> String {
    let mut markdown = String::new();
    let mut visited = HashSet::new();

    for root in document.select(selector) {
        for element in root.descendent_elements() {
            if element.id() == root.id() || !visited.insert(element.id()) {
                continue;
            }
            if is_hidden(element, root) {
                continue;
            }
            emit(element, &mut markdown);
        }
    }

    markdown
}

/// True when `element` is, or sits below, a stripped element inside `root`.
fn is_hidden(element: ElementRef<'_>, root: ElementRef<'_>) -> bool {
    if is_stripped(element.value().name()) {
        return true;
    }
    for ancestor in element.ancestors() {
        if ancestor.id() == root.id() {
            break;
        }
        if let Some(el) = ancestor.value().as_element() {
            if is_stripped(el.name()) {
                return true;
            }
        }
    }
    false
}

fn emit(element: ElementRef<'_>, markdown: &mut String) {
    let tag = element.value().name();
    match tag {
        "h1" | "h2" | "h3" | "h4" => {
            let level = tag[1..].parse::<usize>().unwrap_or(1);
            let text = visible_text(element);
            markdown.push('\n');
            markdown.push_str(&"#".repeat(level));
            markdown.push(' ');
            markdown.push_str(text.trim());
            markdown.push_str("\n\n");
        }
        "p" => {
            markdown.push_str(visible_text(element).trim());
            markdown.push_str("\n\n");
        }
        "pre" => {
            let (code, lang) = code_block(element);
            markdown.push_str("\n```");
            markdown.push_str(&lang);
            markdown.push('\n');
            markdown.push_str(code.trim());
            markdown.push_str("\n```\n\n");
        }
        "li" => {
            markdown.push_str("- ");
            markdown.push_str(visible_text(element).trim());
            markdown.push('\n');
        }
        "a" => {
            let Some(href) = element.value().attr("href") else {
                return;
            };
            let text = visible_text(element);
            let text = text.trim();
            if !href.is_empty() && !text.is_empty() && !markdown.contains(text) {
                markdown.push_str(&format!("[{}]({}) ", text, href));
            }
        }
        _ => {}
    }
}

/// Code text and language tag of a `pre` block.
///
/// Text comes from nested `code` elements when they have any, otherwise
/// from the `pre` itself. The language is the `language-xxx` class token of
/// the first nested `code` element.
fn code_block(pre: ElementRef<'_>) -> (String, String) {
    let mut code = String::new();
    let mut lang = String::new();

    for (i, el) in pre.select(&CODE).enumerate() {
        if i == 0 {
            if let Some(caps) = el
                .value()
                .attr("class")
                .and_then(|class| LANGUAGE_CLASS.captures(class))
            {
                lang = caps[1].to_string();
            }
        }
        code.push_str(&visible_text(el));
    }

    if code.is_empty() {
        code = visible_text(pre);
    }
    (code, lang)
}

/// Concatenated text of `element`, skipping stripped subtrees.
pub fn visible_text(element: ElementRef<'_>) -> String {
    let mut out = String::new();
    collect_text(element, &mut out);
    out
}

fn collect_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) if !is_stripped(el.name()) => {
                if let Some(child_el) = ElementRef::wrap(child) {
                    collect_text(child_el, out);
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn convert_str(html: &str, selector: &str) -> String {
        let document = Html::parse_document(html);
        let selector = Selector::parse(selector).unwrap();
        convert(&document, &selector)
    }

    #[test]
    fn test_headings_and_paragraphs() {
        let md = convert_str(
            "<main><h1>Title</h1><p>Hello <b>world</b>.</p><h3> Deep </h3><h5>Ignored</h5></main>",
            "main",
        );
        assert_eq!(md, "\n# Title\n\nHello world.\n\n\n### Deep\n\n");
    }

    #[test]
    fn test_code_block_language() {
        let md = convert_str(
            r#"<main><pre><code class="language-bash">curl -fsSL x | bash
</code></pre></main>"#,
            "main",
        );
        assert_eq!(md, "\n```bash\ncurl -fsSL x | bash\n```\n\n");
    }

    #[test]
    fn test_code_block_without_code_element() {
        let md = convert_str("<main><pre>  plain  </pre></main>", "main");
        assert_eq!(md, "\n```\nplain\n```\n\n");
    }

    #[test]
    fn test_list_items_and_links() {
        let md = convert_str(
            r#"<main><ul><li>One</li><li>Two</li></ul><a href="/docs/x">Elsewhere</a></main>"#,
            "main",
        );
        assert_eq!(md, "- One\n- Two\n[Elsewhere](/docs/x) ");
    }

    #[test]
    fn test_link_already_emitted_is_skipped() {
        let md = convert_str(
            r#"<main><p>See <a href="/docs/config">Config</a></p></main>"#,
            "main",
        );
        assert_eq!(md, "See Config\n\n");
    }

    #[test]
    fn test_strips_script_style_nav() {
        let md = convert_str(
            "<main><nav><li>Menu</li></nav><p>Body<script>evil()</script></p><style>p{}</style></main>",
            "main",
        );
        assert_eq!(md, "Body\n\n");
    }
}
