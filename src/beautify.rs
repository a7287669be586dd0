//! Deterministic HTML re-indentation.
//!
//! Rendered pattern markup is stored in the manifest and shown as source in
//! the styleguide, so it must not depend on how a template happened to be
//! indented. The beautifier works line by line: every line is trimmed and
//! re-indented by element depth, blank lines are dropped, and the contents of
//! `pre`, `textarea`, `script` and `style` are passed through untouched.
//!
//! Output depends only on the trimmed line sequence, so running it twice gives
//! the same text as running it once.

/// Indentation unit for nested elements.
#[derive(Debug, Clone, PartialEq)]
pub struct Indent {
    pub use_tabs: bool,
    pub size: usize,
}

impl Default for Indent {
    fn default() -> Self {
        Self {
            use_tabs: true,
            size: 1,
        }
    }
}

impl Indent {
    fn unit(&self) -> String {
        let ch = if self.use_tabs { "\t" } else { " " };
        ch.repeat(self.size)
    }
}

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

const RAW_TEXT_ELEMENTS: &[&str] = &["pre", "textarea", "script", "style"];

#[derive(Debug, PartialEq)]
enum Tag {
    Open(String),
    Close(String),
}

#[derive(Default)]
struct LineScan {
    tags: Vec<Tag>,
    /// The line ends inside a `<!--` comment.
    opens_comment: bool,
    /// A raw-text element opened on this line and is still open at its end.
    opens_raw: Option<String>,
}

/// Re-indent `html` by element depth.
pub fn beautify(html: &str, indent: &Indent) -> String {
    let unit = indent.unit();
    let normalized = html.replace("\r\n", "\n");

    let mut out: Vec<String> = Vec::new();
    let mut depth = 0usize;
    let mut raw: Option<String> = None;
    let mut in_comment = false;

    for line in normalized.split('\n') {
        if let Some(name) = &raw {
            out.push(line.trim_end().to_string());
            let lower = line.to_ascii_lowercase();
            if let Some(close) = lower.find(&format!("</{name}")) {
                depth = depth.saturating_sub(1);
                // Markup after the closing tag still counts toward depth.
                let after = line[close..].find('>').map_or(line.len(), |end| close + end + 1);
                let scan = scan_line(&line[after..]);
                depth = apply_tags(&scan.tags, depth);
                in_comment = scan.opens_comment;
                raw = scan.opens_raw;
            }
            continue;
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        if in_comment {
            out.push(format!("{}{}", unit.repeat(depth), trimmed));
            if trimmed.contains("-->") {
                in_comment = false;
            }
            continue;
        }

        let scan = scan_line(trimmed);
        let mut running = depth;
        let mut print_depth = depth;
        let mut seen_open = false;
        for tag in &scan.tags {
            match tag {
                Tag::Close(_) => {
                    running = running.saturating_sub(1);
                    if !seen_open {
                        print_depth = print_depth.min(running);
                    }
                }
                Tag::Open(_) => {
                    running += 1;
                    seen_open = true;
                }
            }
        }
        if !trimmed.starts_with("</") {
            print_depth = depth;
        }

        out.push(format!("{}{}", unit.repeat(print_depth), trimmed));
        depth = running;
        in_comment = scan.opens_comment;
        raw = scan.opens_raw;
    }

    out.join("\n")
}

fn apply_tags(tags: &[Tag], depth: usize) -> usize {
    tags.iter().fold(depth, |d, tag| match tag {
        Tag::Open(_) => d + 1,
        Tag::Close(_) => d.saturating_sub(1),
    })
}

fn scan_line(line: &str) -> LineScan {
    let mut scan = LineScan::default();
    let bytes = line.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b'<' {
            i += 1;
            continue;
        }
        let rest = &line[i..];

        if rest.starts_with("<!--") {
            match rest[4..].find("-->") {
                Some(end) => i += 4 + end + 3,
                None => {
                    scan.opens_comment = true;
                    break;
                }
            }
            continue;
        }
        if rest.starts_with("<!") || rest.starts_with("<?") {
            i += rest.find('>').map_or(rest.len(), |end| end + 1);
            continue;
        }

        let closing = rest.starts_with("</");
        let name_start = if closing { 2 } else { 1 };
        let name: String = rest[name_start..]
            .chars()
            .take_while(|c| c.is_ascii_alphanumeric() || *c == '-')
            .collect::<String>()
            .to_ascii_lowercase();
        if name.is_empty() || !name.starts_with(|c: char| c.is_ascii_alphabetic()) {
            i += 1;
            continue;
        }

        let tag_end = find_tag_end(rest);
        let self_closing = tag_end.is_some_and(|end| rest[..end].ends_with('/'));

        if closing {
            scan.tags.push(Tag::Close(name));
        } else if !self_closing && !VOID_ELEMENTS.contains(&name.as_str()) {
            // A raw-text element closed on the same line nets to zero depth.
            if RAW_TEXT_ELEMENTS.contains(&name.as_str())
                && let Some(close) = rest.to_ascii_lowercase().find(&format!("</{name}"))
            {
                i += close + 2 + name.len();
                i += line[i..].find('>').map_or(line.len() - i, |end| end + 1);
                continue;
            }
            if RAW_TEXT_ELEMENTS.contains(&name.as_str()) {
                // The rest of the line is raw content.
                scan.tags.push(Tag::Open(name.clone()));
                scan.opens_raw = Some(name);
                break;
            }
            scan.tags.push(Tag::Open(name));
        }

        i += tag_end.map_or(rest.len(), |end| end + 1);
    }

    scan
}

/// Byte offset of the `>` closing the tag that starts `tag`, skipping quoted
/// attribute values.
fn find_tag_end(tag: &str) -> Option<usize> {
    let mut quote: Option<char> = None;
    for (idx, c) in tag.char_indices() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if c == '"' || c == '\'' => quote = Some(c),
            None if c == '>' => return Some(idx),
            None => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn tabs(html: &str) -> String {
        beautify(html, &Indent::default())
    }

    #[test]
    fn nests_by_depth_with_tabs() {
        let html = "<ul>\n<li>one</li>\n<li>\n<a href=\"#\">two</a>\n</li>\n</ul>";
        assert_eq!(
            tabs(html),
            "<ul>\n\t<li>one</li>\n\t<li>\n\t\t<a href=\"#\">two</a>\n\t</li>\n</ul>"
        );
    }

    #[test]
    fn reindents_badly_indented_input_and_drops_blank_lines() {
        let html = "        <div class=\"card\">\n\n  <p>body</p>\n            </div>\n";
        assert_eq!(tabs(html), "<div class=\"card\">\n\t<p>body</p>\n</div>");
    }

    #[test]
    fn void_and_self_closing_elements_do_not_nest() {
        let html = "<div>\n<img src=\"a.png\">\n<br/>\n<span>x</span>\n</div>";
        assert_eq!(
            tabs(html),
            "<div>\n\t<img src=\"a.png\">\n\t<br/>\n\t<span>x</span>\n</div>"
        );
    }

    #[test]
    fn pre_content_untouched() {
        let html = "<div>\n<pre>\n  keep\n      this\n</pre>\n</div>";
        assert_eq!(tabs(html), "<div>\n\t<pre>\n  keep\n      this\n</pre>\n</div>");
    }

    #[test]
    fn code_block_inside_pre_untouched() {
        let html = "<div>\n<pre><code>fn main() {\n    body();\n}</code></pre>\n</div>";
        assert_eq!(
            tabs(html),
            "<div>\n\t<pre><code>fn main() {\n    body();\n}</code></pre>\n</div>"
        );
    }

    #[test]
    fn unclosed_code_block_keeps_indentation() {
        assert_eq!(
            tabs("<pre><code>fn main() {\n    body();\n}"),
            "<pre><code>fn main() {\n    body();\n}"
        );
    }

    #[test]
    fn markup_after_closing_pre_still_counts() {
        let html = "<section>\n<div>\n<pre>\n  x\n</pre></div>\n<p>y</p>\n</section>";
        assert_eq!(
            tabs(html),
            "<section>\n\t<div>\n\t\t<pre>\n  x\n</pre></div>\n\t<p>y</p>\n</section>"
        );
    }

    #[test]
    fn comments_and_quoted_brackets_ignored() {
        let html = "<div data-x=\"a>b\">\n<!-- <section> -->\n<p>y</p>\n</div>";
        assert_eq!(
            tabs(html),
            "<div data-x=\"a>b\">\n\t<!-- <section> -->\n\t<p>y</p>\n</div>"
        );
    }

    #[test]
    fn spaces_when_configured() {
        let indent = Indent {
            use_tabs: false,
            size: 2,
        };
        assert_eq!(beautify("<p>\ntext\n</p>", &indent), "<p>\n  text\n</p>");
    }

    #[test]
    fn idempotent() {
        let html = "<section>\r\n  <header><h1>T</h1></header>\r\n<div>\n<pre>\n x\n</pre>\n<ul><li>a</li>\n<li>b</li></ul>\n</div>\n</section>";
        let once = tabs(html);
        assert_eq!(tabs(&once), once);
    }

    #[test]
    fn stray_closing_tags_do_not_underflow() {
        assert_eq!(tabs("</div>\n<p>x</p>"), "</div>\n<p>x</p>");
    }
}
