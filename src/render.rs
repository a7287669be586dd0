//! Template rendering.
//!
//! Patterns are Handlebars templates. Every collated pattern is registered as a
//! partial under its key, so `{{> atoms-button}}` works from any other pattern
//! or page, and as a helper of the same name that emits the rendered markup
//! with extra classes on its first element: `{{atoms-button "is-large"}}`.
//!
//! Rendered HTML is passed through [`beautify`](crate::beautify) before it is
//! returned, so stored markup is stable regardless of template indentation.
//! Notes are Markdown rendered with `pulldown-cmark`.

use crate::beautify::{Indent, beautify};
use handlebars::{
    BlockContext, Context, Handlebars, Helper, HelperDef, HelperResult, Output, RenderContext,
    RenderErrorReason, Renderable,
};
use pulldown_cmark::{Options, Parser, html as md_html};
use quick_xml::escape::escape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::{Reader, Writer};
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("invalid template {name}: {source}")]
    Template {
        name: String,
        #[source]
        source: Box<handlebars::TemplateError>,
    },
    #[error("render failed: {0}")]
    Render(#[source] Box<handlebars::RenderError>),
}

impl From<handlebars::RenderError> for RenderError {
    fn from(e: handlebars::RenderError) -> Self {
        RenderError::Render(Box::new(e))
    }
}

/// A Handlebars registry plus the indentation used for rendered output.
pub struct Renderer {
    registry: Handlebars<'static>,
    indent: Indent,
}

impl Renderer {
    pub fn new(indent: Indent) -> Self {
        let mut registry = Handlebars::new();
        registry.register_helper("iterate", Box::new(IterateHelper));
        Self { registry, indent }
    }

    /// Register `template` as a partial named `name`, replacing any earlier
    /// registration.
    pub fn register_partial(&mut self, name: &str, template: &str) -> Result<(), RenderError> {
        self.registry
            .register_partial(name, template)
            .map_err(|e| RenderError::Template {
                name: name.to_string(),
                source: Box::new(e),
            })
    }

    /// Drop the partial `name`, if registered.
    pub fn unregister_partial(&mut self, name: &str) {
        self.registry.unregister_template(name);
    }

    pub fn has_partial(&self, name: &str) -> bool {
        self.registry.has_template(name)
    }

    /// Register a helper named `key` that emits `content` with the helper's
    /// first string argument added to the class list of its first element.
    pub fn register_pattern_helper(&mut self, key: &str, content: String) {
        self.registry
            .register_helper(key, Box::new(PatternHelper { content }));
    }

    /// Render an inline template against `context` and beautify the result.
    pub fn render(&self, template: &str, context: &Value) -> Result<String, RenderError> {
        let html = self.registry.render_template(template, context)?;
        Ok(beautify(&html, &self.indent))
    }
}

/// Render Markdown to HTML.
pub fn render_markdown(source: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    let parser = Parser::new_ext(source, options);
    let mut html = String::new();
    md_html::push_html(&mut html, parser);
    html
}

/// `{{#iterate 3}}…{{/iterate}}` repeats its block. Inside the block, `this`
/// and `@index` are the zero-based repetition number.
struct IterateHelper;

impl HelperDef for IterateHelper {
    fn call<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        r: &'reg Handlebars<'reg>,
        ctx: &'rc Context,
        rc: &mut RenderContext<'reg, 'rc>,
        out: &mut dyn Output,
    ) -> HelperResult {
        let param = h
            .param(0)
            .ok_or(RenderErrorReason::ParamNotFoundForIndex("iterate", 0))?;
        let times = match param.value() {
            Value::Number(n) => n.as_u64().unwrap_or(0),
            Value::String(s) => s.trim().parse::<u64>().unwrap_or(0),
            _ => 0,
        };

        let Some(template) = h.template() else {
            return Ok(());
        };
        for i in 0..times {
            let mut block = BlockContext::new();
            block.set_base_value(Value::from(i));
            block.set_local_var("index", Value::from(i));
            rc.push_block(block);
            template.render(r, ctx, rc, out)?;
            rc.pop_block();
        }
        Ok(())
    }
}

struct PatternHelper {
    content: String,
}

impl HelperDef for PatternHelper {
    fn call<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        _: &'reg Handlebars<'reg>,
        _: &'rc Context,
        _: &mut RenderContext<'reg, 'rc>,
        out: &mut dyn Output,
    ) -> HelperResult {
        let classes = h
            .param(0)
            .and_then(|p| p.value().as_str())
            .unwrap_or_default();
        out.write(&add_class_to_first_element(&self.content, classes))?;
        Ok(())
    }
}

/// Add `classes` to the first element's `class` attribute, creating it if
/// needed. Markup without an element, or an empty class list, is returned as
/// is.
///
/// Only the first start tag is rebuilt; everything around it is kept byte for
/// byte.
pub fn add_class_to_first_element(html: &str, classes: &str) -> String {
    let classes = classes.trim();
    if classes.is_empty() {
        return html.to_string();
    }

    let mut reader = Reader::from_str(html);
    reader.config_mut().trim_text(false);
    reader.config_mut().enable_all_checks(false);

    loop {
        let start = reader.buffer_position() as usize;
        let (elem, empty) = match reader.read_event() {
            Ok(Event::Start(e)) => (e, false),
            Ok(Event::Empty(e)) => (e, true),
            Ok(Event::Eof) | Err(_) => return html.to_string(),
            Ok(_) => continue,
        };
        let end = reader.buffer_position() as usize;

        let rebuilt = with_class(&elem, classes);
        let event = if empty {
            Event::Empty(rebuilt)
        } else {
            Event::Start(rebuilt)
        };
        let mut writer = Writer::new(Vec::new());
        if writer.write_event(event).is_err() {
            return html.to_string();
        }
        let Ok(tag) = String::from_utf8(writer.into_inner()) else {
            return html.to_string();
        };
        return format!("{}{}{}", &html[..start], tag, &html[end..]);
    }
}

/// Rebuild `elem` with `classes` appended to its `class` attribute.
///
/// Values are copied raw and rewritten double-quoted, so a `"` inside a
/// single-quoted value is escaped.
fn with_class(elem: &BytesStart<'_>, classes: &str) -> BytesStart<'static> {
    let tag = String::from_utf8_lossy(elem.name().as_ref()).into_owned();
    let extra = escape(classes);
    let mut has_class = false;

    let mut rebuilt = BytesStart::new(tag);
    for attr in elem.html_attributes().flatten() {
        let key = attr.key.as_ref();
        let raw = String::from_utf8_lossy(&attr.value).replace('"', "&quot;");
        let value = if key.eq_ignore_ascii_case(b"class") && !has_class {
            has_class = true;
            if raw.trim().is_empty() {
                extra.to_string()
            } else {
                format!("{} {}", raw.trim_end(), extra)
            }
        } else {
            raw
        };
        rebuilt.push_attribute((key, value.as_bytes()));
    }
    if !has_class {
        rebuilt.push_attribute((b"class".as_slice(), extra.as_bytes()));
    }
    rebuilt
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn renderer() -> Renderer {
        Renderer::new(Indent::default())
    }

    #[test]
    fn renders_context_values() {
        let r = renderer();
        let html = r
            .render("<button>{{label}}</button>", &json!({"label": "Save"}))
            .unwrap();
        assert_eq!(html, "<button>Save</button>");
    }

    #[test]
    fn output_is_beautified() {
        let r = renderer();
        let html = r
            .render("<ul>\n      <li>a</li>\n\n</ul>\n", &json!({}))
            .unwrap();
        assert_eq!(html, "<ul>\n\t<li>a</li>\n</ul>");
    }

    #[test]
    fn partials_resolve_by_name() {
        let mut r = renderer();
        r.register_partial("atoms-icon", "<i class=\"icon\"></i>").unwrap();
        assert!(r.has_partial("atoms-icon"));
        let html = r
            .render("<span>{{> atoms-icon}}</span>", &json!({}))
            .unwrap();
        assert_eq!(html, "<span><i class=\"icon\"></i></span>");
    }

    #[test]
    fn missing_partial_is_an_error() {
        let r = renderer();
        assert!(r.render("{{> nowhere}}", &json!({})).is_err());
    }

    #[test]
    fn malformed_partial_rejected() {
        let mut r = renderer();
        let err = r.register_partial("broken", "{{#if}}").unwrap_err();
        assert!(err.to_string().contains("broken"));
    }

    #[test]
    fn iterate_repeats_block_with_index() {
        let r = renderer();
        let html = r
            .render("{{#iterate 3}}<b>{{@index}}</b>{{/iterate}}", &json!({}))
            .unwrap();
        assert_eq!(html, "<b>0</b><b>1</b><b>2</b>");
    }

    #[test]
    fn iterate_accepts_numeric_string() {
        let r = renderer();
        let html = r
            .render("{{#iterate n}}x{{/iterate}}", &json!({"n": "2"}))
            .unwrap();
        assert_eq!(html, "xx");
    }

    #[test]
    fn pattern_helper_adds_classes() {
        let mut r = renderer();
        r.register_pattern_helper("atoms-button", "<button class=\"btn\">Go</button>".into());
        let html = r
            .render("{{atoms-button \"btn--large\"}}", &json!({}))
            .unwrap();
        assert_eq!(html, "<button class=\"btn btn--large\">Go</button>");
    }

    #[test]
    fn class_attribute_created_when_missing() {
        assert_eq!(
            add_class_to_first_element("<div id=\"a\"><p>x</p></div>", "wide"),
            "<div id=\"a\" class=\"wide\"><p>x</p></div>"
        );
        assert_eq!(
            add_class_to_first_element("<!-- c --><img src=\"a.png\" />", "round"),
            "<!-- c --><img src=\"a.png\" class=\"round\"/>"
        );
        assert_eq!(add_class_to_first_element("plain text", "x"), "plain text");
        assert_eq!(add_class_to_first_element("<p>x</p>", ""), "<p>x</p>");
    }

    #[test]
    fn single_quoted_class_is_extended_not_duplicated() {
        assert_eq!(
            add_class_to_first_element("<div class='card'>x</div>", "wide"),
            "<div class=\"card wide\">x</div>"
        );
    }

    #[test]
    fn bracket_inside_attribute_value_left_intact() {
        assert_eq!(
            add_class_to_first_element("<a title=\"a>b\" class=\"btn\">x</a>", "big"),
            "<a title=\"a>b\" class=\"btn big\">x</a>"
        );
    }

    #[test]
    fn only_first_element_rebuilt() {
        assert_eq!(
            add_class_to_first_element("\n  <ul class=\"list\">\n\t<li class='item'>a</li>\n</ul>", "tight"),
            "\n  <ul class=\"list tight\">\n\t<li class='item'>a</li>\n</ul>"
        );
    }

    #[test]
    fn markdown_rendered_to_html() {
        assert_eq!(
            render_markdown("Use *sparingly*."),
            "<p>Use <em>sparingly</em>.</p>\n"
        );
    }
}
