//! Markdown → sanitized HTML for post and comment bodies.
//!
//! Pipeline: parse markdown, turn bare URLs in text into links, render to
//! HTML, then run the HTML through an allow-list cleaner. Tags outside the
//! list are stripped but their text is kept; `script`/`style` lose their
//! content as well. Every surviving anchor gets `rel="nofollow"`.

use std::collections::{HashMap, HashSet};

use ammonia::{Builder, UrlRelative};
use once_cell::sync::Lazy;
use pulldown_cmark::{
    html, CowStr, Event, LinkType, Options, Parser, Tag, TagEnd, TextMergeStream,
};
use regex::Regex;

/// Tags allowed in a post body
pub const POST_TAGS: &[&str] = &[
    "a", "abbr", "acronym", "b", "blockquote", "code", "em", "i", "li", "ol", "pre", "strong",
    "ul", "h1", "h2", "h3", "p",
];

/// Tags allowed in a comment body (inline only)
pub const COMMENT_TAGS: &[&str] = &["a", "abbr", "acronym", "b", "code", "em", "i", "strong"];

static URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"https?://[^\s<>"']+"#).expect("invalid url regex"));

/// Raw HTML tags whose text must not be linkified
static SKIP_TAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<(/?)(a|code|pre)\b").expect("invalid tag regex"));

/// Render a post body.
pub fn render_post(markdown: &str) -> String {
    render(markdown, POST_TAGS)
}

/// Render a comment body.
pub fn render_comment(markdown: &str) -> String {
    render(markdown, COMMENT_TAGS)
}

fn render(markdown: &str, allowed_tags: &[&'static str]) -> String {
    let parser = Parser::new_ext(markdown, Options::empty());
    let events = linkify(TextMergeStream::new(parser));

    let mut unsafe_html = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut unsafe_html, events.into_iter());

    cleaner(allowed_tags).clean(&unsafe_html).to_string()
}

fn cleaner(allowed_tags: &[&'static str]) -> Builder<'static> {
    let title: HashSet<&'static str> = ["title"].into_iter().collect();
    let tag_attributes: HashMap<&'static str, HashSet<&'static str>> = HashMap::from([
        ("a", ["href", "title"].into_iter().collect()),
        ("abbr", title.clone()),
        ("acronym", title),
    ]);

    let mut builder = Builder::empty();
    builder
        .tags(allowed_tags.iter().copied().collect())
        .clean_content_tags(["script", "style"].into_iter().collect())
        .tag_attributes(tag_attributes)
        .url_schemes(["http", "https", "mailto"].into_iter().collect())
        .url_relative(UrlRelative::PassThrough)
        .link_rel(Some("nofollow"))
        .strip_comments(true);
    builder
}

/// Wrap bare URLs found in text events in autolinks. Text already inside a
/// link, image or code block is left alone, whether the markup came from
/// markdown or raw `<a>`/`<code>`/`<pre>` HTML. Inline code arrives as its
/// own event and is never touched.
fn linkify<'a>(events: impl Iterator<Item = Event<'a>>) -> Vec<Event<'a>> {
    let mut out = Vec::new();
    let mut depth = 0usize;

    for event in events {
        match event {
            Event::Start(tag @ (Tag::Link { .. } | Tag::Image { .. } | Tag::CodeBlock(_))) => {
                depth += 1;
                out.push(Event::Start(tag));
            }
            Event::End(end @ (TagEnd::Link | TagEnd::Image | TagEnd::CodeBlock)) => {
                depth = depth.saturating_sub(1);
                out.push(Event::End(end));
            }
            Event::Html(ref raw) | Event::InlineHtml(ref raw) if SKIP_TAG_RE.is_match(raw) => {
                depth = raw_html_depth(raw, depth);
                out.push(event);
            }
            Event::Text(text) if depth == 0 => push_linkified(&mut out, text),
            other => out.push(other),
        }
    }

    out
}

/// Nesting depth after the `<a>`, `<code>` and `<pre>` tags in `raw`.
fn raw_html_depth(raw: &str, mut depth: usize) -> usize {
    for caps in SKIP_TAG_RE.captures_iter(raw) {
        if caps[1].is_empty() {
            depth += 1;
        } else {
            depth = depth.saturating_sub(1);
        }
    }
    depth
}

fn push_linkified<'a>(out: &mut Vec<Event<'a>>, text: CowStr<'a>) {
    let mut last = 0;
    let mut found = false;

    for m in URL_RE.find_iter(&text) {
        let url = m
            .as_str()
            .trim_end_matches(|c: char| matches!(c, '.' | ',' | ';' | ':' | '!' | '?' | ')'));
        if url.len() <= "https://".len() {
            continue;
        }
        found = true;

        if m.start() > last {
            out.push(Event::Text(CowStr::from(text[last..m.start()].to_string())));
        }
        out.push(Event::Start(Tag::Link {
            link_type: LinkType::Autolink,
            dest_url: CowStr::from(url.to_string()),
            title: CowStr::from(""),
            id: CowStr::from(""),
        }));
        out.push(Event::Text(CowStr::from(url.to_string())));
        out.push(Event::End(TagEnd::Link));
        last = m.start() + url.len();
    }

    if !found {
        out.push(Event::Text(text));
    } else if last < text.len() {
        out.push(Event::Text(CowStr::from(text[last..].to_string())));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn post_keeps_block_markup() {
        let html = render_post("# Title\n\nSome **bold** text\n\n- one\n- two");
        assert!(html.contains("<h1>Title</h1>"));
        assert!(html.contains("<strong>bold</strong>"));
        assert!(html.contains("<ul>"));
        assert!(html.contains("<li>one</li>"));
    }

    #[test]
    fn comment_strips_block_markup() {
        let html = render_comment("# Title\n\n*fine*");
        assert!(!html.contains("<h1>"));
        assert!(!html.contains("<p>"));
        assert!(html.contains("Title"));
        assert!(html.contains("<em>fine</em>"));
    }

    #[test]
    fn script_is_removed_with_content() {
        let html = render_post("hello <script>alert('x')</script> world");
        assert!(!html.contains("<script"));
        assert!(!html.contains("alert"));
        assert!(html.contains("hello"));
    }

    #[test]
    fn disallowed_tags_keep_text() {
        let html = render_post("<div>inside</div>\n\n<span>span text</span>");
        assert!(!html.contains("<div"));
        assert!(!html.contains("<span"));
        assert!(html.contains("inside"));
        assert!(html.contains("span text"));
    }

    #[test]
    fn event_handler_attributes_are_dropped() {
        let html = render_post("<a href=\"https://example.com\" onclick=\"steal()\">x</a>");
        assert!(!html.contains("onclick"));
        assert!(html.contains("href=\"https://example.com\""));
    }

    #[test]
    fn javascript_urls_are_dropped() {
        let html = render_post("[click](javascript:alert(1))");
        assert!(!html.contains("javascript:"));
    }

    #[test]
    fn bare_urls_are_linkified() {
        let html = render_comment("see https://example.com/page.");
        assert!(html.contains("href=\"https://example.com/page\""));
        assert!(html.contains("rel=\"nofollow\""));
        assert!(html.contains("</a>."));
    }

    #[test]
    fn links_are_not_double_wrapped() {
        let html = render_post("[https://example.com](https://example.com)");
        assert_eq!(html.matches("<a ").count(), 1);
    }

    #[test]
    fn code_is_not_linkified() {
        let html = render_post("```\nhttps://example.com\n```");
        assert!(html.contains("<pre><code>"));
        assert!(!html.contains("<a "));

        let html = render_comment("`https://example.com`");
        assert!(!html.contains("<a "));
    }

    #[test]
    fn raw_html_link_text_is_not_linkified() {
        let html = render_post("see <a href=\"https://example.com\">https://example.com</a>");
        assert_eq!(html.matches("<a ").count(), 1);
        assert!(html.contains(">https://example.com</a>"));
    }

    #[test]
    fn raw_html_code_text_is_not_linkified() {
        let html = render_comment("<code>https://example.com</code>");
        assert!(html.contains("<code>https://example.com</code>"));
        assert!(!html.contains("<a "));

        let html = render_comment("<CODE>x</CODE> then https://example.com");
        assert_eq!(html.matches("<a ").count(), 1);
    }

    #[test]
    fn abbr_is_not_mistaken_for_a_link() {
        assert_eq!(raw_html_depth("<abbr title=\"x\">", 0), 0);
        assert_eq!(raw_html_depth("<a href=\"x\"><code>", 0), 2);
        assert_eq!(raw_html_depth("</code></a>", 2), 0);
        assert_eq!(raw_html_depth("</pre>", 0), 0);
    }

    #[test]
    fn abbr_title_survives() {
        let html = render_comment("<abbr title=\"HyperText\" class=\"x\">HTML</abbr>");
        assert!(html.contains("<abbr title=\"HyperText\">HTML</abbr>"));
    }
}
