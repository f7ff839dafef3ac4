use std::collections::HashSet;

/// Cleans rich-text HTML coming from the post editor or the comment box.
/// Keeps formatting, links and images; removes scripts, event handlers and styles.
pub fn sanitize_rich_text(html_input: &str) -> String {
    let tags_to_allow = [
        "h1", "h2", "h3", "h4", "h5", "h6", "b", "strong", "i", "em", "u", "p", "br",
        "a", "ul", "ol", "li", "blockquote", "code", "pre", "hr", "img", "table",
        "thead", "tbody", "tr", "th", "td", "s", "del", "span", "div", "figure", "figcaption",
    ];
    let safe_tags = tags_to_allow.iter().cloned().collect::<HashSet<_>>();

    let safe_attributes = ["src", "href", "alt", "title", "class", "width", "height"];
    let generic_attributes = safe_attributes.iter().cloned().collect::<HashSet<_>>();

    ammonia::Builder::new()
        .tags(safe_tags)
        .generic_attributes(generic_attributes)
        .link_rel(Some("nofollow noopener noreferrer"))
        .clean(html_input)
        .to_string()
}

/// Strips all HTML tags from input (for titles, subtitles and names).
/// The result is plain text: templates escape it again on output, so entities are decoded here.
pub fn strip_all_html(input: &str) -> String {
    let cleaned = ammonia::Builder::new()
        .tags(HashSet::new())
        .clean(input)
        .to_string();
    html_escape::decode_html_entities(&cleaned).trim().to_string()
}
