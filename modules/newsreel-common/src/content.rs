use regex::Regex;

/// Clean feed-provided text for storage: drop HTML tags and entities,
/// collapse whitespace runs to single spaces, trim wrapping quotes.
pub fn sanitise_content(content: &str) -> String {
    let tags = Regex::new(r"<[^>]*>").expect("valid regex");
    let entities = Regex::new(r"&#?[a-zA-Z0-9]+;").expect("valid regex");
    let whitespace = Regex::new(r"\s+").expect("valid regex");

    let text = tags.replace_all(content, " ");
    let text = entities.replace_all(&text, " ");
    let text = whitespace.replace_all(&text, " ");
    let text = text.trim();

    trim_wrapping_quotes(text).to_string()
}

fn trim_wrapping_quotes(text: &str) -> &str {
    let pairs = [('"', '"'), ('\'', '\''), ('\u{201C}', '\u{201D}')];
    for (open, close) in pairs {
        if let Some(inner) = text
            .strip_prefix(open)
            .and_then(|t| t.strip_suffix(close))
        {
            return inner.trim();
        }
    }
    text
}
