//! Plain text to HTML for outbound messages.

/// Escapes the characters HTML treats as markup.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Escaped text with line breaks kept as `<br>`.
pub fn text_to_html(text: &str) -> String {
    escape_html(text).replace("\r\n", "\n").replace('\n', "<br>\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"Q&A <night> "at" Bob's"#),
            "Q&amp;A &lt;night&gt; &quot;at&quot; Bob&#39;s"
        );
        assert_eq!(escape_html("plain"), "plain");
    }

    #[test]
    fn test_text_to_html_keeps_line_breaks() {
        assert_eq!(text_to_html("a & b\r\nc"), "a &amp; b<br>\nc");
    }
}
