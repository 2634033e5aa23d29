//! Appending HTML fragments to a document body.

/// Appends `fragment` at the end of the `<body>` of `document`.
///
/// The document is normalized through an HTML5 parser, so missing `<html>`,
/// `<head>` and `<body>` elements are filled in.
#[cfg(feature = "html")]
#[must_use]
pub fn append_to_body(document: &str, fragment: &str) -> String {
    use scraper::Html;

    let serialized = Html::parse_document(document).html();
    let fragment = Html::parse_fragment(fragment).root_element().inner_html();
    insert_before_body_end(&serialized, &fragment)
}

/// Appends `fragment` at the end of the `<body>` of `document`.
///
/// Without an HTML parser the fragment is inserted textually before the
/// last `</body>`, or appended when the document has none.
#[cfg(not(feature = "html"))]
#[must_use]
pub fn append_to_body(document: &str, fragment: &str) -> String {
    insert_before_body_end(document, fragment)
}

fn insert_before_body_end(document: &str, fragment: &str) -> String {
    match document.to_ascii_lowercase().rfind("</body>") {
        Some(pos) => {
            let mut out = String::with_capacity(document.len() + fragment.len());
            out.push_str(&document[..pos]);
            out.push_str(fragment);
            out.push_str(&document[pos..]);
            out
        }
        None => format!("{document}{fragment}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_before_body_end() {
        let out = append_to_body("<html><body><p>Hi</p></body></html>", "<p>Bye</p>");
        let body_end = out.find("</body>").unwrap();
        let hi = out.find("<p>Hi</p>").unwrap();
        let bye = out.find("<p>Bye</p>").unwrap();
        assert!(hi < bye && bye < body_end);
    }

    #[test]
    fn test_uppercase_body_tag() {
        assert_eq!(
            insert_before_body_end("<BODY>x</BODY>", "y"),
            "<BODY>xy</BODY>"
        );
    }

    #[test]
    fn test_no_body_appends() {
        assert_eq!(insert_before_body_end("plain", "<b>x</b>"), "plain<b>x</b>");
    }

    #[cfg(feature = "html")]
    #[test]
    fn test_fragment_without_body_gets_one() {
        let out = append_to_body("<p>Hi</p>", "<p>Bye</p>");
        assert!(out.contains("<body><p>Hi</p><p>Bye</p></body>"));
    }
}
