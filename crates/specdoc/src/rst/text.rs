//! Cleanup of documentation strings taken from specifications.

const HTML_REPLACEMENTS: [(&str, &str); 7] = [
    ("&lt;", "<"),
    ("&gt;", ">"),
    ("<b>", " **"),
    ("</b>", "** "),
    ("<i>", " *"),
    ("</i>", "* "),
    (":blue:", ""),
];

const HEADINGS: [(&str, &str); 3] = [
    ("COMMENT:", "Comment:"),
    ("MORE_INFO:", "Additional Information:"),
    ("NOTE:", "Note:"),
];

/// Convert a specification doc string to RST.
///
/// HTML emphasis becomes RST emphasis and the `COMMENT:`, `MORE_INFO:` and
/// `NOTE:` qualifiers become bold headings, each preceded by `prefix`.
pub fn clean_doc(doc: &str, prefix: &str) -> String {
    let mut text = doc.trim().to_string();
    for (from, to) in HTML_REPLACEMENTS {
        text = text.replace(from, to);
    }
    for (qualifier, heading) in HEADINGS {
        text = text.replace(qualifier, &format!("{prefix}**{heading}** "));
    }
    text
}

/// Collapse a multi-line doc string onto one line.
pub fn single_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_tags_become_emphasis() {
        let cleaned = clean_doc("a <b>bold</b> and <i>it</i> &lt;x&gt;", " ");

        assert_eq!(cleaned, "a  **bold**  and  *it*  <x>");
    }

    #[test]
    fn test_qualifiers_become_headings() {
        let cleaned = clean_doc("Data. COMMENT: more. NOTE: careful.", "\n\n");

        assert_eq!(
            cleaned,
            "Data. \n\n**Comment:**  more. \n\n**Note:**  careful."
        );
    }

    #[test]
    fn test_more_info_and_blue_marker() {
        let cleaned = clean_doc(":blue:MORE_INFO: see docs", " ");

        assert_eq!(cleaned, " **Additional Information:**  see docs");
    }

    #[test]
    fn test_single_line() {
        assert_eq!(single_line("  one\n two\n\nthree "), "one two three");
    }
}
