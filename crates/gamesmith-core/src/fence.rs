//! Fenced code-block marker removal.

use std::sync::LazyLock;

use regex::Regex;

/// Matches a triple-backtick marker with an optional language tag.
static FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"```[A-Za-z][A-Za-z0-9_+#.\-]*|```").expect("fence pattern is valid")
});

/// Remove every fence marker (with its optional language tag) from `text`.
///
/// Text between markers is kept verbatim, including the newlines that
/// followed or preceded a marker.
pub fn strip_code_fences(text: &str) -> String {
    FENCE.replace_all(text, "").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_tagged_fence_pair() {
        let raw = "```html\n<html><body>hi</body></html>\n```";
        assert_eq!(strip_code_fences(raw), "\n<html><body>hi</body></html>\n");
    }

    #[test]
    fn strips_untagged_fences() {
        assert_eq!(strip_code_fences("```\nlet x = 1;\n```"), "\nlet x = 1;\n");
    }

    #[test]
    fn strips_multiple_blocks_with_different_tags() {
        let raw = "```css\nbody{}\n```\n```javascript\nrun();\n```";
        assert_eq!(strip_code_fences(raw), "\nbody{}\n\n\nrun();\n");
    }

    #[test]
    fn leaves_plain_text_untouched() {
        let raw = "<html>\n  <p>a `code` span and `` doubled ``</p>\n</html>";
        assert_eq!(strip_code_fences(raw), raw);
    }

    #[test]
    fn tag_stops_at_non_identifier_character() {
        // Markup glued to the marker is content, not a language tag.
        assert_eq!(strip_code_fences("```<!DOCTYPE html>"), "<!DOCTYPE html>");
    }
}
