//! Sandboxed host page for generated games.
//!
//! Generated documents run arbitrary script.  [`render_sandboxed_page`]
//! embeds one, unmodified, in an `<iframe sandbox="allow-scripts">` through
//! its `srcdoc` attribute.  The frame gets an opaque origin, so the game can
//! script itself but cannot read the host page, its storage, or navigate the
//! top window.

/// Sandbox tokens granted to the game frame.
pub const SANDBOX_POLICY: &str = "allow-scripts";

/// Build a standalone HTML page that hosts `code` in a sandboxed frame.
pub fn render_sandboxed_page(code: &str, title: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title}</title>
<style>
html, body {{ margin: 0; height: 100%; background: #111; }}
iframe {{ border: 0; width: 100%; height: 100%; display: block; }}
</style>
</head>
<body>
<iframe id="game" sandbox="{SANDBOX_POLICY}" referrerpolicy="no-referrer" srcdoc="{srcdoc}"></iframe>
<script>document.getElementById("game").addEventListener("load", function () {{ this.focus(); }});</script>
</body>
</html>
"#,
        title = escape_text(title),
        srcdoc = escape_attribute(code),
    )
}

/// Escape text for use inside a double-quoted attribute value.
pub fn escape_attribute(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len() + raw.len() / 8);
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}

fn escape_text(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attribute_escaping() {
        assert_eq!(
            escape_attribute(r#"<a href="x">&</a>"#),
            "&lt;a href=&quot;x&quot;&gt;&amp;&lt;/a&gt;"
        );
        assert_eq!(escape_attribute("plain 'quotes'"), "plain 'quotes'");
    }

    #[test]
    fn page_embeds_escaped_code_in_sandboxed_frame() {
        let code = r#"<html><script>alert("hi")</script></html>"#;
        let page = render_sandboxed_page(code, "Snake <3");

        assert!(page.contains(r#"sandbox="allow-scripts""#));
        assert!(!page.contains("allow-same-origin"));
        assert!(page.contains("<title>Snake &lt;3</title>"));
        assert!(page.contains(
            "srcdoc=\"&lt;html&gt;&lt;script&gt;alert(&quot;hi&quot;)&lt;/script&gt;&lt;/html&gt;\""
        ));
        // The raw script never appears unescaped in the host page.
        assert!(!page.contains(code));
    }
}
