// src/utils/html.rs

/// Sanitizes teacher-authored display text (quiz titles, question prompts).
///
/// Whitelist-based: safe inline tags survive, `<script>`/`<style>` are removed
/// with their content, and event-handler attributes are stripped. Options and
/// answers are never passed through here because grading compares them byte
/// for byte.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_scripts_keeps_text() {
        assert_eq!(clean_html("What is 2+2?<script>x()</script>"), "What is 2+2?");
        assert_eq!(clean_html("<b>Bold</b> prompt"), "<b>Bold</b> prompt");
    }
}
