// src/utils/sanitize.rs

use std::collections::HashSet;

/// Strips every HTML tag from short display text (names, lesson titles)
/// and trims surrounding whitespace. Text content between tags is kept;
/// `<script>` and `<style>` bodies are dropped entirely.
///
/// The result is still HTML-escaped by ammonia, so `&` comes back as
/// `&amp;`. Clients must render it as text.
pub fn plain_text(input: &str) -> String {
    ammonia::Builder::default()
        .tags(HashSet::new())
        .clean(input)
        .to_string()
        .trim()
        .to_string()
}
