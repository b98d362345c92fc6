//! Document statistics derived from extracted text

/// Rough page estimate: one page per `chars_per_page` characters
pub fn estimate_page_count(text: &str, chars_per_page: usize) -> usize {
    let chars = text.chars().count();
    chars.div_ceil(chars_per_page.max(1))
}

/// Number of whitespace-delimited tokens
pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}
