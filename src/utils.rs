//! # Utilities Module
//!
//! ## Purpose
//! Common helpers used throughout the KB search engine for text excerpting
//! and lightweight performance measurement.

use std::time::Instant;

/// Performance timer for measuring operation duration
pub struct Timer {
    start: Instant,
    name: String,
}

impl Timer {
    /// Start a new timer with a name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            start: Instant::now(),
            name: name.into(),
        }
    }

    /// Get elapsed time in milliseconds
    pub fn elapsed_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }

    /// Stop timer and log duration
    pub fn stop(self) -> u64 {
        let elapsed = self.elapsed_ms();
        tracing::debug!("Timer '{}' completed in {}ms", self.name, elapsed);
        elapsed
    }
}

/// Text processing utilities
pub struct TextUtils;

impl TextUtils {
    /// Truncate text to at most `max_chars` characters, appending an
    /// ellipsis when anything was cut. Safe on multi-byte input.
    pub fn truncate(text: &str, max_chars: usize) -> String {
        match text.char_indices().nth(max_chars) {
            Some((idx, _)) => format!("{}...", text[..idx].trim_end()),
            None => text.to_string(),
        }
    }

    /// Largest char boundary less than or equal to `index`
    pub fn floor_char_boundary(text: &str, index: usize) -> usize {
        let mut index = index.min(text.len());
        while index > 0 && !text.is_char_boundary(index) {
            index -= 1;
        }
        index
    }

    /// Smallest char boundary greater than or equal to `index`
    pub fn ceil_char_boundary(text: &str, index: usize) -> usize {
        let mut index = index.min(text.len());
        while index < text.len() && !text.is_char_boundary(index) {
            index += 1;
        }
        index
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_keeps_short_text_unchanged() {
        assert_eq!(TextUtils::truncate("Hello world", 20), "Hello world");
    }

    #[test]
    fn truncate_cuts_long_text_with_ellipsis() {
        assert_eq!(TextUtils::truncate("This is a long text", 7), "This is...");
    }

    #[test]
    fn truncate_respects_multibyte_boundaries() {
        let text = "überlänge café";
        let cut = TextUtils::truncate(text, 4);
        assert!(cut.starts_with("über"));
    }

    #[test]
    fn char_boundary_helpers_stay_inside_the_text() {
        let text = "naïve";
        let inside = 3; // middle of the two-byte 'ï'
        assert_eq!(TextUtils::floor_char_boundary(text, inside), 2);
        assert_eq!(TextUtils::ceil_char_boundary(text, inside), 4);
        assert_eq!(TextUtils::floor_char_boundary(text, 100), text.len());
        assert_eq!(TextUtils::ceil_char_boundary(text, 100), text.len());
    }
}
