//! Lyric text analysis.
//!
//! The editor shows a live syllable count next to the note. The estimate
//! counts vowel runs, which tracks English syllable counts closely enough
//! for sketching meter.

use once_cell::sync::Lazy;
use regex::Regex;

static VOWEL_RUN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)[aeiouy]+").expect("valid vowel-run regex"));

/// Estimates the syllable count of `text` as the number of vowel runs.
///
/// Returns 0 for empty text and for text without vowels.
pub fn count_syllables(text: &str) -> usize {
    VOWEL_RUN_RE.find_iter(text).count()
}

#[cfg(test)]
mod tests {
    use super::count_syllables;

    #[test]
    fn counts_vowel_runs_per_word() {
        assert_eq!(count_syllables("hello world"), 3);
        assert_eq!(count_syllables("syllable"), 3);
    }

    #[test]
    fn ignores_case() {
        assert_eq!(count_syllables("HELLO"), count_syllables("hello"));
    }

    #[test]
    fn adjacent_vowels_count_once() {
        assert_eq!(count_syllables("queue"), 1);
        assert_eq!(count_syllables("beautiful"), 3);
    }

    #[test]
    fn y_counts_as_a_vowel() {
        assert_eq!(count_syllables("rhythm"), 1);
    }

    #[test]
    fn empty_and_vowelless_text_count_zero() {
        assert_eq!(count_syllables(""), 0);
        assert_eq!(count_syllables("tsk tsk"), 0);
        assert_eq!(count_syllables("123 !?"), 0);
    }
}
