//! CJK script detection for source ordering.

use unicode_script::{Script, UnicodeScript};

/// Checks if the text contains CJK characters.
///
/// Fast single-pass helper used to decide which cover-source ordering fits a
/// book: Han (Chinese), Hiragana/Katakana (Japanese), or Hangul (Korean)
/// anywhere in the title or author selects the CJK-first chain.
pub fn has_cjk(text: &str) -> bool {
    text.chars().any(|ch| {
        matches!(
            ch.script(),
            Script::Han | Script::Hiragana | Script::Katakana | Script::Hangul
        )
    })
}
