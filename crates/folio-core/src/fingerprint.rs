//! Content-derived idempotency keys for notes.
//!
//! The fingerprint is a deterministic function of a note's semantic content:
//! identical content re-parsed from an unmodified export always yields the
//! same key, which lets the sync engine upsert by key instead of inserting
//! duplicates.
//!
//! Two distinct undated notes with identical section and text share a key.
//! Accepted limitation of the keying rule; callers must not work around it
//! by mixing in an index number.

use chrono::NaiveDate;
use sha2::{Digest, Sha256};

/// Compute the stable fingerprint for one note's content.
///
/// When `created_date` is present the key is the SHA-256 digest of
/// `"{book}|{date}|{highlight}|{note}"`; otherwise the date slot is replaced
/// by the section title. Absent optional strings contribute as empty.
pub fn fingerprint(
    book_title: &str,
    created_date: Option<NaiveDate>,
    section_title: Option<&str>,
    highlight_text: Option<&str>,
    note_text: Option<&str>,
) -> String {
    let highlight = highlight_text.unwrap_or("");
    let note = note_text.unwrap_or("");
    let key = match created_date {
        Some(date) => format!("{book_title}|{date}|{highlight}|{note}"),
        None => {
            let section = section_title.unwrap_or("");
            format!("{book_title}|{section}|{highlight}|{note}")
        }
    };
    hex::encode(Sha256::digest(key.as_bytes()))
}
