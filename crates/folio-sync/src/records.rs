//! Wire-neutral field maps for remote records.
//!
//! The store abstraction takes plain JSON objects; these builders define the
//! one field vocabulary shared by every store implementation.

use serde_json::json;

use folio_core::{defaults, BookProjection, DailyActivity, FieldMap, Note};

/// Field names used across the three collections.
pub mod field {
    pub const NAME: &str = "name";
    pub const AUTHOR: &str = "author";
    pub const COVER_URL: &str = "cover_url";
    pub const LAST_IMPORT_TIME: &str = "last_import_time";
    pub const ANNUAL_LIST_YEAR: &str = "annual_list_year";
    pub const SOURCE: &str = "source";

    pub const FINGERPRINT: &str = "fingerprint";
    pub const BOOK_TITLE: &str = "book_title";
    pub const BOOK_ID: &str = "book_id";
    pub const SECTION_TITLE: &str = "section_title";
    pub const ITEM_TYPE: &str = "item_type";
    pub const HIGHLIGHT_TEXT: &str = "highlight_text";
    pub const NOTE_TEXT: &str = "note_text";
    pub const CREATED_DATE: &str = "created_date";

    pub const DATE: &str = "date";
    pub const NOTES_COUNT: &str = "notes_count";
}

/// Fields for a book record, keyed remotely by [`field::NAME`].
///
/// Author and cover are written only when known, so a failed cover lookup
/// never clears a cover resolved on an earlier run.
pub fn book_fields(book: &BookProjection) -> FieldMap {
    let mut fields = FieldMap::new();
    fields.insert(field::NAME.into(), json!(book.name));
    if let Some(author) = &book.author {
        fields.insert(field::AUTHOR.into(), json!(author));
    }
    if let Some(cover_url) = &book.cover_url {
        fields.insert(field::COVER_URL.into(), json!(cover_url));
    }
    fields.insert(
        field::LAST_IMPORT_TIME.into(),
        json!(book.last_import_time.to_rfc3339()),
    );
    if let Some(year) = book.annual_list_year {
        fields.insert(field::ANNUAL_LIST_YEAR.into(), json!(year));
    }
    fields.insert(field::SOURCE.into(), json!(defaults::SOURCE_TAG));
    fields
}

/// Fields for a note record, keyed remotely by [`field::FINGERPRINT`].
///
/// Optional fields are written as explicit nulls: an edit that clears a
/// note's text or section must propagate through the update.
pub fn note_fields(note: &Note, book_id: &str) -> FieldMap {
    let mut fields = FieldMap::new();
    fields.insert(field::FINGERPRINT.into(), json!(note.fingerprint));
    fields.insert(field::BOOK_TITLE.into(), json!(note.book_title));
    fields.insert(field::BOOK_ID.into(), json!(book_id));
    fields.insert(field::SECTION_TITLE.into(), json!(note.section_title));
    fields.insert(field::ITEM_TYPE.into(), json!(note.item_type.to_string()));
    fields.insert(field::HIGHLIGHT_TEXT.into(), json!(note.highlight_text));
    fields.insert(field::NOTE_TEXT.into(), json!(note.note_text));
    fields.insert(
        field::CREATED_DATE.into(),
        json!(note.created_date.map(|d| d.to_string())),
    );
    fields.insert(field::SOURCE.into(), json!(note.source));
    fields
}

/// Fields for a daily-activity record, keyed remotely by [`field::DATE`].
pub fn daily_fields(row: &DailyActivity) -> FieldMap {
    let mut fields = FieldMap::new();
    fields.insert(field::DATE.into(), json!(row.date.to_string()));
    fields.insert(field::NOTES_COUNT.into(), json!(row.notes_count));
    fields.insert(
        field::LAST_IMPORT_TIME.into(),
        json!(row.last_import_time.to_rfc3339()),
    );
    fields.insert(field::SOURCE.into(), json!(defaults::SOURCE_TAG));
    fields
}
