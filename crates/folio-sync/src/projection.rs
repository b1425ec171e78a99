//! Aggregate projections derived from the current note set.
//!
//! Both projections are recomputed in full on every sync run; neither is
//! independently authored state.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Datelike, Utc};

use folio_core::{BookProjection, DailyActivity, Note};

/// Aggregate notes into one book projection per distinct title, in
/// first-seen order.
///
/// The author comes from the first note for the title that carries one;
/// `annual_list_year` is the year of the book's most recent dated note.
pub fn project_books(notes: &[Note], now: DateTime<Utc>) -> Vec<BookProjection> {
    let mut order: Vec<String> = Vec::new();
    let mut books: HashMap<String, BookProjection> = HashMap::new();

    for note in notes {
        let book = books
            .entry(note.book_title.clone())
            .or_insert_with(|| {
                order.push(note.book_title.clone());
                BookProjection {
                    name: note.book_title.clone(),
                    author: None,
                    cover_url: None,
                    last_import_time: now,
                    annual_list_year: None,
                }
            });
        if book.author.is_none() {
            book.author = note.author.clone();
        }
        if let Some(date) = note.created_date {
            let year = date.year();
            book.annual_list_year = Some(book.annual_list_year.map_or(year, |y| y.max(year)));
        }
    }

    order
        .into_iter()
        .filter_map(|title| books.remove(&title))
        .collect()
}

/// Count dated notes per calendar day, in date order.
///
/// Notes without a `created_date` exist but never contribute to any row.
pub fn project_daily(notes: &[Note], now: DateTime<Utc>) -> Vec<DailyActivity> {
    let mut counts: BTreeMap<chrono::NaiveDate, u32> = BTreeMap::new();
    for note in notes {
        if let Some(date) = note.created_date {
            *counts.entry(date).or_insert(0) += 1;
        }
    }
    counts
        .into_iter()
        .map(|(date, notes_count)| DailyActivity {
            date,
            notes_count,
            last_import_time: now,
        })
        .collect()
}
