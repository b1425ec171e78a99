//! The export parser: an explicit state machine advanced one line at a time.

use chrono::NaiveDate;
use tracing::debug;

use folio_core::{defaults, fingerprint, Error, ItemType, Note, Result};

use crate::markers::{
    extract_date, BULLET, FOOTER_SENTINEL, NOTE_COUNT_MARKER, QUOTE_INTRO, THOUGHT_MARKER,
};

/// Parse one export blob into notes, in source encounter order.
///
/// Pure function of the input text; never mutates external state. Returns
/// [`Error::StructuralParse`] only when no title or no author can be
/// identified; every other irregularity degrades to best-effort text
/// accumulation.
pub fn parse(raw: &str) -> Result<Vec<Note>> {
    let mut parser = LineParser::new();
    for line in raw.lines() {
        parser.step(line);
        if parser.done {
            break;
        }
    }
    parser.finish()
}

/// Parse several export blobs, one per source file, preserving input order.
///
/// A structural error aborts only the file that produced it; errors are
/// returned alongside the notes, tagged with the input's index.
pub fn parse_many<'a, I>(inputs: I) -> (Vec<Note>, Vec<(usize, Error)>)
where
    I: IntoIterator<Item = &'a str>,
{
    let mut notes = Vec::new();
    let mut errors = Vec::new();
    for (index, input) in inputs.into_iter().enumerate() {
        match parse(input) {
            Ok(parsed) => notes.extend(parsed),
            Err(error) => errors.push((index, error)),
        }
    }
    (notes, errors)
}

/// Parser states. Lines before the note-count marker identify the book;
/// everything after is note blocks and section headings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    SeekTitle,
    SeekAuthor,
    Body,
}

/// Which text field an open block is currently accumulating into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    Note,
    Highlight,
}

/// An in-progress note block, between its opening bullet and its boundary.
#[derive(Debug)]
struct BlockAcc {
    created_date: Option<NaiveDate>,
    target: Target,
    note_lines: Vec<String>,
    highlight_lines: Vec<String>,
}

impl BlockAcc {
    /// Open a block from the text after the bullet. A remainder matching the
    /// thought pattern starts note accumulation; anything else is the first
    /// highlight line. The date token, when present, comes from this line.
    fn open(header: &str) -> Self {
        let created_date = extract_date(header);
        if header.contains(THOUGHT_MARKER) {
            Self {
                created_date,
                target: Target::Note,
                note_lines: Vec::new(),
                highlight_lines: Vec::new(),
            }
        } else {
            let mut highlight_lines = Vec::new();
            if !header.is_empty() {
                highlight_lines.push(header.to_string());
            }
            Self {
                created_date,
                target: Target::Highlight,
                note_lines: Vec::new(),
                highlight_lines,
            }
        }
    }

    /// Append one non-blank body line. The quoted-block intro switches the
    /// accumulation target; everything else is a continuation.
    fn push_line(&mut self, line: &str) {
        if let Some(rest) = line.strip_prefix(QUOTE_INTRO) {
            self.target = Target::Highlight;
            let rest = rest.trim();
            if !rest.is_empty() {
                self.highlight_lines.push(rest.to_string());
            }
            return;
        }
        match self.target {
            Target::Note => self.note_lines.push(line.to_string()),
            Target::Highlight => self.highlight_lines.push(line.to_string()),
        }
    }

    /// Close the block into a note. Returns `None` when both text fields
    /// ended up empty; such blocks are dropped, never emitted.
    fn finish(
        self,
        book_title: &str,
        author: Option<&str>,
        section_title: Option<&str>,
    ) -> Option<Note> {
        let highlight_text = join_lines(self.highlight_lines);
        let note_text = join_lines(self.note_lines);
        let item_type = match (&highlight_text, &note_text) {
            (Some(_), Some(_)) => ItemType::Mixed,
            (None, Some(_)) => ItemType::Thought,
            (Some(_), None) => ItemType::Highlight,
            (None, None) => return None,
        };
        let fingerprint = fingerprint(
            book_title,
            self.created_date,
            section_title,
            highlight_text.as_deref(),
            note_text.as_deref(),
        );
        Some(Note {
            book_title: book_title.to_string(),
            author: author.map(str::to_string),
            section_title: section_title.map(str::to_string),
            item_type,
            highlight_text,
            note_text,
            created_date: self.created_date,
            source: defaults::SOURCE_TAG.to_string(),
            fingerprint,
        })
    }
}

fn join_lines(lines: Vec<String>) -> Option<String> {
    if lines.is_empty() {
        None
    } else {
        Some(lines.join("\n"))
    }
}

/// Accumulator advanced by one transition per line.
struct LineParser {
    state: State,
    title: Option<String>,
    author_lines: Vec<String>,
    author: Option<String>,
    missing_author: bool,
    section: Option<String>,
    block: Option<BlockAcc>,
    blank_run: usize,
    notes: Vec<Note>,
    done: bool,
}

impl LineParser {
    fn new() -> Self {
        Self {
            state: State::SeekTitle,
            title: None,
            author_lines: Vec::new(),
            author: None,
            missing_author: false,
            section: None,
            block: None,
            blank_run: 0,
            notes: Vec::new(),
            done: false,
        }
    }

    fn step(&mut self, raw: &str) {
        let line = raw.trim();
        match self.state {
            State::SeekTitle => {
                if !line.is_empty() {
                    self.title = Some(line.to_string());
                    self.state = State::SeekAuthor;
                }
            }
            State::SeekAuthor => {
                if line.is_empty() {
                    return;
                }
                if line.contains(NOTE_COUNT_MARKER) {
                    if self.author_lines.is_empty() {
                        self.missing_author = true;
                    } else {
                        self.author = Some(self.author_lines.join(" "));
                    }
                    self.state = State::Body;
                } else {
                    self.author_lines.push(line.to_string());
                }
            }
            State::Body => self.step_body(line),
        }
    }

    fn step_body(&mut self, line: &str) {
        if line.is_empty() {
            self.blank_run += 1;
            // A run of two blank lines is a section boundary; a single blank
            // inside a block is trimmed and does not terminate it.
            if self.blank_run == 2 {
                self.close_block();
            }
            return;
        }
        self.blank_run = 0;

        if line.contains(FOOTER_SENTINEL) {
            self.close_block();
            self.done = true;
            return;
        }
        if let Some(rest) = line.strip_prefix(BULLET) {
            self.close_block();
            self.block = Some(BlockAcc::open(rest.trim()));
            return;
        }
        match &mut self.block {
            // Unrecognized lines inside an open block are continuations of
            // the current accumulation target.
            Some(block) => block.push_line(line),
            // At section level, a bare line is a heading that labels
            // subsequent notes until replaced.
            None => self.section = Some(line.to_string()),
        }
    }

    fn close_block(&mut self) {
        let Some(block) = self.block.take() else {
            return;
        };
        let title = self.title.clone().unwrap_or_default();
        match block.finish(&title, self.author.as_deref(), self.section.as_deref()) {
            Some(note) => self.notes.push(note),
            None => debug!(book = %title, "dropping note block with no text"),
        }
    }

    fn finish(mut self) -> Result<Vec<Note>> {
        self.close_block();
        match self.state {
            State::SeekTitle => Err(Error::StructuralParse(
                "no title line found in export".to_string(),
            )),
            State::SeekAuthor => {
                if self.author_lines.is_empty() {
                    Err(Error::StructuralParse(format!(
                        "no author lines before note-count marker for \"{}\"",
                        self.title.unwrap_or_default()
                    )))
                } else {
                    // Export ended before any note body; nothing to emit.
                    Ok(self.notes)
                }
            }
            State::Body => {
                if self.missing_author {
                    Err(Error::StructuralParse(format!(
                        "no author lines before note-count marker for \"{}\"",
                        self.title.unwrap_or_default()
                    )))
                } else {
                    Ok(self.notes)
                }
            }
        }
    }
}
