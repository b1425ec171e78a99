//! # folio-parser
//!
//! Line-oriented parser for WeChat Read TXT exports.
//!
//! The export grammar is loosely structured: a title line, author line(s), a
//! note-count marker, then note blocks interleaved with bare section
//! headings, closed by a footer sentinel. [`parse`] walks it as an explicit
//! state machine (`SeekTitle`, `SeekAuthor`, `Body`) advanced one line at a
//! time. Unrecognized lines degrade to best-effort text accumulation instead
//! of aborting the file; the only structural error is a file whose title or
//! author cannot be identified.

pub mod markers;
mod parse;

pub use parse::{parse, parse_many};
