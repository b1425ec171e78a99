//! Fixed markers of the WeChat Read export grammar.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

/// Bullet opening a note item.
pub const BULLET: char = '◆';

/// A header line containing this phrase ("N notes") ends the author block.
pub const NOTE_COUNT_MARKER: &str = "个笔记";

/// Bullet remainder containing this phrase ("posted a thought") starts a
/// thought block.
pub const THOUGHT_MARKER: &str = "发表想法";

/// A block line starting with this prefix ("original text:") switches
/// accumulation to the highlighted text.
pub const QUOTE_INTRO: &str = "原文：";

/// A line containing this phrase ("from WeChat Read") ends the export.
pub const FOOTER_SENTINEL: &str = "来自微信读书";

static DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{4}/\d{1,2}/\d{1,2})").expect("valid date regex"));

/// Extract the first `YYYY/M/D` date token from a line, if any.
///
/// Tokens that match the shape but are not calendar dates degrade to `None`.
pub fn extract_date(text: &str) -> Option<NaiveDate> {
    let token = DATE_RE.captures(text)?.get(1)?.as_str();
    NaiveDate::parse_from_str(token, "%Y/%m/%d").ok()
}
