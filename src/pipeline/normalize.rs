//! Markdown normalisation: strip lightweight decoration from text.
//!
//! Applied twice per run: once to the extracted document before
//! segmentation, and once to every generated item before it is recorded.
//!
//! ## Rule Order
//!
//! Rules run in a fixed order so overlapping patterns resolve the same way
//! every time:
//!
//! 1. Bold (`**text**`) before italic (`*text*`), otherwise a bold run would
//!    be eaten as two empty italic runs.
//! 2. Level-2 headings (`## `) before level-1 (`# `), otherwise `##` would
//!    leave a stray `#` behind.
//! 3. Bullet markers last. They match only at line start; a `*` bullet on a
//!    line that holds another `*` is already consumed by the italic rule.
//!
//! Nothing else is touched: no whitespace collapsing, no line-ending changes.

use once_cell::sync::Lazy;
use regex::Regex;

static RE_BOLD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*(.*?)\*\*").unwrap());
static RE_ITALIC: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*(.*?)\*").unwrap());
static RE_HEADING_2: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^##[ \t]*(.*?)\n").unwrap());
static RE_HEADING_1: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^#[ \t]*(.*?)\n").unwrap());
static RE_BULLET: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^([ \t]*)[-*][ \t]").unwrap());

/// Remove bold, italic, heading and bullet decoration.
///
/// Pure; on text free of these patterns it returns the input unchanged.
pub fn strip_markdown(input: &str) -> String {
    let s = strip_bold(input);
    let s = strip_italic(&s);
    let s = strip_level2_headings(&s);
    let s = strip_level1_headings(&s);
    strip_bullets(&s)
}

fn strip_bold(input: &str) -> String {
    RE_BOLD.replace_all(input, "${1}").into_owned()
}

fn strip_italic(input: &str) -> String {
    RE_ITALIC.replace_all(input, "${1}").into_owned()
}

fn strip_level2_headings(input: &str) -> String {
    RE_HEADING_2.replace_all(input, "${1}\n").into_owned()
}

fn strip_level1_headings(input: &str) -> String {
    RE_HEADING_1.replace_all(input, "${1}\n").into_owned()
}

fn strip_bullets(input: &str) -> String {
    RE_BULLET.replace_all(input, "${1}").into_owned()
}
