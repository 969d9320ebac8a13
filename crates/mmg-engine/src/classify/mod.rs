//! # Classification
//!
//! Partitions a line stream by active language tag.
//!
//! Classification runs in two phases, one line at a time:
//!
//! 1. **Line classification**: [`LineClass::of`] asks the marker grammar
//!    whether the line is a directive.
//! 2. **Routing**: [`TargetBuilder`] keeps the active tag and appends each
//!    content line to the outputs it applies to. Directive lines are never
//!    emitted.
//!
//! The same primitive serves every input shape: a markdown document, one
//! notebook cell, one string leaf of a tree. Fenced code is classified like
//! any other line.

pub mod builder;

use std::fmt;

pub use builder::{Classification, DroppedLine, TargetBuilder};

use crate::config::LangTag;
use crate::markers::Marker;

/// The classifier's single piece of state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ActiveTag {
    /// No switch seen yet. Content applies to every language.
    #[default]
    Unknown,
    /// Content applies to every language.
    Common,
    /// Content applies to no language.
    Ignore,
    /// Content applies to this tag only, if declared; dropped otherwise.
    Lang(String),
}

impl ActiveTag {
    pub fn from_marker(tag: &str) -> Self {
        match tag {
            "common" => ActiveTag::Common,
            "ignore" => ActiveTag::Ignore,
            "<Unknown>" => ActiveTag::Unknown,
            other => ActiveTag::Lang(other.to_string()),
        }
    }
}

impl fmt::Display for ActiveTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActiveTag::Unknown => f.write_str("<Unknown>"),
            ActiveTag::Common => f.write_str("common"),
            ActiveTag::Ignore => f.write_str("ignore"),
            ActiveTag::Lang(tag) => f.write_str(tag),
        }
    }
}

/// What a single line means to the router.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineClass<'a> {
    Switch(ActiveTag),
    /// `lang_tags` / `no_suffix`: elided, state unchanged.
    Directive,
    Content(&'a str),
}

impl<'a> LineClass<'a> {
    pub fn of(line: &'a str) -> Self {
        match Marker::parse(line) {
            Some(Marker::LangSwitch(tag)) => LineClass::Switch(ActiveTag::from_marker(&tag)),
            Some(_) => LineClass::Directive,
            None => LineClass::Content(line),
        }
    }
}

/// Classifies `lines` into one output per declared tag.
///
/// Each output keeps source order with every directive line removed.
pub fn classify(lines: &[&str], lang_tags: &[LangTag]) -> Classification {
    let mut builder = TargetBuilder::new(lang_tags);
    for line in lines {
        builder.push(&LineClass::of(line));
    }
    builder.finish()
}
