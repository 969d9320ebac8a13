use std::fmt;

/// Where a run of lines came from inside a base document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    /// The whole line-oriented document.
    Document,
    /// A notebook cell, by zero-based index.
    Cell(usize),
    /// A string leaf of a tree, by key path (`app.features[1].name`).
    Leaf(String),
}

/// A 1-based line inside an [`Origin`], used to point diagnostics at source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub origin: Origin,
    pub line: usize,
}

impl Location {
    pub fn new(origin: Origin, line: usize) -> Self {
        Self { origin, line }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.origin {
            Origin::Document => write!(f, "line {}", self.line),
            Origin::Cell(index) => write!(f, "cell {}, line {}", index + 1, self.line),
            Origin::Leaf(path) => write!(f, "`{path}`, line {}", self.line),
        }
    }
}

/// An ordered run of lines scanned as one unit.
///
/// Code fences never span segments: a fence left open at the end of a
/// segment does not mask lines of the next one.
#[derive(Debug, Clone)]
pub struct Segment<'a> {
    pub origin: Origin,
    pub lines: Vec<&'a str>,
}

impl<'a> Segment<'a> {
    pub fn new(origin: Origin, lines: Vec<&'a str>) -> Self {
        Self { origin, lines }
    }

    /// A whole line-oriented document.
    pub fn document(lines: &[&'a str]) -> Self {
        Self::new(Origin::Document, lines.to_vec())
    }

    /// Splits `text` into lines (newline and CRLF aware).
    pub fn from_text(origin: Origin, text: &'a str) -> Self {
        Self::new(origin, text.lines().collect())
    }

    /// Location of the zero-based line `index` within this segment.
    pub fn location(&self, index: usize) -> Location {
        Location::new(self.origin.clone(), index + 1)
    }
}
