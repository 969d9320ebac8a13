//! Notebook conversion.
//!
//! Markdown cells are classified one by one (the active tag starts over in
//! every cell) and a markdown cell is kept for a language only when it has
//! non-blank content for it. Other cells carry no markers and are copied to
//! every language unchanged. Fields this model does not name are kept as-is.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::classify::{Classification, classify};
use crate::config::{Config, ConfigError, extract_config_from_segments};
use crate::health::HealthChecker;
use crate::lang_map::LangMap;
use crate::source::{Origin, Segment};
use crate::toc;

use super::{ConvertError, ConvertOptions, join_lines, report_dropped, resolve_config, run_gate};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notebook {
    pub cells: Vec<Cell>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub cell_type: String,
    pub source: CellSource,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Cell source as stored on disk: a list of newline-terminated lines or a
/// single string. Rewritten sources keep the representation they came in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellSource {
    Lines(Vec<String>),
    Text(String),
}

impl CellSource {
    pub fn text(&self) -> String {
        match self {
            CellSource::Lines(lines) => lines.concat(),
            CellSource::Text(text) => text.clone(),
        }
    }

    fn with_text(&self, text: &str) -> Self {
        match self {
            CellSource::Lines(_) => {
                CellSource::Lines(text.split_inclusive('\n').map(str::to_string).collect())
            }
            CellSource::Text(_) => CellSource::Text(text.to_string()),
        }
    }
}

impl Cell {
    pub fn is_markdown(&self) -> bool {
        self.cell_type == "markdown"
    }
}

/// A cell slot in one language's output.
enum Slot {
    Copied(usize),
    Markdown { index: usize, lines: Vec<String> },
}

/// Extracts configuration from the markdown cells, in order.
pub fn extract_config_from_notebook(notebook: &Notebook) -> Result<Config, ConfigError> {
    let texts = notebook.texts();
    extract_config_from_segments(&markdown_segments(notebook, &texts))
}

/// Runs the health check over every markdown cell.
pub fn check_notebook(notebook: &Notebook, config: &Config) -> HealthChecker {
    let texts = notebook.texts();
    let mut checker = HealthChecker::new();
    checker.check_segments(&markdown_segments(notebook, &texts), config);
    checker
}

impl Notebook {
    fn texts(&self) -> Vec<String> {
        self.cells.iter().map(|c| c.source.text()).collect()
    }
}

fn markdown_segments<'a>(notebook: &Notebook, texts: &'a [String]) -> Vec<Segment<'a>> {
    notebook
        .cells
        .iter()
        .zip(texts)
        .enumerate()
        .filter(|(_, (cell, _))| cell.is_markdown())
        .map(|(index, (_, text))| Segment::from_text(Origin::Cell(index), text))
        .collect()
}

/// Splits a notebook into one notebook per declared language.
pub fn convert_notebook(
    notebook: &Notebook,
    options: &ConvertOptions,
) -> Result<LangMap<Notebook>, ConvertError> {
    let texts = notebook.texts();
    let segments = markdown_segments(notebook, &texts);

    let config = resolve_config(options, || extract_config_from_segments(&segments))?;
    run_gate(&segments, &config, options)?;

    let mut slots: LangMap<Vec<Slot>> = LangMap::from_fn(&config.lang_tags, |_| Vec::new());
    let mut markdown = segments.iter().peekable();

    for index in 0..notebook.cells.len() {
        let segment = match markdown.peek() {
            Some(segment) if segment.origin == Origin::Cell(index) => markdown.next(),
            _ => None,
        };
        let Some(segment) = segment else {
            for cells in slots.values_mut() {
                cells.push(Slot::Copied(index));
            }
            continue;
        };

        let Classification { docs, dropped } = classify(&segment.lines, &config.lang_tags);
        report_dropped(options, &segment.origin, &dropped);

        for ((_, cells), (_, lines)) in slots.iter_mut().zip(docs) {
            if lines.iter().any(|line| !line.trim().is_empty()) {
                cells.push(Slot::Markdown { index, lines });
            }
        }
    }

    if options.insert_toc {
        for cells in slots.values_mut() {
            insert_toc(cells);
        }
    }

    Ok(slots.map(|_, cells| Notebook {
        cells: cells
            .into_iter()
            .map(|slot| rebuild(notebook, &texts, slot))
            .collect(),
        extra: notebook.extra.clone(),
    }))
}

/// Plans over every markdown cell of one language and inserts into the
/// cell holding the title heading.
fn insert_toc(cells: &mut [Slot]) {
    let positions: Vec<usize> = cells
        .iter()
        .enumerate()
        .filter(|(_, slot)| matches!(slot, Slot::Markdown { .. }))
        .map(|(position, _)| position)
        .collect();
    let sources: Vec<&[String]> = cells
        .iter()
        .filter_map(|slot| match slot {
            Slot::Markdown { lines, .. } => Some(lines.as_slice()),
            Slot::Copied(_) => None,
        })
        .collect();

    let Some(plan) = toc::plan_toc(&sources) else {
        return;
    };
    if let Some(Slot::Markdown { lines, .. }) = cells.get_mut(positions[plan.segment]) {
        plan.apply(lines);
    }
}

fn rebuild(notebook: &Notebook, texts: &[String], slot: Slot) -> Cell {
    match slot {
        Slot::Copied(index) => notebook.cells[index].clone(),
        Slot::Markdown { index, lines } => {
            let original = &notebook.cells[index];
            let text = join_lines(&lines, texts[index].ends_with('\n'));
            Cell {
                source: original.source.with_text(&text),
                ..original.clone()
            }
        }
    }
}
