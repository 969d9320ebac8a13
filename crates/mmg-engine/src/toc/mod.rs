//! # Table of Contents
//!
//! Post-pass over classified output. Collects ATX headings, derives anchors
//! and splices a nested link list into the document.
//!
//! The first heading, whatever its level, acts as the document title: the
//! list goes right after it and the title itself is not listed. Headings
//! inside fenced code or YAML front matter never count. A document with
//! nothing to list is untouched.
//!
//! The pass only inserts lines; it never removes or reorders content.

mod slug;

use pulldown_cmark::{Event, HeadingLevel, Options, Parser, Tag, TagEnd};

pub use slug::{Slugger, slugify};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocEntry {
    pub level: u8,
    pub title: String,
    pub anchor: String,
}

/// Where and what to insert, computed over one or more segments
/// (a markdown document, or the markdown cells of a notebook).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocPlan {
    /// Index of the segment receiving the block.
    pub segment: usize,
    /// Line index the block is inserted before.
    pub line: usize,
    pub entries: Vec<TocEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Heading {
    line: usize,
    level: u8,
    title: String,
}

/// Plans a TOC over `segments`. Anchors are unique across all segments.
pub fn plan_toc(segments: &[&[String]]) -> Option<TocPlan> {
    let mut slugger = Slugger::default();
    let mut located: Vec<(usize, Heading, String)> = Vec::new();

    for (index, lines) in segments.iter().enumerate() {
        for heading in scan_headings(lines) {
            let anchor = slugger.slug(&heading.title);
            located.push((index, heading, anchor));
        }
    }

    let (segment, line) = located
        .first()
        .map(|(index, title, _)| (*index, title.line + 1))?;

    let entries: Vec<TocEntry> = located
        .into_iter()
        .skip(1)
        .map(|(_, heading, anchor)| TocEntry {
            level: heading.level,
            title: heading.title,
            anchor,
        })
        .collect();

    if entries.is_empty() {
        return None;
    }

    Some(TocPlan {
        segment,
        line,
        entries,
    })
}

impl TocPlan {
    /// One list item per entry, nested two spaces per level below the
    /// shallowest entry.
    pub fn render(&self) -> Vec<String> {
        let min_level = self.entries.iter().map(|e| e.level).min().unwrap_or(1);
        self.entries
            .iter()
            .map(|e| {
                format!(
                    "{}- [{}](#{})",
                    "  ".repeat(usize::from(e.level - min_level)),
                    e.title,
                    e.anchor
                )
            })
            .collect()
    }

    /// Splices the rendered block into `lines`, the planned segment,
    /// separated from its neighbours by blank lines.
    pub fn apply(&self, lines: &mut Vec<String>) {
        let at = self.line.min(lines.len());
        let mut block = Vec::with_capacity(self.entries.len() + 2);

        if at > 0 && !lines[at - 1].trim().is_empty() {
            block.push(String::new());
        }
        block.extend(self.render());
        if lines.get(at).is_some_and(|next| !next.trim().is_empty()) {
            block.push(String::new());
        }

        lines.splice(at..at, block);
    }
}

/// Inserts a TOC into one document. Returns whether anything was inserted.
pub fn insert_toc(lines: &mut Vec<String>) -> bool {
    match plan_toc(&[lines.as_slice()]) {
        Some(plan) => {
            plan.apply(lines);
            true
        }
        None => false,
    }
}

fn scan_headings(lines: &[String]) -> Vec<Heading> {
    let source = lines.join("\n");
    let line_starts: Vec<usize> = std::iter::once(0)
        .chain(
            source
                .match_indices('\n')
                .map(|(offset, _)| offset + 1),
        )
        .collect();
    let line_of = |offset: usize| line_starts.partition_point(|&start| start <= offset) - 1;

    let mut headings = Vec::new();
    let mut current: Option<Heading> = None;

    let parser = Parser::new_ext(&source, Options::ENABLE_YAML_STYLE_METADATA_BLOCKS);
    for (event, range) in parser.into_offset_iter() {
        match event {
            Event::Start(Tag::Heading { level, .. }) => {
                let line = line_of(range.start);
                if is_atx(&lines[line]) {
                    current = Some(Heading {
                        line,
                        level: heading_level_to_u8(level),
                        title: String::new(),
                    });
                }
            }
            Event::Text(text) | Event::Code(text) => {
                if let Some(heading) = current.as_mut() {
                    heading.title.push_str(&text);
                }
            }
            Event::End(TagEnd::Heading(_)) => {
                if let Some(mut heading) = current.take() {
                    heading.title = heading.title.trim().to_string();
                    headings.push(heading);
                }
            }
            _ => {}
        }
    }

    headings
}

fn is_atx(line: &str) -> bool {
    line.trim_start().starts_with('#')
}

fn heading_level_to_u8(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn owned(text: &str) -> Vec<String> {
        text.lines().map(str::to_string).collect()
    }

    #[test]
    fn inserts_after_title() {
        let mut lines = owned("# Guide\nIntro\n## Install\n### From source\n## Usage");
        assert!(insert_toc(&mut lines));

        insta::assert_snapshot!(lines.join("\n"), @r"
        # Guide

        - [Install](#install)
          - [From source](#from-source)
        - [Usage](#usage)

        Intro
        ## Install
        ### From source
        ## Usage
        ");
    }

    #[test]
    fn first_heading_of_any_level_is_the_title() {
        let mut lines = owned("Intro text\n## Overview\nbody\n## Details\n### More");
        assert!(insert_toc(&mut lines));

        assert_eq!(
            lines,
            vec![
                "Intro text",
                "## Overview",
                "",
                "- [Details](#details)",
                "  - [More](#more)",
                "",
                "body",
                "## Details",
                "### More",
            ]
        );
    }

    #[test]
    fn front_matter_is_not_a_heading() {
        let mut lines = owned("---\ntitle: Demo\n---\n## Part\n## Next");
        assert!(insert_toc(&mut lines));

        assert_eq!(
            lines,
            vec!["---", "title: Demo", "---", "## Part", "", "- [Next](#next)", "", "## Next"]
        );
    }

    #[test]
    fn no_headings_means_no_change() {
        let mut lines = owned("Hello\nWorld");
        assert!(!insert_toc(&mut lines));
        assert_eq!(lines, vec!["Hello", "World"]);

        let mut title_only = owned("# Title\nbody");
        assert!(!insert_toc(&mut title_only));

        let mut single_section = owned("Preamble\n## Only");
        assert!(!insert_toc(&mut single_section));
    }

    #[test]
    fn fenced_and_setext_headings_are_skipped() {
        let mut lines = owned("# T\n```sh\n# comment\n```\nSetext\n------\n## Real");
        insert_toc(&mut lines);

        assert_eq!(lines[2], "- [Real](#real)");
        assert_eq!(lines.iter().filter(|l| l.starts_with("- [")).count(), 1);
    }

    #[test]
    fn duplicate_anchors_get_suffixes() {
        let lines = owned("# Doc\n## Setup\n## Setup\n## Setup!\n## `code` *and* text");
        let plan = plan_toc(&[lines.as_slice()]).unwrap();
        let anchors: Vec<&str> = plan.entries.iter().map(|e| e.anchor.as_str()).collect();

        assert_eq!(anchors, vec!["setup", "setup-1", "setup-2", "code-and-text"]);
        assert_eq!(plan.entries[3].title, "code and text");
        assert_eq!(plan.line, 1);
    }

    #[test]
    fn plans_across_segments() {
        let first = owned("Preamble");
        let second = owned("# Notebook\n## Load data");
        let third = owned("## Plot");
        let plan = plan_toc(&[&first, &second, &third]).unwrap();

        assert_eq!(plan.segment, 1);
        assert_eq!(plan.line, 1);
        assert_eq!(
            plan.render(),
            vec!["- [Load data](#load-data)", "- [Plot](#plot)"]
        );
    }
}
