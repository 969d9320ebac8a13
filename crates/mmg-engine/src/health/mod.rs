//! # Health Checking
//!
//! The gate run before a classification is trusted. It re-runs the marker
//! grammar over the document (skipping fenced code, like config
//! extraction), counts switch markers per declared tag and collects
//! diagnostics.
//!
//! ## Verdicts
//!
//! - **UNHEALTHY**: a declared tag has no marker at all, or a marker names
//!   an undeclared tag.
//! - **WARNING**: the document converts but something looks off: a declared
//!   tag never governs any content, a marker is directly followed by
//!   another marker, or a code fence is never closed.
//! - **HEALTHY**: nothing to report.
//!
//! Messages are kept in detection order and cleared by the next run.

mod render;

use std::collections::HashSet;
use std::fmt;

use indexmap::IndexMap;

pub use render::Verbosity;

use crate::classify::ActiveTag;
use crate::config::{Config, LangTag};
use crate::markers::{CodeBlockMask, Marker};
use crate::source::{Location, Segment};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HealthStatus {
    #[default]
    Healthy,
    Warning,
    Unhealthy,
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            HealthStatus::Healthy => "HEALTHY",
            HealthStatus::Warning => "WARNING",
            HealthStatus::Unhealthy => "UNHEALTHY",
        })
    }
}

/// Switch-marker occurrences, one entry per declared tag in declared order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagCount {
    counts: IndexMap<LangTag, usize>,
}

impl TagCount {
    fn new(tags: &[LangTag]) -> Self {
        Self {
            counts: tags.iter().map(|t| (t.clone(), 0)).collect(),
        }
    }

    /// Returns false when `tag` is not declared.
    fn bump(&mut self, tag: &str) -> bool {
        match self.counts.get_mut(tag) {
            Some(count) => {
                *count += 1;
                true
            }
            None => false,
        }
    }

    pub fn get(&self, tag: &str) -> Option<usize> {
        self.counts.get(tag).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&LangTag, usize)> {
        self.counts.iter().map(|(t, c)| (t, *c))
    }
}

impl std::ops::Index<&str> for TagCount {
    type Output = usize;

    fn index(&self, tag: &str) -> &usize {
        self.counts
            .get(tag)
            .unwrap_or_else(|| panic!("language tag `{tag}` is not declared"))
    }
}

#[derive(Debug, Clone, Default)]
pub struct HealthChecker {
    status: HealthStatus,
    tag_count: TagCount,
    error_messages: Vec<String>,
}

impl HealthChecker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Checks a line-oriented document.
    pub fn check(&mut self, lines: &[&str], config: &Config) -> HealthStatus {
        self.check_segments(&[Segment::document(lines)], config)
    }

    /// Checks a document made of several segments (notebook cells, tree
    /// leaves). Counts and messages accumulate across segments.
    pub fn check_segments(&mut self, segments: &[Segment<'_>], config: &Config) -> HealthStatus {
        self.status = HealthStatus::Healthy;
        self.tag_count = TagCount::new(&config.lang_tags);
        self.error_messages.clear();

        let mut governing: HashSet<String> = HashSet::new();
        for segment in segments {
            self.scan(segment, &mut governing);
        }

        for tag in &config.lang_tags {
            if self.tag_count.get(tag.as_str()) == Some(0) {
                self.report(
                    HealthStatus::Unhealthy,
                    format!("tag `{tag}` has no marker, so its document would only hold shared content"),
                );
            } else if !governing.contains(tag.as_str()) {
                self.report(
                    HealthStatus::Warning,
                    format!("tag `{tag}` has markers but never governs any content"),
                );
            }
        }

        self.status
    }

    fn scan(&mut self, segment: &Segment<'_>, governing: &mut HashSet<String>) {
        let mask = CodeBlockMask::compute(&segment.lines);
        if let Some(start) = mask.unclosed_from() {
            self.report(
                HealthStatus::Warning,
                format!("{}: code fence is never closed", segment.location(start)),
            );
        }

        let mut active = ActiveTag::Unknown;
        // Last switch marker not yet followed by non-blank content.
        let mut pending: Option<(Location, String)> = None;

        for (index, line) in segment.lines.iter().enumerate() {
            let marker = if mask.is_masked(index) {
                None
            } else {
                Marker::parse(line)
            };

            match marker {
                Some(Marker::LangSwitch(tag)) => {
                    let location = segment.location(index);
                    if let Some((previous, previous_tag)) = pending.take() {
                        self.report(
                            HealthStatus::Warning,
                            format!(
                                "{previous}: marker `[{previous_tag}]` is directly followed by another marker at {location}"
                            ),
                        );
                    }

                    active = ActiveTag::from_marker(&tag);
                    if let ActiveTag::Lang(lang) = &active
                        && !self.tag_count.bump(lang)
                    {
                        self.report(
                            HealthStatus::Unhealthy,
                            format!("{location}: marker references undeclared tag `{lang}`"),
                        );
                    }
                    pending = Some((location, tag));
                }
                Some(_) => {}
                None => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    pending = None;
                    if let ActiveTag::Lang(lang) = &active {
                        governing.insert(lang.clone());
                    }
                }
            }
        }

        if let Some((location, tag)) = pending {
            self.report(
                HealthStatus::Warning,
                format!("{location}: marker `[{tag}]` is not followed by any content"),
            );
        }
    }

    fn report(&mut self, severity: HealthStatus, message: String) {
        let prefix = match severity {
            HealthStatus::Unhealthy => "error",
            _ => "warning",
        };
        self.error_messages.push(format!("{prefix}: {message}"));
        self.status = self.status.max(severity);
    }

    pub fn status(&self) -> HealthStatus {
        self.status
    }

    pub fn tag_count(&self) -> &TagCount {
        &self.tag_count
    }

    pub fn error_messages(&self) -> &[String] {
        &self.error_messages
    }
}
