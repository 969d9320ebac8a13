use crate::config::LangTag;
use crate::lang_map::LangMap;

use super::{ActiveTag, LineClass};

/// A content line that reached no output because its active tag is not declared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroppedLine {
    /// 1-based line within the classified run.
    pub line: usize,
    pub tag: String,
}

/// Result of classifying one run of lines.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub docs: LangMap<Vec<String>>,
    /// Non-blank lines routed to an undeclared tag, in source order.
    pub dropped: Vec<DroppedLine>,
}

/// State machine routing content lines to per-language outputs.
pub struct TargetBuilder {
    active: ActiveTag,
    docs: LangMap<Vec<String>>,
    dropped: Vec<DroppedLine>,
    line: usize,
}

impl TargetBuilder {
    pub fn new(lang_tags: &[LangTag]) -> Self {
        Self {
            active: ActiveTag::Unknown,
            docs: LangMap::from_fn(lang_tags, |_| Vec::new()),
            dropped: Vec::new(),
            line: 0,
        }
    }

    pub fn active(&self) -> &ActiveTag {
        &self.active
    }

    pub fn push(&mut self, class: &LineClass<'_>) {
        self.line += 1;

        match class {
            LineClass::Switch(tag) => self.active = tag.clone(),
            LineClass::Directive => {}
            LineClass::Content(text) => self.route(text),
        }
    }

    pub fn finish(self) -> Classification {
        Classification {
            docs: self.docs,
            dropped: self.dropped,
        }
    }

    fn route(&mut self, text: &str) {
        match &self.active {
            ActiveTag::Unknown | ActiveTag::Common => {
                for doc in self.docs.values_mut() {
                    doc.push(text.to_string());
                }
            }
            ActiveTag::Ignore => {}
            ActiveTag::Lang(tag) => match self.docs.get_mut(tag) {
                Some(doc) => doc.push(text.to_string()),
                None => {
                    if !text.trim().is_empty() {
                        self.dropped.push(DroppedLine {
                            line: self.line,
                            tag: tag.clone(),
                        });
                    }
                }
            },
        }
    }
}
