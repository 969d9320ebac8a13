//! Tree conversion.
//!
//! Produces one tree per language with the same keys, sequence lengths and
//! scalar values as the input. Only string leaves are classified. The
//! top-level [`CONFIG_KEY`] entry is copied unchanged into every output.

use serde_yaml::value::TaggedValue;
use serde_yaml::{Mapping, Value};

use crate::classify::{Classification, classify};
use crate::config::{CONFIG_KEY, Config, LangTag, extract_config_from_tree};
use crate::health::HealthChecker;
use crate::lang_map::LangMap;
use crate::source::{Origin, Segment};

use super::{ConvertError, ConvertOptions, join_lines, report_dropped, resolve_config, run_gate};

/// Runs the health check over every string leaf outside [`CONFIG_KEY`].
pub fn check_tree(tree: &Value, config: &Config) -> HealthChecker {
    let mut checker = HealthChecker::new();
    checker.check_segments(&leaf_segments(tree), config);
    checker
}

/// Splits a tree into one parallel tree per declared language.
///
/// Tables of contents are never inserted into trees.
pub fn convert_tree(tree: &Value, options: &ConvertOptions) -> Result<LangMap<Value>, ConvertError> {
    let config = resolve_config(options, || extract_config_from_tree(tree))?;
    run_gate(&leaf_segments(tree), &config, options)?;

    let splitter = Splitter {
        tags: &config.lang_tags,
        options,
    };
    Ok(splitter.split(tree, "", true))
}

fn leaf_segments(tree: &Value) -> Vec<Segment<'_>> {
    let mut leaves = Vec::new();
    collect_leaves(tree, String::new(), true, &mut leaves);
    leaves
        .into_iter()
        .map(|(path, text)| Segment::from_text(Origin::Leaf(path), text))
        .collect()
}

/// String leaves in document order, keyed by path.
fn collect_leaves<'a>(value: &'a Value, path: String, top: bool, out: &mut Vec<(String, &'a str)>) {
    match value {
        Value::String(text) => out.push((path, text.as_str())),
        Value::Sequence(items) => {
            for (i, item) in items.iter().enumerate() {
                collect_leaves(item, format!("{path}[{i}]"), false, out);
            }
        }
        Value::Mapping(map) => {
            for (key, child) in map {
                if top && is_config_key(key) {
                    continue;
                }
                collect_leaves(child, child_path(&path, key), false, out);
            }
        }
        Value::Tagged(tagged) => collect_leaves(&tagged.value, path, false, out),
        Value::Null | Value::Bool(_) | Value::Number(_) => {}
    }
}

struct Splitter<'a> {
    tags: &'a [LangTag],
    options: &'a ConvertOptions,
}

impl Splitter<'_> {
    fn split(&self, value: &Value, path: &str, top: bool) -> LangMap<Value> {
        match value {
            Value::Mapping(map) => {
                let mut out = LangMap::from_fn(self.tags, |_| Mapping::new());
                for (key, child) in map {
                    if top && is_config_key(key) {
                        for mapping in out.values_mut() {
                            mapping.insert(key.clone(), child.clone());
                        }
                        continue;
                    }
                    let parts = self.split(child, &child_path(path, key), false);
                    for (mapping, (_, part)) in out.values_mut().zip(parts) {
                        mapping.insert(key.clone(), part);
                    }
                }
                out.map(|_, mapping| Value::Mapping(mapping))
            }
            Value::Sequence(items) => {
                let mut out = LangMap::from_fn(self.tags, |_| Vec::with_capacity(items.len()));
                for (i, item) in items.iter().enumerate() {
                    let parts = self.split(item, &format!("{path}[{i}]"), false);
                    for (sequence, (_, part)) in out.values_mut().zip(parts) {
                        sequence.push(part);
                    }
                }
                out.map(|_, sequence| Value::Sequence(sequence))
            }
            Value::String(text) => self.split_leaf(text, path),
            Value::Tagged(tagged) => self.split(&tagged.value, path, false).map(|_, value| {
                Value::Tagged(Box::new(TaggedValue {
                    tag: tagged.tag.clone(),
                    value,
                }))
            }),
            scalar => LangMap::from_fn(self.tags, |_| scalar.clone()),
        }
    }

    fn split_leaf(&self, text: &str, path: &str) -> LangMap<Value> {
        let lines: Vec<&str> = text.lines().collect();
        let Classification { docs, dropped } = classify(&lines, self.tags);
        report_dropped(self.options, &Origin::Leaf(path.to_string()), &dropped);

        let trailing_newline = text.ends_with('\n');
        docs.map(|_, lines| Value::String(join_lines(&lines, trailing_newline)))
    }
}

fn is_config_key(key: &Value) -> bool {
    key.as_str() == Some(CONFIG_KEY)
}

fn child_path(parent: &str, key: &Value) -> String {
    let key = match key {
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Null => "~".to_string(),
        _ => "?".to_string(),
    };
    if parent.is_empty() {
        key
    } else {
        format!("{parent}.{key}")
    }
}
