//! Per-document configuration: the declared language tags and the
//! language rendered without a file-name suffix.
//!
//! Line-oriented documents and notebooks declare it with comment
//! directives (see [`crate::markers`]); trees declare it under the
//! reserved top-level key [`CONFIG_KEY`].

use std::borrow::Borrow;
use std::fmt;

use serde_yaml::Value;

use crate::markers::{CodeBlockMask, Marker, split_tag_list};
use crate::source::{Location, Segment};

/// Tags with control meaning for the classifier. Never valid as a declared language.
pub const RESERVED_KEYWORDS: [&str; 3] = ["common", "ignore", "<Unknown>"];

/// Top-level tree key holding configuration.
pub const CONFIG_KEY: &str = "mmg";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("The configuration 'lang_tags' is already defined. [Check {0}]")]
    DuplicateLangTags(Location),
    #[error("The configuration 'no_suffix' is already defined. [Check {0}]")]
    DuplicateNoSuffix(Location),
    #[error("`{0}` is a reserved keyword and cannot be used as a language tag")]
    ReservedTag(String),
    #[error("language tag `{0}` is declared more than once")]
    DuplicateTag(String),
    #[error("language tags cannot be empty")]
    EmptyTag,
    #[error("language tag `{0}` contains whitespace")]
    WhitespaceInTag(String),
    #[error("no language tags are declared")]
    NoLangTags,
    #[error("no_suffix `{0}` is not one of the declared language tags")]
    NoSuffixNotDeclared(String),
    #[error("invalid `mmg` section: {0}")]
    InvalidTree(String),
}

/// A declared language tag. Construction rejects empty strings, inner
/// whitespace and [`RESERVED_KEYWORDS`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LangTag(String);

impl LangTag {
    pub fn new(tag: impl Into<String>) -> Result<Self, ConfigError> {
        let tag = tag.into();
        if tag.is_empty() {
            return Err(ConfigError::EmptyTag);
        }
        if tag.chars().any(char::is_whitespace) {
            return Err(ConfigError::WhitespaceInTag(tag));
        }
        if RESERVED_KEYWORDS.contains(&tag.as_str()) {
            return Err(ConfigError::ReservedTag(tag));
        }
        Ok(Self(tag))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LangTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for LangTag {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for LangTag {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for LangTag {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for LangTag {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Built once per conversion and never mutated afterwards.
///
/// Declared order of `lang_tags` is the order of every per-language output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    pub lang_tags: Vec<LangTag>,
    pub no_suffix: Option<LangTag>,
}

impl Config {
    pub fn new<I, S>(lang_tags: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Ok(Self {
            lang_tags: parse_tags(lang_tags)?,
            no_suffix: None,
        })
    }

    pub fn with_no_suffix(mut self, tag: impl Into<String>) -> Result<Self, ConfigError> {
        self.no_suffix = Some(LangTag::new(tag)?);
        Ok(self)
    }

    pub fn is_declared(&self, tag: &str) -> bool {
        self.lang_tags.iter().any(|t| t == tag)
    }

    /// Checks the invariants extraction leaves to the caller: at least one
    /// tag, no tag twice, and `no_suffix` naming a declared tag.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.lang_tags.is_empty() {
            return Err(ConfigError::NoLangTags);
        }
        for (i, tag) in self.lang_tags.iter().enumerate() {
            if self.lang_tags[..i].contains(tag) {
                return Err(ConfigError::DuplicateTag(tag.to_string()));
            }
        }
        if let Some(no_suffix) = &self.no_suffix
            && !self.lang_tags.contains(no_suffix)
        {
            return Err(ConfigError::NoSuffixNotDeclared(no_suffix.to_string()));
        }
        Ok(())
    }

    /// File-name suffix for `tag`, or `None` for the `no_suffix` language.
    pub fn suffix_for<'a>(&self, tag: &'a LangTag) -> Option<&'a str> {
        match &self.no_suffix {
            Some(no_suffix) if no_suffix == tag => None,
            _ => Some(tag.as_str()),
        }
    }
}

fn parse_tags<I, S>(tags: I) -> Result<Vec<LangTag>, ConfigError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    tags.into_iter().map(LangTag::new).collect()
}

/// Extracts configuration from the lines of a line-oriented document.
pub fn extract_config(lines: &[&str]) -> Result<Config, ConfigError> {
    extract_config_from_segments(&[Segment::document(lines)])
}

/// Extracts one configuration from several segments scanned in order
/// (the markdown cells of a notebook). Lines inside fenced code are
/// skipped; a second declaration of either key fails at its location.
pub fn extract_config_from_segments(segments: &[Segment<'_>]) -> Result<Config, ConfigError> {
    let mut lang_tags: Option<Vec<LangTag>> = None;
    let mut no_suffix: Option<LangTag> = None;

    for segment in segments {
        let mask = CodeBlockMask::compute(&segment.lines);
        for (index, line) in segment.lines.iter().enumerate() {
            if mask.is_masked(index) {
                continue;
            }
            match Marker::parse(line) {
                Some(Marker::ConfigLangTags(tags)) => {
                    if lang_tags.is_some() {
                        return Err(ConfigError::DuplicateLangTags(segment.location(index)));
                    }
                    lang_tags = Some(parse_tags(tags)?);
                }
                Some(Marker::ConfigNoSuffix(tag)) => {
                    if no_suffix.is_some() {
                        return Err(ConfigError::DuplicateNoSuffix(segment.location(index)));
                    }
                    no_suffix = Some(LangTag::new(tag)?);
                }
                _ => {}
            }
        }
    }

    Ok(Config {
        lang_tags: lang_tags.unwrap_or_default(),
        no_suffix,
    })
}

/// Extracts configuration from the reserved [`CONFIG_KEY`] of a tree.
///
/// `lang_tags` may be a comma-separated string or a sequence of scalars;
/// entries are trimmed. A tree without the key yields an empty config.
pub fn extract_config_from_tree(tree: &Value) -> Result<Config, ConfigError> {
    let section = match tree.get(CONFIG_KEY) {
        None | Some(Value::Null) => return Ok(Config::default()),
        Some(Value::Mapping(section)) => section,
        Some(_) => return Err(ConfigError::InvalidTree("expected a mapping".to_string())),
    };

    let lang_tags = match section.get("lang_tags") {
        None => Vec::new(),
        Some(Value::String(list)) => parse_tags(split_tag_list(list))?,
        Some(Value::Sequence(items)) => {
            let mut tags = Vec::with_capacity(items.len());
            for item in items {
                let tag = scalar_to_string(item).ok_or_else(|| {
                    ConfigError::InvalidTree("lang_tags entries must be scalars".to_string())
                })?;
                tags.push(LangTag::new(tag.trim())?);
            }
            tags
        }
        Some(_) => {
            return Err(ConfigError::InvalidTree(
                "lang_tags must be a string or a sequence".to_string(),
            ));
        }
    };

    let no_suffix = match section.get("no_suffix") {
        None | Some(Value::Null) => None,
        Some(value) => {
            let tag = scalar_to_string(value).ok_or_else(|| {
                ConfigError::InvalidTree("no_suffix must be a scalar".to_string())
            })?;
            Some(LangTag::new(tag.trim())?)
        }
    };

    Ok(Config {
        lang_tags,
        no_suffix,
    })
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
