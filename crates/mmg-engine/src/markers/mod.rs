//! # Marker Grammar
//!
//! Recognizes the directives authors embed in a base document. Two comment
//! styles carry the same payload grammar:
//!
//! | payload              | block comment                  | line comment          |
//! |----------------------|--------------------------------|-----------------------|
//! | language switch      | `<!-- [en] -->`                | `# [en]`              |
//! | tag-set declaration  | `<!-- lang_tags: en, es -->`   | `# lang_tags: en, es` |
//! | default language     | `<!-- no_suffix: en -->`       | `# no_suffix: en`     |
//!
//! A block comment may sit anywhere in a line, surrounded by prose. A line
//! comment must own the whole line, otherwise every `# heading` would be a
//! candidate. A line carries at most one directive; the first recognizable
//! comment wins.
//!
//! Callers never learn which comment style matched.

pub mod code_fence;

use std::sync::OnceLock;

use regex::Regex;

pub use code_fence::{CodeBlockMask, CodeFence, FenceKind};

/// A directive recognized on a single line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Marker {
    /// `[tag]`: switch the active tag. The payload is raw and may name a
    /// reserved keyword or an undeclared tag.
    LangSwitch(String),
    /// `lang_tags: a, b, c`: entries trimmed, empty entries dropped.
    ConfigLangTags(Vec<String>),
    /// `no_suffix: x`
    ConfigNoSuffix(String),
}

impl Marker {
    /// Parses `line`, returning the directive it carries, if any.
    pub fn parse(line: &str) -> Option<Marker> {
        static BLOCK_COMMENT: OnceLock<Regex> = OnceLock::new();
        static LINE_COMMENT: OnceLock<Regex> = OnceLock::new();

        let block = BLOCK_COMMENT
            .get_or_init(|| Regex::new(r"<!--(.*?)-->").expect("Invalid block comment regex"));
        if let Some(marker) = block
            .captures_iter(line)
            .find_map(|caps| parse_payload(&caps[1]))
        {
            return Some(marker);
        }

        let hash = LINE_COMMENT
            .get_or_init(|| Regex::new(r"^\s*#(.*)$").expect("Invalid line comment regex"));
        hash.captures(line).and_then(|caps| parse_payload(&caps[1]))
    }

    pub fn is_switch(&self) -> bool {
        matches!(self, Marker::LangSwitch(_))
    }
}

fn parse_payload(body: &str) -> Option<Marker> {
    static SWITCH: OnceLock<Regex> = OnceLock::new();
    static LANG_TAGS: OnceLock<Regex> = OnceLock::new();
    static NO_SUFFIX: OnceLock<Regex> = OnceLock::new();

    let body = body.trim();

    let switch = SWITCH
        .get_or_init(|| Regex::new(r"^\[\s*([^\[\]\s]+)\s*\]$").expect("Invalid switch regex"));
    if let Some(caps) = switch.captures(body) {
        return Some(Marker::LangSwitch(caps[1].to_string()));
    }

    let lang_tags = LANG_TAGS.get_or_init(|| {
        Regex::new(r"^lang_tags\s*:\s*(\S.*)$").expect("Invalid lang_tags regex")
    });
    if let Some(caps) = lang_tags.captures(body) {
        return Some(Marker::ConfigLangTags(split_tag_list(&caps[1])));
    }

    let no_suffix = NO_SUFFIX.get_or_init(|| {
        Regex::new(r"^no_suffix\s*:\s*(\S+)$").expect("Invalid no_suffix regex")
    });
    no_suffix
        .captures(body)
        .map(|caps| Marker::ConfigNoSuffix(caps[1].to_string()))
}

/// Splits a comma-separated tag list, trimming entries and dropping empty ones.
pub fn split_tag_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn switch(tag: &str) -> Option<Marker> {
        Some(Marker::LangSwitch(tag.to_string()))
    }

    #[rstest]
    #[case("<!-- [en] -->", switch("en"))]
    #[case("<!--[es-MX]-->", switch("es-MX"))]
    #[case("   <!-- [ ko ] -->   ", switch("ko"))]
    #[case("Some prose <!-- [fr] --> more prose", switch("fr"))]
    #[case("# [en]", switch("en"))]
    #[case("  #[zh_Hant]", switch("zh_Hant"))]
    #[case("<!-- [common] -->", switch("common"))]
    #[case("<!-- [<Unknown>] -->", switch("<Unknown>"))]
    #[case("<!-- note --> <!-- [en] -->", switch("en"))]
    fn recognizes_language_switches(#[case] line: &str, #[case] expected: Option<Marker>) {
        assert_eq!(Marker::parse(line), expected);
    }

    #[rstest]
    #[case("<!-- lang_tags: en, es, fr -->", &["en", "es", "fr"])]
    #[case("<!--lang_tags:en,es-->", &["en", "es"])]
    #[case("# lang_tags: en-US , es-MX", &["en-US", "es-MX"])]
    #[case("<!-- lang_tags: en,, es, -->", &["en", "es"])]
    fn recognizes_tag_declarations(#[case] line: &str, #[case] expected: &[&str]) {
        let expected = expected.iter().map(|s| s.to_string()).collect();
        assert_eq!(Marker::parse(line), Some(Marker::ConfigLangTags(expected)));
    }

    #[rstest]
    #[case("<!-- no_suffix: en -->", "en")]
    #[case("# no_suffix:ko", "ko")]
    fn recognizes_default_language(#[case] line: &str, #[case] expected: &str) {
        assert_eq!(
            Marker::parse(line),
            Some(Marker::ConfigNoSuffix(expected.to_string()))
        );
    }

    #[rstest]
    #[case("Hello world")]
    #[case("")]
    #[case("<!-- just a comment -->")]
    #[case("<!-- [two words] -->")]
    #[case("<!-- [] -->")]
    #[case("## [en]")]
    #[case("# [en] Introduction")]
    #[case("Text # [en]")]
    #[case("<!-- lang_tags: -->")]
    #[case("<!-- no_suffix: en es -->")]
    #[case("[en]")]
    fn rejects_non_directives(#[case] line: &str) {
        assert_eq!(Marker::parse(line), None);
    }

    #[test]
    fn switch_detection() {
        assert!(Marker::parse("<!-- [en] -->").unwrap().is_switch());
        assert!(!Marker::parse("<!-- no_suffix: en -->").unwrap().is_switch());
    }
}
