//! # Conversion
//!
//! Entry points, one per input shape. Every converter runs the same
//! pipeline: resolve the [`Config`], run the health gate, classify each
//! leaf line sequence, then insert a table of contents.
//!
//! - [`convert`] / [`convert_lines`]: line-oriented markdown.
//! - [`convert_notebook`]: notebooks, classified cell by cell.
//! - [`convert_tree`]: YAML trees, classified string leaf by string leaf.
//!
//! The converters differ only in how they decompose their input into
//! [`Segment`]s and reassemble the classified lines.

pub mod notebook;
pub mod tree;

pub use notebook::{
    Cell, CellSource, Notebook, check_notebook, convert_notebook, extract_config_from_notebook,
};
pub use tree::{check_tree, convert_tree};

use crate::classify::{Classification, DroppedLine, classify};
use crate::config::{Config, ConfigError, extract_config};
use crate::health::{HealthChecker, HealthStatus, Verbosity};
use crate::lang_map::LangMap;
use crate::source::{Location, Origin, Segment};
use crate::toc;

#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Health check failed.\n - Status: {status}\n - Error:\n{}", .messages.join("\n"))]
    HealthCheckFailed {
        status: HealthStatus,
        messages: Vec<String>,
    },
}

/// Options shared by every converter.
///
/// ```
/// use mmg_engine::{ConvertOptions, Verbosity};
///
/// let options = ConvertOptions::new()
///     .force_convert(true)
///     .print_log(true)
///     .verbosity(Verbosity::Counts);
/// assert!(options.insert_toc);
/// ```
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    /// Used instead of in-document directives when set.
    pub config: Option<Config>,
    pub skip_health_check: bool,
    /// Run and log the gate but convert whatever the verdict.
    pub force_convert: bool,
    /// Emit the health log through the `log` facade.
    pub print_log: bool,
    /// Labels the health log.
    pub file_name: Option<String>,
    pub verbosity: Verbosity,
    /// Tree conversion ignores this.
    pub insert_toc: bool,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            config: None,
            skip_health_check: false,
            force_convert: false,
            print_log: false,
            file_name: None,
            verbosity: Verbosity::Summary,
            insert_toc: true,
        }
    }
}

impl ConvertOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    pub fn skip_health_check(mut self, skip: bool) -> Self {
        self.skip_health_check = skip;
        self
    }

    pub fn force_convert(mut self, force: bool) -> Self {
        self.force_convert = force;
        self
    }

    pub fn print_log(mut self, print: bool) -> Self {
        self.print_log = print;
        self
    }

    pub fn file_name(mut self, name: impl Into<String>) -> Self {
        self.file_name = Some(name.into());
        self
    }

    pub fn verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    pub fn insert_toc(mut self, insert: bool) -> Self {
        self.insert_toc = insert;
        self
    }
}

/// Splits a markdown document into one document per declared language.
///
/// A trailing newline on the input is kept on every non-empty output.
pub fn convert(text: &str, options: &ConvertOptions) -> Result<LangMap<String>, ConvertError> {
    let lines: Vec<&str> = text.lines().collect();
    let trailing_newline = text.ends_with('\n');

    let docs = convert_lines(&lines, options)?;
    Ok(docs.map(|_, lines| join_lines(&lines, trailing_newline)))
}

/// Line-level form of [`convert`].
pub fn convert_lines(
    lines: &[&str],
    options: &ConvertOptions,
) -> Result<LangMap<Vec<String>>, ConvertError> {
    let config = resolve_config(options, || extract_config(lines))?;
    run_gate(&[Segment::document(lines)], &config, options)?;

    let Classification { mut docs, dropped } = classify(lines, &config.lang_tags);
    report_dropped(options, &Origin::Document, &dropped);

    if options.insert_toc {
        for doc in docs.values_mut() {
            toc::insert_toc(doc);
        }
    }

    Ok(docs)
}

/// The explicit config if given, else the extracted one. Either way it
/// must validate.
pub(crate) fn resolve_config(
    options: &ConvertOptions,
    extract: impl FnOnce() -> Result<Config, ConfigError>,
) -> Result<Config, ConfigError> {
    let config = match &options.config {
        Some(config) => config.clone(),
        None => extract()?,
    };
    config.validate()?;
    Ok(config)
}

/// Runs the health check unless skipped. Anything but HEALTHY fails the
/// conversion unless forced.
pub(crate) fn run_gate(
    segments: &[Segment<'_>],
    config: &Config,
    options: &ConvertOptions,
) -> Result<(), ConvertError> {
    if options.skip_health_check {
        return Ok(());
    }

    let mut checker = HealthChecker::new();
    let status = checker.check_segments(segments, config);

    if options.print_log {
        let level = match status {
            HealthStatus::Healthy => log::Level::Info,
            _ => log::Level::Warn,
        };
        for line in checker.render_log(options.file_name.as_deref(), options.verbosity) {
            log::log!(level, "{line}");
        }
    }

    if status != HealthStatus::Healthy && !options.force_convert {
        return Err(ConvertError::HealthCheckFailed {
            status,
            messages: checker.error_messages().to_vec(),
        });
    }

    Ok(())
}

pub(crate) fn report_dropped(options: &ConvertOptions, origin: &Origin, dropped: &[DroppedLine]) {
    for line in dropped {
        let location = Location::new(origin.clone(), line.line);
        match &options.file_name {
            Some(name) => log::warn!(
                "{name}: {location}: content under undeclared tag `{}` was dropped",
                line.tag
            ),
            None => log::warn!(
                "{location}: content under undeclared tag `{}` was dropped",
                line.tag
            ),
        }
    }
}

pub(crate) fn join_lines(lines: &[String], trailing_newline: bool) -> String {
    let mut text = lines.join("\n");
    if trailing_newline && !text.is_empty() {
        text.push('\n');
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::capture_logs;
    use log::Level;
    use pretty_assertions::assert_eq;

    fn no_toc() -> ConvertOptions {
        ConvertOptions::new().insert_toc(false)
    }

    #[test]
    fn converts_with_in_document_config() {
        let text = "<!-- lang_tags: en, es -->\n<!-- [en] -->\nHello\n<!-- [es] -->\nHola\n";
        let out = convert(text, &no_toc()).unwrap();

        assert_eq!(out["en"], "Hello\n");
        assert_eq!(out["es"], "Hola\n");
    }

    #[test]
    fn explicit_config_makes_directives_inert() {
        let text = "<!-- lang_tags: en -->\n<!-- [en] -->\nHello\n<!-- [de] -->\nHallo";
        let config = Config::new(["de", "en"]).unwrap();
        let out = convert(text, &no_toc().config(config)).unwrap();

        let tags: Vec<&str> = out.tags().map(|t| t.as_str()).collect();
        assert_eq!(tags, vec!["de", "en"]);
        assert_eq!(out["de"], "Hallo");
    }

    #[test]
    fn unhealthy_document_is_rejected() {
        let text = "<!-- lang_tags: en, es -->\n<!-- [en] -->\nHello";
        let err = convert(text, &no_toc()).unwrap_err();

        match &err {
            ConvertError::HealthCheckFailed { status, messages } => {
                assert_eq!(*status, HealthStatus::Unhealthy);
                assert_eq!(messages.len(), 1);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(err.to_string().starts_with("Health check failed.\n - Status: UNHEALTHY"));
    }

    #[test]
    fn warnings_also_block_unless_forced() {
        let text = "<!-- lang_tags: en, es -->\n<!-- [en] -->\n<!-- [es] -->\nHola\n<!-- [en] -->\nHi";
        assert!(matches!(
            convert(text, &no_toc()),
            Err(ConvertError::HealthCheckFailed {
                status: HealthStatus::Warning,
                ..
            })
        ));

        let out = convert(text, &no_toc().force_convert(true)).unwrap();
        assert_eq!(out["en"], "Hi");
    }

    #[test]
    fn skipping_the_gate_ignores_the_verdict() {
        let text = "<!-- lang_tags: en, es -->\n<!-- [en] -->\nHello";
        let out = convert(text, &no_toc().skip_health_check(true)).unwrap();

        assert_eq!(out["en"], "Hello");
        assert_eq!(out["es"], "");
    }

    #[test]
    fn invalid_config_fails_before_the_gate() {
        let text = "<!-- lang_tags: en, es -->\n<!-- no_suffix: fr -->\n<!-- [en] -->\nHi";
        let err = convert(text, &no_toc().skip_health_check(true)).unwrap_err();

        assert!(matches!(
            err,
            ConvertError::Config(ConfigError::NoSuffixNotDeclared(ref tag)) if tag == "fr"
        ));
    }

    #[test]
    fn missing_config_is_an_error() {
        let err = convert("Just text", &no_toc()).unwrap_err();
        assert!(matches!(err, ConvertError::Config(ConfigError::NoLangTags)));
    }

    #[test]
    fn health_log_level_follows_the_verdict() {
        let healthy = "<!-- lang_tags: en, es -->\n<!-- [en] -->\nHello\n<!-- [es] -->\nHola";
        let logs = capture_logs(|| {
            convert(healthy, &no_toc().print_log(true).file_name("a.base.md")).unwrap();
        });
        assert_eq!(logs, vec![(Level::Info, "[HEALTHY] a.base.md".to_string())]);

        let missing = "<!-- lang_tags: en, es -->\n<!-- [en] -->\nHello";
        let options = no_toc()
            .print_log(true)
            .force_convert(true)
            .verbosity(Verbosity::Messages);
        let logs = capture_logs(|| {
            convert(missing, &options).unwrap();
        });
        assert_eq!(logs.len(), 4);
        assert!(logs.iter().all(|(level, _)| *level == Level::Warn));
        assert_eq!(logs[0].1, "[UNHEALTHY]");
        assert_eq!(logs[2].1, "  - es: 0");
    }

    #[test]
    fn gate_is_silent_without_print_log_or_when_skipped() {
        let text = "<!-- lang_tags: en, es -->\n<!-- [en] -->\nHello";

        let logs = capture_logs(|| {
            let _ = convert(text, &no_toc());
        });
        assert!(logs.is_empty());

        let logs = capture_logs(|| {
            convert(text, &no_toc().print_log(true).skip_health_check(true)).unwrap();
        });
        assert!(logs.is_empty());
    }

    #[test]
    fn forced_conversion_warns_once_per_dropped_line() {
        let text = "<!-- lang_tags: en -->\n<!-- [en] -->\nHi\n<!-- [de] -->\nHallo\nWelt";
        let logs = capture_logs(|| {
            let out = convert(text, &no_toc().force_convert(true).file_name("b.base.md")).unwrap();
            assert_eq!(out["en"], "Hi");
        });

        assert_eq!(
            logs,
            vec![
                (
                    Level::Warn,
                    "b.base.md: line 5: content under undeclared tag `de` was dropped".to_string()
                ),
                (
                    Level::Warn,
                    "b.base.md: line 6: content under undeclared tag `de` was dropped".to_string()
                ),
            ]
        );
    }

    #[test]
    fn toc_is_inserted_per_language() {
        let text = "\
<!-- lang_tags: en, es -->
<!-- [en] -->
# Guide
## Install
<!-- [es] -->
# Guía
## Instalación
";
        let out = convert(text, &ConvertOptions::new()).unwrap();

        assert_eq!(out["en"], "# Guide\n\n- [Install](#install)\n\n## Install\n");
        assert_eq!(
            out["es"],
            "# Guía\n\n- [Instalación](#instalación)\n\n## Instalación\n"
        );
    }

    #[test]
    fn join_lines_keeps_empty_outputs_empty() {
        assert_eq!(join_lines(&[], true), "");
        assert_eq!(join_lines(&["a".into(), "".into()], true), "a\n\n");
    }
}
