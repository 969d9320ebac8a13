//! Base-file discovery, reading and writing.
//!
//! A base file is named `<stem>.base.<ext>`. Its outputs are written next
//! to it (or into an output directory) as `<stem>.<tag>.<ext>`, with the
//! `no_suffix` language written as plain `<stem>.<ext>`.

use std::fs;
use std::path::{Path, PathBuf};

use serde_yaml::Value;

use crate::config::{Config, ConfigError, LangTag, extract_config, extract_config_from_tree};
use crate::convert::{
    ConvertError, ConvertOptions, Notebook, check_notebook, check_tree, convert, convert_notebook,
    convert_tree, extract_config_from_notebook,
};
use crate::health::HealthChecker;
use crate::lang_map::LangMap;

#[derive(Debug, thiserror::Error)]
pub enum IoError {
    #[error("File not found: {0}")]
    NotFound(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid notebook: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("Not a base file (expected `<name>.base.md|ipynb|yml|yaml`): {0}")]
    NotABaseFile(PathBuf),
}

const BASE_MARK: &str = ".base";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaseKind {
    Markdown,
    Notebook,
    Yaml,
}

impl BaseKind {
    fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "md" => Some(BaseKind::Markdown),
            "ipynb" => Some(BaseKind::Notebook),
            "yml" | "yaml" => Some(BaseKind::Yaml),
            _ => None,
        }
    }
}

/// A path recognized as a base file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseFile {
    pub path: PathBuf,
    pub kind: BaseKind,
    stem: String,
    ext: String,
}

impl BaseFile {
    pub fn new(path: impl Into<PathBuf>) -> Result<Self, IoError> {
        let path = path.into();
        Self::parse(&path).ok_or(IoError::NotABaseFile(path))
    }

    fn parse(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?;
        let (rest, ext) = name.rsplit_once('.')?;
        let kind = BaseKind::from_extension(ext)?;
        let stem = rest.strip_suffix(BASE_MARK)?;
        if stem.is_empty() {
            return None;
        }
        Some(Self {
            path: path.to_path_buf(),
            kind,
            stem: stem.to_string(),
            ext: ext.to_string(),
        })
    }

    /// Where the output for `tag` goes.
    pub fn target_path(&self, tag: &LangTag, config: &Config, output_dir: Option<&Path>) -> PathBuf {
        let name = match config.suffix_for(tag) {
            Some(suffix) => format!("{}.{suffix}.{}", self.stem, self.ext),
            None => format!("{}.{}", self.stem, self.ext),
        };
        let dir = output_dir
            .or_else(|| self.path.parent())
            .unwrap_or_else(|| Path::new(""));
        dir.join(name)
    }
}

/// Finds base files under `root`, sorted. Subdirectories are only entered
/// when `recursive` is set.
pub fn scan_base_files(root: &Path, recursive: bool) -> Result<Vec<BaseFile>, IoError> {
    if !root.exists() {
        return Err(IoError::NotFound(root.to_path_buf()));
    }

    let mut files = Vec::new();
    scan_directory(root, recursive, &mut files)?;
    files.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(files)
}

fn scan_directory(dir: &Path, recursive: bool, files: &mut Vec<BaseFile>) -> Result<(), IoError> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();

        if path.is_dir() {
            if recursive {
                scan_directory(&path, recursive, files)?;
            }
        } else if let Some(file) = BaseFile::parse(&path) {
            files.push(file);
        }
    }

    Ok(())
}

/// A parsed base file, or one of its per-language outputs.
#[derive(Debug, Clone, PartialEq)]
pub enum BaseDocument {
    Markdown(String),
    Notebook(Notebook),
    Yaml(Value),
}

impl BaseDocument {
    pub fn read(file: &BaseFile) -> Result<Self, IoError> {
        if !file.path.exists() {
            return Err(IoError::NotFound(file.path.clone()));
        }
        let text = fs::read_to_string(&file.path)?;

        Ok(match file.kind {
            BaseKind::Markdown => BaseDocument::Markdown(text),
            BaseKind::Notebook => BaseDocument::Notebook(serde_json::from_str(&text)?),
            BaseKind::Yaml => BaseDocument::Yaml(serde_yaml::from_str(&text)?),
        })
    }

    /// In-document configuration, not yet validated.
    pub fn extract_config(&self) -> Result<Config, ConfigError> {
        match self {
            BaseDocument::Markdown(text) => {
                let lines: Vec<&str> = text.lines().collect();
                extract_config(&lines)
            }
            BaseDocument::Notebook(notebook) => extract_config_from_notebook(notebook),
            BaseDocument::Yaml(tree) => extract_config_from_tree(tree),
        }
    }

    pub fn health_check(&self, config: &Config) -> HealthChecker {
        match self {
            BaseDocument::Markdown(text) => {
                let lines: Vec<&str> = text.lines().collect();
                let mut checker = HealthChecker::new();
                checker.check(&lines, config);
                checker
            }
            BaseDocument::Notebook(notebook) => check_notebook(notebook, config),
            BaseDocument::Yaml(tree) => check_tree(tree, config),
        }
    }

    pub fn convert(&self, options: &ConvertOptions) -> Result<LangMap<BaseDocument>, ConvertError> {
        Ok(match self {
            BaseDocument::Markdown(text) => {
                convert(text, options)?.map(|_, doc| BaseDocument::Markdown(doc))
            }
            BaseDocument::Notebook(notebook) => {
                convert_notebook(notebook, options)?.map(|_, nb| BaseDocument::Notebook(nb))
            }
            BaseDocument::Yaml(tree) => {
                convert_tree(tree, options)?.map(|_, tree| BaseDocument::Yaml(tree))
            }
        })
    }

    /// Serializes for writing: notebooks as indented JSON, trees as YAML.
    pub fn render(&self) -> Result<String, IoError> {
        Ok(match self {
            BaseDocument::Markdown(text) => text.clone(),
            BaseDocument::Notebook(notebook) => {
                let mut json = serde_json::to_string_pretty(notebook)?;
                json.push('\n');
                json
            }
            BaseDocument::Yaml(tree) => serde_yaml::to_string(tree)?,
        })
    }
}

/// Write content to a file, creating parent directories as needed.
pub fn write_file(path: &Path, content: &str) -> Result<(), IoError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)?;
    Ok(())
}

/// Writes every output of `file` and returns the written paths in
/// declared language order.
pub fn write_targets(
    file: &BaseFile,
    outputs: &LangMap<BaseDocument>,
    config: &Config,
    output_dir: Option<&Path>,
) -> Result<Vec<PathBuf>, IoError> {
    let mut written = Vec::with_capacity(outputs.len());
    for (tag, doc) in outputs.iter() {
        let path = file.target_path(tag, config, output_dir);
        write_file(&path, &doc.render()?)?;
        log::debug!("wrote {}", path.display());
        written.push(path);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::{create_test_dir, create_test_file};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn names(files: &[BaseFile]) -> Vec<String> {
        files
            .iter()
            .map(|f| f.path.file_name().unwrap().to_string_lossy().into_owned())
            .collect()
    }

    #[rstest]
    #[case("README.base.md", Some(BaseKind::Markdown))]
    #[case("lesson.base.ipynb", Some(BaseKind::Notebook))]
    #[case("site.base.yml", Some(BaseKind::Yaml))]
    #[case("site.base.yaml", Some(BaseKind::Yaml))]
    #[case("README.md", None)]
    #[case("README.en.md", None)]
    #[case(".base.md", None)]
    #[case("notes.base.txt", None)]
    fn recognizes_base_files(#[case] name: &str, #[case] kind: Option<BaseKind>) {
        assert_eq!(BaseFile::parse(Path::new(name)).map(|f| f.kind), kind);
    }

    #[test]
    fn target_paths_follow_suffix_rules() {
        let file = BaseFile::new("docs/README.base.md").unwrap();
        let config = Config::new(["en", "ko"]).unwrap().with_no_suffix("en").unwrap();

        let en = &config.lang_tags[0];
        let ko = &config.lang_tags[1];
        assert_eq!(file.target_path(en, &config, None), PathBuf::from("docs/README.md"));
        assert_eq!(file.target_path(ko, &config, None), PathBuf::from("docs/README.ko.md"));
        assert_eq!(
            file.target_path(ko, &config, Some(Path::new("out"))),
            PathBuf::from("out/README.ko.md")
        );
    }

    #[test]
    fn rejects_non_base_paths() {
        let err = BaseFile::new("README.md").unwrap_err();
        assert!(matches!(err, IoError::NotABaseFile(_)));
    }

    #[test]
    fn scans_flat_or_recursive() {
        let dir = create_test_dir();
        create_test_file(&dir, "b.base.md", "");
        create_test_file(&dir, "a.base.ipynb", "{}");
        create_test_file(&dir, "a.en.md", "");
        create_test_file(&dir, "nested/c.base.yml", "");

        let flat = scan_base_files(dir.path(), false).unwrap();
        assert_eq!(names(&flat), vec!["a.base.ipynb", "b.base.md"]);

        let deep = scan_base_files(dir.path(), true).unwrap();
        assert_eq!(names(&deep), vec!["a.base.ipynb", "b.base.md", "c.base.yml"]);
    }

    #[test]
    fn scanning_a_missing_directory_fails() {
        let result = scan_base_files(Path::new("/this/path/does/not/exist"), true);
        assert!(matches!(result, Err(IoError::NotFound(_))));
    }

    #[test]
    fn converts_and_writes_markdown() {
        let dir = create_test_dir();
        let path = create_test_file(
            &dir,
            "guide.base.md",
            "<!-- lang_tags: en, es -->\n<!-- no_suffix: en -->\n<!-- [en] -->\nHello\n<!-- [es] -->\nHola\n",
        );
        let file = BaseFile::new(path).unwrap();
        let doc = BaseDocument::read(&file).unwrap();
        let config = doc.extract_config().unwrap();

        let outputs = doc.convert(&ConvertOptions::new().config(config.clone())).unwrap();
        let written = write_targets(&file, &outputs, &config, None).unwrap();

        assert_eq!(written, vec![dir.path().join("guide.md"), dir.path().join("guide.es.md")]);
        assert_eq!(fs::read_to_string(&written[0]).unwrap(), "Hello\n");
        assert_eq!(fs::read_to_string(&written[1]).unwrap(), "Hola\n");
    }

    #[test]
    fn writes_into_missing_output_directory() {
        let dir = create_test_dir();
        let target = dir.path().join("out/deeper/file.md");

        write_file(&target, "content").unwrap();
        assert_eq!(fs::read_to_string(target).unwrap(), "content");
    }

    #[test]
    fn notebook_round_trips_through_json() {
        let dir = create_test_dir();
        let path = create_test_file(
            &dir,
            "nb.base.ipynb",
            r#"{"cells": [{"cell_type": "markdown", "metadata": {}, "source": ["<!-- lang_tags: en -->\n", "<!-- [en] -->\n", "Hi"]}], "nbformat": 4, "nbformat_minor": 5}"#,
        );
        let file = BaseFile::new(path).unwrap();
        let doc = BaseDocument::read(&file).unwrap();

        let outputs = doc.convert(&ConvertOptions::new()).unwrap();
        let rendered = outputs["en"].render().unwrap();
        let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();

        assert_eq!(value["cells"][0]["source"], serde_json::json!(["Hi"]));
        assert_eq!(value["nbformat"], serde_json::json!(4));
    }

    #[test]
    fn malformed_notebook_is_reported() {
        let dir = create_test_dir();
        let path = create_test_file(&dir, "bad.base.ipynb", r#"{"cells": [{"cell_type": "code"}]}"#);
        let file = BaseFile::new(path).unwrap();

        assert!(matches!(BaseDocument::read(&file), Err(IoError::Json(_))));
    }

    #[test]
    fn health_check_per_kind() {
        let tree = BaseDocument::Yaml(
            serde_yaml::from_str("mmg:\n  lang_tags: [en, es]\ntitle: \"# [en]\\nHi\"\n").unwrap(),
        );
        let config = tree.extract_config().unwrap();
        let checker = tree.health_check(&config);

        assert_eq!(checker.tag_count()["en"], 1);
        assert_eq!(checker.tag_count()["es"], 0);
    }
}
