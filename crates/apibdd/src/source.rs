//! Loading features from `.feature` files.
//!
//! Only flat scenarios are accepted: backgrounds, rules, scenario outlines,
//! data tables and doc strings are rejected with
//! [`SourceError::Unsupported`] instead of being silently ignored.

use std::io;
use std::path::{Path, PathBuf};

use apibdd_patterns::StepKeyword;
use gherkin::{GherkinEnv, StepType};
use thiserror::Error;
use tracing::debug;

use crate::model::{Feature, Scenario, Step};
use crate::tags::extend_tag_set;

/// Scenario text could not be loaded.
#[derive(Debug, Error)]
pub enum SourceError {
    /// A configured path does not exist.
    #[error("feature path not found: {}", path.display())]
    NotFound {
        /// Missing path.
        path: PathBuf,
    },
    /// A file or directory could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Read {
        /// Offending path.
        path: PathBuf,
        /// I/O error.
        source: io::Error,
    },
    /// The file is not valid Gherkin.
    #[error("failed to parse {}: {message}", path.display())]
    Parse {
        /// Offending file.
        path: PathBuf,
        /// Parser message.
        message: String,
    },
    /// The file uses a construct the engine does not run.
    #[error("{}:{line}: {construct} is not supported", path.display())]
    Unsupported {
        /// Offending file.
        path: PathBuf,
        /// Construct name.
        construct: &'static str,
        /// One-based line of the construct.
        line: u32,
    },
}

/// Supplies parsed features.
pub trait FeatureSource {
    /// Load every feature.
    ///
    /// # Errors
    /// Returns [`SourceError`] when any feature cannot be loaded.
    fn load(&self) -> Result<Vec<Feature>, SourceError>;
}

/// Features read from files and directories.
///
/// Directories are searched recursively for `*.feature` files, visited in
/// sorted order. Explicit file paths are loaded whatever their extension.
#[derive(Debug, Clone, Default)]
pub struct GherkinFiles {
    paths: Vec<PathBuf>,
}

impl GherkinFiles {
    /// Source over `paths`.
    #[must_use]
    pub fn new<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            paths: paths.into_iter().map(Into::into).collect(),
        }
    }

    /// Every feature file the configured paths resolve to.
    ///
    /// # Errors
    /// Returns [`SourceError::NotFound`] or [`SourceError::Read`].
    pub fn files(&self) -> Result<Vec<PathBuf>, SourceError> {
        let mut files = Vec::new();
        for path in &self.paths {
            let metadata = std::fs::metadata(path).map_err(|source| {
                if source.kind() == io::ErrorKind::NotFound {
                    SourceError::NotFound { path: path.clone() }
                } else {
                    SourceError::Read {
                        path: path.clone(),
                        source,
                    }
                }
            })?;
            if metadata.is_dir() {
                collect_feature_files(path, &mut files)?;
            } else {
                files.push(path.clone());
            }
        }
        Ok(files)
    }
}

impl FeatureSource for GherkinFiles {
    fn load(&self) -> Result<Vec<Feature>, SourceError> {
        self.files()?
            .iter()
            .map(|path| {
                let text = std::fs::read_to_string(path).map_err(|source| SourceError::Read {
                    path: path.clone(),
                    source,
                })?;
                parse_feature(path, &text)
            })
            .collect()
    }
}

fn collect_feature_files(dir: &Path, files: &mut Vec<PathBuf>) -> Result<(), SourceError> {
    let read_err = |source| SourceError::Read {
        path: dir.to_path_buf(),
        source,
    };
    let mut entries: Vec<PathBuf> = std::fs::read_dir(dir)
        .map_err(read_err)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<_, _>>()
        .map_err(read_err)?;
    entries.sort();
    for entry in entries {
        if entry.is_dir() {
            collect_feature_files(&entry, files)?;
        } else if entry.extension().is_some_and(|ext| ext == "feature") {
            files.push(entry);
        }
    }
    Ok(())
}

fn line_of(position: gherkin::LineCol) -> u32 {
    u32::try_from(position.line).unwrap_or(u32::MAX)
}

fn step_keyword(keyword: &str, ty: StepType) -> StepKeyword {
    match keyword.trim() {
        kw if kw.eq_ignore_ascii_case("and") => StepKeyword::And,
        kw if kw.eq_ignore_ascii_case("but") => StepKeyword::But,
        _ => match ty {
            StepType::Given => StepKeyword::Given,
            StepType::When => StepKeyword::When,
            StepType::Then => StepKeyword::Then,
        },
    }
}

/// Parse Gherkin `text` read from `path`.
///
/// # Errors
/// Returns [`SourceError::Parse`] for invalid Gherkin and
/// [`SourceError::Unsupported`] for constructs the engine does not run.
///
/// # Examples
/// ```
/// use std::path::Path;
/// use apibdd::source::parse_feature;
///
/// let text = "Feature: Comics\n  Scenario: list\n    When I send a GET request to \"comics\" endpoint\n";
/// let feature = parse_feature(Path::new("comics.feature"), text).expect("valid feature");
/// assert_eq!(feature.scenarios.len(), 1);
/// ```
pub fn parse_feature(path: &Path, text: &str) -> Result<Feature, SourceError> {
    let unsupported = |construct, position| SourceError::Unsupported {
        path: path.to_path_buf(),
        construct,
        line: line_of(position),
    };

    let mut source = text.to_string();
    if !source.ends_with('\n') {
        source.push('\n');
    }
    let parsed = gherkin::Feature::parse(&source, GherkinEnv::default()).map_err(|err| {
        SourceError::Parse {
            path: path.to_path_buf(),
            message: err.to_string(),
        }
    })?;

    if let Some(background) = &parsed.background {
        return Err(unsupported("Background", background.position));
    }
    if let Some(rule) = parsed.rules.first() {
        return Err(unsupported("Rule", rule.position));
    }

    let mut scenarios = Vec::with_capacity(parsed.scenarios.len());
    for scenario in &parsed.scenarios {
        if !scenario.examples.is_empty() {
            return Err(unsupported("Scenario Outline", scenario.position));
        }
        let mut steps = Vec::with_capacity(scenario.steps.len());
        for step in &scenario.steps {
            if step.table.is_some() {
                return Err(unsupported("data table", step.position));
            }
            if step.docstring.is_some() {
                return Err(unsupported("doc string", step.position));
            }
            steps.push(Step {
                keyword: step_keyword(&step.keyword, step.ty),
                text: step.value.clone(),
                line: line_of(step.position),
            });
        }
        let mut tags = Vec::new();
        extend_tag_set(&mut tags, &scenario.tags);
        scenarios.push(Scenario {
            name: scenario.name.clone(),
            line: line_of(scenario.position),
            tags,
            steps,
        });
    }

    let mut tags = Vec::new();
    extend_tag_set(&mut tags, &parsed.tags);
    debug!(path = %path.display(), scenarios = scenarios.len(), "parsed feature");
    Ok(Feature {
        name: parsed.name.clone(),
        description: parsed
            .description
            .as_ref()
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty()),
        path: path.display().to_string(),
        tags,
        scenarios,
    })
}
