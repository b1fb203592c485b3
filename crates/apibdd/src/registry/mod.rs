//! Step registration and lookup.
//!
//! A [`StepRegistry`] owns the bindings for one world type. Bindings are
//! registered once at start-up and never change. Resolution collects every
//! binding whose pattern matches, so a step line either resolves to exactly
//! one handler or fails with an undefined or ambiguous error; registration
//! order never influences the outcome.

mod args;

use std::collections::HashSet;
use std::fmt;
use std::sync::Mutex;

use apibdd_patterns::{PatternError, StepKeyword, StepPattern};
use thiserror::Error;
use tracing::debug;

use crate::failure::{ResolveError, StepFailure};

pub use args::StepArgs;

type Handler<W> = Box<dyn Fn(&mut W, &StepArgs) -> Result<(), StepFailure> + Send + Sync>;

/// Rejected registration.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The pattern does not compile.
    #[error("invalid step pattern '{pattern}': {source}")]
    InvalidPattern {
        /// Pattern text.
        pattern: String,
        /// Compiler error.
        source: PatternError,
    },
    /// The keyword and pattern are already bound.
    #[error("duplicate step for '{keyword}' + '{pattern}'")]
    Duplicate {
        /// Keyword of both bindings.
        keyword: StepKeyword,
        /// Pattern of both bindings.
        pattern: String,
    },
    /// Bindings must use `Given`, `When` or `Then`.
    #[error("step '{pattern}' cannot be registered under conjunction '{keyword}'")]
    Conjunction {
        /// Offending keyword.
        keyword: StepKeyword,
        /// Pattern text.
        pattern: String,
    },
}

/// A keyword and pattern bound to a handler.
pub struct StepBinding<W> {
    keyword: StepKeyword,
    pattern: StepPattern,
    handler: Handler<W>,
}

impl<W> StepBinding<W> {
    /// Keyword the binding is registered under.
    #[must_use]
    pub fn keyword(&self) -> StepKeyword {
        self.keyword
    }

    /// Compiled pattern.
    #[must_use]
    pub fn pattern(&self) -> &StepPattern {
        &self.pattern
    }
}

impl<W> fmt::Debug for StepBinding<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepBinding")
            .field("keyword", &self.keyword)
            .field("pattern", &self.pattern.as_str())
            .finish_non_exhaustive()
    }
}

/// A binding selected for a step line, with its captured arguments.
#[derive(Debug)]
pub struct ResolvedStep<'r, W> {
    binding: &'r StepBinding<W>,
    args: StepArgs,
}

impl<W> ResolvedStep<'_, W> {
    /// The selected binding.
    #[must_use]
    pub fn binding(&self) -> &StepBinding<W> {
        self.binding
    }

    /// Captured arguments.
    #[must_use]
    pub fn args(&self) -> &StepArgs {
        &self.args
    }

    /// Run the handler against `world`.
    ///
    /// # Errors
    /// Whatever the handler returns.
    pub fn invoke(&self, world: &mut W) -> Result<(), StepFailure> {
        (self.binding.handler)(world, &self.args)
    }
}

/// Step bindings for world type `W`.
pub struct StepRegistry<W> {
    bindings: Vec<StepBinding<W>>,
    used: Mutex<HashSet<usize>>,
}

impl<W> Default for StepRegistry<W> {
    fn default() -> Self {
        Self {
            bindings: Vec::new(),
            used: Mutex::new(HashSet::new()),
        }
    }
}

impl<W> fmt::Debug for StepRegistry<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepRegistry")
            .field("bindings", &self.bindings)
            .finish_non_exhaustive()
    }
}

impl<W> StepRegistry<W> {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `pattern` under `keyword`.
    ///
    /// # Errors
    /// Returns [`RegistryError`] when the keyword is a conjunction, the
    /// pattern is malformed, or the pair is already registered.
    pub fn register<F>(
        &mut self,
        keyword: StepKeyword,
        pattern: &str,
        handler: F,
    ) -> Result<(), RegistryError>
    where
        F: Fn(&mut W, &StepArgs) -> Result<(), StepFailure> + Send + Sync + 'static,
    {
        if keyword.is_conjunction() {
            return Err(RegistryError::Conjunction {
                keyword,
                pattern: pattern.to_string(),
            });
        }
        let compiled =
            StepPattern::compile(pattern).map_err(|source| RegistryError::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            })?;
        if self
            .bindings
            .iter()
            .any(|binding| binding.keyword == keyword && binding.pattern == compiled)
        {
            return Err(RegistryError::Duplicate {
                keyword,
                pattern: pattern.to_string(),
            });
        }
        self.bindings.push(StepBinding {
            keyword,
            pattern: compiled,
            handler: Box::new(handler),
        });
        Ok(())
    }

    /// Find the single binding for `text` under the effective `keyword`.
    ///
    /// Conjunctions must already be resolved by the caller; looking up `And`
    /// or `But` directly finds nothing.
    ///
    /// # Errors
    /// [`ResolveError::Undefined`] when nothing matches,
    /// [`ResolveError::Ambiguous`] when several patterns match.
    pub fn resolve(
        &self,
        keyword: StepKeyword,
        text: &str,
    ) -> Result<ResolvedStep<'_, W>, ResolveError> {
        let mut matches: Vec<(usize, &StepBinding<W>, Vec<String>)> = self
            .bindings
            .iter()
            .enumerate()
            .filter(|(_, binding)| binding.keyword == keyword)
            .filter_map(|(index, binding)| {
                binding
                    .pattern
                    .captures(text)
                    .map(|values| (index, binding, values))
            })
            .collect();

        if matches.len() > 1 {
            let mut patterns: Vec<String> = matches
                .iter()
                .map(|(_, binding, _)| binding.pattern.as_str().to_string())
                .collect();
            patterns.sort();
            return Err(ResolveError::Ambiguous {
                keyword,
                text: text.to_string(),
                patterns,
            });
        }

        let Some((index, binding, values)) = matches.pop() else {
            return Err(ResolveError::Undefined {
                keyword,
                text: text.to_string(),
            });
        };
        debug!(%keyword, text, pattern = binding.pattern.as_str(), "resolved step");
        self.mark_used(index);
        Ok(ResolvedStep {
            binding,
            args: StepArgs::new(values),
        })
    }

    fn mark_used(&self, index: usize) {
        self.used
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(index);
    }

    /// All bindings in registration order.
    pub fn bindings(&self) -> impl Iterator<Item = &StepBinding<W>> {
        self.bindings.iter()
    }

    /// Bindings that have never been resolved.
    #[must_use]
    pub fn unused(&self) -> Vec<&StepBinding<W>> {
        let used = self
            .used
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        self.bindings
            .iter()
            .enumerate()
            .filter(|(index, _)| !used.contains(index))
            .map(|(_, binding)| binding)
            .collect()
    }

    /// Number of bindings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Whether no bindings are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}
