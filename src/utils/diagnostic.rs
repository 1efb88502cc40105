//! Diagnostic records exchanged between the analysis stages and the
//! consensus engine.

use serde::Serialize;
use std::fmt;

/// Which stage of the front end produced a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Category {
    Lexical,
    Syntactic,
    Semantic,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Lexical => write!(f, "lexical"),
            Category::Syntactic => write!(f, "syntactic"),
            Category::Semantic => write!(f, "semantic"),
        }
    }
}

/// A single line-tagged report of a problem in the analyzed source.
///
/// Diagnostics are plain values: stages accumulate them in lists and return
/// them to the caller, they are never raised as errors. `pipeline` is empty
/// until a [`Pipeline`](crate::consensus::Pipeline) stamps its name on the
/// diagnostics it collected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub line: u32,
    pub category: Category,
    pub message: String,
    pub pipeline: String,
}

impl Diagnostic {
    pub fn new(line: u32, category: Category, message: impl Into<String>) -> Self {
        Self {
            line,
            category,
            message: message.into(),
            pipeline: String::new(),
        }
    }

    pub fn lexical(line: u32, message: impl Into<String>) -> Self {
        Self::new(line, Category::Lexical, message)
    }

    pub fn syntactic(line: u32, message: impl Into<String>) -> Self {
        Self::new(line, Category::Syntactic, message)
    }

    pub fn semantic(line: u32, message: impl Into<String>) -> Self {
        Self::new(line, Category::Semantic, message)
    }

    /// The grouping key used by the consensus engine.
    pub fn signature(&self) -> (u32, Category) {
        (self.line, self.category)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}
