//! build::aggregate
//!
//! Collects the GraphQL contributions of a pass into a single corpus.
//!
//! # Invariants
//!
//! - Every module with a contribution is visited; none is skipped
//! - Template literals and `.graphql` sources go into the corpus text
//! - Literal strings bypass the corpus and are kept verbatim
//!
//! Module order only affects the corpus text, never the final manifest,
//! because manifest keys are sorted afterwards.

use std::collections::BTreeSet;

use super::{Contribution, SourceModule};

/// The aggregated GraphQL of one build pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Corpus {
    /// Concatenated GraphQL source to be normalized.
    pub source: String,
    /// Operation strings used as manifest keys without normalization.
    pub literals: BTreeSet<String>,
    /// Number of modules that contributed anything.
    pub contributing_modules: usize,
}

impl Corpus {
    /// Check if the corpus has any source worth parsing.
    pub fn has_source(&self) -> bool {
        !self.source.trim().is_empty()
    }

    /// Check if nothing was contributed at all.
    pub fn is_empty(&self) -> bool {
        !self.has_source() && self.literals.is_empty()
    }

    fn push_source(&mut self, piece: &str) {
        if !self.source.is_empty() {
            self.source.push('\n');
        }
        self.source.push_str(piece);
    }
}

/// Aggregate the contributions of `modules`.
///
/// Pieces of source are joined with a newline so a trailing comment in one
/// module cannot swallow the first definition of the next.
pub fn aggregate<'m, I>(modules: I) -> Corpus
where
    I: IntoIterator<Item = &'m SourceModule>,
{
    let mut corpus = Corpus::default();

    for module in modules {
        let Some(contribution) = module.contribution() else {
            continue;
        };
        corpus.contributing_modules += 1;

        match contribution {
            Contribution::Templates(templates) => {
                for literal in templates.keys() {
                    corpus.push_source(literal);
                }
            }
            Contribution::Document(source) => corpus.push_source(source),
            Contribution::Literals(literals) => {
                corpus.literals.extend(literals.iter().cloned());
            }
        }
    }

    tracing::trace!(
        modules = corpus.contributing_modules,
        bytes = corpus.source.len(),
        literals = corpus.literals.len(),
        "aggregated corpus"
    );
    corpus
}
