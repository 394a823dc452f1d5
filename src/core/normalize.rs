//! core::normalize
//!
//! Turns a GraphQL corpus into the set of canonical operation texts.
//!
//! # Algorithm
//!
//! 1. Parse the whole corpus as a single executable document
//! 2. Split it into one document per operation definition, carrying the
//!    fragment definitions that operation transitively spreads
//! 3. Deduplicate same-named fragment definitions within each document by
//!    scanning the definition list backward and keeping the first name seen
//! 4. Optionally add `__typename` selections
//! 5. Render each document with [`print_document`]; the text is the
//!    manifest key
//!
//! # Invariants
//!
//! - The operation is always the first definition of a rendered document;
//!   its fragments follow sorted by name
//! - Keys are whitespace-normalized by rendering, so formatting differences
//!   in the input do not produce distinct keys
//! - A parse failure anywhere in the corpus fails the whole call
//!
//! # Example
//!
//! ```
//! use persistgql::core::normalize::{normalize, NormalizeOptions};
//!
//! let keys = normalize("query getCount { count { amount } }", NormalizeOptions::default()).unwrap();
//! assert!(keys.contains("query getCount {\n  count {\n    amount\n  }\n}\n"));
//! ```

use std::collections::{BTreeSet, HashMap, HashSet};

use graphql_parser::query::{
    parse_query, Definition, Document, Field, OperationDefinition, Selection, SelectionSet,
};
use thiserror::Error;

use super::print::print_document;

/// Name of the meta field added by typename injection.
const TYPENAME_FIELD: &str = "__typename";

/// Errors from normalization.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NormalizeError {
    /// The corpus is not a syntactically valid GraphQL document.
    #[error("failed to parse GraphQL corpus: {0}")]
    Parse(String),
}

/// Options controlling how operations are rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NormalizeOptions {
    /// Add `__typename` to nested selection sets before rendering.
    pub add_typename: bool,
}

/// Normalize a corpus into its distinct rendered operations.
///
/// A whitespace-only corpus yields an empty set without being parsed.
///
/// # Errors
///
/// Returns `NormalizeError::Parse` if the corpus does not parse.
pub fn normalize(
    corpus: &str,
    options: NormalizeOptions,
) -> Result<BTreeSet<String>, NormalizeError> {
    if corpus.trim().is_empty() {
        return Ok(BTreeSet::new());
    }

    let document =
        parse_query::<String>(corpus).map_err(|e| NormalizeError::Parse(e.to_string()))?;

    let mut keys = BTreeSet::new();
    for mut operation in split_operations(&document) {
        dedup_fragments(&mut operation.definitions);
        order_definitions(&mut operation.definitions);
        if options.add_typename {
            add_typename(&mut operation);
        }
        keys.insert(print_document(&operation));
    }

    tracing::trace!(
        definitions = document.definitions.len(),
        operations = keys.len(),
        "normalized corpus"
    );
    Ok(keys)
}

/// Split a document into one document per operation definition.
///
/// Each produced document holds the operation and every fragment definition
/// whose name it depends on, duplicates included, in declaration order.
fn split_operations<'a>(document: &Document<'a, String>) -> Vec<Document<'a, String>> {
    let dependencies = fragment_dependencies(document);

    document
        .definitions
        .iter()
        .enumerate()
        .filter_map(|(index, definition)| match definition {
            Definition::Operation(operation) => Some((index, operation)),
            Definition::Fragment(_) => None,
        })
        .map(|(index, operation)| {
            let needed = transitive_fragments(selection_set(operation), &dependencies);
            let definitions = document
                .definitions
                .iter()
                .enumerate()
                .filter(|(i, definition)| match definition {
                    Definition::Operation(_) => *i == index,
                    Definition::Fragment(fragment) => needed.contains(fragment.name.as_str()),
                })
                .map(|(_, definition)| definition.clone())
                .collect();
            Document { definitions }
        })
        .collect()
}

/// Map each fragment name to the fragment names it spreads directly.
///
/// When a name is defined more than once the last definition wins.
fn fragment_dependencies<'d>(
    document: &'d Document<'_, String>,
) -> HashMap<&'d str, BTreeSet<&'d str>> {
    let mut dependencies = HashMap::new();
    for definition in &document.definitions {
        if let Definition::Fragment(fragment) = definition {
            let mut spreads = BTreeSet::new();
            collect_spreads(&fragment.selection_set, &mut spreads);
            dependencies.insert(fragment.name.as_str(), spreads);
        }
    }
    dependencies
}

fn transitive_fragments<'d>(
    root: &'d SelectionSet<'_, String>,
    dependencies: &HashMap<&'d str, BTreeSet<&'d str>>,
) -> HashSet<&'d str> {
    let mut direct = BTreeSet::new();
    collect_spreads(root, &mut direct);

    let mut pending: Vec<&str> = direct.into_iter().collect();
    let mut seen = HashSet::new();
    while let Some(name) = pending.pop() {
        if !seen.insert(name) {
            continue;
        }
        if let Some(next) = dependencies.get(name) {
            pending.extend(next.iter().copied());
        }
    }
    seen
}

fn collect_spreads<'d>(set: &'d SelectionSet<'_, String>, out: &mut BTreeSet<&'d str>) {
    for item in &set.items {
        match item {
            Selection::Field(field) => collect_spreads(&field.selection_set, out),
            Selection::FragmentSpread(spread) => {
                out.insert(spread.fragment_name.as_str());
            }
            Selection::InlineFragment(inline) => collect_spreads(&inline.selection_set, out),
        }
    }
}

/// Remove duplicate fragment definitions.
///
/// Scans from the end of the list backward; the first definition of a name
/// met in that scan is kept and every other definition with that name is
/// removed. In source order this keeps the *last* declaration.
fn dedup_fragments(definitions: &mut Vec<Definition<'_, String>>) {
    let mut seen = HashSet::new();
    let mut index = definitions.len();
    while index > 0 {
        index -= 1;
        if let Definition::Fragment(fragment) = &definitions[index] {
            if !seen.insert(fragment.name.clone()) {
                definitions.remove(index);
            }
        }
    }
}

/// Put the operation first and its fragments after it, sorted by name.
fn order_definitions(definitions: &mut [Definition<'_, String>]) {
    definitions.sort_by(|a, b| match (a, b) {
        (Definition::Operation(_), Definition::Operation(_)) => std::cmp::Ordering::Equal,
        (Definition::Operation(_), Definition::Fragment(_)) => std::cmp::Ordering::Less,
        (Definition::Fragment(_), Definition::Operation(_)) => std::cmp::Ordering::Greater,
        (Definition::Fragment(x), Definition::Fragment(y)) => x.name.cmp(&y.name),
    });
}

fn add_typename(document: &mut Document<'_, String>) {
    for definition in &mut document.definitions {
        match definition {
            Definition::Operation(operation) => {
                add_typename_to_selection_set(selection_set_mut(operation), true)
            }
            Definition::Fragment(fragment) => {
                add_typename_to_selection_set(&mut fragment.selection_set, false)
            }
        }
    }
}

fn add_typename_to_selection_set(set: &mut SelectionSet<'_, String>, is_root: bool) {
    let has_typename = set
        .items
        .iter()
        .any(|item| matches!(item, Selection::Field(field) if field.name == TYPENAME_FIELD));

    if !is_root && !has_typename {
        let position = set.span.0;
        set.items.push(Selection::Field(Field {
            position,
            alias: None,
            name: TYPENAME_FIELD.to_string(),
            arguments: Vec::new(),
            directives: Vec::new(),
            selection_set: SelectionSet {
                span: (position, position),
                items: Vec::new(),
            },
        }));
    }

    for item in &mut set.items {
        match item {
            Selection::Field(field) => {
                // Introspection fields are left as written.
                if !field.name.starts_with("__") && !field.selection_set.items.is_empty() {
                    add_typename_to_selection_set(&mut field.selection_set, false);
                }
            }
            Selection::InlineFragment(inline) => {
                add_typename_to_selection_set(&mut inline.selection_set, false)
            }
            Selection::FragmentSpread(_) => {}
        }
    }
}

fn selection_set<'d, 'a>(
    operation: &'d OperationDefinition<'a, String>,
) -> &'d SelectionSet<'a, String> {
    match operation {
        OperationDefinition::SelectionSet(set) => set,
        OperationDefinition::Query(query) => &query.selection_set,
        OperationDefinition::Mutation(mutation) => &mutation.selection_set,
        OperationDefinition::Subscription(subscription) => &subscription.selection_set,
    }
}

fn selection_set_mut<'d, 'a>(
    operation: &'d mut OperationDefinition<'a, String>,
) -> &'d mut SelectionSet<'a, String> {
    match operation {
        OperationDefinition::SelectionSet(set) => set,
        OperationDefinition::Query(query) => &mut query.selection_set,
        OperationDefinition::Mutation(mutation) => &mut mutation.selection_set,
        OperationDefinition::Subscription(subscription) => &mut subscription.selection_set,
    }
}
