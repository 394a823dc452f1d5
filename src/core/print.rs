//! core::print
//!
//! Canonical printer for executable GraphQL documents.
//!
//! # Format
//!
//! - Definitions separated by one blank line, with a trailing newline
//! - Two-space indentation, one selection per line
//! - An anonymous query without variables or directives prints as the bare
//!   selection set, so `query { x }` and `{ x }` render identically
//! - String values print as JSON string literals, never as block strings,
//!   so every character of the value survives a reparse
//! - Lists print as `[a, b]`, objects as `{a: 1, b: 2}`
//!
//! The printer is total: every document the parser accepts can be printed.

use graphql_parser::query::{
    Definition, Directive, Document, Field, FragmentDefinition, FragmentSpread, InlineFragment,
    OperationDefinition, Selection, SelectionSet, Type, TypeCondition, Value, VariableDefinition,
};

/// Print a document in canonical form.
///
/// ```
/// use graphql_parser::query::parse_query;
/// use persistgql::core::print::print_document;
///
/// let document = parse_query::<String>("query { count(by: \"a\\n\") }").unwrap();
/// assert_eq!(print_document(&document), "{\n  count(by: \"a\\n\")\n}\n");
/// ```
pub fn print_document(document: &Document<'_, String>) -> String {
    let definitions = document.definitions.iter().map(|definition| match definition {
        Definition::Operation(operation) => operation_definition(operation),
        Definition::Fragment(fragment) => fragment_definition(fragment),
    });
    format!("{}\n", join(definitions, "\n\n"))
}

fn operation_definition(operation: &OperationDefinition<'_, String>) -> String {
    let (keyword, name, variables, directives, selections) = match operation {
        OperationDefinition::SelectionSet(set) => return selection_set(set),
        OperationDefinition::Query(query) => (
            "query",
            &query.name,
            &query.variable_definitions,
            &query.directives,
            &query.selection_set,
        ),
        OperationDefinition::Mutation(mutation) => (
            "mutation",
            &mutation.name,
            &mutation.variable_definitions,
            &mutation.directives,
            &mutation.selection_set,
        ),
        OperationDefinition::Subscription(subscription) => (
            "subscription",
            &subscription.name,
            &subscription.variable_definitions,
            &subscription.directives,
            &subscription.selection_set,
        ),
    };

    if keyword == "query" && name.is_none() && variables.is_empty() && directives.is_empty() {
        return selection_set(selections);
    }

    let variables = wrap(
        "(",
        &join(variables.iter().map(variable_definition), ", "),
        ")",
    );
    let head = format!("{}{}", name.as_deref().unwrap_or_default(), variables);
    join(
        [
            keyword.to_string(),
            head,
            directive_list(directives),
            selection_set(selections),
        ],
        " ",
    )
}

fn fragment_definition(fragment: &FragmentDefinition<'_, String>) -> String {
    let TypeCondition::On(type_name) = &fragment.type_condition;
    format!(
        "fragment {} on {} {}{}",
        fragment.name,
        type_name,
        wrap("", &directive_list(&fragment.directives), " "),
        selection_set(&fragment.selection_set)
    )
}

fn variable_definition(variable: &VariableDefinition<'_, String>) -> String {
    let default = variable
        .default_value
        .as_ref()
        .map(value)
        .unwrap_or_default();
    format!(
        "${}: {}{}",
        variable.name,
        type_reference(&variable.var_type),
        wrap(" = ", &default, "")
    )
}

fn selection_set(set: &SelectionSet<'_, String>) -> String {
    block(set.items.iter().map(selection))
}

fn selection(selection: &Selection<'_, String>) -> String {
    match selection {
        Selection::Field(field) => field_selection(field),
        Selection::FragmentSpread(spread) => fragment_spread(spread),
        Selection::InlineFragment(inline) => inline_fragment(inline),
    }
}

fn field_selection(field: &Field<'_, String>) -> String {
    let alias = field
        .alias
        .as_deref()
        .map(|alias| format!("{alias}: "))
        .unwrap_or_default();
    let head = format!(
        "{}{}{}",
        alias,
        field.name,
        wrap("(", &argument_list(&field.arguments), ")")
    );
    join(
        [
            head,
            directive_list(&field.directives),
            selection_set(&field.selection_set),
        ],
        " ",
    )
}

fn fragment_spread(spread: &FragmentSpread<'_, String>) -> String {
    format!(
        "...{}{}",
        spread.fragment_name,
        wrap(" ", &directive_list(&spread.directives), "")
    )
}

fn inline_fragment(inline: &InlineFragment<'_, String>) -> String {
    let condition = match &inline.type_condition {
        Some(TypeCondition::On(type_name)) => format!("on {type_name}"),
        None => String::new(),
    };
    join(
        [
            "...".to_string(),
            condition,
            directive_list(&inline.directives),
            selection_set(&inline.selection_set),
        ],
        " ",
    )
}

fn directive_list(directives: &[Directive<'_, String>]) -> String {
    join(
        directives.iter().map(|directive| {
            format!(
                "@{}{}",
                directive.name,
                wrap("(", &argument_list(&directive.arguments), ")")
            )
        }),
        " ",
    )
}

fn argument_list(arguments: &[(String, Value<'_, String>)]) -> String {
    join(
        arguments
            .iter()
            .map(|(name, argument)| format!("{name}: {}", value(argument))),
        ", ",
    )
}

fn value(value: &Value<'_, String>) -> String {
    match value {
        Value::Variable(name) => format!("${name}"),
        Value::Int(number) => number.as_i64().map(|n| n.to_string()).unwrap_or_default(),
        // Debug keeps a decimal point or exponent, so the literal stays a float.
        Value::Float(number) => format!("{number:?}"),
        Value::String(text) => serde_json::Value::from(text.as_str()).to_string(),
        Value::Boolean(flag) => flag.to_string(),
        Value::Null => "null".to_string(),
        Value::Enum(name) => name.clone(),
        Value::List(items) => format!("[{}]", join(items.iter().map(self::value), ", ")),
        Value::Object(fields) => format!(
            "{{{}}}",
            join(
                fields
                    .iter()
                    .map(|(name, field)| format!("{name}: {}", self::value(field))),
                ", "
            )
        ),
    }
}

fn type_reference(reference: &Type<'_, String>) -> String {
    match reference {
        Type::NamedType(name) => name.clone(),
        Type::ListType(inner) => format!("[{}]", type_reference(inner)),
        Type::NonNullType(inner) => format!("{}!", type_reference(inner)),
    }
}

/// Join the non-empty parts with `separator`.
fn join<I>(parts: I, separator: &str) -> String
where
    I: IntoIterator<Item = String>,
{
    parts
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(separator)
}

/// Surround `inner` with `start` and `end`, or nothing if it is empty.
fn wrap(start: &str, inner: &str, end: &str) -> String {
    if inner.is_empty() {
        String::new()
    } else {
        format!("{start}{inner}{end}")
    }
}

fn block<I>(lines: I) -> String
where
    I: IntoIterator<Item = String>,
{
    let body = join(lines, "\n");
    if body.is_empty() {
        String::new()
    } else {
        format!("{{\n{}\n}}", indent(&body))
    }
}

fn indent(text: &str) -> String {
    format!("  {}", text.replace('\n', "\n  "))
}
