use super::ValidationContext;
use crate::ast::OperationType;
use crate::ast::Selection;
use crate::Name;
use crate::NodeLocation;
use indexmap::IndexMap;
use std::collections::HashSet;

pub(super) fn executable_definitions(context: &ValidationContext<'_>) {
    for definition in &context.document().definitions {
        if !definition.is_executable_definition() {
            let message = match definition.name() {
                Some(name) => format!(
                    "Definition < {name} > of kind < {} > is not executable.",
                    definition.kind()
                ),
                None => format!("Definition of kind < {} > is not executable.", definition.kind()),
            };
            context.report(message, [definition.location()])
        }
    }
}

pub(super) fn operation_name_uniqueness(context: &ValidationContext<'_>) {
    let mut seen = IndexMap::<&Name, Vec<_>>::new();
    for operation in context.operations() {
        if let Some(name) = &operation.name {
            seen.entry(name).or_default().push(operation.location())
        }
    }
    for (name, locations) in seen {
        if locations.len() > 1 {
            context.report(
                format!("Can't have multiple operations named < {name} >."),
                locations,
            )
        }
    }
}

pub(super) fn lone_anonymous_operation(context: &ValidationContext<'_>) {
    let count = context.operations().count();
    if count < 2 {
        return;
    }
    for operation in context.operations() {
        if operation.name.is_none() {
            context.report(
                "Anonymous operation must be the only defined operation.",
                [operation.location()],
            )
        }
    }
}

pub(super) fn single_root_field(context: &ValidationContext<'_>) {
    for operation in context.operations() {
        if operation.operation_type != OperationType::Subscription {
            continue;
        }
        let mut fields = IndexMap::new();
        let mut visited = HashSet::new();
        collect_root_fields(
            context,
            &operation.selection_set,
            &mut visited,
            &mut fields,
        );
        if fields.len() > 1 {
            let message = match &operation.name {
                Some(name) => format!("Subscription < {name} > must select only one top level field."),
                None => "Anonymous Subscription must select only one top level field.".to_owned(),
            };
            context.report(message, fields.values().skip(1).copied())
        }
    }
}

/// Response keys of the root selection set, with fragments expanded
fn collect_root_fields<'a>(
    context: &ValidationContext<'a>,
    selections: &'a [Selection],
    visited: &mut HashSet<&'a Name>,
    fields: &mut IndexMap<&'a Name, Option<NodeLocation>>,
) {
    for selection in selections {
        match selection {
            Selection::Field(field) => {
                fields
                    .entry(field.response_key())
                    .or_insert_with(|| field.location());
            }
            Selection::InlineFragment(inline) => {
                collect_root_fields(context, &inline.selection_set, visited, fields)
            }
            Selection::FragmentSpread(spread) => {
                if !visited.insert(&spread.fragment_name) {
                    continue;
                }
                if let Some(fragment) = context.fragment(&spread.fragment_name) {
                    collect_root_fields(context, &fragment.selection_set, visited, fields)
                }
            }
        }
    }
}
