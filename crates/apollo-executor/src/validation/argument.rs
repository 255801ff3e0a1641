use super::ValidationContext;
use crate::ast;
use crate::Name;
use crate::Node;
use crate::NodeLocation;
use indexmap::IndexMap;

pub(super) fn argument_names(context: &ValidationContext<'_>) {
    for occurrence in &context.walk().arguments {
        for argument in occurrence.arguments {
            if occurrence.owner.argument_definition(&argument.name).is_none() {
                context.report_at(
                    format!(
                        "Provided Argument < {} > doesn't exist on {}.",
                        argument.name,
                        occurrence.owner.describe()
                    ),
                    [argument.location()],
                    Some(&occurrence.path),
                )
            }
        }
    }
}

pub(super) fn argument_uniqueness(context: &ValidationContext<'_>) {
    let walk = context.walk();
    let field_arguments = walk.fields.iter().map(|occurrence| &occurrence.field.arguments);
    let directive_arguments = walk
        .directives
        .iter()
        .flat_map(|occurrence| occurrence.directives)
        .map(|directive| &directive.arguments);
    for arguments in field_arguments.chain(directive_arguments) {
        for (name, locations) in duplicates(arguments) {
            context.report(
                format!("Can't have multiple arguments named < {name} >."),
                locations,
            )
        }
    }
}

pub(super) fn required_arguments(context: &ValidationContext<'_>) {
    for occurrence in &context.walk().arguments {
        for definition in occurrence.owner.argument_definitions() {
            let provided = occurrence
                .arguments
                .iter()
                .any(|argument| argument.name == definition.name);
            if definition.is_required() && !provided {
                context.report_at(
                    format!(
                        "Missing mandatory argument < {} > in {}.",
                        definition.name,
                        occurrence.owner.describe()
                    ),
                    [occurrence.location],
                    Some(&occurrence.path),
                )
            }
        }
    }
}

/// Names given more than once, with the locations of every argument using them
fn duplicates(
    arguments: &[Node<ast::Argument>],
) -> impl Iterator<Item = (&Name, Vec<Option<NodeLocation>>)> {
    let mut by_name = IndexMap::<&Name, Vec<_>>::new();
    for argument in arguments {
        by_name
            .entry(&argument.name)
            .or_default()
            .push(argument.location())
    }
    by_name
        .into_iter()
        .filter(|(_, locations)| locations.len() > 1)
}
