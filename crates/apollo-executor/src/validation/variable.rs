use super::walk::Scope;
use super::walk::ScopeId;
use super::ValidationContext;
use crate::ast;
use crate::ast::OperationDefinition;
use crate::Name;
use crate::Node;
use indexmap::IndexMap;
use std::collections::HashSet;

pub(super) fn variable_uniqueness(context: &ValidationContext<'_>) {
    for operation in context.operations() {
        let mut by_name = IndexMap::<&Name, Vec<_>>::new();
        for variable in &operation.variables {
            by_name
                .entry(&variable.name)
                .or_default()
                .push(variable.location())
        }
        for (name, locations) in by_name {
            if locations.len() > 1 {
                context.report(
                    format!("Can't have multiple variables named < ${name} >."),
                    locations,
                )
            }
        }
    }
}

pub(super) fn variables_are_input_types(context: &ValidationContext<'_>) {
    let schema = context.schema();
    for operation in context.operations() {
        for variable in &operation.variables {
            if !schema.is_input_type(&variable.ty) {
                context.report(
                    format!(
                        "Variable < ${} > cannot be non input type < {} >.",
                        variable.name, variable.ty
                    ),
                    [variable.location()],
                )
            }
        }
    }
}

/// Each operation, with the scopes reachable from it through fragment spreads
fn operation_scopes<'c, 'a>(
    context: &'c ValidationContext<'a>,
) -> impl Iterator<Item = (&'a Node<OperationDefinition>, Vec<ScopeId>)> + 'c {
    let walk = context.walk();
    walk.scopes
        .iter()
        .enumerate()
        .filter_map(move |(scope, definition)| match *definition {
            Scope::Operation(operation) => {
                Some((operation, walk.reachable_scopes(scope).into_iter().collect()))
            }
            Scope::Fragment(_) => None,
        })
}

fn find_variable<'a>(
    operation: &'a OperationDefinition,
    name: &str,
) -> Option<&'a Node<ast::VariableDefinition>> {
    operation
        .variables
        .iter()
        .find(|variable| variable.name == name)
}

pub(super) fn all_variable_uses_defined(context: &ValidationContext<'_>) {
    let walk = context.walk();
    for (operation, scopes) in operation_scopes(context) {
        for usage in &walk.variable_usages {
            if !scopes.contains(&usage.scope) || find_variable(operation, usage.name).is_some() {
                continue;
            }
            let message = match &operation.name {
                Some(operation_name) => format!(
                    "Variable < ${} > is not defined by operation < {operation_name} >.",
                    usage.name
                ),
                None => format!("Variable < ${} > is not defined.", usage.name),
            };
            context.report(message, [usage.value.location(), operation.location()])
        }
    }
}

pub(super) fn all_variables_used(context: &ValidationContext<'_>) {
    let walk = context.walk();
    for (operation, scopes) in operation_scopes(context) {
        let used: HashSet<&Name> = walk
            .variable_usages
            .iter()
            .filter(|usage| scopes.contains(&usage.scope))
            .map(|usage| usage.name)
            .collect();
        for variable in &operation.variables {
            if used.contains(&variable.name) {
                continue;
            }
            let message = match &operation.name {
                Some(operation_name) => format!(
                    "Variable < ${} > is never used in operation < {operation_name} >.",
                    variable.name
                ),
                None => format!("Variable < ${} > is never used.", variable.name),
            };
            context.report(message, [variable.location()])
        }
    }
}

/// <https://spec.graphql.org/June2018/#sec-All-Variable-Usages-are-Allowed>
pub(super) fn all_variable_usages_are_allowed(context: &ValidationContext<'_>) {
    let walk = context.walk();
    for (operation, scopes) in operation_scopes(context) {
        for occurrence in &walk.input_values {
            let ast::Value::Variable(name) = &**occurrence.value else {
                continue;
            };
            if !scopes.contains(&occurrence.scope) {
                continue;
            }
            let Some(variable) = find_variable(operation, name) else {
                continue;
            };
            let variable_type: &ast::Type = &variable.ty;
            let location_type = occurrence.ty;
            let has_non_null_default = variable
                .default_value
                .as_ref()
                .is_some_and(|value| !value.is_null());
            let allowed = if location_type.is_non_null()
                && !variable_type.is_non_null()
                && (has_non_null_default || occurrence.has_default)
            {
                variable_type.is_assignable_to(&location_type.clone().nullable())
            } else {
                variable_type.is_assignable_to(location_type)
            };
            if !allowed {
                context.report_at(
                    format!(
                        "Variable < ${name} > of type < {variable_type} > \
                         used in position expecting type < {location_type} >."
                    ),
                    [occurrence.value.location(), variable.location()],
                    Some(&occurrence.path),
                )
            }
        }
    }
}
