use super::ValidationContext;
use crate::Name;
use indexmap::IndexMap;

pub(super) fn directives_are_defined(context: &ValidationContext<'_>) {
    let schema = context.schema();
    for occurrence in &context.walk().directives {
        for directive in occurrence.directives {
            if !schema.directive_definitions.contains_key(&directive.name) {
                context.report(
                    format!("Unknown directive < @{} >.", directive.name),
                    [directive.location()],
                )
            }
        }
    }
}

pub(super) fn directives_are_in_valid_locations(context: &ValidationContext<'_>) {
    let schema = context.schema();
    for occurrence in &context.walk().directives {
        for directive in occurrence.directives {
            let Some(definition) = schema.directive_definitions.get(&directive.name) else {
                continue;
            };
            if !definition.locations.contains(&occurrence.location) {
                context.report(
                    format!(
                        "Directive < @{} > is not used in a valid location: < {} >.",
                        directive.name, occurrence.location
                    ),
                    [directive.location()],
                )
            }
        }
    }
}

pub(super) fn directives_are_unique_per_location(context: &ValidationContext<'_>) {
    let schema = context.schema();
    for occurrence in &context.walk().directives {
        let mut by_name = IndexMap::<&Name, Vec<_>>::new();
        for directive in occurrence.directives {
            by_name
                .entry(&directive.name)
                .or_default()
                .push(directive.location())
        }
        for (name, locations) in by_name {
            // Undefined directives are reported by another rule
            let repeatable = schema
                .directive_definitions
                .get(name)
                .map_or(true, |definition| definition.repeatable);
            if locations.len() > 1 && !repeatable {
                context.report(
                    format!("Can't use < @{name} > multiple times at the same location."),
                    locations,
                )
            }
        }
    }
}
