use super::walk::composite_type;
use super::walk::FragmentSelection;
use super::walk::Scope;
use super::walk::ScopeId;
use super::walk::Walk;
use super::ValidationContext;
use crate::ast;
use crate::Name;
use crate::Node;
use crate::NodeLocation;
use indexmap::IndexMap;
use std::collections::HashMap;
use std::collections::HashSet;

pub(super) fn fragment_name_uniqueness(context: &ValidationContext<'_>) {
    let mut by_name = IndexMap::<&Name, Vec<_>>::new();
    for fragment in context.document().fragments() {
        by_name
            .entry(&fragment.name)
            .or_default()
            .push(fragment.location())
    }
    for (name, locations) in by_name {
        if locations.len() > 1 {
            context.report(
                format!("Can't have multiple fragments named < {name} >."),
                locations,
            )
        }
    }
}

/// Type conditions of fragment definitions and inline fragments, with their locations
fn type_conditions<'c, 'a>(
    context: &'c ValidationContext<'a>,
) -> impl Iterator<Item = (Option<&'a Name>, &'a Name, Option<NodeLocation>)> + 'c {
    let definitions = context
        .document()
        .fragments()
        .map(|fragment| (Some(&fragment.name), &fragment.type_condition, fragment.location()));
    let inline_fragments = context
        .walk()
        .fragment_selections
        .iter()
        .filter_map(|occurrence| match occurrence.selection {
            FragmentSelection::Inline(inline) => {
                let type_condition = inline.type_condition.as_ref()?;
                Some((None, type_condition, inline.location()))
            }
            FragmentSelection::Spread(_) => None,
        });
    definitions.chain(inline_fragments)
}

pub(super) fn fragment_spread_type_existence(context: &ValidationContext<'_>) {
    let schema = context.schema();
    for (_, type_condition, location) in type_conditions(context) {
        if !schema.types.contains_key(type_condition) {
            context.report(format!("Unknown type < {type_condition} >."), [location])
        }
    }
}

pub(super) fn fragments_on_composite_types(context: &ValidationContext<'_>) {
    let schema = context.schema();
    for (fragment_name, type_condition, location) in type_conditions(context) {
        let Some(ty) = schema.types.get(type_condition) else {
            continue;
        };
        if ty.is_composite() {
            continue;
        }
        let message = match fragment_name {
            Some(name) => format!(
                "Fragment < {name} > cannot condition on non composite type < {type_condition} >."
            ),
            None => format!(
                "Inline fragment cannot condition on non composite type < {type_condition} >."
            ),
        };
        context.report(message, [location])
    }
}

pub(super) fn fragment_must_be_used(context: &ValidationContext<'_>) {
    let walk = context.walk();
    let used: HashSet<&Name> = walk
        .scopes
        .iter()
        .enumerate()
        .filter(|(_, scope)| matches!(scope, Scope::Operation(_)))
        .flat_map(|(scope, _)| walk.reachable_scopes(scope))
        .flat_map(|scope| walk.spreads_in(scope))
        .map(|spread| &spread.fragment_name)
        .collect();
    for fragment in context.document().fragments() {
        if !used.contains(&fragment.name) {
            context.report(
                format!("Fragment < {} > is never used.", fragment.name),
                [fragment.location()],
            )
        }
    }
}

pub(super) fn fragment_spread_target_defined(context: &ValidationContext<'_>) {
    let walk = context.walk();
    for scope in 0..walk.scopes.len() {
        for spread in walk.spreads_in(scope) {
            if walk.fragment(&spread.fragment_name).is_none() {
                context.report(
                    format!("Unknown fragment < {} >.", spread.fragment_name),
                    [spread.location()],
                )
            }
        }
    }
}

/// <https://spec.graphql.org/June2018/#sec-Fragment-spreads-must-not-form-cycles>
pub(super) fn fragment_spreads_must_not_form_cycles(context: &ValidationContext<'_>) {
    let walk = context.walk();
    let mut detector = CycleDetector {
        context,
        walk,
        visited: HashSet::new(),
        spread_path: Vec::new(),
        path_index_by_name: HashMap::new(),
    };
    for (scope, definition) in walk.scopes.iter().enumerate() {
        if let Scope::Fragment(fragment) = definition {
            detector.detect(scope, &fragment.name)
        }
    }
}

struct CycleDetector<'c, 'a> {
    context: &'c ValidationContext<'a>,
    walk: &'c Walk<'a>,
    visited: HashSet<&'a Name>,
    /// Spreads followed from the fragment where detection started
    spread_path: Vec<&'a Node<ast::FragmentSpread>>,
    /// For each fragment being visited, its depth in `spread_path`
    path_index_by_name: HashMap<&'a Name, usize>,
}

impl<'c, 'a> CycleDetector<'c, 'a> {
    fn detect(&mut self, scope: ScopeId, name: &'a Name) {
        if !self.visited.insert(name) {
            return;
        }
        self.path_index_by_name.insert(name, self.spread_path.len());
        let walk = self.walk;
        for spread in walk.spreads_in(scope) {
            let target = &spread.fragment_name;
            match self.path_index_by_name.get(target) {
                Some(&index) => {
                    let cycle = &self.spread_path[index..];
                    let message = if cycle.is_empty() {
                        format!("Cannot spread fragment < {target} > within itself.")
                    } else {
                        let via = cycle
                            .iter()
                            .map(|spread| spread.fragment_name.as_str())
                            .collect::<Vec<_>>()
                            .join(", ");
                        format!("Cannot spread fragment < {target} > within itself via < {via} >.")
                    };
                    let locations = cycle
                        .iter()
                        .map(|spread| spread.location())
                        .chain([spread.location()]);
                    self.context.report(message, locations)
                }
                None => {
                    let Some(target_scope) = walk.fragment_scope(target) else {
                        continue;
                    };
                    self.spread_path.push(spread);
                    self.detect(target_scope, target);
                    self.spread_path.pop();
                }
            }
        }
        self.path_index_by_name.remove(name);
    }
}

pub(super) fn fragment_spread_is_possible(context: &ValidationContext<'_>) {
    let schema = context.schema();
    for occurrence in &context.walk().fragment_selections {
        let Some(parent_type) = occurrence.parent_type else {
            continue;
        };
        let (fragment_name, type_condition, location) = match occurrence.selection {
            FragmentSelection::Spread(spread) => {
                let Some(fragment) = context.fragment(&spread.fragment_name) else {
                    continue;
                };
                (
                    Some(&spread.fragment_name),
                    &fragment.type_condition,
                    spread.location(),
                )
            }
            FragmentSelection::Inline(inline) => {
                let Some(type_condition) = &inline.type_condition else {
                    continue;
                };
                (None, type_condition, inline.location())
            }
        };
        let Some(type_condition) = composite_type(schema, type_condition) else {
            continue;
        };
        let fragment_possible_types = schema.possible_types(type_condition);
        let applies = schema
            .possible_types(parent_type)
            .iter()
            .any(|name| fragment_possible_types.contains(name));
        if applies {
            continue;
        }
        let message = match fragment_name {
            Some(name) => format!(
                "Fragment < {name} > cannot be spread here as objects of type \
                 < {parent_type} > can never be of type < {type_condition} >."
            ),
            None => format!(
                "Fragment cannot be spread here as objects of type \
                 < {parent_type} > can never be of type < {type_condition} >."
            ),
        };
        context.report(message, [location])
    }
}
