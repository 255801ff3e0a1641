use super::walk::composite_type;
use super::walk::Scope;
use super::ValidationContext;
use crate::ast;
use crate::ast::Selection;
use crate::schema::FieldDefinition;
use crate::Name;
use crate::Node;
use crate::Schema;
use indexmap::IndexMap;
use std::collections::HashSet;

pub(super) fn field_selections(context: &ValidationContext<'_>) {
    for occurrence in &context.walk().fields {
        if let (Some(parent_type), None) = (occurrence.parent_type, occurrence.definition) {
            context.report_at(
                format!(
                    "Field < {} > doesn't exist on < {parent_type} >.",
                    occurrence.field.name
                ),
                [occurrence.field.location()],
                Some(&occurrence.path),
            )
        }
    }
}

pub(super) fn leaf_field_selections(context: &ValidationContext<'_>) {
    let schema = context.schema();
    for occurrence in &context.walk().fields {
        let Some(definition) = occurrence.definition else {
            continue;
        };
        let Some(field_type) = schema.types.get(definition.ty.inner_named_type()) else {
            continue;
        };
        let field = occurrence.field;
        let message = if field_type.is_leaf() && !field.selection_set.is_empty() {
            format!(
                "Field < {} > must not have a selection since type < {} > has no subfields.",
                field.name, definition.ty
            )
        } else if field_type.is_composite() && field.selection_set.is_empty() {
            format!(
                "Field < {} > of type < {} > must have a selection of subfields.",
                field.name, definition.ty
            )
        } else {
            continue;
        };
        context.report_at(message, [field.location()], Some(&occurrence.path))
    }
}

/// <https://spec.graphql.org/June2018/#FieldsInSetCanMerge()>
pub(super) fn field_selection_merging(context: &ValidationContext<'_>) {
    let schema = context.schema();
    let walk = context.walk();
    let mut merging = Merging {
        context,
        compared: HashSet::new(),
    };
    for scope in &walk.scopes {
        match *scope {
            Scope::Operation(operation) => {
                let root_type = schema
                    .root_operation(operation.operation_type)
                    .and_then(|name| composite_type(schema, name));
                merging.selection_set(root_type, &operation.selection_set)
            }
            Scope::Fragment(fragment) => {
                let type_condition = composite_type(schema, &fragment.type_condition);
                merging.selection_set(type_condition, &fragment.selection_set)
            }
        }
    }
    for occurrence in &walk.fields {
        if !occurrence.field.selection_set.is_empty() {
            let field_type = occurrence
                .definition
                .and_then(|definition| composite_type(schema, definition.ty.inner_named_type()));
            merging.selection_set(field_type, &occurrence.field.selection_set)
        }
    }
}

#[derive(Clone, Copy)]
struct FieldInSet<'a> {
    parent_type: Option<&'a Name>,
    field: &'a Node<ast::Field>,
    definition: Option<&'a Node<FieldDefinition>>,
}

type FieldsByResponseKey<'a> = IndexMap<&'a Name, Vec<FieldInSet<'a>>>;

struct Merging<'c, 'a> {
    context: &'c ValidationContext<'a>,
    /// Pairs of field nodes already compared, and whether their parents were mutually exclusive.
    /// Also stops recursion through fragment cycles.
    compared: HashSet<(*const ast::Field, *const ast::Field, bool)>,
}

impl<'c, 'a> Merging<'c, 'a> {
    fn selection_set(&mut self, parent_type: Option<&'a Name>, selections: &'a [Selection]) {
        let mut fields = FieldsByResponseKey::new();
        self.collect_fields(parent_type, selections, &mut HashSet::new(), &mut fields);
        self.check_fields(&fields, false)
    }

    fn collect_fields(
        &self,
        parent_type: Option<&'a Name>,
        selections: &'a [Selection],
        visited_fragments: &mut HashSet<&'a Name>,
        fields: &mut FieldsByResponseKey<'a>,
    ) {
        let schema = self.context.schema();
        for selection in selections {
            match selection {
                Selection::Field(field) => {
                    let definition = parent_type
                        .and_then(|parent_type| schema.type_field(parent_type, &field.name));
                    fields
                        .entry(field.response_key())
                        .or_default()
                        .push(FieldInSet {
                            parent_type,
                            field,
                            definition,
                        })
                }
                Selection::InlineFragment(inline) => {
                    let type_condition = match &inline.type_condition {
                        Some(name) => composite_type(schema, name),
                        None => parent_type,
                    };
                    self.collect_fields(
                        type_condition,
                        &inline.selection_set,
                        visited_fragments,
                        fields,
                    )
                }
                Selection::FragmentSpread(spread) => {
                    if !visited_fragments.insert(&spread.fragment_name) {
                        continue;
                    }
                    if let Some(fragment) = self.context.fragment(&spread.fragment_name) {
                        let type_condition = composite_type(schema, &fragment.type_condition);
                        self.collect_fields(
                            type_condition,
                            &fragment.selection_set,
                            visited_fragments,
                            fields,
                        )
                    }
                }
            }
        }
    }

    fn check_fields(&mut self, fields: &FieldsByResponseKey<'a>, parents_are_exclusive: bool) {
        for (response_key, fields) in fields {
            for (i, a) in fields.iter().enumerate() {
                for b in &fields[i + 1..] {
                    self.check_pair(response_key, *a, *b, parents_are_exclusive)
                }
            }
        }
    }

    fn check_pair(
        &mut self,
        response_key: &Name,
        a: FieldInSet<'a>,
        b: FieldInSet<'a>,
        parents_are_exclusive: bool,
    ) {
        let key = (
            &**a.field as *const ast::Field,
            &**b.field as *const ast::Field,
            parents_are_exclusive,
        );
        if !self.compared.insert(key) {
            return;
        }
        let schema = self.context.schema();
        // Different object types never apply to the same object
        let are_exclusive = parents_are_exclusive
            || match (a.parent_type, b.parent_type) {
                (Some(parent_a), Some(parent_b)) => {
                    parent_a != parent_b
                        && schema.get_object(parent_a).is_some()
                        && schema.get_object(parent_b).is_some()
                }
                _ => false,
            };
        let locations = [a.field.location(), b.field.location()];
        if !are_exclusive {
            if a.field.name != b.field.name {
                self.context.report(
                    format!(
                        "Fields < {response_key} > conflict because < {} > and < {} > are different fields. \
                         Use different aliases on the fields to fetch both if this was intentional.",
                        a.field.name, b.field.name
                    ),
                    locations,
                );
                return;
            }
            if !same_arguments(&a.field.arguments, &b.field.arguments) {
                self.context.report(
                    format!(
                        "Fields < {response_key} > conflict because they have differing arguments. \
                         Use different aliases on the fields to fetch both if this was intentional."
                    ),
                    locations,
                );
                return;
            }
        }
        if let (Some(definition_a), Some(definition_b)) = (a.definition, b.definition) {
            if !same_response_shape(schema, &definition_a.ty, &definition_b.ty) {
                self.context.report(
                    format!(
                        "Fields < {response_key} > conflict because they return conflicting types \
                         < {} > and < {} >. \
                         Use different aliases on the fields to fetch both if this was intentional.",
                        definition_a.ty, definition_b.ty
                    ),
                    locations,
                );
                return;
            }
        }
        if a.field.selection_set.is_empty() && b.field.selection_set.is_empty() {
            return;
        }
        let mut subfields = FieldsByResponseKey::new();
        for field in [a, b] {
            let field_type = field
                .definition
                .and_then(|definition| composite_type(schema, definition.ty.inner_named_type()));
            self.collect_fields(
                field_type,
                &field.field.selection_set,
                &mut HashSet::new(),
                &mut subfields,
            );
        }
        self.check_fields(&subfields, are_exclusive)
    }
}

fn same_arguments(a: &[Node<ast::Argument>], b: &[Node<ast::Argument>]) -> bool {
    a.len() == b.len()
        && a.iter().all(|argument_a| {
            b.iter().any(|argument_b| {
                argument_a.name == argument_b.name && argument_a.value == argument_b.value
            })
        })
}

/// <https://spec.graphql.org/June2018/#SameResponseShape()>, without subfields
fn same_response_shape(schema: &Schema, a: &ast::Type, b: &ast::Type) -> bool {
    match (a, b) {
        (ast::Type::NonNullNamed(a), ast::Type::NonNullNamed(b))
        | (ast::Type::Named(a), ast::Type::Named(b)) => {
            let is_leaf = |name: &Name| schema.types.get(name).is_some_and(|ty| ty.is_leaf());
            if is_leaf(a) || is_leaf(b) {
                a == b
            } else {
                true
            }
        }
        (ast::Type::NonNullList(a), ast::Type::NonNullList(b))
        | (ast::Type::List(a), ast::Type::List(b)) => same_response_shape(schema, a, b),
        _ => false,
    }
}
