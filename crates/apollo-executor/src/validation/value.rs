use super::walk::InputValueOccurrence;
use super::ValidationContext;
use crate::ast;
use crate::schema::ExtendedType;
use crate::schema::InputObjectType;
use crate::Name;
use crate::Node;
use indexmap::IndexMap;

/// <https://spec.graphql.org/June2018/#sec-Values-of-Correct-Type>
///
/// Each occurrence is checked against the named type or the nullability of its position.
/// List items and input object fields are occurrences of their own.
pub(super) fn values_of_correct_type(context: &ValidationContext<'_>) {
    let schema = context.schema();
    for occurrence in &context.walk().input_values {
        let value = occurrence.value;
        let ty = occurrence.ty;
        let is_valid = match &**value {
            ast::Value::Variable(_) => continue,
            ast::Value::Null => !ty.is_non_null(),
            _ if ty.is_list() => continue,
            _ => match schema.types.get(ty.inner_named_type()) {
                Some(ExtendedType::Scalar(scalar)) => {
                    value.has_variables() || scalar.implementation.parse_literal(value).is_ok()
                }
                Some(ExtendedType::Enum(enum_)) => match &**value {
                    ast::Value::Enum(name) => enum_.values.contains_key(name),
                    _ => false,
                },
                Some(ExtendedType::InputObject(_)) => matches!(&**value, ast::Value::Object(_)),
                // Not an input type: reported with the variable or argument definition
                _ => continue,
            },
        };
        if !is_valid {
            context.report_at(
                format!("Expected type < {ty} >, found < {value} >."),
                [value.location()],
                Some(&occurrence.path),
            )
        }
    }
}

/// Object values in a position of input object type, with the type
fn input_objects<'c, 'a>(
    context: &'c ValidationContext<'a>,
) -> impl Iterator<
    Item = (
        &'c InputValueOccurrence<'a>,
        &'a [(Name, Node<ast::Value>)],
        &'a InputObjectType,
    ),
> + 'c {
    let schema = context.schema();
    context
        .walk()
        .input_values
        .iter()
        .filter_map(move |occurrence| {
            let ast::Value::Object(fields) = &**occurrence.value else {
                return None;
            };
            if occurrence.ty.is_list() {
                return None;
            }
            let input_object = schema.get_input_object(occurrence.ty.inner_named_type())?;
            Some((occurrence, fields.as_slice(), &**input_object))
        })
}

pub(super) fn input_object_field_names(context: &ValidationContext<'_>) {
    for (occurrence, fields, input_object) in input_objects(context) {
        for (name, value) in fields {
            if !input_object.fields.contains_key(name) {
                context.report_at(
                    format!(
                        "Field < {name} > is not defined by type < {} >.",
                        input_object.name
                    ),
                    [value.location()],
                    Some(&occurrence.path),
                )
            }
        }
    }
}

pub(super) fn input_object_field_uniqueness(context: &ValidationContext<'_>) {
    for occurrence in &context.walk().input_values {
        let ast::Value::Object(fields) = &**occurrence.value else {
            continue;
        };
        let mut by_name = IndexMap::<&Name, Vec<_>>::new();
        for (name, value) in fields {
            by_name.entry(name).or_default().push(value.location())
        }
        for (name, locations) in by_name {
            if locations.len() > 1 {
                context.report_at(
                    format!("There can be only one input field named < {name} >."),
                    locations,
                    Some(&occurrence.path),
                )
            }
        }
    }
}

pub(super) fn input_object_required_fields(context: &ValidationContext<'_>) {
    for (occurrence, fields, input_object) in input_objects(context) {
        for definition in input_object.fields.values() {
            let provided = fields.iter().any(|(name, _)| *name == definition.name);
            if definition.is_required() && !provided {
                context.report_at(
                    format!(
                        "Input field < {}.{} > of type < {} > is required, but it was not provided.",
                        input_object.name, definition.name, definition.ty
                    ),
                    [occurrence.value.location()],
                    Some(&occurrence.path),
                )
            }
        }
    }
}
