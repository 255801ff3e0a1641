use crate::directives::DirectiveInvocation;
use crate::directives::OutputNext;
use crate::execution::engine::execute_selection_set;
use crate::execution::engine::try_nullify;
use crate::execution::engine::ExecutionContext;
use crate::execution::engine::ExecutionMode;
use crate::execution::engine::LinkedPath;
use crate::execution::engine::LinkedPathElement;
use crate::execution::engine::PropagateNull;
use crate::execution::JsonValue;
use crate::execution::ResolveInfo;
use crate::execution::ResponseDataPathSegment;
use crate::schema::ExtendedType;
use crate::schema::FieldDefinition;
use crate::schema::ObjectType;
use crate::schema::Type;
use crate::Name;
use crate::Node;
use crate::Schema;
use futures::future::join_all;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::sync::Arc;

/// Completes a resolved value into its response representation.
///
/// Composed once per field while building the schema, innermost-out:
/// leaf or composite, then list, then non-null, then directives.
/// The outermost layer applies first.
///
/// This is [CompleteValue()](https://spec.graphql.org/June2018/#CompleteValue())
/// in the GraphQL specification, split into layers.
#[derive(Clone, Debug)]
pub(crate) enum OutputCoercer {
    /// `on_pre_output_coercion` hooks of directives applied on the field or the named type
    Directives(Arc<[DirectiveInvocation]>, Box<OutputCoercer>),
    NonNull(Box<OutputCoercer>),
    List(Box<OutputCoercer>),
    /// A scalar or enum type
    Leaf(Name),
    /// An object, interface, or union type
    Composite(Name),
}

impl OutputCoercer {
    /// Wrapping structure only, without directives
    pub(crate) fn for_type(ty: &Type, is_composite: &dyn Fn(&Name) -> bool) -> Self {
        let named = |name: &Name| {
            if is_composite(name) {
                Self::Composite(name.clone())
            } else {
                Self::Leaf(name.clone())
            }
        };
        Self::wrap(ty, &named)
    }

    /// The complete coercer of a field, including directives applied
    /// on the field definition and on its named type
    pub(crate) fn compose(schema: &Schema, def: &FieldDefinition) -> Self {
        let named = |name: &Name| {
            let Some(ty) = schema.types.get(name) else {
                return Self::Leaf(name.clone());
            };
            let base = if ty.is_composite() {
                Self::Composite(name.clone())
            } else {
                Self::Leaf(name.clone())
            };
            Self::with_directives(ty.directive_invocations(), base)
        };
        Self::with_directives(&def.directives, Self::wrap(&def.ty, &named))
    }

    fn wrap(ty: &Type, named: &dyn Fn(&Name) -> Self) -> Self {
        match ty {
            Type::Named(name) => named(name),
            Type::NonNullNamed(name) => Self::NonNull(Box::new(named(name))),
            Type::List(item) => Self::List(Box::new(Self::wrap(item, named))),
            Type::NonNullList(item) => {
                Self::NonNull(Box::new(Self::List(Box::new(Self::wrap(item, named)))))
            }
        }
    }

    fn with_directives(directives: &[DirectiveInvocation], inner: Self) -> Self {
        if directives.is_empty() {
            inner
        } else {
            Self::Directives(directives.into(), Box::new(inner))
        }
    }

    /// Whether a `null` from this coercer must propagate to the parent position
    pub(crate) fn is_non_null(&self) -> bool {
        match self {
            Self::NonNull(_) => true,
            Self::Directives(_, inner) => inner.is_non_null(),
            Self::List(_) | Self::Leaf(_) | Self::Composite(_) => false,
        }
    }

    /// Returns `Err` for a field error being propagated upwards to find a nullable place
    pub(crate) fn coerce<'a>(
        &'a self,
        ctx: &'a ExecutionContext<'a>,
        info: &'a ResolveInfo<'a>,
        path: LinkedPath<'a>,
        value: JsonValue,
    ) -> BoxFuture<'a, Result<JsonValue, PropagateNull>> {
        let location = info.fields[0].location();
        macro_rules! field_error {
            ($($arg: tt)+) => {
                {
                    ctx.push_error(crate::execution::GraphQLError::field_error(
                        format!($($arg)+),
                        path,
                        location,
                        &ctx.operation.sources,
                    ));
                    return Err(PropagateNull);
                }
            };
        }
        Box::pin(async move {
            match self {
                Self::Directives(directives, inner) => {
                    let value = match OutputNext::new(directives, info).run(value).await {
                        Ok(value) => value,
                        Err(error) => {
                            ctx.push_field_error(error, path, location);
                            return Err(PropagateNull);
                        }
                    };
                    inner.coerce(ctx, info, path, value).await
                }
                Self::NonNull(inner) => {
                    let value = inner.coerce(ctx, info, path, value).await?;
                    if value.is_null() {
                        field_error!(
                            "Cannot return null for non-nullable field {}.",
                            info.coordinate()
                        )
                    }
                    Ok(value)
                }
                Self::List(item) => {
                    let items = match value {
                        JsonValue::Null => return Ok(JsonValue::Null),
                        JsonValue::Array(items) => items,
                        _ => field_error!(
                            "Expected Iterable, but did not find one for field {}.",
                            info.coordinate()
                        ),
                    };
                    let paths: Vec<_> = (0..items.len())
                        .map(|index| LinkedPathElement {
                            element: ResponseDataPathSegment::ListIndex(index),
                            next: path,
                        })
                        .collect();
                    let item_is_non_null = item.is_non_null();
                    let completed = join_all(items.into_iter().zip(&paths).map(|(value, path)| {
                        item.coerce(ctx, info, Some(path), value)
                            .map(move |result| try_nullify(item_is_non_null, result))
                    }))
                    .await;
                    // If an item is non-null and errored, nullify the whole list
                    completed
                        .into_iter()
                        .collect::<Result<Vec<_>, _>>()
                        .map(JsonValue::Array)
                }
                Self::Leaf(type_name) => {
                    if value.is_null() {
                        return Ok(value);
                    }
                    match ctx.schema.types.get(type_name) {
                        Some(ExtendedType::Scalar(def)) => {
                            match def.implementation.coerce_output(&value) {
                                Ok(value) => Ok(value),
                                Err(error) => field_error!("{error}"),
                            }
                        }
                        // https://spec.graphql.org/June2018/#sec-Enums
                        Some(ExtendedType::Enum(def)) => {
                            if value.as_str().is_some_and(|str| def.values.contains_key(str)) {
                                Ok(value)
                            } else {
                                field_error!("Enum < {type_name} > cannot represent value: {value}")
                            }
                        }
                        _ => {
                            ctx.push_validation_bug(
                                format!("Field of non-leaf type {type_name} completed as a leaf"),
                                path,
                                location,
                            );
                            Err(PropagateNull)
                        }
                    }
                }
                Self::Composite(type_name) => {
                    if value.is_null() {
                        return Ok(value);
                    }
                    let object_type = resolve_runtime_type(ctx, info, path, type_name, &value)?;
                    let fields = info
                        .fields
                        .iter()
                        .flat_map(|field| field.selection_set.fields.iter().cloned())
                        .collect();
                    execute_selection_set(
                        ctx,
                        path,
                        ExecutionMode::Normal,
                        object_type,
                        &value,
                        fields,
                    )
                    .await
                    .map(JsonValue::Object)
                }
            }
        })
    }
}

/// <https://spec.graphql.org/June2018/#ResolveAbstractType()>
fn resolve_runtime_type<'a>(
    ctx: &ExecutionContext<'a>,
    info: &ResolveInfo<'_>,
    path: LinkedPath<'_>,
    type_name: &Name,
    value: &JsonValue,
) -> Result<&'a Node<ObjectType>, PropagateNull> {
    let location = info.fields[0].location();
    let type_resolver = match ctx.schema.types.get(type_name) {
        Some(ExtendedType::Object(def)) => return Ok(def),
        Some(ExtendedType::Interface(def)) => &def.type_resolver,
        Some(ExtendedType::Union(def)) => &def.type_resolver,
        _ => {
            ctx.push_validation_bug(
                format!("Field of non-composite type {type_name} completed as an object"),
                path,
                location,
            );
            return Err(PropagateNull);
        }
    };
    let message = match type_resolver.resolve_type(value, info) {
        None => format!(
            "Abstract type < {type_name} > must resolve to an Object type at runtime \
             for field < {} >.",
            info.coordinate()
        ),
        Some(runtime_type) => match ctx.schema.get_object(&runtime_type) {
            Some(def) if ctx.schema.is_possible_type(type_name, &runtime_type) => return Ok(def),
            Some(_) => format!(
                "Runtime Object type < {runtime_type} > is not a possible type for < {type_name} >."
            ),
            None => format!(
                "Abstract type < {type_name} > must resolve to an Object type at runtime \
                 for field < {} >. Received < {runtime_type} >.",
                info.coordinate()
            ),
        },
    };
    ctx.push_error(crate::execution::GraphQLError::field_error(
        message,
        path,
        location,
        &ctx.operation.sources,
    ));
    Err(PropagateNull)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::name;

    #[test]
    fn layers_are_composed_innermost_out() {
        let ty = Type::NonNullNamed(name!("Int")).list().non_null();
        let coercer = OutputCoercer::for_type(&ty, &|_| false);
        assert!(coercer.is_non_null());
        let OutputCoercer::NonNull(list) = coercer else {
            panic!("expected non-null")
        };
        let OutputCoercer::List(item) = *list else {
            panic!("expected list")
        };
        assert!(item.is_non_null());
        assert!(matches!(*item, OutputCoercer::NonNull(ref leaf) if matches!(**leaf, OutputCoercer::Leaf(_))));
    }

    #[test]
    fn composite_types() {
        let ty = Type::Named(name!("Pet")).list();
        let coercer = OutputCoercer::for_type(&ty, &|name| name == "Pet");
        assert!(!coercer.is_non_null());
        assert!(
            matches!(coercer, OutputCoercer::List(ref item) if matches!(**item, OutputCoercer::Composite(_)))
        );
    }
}
