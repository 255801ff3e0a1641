use crate::ast;
use crate::directives::DirectiveInvocation;
use crate::directives::InputNext;
use crate::directives::ResolverNext;
use crate::executable::Condition;
use crate::executable::ExecutableField;
use crate::executable::ExecutableOperation;
use crate::execution::input_coercion::coerce_arguments;
use crate::execution::input_coercion::ArgumentError;
use crate::execution::Context;
use crate::execution::FieldError;
use crate::execution::GraphQLError;
use crate::execution::JsonMap;
use crate::execution::JsonValue;
use crate::execution::ResolveInfo;
use crate::execution::ResolveParams;
use crate::execution::Response;
use crate::execution::ResponseDataPathSegment;
use crate::parser::SourceMap;
use crate::schema::ExtendedType;
use crate::schema::ObjectType;
use crate::Name;
use crate::NodeLocation;
use crate::Schema;
use futures::future::join_all;
use futures::future::BoxFuture;
use indexmap::IndexMap;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::PoisonError;

/// <https://spec.graphql.org/June2018/#sec-Normal-and-Serial-Execution>
#[derive(Debug, Copy, Clone)]
pub(crate) enum ExecutionMode {
    /// Allowed to resolve fields in any order, including in parallel
    Normal,
    /// Top-level fields of a mutation operation must be executed in order
    Sequential,
}

/// Return in `Err` when a field error occurred at some non-nullable place
///
/// <https://spec.graphql.org/June2018/#sec-Errors-and-Non-Nullability>
#[derive(Debug)]
pub(crate) struct PropagateNull;

/// Linked-list version of `Vec<PathElement>`, taking advantage of the call stack
pub(crate) type LinkedPath<'a> = Option<&'a LinkedPathElement<'a>>;

pub(crate) struct LinkedPathElement<'a> {
    pub(crate) element: ResponseDataPathSegment,
    pub(crate) next: LinkedPath<'a>,
}

/// Fields to execute on one object, grouped by response key
type GroupedFields = IndexMap<Name, Vec<Arc<ExecutableField>>>;

pub(crate) struct ExecutionContext<'a> {
    pub(crate) schema: &'a Schema,
    pub(crate) operation: &'a ExecutableOperation,
    pub(crate) variables: &'a JsonMap,
    pub(crate) context: &'a Context,
    pub(crate) introspection: bool,
    errors: Mutex<Vec<GraphQLError>>,
    /// Keyed by the identity of the selected fields and the object type
    collected: Mutex<HashMap<(Vec<usize>, Name), Arc<GroupedFields>>>,
}

impl<'a> ExecutionContext<'a> {
    pub(crate) fn new(
        schema: &'a Schema,
        operation: &'a ExecutableOperation,
        variables: &'a JsonMap,
        context: &'a Context,
        introspection: bool,
    ) -> Self {
        Self {
            schema,
            operation,
            variables,
            context,
            introspection,
            errors: Mutex::new(Vec::new()),
            collected: Mutex::new(HashMap::new()),
        }
    }

    pub(crate) fn push_error(&self, error: GraphQLError) {
        tracing::debug!(message = %error.message, "field error");
        self.errors
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(error)
    }

    /// Record an error returned by a resolver or a directive
    pub(crate) fn push_field_error(
        &self,
        error: FieldError,
        path: LinkedPath<'_>,
        location: Option<NodeLocation>,
    ) {
        let FieldError {
            message,
            extensions,
        } = error;
        let mut error =
            GraphQLError::field_error(message, path, location, &self.operation.sources);
        error.extensions = extensions;
        self.push_error(error)
    }

    /// Record an error for a state that validation should have prevented
    pub(crate) fn push_validation_bug(
        &self,
        message: String,
        path: LinkedPath<'_>,
        location: Option<NodeLocation>,
    ) {
        let error = GraphQLError::field_error(message, path, location, &self.operation.sources)
            .with_extension("SUSPECTED_VALIDATION_BUG", true);
        self.push_error(error)
    }

    fn take_errors(self) -> Vec<GraphQLError> {
        self.errors
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// <https://spec.graphql.org/June2018/#CollectFields()>
    ///
    /// Type conditions and `@skip` / `@include` only depend on the object type
    /// and on variables, so results are reused within the request.
    fn collect_fields(
        &self,
        object_type: &ObjectType,
        fields: &[Arc<ExecutableField>],
    ) -> Arc<GroupedFields> {
        let key = (
            fields
                .iter()
                .map(|field| Arc::as_ptr(field) as usize)
                .collect(),
            object_type.name.clone(),
        );
        let mut collected = self.collected.lock().unwrap_or_else(PoisonError::into_inner);
        collected
            .entry(key)
            .or_insert_with(|| {
                let mut grouped_fields = GroupedFields::new();
                for field in fields {
                    if field
                        .conditions
                        .iter()
                        .all(|condition| self.eval_condition(object_type, condition))
                    {
                        grouped_fields
                            .entry(field.response_key.clone())
                            .or_default()
                            .push(field.clone())
                    }
                }
                Arc::new(grouped_fields)
            })
            .clone()
    }

    fn eval_condition(&self, object_type: &ObjectType, condition: &Condition) -> bool {
        match condition {
            Condition::TypeCondition(type_condition) => {
                does_fragment_type_apply(self.schema, object_type, type_condition)
            }
            Condition::Skip(value) => !eval_if_arg(value, self.variables).unwrap_or(false),
            Condition::Include(value) => eval_if_arg(value, self.variables).unwrap_or(true),
        }
    }
}

/// <https://spec.graphql.org/June2018/#DoesFragmentTypeApply()>
fn does_fragment_type_apply(
    schema: &Schema,
    object_type: &ObjectType,
    fragment_type: &Name,
) -> bool {
    match schema.types.get(fragment_type) {
        Some(ExtendedType::Object(_)) => *fragment_type == object_type.name,
        Some(ExtendedType::Interface(_)) => {
            object_type.implements_interfaces.contains(fragment_type)
        }
        Some(ExtendedType::Union(def)) => def.members.contains(&object_type.name),
        // Undefined or not an output type: validation should have caught this
        _ => false,
    }
}

fn eval_if_arg(value: &ast::Value, variables: &JsonMap) -> Option<bool> {
    match value {
        ast::Value::Boolean(value) => Some(*value),
        ast::Value::Variable(var) => variables.get(var.as_str())?.as_bool(),
        _ => None,
    }
}

/// Execute the selected operation, returning response data and field errors.
pub(crate) async fn execute_operation(
    schema: &Schema,
    operation: &ExecutableOperation,
    variables: &JsonMap,
    initial_value: &JsonValue,
    context: &Context,
    introspection: bool,
) -> Response {
    let ctx = ExecutionContext::new(schema, operation, variables, context, introspection);
    let Some(root_type) = schema.get_object(&operation.root_type) else {
        ctx.push_validation_bug(
            format!("Undefined root operation type {}", operation.root_type),
            None,
            operation.location,
        );
        return Response::from_errors(ctx.take_errors());
    };
    let mode = if operation.allow_parallelization {
        ExecutionMode::Normal
    } else {
        ExecutionMode::Sequential
    };
    let result = execute_selection_set(
        &ctx,
        None,
        mode,
        root_type,
        initial_value,
        operation.selection_set.fields.clone(),
    )
    .await;
    let data = result.ok();
    Response {
        errors: ctx.take_errors(),
        data,
    }
}

/// <https://spec.graphql.org/June2018/#ExecuteSelectionSet()>
///
/// Sibling fields run concurrently in normal mode, one after the other in sequential mode.
/// Either way the response map follows selection order.
pub(crate) fn execute_selection_set<'a>(
    ctx: &'a ExecutionContext<'a>,
    path: LinkedPath<'a>,
    mode: ExecutionMode,
    object_type: &'a ObjectType,
    object_value: &'a JsonValue,
    fields: Vec<Arc<ExecutableField>>,
) -> BoxFuture<'a, Result<JsonMap, PropagateNull>> {
    Box::pin(async move {
        let grouped_fields = ctx.collect_fields(object_type, &fields);
        let paths: Vec<_> = grouped_fields
            .keys()
            .map(|response_key| LinkedPathElement {
                element: ResponseDataPathSegment::Field(response_key.clone()),
                next: path,
            })
            .collect();
        let field_futures = grouped_fields
            .values()
            .zip(&paths)
            .map(|(fields, path)| execute_field(ctx, Some(path), object_type, object_value, fields));
        let results = match mode {
            ExecutionMode::Normal => join_all(field_futures).await,
            ExecutionMode::Sequential => {
                let mut results = Vec::with_capacity(paths.len());
                for field_future in field_futures {
                    // A null propagated to the root: later fields must not run
                    results.push(Ok(field_future.await?))
                }
                results
            }
        };
        let mut response_map = JsonMap::with_capacity(results.len());
        for (response_key, result) in grouped_fields.keys().zip(results) {
            response_map.insert(response_key.as_str(), result?);
        }
        Ok(response_map)
    })
}

/// <https://spec.graphql.org/June2018/#ExecuteField()>
fn execute_field<'a>(
    ctx: &'a ExecutionContext<'a>,
    path: LinkedPath<'a>,
    object_type: &'a ObjectType,
    object_value: &'a JsonValue,
    fields: &'a [Arc<ExecutableField>],
) -> BoxFuture<'a, Result<JsonValue, PropagateNull>> {
    Box::pin(async move {
        // Indexing should not panic: `collect_fields` only creates a `Vec` to push to it
        let field = &fields[0];
        let location = field.location();
        let Some(field_def) = ctx.schema.type_field(&object_type.name, &field.name) else {
            ctx.push_error(GraphQLError::field_error(
                format!(
                    "Field < {} > doesn't exist on < {} >.",
                    field.name, object_type.name
                ),
                path,
                location,
                &ctx.operation.sources,
            ));
            return Ok(JsonValue::Null);
        };
        let info = ResolveInfo {
            schema: ctx.schema,
            operation: ctx.operation,
            parent_type: &object_type.name,
            field_definition: field_def,
            fields,
            path,
            variables: ctx.variables,
            context: ctx.context,
            introspection: ctx.introspection,
        };
        let result = resolve_and_complete(ctx, &info, object_value).await;
        try_nullify(field_def.coercer.is_non_null(), result)
    })
}

async fn resolve_and_complete(
    ctx: &ExecutionContext<'_>,
    info: &ResolveInfo<'_>,
    object_value: &JsonValue,
) -> Result<JsonValue, PropagateNull> {
    let field = &info.fields[0];
    let field_def = info.field_definition;
    let location = field.location();
    let argument_errors = |errors: Vec<ArgumentError>| {
        for ArgumentError { message, location } in errors {
            ctx.push_error(GraphQLError::field_error(
                message,
                info.path,
                location,
                &ctx.operation.sources,
            ))
        }
        PropagateNull
    };

    // Coerced at compile time against the same definition, e.g. not an interface field
    let static_arguments = field.static_arguments.as_ref().filter(|_| {
        field
            .definition
            .as_ref()
            .is_some_and(|def| std::ptr::eq(&**def, field_def))
    });
    let mut arguments = match static_arguments {
        Some(Ok(arguments)) => arguments.clone(),
        Some(Err(errors)) => return Err(argument_errors(errors.clone())),
        None => coerce_arguments(
            ctx.schema,
            &field_def.arguments,
            &field.arguments,
            Some(ctx.variables),
        )
        .map_err(argument_errors)?,
    };
    for argument_def in &field_def.arguments {
        if argument_def.directives.is_empty() {
            continue;
        }
        if let Some(value) = arguments.get_mut(argument_def.name.as_str()) {
            let next = InputNext::new(&argument_def.directives, ctx.context);
            match next.run(std::mem::replace(value, JsonValue::Null)).await {
                Ok(coerced) => *value = coerced,
                Err(error) => {
                    ctx.push_field_error(error, info.path, location);
                    return Err(PropagateNull);
                }
            }
        }
    }

    let mut query_directives = Vec::with_capacity(field.directives.len());
    for directive in &field.directives {
        let invocation = match &directive.static_invocation {
            Some(invocation) => invocation.clone(),
            None => {
                let arguments = coerce_arguments(
                    ctx.schema,
                    &directive.definition.arguments,
                    &directive.arguments,
                    Some(ctx.variables),
                )
                .map_err(argument_errors)?;
                DirectiveInvocation {
                    name: directive.name.clone(),
                    arguments,
                    location: directive.location,
                    implementation: directive.definition.implementation.clone(),
                }
            }
        };
        query_directives.push(invocation)
    }
    // Schema directives wrap query directives, which wrap the resolver
    let chain: Vec<_> = field_def
        .directives
        .iter()
        .chain(&query_directives)
        .cloned()
        .collect();
    let params = ResolveParams {
        parent: object_value,
        arguments: &arguments,
        context: ctx.context,
        info,
    };
    let resolved = match ResolverNext::new(&chain, &*field_def.resolver)
        .run(params)
        .await
    {
        Ok(resolved) => resolved,
        Err(error) => {
            ctx.push_field_error(error, info.path, location);
            return Err(PropagateNull);
        }
    };
    let value = match crate::directives::OutputNext::new(&query_directives, info)
        .run(resolved)
        .await
    {
        Ok(value) => value,
        Err(error) => {
            ctx.push_field_error(error, info.path, location);
            return Err(PropagateNull);
        }
    };
    field_def.coercer.coerce(ctx, info, info.path, value).await
}

/// Try to insert a propagated null if possible, or keep propagating it.
///
/// <https://spec.graphql.org/June2018/#sec-Errors-and-Non-Nullability>
pub(crate) fn try_nullify(
    is_non_null: bool,
    result: Result<JsonValue, PropagateNull>,
) -> Result<JsonValue, PropagateNull> {
    match result {
        Ok(json) => Ok(json),
        Err(PropagateNull) => {
            if is_non_null {
                Err(PropagateNull)
            } else {
                Ok(JsonValue::Null)
            }
        }
    }
}

pub(crate) fn path_to_vec(mut link: LinkedPath<'_>) -> Vec<ResponseDataPathSegment> {
    let mut path = Vec::new();
    while let Some(node) = link {
        path.push(node.element.clone());
        link = node.next;
    }
    path.reverse();
    path
}

impl GraphQLError {
    pub(crate) fn field_error(
        message: impl Into<String>,
        path: LinkedPath<'_>,
        location: Option<NodeLocation>,
        sources: &SourceMap,
    ) -> Self {
        let mut err = Self::new(message, location, sources);
        err.path = Some(path_to_vec(path));
        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::name;

    #[test]
    fn linked_path() {
        let root = LinkedPathElement {
            element: ResponseDataPathSegment::Field(name!("pets")),
            next: None,
        };
        let item = LinkedPathElement {
            element: ResponseDataPathSegment::ListIndex(2),
            next: Some(&root),
        };
        let leaf = LinkedPathElement {
            element: ResponseDataPathSegment::Field(name!("name")),
            next: Some(&item),
        };
        assert_eq!(
            path_to_vec(Some(&leaf)),
            [
                ResponseDataPathSegment::Field(name!("pets")),
                ResponseDataPathSegment::ListIndex(2),
                ResponseDataPathSegment::Field(name!("name")),
            ]
        );
        assert!(path_to_vec(None).is_empty());
    }

    #[test]
    fn nullify() {
        assert_eq!(try_nullify(false, Err(PropagateNull)).ok(), Some(JsonValue::Null));
        assert!(try_nullify(true, Err(PropagateNull)).is_err());
        assert_eq!(
            try_nullify(true, Ok(JsonValue::Bool(true))).ok(),
            Some(JsonValue::Bool(true))
        );
    }

    #[test]
    fn if_arguments() {
        let mut variables = JsonMap::new();
        variables.insert("yes", true.into());
        assert_eq!(eval_if_arg(&ast::Value::Boolean(false), &variables), Some(false));
        assert_eq!(
            eval_if_arg(&ast::Value::Variable(name!("yes")), &variables),
            Some(true)
        );
        assert_eq!(
            eval_if_arg(&ast::Value::Variable(name!("missing")), &variables),
            None
        );
    }
}
