use crate::executable::ExecutableField;
use crate::executable::ExecutableOperation;
use crate::execution::engine::path_to_vec;
use crate::execution::engine::LinkedPath;
use crate::execution::JsonMap;
use crate::execution::JsonValue;
use crate::execution::ResponseDataPathSegment;
use crate::schema::FieldDefinition;
use crate::Name;
use crate::Schema;
use futures::future::BoxFuture;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// The outcome of resolving a field, or of a directive hook wrapping a resolver.
pub type FieldResult = Result<JsonValue, FieldError>;

/// A resolver or directive failure, reported as a [field error] in the response.
///
/// [field error]: https://spec.graphql.org/June2018/#sec-Errors-and-Non-Nullability
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{message}")]
pub struct FieldError {
    pub message: String,
    pub extensions: JsonMap,
}

impl FieldError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            extensions: JsonMap::new(),
        }
    }

    /// Add an entry to the `extensions` of the resulting response error
    pub fn with_extension(mut self, key: &str, value: impl Into<JsonValue>) -> Self {
        self.extensions.insert(key, value.into());
        self
    }
}

impl From<String> for FieldError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<&'_ str> for FieldError {
    fn from(message: &'_ str) -> Self {
        Self::new(message)
    }
}

/// User data shared by every resolver and directive of one request.
///
/// # Example
///
/// ```
/// use apollo_executor::Context;
///
/// struct Viewer { id: u32 }
///
/// let context = Context::new(Viewer { id: 7 });
/// assert_eq!(context.get::<Viewer>().map(|v| v.id), Some(7));
/// assert!(context.get::<String>().is_none());
/// ```
#[derive(Clone, Default)]
pub struct Context {
    data: Option<Arc<dyn Any + Send + Sync>>,
}

impl Context {
    pub fn new<T: Any + Send + Sync>(data: T) -> Self {
        Self {
            data: Some(Arc::new(data)),
        }
    }

    pub fn from_arc(data: Arc<dyn Any + Send + Sync>) -> Self {
        Self { data: Some(data) }
    }

    /// Returns the context value if it is of type `T`
    pub fn get<T: Any>(&self) -> Option<&T> {
        self.data.as_deref()?.downcast_ref()
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("has_data", &self.data.is_some())
            .finish()
    }
}

/// What a resolver receives: `(parent value, arguments, context, info)`.
#[derive(Clone, Copy)]
pub struct ResolveParams<'a> {
    /// The resolved value of the parent object, or the request’s initial value at the root
    pub parent: &'a JsonValue,
    /// Coerced argument values, including defaults
    pub arguments: &'a JsonMap,
    pub context: &'a Context,
    pub info: &'a ResolveInfo<'a>,
}

/// Information about the field being resolved
pub struct ResolveInfo<'a> {
    pub(crate) schema: &'a Schema,
    pub(crate) operation: &'a ExecutableOperation,
    pub(crate) parent_type: &'a Name,
    pub(crate) field_definition: &'a FieldDefinition,
    pub(crate) fields: &'a [Arc<ExecutableField>],
    pub(crate) path: LinkedPath<'a>,
    pub(crate) variables: &'a JsonMap,
    pub(crate) context: &'a Context,
    pub(crate) introspection: bool,
}

impl<'a> ResolveInfo<'a> {
    pub fn schema(&self) -> &'a Schema {
        self.schema
    }

    pub fn operation(&self) -> &'a ExecutableOperation {
        self.operation
    }

    /// The name of the concrete object type the field is resolved on
    pub fn parent_type(&self) -> &'a Name {
        self.parent_type
    }

    pub fn field_name(&self) -> &'a Name {
        &self.field_definition.name
    }

    /// The key of this field in the response: its alias if any, else its name
    pub fn response_key(&self) -> &'a Name {
        &self.fields[0].response_key
    }

    pub fn field_definition(&self) -> &'a FieldDefinition {
        self.field_definition
    }

    /// Every selection of this field merged under the same response key
    pub fn field_selections(&self) -> &'a [Arc<ExecutableField>] {
        self.fields
    }

    /// Path from the root of the response data to this field
    pub fn path(&self) -> Vec<ResponseDataPathSegment> {
        path_to_vec(self.path)
    }

    /// Coerced variable values of the request
    pub fn variable_values(&self) -> &'a JsonMap {
        self.variables
    }

    pub fn context(&self) -> &'a Context {
        self.context
    }

    /// `"Type.field"`, as used in error messages
    pub(crate) fn coordinate(&self) -> String {
        format!("{}.{}", self.parent_type, self.field_definition.name)
    }
}

/// Resolves the value of a field.
///
/// Implemented for closures so that resolvers can be registered inline:
///
/// ```
/// use apollo_executor::Schema;
///
/// let schema = Schema::builder()
///     .add_sdl("type Query { hello(name: String = \"world\"): String }", "schema.graphql")
///     .resolver("Query.hello", |params| {
///         Box::pin(async move {
///             let name = params.arguments.get("name").and_then(|v| v.as_str());
///             let name = name.unwrap_or_default();
///             Ok(format!("Hello, {name}!").into())
///         })
///     })
///     .build()
///     .unwrap();
/// ```
pub trait Resolver: Send + Sync + 'static {
    fn resolve<'a>(&'a self, params: ResolveParams<'a>) -> BoxFuture<'a, FieldResult>;
}

impl<F> Resolver for F
where
    F: for<'a> Fn(ResolveParams<'a>) -> BoxFuture<'a, FieldResult> + Send + Sync + 'static,
{
    fn resolve<'a>(&'a self, params: ResolveParams<'a>) -> BoxFuture<'a, FieldResult> {
        self(params)
    }
}

/// Used for fields without a registered resolver:
/// the member of the parent value named like the field, else `null`.
pub(crate) struct DefaultResolver;

impl Resolver for DefaultResolver {
    fn resolve<'a>(&'a self, params: ResolveParams<'a>) -> BoxFuture<'a, FieldResult> {
        let value = params
            .parent
            .as_object()
            .and_then(|object| object.get(params.info.field_name().as_str()))
            .cloned()
            .unwrap_or(JsonValue::Null);
        Box::pin(futures::future::ready(Ok(value)))
    }
}

/// Determines the concrete object type of a value resolved for an interface or union field.
///
/// Returns `None` if the type cannot be determined.
pub trait TypeResolver: Send + Sync + 'static {
    fn resolve_type(&self, value: &JsonValue, info: &ResolveInfo<'_>) -> Option<Name>;
}

impl<F> TypeResolver for F
where
    F: Fn(&JsonValue, &ResolveInfo<'_>) -> Option<Name> + Send + Sync + 'static,
{
    fn resolve_type(&self, value: &JsonValue, info: &ResolveInfo<'_>) -> Option<Name> {
        self(value, info)
    }
}

/// Used for abstract types without a registered type resolver:
/// reads the `__typename` member of the value.
pub(crate) struct DefaultTypeResolver;

impl TypeResolver for DefaultTypeResolver {
    fn resolve_type(&self, value: &JsonValue, _info: &ResolveInfo<'_>) -> Option<Name> {
        let type_name = value.as_object()?.get("__typename")?.as_str()?;
        Name::new(type_name).ok()
    }
}
