//! APIs related to [executing a GraphQL request][execution]
//! and returning a [GraphQL response][response]
//!
//! [execution]: https://spec.graphql.org/June2018/#sec-Execution
//! [response]: https://spec.graphql.org/June2018/#sec-Response

mod cache;
mod engine;
pub(crate) mod input_coercion;
mod resolver;
mod response;
pub(crate) mod result_coercion;

pub(crate) use self::input_coercion::coerce_arguments;
pub use self::input_coercion::value_from_ast;
pub use self::input_coercion::Undefined;
pub use self::resolver::Context;
pub(crate) use self::resolver::DefaultResolver;
pub(crate) use self::resolver::DefaultTypeResolver;
pub use self::resolver::FieldError;
pub use self::resolver::FieldResult;
pub use self::resolver::ResolveInfo;
pub use self::resolver::ResolveParams;
pub use self::resolver::Resolver;
pub use self::resolver::TypeResolver;
pub use self::response::serde_json_bytes;
pub use self::response::GraphQLError;
pub use self::response::JsonMap;
pub use self::response::JsonValue;
pub use self::response::Response;
pub use self::response::ResponseDataPathSegment;

use self::cache::PlanCache;
use self::cache::QueryHash;
use crate::executable::ExecutableOperation;
use crate::validation::Validator;
use crate::Parser;
use crate::Schema;
use std::sync::Arc;
use tracing::Instrument;

const DEFAULT_QUERY_CACHE_CAPACITY: usize = 512;

/// Executes GraphQL requests against a schema.
///
/// Each request is parsed, validated and compiled into an [`ExecutableOperation`]
/// which is kept in a least-recently-used cache
/// keyed by the query text and the operation name.
///
/// An `Engine` is `Send + Sync`: share it between tasks, e.g. behind an [`Arc`].
///
/// # Example
///
/// ```
/// use apollo_executor::Engine;
/// use apollo_executor::Request;
/// use apollo_executor::Schema;
///
/// let schema = Schema::builder()
///     .add_sdl("type Query { answer: Int }", "schema.graphql")
///     .resolver("Query.answer", |_params| Box::pin(async { Ok(42.into()) }))
///     .build()
///     .unwrap();
/// let engine = Engine::new(schema);
/// let response = futures::executor::block_on(engine.execute(Request::new("{ answer }")));
/// assert!(response.errors.is_empty());
/// assert_eq!(response.data.unwrap().get("answer"), Some(&42.into()));
/// ```
pub struct Engine {
    schema: Arc<Schema>,
    parser: Parser,
    validator: Validator,
    introspection: bool,
    cache: PlanCache,
}

/// Configuration for an [`Engine`]
pub struct EngineBuilder {
    schema: Arc<Schema>,
    parser: Parser,
    validator: Validator,
    introspection: bool,
    query_cache_capacity: usize,
}

/// A GraphQL request
#[derive(Debug, Clone)]
pub struct Request {
    pub query: String,
    pub operation_name: Option<String>,
    pub variables: JsonMap,

    /// The parent value passed to resolvers of root fields
    pub initial_value: JsonValue,

    pub context: Context,
}

impl Engine {
    /// An engine with the default configuration
    pub fn new(schema: impl Into<Arc<Schema>>) -> Self {
        Self::builder(schema).build()
    }

    pub fn builder(schema: impl Into<Arc<Schema>>) -> EngineBuilder {
        EngineBuilder {
            schema: schema.into(),
            parser: Parser::new(),
            validator: Validator::new(),
            introspection: true,
            query_cache_capacity: DEFAULT_QUERY_CACHE_CAPACITY,
        }
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Parse, validate, and compile an operation of `query`.
    ///
    /// Results (including errors) are cached:
    /// preparing the same query text and operation name again is a cache lookup.
    pub fn prepare(
        &self,
        query: &str,
        operation_name: Option<&str>,
    ) -> Result<Arc<ExecutableOperation>, Vec<GraphQLError>> {
        let key = QueryHash::new(query, operation_name);
        self.cache
            .get_or_insert_with(key, || {
                self.compile(query, operation_name)
                    .map(Arc::new)
                    .map_err(Arc::from)
            })
            .map_err(|errors| errors.to_vec())
    }

    fn compile(
        &self,
        query: &str,
        operation_name: Option<&str>,
    ) -> Result<ExecutableOperation, Vec<GraphQLError>> {
        let document = self
            .parser
            .parse_ast(query, "query.graphql")
            .map_err(|error| {
                let sources = &error.partial.sources;
                error
                    .errors
                    .iter()
                    .map(|e| GraphQLError::new(e.to_string(), e.location, sources))
                    .collect::<Vec<_>>()
            })?;
        self.validator
            .validate(&self.schema, &document)
            .map_err(|errors| errors.to_graphql_errors(&document.sources))?;
        ExecutableOperation::compile(&self.schema, &document, operation_name).map_err(|e| {
            vec![GraphQLError::new(
                e.to_string(),
                e.location(),
                &document.sources,
            )]
        })
    }

    /// Execute a request.
    ///
    /// Never fails: request errors (syntax, validation, operation selection, variables)
    /// are returned as a response without data.
    pub async fn execute(&self, request: Request) -> Response {
        let span = tracing::info_span!(
            "graphql.execute",
            operation.name = request.operation_name.as_deref().unwrap_or_default(),
            operation.kind = tracing::field::Empty,
        );
        self.execute_request(request).instrument(span).await
    }

    async fn execute_request(&self, request: Request) -> Response {
        let operation = match self.prepare(&request.query, request.operation_name.as_deref()) {
            Ok(operation) => operation,
            Err(errors) => return Response::from_errors(errors),
        };
        tracing::Span::current().record("operation.kind", operation.operation_type.name());
        let variables = match input_coercion::coerce_variable_values(
            &self.schema,
            &operation,
            &request.variables,
        ) {
            Ok(variables) => variables,
            Err(errors) => {
                tracing::debug!(errors = errors.len(), "invalid variable values");
                return Response::from_errors(errors);
            }
        };
        engine::execute_operation(
            &self.schema,
            &operation,
            &variables,
            &request.initial_value,
            &request.context,
            self.introspection,
        )
        .await
    }
}

impl EngineBuilder {
    /// Number of prepared operations to keep. Zero disables the cache. Defaults to 512.
    pub fn query_cache_capacity(mut self, capacity: usize) -> Self {
        self.query_cache_capacity = capacity;
        self
    }

    /// Whether `__schema` and `__type` are available. Defaults to `true`.
    ///
    /// When disabled they return a field error. `__typename` is always available.
    pub fn introspection(mut self, enable: bool) -> Self {
        self.introspection = enable;
        self
    }

    /// Configure parser limits for request documents
    pub fn parser(mut self, parser: Parser) -> Self {
        self.parser = parser;
        self
    }

    /// Replace the default validation rules
    pub fn validator(mut self, validator: Validator) -> Self {
        self.validator = validator;
        self
    }

    pub fn build(self) -> Engine {
        Engine {
            schema: self.schema,
            parser: self.parser,
            validator: self.validator,
            introspection: self.introspection,
            cache: PlanCache::new(self.query_cache_capacity),
        }
    }
}

impl Request {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            operation_name: None,
            variables: JsonMap::new(),
            initial_value: JsonValue::Null,
            context: Context::default(),
        }
    }

    pub fn operation_name(mut self, operation_name: impl Into<String>) -> Self {
        self.operation_name = Some(operation_name.into());
        self
    }

    pub fn variables(mut self, variables: JsonMap) -> Self {
        self.variables = variables;
        self
    }

    pub fn initial_value(mut self, initial_value: impl Into<JsonValue>) -> Self {
        self.initial_value = initial_value.into();
        self
    }

    pub fn context(mut self, context: Context) -> Self {
        self.context = context;
        self
    }
}
