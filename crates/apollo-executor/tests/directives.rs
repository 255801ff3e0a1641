use apollo_executor::ast;
use apollo_executor::directives::BuildNext;
use apollo_executor::directives::InputNext;
use apollo_executor::directives::OutputNext;
use apollo_executor::directives::ResolverNext;
use apollo_executor::directives::SchemaElement;
use apollo_executor::execution::serde_json_bytes::json;
use apollo_executor::execution::Undefined;
use apollo_executor::name;
use apollo_executor::schema::BuildError;
use apollo_executor::schema::CoercionError;
use apollo_executor::Context;
use apollo_executor::Directive;
use apollo_executor::Engine;
use apollo_executor::FieldError;
use apollo_executor::FieldResult;
use apollo_executor::JsonMap;
use apollo_executor::JsonValue;
use apollo_executor::Request;
use apollo_executor::ResolveParams;
use apollo_executor::Scalar;
use apollo_executor::Schema;
use apollo_executor::SchemaBuilder;
use futures::executor::block_on;
use futures::future::BoxFuture;
use pretty_assertions::assert_eq;

const SDL: &str = r#"
  directive @upper on FIELD
  directive @auth(role: String!) on FIELD_DEFINITION
  directive @trim on ARGUMENT_DEFINITION
  directive @describe(text: String!) on FIELD_DEFINITION

  scalar Cents

  type Query {
    echo(text: String @trim): String @describe(text: "Echoes its argument")
    secret: String @auth(role: "admin")
    price(amount: Cents): Cents
  }
"#;

/// Uppercases string values of the field it is applied to in a query
struct Upper;

impl Directive for Upper {
    fn on_pre_output_coercion<'a>(
        &'a self,
        _arguments: &'a JsonMap,
        value: JsonValue,
        next: OutputNext<'a>,
    ) -> BoxFuture<'a, FieldResult> {
        let value = match value.as_str() {
            Some(string) => string.to_uppercase().into(),
            None => value,
        };
        next.run(value)
    }
}

struct Role(&'static str);

struct Auth;

impl Directive for Auth {
    fn on_field_execution<'a>(
        &'a self,
        arguments: &'a JsonMap,
        params: ResolveParams<'a>,
        next: ResolverNext<'a>,
    ) -> BoxFuture<'a, FieldResult> {
        let required = arguments.get("role").and_then(|role| role.as_str());
        let role = params.context.get::<Role>().map(|role| role.0);
        if role.is_some() && role == required {
            next.run(params)
        } else {
            Box::pin(async {
                Err(FieldError::new("Forbidden").with_extension("code", "FORBIDDEN"))
            })
        }
    }
}

struct Trim;

impl Directive for Trim {
    fn on_post_input_coercion<'a>(
        &'a self,
        _arguments: &'a JsonMap,
        value: JsonValue,
        next: InputNext<'a>,
    ) -> BoxFuture<'a, FieldResult> {
        let value = match value.as_str() {
            Some(string) => string.trim().into(),
            None => value,
        };
        next.run(value)
    }
}

struct Describe;

impl Directive for Describe {
    fn on_build(
        &self,
        arguments: &JsonMap,
        mut element: SchemaElement<'_>,
        next: BuildNext<'_>,
    ) -> Result<(), String> {
        let text = arguments
            .get("text")
            .and_then(|text| text.as_str())
            .unwrap_or_default();
        if text.is_empty() {
            return Err("empty description".to_owned());
        }
        if let SchemaElement::Field(def) = &mut element {
            def.description = Some(text.to_owned())
        }
        next.run(element)
    }
}

/// An amount of money: an integer number of cents, written like `"$1.50"`
struct Cents;

fn parse_cents(text: &str) -> Option<i64> {
    let (dollars, cents) = text.strip_prefix('$')?.split_once('.')?;
    if cents.len() != 2 {
        return None;
    }
    Some(dollars.parse::<i64>().ok()? * 100 + cents.parse::<i64>().ok()?)
}

impl Scalar for Cents {
    fn coerce_output(&self, value: &JsonValue) -> Result<JsonValue, CoercionError> {
        match value.as_i64() {
            Some(cents) => Ok(format!("${}.{:02}", cents / 100, cents % 100).into()),
            None => Err(CoercionError::new(format!(
                "Cents cannot represent value: {value}"
            ))),
        }
    }

    fn coerce_input(&self, value: &JsonValue) -> Result<JsonValue, CoercionError> {
        match value.as_str().and_then(parse_cents) {
            Some(cents) => Ok(cents.into()),
            None => Err(CoercionError::new(format!(
                "Cents cannot represent value: {value}"
            ))),
        }
    }

    fn parse_literal(&self, value: &ast::Value) -> Result<JsonValue, Undefined> {
        match value {
            ast::Value::String(text) => parse_cents(text).map(Into::into).ok_or(Undefined),
            _ => Err(Undefined),
        }
    }
}

fn echo(params: ResolveParams<'_>) -> BoxFuture<'_, FieldResult> {
    Box::pin(async move { Ok(params.arguments.get("text").cloned().unwrap_or(JsonValue::Null)) })
}

fn secret(_params: ResolveParams<'_>) -> BoxFuture<'_, FieldResult> {
    Box::pin(async move { Ok("42".into()) })
}

fn price(params: ResolveParams<'_>) -> BoxFuture<'_, FieldResult> {
    Box::pin(async move {
        let amount = params
            .arguments
            .get("amount")
            .and_then(|amount| amount.as_i64())
            .unwrap_or_default();
        // Tax included
        Ok((amount + 25).into())
    })
}

fn builder(sdl: &str) -> SchemaBuilder {
    Schema::builder()
        .add_sdl(sdl, "schema.graphql")
        .resolver("Query.echo", echo)
        .resolver("Query.secret", secret)
        .resolver("Query.price", price)
        .scalar("Cents", Cents)
}

fn schema() -> Schema {
    builder(SDL)
        .directive("upper", Upper)
        .directive("auth", Auth)
        .directive("trim", Trim)
        .directive("describe", Describe)
        .build()
        .unwrap()
}

fn execute(engine: &Engine, request: Request) -> serde_json::Value {
    let response = block_on(engine.execute(request));
    serde_json::to_value(response).unwrap()
}

#[test]
fn query_directive_transforms_output() {
    let engine = Engine::new(schema());
    let query = r#"{ loud: echo(text: "hello") @upper quiet: echo(text: "hello") }"#;
    assert_eq!(
        execute(&engine, Request::new(query)),
        serde_json::json!({"data": {"loud": "HELLO", "quiet": "hello"}})
    );
}

#[test]
fn schema_directive_wraps_the_resolver() {
    let engine = Engine::new(schema());
    let request = Request::new("{ secret }").context(Context::new(Role("admin")));
    assert_eq!(
        execute(&engine, request),
        serde_json::json!({"data": {"secret": "42"}})
    );
    let request = Request::new("{ secret }").context(Context::new(Role("guest")));
    assert_eq!(
        execute(&engine, request),
        serde_json::json!({
            "errors": [{
                "message": "Forbidden",
                "path": ["secret"],
                "locations": [{"line": 1, "column": 3}],
                "extensions": {"code": "FORBIDDEN"}
            }],
            "data": {"secret": null}
        })
    );
    // No context at all
    let response = execute(&engine, Request::new("{ secret }"));
    assert_eq!(response["data"], serde_json::json!({"secret": null}));
}

#[test]
fn argument_directive_transforms_input() {
    let engine = Engine::new(schema());
    assert_eq!(
        execute(&engine, Request::new(r#"{ echo(text: "  padded ") }"#)),
        serde_json::json!({"data": {"echo": "padded"}})
    );
    let query = "query Q($text: String) { echo(text: $text) }";
    let variables = json!({"text": " from a variable "});
    let request = Request::new(query).variables(variables.as_object().unwrap().clone());
    assert_eq!(
        execute(&engine, request),
        serde_json::json!({"data": {"echo": "from a variable"}})
    );
}

#[test]
fn build_hook_edits_the_definition() {
    let schema = schema();
    let echo = schema.type_field("Query", "echo").unwrap();
    assert_eq!(echo.description.as_deref(), Some("Echoes its argument"));
    assert_eq!(echo.directives.len(), 1);
    assert_eq!(echo.directives[0].name, "describe");
}

#[test]
fn build_hook_errors_fail_the_build() {
    let sdl = SDL.replace("Echoes its argument", "");
    let errors = builder(&sdl)
        .directive("upper", Upper)
        .directive("auth", Auth)
        .directive("trim", Trim)
        .directive("describe", Describe)
        .build()
        .err()
        .unwrap();
    assert_eq!(
        errors.0,
        [BuildError::DirectiveBuild {
            referrer: "the field `Query.echo`".to_owned(),
            message: "empty description".to_owned(),
        }]
    );
}

#[test]
fn custom_directives_need_an_implementation() {
    let errors = builder(SDL)
        .directive("auth", Auth)
        .directive("trim", Trim)
        .directive("describe", Describe)
        .build()
        .err()
        .unwrap();
    assert!(errors
        .0
        .contains(&BuildError::MissingDirectiveImplementation { name: name!("upper") }));
}

#[test]
fn custom_scalar() {
    let engine = Engine::new(schema());
    assert_eq!(
        execute(&engine, Request::new(r#"{ price(amount: "$1.50") }"#)),
        serde_json::json!({"data": {"price": "$1.75"}})
    );

    let query = "query Q($amount: Cents) { price(amount: $amount) }";
    let variables = json!({"amount": "$2.00"});
    let request = Request::new(query).variables(variables.as_object().unwrap().clone());
    assert_eq!(
        execute(&engine, request),
        serde_json::json!({"data": {"price": "$2.25"}})
    );

    let variables = json!({"amount": "two dollars"});
    let request = Request::new(query).variables(variables.as_object().unwrap().clone());
    let response = execute(&engine, request);
    assert_eq!(
        response["errors"][0]["message"],
        "Variable < $amount > got invalid value < \"two dollars\" >; \
         Expected type < Cents >; Cents cannot represent value: \"two dollars\""
    );

    let response = execute(&engine, Request::new("{ price(amount: 150) }"));
    assert_eq!(
        response["errors"][0]["message"],
        "Expected type < Cents >, found < 150 >."
    );
    assert_eq!(response["errors"][0]["extensions"]["tag"], "values-of-correct-type");
}
