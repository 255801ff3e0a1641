use apollo_executor::execution::serde_json_bytes::json;
use apollo_executor::Engine;
use apollo_executor::FieldResult;
use apollo_executor::JsonValue;
use apollo_executor::Request;
use apollo_executor::ResolveParams;
use apollo_executor::Schema;
use futures::executor::block_on;
use futures::future::BoxFuture;
use pretty_assertions::assert_eq;

const SDL: &str = r#"
  type Query {
    flag(param: Boolean): String
    list(values: [Int!]): [Int]
    nested(values: [[Int]]): [[Int]]
    search(filter: Filter): SearchResult
    color(color: Color = GREEN): Color
  }

  type SearchResult {
    name: String
    limit: Int
    colors: [Color]
  }

  input Filter {
    name: String!
    limit: Int = 10
    colors: [Color!]
  }

  enum Color { RED GREEN BLUE }
"#;

/// Returns the value of its first argument
fn echo(params: ResolveParams<'_>) -> BoxFuture<'_, FieldResult> {
    Box::pin(async move {
        let value = params
            .arguments
            .values()
            .next()
            .cloned()
            .unwrap_or(JsonValue::Null);
        Ok(value)
    })
}

fn flag(params: ResolveParams<'_>) -> BoxFuture<'_, FieldResult> {
    Box::pin(async move {
        let description = match params.arguments.get("param") {
            None => "absent".to_owned(),
            Some(value) => value.to_string(),
        };
        Ok(description.into())
    })
}

fn engine() -> Engine {
    let schema = Schema::builder()
        .add_sdl(SDL, "schema.graphql")
        .resolver("Query.flag", flag)
        .resolver("Query.list", echo)
        .resolver("Query.nested", echo)
        .resolver("Query.search", echo)
        .resolver("Query.color", echo)
        .build()
        .unwrap();
    Engine::new(schema)
}

fn execute(engine: &Engine, query: &str, variables: JsonValue) -> serde_json::Value {
    let variables = variables.as_object().cloned().unwrap_or_default();
    let response = block_on(engine.execute(Request::new(query).variables(variables)));
    serde_json::to_value(response).unwrap()
}

#[test]
fn missing_required_variable() {
    let engine = engine();
    let query = "query Q($param: Boolean!) { flag(param: $param) }";
    assert_eq!(
        execute(&engine, query, json!({})),
        serde_json::json!({
            "errors": [{
                "message": "Variable < $param > of required type < Boolean! > was not provided.",
                "path": null,
                "locations": [{"line": 1, "column": 9}]
            }],
            "data": null
        })
    );
}

#[test]
fn null_variable_for_non_null_type() {
    let engine = engine();
    let query = "query Q($param: Boolean!) { flag(param: $param) }";
    let response = execute(&engine, query, json!({"param": null}));
    assert_eq!(
        response["errors"][0]["message"],
        "Variable < $param > of non-null type < Boolean! > must not be null."
    );
    assert_eq!(response["data"], serde_json::Value::Null);
}

#[test]
fn nullable_variable_not_provided() {
    let engine = engine();
    let query = "query Q($param: Boolean) { flag(param: $param) }";
    // Not provided: the argument is absent, not null
    assert_eq!(
        execute(&engine, query, json!({})),
        serde_json::json!({"data": {"flag": "absent"}})
    );
    assert_eq!(
        execute(&engine, query, json!({"param": null})),
        serde_json::json!({"data": {"flag": "null"}})
    );
}

#[test]
fn null_item_in_non_null_list_variable() {
    let engine = engine();
    let query = "query Q($values: [Int!]) { list(values: $values) }";
    let response = execute(&engine, query, json!({"values": [20, null]}));
    assert_eq!(
        response,
        serde_json::json!({
            "errors": [{
                "message": "Variable < $values > got invalid value < [20,null] >; \
                            Expected non-nullable type < Int! > not to be null at value[1].",
                "path": null,
                "locations": [{"line": 1, "column": 9}]
            }],
            "data": null
        })
    );
}

#[test]
fn null_item_in_non_null_list_literal() {
    let engine = engine();
    let response = execute(&engine, "{ list(values: [20, null]) }", json!({}));
    assert_eq!(
        response["errors"][0]["message"],
        "Expected type < Int! >, found < null >."
    );
    assert_eq!(response["errors"][0]["path"], serde_json::json!(["list"]));
    assert_eq!(response["data"], serde_json::Value::Null);
}

#[test]
fn single_value_for_a_list() {
    let engine = engine();
    assert_eq!(
        execute(&engine, "{ list(values: 10) }", json!({})),
        serde_json::json!({"data": {"list": [10]}})
    );
    let query = "query Q($values: [Int!]) { list(values: $values) }";
    assert_eq!(
        execute(&engine, query, json!({"values": 10})),
        serde_json::json!({"data": {"list": [10]}})
    );
    assert_eq!(
        execute(&engine, "{ nested(values: [1, null]) }", json!({})),
        serde_json::json!({"data": {"nested": [[1], null]}})
    );
}

#[test]
fn variables_inside_list_literals() {
    let engine = engine();
    let query = "query Q($a: Int, $b: Int) { nested(values: [[$a, $b]]) }";
    // A nullable item bound to a variable that is not provided becomes null
    assert_eq!(
        execute(&engine, query, json!({"a": 1})),
        serde_json::json!({"data": {"nested": [[1, null]]}})
    );
}

#[test]
fn input_objects() {
    let engine = engine();
    assert_eq!(
        execute(
            &engine,
            r#"{ search(filter: {name: "a", colors: RED}) { name limit colors } }"#,
            json!({})
        ),
        serde_json::json!({
            "data": {"search": {"name": "a", "limit": 10, "colors": ["RED"]}}
        })
    );
    let query = "query Q($filter: Filter) { search(filter: $filter) { name limit } }";
    assert_eq!(
        execute(&engine, query, json!({"filter": {"name": "b", "limit": null}})),
        serde_json::json!({"data": {"search": {"name": "b", "limit": null}}})
    );
    let response = execute(&engine, query, json!({"filter": {"limit": 1}}));
    assert_eq!(
        response["errors"][0]["message"],
        "Variable < $filter > got invalid value < {\"limit\":1} >; \
         Field < name > of required type < String! > was not provided."
    );
    let response = execute(&engine, query, json!({"filter": {"name": "c", "other": 1}}));
    assert_eq!(
        response["errors"][0]["message"],
        "Variable < $filter > got invalid value < {\"name\":\"c\",\"other\":1} >; \
         Field < other > is not defined by type < Filter >."
    );
}

#[test]
fn enums() {
    let engine = engine();
    assert_eq!(
        execute(&engine, "{ color }", json!({})),
        serde_json::json!({"data": {"color": "GREEN"}})
    );
    assert_eq!(
        execute(&engine, "{ color(color: BLUE) }", json!({})),
        serde_json::json!({"data": {"color": "BLUE"}})
    );
    let query = "query Q($color: Color) { color(color: $color) }";
    let response = execute(&engine, query, json!({"color": "PURPLE"}));
    assert_eq!(
        response["errors"][0]["message"],
        "Variable < $color > got invalid value < \"PURPLE\" >; Expected type < Color >."
    );
}

#[test]
fn invalid_scalar_variable() {
    let engine = engine();
    let query = "query Q($values: [Int!]) { list(values: $values) }";
    let response = execute(&engine, query, json!({"values": [1, "two"]}));
    assert_eq!(
        response["errors"][0]["message"],
        "Variable < $values > got invalid value < [1,\"two\"] >; \
         Expected type < Int > at value[1]; Int cannot represent non-integer value: \"two\""
    );
}
