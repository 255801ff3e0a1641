use apollo_executor::execution::serde_json_bytes::json;
use apollo_executor::Engine;
use apollo_executor::FieldError;
use apollo_executor::FieldResult;
use apollo_executor::Request;
use apollo_executor::ResolveParams;
use apollo_executor::Schema;
use futures::executor::block_on;
use futures::future::BoxFuture;
use pretty_assertions::assert_eq;

const SDL: &str = r#"
  type Query {
    person: Person
    people: [Person!]
    maybePeople: [Person]
    required: String!
    failing: String!
    count: Int
  }

  type Person {
    name: String!
    age: Int
  }
"#;

fn person(_params: ResolveParams<'_>) -> BoxFuture<'_, FieldResult> {
    Box::pin(async move { Ok(json!({"name": null, "age": 3})) })
}

fn people(_params: ResolveParams<'_>) -> BoxFuture<'_, FieldResult> {
    Box::pin(async move { Ok(json!([{"name": "Ada"}, {"name": null}, {"name": "Bob"}])) })
}

fn failing(_params: ResolveParams<'_>) -> BoxFuture<'_, FieldResult> {
    Box::pin(async move { Err(FieldError::new("Cannot compute")) })
}

fn count(_params: ResolveParams<'_>) -> BoxFuture<'_, FieldResult> {
    Box::pin(async move { Ok(json!("many")) })
}

fn engine() -> Engine {
    let schema = Schema::builder()
        .add_sdl(SDL, "schema.graphql")
        .resolver("Query.person", person)
        .resolver("Query.people", people)
        .resolver("Query.maybePeople", people)
        .resolver("Query.failing", failing)
        .resolver("Query.count", count)
        .build()
        .unwrap();
    Engine::new(schema)
}

fn execute(query: &str) -> serde_json::Value {
    let response = block_on(engine().execute(Request::new(query)));
    serde_json::to_value(response).unwrap()
}

#[test]
fn null_in_non_null_field_nulls_the_parent() {
    assert_eq!(
        execute("{ person { name age } count }"),
        serde_json::json!({
            "errors": [
                {
                    "message": "Cannot return null for non-nullable field Person.name.",
                    "path": ["person", "name"],
                    "locations": [{"line": 1, "column": 12}]
                },
                {
                    "message": "Int cannot represent non-integer value: \"many\"",
                    "path": ["count"],
                    "locations": [{"line": 1, "column": 23}]
                }
            ],
            "data": {"person": null, "count": null}
        })
    );
}

#[test]
fn null_in_non_null_list_item_nulls_the_list() {
    assert_eq!(
        execute("{ people { name } }"),
        serde_json::json!({
            "errors": [{
                "message": "Cannot return null for non-nullable field Person.name.",
                "path": ["people", 1, "name"],
                "locations": [{"line": 1, "column": 12}]
            }],
            "data": {"people": null}
        })
    );
}

#[test]
fn null_in_nullable_list_item_nulls_the_item() {
    assert_eq!(
        execute("{ maybePeople { name } }"),
        serde_json::json!({
            "errors": [{
                "message": "Cannot return null for non-nullable field Person.name.",
                "path": ["maybePeople", 1, "name"],
                "locations": [{"line": 1, "column": 17}]
            }],
            "data": {"maybePeople": [{"name": "Ada"}, null, {"name": "Bob"}]}
        })
    );
}

#[test]
fn null_at_the_root() {
    let response = block_on(engine().execute(Request::new("{ required person { age } }")));
    assert_eq!(response.data, None);
    assert_eq!(response.errors.len(), 1);
    assert_eq!(
        response.errors[0].message,
        "Cannot return null for non-nullable field Query.required."
    );
}

#[test]
fn resolver_error_in_non_null_field() {
    // Exactly one error: the propagated null does not add any
    assert_eq!(
        execute("{ failing }"),
        serde_json::json!({
            "errors": [{
                "message": "Cannot compute",
                "path": ["failing"],
                "locations": [{"line": 1, "column": 3}]
            }],
            "data": null
        })
    );
}
