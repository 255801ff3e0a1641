use apollo_executor::execution::serde_json_bytes::json;
use apollo_executor::Engine;
use apollo_executor::FieldResult;
use apollo_executor::Name;
use apollo_executor::Request;
use apollo_executor::ResolveParams;
use apollo_executor::Schema;
use futures::executor::block_on;
use futures::future::BoxFuture;
use pretty_assertions::assert_eq;

const SDL: &str = r#"
  type Query {
    pets: [Pet]
    animals: [Animal]
    wrong: Pet
    untyped: Pet
  }

  interface Pet {
    name: String
  }

  type Dog implements Pet {
    name: String
    barks: Boolean
  }

  type Cat implements Pet {
    name: String
    meows: Boolean
  }

  type Human {
    name: String
  }

  union Animal = Dog | Cat
"#;

fn pets(_params: ResolveParams<'_>) -> BoxFuture<'_, FieldResult> {
    Box::pin(async move {
        Ok(json!([
            {"__typename": "Dog", "name": "Rex", "barks": true},
            {"__typename": "Cat", "name": "Tom", "meows": false}
        ]))
    })
}

fn animals(_params: ResolveParams<'_>) -> BoxFuture<'_, FieldResult> {
    Box::pin(async move {
        Ok(json!([
            {"name": "Rex", "barks": true},
            {"name": "Tom", "meows": false}
        ]))
    })
}

fn wrong(_params: ResolveParams<'_>) -> BoxFuture<'_, FieldResult> {
    Box::pin(async move { Ok(json!({"__typename": "Human", "name": "Ada"})) })
}

fn untyped(_params: ResolveParams<'_>) -> BoxFuture<'_, FieldResult> {
    Box::pin(async move { Ok(json!({"name": "Ada"})) })
}

fn engine() -> Engine {
    let schema = Schema::builder()
        .add_sdl(SDL, "schema.graphql")
        .resolver("Query.pets", pets)
        .resolver("Query.animals", animals)
        .resolver("Query.wrong", wrong)
        .resolver("Query.untyped", untyped)
        .type_resolver("Animal", |value, _info| {
            let object = value.as_object()?;
            let type_name = if object.contains_key("barks") {
                "Dog"
            } else {
                "Cat"
            };
            Name::new(type_name).ok()
        })
        .build()
        .unwrap();
    Engine::new(schema)
}

fn execute(query: &str) -> serde_json::Value {
    let response = block_on(engine().execute(Request::new(query)));
    serde_json::to_value(response).unwrap()
}

#[test]
fn interface_resolved_from_typename() {
    let query = r#"
      {
        pets {
          name
          __typename
          ... on Dog { barks }
          ... on Cat { meows }
        }
      }
    "#;
    assert_eq!(
        execute(query),
        serde_json::json!({
            "data": {
                "pets": [
                    {"name": "Rex", "__typename": "Dog", "barks": true},
                    {"name": "Tom", "__typename": "Cat", "meows": false}
                ]
            }
        })
    );
}

#[test]
fn union_resolved_by_type_resolver() {
    let query = r#"
      {
        animals {
          __typename
          ... on Pet { name }
          ... dogFields
        }
      }
      fragment dogFields on Dog { barks }
    "#;
    assert_eq!(
        execute(query),
        serde_json::json!({
            "data": {
                "animals": [
                    {"__typename": "Dog", "name": "Rex", "barks": true},
                    {"__typename": "Cat", "name": "Tom"}
                ]
            }
        })
    );
}

#[test]
fn runtime_type_must_be_possible() {
    assert_eq!(
        execute("{ wrong { name } }"),
        serde_json::json!({
            "errors": [{
                "message": "Runtime Object type < Human > is not a possible type for < Pet >.",
                "path": ["wrong"],
                "locations": [{"line": 1, "column": 3}]
            }],
            "data": {"wrong": null}
        })
    );
}

#[test]
fn runtime_type_must_be_found() {
    assert_eq!(
        execute("{ untyped { name } }"),
        serde_json::json!({
            "errors": [{
                "message": "Abstract type < Pet > must resolve to an Object type at runtime \
                            for field < Query.untyped >.",
                "path": ["untyped"],
                "locations": [{"line": 1, "column": 3}]
            }],
            "data": {"untyped": null}
        })
    );
}
