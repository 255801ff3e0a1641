use apollo_executor::Engine;
use apollo_executor::Request;
use apollo_executor::Schema;
use futures::executor::block_on;
use pretty_assertions::assert_eq;

const SDL: &str = r#"
  type Query {
    dog: Dog
    hidden: Hidden
  }

  "A dog"
  type Dog {
    name: String!
    nickname: String @deprecated(reason: "Use name")
    tricks(limit: Int = 3): [String]
    secret: String @nonIntrospectable
  }

  type Hidden @nonIntrospectable {
    a: Int
  }

  enum Color {
    RED
    BLUE @deprecated
  }
"#;

fn schema() -> Schema {
    Schema::builder()
        .add_sdl(SDL, "schema.graphql")
        .build()
        .unwrap()
}

fn execute(engine: &Engine, query: &str) -> serde_json::Value {
    let response = block_on(engine.execute(Request::new(query)));
    serde_json::to_value(response).unwrap()
}

#[test]
fn type_by_name() {
    let engine = Engine::new(schema());
    let query = r#"
      {
        __type(name: "Dog") {
          name
          kind
          description
          fields {
            name
            type { name kind ofType { name kind } }
          }
        }
      }
    "#;
    assert_eq!(
        execute(&engine, query),
        serde_json::json!({
            "data": {
                "__type": {
                    "name": "Dog",
                    "kind": "OBJECT",
                    "description": "A dog",
                    "fields": [
                        {
                            "name": "name",
                            "type": {
                                "name": null,
                                "kind": "NON_NULL",
                                "ofType": {"name": "String", "kind": "SCALAR"}
                            }
                        },
                        {
                            "name": "tricks",
                            "type": {
                                "name": null,
                                "kind": "LIST",
                                "ofType": {"name": "String", "kind": "SCALAR"}
                            }
                        }
                    ]
                }
            }
        })
    );
}

#[test]
fn deprecated_fields_on_request() {
    let engine = Engine::new(schema());
    let query = r#"
      {
        __type(name: "Dog") {
          fields(includeDeprecated: true) {
            name
            isDeprecated
            deprecationReason
            args { name defaultValue }
          }
        }
      }
    "#;
    assert_eq!(
        execute(&engine, query),
        serde_json::json!({
            "data": {
                "__type": {
                    "fields": [
                        {
                            "name": "name",
                            "isDeprecated": false,
                            "deprecationReason": null,
                            "args": []
                        },
                        {
                            "name": "nickname",
                            "isDeprecated": true,
                            "deprecationReason": "Use name",
                            "args": []
                        },
                        {
                            "name": "tricks",
                            "isDeprecated": false,
                            "deprecationReason": null,
                            "args": [{"name": "limit", "defaultValue": "3"}]
                        }
                    ]
                }
            }
        })
    );
}

#[test]
fn enum_values() {
    let engine = Engine::new(schema());
    assert_eq!(
        execute(&engine, r#"{ __type(name: "Color") { enumValues { name } } }"#),
        serde_json::json!({"data": {"__type": {"enumValues": [{"name": "RED"}]}}})
    );
    let query = r#"
      {
        __type(name: "Color") {
          enumValues(includeDeprecated: true) { name deprecationReason }
        }
      }
    "#;
    assert_eq!(
        execute(&engine, query),
        serde_json::json!({
            "data": {
                "__type": {
                    "enumValues": [
                        {"name": "RED", "deprecationReason": null},
                        {"name": "BLUE", "deprecationReason": "No longer supported"}
                    ]
                }
            }
        })
    );
}

#[test]
fn non_introspectable_types_are_hidden() {
    let engine = Engine::new(schema());
    assert_eq!(
        execute(&engine, r#"{ __type(name: "Hidden") { name } }"#),
        serde_json::json!({"data": {"__type": null}})
    );
    let response = execute(&engine, "{ __schema { types { name } } }");
    let names: Vec<_> = response["data"]["__schema"]["types"]
        .as_array()
        .unwrap()
        .iter()
        .map(|ty| ty["name"].as_str().unwrap())
        .collect();
    assert!(names.contains(&"Dog"));
    assert!(names.contains(&"__Type"));
    assert!(names.contains(&"String"));
    assert!(!names.contains(&"Hidden"));
}

#[test]
fn root_operation_types() {
    let engine = Engine::new(schema());
    assert_eq!(
        execute(
            &engine,
            "{ __schema { queryType { name } mutationType { name } subscriptionType { name } } }"
        ),
        serde_json::json!({
            "data": {
                "__schema": {
                    "queryType": {"name": "Query"},
                    "mutationType": null,
                    "subscriptionType": null
                }
            }
        })
    );
}

#[test]
fn introspection_can_be_disabled() {
    let engine = Engine::builder(schema()).introspection(false).build();
    assert_eq!(
        execute(&engine, "{ __schema { queryType { name } } }"),
        serde_json::json!({
            "errors": [{
                "message": "Introspection is disabled.",
                "path": ["__schema"],
                "locations": [{"line": 1, "column": 3}]
            }],
            "data": null
        })
    );
    assert_eq!(
        execute(&engine, r#"{ __type(name: "Dog") { name } }"#),
        serde_json::json!({
            "errors": [{
                "message": "Introspection is disabled.",
                "path": ["__type"],
                "locations": [{"line": 1, "column": 3}]
            }],
            "data": {"__type": null}
        })
    );
    assert_eq!(
        execute(&engine, "{ __typename }"),
        serde_json::json!({"data": {"__typename": "Query"}})
    );
}

#[test]
fn directive_definitions() {
    let engine = Engine::new(schema());
    let response = execute(
        &engine,
        "{ __schema { directives { name locations args { name } isRepeatable } } }",
    );
    let directives = response["data"]["__schema"]["directives"]
        .as_array()
        .unwrap();
    let mut names: Vec<_> = directives
        .iter()
        .map(|directive| directive["name"].as_str().unwrap())
        .collect();
    names.sort_unstable();
    assert_eq!(
        names,
        ["deprecated", "include", "nonIntrospectable", "skip", "specifiedBy"]
    );
    let skip = directives
        .iter()
        .find(|directive| directive["name"] == "skip")
        .unwrap();
    assert_eq!(
        skip,
        &serde_json::json!({
            "name": "skip",
            "locations": ["FIELD", "FRAGMENT_SPREAD", "INLINE_FRAGMENT"],
            "args": [{"name": "if"}],
            "isRepeatable": false
        })
    );
}
