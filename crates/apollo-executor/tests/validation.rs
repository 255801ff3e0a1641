use apollo_executor::Parser;
use apollo_executor::Schema;
use apollo_executor::Validator;
use expect_test::expect;
use pretty_assertions::assert_eq;

const SDL: &str = r#"
  type Query {
    dog: Dog
    pets: [Pet]
    search(term: String!, limit: Int = 10): [Pet]
    find(filter: Filter): [Pet]
    count(min: Int! = 0): Int
    color: Color
  }

  type Mutation {
    adopt(name: String!): Dog
  }

  type Subscription {
    newDog: Dog
    newCat: Cat
  }

  interface Pet {
    name: String
  }

  type Dog implements Pet {
    name: String
    barks: Boolean
    owner: Human
    nickname(short: Boolean): String
  }

  type Cat implements Pet {
    name: String
    meows: Boolean
  }

  type Human {
    name: String
  }

  input Filter {
    name: String!
    age: Int
  }

  enum Color { RED GREEN }
"#;

fn schema() -> Schema {
    Schema::builder()
        .add_sdl(SDL, "schema.graphql")
        .build()
        .unwrap()
}

/// One `tag: message` line per error
fn validate(query: &str) -> String {
    let document = Parser::new().parse_ast(query, "query.graphql").unwrap();
    match Validator::new().validate(&schema(), &document) {
        Ok(()) => String::new(),
        Err(errors) => errors
            .errors
            .iter()
            .map(|error| format!("{}: {}\n", error.tag, error.message))
            .collect(),
    }
}

#[test]
fn valid_document() {
    let query = r#"
      query Q($term: String!, $short: Boolean) {
        dog { name nickname(short: $short) ...dogFields }
        search(term: $term) { name ... on Cat { meows } }
        count
      }

      fragment dogFields on Dog { barks owner { name } }
    "#;
    expect![[""]].assert_eq(&validate(query));
}

#[test]
fn default_rules() {
    let validator = Validator::new();
    assert_eq!(validator.rules().len(), 29);
    assert_eq!(validator.rules()[0].tag(), "executable-definitions");
    assert_eq!(validator.rules()[0].section(), "5.1.1");
    assert_eq!(
        validator.rules()[28].details(),
        "https://spec.graphql.org/June2018/#sec-All-Variable-Usages-are-Allowed"
    );
}

#[test]
fn executable_definitions_abort() {
    // The unknown field is not reported: validation stops after this rule
    let query = "{ dog { unknown } } type Extra { a: Int }";
    expect![[r#"
        executable-definitions: Definition < Extra > of kind < ObjectTypeDefinition > is not executable.
    "#]]
    .assert_eq(&validate(query));
}

#[test]
fn field_selections() {
    let query = "{ dog { name unknown } pets { barks } }";
    expect![[r#"
        field-selections: Field < unknown > doesn't exist on < Dog >.
        field-selections: Field < barks > doesn't exist on < Pet >.
    "#]]
    .assert_eq(&validate(query));
}

#[test]
fn leaf_field_selections() {
    let query = "{ dog color { name } }";
    expect![[r#"
        leaf-field-selections: Field < dog > of type < Dog > must have a selection of subfields.
        leaf-field-selections: Field < color > must not have a selection since type < Color > has no subfields.
    "#]]
    .assert_eq(&validate(query));
}

#[test]
fn field_selection_merging() {
    let query = r#"
      {
        dog {
          name: barks
          name
          nickname(short: true)
          nickname(short: false)
        }
      }
    "#;
    expect![[r#"
        field-selection-merging: Fields < name > conflict because < barks > and < name > are different fields. Use different aliases on the fields to fetch both if this was intentional.
        field-selection-merging: Fields < nickname > conflict because they have differing arguments. Use different aliases on the fields to fetch both if this was intentional.
    "#]]
    .assert_eq(&validate(query));
}

#[test]
fn fields_of_different_object_types_may_share_a_key() {
    let query = r#"
      {
        pets {
          ... on Dog { sound: barks }
          ... on Cat { sound: meows }
        }
      }
    "#;
    expect![[""]].assert_eq(&validate(query));
}

#[test]
fn arguments() {
    let query = r#"
      {
        dog { nickname(short: true, short: false, long: 1) }
        search { name }
        count
      }
    "#;
    expect![[r#"
        argument-names: Provided Argument < long > doesn't exist on field < Dog.nickname >.
        argument-uniqueness: Can't have multiple arguments named < short >.
        required-arguments: Missing mandatory argument < term > in field < Query.search >.
    "#]]
    .assert_eq(&validate(query));
}

#[test]
fn unused_and_undefined_fragments() {
    let query = r#"
      { dog { ...missing } }
      fragment unused on Dog { name }
    "#;
    expect![[r#"
        fragment-must-be-used: Fragment < unused > is never used.
        fragment-spread-target-defined: Unknown fragment < missing >.
    "#]]
    .assert_eq(&validate(query));
}

#[test]
fn fragment_type_conditions() {
    let query = r#"
      { dog { ... on Unknown { name } ...colorFields } }
      fragment colorFields on Color { name }
    "#;
    expect![[r#"
        fragment-spread-type-existence: Unknown type < Unknown >.
        fragments-on-composite-types: Fragment < colorFields > cannot condition on non composite type < Color >.
    "#]]
    .assert_eq(&validate(query));
}

#[test]
fn fragment_cycles_abort() {
    // The unknown directive is not reported: validation stops after the cycle
    let query = r#"
      { dog { ...a } }
      fragment a on Dog { ...b }
      fragment b on Dog { ...a @unknown }
    "#;
    expect![[r#"
        fragment-spreads-must-not-form-cycles: Cannot spread fragment < a > within itself via < b >.
    "#]]
    .assert_eq(&validate(query));
}

#[test]
fn impossible_fragment_spreads() {
    let query = r#"
      { dog { ...catFields ... on Cat { meows } } }
      fragment catFields on Cat { meows }
    "#;
    expect![[r#"
        fragment-spread-is-possible: Fragment < catFields > cannot be spread here as objects of type < Dog > can never be of type < Cat >.
        fragment-spread-is-possible: Fragment cannot be spread here as objects of type < Dog > can never be of type < Cat >.
    "#]]
    .assert_eq(&validate(query));
}

#[test]
fn values() {
    let query = r#"
      {
        search(term: 1) { name }
        find(filter: {age: 2, color: RED}) { name }
        other: find(filter: {name: "a", name: "b"}) { name }
        count(min: null)
      }
    "#;
    expect![[r#"
        values-of-correct-type: Expected type < String! >, found < 1 >.
        values-of-correct-type: Expected type < Int! >, found < null >.
        input-object-field-names: Field < color > is not defined by type < Filter >.
        input-object-field-uniqueness: There can be only one input field named < name >.
        input-object-required-fields: Input field < Filter.name > of type < String! > is required, but it was not provided.
    "#]]
    .assert_eq(&validate(query));
}

#[test]
fn directives() {
    let query = r#"
      query Q @skip(if: true) {
        dog @unknown { name @include(if: true) @include(if: false) }
      }
    "#;
    expect![[r#"
        directives-are-defined: Unknown directive < @unknown >.
        directives-are-in-valid-locations: Directive < @skip > is not used in a valid location: < QUERY >.
        directives-are-unique-per-location: Can't use < @include > multiple times at the same location.
    "#]]
    .assert_eq(&validate(query));
}

#[test]
fn variables() {
    let query = r#"
      query Q($a: Int, $a: Int, $dog: Dog, $unused: String, $limit: String) {
        search(term: "x", limit: $limit) { name }
        count(min: $b)
        dog { nickname(short: $a) }
      }
    "#;
    expect![[r#"
        variable-uniqueness: Can't have multiple variables named < $a >.
        variables-are-input-types: Variable < $dog > cannot be non input type < Dog >.
        all-variable-uses-defined: Variable < $b > is not defined by operation < Q >.
        all-variables-used: Variable < $dog > is never used in operation < Q >.
        all-variables-used: Variable < $unused > is never used in operation < Q >.
        all-variable-usages-are-allowed: Variable < $limit > of type < String > used in position expecting type < Int >.
        all-variable-usages-are-allowed: Variable < $a > of type < Int > used in position expecting type < Boolean >.
    "#]]
    .assert_eq(&validate(query));
}

#[test]
fn variables_used_through_fragments() {
    let query = r#"
      query Q($short: Boolean) { dog { ...nick } }
      query R { dog { ...nick } }
      fragment nick on Dog { nickname(short: $short) }
    "#;
    expect![[r#"
        all-variable-uses-defined: Variable < $short > is not defined by operation < R >.
    "#]]
    .assert_eq(&validate(query));
}

#[test]
fn nullable_variables_in_non_null_positions() {
    // Allowed when either the variable or the argument has a default value
    let query = r#"
      query Q($min: Int, $term: String = "dog") {
        count(min: $min)
        search(term: $term) { name }
      }
    "#;
    expect![[""]].assert_eq(&validate(query));

    let query = "query Q($term: String) { search(term: $term) { name } }";
    expect![[r#"
        all-variable-usages-are-allowed: Variable < $term > of type < String > used in position expecting type < String! >.
    "#]]
    .assert_eq(&validate(query));
}

#[test]
fn operations() {
    let query = r#"
      query A { dog { name } }
      query A { pets { name } }
      { color }
    "#;
    expect![[r#"
        operation-name-uniqueness: Can't have multiple operations named < A >.
        lone-anonymous-operation: Anonymous operation must be the only defined operation.
    "#]]
    .assert_eq(&validate(query));
}

#[test]
fn subscriptions_select_a_single_root_field() {
    let query = "subscription S { newDog { name } newCat { name } }";
    expect![[r#"
        single-root-field: Subscription < S > must select only one top level field.
    "#]]
    .assert_eq(&validate(query));

    let query = r#"
      subscription { ...both }
      fragment both on Subscription { newDog { name } newCat { name } }
    "#;
    expect![[r#"
        single-root-field: Anonymous Subscription must select only one top level field.
    "#]]
    .assert_eq(&validate(query));
}

#[test]
fn validation_is_repeatable() {
    let schema = schema();
    let document = Parser::new()
        .parse_ast("{ dog { unknown } search { name } }", "query.graphql")
        .unwrap();
    let validator = Validator::new();
    let first = validator.validate(&schema, &document).unwrap_err();
    let second = validator.validate(&schema, &document).unwrap_err();
    assert_eq!(first, second);
    assert_eq!(first.errors.len(), 2);
    assert_eq!(first.errors[0].path.as_deref().map(|path| path.len()), Some(2));
    assert_eq!(first.errors[1].rule, "5.4.2.1");
}
