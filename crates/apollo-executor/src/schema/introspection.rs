//! Resolvers of the introspection meta-schema.
//!
//! A `__Type` value is a small JSON object pointing into the [`Schema`]:
//! `{"name": "Dog"}` for a named type,
//! `{"kind": "LIST", "ofType": …}` or `{"kind": "NON_NULL", "ofType": …}` for wrappers.
//! Fields of `__Type` and `__Schema` are computed from the schema on demand.
//! Other introspection objects are built eagerly and read by the default resolver.

use super::*;
use crate::directives::Introspected;
use crate::execution::FieldError;
use crate::execution::FieldResult;
use crate::execution::JsonMap;
use crate::execution::JsonValue;
use crate::execution::ResolveParams;
use crate::name;
use futures::future::BoxFuture;

/// Resolves every field of a meta type, dispatching on the field name
struct MetaObject(fn(&ResolveParams<'_>) -> FieldResult);

impl Resolver for MetaObject {
    fn resolve<'a>(&'a self, params: ResolveParams<'a>) -> BoxFuture<'a, FieldResult> {
        Box::pin(futures::future::ready((self.0)(&params)))
    }
}

const SCHEMA_FIELDS: [&str; 6] = [
    "description",
    "types",
    "queryType",
    "mutationType",
    "subscriptionType",
    "directives",
];

const TYPE_FIELDS: [&str; 10] = [
    "kind",
    "name",
    "description",
    "fields",
    "interfaces",
    "possibleTypes",
    "enumValues",
    "inputFields",
    "ofType",
    "specifiedByURL",
];

pub(crate) fn meta_fields() -> MetaFieldDefinitions {
    let string = name!("String");
    MetaFieldDefinitions {
        typename: meta_field(
            name!("__typename"),
            Type::NonNullNamed(string.clone()),
            Vec::new(),
            typename_meta_field,
        ),
        schema: meta_field(
            name!("__schema"),
            Type::NonNullNamed(name!("__Schema")),
            Vec::new(),
            schema_meta_field,
        ),
        type_: meta_field(
            name!("__type"),
            Type::Named(name!("__Type")),
            vec![Node::new(InputValueDefinition {
                description: None,
                name: name!("name"),
                ty: Node::new(Type::NonNullNamed(string)),
                default_value: None,
                directives: Vec::new(),
                deprecation_reason: None,
            })],
            type_meta_field,
        ),
    }
}

fn meta_field(
    name: Name,
    ty: Type,
    arguments: Vec<Node<InputValueDefinition>>,
    resolve: fn(&ResolveParams<'_>) -> FieldResult,
) -> Node<FieldDefinition> {
    let coercer = OutputCoercer::for_type(&ty, &|name| name == "__Schema" || name == "__Type");
    Node::new(FieldDefinition {
        description: None,
        name,
        arguments,
        ty,
        directives: Vec::new(),
        deprecation_reason: None,
        resolver: Arc::new(MetaObject(resolve)),
        coercer,
    })
}

/// Resolvers for the fields of `__Schema` and `__Type`, by coordinate
pub(crate) fn resolvers() -> Vec<(String, Arc<dyn Resolver>)> {
    let schema: Arc<dyn Resolver> = Arc::new(MetaObject(schema_object_field));
    let ty: Arc<dyn Resolver> = Arc::new(MetaObject(type_object_field));
    SCHEMA_FIELDS
        .iter()
        .map(|field| (format!("__Schema.{field}"), schema.clone()))
        .chain(
            TYPE_FIELDS
                .iter()
                .map(|field| (format!("__Type.{field}"), ty.clone())),
        )
        .collect()
}

fn typename_meta_field(params: &ResolveParams<'_>) -> FieldResult {
    Ok(params.info.parent_type().as_str().into())
}

fn check_enabled(params: &ResolveParams<'_>) -> Result<(), FieldError> {
    if params.info.introspection {
        Ok(())
    } else {
        Err(FieldError::new("Introspection is disabled."))
    }
}

fn schema_meta_field(params: &ResolveParams<'_>) -> FieldResult {
    check_enabled(params)?;
    Ok(JsonValue::Object(JsonMap::new()))
}

fn type_meta_field(params: &ResolveParams<'_>) -> FieldResult {
    check_enabled(params)?;
    let schema = params.info.schema();
    let visible = params
        .arguments
        .get("name")
        .and_then(|name| name.as_str())
        .and_then(|name| schema.types.get(name))
        .filter(|ty| Introspected::Type(ty).is_visible());
    Ok(match visible {
        Some(ty) => named_type(ty.name()),
        None => JsonValue::Null,
    })
}

fn schema_object_field(params: &ResolveParams<'_>) -> FieldResult {
    let schema = params.info.schema();
    Ok(match params.info.field_name().as_str() {
        "description" => optional_string(schema.description.as_deref()),
        "types" => JsonValue::Array(
            schema
                .types
                .values()
                .filter(|ty| Introspected::Type(ty).is_visible())
                .map(|ty| named_type(ty.name()))
                .collect(),
        ),
        "queryType" => named_type(&schema.query_type),
        "mutationType" => schema
            .mutation_type
            .as_ref()
            .map_or(JsonValue::Null, named_type),
        "subscriptionType" => schema
            .subscription_type
            .as_ref()
            .map_or(JsonValue::Null, named_type),
        "directives" => JsonValue::Array(
            schema
                .directive_definitions
                .values()
                .map(|def| directive(def))
                .collect(),
        ),
        _ => JsonValue::Null,
    })
}

fn type_object_field(params: &ResolveParams<'_>) -> FieldResult {
    let schema = params.info.schema();
    let field_name = params.info.field_name().as_str();
    let parent = params.parent.as_object();
    if let Some(kind) = parent.and_then(|parent| parent.get("kind")) {
        // A list or non-null wrapper
        return Ok(match field_name {
            "kind" => kind.clone(),
            "ofType" => parent
                .and_then(|parent| parent.get("ofType"))
                .cloned()
                .unwrap_or(JsonValue::Null),
            _ => JsonValue::Null,
        });
    }
    let Some(def) = parent
        .and_then(|parent| parent.get("name"))
        .and_then(|name| name.as_str())
        .and_then(|name| schema.types.get(name))
    else {
        return Ok(JsonValue::Null);
    };
    let include_deprecated = params
        .arguments
        .get("includeDeprecated")
        .and_then(|value| value.as_bool())
        .unwrap_or(false);
    let types = |names: &mut dyn Iterator<Item = &Name>| {
        JsonValue::Array(
            names
                .filter(|name| {
                    schema
                        .types
                        .get(*name)
                        .is_some_and(|ty| Introspected::Type(ty).is_visible())
                })
                .map(named_type)
                .collect(),
        )
    };
    Ok(match field_name {
        "kind" => def.kind().into(),
        "name" => def.name().as_str().into(),
        "description" => optional_string(def.description()),
        "fields" => {
            let fields = match def {
                ExtendedType::Object(def) => &def.fields,
                ExtendedType::Interface(def) => &def.fields,
                _ => return Ok(JsonValue::Null),
            };
            JsonValue::Array(
                fields
                    .values()
                    .filter(|def| include_deprecated || !def.is_deprecated())
                    .filter(|def| Introspected::Field(def).is_visible())
                    .map(|def| field(def))
                    .collect(),
            )
        }
        "interfaces" => match def {
            ExtendedType::Object(def) => types(&mut def.implements_interfaces.iter()),
            ExtendedType::Interface(def) => types(&mut def.implements_interfaces.iter()),
            _ => JsonValue::Null,
        },
        "possibleTypes" if def.is_abstract() => {
            types(&mut schema.possible_types(def.name()).into_iter())
        }
        "enumValues" => match def {
            ExtendedType::Enum(def) => JsonValue::Array(
                def.values
                    .values()
                    .filter(|def| include_deprecated || def.deprecation_reason.is_none())
                    .filter(|def| Introspected::EnumValue(def).is_visible())
                    .map(|def| enum_value(def))
                    .collect(),
            ),
            _ => JsonValue::Null,
        },
        "inputFields" => match def {
            ExtendedType::InputObject(def) => JsonValue::Array(
                def.fields
                    .values()
                    .filter(|def| Introspected::InputField(def).is_visible())
                    .map(|def| input_value(def))
                    .collect(),
            ),
            _ => JsonValue::Null,
        },
        "specifiedByURL" => match def {
            ExtendedType::Scalar(def) => optional_string(def.specified_by_url.as_deref()),
            _ => JsonValue::Null,
        },
        _ => JsonValue::Null,
    })
}

fn object<const N: usize>(entries: [(&str, JsonValue); N]) -> JsonValue {
    let mut map = JsonMap::with_capacity(N);
    for (key, value) in entries {
        map.insert(key, value);
    }
    JsonValue::Object(map)
}

fn optional_string(value: Option<&str>) -> JsonValue {
    value.map_or(JsonValue::Null, Into::into)
}

fn named_type(name: &Name) -> JsonValue {
    object([("name", name.as_str().into())])
}

fn wrapper(kind: &str, of_type: JsonValue) -> JsonValue {
    object([("kind", kind.into()), ("ofType", of_type)])
}

fn type_reference(ty: &Type) -> JsonValue {
    match ty {
        Type::Named(name) => named_type(name),
        Type::NonNullNamed(name) => wrapper("NON_NULL", named_type(name)),
        Type::List(item) => wrapper("LIST", type_reference(item)),
        Type::NonNullList(item) => wrapper("NON_NULL", wrapper("LIST", type_reference(item))),
    }
}

fn field(def: &FieldDefinition) -> JsonValue {
    object([
        ("name", def.name.as_str().into()),
        ("description", optional_string(def.description.as_deref())),
        ("args", arguments(&def.arguments)),
        ("type", type_reference(&def.ty)),
        ("isDeprecated", def.is_deprecated().into()),
        (
            "deprecationReason",
            optional_string(def.deprecation_reason.as_deref()),
        ),
    ])
}

fn arguments(defs: &[Node<InputValueDefinition>]) -> JsonValue {
    JsonValue::Array(
        defs.iter()
            .filter(|def| Introspected::Argument(def).is_visible())
            .map(|def| input_value(def))
            .collect(),
    )
}

fn input_value(def: &InputValueDefinition) -> JsonValue {
    let default_value = def
        .default_value
        .as_ref()
        .map_or(JsonValue::Null, |value| value.to_string().into());
    object([
        ("name", def.name.as_str().into()),
        ("description", optional_string(def.description.as_deref())),
        ("type", type_reference(&def.ty)),
        ("defaultValue", default_value),
    ])
}

fn enum_value(def: &EnumValueDefinition) -> JsonValue {
    object([
        ("name", def.value.as_str().into()),
        ("description", optional_string(def.description.as_deref())),
        ("isDeprecated", def.deprecation_reason.is_some().into()),
        (
            "deprecationReason",
            optional_string(def.deprecation_reason.as_deref()),
        ),
    ])
}

fn directive(def: &DirectiveDefinition) -> JsonValue {
    let locations: Vec<JsonValue> = def
        .locations
        .iter()
        .map(|location| location.name().into())
        .collect();
    object([
        ("name", def.name.as_str().into()),
        ("description", optional_string(def.description.as_deref())),
        ("locations", JsonValue::Array(locations)),
        ("args", arguments(&def.arguments)),
        ("isRepeatable", def.repeatable.into()),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrapped_type_references() {
        let ty = Type::NonNullNamed(name!("Int")).list().non_null();
        let reference = type_reference(&ty);
        let expected = serde_json_bytes::json!({
            "kind": "NON_NULL",
            "ofType": {
                "kind": "LIST",
                "ofType": {"kind": "NON_NULL", "ofType": {"name": "Int"}}
            }
        });
        assert_eq!(reference, expected);
    }

    #[test]
    fn every_meta_type_field_has_a_resolver() {
        let schema = Schema::builder()
            .add_sdl("type Query { a: Int }", "schema.graphql")
            .build()
            .unwrap();
        let meta_types = [("__Schema", &SCHEMA_FIELDS[..]), ("__Type", &TYPE_FIELDS[..])];
        for (type_name, fields) in meta_types {
            let def = schema.get_object(type_name).unwrap();
            assert_eq!(
                def.fields.keys().map(Name::as_str).collect::<Vec<_>>(),
                fields
            );
        }
    }
}
