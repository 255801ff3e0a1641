use crate::ast;
use crate::ast::Type;
use crate::executable::ExecutableOperation;
use crate::execution::GraphQLError;
use crate::execution::JsonMap;
use crate::execution::JsonValue;
use crate::schema::ExtendedType;
use crate::schema::InputValueDefinition;
use crate::Node;
use crate::NodeLocation;
use crate::Schema;

/// No usable value: distinct from an explicit `null`.
///
/// Returned by [`value_from_ast`] for a missing variable, an invalid literal,
/// or a `null` where a non-null type is expected.
/// Callers decide whether that means "use the default", "omit", or "invalid".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Undefined;

/// Coerce a literal from a document to the given input type.
///
/// `variables` are the already-coerced variable values of the request,
/// or `None` where variables cannot be referenced (default values, directive applications
/// in SDL).
///
/// This never fails outward: any problem is [`Undefined`].
///
/// This is [ValueFromAST](https://spec.graphql.org/June2018/#sec-Input-Values)
/// in the GraphQL specification.
pub fn value_from_ast(
    schema: &Schema,
    value: &ast::Value,
    ty: &Type,
    variables: Option<&JsonMap>,
) -> Result<JsonValue, Undefined> {
    if let ast::Value::Variable(name) = value {
        let value = variables
            .and_then(|variables| variables.get(name.as_str()))
            .ok_or(Undefined)?;
        if value.is_null() && ty.is_non_null() {
            return Err(Undefined);
        }
        return Ok(value.clone());
    }
    if value.is_null() {
        return if ty.is_non_null() {
            Err(Undefined)
        } else {
            Ok(JsonValue::Null)
        };
    }
    let type_name = match ty {
        Type::List(item_ty) | Type::NonNullList(item_ty) => {
            let ast::Value::List(items) = value else {
                // Input coercion of a single value for a list type: a list of one
                let item = value_from_ast(schema, value, item_ty, variables)?;
                return Ok(JsonValue::Array(vec![item]));
            };
            return items
                .iter()
                .map(|item| match value_from_ast(schema, item, item_ty, variables) {
                    Err(Undefined) if !item_ty.is_non_null() => Ok(JsonValue::Null),
                    result => result,
                })
                .collect::<Result<Vec<_>, _>>()
                .map(JsonValue::Array);
        }
        Type::Named(name) | Type::NonNullNamed(name) => name,
    };
    match schema.types.get(type_name).ok_or(Undefined)? {
        ExtendedType::Scalar(def) => def.implementation.parse_literal(value),
        ExtendedType::Enum(def) => match value {
            ast::Value::Enum(name) if def.values.contains_key(name) => Ok(name.as_str().into()),
            _ => Err(Undefined),
        },
        ExtendedType::InputObject(def) => {
            let ast::Value::Object(fields) = value else {
                return Err(Undefined);
            };
            if fields
                .iter()
                .any(|(name, _)| !def.fields.contains_key(name))
            {
                return Err(Undefined);
            }
            let mut object = JsonMap::new();
            for (field_name, field_def) in &def.fields {
                let given = fields
                    .iter()
                    .find(|(name, _)| name == field_name)
                    .map(|(_, value)| value)
                    .filter(|value| !is_missing_variable(value, variables));
                if let Some(given) = given {
                    let coerced = value_from_ast(schema, given, &field_def.ty, variables)?;
                    object.insert(field_name.as_str(), coerced);
                } else if let Some(default) = &field_def.default_value {
                    let coerced = value_from_ast(schema, default, &field_def.ty, None)?;
                    object.insert(field_name.as_str(), coerced);
                } else if field_def.ty.is_non_null() {
                    return Err(Undefined);
                }
            }
            Ok(object.into())
        }
        ExtendedType::Object(_) | ExtendedType::Interface(_) | ExtendedType::Union(_) => {
            Err(Undefined)
        }
    }
}

fn is_missing_variable(value: &ast::Value, variables: Option<&JsonMap>) -> bool {
    match value {
        ast::Value::Variable(name) => {
            !variables.is_some_and(|variables| variables.contains_key(name.as_str()))
        }
        _ => false,
    }
}

/// Coerce the raw JSON variable values of a request to the types declared by the operation.
///
/// Every problem is reported, each as a request error.
/// The request must not be executed if any is returned.
///
/// This is [CoerceVariableValues()](https://spec.graphql.org/June2018/#CoerceVariableValues())
/// in the GraphQL specification.
pub(crate) fn coerce_variable_values(
    schema: &Schema,
    operation: &ExecutableOperation,
    values: &JsonMap,
) -> Result<JsonMap, Vec<GraphQLError>> {
    let mut coerced_values = JsonMap::new();
    let mut errors = Vec::new();
    for variable_def in &operation.variables {
        let name = variable_def.name.as_str();
        let ty = &*variable_def.ty;
        let mut error = |message: String| {
            errors.push(GraphQLError::new(
                message,
                variable_def.location(),
                &operation.sources,
            ))
        };
        if let Some((key, value)) = values.get_key_value(name) {
            if value.is_null() && ty.is_non_null() {
                error(format!(
                    "Variable < ${name} > of non-null type < {ty} > must not be null."
                ));
                continue;
            }
            match coerce_variable_value(schema, ty, value, "value") {
                Ok(value) => {
                    coerced_values.insert(key.clone(), value);
                }
                Err(reason) => error(format!(
                    "Variable < ${name} > got invalid value < {} >; {reason}",
                    compact_json(value)
                )),
            }
        } else if let Some(default) = &variable_def.default_value {
            match value_from_ast(schema, default, ty, None) {
                Ok(value) => {
                    coerced_values.insert(name, value);
                }
                Err(Undefined) => error(format!(
                    "Variable < ${name} > has invalid default value < {} >.",
                    **default
                )),
            }
        } else if ty.is_non_null() {
            error(format!(
                "Variable < ${name} > of required type < {ty} > was not provided."
            ))
        }
    }
    if errors.is_empty() {
        Ok(coerced_values)
    } else {
        Err(errors)
    }
}

fn compact_json(value: &JsonValue) -> String {
    serde_json_bytes::serde_json::to_string(value).unwrap_or_else(|_| value.to_string())
}

fn at(path: &str) -> String {
    if path == "value" {
        String::new()
    } else {
        format!(" at {path}")
    }
}

/// Returns the reason for rejecting the value, with the position of the problem in `path`
fn coerce_variable_value(
    schema: &Schema,
    ty: &Type,
    value: &JsonValue,
    path: &str,
) -> Result<JsonValue, String> {
    if value.is_null() {
        return if ty.is_non_null() {
            Err(format!(
                "Expected non-nullable type < {ty} > not to be null{}.",
                at(path)
            ))
        } else {
            Ok(JsonValue::Null)
        };
    }
    let type_name = match ty {
        Type::List(item_ty) | Type::NonNullList(item_ty) => {
            return match value.as_array() {
                Some(items) => items
                    .iter()
                    .enumerate()
                    .map(|(index, item)| {
                        coerce_variable_value(schema, item_ty, item, &format!("{path}[{index}]"))
                    })
                    .collect::<Result<Vec<_>, _>>()
                    .map(JsonValue::Array),
                // Not a list: treat the value as a list of one
                None => Ok(JsonValue::Array(vec![coerce_variable_value(
                    schema, item_ty, value, path,
                )?])),
            };
        }
        Type::Named(name) | Type::NonNullNamed(name) => name,
    };
    let Some(ty_def) = schema.types.get(type_name) else {
        return Err(format!("Unknown type < {type_name} >{}.", at(path)));
    };
    match ty_def {
        ExtendedType::Scalar(def) => def
            .implementation
            .coerce_input(value)
            .map_err(|err| format!("Expected type < {type_name} >{}; {err}", at(path))),
        ExtendedType::Enum(def) => match value.as_str() {
            Some(str) if def.values.contains_key(str) => Ok(value.clone()),
            _ => Err(format!("Expected type < {type_name} >{}.", at(path))),
        },
        ExtendedType::InputObject(def) => {
            let Some(object) = value.as_object() else {
                return Err(format!(
                    "Expected type < {type_name} > to be an object{}.",
                    at(path)
                ));
            };
            if let Some(key) = object
                .keys()
                .find(|key| !def.fields.contains_key(key.as_str()))
            {
                return Err(format!(
                    "Field < {} > is not defined by type < {type_name} >{}.",
                    key.as_str(),
                    at(path)
                ));
            }
            let mut coerced = JsonMap::new();
            for (field_name, field_def) in &def.fields {
                if let Some(field_value) = object.get(field_name.as_str()) {
                    let field_path = format!("{path}.{field_name}");
                    let field_value =
                        coerce_variable_value(schema, &field_def.ty, field_value, &field_path)?;
                    coerced.insert(field_name.as_str(), field_value);
                } else if let Some(default) = &field_def.default_value {
                    let Ok(default) = value_from_ast(schema, default, &field_def.ty, None) else {
                        return Err(format!(
                            "Field < {field_name} > of type < {type_name} > \
                             has an invalid default value{}.",
                            at(path)
                        ));
                    };
                    coerced.insert(field_name.as_str(), default);
                } else if field_def.ty.is_non_null() {
                    return Err(format!(
                        "Field < {field_name} > of required type < {} > was not provided{}.",
                        field_def.ty,
                        at(path)
                    ));
                }
            }
            Ok(coerced.into())
        }
        ExtendedType::Object(_) | ExtendedType::Interface(_) | ExtendedType::Union(_) => Err(
            format!("Type < {type_name} > is not an input type{}.", at(path)),
        ),
    }
}

/// A field or directive argument that could not be coerced
#[derive(Debug, Clone)]
pub(crate) struct ArgumentError {
    pub(crate) message: String,
    pub(crate) location: Option<NodeLocation>,
}

/// Merge the given arguments, the values of variables they reference,
/// and default values of argument definitions.
///
/// `variables: None` treats every variable reference as not provided.
///
/// This is [CoerceArgumentValues()](https://spec.graphql.org/June2018/#CoerceArgumentValues())
/// in the GraphQL specification.
pub(crate) fn coerce_arguments(
    schema: &Schema,
    definitions: &[Node<InputValueDefinition>],
    arguments: &[Node<ast::Argument>],
    variables: Option<&JsonMap>,
) -> Result<JsonMap, Vec<ArgumentError>> {
    let mut coerced = JsonMap::new();
    let mut errors = Vec::new();
    for def in definitions {
        let name = def.name.as_str();
        let ty = &*def.ty;
        let argument = arguments.iter().find(|arg| arg.name == def.name);
        let location = argument.and_then(|arg| arg.location());
        let mut error = |message: String| errors.push(ArgumentError { message, location });

        let mut value = None;
        if let Some(argument) = argument {
            match argument.value.as_ref() {
                ast::Value::Variable(var) => {
                    value = variables
                        .and_then(|vars| vars.get(var.as_str()))
                        .cloned()
                }
                literal => {
                    match value_from_ast(schema, literal, ty, variables) {
                        Ok(literal_value) => value = Some(literal_value),
                        Err(Undefined) => {
                            error(format!("Argument < {name} > has invalid value < {literal} >."));
                            continue;
                        }
                    }
                }
            }
        }
        match value {
            Some(value) if value.is_null() && ty.is_non_null() => error(format!(
                "Argument < {name} > of non-null type < {ty} > must not be null."
            )),
            Some(value) => {
                coerced.insert(name, value);
            }
            None => {
                if let Some(default) = &def.default_value {
                    match value_from_ast(schema, default, ty, None) {
                        Ok(default) => {
                            coerced.insert(name, default);
                        }
                        Err(Undefined) => error(format!(
                            "Argument < {name} > has invalid default value < {} >.",
                            **default
                        )),
                    }
                } else if ty.is_non_null() {
                    error(format!(
                        "Argument < {name} > of required type < {ty} > was not provided."
                    ))
                }
            }
        }
    }
    if errors.is_empty() {
        Ok(coerced)
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::IntValue;
    use crate::name;
    use crate::Name;
    use serde_json_bytes::json;

    fn schema() -> Schema {
        Schema::builder()
            .add_sdl(
                r#"
                type Query { f(in: In): Int }
                enum Color { RED GREEN }
                input In {
                    required: Int!
                    withDefault: String = "default"
                    optional: Color
                }
                "#,
                "schema.graphql",
            )
            .build()
            .unwrap()
    }

    fn int(value: &str) -> Node<ast::Value> {
        Node::new(ast::Value::Int(IntValue::new_parsed(value)))
    }

    fn list(items: Vec<Node<ast::Value>>) -> ast::Value {
        ast::Value::List(items)
    }

    fn ty(text: &str) -> Type {
        let inner = Type::Named(name!("Int"));
        match text {
            "Int" => inner,
            "Int!" => inner.non_null(),
            "[Int]" => inner.list(),
            "[Int!]" => inner.non_null().list(),
            "[Int!]!" => inner.non_null().list().non_null(),
            _ => unreachable!(),
        }
    }

    #[test]
    fn non_null() {
        let schema = schema();
        assert_eq!(
            value_from_ast(&schema, &ast::Value::Null, &ty("Int!"), None),
            Err(Undefined)
        );
        assert_eq!(
            value_from_ast(&schema, &ast::Value::Null, &ty("Int"), None),
            Ok(JsonValue::Null)
        );
        assert_eq!(
            value_from_ast(&schema, &int("7"), &ty("Int!"), None),
            Ok(json!(7))
        );
    }

    #[test]
    fn lists() {
        let schema = schema();
        let value = list(vec![int("20"), Node::new(ast::Value::Null)]);
        assert_eq!(
            value_from_ast(&schema, &value, &ty("[Int!]"), None),
            Err(Undefined)
        );
        assert_eq!(
            value_from_ast(&schema, &value, &ty("[Int]"), None),
            Ok(json!([20, null]))
        );
        // A nullable item bound to a missing variable becomes null
        let value = list(vec![int("1"), Node::new(ast::Value::Variable(name!("v")))]);
        assert_eq!(
            value_from_ast(&schema, &value, &ty("[Int]"), Some(&JsonMap::new())),
            Ok(json!([1, null]))
        );
        // A single value is coerced as a list of one
        assert_eq!(
            value_from_ast(&schema, &int("3"), &ty("[Int!]!"), None),
            Ok(json!([3]))
        );
    }

    #[test]
    fn variables() {
        let schema = schema();
        let var = ast::Value::Variable(name!("v"));
        let vars = json!({"v": null});
        let vars = vars.as_object();
        assert_eq!(value_from_ast(&schema, &var, &ty("Int"), vars), Ok(json!(null)));
        assert_eq!(
            value_from_ast(&schema, &var, &ty("Int!"), vars),
            Err(Undefined)
        );
        assert_eq!(value_from_ast(&schema, &var, &ty("Int"), None), Err(Undefined));
    }

    #[test]
    fn input_objects_and_enums() {
        let schema = schema();
        let in_ty = Type::Named(name!("In"));
        let object = |fields: Vec<(Name, Node<ast::Value>)>| ast::Value::Object(fields);
        assert_eq!(
            value_from_ast(
                &schema,
                &object(vec![
                    (name!("required"), int("1")),
                    (name!("optional"), Node::new(ast::Value::Enum(name!("RED")))),
                ]),
                &in_ty,
                None
            ),
            Ok(json!({"required": 1, "withDefault": "default", "optional": "RED"}))
        );
        // Missing required field
        assert_eq!(
            value_from_ast(&schema, &object(vec![]), &in_ty, None),
            Err(Undefined)
        );
        // Unknown field
        assert_eq!(
            value_from_ast(
                &schema,
                &object(vec![
                    (name!("required"), int("1")),
                    (name!("unknown"), int("1")),
                ]),
                &in_ty,
                None
            ),
            Err(Undefined)
        );
        // Unknown enum value
        assert_eq!(
            value_from_ast(
                &schema,
                &ast::Value::Enum(name!("BLUE")),
                &Type::Named(name!("Color")),
                None
            ),
            Err(Undefined)
        );
    }

    #[test]
    fn input_object_fields_bound_to_missing_variables() {
        let schema = schema();
        let in_ty = Type::Named(name!("In"));
        let missing = || Node::new(ast::Value::Variable(name!("missing")));
        let variables = json!({"provided": "given"});
        let variables = variables.as_object();
        // Falls back to the default value
        let value = ast::Value::Object(vec![
            (name!("required"), int("1")),
            (name!("withDefault"), missing()),
        ]);
        assert_eq!(
            value_from_ast(&schema, &value, &in_ty, variables),
            Ok(json!({"required": 1, "withDefault": "default"}))
        );
        // Left out without a default value
        let value = ast::Value::Object(vec![
            (name!("required"), int("1")),
            (name!("optional"), missing()),
        ]);
        assert_eq!(
            value_from_ast(&schema, &value, &in_ty, variables),
            Ok(json!({"required": 1, "withDefault": "default"}))
        );
        // A non-null field makes the whole object undefined
        let value = ast::Value::Object(vec![(name!("required"), missing())]);
        assert_eq!(
            value_from_ast(&schema, &value, &in_ty, variables),
            Err(Undefined)
        );
        // A provided variable is used as is
        let value = ast::Value::Object(vec![
            (name!("required"), int("1")),
            (
                name!("withDefault"),
                Node::new(ast::Value::Variable(name!("provided"))),
            ),
        ]);
        assert_eq!(
            value_from_ast(&schema, &value, &in_ty, variables),
            Ok(json!({"required": 1, "withDefault": "given"}))
        );
    }

    #[test]
    fn variable_values() {
        let schema = schema();
        let ty = Type::NonNullNamed(name!("In")).list();
        assert_eq!(
            coerce_variable_value(&schema, &ty, &json!({"required": 2}), "value"),
            Ok(json!([{"required": 2, "withDefault": "default"}]))
        );
        assert_eq!(
            coerce_variable_value(&schema, &ty, &json!([{"required": "2"}]), "value"),
            Err("Expected type < Int > at value[0].required; \
                 Int cannot represent non-integer value: \"2\""
                .to_owned())
        );
        assert_eq!(
            coerce_variable_value(&schema, &ty, &json!([{}]), "value"),
            Err("Field < required > of required type < Int! > was not provided at value[0]."
                .to_owned())
        );
    }
}
