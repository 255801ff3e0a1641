//! *Abstract Syntax Tree* for GraphQL documents.
//!
//! Produced by [`Parser`][crate::parser::Parser] from
//! [apollo-parser](https://crates.io/crates/apollo-parser)'s concrete syntax tree.
//! The tree is immutable: transformation stages build new nodes instead of mutating these.

use crate::parser::SourceMap;
use crate::Name;
use crate::Node;
use std::fmt;

pub(crate) mod from_cst;

/// A parsed GraphQL document: executable definitions, type system definitions, or both.
#[derive(Clone, Debug)]
pub struct Document {
    pub sources: SourceMap,
    pub definitions: Vec<Definition>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Definition {
    OperationDefinition(Node<OperationDefinition>),
    FragmentDefinition(Node<FragmentDefinition>),
    DirectiveDefinition(Node<DirectiveDefinition>),
    SchemaDefinition(Node<SchemaDefinition>),
    ScalarTypeDefinition(Node<ScalarTypeDefinition>),
    ObjectTypeDefinition(Node<ObjectTypeDefinition>),
    InterfaceTypeDefinition(Node<InterfaceTypeDefinition>),
    UnionTypeDefinition(Node<UnionTypeDefinition>),
    EnumTypeDefinition(Node<EnumTypeDefinition>),
    InputObjectTypeDefinition(Node<InputObjectTypeDefinition>),
    SchemaExtension(Node<SchemaExtension>),
    ScalarTypeExtension(Node<ScalarTypeExtension>),
    ObjectTypeExtension(Node<ObjectTypeExtension>),
    InterfaceTypeExtension(Node<InterfaceTypeExtension>),
    UnionTypeExtension(Node<UnionTypeExtension>),
    EnumTypeExtension(Node<EnumTypeExtension>),
    InputObjectTypeExtension(Node<InputObjectTypeExtension>),
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct OperationDefinition {
    pub operation_type: OperationType,
    pub name: Option<Name>,
    pub variables: Vec<Node<VariableDefinition>>,
    pub directives: DirectiveList,
    pub selection_set: Vec<Selection>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FragmentDefinition {
    pub name: Name,
    pub type_condition: Name,
    pub directives: DirectiveList,
    pub selection_set: Vec<Selection>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DirectiveDefinition {
    pub description: Option<String>,
    pub name: Name,
    pub arguments: Vec<Node<InputValueDefinition>>,
    pub repeatable: bool,
    pub locations: Vec<DirectiveLocation>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SchemaDefinition {
    pub description: Option<String>,
    pub directives: DirectiveList,
    pub root_operations: Vec<Node<(OperationType, Name)>>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ScalarTypeDefinition {
    pub description: Option<String>,
    pub name: Name,
    pub directives: DirectiveList,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ObjectTypeDefinition {
    pub description: Option<String>,
    pub name: Name,
    pub implements_interfaces: Vec<Name>,
    pub directives: DirectiveList,
    pub fields: Vec<Node<FieldDefinition>>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct InterfaceTypeDefinition {
    pub description: Option<String>,
    pub name: Name,
    pub implements_interfaces: Vec<Name>,
    pub directives: DirectiveList,
    pub fields: Vec<Node<FieldDefinition>>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct UnionTypeDefinition {
    pub description: Option<String>,
    pub name: Name,
    pub directives: DirectiveList,
    pub members: Vec<Name>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct EnumTypeDefinition {
    pub description: Option<String>,
    pub name: Name,
    pub directives: DirectiveList,
    pub values: Vec<Node<EnumValueDefinition>>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct InputObjectTypeDefinition {
    pub description: Option<String>,
    pub name: Name,
    pub directives: DirectiveList,
    pub fields: Vec<Node<InputValueDefinition>>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SchemaExtension {
    pub directives: DirectiveList,
    pub root_operations: Vec<Node<(OperationType, Name)>>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ScalarTypeExtension {
    pub name: Name,
    pub directives: DirectiveList,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ObjectTypeExtension {
    pub name: Name,
    pub implements_interfaces: Vec<Name>,
    pub directives: DirectiveList,
    pub fields: Vec<Node<FieldDefinition>>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct InterfaceTypeExtension {
    pub name: Name,
    pub implements_interfaces: Vec<Name>,
    pub directives: DirectiveList,
    pub fields: Vec<Node<FieldDefinition>>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct UnionTypeExtension {
    pub name: Name,
    pub directives: DirectiveList,
    pub members: Vec<Name>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct EnumTypeExtension {
    pub name: Name,
    pub directives: DirectiveList,
    pub values: Vec<Node<EnumValueDefinition>>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct InputObjectTypeExtension {
    pub name: Name,
    pub directives: DirectiveList,
    pub fields: Vec<Node<InputValueDefinition>>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Argument {
    pub name: Name,
    pub value: Node<Value>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct DirectiveList(pub Vec<Node<Directive>>);

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Directive {
    pub name: Name,
    pub arguments: Vec<Node<Argument>>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum OperationType {
    Query,
    Mutation,
    Subscription,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum DirectiveLocation {
    Query,
    Mutation,
    Subscription,
    Field,
    FragmentDefinition,
    FragmentSpread,
    InlineFragment,
    VariableDefinition,
    Schema,
    Scalar,
    Object,
    FieldDefinition,
    ArgumentDefinition,
    Interface,
    Union,
    Enum,
    EnumValue,
    InputObject,
    InputFieldDefinition,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct VariableDefinition {
    pub name: Name,
    pub ty: Node<Type>,
    pub default_value: Option<Node<Value>>,
    pub directives: DirectiveList,
}

/// A type reference: a named type, possibly wrapped in lists and non-null markers.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Type {
    /// A `NamedType`
    Named(Name),
    /// A `NamedType!`
    NonNullNamed(Name),
    /// A `[Type]`
    List(Box<Type>),
    /// A `[Type]!`
    NonNullList(Box<Type>),
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FieldDefinition {
    pub description: Option<String>,
    pub name: Name,
    pub arguments: Vec<Node<InputValueDefinition>>,
    pub ty: Type,
    pub directives: DirectiveList,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct InputValueDefinition {
    pub description: Option<String>,
    pub name: Name,
    pub ty: Node<Type>,
    pub default_value: Option<Node<Value>>,
    pub directives: DirectiveList,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct EnumValueDefinition {
    pub description: Option<String>,
    pub value: Name,
    pub directives: DirectiveList,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Selection {
    Field(Node<Field>),
    FragmentSpread(Node<FragmentSpread>),
    InlineFragment(Node<InlineFragment>),
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Field {
    pub alias: Option<Name>,
    pub name: Name,
    pub arguments: Vec<Node<Argument>>,
    pub directives: DirectiveList,
    pub selection_set: Vec<Selection>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FragmentSpread {
    pub fragment_name: Name,
    pub directives: DirectiveList,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct InlineFragment {
    pub type_condition: Option<Name>,
    pub directives: DirectiveList,
    pub selection_set: Vec<Selection>,
}

/// A GraphQL input value in literal syntax.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Value {
    Null,
    Enum(Name),
    Variable(Name),
    String(String),
    Float(FloatValue),
    Int(IntValue),
    Boolean(bool),
    List(Vec<Node<Value>>),
    Object(Vec<(Name, Node<Value>)>),
}

/// An `IntValue` literal, kept as source text so overflow can be detected at coercion.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct IntValue(String);

/// A `FloatValue` literal, kept as source text.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FloatValue(String);

impl Document {
    /// Returns an iterator of operation definitions, in document order
    pub fn operations(&self) -> impl Iterator<Item = &Node<OperationDefinition>> {
        self.definitions.iter().filter_map(|def| match def {
            Definition::OperationDefinition(op) => Some(op),
            _ => None,
        })
    }

    /// Returns an iterator of fragment definitions, in document order
    pub fn fragments(&self) -> impl Iterator<Item = &Node<FragmentDefinition>> {
        self.definitions.iter().filter_map(|def| match def {
            Definition::FragmentDefinition(fragment) => Some(fragment),
            _ => None,
        })
    }
}

impl Definition {
    /// Returns true if this is an executable definition (operation or fragment).
    pub fn is_executable_definition(&self) -> bool {
        matches!(
            self,
            Self::OperationDefinition(_) | Self::FragmentDefinition(_)
        )
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::OperationDefinition(_) => "OperationDefinition",
            Self::FragmentDefinition(_) => "FragmentDefinition",
            Self::DirectiveDefinition(_) => "DirectiveDefinition",
            Self::SchemaDefinition(_) => "SchemaDefinition",
            Self::ScalarTypeDefinition(_) => "ScalarTypeDefinition",
            Self::ObjectTypeDefinition(_) => "ObjectTypeDefinition",
            Self::InterfaceTypeDefinition(_) => "InterfaceTypeDefinition",
            Self::UnionTypeDefinition(_) => "UnionTypeDefinition",
            Self::EnumTypeDefinition(_) => "EnumTypeDefinition",
            Self::InputObjectTypeDefinition(_) => "InputObjectTypeDefinition",
            Self::SchemaExtension(_) => "SchemaExtension",
            Self::ScalarTypeExtension(_) => "ScalarTypeExtension",
            Self::ObjectTypeExtension(_) => "ObjectTypeExtension",
            Self::InterfaceTypeExtension(_) => "InterfaceTypeExtension",
            Self::UnionTypeExtension(_) => "UnionTypeExtension",
            Self::EnumTypeExtension(_) => "EnumTypeExtension",
            Self::InputObjectTypeExtension(_) => "InputObjectTypeExtension",
        }
    }

    /// The name of the defined element, if it has one
    pub fn name(&self) -> Option<&Name> {
        match self {
            Self::OperationDefinition(def) => def.name.as_ref(),
            Self::FragmentDefinition(def) => Some(&def.name),
            Self::DirectiveDefinition(def) => Some(&def.name),
            Self::SchemaDefinition(_) | Self::SchemaExtension(_) => None,
            Self::ScalarTypeDefinition(def) => Some(&def.name),
            Self::ObjectTypeDefinition(def) => Some(&def.name),
            Self::InterfaceTypeDefinition(def) => Some(&def.name),
            Self::UnionTypeDefinition(def) => Some(&def.name),
            Self::EnumTypeDefinition(def) => Some(&def.name),
            Self::InputObjectTypeDefinition(def) => Some(&def.name),
            Self::ScalarTypeExtension(def) => Some(&def.name),
            Self::ObjectTypeExtension(def) => Some(&def.name),
            Self::InterfaceTypeExtension(def) => Some(&def.name),
            Self::UnionTypeExtension(def) => Some(&def.name),
            Self::EnumTypeExtension(def) => Some(&def.name),
            Self::InputObjectTypeExtension(def) => Some(&def.name),
        }
    }

    pub fn location(&self) -> Option<crate::NodeLocation> {
        match self {
            Self::OperationDefinition(def) => def.location(),
            Self::FragmentDefinition(def) => def.location(),
            Self::DirectiveDefinition(def) => def.location(),
            Self::SchemaDefinition(def) => def.location(),
            Self::ScalarTypeDefinition(def) => def.location(),
            Self::ObjectTypeDefinition(def) => def.location(),
            Self::InterfaceTypeDefinition(def) => def.location(),
            Self::UnionTypeDefinition(def) => def.location(),
            Self::EnumTypeDefinition(def) => def.location(),
            Self::InputObjectTypeDefinition(def) => def.location(),
            Self::SchemaExtension(def) => def.location(),
            Self::ScalarTypeExtension(def) => def.location(),
            Self::ObjectTypeExtension(def) => def.location(),
            Self::InterfaceTypeExtension(def) => def.location(),
            Self::UnionTypeExtension(def) => def.location(),
            Self::EnumTypeExtension(def) => def.location(),
            Self::InputObjectTypeExtension(def) => def.location(),
        }
    }
}

impl DirectiveList {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Returns an iterator of directives with the given name.
    ///
    /// This method is best for repeatable directives.
    /// See also [`get`][Self::get] for non-repeatable directives.
    pub fn get_all<'def: 'name, 'name>(
        &'def self,
        name: &'name str,
    ) -> impl Iterator<Item = &'def Node<Directive>> + 'name {
        self.0.iter().filter(move |dir| dir.name == name)
    }

    /// Returns the first directive with the given name, if any.
    pub fn get(&self, name: &str) -> Option<&Node<Directive>> {
        self.get_all(name).next()
    }

    /// Returns whether there is a directive with the given name
    pub fn has(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Node<Directive>> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'a> IntoIterator for &'a DirectiveList {
    type Item = &'a Node<Directive>;
    type IntoIter = std::slice::Iter<'a, Node<Directive>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl Directive {
    /// Returns the value of the argument with the given name, if it was specified
    pub fn specified_argument_by_name(&self, name: &str) -> Option<&Node<Value>> {
        self.arguments
            .iter()
            .find(|arg| arg.name == name)
            .map(|arg| &arg.value)
    }
}

impl OperationType {
    /// Get the name of this operation type as it would appear in GraphQL source code.
    pub fn name(self) -> &'static str {
        match self {
            OperationType::Query => "query",
            OperationType::Mutation => "mutation",
            OperationType::Subscription => "subscription",
        }
    }

    /// Get the default name of the object type for this operation type
    pub fn default_type_name(self) -> Name {
        match self {
            OperationType::Query => crate::name!("Query"),
            OperationType::Mutation => crate::name!("Mutation"),
            OperationType::Subscription => crate::name!("Subscription"),
        }
    }

    pub fn is_mutation(self) -> bool {
        self == Self::Mutation
    }
}

impl DirectiveLocation {
    /// The name of this location as it would appear in GraphQL source code.
    pub fn name(self) -> &'static str {
        match self {
            DirectiveLocation::Query => "QUERY",
            DirectiveLocation::Mutation => "MUTATION",
            DirectiveLocation::Subscription => "SUBSCRIPTION",
            DirectiveLocation::Field => "FIELD",
            DirectiveLocation::FragmentDefinition => "FRAGMENT_DEFINITION",
            DirectiveLocation::FragmentSpread => "FRAGMENT_SPREAD",
            DirectiveLocation::InlineFragment => "INLINE_FRAGMENT",
            DirectiveLocation::VariableDefinition => "VARIABLE_DEFINITION",
            DirectiveLocation::Schema => "SCHEMA",
            DirectiveLocation::Scalar => "SCALAR",
            DirectiveLocation::Object => "OBJECT",
            DirectiveLocation::FieldDefinition => "FIELD_DEFINITION",
            DirectiveLocation::ArgumentDefinition => "ARGUMENT_DEFINITION",
            DirectiveLocation::Interface => "INTERFACE",
            DirectiveLocation::Union => "UNION",
            DirectiveLocation::Enum => "ENUM",
            DirectiveLocation::EnumValue => "ENUM_VALUE",
            DirectiveLocation::InputObject => "INPUT_OBJECT",
            DirectiveLocation::InputFieldDefinition => "INPUT_FIELD_DEFINITION",
        }
    }
}

impl From<OperationType> for DirectiveLocation {
    fn from(ty: OperationType) -> Self {
        match ty {
            OperationType::Query => DirectiveLocation::Query,
            OperationType::Mutation => DirectiveLocation::Mutation,
            OperationType::Subscription => DirectiveLocation::Subscription,
        }
    }
}

impl Field {
    /// Get the name that will be used for this field selection in response formatting.
    ///
    /// For example, in this operation, the response name is `sourceField`:
    /// ```graphql
    /// query GetField { sourceField }
    /// ```
    ///
    /// But in this operation that uses an alias, the response name is `responseField`:
    /// ```graphql
    /// query GetField { responseField: sourceField }
    /// ```
    pub fn response_key(&self) -> &Name {
        self.alias.as_ref().unwrap_or(&self.name)
    }
}

impl Selection {
    pub fn directives(&self) -> &DirectiveList {
        match self {
            Self::Field(sel) => &sel.directives,
            Self::FragmentSpread(sel) => &sel.directives,
            Self::InlineFragment(sel) => &sel.directives,
        }
    }

    pub fn location(&self) -> Option<crate::NodeLocation> {
        match self {
            Self::Field(sel) => sel.location(),
            Self::FragmentSpread(sel) => sel.location(),
            Self::InlineFragment(sel) => sel.location(),
        }
    }
}

impl Type {
    /// Returns this type made non-null, if it isn’t already.
    pub fn non_null(self) -> Self {
        match self {
            Type::Named(name) => Type::NonNullNamed(name),
            Type::List(inner) => Type::NonNullList(inner),
            Type::NonNullNamed(_) | Type::NonNullList(_) => self,
        }
    }

    /// Returns this type made nullable, if it isn’t already.
    pub fn nullable(self) -> Self {
        match self {
            Type::NonNullNamed(name) => Type::Named(name),
            Type::NonNullList(inner) => Type::List(inner),
            Type::Named(_) | Type::List(_) => self,
        }
    }

    /// Returns a list type whose items are this type.
    pub fn list(self) -> Self {
        Type::List(Box::new(self))
    }

    /// If the type is a list type or a non-null list type, return the item type.
    pub fn item_type(&self) -> Option<&Self> {
        match self {
            Type::List(inner) | Type::NonNullList(inner) => Some(inner),
            Type::Named(_) | Type::NonNullNamed(_) => None,
        }
    }

    /// Returns the inner named type, after unwrapping any non-null or list markers.
    pub fn inner_named_type(&self) -> &Name {
        match self {
            Type::Named(name) | Type::NonNullNamed(name) => name,
            Type::List(inner) | Type::NonNullList(inner) => inner.inner_named_type(),
        }
    }

    /// Returns whether this type is non-null
    pub fn is_non_null(&self) -> bool {
        matches!(self, Type::NonNullNamed(_) | Type::NonNullList(_))
    }

    /// Returns whether this type is a list, on a non-null list
    pub fn is_list(&self) -> bool {
        matches!(self, Type::List(_) | Type::NonNullList(_))
    }

    pub fn is_named(&self) -> bool {
        matches!(self, Type::Named(_) | Type::NonNullNamed(_))
    }

    /// Can a value of type `self` be used where `target` is expected?
    ///
    /// Only checks the wrapping structure: named types must be identical.
    ///
    /// <https://spec.graphql.org/October2021/#AreTypesCompatible()>
    pub fn is_assignable_to(&self, target: &Self) -> bool {
        match (target, self) {
            // Can't assign a nullable type to a non-null type.
            (Type::NonNullNamed(_) | Type::NonNullList(_), Type::Named(_) | Type::List(_)) => {
                false
            }
            (Type::NonNullList(target), Type::NonNullList(this)) => this.is_assignable_to(target),
            (Type::NonNullNamed(target), Type::NonNullNamed(this)) => target == this,
            // Can assign a non-null type to a nullable one.
            (Type::List(target), Type::NonNullList(this) | Type::List(this)) => {
                this.is_assignable_to(target)
            }
            (Type::Named(target), Type::NonNullNamed(this) | Type::Named(this)) => target == this,
            _ => false,
        }
    }
}

impl IntValue {
    /// Creates a new string representation for an integer literal, panicking in debug mode if
    /// it is not valid syntax.
    pub fn new_parsed(text: &str) -> Self {
        debug_assert!(text.trim_start_matches('-').bytes().all(|b| b.is_ascii_digit()));
        Self(text.into())
    }

    /// Returns the source text of the literal
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Converts to `i32`, returning `Err` on overflow
    pub fn try_to_i32(&self) -> Result<i32, std::num::ParseIntError> {
        self.0.parse()
    }

    /// Converts to `f64`, returning `Err` if the value is not finite.
    pub fn try_to_f64(&self) -> Result<f64, FloatOverflowError> {
        try_to_f64(&self.0)
    }
}

impl FloatValue {
    pub fn new_parsed(text: &str) -> Self {
        Self(text.into())
    }

    /// Returns the source text of the literal
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Converts to `f64`, returning `Err` if the value is not finite.
    pub fn try_to_f64(&self) -> Result<f64, FloatOverflowError> {
        try_to_f64(&self.0)
    }
}

/// The float literal does not fit in a finite `f64`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[error("value magnitude too large to be converted to `f64`")]
pub struct FloatOverflowError;

fn try_to_f64(text: &str) -> Result<f64, FloatOverflowError> {
    let Ok(value) = text.parse::<f64>() else {
        return Err(FloatOverflowError);
    };
    if value.is_finite() {
        Ok(value)
    } else {
        Err(FloatOverflowError)
    }
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_variable(&self) -> Option<&Name> {
        if let Value::Variable(name) = self {
            Some(name)
        } else {
            None
        }
    }

    /// Returns whether this value or any nested value references a variable.
    pub fn has_variables(&self) -> bool {
        match self {
            Value::Variable(_) => true,
            Value::List(items) => items.iter().any(|item| item.has_variables()),
            Value::Object(fields) => fields.iter().any(|(_, value)| value.has_variables()),
            _ => false,
        }
    }

    /// Calls `f` on every variable referenced by this value, with the location of the reference
    pub(crate) fn walk_variables<'a>(
        value: &'a Node<Value>,
        f: &mut impl FnMut(&'a Name, &'a Node<Value>),
    ) {
        match value.as_ref() {
            Value::Variable(name) => f(name, value),
            Value::List(items) => {
                for item in items {
                    Self::walk_variables(item, f)
                }
            }
            Value::Object(fields) => {
                for (_, field) in fields {
                    Self::walk_variables(field, f)
                }
            }
            _ => {}
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "Null",
            Value::Enum(_) => "Enum",
            Value::Variable(_) => "Variable",
            Value::String(_) => "String",
            Value::Float(_) => "Float",
            Value::Int(_) => "Int",
            Value::Boolean(_) => "Boolean",
            Value::List(_) => "List",
            Value::Object(_) => "Object",
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Named(name) => write!(f, "{name}"),
            Type::NonNullNamed(name) => write!(f, "{name}!"),
            Type::List(inner) => write!(f, "[{inner}]"),
            Type::NonNullList(inner) => write!(f, "[{inner}]!"),
        }
    }
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Display for DirectiveLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Display for IntValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for FloatValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Serializes in GraphQL syntax.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Enum(name) => write!(f, "{name}"),
            Value::Variable(name) => write!(f, "${name}"),
            Value::String(value) => write_string(f, value),
            Value::Float(value) => write!(f, "{value}"),
            Value::Int(value) => write!(f, "{value}"),
            Value::Boolean(value) => write!(f, "{value}"),
            Value::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?
                    }
                    write!(f, "{item}")?
                }
                f.write_str("]")
            }
            Value::Object(fields) => {
                f.write_str("{")?;
                for (i, (name, value)) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?
                    }
                    write!(f, "{name}: {value}")?
                }
                f.write_str("}")
            }
        }
    }
}

fn write_string(f: &mut fmt::Formatter<'_>, value: &str) -> fmt::Result {
    f.write_str("\"")?;
    for c in value.chars() {
        match c {
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\r' => f.write_str("\\r")?,
            '\t' => f.write_str("\\t")?,
            '\u{0008}' => f.write_str("\\b")?,
            '\u{000C}' => f.write_str("\\f")?,
            c if c.is_control() => write!(f, "\\u{:04X}", c as u32)?,
            c => write!(f, "{c}")?,
        }
    }
    f.write_str("\"")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::name;

    #[test]
    fn type_display() {
        let ty = Type::NonNullList(Box::new(Type::NonNullNamed(name!("Int"))));
        assert_eq!(ty.to_string(), "[Int!]!");
        assert_eq!(ty.clone().nullable().to_string(), "[Int!]");
        assert_eq!(ty.item_type().unwrap().to_string(), "Int!");
        assert_eq!(ty.inner_named_type(), "Int");
    }

    #[test]
    fn type_assignability() {
        let int = Type::Named(name!("Int"));
        let int_nn = Type::NonNullNamed(name!("Int"));
        assert!(int_nn.is_assignable_to(&int));
        assert!(!int.is_assignable_to(&int_nn));
        assert!(Type::NonNullList(Box::new(int_nn.clone()))
            .is_assignable_to(&Type::List(Box::new(int.clone()))));
        assert!(!int.is_assignable_to(&Type::Named(name!("String"))));
    }

    #[test]
    fn value_display() {
        let value = Value::List(vec![
            Node::new(Value::Int(IntValue::new_parsed("20"))),
            Node::new(Value::Null),
            Node::new(Value::Object(vec![(
                name!("a"),
                Node::new(Value::String("q\"uote".into())),
            )])),
        ]);
        assert_eq!(value.to_string(), r#"[20, null, {a: "q\"uote"}]"#);
    }

    #[test]
    fn int_overflow() {
        assert_eq!(IntValue::new_parsed("-2147483648").try_to_i32(), Ok(i32::MIN));
        assert!(IntValue::new_parsed("2147483648").try_to_i32().is_err());
    }
}
