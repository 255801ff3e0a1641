//! Baked representation of a GraphQL schema
//!
//! A [`Schema`] is built once by [`SchemaBuilder`] from SDL plus implementations
//! (resolvers, scalars, directives, type resolvers) and is immutable afterwards.
//! Every type extension is folded into its definition
//! and every directive application is bound to its implementation.

use crate::ast;
use crate::directives::Directive;
use crate::directives::DirectiveInvocation;
use crate::execution::result_coercion::OutputCoercer;
use crate::execution::Resolver;
use crate::execution::TypeResolver;
use crate::parser::SourceMap;
use crate::Name;
use crate::Node;
use indexmap::IndexMap;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

mod builder;
pub(crate) mod introspection;
mod scalars;

pub use self::builder::BuildError;
pub use self::builder::BuildErrors;
pub use self::builder::SchemaBuilder;
pub use self::scalars::CoercionError;
pub use self::scalars::Scalar;
pub use crate::ast::DirectiveLocation;
pub use crate::ast::OperationType;
pub use crate::ast::Type;

/// A baked GraphQL schema, ready for execution
#[derive(Clone)]
pub struct Schema {
    /// Source files parsed to contribute to this schema, including built-in definitions
    pub sources: SourceMap,

    pub description: Option<String>,

    /// Name of the object type for the `query` root operation
    pub query_type: Name,

    /// Name of the object type for the `mutation` root operation
    pub mutation_type: Option<Name>,

    /// Name of the object type for the `subscription` root operation
    pub subscription_type: Option<Name>,

    /// Built-in scalars, introspection types, and explicit types
    pub types: IndexMap<Name, ExtendedType>,

    /// Built-in and explicit directive definitions
    pub directive_definitions: IndexMap<Name, Node<DirectiveDefinition>>,

    /// Schema-level directive applications
    pub directives: Vec<DirectiveInvocation>,

    /// For each interface, the object types that implement it
    pub(crate) implementers: HashMap<Name, Vec<Name>>,

    pub(crate) meta_fields: MetaFieldDefinitions,
}

/// Definitions of the fields that exist without being declared
#[derive(Clone)]
pub(crate) struct MetaFieldDefinitions {
    pub(crate) typename: Node<FieldDefinition>,
    pub(crate) schema: Node<FieldDefinition>,
    pub(crate) type_: Node<FieldDefinition>,
}

/// The definition of a named type, with all information from type extensions folded in.
#[derive(Clone)]
pub enum ExtendedType {
    Scalar(Node<ScalarType>),
    Object(Node<ObjectType>),
    Interface(Node<InterfaceType>),
    Union(Node<UnionType>),
    Enum(Node<EnumType>),
    InputObject(Node<InputObjectType>),
}

#[derive(Clone)]
pub struct ScalarType {
    pub description: Option<String>,
    pub name: Name,
    pub directives: Vec<DirectiveInvocation>,
    /// Set by `@specifiedBy(url:)`
    pub specified_by_url: Option<String>,
    pub(crate) implementation: Arc<dyn Scalar>,
}

#[derive(Clone, Debug)]
pub struct ObjectType {
    pub description: Option<String>,
    pub name: Name,
    pub implements_interfaces: Vec<Name>,
    pub directives: Vec<DirectiveInvocation>,

    /// Explicit field definitions.
    ///
    /// When looking up a definition,
    /// consider using [`Schema::type_field`] instead to include meta-fields.
    pub fields: IndexMap<Name, Node<FieldDefinition>>,
}

#[derive(Clone)]
pub struct InterfaceType {
    pub description: Option<String>,
    pub name: Name,
    pub implements_interfaces: Vec<Name>,
    pub directives: Vec<DirectiveInvocation>,
    pub fields: IndexMap<Name, Node<FieldDefinition>>,
    pub(crate) type_resolver: Arc<dyn TypeResolver>,
}

#[derive(Clone)]
pub struct UnionType {
    pub description: Option<String>,
    pub name: Name,
    pub directives: Vec<DirectiveInvocation>,
    pub members: Vec<Name>,
    pub(crate) type_resolver: Arc<dyn TypeResolver>,
}

#[derive(Clone, Debug)]
pub struct EnumType {
    pub description: Option<String>,
    pub name: Name,
    pub directives: Vec<DirectiveInvocation>,
    pub values: IndexMap<Name, Node<EnumValueDefinition>>,
}

#[derive(Clone, Debug)]
pub struct InputObjectType {
    pub description: Option<String>,
    pub name: Name,
    pub directives: Vec<DirectiveInvocation>,
    pub fields: IndexMap<Name, Node<InputValueDefinition>>,
}

#[derive(Clone)]
pub struct FieldDefinition {
    pub description: Option<String>,
    pub name: Name,
    pub arguments: Vec<Node<InputValueDefinition>>,
    pub ty: Type,
    pub directives: Vec<DirectiveInvocation>,
    /// Set by `@deprecated`
    pub deprecation_reason: Option<String>,
    pub(crate) resolver: Arc<dyn Resolver>,
    pub(crate) coercer: OutputCoercer,
}

/// An argument, or a field of an input object type
#[derive(Clone, Debug)]
pub struct InputValueDefinition {
    pub description: Option<String>,
    pub name: Name,
    pub ty: Node<Type>,
    /// Kept as a literal: coerced to the value’s type wherever it is used
    pub default_value: Option<Node<ast::Value>>,
    pub directives: Vec<DirectiveInvocation>,
    pub deprecation_reason: Option<String>,
}

#[derive(Clone, Debug)]
pub struct EnumValueDefinition {
    pub description: Option<String>,
    pub value: Name,
    pub directives: Vec<DirectiveInvocation>,
    pub deprecation_reason: Option<String>,
}

#[derive(Clone)]
pub struct DirectiveDefinition {
    pub description: Option<String>,
    pub name: Name,
    pub arguments: Vec<Node<InputValueDefinition>>,
    pub repeatable: bool,
    pub locations: Vec<DirectiveLocation>,
    pub(crate) implementation: Arc<dyn Directive>,
}

impl Schema {
    /// Returns a new builder for creating a Schema from SDL and implementations
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::new()
    }

    pub fn find_type(&self, name: &str) -> Option<&ExtendedType> {
        self.types.get(name)
    }

    pub fn find_directive(&self, name: &str) -> Option<&Node<DirectiveDefinition>> {
        self.directive_definitions.get(name)
    }

    /// Returns the scalar definition of the given name, if it is a scalar
    pub fn find_scalar(&self, name: &str) -> Option<&Node<ScalarType>> {
        if let Some(ExtendedType::Scalar(ty)) = self.types.get(name) {
            Some(ty)
        } else {
            None
        }
    }

    pub fn get_object(&self, name: &str) -> Option<&Node<ObjectType>> {
        if let Some(ExtendedType::Object(ty)) = self.types.get(name) {
            Some(ty)
        } else {
            None
        }
    }

    pub fn get_interface(&self, name: &str) -> Option<&Node<InterfaceType>> {
        if let Some(ExtendedType::Interface(ty)) = self.types.get(name) {
            Some(ty)
        } else {
            None
        }
    }

    pub fn get_enum(&self, name: &str) -> Option<&Node<EnumType>> {
        if let Some(ExtendedType::Enum(ty)) = self.types.get(name) {
            Some(ty)
        } else {
            None
        }
    }

    pub fn get_input_object(&self, name: &str) -> Option<&Node<InputObjectType>> {
        if let Some(ExtendedType::InputObject(ty)) = self.types.get(name) {
            Some(ty)
        } else {
            None
        }
    }

    /// Returns the name of the object type for the root operation of the given kind
    pub fn root_operation(&self, operation_type: OperationType) -> Option<&Name> {
        match operation_type {
            OperationType::Query => Some(&self.query_type),
            OperationType::Mutation => self.mutation_type.as_ref(),
            OperationType::Subscription => self.subscription_type.as_ref(),
        }
    }

    /// Returns the definition of a type’s explicit field or meta-field.
    ///
    /// `__typename` exists on every composite type,
    /// `__schema` and `__type` on the query root type.
    pub fn type_field(&self, type_name: &str, field_name: &str) -> Option<&Node<FieldDefinition>> {
        let ty = self.types.get(type_name)?;
        match field_name {
            "__typename" if ty.is_composite() => Some(&self.meta_fields.typename),
            "__schema" if self.query_type == type_name => Some(&self.meta_fields.schema),
            "__type" if self.query_type == type_name => Some(&self.meta_fields.type_),
            _ => match ty {
                ExtendedType::Object(def) => def.fields.get(field_name),
                ExtendedType::Interface(def) => def.fields.get(field_name),
                _ => None,
            },
        }
    }

    /// Returns the object types a value of the given type can have at runtime.
    ///
    /// For an object type, this is only itself.
    /// Empty for non-composite or unknown types.
    pub fn possible_types(&self, type_name: &str) -> Vec<&Name> {
        match self.types.get(type_name) {
            Some(ExtendedType::Object(def)) => vec![&def.name],
            Some(ExtendedType::Interface(def)) => self
                .implementers
                .get(&def.name)
                .map(|objects| objects.iter().collect())
                .unwrap_or_default(),
            Some(ExtendedType::Union(def)) => def.members.iter().collect(),
            _ => Vec::new(),
        }
    }

    /// Returns whether `object_type` is among the possible types of `abstract_type`
    pub fn is_possible_type(&self, abstract_type: &str, object_type: &str) -> bool {
        self.possible_types(abstract_type)
            .iter()
            .any(|name| *name == object_type)
    }

    /// Returns whether the type `maybe_subtype` is the same as or a subtype of `abstract_type`
    pub fn is_subtype(&self, abstract_type: &str, maybe_subtype: &str) -> bool {
        if abstract_type == maybe_subtype {
            return true;
        }
        match self.types.get(maybe_subtype) {
            Some(ExtendedType::Object(def)) => self.is_possible_type(abstract_type, &def.name),
            Some(ExtendedType::Interface(def)) => def
                .implements_interfaces
                .iter()
                .any(|name| name == abstract_type),
            _ => false,
        }
    }

    /// Returns whether the type with the given name is defined and can be used as an input
    pub fn is_input_type(&self, ty: &Type) -> bool {
        self.types
            .get(ty.inner_named_type())
            .is_some_and(ExtendedType::is_input_type)
    }

    /// Returns whether the type with the given name is defined and can be used as an output
    pub fn is_output_type(&self, ty: &Type) -> bool {
        self.types
            .get(ty.inner_named_type())
            .is_some_and(ExtendedType::is_output_type)
    }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("query_type", &self.query_type)
            .field("mutation_type", &self.mutation_type)
            .field("subscription_type", &self.subscription_type)
            .field("types", &self.types.keys().collect::<Vec<_>>())
            .field(
                "directive_definitions",
                &self.directive_definitions.keys().collect::<Vec<_>>(),
            )
            .finish_non_exhaustive()
    }
}

impl ExtendedType {
    pub fn name(&self) -> &Name {
        match self {
            Self::Scalar(ty) => &ty.name,
            Self::Object(ty) => &ty.name,
            Self::Interface(ty) => &ty.name,
            Self::Union(ty) => &ty.name,
            Self::Enum(ty) => &ty.name,
            Self::InputObject(ty) => &ty.name,
        }
    }

    pub fn description(&self) -> Option<&str> {
        match self {
            Self::Scalar(ty) => ty.description.as_deref(),
            Self::Object(ty) => ty.description.as_deref(),
            Self::Interface(ty) => ty.description.as_deref(),
            Self::Union(ty) => ty.description.as_deref(),
            Self::Enum(ty) => ty.description.as_deref(),
            Self::InputObject(ty) => ty.description.as_deref(),
        }
    }

    /// Directive applications on the type definition and its extensions
    pub fn directive_invocations(&self) -> &[DirectiveInvocation] {
        match self {
            Self::Scalar(ty) => &ty.directives,
            Self::Object(ty) => &ty.directives,
            Self::Interface(ty) => &ty.directives,
            Self::Union(ty) => &ty.directives,
            Self::Enum(ty) => &ty.directives,
            Self::InputObject(ty) => &ty.directives,
        }
    }

    pub(crate) fn directive_invocations_mut(&mut self) -> &mut Vec<DirectiveInvocation> {
        match self {
            Self::Scalar(ty) => &mut ty.make_mut().directives,
            Self::Object(ty) => &mut ty.make_mut().directives,
            Self::Interface(ty) => &mut ty.make_mut().directives,
            Self::Union(ty) => &mut ty.make_mut().directives,
            Self::Enum(ty) => &mut ty.make_mut().directives,
            Self::InputObject(ty) => &mut ty.make_mut().directives,
        }
    }

    pub fn location(&self) -> Option<crate::NodeLocation> {
        match self {
            Self::Scalar(ty) => ty.location(),
            Self::Object(ty) => ty.location(),
            Self::Interface(ty) => ty.location(),
            Self::Union(ty) => ty.location(),
            Self::Enum(ty) => ty.location(),
            Self::InputObject(ty) => ty.location(),
        }
    }

    /// The `__TypeKind` of this type, as exposed by introspection
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Scalar(_) => "SCALAR",
            Self::Object(_) => "OBJECT",
            Self::Interface(_) => "INTERFACE",
            Self::Union(_) => "UNION",
            Self::Enum(_) => "ENUM",
            Self::InputObject(_) => "INPUT_OBJECT",
        }
    }

    /// Returns whether this type was defined by the built-in SDL
    pub fn is_built_in(&self) -> bool {
        match self {
            Self::Scalar(ty) => ty.is_built_in(),
            Self::Object(ty) => ty.is_built_in(),
            Self::Interface(ty) => ty.is_built_in(),
            Self::Union(ty) => ty.is_built_in(),
            Self::Enum(ty) => ty.is_built_in(),
            Self::InputObject(ty) => ty.is_built_in(),
        }
    }

    pub fn is_scalar(&self) -> bool {
        matches!(self, Self::Scalar(_))
    }

    pub fn is_object(&self) -> bool {
        matches!(self, Self::Object(_))
    }

    pub fn is_interface(&self) -> bool {
        matches!(self, Self::Interface(_))
    }

    pub fn is_union(&self) -> bool {
        matches!(self, Self::Union(_))
    }

    pub fn is_enum(&self) -> bool {
        matches!(self, Self::Enum(_))
    }

    pub fn is_input_object(&self) -> bool {
        matches!(self, Self::InputObject(_))
    }

    /// Scalars and enums
    pub fn is_leaf(&self) -> bool {
        matches!(self, Self::Scalar(_) | Self::Enum(_))
    }

    /// Objects, interfaces and unions: types that have a selection set
    pub fn is_composite(&self) -> bool {
        matches!(self, Self::Object(_) | Self::Interface(_) | Self::Union(_))
    }

    /// Interfaces and unions
    pub fn is_abstract(&self) -> bool {
        matches!(self, Self::Interface(_) | Self::Union(_))
    }

    pub fn is_input_type(&self) -> bool {
        matches!(self, Self::Scalar(_) | Self::Enum(_) | Self::InputObject(_))
    }

    pub fn is_output_type(&self) -> bool {
        !self.is_input_object()
    }
}

impl fmt::Debug for ExtendedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.kind(), self.name())
    }
}

impl ObjectType {
    /// Returns whether this object type declares it implements the given interface
    pub fn implements(&self, interface: &str) -> bool {
        self.implements_interfaces.iter().any(|name| name == interface)
    }
}

impl FieldDefinition {
    /// Returns the definition of the argument with the given name
    pub fn argument_by_name(&self, name: &str) -> Option<&Node<InputValueDefinition>> {
        self.arguments.iter().find(|arg| arg.name == name)
    }

    pub fn is_deprecated(&self) -> bool {
        self.deprecation_reason.is_some()
    }
}

impl DirectiveDefinition {
    /// Returns the definition of the argument with the given name
    pub fn argument_by_name(&self, name: &str) -> Option<&Node<InputValueDefinition>> {
        self.arguments.iter().find(|arg| arg.name == name)
    }
}

impl InputValueDefinition {
    /// Returns whether a value must be given: the type is non-null and there is no default
    pub fn is_required(&self) -> bool {
        self.ty.is_non_null() && self.default_value.is_none()
    }
}

impl fmt::Debug for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScalarType")
            .field("name", &self.name)
            .field("directives", &self.directives)
            .field("specified_by_url", &self.specified_by_url)
            .finish_non_exhaustive()
    }
}

impl fmt::Debug for InterfaceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterfaceType")
            .field("name", &self.name)
            .field("implements_interfaces", &self.implements_interfaces)
            .field("fields", &self.fields)
            .finish_non_exhaustive()
    }
}

impl fmt::Debug for UnionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnionType")
            .field("name", &self.name)
            .field("members", &self.members)
            .finish_non_exhaustive()
    }
}

impl fmt::Debug for FieldDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDefinition")
            .field("name", &self.name)
            .field("arguments", &self.arguments)
            .field("ty", &self.ty)
            .field("directives", &self.directives)
            .field("deprecation_reason", &self.deprecation_reason)
            .finish_non_exhaustive()
    }
}

impl fmt::Debug for DirectiveDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DirectiveDefinition")
            .field("name", &self.name)
            .field("arguments", &self.arguments)
            .field("repeatable", &self.repeatable)
            .field("locations", &self.locations)
            .finish_non_exhaustive()
    }
}
