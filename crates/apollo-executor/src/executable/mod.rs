//! Executable plans, compiled from a GraphQL document against a [`Schema`].
//!
//! An [`ExecutableOperation`] is the selected operation of a document
//! with every fragment spread and inline fragment inlined,
//! each field bound to its definition and its directives bound to their implementations.
//! What can only be known at execution (variable-dependent arguments,
//! `@skip` / `@include` with variables, type conditions on abstract types)
//! is kept on each [`ExecutableField`] to be evaluated per request.

use crate::ast;
use crate::ast::OperationType;
use crate::directives::DirectiveInvocation;
use crate::execution::input_coercion::ArgumentError;
use crate::execution::JsonMap;
use crate::parser::SourceMap;
use crate::schema::DirectiveDefinition;
use crate::schema::FieldDefinition;
use crate::Name;
use crate::Node;
use crate::NodeLocation;
use crate::Schema;
use std::sync::Arc;

mod compiler;

/// The operation of a request, compiled and ready to be executed any number of times
#[derive(Debug, Clone)]
pub struct ExecutableOperation {
    pub name: Option<Name>,
    pub operation_type: OperationType,

    /// Name of the object type this operation is executed on
    pub root_type: Name,

    pub variables: Vec<Node<ast::VariableDefinition>>,

    pub directives: ast::DirectiveList,

    pub selection_set: SelectionSet,

    /// `false` for mutations: their top-level fields are executed one after the other
    pub allow_parallelization: bool,

    /// The request document, for locations in errors
    pub sources: SourceMap,

    pub(crate) location: Option<NodeLocation>,
}

#[derive(Debug, Clone, Default)]
pub struct SelectionSet {
    /// In document order, with fragments inlined.
    /// Several fields can share a response key: they are merged at execution
    /// for the object type they apply to.
    pub fields: Vec<Arc<ExecutableField>>,
}

/// One or more selections of the same field under the same response key
#[derive(Debug, Clone)]
pub struct ExecutableField {
    /// The alias if any, else the field name
    pub response_key: Name,

    pub name: Name,

    /// The type the field was selected on: the enclosing fragment’s type condition if any,
    /// else the type of the parent field
    pub parent_type: Name,

    /// `None` if the field is not defined on `parent_type`
    pub definition: Option<Node<FieldDefinition>>,

    pub arguments: Vec<Node<ast::Argument>>,

    /// Arguments coerced once at compile time, when none of them references a variable
    pub(crate) static_arguments: Option<Result<JsonMap, Vec<ArgumentError>>>,

    /// Query directives other than `@skip` and `@include`,
    /// including those of enclosing fragments
    pub directives: Vec<ExecutableDirective>,

    /// All must hold for the field to be executed on a given object
    pub conditions: Vec<Condition>,

    pub selection_set: SelectionSet,

    /// Syntax nodes merged into this field, at least one
    pub nodes: Vec<Node<ast::Field>>,
}

/// A directive of the request document, bound to its definition
#[derive(Debug, Clone)]
pub struct ExecutableDirective {
    pub name: Name,
    pub arguments: Vec<Node<ast::Argument>>,
    pub location: Option<NodeLocation>,
    pub definition: Node<DirectiveDefinition>,

    /// Set when the arguments have no variable and were coerced successfully
    pub(crate) static_invocation: Option<DirectiveInvocation>,
}

/// Must hold at execution for a field to be part of the response
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    /// The object type must be, implement, or be a member of this type
    TypeCondition(Name),
    /// From `@skip(if: $var)`
    Skip(Node<ast::Value>),
    /// From `@include(if: $var)`
    Include(Node<ast::Value>),
}

/// An operation could not be selected from a request document
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompileError {
    #[error("Unknown operation named < {name} >.")]
    UnknownOperation { name: String },

    #[error("Must provide operation name if query contains multiple operations.")]
    MissingOperationName,

    #[error("Must provide an operation.")]
    NoOperation,

    #[error("Schema is not configured to execute {operation_type} operation.")]
    UnsupportedRootOperation {
        operation_type: &'static str,
        location: Option<NodeLocation>,
    },
}

impl ExecutableOperation {
    /// Select an operation of `document` and compile it.
    ///
    /// `document` is expected to be valid against `schema`:
    /// what validation would reject is not reported here,
    /// but surfaces as field errors at execution.
    pub fn compile(
        schema: &Schema,
        document: &ast::Document,
        operation_name: Option<&str>,
    ) -> Result<Self, CompileError> {
        compiler::compile_operation(schema, document, operation_name)
    }

    /// Returns whether this is a `mutation` operation
    pub fn is_mutation(&self) -> bool {
        self.operation_type.is_mutation()
    }

    pub fn location(&self) -> Option<NodeLocation> {
        self.location
    }
}

impl ExecutableField {
    /// Location of the first syntax node
    pub fn location(&self) -> Option<NodeLocation> {
        self.nodes.first().and_then(|node| node.location())
    }

    /// Returns whether this field is executed regardless of variables and runtime types
    pub fn is_unconditional(&self) -> bool {
        self.conditions.is_empty()
    }
}

impl CompileError {
    pub(crate) fn location(&self) -> Option<NodeLocation> {
        match self {
            Self::UnsupportedRootOperation { location, .. } => *location,
            _ => None,
        }
    }
}
