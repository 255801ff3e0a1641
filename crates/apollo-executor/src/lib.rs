#![doc = include_str!("../README.md")]

pub mod ast;
pub mod directives;
pub mod executable;
pub mod execution;
mod name;
mod node;
pub mod parser;
pub mod schema;
pub mod validation;

pub use self::directives::Directive;
pub use self::executable::ExecutableOperation;
pub use self::execution::Context;
pub use self::execution::Engine;
pub use self::execution::EngineBuilder;
pub use self::execution::FieldError;
pub use self::execution::FieldResult;
pub use self::execution::GraphQLError;
pub use self::execution::JsonMap;
pub use self::execution::JsonValue;
pub use self::execution::Request;
pub use self::execution::ResolveInfo;
pub use self::execution::ResolveParams;
pub use self::execution::Resolver;
pub use self::execution::Response;
pub use self::execution::TypeResolver;
pub use self::name::InvalidNameError;
pub use self::name::Name;
pub use self::node::FileId;
pub use self::node::Node;
pub use self::node::NodeLocation;
pub use self::parser::Parser;
pub use self::schema::Scalar;
pub use self::schema::Schema;
pub use self::schema::SchemaBuilder;
pub use self::validation::Validator;
