use super::*;
use crate::directives::built_in_directives;
use crate::directives::BuildNext;
use crate::directives::SchemaElement;
use crate::execution::coerce_arguments;
use crate::execution::value_from_ast;
use crate::execution::DefaultResolver;
use crate::execution::DefaultTypeResolver;
use crate::execution::FieldResult;
use crate::execution::JsonValue;
use crate::execution::ResolveInfo;
use crate::execution::ResolveParams;
use crate::parser::Parser;
use crate::parser::SyntaxError;
use crate::FileId;
use futures::future::BoxFuture;
use std::collections::HashSet;
use std::path::Path;
use std::path::PathBuf;

const BUILT_IN_SDL: &str = include_str!("built_in.graphql");

/// Builds a [`Schema`] from SDL and implementations.
///
/// Building ("baking") parses every document together with built-in definitions,
/// folds type extensions into their definitions, binds implementations
/// and directive applications, runs the [`on_build`][crate::Directive::on_build]
/// hooks, then composes output coercers.
#[derive(Default)]
pub struct SchemaBuilder {
    parser: Parser,
    documents: Vec<(String, PathBuf)>,
    resolvers: Vec<(String, Arc<dyn Resolver>)>,
    type_resolvers: Vec<(String, Arc<dyn TypeResolver>)>,
    scalars: Vec<(String, Arc<dyn Scalar>)>,
    directives: Vec<(String, Arc<dyn Directive>)>,
}

/// A problem found while building a schema
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BuildError {
    #[error("{path}: {error}")]
    Syntax { path: String, error: SyntaxError },
    #[error("the type `{name}` is defined multiple times")]
    DuplicateType { name: Name },
    #[error("the directive `@{name}` is defined multiple times")]
    DuplicateDirective { name: Name },
    #[error("the schema definition is defined multiple times")]
    DuplicateSchemaDefinition,
    #[error("the field `{coordinate}` is defined multiple times")]
    DuplicateField { coordinate: String },
    #[error("cannot extend `{name}`: no such type is defined")]
    ExtensionOfUndefinedType { name: Name },
    #[error("cannot extend `{name}` with an extension of a different kind")]
    ExtensionKindMismatch { name: Name },
    #[error("cannot find type `{name}` referenced by {referrer}")]
    UndefinedType { name: Name, referrer: String },
    #[error("no implementation was given for the custom scalar `{name}`")]
    MissingScalarImplementation { name: Name },
    #[error("an implementation was given for the scalar `{name}` but no such scalar is defined")]
    UnknownScalarImplementation { name: String },
    #[error("no implementation was given for the directive `@{name}`")]
    MissingDirectiveImplementation { name: Name },
    #[error(
        "an implementation was given for the directive `@{name}` but no such directive is defined"
    )]
    UnknownDirectiveImplementation { name: String },
    #[error("a resolver was given for `{coordinate}` but no such object type field is defined")]
    UnknownResolverCoordinate { coordinate: String },
    #[error("a type resolver was given for `{name}` which is not an interface or union type")]
    InvalidTypeResolver { name: String },
    #[error("the schema has no query root type")]
    MissingQueryType,
    #[error("the {operation_type} root type `{name}` is not an object type")]
    RootNotObject {
        operation_type: OperationType,
        name: Name,
    },
    #[error("`{type_name}` implements `{interface}` which is not an interface type")]
    ImplementsNonInterface { type_name: Name, interface: Name },
    #[error("`{type_name}` implements `{interface}` but does not define its field `{field}`")]
    MissingInterfaceField {
        type_name: Name,
        interface: Name,
        field: Name,
    },
    #[error("the union `{union}` has the member `{member}` which is not an object type")]
    UnionMemberNotObject { union: Name, member: Name },
    #[error("{referrer} has the type `{ty}` which is not an output type")]
    NotOutputType { referrer: String, ty: Type },
    #[error("{referrer} has the type `{ty}` which is not an input type")]
    NotInputType { referrer: String, ty: Type },
    #[error("the default value of {referrer} is not a valid `{ty}`")]
    InvalidDefaultValue { referrer: String, ty: Type },
    #[error("cannot find directive `@{name}` applied on {referrer}")]
    UndefinedDirective { name: Name, referrer: String },
    #[error("the directive `@{name}` cannot be applied on {referrer}")]
    DirectiveLocation { name: Name, referrer: String },
    #[error("the directive `@{name}` is not repeatable but is applied multiple times on {referrer}")]
    RepeatedDirective { name: Name, referrer: String },
    #[error("invalid application of `@{name}` on {referrer}: {message}")]
    InvalidDirectiveArguments {
        name: Name,
        referrer: String,
        message: String,
    },
    #[error("a directive failed on {referrer}: {message}")]
    DirectiveBuild { referrer: String, message: String },
}

/// Every problem found while building a schema
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}", DisplayErrors(.0))]
pub struct BuildErrors(pub Vec<BuildError>);

struct DisplayErrors<'a>(&'a [BuildError]);

impl fmt::Display for DisplayErrors<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?
            }
            write!(f, "{error}")?
        }
        Ok(())
    }
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use the given parser configuration for SDL documents
    pub fn parser(mut self, parser: Parser) -> Self {
        self.parser = parser;
        self
    }

    /// Add a type system document.
    ///
    /// `path` identifies the document in errors.
    /// Executable definitions, if any, are ignored.
    pub fn add_sdl(mut self, source_text: impl Into<String>, path: impl AsRef<Path>) -> Self {
        self.documents
            .push((source_text.into(), path.as_ref().to_owned()));
        self
    }

    /// Register the resolver of an object type field, by coordinate: `"Type.field"`
    pub fn resolver<F>(self, coordinate: &str, resolver: F) -> Self
    where
        F: for<'a> Fn(ResolveParams<'a>) -> BoxFuture<'a, FieldResult> + Send + Sync + 'static,
    {
        self.resolver_impl(coordinate, resolver)
    }

    /// Like [`resolver`][Self::resolver], for any implementation of the [`Resolver`] trait
    pub fn resolver_impl(mut self, coordinate: &str, resolver: impl Resolver) -> Self {
        self.resolvers
            .push((coordinate.to_owned(), Arc::new(resolver)));
        self
    }

    /// Register how to find the concrete object type of values of an interface or union type
    pub fn type_resolver<F>(mut self, type_name: &str, type_resolver: F) -> Self
    where
        F: Fn(&JsonValue, &ResolveInfo<'_>) -> Option<Name> + Send + Sync + 'static,
    {
        self.type_resolvers
            .push((type_name.to_owned(), Arc::new(type_resolver)));
        self
    }

    /// Register the implementation of a custom scalar, or replace a built-in one
    pub fn scalar(mut self, name: &str, implementation: impl Scalar) -> Self {
        self.scalars
            .push((name.to_owned(), Arc::new(implementation)));
        self
    }

    /// Register the implementation of a directive, or replace a built-in one
    pub fn directive(mut self, name: &str, implementation: impl Directive) -> Self {
        self.directives
            .push((name.to_owned(), Arc::new(implementation)));
        self
    }

    /// Bake the schema.
    ///
    /// Problems are collected per stage:
    /// when a stage reports any, later stages that depend on it do not run.
    pub fn build(self) -> Result<Schema, BuildErrors> {
        let mut errors = Vec::new();

        let mut documents = Vec::new();
        let built_in = self.parser.parse_with_file_id(
            BUILT_IN_SDL.to_owned(),
            "built_in.graphql".into(),
            FileId::BUILT_IN,
        );
        documents.push(collect_syntax_errors(built_in, "built_in.graphql", &mut errors));
        for (source_text, path) in &self.documents {
            let result = self.parser.parse_ast(source_text.as_str(), path);
            let path = path.display().to_string();
            documents.push(collect_syntax_errors(result, &path, &mut errors));
        }
        let mut sources = IndexMap::new();
        for document in &documents {
            sources.extend(document.sources.iter().map(|(id, file)| (*id, file.clone())));
        }

        let drafts = Drafts::collect(&documents, &mut errors);
        let directive_implementations = self.directive_implementations(&drafts, &mut errors);
        let scalar_implementations = self.scalar_implementations(&drafts, &mut errors);
        if !errors.is_empty() {
            return Err(BuildErrors(errors));
        }

        let mut converter = Converter::new(&drafts);
        let directive_definitions = drafts
            .directives
            .iter()
            .filter_map(|(name, def)| {
                let implementation = directive_implementations.get(name)?.clone();
                Some((name.clone(), converter.directive_definition(def, implementation)))
            })
            .collect();
        let mut types = IndexMap::new();
        for (name, draft) in &drafts.types {
            if let Some(ty) = converter.extended_type(name, draft, &scalar_implementations) {
                types.insert(name.clone(), ty);
            }
        }
        let roots = drafts.root_operations(&types, &mut converter);
        errors.append(&mut converter.errors);
        let Some(query_type) = roots.query else {
            errors.push(BuildError::MissingQueryType);
            return Err(BuildErrors(errors));
        };

        let mut implementers = HashMap::<Name, Vec<Name>>::new();
        for ty in types.values() {
            if let ExtendedType::Object(def) = ty {
                for interface in &def.implements_interfaces {
                    implementers
                        .entry(interface.clone())
                        .or_default()
                        .push(def.name.clone())
                }
            }
        }
        let mut schema = Schema {
            sources: Arc::new(sources),
            description: drafts
                .schema_definition
                .as_ref()
                .and_then(|def| def.description.clone()),
            query_type,
            mutation_type: roots.mutation,
            subscription_type: roots.subscription,
            types,
            directive_definitions,
            directives: Vec::new(),
            implementers,
            meta_fields: introspection::meta_fields(),
        };

        check_references(&schema, &mut errors);
        if !errors.is_empty() {
            return Err(BuildErrors(errors));
        }

        self.bind_resolvers(&mut schema, &mut errors);

        let bound = bind_directives(&schema, &converter.pending, &mut errors);
        for (target, invocations) in &bound {
            if let Target::Schema = target {
                schema.directives = invocations.clone();
            } else if let Some(mut element) = element_mut(&mut schema, target) {
                *directives_mut(&mut element) = invocations.clone();
            }
        }
        for (target, invocations) in &bound {
            let Some(element) = element_mut(&mut schema, target) else {
                continue;
            };
            if let Err(message) = BuildNext::new(invocations).run(element) {
                errors.push(BuildError::DirectiveBuild {
                    referrer: target.to_string(),
                    message,
                })
            }
        }

        compose_coercers(&mut schema);
        if errors.is_empty() {
            tracing::debug!(types = schema.types.len(), "schema built");
            Ok(schema)
        } else {
            Err(BuildErrors(errors))
        }
    }

    fn directive_implementations(
        &self,
        drafts: &Drafts,
        errors: &mut Vec<BuildError>,
    ) -> HashMap<Name, Arc<dyn Directive>> {
        let mut implementations: HashMap<&str, Arc<dyn Directive>> =
            built_in_directives().into_iter().collect();
        for (name, implementation) in &self.directives {
            if drafts.directives.contains_key(name.as_str()) {
                implementations.insert(name, implementation.clone());
            } else {
                errors.push(BuildError::UnknownDirectiveImplementation { name: name.clone() })
            }
        }
        let mut bound = HashMap::new();
        for name in drafts.directives.keys() {
            match implementations.get(name.as_str()) {
                Some(implementation) => {
                    bound.insert(name.clone(), implementation.clone());
                }
                None => errors.push(BuildError::MissingDirectiveImplementation { name: name.clone() }),
            }
        }
        bound
    }

    fn scalar_implementations(
        &self,
        drafts: &Drafts,
        errors: &mut Vec<BuildError>,
    ) -> HashMap<Name, Arc<dyn Scalar>> {
        let is_scalar = |name: &str| {
            drafts.types.get(name).is_some_and(|draft| {
                matches!(draft.definition, ast::Definition::ScalarTypeDefinition(_))
            })
        };
        let mut implementations: HashMap<&str, Arc<dyn Scalar>> =
            scalars::built_in_scalars().into_iter().collect();
        for (name, implementation) in &self.scalars {
            if is_scalar(name) {
                implementations.insert(name, implementation.clone());
            } else {
                errors.push(BuildError::UnknownScalarImplementation { name: name.clone() })
            }
        }
        let mut bound = HashMap::new();
        for (name, draft) in &drafts.types {
            if let ast::Definition::ScalarTypeDefinition(_) = draft.definition {
                match implementations.get(name.as_str()) {
                    Some(implementation) => {
                        bound.insert(name.clone(), implementation.clone());
                    }
                    None => errors
                        .push(BuildError::MissingScalarImplementation { name: name.clone() }),
                }
            }
        }
        bound
    }

    fn bind_resolvers(&self, schema: &mut Schema, errors: &mut Vec<BuildError>) {
        let resolvers = introspection::resolvers()
            .into_iter()
            .chain(self.resolvers.iter().cloned());
        for (coordinate, resolver) in resolvers {
            let field = match coordinate.split_once('.') {
                Some((type_name, field_name)) => match schema.types.get_mut(type_name) {
                    Some(ExtendedType::Object(def)) => def.make_mut().fields.get_mut(field_name),
                    _ => None,
                },
                None => None,
            };
            match field {
                Some(field) => field.make_mut().resolver = resolver,
                None => errors.push(BuildError::UnknownResolverCoordinate { coordinate }),
            }
        }
        for (name, type_resolver) in &self.type_resolvers {
            match schema.types.get_mut(name.as_str()) {
                Some(ExtendedType::Interface(def)) => {
                    def.make_mut().type_resolver = type_resolver.clone()
                }
                Some(ExtendedType::Union(def)) => def.make_mut().type_resolver = type_resolver.clone(),
                _ => errors.push(BuildError::InvalidTypeResolver { name: name.clone() }),
            }
        }
    }
}

fn collect_syntax_errors(
    result: Result<ast::Document, crate::parser::ParseError>,
    path: &str,
    errors: &mut Vec<BuildError>,
) -> ast::Document {
    match result {
        Ok(document) => document,
        Err(error) => {
            errors.extend(error.errors.into_iter().map(|error| BuildError::Syntax {
                path: path.to_owned(),
                error,
            }));
            error.partial
        }
    }
}

/// Type system definitions grouped by name, before conversion
#[derive(Default)]
struct Drafts {
    schema_definition: Option<Node<ast::SchemaDefinition>>,
    schema_extensions: Vec<Node<ast::SchemaExtension>>,
    directives: IndexMap<Name, Node<ast::DirectiveDefinition>>,
    types: IndexMap<Name, TypeDraft>,
}

struct TypeDraft {
    definition: ast::Definition,
    extensions: Vec<ast::Definition>,
}

#[derive(Default)]
struct RootOperations {
    query: Option<Name>,
    mutation: Option<Name>,
    subscription: Option<Name>,
}

impl Drafts {
    fn collect(documents: &[ast::Document], errors: &mut Vec<BuildError>) -> Self {
        let mut drafts = Self::default();
        let definitions = || documents.iter().flat_map(|doc| &doc.definitions);
        for definition in definitions() {
            match definition {
                ast::Definition::SchemaDefinition(def) => {
                    if drafts.schema_definition.is_some() {
                        errors.push(BuildError::DuplicateSchemaDefinition)
                    } else {
                        drafts.schema_definition = Some(def.clone())
                    }
                }
                ast::Definition::DirectiveDefinition(def) => {
                    if drafts.directives.contains_key(&def.name) {
                        errors.push(BuildError::DuplicateDirective {
                            name: def.name.clone(),
                        })
                    } else {
                        drafts.directives.insert(def.name.clone(), def.clone());
                    }
                }
                ast::Definition::ScalarTypeDefinition(_)
                | ast::Definition::ObjectTypeDefinition(_)
                | ast::Definition::InterfaceTypeDefinition(_)
                | ast::Definition::UnionTypeDefinition(_)
                | ast::Definition::EnumTypeDefinition(_)
                | ast::Definition::InputObjectTypeDefinition(_) => {
                    let Some(name) = definition.name() else {
                        continue;
                    };
                    if drafts.types.contains_key(name) {
                        errors.push(BuildError::DuplicateType { name: name.clone() })
                    } else {
                        drafts.types.insert(
                            name.clone(),
                            TypeDraft {
                                definition: definition.clone(),
                                extensions: Vec::new(),
                            },
                        );
                    }
                }
                _ => {}
            }
        }
        for definition in definitions() {
            match definition {
                ast::Definition::SchemaExtension(ext) => {
                    drafts.schema_extensions.push(ext.clone())
                }
                ast::Definition::ScalarTypeExtension(_)
                | ast::Definition::ObjectTypeExtension(_)
                | ast::Definition::InterfaceTypeExtension(_)
                | ast::Definition::UnionTypeExtension(_)
                | ast::Definition::EnumTypeExtension(_)
                | ast::Definition::InputObjectTypeExtension(_) => {
                    let Some(name) = definition.name() else {
                        continue;
                    };
                    match drafts.types.get_mut(name) {
                        Some(draft) => draft.extensions.push(definition.clone()),
                        None => errors
                            .push(BuildError::ExtensionOfUndefinedType { name: name.clone() }),
                    }
                }
                _ => {}
            }
        }
        drafts
    }

    /// Explicit root operations, or the default type names without a schema definition
    fn root_operations(
        &self,
        types: &IndexMap<Name, ExtendedType>,
        converter: &mut Converter,
    ) -> RootOperations {
        let mut roots = RootOperations::default();
        let explicit = self
            .schema_definition
            .iter()
            .flat_map(|def| &def.root_operations)
            .chain(self.schema_extensions.iter().flat_map(|ext| &ext.root_operations));
        let mut directives = Vec::new();
        if let Some(def) = &self.schema_definition {
            directives.extend(def.directives.iter().cloned());
        }
        for ext in &self.schema_extensions {
            directives.extend(ext.directives.iter().cloned());
        }
        converter.defer(Target::Schema, directives);

        let mut has_explicit = false;
        for root in explicit {
            has_explicit = true;
            let (operation_type, name) = &**root;
            let slot = match operation_type {
                OperationType::Query => &mut roots.query,
                OperationType::Mutation => &mut roots.mutation,
                OperationType::Subscription => &mut roots.subscription,
            };
            match types.get(name) {
                Some(ExtendedType::Object(_)) => {
                    slot.get_or_insert_with(|| name.clone());
                }
                Some(_) => converter.errors.push(BuildError::RootNotObject {
                    operation_type: *operation_type,
                    name: name.clone(),
                }),
                None => converter.errors.push(BuildError::UndefinedType {
                    name: name.clone(),
                    referrer: format!("the {operation_type} root operation"),
                }),
            }
        }
        if !has_explicit {
            let if_has_object_type = |operation_type: OperationType| {
                let name = operation_type.default_type_name();
                types.get(&name)?.is_object().then_some(name)
            };
            roots.query = if_has_object_type(OperationType::Query);
            roots.mutation = if_has_object_type(OperationType::Mutation);
            roots.subscription = if_has_object_type(OperationType::Subscription);
        }
        roots
    }
}

/// A schema element whose directive applications are bound after conversion
#[derive(Debug, Clone)]
enum Target {
    Schema,
    Type(Name),
    Field(Name, Name),
    Argument(Name, Name, Name),
    EnumValue(Name, Name),
    InputField(Name, Name),
    DirectiveArgument(Name, Name),
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Schema => write!(f, "the schema definition"),
            Target::Type(ty) => write!(f, "the type `{ty}`"),
            Target::Field(ty, field) => write!(f, "the field `{ty}.{field}`"),
            Target::Argument(ty, field, arg) => write!(f, "the argument `{ty}.{field}({arg}:)`"),
            Target::EnumValue(ty, value) => write!(f, "the enum value `{ty}.{value}`"),
            Target::InputField(ty, field) => write!(f, "the input field `{ty}.{field}`"),
            Target::DirectiveArgument(directive, arg) => {
                write!(f, "the argument `@{directive}({arg}:)`")
            }
        }
    }
}

impl Target {
    fn directive_location(&self, schema: &Schema) -> Option<DirectiveLocation> {
        Some(match self {
            Target::Schema => DirectiveLocation::Schema,
            Target::Type(name) => match schema.types.get(name)? {
                ExtendedType::Scalar(_) => DirectiveLocation::Scalar,
                ExtendedType::Object(_) => DirectiveLocation::Object,
                ExtendedType::Interface(_) => DirectiveLocation::Interface,
                ExtendedType::Union(_) => DirectiveLocation::Union,
                ExtendedType::Enum(_) => DirectiveLocation::Enum,
                ExtendedType::InputObject(_) => DirectiveLocation::InputObject,
            },
            Target::Field(..) => DirectiveLocation::FieldDefinition,
            Target::Argument(..) | Target::DirectiveArgument(..) => {
                DirectiveLocation::ArgumentDefinition
            }
            Target::EnumValue(..) => DirectiveLocation::EnumValue,
            Target::InputField(..) => DirectiveLocation::InputFieldDefinition,
        })
    }
}

struct PendingDirectives {
    target: Target,
    directives: Vec<Node<ast::Directive>>,
}

/// Converts drafts to schema types, deferring directive applications
struct Converter {
    composite_types: HashSet<Name>,
    pending: Vec<PendingDirectives>,
    errors: Vec<BuildError>,
}

impl Converter {
    fn new(drafts: &Drafts) -> Self {
        let composite_types = drafts
            .types
            .iter()
            .filter(|(_, draft)| {
                matches!(
                    draft.definition,
                    ast::Definition::ObjectTypeDefinition(_)
                        | ast::Definition::InterfaceTypeDefinition(_)
                        | ast::Definition::UnionTypeDefinition(_)
                )
            })
            .map(|(name, _)| name.clone())
            .collect();
        Self {
            composite_types,
            pending: Vec::new(),
            errors: Vec::new(),
        }
    }

    fn defer(&mut self, target: Target, directives: Vec<Node<ast::Directive>>) {
        if !directives.is_empty() {
            self.pending.push(PendingDirectives { target, directives })
        }
    }

    fn kind_mismatch(&mut self, name: &Name) {
        self.errors
            .push(BuildError::ExtensionKindMismatch { name: name.clone() })
    }

    fn directive_definition(
        &mut self,
        def: &Node<ast::DirectiveDefinition>,
        implementation: Arc<dyn Directive>,
    ) -> Node<DirectiveDefinition> {
        let arguments = def
            .arguments
            .iter()
            .map(|arg| {
                let target = Target::DirectiveArgument(def.name.clone(), arg.name.clone());
                self.input_value(arg, target)
            })
            .collect();
        def.same_location(DirectiveDefinition {
            description: def.description.clone(),
            name: def.name.clone(),
            arguments,
            repeatable: def.repeatable,
            locations: def.locations.clone(),
            implementation,
        })
    }

    fn input_value(
        &mut self,
        def: &Node<ast::InputValueDefinition>,
        target: Target,
    ) -> Node<InputValueDefinition> {
        self.defer(target, def.directives.0.clone());
        def.same_location(InputValueDefinition {
            description: def.description.clone(),
            name: def.name.clone(),
            ty: def.ty.clone(),
            default_value: def.default_value.clone(),
            directives: Vec::new(),
            deprecation_reason: None,
        })
    }

    fn add_fields(
        &mut self,
        type_name: &Name,
        definitions: &[Node<ast::FieldDefinition>],
        fields: &mut IndexMap<Name, Node<FieldDefinition>>,
    ) {
        for def in definitions {
            if fields.contains_key(&def.name) {
                self.errors.push(BuildError::DuplicateField {
                    coordinate: format!("{type_name}.{}", def.name),
                });
                continue;
            }
            let arguments = def
                .arguments
                .iter()
                .map(|arg| {
                    let target =
                        Target::Argument(type_name.clone(), def.name.clone(), arg.name.clone());
                    self.input_value(arg, target)
                })
                .collect();
            self.defer(
                Target::Field(type_name.clone(), def.name.clone()),
                def.directives.0.clone(),
            );
            let field = def.same_location(FieldDefinition {
                description: def.description.clone(),
                name: def.name.clone(),
                arguments,
                ty: def.ty.clone(),
                directives: Vec::new(),
                deprecation_reason: None,
                resolver: Arc::new(DefaultResolver),
                coercer: OutputCoercer::for_type(&def.ty, &|name| {
                    self.composite_types.contains(name)
                }),
            });
            fields.insert(def.name.clone(), field);
        }
    }

    fn add_input_fields(
        &mut self,
        type_name: &Name,
        definitions: &[Node<ast::InputValueDefinition>],
        fields: &mut IndexMap<Name, Node<InputValueDefinition>>,
    ) {
        for def in definitions {
            if fields.contains_key(&def.name) {
                self.errors.push(BuildError::DuplicateField {
                    coordinate: format!("{type_name}.{}", def.name),
                });
                continue;
            }
            let target = Target::InputField(type_name.clone(), def.name.clone());
            let field = self.input_value(def, target);
            fields.insert(def.name.clone(), field);
        }
    }

    fn add_enum_values(
        &mut self,
        type_name: &Name,
        definitions: &[Node<ast::EnumValueDefinition>],
        values: &mut IndexMap<Name, Node<EnumValueDefinition>>,
    ) {
        for def in definitions {
            if values.contains_key(&def.value) {
                self.errors.push(BuildError::DuplicateField {
                    coordinate: format!("{type_name}.{}", def.value),
                });
                continue;
            }
            self.defer(
                Target::EnumValue(type_name.clone(), def.value.clone()),
                def.directives.0.clone(),
            );
            let value = def.same_location(EnumValueDefinition {
                description: def.description.clone(),
                value: def.value.clone(),
                directives: Vec::new(),
                deprecation_reason: None,
            });
            values.insert(def.value.clone(), value);
        }
    }

    fn extended_type(
        &mut self,
        name: &Name,
        draft: &TypeDraft,
        scalars: &HashMap<Name, Arc<dyn Scalar>>,
    ) -> Option<ExtendedType> {
        let mut directives = Vec::new();
        let ty = match &draft.definition {
            ast::Definition::ScalarTypeDefinition(def) => {
                directives.extend(def.directives.iter().cloned());
                for ext in &draft.extensions {
                    match ext {
                        ast::Definition::ScalarTypeExtension(ext) => {
                            directives.extend(ext.directives.iter().cloned())
                        }
                        _ => self.kind_mismatch(name),
                    }
                }
                ExtendedType::Scalar(def.same_location(ScalarType {
                    description: def.description.clone(),
                    name: name.clone(),
                    directives: Vec::new(),
                    specified_by_url: None,
                    implementation: scalars.get(name)?.clone(),
                }))
            }
            ast::Definition::ObjectTypeDefinition(def) => {
                directives.extend(def.directives.iter().cloned());
                let mut implements_interfaces = def.implements_interfaces.clone();
                let mut fields = IndexMap::new();
                self.add_fields(name, &def.fields, &mut fields);
                for ext in &draft.extensions {
                    match ext {
                        ast::Definition::ObjectTypeExtension(ext) => {
                            directives.extend(ext.directives.iter().cloned());
                            extend_unique(&mut implements_interfaces, &ext.implements_interfaces);
                            self.add_fields(name, &ext.fields, &mut fields);
                        }
                        _ => self.kind_mismatch(name),
                    }
                }
                ExtendedType::Object(def.same_location(ObjectType {
                    description: def.description.clone(),
                    name: name.clone(),
                    implements_interfaces,
                    directives: Vec::new(),
                    fields,
                }))
            }
            ast::Definition::InterfaceTypeDefinition(def) => {
                directives.extend(def.directives.iter().cloned());
                let mut implements_interfaces = def.implements_interfaces.clone();
                let mut fields = IndexMap::new();
                self.add_fields(name, &def.fields, &mut fields);
                for ext in &draft.extensions {
                    match ext {
                        ast::Definition::InterfaceTypeExtension(ext) => {
                            directives.extend(ext.directives.iter().cloned());
                            extend_unique(&mut implements_interfaces, &ext.implements_interfaces);
                            self.add_fields(name, &ext.fields, &mut fields);
                        }
                        _ => self.kind_mismatch(name),
                    }
                }
                ExtendedType::Interface(def.same_location(InterfaceType {
                    description: def.description.clone(),
                    name: name.clone(),
                    implements_interfaces,
                    directives: Vec::new(),
                    fields,
                    type_resolver: Arc::new(DefaultTypeResolver),
                }))
            }
            ast::Definition::UnionTypeDefinition(def) => {
                directives.extend(def.directives.iter().cloned());
                let mut members = def.members.clone();
                for ext in &draft.extensions {
                    match ext {
                        ast::Definition::UnionTypeExtension(ext) => {
                            directives.extend(ext.directives.iter().cloned());
                            extend_unique(&mut members, &ext.members);
                        }
                        _ => self.kind_mismatch(name),
                    }
                }
                ExtendedType::Union(def.same_location(UnionType {
                    description: def.description.clone(),
                    name: name.clone(),
                    directives: Vec::new(),
                    members,
                    type_resolver: Arc::new(DefaultTypeResolver),
                }))
            }
            ast::Definition::EnumTypeDefinition(def) => {
                directives.extend(def.directives.iter().cloned());
                let mut values = IndexMap::new();
                self.add_enum_values(name, &def.values, &mut values);
                for ext in &draft.extensions {
                    match ext {
                        ast::Definition::EnumTypeExtension(ext) => {
                            directives.extend(ext.directives.iter().cloned());
                            self.add_enum_values(name, &ext.values, &mut values);
                        }
                        _ => self.kind_mismatch(name),
                    }
                }
                ExtendedType::Enum(def.same_location(EnumType {
                    description: def.description.clone(),
                    name: name.clone(),
                    directives: Vec::new(),
                    values,
                }))
            }
            ast::Definition::InputObjectTypeDefinition(def) => {
                directives.extend(def.directives.iter().cloned());
                let mut fields = IndexMap::new();
                self.add_input_fields(name, &def.fields, &mut fields);
                for ext in &draft.extensions {
                    match ext {
                        ast::Definition::InputObjectTypeExtension(ext) => {
                            directives.extend(ext.directives.iter().cloned());
                            self.add_input_fields(name, &ext.fields, &mut fields);
                        }
                        _ => self.kind_mismatch(name),
                    }
                }
                ExtendedType::InputObject(def.same_location(InputObjectType {
                    description: def.description.clone(),
                    name: name.clone(),
                    directives: Vec::new(),
                    fields,
                }))
            }
            _ => return None,
        };
        self.defer(Target::Type(name.clone()), directives);
        Some(ty)
    }
}

fn extend_unique(names: &mut Vec<Name>, new: &[Name]) {
    for name in new {
        if !names.contains(name) {
            names.push(name.clone())
        }
    }
}

fn check_references(schema: &Schema, errors: &mut Vec<BuildError>) {
    for ty in schema.types.values() {
        match ty {
            ExtendedType::Object(def) => check_fields(
                schema,
                &def.name,
                &def.implements_interfaces,
                &def.fields,
                errors,
            ),
            ExtendedType::Interface(def) => check_fields(
                schema,
                &def.name,
                &def.implements_interfaces,
                &def.fields,
                errors,
            ),
            ExtendedType::Union(def) => {
                for member in &def.members {
                    match schema.types.get(member) {
                        Some(ExtendedType::Object(_)) => {}
                        Some(_) => errors.push(BuildError::UnionMemberNotObject {
                            union: def.name.clone(),
                            member: member.clone(),
                        }),
                        None => errors.push(BuildError::UndefinedType {
                            name: member.clone(),
                            referrer: format!("the union `{}`", def.name),
                        }),
                    }
                }
            }
            ExtendedType::InputObject(def) => {
                for field in def.fields.values() {
                    let referrer = || format!("the input field `{}.{}`", def.name, field.name);
                    check_input_value(schema, field, referrer, errors)
                }
            }
            ExtendedType::Scalar(_) | ExtendedType::Enum(_) => {}
        }
    }
    for def in schema.directive_definitions.values() {
        for arg in &def.arguments {
            let referrer = || format!("the argument `@{}({}:)`", def.name, arg.name);
            check_input_value(schema, arg, referrer, errors)
        }
    }
}

fn check_fields(
    schema: &Schema,
    type_name: &Name,
    implements_interfaces: &[Name],
    fields: &IndexMap<Name, Node<FieldDefinition>>,
    errors: &mut Vec<BuildError>,
) {
    for interface in implements_interfaces {
        match schema.types.get(interface) {
            Some(ExtendedType::Interface(def)) => {
                for field in def.fields.keys() {
                    if !fields.contains_key(field) {
                        errors.push(BuildError::MissingInterfaceField {
                            type_name: type_name.clone(),
                            interface: interface.clone(),
                            field: field.clone(),
                        })
                    }
                }
            }
            Some(_) => errors.push(BuildError::ImplementsNonInterface {
                type_name: type_name.clone(),
                interface: interface.clone(),
            }),
            None => errors.push(BuildError::UndefinedType {
                name: interface.clone(),
                referrer: format!("the type `{type_name}`"),
            }),
        }
    }
    for field in fields.values() {
        let referrer = || format!("the field `{type_name}.{}`", field.name);
        match schema.types.get(field.ty.inner_named_type()) {
            Some(ty) if ty.is_output_type() => {}
            Some(_) => errors.push(BuildError::NotOutputType {
                referrer: referrer(),
                ty: field.ty.clone(),
            }),
            None => errors.push(BuildError::UndefinedType {
                name: field.ty.inner_named_type().clone(),
                referrer: referrer(),
            }),
        }
        for arg in &field.arguments {
            let referrer = || format!("the argument `{type_name}.{}({}:)`", field.name, arg.name);
            check_input_value(schema, arg, referrer, errors)
        }
    }
}

fn check_input_value(
    schema: &Schema,
    def: &InputValueDefinition,
    referrer: impl Fn() -> String,
    errors: &mut Vec<BuildError>,
) {
    match schema.types.get(def.ty.inner_named_type()) {
        Some(ty) if ty.is_input_type() => {
            if let Some(default) = &def.default_value {
                if value_from_ast(schema, default, &def.ty, None).is_err() {
                    errors.push(BuildError::InvalidDefaultValue {
                        referrer: referrer(),
                        ty: (*def.ty).clone(),
                    })
                }
            }
        }
        Some(_) => errors.push(BuildError::NotInputType {
            referrer: referrer(),
            ty: (*def.ty).clone(),
        }),
        None => errors.push(BuildError::UndefinedType {
            name: def.ty.inner_named_type().clone(),
            referrer: referrer(),
        }),
    }
}

/// Binds each directive application to its definition and coerces its literal arguments
fn bind_directives(
    schema: &Schema,
    pending: &[PendingDirectives],
    errors: &mut Vec<BuildError>,
) -> Vec<(Target, Vec<DirectiveInvocation>)> {
    let mut bound = Vec::new();
    for PendingDirectives { target, directives } in pending {
        let Some(location) = target.directive_location(schema) else {
            continue;
        };
        let mut invocations = Vec::<DirectiveInvocation>::new();
        for directive in directives {
            let name = &directive.name;
            let Some(def) = schema.directive_definitions.get(name) else {
                errors.push(BuildError::UndefinedDirective {
                    name: name.clone(),
                    referrer: target.to_string(),
                });
                continue;
            };
            if !def.locations.contains(&location) {
                errors.push(BuildError::DirectiveLocation {
                    name: name.clone(),
                    referrer: target.to_string(),
                });
                continue;
            }
            if !def.repeatable && invocations.iter().any(|inv| inv.name == *name) {
                errors.push(BuildError::RepeatedDirective {
                    name: name.clone(),
                    referrer: target.to_string(),
                });
                continue;
            }
            match coerce_arguments(schema, &def.arguments, &directive.arguments, None) {
                Ok(arguments) => invocations.push(DirectiveInvocation {
                    name: name.clone(),
                    arguments,
                    location: directive.location(),
                    implementation: def.implementation.clone(),
                }),
                Err(argument_errors) => {
                    errors.extend(argument_errors.into_iter().map(|error| {
                        BuildError::InvalidDirectiveArguments {
                            name: name.clone(),
                            referrer: target.to_string(),
                            message: error.message,
                        }
                    }))
                }
            }
        }
        if !invocations.is_empty() {
            bound.push((target.clone(), invocations))
        }
    }
    bound
}

fn field_mut<'s>(
    types: &'s mut IndexMap<Name, ExtendedType>,
    type_name: &Name,
    field_name: &Name,
) -> Option<&'s mut FieldDefinition> {
    let fields = match types.get_mut(type_name)? {
        ExtendedType::Object(def) => &mut def.make_mut().fields,
        ExtendedType::Interface(def) => &mut def.make_mut().fields,
        _ => return None,
    };
    fields.get_mut(field_name).map(Node::make_mut)
}

fn element_mut<'s>(schema: &'s mut Schema, target: &Target) -> Option<SchemaElement<'s>> {
    let find_argument = |arguments: &'s mut Vec<Node<InputValueDefinition>>, name: &Name| {
        arguments
            .iter_mut()
            .find(|arg| arg.name == *name)
            .map(|arg| SchemaElement::Argument(arg.make_mut()))
    };
    match target {
        Target::Schema => None,
        Target::Type(name) => schema.types.get_mut(name).map(SchemaElement::Type),
        Target::Field(ty, field) => {
            field_mut(&mut schema.types, ty, field).map(SchemaElement::Field)
        }
        Target::Argument(ty, field, arg) => {
            find_argument(&mut field_mut(&mut schema.types, ty, field)?.arguments, arg)
        }
        Target::EnumValue(ty, value) => match schema.types.get_mut(ty)? {
            ExtendedType::Enum(def) => def
                .make_mut()
                .values
                .get_mut(value)
                .map(|value| SchemaElement::EnumValue(value.make_mut())),
            _ => None,
        },
        Target::InputField(ty, field) => match schema.types.get_mut(ty)? {
            ExtendedType::InputObject(def) => def
                .make_mut()
                .fields
                .get_mut(field)
                .map(|field| SchemaElement::InputField(field.make_mut())),
            _ => None,
        },
        Target::DirectiveArgument(directive, arg) => find_argument(
            &mut schema
                .directive_definitions
                .get_mut(directive)?
                .make_mut()
                .arguments,
            arg,
        ),
    }
}

fn directives_mut<'e>(element: &'e mut SchemaElement<'_>) -> &'e mut Vec<DirectiveInvocation> {
    match element {
        SchemaElement::Type(ty) => ty.directive_invocations_mut(),
        SchemaElement::Field(def) => &mut def.directives,
        SchemaElement::Argument(def) | SchemaElement::InputField(def) => &mut def.directives,
        SchemaElement::EnumValue(def) => &mut def.directives,
    }
}

/// Recomposes output coercers now that every directive application is bound
fn compose_coercers(schema: &mut Schema) {
    let mut coercers = Vec::new();
    for (type_name, ty) in &schema.types {
        let fields = match ty {
            ExtendedType::Object(def) => &def.fields,
            ExtendedType::Interface(def) => &def.fields,
            _ => continue,
        };
        for (field_name, def) in fields {
            coercers.push((
                type_name.clone(),
                field_name.clone(),
                OutputCoercer::compose(schema, def),
            ))
        }
    }
    for (type_name, field_name, coercer) in coercers {
        if let Some(def) = field_mut(&mut schema.types, &type_name, &field_name) {
            def.coercer = coercer
        }
    }
    let meta = &schema.meta_fields;
    let typename = OutputCoercer::compose(schema, &meta.typename);
    let schema_field = OutputCoercer::compose(schema, &meta.schema);
    let type_field = OutputCoercer::compose(schema, &meta.type_);
    schema.meta_fields.typename.make_mut().coercer = typename;
    schema.meta_fields.schema.make_mut().coercer = schema_field;
    schema.meta_fields.type_.make_mut().coercer = type_field;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execution::JsonMap;
    use unindent::unindent;

    #[test]
    fn extensions_are_merged() {
        let schema = Schema::builder()
            .add_sdl(
                unindent(
                    "
                    type Query { a: Int }
                    extend type Query { b: String }
                    enum Color { RED }
                    extend enum Color { GREEN }
                    ",
                ),
                "schema.graphql",
            )
            .build()
            .unwrap();
        let query = schema.get_object("Query").unwrap();
        assert_eq!(
            query.fields.keys().map(Name::as_str).collect::<Vec<_>>(),
            ["a", "b"]
        );
        let color = schema.get_enum("Color").unwrap();
        assert_eq!(color.values.len(), 2);
        assert!(schema.type_field("Query", "__schema").is_some());
        assert!(schema.type_field("Color", "__typename").is_none());
    }

    #[test]
    fn problems_are_collected() {
        let errors = Schema::builder()
            .add_sdl(
                "type Query { a: Missing, b(arg: Query): Int } union U = Int",
                "schema.graphql",
            )
            .build()
            .unwrap_err();
        let messages: Vec<_> = errors.0.iter().map(ToString::to_string).collect();
        assert_eq!(
            messages,
            [
                "cannot find type `Missing` referenced by the field `Query.a`",
                "the argument `Query.b(arg:)` has the type `Query` which is not an input type",
                "the union `U` has the member `Int` which is not an object type",
            ]
        );
    }

    #[test]
    fn implementations_must_match_definitions() {
        let errors = Schema::builder()
            .add_sdl("scalar Date type Query { a: Date }", "schema.graphql")
            .resolver("Query.b", |_params| {
                Box::pin(futures::future::ready(Ok(JsonValue::Null)))
            })
            .build()
            .unwrap_err();
        assert_eq!(
            errors.to_string(),
            "no implementation was given for the custom scalar `Date`"
        );

        let errors = Schema::builder()
            .add_sdl("type Query { a: Int }", "schema.graphql")
            .resolver("Query.b", |_params| {
                Box::pin(futures::future::ready(Ok(JsonValue::Null)))
            })
            .type_resolver("Query", |_, _| None)
            .build()
            .unwrap_err();
        assert_eq!(
            errors.to_string(),
            "a resolver was given for `Query.b` but no such object type field is defined\n\
             a type resolver was given for `Query` which is not an interface or union type"
        );
    }

    #[test]
    fn missing_query_type() {
        let errors = Schema::builder()
            .add_sdl("type Mutation { a: Int }", "schema.graphql")
            .build()
            .unwrap_err();
        assert_eq!(errors.0, [BuildError::MissingQueryType]);
    }

    #[test]
    fn deprecated_and_specified_by() {
        let schema = Schema::builder()
            .add_sdl(
                r#"
                scalar Url @specifiedBy(url: "https://url.spec.whatwg.org/")
                type Query {
                    old: Int @deprecated
                    older(arg: Int @deprecated(reason: "unused")): Int @deprecated(reason: "use new")
                    new: Url
                }
                "#,
                "schema.graphql",
            )
            .scalar("Url", UrlScalar)
            .build()
            .unwrap();
        let query = schema.get_object("Query").unwrap();
        assert_eq!(
            query.fields["old"].deprecation_reason.as_deref(),
            Some("No longer supported")
        );
        assert_eq!(
            query.fields["older"].deprecation_reason.as_deref(),
            Some("use new")
        );
        assert_eq!(
            query.fields["older"].arguments[0].deprecation_reason.as_deref(),
            Some("unused")
        );
        assert!(query.fields["new"].deprecation_reason.is_none());
        assert_eq!(
            schema.find_scalar("Url").unwrap().specified_by_url.as_deref(),
            Some("https://url.spec.whatwg.org/")
        );
    }

    #[test]
    fn directive_applications_are_checked() {
        let errors = Schema::builder()
            .add_sdl(
                "type Query { a: Int @skip(if: true) @unknown, b: Int @deprecated(reason: 3) }",
                "schema.graphql",
            )
            .build()
            .unwrap_err();
        let messages: Vec<_> = errors.0.iter().map(ToString::to_string).collect();
        assert_eq!(
            messages,
            [
                "the directive `@skip` cannot be applied on the field `Query.a`",
                "cannot find directive `@unknown` applied on the field `Query.a`",
                "invalid application of `@deprecated` on the field `Query.b`: \
                 Argument < reason > has invalid value < 3 >.",
            ]
        );
    }

    struct Renamer;

    impl Directive for Renamer {
        fn on_build(
            &self,
            arguments: &JsonMap,
            mut element: SchemaElement<'_>,
            next: BuildNext<'_>,
        ) -> Result<(), String> {
            let Some(to) = arguments.get("to").and_then(|to| to.as_str()) else {
                return Err("missing `to`".into());
            };
            if let SchemaElement::Field(def) = &mut element {
                def.description = Some(format!("renamed to {to}"));
            }
            next.run(element)
        }
    }

    #[test]
    fn custom_directive_on_build() {
        let schema = Schema::builder()
            .add_sdl(
                r#"
                directive @rename(to: String) on FIELD_DEFINITION
                type Query { a: Int @rename(to: "b") }
                "#,
                "schema.graphql",
            )
            .directive("rename", Renamer)
            .build()
            .unwrap();
        let field = schema.type_field("Query", "a").unwrap();
        assert_eq!(field.description.as_deref(), Some("renamed to b"));
        assert_eq!(field.directives.len(), 1);
        assert_eq!(
            field.directives[0].arguments.get("to").and_then(|to| to.as_str()),
            Some("b")
        );

        let errors = Schema::builder()
            .add_sdl(
                r#"
                directive @rename(to: String) on FIELD_DEFINITION
                type Query { a: Int @rename }
                "#,
                "schema.graphql",
            )
            .directive("rename", Renamer)
            .build()
            .unwrap_err();
        assert_eq!(
            errors.to_string(),
            "a directive failed on the field `Query.a`: missing `to`"
        );

        let errors = Schema::builder()
            .add_sdl(
                "directive @rename(to: String) on FIELD_DEFINITION type Query { a: Int }",
                "schema.graphql",
            )
            .build()
            .unwrap_err();
        assert_eq!(
            errors.to_string(),
            "no implementation was given for the directive `@rename`"
        );
    }

    struct UrlScalar;

    impl Scalar for UrlScalar {
        fn coerce_output(&self, value: &JsonValue) -> Result<JsonValue, CoercionError> {
            Ok(value.clone())
        }

        fn coerce_input(&self, value: &JsonValue) -> Result<JsonValue, CoercionError> {
            Ok(value.clone())
        }

        fn parse_literal(
            &self,
            value: &ast::Value,
        ) -> Result<JsonValue, crate::execution::Undefined> {
            match value {
                ast::Value::String(s) => Ok(s.as_str().into()),
                _ => Err(crate::execution::Undefined),
            }
        }
    }
}
