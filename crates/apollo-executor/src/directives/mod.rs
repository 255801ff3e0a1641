//! Directive middleware.
//!
//! A [`Directive`] implementation overrides only the hooks it needs;
//! every other hook forwards to the next handler.
//! For each attachment point the runtime builds a chain over the applied directives,
//! in declaration order, that ends with the engine’s default behavior.
//! A hook short-circuits the chain by not calling `next`.

use crate::execution::Context;
use crate::execution::FieldResult;
use crate::execution::JsonMap;
use crate::execution::JsonValue;
use crate::execution::ResolveInfo;
use crate::execution::ResolveParams;
use crate::execution::Resolver;
use crate::schema::EnumValueDefinition;
use crate::schema::ExtendedType;
use crate::schema::FieldDefinition;
use crate::schema::InputValueDefinition;
use crate::Name;
use crate::NodeLocation;
use futures::future::BoxFuture;
use std::fmt;
use std::sync::Arc;

mod built_in;

pub(crate) use built_in::built_in_directives;

/// Behavior attached to a GraphQL directive.
///
/// `arguments` are the coerced arguments of the directive application,
/// with defaults from the directive definition.
pub trait Directive: Send + Sync + 'static {
    /// Bake-time transformation of the schema element the directive is applied to.
    ///
    /// An `Err` fails [`SchemaBuilder::build`][crate::schema::SchemaBuilder::build].
    fn on_build(
        &self,
        _arguments: &JsonMap,
        element: SchemaElement<'_>,
        next: BuildNext<'_>,
    ) -> Result<(), String> {
        next.run(element)
    }

    /// Wraps the resolver of a field.
    fn on_field_execution<'a>(
        &'a self,
        _arguments: &'a JsonMap,
        params: ResolveParams<'a>,
        next: ResolverNext<'a>,
    ) -> BoxFuture<'a, FieldResult> {
        next.run(params)
    }

    /// Transforms an argument value after input coercion, before it reaches the resolver.
    fn on_post_input_coercion<'a>(
        &'a self,
        _arguments: &'a JsonMap,
        value: JsonValue,
        next: InputNext<'a>,
    ) -> BoxFuture<'a, FieldResult> {
        next.run(value)
    }

    /// Transforms a resolved value before output coercion.
    fn on_pre_output_coercion<'a>(
        &'a self,
        _arguments: &'a JsonMap,
        value: JsonValue,
        next: OutputNext<'a>,
    ) -> BoxFuture<'a, FieldResult> {
        next.run(value)
    }

    /// Decides whether and how the schema element is exposed through introspection.
    /// Returning `None` hides it.
    fn on_introspection<'a>(
        &self,
        _arguments: &JsonMap,
        element: Introspected<'a>,
        next: IntrospectionNext<'_>,
    ) -> Option<Introspected<'a>> {
        next.run(element)
    }
}

/// A directive applied somewhere, bound to its implementation and coerced arguments.
#[derive(Clone)]
pub struct DirectiveInvocation {
    pub name: Name,
    pub arguments: JsonMap,
    pub location: Option<NodeLocation>,
    pub(crate) implementation: Arc<dyn Directive>,
}

impl fmt::Debug for DirectiveInvocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DirectiveInvocation")
            .field("name", &self.name)
            .field("arguments", &self.arguments)
            .finish_non_exhaustive()
    }
}

/// A schema element being baked, given mutably to [`Directive::on_build`].
pub enum SchemaElement<'a> {
    Type(&'a mut ExtendedType),
    Field(&'a mut FieldDefinition),
    Argument(&'a mut InputValueDefinition),
    EnumValue(&'a mut EnumValueDefinition),
    InputField(&'a mut InputValueDefinition),
}

/// A schema element about to be listed by introspection.
#[derive(Clone, Copy)]
pub enum Introspected<'a> {
    Type(&'a ExtendedType),
    Field(&'a FieldDefinition),
    Argument(&'a InputValueDefinition),
    EnumValue(&'a EnumValueDefinition),
    InputField(&'a InputValueDefinition),
}

/// The rest of an [`on_build`][Directive::on_build] chain
pub struct BuildNext<'a> {
    directives: &'a [DirectiveInvocation],
}

impl<'a> BuildNext<'a> {
    pub(crate) fn new(directives: &'a [DirectiveInvocation]) -> Self {
        Self { directives }
    }

    pub fn run(self, element: SchemaElement<'_>) -> Result<(), String> {
        match self.directives.split_first() {
            Some((first, rest)) => {
                first
                    .implementation
                    .on_build(&first.arguments, element, BuildNext::new(rest))
            }
            None => Ok(()),
        }
    }
}

/// The rest of an [`on_field_execution`][Directive::on_field_execution] chain,
/// ending with the field’s resolver
pub struct ResolverNext<'a> {
    directives: &'a [DirectiveInvocation],
    resolver: &'a dyn Resolver,
}

impl<'a> ResolverNext<'a> {
    pub(crate) fn new(directives: &'a [DirectiveInvocation], resolver: &'a dyn Resolver) -> Self {
        Self {
            directives,
            resolver,
        }
    }

    pub fn run(self, params: ResolveParams<'a>) -> BoxFuture<'a, FieldResult> {
        match self.directives.split_first() {
            Some((first, rest)) => first.implementation.on_field_execution(
                &first.arguments,
                params,
                ResolverNext::new(rest, self.resolver),
            ),
            None => {
                tracing::trace!(field = %params.info.coordinate(), "resolving");
                self.resolver.resolve(params)
            }
        }
    }
}

/// The rest of an [`on_post_input_coercion`][Directive::on_post_input_coercion] chain
pub struct InputNext<'a> {
    directives: &'a [DirectiveInvocation],
    context: &'a Context,
}

impl<'a> InputNext<'a> {
    pub(crate) fn new(directives: &'a [DirectiveInvocation], context: &'a Context) -> Self {
        Self {
            directives,
            context,
        }
    }

    /// User data of the request
    pub fn context(&self) -> &'a Context {
        self.context
    }

    pub fn run(self, value: JsonValue) -> BoxFuture<'a, FieldResult> {
        match self.directives.split_first() {
            Some((first, rest)) => first.implementation.on_post_input_coercion(
                &first.arguments,
                value,
                InputNext::new(rest, self.context),
            ),
            None => Box::pin(futures::future::ready(Ok(value))),
        }
    }
}

/// The rest of an [`on_pre_output_coercion`][Directive::on_pre_output_coercion] chain
pub struct OutputNext<'a> {
    directives: &'a [DirectiveInvocation],
    info: &'a ResolveInfo<'a>,
}

impl<'a> OutputNext<'a> {
    pub(crate) fn new(directives: &'a [DirectiveInvocation], info: &'a ResolveInfo<'a>) -> Self {
        Self { directives, info }
    }

    /// The field whose value is being coerced
    pub fn info(&self) -> &'a ResolveInfo<'a> {
        self.info
    }

    pub fn run(self, value: JsonValue) -> BoxFuture<'a, FieldResult> {
        match self.directives.split_first() {
            Some((first, rest)) => first.implementation.on_pre_output_coercion(
                &first.arguments,
                value,
                OutputNext::new(rest, self.info),
            ),
            None => Box::pin(futures::future::ready(Ok(value))),
        }
    }
}

/// The rest of an [`on_introspection`][Directive::on_introspection] chain
pub struct IntrospectionNext<'n> {
    directives: &'n [DirectiveInvocation],
}

impl<'n> IntrospectionNext<'n> {
    pub(crate) fn new(directives: &'n [DirectiveInvocation]) -> Self {
        Self { directives }
    }

    pub fn run<'a>(self, element: Introspected<'a>) -> Option<Introspected<'a>> {
        match self.directives.split_first() {
            Some((first, rest)) => first.implementation.on_introspection(
                &first.arguments,
                element,
                IntrospectionNext::new(rest),
            ),
            None => Some(element),
        }
    }
}

impl Introspected<'_> {
    fn directives(&self) -> &[DirectiveInvocation] {
        match self {
            Introspected::Type(ty) => ty.directive_invocations(),
            Introspected::Field(def) => &def.directives,
            Introspected::Argument(def) | Introspected::InputField(def) => &def.directives,
            Introspected::EnumValue(def) => &def.directives,
        }
    }

    /// Runs the element’s introspection chain: returns whether it is visible
    pub(crate) fn is_visible(self) -> bool {
        let directives = self.directives();
        if directives.is_empty() {
            return true;
        }
        IntrospectionNext::new(directives).run(self).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::name;
    use crate::schema::InputValueDefinition;
    use crate::Node;
    use std::sync::Mutex;

    struct Recorder {
        label: &'static str,
        log: Arc<Mutex<Vec<String>>>,
        forward: bool,
    }

    impl Directive for Recorder {
        fn on_build(
            &self,
            _arguments: &JsonMap,
            element: SchemaElement<'_>,
            next: BuildNext<'_>,
        ) -> Result<(), String> {
            self.log.lock().unwrap().push(format!("{} before", self.label));
            if !self.forward {
                return Ok(());
            }
            let result = next.run(element);
            self.log.lock().unwrap().push(format!("{} after", self.label));
            result
        }
    }

    fn invocation(label: &'static str, log: &Arc<Mutex<Vec<String>>>, forward: bool) -> DirectiveInvocation {
        DirectiveInvocation {
            name: Name::new(label).unwrap(),
            arguments: JsonMap::new(),
            location: None,
            implementation: Arc::new(Recorder {
                label,
                log: log.clone(),
                forward,
            }),
        }
    }

    fn input_value() -> InputValueDefinition {
        InputValueDefinition {
            description: None,
            name: name!("arg"),
            ty: Node::new(crate::ast::Type::Named(name!("Int"))),
            default_value: None,
            directives: Vec::new(),
            deprecation_reason: None,
        }
    }

    #[test]
    fn chain_follows_declaration_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let chain = [invocation("a", &log, true), invocation("b", &log, true)];
        let mut element = input_value();
        BuildNext::new(&chain)
            .run(SchemaElement::Argument(&mut element))
            .unwrap();
        assert_eq!(
            *log.lock().unwrap(),
            ["a before", "b before", "b after", "a after"]
        );
    }

    #[test]
    fn hook_can_short_circuit() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let chain = [invocation("a", &log, false), invocation("b", &log, true)];
        let mut element = input_value();
        BuildNext::new(&chain)
            .run(SchemaElement::Argument(&mut element))
            .unwrap();
        assert_eq!(*log.lock().unwrap(), ["a before"]);
    }
}
