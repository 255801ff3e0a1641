use super::BuildNext;
use super::Directive;
use super::Introspected;
use super::IntrospectionNext;
use super::SchemaElement;
use crate::execution::JsonMap;
use crate::schema::ExtendedType;
use std::sync::Arc;

const DEFAULT_DEPRECATION_REASON: &str = "No longer supported";

pub(crate) fn built_in_directives() -> [(&'static str, Arc<dyn Directive>); 5] {
    [
        ("skip", Arc::new(Condition)),
        ("include", Arc::new(Condition)),
        ("deprecated", Arc::new(Deprecated)),
        ("specifiedBy", Arc::new(SpecifiedBy)),
        ("nonIntrospectable", Arc::new(NonIntrospectable)),
    ]
}

/// `@skip` and `@include` are evaluated while collecting fields
struct Condition;

impl Directive for Condition {}

struct Deprecated;

impl Directive for Deprecated {
    fn on_build(
        &self,
        arguments: &JsonMap,
        mut element: SchemaElement<'_>,
        next: BuildNext<'_>,
    ) -> Result<(), String> {
        let reason = arguments
            .get("reason")
            .and_then(|reason| reason.as_str())
            .unwrap_or(DEFAULT_DEPRECATION_REASON)
            .to_owned();
        match &mut element {
            SchemaElement::Field(def) => def.deprecation_reason = Some(reason),
            SchemaElement::Argument(def) | SchemaElement::InputField(def) => {
                def.deprecation_reason = Some(reason)
            }
            SchemaElement::EnumValue(def) => def.deprecation_reason = Some(reason),
            SchemaElement::Type(_) => {}
        }
        next.run(element)
    }
}

struct SpecifiedBy;

impl Directive for SpecifiedBy {
    fn on_build(
        &self,
        arguments: &JsonMap,
        mut element: SchemaElement<'_>,
        next: BuildNext<'_>,
    ) -> Result<(), String> {
        if let SchemaElement::Type(ExtendedType::Scalar(scalar)) = &mut element {
            scalar.make_mut().specified_by_url = arguments
                .get("url")
                .and_then(|url| url.as_str())
                .map(ToOwned::to_owned);
        }
        next.run(element)
    }
}

/// Hides the element it is applied to from introspection
struct NonIntrospectable;

impl Directive for NonIntrospectable {
    fn on_introspection<'a>(
        &self,
        _arguments: &JsonMap,
        _element: Introspected<'a>,
        _next: IntrospectionNext<'_>,
    ) -> Option<Introspected<'a>> {
        None
    }
}
