//! Validation of executable documents against a [`Schema`]
//!
//! <https://spec.graphql.org/June2018/#sec-Validation>
//!
//! A [`Validator`] runs an ordered list of [`Rule`]s.
//! Every rule reports into a shared [`ValidationContext`],
//! which also memoizes what several rules need:
//! the operations, the fragments, and every selection with its parent type.

use crate::ast::Document;
use crate::ast::FragmentDefinition;
use crate::ast::OperationDefinition;
use crate::execution::GraphQLError;
use crate::execution::ResponseDataPathSegment;
use crate::parser::SourceMap;
use crate::Name;
use crate::Node;
use crate::NodeLocation;
use crate::Schema;
use std::cell::Cell;
use std::cell::OnceCell;
use std::cell::RefCell;
use std::collections::HashSet;
use std::fmt;

mod argument;
mod directive;
mod fragment;
mod operation;
mod selection;
mod value;
mod variable;
mod walk;

pub(crate) use self::walk::Walk;

/// A named validation rule
pub trait Rule: Send + Sync + 'static {
    /// Identifier of the rule, e.g. `executable-definitions`
    fn tag(&self) -> &'static str;

    /// Section of the June 2018 GraphQL specification defining the rule, e.g. `5.1.1`
    fn section(&self) -> &'static str;

    /// Link to the rule’s description
    fn details(&self) -> &'static str;

    /// Check the document of `context`, reporting errors into it.
    ///
    /// Call [`ValidationContext::abort`] to prevent any later rule from running.
    fn validate(&self, context: &ValidationContext<'_>);
}

/// Validates executable documents with an ordered list of rules
pub struct Validator {
    rules: Vec<Box<dyn Rule>>,
}

/// What rules share while validating one document
pub struct ValidationContext<'a> {
    schema: &'a Schema,
    document: &'a Document,
    current_rule: Cell<RuleInfo>,
    errors: RefCell<Vec<ValidationError>>,
    aborted: Cell<bool>,
    walk: OnceCell<Walk<'a>>,
}

#[derive(Clone, Copy)]
struct RuleInfo {
    tag: &'static str,
    section: &'static str,
    details: &'static str,
}

/// An error reported by a validation rule
#[derive(Debug, Clone, PartialEq, Eq, Hash, thiserror::Error)]
#[error("{message}")]
pub struct ValidationError {
    pub message: String,
    pub locations: Vec<NodeLocation>,

    /// Response keys from the operation or fragment root to the field concerned, if any
    pub path: Option<Vec<Name>>,

    /// Section of the June 2018 GraphQL specification, e.g. `5.1.1`
    pub rule: &'static str,

    /// Identifier of the rule, e.g. `executable-definitions`
    pub tag: &'static str,

    /// Link to the rule’s description
    pub details: &'static str,
}

/// A document is invalid
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}", DisplayErrors(.errors))]
pub struct ValidationErrors {
    pub errors: Vec<ValidationError>,
}

struct DisplayErrors<'a>(&'a [ValidationError]);

/// A rule of this crate: a check function with its metadata
#[derive(Clone, Copy)]
struct BuiltInRule {
    tag: &'static str,
    section: &'static str,
    details: &'static str,
    check: fn(&ValidationContext<'_>),
    aborts: bool,
}

macro_rules! built_in_rules {
    (@aborts) => { false };
    (@aborts aborts) => { true };
    ($( $tag: literal, $section: literal, $anchor: literal, $check: path $(, $aborts: ident)?; )+) => {
        [$(
            BuiltInRule {
                tag: $tag,
                section: $section,
                details: concat!("https://spec.graphql.org/June2018/#", $anchor),
                check: $check,
                aborts: built_in_rules!(@aborts $($aborts)?),
            },
        )+]
    };
}

/// In registration order
const BUILT_IN_RULES: [BuiltInRule; 29] = built_in_rules! {
    "executable-definitions", "5.1.1", "sec-Executable-Definitions",
        operation::executable_definitions, aborts;
    "operation-name-uniqueness", "5.2.1.1", "sec-Operation-Name-Uniqueness",
        operation::operation_name_uniqueness;
    "lone-anonymous-operation", "5.2.2.1", "sec-Lone-Anonymous-Operation",
        operation::lone_anonymous_operation;
    "single-root-field", "5.2.3.1", "sec-Single-root-field",
        operation::single_root_field;
    "field-selections", "5.3.1", "sec-Field-Selections-on-Objects-Interfaces-and-Unions-Types",
        selection::field_selections;
    "field-selection-merging", "5.3.2", "sec-Field-Selection-Merging",
        selection::field_selection_merging;
    "leaf-field-selections", "5.3.3", "sec-Leaf-Field-Selections",
        selection::leaf_field_selections;
    "argument-names", "5.4.1", "sec-Argument-Names",
        argument::argument_names;
    "argument-uniqueness", "5.4.2", "sec-Argument-Uniqueness",
        argument::argument_uniqueness;
    "required-arguments", "5.4.2.1", "sec-Required-Arguments",
        argument::required_arguments;
    "fragment-name-uniqueness", "5.5.1.1", "sec-Fragment-Name-Uniqueness",
        fragment::fragment_name_uniqueness;
    "fragment-spread-type-existence", "5.5.1.2", "sec-Fragment-Spread-Type-Existence",
        fragment::fragment_spread_type_existence;
    "fragments-on-composite-types", "5.5.1.3", "sec-Fragments-On-Composite-Types",
        fragment::fragments_on_composite_types;
    "fragment-must-be-used", "5.5.1.4", "sec-Fragments-Must-Be-Used",
        fragment::fragment_must_be_used;
    "fragment-spread-target-defined", "5.5.2.1", "sec-Fragment-spread-target-defined",
        fragment::fragment_spread_target_defined;
    "fragment-spreads-must-not-form-cycles", "5.5.2.2", "sec-Fragment-spreads-must-not-form-cycles",
        fragment::fragment_spreads_must_not_form_cycles, aborts;
    "fragment-spread-is-possible", "5.5.2.3", "sec-Fragment-spread-is-possible",
        fragment::fragment_spread_is_possible;
    "values-of-correct-type", "5.6.1", "sec-Values-of-Correct-Type",
        value::values_of_correct_type;
    "input-object-field-names", "5.6.2", "sec-Input-Object-Field-Names",
        value::input_object_field_names;
    "input-object-field-uniqueness", "5.6.3", "sec-Input-Object-Field-Uniqueness",
        value::input_object_field_uniqueness;
    "input-object-required-fields", "5.6.4", "sec-Input-Object-Required-Fields",
        value::input_object_required_fields;
    "directives-are-defined", "5.7.1", "sec-Directives-Are-Defined",
        directive::directives_are_defined;
    "directives-are-in-valid-locations", "5.7.2", "sec-Directives-Are-In-Valid-Locations",
        directive::directives_are_in_valid_locations;
    "directives-are-unique-per-location", "5.7.3", "sec-Directives-Are-Unique-Per-Location",
        directive::directives_are_unique_per_location;
    "variable-uniqueness", "5.8.1", "sec-Variable-Uniqueness",
        variable::variable_uniqueness;
    "variables-are-input-types", "5.8.2", "sec-Variables-Are-Input-Types",
        variable::variables_are_input_types;
    "all-variable-uses-defined", "5.8.3", "sec-All-Variable-Uses-Defined",
        variable::all_variable_uses_defined;
    "all-variables-used", "5.8.4", "sec-All-Variables-Used",
        variable::all_variables_used;
    "all-variable-usages-are-allowed", "5.8.5", "sec-All-Variable-Usages-are-Allowed",
        variable::all_variable_usages_are_allowed;
};

impl Rule for BuiltInRule {
    fn tag(&self) -> &'static str {
        self.tag
    }

    fn section(&self) -> &'static str {
        self.section
    }

    fn details(&self) -> &'static str {
        self.details
    }

    fn validate(&self, context: &ValidationContext<'_>) {
        let errors_before = context.error_count();
        (self.check)(context);
        // Later rules would only report the consequences of these errors
        if self.aborts && context.error_count() > errors_before {
            context.abort()
        }
    }
}

impl Validator {
    /// A validator with every rule of [`Validator::default_rules`]
    pub fn new() -> Self {
        Self::with_rules(Self::default_rules())
    }

    /// A validator with the given rules, run in this order
    pub fn with_rules(rules: Vec<Box<dyn Rule>>) -> Self {
        Self { rules }
    }

    /// The rules of section 5 of the June 2018 GraphQL specification, in section order.
    ///
    /// `executable-definitions` and `fragment-spreads-must-not-form-cycles`
    /// abort validation when they find an error.
    pub fn default_rules() -> Vec<Box<dyn Rule>> {
        BUILT_IN_RULES
            .iter()
            .map(|rule| Box::new(*rule) as Box<dyn Rule>)
            .collect()
    }

    pub fn rules(&self) -> &[Box<dyn Rule>] {
        &self.rules
    }

    /// Run the rules in order on `document`.
    ///
    /// Errors are deduplicated. Validating the same document again gives the same result.
    pub fn validate(&self, schema: &Schema, document: &Document) -> Result<(), ValidationErrors> {
        let context = ValidationContext::new(schema, document);
        for rule in &self.rules {
            context.current_rule.set(RuleInfo {
                tag: rule.tag(),
                section: rule.section(),
                details: rule.details(),
            });
            rule.validate(&context);
            if context.aborted.get() {
                tracing::debug!(rule = rule.tag(), "validation aborted");
                break;
            }
        }
        let errors = context.into_errors();
        if errors.is_empty() {
            Ok(())
        } else {
            tracing::debug!(errors = errors.len(), "GraphQL validation errors");
            Err(ValidationErrors { errors })
        }
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.rules.iter().map(|rule| rule.tag()))
            .finish()
    }
}

impl<'a> ValidationContext<'a> {
    fn new(schema: &'a Schema, document: &'a Document) -> Self {
        Self {
            schema,
            document,
            current_rule: Cell::new(RuleInfo {
                tag: "",
                section: "",
                details: "",
            }),
            errors: RefCell::new(Vec::new()),
            aborted: Cell::new(false),
            walk: OnceCell::new(),
        }
    }

    pub fn schema(&self) -> &'a Schema {
        self.schema
    }

    pub fn document(&self) -> &'a Document {
        self.document
    }

    /// Operation definitions in document order
    pub fn operations(&self) -> impl Iterator<Item = &'a Node<OperationDefinition>> + '_ {
        self.walk().operations()
    }

    /// The first fragment definition with the given name
    pub fn fragment(&self, name: &str) -> Option<&'a Node<FragmentDefinition>> {
        self.walk().fragment(name)
    }

    /// Report an error for the rule being run
    pub fn report(
        &self,
        message: impl Into<String>,
        locations: impl IntoIterator<Item = Option<NodeLocation>>,
    ) {
        self.report_at(message, locations, None)
    }

    pub(crate) fn report_at(
        &self,
        message: impl Into<String>,
        locations: impl IntoIterator<Item = Option<NodeLocation>>,
        path: Option<&[Name]>,
    ) {
        let rule = self.current_rule.get();
        self.errors.borrow_mut().push(ValidationError {
            message: message.into(),
            locations: locations.into_iter().flatten().collect(),
            path: path.map(<[Name]>::to_vec),
            rule: rule.section,
            tag: rule.tag,
            details: rule.details,
        })
    }

    /// No rule runs after the current one
    pub fn abort(&self) {
        self.aborted.set(true)
    }

    pub fn error_count(&self) -> usize {
        self.errors.borrow().len()
    }

    /// Every selection, directive and input value of the document, computed once
    pub(crate) fn walk(&self) -> &Walk<'a> {
        self.walk
            .get_or_init(|| Walk::new(self.schema, self.document))
    }

    fn into_errors(self) -> Vec<ValidationError> {
        let mut errors = self.errors.into_inner();
        let mut seen = HashSet::new();
        errors.retain(|error| seen.insert(error.clone()));
        errors
    }
}

impl ValidationError {
    /// Convert to a response error with `rule`, `spec`, `tag`, and `details` extensions
    pub fn to_graphql_error(&self, sources: &SourceMap) -> GraphQLError {
        let mut error = GraphQLError::new(self.message.clone(), None, sources);
        error.locations = self
            .locations
            .iter()
            .filter_map(|location| location.line_column(sources))
            .collect();
        error.path = self.path.as_ref().map(|path| {
            path.iter()
                .cloned()
                .map(ResponseDataPathSegment::Field)
                .collect()
        });
        error
            .with_extension("rule", self.rule)
            .with_extension("spec", "June 2018")
            .with_extension("tag", self.tag)
            .with_extension("details", self.details)
    }
}

impl ValidationErrors {
    pub fn to_graphql_errors(&self, sources: &SourceMap) -> Vec<GraphQLError> {
        self.errors
            .iter()
            .map(|error| error.to_graphql_error(sources))
            .collect()
    }
}

impl fmt::Display for DisplayErrors<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?
            }
            fmt::Display::fmt(error, f)?
        }
        Ok(())
    }
}
