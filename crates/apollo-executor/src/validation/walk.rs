use crate::ast;
use crate::ast::DirectiveLocation;
use crate::ast::Selection;
use crate::schema::DirectiveDefinition;
use crate::schema::ExtendedType;
use crate::schema::FieldDefinition;
use crate::schema::InputValueDefinition;
use crate::Name;
use crate::Node;
use crate::NodeLocation;
use crate::Schema;
use indexmap::IndexMap;
use indexmap::IndexSet;

/// An operation or a fragment definition
#[derive(Clone, Copy)]
pub(crate) enum Scope<'a> {
    Operation(&'a Node<ast::OperationDefinition>),
    Fragment(&'a Node<ast::FragmentDefinition>),
}

/// Index into [`Walk::scopes`]
pub(crate) type ScopeId = usize;

pub(crate) struct FieldOccurrence<'a> {
    pub(crate) field: &'a Node<ast::Field>,
    /// `None` if the enclosing type is unknown or not composite
    pub(crate) parent_type: Option<&'a Name>,
    pub(crate) definition: Option<&'a Node<FieldDefinition>>,
    pub(crate) path: Vec<Name>,
}

#[derive(Clone, Copy)]
pub(crate) enum FragmentSelection<'a> {
    Spread(&'a Node<ast::FragmentSpread>),
    Inline(&'a Node<ast::InlineFragment>),
}

pub(crate) struct FragmentOccurrence<'a> {
    pub(crate) selection: FragmentSelection<'a>,
    pub(crate) parent_type: Option<&'a Name>,
    pub(crate) scope: ScopeId,
}

/// A list of directives applied at one location
pub(crate) struct DirectivesOccurrence<'a> {
    pub(crate) directives: &'a ast::DirectiveList,
    pub(crate) location: DirectiveLocation,
}

#[derive(Clone, Copy)]
pub(crate) enum ArgumentsOwner<'a> {
    Field {
        parent_type: &'a Name,
        definition: &'a Node<FieldDefinition>,
    },
    Directive(&'a Node<DirectiveDefinition>),
}

/// Arguments given to a field or a directive that is defined in the schema
pub(crate) struct ArgumentsOccurrence<'a> {
    pub(crate) owner: ArgumentsOwner<'a>,
    pub(crate) arguments: &'a [Node<ast::Argument>],
    pub(crate) location: Option<NodeLocation>,
    pub(crate) path: Vec<Name>,
}

/// A value in a position of known input type
pub(crate) struct InputValueOccurrence<'a> {
    pub(crate) value: &'a Node<ast::Value>,
    pub(crate) ty: &'a ast::Type,
    /// The argument or input field of this position has a default value
    pub(crate) has_default: bool,
    pub(crate) path: Vec<Name>,
    pub(crate) scope: ScopeId,
}

/// A variable referenced in an argument, anywhere in a value
pub(crate) struct VariableUsage<'a> {
    pub(crate) name: &'a Name,
    pub(crate) value: &'a Node<ast::Value>,
    pub(crate) scope: ScopeId,
}

/// Everything in an executable document that rules look at,
/// with schema definitions resolved.
///
/// Fragment spreads are not followed:
/// each fragment definition is walked once, in its own scope.
#[derive(Default)]
pub(crate) struct Walk<'a> {
    pub(crate) scopes: Vec<Scope<'a>>,
    /// First definition of each fragment name
    fragments: IndexMap<Name, ScopeId>,
    pub(crate) fields: Vec<FieldOccurrence<'a>>,
    pub(crate) fragment_selections: Vec<FragmentOccurrence<'a>>,
    pub(crate) directives: Vec<DirectivesOccurrence<'a>>,
    pub(crate) arguments: Vec<ArgumentsOccurrence<'a>>,
    pub(crate) input_values: Vec<InputValueOccurrence<'a>>,
    pub(crate) variable_usages: Vec<VariableUsage<'a>>,
}

struct Walker<'w, 'a> {
    schema: &'a Schema,
    walk: &'w mut Walk<'a>,
    scope: ScopeId,
    path: Vec<Name>,
}

impl<'a> Walk<'a> {
    pub(crate) fn new(schema: &'a Schema, document: &'a ast::Document) -> Self {
        let mut walk = Self::default();
        for definition in &document.definitions {
            match definition {
                ast::Definition::OperationDefinition(operation) => {
                    walk.scopes.push(Scope::Operation(operation))
                }
                ast::Definition::FragmentDefinition(fragment) => {
                    walk.fragments
                        .entry(fragment.name.clone())
                        .or_insert(walk.scopes.len());
                    walk.scopes.push(Scope::Fragment(fragment))
                }
                _ => {}
            }
        }
        let scopes = walk.scopes.clone();
        for (scope, definition) in scopes.into_iter().enumerate() {
            let mut walker = Walker {
                schema,
                walk: &mut walk,
                scope,
                path: Vec::new(),
            };
            match definition {
                Scope::Operation(operation) => {
                    walker.directives(&operation.directives, operation.operation_type.into());
                    for variable in &operation.variables {
                        walker.directives(
                            &variable.directives,
                            DirectiveLocation::VariableDefinition,
                        );
                        if let Some(default_value) = &variable.default_value {
                            walker.input_value(default_value, &variable.ty, false)
                        }
                    }
                    let root_type = schema
                        .root_operation(operation.operation_type)
                        .and_then(|name| composite_type(schema, name));
                    walker.selection_set(root_type, &operation.selection_set)
                }
                Scope::Fragment(fragment) => {
                    walker.directives(&fragment.directives, DirectiveLocation::FragmentDefinition);
                    let type_condition = composite_type(schema, &fragment.type_condition);
                    walker.selection_set(type_condition, &fragment.selection_set)
                }
            }
        }
        walk
    }

    pub(crate) fn operations(&self) -> impl Iterator<Item = &'a Node<ast::OperationDefinition>> + '_ {
        self.scopes.iter().filter_map(|scope| match scope {
            Scope::Operation(operation) => Some(*operation),
            Scope::Fragment(_) => None,
        })
    }

    pub(crate) fn fragment(&self, name: &str) -> Option<&'a Node<ast::FragmentDefinition>> {
        match self.scopes[*self.fragments.get(name)?] {
            Scope::Fragment(fragment) => Some(fragment),
            Scope::Operation(_) => None,
        }
    }

    pub(crate) fn fragment_scope(&self, name: &str) -> Option<ScopeId> {
        self.fragments.get(name).copied()
    }

    /// Fragment spreads directly in the given scope, including in inline fragments
    pub(crate) fn spreads_in(
        &self,
        scope: ScopeId,
    ) -> impl Iterator<Item = &'a Node<ast::FragmentSpread>> + '_ {
        self.fragment_selections
            .iter()
            .filter(move |occurrence| occurrence.scope == scope)
            .filter_map(|occurrence| match occurrence.selection {
                FragmentSelection::Spread(spread) => Some(spread),
                FragmentSelection::Inline(_) => None,
            })
    }

    /// The given scope and the scopes of fragments it spreads, transitively
    pub(crate) fn reachable_scopes(&self, scope: ScopeId) -> IndexSet<ScopeId> {
        let mut reached = IndexSet::new();
        reached.insert(scope);
        let mut next = 0;
        while let Some(&current) = reached.get_index(next) {
            next += 1;
            for spread in self.spreads_in(current) {
                if let Some(fragment_scope) = self.fragment_scope(&spread.fragment_name) {
                    reached.insert(fragment_scope);
                }
            }
        }
        reached
    }
}

impl<'a> Scope<'a> {
    pub(crate) fn location(&self) -> Option<NodeLocation> {
        match self {
            Scope::Operation(operation) => operation.location(),
            Scope::Fragment(fragment) => fragment.location(),
        }
    }
}

impl<'a> ArgumentsOwner<'a> {
    pub(crate) fn argument_definitions(&self) -> &'a [Node<InputValueDefinition>] {
        match *self {
            ArgumentsOwner::Field { definition, .. } => &definition.arguments,
            ArgumentsOwner::Directive(definition) => &definition.arguments,
        }
    }

    pub(crate) fn argument_definition(&self, name: &str) -> Option<&'a Node<InputValueDefinition>> {
        self.argument_definitions()
            .iter()
            .find(|definition| definition.name == name)
    }

    /// `field < Type.field >` or `directive < @name >`
    pub(crate) fn describe(&self) -> String {
        match *self {
            ArgumentsOwner::Field {
                parent_type,
                definition,
            } => format!("field < {parent_type}.{} >", definition.name),
            ArgumentsOwner::Directive(definition) => format!("directive < @{} >", definition.name),
        }
    }
}

/// The name of the type, as found in the schema, if it is an object, interface, or union type
pub(crate) fn composite_type<'a>(schema: &'a Schema, name: &str) -> Option<&'a Name> {
    schema
        .types
        .get(name)
        .filter(|ty| ty.is_composite())
        .map(ExtendedType::name)
}

impl<'w, 'a> Walker<'w, 'a> {
    fn selection_set(&mut self, parent_type: Option<&'a Name>, selections: &'a [Selection]) {
        for selection in selections {
            match selection {
                Selection::Field(field) => self.field(parent_type, field),
                Selection::FragmentSpread(spread) => {
                    self.directives(&spread.directives, DirectiveLocation::FragmentSpread);
                    self.walk.fragment_selections.push(FragmentOccurrence {
                        selection: FragmentSelection::Spread(spread),
                        parent_type,
                        scope: self.scope,
                    })
                }
                Selection::InlineFragment(inline) => {
                    self.directives(&inline.directives, DirectiveLocation::InlineFragment);
                    self.walk.fragment_selections.push(FragmentOccurrence {
                        selection: FragmentSelection::Inline(inline),
                        parent_type,
                        scope: self.scope,
                    });
                    let type_condition = match &inline.type_condition {
                        Some(name) => composite_type(self.schema, name),
                        None => parent_type,
                    };
                    self.selection_set(type_condition, &inline.selection_set)
                }
            }
        }
    }

    fn field(&mut self, parent_type: Option<&'a Name>, field: &'a Node<ast::Field>) {
        let definition =
            parent_type.and_then(|parent_type| self.schema.type_field(parent_type, &field.name));
        self.path.push(field.response_key().clone());
        let owner = parent_type
            .zip(definition)
            .map(|(parent_type, definition)| ArgumentsOwner::Field {
                parent_type,
                definition,
            });
        self.arguments(owner, &field.arguments, field.location());
        self.directives(&field.directives, DirectiveLocation::Field);
        self.walk.fields.push(FieldOccurrence {
            field,
            parent_type,
            definition,
            path: self.path.clone(),
        });
        let field_type = definition
            .and_then(|definition| composite_type(self.schema, definition.ty.inner_named_type()));
        self.selection_set(field_type, &field.selection_set);
        self.path.pop();
    }

    fn directives(&mut self, directives: &'a ast::DirectiveList, location: DirectiveLocation) {
        for directive in directives {
            let owner = self
                .schema
                .directive_definitions
                .get(&directive.name)
                .map(ArgumentsOwner::Directive);
            self.arguments(owner, &directive.arguments, directive.location())
        }
        self.walk.directives.push(DirectivesOccurrence {
            directives,
            location,
        })
    }

    fn arguments(
        &mut self,
        owner: Option<ArgumentsOwner<'a>>,
        arguments: &'a [Node<ast::Argument>],
        location: Option<NodeLocation>,
    ) {
        for argument in arguments {
            let scope = self.scope;
            let usages = &mut self.walk.variable_usages;
            ast::Value::walk_variables(&argument.value, &mut |name, value| {
                usages.push(VariableUsage { name, value, scope })
            });
        }
        let Some(owner) = owner else { return };
        for argument in arguments {
            if let Some(definition) = owner.argument_definition(&argument.name) {
                self.input_value(
                    &argument.value,
                    &definition.ty,
                    definition.default_value.is_some(),
                )
            }
        }
        self.walk.arguments.push(ArgumentsOccurrence {
            owner,
            arguments,
            location,
            path: self.path.clone(),
        })
    }

    /// Records the value and, for lists and input objects, its nested values with their types
    fn input_value(&mut self, value: &'a Node<ast::Value>, ty: &'a ast::Type, has_default: bool) {
        self.walk.input_values.push(InputValueOccurrence {
            value,
            ty,
            has_default,
            path: self.path.clone(),
            scope: self.scope,
        });
        match (&**value, ty) {
            (ast::Value::List(items), ast::Type::List(item_type) | ast::Type::NonNullList(item_type)) => {
                for item in items {
                    self.input_value(item, item_type, false)
                }
            }
            (ast::Value::Null | ast::Value::Variable(_), _) => {}
            // A single item where a list is expected
            (_, ast::Type::List(item_type) | ast::Type::NonNullList(item_type)) => {
                self.input_value(value, item_type, false)
            }
            (ast::Value::Object(fields), ast::Type::Named(name) | ast::Type::NonNullNamed(name)) => {
                let Some(input_object) = self.schema.get_input_object(name) else {
                    return;
                };
                for (field_name, field_value) in fields {
                    if let Some(definition) = input_object.fields.get(field_name) {
                        self.input_value(
                            field_value,
                            &definition.ty,
                            definition.default_value.is_some(),
                        )
                    }
                }
            }
            _ => {}
        }
    }
}
