use crate::ast;
use crate::ast::Document;
use crate::node::FileId;
use crate::node::NodeLocation;
use crate::parser::SourceFile;
use crate::Node;
use apollo_parser::cst;
use apollo_parser::cst::CstNode;
use apollo_parser::SyntaxNode;
use apollo_parser::S;
use std::sync::Arc;

impl Document {
    pub(crate) fn from_cst(
        document: cst::Document,
        file_id: FileId,
        source_file: Arc<SourceFile>,
    ) -> Self {
        let mut sources = indexmap::IndexMap::new();
        sources.insert(file_id, source_file);
        Self {
            sources: Arc::new(sources),
            definitions: document
                .definitions()
                .filter_map(|def| def.convert(file_id))
                .collect(),
        }
    }
}

/// Like `TryFrom` but returning `Option`: a CST node missing a required child
/// has a matching entry in `SyntaxTree::errors`, so the node is silently dropped.
trait Convert {
    type Target;
    fn convert(&self, file_id: FileId) -> Option<Self::Target>;
}

fn located<T>(file_id: FileId, syntax_node: &SyntaxNode, node: T) -> Node<T> {
    Node::new_parsed(node, NodeLocation::new(file_id, syntax_node))
}

fn convert_located<C>(file_id: FileId, cst: &C) -> Option<Node<C::Target>>
where
    C: CstNode + Convert,
{
    Some(located(file_id, cst.syntax(), cst.convert(file_id)?))
}

fn collect<C, T>(file_id: FileId, iter: impl IntoIterator<Item = C>) -> Vec<Node<T>>
where
    C: CstNode + Convert<Target = T>,
{
    iter.into_iter()
        .filter_map(|cst| convert_located(file_id, &cst))
        .collect()
}

fn name(file_id: FileId, cst: Option<cst::Name>) -> Option<ast::Name> {
    cst?.convert(file_id)
}

fn description(cst: Option<cst::Description>) -> Option<String> {
    Some(String::from(cst?.string_value()?))
}

fn directives(file_id: FileId, cst: Option<cst::Directives>) -> ast::DirectiveList {
    ast::DirectiveList(
        cst.map(|list| collect(file_id, list.directives()))
            .unwrap_or_default(),
    )
}

fn arguments(file_id: FileId, cst: Option<cst::Arguments>) -> Vec<Node<ast::Argument>> {
    cst.map(|list| collect(file_id, list.arguments()))
        .unwrap_or_default()
}

fn arguments_definition(
    file_id: FileId,
    cst: Option<cst::ArgumentsDefinition>,
) -> Vec<Node<ast::InputValueDefinition>> {
    cst.map(|list| collect(file_id, list.input_value_definitions()))
        .unwrap_or_default()
}

fn fields_definition(
    file_id: FileId,
    cst: Option<cst::FieldsDefinition>,
) -> Vec<Node<ast::FieldDefinition>> {
    cst.map(|list| collect(file_id, list.field_definitions()))
        .unwrap_or_default()
}

fn input_fields_definition(
    file_id: FileId,
    cst: Option<cst::InputFieldsDefinition>,
) -> Vec<Node<ast::InputValueDefinition>> {
    cst.map(|list| collect(file_id, list.input_value_definitions()))
        .unwrap_or_default()
}

fn enum_values_definition(
    file_id: FileId,
    cst: Option<cst::EnumValuesDefinition>,
) -> Vec<Node<ast::EnumValueDefinition>> {
    cst.map(|list| collect(file_id, list.enum_value_definitions()))
        .unwrap_or_default()
}

fn implements_interfaces(file_id: FileId, cst: Option<cst::ImplementsInterfaces>) -> Vec<ast::Name> {
    cst.map(|list| {
        list.named_types()
            .filter_map(|ty| name(file_id, ty.name()))
            .collect()
    })
    .unwrap_or_default()
}

fn union_members(file_id: FileId, cst: Option<cst::UnionMemberTypes>) -> Vec<ast::Name> {
    cst.map(|list| {
        list.named_types()
            .filter_map(|ty| name(file_id, ty.name()))
            .collect()
    })
    .unwrap_or_default()
}

fn default_value(file_id: FileId, cst: Option<cst::DefaultValue>) -> Option<Option<Node<ast::Value>>> {
    let Some(default) = cst else {
        return Some(None);
    };
    Some(Some(convert_located(file_id, &default.value()?)?))
}

fn selection_set(file_id: FileId, cst: Option<cst::SelectionSet>) -> Vec<ast::Selection> {
    cst.map(|set| {
        set.selections()
            .filter_map(|selection| selection.convert(file_id))
            .collect()
    })
    .unwrap_or_default()
}

fn root_operations(
    file_id: FileId,
    iter: impl Iterator<Item = cst::RootOperationTypeDefinition>,
) -> Vec<Node<(ast::OperationType, ast::Name)>> {
    iter.filter_map(|def| {
        let ty = def.operation_type()?.convert(file_id)?;
        let name = name(file_id, def.named_type()?.name())?;
        Some(located(file_id, def.syntax(), (ty, name)))
    })
    .collect()
}

impl Convert for cst::Definition {
    type Target = ast::Definition;

    fn convert(&self, file_id: FileId) -> Option<Self::Target> {
        use ast::Definition as A;
        use cst::Definition as C;
        Some(match self {
            C::OperationDefinition(def) => A::OperationDefinition(convert_located(file_id, def)?),
            C::FragmentDefinition(def) => A::FragmentDefinition(convert_located(file_id, def)?),
            C::DirectiveDefinition(def) => A::DirectiveDefinition(convert_located(file_id, def)?),
            C::SchemaDefinition(def) => A::SchemaDefinition(convert_located(file_id, def)?),
            C::ScalarTypeDefinition(def) => {
                A::ScalarTypeDefinition(convert_located(file_id, def)?)
            }
            C::ObjectTypeDefinition(def) => {
                A::ObjectTypeDefinition(convert_located(file_id, def)?)
            }
            C::InterfaceTypeDefinition(def) => {
                A::InterfaceTypeDefinition(convert_located(file_id, def)?)
            }
            C::UnionTypeDefinition(def) => A::UnionTypeDefinition(convert_located(file_id, def)?),
            C::EnumTypeDefinition(def) => A::EnumTypeDefinition(convert_located(file_id, def)?),
            C::InputObjectTypeDefinition(def) => {
                A::InputObjectTypeDefinition(convert_located(file_id, def)?)
            }
            C::SchemaExtension(def) => A::SchemaExtension(convert_located(file_id, def)?),
            C::ScalarTypeExtension(def) => A::ScalarTypeExtension(convert_located(file_id, def)?),
            C::ObjectTypeExtension(def) => A::ObjectTypeExtension(convert_located(file_id, def)?),
            C::InterfaceTypeExtension(def) => {
                A::InterfaceTypeExtension(convert_located(file_id, def)?)
            }
            C::UnionTypeExtension(def) => A::UnionTypeExtension(convert_located(file_id, def)?),
            C::EnumTypeExtension(def) => A::EnumTypeExtension(convert_located(file_id, def)?),
            C::InputObjectTypeExtension(def) => {
                A::InputObjectTypeExtension(convert_located(file_id, def)?)
            }
        })
    }
}

impl Convert for cst::OperationDefinition {
    type Target = ast::OperationDefinition;

    fn convert(&self, file_id: FileId) -> Option<Self::Target> {
        let operation_type = match self.operation_type() {
            Some(ty) => ty.convert(file_id)?,
            // Query shorthand: `{ field }`
            None => ast::OperationType::Query,
        };
        Some(Self::Target {
            operation_type,
            name: self.name().map(|n| n.convert(file_id)).unwrap_or(None),
            variables: self
                .variable_definitions()
                .map(|list| collect(file_id, list.variable_definitions()))
                .unwrap_or_default(),
            directives: directives(file_id, self.directives()),
            selection_set: selection_set(file_id, Some(self.selection_set()?)),
        })
    }
}

impl Convert for cst::FragmentDefinition {
    type Target = ast::FragmentDefinition;

    fn convert(&self, file_id: FileId) -> Option<Self::Target> {
        Some(Self::Target {
            name: name(file_id, self.fragment_name()?.name())?,
            type_condition: name(file_id, self.type_condition()?.named_type()?.name())?,
            directives: directives(file_id, self.directives()),
            selection_set: selection_set(file_id, Some(self.selection_set()?)),
        })
    }
}

impl Convert for cst::DirectiveDefinition {
    type Target = ast::DirectiveDefinition;

    fn convert(&self, file_id: FileId) -> Option<Self::Target> {
        Some(Self::Target {
            description: description(self.description()),
            name: name(file_id, self.name())?,
            arguments: arguments_definition(file_id, self.arguments_definition()),
            repeatable: self.repeatable_token().is_some(),
            locations: self
                .directive_locations()
                .map(|list| {
                    list.directive_locations()
                        .filter_map(|location| location.convert(file_id))
                        .collect()
                })
                .unwrap_or_default(),
        })
    }
}

impl Convert for cst::SchemaDefinition {
    type Target = ast::SchemaDefinition;

    fn convert(&self, file_id: FileId) -> Option<Self::Target> {
        Some(Self::Target {
            description: description(self.description()),
            directives: directives(file_id, self.directives()),
            root_operations: root_operations(file_id, self.root_operation_type_definitions()),
        })
    }
}

impl Convert for cst::ScalarTypeDefinition {
    type Target = ast::ScalarTypeDefinition;

    fn convert(&self, file_id: FileId) -> Option<Self::Target> {
        Some(Self::Target {
            description: description(self.description()),
            name: name(file_id, self.name())?,
            directives: directives(file_id, self.directives()),
        })
    }
}

impl Convert for cst::ObjectTypeDefinition {
    type Target = ast::ObjectTypeDefinition;

    fn convert(&self, file_id: FileId) -> Option<Self::Target> {
        Some(Self::Target {
            description: description(self.description()),
            name: name(file_id, self.name())?,
            implements_interfaces: implements_interfaces(file_id, self.implements_interfaces()),
            directives: directives(file_id, self.directives()),
            fields: fields_definition(file_id, self.fields_definition()),
        })
    }
}

impl Convert for cst::InterfaceTypeDefinition {
    type Target = ast::InterfaceTypeDefinition;

    fn convert(&self, file_id: FileId) -> Option<Self::Target> {
        Some(Self::Target {
            description: description(self.description()),
            name: name(file_id, self.name())?,
            implements_interfaces: implements_interfaces(file_id, self.implements_interfaces()),
            directives: directives(file_id, self.directives()),
            fields: fields_definition(file_id, self.fields_definition()),
        })
    }
}

impl Convert for cst::UnionTypeDefinition {
    type Target = ast::UnionTypeDefinition;

    fn convert(&self, file_id: FileId) -> Option<Self::Target> {
        Some(Self::Target {
            description: description(self.description()),
            name: name(file_id, self.name())?,
            directives: directives(file_id, self.directives()),
            members: union_members(file_id, self.union_member_types()),
        })
    }
}

impl Convert for cst::EnumTypeDefinition {
    type Target = ast::EnumTypeDefinition;

    fn convert(&self, file_id: FileId) -> Option<Self::Target> {
        Some(Self::Target {
            description: description(self.description()),
            name: name(file_id, self.name())?,
            directives: directives(file_id, self.directives()),
            values: enum_values_definition(file_id, self.enum_values_definition()),
        })
    }
}

impl Convert for cst::InputObjectTypeDefinition {
    type Target = ast::InputObjectTypeDefinition;

    fn convert(&self, file_id: FileId) -> Option<Self::Target> {
        Some(Self::Target {
            description: description(self.description()),
            name: name(file_id, self.name())?,
            directives: directives(file_id, self.directives()),
            fields: input_fields_definition(file_id, self.input_fields_definition()),
        })
    }
}

impl Convert for cst::SchemaExtension {
    type Target = ast::SchemaExtension;

    fn convert(&self, file_id: FileId) -> Option<Self::Target> {
        Some(Self::Target {
            directives: directives(file_id, self.directives()),
            root_operations: root_operations(file_id, self.root_operation_type_definitions()),
        })
    }
}

impl Convert for cst::ScalarTypeExtension {
    type Target = ast::ScalarTypeExtension;

    fn convert(&self, file_id: FileId) -> Option<Self::Target> {
        Some(Self::Target {
            name: name(file_id, self.name())?,
            directives: directives(file_id, self.directives()),
        })
    }
}

impl Convert for cst::ObjectTypeExtension {
    type Target = ast::ObjectTypeExtension;

    fn convert(&self, file_id: FileId) -> Option<Self::Target> {
        Some(Self::Target {
            name: name(file_id, self.name())?,
            implements_interfaces: implements_interfaces(file_id, self.implements_interfaces()),
            directives: directives(file_id, self.directives()),
            fields: fields_definition(file_id, self.fields_definition()),
        })
    }
}

impl Convert for cst::InterfaceTypeExtension {
    type Target = ast::InterfaceTypeExtension;

    fn convert(&self, file_id: FileId) -> Option<Self::Target> {
        Some(Self::Target {
            name: name(file_id, self.name())?,
            implements_interfaces: implements_interfaces(file_id, self.implements_interfaces()),
            directives: directives(file_id, self.directives()),
            fields: fields_definition(file_id, self.fields_definition()),
        })
    }
}

impl Convert for cst::UnionTypeExtension {
    type Target = ast::UnionTypeExtension;

    fn convert(&self, file_id: FileId) -> Option<Self::Target> {
        Some(Self::Target {
            name: name(file_id, self.name())?,
            directives: directives(file_id, self.directives()),
            members: union_members(file_id, self.union_member_types()),
        })
    }
}

impl Convert for cst::EnumTypeExtension {
    type Target = ast::EnumTypeExtension;

    fn convert(&self, file_id: FileId) -> Option<Self::Target> {
        Some(Self::Target {
            name: name(file_id, self.name())?,
            directives: directives(file_id, self.directives()),
            values: enum_values_definition(file_id, self.enum_values_definition()),
        })
    }
}

impl Convert for cst::InputObjectTypeExtension {
    type Target = ast::InputObjectTypeExtension;

    fn convert(&self, file_id: FileId) -> Option<Self::Target> {
        Some(Self::Target {
            name: name(file_id, self.name())?,
            directives: directives(file_id, self.directives()),
            fields: input_fields_definition(file_id, self.input_fields_definition()),
        })
    }
}

impl Convert for cst::Directive {
    type Target = ast::Directive;

    fn convert(&self, file_id: FileId) -> Option<Self::Target> {
        Some(Self::Target {
            name: name(file_id, self.name())?,
            arguments: arguments(file_id, self.arguments()),
        })
    }
}

impl Convert for cst::OperationType {
    type Target = ast::OperationType;

    fn convert(&self, _file_id: FileId) -> Option<Self::Target> {
        match self.syntax().first_token()?.kind() {
            S![query] => Some(ast::OperationType::Query),
            S![mutation] => Some(ast::OperationType::Mutation),
            S![subscription] => Some(ast::OperationType::Subscription),
            _ => None,
        }
    }
}

impl Convert for cst::DirectiveLocation {
    type Target = ast::DirectiveLocation;

    fn convert(&self, _file_id: FileId) -> Option<Self::Target> {
        use ast::DirectiveLocation as L;
        Some(match self.syntax().first_token()?.kind() {
            S![QUERY] => L::Query,
            S![MUTATION] => L::Mutation,
            S![SUBSCRIPTION] => L::Subscription,
            S![FIELD] => L::Field,
            S![FRAGMENT_DEFINITION] => L::FragmentDefinition,
            S![FRAGMENT_SPREAD] => L::FragmentSpread,
            S![INLINE_FRAGMENT] => L::InlineFragment,
            S![VARIABLE_DEFINITION] => L::VariableDefinition,
            S![SCHEMA] => L::Schema,
            S![SCALAR] => L::Scalar,
            S![OBJECT] => L::Object,
            S![FIELD_DEFINITION] => L::FieldDefinition,
            S![ARGUMENT_DEFINITION] => L::ArgumentDefinition,
            S![INTERFACE] => L::Interface,
            S![UNION] => L::Union,
            S![ENUM] => L::Enum,
            S![ENUM_VALUE] => L::EnumValue,
            S![INPUT_OBJECT] => L::InputObject,
            S![INPUT_FIELD_DEFINITION] => L::InputFieldDefinition,
            _ => return None,
        })
    }
}

impl Convert for cst::VariableDefinition {
    type Target = ast::VariableDefinition;

    fn convert(&self, file_id: FileId) -> Option<Self::Target> {
        Some(Self::Target {
            name: name(file_id, self.variable()?.name())?,
            ty: convert_located(file_id, &self.ty()?)?,
            default_value: default_value(file_id, self.default_value())?,
            directives: directives(file_id, self.directives()),
        })
    }
}

impl Convert for cst::Type {
    type Target = ast::Type;

    fn convert(&self, file_id: FileId) -> Option<Self::Target> {
        use ast::Type as A;
        use cst::Type as C;
        match self {
            C::NamedType(named) => Some(A::Named(name(file_id, named.name())?)),
            C::ListType(inner) => Some(A::List(Box::new(inner.ty()?.convert(file_id)?))),
            C::NonNullType(inner) => {
                if let Some(named) = inner.named_type() {
                    Some(A::NonNullNamed(name(file_id, named.name())?))
                } else {
                    let list = inner.list_type()?;
                    Some(A::NonNullList(Box::new(list.ty()?.convert(file_id)?)))
                }
            }
        }
    }
}

impl Convert for cst::FieldDefinition {
    type Target = ast::FieldDefinition;

    fn convert(&self, file_id: FileId) -> Option<Self::Target> {
        Some(Self::Target {
            description: description(self.description()),
            name: name(file_id, self.name())?,
            arguments: arguments_definition(file_id, self.arguments_definition()),
            ty: self.ty()?.convert(file_id)?,
            directives: directives(file_id, self.directives()),
        })
    }
}

impl Convert for cst::Argument {
    type Target = ast::Argument;

    fn convert(&self, file_id: FileId) -> Option<Self::Target> {
        Some(ast::Argument {
            name: name(file_id, self.name())?,
            value: convert_located(file_id, &self.value()?)?,
        })
    }
}

impl Convert for cst::InputValueDefinition {
    type Target = ast::InputValueDefinition;

    fn convert(&self, file_id: FileId) -> Option<Self::Target> {
        Some(Self::Target {
            description: description(self.description()),
            name: name(file_id, self.name())?,
            ty: convert_located(file_id, &self.ty()?)?,
            default_value: default_value(file_id, self.default_value())?,
            directives: directives(file_id, self.directives()),
        })
    }
}

impl Convert for cst::EnumValueDefinition {
    type Target = ast::EnumValueDefinition;

    fn convert(&self, file_id: FileId) -> Option<Self::Target> {
        Some(Self::Target {
            description: description(self.description()),
            value: name(file_id, self.enum_value()?.name())?,
            directives: directives(file_id, self.directives()),
        })
    }
}

impl Convert for cst::Selection {
    type Target = ast::Selection;

    fn convert(&self, file_id: FileId) -> Option<Self::Target> {
        use ast::Selection as A;
        use cst::Selection as C;
        Some(match self {
            C::Field(x) => A::Field(convert_located(file_id, x)?),
            C::FragmentSpread(x) => A::FragmentSpread(convert_located(file_id, x)?),
            C::InlineFragment(x) => A::InlineFragment(convert_located(file_id, x)?),
        })
    }
}

impl Convert for cst::Field {
    type Target = ast::Field;

    fn convert(&self, file_id: FileId) -> Option<Self::Target> {
        Some(Self::Target {
            alias: match self.alias() {
                Some(alias) => Some(name(file_id, alias.name())?),
                None => None,
            },
            name: name(file_id, self.name())?,
            arguments: arguments(file_id, self.arguments()),
            directives: directives(file_id, self.directives()),
            // Empty for a leaf field
            selection_set: selection_set(file_id, self.selection_set()),
        })
    }
}

impl Convert for cst::FragmentSpread {
    type Target = ast::FragmentSpread;

    fn convert(&self, file_id: FileId) -> Option<Self::Target> {
        Some(Self::Target {
            fragment_name: name(file_id, self.fragment_name()?.name())?,
            directives: directives(file_id, self.directives()),
        })
    }
}

impl Convert for cst::InlineFragment {
    type Target = ast::InlineFragment;

    fn convert(&self, file_id: FileId) -> Option<Self::Target> {
        Some(Self::Target {
            type_condition: match self.type_condition() {
                Some(condition) => Some(name(file_id, condition.named_type()?.name())?),
                None => None,
            },
            directives: directives(file_id, self.directives()),
            selection_set: selection_set(file_id, Some(self.selection_set()?)),
        })
    }
}

impl Convert for cst::Value {
    type Target = ast::Value;

    fn convert(&self, file_id: FileId) -> Option<Self::Target> {
        use ast::Value as A;
        use cst::Value as C;
        Some(match self {
            C::Variable(v) => A::Variable(name(file_id, v.name())?),
            C::StringValue(v) => A::String(String::from(v)),
            C::FloatValue(v) => A::Float(ast::FloatValue::new_parsed(
                v.syntax().first_token()?.text(),
            )),
            C::IntValue(v) => A::Int(ast::IntValue::new_parsed(v.syntax().first_token()?.text())),
            C::BooleanValue(v) => A::Boolean(bool::try_from(v).ok()?),
            C::NullValue(_) => A::Null,
            C::EnumValue(v) => A::Enum(name(file_id, v.name())?),
            C::ListValue(v) => A::List(collect(file_id, v.values())),
            C::ObjectValue(v) => A::Object(
                v.object_fields()
                    .filter_map(|field| {
                        let field_name = name(file_id, field.name())?;
                        let value = convert_located(file_id, &field.value()?)?;
                        Some((field_name, value))
                    })
                    .collect(),
            ),
        })
    }
}

impl Convert for cst::Name {
    type Target = ast::Name;

    fn convert(&self, _file_id: FileId) -> Option<Self::Target> {
        // The lexer only produces name tokens in valid name syntax
        Some(ast::Name::new_unchecked(self.text().as_str()))
    }
}
