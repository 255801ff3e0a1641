use super::*;
use crate::execution::coerce_arguments;
use std::collections::HashMap;

struct Compiler<'a> {
    schema: &'a Schema,
    fragments: HashMap<&'a Name, &'a Node<ast::FragmentDefinition>>,
}

/// A field selection found by walking a selection set,
/// with what it inherits from the fragments it was found in
struct Occurrence<'a> {
    node: &'a Node<ast::Field>,
    parent_type: Name,
    conditions: Vec<Condition>,
    directives: Vec<&'a Node<ast::Directive>>,
    /// Fragments being expanded when this selection was found
    fragment_path: Vec<&'a Name>,
}

/// Occurrences compiled into the same field
struct Group<'a> {
    first: Occurrence<'a>,
    others: Vec<Occurrence<'a>>,
}

enum Inclusion {
    Always,
    Never,
    When(Condition),
}

pub(crate) fn compile_operation(
    schema: &Schema,
    document: &ast::Document,
    operation_name: Option<&str>,
) -> Result<ExecutableOperation, CompileError> {
    let operation = select_operation(document, operation_name)?;
    let Some(root_type) = schema.root_operation(operation.operation_type) else {
        return Err(CompileError::UnsupportedRootOperation {
            operation_type: operation.operation_type.name(),
            location: operation.location(),
        });
    };
    let compiler = Compiler {
        schema,
        fragments: document
            .fragments()
            .map(|fragment| (&fragment.name, fragment))
            .collect(),
    };
    let selection_set =
        compiler.selection_set(root_type, &[(&operation.selection_set, Vec::new())]);
    Ok(ExecutableOperation {
        name: operation.name.clone(),
        operation_type: operation.operation_type,
        root_type: root_type.clone(),
        variables: operation.variables.clone(),
        directives: operation.directives.clone(),
        selection_set,
        allow_parallelization: !operation.operation_type.is_mutation(),
        sources: document.sources.clone(),
        location: operation.location(),
    })
}

/// <https://spec.graphql.org/June2018/#GetOperation()>
fn select_operation<'doc>(
    document: &'doc ast::Document,
    operation_name: Option<&str>,
) -> Result<&'doc Node<ast::OperationDefinition>, CompileError> {
    if let Some(name) = operation_name {
        return document
            .operations()
            .find(|op| op.name.as_ref().is_some_and(|op_name| op_name == name))
            .ok_or_else(|| CompileError::UnknownOperation {
                name: name.to_owned(),
            });
    }
    let mut operations = document.operations();
    match (operations.next(), operations.next()) {
        (Some(op), None) => Ok(op),
        (Some(_), Some(_)) => Err(CompileError::MissingOperationName),
        (None, _) => Err(CompileError::NoOperation),
    }
}

impl<'a> Compiler<'a> {
    /// Compile the selection sets of one or more syntax nodes merged together
    fn selection_set(
        &self,
        parent_type: &Name,
        selection_sets: &[(&'a Vec<ast::Selection>, Vec<&'a Name>)],
    ) -> SelectionSet {
        let mut occurrences = Vec::new();
        for (selection_set, fragment_path) in selection_sets {
            let mut fragment_path = fragment_path.clone();
            self.collect(
                *selection_set,
                parent_type,
                &[],
                &[],
                &mut fragment_path,
                &mut occurrences,
            );
        }
        SelectionSet {
            fields: merge(occurrences)
                .into_iter()
                .map(|group| Arc::new(self.field(group)))
                .collect(),
        }
    }

    /// Depth-first walk of a selection set, inlining fragments
    fn collect(
        &self,
        selection_set: &'a [ast::Selection],
        parent_type: &Name,
        conditions: &[Condition],
        directives: &[&'a Node<ast::Directive>],
        fragment_path: &mut Vec<&'a Name>,
        occurrences: &mut Vec<Occurrence<'a>>,
    ) {
        for selection in selection_set {
            let mut conditions = conditions.to_vec();
            match condition_of(selection.directives(), "skip", true) {
                Inclusion::Never => continue,
                Inclusion::When(condition) => conditions.push(condition),
                Inclusion::Always => {}
            }
            match condition_of(selection.directives(), "include", false) {
                Inclusion::Never => continue,
                Inclusion::When(condition) => conditions.push(condition),
                Inclusion::Always => {}
            }
            let mut directives = directives.to_vec();
            directives.extend(non_condition_directives(selection.directives()));
            match selection {
                ast::Selection::Field(node) => occurrences.push(Occurrence {
                    node,
                    parent_type: parent_type.clone(),
                    conditions,
                    directives,
                    fragment_path: fragment_path.clone(),
                }),
                ast::Selection::InlineFragment(inline) => {
                    let type_condition = inline.type_condition.as_ref().unwrap_or(parent_type);
                    if type_condition != parent_type {
                        conditions.push(Condition::TypeCondition(type_condition.clone()))
                    }
                    self.collect(
                        &inline.selection_set,
                        type_condition,
                        &conditions,
                        &directives,
                        fragment_path,
                        occurrences,
                    )
                }
                ast::Selection::FragmentSpread(spread) => {
                    let Some(&fragment) = self.fragments.get(&spread.fragment_name) else {
                        continue;
                    };
                    if fragment_path.contains(&&fragment.name) {
                        // A cycle: validation rejects it, compilation stops expanding it
                        continue;
                    }
                    let type_condition = &fragment.type_condition;
                    if type_condition != parent_type {
                        conditions.push(Condition::TypeCondition(type_condition.clone()))
                    }
                    directives.extend(non_condition_directives(&fragment.directives));
                    fragment_path.push(&fragment.name);
                    self.collect(
                        &fragment.selection_set,
                        type_condition,
                        &conditions,
                        &directives,
                        fragment_path,
                        occurrences,
                    );
                    fragment_path.pop();
                }
            }
        }
    }

    fn field(&self, group: Group<'a>) -> ExecutableField {
        let first = &group.first;
        let node = first.node;
        let definition = self
            .schema
            .type_field(&first.parent_type, &node.name)
            .cloned();
        let has_variables = |arguments: &[Node<ast::Argument>]| {
            arguments.iter().any(|arg| arg.value.has_variables())
        };
        let static_arguments = match &definition {
            Some(def) if !has_variables(&node.arguments) => Some(coerce_arguments(
                self.schema,
                &def.arguments,
                &node.arguments,
                None,
            )),
            _ => None,
        };
        let directives = first
            .directives
            .iter()
            .filter_map(|directive| {
                let definition = self.schema.directive_definitions.get(&directive.name)?;
                let static_invocation = if has_variables(&directive.arguments) {
                    None
                } else {
                    coerce_arguments(
                        self.schema,
                        &definition.arguments,
                        &directive.arguments,
                        None,
                    )
                    .ok()
                    .map(|arguments| DirectiveInvocation {
                        name: directive.name.clone(),
                        arguments,
                        location: directive.location(),
                        implementation: definition.implementation.clone(),
                    })
                };
                Some(ExecutableDirective {
                    name: directive.name.clone(),
                    arguments: directive.arguments.clone(),
                    location: directive.location(),
                    definition: definition.clone(),
                    static_invocation,
                })
            })
            .collect();
        let selection_set = match &definition {
            Some(def) if self.is_composite(def.ty.inner_named_type()) => {
                let selection_sets: Vec<_> = std::iter::once(first)
                    .chain(&group.others)
                    .map(|occurrence| {
                        (
                            &occurrence.node.selection_set,
                            occurrence.fragment_path.clone(),
                        )
                    })
                    .collect();
                self.selection_set(def.ty.inner_named_type(), &selection_sets)
            }
            _ => SelectionSet::default(),
        };
        ExecutableField {
            response_key: node.response_key().clone(),
            name: node.name.clone(),
            parent_type: first.parent_type.clone(),
            definition,
            arguments: node.arguments.clone(),
            static_arguments,
            directives,
            conditions: first.conditions.clone(),
            selection_set,
            nodes: std::iter::once(first)
                .chain(&group.others)
                .map(|occurrence| occurrence.node.clone())
                .collect(),
        }
    }

    fn is_composite(&self, type_name: &str) -> bool {
        self.schema
            .types
            .get(type_name)
            .is_some_and(|ty| ty.is_composite())
    }
}

/// Merge unconditional occurrences that are bound to produce the same response entry.
///
/// The others are grouped at execution, once the object type and variables are known.
fn merge(occurrences: Vec<Occurrence<'_>>) -> Vec<Group<'_>> {
    let mut groups: Vec<Group<'_>> = Vec::new();
    for occurrence in occurrences {
        let mergeable = |group: &&mut Group<'_>| {
            let first = &group.first;
            first.conditions.is_empty()
                && occurrence.conditions.is_empty()
                && first.node.response_key() == occurrence.node.response_key()
                && first.node.name == occurrence.node.name
                && first.node.arguments == occurrence.node.arguments
                && first.parent_type == occurrence.parent_type
                && first.directives == occurrence.directives
        };
        if let Some(group) = groups.iter_mut().find(mergeable) {
            group.others.push(occurrence)
        } else {
            groups.push(Group {
                first: occurrence,
                others: Vec::new(),
            })
        }
    }
    groups
}

/// Evaluates `@skip` (`skip_when: true`) or `@include` (`skip_when: false`).
///
/// Literal arguments are decided now, variables at execution.
fn condition_of(directives: &ast::DirectiveList, name: &str, skip_when: bool) -> Inclusion {
    let Some(value) = directives
        .get(name)
        .and_then(|directive| directive.specified_argument_by_name("if"))
    else {
        return Inclusion::Always;
    };
    match value.as_ref() {
        ast::Value::Boolean(condition) if *condition == skip_when => Inclusion::Never,
        ast::Value::Boolean(_) => Inclusion::Always,
        _ if skip_when => Inclusion::When(Condition::Skip(value.clone())),
        _ => Inclusion::When(Condition::Include(value.clone())),
    }
}

fn non_condition_directives(
    directives: &ast::DirectiveList,
) -> impl Iterator<Item = &Node<ast::Directive>> {
    directives
        .iter()
        .filter(|directive| directive.name != "skip" && directive.name != "include")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directives::Directive;
    use crate::name;
    use crate::parser::Parser;
    use pretty_assertions::assert_eq;

    struct Upper;

    impl Directive for Upper {}

    fn schema() -> Schema {
        Schema::builder()
            .add_sdl(
                r#"
                    type Query { pet(id: ID!): Pet, pets(first: Int = 10): [Pet] }
                    type Mutation { adopt(id: ID!): Pet }
                    interface Pet { name: String }
                    type Dog implements Pet { name: String, barks: Boolean }
                    type Cat implements Pet { name: String, meows: Boolean }
                    directive @upper on FIELD
                "#,
                "schema.graphql",
            )
            .directive("upper", Upper)
            .build()
            .unwrap()
    }

    fn compile(
        query: &str,
        operation_name: Option<&str>,
    ) -> Result<ExecutableOperation, CompileError> {
        let document = Parser::new().parse_ast(query, "query.graphql").unwrap();
        ExecutableOperation::compile(&schema(), &document, operation_name)
    }

    fn keys(selection_set: &SelectionSet) -> Vec<&str> {
        selection_set
            .fields
            .iter()
            .map(|field| field.response_key.as_str())
            .collect()
    }

    #[test]
    fn operation_selection() {
        let query = "query A { pets { name } } query B { pets { name } }";
        assert_eq!(compile(query, Some("B")).unwrap().name.unwrap(), "B");
        assert_eq!(
            compile(query, None).unwrap_err().to_string(),
            "Must provide operation name if query contains multiple operations."
        );
        assert_eq!(
            compile(query, Some("C")).unwrap_err().to_string(),
            "Unknown operation named < C >."
        );
        assert_eq!(
            compile("fragment F on Query { pets { name } }", None)
                .unwrap_err()
                .to_string(),
            "Must provide an operation."
        );
        assert_eq!(
            compile("subscription { pets { name } }", None)
                .unwrap_err()
                .to_string(),
            "Schema is not configured to execute subscription operation."
        );
        let mutation = compile("mutation { adopt(id: 1) { name } }", None).unwrap();
        assert!(!mutation.allow_parallelization);
        assert_eq!(mutation.root_type, "Mutation");
    }

    #[test]
    fn fragments_are_inlined() {
        let operation = compile(
            r#"
                {
                    pets {
                        ...PetName
                        ... on Dog { barks }
                        ... { name }
                    }
                }
                fragment PetName on Pet { name }
            "#,
            None,
        )
        .unwrap();
        let pets = &operation.selection_set.fields[0];
        // Both `name` selections are on `Pet` without condition: merged
        assert_eq!(keys(&pets.selection_set), ["name", "barks"]);
        let name = &pets.selection_set.fields[0];
        assert_eq!(name.nodes.len(), 2);
        assert!(name.is_unconditional());
        let barks = &pets.selection_set.fields[1];
        assert_eq!(barks.parent_type, "Dog");
        assert_eq!(barks.conditions, [Condition::TypeCondition(name!("Dog"))]);
        assert!(barks.definition.is_some());
    }

    #[test]
    fn skip_and_include() {
        let operation = compile(
            r#"
                query($yes: Boolean!) {
                    a: pets @skip(if: true) { name }
                    b: pets @include(if: true) { name }
                    c: pets @include(if: false) { name }
                    d: pets @skip(if: $yes) { name }
                }
            "#,
            None,
        )
        .unwrap();
        assert_eq!(keys(&operation.selection_set), ["b", "d"]);
        let d = &operation.selection_set.fields[1];
        assert!(matches!(
            &d.conditions[..],
            [Condition::Skip(value)] if value.as_variable().is_some_and(|var| var == "yes")
        ));
    }

    #[test]
    fn arguments_are_coerced_once_when_static() {
        let operation = compile(
            r#"
                query($id: ID!) {
                    pets { name }
                    pet(id: $id) { name }
                    other: pet(id: 4) @upper { name }
                }
            "#,
            None,
        )
        .unwrap();
        let fields = &operation.selection_set.fields;
        let Some(Ok(pets_arguments)) = &fields[0].static_arguments else {
            panic!("expected static arguments")
        };
        assert_eq!(pets_arguments.get("first").and_then(|v| v.as_i64()), Some(10));
        assert!(fields[1].static_arguments.is_none());
        let Some(Ok(pet_arguments)) = &fields[2].static_arguments else {
            panic!("expected static arguments")
        };
        assert_eq!(pet_arguments.get("id").and_then(|v| v.as_str()), Some("4"));
        assert_eq!(fields[2].directives.len(), 1);
        assert!(fields[2].directives[0].static_invocation.is_some());
    }

    #[test]
    fn undefined_fields_compile_without_definition() {
        let operation = compile("{ nope { name } }", None).unwrap();
        let field = &operation.selection_set.fields[0];
        assert!(field.definition.is_none());
        assert!(field.selection_set.fields.is_empty());
    }

    #[test]
    fn fragment_cycles_are_not_expanded() {
        let operation = compile(
            r#"
                { pets { ...A } }
                fragment A on Pet { name ...B }
                fragment B on Pet { ...A }
            "#,
            None,
        )
        .unwrap();
        assert_eq!(keys(&operation.selection_set.fields[0].selection_set), ["name"]);
    }
}
