mod abstract_types;
mod directives;
mod input_coercion;
mod introspection;
mod null_propagation;
mod validation;
