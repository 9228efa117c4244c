//! Semantic validator
//!
//! Checks the parsed IR for internal consistency. Runs twice per compilation:
//! once right after parsing and once after dependency resolution, since
//! resolution widens fields and the result must still satisfy every field
//! invariant. Fails fast on the first violation.

use std::collections::HashSet;

use crate::error::{Error, Result};
use crate::schema::{Field, Literal, Module, ScalarType, TypeDef, TypeKind};

/// Validate a whole module.
///
/// Checks, in order: type-name uniqueness (including collisions with builtin
/// scalar names), member-name uniqueness, per-field shape legality,
/// type-reference resolvability, and the incomplete-type self-reference
/// rule.
pub fn validate(module: &Module) -> Result<()> {
    check_type_names(module)?;
    for t in &module.types {
        check_member_names(t)?;
        check_choice_arity(t)?;
    }
    for t in &module.types {
        if let Some(fields) = t.fields() {
            for f in fields {
                check_field_shape(t, f)?;
            }
        }
    }
    check_references(module)?;
    check_self_references(module)?;
    Ok(())
}

fn check_type_names(module: &Module) -> Result<()> {
    let mut seen = HashSet::new();
    for t in &module.types {
        if ScalarType::from_name(&t.name).is_some() {
            return Err(Error::DuplicateName {
                what: "type",
                name: t.name.clone(),
                scope: "the builtin scalar set".to_string(),
            });
        }
        if !seen.insert(t.name.as_str()) {
            return Err(Error::DuplicateName {
                what: "type",
                name: t.name.clone(),
                scope: format!("module {}", module.name),
            });
        }
    }
    Ok(())
}

fn check_member_names(t: &TypeDef) -> Result<()> {
    let mut seen = HashSet::new();
    for name in t.member_names() {
        if !seen.insert(name) {
            return Err(Error::DuplicateName {
                what: "member",
                name: name.to_string(),
                scope: format!("type {}", t.name),
            });
        }
    }
    Ok(())
}

/// Default construction of a choice activates field 0, so an empty choice
/// has no representable state.
fn check_choice_arity(t: &TypeDef) -> Result<()> {
    if t.kind() == TypeKind::Choice && t.fields().is_some_and(|f| f.is_empty()) {
        return Err(Error::InvalidFieldShape {
            field: t.name.clone(),
            reason: "a choice must declare at least one field".to_string(),
        });
    }
    Ok(())
}

fn check_field_shape(t: &TypeDef, f: &Field) -> Result<()> {
    let shape_err = |reason: String| Error::InvalidFieldShape {
        field: format!("{}.{}", t.name, f.name),
        reason,
    };

    if f.optional && f.list {
        return Err(shape_err("cannot be both optional and list".to_string()));
    }

    let Some(default) = &f.default else {
        return Ok(());
    };

    // `None` never survives parsing, so any recorded default on an optional
    // field is a concrete value.
    if f.optional {
        return Err(shape_err(
            "optional fields cannot have a non-null default value".to_string(),
        ));
    }
    if f.list {
        if !matches!(default, Literal::EmptyList) {
            return Err(shape_err(
                "list default values cannot have elements".to_string(),
            ));
        }
        return Ok(());
    }
    if matches!(default, Literal::EmptyList) {
        return Err(shape_err(
            "empty-list defaults are only legal on list fields".to_string(),
        ));
    }

    // Union storage cannot carry member initializers; a Choice activates
    // field 0 value-initialized instead.
    if t.kind() == TypeKind::Choice {
        return Err(shape_err(
            "choice fields cannot have default values".to_string(),
        ));
    }

    match f.scalar() {
        Some(scalar) if default.matches_scalar(scalar) => Ok(()),
        Some(scalar) => Err(shape_err(format!(
            "default value of type {} does not match field type {}",
            default.kind_name(),
            scalar.surface_name()
        ))),
        None => Err(shape_err(format!(
            "default values are allowed only for builtin scalar types, not {}",
            f.type_name
        ))),
    }
}

fn check_references(module: &Module) -> Result<()> {
    let mut known: HashSet<&str> = module.types.iter().map(|t| t.name.as_str()).collect();
    for scalar in ScalarType::ALL {
        known.insert(scalar.surface_name());
    }
    for t in &module.types {
        if let Some(fields) = t.fields() {
            for f in fields {
                if !known.contains(f.type_name.as_str()) {
                    return Err(Error::UnresolvedTypeReference {
                        type_name: t.name.clone(),
                        field: f.name.clone(),
                        target: f.type_name.clone(),
                    });
                }
            }
        }
    }
    Ok(())
}

/// A field directly typed as its enclosing type is unrepresentable: by value
/// it would have infinite size, and optional/list storage still needs the
/// complete type at that point in the generated header. Never auto-repaired.
fn check_self_references(module: &Module) -> Result<()> {
    for t in &module.types {
        if let Some(fields) = t.fields() {
            for f in fields {
                if f.type_name == t.name {
                    return Err(Error::IncompleteTypeByValue {
                        type_name: t.name.clone(),
                        field: f.name.clone(),
                    });
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Enumerator, TypeBody};

    fn field(name: &str, type_name: &str) -> Field {
        Field {
            name: name.into(),
            type_name: type_name.into(),
            optional: false,
            list: false,
            default: None,
        }
    }

    fn sequence(name: &str, fields: Vec<Field>) -> TypeDef {
        TypeDef {
            name: name.into(),
            body: TypeBody::Sequence { fields },
            doc: String::new(),
        }
    }

    fn module(types: Vec<TypeDef>) -> Module {
        Module {
            name: "test".into(),
            doc: String::new(),
            types,
        }
    }

    #[test]
    fn accepts_well_formed_module() {
        let m = module(vec![
            TypeDef {
                name: "Color".into(),
                body: TypeBody::Enum {
                    enumerators: vec![
                        Enumerator { name: "RED".into(), value: 0 },
                        Enumerator { name: "BLUE".into(), value: 4 },
                    ],
                },
                doc: String::new(),
            },
            sequence(
                "Point",
                vec![field("x", "int"), field("y", "int"), field("tint", "Color")],
            ),
        ]);
        validate(&m).unwrap();
    }

    #[test]
    fn rejects_repeated_type_name() {
        let m = module(vec![sequence("A", vec![]), sequence("A", vec![])]);
        assert!(matches!(
            validate(&m),
            Err(Error::DuplicateName { what: "type", .. })
        ));
    }

    #[test]
    fn rejects_builtin_scalar_name_reuse() {
        let m = module(vec![sequence("u32", vec![])]);
        let err = validate(&m).unwrap_err();
        assert!(err.to_string().contains("builtin scalar"));
    }

    #[test]
    fn rejects_repeated_member_name() {
        let m = module(vec![sequence(
            "A",
            vec![field("x", "int"), field("x", "str")],
        )]);
        assert!(matches!(
            validate(&m),
            Err(Error::DuplicateName { what: "member", .. })
        ));
    }

    #[test]
    fn rejects_optional_and_list_together() {
        let mut f = field("x", "int");
        f.optional = true;
        f.list = true;
        let m = module(vec![sequence("A", vec![f])]);
        assert!(matches!(validate(&m), Err(Error::InvalidFieldShape { .. })));
    }

    #[test]
    fn rejects_unresolved_reference() {
        let m = module(vec![sequence("A", vec![field("x", "Missing")])]);
        assert!(matches!(
            validate(&m),
            Err(Error::UnresolvedTypeReference { .. })
        ));
    }

    #[test]
    fn rejects_concrete_default_on_optional_field() {
        let mut f = field("x", "str");
        f.optional = true;
        f.default = Some(Literal::Str("hi".into()));
        let m = module(vec![sequence("A", vec![f])]);
        assert!(matches!(validate(&m), Err(Error::InvalidFieldShape { .. })));
    }

    #[test]
    fn rejects_mismatched_default_type() {
        let mut f = field("x", "str");
        f.default = Some(Literal::Int(7));
        let m = module(vec![sequence("A", vec![f])]);
        let err = validate(&m).unwrap_err();
        assert!(err.to_string().contains("does not match"));
    }

    #[test]
    fn accepts_integer_default_on_narrow_scalar() {
        let mut f = field("x", "u16");
        f.default = Some(Literal::Int(512));
        let m = module(vec![sequence("A", vec![f])]);
        validate(&m).unwrap();
    }

    #[test]
    fn rejects_default_on_type_reference_field() {
        let mut f = field("x", "B");
        f.default = Some(Literal::Int(1));
        let m = module(vec![sequence("A", vec![f]), sequence("B", vec![])]);
        let err = validate(&m).unwrap_err();
        assert!(err.to_string().contains("builtin scalar types"));
    }

    #[test]
    fn rejects_default_on_choice_field() {
        let mut f = field("x", "int");
        f.default = Some(Literal::Int(1));
        let m = module(vec![TypeDef {
            name: "C".into(),
            body: TypeBody::Choice { fields: vec![f] },
            doc: String::new(),
        }]);
        assert!(matches!(validate(&m), Err(Error::InvalidFieldShape { .. })));
    }

    #[test]
    fn rejects_empty_choice() {
        let m = module(vec![TypeDef {
            name: "C".into(),
            body: TypeBody::Choice { fields: vec![] },
            doc: String::new(),
        }]);
        let err = validate(&m).unwrap_err();
        assert!(err.to_string().contains("at least one field"));
    }

    #[test]
    fn rejects_by_value_self_reference() {
        let m = module(vec![sequence("A", vec![field("a", "A")])]);
        assert!(matches!(
            validate(&m),
            Err(Error::IncompleteTypeByValue { .. })
        ));
    }

    #[test]
    fn rejects_optional_self_reference() {
        let mut f = field("a", "A");
        f.optional = true;
        let m = module(vec![sequence("A", vec![f])]);
        assert!(matches!(
            validate(&m),
            Err(Error::IncompleteTypeByValue { .. })
        ));
    }

    #[test]
    fn enum_members_are_not_typed_fields() {
        // enumerator names may shadow type names without being references
        let m = module(vec![
            TypeDef {
                name: "E".into(),
                body: TypeBody::Enum {
                    enumerators: vec![Enumerator { name: "Missing".into(), value: 1 }],
                },
                doc: String::new(),
            },
        ]);
        validate(&m).unwrap();
    }
}
