//! msggen
//!
//! A compiler from a restricted Python-esque declaration syntax to
//! value-semantic C++ message types.
//!
//! Input modules declare enums, sequences (records), and choices (tagged
//! unions) as classes with annotated fields. The compiler parses them into a
//! typed IR, validates the result, computes a safe emission order over the
//! by-value reference graph (breaking cycles by widening fields to
//! optional), and synthesizes one self-contained C++17 header per module
//! with equality, ordering, hashing, printing, and a JSON codec for every
//! type.
//!
//! ## Pipeline
//!
//! ```text
//! source text
//!     └─ parser::parse      -> schema::Module
//!         └─ validate::validate
//!             └─ graph::resolve  -> emission order + cycle diagnostics
//!                 └─ validate::validate (widened fields re-checked)
//!                     └─ codegen::generate -> <module>.hpp
//! ```

pub mod codegen;
pub mod error;
pub mod graph;
pub mod parser;
pub mod schema;
pub mod validate;

pub use codegen::GeneratedHeader;
pub use error::{Error, Result};
pub use graph::{CycleDiagnostic, Resolution};
pub use schema::{Field, Literal, Module, ScalarType, TypeDef, TypeKind};

/// Run the whole pipeline over one module source.
///
/// `module_name` names the output header and its include guard; `namespace`
/// wraps the generated types (empty for the global namespace). Validation
/// runs twice, before and after resolution, so widened fields are held to
/// the same field invariants as declared ones. Cycle repairs are returned
/// alongside the header for the caller to surface.
pub fn compile(
    source: &str,
    module_name: &str,
    namespace: &str,
) -> Result<(GeneratedHeader, Vec<CycleDiagnostic>)> {
    let module = parser::parse(source, module_name)?;
    validate::validate(&module)?;
    let Resolution { module, cycles } = graph::resolve(module);
    validate::validate(&module)?;
    Ok((codegen::generate(&module, namespace), cycles))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compiles_a_minimal_module() {
        let src = "\
class Point(Sequence):
    x: int
    y: int
";
        let (header, cycles) = compile(src, "geometry", "geo").unwrap();
        assert!(cycles.is_empty());
        assert_eq!(header.file_name, "geometry.hpp");
        assert_eq!(header.type_count, 1);
        assert!(header.contents.contains("struct Point {"));
        assert!(header.contents.contains("namespace geo {"));
    }

    #[test]
    fn surfaces_cycle_repairs() {
        let src = "\
class A(Sequence):
    b: B

class B(Sequence):
    a: A
";
        let (header, cycles) = compile(src, "cyc", "").unwrap();
        assert_eq!(cycles.len(), 1);
        assert!(cycles[0].widened);
        assert!(header.contents.contains("std::optional<A> a"));
    }

    #[test]
    fn validation_errors_stop_the_pipeline() {
        let src = "\
class A(Sequence):
    x: Missing
";
        assert!(matches!(
            compile(src, "m", ""),
            Err(Error::UnresolvedTypeReference { .. })
        ));
    }
}
