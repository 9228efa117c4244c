//! C++ header synthesis
//!
//! Turns a resolved module into one self-contained C++17 header. Emission is
//! two-pass over the type list: a declarations pass fixes every aggregate
//! layout and operator prototype first, then a definitions pass emits the
//! `inline` bodies and codec specializations. The shared runtime support
//! section sits between the passes so definition bodies can call into it.
//!
//! Output depends only on the module and namespace arguments; equal inputs
//! produce byte-identical headers.

pub mod cpp;
pub mod runtime;

use crate::schema::{Module, TypeKind};

/// The eight standard headers every generated file needs
const INCLUDES: [&str; 8] = [
    "cstddef", "cstdint", "functional", "iostream", "limits", "optional", "string", "vector",
];

// =============================================================================
// Generated output
// =============================================================================

/// One synthesized header, not yet written to disk
#[derive(Debug, Clone)]
pub struct GeneratedHeader {
    /// Output file name, `<module>.hpp`
    pub file_name: String,
    pub contents: String,
    /// Number of type definitions emitted
    pub type_count: usize,
}

/// Generate the header for a resolved, validated module.
///
/// `namespace` wraps all generated types; empty means global namespace. The
/// module must already be in emission order: the declarations pass defines
/// each aggregate completely, so every by-value reference must point
/// backwards.
pub fn generate(module: &Module, namespace: &str) -> GeneratedHeader {
    let mut out = String::new();
    let guard = format!("INCLUDED_{}", module.name.to_uppercase());

    out.push_str(&format!("//! \\file {}.hpp\n", module.name));
    if !module.doc.is_empty() {
        out.push_str(&format!("//! \\brief {}\n", module.doc.replace('\n', "\n//! ")));
    }
    out.push_str(&format!("\n#ifndef {guard}\n#define {guard}\n\n"));
    for inc in INCLUDES {
        out.push_str(&format!("#include <{inc}>\n"));
    }
    if !namespace.is_empty() {
        out.push_str(&format!("\nnamespace {namespace} {{\n"));
    }

    for t in &module.types {
        cpp::emit_decl(&mut out, t);
    }

    out.push_str("\n// IMPLEMENTATION\n");
    out.push_str(&runtime::support_section(namespace));

    let nsq = if namespace.is_empty() {
        String::new()
    } else {
        format!("{namespace}::")
    };
    for t in &module.types {
        cpp::emit_def(&mut out, t, &nsq);
    }

    if !namespace.is_empty() {
        out.push_str(&format!("\n}} // namespace {namespace}\n"));
    }
    out.push('\n');

    for t in &module.types {
        if t.kind() != TypeKind::Enum {
            cpp::emit_hash(&mut out, t, &nsq);
        }
    }

    out.push_str(&format!("#endif // {guard}\n"));

    GeneratedHeader {
        file_name: format!("{}.hpp", module.name),
        contents: out,
        type_count: module.types.len(),
    }
}
