//! Typed intermediate representation for schema modules
//!
//! The IR is built once per compilation run by the surface parser, checked by
//! the validator, reordered (and possibly widened) by the dependency
//! resolver, and then consumed read-only by the code synthesizer.

use serde::{Deserialize, Serialize};

// =============================================================================
// Builtin scalars
// =============================================================================

/// The closed set of builtin scalar types.
///
/// These names are reserved in the surface syntax and cannot be redeclared as
/// type names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalarType {
    Int,
    Float,
    Str,
    Bool,
    U8,
    U16,
    U32,
    U64,
    I8,
    I16,
    I32,
    I64,
    F32,
    F64,
}

impl ScalarType {
    /// All builtin scalars, in surface-name order
    pub const ALL: [ScalarType; 14] = [
        ScalarType::Int,
        ScalarType::Float,
        ScalarType::Str,
        ScalarType::Bool,
        ScalarType::U8,
        ScalarType::U16,
        ScalarType::U32,
        ScalarType::U64,
        ScalarType::I8,
        ScalarType::I16,
        ScalarType::I32,
        ScalarType::I64,
        ScalarType::F32,
        ScalarType::F64,
    ];

    /// Look up a scalar by its surface-syntax name
    pub fn from_name(name: &str) -> Option<ScalarType> {
        Self::ALL
            .iter()
            .copied()
            .find(|s| s.surface_name() == name)
    }

    /// The name used in the surface syntax
    pub fn surface_name(&self) -> &'static str {
        match self {
            ScalarType::Int => "int",
            ScalarType::Float => "float",
            ScalarType::Str => "str",
            ScalarType::Bool => "bool",
            ScalarType::U8 => "u8",
            ScalarType::U16 => "u16",
            ScalarType::U32 => "u32",
            ScalarType::U64 => "u64",
            ScalarType::I8 => "i8",
            ScalarType::I16 => "i16",
            ScalarType::I32 => "i32",
            ScalarType::I64 => "i64",
            ScalarType::F32 => "f32",
            ScalarType::F64 => "f64",
        }
    }

    /// The C++ spelling of this scalar in generated code
    pub fn cpp_name(&self) -> &'static str {
        match self {
            ScalarType::Int => "int",
            ScalarType::Float => "double",
            ScalarType::Str => "std::string",
            ScalarType::Bool => "bool",
            ScalarType::U8 => "std::uint8_t",
            ScalarType::U16 => "std::uint16_t",
            ScalarType::U32 => "std::uint32_t",
            ScalarType::U64 => "std::uint64_t",
            ScalarType::I8 => "std::int8_t",
            ScalarType::I16 => "std::int16_t",
            ScalarType::I32 => "std::int32_t",
            ScalarType::I64 => "std::int64_t",
            ScalarType::F32 => "float",
            ScalarType::F64 => "double",
        }
    }

    /// Integer scalars accept integer-literal defaults of any sign variant
    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            ScalarType::Int
                | ScalarType::U8
                | ScalarType::U16
                | ScalarType::U32
                | ScalarType::U64
                | ScalarType::I8
                | ScalarType::I16
                | ScalarType::I32
                | ScalarType::I64
        )
    }

    pub fn is_float(&self) -> bool {
        matches!(self, ScalarType::Float | ScalarType::F32 | ScalarType::F64)
    }

    /// Whether the C++ representation is trivially destructible
    pub fn is_trivial(&self) -> bool {
        !matches!(self, ScalarType::Str)
    }
}

// =============================================================================
// Literals
// =============================================================================

/// A literal default value attached to a field.
///
/// `None` in the surface syntax is not a literal: it denotes the absent state
/// and is dropped by the parser, so an optional field with `= None` carries no
/// default at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Literal {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
    /// `[]` — the only legal list default
    EmptyList,
}

impl Literal {
    /// Human-readable literal kind for diagnostics
    pub fn kind_name(&self) -> &'static str {
        match self {
            Literal::Int(_) => "int",
            Literal::Float(_) => "float",
            Literal::Str(_) => "str",
            Literal::Bool(_) => "bool",
            Literal::EmptyList => "list",
        }
    }

    /// Whether this literal is a legal default for the given scalar.
    ///
    /// The literal kind must match the scalar exactly, except that any
    /// integer scalar accepts an integer literal.
    pub fn matches_scalar(&self, scalar: ScalarType) -> bool {
        match self {
            Literal::Int(_) => scalar.is_integer(),
            Literal::Float(_) => scalar.is_float(),
            Literal::Str(_) => scalar == ScalarType::Str,
            Literal::Bool(_) => scalar == ScalarType::Bool,
            Literal::EmptyList => false,
        }
    }
}

// =============================================================================
// Members
// =============================================================================

/// A named integer constant inside an `Enum`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enumerator {
    pub name: String,
    /// Fixed non-negative value; values need not be contiguous or ordered
    pub value: u64,
}

/// A field of a `Sequence` or `Choice`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    /// Builtin scalar name or the name of another type in the module
    pub type_name: String,
    /// Nullable storage; mutually exclusive with `list`
    #[serde(default)]
    pub optional: bool,
    /// Variable-length ordered sequence; mutually exclusive with `optional`
    #[serde(default)]
    pub list: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Literal>,
}

impl Field {
    /// A plain field holds its target inline and forces definition order
    pub fn is_by_value(&self) -> bool {
        !self.optional && !self.list
    }

    /// The scalar this field is typed as, if it names a builtin
    pub fn scalar(&self) -> Option<ScalarType> {
        ScalarType::from_name(&self.type_name)
    }
}

// =============================================================================
// Type definitions
// =============================================================================

/// The three category kinds a type declaration may take
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeKind {
    /// Closed set of named integer constants
    Enum,
    /// Plain record with fixed named fields
    Sequence,
    /// Tagged union; exactly one field active at a time
    Choice,
}

impl TypeKind {
    /// The base marker spelled in the surface syntax
    pub fn base_marker(&self) -> &'static str {
        match self {
            TypeKind::Enum => "Enum",
            TypeKind::Sequence => "Sequence",
            TypeKind::Choice => "Choice",
        }
    }
}

/// Member list of a type definition; the kind fixes the member shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeBody {
    Enum { enumerators: Vec<Enumerator> },
    Sequence { fields: Vec<Field> },
    Choice { fields: Vec<Field> },
}

/// One type declaration in a module.
///
/// Member order is semantically significant: it fixes field layout,
/// comparison precedence, hash-combine order, and JSON key emission order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeDef {
    pub name: String,
    #[serde(flatten)]
    pub body: TypeBody,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub doc: String,
}

impl TypeDef {
    pub fn kind(&self) -> TypeKind {
        match self.body {
            TypeBody::Enum { .. } => TypeKind::Enum,
            TypeBody::Sequence { .. } => TypeKind::Sequence,
            TypeBody::Choice { .. } => TypeKind::Choice,
        }
    }

    /// Fields of a sequence or choice; `None` for enums
    pub fn fields(&self) -> Option<&[Field]> {
        match &self.body {
            TypeBody::Enum { .. } => None,
            TypeBody::Sequence { fields } | TypeBody::Choice { fields } => Some(fields),
        }
    }

    pub fn fields_mut(&mut self) -> Option<&mut Vec<Field>> {
        match &mut self.body {
            TypeBody::Enum { .. } => None,
            TypeBody::Sequence { fields } | TypeBody::Choice { fields } => Some(fields),
        }
    }

    pub fn enumerators(&self) -> Option<&[Enumerator]> {
        match &self.body {
            TypeBody::Enum { enumerators } => Some(enumerators),
            _ => None,
        }
    }

    /// Member names in declaration order, regardless of kind
    pub fn member_names(&self) -> Vec<&str> {
        match &self.body {
            TypeBody::Enum { enumerators } => {
                enumerators.iter().map(|e| e.name.as_str()).collect()
            }
            TypeBody::Sequence { fields } | TypeBody::Choice { fields } => {
                fields.iter().map(|f| f.name.as_str()).collect()
            }
        }
    }
}

// =============================================================================
// Module
// =============================================================================

/// Top-level compilation unit: an ordered sequence of type definitions.
///
/// Declaration order is significant for diagnostics but not for emission
/// order, which is topological after resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Module {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub doc: String,
    pub types: Vec<TypeDef>,
}

impl Module {
    /// Find a type by name
    pub fn get(&self, name: &str) -> Option<&TypeDef> {
        self.types.iter().find(|t| t.name == name)
    }

    /// Index of a type by name, in declaration order
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.types.iter().position(|t| t.name == name)
    }
}
