//! Per-type C++ emitters
//!
//! Each type kind gets a declaration emitter (first pass) and a definition
//! emitter (second pass). Declarations carry the aggregate layout and free
//! operator prototypes; definitions carry the `inline` operator bodies and
//! the codec template specializations that hook the type into the runtime
//! dispatch. Hash specializations are emitted separately because they must
//! open `namespace std` outside the target namespace.

use crate::schema::{Field, Literal, TypeBody, TypeDef};

/// The C++ spelling of a field's storage type.
///
/// `nsq` is the namespace qualifier (`"ns::"` or empty) applied to
/// module-local type references; builtin scalars are never qualified.
pub fn cpp_type(nsq: &str, f: &Field) -> String {
    let base = match f.scalar() {
        Some(s) => s.cpp_name().to_string(),
        None => format!("{nsq}{}", f.type_name),
    };
    if f.optional {
        format!("std::optional<{base}>")
    } else if f.list {
        format!("std::vector<{base}>")
    } else {
        base
    }
}

fn cpp_string_literal(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for ch in s.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            _ => out.push(ch),
        }
    }
    out.push('"');
    out
}

fn literal_cpp(lit: &Literal) -> String {
    match lit {
        Literal::Int(v) => v.to_string(),
        Literal::Float(v) => {
            let s = format!("{v}");
            if s.contains(['.', 'e']) || s.contains("inf") || s.contains("nan") {
                s
            } else {
                format!("{s}.0")
            }
        }
        Literal::Str(s) => cpp_string_literal(s),
        Literal::Bool(true) => "true".to_string(),
        Literal::Bool(false) => "false".to_string(),
        // lists value-initialize empty; no initializer needed
        Literal::EmptyList => "{}".to_string(),
    }
}

/// A member declaration, with its default as an in-class initializer
fn field_decl(f: &Field) -> String {
    let ty = cpp_type("", f);
    match &f.default {
        Some(lit) if !matches!(lit, Literal::EmptyList) => {
            format!("{ty} {} = {}", f.name, literal_cpp(lit))
        }
        _ => format!("{ty} {}", f.name),
    }
}

/// Doxygen banner for a type: `//! \<tag> Name` plus a `\brief` when the
/// declaration carried a docstring
fn doc_banner(tag: &str, t: &TypeDef) -> String {
    let mut s = format!("//! \\{tag} {}", t.name);
    if !t.doc.is_empty() {
        s.push_str("\n//! \\brief ");
        s.push_str(&t.doc.replace('\n', "\n//! "));
    }
    s
}

// =============================================================================
// Declarations pass
// =============================================================================

pub fn emit_decl(out: &mut String, t: &TypeDef) {
    match &t.body {
        TypeBody::Enum { .. } => emit_enum_decl(out, t),
        TypeBody::Sequence { fields } => emit_sequence_decl(out, t, fields),
        TypeBody::Choice { fields } => emit_choice_decl(out, t, fields),
    }
}

fn emit_enum_decl(out: &mut String, t: &TypeDef) {
    let enumerators = t.enumerators().unwrap_or_default();
    let values = enumerators
        .iter()
        .map(|e| format!("{} = {}", e.name, e.value))
        .collect::<Vec<_>>()
        .join(",\n    ");
    out.push_str(&format!(
        "\n{banner}\nenum class {name} {{\n    {values}\n}};\n\
         \n// FREE OPERATORS\n\
         std::ostream& operator<<(std::ostream& os, const {name}& obj);\n\
         std::istream& fromJson(std::istream& is, {name}& obj);\n\
         std::ostream& toJson(std::ostream& os, const {name}& obj);\n",
        banner = doc_banner("enum", t),
        name = t.name,
    ));
}

fn emit_sequence_decl(out: &mut String, t: &TypeDef, fields: &[Field]) {
    let body = if fields.is_empty() {
        String::new()
    } else {
        let decls = fields
            .iter()
            .map(field_decl)
            .collect::<Vec<_>>()
            .join(";\n    ");
        format!("    {decls};\n")
    };
    out.push_str(&format!(
        "\n{banner}\nstruct {name} {{\n{body}}};\n\n",
        banner = doc_banner("class", t),
        name = t.name,
    ));
    out.push_str(&comparable_operator_decls(&t.name));
}

fn emit_choice_decl(out: &mut String, t: &TypeDef, fields: &[Field]) {
    let members = fields
        .iter()
        .map(field_decl)
        .collect::<Vec<_>>()
        .join(";\n        ");
    let make_arms = fields
        .iter()
        .enumerate()
        .map(|(idx, f)| {
            format!(
                "if constexpr(IDX == {idx}) {{ ::new ((void*)&{}) {}(std::forward<ARGS>(args)...); }}",
                f.name,
                cpp_type("", f),
            )
        })
        .collect::<Vec<_>>()
        .join("\n            ");
    out.push_str(&format!(
        r#"
{banner}
struct {name} {{
  private:
    int d_choice;
  public:
    union {{
        {members};
    }};

    // CREATORS
    {name}() noexcept;

    ~{name}() noexcept;

    {name}(const {name}& rhs);

    {name}({name}&& rhs) noexcept;

    {name}& operator=(const {name}& rhs);

    {name}& operator=({name}&& rhs) noexcept;

    //! \return The current field choice index (0-based).
    int choice() const {{ return d_choice; }}

    template <int IDX, class... ARGS>
    {name}& make(ARGS&&... args) noexcept
    {{
        static_assert(IDX >= 0 && IDX < {count}, "Invalid index");
        this->~{name}();
        this->d_choice = IDX;
        try {{
            {make_arms}
        }}
        catch (...) {{
            ::new ((void*)this) {name}();
        }}
        return *this;
    }}

  private:
    friend std::istream& fromJson(std::istream& is, {name}& obj);
}};

"#,
        banner = doc_banner("class", t),
        name = t.name,
        count = fields.len(),
    ));
    out.push_str(&comparable_operator_decls(&t.name));
}

fn comparable_operator_decls(name: &str) -> String {
    format!(
        "// FREE OPERATORS\n\
         bool operator==(const {name}& lhs, const {name}& rhs) noexcept;\n\
         bool operator!=(const {name}& lhs, const {name}& rhs) noexcept;\n\
         bool operator<(const {name}& lhs, const {name}& rhs) noexcept;\n\
         bool operator>(const {name}& lhs, const {name}& rhs) noexcept;\n\
         bool operator<=(const {name}& lhs, const {name}& rhs) noexcept;\n\
         bool operator>=(const {name}& lhs, const {name}& rhs) noexcept;\n\
         std::ostream& operator<<(std::ostream& os, const {name}& obj);\n\
         std::istream& fromJson(std::istream& is, {name}& obj);\n\
         std::ostream& toJson(std::ostream& os, const {name}& obj);\n"
    )
}

// =============================================================================
// Definitions pass
// =============================================================================

pub fn emit_def(out: &mut String, t: &TypeDef, nsq: &str) {
    match &t.body {
        TypeBody::Enum { .. } => emit_enum_def(out, t),
        TypeBody::Sequence { fields } => emit_sequence_def(out, t, fields, nsq),
        TypeBody::Choice { fields } => emit_choice_def(out, t, fields, nsq),
    }
}

/// JR/JW specializations routing the runtime dispatch to the type's free
/// `fromJson`/`toJson` overloads
fn codec_specializations(name: &str) -> String {
    format!(
        r#"
namespace msggen {{

template <>
struct JR<{name}> {{
    static std::istream& jsonRead(std::istream& is, {name}& obj)
    {{
        return fromJson(is, obj);
    }}
}};

template <>
struct JW<{name}> {{
    static std::ostream& jsonWrite(std::ostream& os, const {name}& obj)
    {{
        return toJson(os, obj);
    }}
}};

}} // namespace msggen
"#
    )
}

fn derived_comparison_defs(name: &str) -> String {
    format!(
        r#"
inline bool operator!=(const {name}& lhs, const {name}& rhs) noexcept
{{
    return !(lhs == rhs);
}}

inline bool operator>(const {name}& lhs, const {name}& rhs) noexcept
{{
    return rhs < lhs;
}}

inline bool operator<=(const {name}& lhs, const {name}& rhs) noexcept
{{
    return !(rhs < lhs);
}}

inline bool operator>=(const {name}& lhs, const {name}& rhs) noexcept
{{
    return !(lhs < rhs);
}}
"#
    )
}

fn emit_enum_def(out: &mut String, t: &TypeDef) {
    let name = &t.name;
    let enumerators = t.enumerators().unwrap_or_default();
    let print_arms = enumerators
        .iter()
        .map(|e| format!("case {name}::{0}: return (os << \"{0}\");", e.name))
        .collect::<Vec<_>>()
        .join("\n        ");
    let read_arms = enumerators
        .iter()
        .map(|e| format!("if (str == \"{0}\") {{ obj = {name}::{0}; return is; }}", e.name))
        .collect::<Vec<_>>()
        .join("\n    ");
    out.push_str(&format!(
        r#"
// ENUM: {name}
// FREE OPERATORS
inline std::ostream& operator<<(std::ostream& os, const {name}& obj)
{{
    switch (obj) {{
        {print_arms}
    }}
    return (os << "<invalid-value>");
}}

inline std::istream& fromJson(std::istream& is, {name}& obj)
{{
    std::string str;
    if (!fromJson(is, str)) {{
        return is;
    }}
    {read_arms}
    is.setstate(std::ios_base::failbit);
    return is;
}}

inline std::ostream& toJson(std::ostream& os, const {name}& obj)
{{
    if (!os) {{
        return os;
    }}
    os.put('"');
    return (os << obj << '"');
}}
"#
    ));
    out.push_str(&codec_specializations(name));
}

/// True lexicographic ordering: earlier fields dominate, later fields are
/// consulted only on ties.
fn lexicographic_less(fields: &[Field]) -> String {
    let Some((last, head)) = fields.split_last() else {
        return "    return false;".to_string();
    };
    let mut body = String::new();
    for f in head {
        body.push_str(&format!(
            "    if (lhs.{0} < rhs.{0}) {{\n        return true;\n    }}\n    if (rhs.{0} < lhs.{0}) {{\n        return false;\n    }}\n",
            f.name
        ));
    }
    body.push_str(&format!("    return lhs.{0} < rhs.{0};", last.name));
    body
}

fn emit_sequence_def(out: &mut String, t: &TypeDef, fields: &[Field], nsq: &str) {
    let name = &t.name;

    let eq_body = if fields.is_empty() {
        "true".to_string()
    } else {
        fields
            .iter()
            .map(|f| format!("lhs.{0} == rhs.{0}", f.name))
            .collect::<Vec<_>>()
            .join("\n        && ")
    };

    let print_lines = fields
        .iter()
        .map(|f| {
            format!(
                "os << \" {0}=\";\n    msggen::P<{1}>().print(os, obj.{0});",
                f.name,
                cpp_type(nsq, f)
            )
        })
        .collect::<Vec<_>>()
        .join("\n    ");

    let got_flags = fields
        .iter()
        .map(|f| format!("bool got_{} = false;", f.name))
        .collect::<Vec<_>>()
        .join("\n    ");

    let read_arms = fields
        .iter()
        .map(|f| {
            format!(
                r#"if (str == "{0}") {{
            if (got_{0}) {{
                is.setstate(std::ios_base::failbit);
                return is;
            }}
            got_{0} = true;
            if (!fromJson(is, obj.{0})) {{
                return is;
            }}
            msggen::jsonSkipWs(is);
            if (is.peek() == ',') {{
                is.get();
                msggen::jsonSkipWs(is);
            }}
            continue;
        }}"#,
                f.name
            )
        })
        .collect::<Vec<_>>()
        .join("\n        ");

    let required: Vec<&Field> = fields.iter().filter(|f| !f.optional).collect();
    let close_check = if required.is_empty() {
        "if (is.get() != '}') {".to_string()
    } else {
        let missing = required
            .iter()
            .map(|f| format!("!got_{}", f.name))
            .collect::<Vec<_>>()
            .join("\n         || ");
        format!("if (is.get() != '}}'\n         || {missing}) {{")
    };

    let write_section = if fields.is_empty() {
        String::new()
    } else {
        let lines = fields
            .iter()
            .map(|f| {
                let write = format!(
                    "os << out << \"\\\"{0}\\\":\"; toJson(os, obj.{0}); out = \",\";",
                    f.name
                );
                if f.optional {
                    format!(
                        "if (obj.{0}.has_value()) {{\n        {write}\n    }}",
                        f.name
                    )
                } else {
                    write
                }
            })
            .collect::<Vec<_>>()
            .join("\n    ");
        format!("    const char* out = \"\";\n    {lines}\n")
    };

    out.push_str(&format!(
        r#"
// SEQUENCE: {name}
// FREE OPERATORS
inline bool operator==(const {name}& lhs, const {name}& rhs) noexcept
{{
    return {eq_body};
}}

inline bool operator<(const {name}& lhs, const {name}& rhs) noexcept
{{
{less_body}
}}
"#,
        less_body = lexicographic_less(fields),
    ));
    out.push_str(&derived_comparison_defs(name));
    out.push_str(&format!(
        r#"
inline std::ostream& operator<<(std::ostream& os, const {name}& obj)
{{
    os << '[';
    {print_lines}
    return (os << " ]");
}}

inline std::istream& fromJson(std::istream& is, {name}& obj)
{{
    msggen::jsonSkipWs(is);
    if (is.get() != '{{') {{
        is.setstate(std::ios_base::failbit);
        return is;
    }}
    msggen::jsonSkipWs(is);
    std::string str;
    {got_flags}
    while (is && is.peek() != '}}') {{
        if (!fromJson(is, str)) {{
            return is;
        }}
        msggen::jsonSkipWs(is);
        if (is.get() != ':') {{
            is.setstate(std::ios_base::failbit);
            return is;
        }}
        msggen::jsonSkipWs(is);
        {read_arms}
        is.setstate(std::ios_base::failbit);
        return is;
    }}
    {close_check}
        is.setstate(std::ios_base::failbit);
    }}
    return is;
}}

inline std::ostream& toJson(std::ostream& os, const {name}& obj)
{{
    os.put('{{');
{write_section}    os.put('}}');
    return os;
}}
"#
    ));
    out.push_str(&codec_specializations(name));
}

fn emit_choice_def(out: &mut String, t: &TypeDef, fields: &[Field], nsq: &str) {
    let name = &t.name;
    // validated modules never carry an empty choice
    let first = &fields[0];

    let dtor_arms = fields
        .iter()
        .enumerate()
        .map(|(idx, f)| {
            let trivially_destructible =
                f.is_by_value() && f.scalar().is_some_and(|s| s.is_trivial());
            if trivially_destructible {
                format!("/* type {} needs no destructor */", cpp_type("", f))
            } else {
                format!("case {idx}: msggen::destroy({}); break;", f.name)
            }
        })
        .collect::<Vec<_>>()
        .join("\n        ");

    let copy_arms = fields
        .iter()
        .enumerate()
        .map(|(idx, f)| {
            format!(
                "case {idx}: ::new ((void*)&{0}) {1}(rhs.{0}); break;",
                f.name,
                cpp_type("", f)
            )
        })
        .collect::<Vec<_>>()
        .join("\n        ");

    let move_arms = fields
        .iter()
        .enumerate()
        .map(|(idx, f)| {
            format!(
                "case {idx}: ::new ((void*)&{0}) {1}(std::move(rhs.{0})); break;",
                f.name,
                cpp_type("", f)
            )
        })
        .collect::<Vec<_>>()
        .join("\n        ");

    let eq_arms = fields
        .iter()
        .enumerate()
        .map(|(idx, f)| format!("case {idx}: return lhs.{0} == rhs.{0};", f.name))
        .collect::<Vec<_>>()
        .join("\n        ");

    let less_arms = fields
        .iter()
        .enumerate()
        .map(|(idx, f)| format!("case {idx}: return lhs.{0} < rhs.{0};", f.name))
        .collect::<Vec<_>>()
        .join("\n        ");

    let print_arms = fields
        .iter()
        .enumerate()
        .map(|(idx, f)| {
            format!(
                "case {idx}: {{\n            os << \" {0} = \";\n            msggen::P<{1}>().print(os, obj.{0});\n        }} break;",
                f.name,
                cpp_type(nsq, f)
            )
        })
        .collect::<Vec<_>>()
        .join("\n        ");

    let read_arms = fields
        .iter()
        .enumerate()
        .map(|(idx, f)| {
            format!(
                r#"if (str == "{0}") {{
            obj.~{name}();
            obj.d_choice = {idx};
            ::new ((void*)&obj.{0}) {1}();
            if (!fromJson(is, obj.{0})) {{
                obj = {name}();
                return is;
            }}
            msggen::jsonSkipWs(is);
            if (is.peek() == ',') {{
                is.setstate(std::ios_base::failbit);
                return is;
            }}
            matched = true;
            break;
        }}"#,
                f.name,
                cpp_type("", f)
            )
        })
        .collect::<Vec<_>>()
        .join("\n        ");

    let write_arms = fields
        .iter()
        .enumerate()
        .map(|(idx, f)| {
            format!(
                "case {idx}: {{ os << \"\\\"{0}\\\":\"; toJson(os, obj.{0}); }} break;",
                f.name
            )
        })
        .collect::<Vec<_>>()
        .join("\n        ");

    out.push_str(&format!(
        r#"
// CHOICE: {name}
// CREATORS
inline {name}::{name}() noexcept
: d_choice(0)
{{
    ::new ((void*)&{first_name}) {first_type}();
}}

inline {name}::~{name}() noexcept
{{
    switch (d_choice) {{
        {dtor_arms}
    }}
}}

inline {name}::{name}(const {name}& rhs)
: d_choice(rhs.d_choice)
{{
    switch (d_choice) {{
        {copy_arms}
    }}
}}

inline {name}::{name}({name}&& rhs) noexcept
: d_choice(rhs.d_choice)
{{
    switch (d_choice) {{
        {move_arms}
    }}
}}

inline {name}& {name}::operator=(const {name}& rhs)
{{
    if (this == &rhs) {{
        return *this;
    }}
    this->~{name}();
    ::new ((void*)this) {name}(rhs);
    return *this;
}}

inline {name}& {name}::operator=({name}&& rhs) noexcept
{{
    if (this == &rhs) {{
        return *this;
    }}
    this->~{name}();
    ::new ((void*)this) {name}(std::move(rhs));
    return *this;
}}

// FREE OPERATORS
inline bool operator==(const {name}& lhs, const {name}& rhs) noexcept
{{
    const auto choice = lhs.choice();
    if (choice != rhs.choice()) {{ return false; }}
    switch (choice) {{
        {eq_arms}
    }}
    return false;
}}

inline bool operator<(const {name}& lhs, const {name}& rhs) noexcept
{{
    const auto choice = lhs.choice();
    if (choice < rhs.choice()) {{ return true; }}
    if (rhs.choice() < choice) {{ return false; }}
    switch (choice) {{
        {less_arms}
    }}
    return false;
}}
"#,
        first_name = first.name,
        first_type = cpp_type("", first),
    ));
    out.push_str(&derived_comparison_defs(name));
    out.push_str(&format!(
        r#"
inline std::ostream& operator<<(std::ostream& os, const {name}& obj)
{{
    os << '[';
    switch (obj.choice()) {{
        {print_arms}
    }}
    return (os << " ]");
}}

inline std::istream& fromJson(std::istream& is, {name}& obj)
{{
    msggen::jsonSkipWs(is);
    if (is.get() != '{{') {{
        is.setstate(std::ios_base::failbit);
        return is;
    }}
    msggen::jsonSkipWs(is);
    std::string str;
    bool matched = false;
    while (is && is.peek() != '}}') {{
        if (!fromJson(is, str)) {{
            return is;
        }}
        msggen::jsonSkipWs(is);
        if (is.get() != ':') {{
            is.setstate(std::ios_base::failbit);
            return is;
        }}
        msggen::jsonSkipWs(is);
        {read_arms}
        is.setstate(std::ios_base::failbit);
        return is;
    }}
    if (is.get() != '}}' || !matched) {{
        is.setstate(std::ios_base::failbit);
    }}
    return is;
}}

inline std::ostream& toJson(std::ostream& os, const {name}& obj)
{{
    os.put('{{');
    switch (obj.choice()) {{
        {write_arms}
    }}
    os.put('}}');
    return os;
}}
"#
    ));
    out.push_str(&codec_specializations(name));
}

// =============================================================================
// Hash specializations (emitted outside the target namespace)
// =============================================================================

pub fn emit_hash(out: &mut String, t: &TypeDef, nsq: &str) {
    let name = &t.name;
    match &t.body {
        TypeBody::Enum { .. } => {}
        TypeBody::Sequence { fields } => {
            let combines = fields
                .iter()
                .map(|f| {
                    format!(
                        "h = {nsq}msggen::hashCombine(h, {nsq}msggen::H<{1}>()(obj.{0}));",
                        f.name,
                        cpp_type(nsq, f)
                    )
                })
                .collect::<Vec<_>>()
                .join("\n        ");
            out.push_str(&format!(
                r#"namespace std {{

template <>
struct hash<{nsq}{name}> {{
    std::size_t operator()(const {nsq}{name}& obj) const noexcept
    {{
        std::size_t h{{0}};
        {combines}
        return h;
    }}
}};

}} // namespace std

"#
            ));
        }
        TypeBody::Choice { fields } => {
            let arms = fields
                .iter()
                .enumerate()
                .map(|(idx, f)| {
                    format!(
                        "case {idx}: h = {nsq}msggen::hashCombine(h, {nsq}msggen::H<{1}>()(obj.{0})); break;",
                        f.name,
                        cpp_type(nsq, f)
                    )
                })
                .collect::<Vec<_>>()
                .join("\n            ");
            out.push_str(&format!(
                r#"namespace std {{

template <>
struct hash<{nsq}{name}> {{
    std::size_t operator()(const {nsq}{name}& obj) const noexcept
    {{
        std::size_t h{{0}};
        h = {nsq}msggen::hashCombine(h, obj.choice());
        switch (obj.choice()) {{
            {arms}
        }}
        return h;
    }}
}};

}} // namespace std

"#
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Enumerator;

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

    #[test]
    fn storage_types_wrap_scalars_and_references() {
        assert_eq!(cpp_type("", &field("a", "int")), "int");
        assert_eq!(cpp_type("", &field("a", "str")), "std::string");
        assert_eq!(cpp_type("", &field("a", "u8")), "std::uint8_t");
        assert_eq!(cpp_type("ns::", &field("a", "Point")), "ns::Point");
        assert_eq!(
            cpp_type("", &Field { optional: true, ..field("a", "str") }),
            "std::optional<std::string>"
        );
        assert_eq!(
            cpp_type("ns::", &Field { list: true, ..field("a", "Point") }),
            "std::vector<ns::Point>"
        );
    }

    #[test]
    fn defaults_render_as_cpp_initializers() {
        let mut f = field("flag", "bool");
        f.default = Some(Literal::Bool(true));
        assert_eq!(field_decl(&f), "bool flag = true");

        let mut f = field("label", "str");
        f.default = Some(Literal::Str("a\"b".into()));
        assert_eq!(field_decl(&f), "std::string label = \"a\\\"b\"");

        let mut f = field("ratio", "float");
        f.default = Some(Literal::Float(3.0));
        assert_eq!(field_decl(&f), "double ratio = 3.0");

        let mut f = field("items", "int");
        f.list = true;
        f.default = Some(Literal::EmptyList);
        assert_eq!(field_decl(&f), "std::vector<int> items");
    }

    #[test]
    fn sequence_less_is_lexicographic() {
        let t = sequence("P", vec![field("a", "int"), field("b", "int")]);
        let mut out = String::new();
        emit_def(&mut out, &t, "");
        assert!(out.contains("if (lhs.a < rhs.a) {"));
        assert!(out.contains("if (rhs.a < lhs.a) {"));
        assert!(out.contains("return lhs.b < rhs.b;"));
        // the short-circuit form would leave a dangling && false chain
        assert!(!out.contains("&& false"));
    }

    #[test]
    fn sequence_decode_tracks_keys_and_requirements() {
        let t = sequence(
            "P",
            vec![field("x", "int"), Field { optional: true, ..field("tag", "str") }],
        );
        let mut out = String::new();
        emit_def(&mut out, &t, "");
        assert!(out.contains("bool got_x = false;"));
        assert!(out.contains("bool got_tag = false;"));
        // only the non-optional field is required at the closing brace
        assert!(out.contains("|| !got_x)"));
        assert!(!out.contains("!got_tag"));
        // optional fields are skipped on output when absent
        assert!(out.contains("if (obj.tag.has_value()) {"));
    }

    #[test]
    fn choice_ordering_compares_both_sides() {
        let t = TypeDef {
            name: "U".into(),
            body: TypeBody::Choice {
                fields: vec![field("a", "int"), field("s", "str")],
            },
            doc: String::new(),
        };
        let mut out = String::new();
        emit_def(&mut out, &t, "");
        assert!(out.contains("const auto choice = lhs.choice();"));
        assert!(out.contains("if (choice < rhs.choice()) { return true; }"));
        assert!(out.contains("if (rhs.choice() < choice) { return false; }"));
    }

    #[test]
    fn choice_decode_requires_exactly_one_key() {
        let t = TypeDef {
            name: "U".into(),
            body: TypeBody::Choice { fields: vec![field("a", "int")] },
            doc: String::new(),
        };
        let mut out = String::new();
        emit_def(&mut out, &t, "");
        // empty object and trailing keys both fail
        assert!(out.contains("bool matched = false;"));
        assert!(out.contains("if (is.get() != '}' || !matched) {"));
        assert!(out.contains("if (is.peek() == ',') {\n                is.setstate(std::ios_base::failbit);"));
        // decode failure restores the default state
        assert!(out.contains("obj = U();"));
    }

    #[test]
    fn choice_destructor_skips_trivial_payloads() {
        let t = TypeDef {
            name: "U".into(),
            body: TypeBody::Choice {
                fields: vec![
                    field("n", "int"),
                    field("s", "str"),
                    Field { list: true, ..field("v", "int") },
                ],
            },
            doc: String::new(),
        };
        let mut out = String::new();
        emit_def(&mut out, &t, "");
        assert!(out.contains("/* type int needs no destructor */"));
        assert!(out.contains("case 1: msggen::destroy(s); break;"));
        assert!(out.contains("case 2: msggen::destroy(v); break;"));
    }

    #[test]
    fn enum_types_get_no_hash_specialization() {
        let t = TypeDef {
            name: "E".into(),
            body: TypeBody::Enum {
                enumerators: vec![Enumerator { name: "A".into(), value: 0 }],
            },
            doc: String::new(),
        };
        let mut out = String::new();
        emit_hash(&mut out, &t, "ns::");
        assert!(out.is_empty());
    }

    #[test]
    fn hash_chains_fields_in_declaration_order() {
        let t = sequence("P", vec![field("a", "int"), field("b", "str")]);
        let mut out = String::new();
        emit_hash(&mut out, &t, "ns::");
        assert!(out.contains("struct hash<ns::P>"));
        let a = out.find("H<int>()(obj.a)").unwrap();
        let b = out.find("H<std::string>()(obj.b)").unwrap();
        assert!(a < b);
    }
}
