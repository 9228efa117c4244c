//! Surface parser
//!
//! Turns the restricted, Python-esque declarative syntax into the typed IR.
//! Pure function of the source text; diagnostics are returned as error
//! values, never printed.
//!
//! Recognized shapes:
//! - module docstring, then `class Name(Base):` declarations where `Base` is
//!   exactly one of `Enum`, `Sequence`, `Choice`
//! - enum bodies: `NAME = <non-negative integer>` bindings
//! - sequence/choice bodies: `name: Type`, `name: Optional[Type]`,
//!   `name: List[Type]`, each optionally with a literal default
//! - string-literal expressions in leading position are captured as
//!   documentation; elsewhere they are ignored

use crate::error::{Error, Result};
use crate::schema::{Enumerator, Field, Literal, Module, TypeBody, TypeDef, TypeKind};

/// Parse one module from source text.
///
/// `module_name` is a logical name for diagnostics and the generated header;
/// it is not part of the surface syntax.
pub fn parse(source: &str, module_name: &str) -> Result<Module> {
    Parser::new(source).module(module_name)
}

// =============================================================================
// Line model
// =============================================================================

#[derive(Debug)]
struct Line<'a> {
    /// 1-based source line number
    number: usize,
    /// Leading whitespace width
    indent: usize,
    /// Text with any trailing `#` comment stripped, then trimmed
    text: String,
    /// Untouched text, used when consuming docstring bodies
    raw: &'a str,
}

impl Line<'_> {
    fn is_blank(&self) -> bool {
        self.text.is_empty()
    }

    fn starts_string(&self) -> bool {
        self.text.starts_with('"') || self.text.starts_with('\'')
    }
}

fn split_lines(source: &str) -> Vec<Line<'_>> {
    source
        .lines()
        .enumerate()
        .map(|(i, raw)| {
            let indent = raw.len() - raw.trim_start().len();
            Line {
                number: i + 1,
                indent,
                text: strip_comment(raw.trim_start()).trim_end().to_string(),
                raw,
            }
        })
        .collect()
}

/// Drop a trailing `#` comment, honoring simple quoted strings
fn strip_comment(text: &str) -> &str {
    let mut quote: Option<char> = None;
    for (idx, ch) in text.char_indices() {
        match (quote, ch) {
            (None, '#') => return &text[..idx],
            (None, '"') | (None, '\'') => quote = Some(ch),
            (Some(q), c) if c == q => quote = None,
            _ => {}
        }
    }
    text
}

// =============================================================================
// Parser
// =============================================================================

struct Parser<'a> {
    lines: Vec<Line<'a>>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str) -> Self {
        Parser {
            lines: split_lines(source),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<&Line<'a>> {
        self.lines.get(self.pos)
    }

    fn advance(&mut self) {
        self.pos += 1;
    }

    fn skip_blanks(&mut self) {
        while matches!(self.peek(), Some(l) if l.is_blank()) {
            self.advance();
        }
    }

    // -------------------------------------------------------------------------
    // Module level
    // -------------------------------------------------------------------------

    fn module(&mut self, module_name: &str) -> Result<Module> {
        let mut module = Module {
            name: module_name.to_string(),
            doc: String::new(),
            types: Vec::new(),
        };
        let mut leading = true;

        loop {
            self.skip_blanks();
            let Some(line) = self.peek() else { break };

            if line.indent != 0 {
                return Err(Error::syntax(
                    line.number,
                    line.indent,
                    "unexpected indentation at module level",
                ));
            }

            if line.starts_string() {
                let doc = self.string_block()?;
                if leading {
                    module.doc = doc;
                    leading = false;
                }
                continue;
            }

            leading = false;
            if line.text.starts_with("class ") || line.text == "class" {
                module.types.push(self.type_def()?);
            } else {
                return Err(Error::syntax(
                    line.number,
                    line.indent,
                    "expected a class definition",
                ));
            }
        }

        Ok(module)
    }

    /// Consume a string-literal expression, possibly a multi-line `"""` block,
    /// and return its (cleaned) content.
    fn string_block(&mut self) -> Result<String> {
        let line = self.peek().expect("caller checked");
        let number = line.number;
        let indent = line.indent;
        let text = line.text.clone();

        for delim in ["\"\"\"", "'''"] {
            if let Some(rest) = text.strip_prefix(delim) {
                if let Some(end) = rest.find(delim) {
                    // single-line docstring
                    let doc = rest[..end].trim().to_string();
                    self.advance();
                    return Ok(doc);
                }
                // multi-line: consume raw lines until the closing delimiter
                let mut parts: Vec<String> = Vec::new();
                if !rest.trim().is_empty() {
                    parts.push(rest.trim().to_string());
                }
                self.advance();
                loop {
                    let Some(body) = self.peek() else {
                        return Err(Error::syntax(
                            number,
                            0,
                            format!("unterminated docstring: missing closing {delim}"),
                        ));
                    };
                    let raw = body.raw.trim();
                    if let Some(end) = raw.find(delim) {
                        let head = raw[..end].trim();
                        if !head.is_empty() {
                            parts.push(head.to_string());
                        }
                        self.advance();
                        return Ok(parts.join("\n"));
                    }
                    parts.push(raw.to_string());
                    self.advance();
                }
            }
        }

        // plain single-quoted string expression
        let mut scan = Scan::new(&text, number, indent);
        let value = scan.string_literal()?;
        scan.expect_end()?;
        self.advance();
        Ok(value)
    }

    // -------------------------------------------------------------------------
    // Type declarations
    // -------------------------------------------------------------------------

    fn type_def(&mut self) -> Result<TypeDef> {
        let header = self.peek().expect("caller checked");
        let header_indent = header.indent;
        let header_number = header.number;
        let (name, kind) = {
            let mut scan = Scan::new(&header.text, header_number, header_indent);
            scan.keyword("class")?;
            let name = scan.ident("a type name")?;
            scan.expect('(', "'('")?;
            let mut bases = Vec::new();
            loop {
                bases.push(scan.ident("a base name")?);
                if !scan.eat(',') {
                    break;
                }
            }
            scan.expect(')', "')'")?;
            scan.expect(':', "':'")?;
            scan.expect_end()?;

            let kind = match bases.as_slice() {
                [one] if one == "Enum" => TypeKind::Enum,
                [one] if one == "Sequence" => TypeKind::Sequence,
                [one] if one == "Choice" => TypeKind::Choice,
                _ => {
                    return Err(Error::syntax(
                        header_number,
                        header_indent,
                        "expected single base 'Choice', 'Enum', or 'Sequence'",
                    ))
                }
            };
            (name, kind)
        };
        self.advance();

        self.skip_blanks();
        let body_indent = match self.peek() {
            Some(l) if l.indent > header_indent => l.indent,
            _ => {
                return Err(Error::syntax(
                    header_number,
                    header_indent,
                    format!("expected an indented body for type {name}"),
                ))
            }
        };

        let mut doc = String::new();
        let mut leading = true;
        let mut enumerators = Vec::new();
        let mut fields = Vec::new();

        loop {
            self.skip_blanks();
            let Some(line) = self.peek() else { break };
            if line.indent <= header_indent {
                break;
            }
            if line.indent != body_indent {
                return Err(Error::syntax(
                    line.number,
                    line.indent,
                    "inconsistent indentation in type body",
                ));
            }

            if line.starts_string() {
                let text = self.string_block()?;
                if leading {
                    doc = text;
                    leading = false;
                }
                continue;
            }
            leading = false;

            match kind {
                TypeKind::Enum => enumerators.push(self.enumerator()?),
                TypeKind::Sequence | TypeKind::Choice => fields.push(self.field()?),
            }
        }

        let body = match kind {
            TypeKind::Enum => TypeBody::Enum { enumerators },
            TypeKind::Sequence => TypeBody::Sequence { fields },
            TypeKind::Choice => TypeBody::Choice { fields },
        };
        Ok(TypeDef { name, body, doc })
    }

    fn enumerator(&mut self) -> Result<Enumerator> {
        let line = self.peek().expect("caller checked");
        let mut scan = Scan::new(&line.text, line.number, line.indent);
        let out = (|| {
            let name = scan.ident("an enumerator name")?;
            if !scan.eat('=') {
                return Err(scan.error("expected a constant integer value assignment"));
            }
            let value = scan.unsigned("a constant integer value")?;
            scan.expect_end()?;
            Ok(Enumerator { name, value })
        })()?;
        self.advance();
        Ok(out)
    }

    fn field(&mut self) -> Result<Field> {
        let line = self.peek().expect("caller checked");
        let mut scan = Scan::new(&line.text, line.number, line.indent);
        let out = (|| {
            let name = scan.ident("a field name")?;
            if !scan.eat(':') {
                return Err(scan.error("expected a type annotation"));
            }
            let (type_name, optional, list) = scan.annotation()?;
            let default = if scan.eat('=') {
                scan.default_literal(&name)?
            } else {
                None
            };
            scan.expect_end()?;
            Ok(Field {
                name,
                type_name,
                optional,
                list,
                default,
            })
        })()?;
        self.advance();
        Ok(out)
    }
}

// =============================================================================
// Character scanner
// =============================================================================

/// Char-level cursor over a single logical line, tracking source position
struct Scan {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    base_col: usize,
}

impl Scan {
    fn new(text: &str, line: usize, base_col: usize) -> Self {
        Scan {
            chars: text.chars().collect(),
            pos: 0,
            line,
            base_col,
        }
    }

    fn error(&self, message: impl Into<String>) -> Error {
        Error::syntax(self.line, self.base_col + self.pos, message)
    }

    fn skip_ws(&mut self) {
        while matches!(self.chars.get(self.pos), Some(' ') | Some('\t')) {
            self.pos += 1;
        }
    }

    fn peek(&mut self) -> Option<char> {
        self.skip_ws();
        self.chars.get(self.pos).copied()
    }

    fn eat(&mut self, want: char) -> bool {
        if self.peek() == Some(want) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, want: char, what: &str) -> Result<()> {
        if self.eat(want) {
            Ok(())
        } else {
            Err(self.error(format!("expected {what}")))
        }
    }

    fn expect_end(&mut self) -> Result<()> {
        match self.peek() {
            None => Ok(()),
            Some(c) => Err(self.error(format!("unexpected trailing '{c}'"))),
        }
    }

    fn ident(&mut self, what: &str) -> Result<String> {
        match self.peek() {
            Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
            _ => return Err(self.error(format!("expected {what}"))),
        }
        let start = self.pos;
        while matches!(
            self.chars.get(self.pos),
            Some(c) if c.is_ascii_alphanumeric() || *c == '_'
        ) {
            self.pos += 1;
        }
        Ok(self.chars[start..self.pos].iter().collect())
    }

    fn keyword(&mut self, word: &str) -> Result<()> {
        let got = self.ident(&format!("keyword '{word}'"))?;
        if got == word {
            Ok(())
        } else {
            Err(self.error(format!("expected keyword '{word}', found '{got}'")))
        }
    }

    fn unsigned(&mut self, what: &str) -> Result<u64> {
        match self.peek() {
            Some(c) if c.is_ascii_digit() => {}
            _ => return Err(self.error(format!("expected {what}"))),
        }
        let start = self.pos;
        while matches!(self.chars.get(self.pos), Some(c) if c.is_ascii_digit() || *c == '_') {
            self.pos += 1;
        }
        let text: String = self.chars[start..self.pos]
            .iter()
            .filter(|c| **c != '_')
            .collect();
        text.parse()
            .map_err(|_| self.error(format!("expected {what}")))
    }

    fn string_literal(&mut self) -> Result<String> {
        let quote = match self.peek() {
            Some(q @ ('"' | '\'')) => q,
            _ => return Err(self.error("expected a string literal")),
        };
        self.pos += 1;
        let mut out = String::new();
        loop {
            match self.chars.get(self.pos).copied() {
                None => return Err(self.error("unterminated string literal")),
                Some(c) if c == quote => {
                    self.pos += 1;
                    return Ok(out);
                }
                Some('\\') => {
                    self.pos += 1;
                    match self.chars.get(self.pos).copied() {
                        Some('n') => out.push('\n'),
                        Some('t') => out.push('\t'),
                        Some('r') => out.push('\r'),
                        Some('\\') => out.push('\\'),
                        Some(c @ ('"' | '\'')) => out.push(c),
                        _ => return Err(self.error("unsupported escape in string literal")),
                    }
                    self.pos += 1;
                }
                Some(c) => {
                    out.push(c);
                    self.pos += 1;
                }
            }
        }
    }

    /// A type annotation: a bare name, a quoted name, or a single
    /// `Optional[...]`/`List[...]` wrapper. Nested wrappers are rejected.
    fn annotation(&mut self) -> Result<(String, bool, bool)> {
        if matches!(self.peek(), Some('"') | Some('\'')) {
            return Ok((self.string_literal()?, false, false));
        }
        let name = self.ident("a type or an 'Optional' or 'List' subscript")?;
        let is_wrapper = (name == "Optional" || name == "List") && self.peek() == Some('[');
        if !is_wrapper {
            return Ok((name, false, false));
        }
        self.expect('[', "'['")?;
        let inner = if matches!(self.peek(), Some('"') | Some('\'')) {
            self.string_literal()?
        } else {
            self.ident("a type annotation type name")?
        };
        if self.peek() == Some('[') {
            return Err(self.error("nested 'Optional'/'List' wrappers are not allowed"));
        }
        self.expect(']', "']'")?;
        if name == "Optional" {
            Ok((inner, true, false))
        } else {
            Ok((inner, false, true))
        }
    }

    /// A literal default value. `None` denotes the absent state and records
    /// no default at all.
    fn default_literal(&mut self, field: &str) -> Result<Option<Literal>> {
        match self.peek() {
            Some('[') => {
                self.pos += 1;
                if self.eat(']') {
                    Ok(Some(Literal::EmptyList))
                } else {
                    Err(Error::InvalidFieldShape {
                        field: field.to_string(),
                        reason: "list default values cannot have elements".to_string(),
                    })
                }
            }
            Some('"') | Some('\'') => Ok(Some(Literal::Str(self.string_literal()?))),
            Some(c) if c.is_ascii_digit() || c == '-' => Ok(Some(self.number()?)),
            Some(c) if c.is_ascii_alphabetic() || c == '_' => {
                let word = self.ident("a literal default value")?;
                match word.as_str() {
                    "None" => Ok(None),
                    "True" => Ok(Some(Literal::Bool(true))),
                    "False" => Ok(Some(Literal::Bool(false))),
                    _ => Err(self.error(format!("expected a literal default value, found '{word}'"))),
                }
            }
            _ => Err(self.error("expected a literal default value")),
        }
    }

    fn number(&mut self) -> Result<Literal> {
        let start = self.pos;
        if self.chars.get(self.pos) == Some(&'-') {
            self.pos += 1;
        }
        let mut is_float = false;
        while let Some(c) = self.chars.get(self.pos).copied() {
            match c {
                '0'..='9' | '_' => self.pos += 1,
                '.' | 'e' | 'E' => {
                    is_float = true;
                    self.pos += 1;
                    // sign directly after an exponent marker
                    if matches!(c, 'e' | 'E')
                        && matches!(self.chars.get(self.pos), Some('+') | Some('-'))
                    {
                        self.pos += 1;
                    }
                }
                _ => break,
            }
        }
        let text: String = self.chars[start..self.pos]
            .iter()
            .filter(|c| **c != '_')
            .collect();
        if is_float {
            text.parse()
                .map(Literal::Float)
                .map_err(|_| self.error("expected a numeric literal"))
        } else {
            text.parse()
                .map(Literal::Int)
                .map_err(|_| self.error("expected a numeric literal"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ScalarType;

    const SELF_TEST: &str = r#""""
Module doc.
"""

class Struct(Sequence):
    """
    Some 'Struct' documentation.
    """
    one: int
    two: float
    three: str
    four: bool
    four_and_half: TestEnum
    five: Optional[str] = None
    six: List['int'] = []
    seven: float = 3.14159


class TestEnum(Enum):
    """
    Some 'TestEnum' documentation.
    """
    ONE = 1
    TWO = 2


class Union(Choice):
    """
    Some 'Union' documentation.
    """
    one: int
    two: u32
    three: str
"#;

    fn field(name: &str, type_name: &str) -> Field {
        Field {
            name: name.into(),
            type_name: type_name.into(),
            optional: false,
            list: false,
            default: None,
        }
    }

    #[test]
    fn parses_reference_module() {
        let module = parse(SELF_TEST, "selftest").unwrap();
        assert_eq!(module.doc, "Module doc.");
        assert_eq!(module.types.len(), 3);

        let strukt = &module.types[0];
        assert_eq!(strukt.name, "Struct");
        assert_eq!(strukt.kind(), TypeKind::Sequence);
        assert_eq!(strukt.doc, "Some 'Struct' documentation.");
        let fields = strukt.fields().unwrap();
        assert_eq!(fields[0], field("one", "int"));
        assert_eq!(fields[1], field("two", "float"));
        assert_eq!(fields[4], field("four_and_half", "TestEnum"));
        assert_eq!(
            fields[5],
            Field {
                optional: true,
                ..field("five", "str")
            }
        );
        assert_eq!(
            fields[6],
            Field {
                list: true,
                default: Some(Literal::EmptyList),
                ..field("six", "int")
            }
        );
        assert_eq!(
            fields[7],
            Field {
                default: Some(Literal::Float(3.14159)),
                ..field("seven", "float")
            }
        );

        let test_enum = &module.types[1];
        assert_eq!(test_enum.kind(), TypeKind::Enum);
        assert_eq!(
            test_enum.enumerators().unwrap(),
            &[
                Enumerator { name: "ONE".into(), value: 1 },
                Enumerator { name: "TWO".into(), value: 2 },
            ]
        );

        let union = &module.types[2];
        assert_eq!(union.kind(), TypeKind::Choice);
        assert_eq!(union.fields().unwrap().len(), 3);
        assert_eq!(union.fields().unwrap()[1].scalar(), Some(ScalarType::U32));
    }

    #[test]
    fn rejects_unknown_base() {
        let err = parse("class T(Struct):\n    a: int\n", "m").unwrap_err();
        assert!(matches!(err, Error::Syntax { line: 1, .. }), "{err}");
        assert!(err.to_string().contains("'Choice', 'Enum', or 'Sequence'"));
    }

    #[test]
    fn rejects_multiple_bases() {
        let err = parse("class T(Enum, Choice):\n    A = 1\n", "m").unwrap_err();
        assert!(err.to_string().contains("single base"));
    }

    #[test]
    fn rejects_field_in_enum_body() {
        let err = parse("class T(Enum):\n    a: int\n", "m").unwrap_err();
        assert!(err.to_string().contains("constant integer value assignment"));
    }

    #[test]
    fn rejects_assignment_in_sequence_body() {
        let err = parse("class T(Sequence):\n    a = 1\n", "m").unwrap_err();
        assert!(err.to_string().contains("type annotation"));
    }

    #[test]
    fn rejects_negative_enum_value() {
        let err = parse("class T(Enum):\n    A = -1\n", "m").unwrap_err();
        assert!(err.to_string().contains("constant integer value"));
    }

    #[test]
    fn rejects_nested_wrappers() {
        let err = parse("class T(Sequence):\n    a: List[Optional[int]]\n", "m").unwrap_err();
        assert!(err.to_string().contains("nested"));
    }

    #[test]
    fn rejects_statement_outside_class() {
        let err = parse("x = 1\n", "m").unwrap_err();
        assert!(err.to_string().contains("class definition"));
    }

    #[test]
    fn rejects_nonempty_list_default() {
        let err = parse("class T(Sequence):\n    v: List[int] = [1]\n", "m").unwrap_err();
        assert!(matches!(err, Error::InvalidFieldShape { .. }));
    }

    #[test]
    fn none_default_records_nothing() {
        let module = parse("class T(Sequence):\n    a: Optional[int] = None\n", "m").unwrap();
        let f = &module.types[0].fields().unwrap()[0];
        assert!(f.optional);
        assert_eq!(f.default, None);
    }

    #[test]
    fn string_annotation_and_comments() {
        let src = "class T(Sequence):  # record\n    a: 'u8' = 255  # max\n";
        let module = parse(src, "m").unwrap();
        let f = &module.types[0].fields().unwrap()[0];
        assert_eq!(f.type_name, "u8");
        assert_eq!(f.default, Some(Literal::Int(255)));
    }

    #[test]
    fn later_strings_are_ignored_not_parsed_as_statements() {
        let src = "\
class T(Sequence):
    \"doc\"
    a: int
    \"stray note\"
    b: int
";
        let module = parse(src, "m").unwrap();
        let t = &module.types[0];
        assert_eq!(t.doc, "doc");
        assert_eq!(t.fields().unwrap().len(), 2);
    }

    #[test]
    fn reports_line_and_column() {
        let err = parse("class T(Sequence):\n    a int\n", "m").unwrap_err();
        match err {
            Error::Syntax { line, .. } => assert_eq!(line, 2),
            other => panic!("expected syntax error, got {other:?}"),
        }
    }
}
