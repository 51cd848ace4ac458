//! Grammar AST and lint offenses as produced by the grammar engine
//!
//! Everything here is decoded from engine JSON output. Declarations go through
//! [`RawDeclaration`] so that an unknown `kind` is rejected at the boundary instead
//! of leaking loosely-shaped data into the handlers.

use serde::Deserialize;

/// 1-based source location reported by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
pub struct Location {
    pub line: u32,
    pub column: u32,
}

impl Location {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

/// Parsed grammar file
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct GrammarAst {
    #[serde(default)]
    pub declarations: Vec<Declaration>,
    #[serde(default)]
    pub rules: Vec<Rule>,
    #[serde(default)]
    pub prologue: Option<String>,
    #[serde(default)]
    pub epilogue: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Associativity {
    Left,
    Right,
    Nonassoc,
}

impl Associativity {
    /// Display label used in symbol details ("Left", "Right", "Nonassoc")
    pub fn label(self) -> &'static str {
        match self {
            Associativity::Left => "Left",
            Associativity::Right => "Right",
            Associativity::Nonassoc => "Nonassoc",
        }
    }
}

/// `%token` / `%type` declaration
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NameDeclaration {
    pub names: Vec<String>,
    pub type_tag: Option<String>,
    pub location: Option<Location>,
}

/// `%left` / `%right` / `%nonassoc` declaration
#[derive(Debug, Clone, PartialEq)]
pub struct PrecedenceDeclaration {
    pub associativity: Associativity,
    pub tokens: Vec<String>,
    pub location: Option<Location>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawDeclaration")]
pub enum Declaration {
    Token(NameDeclaration),
    Type(NameDeclaration),
    Precedence(PrecedenceDeclaration),
}

impl Declaration {
    pub fn location(&self) -> Option<Location> {
        match self {
            Declaration::Token(decl) | Declaration::Type(decl) => decl.location,
            Declaration::Precedence(decl) => decl.location,
        }
    }
}

/// Wire shape of a declaration before validation
#[derive(Debug, Deserialize)]
struct RawDeclaration {
    kind: String,
    #[serde(default)]
    names: Vec<String>,
    #[serde(default)]
    tokens: Vec<String>,
    #[serde(default)]
    type_tag: Option<String>,
    #[serde(default)]
    location: Option<Location>,
}

impl TryFrom<RawDeclaration> for Declaration {
    type Error = String;

    fn try_from(raw: RawDeclaration) -> Result<Self, Self::Error> {
        let associativity = match raw.kind.as_str() {
            "token" | "type" => {
                let decl = NameDeclaration {
                    names: raw.names,
                    type_tag: raw.type_tag,
                    location: raw.location,
                };
                return Ok(if raw.kind == "token" {
                    Declaration::Token(decl)
                } else {
                    Declaration::Type(decl)
                });
            }
            "left" => Associativity::Left,
            "right" => Associativity::Right,
            "nonassoc" => Associativity::Nonassoc,
            other => return Err(format!("unknown declaration kind: {other}")),
        };

        Ok(Declaration::Precedence(PrecedenceDeclaration {
            associativity,
            tokens: raw.tokens,
            location: raw.location,
        }))
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Rule {
    pub name: String,
    #[serde(default)]
    pub location: Option<Location>,
    #[serde(default)]
    pub alternatives: Vec<Alternative>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Alternative {
    #[serde(default)]
    pub symbols: Vec<GrammarSymbol>,
    #[serde(default)]
    pub location: Option<Location>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GrammarSymbol {
    pub name: String,
}

/// Offense severity tag. Tags the server does not know are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum Severity {
    Error,
    Warning,
    Convention,
    Info,
    Other(String),
}

impl From<String> for Severity {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "error" => Severity::Error,
            "warning" => Severity::Warning,
            "convention" => Severity::Convention,
            "info" => Severity::Info,
            _ => Severity::Other(tag),
        }
    }
}

impl From<&str> for Severity {
    fn from(tag: &str) -> Self {
        Severity::from(tag.to_string())
    }
}

/// Lint finding
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Offense {
    #[serde(default)]
    pub location: Option<Location>,
    pub severity: Severity,
    #[serde(default)]
    pub rule_name: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}
