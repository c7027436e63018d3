//! Abstract Syntax Tree (AST) Types for drun
//!
//! This module defines the complete AST structure for drun source files.
//! Node categories are tagged sums; every node keeps a copy of the token
//! that introduced it so errors can be localized without back-references.

use std::fmt;

use indexmap::IndexMap;
use serde::Serialize;

use crate::parser::lexer::Token;

// =============================================================================
// PROGRAM
// =============================================================================

/// Root node: a complete drun file
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct Program {
    pub version: Option<VersionStatement>,
    pub project: Option<ProjectStatement>,
    pub templates: Vec<TaskTemplateStatement>,
    /// Concrete tasks and template instantiations, in source order
    pub tasks: Vec<TaskDefinition>,
}

/// A top-level task definition: either written out or stamped from a template
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum TaskDefinition {
    Task(TaskStatement),
    FromTemplate(TaskFromTemplateStatement),
}

/// version: 2.0
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VersionStatement {
    pub token: Token,
    pub value: String,
}

// =============================================================================
// PROJECT LEVEL
// =============================================================================

/// project "name" version "1.0": with its ordered settings block
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectStatement {
    pub token: Token,
    pub name: String,
    pub version: String,
    pub settings: Vec<ProjectSetting>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ProjectSetting {
    Set(SetStatement),
    Parameter(ProjectParameterStatement),
    Snippet(SnippetStatement),
    Include(IncludeStatement),
    Hook(LifecycleHook),
    ShellConfig(ShellConfigStatement),
}

/// set key to value
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SetStatement {
    pub token: Token,
    pub key: String,
    pub value: Expression,
}

/// include "file.drun" / include snippets from "file" / include from drunhub path
///
/// Registry paths are stored with a `drunhub:` scheme prefix.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IncludeStatement {
    pub token: Token,
    pub path: String,
    pub selectors: Vec<String>,
    pub namespace: String,
}

/// A project-scoped parameter declaration
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectParameterStatement {
    pub token: Token,
    pub name: String,
    pub default_value: String,
    pub has_default: bool,
    pub constraints: Vec<String>,
    pub data_type: String,
    pub min_value: Option<f64>,
    pub max_value: Option<f64>,
    pub pattern: String,
    pub pattern_macro: String,
    pub email_format: bool,
}

/// Per-platform shell configuration block
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShellConfigStatement {
    pub token: Token,
    pub platforms: IndexMap<String, PlatformShellConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct PlatformShellConfig {
    pub executable: String,
    pub args: Vec<String>,
    pub environment: IndexMap<String, String>,
}

/// before/after any task, on drun setup/teardown
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LifecycleHook {
    pub token: Token,
    pub hook_type: HookType,
    pub scope: HookScope,
    pub body: Vec<Statement>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HookType {
    Before,
    After,
    Setup,
    Teardown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HookScope {
    /// Runs around every task
    Any,
    /// Runs once per invocation
    Drun,
}

/// snippet "name": with a reusable statement block
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnippetStatement {
    pub token: Token,
    pub name: String,
    pub body: Vec<Statement>,
}

// =============================================================================
// TASKS & TEMPLATES
// =============================================================================

/// task "name" means "description": parameters, dependencies, body
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskStatement {
    pub token: Token,
    pub name: String,
    pub description: String,
    pub parameters: Vec<ParameterStatement>,
    pub dependencies: Vec<DependencyGroup>,
    pub body: Vec<Statement>,
}

/// template task "name": a parameterized task definition (no dependencies)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskTemplateStatement {
    pub token: Token,
    pub name: String,
    pub description: String,
    pub parameters: Vec<ParameterStatement>,
    pub body: Vec<Statement>,
}

/// task "name" from template "base": with an override map
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskFromTemplateStatement {
    pub token: Token,
    pub name: String,
    pub template: String,
    pub overrides: IndexMap<String, String>,
}

/// requires/given/accepts parameter declaration inside a task or template
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterStatement {
    pub token: Token,
    pub kind: ParameterKind,
    /// Stored without the `$` sigil
    pub name: String,
    pub default_value: String,
    pub has_default: bool,
    pub constraints: Vec<String>,
    pub data_type: String,
    pub required: bool,
    pub variadic: bool,
    pub min_value: Option<f64>,
    pub max_value: Option<f64>,
    pub pattern: String,
    pub pattern_macro: String,
    pub email_format: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ParameterKind {
    Requires,
    Given,
    Accepts,
}

impl fmt::Display for ParameterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Requires => write!(f, "requires"),
            Self::Given => write!(f, "given"),
            Self::Accepts => write!(f, "accepts"),
        }
    }
}

/// One `depends on …` line
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DependencyGroup {
    pub token: Token,
    pub items: Vec<DependencyItem>,
    /// true for `and`/`then` separated groups, false for comma-separated
    pub sequential: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DependencyItem {
    pub name: String,
    pub parallel: bool,
}

// =============================================================================
// STATEMENTS
// =============================================================================

/// Union of all statement types that may appear in a body
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Statement {
    Action(ActionStatement),
    Shell(ShellStatement),
    File(FileStatement),
    Docker(DockerStatement),
    Git(GitStatement),
    Http(HttpStatement),
    Download(DownloadStatement),
    Network(NetworkStatement),
    Conditional(ConditionalStatement),
    Loop(LoopStatement),
    Break(BreakStatement),
    Continue(ContinueStatement),
    Try(TryStatement),
    Throw(ThrowStatement),
    Variable(VariableStatement),
    Detection(DetectionStatement),
    TaskCall(TaskCallStatement),
    UseSnippet(UseSnippetStatement),
    Secret(SecretStatement),
}

/// info/step/warn/error/success/fail/echo with a message
///
/// A message that begins or ends with a newline sets the corresponding
/// line-break flag; the sentinel newline is stripped from the stored text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionStatement {
    pub token: Token,
    pub action: String,
    pub message: String,
    pub line_break_before: bool,
    pub line_break_after: bool,
}

/// run/exec/shell/capture shell command statement
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShellStatement {
    pub token: Token,
    pub action: String,
    /// Single-line command (empty when multiline)
    pub command: String,
    /// One entry per source line of a multi-line block
    pub commands: Vec<String>,
    pub is_multiline: bool,
    /// Target variable for capture forms, with the `$` sigil
    pub capture_variable: String,
    pub stream_output: bool,
}

/// create/copy/move/delete/read/write/append/backup/check file operations
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileStatement {
    pub token: Token,
    pub action: String,
    pub target: String,
    pub source: String,
    pub content: String,
    pub is_dir: bool,
    pub capture_variable: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DockerStatement {
    pub token: Token,
    pub operation: String,
    pub resource: String,
    pub name: String,
    pub options: IndexMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GitStatement {
    pub token: Token,
    pub operation: String,
    pub resource: String,
    pub name: String,
    pub options: IndexMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HttpStatement {
    pub token: Token,
    pub method: String,
    pub url: String,
    pub headers: IndexMap<String, String>,
    pub body: String,
    pub auth: IndexMap<String, String>,
    pub options: IndexMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DownloadStatement {
    pub token: Token,
    pub url: String,
    pub path: String,
    pub extract_to: String,
    pub remove_archive: bool,
    pub overwrite: bool,
    pub headers: IndexMap<String, String>,
    pub auth: IndexMap<String, String>,
    pub options: IndexMap<String, String>,
    pub permissions: Vec<PermissionSpec>,
}

/// allow read,execute to user,group
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PermissionSpec {
    pub permissions: Vec<String>,
    pub targets: Vec<String>,
}

/// wait/ping/test/check network operations
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NetworkStatement {
    pub token: Token,
    pub action: String,
    pub target: String,
    pub port: String,
    pub condition: String,
    pub options: IndexMap<String, String>,
}

/// if/when conditional; `else if` chains nest inside else_body
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConditionalStatement {
    pub token: Token,
    /// "if" or "when"
    pub kind: String,
    /// Raw condition text, interpreted by the executor
    pub condition: String,
    pub body: Vec<Statement>,
    pub else_body: Vec<Statement>,
}

/// for loops: range/each/line/match shapes
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoopStatement {
    pub token: Token,
    /// "range" | "each" | "line" | "match"
    pub loop_type: String,
    /// Loop variable, with the `$` sigil
    pub variable: String,
    /// Rendered iterable for each/line/match shapes
    pub iterable: String,
    pub range_start: String,
    pub range_end: String,
    pub range_step: String,
    pub filter: Option<FilterExpression>,
    pub parallel: bool,
    pub max_workers: Option<i64>,
    pub fail_fast: bool,
    pub body: Vec<Statement>,
}

/// where $x > value
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterExpression {
    pub variable: String,
    pub operator: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BreakStatement {
    pub token: Token,
    /// Raw trailing condition (`break when …`), empty if unconditional
    pub condition: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContinueStatement {
    pub token: Token,
    pub condition: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TryStatement {
    pub token: Token,
    pub body: Vec<Statement>,
    pub catch_clauses: Vec<CatchClause>,
    pub finally_body: Vec<Statement>,
}

/// catch <type>? as $err?: body
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatchClause {
    pub token: Token,
    pub error_type: String,
    pub error_variable: String,
    pub body: Vec<Statement>,
}

/// throw "message" / rethrow / ignore
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThrowStatement {
    pub token: Token,
    pub action: String,
    pub message: String,
}

/// let/set/transform/capture/capture_shell variable operations
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariableStatement {
    pub token: Token,
    pub operation: String,
    /// Target variable, with the `$` sigil
    pub variable: String,
    pub value: Option<Expression>,
    /// Transform function name, empty otherwise
    pub function: String,
    pub arguments: Vec<Expression>,
}

/// Tool/environment detection conditionals
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectionStatement {
    pub token: Token,
    /// "detect" | "detect_available" | "if_available" | "if_version" | "when_environment"
    pub kind: String,
    pub target: String,
    pub alternatives: Vec<String>,
    pub condition: String,
    pub value: String,
    pub capture_variable: String,
    pub body: Vec<Statement>,
    pub else_body: Vec<Statement>,
}

/// call task "name" with key=value, …
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskCallStatement {
    pub token: Token,
    pub task_name: String,
    pub parameters: IndexMap<String, String>,
}

/// use snippet "name"
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UseSnippetStatement {
    pub token: Token,
    pub snippet_name: String,
}

/// secret set/get/delete/exists/list
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SecretStatement {
    pub token: Token,
    pub operation: String,
    pub key: String,
    pub value: String,
    pub namespace: String,
    pub pattern: String,
    pub default_value: String,
}

// =============================================================================
// EXPRESSIONS
// =============================================================================

/// Union of all expression types
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Expression {
    Binary(BinaryExpression),
    Identifier(IdentifierExpression),
    Literal(LiteralExpression),
    FunctionCall(FunctionCallExpression),
    Array(ArrayLiteral),
    Secret(SecretExpression),
}

/// left op right, built left-associative with no precedence; the executor
/// evaluates in source order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BinaryExpression {
    pub token: Token,
    pub left: Box<Expression>,
    pub operator: String,
    pub right: Box<Expression>,
}

/// A name; variable references keep the `$` sigil
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IdentifierExpression {
    pub token: Token,
    pub name: String,
}

/// An opaque literal carrying its original form, including the
/// brace-wrapped `{…}` interpolation form for multi-token content
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LiteralExpression {
    pub token: Token,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionCallExpression {
    pub token: Token,
    pub function: String,
    pub arguments: Vec<Expression>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArrayLiteral {
    pub token: Token,
    pub elements: Vec<Expression>,
}

/// secret "key" default <expr> in namespace "ns"
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SecretExpression {
    pub token: Token,
    pub key: String,
    pub default: Option<Box<Expression>>,
    pub namespace: String,
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Binary(b) => write!(f, "{} {} {}", b.left, b.operator, b.right),
            Self::Identifier(i) => write!(f, "{}", i.name),
            Self::Literal(l) => write!(f, "{}", l.value),
            Self::FunctionCall(c) => {
                write!(f, "{}(", c.function)?;
                for (i, arg) in c.arguments.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                write!(f, ")")
            }
            Self::Array(a) => {
                write!(f, "[")?;
                for (i, el) in a.elements.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{el}")?;
                }
                write!(f, "]")
            }
            Self::Secret(s) => {
                write!(f, "secret \"{}\"", s.key)?;
                if let Some(default) = &s.default {
                    write!(f, " default {default}")?;
                }
                if !s.namespace.is_empty() {
                    write!(f, " in namespace \"{}\"", s.namespace)?;
                }
                Ok(())
            }
        }
    }
}

impl Expression {
    /// The token that introduced this expression
    pub fn token(&self) -> &Token {
        match self {
            Self::Binary(b) => &b.token,
            Self::Identifier(i) => &i.token,
            Self::Literal(l) => &l.token,
            Self::FunctionCall(c) => &c.token,
            Self::Array(a) => &a.token,
            Self::Secret(s) => &s.token,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::lexer::{Token, TokenType};

    fn tok(literal: &str) -> Token {
        Token::new(TokenType::Ident, literal, 1, 1, 0)
    }

    #[test]
    fn test_array_display_strips_quotes() {
        let arr = Expression::Array(ArrayLiteral {
            token: tok("["),
            elements: vec![
                Expression::Literal(LiteralExpression {
                    token: tok("us"),
                    value: "us".into(),
                }),
                Expression::Literal(LiteralExpression {
                    token: tok("eu"),
                    value: "eu".into(),
                }),
            ],
        });
        assert_eq!(arr.to_string(), "[us, eu]");
    }

    #[test]
    fn test_binary_display_is_source_order() {
        let expr = Expression::Binary(BinaryExpression {
            token: tok("+"),
            left: Box::new(Expression::Identifier(IdentifierExpression {
                token: tok("$a"),
                name: "$a".into(),
            })),
            operator: "+".into(),
            right: Box::new(Expression::Literal(LiteralExpression {
                token: tok("1"),
                value: "1".into(),
            })),
        });
        assert_eq!(expr.to_string(), "$a + 1");
    }

    #[test]
    fn test_function_call_display() {
        let call = Expression::FunctionCall(FunctionCallExpression {
            token: tok("now"),
            function: "now".into(),
            arguments: vec![Expression::Literal(LiteralExpression {
                token: tok("iso"),
                value: "iso".into(),
            })],
        });
        assert_eq!(call.to_string(), "now(iso)");
    }
}
