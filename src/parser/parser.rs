//! Recursive Descent Parser for drun
//!
//! The parser pulls tokens from the lexer one at a time, keeping a
//! `(current, peek)` pair refilled in lock-step. It is error-recovering:
//! every failure is recorded with the offending token's position and parsing
//! continues after skipping one token. Callers inspect the error list after
//! `parse_program` returns.
//!
//! Grammar (top level):
//!   program  ::= version project? (template | task)*
//!   version  ::= 'version' ':' NUMBER
//!   project  ::= 'project' STRING ('version' STRING)? ':' INDENT setting* DEDENT
//!   task     ::= 'task' STRING ('means' STRING)? ':' INDENT item* DEDENT
//!   template ::= 'template' 'task' STRING ('means' STRING)? ':' INDENT item* DEDENT

use indexmap::IndexMap;

use crate::ast::types::{
    HookScope, HookType, LifecycleHook, PlatformShellConfig, Program, ProjectParameterStatement,
    ProjectSetting, ProjectStatement, SetStatement, ShellConfigStatement, SnippetStatement,
    Statement, TaskDefinition, TaskFromTemplateStatement, TaskStatement, TaskTemplateStatement,
    VersionStatement, IncludeStatement,
};
use crate::parser::lexer::{Lexer, Token, TokenType};
use crate::parser::types::{is_name_token, is_trivia, ParseError, MAX_PARSE_ITERATIONS};

/// Main parser struct. One instance per parse; not reusable.
pub struct Parser {
    pub(crate) lexer: Lexer,
    pub(crate) cur_token: Token,
    pub(crate) peek_token: Token,
    errors: Vec<ParseError>,
    iterations: usize,
    iteration_limit_hit: bool,
}

impl Parser {
    /// Create a parser over a lexer, priming the two-token look-ahead
    pub fn new(mut lexer: Lexer) -> Self {
        let cur_token = lexer.next_token();
        let peek_token = lexer.next_token();
        Parser {
            lexer,
            cur_token,
            peek_token,
            errors: Vec::new(),
            iterations: 0,
            iteration_limit_hit: false,
        }
    }

    /// Legacy string form of the collected errors
    pub fn errors(&self) -> Vec<String> {
        self.errors.iter().map(|e| e.to_string()).collect()
    }

    /// Structured, position-annotated errors
    pub fn error_list(&self) -> &[ParseError] {
        &self.errors
    }

    // =========================================================================
    // TOKEN HELPERS
    // =========================================================================

    pub(crate) fn next_token(&mut self) {
        self.iterations += 1;
        if self.iterations > MAX_PARSE_ITERATIONS {
            if !self.iteration_limit_hit {
                self.iteration_limit_hit = true;
                self.add_error("maximum parse iterations exceeded".to_string());
            }
            let eof = Token::new(
                TokenType::Eof,
                "",
                self.cur_token.line,
                self.cur_token.column,
                self.cur_token.position,
            );
            self.cur_token = eof.clone();
            self.peek_token = eof;
            return;
        }
        self.cur_token = std::mem::replace(&mut self.peek_token, self.lexer.next_token());
    }

    pub(crate) fn cur_is(&self, t: TokenType) -> bool {
        self.cur_token.token_type == t
    }

    pub(crate) fn peek_is(&self, t: TokenType) -> bool {
        self.peek_token.token_type == t
    }

    /// The token after `peek`, from the lexer's look-ahead buffer. Needed
    /// only where one-token look-ahead cannot disambiguate (`check if port`).
    pub(crate) fn peek_after(&mut self) -> Token {
        self.lexer.peek_token()
    }

    /// Advance when the peek token matches, record an error otherwise
    pub(crate) fn expect_peek(&mut self, t: TokenType) -> bool {
        if self.peek_is(t) {
            self.next_token();
            true
        } else {
            self.peek_error(t);
            false
        }
    }

    pub(crate) fn peek_error(&mut self, expected: TokenType) {
        let message = format!(
            "expected next token to be {}, got {} instead",
            expected.as_str(),
            self.peek_token.token_type.as_str()
        );
        self.errors.push(ParseError::new(
            message,
            self.peek_token.line,
            self.peek_token.column,
        ));
    }

    /// Record an error at the current token
    pub(crate) fn add_error(&mut self, message: String) {
        self.errors.push(ParseError::new(
            message,
            self.cur_token.line,
            self.cur_token.column,
        ));
    }

    pub(crate) fn add_error_with_help(&mut self, message: String, help: &str) {
        self.errors.push(
            ParseError::new(message, self.cur_token.line, self.cur_token.column).with_help(help),
        );
    }

    pub(crate) fn add_error_at(&mut self, token: &Token, message: String) {
        self.errors
            .push(ParseError::new(message, token.line, token.column));
    }

    pub(crate) fn cur_is_trivia(&self) -> bool {
        is_trivia(self.cur_token.token_type)
    }

    /// Skip comments and newlines; structural boundaries ignore them
    pub(crate) fn skip_trivia(&mut self) {
        while self.cur_is_trivia() {
            self.next_token();
        }
    }

    /// Reject definitions or assignments of `$globals`/`$params`. Dotted
    /// access inside interpolated strings stays legal; bare defining
    /// positions do not.
    pub(crate) fn check_reserved_variable(&mut self, token: &Token) {
        let root = token.literal.split('.').next().unwrap_or_default();
        if root == "$globals" || root == "$params" {
            self.add_error_at(
                token,
                format!(
                    "reserved variable name {} cannot be defined or assigned",
                    token.literal
                ),
            );
        }
    }

    // =========================================================================
    // BLOCKS
    // =========================================================================

    /// Parse an indented statement block. The current token must be the
    /// COLON that introduces it; on return the current token is the DEDENT
    /// (or EOF) that closed the block.
    pub(crate) fn parse_block_body(&mut self) -> Vec<Statement> {
        let mut body = Vec::new();
        self.next_token();
        self.skip_trivia();
        if !self.cur_is(TokenType::Indent) {
            self.add_error(format!(
                "expected an indented block, got {} instead",
                self.cur_token.token_type.as_str()
            ));
            return body;
        }
        self.next_token();
        while !self.cur_is(TokenType::Dedent) && !self.cur_is(TokenType::Eof) {
            if self.cur_is_trivia() {
                self.next_token();
                continue;
            }
            if let Some(statement) = self.parse_body_statement() {
                body.push(statement);
            }
            self.next_token();
        }
        body
    }

    // =========================================================================
    // PROGRAM
    // =========================================================================

    /// Parse a whole file. Returns None when the mandatory version header is
    /// missing or malformed; otherwise a best-effort program (check the
    /// error list before trusting it).
    pub fn parse_program(&mut self) -> Option<Program> {
        self.skip_trivia();

        if !self.cur_is(TokenType::Version) {
            let got = self.cur_token.token_type.as_str();
            self.add_error_with_help(
                format!("expected version statement at the start of the file, got {got}"),
                "every drun file begins with `version: 2.0`",
            );
            return None;
        }
        let version = self.parse_version_statement()?;

        let mut program = Program {
            version: Some(version),
            ..Default::default()
        };

        self.next_token();
        loop {
            self.skip_trivia();
            match self.cur_token.token_type {
                TokenType::Eof => break,
                TokenType::Project => {
                    if program.project.is_some() {
                        self.add_error("duplicate project statement".to_string());
                    }
                    if let Some(project) = self.parse_project_statement() {
                        program.project = Some(project);
                    }
                    self.next_token();
                }
                TokenType::Template => {
                    if let Some(template) = self.parse_template_statement() {
                        program.templates.push(template);
                    }
                    self.next_token();
                }
                TokenType::Task => {
                    if let Some(task) = self.parse_task_definition() {
                        program.tasks.push(task);
                    }
                    self.next_token();
                }
                _ => {
                    self.add_error(format!(
                        "unexpected token at top level: {}",
                        self.cur_token.token_type.as_str()
                    ));
                    self.next_token();
                }
            }
        }

        Some(program)
    }

    fn parse_version_statement(&mut self) -> Option<VersionStatement> {
        let token = self.cur_token.clone();
        if !self.expect_peek(TokenType::Colon) {
            return None;
        }
        if !self.expect_peek(TokenType::Number) {
            return None;
        }
        Some(VersionStatement {
            token,
            value: self.cur_token.literal.clone(),
        })
    }

    // =========================================================================
    // PROJECT
    // =========================================================================

    fn parse_project_statement(&mut self) -> Option<ProjectStatement> {
        let token = self.cur_token.clone();
        if !self.expect_peek(TokenType::String) {
            return None;
        }
        let name = self.cur_token.literal.clone();
        let mut version = String::new();
        if self.peek_is(TokenType::Version) {
            self.next_token();
            if self.expect_peek(TokenType::String) {
                version = self.cur_token.literal.clone();
            }
        }
        if !self.expect_peek(TokenType::Colon) {
            return None;
        }

        let mut settings = Vec::new();
        self.next_token();
        self.skip_trivia();
        if !self.cur_is(TokenType::Indent) {
            self.add_error("expected an indented project settings block".to_string());
            return Some(ProjectStatement {
                token,
                name,
                version,
                settings,
            });
        }
        self.next_token();
        while !self.cur_is(TokenType::Dedent) && !self.cur_is(TokenType::Eof) {
            if self.cur_is_trivia() {
                self.next_token();
                continue;
            }
            if let Some(setting) = self.parse_project_setting() {
                settings.push(setting);
            }
            self.next_token();
        }

        Some(ProjectStatement {
            token,
            name,
            version,
            settings,
        })
    }

    fn parse_project_setting(&mut self) -> Option<ProjectSetting> {
        match self.cur_token.token_type {
            TokenType::Set => self.parse_set_statement().map(ProjectSetting::Set),
            TokenType::Requires | TokenType::Given | TokenType::Accepts => self
                .parse_parameter_statement()
                .map(|p| {
                    ProjectSetting::Parameter(ProjectParameterStatement {
                        token: p.token,
                        name: p.name,
                        default_value: p.default_value,
                        has_default: p.has_default,
                        constraints: p.constraints,
                        data_type: p.data_type,
                        min_value: p.min_value,
                        max_value: p.max_value,
                        pattern: p.pattern,
                        pattern_macro: p.pattern_macro,
                        email_format: p.email_format,
                    })
                }),
            TokenType::Snippet => self.parse_snippet_statement().map(ProjectSetting::Snippet),
            TokenType::Include => self.parse_include_statement().map(ProjectSetting::Include),
            TokenType::Before | TokenType::After | TokenType::On => {
                self.parse_lifecycle_hook().map(ProjectSetting::Hook)
            }
            TokenType::Shell if self.peek_is(TokenType::Config) => {
                self.parse_shell_config().map(ProjectSetting::ShellConfig)
            }
            _ => {
                self.add_error(format!(
                    "unexpected token in project settings: {}",
                    self.cur_token.token_type.as_str()
                ));
                None
            }
        }
    }

    /// set key to <expression>
    fn parse_set_statement(&mut self) -> Option<SetStatement> {
        let token = self.cur_token.clone();
        if !is_name_token(&self.peek_token) {
            self.peek_error(TokenType::Ident);
            return None;
        }
        self.next_token();
        let key = self.cur_token.literal.clone();
        if !self.expect_peek(TokenType::To) {
            return None;
        }
        self.next_token();
        let value = self.parse_expression()?;
        Some(SetStatement { token, key, value })
    }

    /// include "path" / include snippets, templates from "path" /
    /// include from drunhub path; registry paths carry a `drunhub:` prefix
    fn parse_include_statement(&mut self) -> Option<IncludeStatement> {
        let token = self.cur_token.clone();
        let mut selectors = Vec::new();
        let mut path = String::new();

        if self.peek_is(TokenType::String) {
            self.next_token();
            path = self.cur_token.literal.clone();
        } else {
            while matches!(
                self.peek_token.token_type,
                TokenType::Snippets | TokenType::Templates | TokenType::Tasks
            ) {
                self.next_token();
                selectors.push(self.cur_token.literal.clone());
                if self.peek_is(TokenType::Comma) {
                    self.next_token();
                }
            }
            if !self.expect_peek(TokenType::From) {
                return None;
            }
            if self.peek_is(TokenType::Drunhub) {
                self.next_token();
                path = format!("drunhub:{}", self.read_include_path()?);
            } else if self.expect_peek(TokenType::String) {
                path = self.cur_token.literal.clone();
            } else {
                return None;
            }
        }

        let mut namespace = String::new();
        if self.peek_is(TokenType::As) {
            self.next_token();
            if is_name_token(&self.peek_token) {
                self.next_token();
                namespace = self.cur_token.literal.clone();
            } else {
                self.peek_error(TokenType::Ident);
            }
        }

        Some(IncludeStatement {
            token,
            path,
            selectors,
            namespace,
        })
    }

    /// Registry paths may be quoted or written bare (`ops/docker`)
    fn read_include_path(&mut self) -> Option<String> {
        if self.peek_is(TokenType::String) {
            self.next_token();
            return Some(self.cur_token.literal.clone());
        }
        if !is_name_token(&self.peek_token) {
            self.peek_error(TokenType::String);
            return None;
        }
        self.next_token();
        let mut path = self.cur_token.literal.clone();
        while self.peek_is(TokenType::Slash) {
            self.next_token();
            if is_name_token(&self.peek_token) {
                self.next_token();
                path.push('/');
                path.push_str(&self.cur_token.literal);
            } else {
                self.peek_error(TokenType::Ident);
                break;
            }
        }
        Some(path)
    }

    /// snippet "name": with a statement body
    fn parse_snippet_statement(&mut self) -> Option<SnippetStatement> {
        let token = self.cur_token.clone();
        if !self.expect_peek(TokenType::String) {
            return None;
        }
        let name = self.cur_token.literal.clone();
        if !self.expect_peek(TokenType::Colon) {
            return None;
        }
        let body = self.parse_block_body();
        Some(SnippetStatement { token, name, body })
    }

    /// before/after any task: …  |  on drun setup/teardown: …
    fn parse_lifecycle_hook(&mut self) -> Option<LifecycleHook> {
        let token = self.cur_token.clone();
        let (hook_type, scope) = match self.cur_token.token_type {
            TokenType::Before | TokenType::After => {
                let hook_type = if self.cur_is(TokenType::Before) {
                    HookType::Before
                } else {
                    HookType::After
                };
                if !self.expect_peek(TokenType::Any) {
                    return None;
                }
                if !self.expect_peek(TokenType::Task) {
                    return None;
                }
                (hook_type, HookScope::Any)
            }
            TokenType::On => {
                if !self.expect_peek(TokenType::Drun) {
                    return None;
                }
                self.next_token();
                let hook_type = match self.cur_token.token_type {
                    TokenType::Setup => HookType::Setup,
                    TokenType::Teardown => HookType::Teardown,
                    _ => {
                        self.add_error(format!(
                            "expected setup or teardown, got {}",
                            self.cur_token.token_type.as_str()
                        ));
                        return None;
                    }
                };
                (hook_type, HookScope::Drun)
            }
            _ => return None,
        };
        if !self.expect_peek(TokenType::Colon) {
            return None;
        }
        let body = self.parse_block_body();
        Some(LifecycleHook {
            token,
            hook_type,
            scope,
            body,
        })
    }

    /// shell config: with per-platform executable/args/environment blocks
    fn parse_shell_config(&mut self) -> Option<ShellConfigStatement> {
        let token = self.cur_token.clone();
        self.next_token(); // config
        if !self.expect_peek(TokenType::Colon) {
            return None;
        }
        let mut platforms = IndexMap::new();

        self.next_token();
        self.skip_trivia();
        if !self.cur_is(TokenType::Indent) {
            self.add_error("expected an indented shell config block".to_string());
            return Some(ShellConfigStatement { token, platforms });
        }
        self.next_token();
        while !self.cur_is(TokenType::Dedent) && !self.cur_is(TokenType::Eof) {
            if self.cur_is_trivia() {
                self.next_token();
                continue;
            }
            if !is_name_token(&self.cur_token) {
                self.add_error(format!(
                    "expected a platform name, got {}",
                    self.cur_token.token_type.as_str()
                ));
                self.next_token();
                continue;
            }
            let platform = self.cur_token.literal.clone();
            if let Some(config) = self.parse_platform_shell_config() {
                platforms.insert(platform, config);
            }
            self.next_token();
        }

        Some(ShellConfigStatement { token, platforms })
    }

    fn parse_platform_shell_config(&mut self) -> Option<PlatformShellConfig> {
        if !self.expect_peek(TokenType::Colon) {
            return None;
        }
        let mut config = PlatformShellConfig::default();

        self.next_token();
        self.skip_trivia();
        if !self.cur_is(TokenType::Indent) {
            self.add_error("expected an indented platform block".to_string());
            return Some(config);
        }
        self.next_token();
        while !self.cur_is(TokenType::Dedent) && !self.cur_is(TokenType::Eof) {
            if self.cur_is_trivia() {
                self.next_token();
                continue;
            }
            match self.cur_token.token_type {
                TokenType::Executable => {
                    if self.expect_peek(TokenType::Colon) && self.expect_peek(TokenType::String) {
                        config.executable = self.cur_token.literal.clone();
                    }
                }
                TokenType::Args => {
                    self.parse_shell_config_args(&mut config);
                }
                TokenType::Environment => {
                    self.parse_shell_config_environment(&mut config);
                }
                _ => {
                    self.add_error(format!(
                        "unexpected token in platform block: {}",
                        self.cur_token.token_type.as_str()
                    ));
                }
            }
            self.next_token();
        }
        Some(config)
    }

    /// args: followed by `- "item"` bullet lines
    fn parse_shell_config_args(&mut self, config: &mut PlatformShellConfig) {
        if !self.expect_peek(TokenType::Colon) {
            return;
        }
        self.next_token();
        self.skip_trivia();
        if !self.cur_is(TokenType::Indent) {
            self.add_error("expected an indented args list".to_string());
            return;
        }
        self.next_token();
        while !self.cur_is(TokenType::Dedent) && !self.cur_is(TokenType::Eof) {
            if self.cur_is_trivia() {
                self.next_token();
                continue;
            }
            if self.cur_is(TokenType::Minus) {
                if self.expect_peek(TokenType::String) {
                    config.args.push(self.cur_token.literal.clone());
                }
            } else {
                self.add_error("expected a `- \"arg\"` list item".to_string());
            }
            self.next_token();
        }
    }

    fn parse_shell_config_environment(&mut self, config: &mut PlatformShellConfig) {
        if !self.expect_peek(TokenType::Colon) {
            return;
        }
        self.next_token();
        self.skip_trivia();
        if !self.cur_is(TokenType::Indent) {
            self.add_error("expected an indented environment block".to_string());
            return;
        }
        self.next_token();
        while !self.cur_is(TokenType::Dedent) && !self.cur_is(TokenType::Eof) {
            if self.cur_is_trivia() {
                self.next_token();
                continue;
            }
            if is_name_token(&self.cur_token) {
                let key = self.cur_token.literal.clone();
                if self.expect_peek(TokenType::Colon) && self.expect_peek(TokenType::String) {
                    config
                        .environment
                        .insert(key, self.cur_token.literal.clone());
                }
            } else {
                self.add_error("expected an environment variable name".to_string());
            }
            self.next_token();
        }
    }

    // =========================================================================
    // TASKS & TEMPLATES
    // =========================================================================

    fn parse_task_definition(&mut self) -> Option<TaskDefinition> {
        let token = self.cur_token.clone();
        if !self.expect_peek(TokenType::String) {
            return None;
        }
        let name = self.cur_token.literal.clone();

        if self.peek_is(TokenType::From) {
            return self
                .parse_task_from_template(token, name)
                .map(TaskDefinition::FromTemplate);
        }

        let mut description = String::new();
        if self.peek_is(TokenType::Means) {
            self.next_token();
            if self.expect_peek(TokenType::String) {
                description = self.cur_token.literal.clone();
            }
        }
        if !self.expect_peek(TokenType::Colon) {
            return None;
        }

        let mut task = TaskStatement {
            token,
            name,
            description,
            parameters: Vec::new(),
            dependencies: Vec::new(),
            body: Vec::new(),
        };
        self.parse_task_items(
            &mut task.parameters,
            Some(&mut task.dependencies),
            &mut task.body,
        );
        Some(TaskDefinition::Task(task))
    }

    fn parse_template_statement(&mut self) -> Option<TaskTemplateStatement> {
        let token = self.cur_token.clone();
        if !self.expect_peek(TokenType::Task) {
            return None;
        }
        if !self.expect_peek(TokenType::String) {
            return None;
        }
        let name = self.cur_token.literal.clone();
        let mut description = String::new();
        if self.peek_is(TokenType::Means) {
            self.next_token();
            if self.expect_peek(TokenType::String) {
                description = self.cur_token.literal.clone();
            }
        }
        if !self.expect_peek(TokenType::Colon) {
            return None;
        }

        let mut template = TaskTemplateStatement {
            token,
            name,
            description,
            parameters: Vec::new(),
            body: Vec::new(),
        };
        self.parse_task_items(&mut template.parameters, None, &mut template.body);
        Some(template)
    }

    /// The shared task/template body loop: parameters and dependencies are
    /// classified ahead of ordinary body statements. Templates pass None for
    /// dependencies and get an error instead.
    fn parse_task_items(
        &mut self,
        parameters: &mut Vec<crate::ast::types::ParameterStatement>,
        mut dependencies: Option<&mut Vec<crate::ast::types::DependencyGroup>>,
        body: &mut Vec<Statement>,
    ) {
        self.next_token();
        self.skip_trivia();
        if !self.cur_is(TokenType::Indent) {
            self.add_error("expected an indented task body".to_string());
            return;
        }
        self.next_token();
        while !self.cur_is(TokenType::Dedent) && !self.cur_is(TokenType::Eof) {
            if self.cur_is_trivia() {
                self.next_token();
                continue;
            }
            match self.cur_token.token_type {
                TokenType::Depends => {
                    let group = self.parse_dependency_group();
                    match (&mut dependencies, group) {
                        (Some(deps), Some(group)) => deps.push(group),
                        (None, Some(_)) => {
                            self.add_error(
                                "template tasks cannot declare dependencies".to_string(),
                            );
                        }
                        _ => {}
                    }
                }
                TokenType::Requires | TokenType::Given | TokenType::Accepts => {
                    if let Some(parameter) = self.parse_parameter_statement() {
                        parameters.push(parameter);
                    }
                }
                _ => {
                    if let Some(statement) = self.parse_body_statement() {
                        body.push(statement);
                    }
                }
            }
            self.next_token();
        }
    }

    /// task "name" from template "base": with `set key to value` overrides
    fn parse_task_from_template(
        &mut self,
        token: Token,
        name: String,
    ) -> Option<TaskFromTemplateStatement> {
        self.next_token(); // from
        if !self.expect_peek(TokenType::Template) {
            return None;
        }
        if !self.expect_peek(TokenType::String) {
            return None;
        }
        let template = self.cur_token.literal.clone();
        let mut overrides = IndexMap::new();

        if self.peek_is(TokenType::Colon) {
            self.next_token();
            self.next_token();
            self.skip_trivia();
            if !self.cur_is(TokenType::Indent) {
                self.add_error("expected an indented override block".to_string());
                return Some(TaskFromTemplateStatement {
                    token,
                    name,
                    template,
                    overrides,
                });
            }
            self.next_token();
            while !self.cur_is(TokenType::Dedent) && !self.cur_is(TokenType::Eof) {
                if self.cur_is_trivia() {
                    self.next_token();
                    continue;
                }
                if self.cur_is(TokenType::Set) {
                    if is_name_token(&self.peek_token) || self.peek_is(TokenType::Variable) {
                        self.next_token();
                        let key = self.cur_token.literal.trim_start_matches('$').to_string();
                        if self.expect_peek(TokenType::To) {
                            self.next_token();
                            if let Some(value) = self.parse_expression() {
                                overrides.insert(key, value.to_string());
                            }
                        }
                    } else {
                        self.peek_error(TokenType::Ident);
                    }
                } else {
                    self.add_error(format!(
                        "expected `set key to value` override, got {}",
                        self.cur_token.token_type.as_str()
                    ));
                }
                self.next_token();
            }
        }

        Some(TaskFromTemplateStatement {
            token,
            name,
            template,
            overrides,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::types::*;
    use crate::parser::parse;

    fn parse_ok(input: &str) -> Program {
        let (program, errors) = parse(input);
        assert!(errors.is_empty(), "unexpected errors: {errors:?}");
        program.expect("program")
    }

    fn first_task(program: &Program) -> &TaskStatement {
        match &program.tasks[0] {
            TaskDefinition::Task(t) => t,
            other => panic!("expected a concrete task, got {other:?}"),
        }
    }

    #[test]
    fn test_minimal_task() {
        let program = parse_ok("version: 2.0\ntask \"hello\":\n  info \"hi\"\n");
        assert_eq!(program.version.as_ref().unwrap().value, "2.0");
        assert!(program.project.is_none());
        assert_eq!(program.tasks.len(), 1);
        let task = first_task(&program);
        assert_eq!(task.name, "hello");
        assert_eq!(task.body.len(), 1);
        match &task.body[0] {
            Statement::Action(a) => {
                assert_eq!(a.action, "info");
                assert_eq!(a.message, "hi");
            }
            other => panic!("expected action, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_version_is_single_error() {
        let (program, errors) = parse("task \"t\":\n  info \"x\"\n");
        assert!(program.is_none());
        assert_eq!(errors.len(), 1);
        assert!(
            errors[0].message.starts_with("expected version statement"),
            "got: {}",
            errors[0].message
        );
    }

    #[test]
    fn test_task_with_description() {
        let program = parse_ok("version: 2.0\ntask \"build\" means \"compile it\":\n  info \"x\"\n");
        let task = first_task(&program);
        assert_eq!(task.description, "compile it");
    }

    #[test]
    fn test_project_with_settings() {
        let src = r#"version: 2.0
project "myapp" version "1.0":
  set registry to "ghcr.io/acme"
  snippet "greet":
    info "hello"
task "t":
  info "x"
"#;
        let program = parse_ok(src);
        let project = program.project.as_ref().expect("project");
        assert_eq!(project.name, "myapp");
        assert_eq!(project.version, "1.0");
        assert_eq!(project.settings.len(), 2);
        match &project.settings[0] {
            ProjectSetting::Set(s) => {
                assert_eq!(s.key, "registry");
                assert_eq!(s.value.to_string(), "ghcr.io/acme");
            }
            other => panic!("expected set, got {other:?}"),
        }
        match &project.settings[1] {
            ProjectSetting::Snippet(s) => {
                assert_eq!(s.name, "greet");
                assert_eq!(s.body.len(), 1);
            }
            other => panic!("expected snippet, got {other:?}"),
        }
    }

    #[test]
    fn test_lifecycle_hooks() {
        let src = r#"version: 2.0
project "p":
  before any task:
    info "pre"
  on drun setup:
    info "boot"
task "t":
  info "x"
"#;
        let program = parse_ok(src);
        let project = program.project.as_ref().unwrap();
        match &project.settings[0] {
            ProjectSetting::Hook(h) => {
                assert_eq!(h.hook_type, HookType::Before);
                assert_eq!(h.scope, HookScope::Any);
                assert_eq!(h.body.len(), 1);
            }
            other => panic!("expected hook, got {other:?}"),
        }
        match &project.settings[1] {
            ProjectSetting::Hook(h) => {
                assert_eq!(h.hook_type, HookType::Setup);
                assert_eq!(h.scope, HookScope::Drun);
            }
            other => panic!("expected hook, got {other:?}"),
        }
    }

    #[test]
    fn test_include_forms() {
        let src = r#"version: 2.0
project "p":
  include "lib/common.drun"
  include snippets, templates from "shared.drun" as shared
  include from drunhub ops/docker as ops
task "t":
  info "x"
"#;
        let program = parse_ok(src);
        let project = program.project.as_ref().unwrap();
        let includes: Vec<&IncludeStatement> = project
            .settings
            .iter()
            .filter_map(|s| match s {
                ProjectSetting::Include(i) => Some(i),
                _ => None,
            })
            .collect();
        assert_eq!(includes.len(), 3);
        assert_eq!(includes[0].path, "lib/common.drun");
        assert!(includes[0].selectors.is_empty());
        assert_eq!(includes[1].selectors, vec!["snippets", "templates"]);
        assert_eq!(includes[1].namespace, "shared");
        assert_eq!(includes[2].path, "drunhub:ops/docker");
        assert_eq!(includes[2].namespace, "ops");
    }

    #[test]
    fn test_shell_config() {
        let src = r#"version: 2.0
project "p":
  shell config:
    windows:
      executable: "powershell"
      args:
        - "-NoProfile"
        - "-Command"
      environment:
        PSMODULEPATH: ""
    linux:
      executable: "/bin/bash"
task "t":
  info "x"
"#;
        let program = parse_ok(src);
        let project = program.project.as_ref().unwrap();
        match &project.settings[0] {
            ProjectSetting::ShellConfig(sc) => {
                assert_eq!(sc.platforms.len(), 2);
                let windows = &sc.platforms["windows"];
                assert_eq!(windows.executable, "powershell");
                assert_eq!(windows.args, vec!["-NoProfile", "-Command"]);
                assert_eq!(windows.environment["PSMODULEPATH"], "");
                assert_eq!(sc.platforms["linux"].executable, "/bin/bash");
            }
            other => panic!("expected shell config, got {other:?}"),
        }
    }

    #[test]
    fn test_template_and_instantiation() {
        let src = r#"version: 2.0
template task "deploy-base":
  given $replicas defaults to "2"
  info "deploying"
task "deploy-eu" from template "deploy-base":
  set replicas to "4"
task "deploy-us" from template "deploy-base"
"#;
        let program = parse_ok(src);
        assert_eq!(program.templates.len(), 1);
        assert_eq!(program.templates[0].name, "deploy-base");
        assert_eq!(program.templates[0].parameters.len(), 1);
        assert_eq!(program.tasks.len(), 2);
        match &program.tasks[0] {
            TaskDefinition::FromTemplate(t) => {
                assert_eq!(t.name, "deploy-eu");
                assert_eq!(t.template, "deploy-base");
                assert_eq!(t.overrides["replicas"], "4");
            }
            other => panic!("expected template instantiation, got {other:?}"),
        }
        match &program.tasks[1] {
            TaskDefinition::FromTemplate(t) => {
                assert!(t.overrides.is_empty());
            }
            other => panic!("expected template instantiation, got {other:?}"),
        }
    }

    #[test]
    fn test_template_rejects_dependencies() {
        let src = "version: 2.0\ntemplate task \"base\":\n  depends on setup_db\n  info \"x\"\n";
        let (_, errors) = parse(src);
        assert!(errors
            .iter()
            .any(|e| e.message.contains("cannot declare dependencies")));
    }

    #[test]
    fn test_error_recovery_continues_parsing() {
        // an unknown construct inside one task must not hide the next task
        let src = "version: 2.0\ntask \"a\":\n  ??? nonsense\ntask \"b\":\n  info \"x\"\n";
        let (program, errors) = parse(src);
        assert!(!errors.is_empty());
        let program = program.unwrap();
        assert_eq!(program.tasks.len(), 2);
    }

    #[test]
    fn test_deterministic_ast() {
        let src = "version: 2.0\ntask \"t\":\n  info \"x\"\n  run \"echo hi\"\n";
        let (a, ea) = parse(src);
        let (b, eb) = parse(src);
        assert_eq!(a, b);
        assert_eq!(ea, eb);
    }

    #[test]
    fn test_comments_are_trivia() {
        // trailing trivia leaves every AST-carried token untouched
        let bare = "version: 2.0\ntask \"t\":\n  info \"x\"\n";
        let noisy = "version: 2.0\ntask \"t\": # note\n  info \"x\" /* aside */\n# done\n";
        let (a, ea) = parse(bare);
        let (b, eb) = parse(noisy);
        assert!(ea.is_empty() && eb.is_empty());
        assert_eq!(a, b);
    }
}
