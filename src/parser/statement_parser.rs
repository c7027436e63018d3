//! Body Statement Parser
//!
//! One dispatch drives every statement context: task bodies, control-flow
//! bodies, lifecycle hooks, and snippets all call `parse_body_statement`.
//! Classification follows keyword prefixes with one-token look-ahead; the
//! overloaded keywords (`run`, `create`, `check`, `if`, `when`, `capture`)
//! are disambiguated here before their parse methods run.

use crate::ast::types::{
    ActionStatement, FileStatement, ShellStatement, Statement, TaskCallStatement,
    UseSnippetStatement, VariableStatement,
};
use indexmap::IndexMap;

use crate::parser::lexer::TokenType;
use crate::parser::parser::Parser;
use crate::parser::types::{is_name_token, is_tool_token, render_token};

impl Parser {
    /// Classify and parse one statement. The current token is the first
    /// token of the statement; on success the current token is the last
    /// token of the production.
    pub(crate) fn parse_body_statement(&mut self) -> Option<Statement> {
        // detection statements win over generic conditionals
        if self.cur_is(TokenType::Detect) {
            return self.parse_detect_statement().map(Statement::Detection);
        }
        if self.cur_is(TokenType::If) && self.is_detection_if() {
            return self.parse_if_detection().map(Statement::Detection);
        }
        if self.cur_is(TokenType::When) && self.peek_is(TokenType::In) {
            return self.parse_when_environment().map(Statement::Detection);
        }

        // control flow
        if self.cur_is(TokenType::If) || self.cur_is(TokenType::When) {
            return self.parse_conditional_statement().map(Statement::Conditional);
        }
        if self.cur_is(TokenType::For) {
            return self.parse_loop_statement().map(Statement::Loop);
        }

        // error handling
        if self.cur_is(TokenType::Try) {
            return self.parse_try_statement().map(Statement::Try);
        }
        if matches!(
            self.cur_token.token_type,
            TokenType::Throw | TokenType::Rethrow | TokenType::Ignore
        ) {
            return self.parse_throw_statement().map(Statement::Throw);
        }

        // operation families
        if self.is_docker_statement() {
            return self.parse_docker_statement().map(Statement::Docker);
        }
        if self.is_git_statement() {
            return self.parse_git_statement().map(Statement::Git);
        }
        if self.cur_is(TokenType::Download) {
            return self.parse_download_statement().map(Statement::Download);
        }
        if self.is_http_statement() {
            return self.parse_http_statement().map(Statement::Http);
        }
        if self.is_network_statement() {
            return self.parse_network_statement().map(Statement::Network);
        }

        if self.cur_is(TokenType::Break) {
            return self.parse_break_statement().map(Statement::Break);
        }
        if self.cur_is(TokenType::Continue) {
            return self.parse_continue_statement().map(Statement::Continue);
        }

        // variable operations
        if self.cur_is(TokenType::Let)
            || self.cur_is(TokenType::Transform)
            || (self.cur_is(TokenType::Set) && self.peek_is(TokenType::Variable))
        {
            return self.parse_variable_statement().map(Statement::Variable);
        }
        if self.cur_is(TokenType::Capture) {
            return self.parse_capture_statement();
        }
        if self.cur_is(TokenType::Secret) {
            return self.parse_secret_statement().map(Statement::Secret);
        }

        // actions: shell, file, and plain message actions
        if matches!(
            self.cur_token.token_type,
            TokenType::Run | TokenType::Exec | TokenType::Shell
        ) {
            return self.parse_shell_statement().map(Statement::Shell);
        }
        if matches!(
            self.cur_token.token_type,
            TokenType::Create
                | TokenType::Copy
                | TokenType::Move
                | TokenType::Delete
                | TokenType::Read
                | TokenType::Write
                | TokenType::Append
                | TokenType::Backup
                | TokenType::Check
        ) {
            return self.parse_file_statement().map(Statement::File);
        }
        if matches!(
            self.cur_token.token_type,
            TokenType::Info
                | TokenType::Step
                | TokenType::Warn
                | TokenType::Error
                | TokenType::Success
                | TokenType::Fail
                | TokenType::Echo
        ) {
            return self.parse_action_statement().map(Statement::Action);
        }

        if self.cur_is(TokenType::Use) {
            return self.parse_use_snippet().map(Statement::UseSnippet);
        }
        if self.cur_is(TokenType::Call) {
            return self.parse_task_call().map(Statement::TaskCall);
        }

        self.add_error(format!(
            "unexpected token in task body: {}",
            self.cur_token.token_type.as_str()
        ));
        None
    }

    // =========================================================================
    // CLASSIFIERS
    // =========================================================================

    /// `if <tool> …` and `if "name" …` are detection, everything else is a
    /// plain conditional
    pub(crate) fn is_detection_if(&self) -> bool {
        is_tool_token(self.peek_token.token_type) || self.peek_is(TokenType::String)
    }

    fn is_docker_statement(&self) -> bool {
        match self.cur_token.token_type {
            TokenType::Docker => true,
            // `run "cmd"` and `run:` are shell; any other continuation is
            // the Docker `run container …` form
            TokenType::Run => !self.peek_is(TokenType::String) && !self.peek_is(TokenType::Colon),
            TokenType::Build
            | TokenType::Push
            | TokenType::Pull
            | TokenType::Tag
            | TokenType::Remove
            | TokenType::Start
            | TokenType::Stop
            | TokenType::Scale => {
                self.peek_is(TokenType::Container) || self.peek_is(TokenType::Image)
            }
            TokenType::Compose => {
                self.peek_is(TokenType::Up)
                    || self.peek_is(TokenType::Down)
                    || self.peek_is(TokenType::Build)
            }
            _ => false,
        }
    }

    /// Git operations take the `git` prefix; the only keyword-less forms
    /// are `create branch` and `create tag`
    fn is_git_statement(&self) -> bool {
        match self.cur_token.token_type {
            TokenType::Git => true,
            TokenType::Create => {
                self.peek_is(TokenType::Branch) || self.peek_is(TokenType::Tag)
            }
            _ => false,
        }
    }

    fn is_http_statement(&self) -> bool {
        matches!(
            self.cur_token.token_type,
            TokenType::Http
                | TokenType::Get
                | TokenType::Post
                | TokenType::Put
                | TokenType::Patch
                | TokenType::Head
                | TokenType::Options
        )
    }

    /// `check health …` and `check if port …` are network; `check if file`
    /// stays a file statement. The port form needs the token after peek,
    /// served by the lexer's look-ahead buffer.
    fn is_network_statement(&mut self) -> bool {
        match self.cur_token.token_type {
            TokenType::Wait | TokenType::Ping | TokenType::Test => true,
            TokenType::Check => {
                if self.peek_is(TokenType::Health) {
                    return true;
                }
                if self.peek_is(TokenType::If) {
                    return self.peek_after().token_type == TokenType::Port;
                }
                false
            }
            _ => false,
        }
    }

    // =========================================================================
    // ACTIONS
    // =========================================================================

    /// info/step/warn/error/success/fail/echo "message"
    fn parse_action_statement(&mut self) -> Option<ActionStatement> {
        let token = self.cur_token.clone();
        let action = token.literal.clone();
        let mut message = String::new();
        let mut line_break_before = false;
        let mut line_break_after = false;
        if self.peek_is(TokenType::String) {
            self.next_token();
            let mut raw = self.cur_token.literal.as_str();
            if let Some(stripped) = raw.strip_prefix('\n') {
                line_break_before = true;
                raw = stripped;
            }
            if let Some(stripped) = raw.strip_suffix('\n') {
                line_break_after = true;
                raw = stripped;
            }
            message = raw.to_string();
        }
        Some(ActionStatement {
            token,
            action,
            message,
            line_break_before,
            line_break_after,
        })
    }

    // =========================================================================
    // SHELL
    // =========================================================================

    /// run/exec/shell, single-line or block form
    fn parse_shell_statement(&mut self) -> Option<ShellStatement> {
        let token = self.cur_token.clone();
        let action = token.literal.clone();
        if self.peek_is(TokenType::String) {
            self.next_token();
            return Some(ShellStatement {
                token,
                action,
                command: self.cur_token.literal.clone(),
                commands: Vec::new(),
                is_multiline: false,
                capture_variable: String::new(),
                stream_output: true,
            });
        }
        if self.peek_is(TokenType::Colon) {
            self.next_token();
            let commands = self.read_multiline_commands();
            return Some(ShellStatement {
                token,
                action,
                command: String::new(),
                commands,
                is_multiline: true,
                capture_variable: String::new(),
                stream_output: true,
            });
        }
        self.add_error(format!(
            "expected a command string or block after '{action}'"
        ));
        None
    }

    /// capture has four shapes:
    ///   capture "cmd" as $var            (single-line shell capture)
    ///   capture as $var: / capture:      (multi-line shell capture)
    ///   capture from shell "cmd" as $var (shell capture into a variable)
    ///   capture $var from <expr>         (expression capture)
    fn parse_capture_statement(&mut self) -> Option<Statement> {
        let token = self.cur_token.clone();
        match self.peek_token.token_type {
            TokenType::String => {
                self.next_token();
                let command = self.cur_token.literal.clone();
                if !self.expect_peek(TokenType::As) {
                    return None;
                }
                if !self.expect_peek(TokenType::Variable) {
                    return None;
                }
                let variable = self.cur_token.clone();
                self.check_reserved_variable(&variable);
                Some(Statement::Shell(ShellStatement {
                    token,
                    action: "capture".to_string(),
                    command,
                    commands: Vec::new(),
                    is_multiline: false,
                    capture_variable: variable.literal,
                    stream_output: false,
                }))
            }
            TokenType::As | TokenType::Colon => {
                let mut capture_variable = String::new();
                if self.peek_is(TokenType::As) {
                    self.next_token();
                    if !self.expect_peek(TokenType::Variable) {
                        return None;
                    }
                    let variable = self.cur_token.clone();
                    self.check_reserved_variable(&variable);
                    capture_variable = variable.literal;
                }
                if !self.expect_peek(TokenType::Colon) {
                    return None;
                }
                let commands = self.read_multiline_commands();
                Some(Statement::Shell(ShellStatement {
                    token,
                    action: "capture".to_string(),
                    command: String::new(),
                    commands,
                    is_multiline: true,
                    capture_variable,
                    stream_output: false,
                }))
            }
            TokenType::From => self.parse_capture_from_shell(token),
            TokenType::Variable => {
                self.next_token();
                let variable = self.cur_token.clone();
                self.check_reserved_variable(&variable);
                if !self.expect_peek(TokenType::From) {
                    return None;
                }
                self.next_token();
                let value = self.parse_expression()?;
                Some(Statement::Variable(VariableStatement {
                    token,
                    operation: "capture".to_string(),
                    variable: variable.literal,
                    value: Some(value),
                    function: String::new(),
                    arguments: Vec::new(),
                }))
            }
            _ => {
                self.add_error("expected a command, variable, or block after 'capture'".to_string());
                None
            }
        }
    }

    fn parse_capture_from_shell(
        &mut self,
        token: crate::parser::lexer::Token,
    ) -> Option<Statement> {
        self.next_token(); // from
        if !self.expect_peek(TokenType::Shell) {
            return None;
        }
        if self.peek_is(TokenType::String) {
            self.next_token();
            let command = self.cur_token.clone();
            if !self.expect_peek(TokenType::As) {
                return None;
            }
            if !self.expect_peek(TokenType::Variable) {
                return None;
            }
            let variable = self.cur_token.clone();
            self.check_reserved_variable(&variable);
            return Some(Statement::Variable(VariableStatement {
                token,
                operation: "capture_shell".to_string(),
                variable: variable.literal,
                value: Some(crate::ast::types::Expression::Literal(
                    crate::ast::types::LiteralExpression {
                        token: command.clone(),
                        value: command.literal,
                    },
                )),
                function: String::new(),
                arguments: Vec::new(),
            }));
        }
        // block form: capture from shell as $var:
        if !self.expect_peek(TokenType::As) {
            return None;
        }
        if !self.expect_peek(TokenType::Variable) {
            return None;
        }
        let variable = self.cur_token.clone();
        self.check_reserved_variable(&variable);
        if !self.expect_peek(TokenType::Colon) {
            return None;
        }
        let commands = self.read_multiline_commands();
        Some(Statement::Shell(ShellStatement {
            token,
            action: "capture".to_string(),
            command: String::new(),
            commands,
            is_multiline: true,
            capture_variable: variable.literal,
            stream_output: false,
        }))
    }

    /// Collect the raw tokens of an indented command block, grouped back
    /// into one string per physical line. Strings get their quotes back,
    /// adjacent tokens are joined with single spaces, comments vanish. The
    /// current token must be the introducing COLON; it ends on the DEDENT
    /// that closes the block.
    pub(crate) fn read_multiline_commands(&mut self) -> Vec<String> {
        let mut commands: Vec<String> = Vec::new();
        self.next_token();
        self.skip_trivia();
        if !self.cur_is(TokenType::Indent) {
            self.add_error("expected an indented command block".to_string());
            return commands;
        }
        let mut depth = 1usize;
        let mut current_line = 0usize;
        loop {
            self.next_token();
            match self.cur_token.token_type {
                TokenType::Indent => depth += 1,
                TokenType::Dedent => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                }
                TokenType::Eof => break,
                TokenType::Newline | TokenType::Comment | TokenType::MultilineComment => {}
                _ => {
                    let piece = render_token(&self.cur_token);
                    if self.cur_token.line == current_line {
                        if let Some(last) = commands.last_mut() {
                            last.push(' ');
                            last.push_str(&piece);
                        }
                    } else {
                        current_line = self.cur_token.line;
                        commands.push(piece);
                    }
                }
            }
        }
        commands
    }

    // =========================================================================
    // VARIABLE OPERATIONS
    // =========================================================================

    /// let $x = <expr>  |  set $x to <expr>  |  transform $x with f args
    fn parse_variable_statement(&mut self) -> Option<VariableStatement> {
        let token = self.cur_token.clone();
        match token.token_type {
            TokenType::Let => {
                if !self.expect_peek(TokenType::Variable) {
                    return None;
                }
                let variable = self.cur_token.clone();
                self.check_reserved_variable(&variable);
                if !self.expect_peek(TokenType::Equals) {
                    return None;
                }
                self.next_token();
                let value = self.parse_expression()?;
                Some(VariableStatement {
                    token,
                    operation: "let".to_string(),
                    variable: variable.literal,
                    value: Some(value),
                    function: String::new(),
                    arguments: Vec::new(),
                })
            }
            TokenType::Set => {
                if !self.expect_peek(TokenType::Variable) {
                    return None;
                }
                let variable = self.cur_token.clone();
                self.check_reserved_variable(&variable);
                if !self.expect_peek(TokenType::To) {
                    return None;
                }
                self.next_token();
                let value = self.parse_expression()?;
                Some(VariableStatement {
                    token,
                    operation: "set".to_string(),
                    variable: variable.literal,
                    value: Some(value),
                    function: String::new(),
                    arguments: Vec::new(),
                })
            }
            TokenType::Transform => {
                if !self.expect_peek(TokenType::Variable) {
                    return None;
                }
                let variable = self.cur_token.clone();
                self.check_reserved_variable(&variable);
                if !self.expect_peek(TokenType::With) {
                    return None;
                }
                if !is_name_token(&self.peek_token) {
                    self.peek_error(TokenType::Ident);
                    return None;
                }
                self.next_token();
                let function = self.cur_token.literal.clone();
                let mut arguments = Vec::new();
                while matches!(
                    self.peek_token.token_type,
                    TokenType::String | TokenType::Number | TokenType::Boolean | TokenType::Variable
                ) {
                    self.next_token();
                    if let Some(argument) = self.parse_primary_expression() {
                        arguments.push(argument);
                    }
                    if self.peek_is(TokenType::Comma) {
                        self.next_token();
                    }
                }
                Some(VariableStatement {
                    token,
                    operation: "transform".to_string(),
                    variable: variable.literal,
                    value: None,
                    function,
                    arguments,
                })
            }
            _ => None,
        }
    }

    // =========================================================================
    // FILE OPERATIONS
    // =========================================================================

    fn parse_file_statement(&mut self) -> Option<FileStatement> {
        let token = self.cur_token.clone();
        let action = token.literal.clone();
        let mut statement = FileStatement {
            token,
            action,
            target: String::new(),
            source: String::new(),
            content: String::new(),
            is_dir: false,
            capture_variable: String::new(),
        };

        match statement.token.token_type {
            TokenType::Create => match self.peek_token.token_type {
                TokenType::File => {
                    self.next_token();
                    if !self.expect_peek(TokenType::String) {
                        return None;
                    }
                    statement.target = self.cur_token.literal.clone();
                }
                TokenType::Dir | TokenType::Directory => {
                    self.next_token();
                    statement.is_dir = true;
                    if !self.expect_peek(TokenType::String) {
                        return None;
                    }
                    statement.target = self.cur_token.literal.clone();
                }
                _ => {
                    self.add_error_with_help(
                        "ambiguous create statement".to_string(),
                        "specify what to create: branch, tag, file, or directory",
                    );
                    return None;
                }
            },
            TokenType::Copy | TokenType::Move => {
                if !self.expect_peek(TokenType::String) {
                    return None;
                }
                statement.source = self.cur_token.literal.clone();
                if !self.expect_peek(TokenType::To) {
                    return None;
                }
                if !self.expect_peek(TokenType::String) {
                    return None;
                }
                statement.target = self.cur_token.literal.clone();
            }
            TokenType::Delete => {
                match self.peek_token.token_type {
                    TokenType::File => self.next_token(),
                    TokenType::Dir | TokenType::Directory => {
                        statement.is_dir = true;
                        self.next_token();
                    }
                    _ => {}
                }
                if !self.expect_peek(TokenType::String) {
                    return None;
                }
                statement.target = self.cur_token.literal.clone();
            }
            TokenType::Read => {
                if !self.expect_peek(TokenType::File) {
                    return None;
                }
                if !self.expect_peek(TokenType::String) {
                    return None;
                }
                statement.target = self.cur_token.literal.clone();
                if !self.expect_peek(TokenType::As) {
                    return None;
                }
                if !self.expect_peek(TokenType::Variable) {
                    return None;
                }
                let variable = self.cur_token.clone();
                self.check_reserved_variable(&variable);
                statement.capture_variable = variable.literal;
            }
            TokenType::Write | TokenType::Append => {
                if !self.expect_peek(TokenType::String) {
                    return None;
                }
                statement.content = self.cur_token.literal.clone();
                if !self.expect_peek(TokenType::To) {
                    return None;
                }
                if !self.expect_peek(TokenType::File) {
                    return None;
                }
                if !self.expect_peek(TokenType::String) {
                    return None;
                }
                statement.target = self.cur_token.literal.clone();
            }
            TokenType::Backup => {
                if !self.expect_peek(TokenType::String) {
                    return None;
                }
                statement.target = self.cur_token.literal.clone();
                if self.peek_is(TokenType::As) {
                    self.next_token();
                    if !self.expect_peek(TokenType::String) {
                        return None;
                    }
                    statement.source = self.cur_token.literal.clone();
                }
            }
            TokenType::Check => return self.parse_file_check(statement),
            _ => return None,
        }
        Some(statement)
    }

    /// check if file "p" exists  |  check size of file "p" as $var
    fn parse_file_check(&mut self, mut statement: FileStatement) -> Option<FileStatement> {
        match self.peek_token.token_type {
            TokenType::If => {
                self.next_token(); // if
                self.next_token();
                match self.cur_token.token_type {
                    TokenType::File => {}
                    TokenType::Dir | TokenType::Directory => statement.is_dir = true,
                    _ => {
                        self.add_error(format!(
                            "expected file or directory in check statement, got {}",
                            self.cur_token.token_type.as_str()
                        ));
                        return None;
                    }
                }
                if !self.expect_peek(TokenType::String) {
                    return None;
                }
                statement.target = self.cur_token.literal.clone();
                if self.peek_is(TokenType::Exists) {
                    self.next_token();
                }
                statement.content = "exists".to_string();
                Some(statement)
            }
            TokenType::Size => {
                self.next_token(); // size
                if !self.expect_peek(TokenType::Of) {
                    return None;
                }
                if !self.expect_peek(TokenType::File) {
                    return None;
                }
                if !self.expect_peek(TokenType::String) {
                    return None;
                }
                statement.target = self.cur_token.literal.clone();
                statement.content = "size".to_string();
                if self.peek_is(TokenType::As) {
                    self.next_token();
                    if !self.expect_peek(TokenType::Variable) {
                        return None;
                    }
                    let variable = self.cur_token.clone();
                    self.check_reserved_variable(&variable);
                    statement.capture_variable = variable.literal;
                }
                Some(statement)
            }
            _ => {
                self.add_error("expected `if` or `size of` after 'check'".to_string());
                None
            }
        }
    }

    // =========================================================================
    // SNIPPETS & TASK CALLS
    // =========================================================================

    /// use snippet "name"
    fn parse_use_snippet(&mut self) -> Option<UseSnippetStatement> {
        let token = self.cur_token.clone();
        if !self.expect_peek(TokenType::Snippet) {
            return None;
        }
        if !self.expect_peek(TokenType::String) {
            return None;
        }
        Some(UseSnippetStatement {
            token,
            snippet_name: self.cur_token.literal.clone(),
        })
    }

    /// call task "name" with key="value", key2="value2"
    fn parse_task_call(&mut self) -> Option<TaskCallStatement> {
        let token = self.cur_token.clone();
        if !self.expect_peek(TokenType::Task) {
            return None;
        }
        if !self.expect_peek(TokenType::String) {
            return None;
        }
        let task_name = self.cur_token.literal.clone();
        let mut parameters = IndexMap::new();
        if self.peek_is(TokenType::With) {
            self.next_token();
            loop {
                if !is_name_token(&self.peek_token) {
                    self.peek_error(TokenType::Ident);
                    break;
                }
                self.next_token();
                let key = self.cur_token.literal.clone();
                if !self.expect_peek(TokenType::Equals) {
                    break;
                }
                self.next_token();
                let value = self.cur_token.literal.clone();
                parameters.insert(key, value);
                if self.peek_is(TokenType::Comma) {
                    self.next_token();
                    continue;
                }
                break;
            }
        }
        Some(TaskCallStatement {
            token,
            task_name,
            parameters,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::types::*;
    use crate::parser::parse;

    fn body_of(input: &str) -> Vec<Statement> {
        let (program, errors) = parse(input);
        assert!(errors.is_empty(), "unexpected errors: {errors:?}");
        match program.expect("program").tasks.remove(0) {
            TaskDefinition::Task(t) => t.body,
            other => panic!("expected task, got {other:?}"),
        }
    }

    fn errors_of(input: &str) -> Vec<String> {
        let (_, errors) = parse(input);
        errors.into_iter().map(|e| e.message).collect()
    }

    #[test]
    fn test_run_disambiguation() {
        let body = body_of(
            "version: 2.0\ntask \"t\":\n  run \"echo hi\"\n  docker run container \"web\" from \"img:1\"\n",
        );
        assert_eq!(body.len(), 2);
        match &body[0] {
            Statement::Shell(s) => {
                assert_eq!(s.action, "run");
                assert_eq!(s.command, "echo hi");
                assert!(s.stream_output);
                assert!(!s.is_multiline);
            }
            other => panic!("expected shell, got {other:?}"),
        }
        match &body[1] {
            Statement::Docker(d) => {
                assert_eq!(d.operation, "run");
                assert_eq!(d.resource, "container");
                assert_eq!(d.name, "web");
                assert_eq!(d.options["from"], "img:1");
            }
            other => panic!("expected docker, got {other:?}"),
        }
    }

    #[test]
    fn test_bare_run_container_is_docker() {
        let body = body_of("version: 2.0\ntask \"t\":\n  run container \"db\" from \"postgres:16\"\n");
        match &body[0] {
            Statement::Docker(d) => {
                assert_eq!(d.operation, "run");
                assert_eq!(d.name, "db");
            }
            other => panic!("expected docker, got {other:?}"),
        }
    }

    #[test]
    fn test_multiline_run_block() {
        let body = body_of("version: 2.0\ntask \"t\":\n  run:\n    echo \"first\"\n    echo \"second\"\n");
        match &body[0] {
            Statement::Shell(s) => {
                assert_eq!(s.action, "run");
                assert!(s.is_multiline);
                assert!(s.stream_output);
                assert_eq!(s.commands, vec!["echo \"first\"", "echo \"second\""]);
            }
            other => panic!("expected shell, got {other:?}"),
        }
    }

    #[test]
    fn test_multiline_block_strips_comments() {
        let body = body_of(
            "version: 2.0\ntask \"t\":\n  run:\n    make build # compile\n    make test\n",
        );
        match &body[0] {
            Statement::Shell(s) => {
                assert_eq!(s.commands, vec!["make build", "make test"]);
            }
            other => panic!("expected shell, got {other:?}"),
        }
    }

    #[test]
    fn test_capture_single_line() {
        let body = body_of("version: 2.0\ntask \"t\":\n  capture \"git rev-parse HEAD\" as $sha\n");
        match &body[0] {
            Statement::Shell(s) => {
                assert_eq!(s.action, "capture");
                assert_eq!(s.command, "git rev-parse HEAD");
                assert_eq!(s.capture_variable, "$sha");
                assert!(!s.stream_output);
            }
            other => panic!("expected shell, got {other:?}"),
        }
    }

    #[test]
    fn test_capture_block() {
        let body = body_of("version: 2.0\ntask \"t\":\n  capture as $out:\n    uname -a\n    date\n");
        match &body[0] {
            Statement::Shell(s) => {
                assert_eq!(s.capture_variable, "$out");
                assert!(s.is_multiline);
                assert_eq!(s.commands.len(), 2);
            }
            other => panic!("expected shell, got {other:?}"),
        }
    }

    #[test]
    fn test_capture_from_shell() {
        let body =
            body_of("version: 2.0\ntask \"t\":\n  capture from shell \"whoami\" as $user\n");
        match &body[0] {
            Statement::Variable(v) => {
                assert_eq!(v.operation, "capture_shell");
                assert_eq!(v.variable, "$user");
                assert_eq!(v.value.as_ref().unwrap().to_string(), "whoami");
            }
            other => panic!("expected variable, got {other:?}"),
        }
    }

    #[test]
    fn test_capture_expression() {
        let body = body_of("version: 2.0\ntask \"t\":\n  capture $total from $a + $b\n");
        match &body[0] {
            Statement::Variable(v) => {
                assert_eq!(v.operation, "capture");
                assert_eq!(v.variable, "$total");
                assert_eq!(v.value.as_ref().unwrap().to_string(), "$a + $b");
            }
            other => panic!("expected variable, got {other:?}"),
        }
    }

    #[test]
    fn test_let_set_transform() {
        let body = body_of(
            "version: 2.0\ntask \"t\":\n  let $x = 5\n  set $name to \"drun\"\n  transform $name with replace \"d\", \"D\"\n",
        );
        match &body[0] {
            Statement::Variable(v) => {
                assert_eq!(v.operation, "let");
                assert_eq!(v.variable, "$x");
            }
            other => panic!("expected variable, got {other:?}"),
        }
        match &body[1] {
            Statement::Variable(v) => {
                assert_eq!(v.operation, "set");
                assert_eq!(v.value.as_ref().unwrap().to_string(), "drun");
            }
            other => panic!("expected variable, got {other:?}"),
        }
        match &body[2] {
            Statement::Variable(v) => {
                assert_eq!(v.operation, "transform");
                assert_eq!(v.function, "replace");
                assert_eq!(v.arguments.len(), 2);
            }
            other => panic!("expected variable, got {other:?}"),
        }
    }

    #[test]
    fn test_reserved_names_rejected_everywhere() {
        for src in [
            "version: 2.0\ntask \"t\":\n  let $globals = 1\n",
            "version: 2.0\ntask \"t\":\n  set $params to \"x\"\n",
            "version: 2.0\ntask \"t\":\n  capture \"id\" as $globals\n",
            "version: 2.0\ntask \"t\":\n  transform $params with trim\n",
        ] {
            let errors = errors_of(src);
            assert!(
                errors.iter().any(|e| e.contains("reserved variable name")),
                "no reserved-name error for {src:?}: {errors:?}"
            );
        }
    }

    #[test]
    fn test_action_line_break_flags() {
        let body = body_of("version: 2.0\ntask \"t\":\n  info \"\\nbig moment\\n\"\n  step \"plain\"\n");
        match &body[0] {
            Statement::Action(a) => {
                assert!(a.line_break_before);
                assert!(a.line_break_after);
                assert_eq!(a.message, "big moment");
            }
            other => panic!("expected action, got {other:?}"),
        }
        match &body[1] {
            Statement::Action(a) => {
                assert!(!a.line_break_before);
                assert!(!a.line_break_after);
            }
            other => panic!("expected action, got {other:?}"),
        }
    }

    #[test]
    fn test_file_operations() {
        let body = body_of(
            "version: 2.0\ntask \"t\":\n  create directory \"dist\"\n  copy \"a.txt\" to \"b.txt\"\n  read file \"VERSION\" as $v\n  write \"done\" to file \"status\"\n",
        );
        match &body[0] {
            Statement::File(f) => {
                assert_eq!(f.action, "create");
                assert!(f.is_dir);
                assert_eq!(f.target, "dist");
            }
            other => panic!("expected file, got {other:?}"),
        }
        match &body[1] {
            Statement::File(f) => {
                assert_eq!(f.source, "a.txt");
                assert_eq!(f.target, "b.txt");
            }
            other => panic!("expected file, got {other:?}"),
        }
        match &body[2] {
            Statement::File(f) => {
                assert_eq!(f.capture_variable, "$v");
            }
            other => panic!("expected file, got {other:?}"),
        }
        match &body[3] {
            Statement::File(f) => {
                assert_eq!(f.content, "done");
                assert_eq!(f.target, "status");
            }
            other => panic!("expected file, got {other:?}"),
        }
    }

    #[test]
    fn test_check_file_vs_check_port() {
        let body = body_of(
            "version: 2.0\ntask \"t\":\n  check if file \"Cargo.toml\" exists\n  check if port 8080 is open\n",
        );
        match &body[0] {
            Statement::File(f) => {
                assert_eq!(f.action, "check");
                assert_eq!(f.content, "exists");
                assert_eq!(f.target, "Cargo.toml");
            }
            other => panic!("expected file, got {other:?}"),
        }
        match &body[1] {
            Statement::Network(n) => {
                assert_eq!(n.action, "port_check");
                assert_eq!(n.port, "8080");
                assert_eq!(n.condition, "open");
            }
            other => panic!("expected network, got {other:?}"),
        }
    }

    #[test]
    fn test_check_size_of_file() {
        let body = body_of("version: 2.0\ntask \"t\":\n  check size of file \"big.bin\" as $bytes\n");
        match &body[0] {
            Statement::File(f) => {
                assert_eq!(f.content, "size");
                assert_eq!(f.capture_variable, "$bytes");
            }
            other => panic!("expected file, got {other:?}"),
        }
    }

    #[test]
    fn test_ambiguous_create_is_an_error() {
        let errors = errors_of("version: 2.0\ntask \"t\":\n  create \"thing\"\n");
        assert!(errors.iter().any(|e| e.contains("ambiguous create")));
    }

    #[test]
    fn test_git_operations_require_the_git_prefix() {
        // only create branch/tag may drop the `git` keyword
        for src in [
            "version: 2.0\ntask \"t\":\n  checkout branch \"main\"\n",
            "version: 2.0\ntask \"t\":\n  clone \"https://example.com/r.git\"\n",
        ] {
            let errors = errors_of(src);
            assert!(
                errors.iter().any(|e| e.contains("unexpected token in task body")),
                "bare form was accepted: {src:?}"
            );
        }
    }

    #[test]
    fn test_use_snippet_and_call_task() {
        let body = body_of(
            "version: 2.0\ntask \"t\":\n  use snippet \"greet\"\n  call task \"deploy\" with env=\"prod\", region=\"eu\"\n",
        );
        match &body[0] {
            Statement::UseSnippet(u) => assert_eq!(u.snippet_name, "greet"),
            other => panic!("expected use snippet, got {other:?}"),
        }
        match &body[1] {
            Statement::TaskCall(c) => {
                assert_eq!(c.task_name, "deploy");
                assert_eq!(c.parameters["env"], "prod");
                assert_eq!(c.parameters["region"], "eu");
            }
            other => panic!("expected task call, got {other:?}"),
        }
    }
}
