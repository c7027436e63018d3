//! Control Flow & Detection Parser
//!
//! if/when conditionals, the four loop shapes, break/continue, try/catch/
//! finally, the throw family, and the detection statements that specialize
//! conditionals on tool availability, versions, and environments.

use crate::ast::types::{
    BreakStatement, CatchClause, ConditionalStatement, ContinueStatement, DetectionStatement,
    FilterExpression, LoopStatement, Statement, ThrowStatement, TryStatement,
};
use crate::parser::lexer::TokenType;
use crate::parser::parser::Parser;
use crate::parser::types::{is_comparison_operator, is_name_token, render_token};

impl Parser {
    // =========================================================================
    // CONDITIONALS
    // =========================================================================

    /// if <condition>: … else: …  |  when <condition>: … otherwise: …
    ///
    /// `else if` nests the chained conditional inside the parent's else
    /// body. The condition itself is kept as raw text for the executor.
    pub(crate) fn parse_conditional_statement(&mut self) -> Option<ConditionalStatement> {
        let token = self.cur_token.clone();
        let kind = token.literal.clone();
        let condition = self.read_condition_until_colon();
        if !self.expect_peek(TokenType::Colon) {
            return None;
        }
        let body = self.parse_block_body();

        let mut else_body = Vec::new();
        let else_keyword = if kind == "when" {
            TokenType::Otherwise
        } else {
            TokenType::Else
        };
        if self.peek_is(else_keyword) {
            self.next_token();
            if kind == "if" && self.peek_is(TokenType::If) {
                self.next_token();
                let nested = if self.is_detection_if() {
                    self.parse_if_detection().map(Statement::Detection)
                } else {
                    self.parse_conditional_statement().map(Statement::Conditional)
                };
                if let Some(nested) = nested {
                    else_body.push(nested);
                }
            } else if self.expect_peek(TokenType::Colon) {
                else_body = self.parse_block_body();
            }
        }

        Some(ConditionalStatement {
            token,
            kind,
            condition,
            body,
            else_body,
        })
    }

    /// Collect raw condition text up to the introducing colon
    pub(crate) fn read_condition_until_colon(&mut self) -> String {
        let mut pieces = Vec::new();
        while !matches!(
            self.peek_token.token_type,
            TokenType::Colon
                | TokenType::Newline
                | TokenType::Indent
                | TokenType::Dedent
                | TokenType::Eof
        ) {
            self.next_token();
            pieces.push(render_token(&self.cur_token));
        }
        pieces.join(" ")
    }

    /// Collect raw condition text to the end of the line (break/continue)
    fn read_condition_to_line_end(&mut self) -> String {
        let mut pieces = Vec::new();
        while !matches!(
            self.peek_token.token_type,
            TokenType::Newline | TokenType::Dedent | TokenType::Eof
        ) {
            self.next_token();
            pieces.push(render_token(&self.cur_token));
        }
        pieces.join(" ")
    }

    // =========================================================================
    // LOOPS
    // =========================================================================

    /// for $i in range N to M step S  |  for each $x in <iterable>  |
    /// for each line $l in file "p"   |  for each match $m in pattern "re"
    ///
    /// An optional `where` filter, `in parallel` (with `with max N workers`
    /// and `fail fast`), then the colon and body.
    pub(crate) fn parse_loop_statement(&mut self) -> Option<LoopStatement> {
        let token = self.cur_token.clone();
        let mut statement = LoopStatement {
            token,
            loop_type: String::new(),
            variable: String::new(),
            iterable: String::new(),
            range_start: String::new(),
            range_end: String::new(),
            range_step: String::new(),
            filter: None,
            parallel: false,
            max_workers: None,
            fail_fast: false,
            body: Vec::new(),
        };

        if self.peek_is(TokenType::Each) {
            self.next_token();
            match self.peek_token.token_type {
                TokenType::Line => {
                    self.next_token();
                    statement.loop_type = "line".to_string();
                    if !self.expect_peek(TokenType::Variable) {
                        return None;
                    }
                    statement.variable = self.cur_token.literal.clone();
                    if !self.expect_peek(TokenType::In) {
                        return None;
                    }
                    if !self.expect_peek(TokenType::File) {
                        return None;
                    }
                    if !self.expect_peek(TokenType::String) {
                        return None;
                    }
                    statement.iterable = self.cur_token.literal.clone();
                }
                TokenType::Match => {
                    self.next_token();
                    statement.loop_type = "match".to_string();
                    if !self.expect_peek(TokenType::Variable) {
                        return None;
                    }
                    statement.variable = self.cur_token.literal.clone();
                    if !self.expect_peek(TokenType::In) {
                        return None;
                    }
                    if !self.expect_peek(TokenType::Pattern) {
                        return None;
                    }
                    if !self.expect_peek(TokenType::String) {
                        return None;
                    }
                    statement.iterable = self.cur_token.literal.clone();
                }
                _ => {
                    statement.loop_type = "each".to_string();
                    if !self.expect_peek(TokenType::Variable) {
                        return None;
                    }
                    statement.variable = self.cur_token.literal.clone();
                    if !self.expect_peek(TokenType::In) {
                        return None;
                    }
                    self.next_token();
                    let iterable = self.parse_expression()?;
                    statement.iterable = iterable.to_string();
                }
            }
        } else {
            statement.loop_type = "range".to_string();
            if !self.expect_peek(TokenType::Variable) {
                return None;
            }
            statement.variable = self.cur_token.literal.clone();
            if !self.expect_peek(TokenType::In) {
                return None;
            }
            if !self.expect_peek(TokenType::Range) {
                return None;
            }
            self.next_token();
            statement.range_start = self.cur_token.literal.clone();
            if !self.expect_peek(TokenType::To) {
                return None;
            }
            self.next_token();
            statement.range_end = self.cur_token.literal.clone();
            if self.peek_is(TokenType::Step) {
                self.next_token();
                self.next_token();
                statement.range_step = self.cur_token.literal.clone();
            }
        }

        if self.peek_is(TokenType::Where) {
            self.next_token();
            statement.filter = self.parse_filter_expression();
        }

        if self.peek_is(TokenType::In) {
            self.next_token();
            if self.expect_peek(TokenType::Parallel) {
                statement.parallel = true;
            }
            if self.peek_is(TokenType::With) {
                self.next_token();
                if self.expect_peek(TokenType::Max) && self.expect_peek(TokenType::Number) {
                    statement.max_workers = self.cur_token.literal.parse::<i64>().ok();
                    if !self.expect_peek(TokenType::Workers) {
                        return None;
                    }
                }
            }
            if self.peek_is(TokenType::Fail) {
                self.next_token();
                if self.expect_peek(TokenType::Fast) {
                    statement.fail_fast = true;
                }
            }
        }

        if !self.expect_peek(TokenType::Colon) {
            return None;
        }
        statement.body = self.parse_block_body();
        Some(statement)
    }

    /// where $x <op> <value>; the current token is `where`
    fn parse_filter_expression(&mut self) -> Option<FilterExpression> {
        if !self.expect_peek(TokenType::Variable) {
            return None;
        }
        let variable = self.cur_token.literal.clone();
        self.next_token();
        if !is_comparison_operator(self.cur_token.token_type) {
            self.add_error(format!(
                "expected a comparison operator in filter, got {}",
                self.cur_token.token_type.as_str()
            ));
            return None;
        }
        let operator = self.cur_token.literal.clone();
        self.next_token();
        let value = render_token(&self.cur_token);
        Some(FilterExpression {
            variable,
            operator,
            value,
        })
    }

    // =========================================================================
    // BREAK / CONTINUE
    // =========================================================================

    pub(crate) fn parse_break_statement(&mut self) -> Option<BreakStatement> {
        let token = self.cur_token.clone();
        let mut condition = String::new();
        if self.peek_is(TokenType::When) || self.peek_is(TokenType::If) {
            self.next_token();
            condition = self.read_condition_to_line_end();
        }
        Some(BreakStatement { token, condition })
    }

    pub(crate) fn parse_continue_statement(&mut self) -> Option<ContinueStatement> {
        let token = self.cur_token.clone();
        let mut condition = String::new();
        if self.peek_is(TokenType::When) || self.peek_is(TokenType::If) {
            self.next_token();
            condition = self.read_condition_to_line_end();
        }
        Some(ContinueStatement { token, condition })
    }

    // =========================================================================
    // TRY / CATCH / FINALLY
    // =========================================================================

    pub(crate) fn parse_try_statement(&mut self) -> Option<TryStatement> {
        let token = self.cur_token.clone();
        if !self.expect_peek(TokenType::Colon) {
            return None;
        }
        let body = self.parse_block_body();

        let mut catch_clauses = Vec::new();
        while self.peek_is(TokenType::Catch) {
            self.next_token();
            let catch_token = self.cur_token.clone();
            let mut error_type = String::new();
            let mut error_variable = String::new();
            if is_name_token(&self.peek_token) && !self.peek_is(TokenType::As) {
                self.next_token();
                error_type = self.cur_token.literal.clone();
            }
            if self.peek_is(TokenType::As) {
                self.next_token();
                if !self.expect_peek(TokenType::Variable) {
                    return None;
                }
                let variable = self.cur_token.clone();
                self.check_reserved_variable(&variable);
                error_variable = variable.literal;
            }
            if !self.expect_peek(TokenType::Colon) {
                return None;
            }
            let catch_body = self.parse_block_body();
            catch_clauses.push(CatchClause {
                token: catch_token,
                error_type,
                error_variable,
                body: catch_body,
            });
        }

        let mut finally_body = Vec::new();
        if self.peek_is(TokenType::Finally) {
            self.next_token();
            if self.expect_peek(TokenType::Colon) {
                finally_body = self.parse_block_body();
            }
        }

        Some(TryStatement {
            token,
            body,
            catch_clauses,
            finally_body,
        })
    }

    /// throw "message" | rethrow | ignore
    pub(crate) fn parse_throw_statement(&mut self) -> Option<ThrowStatement> {
        let token = self.cur_token.clone();
        let action = token.literal.clone();
        let mut message = String::new();
        match token.token_type {
            TokenType::Throw => {
                if self.peek_is(TokenType::String) {
                    self.next_token();
                    message = self.cur_token.literal.clone();
                }
            }
            TokenType::Rethrow | TokenType::Ignore => {}
            _ => {
                self.add_error(format!("unknown throw action '{action}'"));
                return None;
            }
        }
        Some(ThrowStatement {
            token,
            action,
            message,
        })
    }

    // =========================================================================
    // DETECTION
    // =========================================================================

    /// detect "tool" as $var  |  detect available docker or podman as $var
    pub(crate) fn parse_detect_statement(&mut self) -> Option<DetectionStatement> {
        let token = self.cur_token.clone();
        let mut statement = DetectionStatement {
            token,
            kind: String::new(),
            target: String::new(),
            alternatives: Vec::new(),
            condition: String::new(),
            value: String::new(),
            capture_variable: String::new(),
            body: Vec::new(),
            else_body: Vec::new(),
        };

        if self.peek_is(TokenType::Available) {
            statement.kind = "detect_available".to_string();
            self.next_token();
            if !is_name_token(&self.peek_token) && !self.peek_is(TokenType::String) {
                self.peek_error(TokenType::Ident);
                return None;
            }
            self.next_token();
            statement.target = self.cur_token.literal.clone();
            while self.peek_is(TokenType::Or) {
                self.next_token();
                if is_name_token(&self.peek_token) || self.peek_is(TokenType::String) {
                    self.next_token();
                    statement.alternatives.push(self.cur_token.literal.clone());
                } else {
                    self.peek_error(TokenType::Ident);
                    break;
                }
            }
        } else {
            statement.kind = "detect".to_string();
            if !is_name_token(&self.peek_token) && !self.peek_is(TokenType::String) {
                self.peek_error(TokenType::Ident);
                return None;
            }
            self.next_token();
            statement.target = self.cur_token.literal.clone();
        }

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

    /// if <tool> is available: …  |  if <tool> version >= "N": …
    pub(crate) fn parse_if_detection(&mut self) -> Option<DetectionStatement> {
        let token = self.cur_token.clone();
        self.next_token();
        let target = self.cur_token.literal.clone();

        let mut statement = DetectionStatement {
            token,
            kind: String::new(),
            target,
            alternatives: Vec::new(),
            condition: String::new(),
            value: String::new(),
            capture_variable: String::new(),
            body: Vec::new(),
            else_body: Vec::new(),
        };

        match self.peek_token.token_type {
            TokenType::Is => {
                statement.kind = "if_available".to_string();
                self.next_token();
                let mut negated = false;
                if self.peek_is(TokenType::Not) {
                    self.next_token();
                    negated = true;
                }
                if !self.expect_peek(TokenType::Available) {
                    return None;
                }
                statement.condition = if negated {
                    "not available".to_string()
                } else {
                    "available".to_string()
                };
            }
            TokenType::Version => {
                statement.kind = "if_version".to_string();
                self.next_token();
                self.next_token();
                if !is_comparison_operator(self.cur_token.token_type) {
                    self.add_error(format!(
                        "expected a comparison operator in version check, got {}",
                        self.cur_token.token_type.as_str()
                    ));
                    return None;
                }
                statement.condition = self.cur_token.literal.clone();
                if !self.expect_peek(TokenType::String) {
                    return None;
                }
                statement.value = self.cur_token.literal.clone();
            }
            _ => {
                self.add_error(format!(
                    "expected availability or version check after '{}'",
                    statement.target
                ));
                return None;
            }
        }

        if !self.expect_peek(TokenType::Colon) {
            return None;
        }
        statement.body = self.parse_block_body();
        if self.peek_is(TokenType::Else) {
            self.next_token();
            if self.expect_peek(TokenType::Colon) {
                statement.else_body = self.parse_block_body();
            }
        }
        Some(statement)
    }

    /// when in ci environment: … otherwise: …
    pub(crate) fn parse_when_environment(&mut self) -> Option<DetectionStatement> {
        let token = self.cur_token.clone();
        self.next_token(); // in
        if !is_name_token(&self.peek_token) && !self.peek_is(TokenType::String) {
            self.peek_error(TokenType::Ident);
            return None;
        }
        self.next_token();
        let target = self.cur_token.literal.clone();
        if self.peek_is(TokenType::Environment) {
            self.next_token();
        }

        let mut statement = DetectionStatement {
            token,
            kind: "when_environment".to_string(),
            target,
            alternatives: Vec::new(),
            condition: String::new(),
            value: String::new(),
            capture_variable: String::new(),
            body: Vec::new(),
            else_body: Vec::new(),
        };

        if !self.expect_peek(TokenType::Colon) {
            return None;
        }
        statement.body = self.parse_block_body();
        if self.peek_is(TokenType::Otherwise) {
            self.next_token();
            if self.expect_peek(TokenType::Colon) {
                statement.else_body = self.parse_block_body();
            }
        }
        Some(statement)
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

    #[test]
    fn test_if_else() {
        let body = body_of(
            "version: 2.0\ntask \"t\":\n  if $env == \"prod\":\n    info \"careful\"\n  else:\n    info \"relax\"\n",
        );
        match &body[0] {
            Statement::Conditional(c) => {
                assert_eq!(c.kind, "if");
                assert_eq!(c.condition, "$env == \"prod\"");
                assert_eq!(c.body.len(), 1);
                assert_eq!(c.else_body.len(), 1);
            }
            other => panic!("expected conditional, got {other:?}"),
        }
    }

    #[test]
    fn test_elseif_nests_in_else_body() {
        let body = body_of(
            "version: 2.0\ntask \"t\":\n  if $n > 10:\n    info \"big\"\n  else if $n > 5:\n    info \"medium\"\n  else:\n    info \"small\"\n",
        );
        match &body[0] {
            Statement::Conditional(outer) => {
                assert_eq!(outer.else_body.len(), 1);
                match &outer.else_body[0] {
                    Statement::Conditional(inner) => {
                        assert_eq!(inner.kind, "if");
                        assert_eq!(inner.condition, "$n > 5");
                        assert_eq!(inner.else_body.len(), 1);
                    }
                    other => panic!("expected nested if, got {other:?}"),
                }
            }
            other => panic!("expected conditional, got {other:?}"),
        }
    }

    #[test]
    fn test_when_otherwise() {
        let body = body_of(
            "version: 2.0\ntask \"t\":\n  when $mode is \"fast\":\n    info \"zoom\"\n  otherwise:\n    info \"stroll\"\n",
        );
        match &body[0] {
            Statement::Conditional(c) => {
                assert_eq!(c.kind, "when");
                assert_eq!(c.condition, "$mode is \"fast\"");
                assert_eq!(c.else_body.len(), 1);
            }
            other => panic!("expected conditional, got {other:?}"),
        }
    }

    #[test]
    fn test_matrix_loop() {
        let body = body_of(
            "version: 2.0\ntask \"matrix\":\n  for each $region in [\"us\",\"eu\"] in parallel:\n    for each $svc in [\"api\",\"web\"]:\n      step \"deploy {$svc} to {$region}\"\n",
        );
        match &body[0] {
            Statement::Loop(outer) => {
                assert_eq!(outer.loop_type, "each");
                assert_eq!(outer.variable, "$region");
                assert_eq!(outer.iterable, "[us, eu]");
                assert!(outer.parallel);
                assert_eq!(outer.body.len(), 1);
                match &outer.body[0] {
                    Statement::Loop(inner) => {
                        assert_eq!(inner.variable, "$svc");
                        assert_eq!(inner.iterable, "[api, web]");
                        assert!(!inner.parallel);
                        match &inner.body[0] {
                            Statement::Action(a) => {
                                assert_eq!(a.action, "step");
                                assert_eq!(a.message, "deploy {$svc} to {$region}");
                            }
                            other => panic!("expected action, got {other:?}"),
                        }
                    }
                    other => panic!("expected inner loop, got {other:?}"),
                }
            }
            other => panic!("expected loop, got {other:?}"),
        }
    }

    #[test]
    fn test_range_loop_with_step() {
        let body = body_of(
            "version: 2.0\ntask \"t\":\n  for $i in range 0 to 10 step 2:\n    info \"tick\"\n",
        );
        match &body[0] {
            Statement::Loop(l) => {
                assert_eq!(l.loop_type, "range");
                assert_eq!(l.range_start, "0");
                assert_eq!(l.range_end, "10");
                assert_eq!(l.range_step, "2");
            }
            other => panic!("expected loop, got {other:?}"),
        }
    }

    #[test]
    fn test_line_and_match_loops() {
        let body = body_of(
            "version: 2.0\ntask \"t\":\n  for each line $l in file \"hosts.txt\":\n    info \"host\"\n  for each match $m in pattern \"^v[0-9]+\":\n    info \"tag\"\n",
        );
        match &body[0] {
            Statement::Loop(l) => {
                assert_eq!(l.loop_type, "line");
                assert_eq!(l.iterable, "hosts.txt");
            }
            other => panic!("expected loop, got {other:?}"),
        }
        match &body[1] {
            Statement::Loop(l) => {
                assert_eq!(l.loop_type, "match");
                assert_eq!(l.iterable, "^v[0-9]+");
            }
            other => panic!("expected loop, got {other:?}"),
        }
    }

    #[test]
    fn test_loop_filter_and_worker_options() {
        let body = body_of(
            "version: 2.0\ntask \"t\":\n  for each $f in $files where $f != \"skip\" in parallel with max 4 workers fail fast:\n    info \"work\"\n",
        );
        match &body[0] {
            Statement::Loop(l) => {
                let filter = l.filter.as_ref().expect("filter");
                assert_eq!(filter.variable, "$f");
                assert_eq!(filter.operator, "!=");
                assert_eq!(filter.value, "\"skip\"");
                assert!(l.parallel);
                assert_eq!(l.max_workers, Some(4));
                assert!(l.fail_fast);
            }
            other => panic!("expected loop, got {other:?}"),
        }
    }

    #[test]
    fn test_break_continue_with_conditions() {
        let body = body_of(
            "version: 2.0\ntask \"t\":\n  for each $x in $xs:\n    break when $x == \"stop\"\n    continue if $x == \"skip\"\n    break\n",
        );
        match &body[0] {
            Statement::Loop(l) => {
                match &l.body[0] {
                    Statement::Break(b) => assert_eq!(b.condition, "$x == \"stop\""),
                    other => panic!("expected break, got {other:?}"),
                }
                match &l.body[1] {
                    Statement::Continue(c) => assert_eq!(c.condition, "$x == \"skip\""),
                    other => panic!("expected continue, got {other:?}"),
                }
                match &l.body[2] {
                    Statement::Break(b) => assert!(b.condition.is_empty()),
                    other => panic!("expected break, got {other:?}"),
                }
            }
            other => panic!("expected loop, got {other:?}"),
        }
    }

    #[test]
    fn test_try_catch_finally() {
        let body = body_of(
            "version: 2.0\ntask \"t\":\n  try:\n    run \"deploy.sh\"\n  catch network_error as $err:\n    warn \"retrying\"\n  catch:\n    fail \"gave up\"\n  finally:\n    info \"done\"\n",
        );
        match &body[0] {
            Statement::Try(t) => {
                assert_eq!(t.body.len(), 1);
                assert_eq!(t.catch_clauses.len(), 2);
                assert_eq!(t.catch_clauses[0].error_type, "network_error");
                assert_eq!(t.catch_clauses[0].error_variable, "$err");
                assert!(t.catch_clauses[1].error_type.is_empty());
                assert_eq!(t.finally_body.len(), 1);
            }
            other => panic!("expected try, got {other:?}"),
        }
    }

    #[test]
    fn test_throw_family() {
        let body = body_of(
            "version: 2.0\ntask \"t\":\n  try:\n    throw \"boom\"\n  catch:\n    rethrow\n",
        );
        match &body[0] {
            Statement::Try(t) => {
                match &t.body[0] {
                    Statement::Throw(th) => {
                        assert_eq!(th.action, "throw");
                        assert_eq!(th.message, "boom");
                    }
                    other => panic!("expected throw, got {other:?}"),
                }
                match &t.catch_clauses[0].body[0] {
                    Statement::Throw(th) => assert_eq!(th.action, "rethrow"),
                    other => panic!("expected rethrow, got {other:?}"),
                }
            }
            other => panic!("expected try, got {other:?}"),
        }
    }

    #[test]
    fn test_if_tool_available_detection() {
        let body = body_of(
            "version: 2.0\ntask \"t\":\n  if docker is available:\n    info \"containers\"\n  else:\n    warn \"no docker\"\n",
        );
        match &body[0] {
            Statement::Detection(d) => {
                assert_eq!(d.kind, "if_available");
                assert_eq!(d.target, "docker");
                assert_eq!(d.condition, "available");
                assert_eq!(d.body.len(), 1);
                assert_eq!(d.else_body.len(), 1);
            }
            other => panic!("expected detection, got {other:?}"),
        }
    }

    #[test]
    fn test_if_tool_not_available() {
        let body = body_of(
            "version: 2.0\ntask \"t\":\n  if kubectl is not available:\n    fail \"need kubectl\"\n",
        );
        match &body[0] {
            Statement::Detection(d) => {
                assert_eq!(d.condition, "not available");
            }
            other => panic!("expected detection, got {other:?}"),
        }
    }

    #[test]
    fn test_if_version_detection() {
        let body = body_of(
            "version: 2.0\ntask \"t\":\n  if node version >= \"18\":\n    info \"modern\"\n",
        );
        match &body[0] {
            Statement::Detection(d) => {
                assert_eq!(d.kind, "if_version");
                assert_eq!(d.target, "node");
                assert_eq!(d.condition, ">=");
                assert_eq!(d.value, "18");
            }
            other => panic!("expected detection, got {other:?}"),
        }
    }

    #[test]
    fn test_detect_available_with_alternatives() {
        let body = body_of(
            "version: 2.0\ntask \"t\":\n  detect available docker or podman as $runtime\n",
        );
        match &body[0] {
            Statement::Detection(d) => {
                assert_eq!(d.kind, "detect_available");
                assert_eq!(d.target, "docker");
                assert_eq!(d.alternatives, vec!["podman"]);
                assert_eq!(d.capture_variable, "$runtime");
            }
            other => panic!("expected detection, got {other:?}"),
        }
    }

    #[test]
    fn test_when_in_environment() {
        let body = body_of(
            "version: 2.0\ntask \"t\":\n  when in ci environment:\n    info \"headless\"\n  otherwise:\n    info \"interactive\"\n",
        );
        match &body[0] {
            Statement::Detection(d) => {
                assert_eq!(d.kind, "when_environment");
                assert_eq!(d.target, "ci");
                assert_eq!(d.body.len(), 1);
                assert_eq!(d.else_body.len(), 1);
            }
            other => panic!("expected detection, got {other:?}"),
        }
    }
}
