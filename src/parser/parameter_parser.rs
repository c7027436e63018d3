//! Parameter & Dependency Parser
//!
//! Handles requires/given/accepts declarations with their type, constraint,
//! default, range, and pattern clauses, and `depends on` dependency groups.

use crate::ast::types::{DependencyGroup, DependencyItem, ParameterKind, ParameterStatement};
use crate::parser::lexer::TokenType;
use crate::parser::parser::Parser;
use crate::parser::types::is_name_token;

impl Parser {
    /// (requires|given|accepts) $name (as <type>)? (from [..])?
    /// (defaults to <value>)? (between N and M)? (matching …)?
    ///
    /// Clauses may appear in any order after the name. The parameter name is
    /// stored without its `$` sigil.
    pub(crate) fn parse_parameter_statement(&mut self) -> Option<ParameterStatement> {
        let token = self.cur_token.clone();
        let kind = match self.cur_token.token_type {
            TokenType::Requires => ParameterKind::Requires,
            TokenType::Given => ParameterKind::Given,
            TokenType::Accepts => ParameterKind::Accepts,
            _ => return None,
        };

        if !self.expect_peek(TokenType::Variable) {
            return None;
        }
        let name_token = self.cur_token.clone();
        self.check_reserved_variable(&name_token);
        let name = name_token.literal.trim_start_matches('$').to_string();

        let mut parameter = ParameterStatement {
            token,
            kind,
            name,
            default_value: String::new(),
            has_default: false,
            constraints: Vec::new(),
            data_type: "string".to_string(),
            required: kind == ParameterKind::Requires,
            variadic: false,
            min_value: None,
            max_value: None,
            pattern: String::new(),
            pattern_macro: String::new(),
            email_format: false,
        };

        loop {
            match self.peek_token.token_type {
                TokenType::As => {
                    self.next_token();
                    self.parse_parameter_type(&mut parameter);
                }
                TokenType::From => {
                    self.next_token();
                    if self.expect_peek(TokenType::LBracket) {
                        parameter.constraints = self.parse_string_list();
                    }
                }
                TokenType::Defaults => {
                    self.next_token();
                    if self.expect_peek(TokenType::To) {
                        if let Some(value) = self.parse_default_value() {
                            parameter.default_value = value;
                            parameter.has_default = true;
                        }
                    }
                }
                TokenType::Between => {
                    self.next_token();
                    if self.expect_peek(TokenType::Number) {
                        parameter.min_value = self.parse_numeric_literal();
                    }
                    if self.expect_peek(TokenType::And) && self.expect_peek(TokenType::Number) {
                        parameter.max_value = self.parse_numeric_literal();
                    }
                }
                TokenType::Matching => {
                    self.next_token();
                    self.parse_pattern_constraint(&mut parameter);
                }
                _ => break,
            }
        }

        if kind == ParameterKind::Given && !parameter.has_default {
            self.add_error_at(
                &parameter.token,
                format!("given parameter '${}' requires a default value", parameter.name),
            );
        }
        if parameter.has_default
            && !parameter.constraints.is_empty()
            && !parameter.constraints.contains(&parameter.default_value)
        {
            self.add_error_at(
                &parameter.token,
                format!(
                    "default value '{}' must be one of the allowed values: [{}]",
                    parameter.default_value,
                    parameter.constraints.join(", ")
                ),
            );
        }

        Some(parameter)
    }

    /// as string|number|boolean|list (of <type>)?; lists are variadic
    fn parse_parameter_type(&mut self, parameter: &mut ParameterStatement) {
        self.next_token();
        match self.cur_token.token_type {
            TokenType::StringType | TokenType::NumberType | TokenType::BooleanType => {
                parameter.data_type = self.cur_token.literal.clone();
            }
            TokenType::ListType => {
                parameter.data_type = "list".to_string();
                parameter.variadic = true;
                if self.peek_is(TokenType::Of) {
                    self.next_token();
                    self.next_token();
                    parameter.data_type = format!("list of {}", self.cur_token.literal);
                }
            }
            _ => {
                self.add_error(format!(
                    "expected a parameter type, got {}",
                    self.cur_token.token_type.as_str()
                ));
            }
        }
    }

    fn parse_pattern_constraint(&mut self, parameter: &mut ParameterStatement) {
        match self.peek_token.token_type {
            TokenType::Pattern => {
                self.next_token();
                if self.expect_peek(TokenType::String) {
                    parameter.pattern = self.cur_token.literal.clone();
                }
            }
            TokenType::Email => {
                self.next_token();
                if self.peek_is(TokenType::Format) {
                    self.next_token();
                }
                parameter.email_format = true;
            }
            // a bare name selects a predefined pattern (semver, uuid, …);
            // names are not validated here, the executor resolves them
            TokenType::Ident => {
                self.next_token();
                parameter.pattern_macro = self.cur_token.literal.clone();
            }
            _ => {
                self.next_token();
                self.add_error(format!(
                    "expected pattern, email, or a pattern name after 'matching', got {}",
                    self.cur_token.token_type.as_str()
                ));
            }
        }
    }

    /// STRING, NUMBER, BOOLEAN, `empty`, or an opaque brace form
    fn parse_default_value(&mut self) -> Option<String> {
        self.next_token();
        match self.cur_token.token_type {
            TokenType::String | TokenType::Number | TokenType::Boolean => {
                Some(self.cur_token.literal.clone())
            }
            TokenType::Empty => Some(String::new()),
            TokenType::LBrace => Some(self.read_brace_literal()),
            _ => {
                self.add_error(format!(
                    "expected a default value, got {}",
                    self.cur_token.token_type.as_str()
                ));
                None
            }
        }
    }

    fn parse_numeric_literal(&mut self) -> Option<f64> {
        match self.cur_token.literal.parse::<f64>() {
            Ok(n) => Some(n),
            Err(_) => {
                self.add_error(format!("invalid number '{}'", self.cur_token.literal));
                None
            }
        }
    }

    /// [ "a", "b", … ] with the current token on the opening bracket. An
    /// unclosed list is an error rather than a silent stop.
    pub(crate) fn parse_string_list(&mut self) -> Vec<String> {
        let mut items = Vec::new();
        if self.peek_is(TokenType::RBracket) {
            self.next_token();
            return items;
        }
        loop {
            self.next_token();
            match self.cur_token.token_type {
                TokenType::String | TokenType::Number | TokenType::Boolean | TokenType::Ident => {
                    items.push(self.cur_token.literal.clone());
                }
                TokenType::Eof => {
                    self.add_error("unterminated list, expected ]".to_string());
                    return items;
                }
                _ => {
                    self.add_error(format!(
                        "unexpected token in list: {}",
                        self.cur_token.token_type.as_str()
                    ));
                }
            }
            if self.peek_is(TokenType::Comma) {
                self.next_token();
                continue;
            }
            if self.peek_is(TokenType::RBracket) {
                self.next_token();
                return items;
            }
            self.add_error("unterminated list, expected ]".to_string());
            return items;
        }
    }

    /// depends on A, B  (parallel group)  |  depends on A and B  (sequential)
    ///
    /// `then` also reads as sequential; an item may carry an `in parallel`
    /// annotation of its own. Each `depends on` line is one group.
    pub(crate) fn parse_dependency_group(&mut self) -> Option<DependencyGroup> {
        let token = self.cur_token.clone();
        if !self.expect_peek(TokenType::On) {
            return None;
        }
        let mut items = Vec::new();
        let mut sequential = false;
        loop {
            if !is_name_token(&self.peek_token) && !self.peek_is(TokenType::String) {
                self.peek_error(TokenType::Ident);
                break;
            }
            self.next_token();
            let name = self.cur_token.literal.clone();
            let mut parallel = false;
            if self.peek_is(TokenType::In) {
                self.next_token();
                if self.expect_peek(TokenType::Parallel) {
                    parallel = true;
                }
            }
            items.push(DependencyItem { name, parallel });
            match self.peek_token.token_type {
                TokenType::Comma => {
                    self.next_token();
                }
                TokenType::And | TokenType::Then => {
                    sequential = true;
                    self.next_token();
                }
                _ => break,
            }
        }
        Some(DependencyGroup {
            token,
            items,
            sequential,
        })
    }
}
