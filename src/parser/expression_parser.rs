//! Expression Parser
//!
//! Expressions are a primary followed by any number of binary operators,
//! folded left-associative. There is deliberately no operator precedence:
//! the executor reads binary trees in source order.

use crate::ast::types::{
    ArrayLiteral, BinaryExpression, Expression, FunctionCallExpression, IdentifierExpression,
    LiteralExpression, SecretExpression,
};
use crate::parser::lexer::TokenType;
use crate::parser::parser::Parser;
use crate::parser::types::{is_binary_operator, is_keyword, render_token};

impl Parser {
    /// Parse an expression starting at the current token; leaves the current
    /// token on the last token of the expression.
    pub(crate) fn parse_expression(&mut self) -> Option<Expression> {
        let mut left = self.parse_primary_expression()?;
        while is_binary_operator(self.peek_token.token_type) {
            self.next_token();
            let token = self.cur_token.clone();
            let operator = self.cur_token.literal.clone();
            self.next_token();
            let right = self.parse_primary_expression()?;
            left = Expression::Binary(BinaryExpression {
                token,
                left: Box::new(left),
                operator,
                right: Box::new(right),
            });
        }
        Some(left)
    }

    pub(crate) fn parse_primary_expression(&mut self) -> Option<Expression> {
        let token = self.cur_token.clone();
        match self.cur_token.token_type {
            TokenType::String | TokenType::Number | TokenType::Boolean => {
                let value = token.literal.clone();
                Some(Expression::Literal(LiteralExpression { token, value }))
            }
            // `empty` means the empty string
            TokenType::Empty => Some(Expression::Literal(LiteralExpression {
                token,
                value: String::new(),
            })),
            TokenType::Variable => {
                let name = token.literal.clone();
                Some(Expression::Identifier(IdentifierExpression { token, name }))
            }
            TokenType::Secret => self.parse_secret_expression(),
            TokenType::LBracket => self.parse_array_literal(),
            TokenType::LBrace => {
                let value = self.read_brace_literal();
                Some(Expression::Literal(LiteralExpression { token, value }))
            }
            TokenType::Ident => {
                if self.peek_is(TokenType::LParen) {
                    self.parse_function_call()
                } else {
                    let name = token.literal.clone();
                    Some(Expression::Identifier(IdentifierExpression { token, name }))
                }
            }
            // bare keywords in value position read as plain names
            t if is_keyword(t) => {
                let name = token.literal.clone();
                Some(Expression::Identifier(IdentifierExpression { token, name }))
            }
            _ => {
                self.add_error(format!(
                    "unexpected token in expression: {}",
                    self.cur_token.token_type.as_str()
                ));
                None
            }
        }
    }

    /// [ e, e, … ]; a missing closing bracket is an "unterminated list"
    fn parse_array_literal(&mut self) -> Option<Expression> {
        let token = self.cur_token.clone();
        let mut elements = Vec::new();
        if self.peek_is(TokenType::RBracket) {
            self.next_token();
            return Some(Expression::Array(ArrayLiteral { token, elements }));
        }
        loop {
            self.next_token();
            if self.cur_is(TokenType::Eof) {
                self.add_error("unterminated list, expected ]".to_string());
                break;
            }
            if let Some(element) = self.parse_expression() {
                elements.push(element);
            }
            if self.peek_is(TokenType::Comma) {
                self.next_token();
                continue;
            }
            if self.peek_is(TokenType::RBracket) {
                self.next_token();
                break;
            }
            if self.peek_is(TokenType::Eof) || self.peek_is(TokenType::Newline) {
                self.add_error("unterminated list, expected ]".to_string());
                break;
            }
            self.peek_error(TokenType::RBracket);
            break;
        }
        Some(Expression::Array(ArrayLiteral { token, elements }))
    }

    /// `{…}` multi-token form, preserved verbatim including the braces
    pub(crate) fn read_brace_literal(&mut self) -> String {
        let mut depth = 1usize;
        let mut pieces: Vec<String> = Vec::new();
        loop {
            self.next_token();
            match self.cur_token.token_type {
                TokenType::LBrace => {
                    depth += 1;
                    pieces.push("{".to_string());
                }
                TokenType::RBrace => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                    pieces.push("}".to_string());
                }
                TokenType::Eof => {
                    self.add_error("unterminated brace expression".to_string());
                    break;
                }
                TokenType::Newline | TokenType::Comment | TokenType::MultilineComment => {}
                _ => pieces.push(render_token(&self.cur_token)),
            }
        }
        format!("{{{}}}", pieces.join(" "))
    }

    fn parse_function_call(&mut self) -> Option<Expression> {
        let token = self.cur_token.clone();
        let function = token.literal.clone();
        self.next_token(); // (
        let mut arguments = Vec::new();
        if self.peek_is(TokenType::RParen) {
            self.next_token();
        } else {
            loop {
                self.next_token();
                if let Some(argument) = self.parse_expression() {
                    arguments.push(argument);
                }
                if self.peek_is(TokenType::Comma) {
                    self.next_token();
                    continue;
                }
                if self.peek_is(TokenType::RParen) {
                    self.next_token();
                    break;
                }
                self.peek_error(TokenType::RParen);
                break;
            }
        }
        Some(Expression::FunctionCall(FunctionCallExpression {
            token,
            function,
            arguments,
        }))
    }

    /// secret "key" default <expr> in namespace "ns"
    fn parse_secret_expression(&mut self) -> Option<Expression> {
        let token = self.cur_token.clone();
        if !self.expect_peek(TokenType::String) {
            return None;
        }
        let key = self.cur_token.literal.clone();
        let mut default = None;
        if self.peek_is(TokenType::Default) {
            self.next_token();
            self.next_token();
            default = self.parse_primary_expression().map(Box::new);
        }
        let mut namespace = String::new();
        if self.peek_is(TokenType::In) {
            self.next_token();
            if self.expect_peek(TokenType::Namespace) && self.expect_peek(TokenType::String) {
                namespace = self.cur_token.literal.clone();
            }
        }
        Some(Expression::Secret(SecretExpression {
            token,
            key,
            default,
            namespace,
        }))
    }
}
