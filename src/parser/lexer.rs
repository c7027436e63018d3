//! Lexer for drun source files
//!
//! The lexer streams source text into tokens for the parser. It handles:
//! - The keyword lexicon (one spelling per token kind, one table for both)
//! - Significant indentation with INDENT/DEDENT synthesis
//! - Double-quoted strings with escapes and line continuation
//! - Line and block comments
//! - Position tracking (line, column, byte offset)
//!
//! The lexer never fails: unknown runes become ILLEGAL tokens and
//! unterminated strings or block comments are swallowed to end of input.

use std::collections::{HashMap, VecDeque};

use serde::Serialize;

/// Token kinds for the drun language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TokenType {
    // Special
    Illegal,
    Eof,

    // Literals
    Ident,
    String,
    Number,
    Boolean,
    Variable,

    // Layout
    Indent,
    Dedent,
    Newline,

    // Comments
    Comment,
    MultilineComment,

    // Comparison operators
    Gte, // >=
    Gt,  // >
    Lte, // <=
    Lt,  // <
    Eq,  // ==
    Ne,  // !=

    // Arithmetic operators
    Plus,
    Minus,
    Star,
    Slash,
    Equals,

    // Punctuation
    Colon,
    Comma,
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,

    // Project & task structure
    Version,
    Project,
    Task,
    Template,
    Means,
    Snippet,
    Snippets,
    Templates,
    Tasks,
    Use,
    Call,
    Include,
    Namespace,
    From,
    As,
    To,
    Set,
    On,
    Before,
    After,
    Any,
    Setup,
    Teardown,
    Drun,
    Drunhub,
    Shell,
    Config,
    Executable,
    Args,
    Environment,
    Windows,
    Linux,
    Macos,

    // Parameters
    Requires,
    Given,
    Accepts,
    Defaults,
    Between,
    And,
    Or,
    Matching,
    Pattern,
    Email,
    Format,
    Empty,
    StringType,
    NumberType,
    BooleanType,
    ListType,
    Of,

    // Dependencies
    Depends,
    Then,
    In,
    Parallel,

    // Actions
    Info,
    Step,
    Warn,
    Error,
    Success,
    Fail,
    Echo,

    // Shell operations
    Run,
    Exec,
    Capture,

    // Control flow
    When,
    If,
    Else,
    Otherwise,
    For,
    Each,
    Range,
    Where,
    Line,
    Match,
    Break,
    Continue,
    With,
    Max,
    Workers,
    Fast,

    // Error handling
    Try,
    Catch,
    Finally,
    Throw,
    Rethrow,
    Ignore,

    // Variable operations
    Let,
    Transform,

    // Detection
    Detect,
    Available,
    Is,
    Not,
    Ci,
    Local,
    Production,
    Staging,
    Development,

    // Tool names
    Docker,
    Git,
    Node,
    Npm,
    Yarn,
    Pnpm,
    Python,
    Pip,
    Go,
    Cargo,
    Kubectl,
    Helm,
    Terraform,
    Java,
    Maven,
    Gradle,
    Make,
    Curl,
    Wget,

    // Docker operations
    Container,
    Image,
    Build,
    Push,
    Pull,
    Tag,
    Remove,
    Start,
    Stop,
    Restart,
    Compose,
    Up,
    Down,
    Scale,

    // Git operations
    Branch,
    Commit,
    Clone,
    Checkout,
    Merge,
    Status,
    Log,
    Init,
    Add,
    Message,
    Remote,

    // HTTP & downloads
    Http,
    Request,
    Get,
    Post,
    Put,
    Patch,
    Head,
    Options,
    Header,
    Body,
    Auth,
    Bearer,
    Basic,
    TokenKw,
    Json,
    Accept,
    Content,
    Type,
    Timeout,
    Retry,
    Download,
    Extract,
    Archive,
    Overwrite,
    Allow,
    Execute,
    User,
    Group,

    // File operations
    Create,
    Copy,
    Move,
    Delete,
    Read,
    Write,
    Append,
    Backup,
    Check,
    File,
    Dir,
    Directory,
    Size,
    Exists,

    // Network
    Wait,
    Service,
    At,
    Ping,
    Test,
    Connection,
    Port,
    Health,
    Open,

    // Secrets
    Secret,
    Default,
}

impl TokenType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Illegal => "ILLEGAL",
            Self::Eof => "EOF",
            Self::Ident => "IDENT",
            Self::String => "STRING",
            Self::Number => "NUMBER",
            Self::Boolean => "BOOLEAN",
            Self::Variable => "VARIABLE",
            Self::Indent => "INDENT",
            Self::Dedent => "DEDENT",
            Self::Newline => "NEWLINE",
            Self::Comment => "COMMENT",
            Self::MultilineComment => "MULTILINE_COMMENT",
            Self::Gte => ">=",
            Self::Gt => ">",
            Self::Lte => "<=",
            Self::Lt => "<",
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Plus => "+",
            Self::Minus => "-",
            Self::Star => "*",
            Self::Slash => "/",
            Self::Equals => "=",
            Self::Colon => ":",
            Self::Comma => ",",
            Self::LParen => "(",
            Self::RParen => ")",
            Self::LBrace => "{",
            Self::RBrace => "}",
            Self::LBracket => "[",
            Self::RBracket => "]",
            Self::Version => "version",
            Self::Project => "project",
            Self::Task => "task",
            Self::Template => "template",
            Self::Means => "means",
            Self::Snippet => "snippet",
            Self::Snippets => "snippets",
            Self::Templates => "templates",
            Self::Tasks => "tasks",
            Self::Use => "use",
            Self::Call => "call",
            Self::Include => "include",
            Self::Namespace => "namespace",
            Self::From => "from",
            Self::As => "as",
            Self::To => "to",
            Self::Set => "set",
            Self::On => "on",
            Self::Before => "before",
            Self::After => "after",
            Self::Any => "any",
            Self::Setup => "setup",
            Self::Teardown => "teardown",
            Self::Drun => "drun",
            Self::Drunhub => "drunhub",
            Self::Shell => "shell",
            Self::Config => "config",
            Self::Executable => "executable",
            Self::Args => "args",
            Self::Environment => "environment",
            Self::Windows => "windows",
            Self::Linux => "linux",
            Self::Macos => "macos",
            Self::Requires => "requires",
            Self::Given => "given",
            Self::Accepts => "accepts",
            Self::Defaults => "defaults",
            Self::Between => "between",
            Self::And => "and",
            Self::Or => "or",
            Self::Matching => "matching",
            Self::Pattern => "pattern",
            Self::Email => "email",
            Self::Format => "format",
            Self::Empty => "empty",
            Self::StringType => "string",
            Self::NumberType => "number",
            Self::BooleanType => "boolean",
            Self::ListType => "list",
            Self::Of => "of",
            Self::Depends => "depends",
            Self::Then => "then",
            Self::In => "in",
            Self::Parallel => "parallel",
            Self::Info => "info",
            Self::Step => "step",
            Self::Warn => "warn",
            Self::Error => "error",
            Self::Success => "success",
            Self::Fail => "fail",
            Self::Echo => "echo",
            Self::Run => "run",
            Self::Exec => "exec",
            Self::Capture => "capture",
            Self::When => "when",
            Self::If => "if",
            Self::Else => "else",
            Self::Otherwise => "otherwise",
            Self::For => "for",
            Self::Each => "each",
            Self::Range => "range",
            Self::Where => "where",
            Self::Line => "line",
            Self::Match => "match",
            Self::Break => "break",
            Self::Continue => "continue",
            Self::With => "with",
            Self::Max => "max",
            Self::Workers => "workers",
            Self::Fast => "fast",
            Self::Try => "try",
            Self::Catch => "catch",
            Self::Finally => "finally",
            Self::Throw => "throw",
            Self::Rethrow => "rethrow",
            Self::Ignore => "ignore",
            Self::Let => "let",
            Self::Transform => "transform",
            Self::Detect => "detect",
            Self::Available => "available",
            Self::Is => "is",
            Self::Not => "not",
            Self::Ci => "ci",
            Self::Local => "local",
            Self::Production => "production",
            Self::Staging => "staging",
            Self::Development => "development",
            Self::Docker => "docker",
            Self::Git => "git",
            Self::Node => "node",
            Self::Npm => "npm",
            Self::Yarn => "yarn",
            Self::Pnpm => "pnpm",
            Self::Python => "python",
            Self::Pip => "pip",
            Self::Go => "go",
            Self::Cargo => "cargo",
            Self::Kubectl => "kubectl",
            Self::Helm => "helm",
            Self::Terraform => "terraform",
            Self::Java => "java",
            Self::Maven => "maven",
            Self::Gradle => "gradle",
            Self::Make => "make",
            Self::Curl => "curl",
            Self::Wget => "wget",
            Self::Container => "container",
            Self::Image => "image",
            Self::Build => "build",
            Self::Push => "push",
            Self::Pull => "pull",
            Self::Tag => "tag",
            Self::Remove => "remove",
            Self::Start => "start",
            Self::Stop => "stop",
            Self::Restart => "restart",
            Self::Compose => "compose",
            Self::Up => "up",
            Self::Down => "down",
            Self::Scale => "scale",
            Self::Branch => "branch",
            Self::Commit => "commit",
            Self::Clone => "clone",
            Self::Checkout => "checkout",
            Self::Merge => "merge",
            Self::Status => "status",
            Self::Log => "log",
            Self::Init => "init",
            Self::Add => "add",
            Self::Message => "message",
            Self::Remote => "remote",
            Self::Http => "http",
            Self::Request => "request",
            Self::Get => "get",
            Self::Post => "post",
            Self::Put => "put",
            Self::Patch => "patch",
            Self::Head => "head",
            Self::Options => "options",
            Self::Header => "header",
            Self::Body => "body",
            Self::Auth => "auth",
            Self::Bearer => "bearer",
            Self::Basic => "basic",
            Self::TokenKw => "token",
            Self::Json => "json",
            Self::Accept => "accept",
            Self::Content => "content",
            Self::Type => "type",
            Self::Timeout => "timeout",
            Self::Retry => "retry",
            Self::Download => "download",
            Self::Extract => "extract",
            Self::Archive => "archive",
            Self::Overwrite => "overwrite",
            Self::Allow => "allow",
            Self::Execute => "execute",
            Self::User => "user",
            Self::Group => "group",
            Self::Create => "create",
            Self::Copy => "copy",
            Self::Move => "move",
            Self::Delete => "delete",
            Self::Read => "read",
            Self::Write => "write",
            Self::Append => "append",
            Self::Backup => "backup",
            Self::Check => "check",
            Self::File => "file",
            Self::Dir => "dir",
            Self::Directory => "directory",
            Self::Size => "size",
            Self::Exists => "exists",
            Self::Wait => "wait",
            Self::Service => "service",
            Self::At => "at",
            Self::Ping => "ping",
            Self::Test => "test",
            Self::Connection => "connection",
            Self::Port => "port",
            Self::Health => "health",
            Self::Open => "open",
            Self::Secret => "secret",
            Self::Default => "default",
        }
    }
}

/// A token produced by the lexer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Token {
    pub token_type: TokenType,
    /// Textual content: quotes stripped and escapes decoded for STRING, the
    /// `$` sigil kept for VARIABLE
    pub literal: String,
    /// 1-based line of the first character
    pub line: usize,
    /// 1-based column of the first character, counted in chars
    pub column: usize,
    /// Byte offset of the first character
    pub position: usize,
}

impl Token {
    pub fn new(
        token_type: TokenType,
        literal: impl Into<String>,
        line: usize,
        column: usize,
        position: usize,
    ) -> Self {
        Self {
            token_type,
            literal: literal.into(),
            line,
            column,
            position,
        }
    }
}

lazy_static::lazy_static! {
    /// The keyword lexicon. The enumeration above and this table must agree
    /// exactly; adding a keyword touches both, in this file.
    static ref KEYWORDS: HashMap<&'static str, TokenType> = {
        let mut m = HashMap::new();
        for t in ALL_KEYWORDS {
            m.insert(t.as_str(), *t);
        }
        m
    };
}

/// Every keyword kind, used to build the lookup table
const ALL_KEYWORDS: &[TokenType] = &[
    TokenType::Version,
    TokenType::Project,
    TokenType::Task,
    TokenType::Template,
    TokenType::Means,
    TokenType::Snippet,
    TokenType::Snippets,
    TokenType::Templates,
    TokenType::Tasks,
    TokenType::Use,
    TokenType::Call,
    TokenType::Include,
    TokenType::Namespace,
    TokenType::From,
    TokenType::As,
    TokenType::To,
    TokenType::Set,
    TokenType::On,
    TokenType::Before,
    TokenType::After,
    TokenType::Any,
    TokenType::Setup,
    TokenType::Teardown,
    TokenType::Drun,
    TokenType::Drunhub,
    TokenType::Shell,
    TokenType::Config,
    TokenType::Executable,
    TokenType::Args,
    TokenType::Environment,
    TokenType::Windows,
    TokenType::Linux,
    TokenType::Macos,
    TokenType::Requires,
    TokenType::Given,
    TokenType::Accepts,
    TokenType::Defaults,
    TokenType::Between,
    TokenType::And,
    TokenType::Or,
    TokenType::Matching,
    TokenType::Pattern,
    TokenType::Email,
    TokenType::Format,
    TokenType::Empty,
    TokenType::StringType,
    TokenType::NumberType,
    TokenType::BooleanType,
    TokenType::ListType,
    TokenType::Of,
    TokenType::Depends,
    TokenType::Then,
    TokenType::In,
    TokenType::Parallel,
    TokenType::Info,
    TokenType::Step,
    TokenType::Warn,
    TokenType::Error,
    TokenType::Success,
    TokenType::Fail,
    TokenType::Echo,
    TokenType::Run,
    TokenType::Exec,
    TokenType::Capture,
    TokenType::When,
    TokenType::If,
    TokenType::Else,
    TokenType::Otherwise,
    TokenType::For,
    TokenType::Each,
    TokenType::Range,
    TokenType::Where,
    TokenType::Line,
    TokenType::Match,
    TokenType::Break,
    TokenType::Continue,
    TokenType::With,
    TokenType::Max,
    TokenType::Workers,
    TokenType::Fast,
    TokenType::Try,
    TokenType::Catch,
    TokenType::Finally,
    TokenType::Throw,
    TokenType::Rethrow,
    TokenType::Ignore,
    TokenType::Let,
    TokenType::Transform,
    TokenType::Detect,
    TokenType::Available,
    TokenType::Is,
    TokenType::Not,
    TokenType::Ci,
    TokenType::Local,
    TokenType::Production,
    TokenType::Staging,
    TokenType::Development,
    TokenType::Docker,
    TokenType::Git,
    TokenType::Node,
    TokenType::Npm,
    TokenType::Yarn,
    TokenType::Pnpm,
    TokenType::Python,
    TokenType::Pip,
    TokenType::Go,
    TokenType::Cargo,
    TokenType::Kubectl,
    TokenType::Helm,
    TokenType::Terraform,
    TokenType::Java,
    TokenType::Maven,
    TokenType::Gradle,
    TokenType::Make,
    TokenType::Curl,
    TokenType::Wget,
    TokenType::Container,
    TokenType::Image,
    TokenType::Build,
    TokenType::Push,
    TokenType::Pull,
    TokenType::Tag,
    TokenType::Remove,
    TokenType::Start,
    TokenType::Stop,
    TokenType::Restart,
    TokenType::Compose,
    TokenType::Up,
    TokenType::Down,
    TokenType::Scale,
    TokenType::Branch,
    TokenType::Commit,
    TokenType::Clone,
    TokenType::Checkout,
    TokenType::Merge,
    TokenType::Status,
    TokenType::Log,
    TokenType::Init,
    TokenType::Add,
    TokenType::Message,
    TokenType::Remote,
    TokenType::Http,
    TokenType::Request,
    TokenType::Get,
    TokenType::Post,
    TokenType::Put,
    TokenType::Patch,
    TokenType::Head,
    TokenType::Options,
    TokenType::Header,
    TokenType::Body,
    TokenType::Auth,
    TokenType::Bearer,
    TokenType::Basic,
    TokenType::TokenKw,
    TokenType::Json,
    TokenType::Accept,
    TokenType::Content,
    TokenType::Type,
    TokenType::Timeout,
    TokenType::Retry,
    TokenType::Download,
    TokenType::Extract,
    TokenType::Archive,
    TokenType::Overwrite,
    TokenType::Allow,
    TokenType::Execute,
    TokenType::User,
    TokenType::Group,
    TokenType::Create,
    TokenType::Copy,
    TokenType::Move,
    TokenType::Delete,
    TokenType::Read,
    TokenType::Write,
    TokenType::Append,
    TokenType::Backup,
    TokenType::Check,
    TokenType::File,
    TokenType::Dir,
    TokenType::Directory,
    TokenType::Size,
    TokenType::Exists,
    TokenType::Wait,
    TokenType::Service,
    TokenType::At,
    TokenType::Ping,
    TokenType::Test,
    TokenType::Connection,
    TokenType::Port,
    TokenType::Health,
    TokenType::Open,
    TokenType::Secret,
    TokenType::Default,
];

/// Look up the token kind for an identifier spelling
pub fn lookup_keyword(ident: &str) -> TokenType {
    if ident == "true" || ident == "false" {
        return TokenType::Boolean;
    }
    KEYWORDS.get(ident).copied().unwrap_or(TokenType::Ident)
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Lexer state. Single pass, not restartable; allocate one per parse.
pub struct Lexer {
    source: String,
    input: Vec<char>,
    pos: usize,
    byte_pos: usize,
    line: usize,
    column: usize,
    /// Stack of indentation column widths, 0 at the bottom
    indent_stack: Vec<usize>,
    /// Queued layout tokens and pushed-back look-ahead tokens
    pending: VecDeque<Token>,
    at_line_start: bool,
    eof_drained: bool,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Self {
            source: input.to_string(),
            input: input.chars().collect(),
            pos: 0,
            byte_pos: 0,
            line: 1,
            column: 1,
            indent_stack: vec![0],
            pending: VecDeque::new(),
            at_line_start: true,
            eof_drained: false,
        }
    }

    /// The original source text
    pub fn input(&self) -> &str {
        &self.source
    }

    /// Produce the next token, synthesizing INDENT/DEDENT at line starts
    pub fn next_token(&mut self) -> Token {
        if let Some(t) = self.pending.pop_front() {
            return t;
        }

        if self.at_line_start {
            self.handle_line_start();
            if let Some(t) = self.pending.pop_front() {
                return t;
            }
        }

        self.skip_inline_whitespace();

        let (line, column, position) = (self.line, self.column, self.byte_pos);
        let Some(c) = self.current() else {
            return self.drain_at_eof();
        };

        match c {
            '\n' => {
                self.advance_newline();
                self.at_line_start = true;
                Token::new(TokenType::Newline, "\n", line, column, position)
            }
            '#' => self.read_line_comment(line, column, position),
            '/' if self.peek_char(1) == Some('*') => {
                self.read_block_comment(line, column, position)
            }
            '"' => self.read_string(line, column, position),
            '$' => self.read_variable(line, column, position),
            c if c.is_ascii_digit() => self.read_number(line, column, position),
            c if is_ident_start(c) => self.read_identifier(line, column, position),
            _ => self.read_operator(line, column, position),
        }
    }

    /// One-token look-ahead without consuming; the token is buffered and
    /// handed back by the next `next_token` call. This is what the parser
    /// uses for the `check if port` disambiguation.
    pub fn peek_token(&mut self) -> Token {
        let t = self.next_token();
        self.pending.push_front(t.clone());
        t
    }

    /// Drain the whole input, final EOF token included
    pub fn all_tokens(mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let t = self.next_token();
            let done = t.token_type == TokenType::Eof;
            tokens.push(t);
            if done {
                break;
            }
        }
        tokens
    }

    // =========================================================================
    // CHARACTER PRIMITIVES
    // =========================================================================

    fn current(&self) -> Option<char> {
        self.input.get(self.pos).copied()
    }

    fn peek_char(&self, offset: usize) -> Option<char> {
        self.input.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.current();
        if let Some(c) = c {
            self.pos += 1;
            self.byte_pos += c.len_utf8();
            self.column += 1;
        }
        c
    }

    fn advance_newline(&mut self) {
        self.pos += 1;
        self.byte_pos += 1;
        self.line += 1;
        self.column = 1;
    }

    fn skip_inline_whitespace(&mut self) {
        while matches!(self.current(), Some(' ') | Some('\t') | Some('\r')) {
            self.advance();
        }
    }

    // =========================================================================
    // INDENTATION
    // =========================================================================

    /// Measure leading whitespace at a line start and queue INDENT/DEDENT
    /// tokens. Blank lines and comment-only lines leave the stack alone.
    fn handle_line_start(&mut self) {
        self.at_line_start = false;

        let mut width = 0;
        while matches!(self.current(), Some(' ') | Some('\t') | Some('\r')) {
            width += 1;
            self.advance();
        }

        match self.current() {
            None | Some('\n') | Some('#') => return,
            Some('/') if self.peek_char(1) == Some('*') => return,
            _ => {}
        }

        let top = self.indent_stack.last().copied().unwrap_or(0);
        if width > top {
            self.indent_stack.push(width);
            self.pending.push_back(Token::new(
                TokenType::Indent,
                "",
                self.line,
                self.column,
                self.byte_pos,
            ));
        } else if width < top {
            // Pop to the nearest smaller-or-equal width. An inconsistent
            // dedent lands on the nearest level without complaint.
            while self.indent_stack.last().map_or(false, |&w| w > width) {
                self.indent_stack.pop();
                self.pending.push_back(Token::new(
                    TokenType::Dedent,
                    "",
                    self.line,
                    self.column,
                    self.byte_pos,
                ));
            }
        }
    }

    /// At end of input, close every open indentation level before EOF
    fn drain_at_eof(&mut self) -> Token {
        if !self.eof_drained {
            self.eof_drained = true;
            while self.indent_stack.last().map_or(false, |&w| w > 0) {
                self.indent_stack.pop();
                self.pending.push_back(Token::new(
                    TokenType::Dedent,
                    "",
                    self.line,
                    self.column,
                    self.byte_pos,
                ));
            }
            if let Some(t) = self.pending.pop_front() {
                return t;
            }
        }
        Token::new(TokenType::Eof, "", self.line, self.column, self.byte_pos)
    }

    // =========================================================================
    // TOKEN READERS
    // =========================================================================

    fn read_line_comment(&mut self, line: usize, column: usize, position: usize) -> Token {
        self.advance(); // '#'
        let mut text = String::new();
        while let Some(c) = self.current() {
            if c == '\n' {
                break;
            }
            text.push(c);
            self.advance();
        }
        Token::new(TokenType::Comment, text, line, column, position)
    }

    /// Block comment `/* … */`. Unterminated comments absorb the rest of the
    /// file; that is deliberate and covered by tests.
    fn read_block_comment(&mut self, line: usize, column: usize, position: usize) -> Token {
        self.advance(); // '/'
        self.advance(); // '*'
        let mut text = String::new();
        loop {
            match self.current() {
                None => break,
                Some('*') if self.peek_char(1) == Some('/') => {
                    self.advance();
                    self.advance();
                    break;
                }
                Some('\n') => {
                    text.push('\n');
                    self.advance_newline();
                }
                Some(c) => {
                    text.push(c);
                    self.advance();
                }
            }
        }
        Token::new(TokenType::MultilineComment, text, line, column, position)
    }

    /// Double-quoted string. Escapes are decoded here; a backslash before a
    /// newline erases the newline and any indentation that follows it. An
    /// unterminated string runs to end of input.
    fn read_string(&mut self, line: usize, column: usize, position: usize) -> Token {
        self.advance(); // opening quote
        let mut value = String::new();
        loop {
            match self.current() {
                None => break,
                Some('"') => {
                    self.advance();
                    break;
                }
                Some('\\') => match self.peek_char(1) {
                    Some('"') => {
                        value.push('"');
                        self.advance();
                        self.advance();
                    }
                    Some('\\') => {
                        value.push('\\');
                        self.advance();
                        self.advance();
                    }
                    Some('n') => {
                        value.push('\n');
                        self.advance();
                        self.advance();
                    }
                    Some('t') => {
                        value.push('\t');
                        self.advance();
                        self.advance();
                    }
                    Some('\n') => {
                        // Line continuation: drop the newline and the
                        // indentation of the continuation line
                        self.advance();
                        self.advance_newline();
                        while matches!(self.current(), Some(' ') | Some('\t')) {
                            self.advance();
                        }
                    }
                    _ => {
                        value.push('\\');
                        self.advance();
                    }
                },
                Some('\n') => {
                    value.push('\n');
                    self.advance_newline();
                }
                Some(c) => {
                    value.push(c);
                    self.advance();
                }
            }
        }
        Token::new(TokenType::String, value, line, column, position)
    }

    /// `$` followed by identifier characters; the sigil is part of the
    /// literal. Dotted access (`$globals.key`) keeps the dots.
    fn read_variable(&mut self, line: usize, column: usize, position: usize) -> Token {
        self.advance(); // '$'
        let mut name = String::from("$");
        while let Some(c) = self.current() {
            if is_ident_char(c) {
                name.push(c);
                self.advance();
            } else if c == '.' && self.peek_char(1).map_or(false, is_ident_char) {
                name.push('.');
                self.advance();
            } else {
                break;
            }
        }
        if name.len() == 1 {
            return Token::new(TokenType::Illegal, "$", line, column, position);
        }
        Token::new(TokenType::Variable, name, line, column, position)
    }

    fn read_number(&mut self, line: usize, column: usize, position: usize) -> Token {
        let mut text = String::new();
        while let Some(c) = self.current() {
            if c.is_ascii_digit() {
                text.push(c);
                self.advance();
            } else {
                break;
            }
        }
        if self.current() == Some('.') && self.peek_char(1).map_or(false, |c| c.is_ascii_digit()) {
            text.push('.');
            self.advance();
            while let Some(c) = self.current() {
                if c.is_ascii_digit() {
                    text.push(c);
                    self.advance();
                } else {
                    break;
                }
            }
        }
        Token::new(TokenType::Number, text, line, column, position)
    }

    fn read_identifier(&mut self, line: usize, column: usize, position: usize) -> Token {
        let mut text = String::new();
        while let Some(c) = self.current() {
            if is_ident_char(c) {
                text.push(c);
                self.advance();
            } else {
                break;
            }
        }
        let token_type = lookup_keyword(&text);
        Token::new(token_type, text, line, column, position)
    }

    fn read_operator(&mut self, line: usize, column: usize, position: usize) -> Token {
        let c = self.advance().unwrap_or('\0');
        let two = match (c, self.current()) {
            ('>', Some('=')) => Some(TokenType::Gte),
            ('<', Some('=')) => Some(TokenType::Lte),
            ('=', Some('=')) => Some(TokenType::Eq),
            ('!', Some('=')) => Some(TokenType::Ne),
            _ => None,
        };
        if let Some(token_type) = two {
            self.advance();
            return Token::new(token_type, token_type.as_str(), line, column, position);
        }
        let token_type = match c {
            '+' => TokenType::Plus,
            '-' => TokenType::Minus,
            '*' => TokenType::Star,
            '/' => TokenType::Slash,
            '=' => TokenType::Equals,
            '>' => TokenType::Gt,
            '<' => TokenType::Lt,
            ':' => TokenType::Colon,
            ',' => TokenType::Comma,
            '(' => TokenType::LParen,
            ')' => TokenType::RParen,
            '{' => TokenType::LBrace,
            '}' => TokenType::RBrace,
            '[' => TokenType::LBracket,
            ']' => TokenType::RBracket,
            other => {
                return Token::new(
                    TokenType::Illegal,
                    other.to_string(),
                    line,
                    column,
                    position,
                );
            }
        };
        Token::new(token_type, token_type.as_str(), line, column, position)
    }
}
