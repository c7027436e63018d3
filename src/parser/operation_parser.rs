//! Operation Statement Parser
//!
//! Docker, Git, HTTP, download, network, and secret statements. These share
//! a clause-driven shape: an operation keyword, an optional resource, an
//! optional name, then `<key> <value>` option pairs read while the look-ahead
//! still looks like an option.

use indexmap::IndexMap;

use crate::ast::types::{
    DockerStatement, DownloadStatement, GitStatement, HttpStatement, NetworkStatement,
    PermissionSpec, SecretStatement,
};
use crate::parser::lexer::TokenType;
use crate::parser::parser::Parser;
use crate::parser::types::{is_name_token, is_value_token};

impl Parser {
    // =========================================================================
    // DOCKER
    // =========================================================================

    /// docker <op> <resource> "name" <options>; also entered for the bare
    /// `run container …` form
    pub(crate) fn parse_docker_statement(&mut self) -> Option<DockerStatement> {
        let token = self.cur_token.clone();
        let mut operation = token.literal.clone();
        if self.cur_is(TokenType::Docker) {
            self.next_token();
            operation = self.cur_token.literal.clone();
        }

        let mut resource = String::new();
        let mut name = String::new();
        let mut options = IndexMap::new();

        if self.cur_is(TokenType::Compose) {
            operation = "compose".to_string();
            resource = "compose".to_string();
            if matches!(
                self.peek_token.token_type,
                TokenType::Up | TokenType::Down | TokenType::Build
            ) {
                self.next_token();
                options.insert("command".to_string(), self.cur_token.literal.clone());
            }
        } else {
            if self.peek_is(TokenType::Container) || self.peek_is(TokenType::Image) {
                self.next_token();
                resource = self.cur_token.literal.clone();
            }
            if self.peek_is(TokenType::String) {
                self.next_token();
                name = self.cur_token.literal.clone();
            }
        }

        self.parse_option_pairs(&mut options);
        Some(DockerStatement {
            token,
            operation,
            resource,
            name,
            options,
        })
    }

    // =========================================================================
    // GIT
    // =========================================================================

    /// git <op> …; also entered for `create branch` and `create tag`
    pub(crate) fn parse_git_statement(&mut self) -> Option<GitStatement> {
        let token = self.cur_token.clone();
        let mut operation = token.literal.clone();
        if self.cur_is(TokenType::Git) {
            self.next_token();
            operation = self.cur_token.literal.clone();
        }

        let mut resource = String::new();
        let mut name = String::new();
        if matches!(
            self.peek_token.token_type,
            TokenType::Branch | TokenType::Tag | TokenType::Remote
        ) {
            self.next_token();
            resource = self.cur_token.literal.clone();
        }
        if self.peek_is(TokenType::String) {
            self.next_token();
            name = self.cur_token.literal.clone();
        }

        let mut options = IndexMap::new();
        self.parse_option_pairs(&mut options);
        Some(GitStatement {
            token,
            operation,
            resource,
            name,
            options,
        })
    }

    /// Read `<key> <value>` pairs while the peek token is a bare name and
    /// the token behind it is a value. The second condition needs the
    /// lexer's look-ahead buffer.
    fn parse_option_pairs(&mut self, options: &mut IndexMap<String, String>) {
        loop {
            if !is_name_token(&self.peek_token) {
                return;
            }
            let value = self.peek_after();
            if !is_value_token(value.token_type) {
                return;
            }
            self.next_token();
            let key = self.cur_token.literal.clone();
            self.next_token();
            options.insert(key, self.cur_token.literal.clone());
        }
    }

    // =========================================================================
    // HTTP
    // =========================================================================

    /// <method> "url" with its modifier clauses; `http <method> "url"` and
    /// `http request to "url"` are equivalent spellings
    pub(crate) fn parse_http_statement(&mut self) -> Option<HttpStatement> {
        let token = self.cur_token.clone();
        let mut method = token.literal.clone();
        if self.cur_is(TokenType::Http) {
            self.next_token();
            method = self.cur_token.literal.clone();
        }
        if self.cur_is(TokenType::Request) && self.peek_is(TokenType::To) {
            self.next_token();
        }
        if !self.expect_peek(TokenType::String) {
            return None;
        }
        let url = self.cur_token.literal.clone();

        let mut statement = HttpStatement {
            token,
            method,
            url,
            headers: IndexMap::new(),
            body: String::new(),
            auth: IndexMap::new(),
            options: IndexMap::new(),
        };

        loop {
            match self.peek_token.token_type {
                TokenType::With => {
                    self.next_token();
                    self.parse_with_clause(
                        &mut statement.headers,
                        &mut statement.auth,
                        Some(&mut statement.body),
                    );
                }
                TokenType::Accept => {
                    self.next_token();
                    if self.peek_is(TokenType::Json) {
                        self.next_token();
                        statement
                            .options
                            .insert("accept".to_string(), "json".to_string());
                    }
                }
                TokenType::Content => {
                    self.next_token();
                    if self.expect_peek(TokenType::Type) && self.peek_is(TokenType::Json) {
                        self.next_token();
                        statement
                            .options
                            .insert("content_type".to_string(), "json".to_string());
                    }
                }
                TokenType::Timeout => {
                    self.next_token();
                    if self.expect_peek(TokenType::Number) {
                        statement
                            .options
                            .insert("timeout".to_string(), self.cur_token.literal.clone());
                    }
                }
                TokenType::Retry => {
                    self.next_token();
                    if self.expect_peek(TokenType::Number) {
                        statement
                            .options
                            .insert("retry".to_string(), self.cur_token.literal.clone());
                    }
                }
                _ => break,
            }
        }
        Some(statement)
    }

    /// with header "K: V" | with body <value> | with auth bearer <value>
    ///
    /// The current token is `with`. Download statements pass None for the
    /// body slot since they have no request body.
    fn parse_with_clause(
        &mut self,
        headers: &mut IndexMap<String, String>,
        auth: &mut IndexMap<String, String>,
        body: Option<&mut String>,
    ) {
        match self.peek_token.token_type {
            TokenType::Header => {
                self.next_token();
                if self.expect_peek(TokenType::String) {
                    let raw = self.cur_token.literal.clone();
                    match raw.split_once(':') {
                        Some((key, value)) => {
                            headers.insert(key.trim().to_string(), value.trim().to_string());
                        }
                        None => {
                            headers.insert(raw.trim().to_string(), String::new());
                        }
                    }
                }
            }
            TokenType::Body => {
                self.next_token();
                self.next_token();
                let value = match self.cur_token.token_type {
                    TokenType::String | TokenType::Variable => self.cur_token.literal.clone(),
                    TokenType::LBrace => self.read_brace_literal(),
                    _ => {
                        self.add_error(format!(
                            "expected a body value, got {}",
                            self.cur_token.token_type.as_str()
                        ));
                        return;
                    }
                };
                match body {
                    Some(slot) => *slot = value,
                    None => self.add_error("this statement takes no body".to_string()),
                }
            }
            TokenType::Auth => {
                self.next_token();
                if !matches!(
                    self.peek_token.token_type,
                    TokenType::Bearer | TokenType::Basic | TokenType::TokenKw
                ) {
                    self.peek_error(TokenType::Bearer);
                    return;
                }
                self.next_token();
                let scheme = self.cur_token.literal.clone();
                self.next_token();
                if !matches!(
                    self.cur_token.token_type,
                    TokenType::String | TokenType::Variable
                ) {
                    self.add_error(format!(
                        "expected auth credentials, got {}",
                        self.cur_token.token_type.as_str()
                    ));
                    return;
                }
                auth.insert("type".to_string(), scheme);
                auth.insert("value".to_string(), self.cur_token.literal.clone());
            }
            _ => {
                self.add_error("expected header, body, or auth after 'with'".to_string());
            }
        }
    }

    // =========================================================================
    // DOWNLOAD
    // =========================================================================

    /// download "url" to "path" with extraction, overwrite, header/auth, and
    /// permission clauses
    pub(crate) fn parse_download_statement(&mut self) -> Option<DownloadStatement> {
        let token = self.cur_token.clone();
        if !self.expect_peek(TokenType::String) {
            return None;
        }
        let url = self.cur_token.literal.clone();
        if !self.expect_peek(TokenType::To) {
            return None;
        }
        if !self.expect_peek(TokenType::String) {
            return None;
        }
        let path = self.cur_token.literal.clone();

        let mut statement = DownloadStatement {
            token,
            url,
            path,
            extract_to: String::new(),
            remove_archive: false,
            overwrite: false,
            headers: IndexMap::new(),
            auth: IndexMap::new(),
            options: IndexMap::new(),
            permissions: Vec::new(),
        };

        loop {
            match self.peek_token.token_type {
                TokenType::Extract => {
                    self.next_token();
                    if self.expect_peek(TokenType::To) && self.expect_peek(TokenType::String) {
                        statement.extract_to = self.cur_token.literal.clone();
                    }
                }
                TokenType::Remove => {
                    self.next_token();
                    if self.expect_peek(TokenType::Archive) {
                        statement.remove_archive = true;
                    }
                }
                TokenType::Overwrite => {
                    self.next_token();
                    statement.overwrite = true;
                }
                TokenType::With => {
                    self.next_token();
                    self.parse_with_clause(&mut statement.headers, &mut statement.auth, None);
                }
                TokenType::Timeout => {
                    self.next_token();
                    if self.expect_peek(TokenType::Number) {
                        statement
                            .options
                            .insert("timeout".to_string(), self.cur_token.literal.clone());
                    }
                }
                TokenType::Retry => {
                    self.next_token();
                    if self.expect_peek(TokenType::Number) {
                        statement
                            .options
                            .insert("retry".to_string(), self.cur_token.literal.clone());
                    }
                }
                TokenType::Allow => {
                    self.next_token();
                    if let Some(spec) = self.parse_permission_spec() {
                        statement.permissions.push(spec);
                    }
                }
                _ => break,
            }
        }
        Some(statement)
    }

    /// allow read,execute to user,group; the current token is `allow`
    fn parse_permission_spec(&mut self) -> Option<PermissionSpec> {
        let mut permissions = Vec::new();
        loop {
            self.next_token();
            match self.cur_token.token_type {
                TokenType::Read | TokenType::Write | TokenType::Execute => {
                    permissions.push(self.cur_token.literal.clone());
                }
                _ => {
                    self.add_error(format!(
                        "expected read, write, or execute, got {}",
                        self.cur_token.token_type.as_str()
                    ));
                    return None;
                }
            }
            if self.peek_is(TokenType::Comma) {
                self.next_token();
                continue;
            }
            break;
        }
        if !self.expect_peek(TokenType::To) {
            return None;
        }
        let mut targets = Vec::new();
        loop {
            self.next_token();
            if is_name_token(&self.cur_token) || self.cur_is(TokenType::String) {
                targets.push(self.cur_token.literal.clone());
            } else {
                self.add_error(format!(
                    "expected a permission target, got {}",
                    self.cur_token.token_type.as_str()
                ));
                return None;
            }
            if self.peek_is(TokenType::Comma) {
                self.next_token();
                continue;
            }
            break;
        }
        Some(PermissionSpec {
            permissions,
            targets,
        })
    }

    // =========================================================================
    // NETWORK
    // =========================================================================

    /// wait for service / ping / test connection / check health /
    /// check if port; the last two arrive here via the dispatch classifier
    pub(crate) fn parse_network_statement(&mut self) -> Option<NetworkStatement> {
        let token = self.cur_token.clone();
        let mut statement = NetworkStatement {
            token,
            action: String::new(),
            target: String::new(),
            port: String::new(),
            condition: String::new(),
            options: IndexMap::new(),
        };

        match statement.token.token_type {
            TokenType::Wait => {
                statement.action = "wait_for_service".to_string();
                if !self.expect_peek(TokenType::For) {
                    return None;
                }
                if !self.expect_peek(TokenType::Service) {
                    return None;
                }
                if !self.expect_peek(TokenType::At) {
                    return None;
                }
                if !self.expect_peek(TokenType::String) {
                    return None;
                }
                statement.target = self.cur_token.literal.clone();
                if self.peek_is(TokenType::Timeout) {
                    self.next_token();
                    if self.expect_peek(TokenType::Number) {
                        statement
                            .options
                            .insert("timeout".to_string(), self.cur_token.literal.clone());
                    }
                }
            }
            TokenType::Ping => {
                statement.action = "ping".to_string();
                if !self.expect_peek(TokenType::String) {
                    return None;
                }
                statement.target = self.cur_token.literal.clone();
            }
            TokenType::Test => {
                statement.action = "test_connection".to_string();
                if !self.expect_peek(TokenType::Connection) {
                    return None;
                }
                if !self.expect_peek(TokenType::To) {
                    return None;
                }
                if !self.expect_peek(TokenType::String) {
                    return None;
                }
                statement.target = self.cur_token.literal.clone();
                if self.peek_is(TokenType::On) {
                    self.next_token();
                    if self.expect_peek(TokenType::Port) && self.expect_peek(TokenType::Number) {
                        statement.port = self.cur_token.literal.clone();
                    }
                }
            }
            TokenType::Check if self.peek_is(TokenType::Health) => {
                statement.action = "health_check".to_string();
                self.next_token();
                if !self.expect_peek(TokenType::Of) {
                    return None;
                }
                if !self.expect_peek(TokenType::Service) {
                    return None;
                }
                if !self.expect_peek(TokenType::At) {
                    return None;
                }
                if !self.expect_peek(TokenType::String) {
                    return None;
                }
                statement.target = self.cur_token.literal.clone();
            }
            TokenType::Check => {
                statement.action = "port_check".to_string();
                self.next_token(); // if
                if !self.expect_peek(TokenType::Port) {
                    return None;
                }
                if !self.expect_peek(TokenType::Number) {
                    return None;
                }
                statement.port = self.cur_token.literal.clone();
                if self.peek_is(TokenType::Is) {
                    self.next_token();
                    if self.peek_is(TokenType::Open) {
                        self.next_token();
                        statement.condition = "open".to_string();
                    }
                }
                if self.peek_is(TokenType::On) {
                    self.next_token();
                    if self.expect_peek(TokenType::String) {
                        statement.target = self.cur_token.literal.clone();
                    }
                }
            }
            _ => return None,
        }
        Some(statement)
    }

    // =========================================================================
    // SECRETS
    // =========================================================================

    /// secret set/get/delete/exists/list; anything else is an error
    pub(crate) fn parse_secret_statement(&mut self) -> Option<SecretStatement> {
        let token = self.cur_token.clone();
        self.next_token();
        let operation = self.cur_token.literal.clone();

        let mut statement = SecretStatement {
            token,
            operation: operation.clone(),
            key: String::new(),
            value: String::new(),
            namespace: String::new(),
            pattern: String::new(),
            default_value: String::new(),
        };

        match self.cur_token.token_type {
            TokenType::Set => {
                if !self.expect_peek(TokenType::String) {
                    return None;
                }
                statement.key = self.cur_token.literal.clone();
                if !self.expect_peek(TokenType::To) {
                    return None;
                }
                self.next_token();
                match self.cur_token.token_type {
                    TokenType::String | TokenType::Variable => {
                        statement.value = self.cur_token.literal.clone();
                    }
                    TokenType::LBrace => statement.value = self.read_brace_literal(),
                    _ => {
                        self.add_error(format!(
                            "expected a secret value, got {}",
                            self.cur_token.token_type.as_str()
                        ));
                        return None;
                    }
                }
                self.parse_secret_namespace(&mut statement);
            }
            TokenType::Get => {
                if !self.expect_peek(TokenType::String) {
                    return None;
                }
                statement.key = self.cur_token.literal.clone();
                if self.peek_is(TokenType::Default) {
                    self.next_token();
                    if self.expect_peek(TokenType::String) {
                        statement.default_value = self.cur_token.literal.clone();
                    }
                }
                self.parse_secret_namespace(&mut statement);
            }
            TokenType::Delete | TokenType::Exists => {
                if !self.expect_peek(TokenType::String) {
                    return None;
                }
                statement.key = self.cur_token.literal.clone();
                self.parse_secret_namespace(&mut statement);
            }
            TokenType::ListType => {
                if self.peek_is(TokenType::Matching) {
                    self.next_token();
                    if self.expect_peek(TokenType::String) {
                        statement.pattern = self.cur_token.literal.clone();
                    }
                }
                self.parse_secret_namespace(&mut statement);
            }
            _ => {
                self.add_error(format!("unknown secret operation '{operation}'"));
                return None;
            }
        }
        Some(statement)
    }

    fn parse_secret_namespace(&mut self, statement: &mut SecretStatement) {
        if self.peek_is(TokenType::In) {
            self.next_token();
            if self.expect_peek(TokenType::Namespace) && self.expect_peek(TokenType::String) {
                statement.namespace = self.cur_token.literal.clone();
            }
        }
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
    fn test_docker_build_and_push() {
        let body = body_of(
            "version: 2.0\ntask \"t\":\n  build image \"app\" from \"Dockerfile\" tag \"v1\"\n  docker push image \"app\"\n",
        );
        match &body[0] {
            Statement::Docker(d) => {
                assert_eq!(d.operation, "build");
                assert_eq!(d.resource, "image");
                assert_eq!(d.name, "app");
                assert_eq!(d.options["from"], "Dockerfile");
                assert_eq!(d.options["tag"], "v1");
            }
            other => panic!("expected docker, got {other:?}"),
        }
        match &body[1] {
            Statement::Docker(d) => {
                assert_eq!(d.operation, "push");
                assert_eq!(d.resource, "image");
            }
            other => panic!("expected docker, got {other:?}"),
        }
    }

    #[test]
    fn test_docker_compose() {
        let body = body_of("version: 2.0\ntask \"t\":\n  docker compose up\n");
        match &body[0] {
            Statement::Docker(d) => {
                assert_eq!(d.operation, "compose");
                assert_eq!(d.options["command"], "up");
            }
            other => panic!("expected docker, got {other:?}"),
        }
    }

    #[test]
    fn test_git_operations() {
        let body = body_of(
            "version: 2.0\ntask \"t\":\n  create branch \"feature/x\"\n  git commit message \"wip\"\n  git clone \"https://example.com/r.git\" to \"vendor/r\"\n",
        );
        match &body[0] {
            Statement::Git(g) => {
                assert_eq!(g.operation, "create");
                assert_eq!(g.resource, "branch");
                assert_eq!(g.name, "feature/x");
            }
            other => panic!("expected git, got {other:?}"),
        }
        match &body[1] {
            Statement::Git(g) => {
                assert_eq!(g.operation, "commit");
                assert_eq!(g.options["message"], "wip");
            }
            other => panic!("expected git, got {other:?}"),
        }
        match &body[2] {
            Statement::Git(g) => {
                assert_eq!(g.operation, "clone");
                assert_eq!(g.name, "https://example.com/r.git");
                assert_eq!(g.options["to"], "vendor/r");
            }
            other => panic!("expected git, got {other:?}"),
        }
    }

    #[test]
    fn test_create_tag_is_git() {
        let body = body_of("version: 2.0\ntask \"t\":\n  create tag \"v1.0.0\"\n");
        match &body[0] {
            Statement::Git(g) => {
                assert_eq!(g.resource, "tag");
                assert_eq!(g.name, "v1.0.0");
            }
            other => panic!("expected git, got {other:?}"),
        }
    }

    #[test]
    fn test_http_request_with_clauses() {
        let body = body_of(
            "version: 2.0\ntask \"t\":\n  post \"https://api.example.com/v1/items\" with header \"X-Trace: abc\" with body \"{}\" with auth bearer $token accept json timeout 30\n",
        );
        match &body[0] {
            Statement::Http(h) => {
                assert_eq!(h.method, "post");
                assert_eq!(h.url, "https://api.example.com/v1/items");
                assert_eq!(h.headers["X-Trace"], "abc");
                assert_eq!(h.body, "{}");
                assert_eq!(h.auth["type"], "bearer");
                assert_eq!(h.auth["value"], "$token");
                assert_eq!(h.options["accept"], "json");
                assert_eq!(h.options["timeout"], "30");
            }
            other => panic!("expected http, got {other:?}"),
        }
    }

    #[test]
    fn test_http_delete_via_prefix() {
        let body = body_of("version: 2.0\ntask \"t\":\n  http delete \"https://api.example.com/x\"\n");
        match &body[0] {
            Statement::Http(h) => assert_eq!(h.method, "delete"),
            other => panic!("expected http, got {other:?}"),
        }
    }

    #[test]
    fn test_download_with_permissions() {
        let body = body_of(
            "version: 2.0\ntask \"t\":\n  download \"https://example.com/cli.tar.gz\" to \"/tmp/cli.tar.gz\" extract to \"/opt/cli\" remove archive overwrite allow read,execute to user,group\n",
        );
        match &body[0] {
            Statement::Download(d) => {
                assert_eq!(d.url, "https://example.com/cli.tar.gz");
                assert_eq!(d.path, "/tmp/cli.tar.gz");
                assert_eq!(d.extract_to, "/opt/cli");
                assert!(d.remove_archive);
                assert!(d.overwrite);
                assert_eq!(d.permissions.len(), 1);
                assert_eq!(d.permissions[0].permissions, vec!["read", "execute"]);
                assert_eq!(d.permissions[0].targets, vec!["user", "group"]);
            }
            other => panic!("expected download, got {other:?}"),
        }
    }

    #[test]
    fn test_network_statements() {
        let body = body_of(
            "version: 2.0\ntask \"t\":\n  wait for service at \"db:5432\" timeout 60\n  ping \"example.com\"\n  test connection to \"redis\" on port 6379\n  check health of service at \"https://api/healthz\"\n",
        );
        match &body[0] {
            Statement::Network(n) => {
                assert_eq!(n.action, "wait_for_service");
                assert_eq!(n.target, "db:5432");
                assert_eq!(n.options["timeout"], "60");
            }
            other => panic!("expected network, got {other:?}"),
        }
        match &body[1] {
            Statement::Network(n) => assert_eq!(n.action, "ping"),
            other => panic!("expected network, got {other:?}"),
        }
        match &body[2] {
            Statement::Network(n) => {
                assert_eq!(n.action, "test_connection");
                assert_eq!(n.port, "6379");
            }
            other => panic!("expected network, got {other:?}"),
        }
        match &body[3] {
            Statement::Network(n) => assert_eq!(n.action, "health_check"),
            other => panic!("expected network, got {other:?}"),
        }
    }

    #[test]
    fn test_secret_operations() {
        let body = body_of(
            "version: 2.0\ntask \"t\":\n  secret set \"db_pass\" to \"hunter2\" in namespace \"prod\"\n  secret get \"db_pass\" default \"none\"\n  secret delete \"stale\"\n  secret exists \"db_pass\"\n  secret list matching \"db_*\"\n",
        );
        match &body[0] {
            Statement::Secret(s) => {
                assert_eq!(s.operation, "set");
                assert_eq!(s.key, "db_pass");
                assert_eq!(s.value, "hunter2");
                assert_eq!(s.namespace, "prod");
            }
            other => panic!("expected secret, got {other:?}"),
        }
        match &body[1] {
            Statement::Secret(s) => {
                assert_eq!(s.operation, "get");
                assert_eq!(s.default_value, "none");
            }
            other => panic!("expected secret, got {other:?}"),
        }
        match &body[2] {
            Statement::Secret(s) => assert_eq!(s.operation, "delete"),
            other => panic!("expected secret, got {other:?}"),
        }
        match &body[3] {
            Statement::Secret(s) => assert_eq!(s.operation, "exists"),
            other => panic!("expected secret, got {other:?}"),
        }
        match &body[4] {
            Statement::Secret(s) => {
                assert_eq!(s.operation, "list");
                assert_eq!(s.pattern, "db_*");
            }
            other => panic!("expected secret, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_secret_operation() {
        let (_, errors) = parse("version: 2.0\ntask \"t\":\n  secret rotate \"key\"\n");
        assert!(errors
            .iter()
            .any(|e| e.message.contains("unknown secret operation 'rotate'")));
    }
}
