//! Parser module for drun source files
//!
//! This module contains the lexer and the recursive descent parser.

pub mod types;
pub mod lexer;
pub mod expression_parser;
pub mod parameter_parser;
pub mod statement_parser;
pub mod operation_parser;
pub mod control_parser;
pub mod parser;

// Re-exports
pub use lexer::{Lexer, Token, TokenType};
pub use parser::Parser;
pub use types::{FrontEndError, ParseError};

use crate::ast::types::Program;

/// Parse a drun source string in one call.
///
/// Returns the best-effort program (None when no version header was found)
/// and every error collected along the way. Callers must check the error
/// list before treating the AST as authoritative.
pub fn parse(input: &str) -> (Option<Program>, Vec<ParseError>) {
    let mut parser = Parser::new(Lexer::new(input));
    let program = parser.parse_program();
    let errors = parser.error_list().to_vec();
    (program, errors)
}

#[cfg(test)]
mod tests {
    use super::parse;
    use crate::ast::types::*;

    const RELEASE_FILE: &str = r#"version: 2.0

project "shipyard" version "3.1":
  set registry to "ghcr.io/acme"
  include snippets from "lib/shared.drun" as lib
  before any task:
    info "starting"

template task "service-deploy" means "Deploy one service":
  given $replicas defaults to "2"
  step "rolling out"

task "release" means "Build, test, and ship":
  requires $env from ["dev","staging","prod"] defaults to "dev"
  given $tag defaults to "latest"
  depends on build and test
  depends on lint, audit
  info "release {$tag}"
  if docker is available:
    build image "app" from "Dockerfile" tag "v1"
  else:
    fail "docker required"
  for each $region in ["us","eu"] in parallel:
    call task "deploy-eu" with region="us"
  try:
    run:
      echo "migrating"
      echo "smoking"
  catch as $err:
    warn "migration failed"
    rethrow
  finally:
    info "cleanup"
  when in ci environment:
    secret get "deploy_key" default "none"
  otherwise:
    info "local run"

task "deploy-eu" from template "service-deploy":
  set replicas to "4"
"#;

    #[test]
    fn test_full_file_end_to_end() {
        let (program, errors) = parse(RELEASE_FILE);
        assert!(errors.is_empty(), "unexpected errors: {errors:?}");
        let program = program.expect("program");

        assert_eq!(program.version.as_ref().unwrap().value, "2.0");

        let project = program.project.as_ref().expect("project");
        assert_eq!(project.name, "shipyard");
        assert_eq!(project.version, "3.1");
        assert_eq!(project.settings.len(), 3);
        assert!(matches!(project.settings[0], ProjectSetting::Set(_)));
        assert!(matches!(project.settings[1], ProjectSetting::Include(_)));
        assert!(matches!(project.settings[2], ProjectSetting::Hook(_)));

        assert_eq!(program.templates.len(), 1);
        let template = &program.templates[0];
        assert_eq!(template.name, "service-deploy");
        assert_eq!(template.description, "Deploy one service");
        assert_eq!(template.parameters.len(), 1);
        assert_eq!(template.body.len(), 1);

        assert_eq!(program.tasks.len(), 2);
        let release = match &program.tasks[0] {
            TaskDefinition::Task(t) => t,
            other => panic!("expected task, got {other:?}"),
        };
        assert_eq!(release.name, "release");
        assert_eq!(release.parameters.len(), 2);
        assert_eq!(release.dependencies.len(), 2);
        assert!(release.dependencies[0].sequential);
        assert!(!release.dependencies[1].sequential);

        // info, if-available detection, loop, try, when-environment detection
        assert_eq!(release.body.len(), 5);
        assert!(matches!(release.body[0], Statement::Action(_)));
        match &release.body[1] {
            Statement::Detection(d) => {
                assert_eq!(d.kind, "if_available");
                assert!(matches!(d.body[0], Statement::Docker(_)));
                assert!(matches!(d.else_body[0], Statement::Action(_)));
            }
            other => panic!("expected detection, got {other:?}"),
        }
        match &release.body[2] {
            Statement::Loop(l) => {
                assert!(l.parallel);
                assert!(matches!(l.body[0], Statement::TaskCall(_)));
            }
            other => panic!("expected loop, got {other:?}"),
        }
        match &release.body[3] {
            Statement::Try(t) => {
                match &t.body[0] {
                    Statement::Shell(s) => {
                        assert!(s.is_multiline);
                        assert_eq!(
                            s.commands,
                            vec!["echo \"migrating\"", "echo \"smoking\""]
                        );
                    }
                    other => panic!("expected shell, got {other:?}"),
                }
                assert_eq!(t.catch_clauses.len(), 1);
                assert_eq!(t.catch_clauses[0].error_variable, "$err");
                assert_eq!(t.catch_clauses[0].body.len(), 2);
                assert_eq!(t.finally_body.len(), 1);
            }
            other => panic!("expected try, got {other:?}"),
        }
        match &release.body[4] {
            Statement::Detection(d) => {
                assert_eq!(d.kind, "when_environment");
                assert!(matches!(d.body[0], Statement::Secret(_)));
                assert_eq!(d.else_body.len(), 1);
            }
            other => panic!("expected detection, got {other:?}"),
        }

        match &program.tasks[1] {
            TaskDefinition::FromTemplate(t) => {
                assert_eq!(t.name, "deploy-eu");
                assert_eq!(t.template, "service-deploy");
                assert_eq!(t.overrides["replicas"], "4");
            }
            other => panic!("expected template instantiation, got {other:?}"),
        }
    }

    #[test]
    fn test_full_file_is_deterministic() {
        let (a, ea) = parse(RELEASE_FILE);
        let (b, eb) = parse(RELEASE_FILE);
        assert_eq!(a, b);
        assert_eq!(ea, eb);
    }
}
