use std::io::Read;

use clap::Parser as ClapParser;

use drun_front::parser::{FrontEndError, Lexer, Parser};
use drun_front::patterns;

#[derive(ClapParser)]
#[command(name = "drun-parse")]
#[command(about = "Parse drun files and report the AST or its errors")]
#[command(version)]
struct Cli {
    /// Source file to parse (stdin when omitted)
    #[arg()]
    file: Option<String>,

    /// Print the AST as JSON on success
    #[arg(long = "json")]
    json: bool,

    /// Dump the token stream instead of parsing
    #[arg(long = "tokens")]
    tokens: bool,

    /// List the predefined `matching` pattern names and exit
    #[arg(long = "check-patterns")]
    check_patterns: bool,
}

fn read_source(file: &Option<String>) -> Result<(String, String), FrontEndError> {
    match file {
        Some(path) => {
            let source = std::fs::read_to_string(path).map_err(|source| FrontEndError::Io {
                path: path.clone(),
                source,
            })?;
            Ok((path.clone(), source))
        }
        None => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .map_err(|source| FrontEndError::Io {
                    path: "<stdin>".to_string(),
                    source,
                })?;
            Ok(("<stdin>".to_string(), buffer))
        }
    }
}

fn main() {
    let cli = Cli::parse();

    if cli.check_patterns {
        for name in patterns::pattern_names() {
            println!("{name}");
        }
        return;
    }

    let (name, source) = match read_source(&cli.file) {
        Ok(pair) => pair,
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    };

    if cli.tokens {
        for token in Lexer::new(&source).all_tokens() {
            println!(
                "{}:{}\t{}\t{:?}",
                token.line,
                token.column,
                token.token_type.as_str(),
                token.literal
            );
        }
        return;
    }

    let mut parser = Parser::new(Lexer::new(&source));
    let program = parser.parse_program();
    let errors = parser.error_list();

    if !errors.is_empty() {
        for error in errors {
            match &error.help {
                Some(help) => eprintln!(
                    "{name}:{}:{}: {} (help: {help})",
                    error.line, error.column, error.message
                ),
                None => eprintln!("{name}:{}:{}: {}", error.line, error.column, error.message),
            }
        }
        std::process::exit(1);
    }

    let Some(program) = program else {
        eprintln!("{name}: no program");
        std::process::exit(1);
    };

    if cli.json {
        match serde_json::to_string_pretty(&program) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("error: cannot serialize AST: {e}");
                std::process::exit(1);
            }
        }
    } else {
        let task_count = program.tasks.len();
        let template_count = program.templates.len();
        println!("{name}: ok ({task_count} task(s), {template_count} template(s))");
    }
}
