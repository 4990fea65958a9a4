// File: src/main.rs
//
// Command-line entry point for the Skiff interpreter:
// scan -> parse -> check -> run, exiting non-zero on the first failing
// stage. Parse errors are collected and reported together; checker
// warnings go to stderr but never stop execution.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use skiff::ast;
use skiff::checker;
use skiff::interpreter::Interpreter;
use skiff::lexer;
use skiff::parser;

/// Skiff: a small imperative scripting language.
#[derive(Parser, Debug)]
#[command(name = "skiff", version, about, long_about = None)]
struct Args {
    /// Dump the token stream and the resolved AST before running.
    #[arg(long)]
    verbose: bool,

    /// Path to the script to run.
    file: PathBuf,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let source = match std::fs::read_to_string(&args.file) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("Failed to read source file '{}': {}", args.file.display(), err);
            return ExitCode::FAILURE;
        }
    };

    let (tokens, lines) = match lexer::scan(&source) {
        Ok(result) => result,
        Err(diag) => {
            eprintln!("{}", diag);
            return ExitCode::FAILURE;
        }
    };

    if args.verbose {
        let tokens: Vec<String> = tokens.iter().map(|t| t.to_string()).collect();
        println!("Tokens: {}", tokens.join(" "));
        println!("{}", "=".repeat(50));
    }

    let (mut program, errors) = parser::parse(tokens, &lines);
    for diag in &errors {
        eprintln!("{}", diag);
    }
    if !errors.is_empty() {
        return ExitCode::FAILURE;
    }

    let warnings = match checker::check(&mut program, &lines) {
        Ok(warnings) => warnings,
        Err(diag) => {
            eprintln!("{}", diag);
            return ExitCode::FAILURE;
        }
    };
    for warning in &warnings {
        eprintln!("{}", warning);
    }

    if args.verbose {
        for stmt in &program {
            println!("{}", ast::print_stmt(stmt));
        }
        println!("{}", "=".repeat(50));
    }

    let mut interpreter = Interpreter::new(lines);
    if let Err(diag) = interpreter.run(&program) {
        eprintln!("{}", diag);
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
