//! littlec compiler CLI.
//!
//! Provides the `littlec` binary:
//! - `build` compiles a source file to a native executable via clang
//! - `run` builds and then executes the binary, propagating its exit status
//! - `emit-ir` prints the textual LLVM IR to stdout
//!
//! `--dump-tokens` / `--dump-ast` print the front-end artifacts before
//! compilation, for debugging the pipeline.

use std::fs;
use std::path::PathBuf;
use std::process::{self, Command};

use clap::{Parser as ClapParser, Subcommand};
use tracing::debug;

use littlec_codegen::{compile, compile_to_ir, CodegenError, CompileOptions};
use littlec_syntax::{dump_tokens, Lexer, Parser};

/// littlec compiler and tools.
#[derive(ClapParser)]
#[command(name = "littlec", about = "Small-C compiler targeting LLVM")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Compile a source file to a native binary.
    Build {
        /// Path to the source file.
        source: PathBuf,

        /// Output directory (default: ./build/).
        #[arg(short = 'O', long, default_value = "./build")]
        output_dir: PathBuf,

        /// Binary name (default: the source file stem).
        #[arg(long)]
        name: Option<String>,

        /// Keep the textual IR file next to the binary.
        #[arg(long)]
        keep_ir: bool,

        /// Print the token stream before compiling.
        #[arg(long)]
        dump_tokens: bool,

        /// Print the AST before compiling.
        #[arg(long)]
        dump_ast: bool,
    },

    /// Compile and immediately execute, propagating the exit status.
    Run {
        /// Path to the source file.
        source: PathBuf,

        /// Output directory (default: ./build/).
        #[arg(short = 'O', long, default_value = "./build")]
        output_dir: PathBuf,
    },

    /// Print textual LLVM IR to stdout.
    EmitIr {
        /// Path to the source file.
        source: PathBuf,

        /// Print the token stream first.
        #[arg(long)]
        dump_tokens: bool,

        /// Print the AST first.
        #[arg(long)]
        dump_ast: bool,
    },
}

fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let exit_code = match cli.command {
        Commands::Build {
            source,
            output_dir,
            name,
            keep_ir,
            dump_tokens,
            dump_ast,
        } => run_build(&source, output_dir, name, keep_ir, dump_tokens, dump_ast),
        Commands::Run { source, output_dir } => run_run(&source, output_dir),
        Commands::EmitIr {
            source,
            dump_tokens,
            dump_ast,
        } => run_emit_ir(&source, dump_tokens, dump_ast),
    };
    process::exit(exit_code);
}

/// Exit codes: 0 = success, 1 = compilation error, 3 = I/O error.
fn run_build(
    source_path: &PathBuf,
    output_dir: PathBuf,
    name: Option<String>,
    keep_ir: bool,
    dump_tokens: bool,
    dump_ast: bool,
) -> i32 {
    let source = match read_source(source_path) {
        Ok(text) => text,
        Err(code) => return code,
    };

    if dump_tokens || dump_ast {
        if let Err(code) = dump_front_end(&source, dump_tokens, dump_ast) {
            return code;
        }
    }

    let binary_name = name.or_else(|| {
        source_path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
    });
    let options = CompileOptions {
        output_dir,
        binary_name,
        keep_ir,
    };

    match compile(&source, &options) {
        Ok(result) => {
            let json = serde_json::to_string_pretty(&result).unwrap_or_else(|e| {
                format!("{{\"error\": \"failed to serialize result: {}\"}}", e)
            });
            println!("{}", json);
            0
        }
        Err(e) => report(e),
    }
}

fn run_run(source_path: &PathBuf, output_dir: PathBuf) -> i32 {
    let source = match read_source(source_path) {
        Ok(text) => text,
        Err(code) => return code,
    };

    let binary_name = source_path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned());
    let options = CompileOptions {
        output_dir,
        binary_name,
        keep_ir: false,
    };

    let result = match compile(&source, &options) {
        Ok(result) => result,
        Err(e) => return report(e),
    };

    debug!(binary = %result.binary_path.display(), "running");
    match Command::new(&result.binary_path).status() {
        Ok(status) => status.code().unwrap_or(1),
        Err(e) => {
            eprintln!(
                "error: failed to run `{}`: {}",
                result.binary_path.display(),
                e
            );
            3
        }
    }
}

fn run_emit_ir(source_path: &PathBuf, dump_tokens: bool, dump_ast: bool) -> i32 {
    let source = match read_source(source_path) {
        Ok(text) => text,
        Err(code) => return code,
    };

    if dump_tokens || dump_ast {
        if let Err(code) = dump_front_end(&source, dump_tokens, dump_ast) {
            return code;
        }
    }

    match compile_to_ir(&source) {
        Ok(ir) => {
            print!("{}", ir);
            0
        }
        Err(e) => report(e),
    }
}

fn read_source(path: &PathBuf) -> Result<String, i32> {
    fs::read_to_string(path).map_err(|e| {
        eprintln!("error: failed to read `{}`: {}", path.display(), e);
        3
    })
}

/// Print the token stream and/or AST dump to stdout.
fn dump_front_end(source: &str, tokens: bool, ast: bool) -> Result<(), i32> {
    let token_stream = Lexer::new(source).tokenize().map_err(|e| {
        eprintln!("error {}", e);
        1
    })?;

    if tokens {
        println!("tokens:");
        print!("{}", dump_tokens(&token_stream));
        println!();
    }

    if ast {
        let root = Parser::new(token_stream).parse().map_err(|e| {
            eprintln!("error {}", e);
            1
        })?;
        println!("ast:");
        print!("{}", root.dump());
        println!();
    }

    Ok(())
}

fn report(e: CodegenError) -> i32 {
    match e {
        CodegenError::Io(e) => {
            eprintln!("error: I/O: {}", e);
            3
        }
        other => {
            eprintln!("error {}", other);
            1
        }
    }
}
