//! Top-level compilation pipeline: source text -> tokens -> AST -> LLVM IR
//! -> native executable.
//!
//! [`compile_to_ir`] runs the front half and returns the textual IR; the
//! LLVM `Context` is created and dropped entirely inside the call, so no
//! LLVM types escape the compilation boundary. [`compile`] additionally
//! writes the `.ll` file and hands it to the native toolchain.

use std::fs;
use std::time::Instant;

use inkwell::context::Context;
use tracing::{debug, info};

use littlec_syntax::{Lexer, Parser};

use crate::error::CodegenError;
use crate::generator::Generator;
use crate::{linker, CompileOptions, CompileResult};

/// Compile source text to textual LLVM IR.
pub fn compile_to_ir(source: &str) -> Result<String, CodegenError> {
    let tokens = Lexer::new(source).tokenize()?;
    debug!(tokens = tokens.len(), "tokenized");

    let ast = Parser::new(tokens).parse()?;
    debug!("parsed");

    let context = Context::create();
    let mut generator = Generator::new(&context, "littlec_program");
    generator.generate(&ast)?;

    Ok(generator.ir_string())
}

/// Compile source text to a native executable.
///
/// Writes `<name>.ll` into the output directory, invokes `clang` on it, and
/// returns where the binary landed. The IR file is removed afterwards
/// unless `options.keep_ir` is set.
pub fn compile(source: &str, options: &CompileOptions) -> Result<CompileResult, CodegenError> {
    let start = Instant::now();

    let ir = compile_to_ir(source)?;

    fs::create_dir_all(&options.output_dir)?;
    let stem = binary_stem(options);
    let ir_path = options.output_dir.join(format!("{stem}.ll"));
    let binary_path = options.output_dir.join(stem);

    fs::write(&ir_path, &ir)?;
    linker::link_executable(&ir_path, &binary_path)?;

    let ir_path = if options.keep_ir {
        Some(ir_path)
    } else {
        fs::remove_file(&ir_path)?;
        None
    };

    let binary_size = fs::metadata(&binary_path)?.len();
    let compilation_time_ms = start.elapsed().as_millis() as u64;
    info!(binary = %binary_path.display(), ms = compilation_time_ms, "compiled");

    Ok(CompileResult {
        binary_path,
        ir_path,
        binary_size,
        compilation_time_ms,
    })
}

fn binary_stem(options: &CompileOptions) -> &str {
    options.binary_name.as_deref().unwrap_or("program")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binary_stem_defaults_to_program() {
        let options = CompileOptions::default();
        assert_eq!(binary_stem(&options), "program");
    }

    #[test]
    fn binary_stem_uses_configured_name() {
        let options = CompileOptions {
            binary_name: Some("demo".to_string()),
            ..Default::default()
        };
        assert_eq!(binary_stem(&options), "demo");
    }
}
