//! LLVM code generation and driver for littlec programs.
//!
//! # Modules
//!
//! - [`error`] -- Error types for all compilation failure modes
//! - [`types`] -- Flat type-name table (primitives + typedefs)
//! - [`scope`] -- Lexical scope stack (slots, struct tags, pointer metadata)
//! - [`generator`] -- AST walk emitting IR through inkwell
//! - [`compiler`] -- Pipeline orchestration (source to IR / executable)
//! - [`linker`] -- Textual IR to executable via system `clang`

pub mod compiler;
pub mod error;
pub mod generator;
pub mod linker;
pub mod scope;
pub mod types;

pub use compiler::{compile, compile_to_ir};
pub use error::CodegenError;
pub use generator::Generator;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Options controlling the compilation pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompileOptions {
    /// Directory for build output (IR file, executable).
    pub output_dir: PathBuf,

    /// Name of the produced binary. `None` means `program`.
    pub binary_name: Option<String>,

    /// Keep the textual IR file next to the binary.
    pub keep_ir: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        CompileOptions {
            output_dir: PathBuf::from("./build/"),
            binary_name: None,
            keep_ir: false,
        }
    }
}

/// Result of a successful compilation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompileResult {
    /// Path to the output executable binary.
    pub binary_path: PathBuf,

    /// Path to the textual IR file, when kept.
    pub ir_path: Option<PathBuf>,

    /// Size of the output binary in bytes.
    pub binary_size: u64,

    /// Time taken for compilation in milliseconds.
    pub compilation_time_ms: u64,
}
