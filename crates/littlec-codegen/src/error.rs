//! Codegen error types covering all compilation failure modes.
//!
//! Semantic failures carry the position of the AST node they relate to, so
//! messages stay stable regardless of traversal order. Display renders as
//! `at ROW:COL: ...`; the CLI prefixes `error `.

use littlec_syntax::{Pos, SyntaxError};

/// Errors that can occur during IR generation and native compilation.
#[derive(Debug, thiserror::Error)]
pub enum CodegenError {
    /// Front-end failure surfaced through the pipeline.
    #[error(transparent)]
    Syntax(#[from] SyntaxError),

    /// Identifier not bound in any visible scope frame.
    #[error("at {pos}: unknown variable name `{name}`")]
    UnknownVariable { name: String, pos: Pos },

    /// Type name not in the type table and not a visible struct tag.
    #[error("at {pos}: unknown type `{name}`")]
    UnknownType { name: String, pos: Pos },

    /// Call target not present in the module.
    #[error("at {pos}: unknown function `{name}`")]
    UnknownFunction { name: String, pos: Pos },

    /// Name already bound in the current scope frame.
    #[error("at {pos}: name `{name}` already exists in this scope")]
    DuplicateSymbol { name: String, pos: Pos },

    /// Struct tag already bound in the current scope frame.
    #[error("at {pos}: struct `{name}` already exists in this scope")]
    DuplicateStruct { name: String, pos: Pos },

    /// Type name already present in the type table.
    #[error("at {pos}: type `{name}` already exists")]
    DuplicateType { name: String, pos: Pos },

    /// Pointer metadata already recorded for this slot.
    #[error("at {pos}: pointer metadata already recorded for `{name}`")]
    DuplicatePointer { name: String, pos: Pos },

    /// Non-variadic call with the wrong number of arguments.
    #[error("at {pos}: function `{name}` expects {expected} argument(s), got {found}")]
    ArityMismatch {
        name: String,
        expected: usize,
        found: usize,
        pos: Pos,
    },

    /// Dereference target has no recorded pointer metadata.
    #[error("at {pos}: no pointer metadata for dereference target")]
    NoPointerMetadata { pos: Pos },

    /// More `*` at the use site than the value has levels of indirection.
    #[error("at {pos}: dereference target is not a pointer value")]
    NotAPointer { pos: Pos },

    /// Indexed assignment into a slot that is neither array nor pointer.
    #[error("at {pos}: indexed target `{name}` must be an array or a pointer")]
    InvalidIndexTarget { name: String, pos: Pos },

    /// `&` applied to something other than an identifier.
    #[error("at {pos}: cannot take the address of a non-identifier")]
    InvalidRefTarget { pos: Pos },

    /// A construct the emitter deliberately rejects instead of producing
    /// invalid IR.
    #[error("at {pos}: {what} is not supported in code generation")]
    Unsupported { what: String, pos: Pos },

    /// `void` used where a value type is required.
    #[error("at {pos}: void is not usable as a value type")]
    VoidValue { pos: Pos },

    /// An expression that produces no value used where one is required.
    #[error("at {pos}: expression produces no value")]
    NoValue { pos: Pos },

    /// An operand that must be an integer is not.
    #[error("at {pos}: integer value required")]
    NonIntegerOperand { pos: Pos },

    /// Control flow emitted outside a function body.
    #[error("at {pos}: statement is not inside a function")]
    OutsideFunction { pos: Pos },

    /// LLVM builder/API failure.
    #[error("LLVM error: {0}")]
    Llvm(String),

    /// Filesystem I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Native toolchain (clang) subprocess failure.
    #[error("clang failed with status {status}: {stderr}")]
    ToolchainFailed { status: i32, stderr: String },
}
