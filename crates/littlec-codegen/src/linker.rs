//! Native toolchain integration: textual IR to executable.
//!
//! Hands the generated `.ll` file to the system `clang` at `-O0` and
//! surfaces its stderr on failure.

use std::path::Path;
use std::process::Command;

use tracing::debug;

use crate::error::CodegenError;

/// Produce an executable from a textual IR file with the system `clang`.
pub fn link_executable(ir_path: &Path, output_path: &Path) -> Result<(), CodegenError> {
    debug!(ir = %ir_path.display(), out = %output_path.display(), "invoking clang");

    let output = Command::new("clang")
        .arg("-O0")
        .arg(ir_path)
        .arg("-o")
        .arg(output_path)
        .output()?;

    if !output.status.success() {
        return Err(CodegenError::ToolchainFailed {
            status: output.status.code().unwrap_or(-1),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(())
}
