use std::io::ErrorKind;
use std::path::Path;

use crate::diagnostics::AssetError;

use super::types::ShaderStage;

/// Entry point used when a vertex shader doesn't name one.
pub const DEFAULT_VERTEX_ENTRY: &str = "vertex_main";
/// Entry point used when a pixel shader doesn't name one.
pub const DEFAULT_PIXEL_ENTRY: &str = "pixel_main";

/// Reads a WGSL source artifact.
pub(crate) fn read_source(path: &Path) -> Result<String, AssetError> {
    std::fs::read_to_string(path).map_err(|source| match source.kind() {
        ErrorKind::NotFound => AssetError::NotFound {
            path: path.to_path_buf(),
        },
        _ => AssetError::Io {
            path: path.to_path_buf(),
            source,
        },
    })
}

/// Whether `source` declares `entry` as an entry point of `stage`.
///
/// Matches `@vertex fn name(` / `@fragment fn name(` with arbitrary whitespace.
/// Line comments are ignored.
pub(crate) fn has_entry_point(source: &str, stage: ShaderStage, entry: &str) -> bool {
    let attr = stage.wgsl_attribute();
    let code: String = source
        .lines()
        .map(|line| line.split("//").next().unwrap_or_default())
        .collect::<Vec<_>>()
        .join("\n");

    code.match_indices(attr).any(|(at, _)| {
        let rest = &code[at + attr.len()..];
        // Reject longer attributes sharing the prefix.
        if rest.starts_with(|c: char| c.is_alphanumeric() || c == '_') {
            return false;
        }
        let Some(rest) = rest.trim_start().strip_prefix("fn") else {
            return false;
        };
        if !rest.starts_with(char::is_whitespace) {
            return false;
        }
        let Some(rest) = rest.trim_start().strip_prefix(entry) else {
            return false;
        };
        rest.trim_start().starts_with('(')
    })
}

/// Loads `path` and verifies it exposes `entry` for `stage`.
pub(crate) fn load(path: &Path, stage: ShaderStage, entry: &str) -> Result<String, AssetError> {
    let source = read_source(path)?;
    if !has_entry_point(&source, stage, entry) {
        return Err(AssetError::Compile {
            path: path.to_path_buf(),
            message: format!("no `{} fn {entry}` entry point", stage.wgsl_attribute()),
        });
    }
    Ok(source)
}
