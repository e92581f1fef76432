//! Version packing for the build-info header.

use std::path::Path;

use abi_ir::GenError;

/// Pack dotted integers `a.b.c` as `((a << 16) ^ b) << 16 ^ c`.
///
/// Every element is XORed in and the accumulator shifts by 16 before the
/// next one; bits shifted past 64 are lost.
pub fn pack_version(text: &str) -> Result<u64, String> {
    let text = text.trim();
    if text.is_empty() {
        return Err("version is empty".to_owned());
    }
    let mut version = 0u64;
    let mut elements = text.split('.').peekable();
    while let Some(element) = elements.next() {
        let value: u64 = element
            .trim()
            .parse()
            .map_err(|_| format!("`{element}` is not a non-negative integer"))?;
        version ^= value;
        if elements.peek().is_some() {
            version <<= 16;
        }
    }
    Ok(version)
}

/// Read and pack the version file at `path`.
pub fn read_version(path: &Path) -> Result<u64, GenError> {
    let text = std::fs::read_to_string(path).map_err(|err| GenError::MissingVersion {
        path: path.to_path_buf(),
        reason: err.to_string(),
    })?;
    pack_version(&text).map_err(|reason| GenError::MissingVersion {
        path: path.to_path_buf(),
        reason,
    })
}
