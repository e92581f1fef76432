//! Command-line argument handling for `abigen generate`.

use std::path::PathBuf;

use crate::Options;

pub const GENERATE_USAGE: &str = "Usage: abigen generate --headers <a.h;b.h;...> --config <abigen.json> \
--output <dir> [--source-tree <dir>] [--revision <sha>] [--common-lib <dir>]";

/// Parse the arguments following `generate`.
///
/// Flags take their value either as the next argument or after `=`.
/// `--headers` may repeat; each value is a `;`-separated list.
pub fn parse_generate_args(args: &[String]) -> Result<Options, String> {
    let mut headers = Vec::new();
    let mut config = None;
    let mut output = None;
    let mut source_tree = None;
    let mut revision = None;
    let mut common_lib = None;

    let mut i = 0;
    while i < args.len() {
        let arg = args[i].as_str();
        let (flag, inline) = match arg.split_once('=') {
            Some((flag, value)) if flag.starts_with("--") => (flag, Some(value.to_owned())),
            _ => (arg, None),
        };
        let value = match inline {
            Some(value) => value,
            None => {
                i += 1;
                match args.get(i) {
                    Some(value) if !value.starts_with("--") => value.clone(),
                    _ => return Err(format!("missing value for `{flag}`")),
                }
            }
        };
        match flag {
            "--headers" => headers.extend(
                value
                    .split(';')
                    .map(str::trim)
                    .filter(|h| !h.is_empty())
                    .map(PathBuf::from),
            ),
            "--config" => config = Some(PathBuf::from(value)),
            "--output" | "-o" => output = Some(PathBuf::from(value)),
            "--source-tree" => source_tree = Some(PathBuf::from(value)),
            "--revision" => revision = Some(value),
            "--common-lib" => common_lib = Some(PathBuf::from(value)),
            _ => return Err(format!("unknown option `{flag}`")),
        }
        i += 1;
    }

    if headers.is_empty() {
        return Err("no headers given (`--headers`)".to_owned());
    }
    let Some(config) = config else {
        return Err("missing `--config`".to_owned());
    };
    let Some(output) = output else {
        return Err("missing `--output`".to_owned());
    };
    Ok(Options {
        headers,
        config,
        output,
        source_tree: source_tree.unwrap_or_else(|| PathBuf::from(".")),
        revision,
        common_lib,
    })
}
