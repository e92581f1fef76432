//! Declaration parser for annotated C++ headers.
//!
//! [`DeclParser`] is the default [`StructuralParser`]: a logos tokenizer
//! plus a recursive-descent walk that records classes, members, enums,
//! flags blocks, `using` aliases and includes. It is not a C++ front end.
//! Bodies it does not need (functions, templates) are skipped by balancing
//! delimiters, which is enough for the declaration-heavy headers the
//! generator reads.
//!
//! Byte ranges and line numbers refer to the text passed to
//! [`StructuralParser::parse`], normally the scanner's stripped text.

mod member;
mod parser;
mod token;

use abi_ir::{ParseFailure, ParsedHeader, StructuralParser};

use crate::parser::Parser;

#[derive(Clone, Copy, Debug, Default)]
pub struct DeclParser;

impl StructuralParser for DeclParser {
    #[tracing::instrument(level = "debug", skip_all, fields(bytes = source.len()))]
    fn parse(&self, source: &str) -> Result<ParsedHeader, ParseFailure> {
        let header = Parser::new(source).parse_header()?;
        tracing::debug!(
            classes = header.classes.len(),
            enums = header.enums.len(),
            includes = header.includes.len(),
            "header parsed"
        );
        Ok(header)
    }
}
