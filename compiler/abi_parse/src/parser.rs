//! Recursive-descent walk over namespace and class scopes.
//!
//! The parser only descends into what the generator reads: namespaces,
//! `extern "C"` blocks, class bodies, enums, flags blocks, `using` aliases
//! and includes. Everything else (function bodies, templates, typedefs,
//! static asserts) is skipped by delimiter balance.

use abi_ir::{
    Access, ClassKind, LineIndex, ParseFailure, ParsedBase, ParsedClass, ParsedEnum,
    ParsedHeader, ParsedMethod, ParsedProperty, UsingAlias,
};
use abi_scan::{read_flags_block, FlagsBlock, FLAGS_BEGIN};
use smallvec::SmallVec;

use crate::member::{analyze, Member, MemberContext};
use crate::token::{join_tokens, tokenize, Tok, Token};

pub(crate) struct Parser<'s> {
    source: &'s str,
    tokens: Vec<Token>,
    pos: usize,
    lines: LineIndex,
}

/// Items a class body collects besides its members.
#[derive(Default)]
struct ClassBody {
    methods: Vec<ParsedMethod>,
    properties: Vec<ParsedProperty>,
    nested: Vec<ParsedClass>,
    enums: Vec<ParsedEnum>,
    flags: Vec<FlagsBlock>,
    usings: Vec<UsingAlias>,
}

impl<'s> Parser<'s> {
    pub(crate) fn new(source: &'s str) -> Self {
        Parser {
            source,
            tokens: tokenize(source),
            pos: 0,
            lines: LineIndex::new(source),
        }
    }

    pub(crate) fn parse_header(mut self) -> Result<ParsedHeader, ParseFailure> {
        let mut header = ParsedHeader::default();
        self.parse_scope(&mut header, false)?;
        Ok(header)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Cursor
    // ─────────────────────────────────────────────────────────────────────

    #[inline]
    fn current(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    #[inline]
    fn check(&self, kind: Tok) -> bool {
        self.current().is_some_and(|t| t.kind == kind)
    }

    #[inline]
    fn peek_kind(&self, ahead: usize) -> Option<Tok> {
        self.tokens.get(self.pos + ahead).map(|t| t.kind)
    }

    #[inline]
    fn advance(&mut self) {
        self.pos += 1;
    }

    fn eat(&mut self, kind: Tok) -> bool {
        let hit = self.check(kind);
        if hit {
            self.advance();
        }
        hit
    }

    fn text(&self, tok: Token) -> &'s str {
        &self.source[tok.start..tok.end]
    }

    fn failure_at(&self, offset: usize, message: impl Into<String>) -> ParseFailure {
        ParseFailure {
            line: self.lines.line_of(offset),
            message: message.into(),
        }
    }

    /// Index of the token closing the group opened at `open`.
    fn matching(&self, open: usize) -> Option<usize> {
        let (opener, closer) = match self.tokens.get(open)?.kind {
            Tok::LBrace => (Tok::LBrace, Tok::RBrace),
            Tok::LParen => (Tok::LParen, Tok::RParen),
            Tok::LBracket => (Tok::LBracket, Tok::RBracket),
            Tok::Lt => (Tok::Lt, Tok::Gt),
            _ => return None,
        };
        let mut depth = 0usize;
        for (i, tok) in self.tokens.iter().enumerate().skip(open) {
            if tok.kind == opener {
                depth += 1;
            } else if tok.kind == closer {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
        }
        None
    }

    /// Skip the group opened at the cursor, failing when it never closes.
    fn skip_group(&mut self) -> Result<usize, ParseFailure> {
        let open = self.pos;
        let Some(close) = self.matching(open) else {
            let offset = self.tokens.get(open).map_or(self.source.len(), |t| t.start);
            return Err(self.failure_at(offset, "unbalanced delimiter"));
        };
        self.pos = close + 1;
        Ok(close)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Namespace scope
    // ─────────────────────────────────────────────────────────────────────

    fn parse_scope(&mut self, header: &mut ParsedHeader, in_block: bool) -> Result<(), ParseFailure> {
        loop {
            let Some(tok) = self.current() else {
                if in_block {
                    return Err(self.failure_at(self.source.len(), "unterminated block"));
                }
                return Ok(());
            };
            match tok.kind {
                Tok::RBrace if in_block => {
                    self.advance();
                    return Ok(());
                }
                Tok::RBrace => return Err(self.failure_at(tok.start, "unmatched `}`")),
                Tok::Directive => {
                    self.advance();
                    if let Some(target) = include_target(self.text(tok)) {
                        header.includes.push(target.to_owned());
                    }
                }
                Tok::Namespace => self.namespace(header)?,
                Tok::Inline if self.peek_kind(1) == Some(Tok::Namespace) => {
                    self.advance();
                    self.namespace(header)?;
                }
                Tok::Using => {
                    if let Some(alias) = self.using_alias() {
                        header.usings.push(alias);
                    }
                }
                Tok::Class | Tok::Struct | Tok::Union => {
                    if let Some(class) = self.class_or_skip(Access::Public)? {
                        header.classes.push(class);
                    }
                }
                Tok::Enum => {
                    if let Some(decl) = self.enum_or_skip(Access::Public)? {
                        header.enums.push(decl);
                    }
                }
                Tok::Template => self.skip_template()?,
                Tok::Extern
                    if self.peek_kind(1) == Some(Tok::Str)
                        && self.peek_kind(2) == Some(Tok::LBrace) =>
                {
                    self.pos += 3;
                    self.parse_scope(header, true)?;
                }
                Tok::Ident if self.text(tok) == FLAGS_BEGIN => {
                    header.flags.push(self.flags_block()?);
                }
                Tok::Semi => self.advance(),
                _ => self.skip_declaration(),
            }
        }
    }

    fn namespace(&mut self, header: &mut ParsedHeader) -> Result<(), ParseFailure> {
        self.advance();
        while matches!(
            self.current().map(|t| t.kind),
            Some(Tok::Ident | Tok::ColonColon | Tok::Inline)
        ) {
            self.advance();
        }
        if self.eat(Tok::LBrace) {
            self.parse_scope(header, true)
        } else {
            // `namespace a = b;`
            self.skip_declaration();
            Ok(())
        }
    }

    /// `using Alias = Target;`; other `using` forms are skipped.
    fn using_alias(&mut self) -> Option<UsingAlias> {
        let start = self.pos;
        self.advance();
        let alias = match (self.current(), self.peek_kind(1)) {
            (Some(name), Some(Tok::Eq)) if name.kind == Tok::Ident => Some(name),
            _ => None,
        };
        self.skip_declaration();
        let name = alias?;
        // using, name, `=`, target..., `;`
        let target_from = start + 3;
        let target_to = self.pos.saturating_sub(1);
        let target = self.tokens.get(target_from..target_to)?;
        Some(UsingAlias {
            alias: self.text(name).to_owned(),
            target: join_tokens(self.source, target),
        })
    }

    fn skip_template(&mut self) -> Result<(), ParseFailure> {
        self.advance();
        if self.check(Tok::Lt) {
            self.skip_group()?;
        }
        self.skip_declaration();
        Ok(())
    }

    /// Skip to the end of the current declaration.
    ///
    /// Stops after a top-level `;`, after a top-level brace group (plus an
    /// optional `;`), or before a `}` closing the enclosing scope.
    fn skip_declaration(&mut self) {
        let mut depth = 0usize;
        while let Some(tok) = self.current() {
            match tok.kind {
                Tok::LParen | Tok::LBracket | Tok::LBrace => depth += 1,
                Tok::RParen | Tok::RBracket => depth = depth.saturating_sub(1),
                Tok::RBrace => {
                    if depth == 0 {
                        return;
                    }
                    depth -= 1;
                    if depth == 0 {
                        self.advance();
                        self.eat(Tok::Semi);
                        return;
                    }
                }
                Tok::Semi if depth == 0 => {
                    self.advance();
                    return;
                }
                _ => {}
            }
            self.advance();
        }
    }

    fn flags_block(&mut self) -> Result<FlagsBlock, ParseFailure> {
        let Some(begin) = self.current() else {
            return Err(self.failure_at(self.source.len(), "expected flags block"));
        };
        let name = match (self.peek_kind(1), self.tokens.get(self.pos + 2)) {
            (Some(Tok::LParen), Some(&name)) if name.kind == Tok::Ident => self.text(name),
            _ => return Err(self.failure_at(begin.start, "flags block without a name")),
        };
        let block = read_flags_block(self.source, begin.start, name)
            .map_err(|err| self.failure_at(begin.start, err.to_string()))?;
        let end = begin.start + block.declaration.len();
        while self.current().is_some_and(|t| t.start < end) {
            self.advance();
        }
        self.eat(Tok::Semi);
        Ok(block)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Classes
    // ─────────────────────────────────────────────────────────────────────

    /// Parse a class definition at the cursor.
    ///
    /// Forward declarations and elaborated type uses are skipped and yield
    /// `None`.
    fn class_or_skip(&mut self, access: Access) -> Result<Option<ParsedClass>, ParseFailure> {
        let Some(keyword) = self.current() else {
            return Ok(None);
        };
        let kind = match keyword.kind {
            Tok::Class => ClassKind::Class,
            Tok::Struct => ClassKind::Struct,
            _ => ClassKind::Union,
        };

        let mut i = self.pos + 1;
        let mut name: Option<Token> = None;
        let mut is_final = false;
        loop {
            let Some(tok) = self.tokens.get(i) else {
                self.pos = i;
                return Ok(None);
            };
            match tok.kind {
                Tok::Ident => {
                    if self.tokens.get(i + 1).is_some_and(|t| t.kind == Tok::LParen) {
                        // Attribute macro such as `ALIGNED(16)`.
                        i = self.matching(i + 1).unwrap_or(i + 1);
                    } else {
                        name = Some(*tok);
                    }
                }
                Tok::ColonColon => {}
                Tok::Final => is_final = true,
                Tok::LBracket if self.tokens.get(i + 1).is_some_and(|t| t.kind == Tok::LBracket) => {
                    i = self.matching(i).unwrap_or(i);
                }
                Tok::LBrace | Tok::Colon => break,
                _ => {
                    self.skip_declaration();
                    return Ok(None);
                }
            }
            i += 1;
        }
        let Some(name) = name else {
            self.skip_declaration();
            return Ok(None);
        };
        self.pos = i;

        let mut bases = SmallVec::new();
        if self.eat(Tok::Colon) {
            self.bases(kind, &mut bases)?;
        }

        let Some(open) = self.current().filter(|t| t.kind == Tok::LBrace) else {
            return Err(self.failure_at(keyword.start, "expected class body"));
        };
        let Some(close_idx) = self.matching(self.pos) else {
            return Err(self.failure_at(open.start, "unterminated class body"));
        };
        let close = self.tokens[close_idx];
        let class_name = self.text(name);
        self.advance();

        let body = self.class_body(class_name, kind, close_idx)?;
        self.pos = close_idx + 1;
        if !self.eat(Tok::Semi) && !self.check(Tok::RBrace) {
            // `struct S { ... } instance;`
            self.skip_declaration();
        }

        Ok(Some(ParsedClass {
            name: class_name.to_owned(),
            kind,
            line: self.lines.line_of(keyword.start),
            access,
            is_final,
            bases,
            methods: body.methods,
            properties: body.properties,
            nested: body.nested,
            enums: body.enums,
            flags: body.flags,
            usings: body.usings,
            span: keyword.start..close.end,
            body: open.start..close.start,
        }))
    }

    fn bases(
        &mut self,
        kind: ClassKind,
        out: &mut SmallVec<[ParsedBase; 2]>,
    ) -> Result<(), ParseFailure> {
        let mut access = kind.default_access();
        let mut is_virtual = false;
        let mut name_tokens: Vec<Token> = Vec::new();
        let mut depth = 0usize;
        loop {
            let Some(tok) = self.current() else {
                return Err(self.failure_at(self.source.len(), "unterminated base list"));
            };
            match tok.kind {
                Tok::Lt | Tok::LParen => depth += 1,
                Tok::Gt | Tok::RParen => depth = depth.saturating_sub(1),
                _ => {}
            }
            let at_top = depth == 0;
            match tok.kind {
                Tok::LBrace | Tok::Comma if at_top => {
                    if !name_tokens.is_empty() {
                        out.push(ParsedBase {
                            name: join_tokens(self.source, &name_tokens),
                            access,
                            is_virtual,
                        });
                    }
                    if tok.kind == Tok::LBrace {
                        return Ok(());
                    }
                    access = kind.default_access();
                    is_virtual = false;
                    name_tokens.clear();
                }
                Tok::Public if at_top => access = Access::Public,
                Tok::Protected if at_top => access = Access::Protected,
                Tok::Private if at_top => access = Access::Private,
                Tok::Virtual if at_top => is_virtual = true,
                Tok::Semi => return Err(self.failure_at(tok.start, "unterminated base list")),
                _ => name_tokens.push(tok),
            }
            self.advance();
        }
    }

    fn class_body(
        &mut self,
        class_name: &str,
        kind: ClassKind,
        close_idx: usize,
    ) -> Result<ClassBody, ParseFailure> {
        let mut body = ClassBody::default();
        let mut access = kind.default_access();

        while self.pos < close_idx {
            let Some(tok) = self.current() else { break };
            match tok.kind {
                Tok::Public | Tok::Protected | Tok::Private
                    if self.peek_kind(1) == Some(Tok::Colon) =>
                {
                    access = match tok.kind {
                        Tok::Public => Access::Public,
                        Tok::Protected => Access::Protected,
                        _ => Access::Private,
                    };
                    self.pos += 2;
                }
                Tok::Class | Tok::Struct | Tok::Union => {
                    if let Some(nested) = self.class_or_skip(access)? {
                        body.nested.push(nested);
                    }
                }
                Tok::Enum => {
                    if let Some(decl) = self.enum_or_skip(access)? {
                        body.enums.push(decl);
                    }
                }
                Tok::Using => {
                    if let Some(alias) = self.using_alias() {
                        body.usings.push(alias);
                    }
                }
                Tok::Ident if self.text(tok) == FLAGS_BEGIN => {
                    body.flags.push(self.flags_block()?);
                }
                Tok::Typedef | Tok::Friend | Tok::StaticAssert => self.skip_declaration(),
                Tok::Template => self.skip_template()?,
                Tok::Semi | Tok::Directive => self.advance(),
                _ => {
                    let decl = self.member_tokens(close_idx)?;
                    let cx = MemberContext {
                        source: self.source,
                        lines: &self.lines,
                        class_name,
                        access,
                    };
                    match analyze(&cx, &decl) {
                        Member::Method(method) => body.methods.push(method),
                        Member::Properties(props) => body.properties.extend(props),
                        Member::Skip(why) => {
                            tracing::trace!(class = class_name, why, "member skipped");
                        }
                    }
                }
            }
        }
        Ok(body)
    }

    /// Tokens of one member declaration, leaving the cursor after it.
    ///
    /// The terminator, a function body and a constructor initializer list
    /// are consumed but not returned.
    fn member_tokens(&mut self, limit: usize) -> Result<Vec<Token>, ParseFailure> {
        let start = self.pos;
        let mut depth = 0usize;
        let mut saw_params = false;
        while self.pos < limit {
            let Some(tok) = self.current() else { break };
            match tok.kind {
                Tok::LParen | Tok::LBracket => depth += 1,
                Tok::RParen | Tok::RBracket => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 && tok.kind == Tok::RParen {
                        saw_params = true;
                    }
                }
                Tok::Semi if depth == 0 => {
                    let decl = self.tokens[start..self.pos].to_vec();
                    self.advance();
                    return Ok(decl);
                }
                Tok::LBrace if depth == 0 && saw_params => {
                    let decl = self.tokens[start..self.pos].to_vec();
                    self.skip_group()?;
                    self.eat(Tok::Semi);
                    return Ok(decl);
                }
                Tok::LBrace if depth == 0 => {
                    // Brace initializer.
                    self.skip_group()?;
                    continue;
                }
                Tok::Colon if depth == 0 && saw_params => {
                    let decl = self.tokens[start..self.pos].to_vec();
                    self.advance();
                    self.skip_initializers(limit)?;
                    return Ok(decl);
                }
                _ => {}
            }
            self.advance();
        }
        Ok(self.tokens[start..self.pos].to_vec())
    }

    /// Skip `a(x), b{y}` and the constructor body that follows.
    fn skip_initializers(&mut self, limit: usize) -> Result<(), ParseFailure> {
        while self.pos < limit {
            let Some(tok) = self.current() else { break };
            match tok.kind {
                Tok::LParen => {
                    self.skip_group()?;
                }
                Tok::LBrace => {
                    self.skip_group()?;
                    // `m{x} {` initializes, a brace after `)`, `}` or `{}` ends.
                    match self.current().map(|t| t.kind) {
                        Some(Tok::Comma) => self.advance(),
                        Some(Tok::LBrace) => {
                            self.skip_group()?;
                            self.eat(Tok::Semi);
                            return Ok(());
                        }
                        _ => {
                            self.eat(Tok::Semi);
                            return Ok(());
                        }
                    }
                }
                _ => self.advance(),
            }
            // After `m(x)` the body may follow directly.
            if self.check(Tok::LBrace)
                && self
                    .pos
                    .checked_sub(1)
                    .and_then(|i| self.tokens.get(i))
                    .is_some_and(|t| t.kind == Tok::RParen)
            {
                self.skip_group()?;
                self.eat(Tok::Semi);
                return Ok(());
            }
        }
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────
    // Enums
    // ─────────────────────────────────────────────────────────────────────

    fn enum_or_skip(&mut self, access: Access) -> Result<Option<ParsedEnum>, ParseFailure> {
        let Some(keyword) = self.current() else {
            return Ok(None);
        };
        let mut i = self.pos + 1;
        if matches!(self.tokens.get(i).map(|t| t.kind), Some(Tok::Class | Tok::Struct)) {
            i += 1;
        }
        let mut name: Option<Token> = None;
        let mut underlying = false;
        loop {
            match self.tokens.get(i).map(|t| t.kind) {
                Some(Tok::Ident) if !underlying => name = Some(self.tokens[i]),
                Some(Tok::Colon) => underlying = true,
                Some(Tok::LBrace) => break,
                Some(Tok::Ident | Tok::ColonColon) => {}
                _ => {
                    self.skip_declaration();
                    return Ok(None);
                }
            }
            i += 1;
        }
        let Some(close_idx) = self.matching(i) else {
            return Err(self.failure_at(keyword.start, "unterminated enum body"));
        };
        let close = self.tokens[close_idx];
        self.pos = close_idx + 1;
        if !self.eat(Tok::Semi) && !self.check(Tok::RBrace) {
            self.skip_declaration();
        }
        let Some(name) = name else {
            return Ok(None);
        };
        Ok(Some(ParsedEnum {
            name: self.text(name).to_owned(),
            line: self.lines.line_of(keyword.start),
            access,
            text: self.source[keyword.start..close.end].to_owned(),
            span: keyword.start..close.end,
        }))
    }
}

/// Target of an `#include` directive, without its delimiters.
fn include_target(directive: &str) -> Option<&str> {
    let rest = directive
        .trim()
        .strip_prefix('#')?
        .trim_start()
        .strip_prefix("include")?
        .trim_start();
    let (close, body) = match rest.as_bytes().first()? {
        b'<' => ('>', &rest[1..]),
        b'"' => ('"', &rest[1..]),
        _ => return None,
    };
    body.split_once(close).map(|(target, _)| target)
}
