//! Member declaration analysis.
//!
//! Given the tokens of one member declaration (terminator, body and
//! constructor initializer list already cut off), decide whether it is a
//! method or data members and extract names, types and qualifiers.

use abi_ir::{Access, LineIndex, MethodFlags, ParsedMethod, ParsedParam, ParsedProperty};

use crate::token::{join_tokens, Tok, Token};

/// Words that name a type on their own, so a trailing one is not a
/// parameter name (`unsigned int`, `long long`).
const FUNDAMENTAL_WORDS: &[&str] = &[
    "void", "bool", "char", "wchar_t", "char8_t", "char16_t", "char32_t", "short", "int", "long",
    "signed", "unsigned", "float", "double", "auto", "size_t",
];

pub(crate) enum Member {
    Method(ParsedMethod),
    Properties(Vec<ParsedProperty>),
    Skip(&'static str),
}

/// Analysis context for one class.
pub(crate) struct MemberContext<'a> {
    pub source: &'a str,
    pub lines: &'a LineIndex,
    pub class_name: &'a str,
    pub access: Access,
}

/// Split positions of top-level tokens matching `pred`.
///
/// Depth counts `()`, `[]`, `{}` and `<>`.
fn top_level(tokens: &[Token], pred: impl Fn(Tok) -> bool) -> Vec<usize> {
    let mut depth = 0i32;
    let mut out = Vec::new();
    for (i, tok) in tokens.iter().enumerate() {
        match tok.kind {
            Tok::LParen | Tok::LBracket | Tok::LBrace | Tok::Lt => {
                if depth == 0 && pred(tok.kind) {
                    out.push(i);
                }
                depth += 1;
            }
            Tok::RParen | Tok::RBracket | Tok::RBrace | Tok::Gt => depth -= 1,
            kind if depth == 0 && pred(kind) => out.push(i),
            _ => {}
        }
    }
    out
}

/// Index of the token closing the group opened at `open`.
fn group_end(tokens: &[Token], open: usize) -> Option<usize> {
    let (opener, closer) = match tokens.get(open)?.kind {
        Tok::LParen => (Tok::LParen, Tok::RParen),
        Tok::LBracket => (Tok::LBracket, Tok::RBracket),
        Tok::LBrace => (Tok::LBrace, Tok::RBrace),
        Tok::Lt => (Tok::Lt, Tok::Gt),
        _ => return None,
    };
    let mut depth = 0usize;
    for (i, tok) in tokens.iter().enumerate().skip(open) {
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

fn split_top_level(tokens: &[Token], sep: Tok) -> Vec<&[Token]> {
    let mut parts = Vec::new();
    let mut from = 0;
    for at in top_level(tokens, |k| k == sep) {
        parts.push(&tokens[from..at]);
        from = at + 1;
    }
    parts.push(&tokens[from..]);
    parts
}

pub(crate) fn analyze(cx: &MemberContext<'_>, tokens: &[Token]) -> Member {
    let Some(first) = tokens.first() else {
        return Member::Skip("empty declaration");
    };
    let line = cx.lines.line_of(first.start);

    if tokens.iter().any(|t| t.kind == Tok::Operator) {
        return Member::Skip("operator overload");
    }

    let before_eq = top_level(tokens, |k| k == Tok::Eq)
        .first()
        .copied()
        .unwrap_or(tokens.len());
    match top_level(&tokens[..before_eq], |k| k == Tok::LParen).first() {
        Some(&paren) => method(cx, tokens, paren, line),
        None => properties(cx, tokens, line),
    }
}

fn method(cx: &MemberContext<'_>, tokens: &[Token], paren: usize, line: u32) -> Member {
    if tokens.get(paren + 1).is_some_and(|t| t.kind == Tok::Star) {
        return Member::Skip("function pointer data member");
    }
    let Some(name_idx) = paren.checked_sub(1).filter(|&i| tokens[i].kind == Tok::Ident) else {
        return Member::Skip("unnamed call-like declaration");
    };
    let Some(close) = group_end(tokens, paren) else {
        return Member::Skip("unbalanced parameter list");
    };

    let mut flags = MethodFlags::empty();
    let is_destructor = name_idx > 0 && tokens[name_idx - 1].kind == Tok::Tilde;
    let head_end = if is_destructor { name_idx - 1 } else { name_idx };

    let mut type_tokens = Vec::new();
    for tok in &tokens[..head_end] {
        match tok.kind {
            Tok::Virtual => flags |= MethodFlags::VIRTUAL,
            Tok::Static => flags |= MethodFlags::STATIC,
            kind if kind.is_specifier() => {}
            _ => type_tokens.push(*tok),
        }
    }
    let return_type = join_tokens(cx.source, &type_tokens);
    let name_text = &cx.source[tokens[name_idx].start..tokens[name_idx].end];

    let name = if is_destructor {
        flags |= MethodFlags::DESTRUCTOR;
        format!("~{name_text}")
    } else {
        if return_type.is_empty() && name_text == cx.class_name {
            flags |= MethodFlags::CONSTRUCTOR;
        }
        name_text.to_owned()
    };

    let mut i = close + 1;
    while let Some(tok) = tokens.get(i) {
        match tok.kind {
            Tok::Const => flags |= MethodFlags::CONST,
            Tok::Override => flags |= MethodFlags::OVERRIDE,
            Tok::Final => flags |= MethodFlags::FINAL,
            Tok::Noexcept | Tok::Ident => {
                if tokens.get(i + 1).is_some_and(|t| t.kind == Tok::LParen) {
                    i = group_end(tokens, i + 1).unwrap_or(i);
                }
            }
            Tok::Eq => {
                match tokens.get(i + 1).map(|t| t.kind) {
                    Some(Tok::Number) => flags |= MethodFlags::PURE_VIRTUAL,
                    Some(Tok::Default) => flags |= MethodFlags::DEFAULTED,
                    Some(Tok::Delete) => flags |= MethodFlags::DELETED,
                    _ => {}
                }
                i += 1;
            }
            _ => {}
        }
        i += 1;
    }

    Member::Method(ParsedMethod {
        name,
        params: params(cx.source, &tokens[paren + 1..close]),
        return_type,
        line,
        access: cx.access,
        flags,
    })
}

fn params(source: &str, tokens: &[Token]) -> Vec<ParsedParam> {
    if tokens.is_empty() {
        return Vec::new();
    }
    let list: Vec<ParsedParam> = split_top_level(tokens, Tok::Comma)
        .into_iter()
        .filter(|p| !p.is_empty())
        .map(|p| param(source, p))
        .collect();
    match list.as_slice() {
        [only] if only.ty == "void" && only.name.is_empty() => Vec::new(),
        _ => list,
    }
}

fn param(source: &str, tokens: &[Token]) -> ParsedParam {
    let (decl, default) = match top_level(tokens, |k| k == Tok::Eq).first() {
        Some(&eq) => (
            &tokens[..eq],
            Some(join_tokens(source, &tokens[eq + 1..])),
        ),
        None => (tokens, None),
    };

    // `R(*name)(Args)`: the name sits inside the first parenthesized group.
    if let Some(&paren) = top_level(decl, |k| k == Tok::LParen).first() {
        let name_at = (paren + 1..group_end(decl, paren).unwrap_or(paren))
            .find(|&i| decl[i].kind == Tok::Ident);
        let ty_tokens: Vec<Token> = decl
            .iter()
            .enumerate()
            .filter(|(i, _)| Some(*i) != name_at)
            .map(|(_, t)| *t)
            .collect();
        return ParsedParam {
            ty: join_tokens(source, &ty_tokens),
            name: name_at
                .map(|i| source[decl[i].start..decl[i].end].to_owned())
                .unwrap_or_default(),
            default,
        };
    }

    let (core, array) = match decl.iter().position(|t| t.kind == Tok::LBracket) {
        Some(at) => (&decl[..at], &decl[at..]),
        None => (decl, &decl[decl.len()..]),
    };
    let named = core.len() > 1
        && core.last().is_some_and(|t| {
            t.kind == Tok::Ident && !FUNDAMENTAL_WORDS.contains(&&source[t.start..t.end])
        })
        && core[core.len() - 2].kind != Tok::ColonColon;

    if named {
        let last = core[core.len() - 1];
        let mut ty = join_tokens(source, &core[..core.len() - 1]);
        ty.push_str(&join_tokens(source, array));
        ParsedParam {
            ty,
            name: source[last.start..last.end].to_owned(),
            default,
        }
    } else {
        ParsedParam {
            ty: join_tokens(source, decl),
            name: String::new(),
            default,
        }
    }
}

fn properties(cx: &MemberContext<'_>, tokens: &[Token], line: u32) -> Member {
    // Initializers and bit-field widths are not part of the declarators.
    let cut = top_level(tokens, |k| matches!(k, Tok::Eq | Tok::LBrace | Tok::Colon))
        .first()
        .copied()
        .unwrap_or(tokens.len());
    let tokens = &tokens[..cut];

    let mut is_static = false;
    let mut is_constexpr = false;
    let mut kept = Vec::with_capacity(tokens.len());
    for tok in tokens {
        match tok.kind {
            Tok::Static => is_static = true,
            Tok::Constexpr => is_constexpr = true,
            kind if kind.is_specifier() => {}
            _ => kept.push(*tok),
        }
    }

    let declarators = split_top_level(&kept, Tok::Comma);
    let Some((first, rest)) = declarators.split_first() else {
        return Member::Skip("no declarator");
    };
    let Some((base_ty, first_name, first_array)) = declarator(cx.source, first) else {
        return Member::Skip("declaration without a name");
    };

    let bare_base = base_ty.trim_end_matches(['*', '&']).to_owned();
    let mut out = vec![property(cx, first_name, format!("{base_ty}{first_array}"), line, is_static, is_constexpr)];
    for extra in rest {
        let Some(name_at) = extra.iter().rposition(|t| t.kind == Tok::Ident) else {
            continue;
        };
        let modifiers = join_tokens(cx.source, &extra[..name_at]);
        let array = join_tokens(cx.source, &extra[name_at + 1..]);
        let name = cx.source[extra[name_at].start..extra[name_at].end].to_owned();
        out.push(property(
            cx,
            name,
            format!("{bare_base}{modifiers}{array}"),
            line,
            is_static,
            is_constexpr,
        ));
    }
    Member::Properties(out)
}

/// `(type, name, array suffix)` of the first declarator.
fn declarator(source: &str, tokens: &[Token]) -> Option<(String, String, String)> {
    let array_at = tokens
        .iter()
        .position(|t| t.kind == Tok::LBracket)
        .unwrap_or(tokens.len());
    let name_at = array_at.checked_sub(1)?;
    if tokens[name_at].kind != Tok::Ident || name_at == 0 {
        return None;
    }
    let name = source[tokens[name_at].start..tokens[name_at].end].to_owned();
    Some((
        join_tokens(source, &tokens[..name_at]),
        name,
        join_tokens(source, &tokens[array_at..]),
    ))
}

fn property(
    cx: &MemberContext<'_>,
    name: String,
    ty: String,
    line: u32,
    is_static: bool,
    is_constexpr: bool,
) -> ParsedProperty {
    let is_const = is_constexpr
        || (ty.starts_with("const ") && !ty.contains('*'))
        || ty.ends_with("* const")
        || ty.ends_with(" const");
    ParsedProperty {
        name,
        ty,
        line,
        access: cx.access,
        is_const,
        is_static,
    }
}
