//! Tokenizer for C++ declarations using logos.
//!
//! Only what declaration parsing needs is distinguished. Comments and
//! whitespace are skipped; preprocessor lines come through whole as
//! [`Tok::Directive`]; any byte logos cannot match becomes [`Tok::Unknown`].

use logos::Logos;

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\r\n\f]+")]
#[logos(skip r"//[^\n]*")]
#[logos(skip r"/\*([^*]|\*+[^*/])*\*+/")]
pub(crate) enum Tok {
    #[regex(r"#[^\n]*")]
    Directive,

    // === Keywords ===
    #[token("namespace")]
    Namespace,
    #[token("class")]
    Class,
    #[token("struct")]
    Struct,
    #[token("union")]
    Union,
    #[token("enum")]
    Enum,
    #[token("public")]
    Public,
    #[token("protected")]
    Protected,
    #[token("private")]
    Private,
    #[token("virtual")]
    Virtual,
    #[token("override")]
    Override,
    #[token("final")]
    Final,
    #[token("const")]
    Const,
    #[token("static")]
    Static,
    #[token("using")]
    Using,
    #[token("typedef")]
    Typedef,
    #[token("template")]
    Template,
    #[token("friend")]
    Friend,
    #[token("operator")]
    Operator,
    #[token("default")]
    Default,
    #[token("delete")]
    Delete,
    #[token("explicit")]
    Explicit,
    #[token("inline")]
    Inline,
    #[token("constexpr")]
    Constexpr,
    #[token("mutable")]
    Mutable,
    #[token("noexcept")]
    Noexcept,
    #[token("extern")]
    Extern,
    #[token("static_assert")]
    StaticAssert,

    #[regex(r"[A-Za-z_][A-Za-z0-9_]*")]
    Ident,

    // === Literals ===
    #[regex(r#""([^"\\\n]|\\.)*""#)]
    Str,
    #[regex(r"'([^'\\\n]|\\.)*'")]
    Char,
    #[regex(r"[0-9][0-9A-Za-z_.']*")]
    Number,

    // === Punctuation ===
    #[token("::")]
    ColonColon,
    #[token(":")]
    Colon,
    #[token(";")]
    Semi,
    #[token(",")]
    Comma,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token("=")]
    Eq,
    #[token("~")]
    Tilde,
    #[token("*")]
    Star,
    #[token("&")]
    Amp,
    #[token("&&")]
    AmpAmp,
    #[token("...")]
    Ellipsis,
    #[regex(r"[-+!%^|/?.@$]")]
    Punct,

    Unknown,
}

impl Tok {
    /// Declaration specifiers that never belong to a type's text.
    pub(crate) fn is_specifier(self) -> bool {
        matches!(
            self,
            Tok::Virtual
                | Tok::Static
                | Tok::Explicit
                | Tok::Inline
                | Tok::Constexpr
                | Tok::Mutable
                | Tok::Friend
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Token {
    pub kind: Tok,
    pub start: usize,
    pub end: usize,
}

pub(crate) fn tokenize(source: &str) -> Vec<Token> {
    let mut lexer = Tok::lexer(source);
    let mut tokens = Vec::new();
    while let Some(result) = lexer.next() {
        let span = lexer.span();
        tokens.push(Token {
            kind: result.unwrap_or(Tok::Unknown),
            start: span.start,
            end: span.end,
        });
    }
    tokens
}

/// Render a token run as normalized type text.
///
/// Spaces appear only between words and after commas, so
/// `const  Foo &` becomes `const Foo&` and
/// `std :: map < int , float >` becomes `std::map<int, float>`.
pub(crate) fn join_tokens(source: &str, tokens: &[Token]) -> String {
    let mut out = String::new();
    let mut prev: Option<Tok> = None;
    for tok in tokens {
        let glue_left = matches!(
            tok.kind,
            Tok::ColonColon
                | Tok::Gt
                | Tok::RBrace
                | Tok::RParen
                | Tok::RBracket
                | Tok::Comma
                | Tok::Star
                | Tok::Amp
                | Tok::AmpAmp
                | Tok::LParen
                | Tok::LBracket
                | Tok::Lt
        );
        let glue_right = matches!(
            prev,
            None | Some(
                Tok::ColonColon | Tok::Lt | Tok::LParen | Tok::LBracket | Tok::LBrace | Tok::Tilde
            )
        );
        if !glue_left && !glue_right {
            out.push(' ');
        }
        out.push_str(&source[tok.start..tok.end]);
        prev = Some(tok.kind);
    }
    out
}
