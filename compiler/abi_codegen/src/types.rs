//! Predicates over type text as written in declarations.
//!
//! Types reach the generator as whitespace-normalized strings from the
//! structural parse (`Point const&`, `std::unique_ptr<Mesh>`). Everything
//! here works on a light split of that text into words and punctuation.

/// One lexical piece of a type.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Piece<'t> {
    Word(&'t str),
    Punct(&'t str),
}

const CHARACTER: &[&str] = &[
    "char",
    "wchar_t",
    "char8_t",
    "char16_t",
    "char32_t",
    "signed char",
    "unsigned char",
];

const INTEGRAL: &[&str] = &[
    "short",
    "short int",
    "signed short",
    "signed short int",
    "unsigned short",
    "unsigned short int",
    "int",
    "signed",
    "signed int",
    "unsigned",
    "unsigned int",
    "long",
    "long int",
    "signed long",
    "signed long int",
    "unsigned long",
    "unsigned long int",
    "long long",
    "long long int",
    "signed long long",
    "signed long long int",
    "unsigned long long",
    "unsigned long long int",
];

const FLOATING: &[&str] = &["float", "double", "long double"];

/// Also accepted with a `std::` prefix.
const SIZED: &[&str] = &[
    "int8_t",
    "int16_t",
    "int32_t",
    "int64_t",
    "int_fast8_t",
    "int_fast16_t",
    "int_fast32_t",
    "int_fast64_t",
    "int_least8_t",
    "int_least16_t",
    "int_least32_t",
    "int_least64_t",
    "intmax_t",
    "intptr_t",
    "uint8_t",
    "uint16_t",
    "uint32_t",
    "uint64_t",
    "uint_fast8_t",
    "uint_fast16_t",
    "uint_fast32_t",
    "uint_fast64_t",
    "uint_least8_t",
    "uint_least16_t",
    "uint_least32_t",
    "uint_least64_t",
    "uintmax_t",
    "uintptr_t",
    "size_t",
];

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

pub(crate) fn pieces(ty: &str) -> Vec<Piece<'_>> {
    let mut out = Vec::new();
    let mut rest = ty;
    while let Some(c) = rest.chars().next() {
        if c.is_whitespace() {
            rest = &rest[c.len_utf8()..];
            continue;
        }
        let len = if is_word_char(c) {
            rest.find(|c: char| !is_word_char(c)).unwrap_or(rest.len())
        } else if rest.starts_with("::") || rest.starts_with("&&") {
            2
        } else {
            c.len_utf8()
        };
        let (piece, tail) = rest.split_at(len);
        out.push(if is_word_char(c) {
            Piece::Word(piece)
        } else {
            Piece::Punct(piece)
        });
        rest = tail;
    }
    out
}

/// Pieces back to text; a blank only separates two words.
pub(crate) fn render(pieces: &[Piece<'_>]) -> String {
    let mut out = String::new();
    let mut prev_word = false;
    for piece in pieces {
        match *piece {
            Piece::Word(w) => {
                if prev_word {
                    out.push(' ');
                }
                out.push_str(w);
                prev_word = true;
            }
            Piece::Punct(p) => {
                out.push_str(p);
                prev_word = false;
            }
        }
    }
    out
}

fn is_cv(piece: &Piece<'_>) -> bool {
    matches!(piece, Piece::Word("const" | "volatile"))
}

/// `ty` with every `const` and `volatile` removed.
pub fn strip_cv(ty: &str) -> String {
    let kept: Vec<Piece<'_>> = pieces(ty).into_iter().filter(|p| !is_cv(p)).collect();
    render(&kept)
}

/// Fundamental or fixed-width arithmetic type, `void` and `bool` included.
pub fn is_primitive(ty: &str) -> bool {
    let core = strip_cv(ty);
    let core = core.as_str();
    core == "void"
        || core == "bool"
        || CHARACTER.contains(&core)
        || INTEGRAL.contains(&core)
        || FLOATING.contains(&core)
        || SIZED.contains(&core.strip_prefix("std::").unwrap_or(core))
}

/// Whether any of `puncts` appears in the declarator of `ty`, outside every
/// template argument list and parenthesized group.
fn declarator_has(ty: &str, puncts: &[&str]) -> bool {
    let mut depth = 0usize;
    for piece in pieces(ty) {
        match piece {
            Piece::Punct("<" | "(") => depth += 1,
            Piece::Punct(">" | ")") => depth = depth.saturating_sub(1),
            Piece::Punct(p) if depth == 0 && puncts.contains(&p) => return true,
            _ => {}
        }
    }
    false
}

/// `T*`, but not `std::vector<T*>`.
pub fn is_pointer(ty: &str) -> bool {
    declarator_has(ty, &["*"])
}

/// `T&` or `T&&`, but not `std::pair<T&, U>`.
pub fn is_reference(ty: &str) -> bool {
    declarator_has(ty, &["&", "&&"])
}

/// Returned by value through the C boundary without an output parameter.
pub fn is_trivial(ty: &str) -> bool {
    is_primitive(ty) || is_pointer(ty) || is_reference(ty) || is_function_pointer(ty)
}

pub fn is_rvalue_reference(ty: &str) -> bool {
    ty.trim_end().ends_with("&&")
}

/// Index of the piece closing the group opened at `open`.
fn closing(pieces: &[Piece<'_>], open: usize, opener: &str, closer: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (i, piece) in pieces.iter().enumerate().skip(open) {
        match *piece {
            Piece::Punct(p) if p == opener => depth += 1,
            Piece::Punct(p) if p == closer => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// `R(*)(Args)`, optionally with a calling convention or a name inside the
/// first group.
pub fn is_function_pointer(ty: &str) -> bool {
    let pieces = pieces(ty);
    let Some(open) = pieces.iter().position(|p| *p == Piece::Punct("(")) else {
        return false;
    };
    if open == 0 {
        return false;
    }
    let Some(close) = closing(&pieces, open, "(", ")") else {
        return false;
    };
    let inner = &pieces[open + 1..close];
    let stars = inner.iter().filter(|p| **p == Piece::Punct("*")).count();
    stars == 1
        && inner
            .iter()
            .all(|p| matches!(p, Piece::Word(_) | Piece::Punct("*" | "::")))
        && pieces.get(close + 1) == Some(&Piece::Punct("("))
}

/// `T` of `std::unique_ptr<T>` (first template argument).
pub fn unique_ptr_target(ty: &str) -> Option<String> {
    let pieces = pieces(ty);
    let mut at = pieces.iter().position(|p| !is_cv(p))?;
    if pieces.get(at) == Some(&Piece::Word("std")) && pieces.get(at + 1) == Some(&Piece::Punct("::"))
    {
        at += 2;
    }
    if pieces.get(at) != Some(&Piece::Word("unique_ptr"))
        || pieces.get(at + 1) != Some(&Piece::Punct("<"))
    {
        return None;
    }
    let close = closing(&pieces, at + 1, "<", ">")?;
    if !pieces[close + 1..].iter().all(is_cv) {
        return None;
    }
    let args = &pieces[at + 2..close];
    let mut depth = 0usize;
    let end = args
        .iter()
        .position(|p| {
            match *p {
                Piece::Punct("<") => depth += 1,
                Piece::Punct(">") => depth = depth.saturating_sub(1),
                Piece::Punct(",") if depth == 0 => return true,
                _ => {}
            }
            false
        })
        .unwrap_or(args.len());
    let target: Vec<Piece<'_>> = args[..end].iter().copied().filter(|p| !is_cv(p)).collect();
    (!target.is_empty()).then(|| render(&target))
}

/// `T` of a single-level pointer `T*` to a class type.
pub fn pointee(ty: &str) -> Option<String> {
    let pieces = pieces(ty);
    let star = pieces.iter().rposition(|p| *p == Piece::Punct("*"))?;
    if !pieces[star + 1..].iter().all(is_cv) {
        return None;
    }
    let target: Vec<Piece<'_>> = pieces[..star].iter().copied().filter(|p| !is_cv(p)).collect();
    let text = render(&target);
    let plain = target
        .iter()
        .all(|p| matches!(p, Piece::Word(_) | Piece::Punct("::" | "<" | ">" | ",")));
    (plain && !text.is_empty() && !is_primitive(&text)).then_some(text)
}

/// Named type with cv-qualifiers, references and pointers removed.
pub fn base_name(ty: &str) -> String {
    let kept: Vec<Piece<'_>> = pieces(ty)
        .into_iter()
        .filter(|p| !is_cv(p) && !matches!(p, Piece::Punct("&" | "&&" | "*")))
        .collect();
    render(&kept)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn primitives() {
        assert!(is_primitive("void"));
        assert!(is_primitive("unsigned long long"));
        assert!(is_primitive("std::uint32_t"));
        assert!(is_primitive("const int"));
        assert!(!is_primitive("Point"));
        assert!(!is_primitive("int*"));
        assert!(!is_primitive("std::string"));
    }

    #[test]
    fn trivial_returns() {
        assert!(is_trivial("float"));
        assert!(is_trivial("Point const&"));
        assert!(is_trivial("Mesh*"));
        assert!(!is_trivial("Point"));
        assert!(!is_trivial("std::vector<int>"));
        assert!(is_trivial("void(*)(int)"));
    }

    #[test]
    fn pointers_inside_template_arguments_do_not_count() {
        assert!(!is_pointer("std::vector<Mesh*>"));
        assert!(!is_reference("std::pair<Mesh&, int>"));
        assert!(!is_trivial("std::vector<Mesh*>"));
        assert!(!is_trivial("std::function<void(Mesh&)>"));
        assert!(is_pointer("std::vector<Mesh*>*"));
        assert!(is_reference("std::vector<Mesh*> const&"));
        assert!(is_reference("Mesh&&"));
    }

    #[test]
    fn cv_stripping() {
        assert_eq!(strip_cv("Point const&"), "Point&");
        assert_eq!(strip_cv("const volatile unsigned int"), "unsigned int");
        assert_eq!(strip_cv("std::map<int, const char*>"), "std::map<int,char*>");
        assert_eq!(base_name("ns::Mesh const*"), "ns::Mesh");
    }

    #[test]
    fn function_pointers() {
        assert!(is_function_pointer("void(*)(int)"));
        assert!(is_function_pointer("bool (CALL *)(int, float)"));
        assert!(is_function_pointer("void(*cb)(int)"));
        assert!(!is_function_pointer("std::function<void(int)>"));
        assert!(!is_function_pointer("int"));
        assert!(!is_function_pointer("void(&)(int)"));
    }

    #[test]
    fn smart_and_raw_pointers() {
        assert_eq!(unique_ptr_target("std::unique_ptr<Mesh>"), Some("Mesh".to_owned()));
        assert_eq!(
            unique_ptr_target("unique_ptr<gfx::Mesh const, Deleter>"),
            Some("gfx::Mesh".to_owned())
        );
        assert_eq!(unique_ptr_target("std::shared_ptr<Mesh>"), None);
        assert_eq!(unique_ptr_target("std::unique_ptr<Mesh>&"), None);

        assert_eq!(pointee("Mesh*"), Some("Mesh".to_owned()));
        assert_eq!(pointee("gfx::Mesh const* const"), Some("gfx::Mesh".to_owned()));
        assert_eq!(pointee("int*"), None);
        assert_eq!(pointee("Mesh**"), None);
        assert_eq!(pointee("Mesh&"), None);
    }
}
