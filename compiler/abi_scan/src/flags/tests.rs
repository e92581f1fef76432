use super::*;
use pretty_assertions::assert_eq;

const ACCESS: &str = "namespace project {\n\
BEGIN_FLAGS_DECLARATION(Access)\n\
FLAG(read, 1)\n\
FLAG(write, 2)\n\
FLAG(all, read | write)\n\
END_FLAGS_DECLARATION(Access);\n\
}\n";

#[test]
fn reads_entries_in_order() {
    let block = match read_flags_block(ACCESS, 0, "Access") {
        Ok(block) => block,
        Err(err) => panic!("flags block not read: {err}"),
    };
    assert_eq!(block.name, "Access");
    assert_eq!(block.line, 2);
    assert_eq!(
        block.flags,
        vec![
            FlagEntry {
                name: "read".to_owned(),
                value: "1".to_owned()
            },
            FlagEntry {
                name: "write".to_owned(),
                value: "2".to_owned()
            },
            FlagEntry {
                name: "all".to_owned(),
                value: "read | write".to_owned()
            },
        ]
    );
    assert!(block.declaration.starts_with("BEGIN_FLAGS_DECLARATION(Access)"));
    assert!(block.declaration.ends_with("END_FLAGS_DECLARATION(Access)"));
}

#[test]
fn picks_block_by_name() {
    let src = "BEGIN_FLAGS_DECLARATION(A)\nFLAG(x, 1)\nEND_FLAGS_DECLARATION(A)\n\
               BEGIN_FLAGS_DECLARATION(B)\nFLAG(y, 4)\nEND_FLAGS_DECLARATION(B)\n";
    let block = read_flags_block(src, 0, "B").map(|b| (b.line, b.flags));
    assert_eq!(
        block,
        Ok((
            4,
            vec![FlagEntry {
                name: "y".to_owned(),
                value: "4".to_owned()
            }]
        ))
    );
}

#[test]
fn missing_end_is_error() {
    let src = "BEGIN_FLAGS_DECLARATION(A)\nFLAG(x, 1)\n";
    assert_eq!(
        read_flags_block(src, 0, "A"),
        Err(ScanError::MissingFlagsBoundary {
            name: "A".to_owned(),
            boundary: FLAGS_END
        })
    );
}

#[test]
fn missing_begin_is_error() {
    assert!(matches!(
        read_flags_block(ACCESS, 0, "Other"),
        Err(ScanError::MissingFlagsBoundary {
            boundary: FLAGS_BEGIN,
            ..
        })
    ));
}
