use crate::error::ParseError;

/// One logical Hack assembly instruction, already stripped of comments and
/// whitespace.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Line {
    /// `@x`, where `x` is either a non-negative integer literal or a symbol
    /// (label or variable) to be resolved later.
    Address(Address),
    /// `dest=comp;jump`, with `dest` and `jump` optional.
    Compute {
        dest: String,
        comp: String,
        jump: String,
    },
    /// `(NAME)` -- not itself an instruction, but a label declaration that
    /// binds `NAME` to the address of the following instruction.
    Label(String),
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Address {
    Literal(u16),
    Symbol(String),
}

/// Strips a trailing `// comment` (if any) and surrounding whitespace from a
/// raw source line. Returns `None` for lines that are blank once stripped.
fn strip_comment(raw: &str) -> Option<&str> {
    let code = match raw.find("//") {
        Some(idx) => &raw[..idx],
        None => raw,
    };
    let trimmed = code.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

/// Parses the full source text into its logical lines, in order, with blank
/// lines and comments already removed. No symbol resolution happens here;
/// that's the two-pass job of the caller (see `lib.rs`).
pub fn parse_lines(source: &str) -> Result<Vec<Line>, (usize, ParseError)> {
    let mut lines = Vec::new();
    for (idx, raw) in source.lines().enumerate() {
        let Some(code) = strip_comment(raw) else {
            continue;
        };
        // Whitespace inside an instruction is not part of the Hack assembly
        // grammar; collapse it the way the reference assembler does.
        let code: String = code.chars().filter(|c| !c.is_whitespace()).collect();
        let line = parse_one(&code).map_err(|e| (idx + 1, e))?;
        lines.push(line);
    }
    Ok(lines)
}

fn parse_one(code: &str) -> Result<Line, ParseError> {
    if let Some(rest) = code.strip_prefix('@') {
        return Ok(Line::Address(parse_address(rest)?));
    }

    if let Some(inner) = code.strip_prefix('(') {
        let name = inner
            .strip_suffix(')')
            .ok_or_else(|| ParseError::Malformed(code.to_owned()))?;
        if name.is_empty() {
            return Err(ParseError::Malformed(code.to_owned()));
        }
        return Ok(Line::Label(name.to_owned()));
    }

    parse_compute(code)
}

fn parse_address(rest: &str) -> Result<Address, ParseError> {
    if rest.is_empty() {
        return Err(ParseError::BadAddress(rest.to_owned()));
    }
    if rest.chars().all(|c| c.is_ascii_digit()) {
        let value: u32 = rest
            .parse()
            .map_err(|_| ParseError::BadAddress(rest.to_owned()))?;
        if value >= 1 << 15 {
            return Err(ParseError::BadAddress(rest.to_owned()));
        }
        Ok(Address::Literal(value as u16))
    } else if is_valid_symbol(rest) {
        Ok(Address::Symbol(rest.to_owned()))
    } else {
        Err(ParseError::BadAddress(rest.to_owned()))
    }
}

fn is_valid_symbol(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || "_.$:".contains(c) => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || "_.$:".contains(c))
}

fn parse_compute(code: &str) -> Result<Line, ParseError> {
    let (dest, rest) = match code.find('=') {
        Some(idx) => (&code[..idx], &code[idx + 1..]),
        None => ("", code),
    };
    let (comp, jump) = match rest.find(';') {
        Some(idx) => (&rest[..idx], &rest[idx + 1..]),
        None => (rest, ""),
    };

    if comp.is_empty() {
        return Err(ParseError::Malformed(code.to_owned()));
    }

    Ok(Line::Compute {
        dest: dest.to_owned(),
        comp: comp.to_owned(),
        jump: jump.to_owned(),
    })
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn strips_comments_and_blank_lines() {
        let source = "// header comment\n@5\nD=A // inline\n\n   \n@3\nD=D+A\n";
        let lines = parse_lines(source).unwrap();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], Line::Address(Address::Literal(5)));
        assert_eq!(
            lines[1],
            Line::Compute {
                dest: "D".to_owned(),
                comp: "A".to_owned(),
                jump: "".to_owned(),
            }
        );
    }

    #[test]
    fn parses_label() {
        let lines = parse_lines("(LOOP)\n@LOOP\n0;JMP\n").unwrap();
        assert_eq!(lines[0], Line::Label("LOOP".to_owned()));
        assert_eq!(lines[1], Line::Address(Address::Symbol("LOOP".to_owned())));
    }

    #[test]
    fn rejects_oversized_literal() {
        let err = parse_lines("@32768\n");
        assert!(err.is_err());
    }

    #[test]
    fn rejects_malformed_compute() {
        let err = parse_lines("=;\n");
        assert!(err.is_err());
    }
}
