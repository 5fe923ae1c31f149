use crate::error::ParseError;

/// The eight VM memory segments (spec.md §3).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Segment {
    Constant,
    Argument,
    Local,
    Static,
    This,
    That,
    Pointer,
    Temp,
}

impl std::str::FromStr for Segment {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Segment, ParseError> {
        match s {
            "constant" => Ok(Segment::Constant),
            "argument" => Ok(Segment::Argument),
            "local" => Ok(Segment::Local),
            "static" => Ok(Segment::Static),
            "this" => Ok(Segment::This),
            "that" => Ok(Segment::That),
            "pointer" => Ok(Segment::Pointer),
            "temp" => Ok(Segment::Temp),
            _ => Err(ParseError::UnknownSegment(s.to_owned())),
        }
    }
}

/// The nine arithmetic/logical VM commands (spec.md §3).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ArithOp {
    Add,
    Sub,
    Neg,
    Eq,
    Gt,
    Lt,
    And,
    Or,
    Not,
}

impl ArithOp {
    fn from_mnemonic(s: &str) -> Option<ArithOp> {
        match s {
            "add" => Some(ArithOp::Add),
            "sub" => Some(ArithOp::Sub),
            "neg" => Some(ArithOp::Neg),
            "eq" => Some(ArithOp::Eq),
            "gt" => Some(ArithOp::Gt),
            "lt" => Some(ArithOp::Lt),
            "and" => Some(ArithOp::And),
            "or" => Some(ArithOp::Or),
            "not" => Some(ArithOp::Not),
            _ => None,
        }
    }
}

/// One parsed VM instruction (spec.md §3).
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    Arith(ArithOp),
    Push(Segment, u16),
    Pop(Segment, u16),
    Label(String),
    Goto(String),
    IfGoto(String),
    Function(String, u16),
    Call(String, u16),
    Return,
}

fn parse_index(raw: &str) -> Result<u16, ParseError> {
    raw.parse().map_err(|_| ParseError::BadIndex(raw.to_owned()))
}

/// Parses one already comment-stripped, non-blank VM source line into a
/// [`Command`]. The explicit set of recognized opcodes is used (spec.md §9
/// notes that a "first token has exactly one token -> arithmetic" heuristic
/// is a known shortcut in the reference source, not the correct rule).
pub fn parse_command(line: &str) -> Result<Command, ParseError> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let head = tokens[0];

    if let Some(op) = ArithOp::from_mnemonic(head) {
        if tokens.len() != 1 {
            return Err(ParseError::Malformed(line.to_owned()));
        }
        return Ok(Command::Arith(op));
    }

    match head {
        "push" | "pop" => {
            let [_, segment, index] = require::<3>(&tokens, line)?;
            let segment: Segment = segment.parse()?;
            let index = parse_index(index)?;
            if head == "push" {
                Ok(Command::Push(segment, index))
            } else {
                Ok(Command::Pop(segment, index))
            }
        }
        "label" => {
            let [_, name] = require::<2>(&tokens, line)?;
            Ok(Command::Label(name.to_owned()))
        }
        "goto" => {
            let [_, name] = require::<2>(&tokens, line)?;
            Ok(Command::Goto(name.to_owned()))
        }
        "if-goto" => {
            let [_, name] = require::<2>(&tokens, line)?;
            Ok(Command::IfGoto(name.to_owned()))
        }
        "function" => {
            let [_, name, n] = require::<3>(&tokens, line)?;
            Ok(Command::Function(name.to_owned(), parse_index(n)?))
        }
        "call" => {
            let [_, name, n] = require::<3>(&tokens, line)?;
            Ok(Command::Call(name.to_owned(), parse_index(n)?))
        }
        "return" => {
            if tokens.len() != 1 {
                return Err(ParseError::Malformed(line.to_owned()));
            }
            Ok(Command::Return)
        }
        _ => Err(ParseError::UnknownCommand(head.to_owned())),
    }
}

fn require<'a, const N: usize>(
    tokens: &[&'a str],
    line: &str,
) -> Result<[&'a str; N], ParseError> {
    <[&str; N]>::try_from(tokens).map_err(|_| ParseError::Malformed(line.to_owned()))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parses_arithmetic() {
        assert_eq!(parse_command("add").unwrap(), Command::Arith(ArithOp::Add));
        assert_eq!(parse_command("not").unwrap(), Command::Arith(ArithOp::Not));
    }

    #[test]
    fn parses_push_pop() {
        assert_eq!(
            parse_command("push constant 7").unwrap(),
            Command::Push(Segment::Constant, 7)
        );
        assert_eq!(
            parse_command("pop local 0").unwrap(),
            Command::Pop(Segment::Local, 0)
        );
    }

    #[test]
    fn parses_function_call_return() {
        assert_eq!(
            parse_command("function Foo.main 1").unwrap(),
            Command::Function("Foo.main".to_owned(), 1)
        );
        assert_eq!(
            parse_command("call Math.multiply 2").unwrap(),
            Command::Call("Math.multiply".to_owned(), 2)
        );
        assert_eq!(parse_command("return").unwrap(), Command::Return);
    }

    #[test]
    fn rejects_unknown_command() {
        assert!(parse_command("frobnicate").is_err());
    }

    #[test]
    fn rejects_unknown_segment() {
        assert!(parse_command("push nonsense 0").is_err());
    }

    #[test]
    fn rejects_wrong_arity() {
        assert!(parse_command("push constant").is_err());
        assert!(parse_command("add 1").is_err());
    }
}
