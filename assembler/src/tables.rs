use crate::error::ParseError;

/// Encodes a `dest` mnemonic (any subset of `A`, `D`, `M`, in any order) as
/// its 3-bit field. The letters are sorted before lookup so `"MD"` and
/// `"DM"` both resolve -- matches the reference assembler's `decoder.dest`.
pub fn encode_dest(dest: &str) -> Result<u8, ParseError> {
    let mut letters: Vec<char> = dest.chars().collect();
    letters.sort_unstable();
    let sorted: String = letters.into_iter().collect();

    let bits = match sorted.as_str() {
        "" => 0b000,
        "M" => 0b001,
        "D" => 0b010,
        "DM" => 0b011,
        "A" => 0b100,
        "AM" => 0b101,
        "AD" => 0b110,
        "ADM" => 0b111,
        _ => return Err(ParseError::UnknownDest(dest.to_owned())),
    };
    Ok(bits)
}

/// Encodes a `comp` mnemonic as its `a` bit plus 6-bit ALU code. `M` in the
/// mnemonic selects `a = 1` and is treated as `A` in the lookup table, per
/// spec.md §4.3.
pub fn encode_comp(comp: &str) -> Result<(u8, u8), ParseError> {
    let uses_m = comp.contains('M');
    let a = if uses_m { 1 } else { 0 };
    let normalized = comp.replace('M', "A");

    let code = match normalized.as_str() {
        "0" => 0b101010,
        "1" => 0b111111,
        "-1" => 0b111010,
        "D" => 0b001100,
        "A" => 0b110000,
        "!D" => 0b001101,
        "!A" => 0b110001,
        "-D" => 0b001111,
        "-A" => 0b110011,
        "D+1" => 0b011111,
        "A+1" => 0b110111,
        "D-1" => 0b001110,
        "A-1" => 0b110010,
        "D+A" => 0b000010,
        "D-A" => 0b010011,
        "A-D" => 0b000111,
        "D&A" => 0b000000,
        "D|A" => 0b010101,
        _ => return Err(ParseError::UnknownComp(comp.to_owned())),
    };
    Ok((a, code))
}

/// Encodes a `jump` mnemonic as its 3-bit field.
pub fn encode_jump(jump: &str) -> Result<u8, ParseError> {
    let bits = match jump {
        "" => 0b000,
        "JGT" => 0b001,
        "JEQ" => 0b010,
        "JGE" => 0b011,
        "JLT" => 0b100,
        "JNE" => 0b101,
        "JLE" => 0b110,
        "JMP" => 0b111,
        _ => return Err(ParseError::UnknownJump(jump.to_owned())),
    };
    Ok(bits)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn dest_accepts_any_letter_order() {
        assert_eq!(encode_dest("MD").unwrap(), encode_dest("DM").unwrap());
        assert_eq!(encode_dest("").unwrap(), 0b000);
        assert_eq!(encode_dest("ADM").unwrap(), 0b111);
    }

    #[test]
    fn comp_detects_m_and_substitutes() {
        let (a, code) = encode_comp("M").unwrap();
        assert_eq!(a, 1);
        assert_eq!(code, 0b110000);

        let (a, code) = encode_comp("A").unwrap();
        assert_eq!(a, 0);
        assert_eq!(code, 0b110000);
    }

    #[test]
    fn comp_d_plus_a() {
        assert_eq!(encode_comp("D+A").unwrap(), (0, 0b000010));
    }

    #[test]
    fn jump_table_round_trip() {
        assert_eq!(encode_jump("JNE").unwrap(), 0b101);
        assert!(encode_jump("JBOGUS").is_err());
    }

    #[test]
    fn unknown_mnemonics_error() {
        assert!(encode_dest("X").is_err());
        assert!(encode_comp("Q").is_err());
    }
}
