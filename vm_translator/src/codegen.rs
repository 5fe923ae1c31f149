use crate::command::{ArithOp, Command, Segment};
use crate::error::{Error, ParseError};
use std::fmt::Write as _;

/// Lowers parsed VM [`Command`]s into Hack assembly text.
///
/// One `Translator` accumulates the assembly for an entire invocation: in
/// directory mode that's the bootstrap plus every `.vm` file's lowering,
/// concatenated in directory-iteration order (spec.md §2/§4.2); in
/// single-file mode it's just that one file's lowering.
pub struct Translator {
    output: String,
    /// Base name of the `.vm` file currently being translated, used to scope
    /// `static` variables (spec.md §4.2/§6).
    filename_base: String,
    /// Fully-qualified name of the function currently being translated,
    /// used to scope `label`/`goto`/`if-goto` targets (spec.md §4.2).
    current_function: String,
    /// Monotonic counter shared by `call`'s return-address labels and the
    /// comparison idiom's branch labels -- unique by construction since the
    /// two use disjoint label name prefixes.
    label_counter: u32,
}

impl Translator {
    pub fn new() -> Translator {
        Translator {
            output: String::new(),
            filename_base: String::new(),
            current_function: String::new(),
            label_counter: 0,
        }
    }

    /// Emits the standard bootstrap: `SP = 256` followed by `call Sys.init
    /// 0`. Directory-mode only (spec.md §4.2).
    pub fn emit_bootstrap(&mut self) {
        self.write_line("@256");
        self.write_line("D=A");
        self.write_line("@SP");
        self.write_line("M=D");
        self.emit_call("Sys.init", 0);
    }

    /// Readies the translator for a new `.vm` file. Must be called before
    /// translating any of that file's commands (spec.md §5).
    pub fn set_filename_base(&mut self, filename_base: &str) {
        self.filename_base = filename_base.to_owned();
    }

    /// Translates every command in `source`, appending the result to this
    /// translator's accumulated output.
    pub fn translate_file(&mut self, source: &str, file_label: &str) -> Result<(), Error> {
        for (idx, raw) in source.lines().enumerate() {
            let Some(code) = strip_comment(raw) else {
                continue;
            };
            writeln!(self.output, "// {}", code).expect("String writes never fail");
            let command = crate::command::parse_command(code).map_err(|source| Error {
                file: file_label.to_owned(),
                line: idx + 1,
                source,
            })?;
            self.emit(&command).map_err(|source| Error {
                file: file_label.to_owned(),
                line: idx + 1,
                source,
            })?;
        }
        Ok(())
    }

    /// Appends the mandatory trailing infinite loop (spec.md §4.2).
    pub fn finish(&mut self) {
        self.write_line("(INF)");
        self.write_line("@INF");
        self.write_line("0;JMP");
    }

    pub fn into_output(self) -> String {
        self.output
    }

    fn emit(&mut self, command: &Command) -> Result<(), ParseError> {
        match command {
            Command::Arith(op) => self.emit_arith(*op),
            Command::Push(segment, index) => self.emit_push(*segment, *index)?,
            Command::Pop(segment, index) => self.emit_pop(*segment, *index)?,
            Command::Label(name) => self.emit_label(name),
            Command::Goto(name) => self.emit_goto(name),
            Command::IfGoto(name) => self.emit_if_goto(name),
            Command::Function(name, n_locals) => self.emit_function(name, *n_locals),
            Command::Call(name, n_args) => self.emit_call(name, *n_args),
            Command::Return => self.emit_return(),
        }
        Ok(())
    }

    // ~~ stack primitives ~~

    /// RAM[SP++] = D
    fn push_d(&mut self) {
        self.write_line("@SP");
        self.write_line("M=M+1");
        self.write_line("A=M-1");
        self.write_line("M=D");
    }

    /// D = RAM[--SP]
    fn pop_d(&mut self) {
        self.write_line("@SP");
        self.write_line("M=M-1");
        self.write_line("A=M");
        self.write_line("D=M");
    }

    fn base_register(segment: Segment) -> Option<&'static str> {
        match segment {
            Segment::Local => Some("LCL"),
            Segment::Argument => Some("ARG"),
            Segment::This => Some("THIS"),
            Segment::That => Some("THAT"),
            _ => None,
        }
    }

    fn direct_address(&self, segment: Segment, index: u16) -> Option<String> {
        match segment {
            Segment::Static => Some(format!("{}.{}", self.filename_base, index)),
            Segment::Temp => Some(format!("R{}", 5 + index)),
            Segment::Pointer => Some(if index == 0 { "THIS".to_owned() } else { "THAT".to_owned() }),
            _ => None,
        }
    }

    fn emit_push(&mut self, segment: Segment, index: u16) -> Result<(), ParseError> {
        if segment == Segment::Constant {
            self.write_line(&format!("@{}", index));
            self.write_line("D=A");
            self.push_d();
        } else if let Some(addr) = self.direct_address(segment, index) {
            self.write_line(&format!("@{}", addr));
            self.write_line("D=M");
            self.push_d();
        } else if let Some(base) = Self::base_register(segment) {
            self.write_line(&format!("@{}", base));
            self.write_line("D=M");
            self.write_line(&format!("@{}", index));
            self.write_line("A=D+A");
            self.write_line("D=M");
            self.push_d();
        } else {
            unreachable!("every Segment is either direct, indirect, or constant");
        }
        Ok(())
    }

    fn emit_pop(&mut self, segment: Segment, index: u16) -> Result<(), ParseError> {
        if segment == Segment::Constant {
            // `pop constant i` has no meaningful target; not reachable from
            // well-formed VM code, but fail closed rather than emit garbage.
            return Err(ParseError::Malformed(format!("pop constant {}", index)));
        } else if let Some(addr) = self.direct_address(segment, index) {
            self.pop_d();
            self.write_line(&format!("@{}", addr));
            self.write_line("M=D");
        } else if let Some(base) = Self::base_register(segment) {
            self.write_line(&format!("@{}", base));
            self.write_line("D=M");
            self.write_line(&format!("@{}", index));
            self.write_line("D=D+A");
            self.write_line("@R13");
            self.write_line("M=D");
            self.pop_d();
            self.write_line("@R13");
            self.write_line("A=M");
            self.write_line("M=D");
        } else {
            unreachable!("every Segment is either direct, indirect, or constant");
        }
        Ok(())
    }

    // ~~ arithmetic ~~

    fn emit_arith(&mut self, op: ArithOp) {
        match op {
            ArithOp::Neg => self.emit_unary("M=-M"),
            ArithOp::Not => self.emit_unary("M=!M"),
            ArithOp::Add => self.emit_binary("M=M+D"),
            ArithOp::Sub => self.emit_binary("M=M-D"),
            ArithOp::And => self.emit_binary("M=D&M"),
            ArithOp::Or => self.emit_binary("M=D|M"),
            ArithOp::Eq => self.emit_compare("JEQ"),
            ArithOp::Gt => self.emit_compare("JGT"),
            ArithOp::Lt => self.emit_compare("JLT"),
        }
    }

    fn emit_unary(&mut self, op: &str) {
        self.pop_d();
        self.write_line("@R13");
        self.write_line("M=D");
        self.write_line("@R13");
        self.write_line(op);
        self.write_line("@R13");
        self.write_line("D=M");
        self.push_d();
    }

    fn emit_binary(&mut self, op: &str) {
        // y -> R13, x -> R14, result left in R14.
        self.pop_d();
        self.write_line("@R13");
        self.write_line("M=D");
        self.pop_d();
        self.write_line("@R14");
        self.write_line("M=D");
        self.write_line("@R13");
        self.write_line("D=M");
        self.write_line("@R14");
        self.write_line(op);
        self.write_line("@R14");
        self.write_line("D=M");
        self.push_d();
    }

    fn emit_compare(&mut self, jump: &str) {
        let label = format!("INTERNAL.CMP.{}", self.label_counter);
        self.label_counter += 1;

        self.pop_d();
        self.write_line("@R13");
        self.write_line("M=D");
        self.pop_d();
        self.write_line("@R14");
        self.write_line("M=D");
        self.write_line("@R13");
        self.write_line("D=M");
        self.write_line("@R14");
        self.write_line("M=M-D");
        self.write_line("D=M");
        self.write_line("@R14");
        self.write_line("M=-1");
        self.write_line(&format!("@{}", label));
        self.write_line(&format!("D;{}", jump));
        self.write_line("@R14");
        self.write_line("M=0");
        self.write_line(&format!("({})", label));
        self.write_line("@R14");
        self.write_line("D=M");
        self.push_d();
    }

    // ~~ flow control ~~

    fn scoped_label(&self, name: &str) -> String {
        format!("{}${}", self.current_function, name)
    }

    fn emit_label(&mut self, name: &str) {
        let label = self.scoped_label(name);
        self.write_line(&format!("({})", label));
    }

    fn emit_goto(&mut self, name: &str) {
        let label = self.scoped_label(name);
        self.write_line(&format!("@{}", label));
        self.write_line("0;JMP");
    }

    fn emit_if_goto(&mut self, name: &str) {
        let label = self.scoped_label(name);
        self.pop_d();
        self.write_line(&format!("@{}", label));
        self.write_line("D;JNE");
    }

    // ~~ function protocol ~~

    fn emit_function(&mut self, name: &str, n_locals: u16) {
        self.current_function = name.to_owned();
        self.write_line(&format!("({})", name));
        for _ in 0..n_locals {
            self.write_line("@0");
            self.write_line("D=A");
            self.push_d();
        }
    }

    fn emit_call(&mut self, name: &str, n_args: u16) {
        let return_label = format!("{}$ret.{}", self.current_function, self.label_counter);
        self.label_counter += 1;

        self.write_line(&format!("@{}", return_label));
        self.write_line("D=A");
        self.push_d();
        for base in ["LCL", "ARG", "THIS", "THAT"] {
            self.write_line(&format!("@{}", base));
            self.write_line("D=M");
            self.push_d();
        }
        self.write_line("@SP");
        self.write_line("D=M");
        self.write_line(&format!("@{}", 5 + n_args));
        self.write_line("D=D-A");
        self.write_line("@ARG");
        self.write_line("M=D");
        self.write_line("@SP");
        self.write_line("D=M");
        self.write_line("@LCL");
        self.write_line("M=D");
        self.write_line(&format!("@{}", name));
        self.write_line("0;JMP");
        self.write_line(&format!("({})", return_label));
    }

    fn emit_return(&mut self) {
        self.write_line("@LCL");
        self.write_line("D=M");
        self.write_line("@R13");
        self.write_line("M=D");

        self.pop_d();
        self.write_line("@ARG");
        self.write_line("A=M");
        self.write_line("M=D");

        self.write_line("@ARG");
        self.write_line("D=M");
        self.write_line("@SP");
        self.write_line("M=D+1");

        for (offset, dest) in [(1, "THAT"), (2, "THIS"), (3, "ARG"), (4, "LCL")] {
            self.write_line("@R13");
            self.write_line("D=M");
            self.write_line(&format!("@{}", offset));
            self.write_line("D=D-A");
            self.write_line("A=D");
            self.write_line("D=M");
            self.write_line(&format!("@{}", dest));
            self.write_line("M=D");
        }

        self.write_line("@R13");
        self.write_line("D=M");
        self.write_line("@5");
        self.write_line("D=D-A");
        self.write_line("A=D");
        self.write_line("A=M");
        self.write_line("0;JMP");
    }

    fn write_line(&mut self, line: &str) {
        self.output.push_str(line);
        self.output.push('\n');
    }
}

impl Default for Translator {
    fn default() -> Translator {
        Translator::new()
    }
}

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
