use crate::error::ParseError;
use crate::symbol_table::{SymbolInfo, SymbolTable, VarKind};
use crate::tokenizer::{Token, Tokenizer};
use crate::vm_writer::{ArithOp, Segment, VmWriter};

const EXPRESSION_OPS: &[char] = &['+', '-', '*', '/', '&', '|', '<', '>', '='];

/// Recursive-descent compiler for a single Jack source file. Jack is LL(1),
/// so no backtracking or separate AST pass is needed: parsing and VM code
/// generation happen in the same walk (spec.md §4.1).
pub struct Compiler {
    tokens: Tokenizer,
    writer: VmWriter,
    class_table: SymbolTable,
    subroutine_table: SymbolTable,
    class_name: String,
    label_count: u32,
}

impl Compiler {
    pub fn compile(source: &str) -> Result<String, ParseError> {
        let mut compiler = Compiler {
            tokens: Tokenizer::new(source)?,
            writer: VmWriter::new(),
            class_table: SymbolTable::new(),
            subroutine_table: SymbolTable::new(),
            class_name: String::new(),
            label_count: 0,
        };
        compiler.compile_class()?;
        Ok(compiler.writer.into_output())
    }

    // ~~ token helpers ~~

    fn current_text(&self) -> Result<String, ParseError> {
        self.tokens
            .current()
            .map(Token::text)
            .ok_or(ParseError::UnexpectedEof)
    }

    /// Asserts the current token's literal text matches `expected`, then
    /// advances past it. Used for fixed keywords/symbols.
    fn expect(&mut self, expected: &str) -> Result<String, ParseError> {
        let found = self.current_text()?;
        if found != expected {
            return Err(ParseError::Expected {
                expected: vec![expected.to_owned()],
                found,
            });
        }
        self.tokens.advance();
        Ok(found)
    }

    fn expect_one_of(&mut self, options: &[&str]) -> Result<String, ParseError> {
        let found = self.current_text()?;
        if options.contains(&found.as_str()) {
            self.tokens.advance();
            return Ok(found);
        }
        Err(ParseError::Expected {
            expected: options.iter().map(|s| s.to_string()).collect(),
            found,
        })
    }

    fn expect_identifier(&mut self) -> Result<String, ParseError> {
        match self.tokens.current() {
            Some(Token::Identifier(name)) => {
                let name = name.clone();
                self.tokens.advance();
                Ok(name)
            }
            Some(other) => Err(ParseError::Expected {
                expected: vec!["identifier".to_owned()],
                found: other.text(),
            }),
            None => Err(ParseError::UnexpectedEof),
        }
    }

    // ~~ symbol resolution ~~

    /// Resolves an identifier against the subroutine table first, then the
    /// class table, mapping its Jack `VarKind` to the VM segment it lives in
    /// (spec.md §4.1's kind->segment table). That mapping is deliberately
    /// kept here rather than in `SymbolTable`: the table only knows Jack.
    fn resolve_symbol(&self, name: &str) -> Result<(SymbolInfo, Segment), ParseError> {
        let info = self
            .subroutine_table
            .get(name)
            .or_else(|| self.class_table.get(name))
            .ok_or_else(|| ParseError::UnresolvedSymbol(name.to_owned()))?
            .clone();
        let segment = match info.kind {
            VarKind::Arg => Segment::Argument,
            VarKind::Field => Segment::This,
            VarKind::Static => Segment::Static,
            VarKind::Var => Segment::Local,
        };
        Ok((info, segment))
    }

    // ~~ grammar productions ~~

    fn compile_class(&mut self) -> Result<(), ParseError> {
        self.expect("class")?;
        self.class_name = self.expect_identifier()?;
        self.expect("{")?;
        while matches!(self.current_text()?.as_str(), "static" | "field") {
            self.compile_class_var_dec()?;
        }
        while matches!(
            self.current_text()?.as_str(),
            "constructor" | "function" | "method"
        ) {
            self.compile_subroutine()?;
        }
        self.expect("}")?;
        Ok(())
    }

    fn compile_class_var_dec(&mut self) -> Result<(), ParseError> {
        let kind = match self.expect_one_of(&["static", "field"])?.as_str() {
            "static" => VarKind::Static,
            _ => VarKind::Field,
        };
        let jack_type = self.compile_type()?;
        loop {
            let name = self.expect_identifier()?;
            self.class_table.define(&name, &jack_type, kind);
            if self.current_text()? != "," {
                break;
            }
            self.expect(",")?;
        }
        self.expect(";")?;
        Ok(())
    }

    fn compile_subroutine(&mut self) -> Result<(), ParseError> {
        self.subroutine_table.reset();

        let subroutine_kind = self.expect_one_of(&["constructor", "function", "method"])?;

        if subroutine_kind == "method" {
            self.subroutine_table
                .define("this", &self.class_name.clone(), VarKind::Arg);
        }

        if self.current_text()? == "void" {
            self.expect("void")?;
        } else {
            self.compile_type()?;
        }

        let func_name = self.expect_identifier()?;

        self.expect("(")?;
        self.compile_parameter_list()?;
        self.expect(")")?;

        self.expect("{")?;
        while self.current_text()? == "var" {
            self.compile_var_dec()?;
        }

        let n_vars = self.subroutine_table.var_count(VarKind::Var);
        self.writer
            .write_function(&format!("{}.{}", self.class_name, func_name), n_vars);

        if subroutine_kind == "constructor" {
            let n_fields = self.class_table.var_count(VarKind::Field);
            self.writer.write_push(Segment::Constant, n_fields);
            self.writer.write_call("Memory.alloc", 1);
            self.writer.write_pop(Segment::Pointer, 0);
        }

        if subroutine_kind == "method" {
            self.writer.write_push(Segment::Argument, 0);
            self.writer.write_pop(Segment::Pointer, 0);
        }

        self.compile_statements()?;
        self.expect("}")?;
        Ok(())
    }

    fn compile_parameter_list(&mut self) -> Result<(), ParseError> {
        while self.current_text()? != ")" {
            let jack_type = self.compile_type()?;
            let name = self.expect_identifier()?;
            self.subroutine_table.define(&name, &jack_type, VarKind::Arg);
            if self.current_text()? != "," {
                break;
            }
            self.expect(",")?;
        }
        Ok(())
    }

    fn compile_var_dec(&mut self) -> Result<(), ParseError> {
        self.expect("var")?;
        let jack_type = self.compile_type()?;
        loop {
            let name = self.expect_identifier()?;
            self.subroutine_table.define(&name, &jack_type, VarKind::Var);
            if self.current_text()? != "," {
                break;
            }
            self.expect(",")?;
        }
        self.expect(";")?;
        Ok(())
    }

    fn compile_statements(&mut self) -> Result<(), ParseError> {
        loop {
            match self.current_text()?.as_str() {
                "let" => self.compile_let()?,
                "if" => self.compile_if()?,
                "while" => self.compile_while()?,
                "do" => self.compile_do()?,
                "return" => self.compile_return()?,
                _ => break,
            }
        }
        Ok(())
    }

    fn compile_let(&mut self) -> Result<(), ParseError> {
        self.expect("let")?;
        let var_name = self.expect_identifier()?;
        let (info, segment) = self.resolve_symbol(&var_name)?;

        if self.current_text()? != "[" {
            self.expect("=")?;
            self.compile_expression()?;
            self.expect(";")?;
            self.writer.write_pop(segment, info.index);
        } else {
            self.writer.write_push(segment, info.index);
            self.expect("[")?;
            self.compile_expression()?;
            self.expect("]")?;
            self.writer.write_arithmetic(ArithOp::Add);
            self.expect("=")?;
            self.compile_expression()?;
            self.expect(";")?;
            self.writer.write_pop(Segment::Temp, 0);
            self.writer.write_pop(Segment::Pointer, 1);
            self.writer.write_push(Segment::Temp, 0);
            self.writer.write_pop(Segment::That, 0);
        }
        Ok(())
    }

    fn compile_if(&mut self) -> Result<(), ParseError> {
        let else_label = format!("{}.{}.else", self.class_name, self.label_count);
        let end_label = format!("{}.{}.if_end", self.class_name, self.label_count);
        self.label_count += 1;

        self.expect("if")?;
        self.expect("(")?;
        self.compile_expression()?;
        self.writer.write_arithmetic(ArithOp::Not);
        self.writer.write_if(&else_label);
        self.expect(")")?;
        self.expect("{")?;
        self.compile_statements()?;
        self.expect("}")?;
        self.writer.write_goto(&end_label);
        self.writer.write_label(&else_label);
        if self.current_text()? == "else" {
            self.expect("else")?;
            self.expect("{")?;
            self.compile_statements()?;
            self.expect("}")?;
        }
        self.writer.write_label(&end_label);
        Ok(())
    }

    fn compile_while(&mut self) -> Result<(), ParseError> {
        let start_label = format!("{}.{}.while_start", self.class_name, self.label_count);
        let end_label = format!("{}.{}.while_end", self.class_name, self.label_count);
        self.label_count += 1;

        self.writer.write_label(&start_label);
        self.expect("while")?;
        self.expect("(")?;
        self.compile_expression()?;
        self.writer.write_arithmetic(ArithOp::Not);
        self.writer.write_if(&end_label);
        self.expect(")")?;
        self.expect("{")?;
        self.compile_statements()?;
        self.writer.write_goto(&start_label);
        self.expect("}")?;
        self.writer.write_label(&end_label);
        Ok(())
    }

    fn compile_do(&mut self) -> Result<(), ParseError> {
        self.expect("do")?;
        self.compile_term()?;
        self.expect(";")?;
        self.writer.write_pop(Segment::Temp, 0);
        Ok(())
    }

    fn compile_return(&mut self) -> Result<(), ParseError> {
        self.expect("return")?;
        if self.current_text()? != ";" {
            self.compile_expression()?;
        } else {
            self.writer.write_push(Segment::Constant, 0);
        }
        self.expect(";")?;
        self.writer.write_return();
        Ok(())
    }

    fn compile_expression(&mut self) -> Result<(), ParseError> {
        self.compile_term()?;
        while let Ok(text) = self.current_text() {
            let Some(op) = text.chars().next().filter(|c| text.len() == 1 && EXPRESSION_OPS.contains(c)) else {
                break;
            };
            self.tokens.advance();
            self.compile_term()?;
            match op {
                '+' => self.writer.write_arithmetic(ArithOp::Add),
                '-' => self.writer.write_arithmetic(ArithOp::Sub),
                '*' => self.writer.write_call("Math.multiply", 2),
                '/' => self.writer.write_call("Math.divide", 2),
                '&' => self.writer.write_arithmetic(ArithOp::And),
                '|' => self.writer.write_arithmetic(ArithOp::Or),
                '<' => self.writer.write_arithmetic(ArithOp::Lt),
                '>' => self.writer.write_arithmetic(ArithOp::Gt),
                '=' => self.writer.write_arithmetic(ArithOp::Eq),
                _ => unreachable!(),
            }
        }
        Ok(())
    }

    fn compile_term(&mut self) -> Result<(), ParseError> {
        let token = self.tokens.current().cloned().ok_or(ParseError::UnexpectedEof)?;
        let text = token.text();
        self.tokens.advance();

        match &token {
            Token::IntConst(n) => {
                self.writer.write_push(Segment::Constant, *n);
            }
            Token::StringConst(s) => {
                self.writer.write_push(Segment::Constant, s.chars().count() as u16);
                self.writer.write_call("String.new", 1);
                for ch in s.chars() {
                    self.writer.write_push(Segment::Constant, ch as u16);
                    self.writer.write_call("String.appendChar", 2);
                }
            }
            Token::Keyword(kw) => match kw.as_str() {
                "true" => {
                    self.writer.write_push(Segment::Constant, 1);
                    self.writer.write_arithmetic(ArithOp::Neg);
                }
                "false" | "null" => {
                    self.writer.write_push(Segment::Constant, 0);
                }
                "this" => {
                    self.writer.write_push(Segment::Pointer, 0);
                }
                _ => {
                    return Err(ParseError::Expected {
                        expected: vec!["keyword constant".to_owned()],
                        found: text,
                    })
                }
            },
            Token::Symbol('-') | Token::Symbol('~') => {
                self.compile_term()?;
                if text == "-" {
                    self.writer.write_arithmetic(ArithOp::Neg);
                } else {
                    self.writer.write_arithmetic(ArithOp::Not);
                }
            }
            Token::Symbol('(') => {
                self.compile_expression()?;
                self.expect(")")?;
            }
            Token::Identifier(name) => {
                let next = self.current_text().ok();
                match next.as_deref() {
                    Some("[") => {
                        let (info, segment) = self.resolve_symbol(name)?;
                        self.writer.write_push(segment, info.index);
                        self.expect("[")?;
                        self.compile_expression()?;
                        self.expect("]")?;
                        self.writer.write_arithmetic(ArithOp::Add);
                        self.writer.write_pop(Segment::Pointer, 1);
                        self.writer.write_push(Segment::That, 0);
                    }
                    Some("(") => {
                        // subroutineName '(' expressionList ')': a call on
                        // the current object, so push `this` as argument 0.
                        self.writer.write_push(Segment::Pointer, 0);
                        self.expect("(")?;
                        let n_args = self.compile_expression_list()?;
                        self.expect(")")?;
                        self.writer
                            .write_call(&format!("{}.{}", self.class_name, name), n_args + 1);
                    }
                    Some(".") => {
                        let (call_name, extra_arg) = if self.subroutine_table.has_symbol(name)
                            || self.class_table.has_symbol(name)
                        {
                            let (info, segment) = self.resolve_symbol(name)?;
                            self.writer.write_push(segment, info.index);
                            (info.jack_type.clone(), 1)
                        } else {
                            (name.clone(), 0)
                        };
                        self.expect(".")?;
                        let subr_name = self.expect_identifier()?;
                        self.expect("(")?;
                        let n_args = self.compile_expression_list()?;
                        self.expect(")")?;
                        self.writer
                            .write_call(&format!("{}.{}", call_name, subr_name), n_args + extra_arg);
                    }
                    _ => {
                        let (info, segment) = self.resolve_symbol(name)?;
                        self.writer.write_push(segment, info.index);
                    }
                }
            }
            _ => {
                return Err(ParseError::Expected {
                    expected: vec!["term".to_owned()],
                    found: text,
                })
            }
        }
        Ok(())
    }

    fn compile_expression_list(&mut self) -> Result<u16, ParseError> {
        let mut n_exprs = 0;
        while self.current_text()? != ")" {
            self.compile_expression()?;
            n_exprs += 1;
            if self.current_text()? != "," {
                break;
            }
            self.expect(",")?;
        }
        Ok(n_exprs)
    }

    fn compile_type(&mut self) -> Result<String, ParseError> {
        match self.tokens.current() {
            Some(Token::Identifier(_)) => self.expect_identifier(),
            _ => self.expect_one_of(&["int", "char", "boolean"]),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn compile(source: &str) -> String {
        Compiler::compile(source).unwrap()
    }

    #[test]
    fn compiles_scalar_let_with_multiplication() {
        let vm = compile(
            "class Main {
                function void main() {
                    var int x;
                    let x = 2 * 3;
                    return;
                }
            }",
        );
        assert!(vm.contains("function Main.main 1"));
        assert!(vm.contains("push constant 2\n"));
        assert!(vm.contains("push constant 3\n"));
        assert!(vm.contains("call Math.multiply 2\n"));
        assert!(vm.contains("pop local 0\n"));
    }

    #[test]
    fn compiles_array_element_store() {
        let vm = compile(
            "class Main {
                function void main() {
                    var Array a;
                    let a[0] = 5;
                    return;
                }
            }",
        );
        assert!(vm.contains("pop temp 0\n"));
        assert!(vm.contains("pop pointer 1\n"));
        assert!(vm.contains("push temp 0\n"));
        assert!(vm.contains("pop that 0\n"));
    }

    #[test]
    fn compiles_method_call_on_field_and_static_function_fallback() {
        let vm = compile(
            "class Main {
                field Sprite sprite;
                method void run() {
                    do sprite.draw();
                    do Output.println();
                    return;
                }
            }",
        );
        assert!(vm.contains("push this 0\n"));
        assert!(vm.contains("call Sprite.draw 1\n"));
        assert!(vm.contains("call Output.println 0\n"));
    }

    #[test]
    fn compiles_constructor_allocation() {
        let vm = compile(
            "class Point {
                field int x, y;
                constructor Point new(int ax, int ay) {
                    let x = ax;
                    let y = ay;
                    return this;
                }
            }",
        );
        assert!(vm.contains("push constant 2\n"));
        assert!(vm.contains("call Memory.alloc 1\n"));
        assert!(vm.contains("pop pointer 0\n"));
        assert!(vm.contains("push pointer 0\n"));
    }

    #[test]
    fn rejects_unresolved_identifier() {
        let err = Compiler::compile(
            "class Main {
                function void main() {
                    let x = 1;
                    return;
                }
            }",
        )
        .unwrap_err();
        assert_eq!(err, ParseError::UnresolvedSymbol("x".to_owned()));
    }
}
