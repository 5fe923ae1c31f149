//! Recursive-descent Jack compiler (nand2tetris project 10/11).
//!
//! Compiles Jack source straight to Jack VM stack IR text in a single pass:
//! there is no separate AST, the parser's productions double as the code
//! generator (spec.md §4.1).

mod compiler;
mod error;
mod symbol_table;
mod tokenizer;
mod vm_writer;

pub use error::{Error, ParseError};

/// Compiles one `.jack` file's source into VM instruction text.
pub fn compile_file(file_label: &str, source: &str) -> Result<String, Error> {
    compiler::Compiler::compile(source).map_err(|source| Error {
        file: file_label.to_owned(),
        source,
    })
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn compiles_minimal_class() {
        let vm = compile_file(
            "Main",
            "class Main {
                function void main() {
                    return;
                }
            }",
        )
        .unwrap();
        assert!(vm.contains("function Main.main 0"));
        assert!(vm.contains("push constant 0"));
        assert!(vm.contains("return"));
    }

    #[test]
    fn reports_file_on_error() {
        let err = compile_file("Broken", "class 1Main { }").unwrap_err();
        assert_eq!(err.file, "Broken");
    }
}
