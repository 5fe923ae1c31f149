//! Translates Jack VM stack IR into Hack assembly (nand2tetris project 7/8).
//!
//! A translation unit is either a single `.vm` file or a directory of them.
//! Directory mode concatenates every file's lowering behind a bootstrap
//! prologue; single-file mode skips the bootstrap entirely.

mod codegen;
mod command;
mod error;

use codegen::Translator;
pub use command::{ArithOp, Command, Segment};
pub use error::{Error, ParseError};
use std::path::Path;

/// One `.vm` file to translate, paired with the filename base used to scope
/// its `static` segment (spec.md §4.2/§6).
pub struct VmFile<'a> {
    pub filename_base: &'a str,
    pub source: &'a str,
}

/// Translates a single `.vm` file's source with no bootstrap (spec.md §4.2).
pub fn translate_file(filename_base: &str, source: &str) -> Result<String, Error> {
    let mut translator = Translator::new();
    translator.set_filename_base(filename_base);
    translator.translate_file(source, filename_base)?;
    translator.finish();
    Ok(translator.into_output())
}

/// Translates a directory's worth of `.vm` files, in the given order, behind
/// a single bootstrap prologue (spec.md §4.2/§5).
///
/// `files` must already be ordered the way the caller wants them to appear
/// in the output; this crate does not impose a canonicalization order on
/// directory iteration, matching the sequential-per-file model of spec.md §5.
pub fn translate_directory(files: &[VmFile]) -> Result<String, Error> {
    let mut translator = Translator::new();
    translator.emit_bootstrap();
    for file in files {
        translator.set_filename_base(file.filename_base);
        translator.translate_file(file.source, file.filename_base)?;
    }
    translator.finish();
    Ok(translator.into_output())
}

/// Derives the `static` segment's filename base from a `.vm` path: its file
/// stem, matching the reference implementation (`original_source/08`).
pub fn filename_base(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn single_file_has_no_bootstrap() {
        let asm = translate_file("Foo", "push constant 7\npop local 0\n").unwrap();
        assert!(!asm.contains("call Sys.init"));
        assert!(asm.contains("@7"));
    }

    #[test]
    fn directory_mode_emits_bootstrap_once() {
        let files = [
            VmFile { filename_base: "Main", source: "function Main.main 0\npush constant 0\nreturn\n" },
            VmFile { filename_base: "Sys", source: "function Sys.init 0\ncall Main.main 0\nreturn\n" },
        ];
        let asm = translate_directory(&files).unwrap();
        assert_eq!(asm.matches("@256").count(), 1);
        assert!(asm.contains("(Main.main)"));
        assert!(asm.contains("(Sys.init)"));
    }

    #[test]
    fn static_segment_is_scoped_per_file() {
        let asm = translate_file("Foo", "push constant 1\npop static 0\n").unwrap();
        assert!(asm.contains("@Foo.0"));
    }

    #[test]
    fn reports_file_and_line_on_error() {
        let err = translate_file("Foo", "push constant 1\nbogus\n").unwrap_err();
        assert_eq!(err.file, "Foo");
        assert_eq!(err.line, 2);
    }
}
