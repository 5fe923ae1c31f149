#[macro_use]
extern crate clap;

use clap::Arg;
use std::fs::File;
use std::io::prelude::*;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

#[derive(Debug)]
enum IOErrorContext {
    ReadInput,
    WriteOutput,
    ListDirectory,
}

#[derive(Debug)]
enum Error {
    Compile(jackc::Error),
    Io(std::io::Error, IOErrorContext, PathBuf),
    NoJackFiles(PathBuf),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Io(err, context, path) => write!(
                f,
                "{} \"{}\" failed: {}",
                match context {
                    IOErrorContext::ReadInput => "Reading input",
                    IOErrorContext::WriteOutput => "Writing output",
                    IOErrorContext::ListDirectory => "Listing directory",
                },
                path.display(),
                err
            ),
            Error::Compile(err) => write!(f, "Compiling failed: {}", err),
            Error::NoJackFiles(path) => {
                write!(f, "No .jack files found in directory \"{}\"", path.display())
            }
        }
    }
}

fn main() {
    let matches = app_from_crate!()
        .arg(
            Arg::with_name("INPUT")
                .help("Sets the .jack file or directory to compile")
                .required(true)
                .index(1),
        )
        .get_matches();

    let input = matches.value_of("INPUT").unwrap();

    match run(input) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(err) => {
            eprintln!("{}", err);
            std::process::exit(1);
        }
    }
}

fn compile_one(input_path: &Path) -> Result<(), Error> {
    let file = File::open(input_path)
        .map_err(|err| Error::Io(err, IOErrorContext::ReadInput, input_path.to_owned()))?;
    let mut reader = BufReader::new(file);
    let mut source = String::new();
    reader
        .read_to_string(&mut source)
        .map_err(|err| Error::Io(err, IOErrorContext::ReadInput, input_path.to_owned()))?;

    let file_label = input_path
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let vm = jackc::compile_file(&file_label, &source).map_err(Error::Compile)?;

    let output_path = input_path.with_extension("vm");
    let output_file = File::create(&output_path)
        .map_err(|err| Error::Io(err, IOErrorContext::WriteOutput, output_path.clone()))?;
    let mut writer = BufWriter::new(output_file);
    writer
        .write_all(vm.as_bytes())
        .map_err(|err| Error::Io(err, IOErrorContext::WriteOutput, output_path.clone()))?;

    println!("compiled {} -> {}", input_path.display(), output_path.display());
    Ok(())
}

/// Returns `Ok(true)` if every file compiled, `Ok(false)` if at least one
/// file in a directory run failed (already reported to stderr), or `Err`
/// for a failure that aborts before any per-file work could start.
fn run(input: &str) -> Result<bool, Error> {
    let input_path = Path::new(input);

    if input_path.is_dir() {
        let mut jack_paths: Vec<PathBuf> = std::fs::read_dir(input_path)
            .map_err(|err| Error::Io(err, IOErrorContext::ListDirectory, input_path.to_owned()))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.extension().map_or(false, |ext| ext == "jack"))
            .collect();
        jack_paths.sort();

        if jack_paths.is_empty() {
            return Err(Error::NoJackFiles(input_path.to_owned()));
        }

        // A failing file does not stop its siblings from compiling (spec.md
        // §7): every file gets a chance, only the exit code reflects failure.
        let mut all_ok = true;
        for path in &jack_paths {
            if let Err(err) = compile_one(path) {
                eprintln!("{}", err);
                all_ok = false;
            }
        }
        Ok(all_ok)
    } else {
        compile_one(input_path).map(|()| true)
    }
}
