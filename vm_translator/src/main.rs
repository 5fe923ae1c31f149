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
    Translate(hack_vm::Error),
    Io(std::io::Error, IOErrorContext, PathBuf),
    NoVmFiles(PathBuf),
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
            Error::Translate(err) => write!(f, "Translating failed: {}", err),
            Error::NoVmFiles(path) => {
                write!(f, "No .vm files found in directory \"{}\"", path.display())
            }
        }
    }
}

fn main() {
    let matches = app_from_crate!()
        .arg(
            Arg::with_name("INPUT")
                .help("Sets the .vm file or directory to translate")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::with_name("output")
                .short("o")
                .long("output")
                .takes_value(true)
                .value_name("OUTPUT")
                .help("Sets the .asm file to write to"),
        )
        .get_matches();

    let input = matches.value_of("INPUT").unwrap();
    let output = matches.value_of("output");

    if let Err(err) = run(input, output) {
        eprintln!("{}", err);
        std::process::exit(1);
    }
}

fn read_file(path: &Path) -> Result<String, Error> {
    let file = File::open(path)
        .map_err(|err| Error::Io(err, IOErrorContext::ReadInput, path.to_owned()))?;
    let mut reader = BufReader::new(file);
    let mut source = String::new();
    reader
        .read_to_string(&mut source)
        .map_err(|err| Error::Io(err, IOErrorContext::ReadInput, path.to_owned()))?;
    Ok(source)
}

fn run(input: &str, output: Option<&str>) -> Result<(), Error> {
    let input_path = Path::new(input);

    let (asm, output_path) = if input_path.is_dir() {
        let mut vm_paths: Vec<PathBuf> = std::fs::read_dir(input_path)
            .map_err(|err| Error::Io(err, IOErrorContext::ListDirectory, input_path.to_owned()))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.extension().map_or(false, |ext| ext == "vm"))
            .collect();
        vm_paths.sort();

        if vm_paths.is_empty() {
            return Err(Error::NoVmFiles(input_path.to_owned()));
        }

        let sources: Vec<String> = vm_paths.iter().map(|p| read_file(p)).collect::<Result<_, _>>()?;
        let bases: Vec<String> = vm_paths.iter().map(|p| hack_vm::filename_base(p)).collect();
        let files: Vec<hack_vm::VmFile> = bases
            .iter()
            .zip(sources.iter())
            .map(|(base, source)| hack_vm::VmFile { filename_base: base, source })
            .collect();

        let asm = hack_vm::translate_directory(&files).map_err(Error::Translate)?;

        let dir_name = input_path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let default_output = input_path.join(format!("{}.asm", dir_name));
        (asm, output.map(PathBuf::from).unwrap_or(default_output))
    } else {
        let source = read_file(input_path)?;
        let base = hack_vm::filename_base(input_path);
        let asm = hack_vm::translate_file(&base, &source).map_err(Error::Translate)?;
        let default_output = input_path.with_extension("asm");
        (asm, output.map(PathBuf::from).unwrap_or(default_output))
    };

    let output_file = File::create(&output_path)
        .map_err(|err| Error::Io(err, IOErrorContext::WriteOutput, output_path.clone()))?;
    let mut writer = BufWriter::new(output_file);
    writer
        .write_all(asm.as_bytes())
        .map_err(|err| Error::Io(err, IOErrorContext::WriteOutput, output_path.clone()))?;

    println!("translated {} -> {}", input_path.display(), output_path.display());
    Ok(())
}
