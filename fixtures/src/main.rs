use compiler::{compile, CompileOptions};
use log::{debug, error};
use source::Files;
use std::env;
use std::fs;
use std::process;

const USAGE: &str = "usage: fixtures <file> [--umd] [--pretty] [--options <file.json>]";

fn main() {
    env_logger::init();
    let mut args = env::args().skip(1);
    let mut path = None;
    let mut options = CompileOptions::default();
    let mut umd = false;
    let mut pretty = false;
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--umd" => umd = true,
            "--pretty" => pretty = true,
            "--options" => {
                let Some(file) = args.next() else {
                    eprintln!("{}", USAGE);
                    process::exit(2);
                };
                options = match fs::read_to_string(&file).map(|text| CompileOptions::from_json(&text)) {
                    Ok(Ok(options)) => options,
                    Ok(Err(diagnostic)) => {
                        eprintln!("{}", diagnostic);
                        process::exit(2);
                    }
                    Err(err) => {
                        eprintln!("{}: {}", file, err);
                        process::exit(2);
                    }
                };
            }
            _ if path.is_none() && !arg.starts_with("--") => path = Some(arg),
            _ => {
                eprintln!("{}", USAGE);
                process::exit(2);
            }
        }
    }
    let Some(path) = path else {
        eprintln!("{}", USAGE);
        process::exit(2);
    };
    if umd {
        options.module_type = String::from("umd");
    }
    options.pretty |= pretty;
    options.file_name = path.clone();
    debug!("options: {:?}", options);

    let text = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(err) => {
            error!("cannot read {}", path);
            eprintln!("{}: {}", path, err);
            process::exit(1);
        }
    };
    let mut files = Files::new();
    let file = files.add(path.as_str(), text.as_str());
    match compile(&text, &options) {
        Ok(result) => {
            for diagnostic in result.diagnostics.to_diagnostics() {
                diagnostic.emit_to_terminal(&files, file);
            }
            println!("{}", result.text);
        }
        Err(diagnostic) => {
            diagnostic.emit_to_terminal(&files, file);
            process::exit(1);
        }
    }
}
