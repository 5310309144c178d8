//! Minimal driver: `stacklua [-e stat] [script]`. Not the deliverable (the
//! library crate is); just enough hand-rolled `argv` parsing to run a file
//! or an inline string end to end.

use std::env;
use std::fs;
use std::io::{self, Read};
use std::process::ExitCode;

use mimalloc::MiMalloc;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

fn print_usage() {
    eprintln!("usage: stacklua [-e stat] [script]");
    eprintln!("  -e stat   run the string 'stat' instead of a script file");
    eprintln!("  -         read the script from stdin");
}

enum Source {
    File(String),
    Inline(String),
    Stdin,
}

fn parse_args() -> Result<Source, String> {
    let args: Vec<String> = env::args().collect();
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-e" => {
                i += 1;
                let stat = args.get(i).ok_or("'-e' needs an argument")?;
                return Ok(Source::Inline(stat.clone()));
            }
            "-" => return Ok(Source::Stdin),
            "-h" | "--help" => {
                print_usage();
                std::process::exit(0);
            }
            path => return Ok(Source::File(path.to_string())),
        }
    }
    Err("no script given".to_string())
}

fn read_source(source: Source) -> Result<String, String> {
    match source {
        Source::File(path) => {
            fs::read_to_string(&path).map_err(|e| format!("cannot open {path}: {e}"))
        }
        Source::Inline(stat) => Ok(stat),
        Source::Stdin => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .map_err(|e| format!("error reading stdin: {e}"))?;
            Ok(buf)
        }
    }
}

fn main() -> ExitCode {
    let source = match parse_args() {
        Ok(s) => s,
        Err(e) => {
            eprintln!("stacklua: {e}");
            print_usage();
            return ExitCode::FAILURE;
        }
    };

    let code = match read_source(source) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("stacklua: {e}");
            return ExitCode::FAILURE;
        }
    };

    match stacklua::run(&code) {
        Ok(value) => {
            println!("{value}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("stacklua: {e}");
            ExitCode::FAILURE
        }
    }
}
