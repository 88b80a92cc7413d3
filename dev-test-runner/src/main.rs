//! Runs the `testdata` corpus and prints a pass/fail table.
//!
//! usage: dev-test-runner [testdata-dir]
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use colored::Colorize;
use jschema::JSchema;
use once_cell::sync::Lazy;
use regex::Regex;

static CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^#\s*code:\s*(\d+)").expect("code pattern compiles"));

enum Outcome {
    Pass,
    Fail(String),
}

fn main() -> ExitCode {
    let root = std::env::args().nth(1).map(PathBuf::from).unwrap_or_else(|| PathBuf::from("testdata"));
    let mut failed = 0;
    let mut total = 0;
    for (dir, expect_valid) in [("valid", true), ("invalid", false)] {
        let pattern = root.join(dir).join("*.jschema");
        let Ok(paths) = glob::glob(&pattern.to_string_lossy()) else {
            eprintln!("bad pattern {}", pattern.display());
            return ExitCode::FAILURE;
        };
        for path in paths.flatten() {
            total += 1;
            let outcome = run(&path, expect_valid);
            let name = format!("{dir}/{}", path.file_name().unwrap_or_default().to_string_lossy());
            match outcome {
                Outcome::Pass => println!("{:<48} {}", name, "PASS".green()),
                Outcome::Fail(reason) => {
                    failed += 1;
                    println!("{:<48} {} {reason}", name, "FAIL".red());
                }
            }
        }
    }
    println!("{} of {total} passed", total - failed);
    if failed == 0 { ExitCode::SUCCESS } else { ExitCode::FAILURE }
}

fn run(path: &Path, expect_valid: bool) -> Outcome {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(error) => return Outcome::Fail(error.to_string()),
    };
    let expected = CODE.captures(&content).and_then(|c| c[1].parse::<u16>().ok());
    let schema = JSchema::new(path.to_string_lossy(), content.as_bytes());
    match (schema.check(), expect_valid, expected) {
        (Ok(()), true, _) => Outcome::Pass,
        (Err(error), true, _) => Outcome::Fail(error.to_string()),
        (Ok(()), false, _) => Outcome::Fail("compiled, expected an error".to_string()),
        (Err(_), false, None) => Outcome::Fail("missing `# code: N` line".to_string()),
        (Err(error), false, Some(code)) if error.code().number() == code => Outcome::Pass,
        (Err(error), false, Some(code)) => Outcome::Fail(format!("expected code {code}, got {error}")),
    }
}
