//! Command line front end: check | ast | length | validate
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use rayon::prelude::*;
use tracing::{debug, info};

use jschema::{JSchema, Rule};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// compile jSchema documents and validate JSON values against them
#[derive(Parser, Debug)]
#[command(version)]
pub struct CommandLineInterface {
    /// more logging (-v info, -vv debug, -vvv trace); RUST_LOG takes precedence
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// compile and check every input schema
    Check(CheckCommand),
    /// print the compiled tree of a schema as JSON
    Ast(AstCommand),
    /// print the byte length of the top-level value of every input
    Length(LengthCommand),
    /// validate JSON values against a schema
    Validate(ValidateCommand),
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// One or more inputs. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,
}

#[derive(Args, Debug, Clone)]
struct SchemaSettings {
    /// user type, as `@Name=path`
    #[arg(long = "type", value_parser = parse_named_path)]
    types: Vec<(String, PathBuf)>,

    /// enum rule, as `@Name=path`
    #[arg(long = "rule", value_parser = parse_named_path)]
    rules: Vec<(String, PathBuf)>,
}

#[derive(clap::Parser, Debug)]
struct CheckCommand {
    #[command(flatten)]
    input_settings: InputSettings,

    #[command(flatten)]
    schema_settings: SchemaSettings,
}

#[derive(clap::Parser, Debug)]
struct AstCommand {
    /// schema file
    schema: PathBuf,

    #[command(flatten)]
    schema_settings: SchemaSettings,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[derive(clap::Parser, Debug)]
struct LengthCommand {
    #[command(flatten)]
    input_settings: InputSettings,
}

#[derive(clap::Parser, Debug)]
struct ValidateCommand {
    /// schema file
    #[arg(long, short)]
    schema: PathBuf,

    #[command(flatten)]
    schema_settings: SchemaSettings,

    /// validate each input as the value of this property of the root object
    #[arg(long)]
    property: Option<String>,

    #[command(flatten)]
    input_settings: InputSettings,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl InputSettings {
    fn paths(&self) -> anyhow::Result<Vec<PathBuf>> {
        resolve_file_path_patterns(&self.input).context("failed to resolve input file paths")
    }
}

impl SchemaSettings {
    fn open(&self, path: &Path) -> anyhow::Result<JSchema> {
        let mut schema = JSchema::new(path.to_string_lossy(), read(path)?);
        for (name, type_path) in &self.types {
            let ty = JSchema::new(type_path.to_string_lossy(), read(type_path)?);
            schema.add_type(name, &ty).map_err(|error| report(&error)).with_context(|| format!("type {name}"))?;
        }
        for (name, rule_path) in &self.rules {
            let rule = Rule::enum_rule(&rule_path.to_string_lossy(), read(rule_path)?)
                .map_err(|error| report(&error))
                .with_context(|| format!("rule {name}"))?;
            schema.add_rule(name, rule).map_err(|error| report(&error))?;
        }
        Ok(schema)
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn verbosity(&self) -> u8 {
        self.verbose
    }

    pub fn run(&self) -> anyhow::Result<ExitCode> {
        match &self.cmd {
            Command::Check(target) => {
                let paths = target.input_settings.paths()?;
                info!(inputs = paths.len(), "checking");
                let results = paths
                    .par_iter()
                    .map(|path| {
                        let outcome = target
                            .schema_settings
                            .open(path)
                            .and_then(|schema| schema.check().map_err(|error| report(&error)));
                        (path, outcome)
                    })
                    .collect::<Vec<_>>();
                let mut failed = 0;
                for (path, outcome) in results {
                    match outcome {
                        Ok(()) => println!("{} {}", "✓".green(), path.display()),
                        Err(error) => {
                            failed += 1;
                            println!("{} {}\n{error:#}", "✗".red(), path.display());
                        }
                    }
                }
                Ok(exit_code(failed))
            }
            Command::Ast(target) => {
                let schema = target.schema_settings.open(&target.schema)?;
                let ast = schema.get_ast().map_err(|error| report(&error))?;
                let ast_src = serde_json::to_string_pretty(&ast)?;
                if let Some(out) = target.out.as_ref() {
                    if let Some(parent) = out.parent() {
                        std::fs::create_dir_all(parent)?;
                    }
                    std::fs::write(out, &ast_src)?;
                } else {
                    println!("{ast_src}");
                }
                Ok(ExitCode::SUCCESS)
            }
            Command::Length(target) => {
                let mut failed = 0;
                for path in target.input_settings.paths()? {
                    let schema = JSchema::new(path.to_string_lossy(), read(&path)?);
                    match schema.length() {
                        Ok(length) => println!("{length}\t{}", path.display()),
                        Err(error) => {
                            failed += 1;
                            println!("{} {}\n{}", "✗".red(), path.display(), report(&error));
                        }
                    }
                }
                Ok(exit_code(failed))
            }
            Command::Validate(target) => {
                let schema = target.schema_settings.open(&target.schema)?;
                schema.check().map_err(|error| report(&error))?;
                let paths = target.input_settings.paths()?;
                debug!(inputs = paths.len(), "validating");
                let results = paths
                    .par_iter()
                    .map(|path| {
                        let outcome = read(path).and_then(|value| {
                            let result = match target.property.as_deref() {
                                Some(key) => schema.validate_object_property(key, &value),
                                None => schema.validate(&value),
                            };
                            result.map_err(|error| report(&error))
                        });
                        (path, outcome)
                    })
                    .collect::<Vec<_>>();
                let mut failed = 0;
                for (path, outcome) in results {
                    match outcome {
                        Ok(()) => println!("{} {}", "✓".green(), path.display()),
                        Err(error) => {
                            failed += 1;
                            println!("{} {}\n{error:#}", "✗".red(), path.display());
                        }
                    }
                }
                Ok(exit_code(failed))
            }
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn read(path: &Path) -> anyhow::Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))
}

/// Renders a library error with its source line when it has one.
fn report(error: &jschema::Error) -> anyhow::Error {
    match error.document() {
        Some(document) => anyhow::anyhow!("{document}"),
        None => anyhow::anyhow!("{error}"),
    }
}

fn exit_code(failed: usize) -> ExitCode {
    if failed == 0 { ExitCode::SUCCESS } else { ExitCode::FAILURE }
}

fn parse_named_path(raw: &str) -> Result<(String, PathBuf), String> {
    match raw.split_once('=') {
        Some((name, path)) if name.starts_with('@') && !path.is_empty() => {
            Ok((name.to_string(), PathBuf::from(path)))
        }
        _ => Err(format!("expected @Name=path, got {raw:?}")),
    }
}

fn resolve_file_path_patterns<I>(patterns: I) -> anyhow::Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'['))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            let mut matched_any = false;
            for entry in glob::glob(pattern)? {
                matched_any = true;
                out.push(entry?);
            }
            if !matched_any {
                bail!("glob pattern matched no files: {pattern}");
            }
        } else {
            out.push(PathBuf::from(pattern));
        }
    }

    out.sort();
    Ok(out)
}
