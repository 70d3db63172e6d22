use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use log::LevelFilter;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use nidl::{dump_document, dump_model, read_version_stamp, DumpFormat, Generator, GeneratorOptions, MergePolicy};
use nidl::error::NidlError;

#[derive(Parser)]
#[command(name = "nidlc")]
#[command(about = "Generate C++ and C# sources from NIDL schemas", long_about = None)]
struct Cli {
    /// Raise log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a C++ source and header pair
    Generate {
        /// Input schema file
        schema: PathBuf,

        /// Output source file
        source: PathBuf,

        /// Output header file
        header: PathBuf,

        /// Fail when a dependency redeclares an existing entry
        #[arg(long)]
        strict_merge: bool,

        /// Namespace for schemas that do not declare one
        #[arg(long)]
        namespace: Option<String>,

        /// Include name of the header in the source (defaults to its file name)
        #[arg(long)]
        header_name: Option<String>,
    },

    /// Generate the C# binding
    Csharp {
        /// Input schema file
        schema: PathBuf,

        /// Output `.cs` file
        output: PathBuf,

        /// Fail when a dependency redeclares an existing entry
        #[arg(long)]
        strict_merge: bool,

        /// Namespace for schemas that do not declare one
        #[arg(long)]
        namespace: Option<String>,
    },

    /// Print the merged schema, or its model, to stdout
    Inspect {
        /// Input schema file
        schema: PathBuf,

        #[arg(long, value_enum, default_value_t = Format::Json)]
        format: Format,

        /// Print the resolved model instead of the merged document
        #[arg(long)]
        model: bool,
    },

    /// Print the generator version stamped into a generated file
    Stamp {
        file: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Json,
    Sjson,
}

impl From<Format> for DumpFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Json => DumpFormat::Json,
            Format::Sjson => DumpFormat::Sjson,
        }
    }
}

fn options(strict_merge: bool, namespace: Option<String>) -> GeneratorOptions {
    let mut options = GeneratorOptions::default();
    if strict_merge {
        options.merge_policy = MergePolicy::Strict;
    }
    if let Some(namespace) = namespace {
        options.default_namespace = namespace;
    }
    options
}

fn run(cli: Cli) -> Result<(), NidlError> {
    match cli.command {
        Commands::Generate { schema, source, header, strict_merge, namespace, header_name } => {
            let mut options = options(strict_merge, namespace);
            options.header_name = header_name;
            Generator::new(schema, options).generate(&source, &header)
        }

        Commands::Csharp { schema, output, strict_merge, namespace } => {
            Generator::new(schema, options(strict_merge, namespace)).generate_csharp(&output)
        }

        Commands::Inspect { schema, format, model } => {
            let text = if model {
                dump_model(&schema, GeneratorOptions::default(), format.into())?
            } else {
                dump_document(&schema, GeneratorOptions::default(), format.into())?
            };
            println!("{}", text);
            Ok(())
        }

        Commands::Stamp { file } => {
            match read_version_stamp(&file)? {
                Some(version) => println!("{}", version),
                None => {
                    return Err(NidlError::validation(
                        file.display().to_string(),
                        "no version stamp on the first line",
                    ))
                }
            }
            Ok(())
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    ExitCode::from(report(run(cli), &mut io::stderr()))
}

/// Print the single diagnostic line for a failed run and pick the exit status.
fn report(result: Result<(), NidlError>, stderr: &mut dyn Write) -> u8 {
    match result {
        Ok(()) => 0,
        Err(err) => {
            let _ = writeln!(stderr, "[NIDL] error({}): {}", err.entity(), err.reason());
            1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("nidlc-{}-{}", name, std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn invoke(args: &[&str]) -> (u8, String) {
        let cli = Cli::try_parse_from(args).unwrap();
        let mut stderr = Vec::new();
        let status = report(run(cli), &mut stderr);
        (status, String::from_utf8(stderr).unwrap())
    }

    #[test]
    fn validation_errors_name_the_entry() {
        let dir = scratch("validation");
        let schema = dir.join("bad.nidl");
        std::fs::write(&schema, "structs = { Mesh = { model = \"resource\", scale = \"float\" } }").unwrap();
        let source = dir.join("bad.cc");
        let header = dir.join("bad.h");

        let (status, stderr) = invoke(&[
            "nidlc",
            "generate",
            schema.to_str().unwrap(),
            source.to_str().unwrap(),
            header.to_str().unwrap(),
        ]);
        assert_eq!(status, 1);
        assert!(stderr.starts_with("[NIDL] error(Mesh.model): "), "{}", stderr);
        assert_eq!(stderr.lines().count(), 1);
        assert!(!header.exists());
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn missing_schema_is_reported_with_its_path() {
        let (status, stderr) = invoke(&["nidlc", "csharp", "no/such/schema.nidl", "out.cs"]);
        assert_eq!(status, 1);
        assert!(stderr.starts_with("[NIDL] error(no/such/schema.nidl): "), "{}", stderr);
    }

    #[test]
    fn success_prints_nothing() {
        let dir = scratch("success");
        let schema = dir.join("speed.nidl");
        std::fs::write(&schema, "components = { Speed = \"float\" }").unwrap();
        let output = dir.join("Speed.cs");

        let (status, stderr) = invoke(&["nidlc", "csharp", schema.to_str().unwrap(), output.to_str().unwrap(), "--strict-merge"]);
        assert_eq!(status, 0);
        assert!(stderr.is_empty());
        assert!(output.exists());
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
