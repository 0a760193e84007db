//! Gramux CLI — file-level tooling for session description files.

mod help;

use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use gramux_core::data::source::SourceFormat;
use gramux_core::data::SessionFile;
use gramux_core::pipeline;
use gramux_core::types::config::Settings;

/// Anything larger is almost certainly not a session file.
const MAX_FILE_SIZE: u64 = 1 << 20;

#[derive(Debug, Clone, PartialEq, Eq)]
enum CliCommand {
    Check {
        file: String,
    },
    Print {
        file: String,
    },
    List {
        file: String,
        json: bool,
    },
    Convert {
        file: String,
        format: SourceFormat,
        out: Option<String>,
    },
    Help {
        topic: Option<String>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    let arg_refs: Vec<&str> = args[1..].iter().map(|s| s.as_str()).collect();

    let cmd = match parse_args(&arg_refs) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("gramux: {}", e);
            process::exit(1);
        }
    };

    match run(cmd) {
        Ok(output) => {
            if !output.is_empty() {
                println!("{}", output);
            }
        }
        Err(e) => {
            eprintln!("gramux error: {}", e);
            process::exit(1);
        }
    }
}

fn parse_args(args: &[&str]) -> Result<CliCommand, String> {
    if args.is_empty() {
        return Err("No command specified. Run 'gramux help' for usage.".into());
    }

    match args[0] {
        "check" => {
            if args.len() < 2 {
                return Err("Usage: gramux check <file>".into());
            }
            Ok(CliCommand::Check { file: args[1].into() })
        }
        "print" => {
            if args.len() < 2 {
                return Err("Usage: gramux print <file>".into());
            }
            Ok(CliCommand::Print { file: args[1].into() })
        }
        "list" => {
            if args.len() < 2 {
                return Err("Usage: gramux list <file> [--json]".into());
            }
            Ok(CliCommand::List {
                file: args[1].into(),
                json: args.contains(&"--json"),
            })
        }
        "convert" => {
            if args.len() < 3 {
                return Err("Usage: gramux convert <file> <shorthand|yaml> [--out <path>]".into());
            }
            let format = match args[2] {
                "shorthand" => SourceFormat::Shorthand,
                "yaml" => SourceFormat::Yaml,
                other => {
                    return Err(format!(
                        "Unknown target format: '{}'. Expected 'shorthand' or 'yaml'.",
                        other
                    ))
                }
            };
            Ok(CliCommand::Convert {
                file: args[1].into(),
                format,
                out: find_flag(args, "--out"),
            })
        }
        "help" => Ok(CliCommand::Help {
            topic: args.get(1).map(|s| s.to_string()),
        }),
        _ => Err(format!(
            "Unknown command: '{}'. Run 'gramux help' for usage.",
            args[0]
        )),
    }
}

fn find_flag(args: &[&str], flag: &str) -> Option<String> {
    for (i, arg) in args.iter().enumerate() {
        if *arg == flag {
            return args.get(i + 1).map(|s| s.to_string());
        }
    }
    None
}

fn run(cmd: CliCommand) -> Result<String, String> {
    match cmd {
        CliCommand::Check { file } => cmd_check(&file),
        CliCommand::Print { file } => cmd_print(&file),
        CliCommand::List { file, json } => cmd_list(&file, json),
        CliCommand::Convert { file, format, out } => cmd_convert(&file, format, out),
        CliCommand::Help { topic } => Ok(help::help_text(topic.as_deref())),
    }
}

fn load_file(path: &str) -> Result<SessionFile, String> {
    let path = Path::new(path);
    let metadata =
        fs::metadata(path).map_err(|_| format!("The session file does not exist: {}", path.display()))?;
    if metadata.len() > MAX_FILE_SIZE {
        return Err(format!(
            "The session file exceeds {} bytes; is it really a session file? {}",
            MAX_FILE_SIZE,
            path.display()
        ));
    }
    SessionFile::load(path).map_err(|e| format!("Failed to read {}: {}", path.display(), e))
}

fn cmd_check(path: &str) -> Result<String, String> {
    let file = load_file(path)?;
    let settings = Settings {
        session_name: gramux_core::types::config::session_name_for(path),
        ..Settings::default()
    };
    pipeline::lint(&file, &settings).map_err(|e| e.to_string())?;
    Ok(format!("{}: {} window(s) ok", path, file.count()))
}

fn cmd_print(path: &str) -> Result<String, String> {
    let file = load_file(path)?;
    // Byte-exact output, so no println and no trailing-newline trim.
    print!("{}", file.serialize());
    Ok(String::new())
}

fn cmd_list(path: &str, json: bool) -> Result<String, String> {
    let file = load_file(path)?;
    if json {
        let entries: Vec<serde_json::Value> = (1..=file.count())
            .map(|serial| {
                serde_json::json!({
                    "serial": serial,
                    "name": file.name(serial).unwrap_or_default(),
                })
            })
            .collect();
        return Ok(serde_json::Value::Array(entries).to_string());
    }
    let mut out = String::new();
    for serial in 1..=file.count() {
        out.push_str(&format!(
            "{}: {}\n",
            serial,
            file.name(serial).unwrap_or_default()
        ));
    }
    Ok(out.trim_end_matches('\n').to_string())
}

fn cmd_convert(path: &str, format: SourceFormat, out: Option<String>) -> Result<String, String> {
    let mut file = load_file(path)?;
    file.format = format;
    let target = out.map(PathBuf::from).unwrap_or_else(|| PathBuf::from(path));
    file.save_to(&target)
        .map_err(|e| format!("Failed to write {}: {}", target.display(), e))?;
    let label = match format {
        SourceFormat::Shorthand => "shorthand",
        SourceFormat::Yaml => "yaml",
    };
    Ok(format!("Wrote {} as {}", target.display(), label))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_check() {
        assert_eq!(
            parse_args(&["check", "session_demo"]).unwrap(),
            CliCommand::Check {
                file: "session_demo".into()
            }
        );
    }

    #[test]
    fn parse_list_with_json_flag() {
        assert_eq!(
            parse_args(&["list", "f", "--json"]).unwrap(),
            CliCommand::List {
                file: "f".into(),
                json: true
            }
        );
    }

    #[test]
    fn parse_convert_with_out() {
        assert_eq!(
            parse_args(&["convert", "f", "yaml", "--out", "g"]).unwrap(),
            CliCommand::Convert {
                file: "f".into(),
                format: SourceFormat::Yaml,
                out: Some("g".into())
            }
        );
    }

    #[test]
    fn parse_convert_rejects_unknown_format() {
        assert!(parse_args(&["convert", "f", "toml"]).is_err());
    }

    #[test]
    fn parse_no_command_errors() {
        assert!(parse_args(&[]).is_err());
        assert!(parse_args(&["frobnicate"]).is_err());
    }

    #[test]
    fn missing_file_is_reported() {
        let err = cmd_check("/nonexistent/session").unwrap_err();
        assert!(err.contains("does not exist"));
    }
}
