//! Help system for the gramux CLI.

pub fn help_text(topic: Option<&str>) -> String {
    match topic {
        None => overview(),
        Some(t) => {
            if let Some(text) = command_help(t) {
                return text;
            }
            format!(
                "Unknown help topic: '{}'. Run 'gramux help' for a list of commands.",
                t
            )
        }
    }
}

fn overview() -> String {
    "\
gramux — session description tooling

Usage: gramux <command> [args...]

Commands:
  check <file>                         Parse and validate a session file
  print <file>                         Print the parsed file back out
  list <file> [--json]                 List the windows a file declares
  convert <file> <shorthand|yaml> [--out <path>]
                                       Rewrite a file in the other syntax
  help [topic]                         Show help

Session files describe windows in either the shorthand syntax
(`window <name>` followed by a windowgram and directions) or as a YAML
list of records. Run 'gramux help <command>' for details."
        .into()
}

fn command_help(command: &str) -> Option<String> {
    let text = match command {
        "check" => "\
check <file>
  Parse the session file, then verify its structure: every window is
  declared and named, names are unique, and every directions line is
  well-formed. Exits non-zero with a line-attributed message otherwise.",

        "print" => "\
print <file>
  Parse the file and print its canonical serialization to stdout. For a
  well-formed shorthand file the output is byte-identical to the input.",

        "list" => "\
list <file> [--json]
  Print each window's number and name, one per line. With --json, print
  a JSON array of {serial, name} objects instead.",

        "convert" => "\
convert <file> <shorthand|yaml> [--out <path>]
  Load the file and rewrite it in the requested syntax. Without --out
  the file is rewritten in place.",

        _ => return None,
    };
    Some(text.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overview_lists_commands() {
        let text = help_text(None);
        for command in ["check", "print", "list", "convert"] {
            assert!(text.contains(command), "missing {}", command);
        }
    }

    #[test]
    fn topic_help_found() {
        assert!(help_text(Some("convert")).contains("--out"));
    }

    #[test]
    fn unknown_topic_reported() {
        assert!(help_text(Some("bogus")).contains("Unknown help topic"));
    }
}
