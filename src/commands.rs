//! Command-line verb parsing
//!
//! Parses invocations like `indexer-console test example` into commands.

/// Parsed command-line invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// No verb: open the console window
    Gui,
    /// Exchange a passphrase for a session token: login <passphrase>
    Login { passphrase: String },
    /// Forget the stored session token: logout
    Logout,
    /// List indexers and whether they are enabled: list
    List,
    /// Print an indexer's config: config <id>
    Config { indexer_id: String },
    /// Run the backend test for an indexer: test <id>
    Test { indexer_id: String },
    /// Disable an indexer: disable <id>
    Disable { indexer_id: String },
    /// Search one indexer: search <id> <keywords...>
    Search { indexer_id: String, keywords: String },
    /// Show help: help
    Help,
    /// Anything we could not parse, with the message to print
    Invalid { message: String },
}

impl Command {
    /// Parse arguments (without the program name)
    pub fn parse(args: &[String]) -> Self {
        let Some(verb) = args.first() else {
            return Command::Gui;
        };
        let rest = &args[1..];
        let first = || rest.first().cloned();

        match verb.to_lowercase().as_str() {
            "login" => match first() {
                Some(passphrase) => Command::Login { passphrase },
                None => usage("login <passphrase>"),
            },
            "logout" => Command::Logout,
            "list" | "ls" => Command::List,
            "config" => match first() {
                Some(indexer_id) => Command::Config { indexer_id },
                None => usage("config <indexer>"),
            },
            "test" => match first() {
                Some(indexer_id) => Command::Test { indexer_id },
                None => usage("test <indexer>"),
            },
            "disable" => match first() {
                Some(indexer_id) => Command::Disable { indexer_id },
                None => usage("disable <indexer>"),
            },
            "search" | "s" => {
                if rest.len() < 2 {
                    usage("search <indexer> <keywords...>")
                } else {
                    Command::Search {
                        indexer_id: rest[0].clone(),
                        keywords: rest[1..].join(" "),
                    }
                }
            }
            "help" | "--help" | "-h" => Command::Help,
            other => Command::Invalid {
                message: format!("Unknown command: {}. Run 'indexer-console help' for usage.", other),
            },
        }
    }

    /// Get help text for all commands
    pub fn help_text() -> &'static str {
        r#"indexer-console - manage the indexers of a torznab backend

Usage: indexer-console [command]

Commands:
  (none)                      Open the console window
  login <passphrase>          Log in and remember the session token
  logout                      Forget the session token
  list                        List indexers and their state
  config <indexer>            Show an indexer's configuration
  test <indexer>              Test an indexer
  disable <indexer>           Disable an indexer
  search <indexer> <keywords> Search one indexer
  help                        Show this help

Environment:
  INDEXER_CONSOLE_ORIGIN      Backend origin (default http://localhost:5060)
  INDEXER_CONSOLE_DATA_DIR    Where the session token is stored
  RUST_LOG                    Log filter, e.g. indexer_console=debug"#
    }
}

fn usage(text: &str) -> Command {
    Command::Invalid {
        message: format!("Usage: indexer-console {}", text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(line: &str) -> Vec<String> {
        line.split_whitespace().map(str::to_string).collect()
    }

    #[test]
    fn test_parse_no_args_opens_gui() {
        assert_eq!(Command::parse(&[]), Command::Gui);
    }

    #[test]
    fn test_parse_search_joins_keywords() {
        match Command::parse(&args("search example big buck bunny")) {
            Command::Search { indexer_id, keywords } => {
                assert_eq!(indexer_id, "example");
                assert_eq!(keywords, "big buck bunny");
            }
            other => panic!("Expected Search, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_missing_argument() {
        match Command::parse(&args("test")) {
            Command::Invalid { message } => assert!(message.contains("test <indexer>")),
            other => panic!("Expected usage message, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_login() {
        assert_eq!(
            Command::parse(&args("LOGIN secret")),
            Command::Login { passphrase: "secret".into() }
        );
    }
}
