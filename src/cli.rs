//! Command-line argument parsing for the bindings tool
//!
//! Supports:
//! - Listing known handlers and whether they have saved bindings
//! - Showing a handler's bindings as YAML or JSON
//! - Rebinding a listener slot from the shell
//! - Resetting a handler to its defaults

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Inspect and edit saved key bindings
#[derive(Parser, Debug)]
#[command(name = "keystack", version, about = "Inspect and edit layered key bindings")]
pub struct CliArgs {
    /// Bindings directory (overrides config.yaml)
    #[arg(long, value_name = "DIR", global = true)]
    pub bindings_dir: Option<PathBuf>,

    /// Extra handler definitions file, added after the built-in ones
    #[arg(long, value_name = "FILE", global = true)]
    pub handlers: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// List handlers and where their bindings come from
    List,
    /// Print the bindings of a handler
    Show {
        handler: String,
        /// Print JSON instead of YAML
        #[arg(long)]
        json: bool,
    },
    /// Bind a key to a listener slot and save it
    Bind {
        handler: String,
        listener: String,
        /// Key name, e.g. `space`, `w`, `f5`, `mouse_left`
        key: String,
        /// Bind the alternative slot instead of the positive one
        #[arg(long)]
        alternative: bool,
    },
    /// Forget saved bindings so the defaults apply again
    Reset { handler: String },
    /// Print the built-in handler definitions
    Defaults,
    /// Print config, bindings and log locations
    Paths,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bind_alternative() {
        let args = CliArgs::parse_from([
            "keystack",
            "bind",
            "Player Movement",
            "Jump",
            "j",
            "--alternative",
        ]);
        assert_eq!(
            args.command,
            Command::Bind {
                handler: "Player Movement".to_string(),
                listener: "Jump".to_string(),
                key: "j".to_string(),
                alternative: true,
            }
        );
    }

    #[test]
    fn test_parse_show_json_with_global_dir() {
        let args = CliArgs::parse_from(["keystack", "show", "Chat", "--json", "--bindings-dir", "/tmp/b"]);
        assert_eq!(
            args.command,
            Command::Show {
                handler: "Chat".to_string(),
                json: true
            }
        );
        assert_eq!(args.bindings_dir, Some(PathBuf::from("/tmp/b")));
    }

    #[test]
    fn test_subcommand_required() {
        assert!(CliArgs::try_parse_from(["keystack"]).is_err());
    }
}
