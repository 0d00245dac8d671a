//! Subcommands.

use clap::Subcommand;

/// Available commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Start (or adopt) llama-server and supervise it until Ctrl-C
    Run {
        /// Extra arguments passed verbatim to llama-server
        #[arg(last = true)]
        extra_args: Vec<String>,
    },

    /// Print the argument list llama-server would be launched with
    Args {
        /// Extra arguments passed verbatim to llama-server
        #[arg(last = true)]
        extra_args: Vec<String>,
    },

    /// Check once whether a server answers on the configured address
    Probe,

    /// List the models reported by a running server
    Models {
        /// Print the raw records as JSON
        #[arg(long)]
        json: bool,
    },
}

impl Commands {
    /// Extra llama-server arguments given after `--`.
    pub fn extra_args(&self) -> &[String] {
        match self {
            Self::Run { extra_args } | Self::Args { extra_args } => extra_args,
            Self::Probe | Self::Models { .. } => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::parser::Cli;
    use clap::Parser;

    #[test]
    fn test_extra_args_after_separator() {
        let cli = Cli::parse_from(["llamadeck", "run", "--", "--jinja", "--alias", "chat"]);
        assert_eq!(cli.command.extra_args(), ["--jinja", "--alias", "chat"]);
    }

    #[test]
    fn test_probe_has_no_extra_args() {
        let cli = Cli::parse_from(["llamadeck", "probe"]);
        assert!(cli.command.extra_args().is_empty());
    }

    #[test]
    fn test_models_json_flag() {
        let cli = Cli::parse_from(["llamadeck", "models", "--json"]);
        assert!(matches!(cli.command, super::Commands::Models { json: true }));
    }
}
