//! Command-line interface definitions for `terranetes`.

use camino::Utf8PathBuf;
use clap::{ArgAction, Args, Parser, Subcommand};
use terranetes::settings::SettingsOverrides;

/// Parsed command line.
#[derive(Debug, Parser)]
#[command(name = "terranetes")]
#[command(about = "Generate Terraform JSON, Kubernetes YAML and config files from Lua scripts")]
#[command(version)]
pub struct CommandLine {
    /// Settings file; `terranetes.toml` is used when present.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<Utf8PathBuf>,
    /// Log more; repeat for trace output.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,
    /// Reject duplicate Terraform blocks.
    #[arg(long, global = true)]
    pub strict: bool,
    /// Seed values from `values.yaml` files at and above each root.
    #[arg(long, global = true)]
    pub values_from_files: bool,
    /// Seed values from the process environment.
    #[arg(long, global = true)]
    pub values_from_env: bool,
    /// Command to run.
    #[command(subcommand)]
    pub command: Commands,
}

/// Subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Render every script under the given paths.
    Generate(GenerateArgs),
    /// Regenerate scripts under a directory whenever they change.
    Watch(WatchArgs),
}

/// Arguments of `generate`.
#[derive(Debug, Clone, Args)]
pub struct GenerateArgs {
    /// Scripts or directories to process, in order.
    #[arg(value_name = "PATH", default_value = ".")]
    pub paths: Vec<Utf8PathBuf>,
}

/// Arguments of `watch`.
#[derive(Debug, Clone, Args)]
pub struct WatchArgs {
    /// Directory to watch recursively.
    #[arg(value_name = "DIR", default_value = ".")]
    pub dir: Utf8PathBuf,
    /// Regenerate scripts whose names start with a dot.
    #[arg(long)]
    pub include_dotfiles: bool,
    /// Quiet period before a burst of changes is handled.
    #[arg(long, value_name = "MS")]
    pub debounce_ms: Option<u64>,
}

impl CommandLine {
    /// Settings overrides taken from flags. Flags left off leave the
    /// settings file and environment in charge.
    #[must_use]
    pub fn overrides(&self) -> SettingsOverrides {
        SettingsOverrides {
            strict: self.strict.then_some(true),
            values_from_files: self.values_from_files.then_some(true),
            values_from_env: self.values_from_env.then_some(true),
            ignore_dotfiles: match &self.command {
                Commands::Watch(args) => args.include_dotfiles.then_some(false),
                Commands::Generate(_) => None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn parse(args: &[&str]) -> CommandLine {
        CommandLine::try_parse_from(args).expect("arguments parse")
    }

    #[rstest]
    fn generate_defaults_to_the_current_directory() {
        let cli = parse(&["terranetes", "generate"]);
        let Commands::Generate(args) = &cli.command else {
            panic!("expected generate");
        };
        assert_eq!(args.paths, [Utf8PathBuf::from(".")]);
        assert_eq!(cli.overrides(), SettingsOverrides::default());
    }

    #[rstest]
    fn global_flags_follow_the_subcommand() {
        let cli = parse(&["terranetes", "generate", "a", "b", "--strict", "-vv"]);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.overrides().strict, Some(true));
        assert_eq!(cli.overrides().values_from_env, None);
    }

    #[rstest]
    #[case(&["terranetes", "watch"], None)]
    #[case(&["terranetes", "watch", "infra", "--include-dotfiles"], Some(false))]
    fn watch_controls_dotfile_filtering(#[case] args: &[&str], #[case] expected: Option<bool>) {
        assert_eq!(parse(args).overrides().ignore_dotfiles, expected);
    }

    #[rstest]
    fn watch_reads_debounce_override() {
        let cli = parse(&["terranetes", "watch", "--debounce-ms", "50"]);
        let Commands::Watch(args) = &cli.command else {
            panic!("expected watch");
        };
        assert_eq!(args.debounce_ms, Some(50));
        assert_eq!(args.dir, ".");
    }
}
