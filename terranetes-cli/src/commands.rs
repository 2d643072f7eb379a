//! Command execution.

use camino::Utf8PathBuf;
use terranetes::pipeline::Pipeline;
use terranetes::settings::Settings;

use crate::cli::{CommandLine, Commands};
use crate::error::Result;
use crate::watch;

/// Load settings for `cli` and run its command.
///
/// # Errors
///
/// Returns settings, generation and watcher errors.
pub fn run(cli: &CommandLine) -> Result<()> {
    let mut settings = Settings::load_with(cli.config.as_deref(), &cli.overrides())?;
    match &cli.command {
        Commands::Generate(args) => {
            generate(&settings, &args.paths)?;
        }
        Commands::Watch(args) => {
            if let Some(debounce_ms) = args.debounce_ms {
                settings.debounce_ms = debounce_ms;
            }
            let running = watch::install_stop_flag()?;
            watch::watch(&args.dir, &settings, &running)?;
        }
    }
    Ok(())
}

/// Generate every path in order, stopping at the first failure.
///
/// # Errors
///
/// Returns the first generation error.
pub fn generate(settings: &Settings, paths: &[Utf8PathBuf]) -> Result<Vec<Utf8PathBuf>> {
    let pipeline = Pipeline::from_settings(settings);
    let mut written = Vec::new();
    for path in paths {
        written.extend(pipeline.generate(path)?);
    }
    Ok(written)
}
