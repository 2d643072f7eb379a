//! Watch mode: regenerate scripts as they change.
//!
//! A debounced recursive watcher reports changed paths; every changed
//! script is regenerated in-process. Failures are logged and watching
//! continues until the stop flag is cleared.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{RecvTimeoutError, channel};
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use notify_debouncer_mini::new_debouncer;
use notify_debouncer_mini::notify::RecursiveMode;
use terranetes::IoResultExt;
use terranetes::pipeline::Pipeline;
use terranetes::script::is_script;
use terranetes::settings::Settings;
use tracing::{debug, info, warn};

use crate::error::{CliError, Result};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Flag cleared by SIGINT or SIGTERM.
///
/// # Errors
///
/// Returns [`CliError::Signal`] when a handler is already installed.
pub fn install_stop_flag() -> Result<Arc<AtomicBool>> {
    let running = Arc::new(AtomicBool::new(true));
    let flag = Arc::clone(&running);
    ctrlc::set_handler(move || flag.store(false, Ordering::SeqCst))?;
    Ok(running)
}

/// Scripts among `paths` that still exist, sorted and deduplicated.
///
/// Paths that are not UTF-8 are skipped, as are files whose names start
/// with a dot when `ignore_dotfiles` is set.
pub fn changed_scripts<'a, I>(paths: I, extension: &str, ignore_dotfiles: bool) -> Vec<Utf8PathBuf>
where
    I: IntoIterator<Item = &'a Path>,
{
    let mut scripts: Vec<Utf8PathBuf> = paths
        .into_iter()
        .filter_map(Utf8Path::from_path)
        .filter(|path| is_script(path, extension))
        .filter(|path| !(ignore_dotfiles && is_dotfile(path)))
        .filter(|path| path.is_file())
        .map(Utf8Path::to_path_buf)
        .collect();
    scripts.sort();
    scripts.dedup();
    scripts
}

fn is_dotfile(path: &Utf8Path) -> bool {
    path.file_name().is_some_and(|name| name.starts_with('.'))
}

/// Watch `dir` recursively until `running` is cleared.
///
/// # Errors
///
/// Returns [`CliError::Terranetes`] when `dir` cannot be resolved and
/// [`CliError::Watch`] when the watcher cannot be attached. Generation
/// failures are logged, not returned.
pub fn watch(dir: &Utf8Path, settings: &Settings, running: &AtomicBool) -> Result<()> {
    let root = dir.canonicalize_utf8().with_path(dir)?;
    let pipeline = Pipeline::from_settings(settings);
    let watch_error = |source| CliError::Watch {
        path: root.clone(),
        source,
    };

    let (tx, rx) = channel();
    let mut debouncer =
        new_debouncer(Duration::from_millis(settings.debounce_ms), tx).map_err(watch_error)?;
    debouncer
        .watcher()
        .watch(root.as_std_path(), RecursiveMode::Recursive)
        .map_err(watch_error)?;
    info!(dir = %root, "watching for changes");

    while running.load(Ordering::SeqCst) {
        match rx.recv_timeout(POLL_INTERVAL) {
            Ok(Ok(events)) => {
                debug!(events = events.len(), "file system events");
                let paths = events.iter().map(|event| event.path.as_path());
                for script in changed_scripts(
                    paths,
                    &settings.script_extension,
                    settings.ignore_dotfiles,
                ) {
                    regenerate(&pipeline, &script);
                }
            }
            Ok(Err(err)) => warn!(error = %err, "watcher reported an error"),
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }
    info!(dir = %root, "stopped watching");
    Ok(())
}

fn regenerate(pipeline: &Pipeline, script: &Utf8Path) {
    info!(script = %script, "change detected, regenerating");
    if let Err(err) = pipeline.generate(script) {
        warn!(script = %script, error = %err, "generation failed");
    }
}
