use std::path::{Path, PathBuf};

use folserren_core::{Config, FolderConfig, FolderMonitor, Monitor, RenameReport, SerialRenamer};

const DEFAULT_CONFIG: &str = "folserren.toml";

fn main() -> anyhow::Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG));

    let config = Config::load(&config_path)?;

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(parse_level(&config.general.log_level))
        .init();

    let mut failed = 0usize;
    for folder in &config.folders {
        match run_folder(folder, &config.general.cache_dir) {
            Ok(report) => tracing::debug!("{}: {report:?}", folder.path.display()),
            Err(e) => {
                tracing::error!("{}: {e}", folder.path.display());
                failed += 1;
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("{failed} of {} folders failed", config.folders.len());
    }
    Ok(())
}

/// Opens the monitor for one configured folder and renumbers it.
fn run_folder(folder: &FolderConfig, cache_dir: &Path) -> anyhow::Result<RenameReport> {
    let monitor = FolderMonitor::open(&folder.path, folder.mode, Some(cache_dir))?;
    let mut renamer = SerialRenamer::new(monitor).with_order(folder.order);
    if let Some(template) = &folder.template {
        renamer = renamer.with_template(template);
    }

    let (count, changes) = renamer.difference();
    for change in changes {
        tracing::info!("{change}");
    }
    if count > 0 {
        tracing::info!("{count} changes in {}", renamer.path().display());
    }

    Ok(renamer.rename(folder.only_when_changed, None)?)
}

/// Maps a config log level onto a tracing level, defaulting to `INFO`.
fn parse_level(level: &str) -> tracing::Level {
    level.parse().unwrap_or(tracing::Level::INFO)
}
