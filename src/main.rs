//! gamedeck - command-line front-end over a system's game list
//!
//! # Overview
//!
//! Loads settings from the config directory, initializes logging, then runs
//! one subcommand against a `gamelist.xml`:
//! - `list`: print the rows a game list shows for a folder, grouped and tagged
//!   the same way the front-end's list widgets are
//! - `show`: print an entry's metadata in schema order
//! - `set`: change one metadata value and save the gamelist
//! - `schema`: print the declared fields of `game` or `folder`
//!
//! # Configuration Files
//!
//! Expected in the config directory (default `gamedeck-data/`):
//! - `settings.yaml`: front-end settings (optional, defaults apply)
//! - `gamelists/<system>/gamelist.xml`: used when no gamelist path is given

use anyhow::{Context, Result, bail};
use camino::{Utf8Path, Utf8PathBuf};
use clap::{Args, Parser, Subcommand};
use gamedeck::gamelist::{load_gamelist, save_gamelist};
use gamedeck::models::EntityKind;
use gamedeck::paths::resolve_relative_path;
use gamedeck::{
    APP_NAME, ConfigManager, GameListView, GameTree, ListProjector, SchemaRegistry, Settings,
    VERSION,
};

#[derive(Parser, Debug)]
#[command(name = "gamedeck", version, about = "Browse and edit emulation front-end game lists")]
struct Cli {
    /// Directory holding settings.yaml and per-system gamelists
    #[arg(long, default_value = "gamedeck-data")]
    config_dir: String,

    /// Log at debug level
    #[arg(long)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the rows shown for a folder
    List {
        #[command(flatten)]
        source: GamelistArgs,

        /// Folder to list, relative to the ROM directory
        #[arg(long)]
        folder: Option<String>,
    },
    /// Print an entry's metadata
    Show {
        #[command(flatten)]
        source: GamelistArgs,

        /// Entry path, relative to the ROM directory
        entry: String,
    },
    /// Change one metadata value and save
    Set {
        #[command(flatten)]
        source: GamelistArgs,

        entry: String,
        key: String,
        value: String,
    },
    /// Print the declared metadata fields
    Schema {
        #[arg(default_value = "game")]
        kind: String,
    },
}

#[derive(Args, Debug)]
struct GamelistArgs {
    /// System name, e.g. "snes"
    #[arg(long)]
    system: String,

    /// Directory the gamelist's relative paths resolve against
    #[arg(long)]
    rom_dir: String,

    /// Gamelist file; defaults to <config-dir>/gamelists/<system>/gamelist.xml
    #[arg(long)]
    gamelist: Option<String>,
}

impl GamelistArgs {
    fn gamelist_path(&self, config: &ConfigManager) -> Utf8PathBuf {
        match &self.gamelist {
            Some(path) => Utf8PathBuf::from(path),
            None => config.gamelist_path(&self.system),
        }
    }

    fn load(&self, config: &ConfigManager, registry: &SchemaRegistry) -> Result<GameTree> {
        load_gamelist(
            &self.gamelist_path(config),
            registry,
            &self.system,
            Utf8Path::new(&self.rom_dir),
        )
    }

    fn entry_path(&self, relative: &str) -> Utf8PathBuf {
        Utf8PathBuf::from(resolve_relative_path(relative, Utf8Path::new(&self.rom_dir), false))
    }
}

/// Main entry point for the gamedeck CLI
///
/// 1. Config directory and settings (settings choose the log directory)
/// 2. Logging setup, then a report of where settings came from
/// 3. Subcommand dispatch
///
/// # Errors
///
/// This function can fail if:
/// - The config directory cannot be created or `settings.yaml` is invalid
/// - Logging initialization fails (permissions, subscriber already set)
/// - The gamelist cannot be read, parsed or written
/// - The requested entry, folder or metadata key does not exist
fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = ConfigManager::new(&cli.config_dir)?;
    let mut settings = config.load_settings()?;
    settings.logging.debug |= cli.debug;
    let _guard = gamedeck::logging::init_logging(&settings.logging)?;

    tracing::info!("Starting {} v{}", APP_NAME, VERSION);
    config.log_settings_source();

    let registry = SchemaRegistry::builtin();
    match cli.command {
        Command::List { source, folder } => list(&config, &settings, &registry, &source, folder),
        Command::Show { source, entry } => show(&config, &registry, &source, &entry),
        Command::Set {
            source,
            entry,
            key,
            value,
        } => set(&config, &registry, &source, &entry, key, value),
        Command::Schema { kind } => schema(&registry, &kind),
    }
}

/// Print the rows a game list shows for the root or for `folder`.
///
/// Each line is `<category> <label>`, using the same grouping and labels as
/// the front-end's list widgets.
fn list(
    config: &ConfigManager,
    settings: &Settings,
    registry: &SchemaRegistry,
    source: &GamelistArgs,
    folder: Option<String>,
) -> Result<()> {
    let tree = source.load(config, registry)?;
    let mut view = GameListView::new(
        &tree,
        ListProjector::new(settings.projection_options()),
        settings.display_filter(),
    );

    if let Some(folder) = folder {
        let path = source.entry_path(&folder);
        let id = tree
            .find_by_path(&path)
            .with_context(|| format!("No folder at {}", path))?;
        if !tree.get(id).is_some_and(|e| e.is_folder()) {
            bail!("{} is not a folder", path);
        }
        view.populate(&tree, id);
    }

    for row in view.rows() {
        println!("{} {}", row.category.as_u8(), row.label);
    }
    Ok(())
}

/// Print the metadata of the entry at `entry` (relative to the ROM directory)
/// in schema order, labelled with each field's display label.
fn show(
    config: &ConfigManager,
    registry: &SchemaRegistry,
    source: &GamelistArgs,
    entry: &str,
) -> Result<()> {
    let tree = source.load(config, registry)?;
    let path = source.entry_path(entry);
    let id = tree
        .find_by_path(&path)
        .with_context(|| format!("No entry at {}", path))?;
    let Some(entry) = tree.get(id) else {
        bail!("No entry at {}", path);
    };

    println!("{} {}", entry.metadata().kind(), entry.path());
    for (key, value) in entry.metadata().iter() {
        let label = entry
            .metadata()
            .schema()
            .field(key)
            .map_or(key, |field| field.display_label);
        println!("  {:<14} {}", label, value);
    }
    Ok(())
}

/// Set `key` to `value` on one entry and save the gamelist in compact form.
///
/// # Errors
/// Fails when the entry does not exist or `key` is not declared for its kind.
fn set(
    config: &ConfigManager,
    registry: &SchemaRegistry,
    source: &GamelistArgs,
    entry: &str,
    key: String,
    value: String,
) -> Result<()> {
    let mut tree = source.load(config, registry)?;
    let path = source.entry_path(entry);
    let id = tree
        .find_by_path(&path)
        .with_context(|| format!("No entry at {}", path))?;
    let Some(entry) = tree.get_mut(id) else {
        bail!("No entry at {}", path);
    };

    if !entry.metadata().schema().contains(&key) {
        bail!("{} has no metadata field '{}'", entry.metadata().kind(), key);
    }
    tracing::info!("Setting {}={} on {}", key, value, path);
    entry.metadata_mut().set(key, value);

    save_gamelist(&mut tree, &source.gamelist_path(config), Utf8Path::new(&source.rom_dir))
}

/// Print the declared fields of `kind` ("game" or "folder")
fn schema(registry: &SchemaRegistry, kind: &str) -> Result<()> {
    let kind: EntityKind = kind.parse()?;
    let schema = registry.try_lookup(kind)?;
    for field in schema.fields() {
        println!(
            "{:<12} {:<16} default={:?}{}",
            field.key,
            format!("{:?}", field.kind),
            field.default_value,
            if field.is_statistic { " (statistic)" } else { "" }
        );
    }
    Ok(())
}
