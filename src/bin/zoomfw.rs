//! zoomfw
//!
//! Command-line editor for Zoom pedal firmware updaters

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::info;
use zoomfw::{Direction, EditorConfig, Entry, Firmware};

#[derive(Parser, Debug)]
#[command(name = "zoomfw")]
#[command(about = "Inspect and edit the effect files of a Zoom pedal firmware updater")]
struct Args {
    /// Path to the firmware updater file
    firmware: PathBuf,

    /// TOML config file
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Write the edited firmware here instead of over the input
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// Defragment the data region before saving
    #[arg(long)]
    defragment_on_save: bool,

    /// Ignore FLST_SEQ.ZDT and FLST_SEQ.ZT2
    #[arg(long)]
    exclude_sequence_files: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show BIN location, pedal series and block usage
    Info,

    /// List stored files in table order
    List {
        /// Print JSON rows instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Copy a stored file out of the firmware
    Extract {
        /// Stored file name, e.g. HALL.ZDL
        file_name: String,

        /// Destination path (defaults to the file name)
        #[arg(short = 'd', long)]
        dest: Option<PathBuf>,
    },

    /// Add files to the firmware
    Inject {
        /// Files to add; stored under their own names
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Delete stored files
    Remove {
        #[arg(required = true)]
        file_names: Vec<String>,
    },

    /// Move a stored file one position up or down
    Move {
        file_name: String,

        /// up or down
        #[arg(value_parser = parse_direction)]
        direction: Direction,
    },

    /// Pack all block chains from the first data block
    Defrag,
}

/// Parse a move direction from CLI string
fn parse_direction(s: &str) -> Result<Direction, String> {
    match s.to_lowercase().as_str() {
        "up" => Ok(Direction::Up),
        "down" => Ok(Direction::Down),
        _ => Err(format!(
            "Invalid direction '{}'. Valid options: up, down",
            s
        )),
    }
}

fn load_config(args: &Args) -> Result<EditorConfig> {
    let config = match &args.config {
        Some(path) => EditorConfig::load(path)
            .with_context(|| format!("failed to read config {}", path.display()))?,
        None => EditorConfig::default(),
    };
    let defragment = config.enable_defragmentation || args.defragment_on_save;
    let exclude = config.exclude_sequence_files || args.exclude_sequence_files;
    Ok(config
        .with_defragmentation(defragment)
        .with_sequence_files_excluded(exclude))
}

fn save(firmware: &mut Firmware, args: &Args) -> Result<()> {
    let target: &Path = args.output.as_deref().unwrap_or(&args.firmware);
    firmware
        .save(target)
        .with_context(|| format!("failed to save {}", target.display()))?;
    info!("Saved firmware to {}", target.display());
    Ok(())
}

fn print_info(firmware: &Firmware) {
    let image = firmware.image();
    let slot = firmware.table_slot();
    println!("BIN offset:   {}", image.bin_offset());
    println!("BIN blocks:   {}", image.block_count());
    println!(
        "Pedal series: {}",
        firmware
            .pedal_series()
            .map(|s| s.to_string())
            .unwrap_or_else(|| "unknown".to_string())
    );
    println!(
        "File table:   slot {} ({})",
        slot.index,
        if slot.primary { "primary" } else { "fallback" }
    );
    println!("Files:        {}", firmware.entries().len());
    println!(
        "Blocks:       {} used / {} total ({} free)",
        firmware.used_blocks(),
        firmware.total_blocks(),
        firmware.free_blocks()
    );
}

fn print_list(firmware: &Firmware, json: bool) -> Result<()> {
    let infos = firmware.entry_infos();
    if json {
        println!("{}", serde_json::to_string_pretty(&infos)?);
        return Ok(());
    }
    println!(
        "{:<12}  {:<12}  {:<12}  {:>8}  {:>6}",
        "FILE", "NAME", "TYPE", "SIZE", "BLOCKS"
    );
    for info in infos {
        println!(
            "{:<12}  {:<12}  {:<12}  {:>8}  {:>6}",
            info.file_name,
            info.name.unwrap_or_default(),
            info.type_label,
            info.size,
            info.blocks_used
        );
    }
    Ok(())
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = load_config(&args)?;

    let mut firmware = Firmware::open(&args.firmware, config)
        .with_context(|| format!("failed to open {}", args.firmware.display()))?;

    match &args.command {
        Command::Info => print_info(&firmware),
        Command::List { json } => print_list(&firmware, *json)?,
        Command::Extract { file_name, dest } => {
            let dest = dest.clone().unwrap_or_else(|| PathBuf::from(file_name));
            firmware
                .extract_to(file_name, &dest)
                .with_context(|| format!("failed to extract {}", file_name))?;
        }
        Command::Inject { files } => {
            for path in files {
                let entry = Entry::from_file(path)
                    .with_context(|| format!("failed to read {}", path.display()))?;
                firmware
                    .inject(entry, true)
                    .with_context(|| format!("failed to inject {}", path.display()))?;
            }
            save(&mut firmware, &args)?;
        }
        Command::Remove { file_names } => {
            for name in file_names {
                if firmware.entry(name).is_none() {
                    bail!("{} is not stored in this firmware", name);
                }
            }
            firmware.remove(file_names.as_slice())?;
            save(&mut firmware, &args)?;
        }
        Command::Move {
            file_name,
            direction,
        } => {
            if !firmware.move_entry(file_name, *direction)? {
                info!("{} is already at the {:?} end", file_name, direction);
            }
            save(&mut firmware, &args)?;
        }
        Command::Defrag => {
            firmware.defragment()?;
            save(&mut firmware, &args)?;
        }
    }

    Ok(())
}
