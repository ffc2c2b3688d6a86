use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use enumflags2::BitFlags;
use storage_presentable::CreateVolumeFlags;
use storage_testing::config::{LabConfig, LoggingLevel};
use storage_testing::errors::Result;
use storage_testing::lab::LabSession;
use storage_testing::logging;

#[derive(Debug, Parser)]
#[command(name = "lab")]
#[command(about = "Inspect and operate on presentable trees built from lab specs")]
struct LabCli {
    #[command(flatten)]
    global: GlobalArgs,
    #[command(subcommand)]
    command: LabCommand,
}

#[derive(Debug, Args)]
struct GlobalArgs {
    /// Config file (defaults to $XDG_CONFIG_HOME/storage-presentable/lab.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[arg(long, global = true, value_enum)]
    log_level: Option<LoggingLevel>,
    #[arg(long, global = true)]
    log_to_disk: bool,
    /// Directory to look up spec names in
    #[arg(long, global = true)]
    specs_dir: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
enum LabCommand {
    /// Print the presentable tree
    Tree { spec: String },
    /// Print free space and array state per drive
    Capacity { spec: String },
    CreateVolume {
        spec: String,
        #[arg(long = "drive")]
        drive_id: String,
        /// Size such as "10 GB" or a plain byte count
        #[arg(long)]
        size: String,
        #[arg(long)]
        name: Option<String>,
        /// Create an md component partition
        #[arg(long, conflicts_with = "lvm")]
        raid: bool,
        /// Create an LVM2 physical volume partition
        #[arg(long)]
        lvm: bool,
    },
    Activate {
        spec: String,
        #[arg(long = "drive")]
        drive_id: String,
    },
    Deactivate {
        spec: String,
        #[arg(long = "drive")]
        drive_id: String,
    },
}

fn load_config(global: &GlobalArgs) -> Result<LabConfig> {
    let path = global
        .config
        .clone()
        .unwrap_or_else(LabConfig::default_path);
    let mut config = LabConfig::load(&path)?;

    if let Some(level) = global.log_level {
        config.log_level = level;
    }
    if global.log_to_disk {
        config.log_to_disk = true;
    }
    if let Some(dir) = &global.specs_dir {
        config.specs_dir = Some(dir.clone());
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = LabCli::parse();
    let config = load_config(&cli.global)?;
    logging::init(&config);

    let specs_dir = config.specs_dir.as_deref();
    match cli.command {
        LabCommand::Tree { spec } => {
            let session = LabSession::load(&spec, specs_dir)?;
            print!("{}", session.render_tree());
        }
        LabCommand::Capacity { spec } => {
            let session = LabSession::load(&spec, specs_dir)?;
            print!("{}", session.render_capacity());
        }
        LabCommand::CreateVolume {
            spec,
            drive_id,
            size,
            name,
            raid,
            lvm,
        } => {
            let session = LabSession::load(&spec, specs_dir)?;
            let mut flags = BitFlags::empty();
            if raid {
                flags |= CreateVolumeFlags::LinuxMd;
            }
            if lvm {
                flags |= CreateVolumeFlags::LinuxLvm2;
            }

            let volume_id = session
                .create_volume(&drive_id, &size, name.as_deref(), flags)
                .await?;
            println!("created {volume_id}");
            print!("{}", session.render_tree());
        }
        LabCommand::Activate { spec, drive_id } => {
            let session = LabSession::load(&spec, specs_dir)?;
            let array = session.activate(&drive_id).await?;
            println!("started {array}");
            print!("{}", session.render_tree());
        }
        LabCommand::Deactivate { spec, drive_id } => {
            let session = LabSession::load(&spec, specs_dir)?;
            session.deactivate(&drive_id).await?;
            println!("stopped {drive_id}");
            print!("{}", session.render_tree());
        }
    }

    Ok(())
}
