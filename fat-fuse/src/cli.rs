use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
pub struct Cli {
    /// Disk image file
    #[arg(long, short, default_value = "fs.img")]
    pub image: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create (or truncate) the image and format it
    Format {
        /// Image size in MiB
        #[arg(long, short, default_value_t = 2)]
        size_mib: u64,
    },
    /// List a directory
    Ls {
        #[arg(default_value = "/")]
        path: String,
    },
    /// Create a directory
    Mkdir { path: String },
    /// Copy a host file into the image
    Put { source: PathBuf, path: String },
    /// Copy a file out of the image
    Get { path: String, dest: PathBuf },
    /// Hex dump a file
    Cat { path: String },
    /// Remove a file or an empty directory
    Rm { path: String },
    /// Show the volume layout and usage
    Info,
}
