//! Command-line argument definitions for the Callout CLI.
//!
//! This module defines the [`Args`] structure parsed from the command line
//! using [`clap`]. Global options select the configuration file and logging
//! verbosity; each [`Command`] is one operation on a diagram.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use callout::annotation::Side;

/// Command-line arguments for the Callout annotation tool
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file (TOML)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info", global = true)]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create an annotation document embedding an image
    Create {
        /// Path to the source image
        image: PathBuf,

        /// Path to the output document [default: the image path with an `.svg` extension]
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// MIME type of the image, inferred from its content when omitted
        #[arg(long)]
        mime: Option<String>,
    },

    /// Replace every callout of a document with those in a JSON file
    Annotate {
        /// Path to the annotation document
        document: PathBuf,

        /// JSON array of `{ "id", "x", "y", "side" }` objects
        annotations: PathBuf,

        /// Path to the output document [default: overwrite the input]
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Add one callout to a document
    Add {
        /// Path to the annotation document
        document: PathBuf,

        #[arg(long, allow_negative_numbers = true)]
        x: f32,

        #[arg(long, allow_negative_numbers = true)]
        y: f32,

        /// Callout number [default: one more than the highest in the document]
        #[arg(long)]
        id: Option<u32>,

        /// Side of the leader line (left, right) [default: the side nearest to x]
        #[arg(long)]
        side: Option<Side>,
    },

    /// Remove every callout with the given number from a document
    Remove {
        /// Path to the annotation document
        document: PathBuf,

        #[arg(long)]
        id: u32,
    },

    /// Print the callouts of a document as JSON
    List {
        /// Path to the annotation document
        document: PathBuf,
    },

    /// Write the original embedded image of a document to a file
    Extract {
        /// Path to the annotation document
        document: PathBuf,

        /// Path to the extracted image
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Render a document or a plain image into a raster with baked-in callouts
    Render {
        /// Path to an annotation document or a clean raster image
        input: PathBuf,

        /// JSON annotations, replacing those stored in the document
        #[arg(long)]
        annotations: Option<PathBuf>,

        /// Path to the output raster; a `.jpg` or `.png` extension selects the format
        #[arg(short, long)]
        output: PathBuf,
    },
}
