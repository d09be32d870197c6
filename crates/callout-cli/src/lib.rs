//! CLI logic for the Callout annotation tool.
//!
//! Each subcommand maps onto one [`CalloutEngine`] operation. Documents are
//! rewritten through a temporary file in the destination directory, so an
//! interrupted run never leaves a truncated document behind.

pub mod error_adapter;

mod args;
mod config;

pub use args::{Args, Command};

use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use log::{info, warn};
use tempfile::NamedTempFile;

use callout::{
    CalloutEngine, CalloutError, Compositor, Opened, RasterFormat,
    annotation::{Annotation, Side, next_id},
    document::Document,
};

/// Run the Callout CLI application
///
/// # Errors
///
/// Returns `CalloutError` for:
/// - File I/O errors
/// - Configuration loading errors
/// - Invalid annotations
/// - Unreadable documents or images, including legacy rasters given to an
///   editing command
pub fn run(args: &Args) -> Result<(), CalloutError> {
    let app_config = config::load_config(args.config.as_ref())?;
    let engine = CalloutEngine::new(app_config)?;

    match &args.command {
        Command::Create {
            image,
            output,
            mime,
        } => {
            let output = output
                .clone()
                .unwrap_or_else(|| image.with_extension("svg"));
            let bytes = fs::read(image)?;
            let document = engine.create_document(bytes, mime.as_deref())?;
            write_atomic(&output, engine.serialize(&document).as_bytes())?;
            info!(output_file:? = output; "Document created");
        }
        Command::Annotate {
            document,
            annotations,
            output,
        } => {
            let annotations = read_annotations(annotations)?;
            let mut doc = open_document(&engine, document)?;
            let markup = engine.save(&mut doc, &annotations)?;
            let output = output.as_ref().unwrap_or(document);
            write_atomic(output, markup.as_bytes())?;
            info!(output_file:? = output, annotations = annotations.len(); "Document annotated");
        }
        Command::Add {
            document,
            x,
            y,
            id,
            side,
        } => {
            let mut doc = open_document(&engine, document)?;
            let mut annotations = doc.annotations().to_vec();
            let annotation = Annotation::new(
                id.unwrap_or_else(|| next_id(&annotations)),
                *x,
                *y,
                side.unwrap_or_else(|| Side::for_x(*x, doc.canvas().width())),
            );
            annotations.push(annotation);
            let markup = engine.save(&mut doc, &annotations)?;
            write_atomic(document, markup.as_bytes())?;
            info!(id = annotation.id, side:% = annotation.side; "Callout added");
        }
        Command::Remove { document, id } => {
            let mut doc = open_document(&engine, document)?;
            let annotations: Vec<_> = doc
                .annotations()
                .iter()
                .filter(|annotation| annotation.id != *id)
                .copied()
                .collect();
            if annotations.len() == doc.annotations().len() {
                warn!(id; "No callout with this number, document left unchanged");
                return Ok(());
            }
            let markup = engine.save(&mut doc, &annotations)?;
            write_atomic(document, markup.as_bytes())?;
            info!(id; "Callout removed");
        }
        Command::List { document } => {
            let doc = open_document(&engine, document)?;
            let json = serde_json::to_string_pretty(doc.annotations())
                .map_err(|err| CalloutError::Decode(Box::new(err)))?;
            println!("{json}");
        }
        Command::Extract { document, output } => {
            let doc = open_document(&engine, document)?;
            let (mime, bytes) = doc.extract_source_image();
            write_atomic(output, bytes)?;
            info!(output_file:? = output, mime; "Source image extracted");
        }
        Command::Render {
            input,
            annotations,
            output,
        } => {
            let bytes = fs::read(input)?;
            let (source, stored) = match engine.open(input, &bytes)? {
                Opened::Structured(doc) => {
                    let stored = doc.annotations().to_vec();
                    (doc.source_image().clone().into_parts().1, stored)
                }
                Opened::Legacy { .. } => (bytes, Vec::new()),
            };
            let annotations = match annotations {
                Some(path) => read_annotations(path)?,
                None => stored,
            };

            let compositor = compositor_for(&engine, output)?;
            let encoded = compositor.render(&source, &annotations)?;
            write_atomic(output, &encoded)?;
            info!(
                output_file:? = output,
                format:% = compositor.options().format(),
                annotations = annotations.len();
                "Raster rendered"
            );
        }
    }

    Ok(())
}

/// Opens `path` as a structured document.
///
/// Legacy rasters are reported as a format mismatch, since their callouts
/// cannot be recovered for editing.
fn open_document(engine: &CalloutEngine, path: &Path) -> Result<Document, CalloutError> {
    let bytes = fs::read(path)?;
    match engine.open(path, &bytes)? {
        Opened::Structured(document) => Ok(document),
        Opened::Legacy { format } => Err(CalloutError::FormatMismatch(format!(
            "`{}` is a flat {format:?} image, not an annotation document",
            path.display()
        ))),
    }
}

fn read_annotations(path: &Path) -> Result<Vec<Annotation>, CalloutError> {
    let content = fs::read(path)?;
    serde_json::from_slice(&content).map_err(|err| CalloutError::Decode(Box::new(err)))
}

/// Builds a compositor whose format follows the output extension, falling
/// back to the configured format.
fn compositor_for(engine: &CalloutEngine, output: &Path) -> Result<Compositor, CalloutError> {
    let mut options = engine.raster_options().clone();
    if let Some(format) = output
        .extension()
        .and_then(|ext| ext.to_str())
        .and_then(|ext| ext.parse::<RasterFormat>().ok())
    {
        options = options.with_format(format);
    }
    Ok(Compositor::new(options, engine.definition().clone())?)
}

fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(bytes)?;
    file.persist(path)?;
    Ok(())
}
