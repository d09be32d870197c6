//! Callout - Non-destructive numbered callouts for exploded-view diagrams.
//!
//! A diagram is annotated with numbered markers, each joined by a leader line
//! to a point on the image. The original image bytes are never resampled or
//! re-encoded, however many times the callouts are edited. Two strategies
//! share that contract:
//!
//! - Structured documents ([`document::Document`]): an SVG embedding the
//!   original bytes next to a replaceable annotation layer. This is the
//!   default.
//! - Raster artifacts: flat PNG or JPEG files composited from a protected
//!   clean copy of the upload (see [`store::ArtifactStore`]).

pub mod config;
pub mod document;
pub mod sniff;
pub mod store;

mod error;

pub use callout_core::{annotation, color, draw, geometry};
pub use callout_raster::{Compositor, RasterFormat, RasterOptions};

pub use error::CalloutError;

use std::path::Path;

use image::ImageFormat;
use log::{debug, info, warn};

use annotation::Annotation;
use config::AppConfig;
use document::{Document, SourceImage};
use draw::CalloutDefinition;
use geometry::CanvasSize;
use sniff::ArtifactKind;

/// The result of opening an artifact for editing.
#[derive(Debug, Clone, PartialEq)]
pub enum Opened {
    /// A structured annotation document.
    Structured(Document),
    /// A flat raster produced by the legacy strategy. Its callouts are baked
    /// into the pixels and cannot be recovered.
    Legacy { format: ImageFormat },
}

/// Annotations handed to an editor, together with whether they can be saved
/// back into a structured document.
#[derive(Debug, Clone, PartialEq)]
pub struct EditState {
    pub annotations: Vec<Annotation>,
    pub structured: bool,
}

/// Entry point for creating, editing and rendering annotated diagrams.
///
/// The engine holds the resolved configuration. It performs no locking of its
/// own; hosts that edit one diagram from several threads should go through
/// [`store::ArtifactStore`].
///
/// # Examples
///
/// ```
/// use callout::{CalloutEngine, annotation::{Annotation, Side}, config::AppConfig};
///
/// let engine = CalloutEngine::new(AppConfig::default()).expect("valid config");
///
/// let png = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
/// let mut doc = engine.create_document(png, None).expect("recognized image");
///
/// let markup = engine
///     .save(&mut doc, &[Annotation::new(1, 250.0, 50.0, Side::Left)])
///     .expect("valid annotations");
/// assert!(markup.contains(r#"data-id="1""#));
/// ```
#[derive(Debug, Clone)]
pub struct CalloutEngine {
    config: AppConfig,
    definition: CalloutDefinition,
    raster: RasterOptions,
}

impl Default for CalloutEngine {
    fn default() -> Self {
        Self {
            config: AppConfig::default(),
            definition: CalloutDefinition::default(),
            raster: RasterOptions::default(),
        }
    }
}

impl CalloutEngine {
    /// Creates an engine from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`CalloutError::Config`] if a style value or the raster
    /// format cannot be parsed.
    pub fn new(config: AppConfig) -> Result<Self, CalloutError> {
        let definition = config
            .style()
            .callout_definition()
            .map_err(CalloutError::Config)?;
        let raster = config.raster_options().map_err(CalloutError::Config)?;
        debug!(
            canvas_width = raster.canvas().width(),
            canvas_height = raster.canvas().height(),
            format:% = raster.format();
            "Engine configured"
        );
        Ok(Self {
            config,
            definition,
            raster,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn definition(&self) -> &CalloutDefinition {
        &self.definition
    }

    pub fn raster_options(&self) -> &RasterOptions {
        &self.raster
    }

    pub fn canvas(&self) -> CanvasSize {
        self.raster.canvas()
    }

    /// Creates a structured document embedding `bytes` on the configured
    /// canvas, with an empty annotation layer.
    ///
    /// When `mime` is `None` it is inferred from the image content.
    ///
    /// # Errors
    ///
    /// Returns [`CalloutError::Decode`] if no MIME type was given and the
    /// content is not a recognized image format.
    pub fn create_document(
        &self,
        bytes: Vec<u8>,
        mime: Option<&str>,
    ) -> Result<Document, CalloutError> {
        let mime = match mime {
            Some(mime) => mime,
            None => SourceImage::sniff_mime(&bytes)
                .ok_or_else(|| CalloutError::Decode("unrecognized image format".into()))?,
        };
        info!(mime, bytes = bytes.len(); "Creating document");
        Ok(Document::create(bytes, mime, self.canvas()))
    }

    /// Opens an artifact, telling structured documents from legacy rasters.
    ///
    /// # Errors
    ///
    /// Returns [`CalloutError::FormatMismatch`] if the bytes are neither, and
    /// a decode error if a structured document cannot be parsed.
    pub fn open(&self, path: &Path, bytes: &[u8]) -> Result<Opened, CalloutError> {
        match ArtifactKind::sniff(path, bytes) {
            ArtifactKind::Structured => {
                let document = Document::parse(bytes)?;
                info!(
                    path:? = path,
                    annotations = document.annotations().len();
                    "Opened structured document"
                );
                Ok(Opened::Structured(document))
            }
            ArtifactKind::Raster(format) => {
                info!(path:? = path, format:? = format; "Opened legacy raster");
                Ok(Opened::Legacy { format })
            }
            ArtifactKind::Unknown => Err(CalloutError::FormatMismatch(format!(
                "`{}` is neither an annotation document nor a raster image",
                path.display()
            ))),
        }
    }

    /// Returns the annotations to preload into an editor.
    ///
    /// Legacy rasters yield no annotations and `structured: false`, so the
    /// editor can start from scratch instead of failing.
    ///
    /// # Errors
    ///
    /// Same as [`CalloutEngine::open`].
    pub fn annotations_for_edit(&self, path: &Path, bytes: &[u8]) -> Result<EditState, CalloutError> {
        let state = match self.open(path, bytes)? {
            Opened::Structured(document) => EditState {
                annotations: document.annotations().to_vec(),
                structured: true,
            },
            Opened::Legacy { .. } => EditState {
                annotations: Vec::new(),
                structured: false,
            },
        };
        Ok(state)
    }

    /// Replaces the document's annotation layer and returns its serialized
    /// markup.
    ///
    /// # Errors
    ///
    /// Returns [`CalloutError::Validation`] if any annotation is invalid. The
    /// document is left unchanged in that case.
    pub fn save(
        &self,
        document: &mut Document,
        annotations: &[Annotation],
    ) -> Result<String, CalloutError> {
        document.replace_annotations(annotations)?;

        let canvas = document.canvas();
        for annotation in annotations {
            if !canvas.contains(annotation.anchor()) {
                warn!(id = annotation.id, x = annotation.x, y = annotation.y; "Annotation lies outside the canvas");
            }
        }

        info!(annotations = annotations.len(); "Annotations saved");
        Ok(self.serialize(document))
    }

    /// Serializes `document` with the configured callout style.
    pub fn serialize(&self, document: &Document) -> String {
        document.to_svg(&self.definition)
    }

    /// Builds a raster compositor from the configured options.
    ///
    /// # Errors
    ///
    /// Returns [`CalloutError::ResourceUnavailable`] if no numeral font can
    /// be loaded.
    pub fn compositor(&self) -> Result<Compositor, CalloutError> {
        Ok(Compositor::new(self.raster.clone(), self.definition.clone())?)
    }

    /// Renders `annotations` over `source` into an encoded raster.
    ///
    /// `source` must be the clean, never-annotated image; it is only read.
    ///
    /// # Errors
    ///
    /// Returns validation, decode or resource errors from the compositor.
    pub fn render_raster(
        &self,
        source: &[u8],
        annotations: &[Annotation],
    ) -> Result<Vec<u8>, CalloutError> {
        let compositor = self.compositor()?;
        Ok(compositor.render(source, annotations)?)
    }
}
