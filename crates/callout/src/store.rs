//! File-backed storage of annotated diagrams.
//!
//! Each diagram lives under an opaque key inside the store root:
//!
//! | File | Contents |
//! |------|----------|
//! | `<key>.clean` | The uploaded bytes, written exactly once. |
//! | `<key>.svg` | The structured annotation document. |
//! | `<key>.png` / `<key>.jpg` | The working raster, rebuilt from the clean copy. |
//!
//! Every write goes to a temporary file in the root and is renamed into place,
//! so readers only ever see a complete file. Operations on the same key are
//! serialized; different keys proceed in parallel.

use std::{
    collections::HashMap,
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
    sync::{Arc, Mutex, PoisonError},
};

use log::{debug, info};
use tempfile::NamedTempFile;
use thiserror::Error;

use callout_core::annotation::Annotation;
use callout_raster::Compositor;

use crate::{
    CalloutEngine, CalloutError,
    document::{Document, SourceImage},
};

const CLEAN_EXTENSION: &str = "clean";
const DOCUMENT_EXTENSION: &str = "svg";

/// Errors specific to the artifact store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid store key `{0}`")]
    InvalidKey(String),

    #[error("`{0}` has already been uploaded")]
    AlreadyExists(String),

    #[error("no diagram stored under `{0}`")]
    NotFound(String),
}

/// A directory of annotated diagrams.
#[derive(Debug)]
pub struct ArtifactStore {
    root: PathBuf,
    engine: CalloutEngine,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl ArtifactStore {
    /// Opens the store at `root`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns [`CalloutError::Io`] if the directory cannot be created.
    pub fn open(root: impl Into<PathBuf>, engine: CalloutEngine) -> Result<Self, CalloutError> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        debug!(root:? = root; "Artifact store opened");
        Ok(Self {
            root,
            engine,
            locks: Mutex::new(HashMap::new()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn engine(&self) -> &CalloutEngine {
        &self.engine
    }

    /// Stores a new upload: the clean copy and a structured document with an
    /// empty annotation layer.
    ///
    /// # Errors
    ///
    /// - [`StoreError::AlreadyExists`] if `key` was uploaded before. The
    ///   existing clean copy is never replaced.
    /// - [`CalloutError::Decode`] if `mime` is `None` and the bytes are not a
    ///   recognized image.
    pub fn upload(
        &self,
        key: &str,
        bytes: &[u8],
        mime: Option<&str>,
    ) -> Result<Document, CalloutError> {
        validate_key(key)?;
        self.with_key_lock(key, || {
            let document = self.engine.create_document(bytes.to_vec(), mime)?;
            let markup = self.engine.serialize(&document);

            let clean_path = self.clean_path(key);
            self.write_new(&clean_path, bytes).map_err(|err| {
                if err.kind() == io::ErrorKind::AlreadyExists {
                    CalloutError::from(StoreError::AlreadyExists(key.to_string()))
                } else {
                    CalloutError::from(err)
                }
            })?;

            if let Err(err) = self.write_atomic(&self.document_path(key), markup.as_bytes()) {
                // A clean copy without its document would block every retry.
                let _ = fs::remove_file(&clean_path);
                return Err(err.into());
            }

            info!(key, bytes = bytes.len(), mime = document.source_image().mime(); "Diagram uploaded");
            Ok(document)
        })
    }

    /// Replaces the annotations of the diagram stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`CalloutError::Validation`] if any annotation is invalid, in
    /// which case nothing is written, or [`StoreError::NotFound`] if `key` was
    /// never uploaded.
    pub fn save_annotations(
        &self,
        key: &str,
        annotations: &[Annotation],
    ) -> Result<Document, CalloutError> {
        validate_key(key)?;
        self.with_key_lock(key, || {
            let mut document = self.read_document(key)?;
            let markup = self.engine.save(&mut document, annotations)?;
            self.write_atomic(&self.document_path(key), markup.as_bytes())?;

            info!(key, annotations = annotations.len(); "Annotations stored");
            Ok(document)
        })
    }

    /// Returns the annotations stored under `key`, in layer order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if `key` was never uploaded.
    pub fn load_annotations(&self, key: &str) -> Result<Vec<Annotation>, CalloutError> {
        validate_key(key)?;
        self.with_key_lock(key, || Ok(self.read_document(key)?.annotations().to_vec()))
    }

    /// Returns the original image stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if `key` was never uploaded.
    pub fn source_image(&self, key: &str) -> Result<SourceImage, CalloutError> {
        validate_key(key)?;
        self.with_key_lock(key, || Ok(self.read_document(key)?.source_image().clone()))
    }

    /// Renders the working raster of `key` from its clean copy and returns
    /// its path.
    ///
    /// The working raster is overwritten; the clean copy is only read.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if `key` was never uploaded, or any
    /// error from the compositor.
    pub fn render_raster(
        &self,
        key: &str,
        annotations: &[Annotation],
        compositor: &Compositor,
    ) -> Result<PathBuf, CalloutError> {
        validate_key(key)?;
        self.with_key_lock(key, || {
            let clean = read_existing(&self.clean_path(key), key)?;
            let encoded = compositor.render(&clean, annotations)?;

            let extension = compositor.options().format().extension();
            let path = self.root.join(format!("{key}.{extension}"));
            self.write_atomic(&path, &encoded)?;

            info!(key, path:? = path, bytes = encoded.len(); "Working raster rendered");
            Ok(path)
        })
    }

    pub fn clean_path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.{CLEAN_EXTENSION}"))
    }

    pub fn document_path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.{DOCUMENT_EXTENSION}"))
    }

    /// Runs `op` while holding the lock of `key`.
    ///
    /// The lock entry is dropped from the map once no other caller holds or
    /// waits on it.
    fn with_key_lock<T>(
        &self,
        key: &str,
        op: impl FnOnce() -> Result<T, CalloutError>,
    ) -> Result<T, CalloutError> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(locks.entry(key.to_string()).or_default())
        };

        let result = {
            let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
            op()
        };

        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        drop(lock);
        if locks.get(key).is_some_and(|entry| Arc::strong_count(entry) == 1) {
            locks.remove(key);
        }
        result
    }

    #[cfg(test)]
    fn tracked_keys(&self) -> usize {
        self.locks.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    fn read_document(&self, key: &str) -> Result<Document, CalloutError> {
        let bytes = read_existing(&self.document_path(key), key)?;
        Ok(Document::parse(&bytes)?)
    }

    fn staged(&self, bytes: &[u8]) -> io::Result<NamedTempFile> {
        let mut file = NamedTempFile::new_in(&self.root)?;
        file.write_all(bytes)?;
        file.as_file().sync_all()?;
        Ok(file)
    }

    /// Writes `bytes` to `path`, replacing any previous file in one step.
    fn write_atomic(&self, path: &Path, bytes: &[u8]) -> io::Result<()> {
        self.staged(bytes)?.persist(path)?;
        Ok(())
    }

    /// Writes `bytes` to `path`, failing if `path` already exists.
    fn write_new(&self, path: &Path, bytes: &[u8]) -> io::Result<()> {
        self.staged(bytes)?.persist_noclobber(path)?;
        Ok(())
    }
}

fn read_existing(path: &Path, key: &str) -> Result<Vec<u8>, CalloutError> {
    fs::read(path).map_err(|err| {
        if err.kind() == io::ErrorKind::NotFound {
            StoreError::NotFound(key.to_string()).into()
        } else {
            err.into()
        }
    })
}

/// Keys name files directly under the root, so anything that could escape it
/// or hide among temporary files is rejected.
fn validate_key(key: &str) -> Result<(), StoreError> {
    let invalid = key.is_empty()
        || key.starts_with('.')
        || key.contains(['/', '\\', '\0'])
        || key.contains("..");
    if invalid {
        return Err(StoreError::InvalidKey(key.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::{io::Cursor, thread};

    use image::{ImageFormat, Rgba, RgbaImage};

    use callout_core::{
        annotation::Side, draw::CalloutDefinition, geometry::CanvasSize,
    };
    use callout_raster::RasterOptions;

    use super::*;

    fn png_bytes() -> Vec<u8> {
        let image = RgbaImage::from_pixel(14, 18, Rgba([40, 90, 160, 255]));
        let mut bytes = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    fn store() -> (tempfile::TempDir, ArtifactStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::open(dir.path(), CalloutEngine::default()).unwrap();
        (dir, store)
    }

    #[test]
    fn test_upload_writes_clean_copy_and_document() {
        let (_dir, store) = store();
        let png = png_bytes();

        let document = store.upload("pump", &png, None).unwrap();
        assert_eq!(document.extract_source_image(), ("image/png", png.as_slice()));
        assert_eq!(fs::read(store.clean_path("pump")).unwrap(), png);
        assert!(store.document_path("pump").exists());
        assert!(store.load_annotations("pump").unwrap().is_empty());
    }

    #[test]
    fn test_second_upload_is_rejected() {
        let (_dir, store) = store();
        let png = png_bytes();
        store.upload("pump", &png, None).unwrap();

        let err = store.upload("pump", b"other", Some("image/png")).unwrap_err();
        assert!(matches!(err, CalloutError::Store(StoreError::AlreadyExists(_))));
        assert_eq!(fs::read(store.clean_path("pump")).unwrap(), png);
    }

    #[test]
    fn test_unrecognized_upload_leaves_nothing_behind() {
        let (dir, store) = store();
        let err = store.upload("notes", b"plain text", None).unwrap_err();
        assert!(matches!(err, CalloutError::Decode(_)));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_save_and_reload() {
        let (_dir, store) = store();
        let png = png_bytes();
        store.upload("pump", &png, None).unwrap();

        let annotations = [
            Annotation::new(1, 250.0, 50.0, Side::Left),
            Annotation::new(2, 600.0, 800.0, Side::Right),
        ];
        store.save_annotations("pump", &annotations).unwrap();
        assert_eq!(store.load_annotations("pump").unwrap(), annotations);

        store.save_annotations("pump", &annotations[1..]).unwrap();
        assert_eq!(store.load_annotations("pump").unwrap(), &annotations[1..]);
        assert_eq!(store.source_image("pump").unwrap().bytes(), png.as_slice());
    }

    #[test]
    fn test_invalid_save_keeps_previous_document() {
        let (_dir, store) = store();
        store.upload("pump", &png_bytes(), None).unwrap();
        let good = [Annotation::new(1, 250.0, 50.0, Side::Left)];
        store.save_annotations("pump", &good).unwrap();
        let before = fs::read(store.document_path("pump")).unwrap();

        let bad = [good[0], Annotation::new(2, -5.0, 10.0, Side::Left)];
        let err = store.save_annotations("pump", &bad).unwrap_err();
        assert!(matches!(err, CalloutError::Validation(_)));
        assert_eq!(fs::read(store.document_path("pump")).unwrap(), before);
    }

    #[test]
    fn test_missing_and_invalid_keys() {
        let (_dir, store) = store();
        assert!(matches!(
            store.load_annotations("absent").unwrap_err(),
            CalloutError::Store(StoreError::NotFound(_))
        ));

        for key in ["", "../escape", "a/b", "a\\b", ".hidden"] {
            assert!(
                matches!(
                    store.upload(key, &png_bytes(), None).unwrap_err(),
                    CalloutError::Store(StoreError::InvalidKey(_))
                ),
                "key {key:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_render_raster_reads_clean_copy_only() {
        let (_dir, store) = store();
        let png = png_bytes();
        store.upload("pump", &png, None).unwrap();

        let options = RasterOptions::default().with_canvas(CanvasSize::new(70, 90));
        let compositor = Compositor::new(options, CalloutDefinition::default()).unwrap();
        let annotations = [Annotation::new(1, 35.0, 45.0, Side::Left)];

        let first = store.render_raster("pump", &annotations, &compositor).unwrap();
        let first_bytes = fs::read(&first).unwrap();
        let second = store.render_raster("pump", &annotations, &compositor).unwrap();

        assert_eq!(first, second);
        assert_eq!(first.extension().and_then(|ext| ext.to_str()), Some("png"));
        assert_eq!(fs::read(&second).unwrap(), first_bytes);
        assert_eq!(fs::read(store.clean_path("pump")).unwrap(), png);
    }

    #[test]
    fn test_concurrent_saves_leave_a_complete_document() {
        let (_dir, store) = store();
        store.upload("pump", &png_bytes(), None).unwrap();

        thread::scope(|scope| {
            for id in 1..=8 {
                let store = &store;
                scope.spawn(move || {
                    let annotations = vec![Annotation::new(id, 100.0, 100.0, Side::Left); id as usize];
                    store.save_annotations("pump", &annotations).unwrap();
                });
            }
        });

        let annotations = store.load_annotations("pump").unwrap();
        let id = annotations[0].id;
        assert_eq!(annotations.len(), id as usize);
        assert!(annotations.iter().all(|annotation| annotation.id == id));
        assert_eq!(store.tracked_keys(), 0);
    }

    #[test]
    fn test_key_locks_are_released_after_use() {
        let (_dir, store) = store();
        for n in 0..20 {
            let key = format!("missing-{n}");
            assert!(store.load_annotations(&key).is_err());
            assert!(store.source_image(&key).is_err());
        }
        assert_eq!(store.tracked_keys(), 0);

        store.upload("pump", &png_bytes(), None).unwrap();
        store
            .save_annotations("pump", &[Annotation::new(1, 10.0, 10.0, Side::Left)])
            .unwrap();
        assert_eq!(store.tracked_keys(), 0);
    }
}
