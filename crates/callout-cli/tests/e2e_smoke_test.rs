use std::{fs, io::Cursor, path::Path};

use clap::Parser;
use image::{GenericImageView, ImageFormat, Rgb, RgbImage};
use tempfile::tempdir;

use callout::{
    CalloutError,
    annotation::{Annotation, Side},
    document::Document,
};
use callout_cli::Args;

fn run(argv: &[&str]) -> Result<(), CalloutError> {
    let mut full = vec!["callout", "--log-level", "off"];
    full.extend_from_slice(argv);
    let args = Args::try_parse_from(full).expect("arguments should parse");
    callout_cli::run(&args)
}

fn write_png(path: &Path) -> Vec<u8> {
    let img = RgbImage::from_fn(70, 90, |x, y| Rgb([(x * 3) as u8, (y * 2) as u8, 200]));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png).unwrap();
    let bytes = out.into_inner();
    fs::write(path, &bytes).unwrap();
    bytes
}

fn annotations_of(path: &Path) -> Vec<Annotation> {
    Document::parse(&fs::read(path).unwrap())
        .unwrap()
        .annotations()
        .to_vec()
}

#[test]
fn e2e_document_lifecycle() {
    let dir = tempdir().expect("Failed to create temp directory");
    let image = dir.path().join("pump.png");
    let png = write_png(&image);
    let doc = dir.path().join("pump.svg");
    let doc_arg = doc.to_str().unwrap();

    run(&["create", image.to_str().unwrap()]).unwrap();
    assert!(doc.exists());
    assert!(annotations_of(&doc).is_empty());

    run(&["add", doc_arg, "--x", "250", "--y", "50"]).unwrap();
    run(&["add", doc_arg, "--x", "500", "--y", "200"]).unwrap();
    assert_eq!(
        annotations_of(&doc),
        vec![
            Annotation::new(1, 250.0, 50.0, Side::Left),
            Annotation::new(2, 500.0, 200.0, Side::Right),
        ]
    );

    run(&["remove", doc_arg, "--id", "1"]).unwrap();
    assert_eq!(
        annotations_of(&doc),
        vec![Annotation::new(2, 500.0, 200.0, Side::Right)]
    );

    let json = dir.path().join("callouts.json");
    fs::write(
        &json,
        r#"[{"id": 7, "x": 120.5, "y": 300, "side": "right"}]"#,
    )
    .unwrap();
    run(&["annotate", doc_arg, json.to_str().unwrap()]).unwrap();
    assert_eq!(
        annotations_of(&doc),
        vec![Annotation::new(7, 120.5, 300.0, Side::Right)]
    );

    let extracted = dir.path().join("original.png");
    run(&["extract", doc_arg, "-o", extracted.to_str().unwrap()]).unwrap();
    assert_eq!(fs::read(&extracted).unwrap(), png);

    let raster = dir.path().join("pump-print.jpg");
    run(&["render", doc_arg, "-o", raster.to_str().unwrap()]).unwrap();
    let rendered = image::open(&raster).unwrap();
    assert_eq!(rendered.dimensions(), (700, 900));

    run(&["list", doc_arg]).unwrap();
}

#[test]
fn e2e_invalid_annotation_leaves_document_untouched() {
    let dir = tempdir().expect("Failed to create temp directory");
    let image = dir.path().join("valve.png");
    write_png(&image);
    let doc = dir.path().join("valve.svg");

    run(&["create", image.to_str().unwrap(), "-o", doc.to_str().unwrap()]).unwrap();
    let before = fs::read(&doc).unwrap();

    let err = run(&["add", doc.to_str().unwrap(), "--x", "-3", "--y", "10"]).unwrap_err();
    assert!(matches!(err, CalloutError::Validation(_)));
    assert_eq!(fs::read(&doc).unwrap(), before);
}

#[test]
fn e2e_legacy_raster_is_not_editable() {
    let dir = tempdir().expect("Failed to create temp directory");
    let image = dir.path().join("legacy.png");
    write_png(&image);

    let err = run(&["add", image.to_str().unwrap(), "--x", "10", "--y", "10"]).unwrap_err();
    assert!(err.is_format_mismatch());

    // Rendering a clean raster directly still works.
    let out = dir.path().join("legacy-out.png");
    run(&["render", image.to_str().unwrap(), "-o", out.to_str().unwrap()]).unwrap();
    assert!(out.exists());
}
