use std::io::Cursor;

use image::{GenericImageView, ImageFormat, Rgb, RgbImage};

use callout_core::{
    annotation::{Annotation, Side},
    draw::CalloutDefinition,
    geometry::CanvasSize,
};
use callout_raster::{Compositor, RasterError, RasterFormat, RasterOptions};

fn encode_source(img: &RgbImage, format: ImageFormat) -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, format).unwrap();
    out.into_inner()
}

/// A gradient, so resampling damage would be visible.
fn gradient_source(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x * 255 / width) as u8, (y * 255 / height) as u8, 128])
    })
}

fn default_compositor() -> Compositor {
    Compositor::new(RasterOptions::default(), CalloutDefinition::default()).unwrap()
}

fn scenario_annotations() -> Vec<Annotation> {
    vec![
        Annotation::new(1, 250.0, 50.0, Side::Left),
        Annotation::new(2, 500.0, 200.0, Side::Right),
    ]
}

#[test]
fn test_scenario_draws_both_callouts() {
    let source = encode_source(&RgbImage::from_pixel(350, 450, Rgb([255, 255, 255])), ImageFormat::Png);
    let compositor = default_compositor();

    let out = compositor.render(&source, &scenario_annotations()).unwrap();
    let rendered = image::load_from_memory(&out).unwrap();
    assert_eq!(rendered.dimensions(), (700, 900));
    let rendered = rendered.to_rgb8();

    // Leader of callout 1 runs from x=50 to x=250 at y=50.
    assert!(rendered.get_pixel(150, 50)[0] < 160);
    // Bubble of callout 1 is centered at (50, 50) with radius 20.
    assert!(rendered.get_pixel(50, 36)[0] < 64);
    // Leader of callout 2 runs from x=650 to x=500 at y=200.
    assert!(rendered.get_pixel(575, 200)[0] < 160);
    // Bubble of callout 2 is centered at (650, 200).
    assert!(rendered.get_pixel(650, 214)[0] < 64);
    // Nothing is drawn between the two callouts.
    assert_eq!(rendered.get_pixel(350, 120).0, [255, 255, 255]);
}

/// Counts near-white pixels within `radius` of `(cx, cy)`.
fn light_pixels_within(img: &RgbImage, cx: i64, cy: i64, radius: i64) -> usize {
    img.enumerate_pixels()
        .filter(|(x, y, px)| {
            let (dx, dy) = (*x as i64 - cx, *y as i64 - cy);
            dx * dx + dy * dy < radius * radius && px[0] > 200
        })
        .count()
}

#[test]
fn test_scenario_draws_numerals_inside_bubbles() {
    let source = encode_source(&RgbImage::from_pixel(350, 450, Rgb([0, 0, 0])), ImageFormat::Png);
    let compositor = default_compositor();

    let out = compositor.render(&source, &scenario_annotations()).unwrap();
    let rendered = image::load_from_memory(&out).unwrap().to_rgb8();

    // On a black source, the only light pixels inside a bubble are its numeral.
    assert!(light_pixels_within(&rendered, 50, 50, 15) >= 10);
    assert!(light_pixels_within(&rendered, 650, 200, 15) >= 10);
    // Away from the callouts the black source shows through.
    assert_eq!(light_pixels_within(&rendered, 350, 600, 15), 0);
}

#[test]
fn test_render_does_not_touch_source() {
    let source = encode_source(&gradient_source(120, 80), ImageFormat::Png);
    let before = source.clone();
    let compositor = default_compositor();

    compositor.render(&source, &scenario_annotations()).unwrap();
    assert_eq!(source, before);
}

#[test]
fn test_rendering_is_idempotent() {
    let source = encode_source(&gradient_source(200, 260), ImageFormat::Png);
    let compositor = default_compositor();
    let annotations = scenario_annotations();

    let first = compositor.render(&source, &annotations).unwrap();
    let second = compositor.render(&source, &annotations).unwrap();
    assert_eq!(first, second);

    // A fresh compositor with the same settings agrees byte for byte.
    let other = default_compositor().render(&source, &annotations).unwrap();
    assert_eq!(first, other);
}

#[test]
fn test_moving_a_callout_leaves_no_trace() {
    let source = encode_source(&gradient_source(200, 260), ImageFormat::Png);
    let compositor = default_compositor();

    let moved = vec![Annotation::new(1, 400.0, 600.0, Side::Right)];
    let direct = compositor.render(&source, &moved).unwrap();

    // Render an earlier placement first; the later render starts from the
    // clean source again.
    compositor.render(&source, &scenario_annotations()).unwrap();
    let after_edit = compositor.render(&source, &moved).unwrap();
    assert_eq!(direct, after_edit);
}

#[test]
fn test_corrupt_source_is_decode_error() {
    let compositor = default_compositor();
    let err = compositor
        .render(b"\x89PNG\r\n\x1a\ngarbage", &scenario_annotations())
        .unwrap_err();
    assert!(matches!(err, RasterError::ImageDecode(_)));
}

#[test]
fn test_invalid_annotation_rejects_whole_batch() {
    let source = encode_source(&gradient_source(10, 10), ImageFormat::Png);
    let compositor = default_compositor();
    let annotations = vec![
        Annotation::new(1, 10.0, 10.0, Side::Left),
        Annotation::new(2, f32::NAN, 10.0, Side::Left),
    ];

    match compositor.render(&source, &annotations) {
        Err(RasterError::Validation(err)) => assert_eq!(err.index, 1),
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[test]
fn test_jpeg_output_and_custom_canvas() {
    let source = encode_source(&gradient_source(64, 48), ImageFormat::Jpeg);
    let options = RasterOptions::default()
        .with_canvas(CanvasSize::new(320, 240))
        .with_supersample(2)
        .with_format(RasterFormat::Jpeg);
    let compositor = Compositor::new(options, CalloutDefinition::default()).unwrap();

    let out = compositor
        .render(&source, &[Annotation::new(12, 200.0, 120.0, Side::Left)])
        .unwrap();
    assert_eq!(image::guess_format(&out).unwrap(), ImageFormat::Jpeg);
    assert_eq!(image::load_from_memory(&out).unwrap().dimensions(), (320, 240));
}

#[test]
fn test_font_unavailable_when_fallback_disabled() {
    let options = RasterOptions::default()
        .with_fonts(vec!["/nonexistent/font.ttf".into()])
        .with_builtin_font(false);
    let err = Compositor::new(options, CalloutDefinition::default()).unwrap_err();
    assert!(matches!(err, RasterError::FontUnavailable(_)));
}
