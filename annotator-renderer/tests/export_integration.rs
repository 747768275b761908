//! Integration tests for surface export (annotator-renderer).
//!
//! Decodes the exported PNG and checks pixels, so these cover the whole
//! SVG → resvg → PNG pipeline including the embedded photo.

use annotator_core::{Editor, ImageDescriptor, Raster, ShapeKind, Viewport};
use annotator_renderer::{decode_photo, ExportConfig, SurfaceExporter};

/// Editor on a 700x500 surface with a solid-color 20x10 photo, which fits to
/// 700x350 at (0, 75).
fn editor_with_photo(rgba: [u8; 4]) -> Editor {
    let mut editor = Editor::new();
    editor.initialize(Viewport::new(1200.0, 900.0));
    let ticket = editor
        .begin_load(&ImageDescriptor::from_url("https://img.example/photo.png"))
        .expect("ticket");
    let pixels = rgba.repeat(20 * 10);
    editor
        .finish_load(&ticket, Ok(Raster::new(20, 10, pixels).expect("raster")))
        .expect("placement");
    editor
}

fn pixel(raster: &Raster, x: u32, y: u32) -> [u8; 4] {
    let idx = ((y * raster.width() + x) * 4) as usize;
    let px = &raster.rgba()[idx..idx + 4];
    [px[0], px[1], px[2], px[3]]
}

fn export_raster(exporter: &SurfaceExporter, editor: &Editor) -> Raster {
    let artifact = exporter
        .export(editor)
        .expect("export")
        .expect("artifact");
    decode_photo(&artifact.bytes).expect("decode exported png")
}

// ==========================================================================
// Pixel output
// ==========================================================================

#[test]
fn test_photo_is_letterboxed_in_export() {
    let editor = editor_with_photo([0, 255, 0, 255]);
    let exporter = SurfaceExporter::with_defaults();
    let raster = export_raster(&exporter, &editor);

    assert_eq!((raster.width(), raster.height()), (700, 500));
    // Inside the fitted photo
    assert_eq!(pixel(&raster, 350, 250), [0, 255, 0, 255]);
    // Letterbox bands above and below stay transparent
    assert_eq!(pixel(&raster, 350, 20)[3], 0);
    assert_eq!(pixel(&raster, 350, 480)[3], 0);
}

#[test]
fn test_overlays_paint_over_photo() {
    let mut editor = editor_with_photo([255, 255, 255, 255]);
    editor.add_shape(ShapeKind::Rectangle);
    editor.add_shape(ShapeKind::Circle);

    let exporter = SurfaceExporter::with_defaults();
    let raster = export_raster(&exporter, &editor);

    // Rectangle (200,200 100x70) is blue where the circle does not cover it
    assert_eq!(pixel(&raster, 290, 260), [0, 0, 255, 255]);
    // Circle (center 200,200 r=50) was added last and paints on top
    assert_eq!(pixel(&raster, 215, 215), [255, 0, 0, 255]);
    // Photo still visible elsewhere
    assert_eq!(pixel(&raster, 600, 120), [255, 255, 255, 255]);
}

#[test]
fn test_moved_overlay_is_exported_at_new_position() {
    let mut editor = editor_with_photo([255, 255, 255, 255]);
    let rect = editor.add_shape(ShapeKind::Rectangle).expect("rect");
    editor.move_object(rect, 500.0, 300.0).expect("move");
    editor.select(rect).expect("select");

    let exporter = SurfaceExporter::with_defaults();
    let raster = export_raster(&exporter, &editor);

    assert_eq!(pixel(&raster, 550, 330), [0, 0, 255, 255]);
    assert_eq!(pixel(&raster, 250, 235), [255, 255, 255, 255]);
}

#[test]
fn test_export_follows_resized_surface() {
    let mut editor = editor_with_photo([0, 0, 0, 255]);
    editor.resize(Viewport::new(600.0, 500.0));

    let exporter = SurfaceExporter::with_defaults();
    let artifact = exporter
        .export(&editor)
        .expect("export")
        .expect("artifact");
    assert_eq!((artifact.width, artifact.height), (540, 250));
}

#[test]
fn test_retina_scale_doubles_pixels() {
    let editor = editor_with_photo([0, 0, 0, 255]);
    let exporter = SurfaceExporter::new(ExportConfig {
        scale: 2.0,
        ..Default::default()
    });
    let artifact = exporter
        .export(&editor)
        .expect("export")
        .expect("artifact");
    assert_eq!((artifact.width, artifact.height), (1400, 1000));
}

// ==========================================================================
// Edge cases
// ==========================================================================

#[test]
fn test_caption_with_special_characters_still_renders() {
    let mut editor = editor_with_photo([255, 255, 255, 255]);
    let caption = editor.add_text().expect("caption");
    editor
        .edit_text(caption, "Hello <world> & \"friends\"\nsecond line")
        .expect("edit");

    let exporter = SurfaceExporter::with_defaults();
    let artifact = exporter
        .export(&editor)
        .expect("export")
        .expect("artifact");
    assert_eq!(&artifact.bytes[0..4], &[137, 80, 78, 71]);
}

#[test]
fn test_export_before_photo_is_noop() {
    let mut editor = Editor::new();
    let exporter = SurfaceExporter::with_defaults();
    assert!(exporter.export(&editor).expect("export").is_none());

    editor.initialize(Viewport::new(1200.0, 900.0));
    let ticket = editor
        .begin_load(&ImageDescriptor::from_url("https://img.example/pending.jpg"))
        .expect("ticket");
    assert!(exporter.export(&editor).expect("export").is_none());

    // Still nothing after the load fails
    let _ = editor.finish_load(
        &ticket,
        Err(annotator_core::EditorError::ImageLoad("timeout".to_string())),
    );
    assert!(exporter.export(&editor).expect("export").is_none());
}
