//! Stroke compositing onto page rasters for the flattened export path.
//!
//! Strokes are drawn in viewer coordinates here. The raster shares the
//! viewer's top-left origin, so no Y flip is involved; the flip only exists
//! on the vector path where output is in page space.

use crate::ExportError;
use redline_engine::RgbaImage;
use redline_model::Stroke;
use tiny_skia::{LineCap, LineJoin, Paint, PathBuilder, Pixmap, Transform};

/// Stroke `strokes` into `image` in z-order. `scale` maps viewer units to
/// raster pixels, `thickness` is in viewer units.
pub fn composite_strokes(
    image: &mut RgbaImage,
    strokes: &[&Stroke],
    scale: f32,
    thickness: f32,
) -> Result<(), ExportError> {
    if strokes.is_empty() {
        return Ok(());
    }

    let (width, height) = (image.width(), image.height());
    let size = tiny_skia::IntSize::from_wh(width, height)
        .ok_or_else(|| ExportError::Raster("page raster has zero size".to_owned()))?;
    let mut pixmap = Pixmap::from_vec(image.as_raw().clone(), size)
        .ok_or_else(|| ExportError::Raster("page raster buffer mismatch".to_owned()))?;

    for stroke in strokes {
        let Some(path) = build_polyline_path(stroke, scale) else {
            continue;
        };

        let color = stroke.color_or_black();
        let mut paint = Paint::default();
        paint.set_color_rgba8(color.r, color.g, color.b, 255);
        paint.anti_alias = true;

        let stroke_style = tiny_skia::Stroke {
            width: (thickness * scale).max(1.0),
            line_cap: LineCap::Round,
            line_join: LineJoin::Round,
            ..Default::default()
        };

        pixmap.stroke_path(&path, &paint, &stroke_style, Transform::identity(), None);
    }

    image.copy_from_slice(pixmap.data());
    Ok(())
}

fn build_polyline_path(stroke: &Stroke, scale: f32) -> Option<tiny_skia::Path> {
    let (first, rest) = stroke.points.split_first()?;
    if rest.is_empty() {
        return None;
    }

    let mut pb = PathBuilder::new();
    pb.move_to(first.x * scale, first.y * scale);
    for point in rest {
        pb.line_to(point.x * scale, point.y * scale);
    }

    pb.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;
    use redline_model::ViewerPoint;

    fn white_page(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255]))
    }

    #[test]
    fn compositing_changes_pixels_along_the_stroke() {
        let mut image = white_page(100, 100);
        let stroke = Stroke {
            page: 1,
            color: "#FF0000".into(),
            points: vec![ViewerPoint::new(10.0, 50.0), ViewerPoint::new(90.0, 50.0)],
        };

        composite_strokes(&mut image, &[&stroke], 1.0, 2.0).expect("composite should succeed");

        let center = image.get_pixel(50, 50);
        assert!(center.0[0] > 200 && center.0[1] < 100, "stroke midpoint should be red");

        let corner = image.get_pixel(2, 2);
        assert_eq!(corner.0, [255, 255, 255, 255], "pixels off the stroke stay untouched");
    }

    #[test]
    fn scale_maps_viewer_units_to_raster_pixels() {
        let mut image = white_page(200, 200);
        let stroke = Stroke {
            page: 1,
            color: "#0000FF".into(),
            points: vec![ViewerPoint::new(10.0, 50.0), ViewerPoint::new(90.0, 50.0)],
        };

        composite_strokes(&mut image, &[&stroke], 2.0, 2.0).expect("composite should succeed");

        let scaled = image.get_pixel(100, 100);
        assert!(scaled.0[2] > 200, "stroke should land at scaled coordinates");
    }

    #[test]
    fn empty_and_degenerate_strokes_are_skipped() {
        let mut image = white_page(50, 50);
        let single = Stroke {
            page: 1,
            color: String::new(),
            points: vec![ViewerPoint::new(25.0, 25.0)],
        };

        composite_strokes(&mut image, &[&single], 1.0, 2.0).expect("composite should succeed");
        composite_strokes(&mut image, &[], 1.0, 2.0).expect("composite should succeed");

        assert_eq!(image.get_pixel(25, 25).0, [255, 255, 255, 255]);
    }
}
