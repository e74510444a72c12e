use image::{
    imageops::{self, FilterType},
    Rgba, RgbaImage,
};
use imageproc::drawing::{self, Blend};

use super::{ViewOptions, MARKER_RADIUS};
use crate::object::FeatureRecord;

/// Fills a keypoint marker centered on `(x, y)`, blending with what is below.
/// The radius is truncated so the filled disc stays within the item rect.
pub(crate) fn fill_marker(canvas: &mut Blend<RgbaImage>, x: f32, y: f32, color: Rgba<u8>) {
    let radius = MARKER_RADIUS as i32;
    drawing::draw_filled_ellipse_mut(
        canvas,
        (x.round() as i32, y.round() as i32),
        radius,
        radius,
        color,
    );
}

/// Composites the image and its keypoints into one static picture at the
/// image's native resolution. `None` when the record carries no image.
pub fn compose(record: &FeatureRecord, options: &ViewOptions) -> Option<RgbaImage> {
    let image = record.image().filter(|i| i.width() > 0 && i.height() > 0)?;

    let background = if options.show_image {
        image.clone()
    } else {
        RgbaImage::new(image.width(), image.height())
    };
    let mut canvas = Blend(background);
    if options.show_features {
        for (kp, color) in record.keypoints().iter().zip(record.colors()) {
            fill_marker(&mut canvas, kp.pt.x, kp.pt.y, *color);
        }
    }

    let picture = canvas.0;
    Some(if options.mirror {
        imageops::flip_horizontal(&picture)
    } else {
        picture
    })
}

/// Scales `picture` into a `width` x `height` area keeping its aspect ratio,
/// centered on a transparent background.
pub fn fit(picture: &RgbaImage, width: u32, height: u32) -> RgbaImage {
    let mut area = RgbaImage::new(width, height);
    if picture.width() == 0 || picture.height() == 0 || width == 0 || height == 0 {
        return area;
    }

    let ratio = (width as f32 / picture.width() as f32).min(height as f32 / picture.height() as f32);
    let w = ((picture.width() as f32 * ratio).round() as u32).clamp(1, width);
    let h = ((picture.height() as f32 * ratio).round() as u32).clamp(1, height);
    let scaled = imageops::resize(picture, w, h, FilterType::Triangle);

    let offset_x = (width - w) / 2;
    let offset_y = (height - h) / 2;
    imageops::overlay(&mut area, &scaled, offset_x as i64, offset_y as i64);
    area
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::{DescriptorMatrix, Keypoint, DEFAULT_KEYPOINT_COLOR};

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
    const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);

    fn record_on_black(keypoints: Vec<Keypoint>) -> FeatureRecord {
        let image = RgbaImage::from_pixel(20, 10, BLACK);
        FeatureRecord::with_data(1, keypoints, DescriptorMatrix::default(), Some(&image), "NA", "NA")
            .unwrap()
    }

    #[test]
    fn markers_are_drawn_with_their_color() {
        let mut record = record_on_black(vec![Keypoint::new(5.0, 5.0, 30.0)]);
        record.set_keypoint_color(0, RED);

        let picture = compose(&record, &ViewOptions::default()).unwrap();
        assert_eq!(*picture.get_pixel(5, 5), RED);
        // marker size does not follow the keypoint size
        assert_eq!(*picture.get_pixel(5 + 6, 5), BLACK);
    }

    #[test]
    fn painted_marker_fits_inside_the_item_rect() {
        let mut record = record_on_black(vec![Keypoint::new(5.0, 5.0, 1.0)]);
        record.set_keypoint_color(0, RED);

        let picture = compose(&record, &ViewOptions::default()).unwrap();
        let reach = MARKER_RADIUS as u32;
        assert!((reach as f32) <= MARKER_RADIUS);
        assert_eq!(*picture.get_pixel(5 + reach, 5), RED);
        assert_eq!(*picture.get_pixel(5 + reach + 1, 5), BLACK);
        assert_eq!(*picture.get_pixel(5, 5 - reach), RED);
    }

    #[test]
    fn default_color_is_blended() {
        let record = record_on_black(vec![Keypoint::new(5.0, 5.0, 1.0)]);
        let picture = compose(&record, &ViewOptions::default()).unwrap();
        let pixel = picture.get_pixel(5, 5);
        assert_ne!(*pixel, BLACK);
        assert_ne!(*pixel, *DEFAULT_KEYPOINT_COLOR);
        assert_eq!(pixel[2], 0);
    }

    #[test]
    fn mirror_flips_the_whole_picture() {
        let mut record = record_on_black(vec![Keypoint::new(2.0, 5.0, 1.0)]);
        record.set_keypoint_color(0, RED);
        let options = ViewOptions {
            mirror: true,
            ..ViewOptions::default()
        };

        let picture = compose(&record, &options).unwrap();
        assert_eq!(*picture.get_pixel(17, 5), RED);
        assert_eq!(*picture.get_pixel(2, 5), BLACK);
    }

    #[test]
    fn hidden_layers_are_left_out() {
        let mut record = record_on_black(vec![Keypoint::new(5.0, 5.0, 1.0)]);
        record.set_keypoint_color(0, RED);

        let no_features = ViewOptions {
            show_features: false,
            ..ViewOptions::default()
        };
        assert_eq!(*compose(&record, &no_features).unwrap().get_pixel(5, 5), BLACK);

        let no_image = ViewOptions {
            show_image: false,
            ..ViewOptions::default()
        };
        let picture = compose(&record, &no_image).unwrap();
        assert_eq!(*picture.get_pixel(15, 5), Rgba([0, 0, 0, 0]));
        assert_eq!(*picture.get_pixel(5, 5), RED);
    }

    #[test]
    fn nothing_to_compose_without_image() {
        let record = FeatureRecord::new();
        assert!(compose(&record, &ViewOptions::default()).is_none());
    }

    #[test]
    fn fit_keeps_aspect_ratio_and_centers() {
        let picture = RgbaImage::from_pixel(20, 10, RED);
        let area = fit(&picture, 40, 40);
        assert_eq!(area.dimensions(), (40, 40));
        // scaled to 40 x 20, centered vertically
        assert_eq!(area.get_pixel(20, 5)[3], 0);
        assert_eq!(*area.get_pixel(20, 20), RED);
        assert_eq!(area.get_pixel(20, 35)[3], 0);
    }
}
