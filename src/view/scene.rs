use image::{Rgba, RgbaImage};
use imageproc::drawing::Blend;

use super::{paint, ViewOptions, MARKER_RADIUS};
use crate::object::FeatureRecord;

/// Axis aligned rectangle in scene coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Builds a rectangle from two opposite corners given in any order, as
    /// produced by a rubber band drag.
    pub fn from_corners(a: (f32, f32), b: (f32, f32)) -> Self {
        Self::new(a.0.min(b.0), a.1.min(b.1), (a.0 - b.0).abs(), (a.1 - b.1).abs())
    }

    pub fn contains_rect(&self, other: &Rect) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.x + other.width <= self.x + self.width
            && other.y + other.height <= self.y + self.height
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// One selectable, inspectable marker per keypoint.
#[derive(Debug, Clone, PartialEq)]
pub struct KeypointItem {
    /// 1-based index of the keypoint in its record
    pub id: usize,
    pub rect: Rect,
    pub info: String,
    pub color: Rgba<u8>,
    pub visible: bool,
    pub selected: bool,
}

impl KeypointItem {
    /// z value of markers, above the background image at 0
    pub const Z_VALUE: i32 = 1;

    pub fn index(&self) -> usize {
        self.id - 1
    }
}

/// Interactive rendering of a record: background image plus one item per
/// keypoint.
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    width: u32,
    height: u32,
    image_visible: bool,
    items: Vec<KeypointItem>,
}

impl Scene {
    pub fn build(record: &FeatureRecord, options: &ViewOptions) -> Self {
        let (width, height) = record.image().map_or((0, 0), |i| i.dimensions());
        let items = record
            .keypoints()
            .iter()
            .zip(record.colors())
            .enumerate()
            .map(|(i, (kp, color))| KeypointItem {
                id: i + 1,
                rect: Rect::new(
                    kp.pt.x - MARKER_RADIUS,
                    kp.pt.y - MARKER_RADIUS,
                    MARKER_RADIUS * 2.0,
                    MARKER_RADIUS * 2.0,
                ),
                info: kp.info(i + 1),
                color: *color,
                visible: options.show_features,
                selected: record.selection().contains(&i),
            })
            .collect();
        log::debug!(
            "built scene {}x{} for object {}",
            width,
            height,
            record.id()
        );

        Self {
            width,
            height,
            image_visible: options.show_image,
            items,
        }
    }

    pub fn rect(&self) -> Rect {
        Rect::new(0.0, 0.0, self.width as f32, self.height as f32)
    }

    pub fn items(&self) -> &[KeypointItem] {
        &self.items
    }

    /// Item under a scene position, topmost (last added) first.
    pub fn item_at(&self, x: f32, y: f32) -> Option<&KeypointItem> {
        self.items.iter().rev().find(|item| {
            let (cx, cy) = item.rect.center();
            item.visible && (x - cx).powi(2) + (y - cy).powi(2) <= MARKER_RADIUS.powi(2)
        })
    }

    pub fn set_image_visible(&mut self, visible: bool) {
        self.image_visible = visible;
    }

    pub fn set_features_visible(&mut self, visible: bool) {
        for item in &mut self.items {
            item.visible = visible;
        }
    }

    pub fn set_item_color(&mut self, index: usize, color: Rgba<u8>) {
        if let Some(item) = self.items.get_mut(index) {
            item.color = color;
        }
    }

    /// Copies colors and selection back from the record.
    pub fn sync(&mut self, record: &FeatureRecord) {
        for (i, (item, color)) in self.items.iter_mut().zip(record.colors()).enumerate() {
            item.color = *color;
            item.selected = record.selection().contains(&i);
        }
    }

    /// Selects the visible items whose marker lies entirely inside `band`,
    /// deselecting the rest. Returns the 0-based keypoint indices selected.
    pub fn rubber_band_select(&mut self, band: &Rect) -> Vec<usize> {
        let mut selected = Vec::new();
        for item in &mut self.items {
            item.selected = item.visible && band.contains_rect(&item.rect);
            if item.selected {
                selected.push(item.index());
            }
        }
        selected
    }

    pub fn selected_indices(&self) -> Vec<usize> {
        self.items
            .iter()
            .filter(|item| item.selected)
            .map(KeypointItem::index)
            .collect()
    }

    /// Draws the scene rect: background image then visible markers.
    pub fn render(&self, image: Option<&RgbaImage>) -> Option<RgbaImage> {
        if self.width == 0 || self.height == 0 {
            return None;
        }
        let background = match image {
            Some(image) if self.image_visible => image.clone(),
            _ => RgbaImage::new(self.width, self.height),
        };
        let mut canvas = Blend(background);
        for item in self.items.iter().filter(|item| item.visible) {
            let (x, y) = item.rect.center();
            paint::fill_marker(&mut canvas, x, y, item.color);
        }
        Some(canvas.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::{DescriptorMatrix, Keypoint};

    fn record() -> FeatureRecord {
        let image = RgbaImage::new(100, 100);
        let keypoints = vec![
            Keypoint::new(10.0, 10.0, 50.0),
            Keypoint::new(50.0, 50.0, 2.0),
            Keypoint::new(90.0, 90.0, 8.0),
        ];
        FeatureRecord::with_data(2, keypoints, DescriptorMatrix::default(), Some(&image), "NA", "NA")
            .unwrap()
    }

    #[test]
    fn items_use_a_uniform_marker_size() {
        let scene = Scene::build(&record(), &ViewOptions::default());
        assert_eq!(scene.items().len(), 3);
        for item in scene.items() {
            assert!((item.rect.width - 2.0 * MARKER_RADIUS).abs() < f32::EPSILON);
        }
        let first = &scene.items()[0];
        assert_eq!(first.id, 1);
        assert!((first.rect.x - (10.0 - MARKER_RADIUS)).abs() < 1e-5);
        assert!(first.info.starts_with("ID = 1\n"));
    }

    #[test]
    fn rubber_band_needs_full_containment() {
        let mut scene = Scene::build(&record(), &ViewOptions::default());
        let band = Rect::from_corners((95.0, 95.0), (8.0, 8.0));
        // first marker pokes out of the band's top-left corner
        assert_eq!(scene.rubber_band_select(&band), vec![1, 2]);
        assert_eq!(scene.selected_indices(), vec![1, 2]);

        let everything = Rect::new(0.0, 0.0, 100.0, 100.0);
        assert_eq!(scene.rubber_band_select(&everything), vec![0, 1, 2]);
    }

    #[test]
    fn hidden_items_are_not_picked() {
        let options = ViewOptions {
            show_features: false,
            ..ViewOptions::default()
        };
        let mut scene = Scene::build(&record(), &options);
        assert!(scene.rubber_band_select(&scene.rect()).is_empty());
        assert!(scene.item_at(50.0, 50.0).is_none());

        scene.set_features_visible(true);
        assert_eq!(scene.item_at(51.0, 49.0).map(|i| i.id), Some(2));
    }

    #[test]
    fn sync_restores_record_state() {
        let mut record = record();
        let mut scene = Scene::build(&record, &ViewOptions::default());
        record.set_keypoint_color(2, Rgba([0, 255, 0, 255]));
        record.set_selection([0]);

        scene.sync(&record);
        assert_eq!(scene.items()[2].color, Rgba([0, 255, 0, 255]));
        assert_eq!(scene.selected_indices(), vec![0]);
    }

    #[test]
    fn render_covers_the_scene_rect() {
        let mut record = record();
        record.set_keypoint_color(1, Rgba([255, 0, 0, 255]));
        let scene = Scene::build(&record, &ViewOptions::default());
        let picture = scene.render(record.image()).unwrap();
        assert_eq!(picture.dimensions(), (100, 100));
        assert_eq!(*picture.get_pixel(50, 50), Rgba([255, 0, 0, 255]));

        let empty = Scene::build(&FeatureRecord::new(), &ViewOptions::default());
        assert!(empty.render(None).is_none());
    }
}
