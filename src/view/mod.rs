//! Displaying a [`FeatureRecord`]: either as an interactive scene where every
//! keypoint is its own item, or painted directly into a single picture.

mod export;
mod paint;
mod scene;

use std::path::PathBuf;

use image::{imageops, Rgba, RgbaImage};

use crate::{
    error::{ExportError, RecordError},
    object::{DescriptorMatrix, FeatureRecord, Keypoint},
};

pub use export::{normalize_save_path, save_picture, IMAGE_EXTENSIONS, SAVE_EXTENSIONS};
pub use paint::{compose, fit};
pub use scene::{KeypointItem, Rect, Scene};

/// Marker radius in pixels, the same for every keypoint whatever its size.
pub const MARKER_RADIUS: f32 = 14.0 * 1.2 / 9.0 * 2.0;

/// Toggles from the view's context menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewOptions {
    pub show_image: bool,
    pub show_features: bool,
    pub mirror: bool,
}

impl Default for ViewOptions {
    fn default() -> Self {
        Self {
            show_image: true,
            show_features: true,
            mirror: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayMode {
    #[default]
    Scene,
    /// keypoints painted over the image into one static picture
    Plain,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuAction {
    ShowImage,
    ShowFeatures,
    MirrorView,
    PlainView,
    /// text entered in the save dialog, empty when cancelled
    SavePicture(String),
    Delete,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    Updated,
    Saved(PathBuf),
    Cancelled,
    /// the owner should discard the object with this id
    RemovalRequested(i32),
}

#[derive(Debug, Clone)]
pub struct ObjectView {
    record: FeatureRecord,
    options: ViewOptions,
    mode: DisplayMode,
    /// dropped by `set_data` in plain mode, rebuilt when the scene is shown again
    scene: Option<Scene>,
    deletable: bool,
    saved_file_name: Option<String>,
    widget_size: Option<(u32, u32)>,
}

impl ObjectView {
    pub fn new(record: FeatureRecord) -> Self {
        let mut view = Self {
            saved_file_name: record.default_file_name(),
            record,
            options: ViewOptions::default(),
            mode: DisplayMode::default(),
            scene: None,
            deletable: false,
            widget_size: None,
        };
        view.scene = Some(Scene::build(&view.record, &view.options));
        view
    }

    pub fn record(&self) -> &FeatureRecord {
        &self.record
    }

    pub fn into_record(self) -> FeatureRecord {
        self.record
    }

    pub fn options(&self) -> ViewOptions {
        self.options
    }

    pub fn mode(&self) -> DisplayMode {
        self.mode
    }

    /// `None` in plain mode.
    pub fn scene(&self) -> Option<&Scene> {
        match self.mode {
            DisplayMode::Scene => self.scene.as_ref(),
            DisplayMode::Plain => None,
        }
    }

    pub fn set_deletable(&mut self, deletable: bool) {
        self.deletable = deletable;
    }

    pub fn saved_file_name(&self) -> Option<&str> {
        self.saved_file_name.as_deref()
    }

    pub fn set_id(&mut self, id: i32) {
        self.record.set_id(id);
        if let Some(name) = self.record.default_file_name() {
            self.saved_file_name = Some(name);
        }
    }

    /// Size of the area the plain picture is fitted into.
    pub fn set_widget_size(&mut self, width: u32, height: u32) {
        self.widget_size = Some((width, height));
    }

    pub fn set_data(
        &mut self,
        keypoints: Vec<Keypoint>,
        descriptors: DescriptorMatrix,
        image: Option<&RgbaImage>,
    ) -> Result<(), RecordError> {
        self.record.set_data(keypoints, descriptors, image)?;
        self.scene = match self.mode {
            DisplayMode::Scene => Some(Scene::build(&self.record, &self.options)),
            DisplayMode::Plain => None,
        };
        Ok(())
    }

    pub fn set_display_mode(&mut self, mode: DisplayMode) {
        self.mode = mode;
        if mode == DisplayMode::Scene {
            match &mut self.scene {
                Some(scene) => scene.sync(&self.record),
                None => self.scene = Some(Scene::build(&self.record, &self.options)),
            }
        }
    }

    pub fn set_keypoint_color(&mut self, index: usize, color: Rgba<u8>) {
        self.record.set_keypoint_color(index, color);
        if let (DisplayMode::Scene, Some(scene)) = (self.mode, &mut self.scene) {
            scene.set_item_color(index, color);
        }
    }

    pub fn reset_keypoint_colors(&mut self) {
        self.record.reset_keypoint_colors();
        if let (DisplayMode::Scene, Some(scene)) = (self.mode, &mut self.scene) {
            scene.sync(&self.record);
        }
    }

    /// Selects with a rubber band dragged in scene coordinates. Plain mode has
    /// no selectable items and leaves the selection alone.
    pub fn rubber_band_select(&mut self, band: &Rect) -> Vec<Keypoint> {
        if let (DisplayMode::Scene, Some(scene)) = (self.mode, &mut self.scene) {
            let indices = scene.rubber_band_select(band);
            self.record.set_selection(indices);
        }
        self.record.selected_keypoints()
    }

    pub fn select<I: IntoIterator<Item = usize>>(&mut self, indices: I) {
        self.record.set_selection(indices);
        if let Some(scene) = &mut self.scene {
            scene.sync(&self.record);
        }
    }

    pub fn selected_keypoints(&self) -> Vec<Keypoint> {
        self.record.selected_keypoints()
    }

    /// What the widget currently shows. In scene mode mirroring is a view
    /// transform applied on top of the rendered scene.
    pub fn paint(&self) -> Option<RgbaImage> {
        match self.mode {
            DisplayMode::Scene => {
                let picture = self.scene.as_ref()?.render(self.record.image())?;
                Some(if self.options.mirror {
                    imageops::flip_horizontal(&picture)
                } else {
                    picture
                })
            }
            DisplayMode::Plain => {
                let picture = compose(&self.record, &self.options)?;
                Some(match self.widget_size {
                    Some((w, h)) => fit(&picture, w, h),
                    None => picture,
                })
            }
        }
    }

    /// Picture written by [`save_picture`](Self::save_picture): the scene
    /// itself in scene mode, without the view transform.
    fn export_picture(&self) -> Option<RgbaImage> {
        match self.mode {
            DisplayMode::Scene => self.scene.as_ref()?.render(self.record.image()),
            DisplayMode::Plain => self.paint(),
        }
    }

    pub fn handle_action(&mut self, action: MenuAction) -> Result<ActionOutcome, ExportError> {
        match action {
            MenuAction::ShowImage => {
                self.options.show_image = !self.options.show_image;
                if let Some(scene) = &mut self.scene {
                    scene.set_image_visible(self.options.show_image);
                }
            }
            MenuAction::ShowFeatures => {
                self.options.show_features = !self.options.show_features;
                if let Some(scene) = &mut self.scene {
                    scene.set_features_visible(self.options.show_features);
                }
            }
            MenuAction::MirrorView => self.options.mirror = !self.options.mirror,
            MenuAction::PlainView => self.set_display_mode(match self.mode {
                DisplayMode::Scene => DisplayMode::Plain,
                DisplayMode::Plain => DisplayMode::Scene,
            }),
            MenuAction::SavePicture(text) => return self.save_picture(&text),
            MenuAction::Delete => {
                if !self.deletable {
                    return Ok(ActionOutcome::Cancelled);
                }
                return Ok(ActionOutcome::RemovalRequested(self.record.id()));
            }
        }
        Ok(ActionOutcome::Updated)
    }

    /// Saves what the view shows under the name typed in the save dialog.
    pub fn save_picture(&mut self, text: &str) -> Result<ActionOutcome, ExportError> {
        let Some(path) = normalize_save_path(text) else {
            return Ok(ActionOutcome::Cancelled);
        };
        let picture = self.export_picture().ok_or(ExportError::EmptyPicture)?;
        if let Err(e) = save_picture(&picture, &path) {
            log::warn!("{}", e);
            return Err(e);
        }
        self.saved_file_name = Some(path.to_string_lossy().into_owned());
        Ok(ActionOutcome::Saved(path))
    }
}
