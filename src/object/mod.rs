//! Detected-feature records: keypoints, descriptors and the image they were
//! extracted from, together with the per-keypoint display state.

mod batch;
mod codec;
mod descriptor;
mod keypoint;

use std::collections::BTreeSet;

use image::{Pixel, Rgba, RgbaImage};
use once_cell::sync::Lazy;

use crate::error::RecordError;

pub use batch::{read_objects, write_objects, BatchLoad};
pub use descriptor::{DescriptorMatrix, Depth, ElementType};
pub use keypoint::Keypoint;

/// Yellow at 20% opacity, drawn for keypoints that were not colored explicitly.
pub static DEFAULT_KEYPOINT_COLOR: Lazy<Rgba<u8>> =
    Lazy::new(|| *Rgba::from_slice(&[255, 255, 0, (20 * 255 / 100) as u8]));

const UNKNOWN_TYPE: &str = "NA";

#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRecord {
    id: i32,
    detector_type: String,
    descriptor_type: String,
    keypoints: Vec<Keypoint>,
    descriptors: DescriptorMatrix,
    image: Option<RgbaImage>,
    /// one per keypoint
    colors: Vec<Rgba<u8>>,
    /// 0-based keypoint indices picked in the view
    selection: BTreeSet<usize>,
    minimum_size: (u32, u32),
}

impl Default for FeatureRecord {
    fn default() -> Self {
        Self {
            id: 0,
            detector_type: UNKNOWN_TYPE.to_owned(),
            descriptor_type: UNKNOWN_TYPE.to_owned(),
            keypoints: Vec::new(),
            descriptors: DescriptorMatrix::default(),
            image: None,
            colors: Vec::new(),
            selection: BTreeSet::new(),
            minimum_size: (0, 0),
        }
    }
}

impl FeatureRecord {
    /// Empty record, typically filled afterwards by [`FeatureRecord::deserialize`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Record built straight from a detection result.
    pub fn with_data(
        id: i32,
        keypoints: Vec<Keypoint>,
        descriptors: DescriptorMatrix,
        image: Option<&RgbaImage>,
        detector_type: &str,
        descriptor_type: &str,
    ) -> Result<Self, RecordError> {
        let mut record = Self {
            id,
            detector_type: detector_type.to_owned(),
            descriptor_type: descriptor_type.to_owned(),
            ..Self::default()
        };
        record.set_data(keypoints, descriptors, image)?;
        Ok(record)
    }

    pub fn id(&self) -> i32 {
        self.id
    }

    pub fn set_id(&mut self, id: i32) {
        self.id = id;
    }

    pub fn detector_type(&self) -> &str {
        &self.detector_type
    }

    pub fn descriptor_type(&self) -> &str {
        &self.descriptor_type
    }

    pub fn set_types(&mut self, detector_type: &str, descriptor_type: &str) {
        self.detector_type = detector_type.to_owned();
        self.descriptor_type = descriptor_type.to_owned();
    }

    pub fn keypoints(&self) -> &[Keypoint] {
        &self.keypoints
    }

    pub fn descriptors(&self) -> &DescriptorMatrix {
        &self.descriptors
    }

    pub fn image(&self) -> Option<&RgbaImage> {
        self.image.as_ref()
    }

    pub fn minimum_size(&self) -> (u32, u32) {
        self.minimum_size
    }

    /// Replaces keypoints, descriptors and image in one step.
    ///
    /// Colors are reset to the default, the selection is cleared and the
    /// image (if any) is copied. The previously owned image is dropped even
    /// when `image` is `None`. Nothing is modified when the descriptor row
    /// count does not match the keypoints.
    pub fn set_data(
        &mut self,
        keypoints: Vec<Keypoint>,
        descriptors: DescriptorMatrix,
        image: Option<&RgbaImage>,
    ) -> Result<(), RecordError> {
        if !keypoints.is_empty() && !descriptors.is_empty() && descriptors.rows() != keypoints.len()
        {
            return Err(RecordError::RowCountMismatch {
                keypoints: keypoints.len(),
                rows: descriptors.rows(),
            });
        }

        self.colors = vec![*DEFAULT_KEYPOINT_COLOR; keypoints.len()];
        self.keypoints = keypoints;
        self.descriptors = descriptors;
        self.selection.clear();
        self.image = image.cloned();
        if let Some(image) = &self.image {
            self.minimum_size = image.dimensions();
        }
        Ok(())
    }

    /// Installs an image decoded from a stream without copying it again.
    pub(crate) fn set_owned_image(&mut self, image: Option<RgbaImage>) {
        self.minimum_size = image.as_ref().map_or((0, 0), |i| i.dimensions());
        self.image = image;
    }

    pub fn colors(&self) -> &[Rgba<u8>] {
        &self.colors
    }

    pub fn keypoint_color(&self, index: usize) -> Option<Rgba<u8>> {
        self.colors.get(index).copied()
    }

    /// Out of range indices are ignored.
    pub fn set_keypoint_color(&mut self, index: usize, color: Rgba<u8>) {
        if let Some(c) = self.colors.get_mut(index) {
            *c = color;
        }
    }

    pub fn reset_keypoint_colors(&mut self) {
        self.colors.fill(*DEFAULT_KEYPOINT_COLOR);
    }

    pub fn selection(&self) -> &BTreeSet<usize> {
        &self.selection
    }

    /// Replaces the selection; indices past the last keypoint are dropped.
    pub fn set_selection<I: IntoIterator<Item = usize>>(&mut self, indices: I) {
        let len = self.keypoints.len();
        self.selection = indices.into_iter().filter(|&i| i < len).collect();
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Keypoints currently selected, in ascending index order.
    pub fn selected_keypoints(&self) -> Vec<Keypoint> {
        self.selection
            .iter()
            .filter_map(|&i| self.keypoints.get(i).copied())
            .collect()
    }

    /// File name proposed when saving the picture of this record.
    pub fn default_file_name(&self) -> Option<String> {
        (self.id != 0).then(|| format!("object_{}.png", self.id))
    }
}
