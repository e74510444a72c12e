//! Inspect feature detection results: keypoints and descriptors stored with the
//! image they came from, drawn as markers over it, plus an editor panel for
//! the detection and matching parameters.

pub mod error;
pub mod object;
pub mod parameters;
pub mod view;

pub use error::{ExportError, FormatError, PanelError, RecordError, SettingsError};
pub use object::{DescriptorMatrix, ElementType, FeatureRecord, Keypoint};
pub use parameters::{ParamType, ParamValue, ParameterPanel, Settings, SharedSettings};
pub use view::{DisplayMode, ObjectView, ViewOptions};
