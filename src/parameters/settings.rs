use std::{cell::RefCell, collections::BTreeMap, fs, io, path::Path, rc::Rc};

use serde::{Deserialize, Serialize};

use super::{ParamType, ParamValue};
use crate::error::SettingsError;

/// Ordered by key, so entries of one `group/` prefix are contiguous.
pub type ParametersMap = BTreeMap<String, ParamValue>;
pub type ParametersTypes = BTreeMap<String, ParamType>;

/// Registry handle shared between the panel and the rest of the UI thread.
pub type SharedSettings = Rc<RefCell<Settings>>;

/// Live parameter values with their declared types and defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Settings {
    parameters: ParametersMap,
    defaults: ParametersMap,
    types: ParametersTypes,
}

/// On-disk form: every value in its textual form, typed again on load.
#[derive(Serialize, Deserialize, Default)]
struct SettingsFile {
    parameters: BTreeMap<String, String>,
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_shared(self) -> SharedSettings {
        Rc::new(RefCell::new(self))
    }

    /// Declares `key` with its type and default, and sets it to the default.
    /// A default of another kind is converted to `ty`.
    pub fn define(&mut self, key: &str, ty: ParamType, default: impl Into<ParamValue>) {
        let given = default.into();
        let default = given.clone().coerce(ty);
        if default != given {
            log::warn!("default {} of {} stored as {} ({})", given, key, default, ty);
        }
        self.types.insert(key.to_owned(), ty);
        self.parameters.insert(key.to_owned(), default.clone());
        self.defaults.insert(key.to_owned(), default);
    }

    pub fn parameters(&self) -> &ParametersMap {
        &self.parameters
    }

    pub fn default_parameters(&self) -> &ParametersMap {
        &self.defaults
    }

    pub fn parameter_types(&self) -> &ParametersTypes {
        &self.types
    }

    pub fn parameter(&self, key: &str) -> Option<&ParamValue> {
        self.parameters.get(key)
    }

    pub fn default_parameter(&self, key: &str) -> Option<&ParamValue> {
        self.defaults.get(key)
    }

    pub fn parameter_type(&self, key: &str) -> Option<ParamType> {
        self.types.get(key).copied()
    }

    /// Inserts or replaces a live value.
    pub fn set_parameter(&mut self, key: &str, value: impl Into<ParamValue>) {
        self.parameters.insert(key.to_owned(), value.into());
    }

    /// Removes a default, leaving the key without one.
    pub fn clear_default(&mut self, key: &str) {
        self.defaults.remove(key);
    }

    pub fn restore_defaults(&mut self) {
        for (key, value) in &self.defaults {
            self.parameters.insert(key.clone(), value.clone());
        }
    }

    /// Reads values saved by [`Settings::save`] over the current ones.
    ///
    /// A missing file keeps the current values. Keys without a declared type
    /// are skipped; nothing is applied if any value fails to parse.
    pub fn load(&mut self, path: &Path) -> Result<(), SettingsError> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::debug!("no settings at {}, keeping defaults", path.display());
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };
        let file: SettingsFile = serde_yaml::from_str(&text)?;

        let mut parsed = Vec::with_capacity(file.parameters.len());
        for (key, text) in file.parameters {
            let Some(ty) = self.parameter_type(&key) else {
                log::warn!("ignoring unknown parameter {}", key);
                continue;
            };
            match ParamValue::parse(ty, &text) {
                Some(value) => parsed.push((key, value)),
                None => {
                    return Err(SettingsError::InvalidValue {
                        key,
                        value: text,
                        ty,
                    })
                }
            }
        }

        log::debug!("loaded {} parameters from {}", parsed.len(), path.display());
        self.parameters.extend(parsed);
        Ok(())
    }

    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        let file = SettingsFile {
            parameters: self
                .parameters
                .iter()
                .map(|(key, value)| (key.clone(), value.to_string()))
                .collect(),
        };
        fs::write(path, serde_yaml::to_string(&file)?)?;
        log::debug!("saved {} parameters to {}", self.parameters.len(), path.display());
        Ok(())
    }

    /// Registry of a feature matching application: camera, detector and
    /// descriptor choices, their tuning, and the matching stages.
    pub fn find_object_defaults() -> Self {
        use ParamType::*;

        let mut settings = Self::new();
        settings.define("Camera/deviceId", Integer, 0);
        settings.define("Camera/imageWidth", Integer, 640);
        settings.define("Camera/imageHeight", Integer, 480);
        settings.define("Camera/imageRate", Double, 2.0);
        settings.define("Camera/videoFilePath", Text, "");

        settings.define(
            "Detector/Type",
            Text,
            "7:Dense;Fast;GoodFeaturesToTrack;Mser;Orb;Sift;Star;Surf",
        );
        settings.define("Descriptor/Type", Text, "3:Brief;Orb;Sift;Surf");

        settings.define("Fast/threshold", Integer, 10);
        settings.define("Fast/nonmaxSuppression", Boolean, true);

        settings.define("Orb/nFeatures", Integer, 500);
        settings.define("Orb/scaleFactor", Float, 1.2);
        settings.define("Orb/nLevels", Integer, 8);
        settings.define("Orb/edgeThreshold", Integer, 31);
        settings.define("Orb/patchSize", Integer, 31);

        settings.define("Sift/nFeatures", Integer, 0);
        settings.define("Sift/nOctaveLayers", Integer, 3);
        settings.define("Sift/contrastThreshold", Double, 0.04);
        settings.define("Sift/edgeThreshold", Double, 10.0);
        settings.define("Sift/sigma", Double, 1.6);

        settings.define("Surf/hessianThreshold", Double, 600.0);
        settings.define("Surf/nOctaves", Integer, 4);
        settings.define("Surf/nOctaveLayers", Integer, 2);
        settings.define("Surf/extended", Boolean, false);
        settings.define("Surf/upright", Boolean, false);

        settings.define("NearestNeighbor/nndrRatioUsed", Boolean, true);
        settings.define("NearestNeighbor/nndrRatio", Float, 0.8);
        settings.define("NearestNeighbor/minDistanceUsed", Boolean, false);
        settings.define("NearestNeighbor/minDistance", Float, 1.6);

        settings.define("Homography/method", Text, "1:LMEDS;RANSAC");
        settings.define("Homography/ransacReprojThr", Double, 1.0);
        settings.define("Homography/minimumInliers", Integer, 10);

        settings.define("General/autoStartCamera", Boolean, false);
        settings.define("General/mirrorView", Boolean, true);
        settings.define("General/nextObjID", Unsigned, 1u32);
        settings
    }
}
