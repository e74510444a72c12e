use std::{io, path::PathBuf};

use thiserror::Error;

use crate::parameters::ParamType;

/// Failures while decoding a serialized feature record.
#[derive(Error, Debug)]
pub enum FormatError {
    #[error("stream ended before the record was complete")]
    Truncated,
    #[error("negative {field}: {value}")]
    Negative { field: &'static str, value: i64 },
    #[error("unknown descriptor element type tag {0}")]
    UnknownElementType(i32),
    #[error("descriptor payload is {actual} bytes, shape requires {expected}")]
    DescriptorSizeMismatch { expected: u64, actual: u64 },
    #[error("{keypoints} keypoints but {rows} descriptor rows")]
    RowCountMismatch { keypoints: usize, rows: usize },
    #[error("string field is not valid UTF-8")]
    InvalidString,
    #[error("embedded image could not be decoded: {0}")]
    Image(#[from] image::ImageError),
    #[error(transparent)]
    Io(io::Error),
}

impl From<io::Error> for FormatError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::UnexpectedEof => FormatError::Truncated,
            _ => FormatError::Io(err),
        }
    }
}

/// Rejected [`crate::object::FeatureRecord::set_data`] calls.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum RecordError {
    #[error("{keypoints} keypoints but {rows} descriptor rows")]
    RowCountMismatch { keypoints: usize, rows: usize },
}

impl From<RecordError> for FormatError {
    fn from(err: RecordError) -> Self {
        match err {
            RecordError::RowCountMismatch { keypoints, rows } => {
                FormatError::RowCountMismatch { keypoints, rows }
            }
        }
    }
}

/// Failures while writing the rendered picture to disk.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("nothing to save: the view has no picture")]
    EmptyPicture,
    #[error("no encoder for {}, save as png or jpg instead", .0.display())]
    UnsupportedFormat(PathBuf),
    #[error("could not save {path}: {source}")]
    Save {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
    #[error("value {value:?} of {key} is not a valid {ty}")]
    InvalidValue {
        key: String,
        value: String,
        ty: ParamType,
    },
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum PanelError {
    #[error("no control is bound to {0}")]
    UnknownControl(String),
    #[error("control {key} is a {kind}, it cannot take this edit")]
    WrongKind { key: String, kind: &'static str },
    #[error("choice index {index} out of range for {key}")]
    ChoiceOutOfRange { key: String, index: usize },
    #[error("page {0} does not exist")]
    NoSuchPage(usize),
}
