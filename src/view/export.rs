use std::path::{Path, PathBuf};

use image::{DynamicImage, RgbaImage};

use crate::error::ExportError;

/// Extensions the save dialog accepts as already naming an image file.
pub const IMAGE_EXTENSIONS: [&str; 5] = ["png", "xpm", "jpg", "jpeg", "pdf"];

/// The subset of [`IMAGE_EXTENSIONS`] that [`save_picture`] can encode.
pub const SAVE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// Turns the name typed in the save dialog into the file to write.
///
/// Empty input means the dialog was cancelled. `.png` is appended when the
/// name does not already end with one of [`IMAGE_EXTENSIONS`].
pub fn normalize_save_path(input: &str) -> Option<PathBuf> {
    if input.is_empty() {
        return None;
    }
    let has_image_extension = Path::new(input)
        .extension()
        .and_then(|ext| ext.to_str())
        .map_or(false, |ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        });
    Some(if has_image_extension {
        PathBuf::from(input)
    } else {
        PathBuf::from(format!("{}.png", input))
    })
}

/// Encodes `picture` according to the extension of `path`, which must be one
/// of [`SAVE_EXTENSIONS`].
pub fn save_picture(picture: &RgbaImage, path: &Path) -> Result<(), ExportError> {
    if picture.width() == 0 || picture.height() == 0 {
        return Err(ExportError::EmptyPicture);
    }
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .filter(|ext| SAVE_EXTENSIONS.contains(&ext.as_str()))
        .ok_or_else(|| ExportError::UnsupportedFormat(path.to_owned()))?;
    // jpeg has no alpha channel
    let result = if extension == "png" {
        picture.save(path)
    } else {
        DynamicImage::ImageRgba8(picture.clone()).to_rgb8().save(path)
    };
    result.map_err(|source| ExportError::Save {
        path: path.to_owned(),
        source,
    })
}
