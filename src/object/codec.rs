//! Binary layout of a [`FeatureRecord`].
//!
//! Big-endian throughout:
//! `id i32 | detector str | descriptor str | count i32 | count * keypoint |
//!  rows i32 | cols i32 | type i32 | byte_length i64 | payload | image`
//! where a keypoint is `angle f32, class_id i32, octave i32, x f32, y f32,
//! response f32, size f32`, a string is a `u32` byte length plus UTF-8 and the
//! image is a `u32` byte length (0 when absent) plus PNG data.

use std::io::{self, Cursor, Read, Write};

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use image::{codecs::png::PngEncoder, ColorType, ImageEncoder, ImageFormat, RgbaImage};
use nalgebra::Point2;

use super::{DescriptorMatrix, ElementType, FeatureRecord, Keypoint};
use crate::error::FormatError;

/// Upper bound on capacity reserved from a count read off the stream.
const MAX_PREALLOCATED_KEYPOINTS: usize = 4096;

impl FeatureRecord {
    pub fn serialize<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_i32::<BigEndian>(self.id)?;
        write_str(writer, &self.detector_type)?;
        write_str(writer, &self.descriptor_type)?;

        writer.write_i32::<BigEndian>(to_i32(self.keypoints.len())?)?;
        for kp in &self.keypoints {
            writer.write_f32::<BigEndian>(kp.angle)?;
            writer.write_i32::<BigEndian>(kp.class_id)?;
            writer.write_i32::<BigEndian>(kp.octave)?;
            writer.write_f32::<BigEndian>(kp.pt.x)?;
            writer.write_f32::<BigEndian>(kp.pt.y)?;
            writer.write_f32::<BigEndian>(kp.response)?;
            writer.write_f32::<BigEndian>(kp.size)?;
        }

        let descriptors = &self.descriptors;
        writer.write_i32::<BigEndian>(to_i32(descriptors.rows())?)?;
        writer.write_i32::<BigEndian>(to_i32(descriptors.cols())?)?;
        writer.write_i32::<BigEndian>(descriptors.element_type().tag())?;
        writer.write_i64::<BigEndian>(descriptors.as_bytes().len() as i64)?;
        writer.write_all(descriptors.as_bytes())?;

        write_image(writer, self.image.as_ref())?;
        log::trace!(
            "serialized object {} ({} keypoints)",
            self.id,
            self.keypoints.len()
        );
        Ok(())
    }

    /// Replaces this record with the one read from `reader`.
    ///
    /// The record is left untouched when the stream is malformed.
    pub fn deserialize<R: Read>(&mut self, reader: &mut R) -> Result<(), FormatError> {
        *self = Self::read_from(reader)?;
        Ok(())
    }

    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self, FormatError> {
        let id = reader.read_i32::<BigEndian>()?;
        let detector_type = read_str(reader)?;
        let descriptor_type = read_str(reader)?;

        let count = read_len(reader, "keypoint count")?;
        let mut keypoints = Vec::with_capacity(count.min(MAX_PREALLOCATED_KEYPOINTS));
        for _ in 0..count {
            let angle = reader.read_f32::<BigEndian>()?;
            let class_id = reader.read_i32::<BigEndian>()?;
            let octave = reader.read_i32::<BigEndian>()?;
            let x = reader.read_f32::<BigEndian>()?;
            let y = reader.read_f32::<BigEndian>()?;
            let response = reader.read_f32::<BigEndian>()?;
            let size = reader.read_f32::<BigEndian>()?;
            keypoints.push(Keypoint {
                pt: Point2::new(x, y),
                size,
                angle,
                response,
                octave,
                class_id,
            });
        }

        let descriptors = read_descriptors(reader)?;
        let image = read_image(reader)?;

        let mut record = FeatureRecord {
            id,
            detector_type,
            descriptor_type,
            ..FeatureRecord::default()
        };
        record.set_data(keypoints, descriptors, None)?;
        record.set_owned_image(image);
        log::trace!("read object {} ({} keypoints)", id, record.keypoints.len());
        Ok(record)
    }
}

fn read_descriptors<R: Read>(reader: &mut R) -> Result<DescriptorMatrix, FormatError> {
    let rows = read_len(reader, "descriptor rows")?;
    let cols = read_len(reader, "descriptor cols")?;
    let element_type = ElementType::from_tag(reader.read_i32::<BigEndian>()?)?;
    let byte_length = reader.read_i64::<BigEndian>()?;
    if byte_length < 0 {
        return Err(FormatError::Negative {
            field: "descriptor byte length",
            value: byte_length,
        });
    }

    // checked before reading so a bogus length never drives an allocation
    let expected = (rows as u64)
        .checked_mul(cols as u64)
        .and_then(|n| n.checked_mul(element_type.size() as u64));
    if expected != Some(byte_length as u64) {
        return Err(FormatError::DescriptorSizeMismatch {
            expected: expected.unwrap_or(u64::MAX),
            actual: byte_length as u64,
        });
    }

    let data = read_bytes(reader, byte_length as u64)?;
    DescriptorMatrix::from_bytes(rows, cols, element_type, data)
}

fn write_image<W: Write>(writer: &mut W, image: Option<&RgbaImage>) -> io::Result<()> {
    let Some(image) = image else {
        return writer.write_u32::<BigEndian>(0);
    };
    let mut png = Vec::new();
    PngEncoder::new(&mut png)
        .write_image(image.as_raw(), image.width(), image.height(), ColorType::Rgba8)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    let len = u32::try_from(png.len())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "image too large"))?;
    writer.write_u32::<BigEndian>(len)?;
    writer.write_all(&png)
}

fn read_image<R: Read>(reader: &mut R) -> Result<Option<RgbaImage>, FormatError> {
    let len = reader.read_u32::<BigEndian>()?;
    if len == 0 {
        return Ok(None);
    }
    let png = read_bytes(reader, len as u64)?;
    let image = image::load(Cursor::new(png), ImageFormat::Png)?;
    Ok(Some(image.to_rgba8()))
}

fn to_i32(n: usize) -> io::Result<i32> {
    i32::try_from(n).map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "count exceeds i32"))
}

fn write_str<W: Write>(writer: &mut W, s: &str) -> io::Result<()> {
    let len = u32::try_from(s.len())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "string too long"))?;
    writer.write_u32::<BigEndian>(len)?;
    writer.write_all(s.as_bytes())
}

/// A non-negative `i32` count.
fn read_len<R: Read>(reader: &mut R, field: &'static str) -> Result<usize, FormatError> {
    let value = reader.read_i32::<BigEndian>()?;
    usize::try_from(value).map_err(|_| FormatError::Negative {
        field,
        value: value as i64,
    })
}

/// Reads exactly `len` bytes, growing the buffer only as data arrives.
fn read_bytes<R: Read>(reader: &mut R, len: u64) -> Result<Vec<u8>, FormatError> {
    let mut buf = Vec::new();
    reader.take(len).read_to_end(&mut buf)?;
    if (buf.len() as u64) < len {
        return Err(FormatError::Truncated);
    }
    Ok(buf)
}

fn read_str<R: Read>(reader: &mut R) -> Result<String, FormatError> {
    let len = reader.read_u32::<BigEndian>()?;
    let bytes = read_bytes(reader, len as u64)?;
    String::from_utf8(bytes).map_err(|_| FormatError::InvalidString)
}
