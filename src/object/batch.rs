use std::io::{self, Read, Write};

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};

use super::FeatureRecord;
use crate::error::FormatError;

/// Outcome of reading a stream of records.
///
/// Records decoded before a failure are kept; the failing record is never
/// partially returned.
#[derive(Debug)]
pub struct BatchLoad {
    pub records: Vec<FeatureRecord>,
    /// index of the record that could not be read, with the reason
    pub failure: Option<(usize, FormatError)>,
}

impl BatchLoad {
    pub fn is_complete(&self) -> bool {
        self.failure.is_none()
    }
}

/// Writes an `i32` record count followed by each record.
pub fn write_objects<'a, W, I>(writer: &mut W, records: I) -> io::Result<()>
where
    W: Write,
    I: IntoIterator<Item = &'a FeatureRecord>,
    I::IntoIter: ExactSizeIterator,
{
    let records = records.into_iter();
    let count = i32::try_from(records.len())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "too many records"))?;
    writer.write_i32::<BigEndian>(count)?;
    for record in records {
        record.serialize(writer)?;
    }
    Ok(())
}

pub fn read_objects<R: Read>(reader: &mut R) -> BatchLoad {
    let mut load = BatchLoad {
        records: Vec::new(),
        failure: None,
    };

    let count = match reader.read_i32::<BigEndian>() {
        Ok(count) => count,
        Err(e) => {
            load.failure = Some((0, e.into()));
            return load;
        }
    };
    if count < 0 {
        load.failure = Some((
            0,
            FormatError::Negative {
                field: "record count",
                value: count as i64,
            },
        ));
        return load;
    }

    for index in 0..count as usize {
        match FeatureRecord::read_from(reader) {
            Ok(record) => load.records.push(record),
            Err(e) => {
                // later records cannot be located once one is malformed
                log::warn!("stopped loading objects at record {}: {}", index, e);
                load.failure = Some((index, e));
                break;
            }
        }
    }
    load
}
