use crate::error::FormatError;

/// Channel depth codes, numbered the way OpenCV numbers them so that type
/// tags written by other tools stay readable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Depth {
    U8 = 0,
    S8 = 1,
    U16 = 2,
    S16 = 3,
    S32 = 4,
    F32 = 5,
    F64 = 6,
}

impl Depth {
    pub fn size(self) -> usize {
        match self {
            Depth::U8 | Depth::S8 => 1,
            Depth::U16 | Depth::S16 => 2,
            Depth::S32 | Depth::F32 => 4,
            Depth::F64 => 8,
        }
    }

    fn from_code(code: i32) -> Option<Self> {
        Some(match code {
            0 => Depth::U8,
            1 => Depth::S8,
            2 => Depth::U16,
            3 => Depth::S16,
            4 => Depth::S32,
            5 => Depth::F32,
            6 => Depth::F64,
            _ => return None,
        })
    }
}

/// Element type of a descriptor matrix: depth plus channel count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElementType {
    pub depth: Depth,
    pub channels: u8,
}

impl ElementType {
    pub const U8: ElementType = ElementType::single(Depth::U8);
    pub const F32: ElementType = ElementType::single(Depth::F32);

    pub const fn single(depth: Depth) -> Self {
        Self { depth, channels: 1 }
    }

    pub fn size(&self) -> usize {
        self.depth.size() * self.channels as usize
    }

    /// Packed tag: `depth + ((channels - 1) << 3)`.
    pub fn tag(&self) -> i32 {
        self.depth as i32 + ((self.channels as i32 - 1) << 3)
    }

    pub fn from_tag(tag: i32) -> Result<Self, FormatError> {
        let channels = (tag >> 3) + 1;
        match Depth::from_code(tag & 7) {
            Some(depth) if tag >= 0 && channels <= u8::MAX as i32 => Ok(Self {
                depth,
                channels: channels as u8,
            }),
            _ => Err(FormatError::UnknownElementType(tag)),
        }
    }
}

/// Descriptor matrix, one row per keypoint, stored as raw row-major bytes.
///
/// `data.len() == rows * cols * element_type.size()` always holds.
#[derive(Debug, Clone, PartialEq)]
pub struct DescriptorMatrix {
    rows: usize,
    cols: usize,
    element_type: ElementType,
    data: Vec<u8>,
}

impl Default for DescriptorMatrix {
    fn default() -> Self {
        Self::empty(ElementType::U8)
    }
}

impl DescriptorMatrix {
    pub fn empty(element_type: ElementType) -> Self {
        Self {
            rows: 0,
            cols: 0,
            element_type,
            data: Vec::new(),
        }
    }

    /// Wraps a raw row-major buffer. The buffer length must match the shape.
    pub fn from_bytes(
        rows: usize,
        cols: usize,
        element_type: ElementType,
        data: Vec<u8>,
    ) -> Result<Self, FormatError> {
        let expected = rows as u64 * cols as u64 * element_type.size() as u64;
        if data.len() as u64 != expected {
            return Err(FormatError::DescriptorSizeMismatch {
                expected,
                actual: data.len() as u64,
            });
        }
        Ok(Self {
            rows,
            cols,
            element_type,
            data,
        })
    }

    /// Binary descriptors (ORB, BRIEF, ...), one byte per column.
    pub fn from_binary_rows<const N: usize>(rows: &[[u8; N]]) -> Self {
        Self {
            rows: rows.len(),
            cols: if rows.is_empty() { 0 } else { N },
            element_type: ElementType::U8,
            data: rows.iter().flatten().copied().collect(),
        }
    }

    /// Float descriptors (SIFT, SURF, ...). Every row must have `cols` values.
    pub fn from_f32_rows(cols: usize, rows: &[Vec<f32>]) -> Result<Self, FormatError> {
        let data = rows
            .iter()
            .flat_map(|row| row.iter().flat_map(|v| v.to_ne_bytes()))
            .collect();
        Self::from_bytes(rows.len(), cols, ElementType::F32, data)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn element_type(&self) -> ElementType {
        self.element_type
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn row_bytes(&self, row: usize) -> Option<&[u8]> {
        let stride = self.cols * self.element_type.size();
        (row < self.rows).then(|| &self.data[row * stride..(row + 1) * stride])
    }

    /// Row decoded as `f32` values, only for single-channel `F32` matrices.
    pub fn row_f32(&self, row: usize) -> Option<Vec<f32>> {
        if self.element_type != ElementType::F32 {
            return None;
        }
        self.row_bytes(row).map(|bytes| {
            bytes
                .chunks_exact(4)
                .map(|c| f32::from_ne_bytes([c[0], c[1], c[2], c[3]]))
                .collect()
        })
    }
}
