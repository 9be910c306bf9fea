/// Write binary data
pub mod write;

#[derive(Copy, Clone)]
pub enum U16Be {}

#[derive(Copy, Clone)]
pub enum U32Be {}

/// Binary types with a fixed encoded size.
pub trait FixedSize {
    /// Number of bytes occupied by the encoded value.
    const SIZE: usize;
}

impl FixedSize for U16Be {
    const SIZE: usize = crate::size::U16;
}

impl FixedSize for U32Be {
    const SIZE: usize = crate::size::U32;
}
