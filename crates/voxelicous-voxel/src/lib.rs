//! Per-chunk voxel storage: a fixed-width bit-packed array plus the small palette that
//! gives its entries meaning.

pub mod bitpacked;
pub mod palette;

pub use bitpacked::BitPackedArray;
pub use palette::Palette;
