//! 🍇欢迎光临🍓
//!
//! 涵盖了本 crate 一系列常用的功能.

pub use crate::config::{
    unpack_block, DevicePayloads, PipelineConfig, ProjectConfig, Sample, UpperBoundPolicy,
    WedgeExtent,
};
pub use crate::error::{ConfigError, ExtractError, TableError};
pub use crate::extract::{
    extract, merge, merge_with, sequence, BlockReport, ExtractionJob, JobFailure, MemorySlide,
    Pipeline, Resolution, SlideSource, TiffSlide,
};
pub use crate::geom::{cartesian_to_polar, compute_bbox, polar_to_cartesian, Point2d, Size2d};
pub use crate::table::{
    format_for_analysis, read_region_table_path, write_region_table_path, IdentityKey,
    RegionStatus, SampleAngle, SlideCoord, SlideRegionRecord,
};
pub use crate::wedge::{overlay, rasterize, ImgWriteVis, Wedge, WedgeMask, WedgeParameters};
