//! 区域提取.
//!
//! 数据流: [`sequence`] 展开任务 → [`extract`] 逐个提取 → [`merge`] 与历史区域表合并.
//! [`Pipeline`] 将三者串联为区块级别的流程.

mod merge;
mod pipeline;
mod region;
mod sequencer;
mod source;

pub use merge::{merge, merge_with};
pub use pipeline::{BlockReport, JobFailure, Pipeline};
pub use region::{extract, ExtractedRegion};
pub use sequencer::{sequence, ExtractionJob};
pub use source::{MemorySlide, Resolution, SlideSource, TiffSlide};
