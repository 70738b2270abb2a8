//! 表格边界: 强类型的行记录, 以及它们的 CSV 读写.
//!
//! 记录只在读入时校验一次, 此后在流程内部以结构体传递.

mod csv_io;
mod format;
mod record;
mod slides;

pub use csv_io::{
    read_region_table, read_region_table_path, read_rows, read_rows_path, write_region_table,
    write_region_table_path, write_rows, write_rows_path,
};
pub use format::{format_for_analysis, AnalysisRow};
pub use record::{IdentityKey, RegionStatus, SlideRegionRecord};
pub use slides::{
    init_arrow_coords, init_coarse_angles, init_slide_coords, upsert, SampleAngle, SlideCoord,
    SlideEntry,
};
