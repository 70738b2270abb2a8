//! 通用常量.

/// 合成孔位点到装置中心的参考距离, 以微米为单位.
///
/// 该点只是显示与编辑的辅助, 不是测量值. 每次提取都按同一距离重新计算.
pub const WELL_REFERENCE_RADIUS_UM: f64 = 400.0;

/// 重新定位后的标注点到裁剪图像边缘的最小距离, 以像素为单位.
pub const MERGE_MARGIN_PX: i64 = 5;

/// 判定 x/y 分辨率相等时的相对容差.
pub const MPP_RELATIVE_TOLERANCE: f64 = 1e-9;

/// 自动生成样本名时的默认前缀.
pub const DEFAULT_SAMPLE_PREFIX: &str = "SMP";

/// 样本参考方向的初始角度 (指向图像上方).
pub const DEFAULT_REFERENCE_ANGLE: f64 = -90.0;

/// 裁剪结果所在的步骤目录.
pub const DEFAULT_OUTPUT_STEP: &str = "1_regions";

/// 新提取区域的元数据.
pub const EMPTY_METADATA: &str = "{}";

/// 表格列名.
pub mod columns {
    /// 区域表必需的列, 同时也是写出时的列顺序.
    pub const REGION_REQUIRED: [&str; 16] = [
        "relpath", "project", "block", "panel", "level", "sample", "cohorts", "drug", "origin_x",
        "origin_y", "center_x", "center_y", "well_x", "well_y", "mpp", "metadata",
    ];

    /// 区域元数据中表示人工审核结论的键.
    pub const INCLUDE_KEY: &str = "include";
}
