//! 运行时错误.
//!
//! - [`ConfigError`] 代表配置不一致, 会终止整个流程;
//! - [`ExtractError`] 只影响单个提取任务, 兄弟任务继续执行;
//! - [`TableError`] 出现在表格边界 (CSV/JSON) 的解析与写出阶段.
//!
//! 分辨率各向异性不是错误, 只会记录一条警告; 外接矩形面积为 0 也不是错误,
//! 而是在输出记录中标记为 [`crate::table::RegionStatus::Degenerate`].

use crate::geom::{Point2d, Size2d};
use crate::table::IdentityKey;
use std::path::PathBuf;
use std::time::Duration;

/// 配置不一致. 任何一种都应该终止整个流程, 而不是悄悄跳过.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// 坐标表中出现了区块配置中没有声明的样本.
    #[error("样本 `{0}` 未在区块配置中声明")]
    UnknownSample(String),

    /// 样本的装置类型没有对应的孔位配置.
    #[error("样本 `{sample}` 的装置 `{device}` 没有孔位配置")]
    MissingDevice {
        /// 样本名.
        sample: String,
        /// 装置类型.
        device: String,
    },

    /// 装置在某一层级没有孔位列表.
    #[error("装置 `{device}` 在层级 {level} 没有孔位列表")]
    MissingLevel {
        /// 装置类型.
        device: String,
        /// 层级.
        level: u32,
    },

    /// 样本缺少参考角度.
    #[error("样本 `{0}` 缺少参考角度")]
    MissingAngle(String),

    /// 同一张表中出现了重复的身份键.
    #[error("身份键 `{0}` 重复")]
    DuplicateIdentity(IdentityKey),

    /// 输入表格缺少必需的列.
    #[error("表格缺少必需的列 `{0}`")]
    MissingColumn(String),

    /// 区块的样本声明不合法.
    #[error("区块 `{block}` 配置错误: {reason}")]
    InvalidBlock {
        /// 区块名.
        block: String,
        /// 原因.
        reason: String,
    },

    /// 项目中没有该区块.
    #[error("项目中没有区块 `{0}`")]
    UnknownBlock(String),
}

/// 配置相关的结果类型.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// 单个提取任务的失败原因.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    /// 文件读写错误.
    #[error("I/O 错误: {0}")]
    Io(#[from] std::io::Error),

    /// 图像解码或编码错误.
    #[error("图像错误: {0}")]
    Image(#[from] image::ImageError),

    /// TIFF 标签读取错误.
    #[error("TIFF 错误: {0}")]
    Tiff(#[from] tiff::TiffError),

    /// 源图像不是受支持的格式 (仅支持 TIFF).
    #[error("不支持的源图像格式: {0}")]
    UnsupportedFormat(PathBuf),

    /// 源图像的像素格式不受支持.
    #[error("源图像 {path:?} 的像素格式 {color} 不受支持")]
    UnsupportedColor {
        /// 源图像路径.
        path: PathBuf,
        /// 像素格式.
        color: String,
    },

    /// 源图像没有可用的分辨率元数据.
    #[error("源图像缺少分辨率信息: {0}")]
    MissingResolution(PathBuf),

    /// 分辨率不是有限正数.
    #[error("源图像 `{source_name}` 的分辨率无效: x = {mpp_x}, y = {mpp_y}")]
    InvalidResolution {
        /// 源图像.
        source_name: String,
        /// x 方向每像素微米数.
        mpp_x: f64,
        /// y 方向每像素微米数.
        mpp_y: f64,
    },

    /// 读取源图像超时.
    #[error("读取 {path:?} 超过 {timeout:?}")]
    Timeout {
        /// 源图像路径.
        path: PathBuf,
        /// 时限.
        timeout: Duration,
    },

    /// 解码线程异常退出.
    #[error("解码线程异常退出: {0}")]
    DecoderLost(PathBuf),

    /// 请求的区域超出源图像范围.
    #[error("区域 {origin:?} + {size:?} 超出源图像范围 {dims:?}")]
    RegionOutOfBounds {
        /// 区域原点.
        origin: Point2d,
        /// 区域尺寸.
        size: Size2d,
        /// 源图像尺寸.
        dims: Size2d,
    },
}

/// 提取相关的结果类型.
pub type ExtractResult<T> = Result<T, ExtractError>;

/// 表格读写错误.
#[derive(Debug, thiserror::Error)]
pub enum TableError {
    /// CSV 解析或写出错误.
    #[error("CSV 错误: {0}")]
    Csv(#[from] csv::Error),

    /// JSON 解析错误.
    #[error("JSON 错误: {0}")]
    Json(#[from] serde_json::Error),

    /// 文件读写错误.
    #[error("I/O 错误: {0}")]
    Io(#[from] std::io::Error),

    /// 表格内容与配置不一致.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// 表格相关的结果类型.
pub type TableResult<T> = Result<T, TableError>;
