//! 流程配置与项目配置.
//!
//! 流程配置 [`PipelineConfig`] 作为显式参数传入流程入口, 不依赖任何全局状态.
//! 项目配置 [`ProjectConfig`] 描述项目下的区块和装置孔位.

mod block;
mod device;

pub use block::{unpack_block, BlockSpec, Sample, SampleEntry, SamplesSpec};
pub use device::{DevicePayloads, DeviceTable, LevelSpec, WellSpec};

use crate::consts::{DEFAULT_OUTPUT_STEP, DEFAULT_SAMPLE_PREFIX};
use crate::error::{ConfigError, ConfigResult, TableResult};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// 提取时楔形的默认形状.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WedgeExtent {
    /// 总张角, 度.
    pub span_degrees: f64,
    /// 内半径, 微米. 缺失时为 0.
    pub radius_inner_um: Option<f64>,
    /// 外半径, 微米. 缺失时为图像对角线长度.
    pub radius_outer_um: Option<f64>,
}

impl Default for WedgeExtent {
    fn default() -> Self {
        Self {
            span_degrees: 120.0,
            radius_inner_um: Some(400.0),
            radius_outer_um: Some(1200.0),
        }
    }
}

/// 重新定位后的标注点落在新裁剪图像上界边距之内时的处理方式.
///
/// 无论哪种方式, 标注点都不会超出裁剪图像本身.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpperBoundPolicy {
    /// 记录警告, 只限制到图像边缘 `长度 - 1`.
    #[default]
    Warn,
    /// 限制到距上界至少留出边距的位置 `长度 - 1 - 边距`.
    Clamp,
}

/// 流程配置.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// 项目根目录. 源图像和输出的相对路径都基于此.
    pub base_path: PathBuf,
    /// 自动生成样本名时的前缀.
    pub sample_prefix: String,
    /// 楔形形状.
    pub wedge: WedgeExtent,
    /// 单次读取源图像的时限, 秒.
    pub read_timeout_secs: u64,
    /// 裁剪结果所在的步骤目录名.
    pub output_step: String,
    /// 合并时的上界处理方式.
    pub upper_bound: UpperBoundPolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            base_path: PathBuf::from("."),
            sample_prefix: DEFAULT_SAMPLE_PREFIX.to_owned(),
            wedge: WedgeExtent::default(),
            read_timeout_secs: 120,
            output_step: DEFAULT_OUTPUT_STEP.to_owned(),
            upper_bound: UpperBoundPolicy::default(),
        }
    }
}

impl PipelineConfig {
    /// 以 `base_path` 为根目录, 其余取默认值.
    pub fn with_base_path<P: Into<PathBuf>>(base_path: P) -> Self {
        Self {
            base_path: base_path.into(),
            ..Self::default()
        }
    }

    /// 从 JSON 字符串解析. 缺失的字段取默认值.
    pub fn from_json_str(s: &str) -> TableResult<Self> {
        Ok(serde_json::from_str(s)?)
    }

    /// 从 JSON 文件读取.
    pub fn from_path<P: AsRef<Path>>(path: P) -> TableResult<Self> {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }

    /// 单次读取源图像的时限.
    #[inline]
    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }
}

/// 项目配置.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// 项目名.
    pub name: String,
    /// 区块列表.
    #[serde(default)]
    pub blocks: Vec<BlockSpec>,
    /// 装置孔位.
    #[serde(default)]
    pub devices: DevicePayloads,
}

impl ProjectConfig {
    /// 从 JSON 字符串解析.
    pub fn from_json_str(s: &str) -> TableResult<Self> {
        Ok(serde_json::from_str(s)?)
    }

    /// 从 JSON 文件读取.
    pub fn from_path<P: AsRef<Path>>(path: P) -> TableResult<Self> {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }

    /// 按名称查找区块.
    pub fn block(&self, name: &str) -> ConfigResult<&BlockSpec> {
        self.blocks
            .iter()
            .find(|b| b.name == name)
            .ok_or_else(|| ConfigError::UnknownBlock(name.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::{PipelineConfig, ProjectConfig, UpperBoundPolicy};
    use crate::error::ConfigError;

    #[test]
    fn test_pipeline_defaults() {
        let cfg = PipelineConfig::from_json_str(r#"{"base_path": "/data"}"#).unwrap();
        assert_eq!(cfg.base_path.to_str(), Some("/data"));
        assert_eq!(cfg.sample_prefix, "SMP");
        assert_eq!(cfg.wedge.span_degrees, 120.0);
        assert_eq!(cfg.wedge.radius_outer_um, Some(1200.0));
        assert_eq!(cfg.read_timeout().as_secs(), 120);
        assert_eq!(cfg.upper_bound, UpperBoundPolicy::Warn);

        let cfg = PipelineConfig::from_json_str(
            r#"{"upper_bound": "clamp", "wedge": {"span_degrees": 90.0, "radius_inner_um": null}}"#,
        )
        .unwrap();
        assert_eq!(cfg.upper_bound, UpperBoundPolicy::Clamp);
        assert_eq!(cfg.wedge.radius_inner_um, None);
        assert_eq!(cfg.wedge.radius_outer_um, Some(1200.0));
    }

    #[test]
    fn test_project_block_lookup() {
        let project = ProjectConfig::from_json_str(
            r#"{
                "name": "P1",
                "blocks": [{"name": "B1", "samples": 2, "device": "MD8"}],
                "devices": {"MD8": [{"level": 1, "wells": []}]}
            }"#,
        )
        .unwrap();
        assert_eq!(project.block("B1").unwrap().name, "B1");
        assert_eq!(
            project.block("B2").unwrap_err(),
            ConfigError::UnknownBlock("B2".into())
        );
    }
}
