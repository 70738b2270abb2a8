//! 装置孔位配置.
//!
//! 每种装置类型有若干层级, 每个层级对应一组孔位. 每个孔位释放一种药物,
//! 其朝向由相对于样本参考角的偏转角 (度, 顺时针) 给出.

use crate::error::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

/// 单个孔位.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WellSpec {
    /// 药物标识.
    pub drug: String,
    /// 相对于样本参考角的偏转角, 度.
    pub angle: f64,
}

/// 一个层级及其孔位列表.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LevelSpec {
    /// 层级编号.
    pub level: u32,
    /// 该层级上的孔位.
    pub wells: Vec<WellSpec>,
}

/// 装置类型名到层级列表的映射. 即项目配置中的 `devices` 部分.
pub type DevicePayloads = BTreeMap<String, Vec<LevelSpec>>;

/// 按 `(装置类型, 层级)` 预先建立的孔位索引. 每次流程运行只构建一次.
#[derive(Clone, Debug, Default)]
pub struct DeviceTable {
    devices: HashSet<String>,
    wells: HashMap<(String, u32), Vec<WellSpec>>,
}

impl DeviceTable {
    /// 从 `payloads` 构建索引. 同一装置的同一层级出现多次时, 孔位列表按出现顺序拼接.
    pub fn build(payloads: &DevicePayloads) -> Self {
        let mut table = Self::default();
        for (device, levels) in payloads {
            table.devices.insert(device.clone());
            for level in levels {
                table
                    .wells
                    .entry((device.clone(), level.level))
                    .or_default()
                    .extend(level.wells.iter().cloned());
            }
        }
        table
    }

    /// 是否存在该装置类型?
    #[inline]
    pub fn has_device(&self, device: &str) -> bool {
        self.devices.contains(device)
    }

    /// 获取 `device` 在 `level` 层级上的孔位.
    ///
    /// # 返回值
    ///
    /// - 装置类型不存在时返回 `Err(ConfigError::MissingDevice)`, 其中 `sample` 由调用方指定;
    /// - 层级不存在时返回 `Err(ConfigError::MissingLevel)`.
    pub fn wells(&self, sample: &str, device: &str, level: u32) -> ConfigResult<&[WellSpec]> {
        if !self.has_device(device) {
            return Err(ConfigError::MissingDevice {
                sample: sample.to_owned(),
                device: device.to_owned(),
            });
        }
        self.wells
            .get(&(device.to_owned(), level))
            .map(Vec::as_slice)
            .ok_or_else(|| ConfigError::MissingLevel {
                device: device.to_owned(),
                level,
            })
    }
}
