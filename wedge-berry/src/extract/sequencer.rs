use crate::config::{DevicePayloads, DeviceTable, Sample};
use crate::error::{ConfigError, ConfigResult};
use crate::geom::Point2d;
use crate::table::{IdentityKey, SampleAngle, SlideCoord};
use std::collections::{HashMap, HashSet};

/// 单个提取任务: 一张切片上一个样本的一个孔位.
#[derive(Clone, Debug, PartialEq)]
pub struct ExtractionJob {
    /// 身份键.
    pub key: IdentityKey,
    /// 分组标签, JSON 编码.
    pub cohorts: String,
    /// 源图像的相对路径.
    pub source: String,
    /// 装置中心, 源图像坐标系.
    pub center: Point2d,
    /// 楔形朝向, 度. 即样本参考角加上孔位偏转角.
    pub facing: f64,
}

/// 将区块的 `样本 x 层级 x 孔位` 展开为有序的提取任务列表.
///
/// `coords` 中每一行是一个检测区域 (某张切片上的某个样本). 对于每一行, 查找样本的装置类型,
/// 再取该装置在该层级上的孔位, 每个孔位生成一个任务. 任务顺序与 `coords` 和孔位列表一致.
///
/// # 返回值
///
/// 任何查找失败都意味着配置不一致, 直接返回错误, 不会跳过:
///
/// - 样本未在区块中声明: `ConfigError::UnknownSample`;
/// - 装置类型没有孔位配置: `ConfigError::MissingDevice`;
/// - 层级没有孔位列表: `ConfigError::MissingLevel`;
/// - 样本没有参考角度: `ConfigError::MissingAngle`;
/// - 两个任务的身份键相同 (例如同一样本, 面板和层级出现在两张切片上):
///   `ConfigError::DuplicateIdentity`.
pub fn sequence(
    samples: &[Sample],
    payloads: &DevicePayloads,
    coords: &[SlideCoord],
    angles: &[SampleAngle],
) -> ConfigResult<Vec<ExtractionJob>> {
    let devices = DeviceTable::build(payloads);
    let samples: HashMap<&str, &Sample> = samples.iter().map(|s| (s.name.as_str(), s)).collect();
    let angles: HashMap<&str, f64> = angles
        .iter()
        .map(|a| (a.sample.as_str(), a.angle))
        .collect();

    let mut jobs = Vec::new();
    let mut seen = HashSet::new();
    for coord in coords {
        let sample = samples
            .get(coord.sample.as_str())
            .ok_or_else(|| ConfigError::UnknownSample(coord.sample.clone()))?;
        let wells = devices.wells(&sample.name, &sample.device, coord.level)?;
        let reference = *angles
            .get(coord.sample.as_str())
            .ok_or_else(|| ConfigError::MissingAngle(coord.sample.clone()))?;

        for well in wells {
            let key = IdentityKey {
                project: coord.project.clone(),
                block: coord.block.clone(),
                panel: coord.panel.clone(),
                level: coord.level,
                sample: coord.sample.clone(),
                drug: well.drug.clone(),
            };
            if !seen.insert(key.clone()) {
                return Err(ConfigError::DuplicateIdentity(key));
            }
            jobs.push(ExtractionJob {
                key,
                cohorts: coord.cohorts.clone(),
                source: coord.relpath.clone(),
                center: coord.center(),
                facing: reference + well.angle,
            });
        }
    }
    log::debug!("共 {} 个检测区域, 展开为 {} 个提取任务", coords.len(), jobs.len());
    Ok(jobs)
}

#[cfg(test)]
mod tests {
    use super::sequence;
    use crate::config::{DevicePayloads, Sample};
    use crate::error::ConfigError;
    use crate::geom::Point2d;
    use crate::table::{SampleAngle, SlideCoord};

    fn samples() -> Vec<Sample> {
        vec![
            Sample {
                name: "SMP1".into(),
                device: "MD8".into(),
                cohorts: "null".into(),
            },
            Sample {
                name: "SMP2".into(),
                device: "MD4".into(),
                cohorts: "null".into(),
            },
        ]
    }

    fn payloads() -> DevicePayloads {
        serde_json::from_str(
            r#"{
                "MD8": [{"level": 1, "wells": [{"drug": "DOX", "angle": 0.0}, {"drug": "CIS", "angle": 270.0}]}],
                "MD4": [{"level": 1, "wells": [{"drug": "PAC", "angle": 45.0}]}]
            }"#,
        )
        .unwrap()
    }

    fn coord(sample: &str, level: u32) -> SlideCoord {
        SlideCoord {
            relpath: "P/B1/0_slides/HE_1.tif".into(),
            project: "P".into(),
            block: "B1".into(),
            level,
            sample: sample.into(),
            cohorts: "null".into(),
            panel: "HE".into(),
            center_x: 100,
            center_y: 200,
        }
    }

    fn angles() -> Vec<SampleAngle> {
        vec![
            SampleAngle {
                sample: "SMP1".into(),
                angle: -90.0,
            },
            SampleAngle {
                sample: "SMP2".into(),
                angle: 10.0,
            },
        ]
    }

    #[test]
    fn test_sequence_expands_wells() {
        let jobs = sequence(
            &samples(),
            &payloads(),
            &[coord("SMP1", 1), coord("SMP2", 1)],
            &angles(),
        )
        .unwrap();
        let summary: Vec<_> = jobs
            .iter()
            .map(|j| (j.key.sample.as_str(), j.key.drug.as_str(), j.facing))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("SMP1", "DOX", -90.0),
                ("SMP1", "CIS", 180.0),
                ("SMP2", "PAC", 55.0)
            ]
        );
        assert_eq!(jobs[0].center, Point2d::new(100, 200));
        assert_eq!(jobs[0].source, "P/B1/0_slides/HE_1.tif");
    }

    #[test]
    fn test_sequence_configuration_errors() {
        let err = |coords: &[SlideCoord], angles: &[SampleAngle]| {
            sequence(&samples(), &payloads(), coords, angles).unwrap_err()
        };
        assert_eq!(
            err(&[coord("SMP1", 2)], &angles()),
            ConfigError::MissingLevel {
                device: "MD8".into(),
                level: 2
            }
        );
        assert_eq!(
            err(&[coord("SMP9", 1)], &angles()),
            ConfigError::UnknownSample("SMP9".into())
        );
        assert_eq!(
            err(&[coord("SMP2", 1)], &angles()[..1]),
            ConfigError::MissingAngle("SMP2".into())
        );

        // 同一样本, 面板, 层级出现在两张切片上.
        let mut other = coord("SMP1", 1);
        other.relpath = "P/B1/0_slides/HE_1_rescan.tif".into();
        match err(&[coord("SMP1", 1), other], &angles()) {
            ConfigError::DuplicateIdentity(key) => {
                assert_eq!(key.to_string(), "P/B1/HE/LVL1/SMP1/DOX")
            }
            e => panic!("unexpected: {e:?}"),
        }

        let mut payloads = payloads();
        payloads.remove("MD4");
        assert_eq!(
            sequence(&samples(), &payloads, &[coord("SMP2", 1)], &angles()).unwrap_err(),
            ConfigError::MissingDevice {
                sample: "SMP2".into(),
                device: "MD4".into()
            }
        );
    }
}
