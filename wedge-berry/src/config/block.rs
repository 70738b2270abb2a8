//! 区块的样本声明.
//!
//! 区块配置可以用两种方式声明样本:
//!
//! 1. 一个整数 `n`: 自动生成 `{前缀}1` 到 `{前缀}n` 共 `n` 个样本, 装置类型必须在区块级别给出;
//! 2. 一个列表: 每项是样本名字符串, 或 `{name, device?, cohorts?}` 对象.
//!
//! 区块级别的 `device` 优先于样本级别的 `device`; 样本级别的 `cohorts` 优先于区块级别的,
//! 但样本级别的值为空 (`null`, `[]`, `""`, `{}`, `0`, `false`) 时仍回落到区块级别.

use crate::error::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 样本. 在区块配置时创建一次, 之后不再修改.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sample {
    /// 样本名.
    pub name: String,
    /// 装置类型.
    pub device: String,
    /// 分组标签, JSON 编码.
    pub cohorts: String,
}

/// 区块配置.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BlockSpec {
    /// 区块名.
    pub name: String,
    /// 样本声明.
    pub samples: SamplesSpec,
    /// 区块级别的装置类型.
    #[serde(default)]
    pub device: Option<String>,
    /// 区块级别的分组标签.
    #[serde(default)]
    pub cohorts: Option<Value>,
}

/// 样本声明的两种方式.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SamplesSpec {
    /// 样本个数.
    Count(u32),
    /// 样本列表.
    List(Vec<SampleEntry>),
}

/// 样本列表中的一项.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SampleEntry {
    /// 仅样本名.
    Name(String),
    /// 详细声明.
    Detailed {
        /// 样本名. 必须给出.
        #[serde(default)]
        name: Option<String>,
        /// 装置类型.
        #[serde(default)]
        device: Option<String>,
        /// 分组标签.
        #[serde(default)]
        cohorts: Option<Value>,
    },
}

/// 将分组标签编码为 JSON 字符串. 缺失时为 `null`.
#[inline]
fn encode_cohorts(cohorts: Option<&Value>) -> String {
    cohorts.map_or_else(|| Value::Null.to_string(), Value::to_string)
}

/// 分组标签是否非空. 空列表, 空字符串, 空对象, `0` 与 `false` 都视为未给出.
fn is_given(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |v| v != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// 展开区块 `block` 的样本声明. 自动生成的样本名使用 `prefix` 作为前缀.
///
/// # 返回值
///
/// 以下情况返回 `Err(ConfigError::InvalidBlock)`:
///
/// - 以整数声明样本, 但区块没有给出装置类型;
/// - 列表项没有样本名;
/// - 列表项在区块和样本级别都没有装置类型;
/// - 对象形式的列表项在区块和样本级别都没有分组标签.
pub fn unpack_block(block: &BlockSpec, prefix: &str) -> ConfigResult<Vec<Sample>> {
    let invalid = |reason: String| ConfigError::InvalidBlock {
        block: block.name.clone(),
        reason,
    };

    match &block.samples {
        SamplesSpec::Count(n) => {
            let device = block
                .device
                .as_ref()
                .ok_or_else(|| invalid("区块未指定装置类型".into()))?;
            let cohorts = encode_cohorts(block.cohorts.as_ref());
            Ok((1..=*n)
                .map(|i| Sample {
                    name: format!("{prefix}{i}"),
                    device: device.clone(),
                    cohorts: cohorts.clone(),
                })
                .collect())
        }
        SamplesSpec::List(entries) => entries
            .iter()
            .map(|entry| match entry {
                SampleEntry::Name(name) => {
                    let device = block
                        .device
                        .as_ref()
                        .ok_or_else(|| invalid(format!("样本 `{name}` 未指定装置类型")))?;
                    Ok(Sample {
                        name: name.clone(),
                        device: device.clone(),
                        cohorts: encode_cohorts(block.cohorts.as_ref()),
                    })
                }
                SampleEntry::Detailed {
                    name,
                    device,
                    cohorts,
                } => {
                    let name = name
                        .as_ref()
                        .ok_or_else(|| invalid("样本未指定名称".into()))?;
                    let device = block
                        .device
                        .as_ref()
                        .or(device.as_ref())
                        .ok_or_else(|| invalid(format!("样本 `{name}` 未指定装置类型")))?;
                    let cohorts = cohorts
                        .as_ref()
                        .filter(|v| is_given(v))
                        .or(block.cohorts.as_ref())
                        .ok_or_else(|| invalid(format!("样本 `{name}` 未指定分组")))?;
                    Ok(Sample {
                        name: name.clone(),
                        device: device.clone(),
                        cohorts: encode_cohorts(Some(cohorts)),
                    })
                }
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::{unpack_block, BlockSpec, Sample};
    use crate::error::ConfigError;

    fn block(json: &str) -> BlockSpec {
        serde_json::from_str(json).unwrap()
    }

    fn sample(name: &str, device: &str, cohorts: &str) -> Sample {
        Sample {
            name: name.into(),
            device: device.into(),
            cohorts: cohorts.into(),
        }
    }

    #[test]
    fn test_unpack_count() {
        let b = block(r#"{"name": "BLK1", "samples": 3, "device": "MD8", "cohorts": ["A"]}"#);
        assert_eq!(
            unpack_block(&b, "SMP").unwrap(),
            vec![
                sample("SMP1", "MD8", r#"["A"]"#),
                sample("SMP2", "MD8", r#"["A"]"#),
                sample("SMP3", "MD8", r#"["A"]"#),
            ]
        );

        let b = block(r#"{"name": "BLK1", "samples": 2}"#);
        assert!(matches!(
            unpack_block(&b, "SMP"),
            Err(ConfigError::InvalidBlock { .. })
        ));
    }

    #[test]
    fn test_unpack_names() {
        let b = block(r#"{"name": "BLK2", "samples": ["M1", "M2"], "device": "MD4"}"#);
        assert_eq!(
            unpack_block(&b, "SMP").unwrap(),
            vec![sample("M1", "MD4", "null"), sample("M2", "MD4", "null")]
        );
    }

    #[test]
    fn test_unpack_detailed() {
        let b = block(
            r#"{
                "name": "BLK3",
                "cohorts": "ctrl",
                "samples": [
                    {"name": "M1", "device": "MD8"},
                    {"name": "M2", "device": "MD4", "cohorts": "treated"}
                ]
            }"#,
        );
        assert_eq!(
            unpack_block(&b, "SMP").unwrap(),
            vec![
                sample("M1", "MD8", r#""ctrl""#),
                sample("M2", "MD4", r#""treated""#)
            ]
        );

        // 区块级别装置优先.
        let b = block(
            r#"{"name": "BLK4", "device": "MD8", "samples": [{"name": "M1", "device": "MD4", "cohorts": 1}]}"#,
        );
        assert_eq!(unpack_block(&b, "SMP").unwrap()[0].device, "MD8");
    }

    #[test]
    fn test_unpack_empty_cohorts_fall_back() {
        let b = block(
            r#"{
                "name": "BLK5",
                "device": "MD8",
                "cohorts": ["ctrl"],
                "samples": [
                    {"name": "M1", "cohorts": []},
                    {"name": "M2", "cohorts": ""},
                    {"name": "M3", "cohorts": ["dosed"]}
                ]
            }"#,
        );
        let samples = unpack_block(&b, "SMP").unwrap();
        assert_eq!(samples[0].cohorts, r#"["ctrl"]"#);
        assert_eq!(samples[1].cohorts, r#"["ctrl"]"#);
        assert_eq!(samples[2].cohorts, r#"["dosed"]"#);

        // 区块级别没有分组时, 空值等同于缺失.
        let b = block(r#"{"name": "B", "device": "MD8", "samples": [{"name": "M1", "cohorts": []}]}"#);
        assert!(matches!(
            unpack_block(&b, "SMP"),
            Err(ConfigError::InvalidBlock { .. })
        ));
    }

    #[test]
    fn test_unpack_detailed_errors() {
        for json in [
            r#"{"name": "B", "samples": [{"device": "MD8", "cohorts": 1}]}"#,
            r#"{"name": "B", "samples": [{"name": "M1", "cohorts": 1}]}"#,
            r#"{"name": "B", "samples": [{"name": "M1", "device": "MD8"}]}"#,
            r#"{"name": "B", "samples": ["M1"]}"#,
        ] {
            assert!(
                matches!(
                    unpack_block(&block(json), "SMP"),
                    Err(ConfigError::InvalidBlock { .. })
                ),
                "{json}"
            );
        }
    }
}
