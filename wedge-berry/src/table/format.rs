//! 导出供下游分析宿主使用的输入表.

use super::SlideRegionRecord;
use crate::consts::columns::INCLUDE_KEY;
use serde::Serialize;
use std::path::Path;

/// 分析宿主输入表中的一行.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AnalysisRow {
    /// 裁剪图像的文件名 (不含目录).
    #[serde(rename = "Filename")]
    pub filename: String,
    /// 项目名.
    #[serde(rename = "Project")]
    pub project: String,
    /// 区块名.
    #[serde(rename = "Block")]
    pub block: String,
    /// 染色面板.
    #[serde(rename = "Panel")]
    pub panel: String,
    /// 切片层级.
    #[serde(rename = "Level")]
    pub level: u32,
    /// 样本名.
    #[serde(rename = "Sample")]
    pub sample: String,
    /// 分组标签, JSON 编码.
    #[serde(rename = "Cohorts")]
    pub cohorts: String,
    /// 孔位药物.
    #[serde(rename = "Drug")]
    pub drug: String,
    /// 装置中心 x, 裁剪图像坐标系.
    #[serde(rename = "Bow_Center_X")]
    pub center_x: i64,
    /// 装置中心 y, 裁剪图像坐标系.
    #[serde(rename = "Bow_Center_Y")]
    pub center_y: i64,
    /// 孔位点 x, 裁剪图像坐标系.
    #[serde(rename = "Bow_Well_X")]
    pub well_x: i64,
    /// 孔位点 y, 裁剪图像坐标系.
    #[serde(rename = "Bow_Well_Y")]
    pub well_y: i64,
    /// 每像素微米数.
    #[serde(rename = "MPP")]
    pub mpp: f64,
    /// 人工审核结论.
    #[serde(rename = "Include")]
    pub include: bool,
}

/// 读取元数据中的审核结论. 元数据缺失, 无法解析, 或没有布尔型的 `include` 键时为 `false`.
fn include_flag(metadata: Option<&str>) -> bool {
    metadata
        .and_then(|s| serde_json::from_str::<serde_json::Value>(s).ok())
        .and_then(|v| v.get(INCLUDE_KEY).and_then(serde_json::Value::as_bool))
        .unwrap_or(false)
}

/// 将区域表转换为分析宿主的输入表. 退化区域没有裁剪图像, 不会出现在结果中.
pub fn format_for_analysis(records: &[SlideRegionRecord]) -> Vec<AnalysisRow> {
    records
        .iter()
        .filter(|r| {
            if r.status.is_degenerate() {
                log::debug!("跳过退化区域 {}", r.key);
                return false;
            }
            true
        })
        .map(|r| AnalysisRow {
            filename: Path::new(&r.relpath)
                .file_name()
                .map_or_else(|| r.relpath.clone(), |s| s.to_string_lossy().into_owned()),
            project: r.key.project.clone(),
            block: r.key.block.clone(),
            panel: r.key.panel.clone(),
            level: r.key.level,
            sample: r.key.sample.clone(),
            cohorts: r.cohorts.clone(),
            drug: r.key.drug.clone(),
            center_x: r.center.x,
            center_y: r.center.y,
            well_x: r.well.x,
            well_y: r.well.y,
            mpp: r.mpp,
            include: include_flag(r.metadata.as_deref()),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{format_for_analysis, include_flag};
    use crate::geom::{Point2d, Size2d};
    use crate::table::{write_rows, IdentityKey, RegionStatus, SlideRegionRecord};

    fn record(metadata: Option<&str>, status: RegionStatus) -> SlideRegionRecord {
        SlideRegionRecord {
            key: IdentityKey {
                project: "P".into(),
                block: "B1".into(),
                panel: "HE".into(),
                level: 1,
                sample: "SMP1".into(),
                drug: "DOX".into(),
            },
            relpath: "P/B1/1_regions/P_B1_LVL1_HE_SMP1_DOX.png".into(),
            source: "P/B1/0_slides/HE_1.tif".into(),
            cohorts: "null".into(),
            origin: Point2d::new(10, 10),
            center: Point2d::new(50, 60),
            well: Point2d::new(90, 60),
            size: Size2d::new(200, 200),
            mpp: 0.5,
            metadata: metadata.map(str::to_owned),
            status,
        }
    }

    #[test]
    fn test_include_flag() {
        assert!(include_flag(Some(r#"{"include": true}"#)));
        assert!(!include_flag(Some(r#"{"include": false}"#)));
        assert!(!include_flag(Some("{}")));
        assert!(!include_flag(Some("not json")));
        assert!(!include_flag(None));
    }

    #[test]
    fn test_format_for_analysis() {
        let rows = format_for_analysis(&[
            record(Some(r#"{"include": true}"#), RegionStatus::Extracted),
            record(None, RegionStatus::Degenerate),
        ]);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].filename, "P_B1_LVL1_HE_SMP1_DOX.png");
        assert!(rows[0].include);

        let mut buf = Vec::new();
        write_rows(&mut buf, rows).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(
            text.lines().next().unwrap(),
            "Filename,Project,Block,Panel,Level,Sample,Cohorts,Drug,\
             Bow_Center_X,Bow_Center_Y,Bow_Well_X,Bow_Well_Y,MPP,Include"
        );
    }
}
