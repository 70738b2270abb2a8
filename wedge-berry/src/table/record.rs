use crate::geom::{Point2d, Size2d};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// 区域的身份键 `(项目, 区块, 切片组, 层级, 样本, 药物)`.
///
/// 在一个区块的区域表中唯一. 排序按字段声明顺序进行.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IdentityKey {
    /// 项目名.
    pub project: String,
    /// 区块名.
    pub block: String,
    /// 切片组 (染色).
    pub panel: String,
    /// 层级.
    pub level: u32,
    /// 样本名.
    pub sample: String,
    /// 药物标识.
    pub drug: String,
}

impl Display for IdentityKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{}/{}/LVL{}/{}/{}",
            self.project, self.block, self.panel, self.level, self.sample, self.drug
        )
    }
}

impl IdentityKey {
    /// 输出文件的主干名. 参数不变时重复提取得到相同的文件名.
    pub fn file_stem(&self) -> String {
        format!(
            "{}_{}_LVL{}_{}_{}_{}",
            self.project, self.block, self.level, self.panel, self.sample, self.drug
        )
    }
}

/// 区域记录的状态.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RegionStatus {
    /// 裁剪图像已写出.
    #[default]
    #[serde(rename = "ok")]
    Extracted,
    /// 外接矩形面积为 0, 没有写出裁剪图像. 需要人工复查.
    #[serde(rename = "degenerate")]
    Degenerate,
}

impl RegionStatus {
    /// 是否为退化区域?
    #[inline]
    pub fn is_degenerate(&self) -> bool {
        matches!(self, Self::Degenerate)
    }
}

/// 区域表中的一行.
///
/// `origin` 位于源图像坐标系, `center` 和 `well` 位于裁剪图像坐标系.
#[derive(Clone, Debug, PartialEq)]
pub struct SlideRegionRecord {
    /// 身份键.
    pub key: IdentityKey,
    /// 裁剪图像的相对路径.
    pub relpath: String,
    /// 源图像的相对路径.
    pub source: String,
    /// 分组标签, JSON 编码.
    pub cohorts: String,
    /// 裁剪原点.
    pub origin: Point2d,
    /// 装置中心.
    pub center: Point2d,
    /// 孔位点.
    pub well: Point2d,
    /// 裁剪尺寸.
    pub size: Size2d,
    /// 每像素微米数.
    pub mpp: f64,
    /// 不透明的元数据, 一般是 JSON 编码的键值表. 合并时逐字节保留.
    pub metadata: Option<String>,
    /// 状态.
    pub status: RegionStatus,
}

impl SlideRegionRecord {
    /// 标注点是否都落在裁剪图像之内?
    #[inline]
    pub fn points_within(&self) -> bool {
        self.center.is_within(self.size) && self.well.is_within(self.size)
    }
}

#[cfg(test)]
mod tests {
    use super::IdentityKey;

    #[test]
    fn test_identity_key_order_and_names() {
        let a = IdentityKey {
            project: "P".into(),
            block: "B1".into(),
            panel: "HE".into(),
            level: 2,
            sample: "SMP1".into(),
            drug: "DOX".into(),
        };
        let mut b = a.clone();
        b.level = 10;
        assert!(a < b);

        let mut c = a.clone();
        c.panel = "Ki67".into();
        c.level = 1;
        // 切片组先于层级比较.
        assert!(a < c);

        assert_eq!(a.file_stem(), "P_B1_LVL2_HE_SMP1_DOX");
        assert_eq!(a.to_string(), "P/B1/HE/LVL2/SMP1/DOX");
    }
}
