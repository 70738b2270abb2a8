//! 重新提取后, 将历史区域表中的人工标注迁移到新的裁剪坐标系.

use crate::config::UpperBoundPolicy;
use crate::consts::MERGE_MARGIN_PX;
use crate::error::{ConfigError, ConfigResult};
use crate::geom::{Point2d, Size2d};
use crate::table::{IdentityKey, SlideRegionRecord};
use std::collections::HashMap;

/// 按身份键建立索引. 出现重复键时返回 `ConfigError::DuplicateIdentity`.
fn index_unique(records: &[SlideRegionRecord]) -> ConfigResult<HashMap<&IdentityKey, &SlideRegionRecord>> {
    let mut index = HashMap::with_capacity(records.len());
    for r in records {
        if index.insert(&r.key, r).is_some() {
            return Err(ConfigError::DuplicateIdentity(r.key.clone()));
        }
    }
    Ok(index)
}

/// 在一个坐标轴上移动 `delta` 的反方向. 结果总是位于 `[0, len - 1]` 之内.
///
/// `delta` 为 0 时只做上述限制. 否则移动后的值不小于边距; 落入上界边距之内时按 `policy`
/// 处理.
fn shift_axis(
    value: i64,
    delta: i64,
    len: u32,
    policy: UpperBoundPolicy,
    key: &IdentityKey,
) -> i64 {
    let last = (len as i64 - 1).max(0);
    if delta == 0 {
        return value.clamp(0, last);
    }
    let shifted = (value - delta).max(MERGE_MARGIN_PX);
    let upper = (last - MERGE_MARGIN_PX).max(MERGE_MARGIN_PX);
    if shifted <= upper {
        return shifted.min(last);
    }
    match policy {
        UpperBoundPolicy::Warn => {
            log::warn!("{key}: 重新定位后的坐标 {shifted} 距裁剪边缘不足 {MERGE_MARGIN_PX} 像素 (长度 {len})");
            shifted.min(last)
        }
        UpperBoundPolicy::Clamp => upper.min(last),
    }
}

fn shift_point(
    p: Point2d,
    delta: Point2d,
    size: Size2d,
    policy: UpperBoundPolicy,
    key: &IdentityKey,
) -> Point2d {
    Point2d::new(
        shift_axis(p.x, delta.x, size.width, policy, key),
        shift_axis(p.y, delta.y, size.height, policy, key),
    )
}

/// 以默认的上界处理方式 ([`UpperBoundPolicy::Warn`]) 合并. 见 [`merge_with`].
pub fn merge(
    new: Vec<SlideRegionRecord>,
    previous: &[SlideRegionRecord],
) -> ConfigResult<Vec<SlideRegionRecord>> {
    merge_with(new, previous, UpperBoundPolicy::default())
}

/// 用历史区域表 `previous` 修正新提取的区域表 `new`. 两表按身份键匹配.
///
/// - 没有匹配: 新行保持不变;
/// - 恰好一个匹配: 计算裁剪原点的偏移 `delta = new.origin - previous.origin`,
///   将历史行中 (可能经过人工调整的) 装置中心与孔位点减去 `delta`,
///   发生偏移的坐标轴上不小于边距 [`MERGE_MARGIN_PX`], 所有坐标都限制在新裁剪图像之内.
///   历史行的元数据原样保留.
///   新行为退化区域时只保留元数据;
/// - 任一表中有重复的身份键: 返回 `ConfigError::DuplicateIdentity`.
///
/// 结果只取决于 `new` 的原点与尺寸和 `previous` 的标注, 因此重复合并结果不变,
/// 与自身合并也不改变任何行.
pub fn merge_with(
    new: Vec<SlideRegionRecord>,
    previous: &[SlideRegionRecord],
    policy: UpperBoundPolicy,
) -> ConfigResult<Vec<SlideRegionRecord>> {
    index_unique(&new)?;
    let index = index_unique(previous)?;

    let mut carried = 0usize;
    let merged = new
        .into_iter()
        .map(|mut row| {
            let Some(prev) = index.get(&row.key) else {
                return row;
            };
            carried += 1;
            if !row.status.is_degenerate() {
                let delta = row.origin - prev.origin;
                row.center = shift_point(prev.center, delta, row.size, policy, &row.key);
                row.well = shift_point(prev.well, delta, row.size, policy, &row.key);
            }
            if prev.metadata.is_some() {
                row.metadata = prev.metadata.clone();
            }
            row
        })
        .collect();
    log::info!("合并区域表: {carried} 行沿用历史标注");
    Ok(merged)
}
