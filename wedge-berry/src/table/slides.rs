//! 整张切片上的粗略标注: 每个样本的装置中心, 以及每个样本的参考角度.
//!
//! 这两张表先由 [`init_slide_coords`] 和 [`init_coarse_angles`] 生成初始值,
//! 再用 [`upsert`] 覆盖上已保存的人工标注.

use crate::config::Sample;
use crate::consts::DEFAULT_REFERENCE_ANGLE;
use crate::geom::{Point2d, Size2d};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// 区块中的一张整切片图像.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlideEntry {
    /// 源图像的相对路径.
    pub relpath: String,
    /// 项目名.
    pub project: String,
    /// 区块名.
    pub block: String,
    /// 切片组.
    pub panel: String,
    /// 层级.
    pub level: u32,
}

/// 一张切片上一个样本的装置中心. 即提取前的 "检测区域" 表中的一行.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SlideCoord {
    /// 源图像的相对路径.
    pub relpath: String,
    /// 项目名.
    pub project: String,
    /// 区块名.
    pub block: String,
    /// 层级.
    pub level: u32,
    /// 样本名.
    pub sample: String,
    /// 分组标签, JSON 编码.
    pub cohorts: String,
    /// 切片组.
    pub panel: String,
    /// 装置中心.
    pub center_x: i64,
    /// 装置中心.
    pub center_y: i64,
}

impl SlideCoord {
    /// 装置中心, 源图像坐标系.
    #[inline]
    pub fn center(&self) -> Point2d {
        Point2d::new(self.center_x, self.center_y)
    }

    /// 表格排序键 `(区块, 层级, 样本, 切片组)`.
    #[inline]
    pub fn sort_key(&self) -> (&str, u32, &str, &str) {
        (&self.block, self.level, &self.sample, &self.panel)
    }

    /// 覆盖已保存标注时使用的键.
    #[inline]
    pub fn upsert_key(&self) -> (&str, &str, &str, u32, &str, &str) {
        (
            &self.project,
            &self.block,
            &self.panel,
            self.level,
            &self.sample,
            &self.cohorts,
        )
    }
}

/// 样本的参考角度, 度. 同一区块内所有切片共享.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SampleAngle {
    /// 样本名.
    pub sample: String,
    /// 参考角度.
    pub angle: f64,
}

fn make_even_grid(n: usize) -> (usize, usize) {
    let nx = (n as f64).sqrt().ceil() as usize;
    let ny = n.div_ceil(nx);
    (nx, ny)
}

/// `(0, len)` 内部等间距的 `num` 个点 (不含两端).
fn interior_points(len: u32, num: usize) -> impl Iterator<Item = f64> {
    let step = len as f64 / (num + 1) as f64;
    (1..=num).map(move |i| i as f64 * step)
}

/// 将 `n` 个样本箭头均匀地铺在尺寸为 `dims` 的图像上.
///
/// 网格为 `nx = ceil(sqrt(n))` 列, `ny = ceil(n / nx)` 行, 逐列填充, 取前 `n` 个点.
pub fn init_arrow_coords(dims: Size2d, n: usize) -> Vec<Point2d> {
    if n == 0 {
        return vec![];
    }
    let (nx, ny) = make_even_grid(n);
    let ys: Vec<f64> = interior_points(dims.height, ny).collect();
    interior_points(dims.width, nx)
        .flat_map(|x| ys.iter().map(move |&y| (x, y)))
        .take(n)
        .map(|(x, y)| Point2d::new(x.round() as i64, y.round() as i64))
        .collect()
}

/// 为每张切片上的每个样本生成初始装置中心, 按 `(区块, 层级, 样本, 切片组)` 排序.
///
/// `slides` 中每一项附带该切片的图像尺寸.
pub fn init_slide_coords(slides: &[(SlideEntry, Size2d)], samples: &[Sample]) -> Vec<SlideCoord> {
    let mut coords: Vec<SlideCoord> = slides
        .iter()
        .flat_map(|(slide, dims)| {
            init_arrow_coords(*dims, samples.len())
                .into_iter()
                .zip(samples)
                .map(move |(p, sample)| SlideCoord {
                    relpath: slide.relpath.clone(),
                    project: slide.project.clone(),
                    block: slide.block.clone(),
                    level: slide.level,
                    sample: sample.name.clone(),
                    cohorts: sample.cohorts.clone(),
                    panel: slide.panel.clone(),
                    center_x: p.x,
                    center_y: p.y,
                })
        })
        .collect();
    coords.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
    coords
}

/// 每个样本的初始参考角度 (指向图像上方).
pub fn init_coarse_angles(samples: &[Sample]) -> Vec<SampleAngle> {
    samples
        .iter()
        .map(|s| SampleAngle {
            sample: s.name.clone(),
            angle: DEFAULT_REFERENCE_ANGLE,
        })
        .collect()
}

/// 用 `using` 覆盖 `update`: 保留 `update` 中键不在 `using` 里的行, 追加 `using` 的全部行,
/// 再按键稳定排序.
pub fn upsert<T, K, F>(update: Vec<T>, using: Vec<T>, key: F) -> Vec<T>
where
    K: Ord,
    F: Fn(&T) -> K,
{
    let mut merged = {
        let taken: BTreeSet<K> = using.iter().map(&key).collect();
        update
            .into_iter()
            .filter(|row| !taken.contains(&key(row)))
            .collect::<Vec<_>>()
    };
    merged.extend(using);
    merged.sort_by(|a, b| key(a).cmp(&key(b)));
    merged
}
