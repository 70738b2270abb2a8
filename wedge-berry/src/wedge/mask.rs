//! 楔形掩膜的栅格化.

use super::Wedge;
use crate::geom::{Point2d, Size2d};
use crate::table::SlideRegionRecord;
use ndarray::{Array2, ArrayView2, Zip};
use serde::{Deserialize, Serialize};

/// 下游分析宿主提供给栅格化的楔形参数.
///
/// 点坐标为裁剪图像内的像素坐标, `offset_um` 和 `thickness_um` 以微米为单位,
/// 会通过 `mpp` 转换为像素.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WedgeParameters {
    /// 每像素微米数.
    pub mpp: f64,
    /// 装置中心.
    pub center_x: i64,
    /// 装置中心.
    pub center_y: i64,
    /// 孔位点.
    pub well_x: i64,
    /// 孔位点.
    pub well_y: i64,
    /// 楔形起始处到孔位表面的距离.
    pub offset_um: f64,
    /// 楔形的径向厚度.
    pub thickness_um: f64,
    /// 总张角, 度.
    pub span_degrees: f64,
}

impl WedgeParameters {
    /// 用区域记录中的标注点和分辨率, 加上分析时给定的形状参数, 组装楔形参数.
    pub fn from_record(
        record: &SlideRegionRecord,
        offset_um: f64,
        thickness_um: f64,
        span_degrees: f64,
    ) -> Self {
        Self {
            mpp: record.mpp,
            center_x: record.center.x,
            center_y: record.center.y,
            well_x: record.well.x,
            well_y: record.well.y,
            offset_um,
            thickness_um,
            span_degrees,
        }
    }

    /// 装置中心.
    #[inline]
    pub fn center(&self) -> Point2d {
        Point2d::new(self.center_x, self.center_y)
    }

    /// 孔位点.
    #[inline]
    pub fn well(&self) -> Point2d {
        Point2d::new(self.well_x, self.well_y)
    }

    /// 转换为像素单位的楔形.
    ///
    /// `mpp` 非正或非有限时, 半径退化为 inf/NaN, 对应的掩膜为空.
    pub fn to_wedge(&self) -> Wedge {
        Wedge::from_well(
            self.center(),
            self.well(),
            self.offset_um / self.mpp,
            self.thickness_um / self.mpp,
            self.span_degrees,
        )
    }

    /// 在尺寸为 `dims` 的图像上栅格化.
    #[inline]
    pub fn rasterize(&self, dims: Size2d) -> WedgeMask {
        self.to_wedge().rasterize(dims)
    }
}

/// 楔形的布尔掩膜, 与其来源裁剪图像等大. `true` 代表像素落在楔形内.
///
/// 掩膜不做持久化, 每次分析时按需重新计算.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WedgeMask {
    /// `(高, 宽)`, 行优先.
    data: Array2<bool>,
}

impl WedgeMask {
    /// 掩膜尺寸.
    #[inline]
    pub fn size(&self) -> Size2d {
        let &[h, w] = self.data.shape() else {
            unreachable!()
        };
        Size2d::new(w as u32, h as u32)
    }

    /// 掩膜内像素个数.
    #[inline]
    pub fn count(&self) -> usize {
        self.data.iter().filter(|&&m| m).count()
    }

    /// 是否没有任何像素落在楔形内?
    #[inline]
    pub fn is_empty(&self) -> bool {
        !self.data.iter().any(|&m| m)
    }

    /// 像素 `p` 是否在掩膜内. 越界时返回 `false`.
    #[inline]
    pub fn get(&self, p: Point2d) -> bool {
        if p.x < 0 || p.y < 0 {
            return false;
        }
        self.data
            .get((p.y as usize, p.x as usize))
            .copied()
            .unwrap_or(false)
    }

    /// 获得数据的一份不可变 shallow copy. 形状为 `(高, 宽)`.
    #[inline]
    pub fn view(&self) -> ArrayView2<bool> {
        self.data.view()
    }

    /// 直接获得底层数据.
    #[inline]
    pub fn into_raw(self) -> Array2<bool> {
        self.data
    }
}

cfg_if::cfg_if! {
    if #[cfg(feature = "rayon")] {
        impl Wedge {
            /// 在尺寸为 `dims` 的图像上栅格化. 借助 `rayon` 并行地按块求值.
            pub fn rasterize(&self, dims: Size2d) -> WedgeMask {
                let (cx, cy) = (self.center().x as f64, self.center().y as f64);
                let mut data = Array2::from_elem(dims.shape(), false);
                Zip::indexed(&mut data).par_for_each(|(y, x), m| {
                    *m = self.test(x as f64 - cx, y as f64 - cy);
                });
                WedgeMask { data }
            }
        }
    } else {
        impl Wedge {
            /// 在尺寸为 `dims` 的图像上栅格化.
            pub fn rasterize(&self, dims: Size2d) -> WedgeMask {
                let (cx, cy) = (self.center().x as f64, self.center().y as f64);
                let mut data = Array2::from_elem(dims.shape(), false);
                Zip::indexed(&mut data).for_each(|(y, x), m| {
                    *m = self.test(x as f64 - cx, y as f64 - cy);
                });
                WedgeMask { data }
            }
        }
    }
}

/// 在 `dims` 尺寸的图像上栅格化一个楔形掩膜.
///
/// 像素 `(x, y)` 在掩膜内当且仅当它到 `center` 的距离位于 `[inner, outer]`,
/// 且它相对于 `facing` 的夹角 (规范化到 `(-180, 180]`) 不超过 `span / 2`.
/// 该函数没有失败情形: 圆心或半径越界只会得到全空或几乎全空的掩膜.
#[inline]
pub fn rasterize(
    dims: Size2d,
    center: Point2d,
    facing: f64,
    span: f64,
    inner: f64,
    outer: f64,
) -> WedgeMask {
    Wedge::new(center, facing, span, inner, outer).rasterize(dims)
}

#[cfg(test)]
mod tests {
    use super::{rasterize, WedgeParameters};
    use crate::geom::{Point2d, Size2d};

    fn params(span: f64, thickness_um: f64) -> WedgeParameters {
        WedgeParameters {
            mpp: 0.5,
            center_x: 60,
            center_y: 40,
            well_x: 70,
            well_y: 50,
            offset_um: 2.0,
            thickness_um,
            span_degrees: span,
        }
    }

    /// 1000 x 1000 图像, 圆心 (500, 500), 朝向 +x, 张角 90°, 半径 [400, 800] 像素.
    #[test]
    fn test_rasterize_facing_right() {
        let dims = Size2d::new(1000, 1000);
        let center = Point2d::new(500, 500);
        let mask = rasterize(dims, center, 0.0, 90.0, 400.0, 800.0);

        assert_eq!(mask.size(), dims);
        assert!(!mask.is_empty());
        assert!(mask.get(Point2d::new(950, 500)));
        assert!(!mask.get(Point2d::new(50, 500)));
        assert!(!mask.get(Point2d::new(600, 500)));

        // 关于圆心到孔位的连线 (y = 500) 对称.
        for y in 1..500i64 {
            for x in 0..1000i64 {
                assert_eq!(
                    mask.get(Point2d::new(x, 500 + y)),
                    mask.get(Point2d::new(x, 500 - y)),
                    "({x}, {y})"
                );
            }
        }

        // 外半径之外全空.
        for ((y, x), &m) in mask.view().indexed_iter() {
            let (dx, dy) = (x as f64 - 500.0, y as f64 - 500.0);
            if dx * dx + dy * dy > 800.0 * 800.0 {
                assert!(!m);
            }
        }
    }

    #[test]
    fn test_rasterize_matches_contains() {
        // 内半径约 18 像素, 外半径约 38 像素, 朝向右下方; 图像足够容纳整个楔形.
        let dims = Size2d::new(128, 96);
        let p = params(75.0, 10.0);
        let wedge = p.to_wedge();
        let mask = p.rasterize(dims);
        for y in 0..96 {
            for x in 0..128 {
                let pt = Point2d::new(x, y);
                assert_eq!(mask.get(pt), wedge.contains(pt));
            }
        }
        assert!(mask.count() > 0);
        // 圆心到孔位连线的延长线上, 距圆心 28 像素处在楔形内.
        assert!(mask.get(Point2d::new(80, 60)));
    }

    #[test]
    fn test_rasterize_monotonic_in_span() {
        let dims = Size2d::new(128, 96);
        let mut last = 0;
        for k in 1..=12 {
            let count = params(k as f64 * 30.0, 12.0).rasterize(dims).count();
            assert!(count >= last, "span {}: {count} < {last}", k * 30);
            last = count;
        }
    }

    #[test]
    fn test_rasterize_monotonic_in_thickness() {
        let dims = Size2d::new(128, 96);
        let mut last = 0;
        for k in 0..=10 {
            let count = params(120.0, k as f64 * 4.0).rasterize(dims).count();
            assert!(count >= last, "thickness {}: {count} < {last}", k * 4);
            last = count;
        }
    }

    #[test]
    fn test_rasterize_degenerate_inputs() {
        let dims = Size2d::new(20, 20);
        assert!(rasterize(dims, Point2d::new(-1000, -1000), 0.0, 90.0, 0.0, 10.0).is_empty());
        assert!(rasterize(dims, Point2d::new(10, 10), 0.0, 90.0, 8.0, 4.0).is_empty());
        assert!(rasterize(Size2d::new(0, 5), Point2d::new(0, 0), 0.0, 360.0, 0.0, 9.0).is_empty());

        let mut p = params(90.0, 10.0);
        p.mpp = 0.0;
        assert!(p.rasterize(dims).is_empty());
    }
}
