//! 楔形区域的轴对齐外接矩形.

use super::{polar_to_cartesian, Point2d, Size2d};

/// 整个圆周上的角度采样数. 对常见半径 (数千像素) 而言, 1° 分辨率下弦高不足 0.1 像素.
pub const BBOX_SAMPLES: usize = 360;

/// 采样点偏移量的运行极值.
#[derive(Copy, Clone, Debug)]
struct Extent {
    min_x: f64,
    max_x: f64,
    min_y: f64,
    max_y: f64,
}

impl Extent {
    #[inline]
    fn new() -> Self {
        Self {
            min_x: f64::INFINITY,
            max_x: f64::NEG_INFINITY,
            min_y: f64::INFINITY,
            max_y: f64::NEG_INFINITY,
        }
    }

    #[inline]
    fn push(&mut self, (dx, dy): (f64, f64)) {
        self.min_x = self.min_x.min(dx);
        self.max_x = self.max_x.max(dx);
        self.min_y = self.min_y.min(dy);
        self.max_y = self.max_y.max(dy);
    }

    /// 从 `start` 起顺时针扫过 `sweep` 度, 记录半径为 `radius` 的圆弧上的采样点 (含两端).
    fn sweep(&mut self, start: f64, sweep: f64, radius: f64) {
        let n = ((sweep / 360.0) * BBOX_SAMPLES as f64).ceil().max(1.0) as usize;
        for i in 0..=n {
            let angle = start + sweep * i as f64 / n as f64;
            self.push(polar_to_cartesian(radius, angle));
        }
    }
}

/// 把 `[lo, hi]` 浮点区间转换为覆盖它的像素区间 `[lo, hi)`, 并裁剪到 `[0, limit]`.
#[inline]
fn clip_axis(lo: f64, hi: f64, limit: u32) -> (u32, u32) {
    let limit = limit as f64;
    let lo = lo.floor().clamp(0.0, limit);
    let hi = (hi.floor() + 1.0).clamp(0.0, limit);
    (lo as u32, hi.max(lo) as u32)
}

/// 计算完全包含楔形区域的最小轴对齐像素矩形, 并裁剪到图像 `dims` 之内.
///
/// 楔形以 `center` 为圆心, 朝向 `facing` (度), 总张角 `span` (度), 内外半径分别为
/// `inner` 和 `outer` (像素). 外弧覆盖 `[facing - span / 2, facing + span / 2]`,
/// 剩余的 `360 - span` 度由内弧补齐.
///
/// 返回裁剪后的左上角原点和尺寸.
///
/// # 注意
///
/// 楔形完全落在图像外时尺寸为 0 (某一维或两维). 调用方必须将其视为提取失败,
/// 而不是写出空图像.
pub fn compute_bbox(
    dims: Size2d,
    center: Point2d,
    facing: f64,
    span: f64,
    inner: f64,
    outer: f64,
) -> (Point2d, Size2d) {
    let span = span.clamp(0.0, 360.0);
    let half = span / 2.0;

    let mut ext = Extent::new();
    ext.sweep(facing - half, span, outer.max(0.0));
    ext.sweep(facing + half, 360.0 - span, inner.max(0.0));

    let (cx, cy) = (center.x as f64, center.y as f64);
    let (x0, x1) = clip_axis(cx + ext.min_x, cx + ext.max_x, dims.width);
    let (y0, y1) = clip_axis(cy + ext.min_y, cy + ext.max_y, dims.height);

    (
        Point2d::new(x0 as i64, y0 as i64),
        Size2d::new(x1 - x0, y1 - y0),
    )
}

#[cfg(test)]
mod tests {
    use super::compute_bbox;
    use crate::geom::{Point2d, Size2d};

    /// 楔形覆盖整张图像时, 结果被裁剪为整张图像.
    #[test]
    fn test_bbox_full_circle_clipped() {
        let (origin, size) = compute_bbox(
            Size2d::new(100, 100),
            Point2d::new(50, 50),
            0.0,
            360.0,
            0.0,
            10000.0,
        );
        assert_eq!(origin, Point2d::new(0, 0));
        assert_eq!(size, Size2d::new(100, 100));
    }

    /// 朝向 +x 的 90° 楔形, 内半径为 0.
    #[test]
    fn test_bbox_quarter_facing_right() {
        let (origin, size) = compute_bbox(
            Size2d::new(100, 100),
            Point2d::new(50, 50),
            0.0,
            90.0,
            0.0,
            10.0,
        );
        // x: [50, 60], y: [50 - 7.07, 50 + 7.07]
        assert_eq!(origin, Point2d::new(50, 42));
        assert_eq!(size, Size2d::new(11, 16));
    }

    /// 朝向 +y (图像下方) 的楔形只向下延伸.
    #[test]
    fn test_bbox_facing_down() {
        let (origin, size) = compute_bbox(
            Size2d::new(200, 200),
            Point2d::new(100, 20),
            90.0,
            60.0,
            5.0,
            50.0,
        );
        assert_eq!(origin.y, 15);
        assert_eq!(origin.y + size.height as i64, 71);
        assert!(origin.x <= 75 && origin.x >= 70);
    }

    #[test]
    fn test_bbox_outside_image() {
        let (_, size) = compute_bbox(
            Size2d::new(100, 100),
            Point2d::new(-500, -500),
            45.0,
            90.0,
            10.0,
            20.0,
        );
        assert!(size.is_empty());

        let (_, size) = compute_bbox(
            Size2d::new(100, 100),
            Point2d::new(1000, 50),
            0.0,
            30.0,
            0.0,
            20.0,
        );
        assert!(size.is_empty());
    }

    #[test]
    fn test_bbox_always_within_image() {
        let dims = Size2d::new(320, 240);
        for &(cx, cy) in &[(-40, 10), (0, 0), (160, 120), (319, 239), (400, 300), (100, -90)] {
            for k in 0..12 {
                let facing = k as f64 * 37.0 - 200.0;
                for &span in &[1.0, 45.0, 90.0, 179.0, 270.0, 360.0] {
                    for &(inner, outer) in &[(0.0, 10.0), (30.0, 90.0), (0.0, 1000.0)] {
                        let (o, s) =
                            compute_bbox(dims, Point2d::new(cx, cy), facing, span, inner, outer);
                        assert!(o.x >= 0 && o.y >= 0);
                        assert!(o.x + s.width as i64 <= dims.width as i64);
                        assert!(o.y + s.height as i64 <= dims.height as i64);
                    }
                }
            }
        }
    }
}
