//! 掩膜的持久化存储与可视化叠加.

use super::WedgeMask;
use image::{GrayImage, ImageResult, Luma, Rgb, RgbImage};
use std::path::Path;

/// 叠加掩膜时的默认颜色.
pub const WEDGE_GREEN: Rgb<u8> = Rgb([0, 128, 0]);

/// 表明一个可以通过 **可视化友好** 模式持久化存储的图像对象.
///
/// 对于 `WedgeMask` 这类仅有两种取值的图像, 保存时会映射到肉眼易于区分的黑白两色.
pub trait ImgWriteVis {
    /// 按照一定的可视化规则将图片保存到 `path` 路径.
    fn save<P: AsRef<Path>>(&self, path: P) -> ImageResult<()>;
}

/// 楔形内为白色, 其余为黑色.
impl ImgWriteVis for WedgeMask {
    fn save<P: AsRef<Path>>(&self, path: P) -> ImageResult<()> {
        let size = self.size();
        let mut buf = GrayImage::new(size.width, size.height);
        for ((h, w), &m) in self.view().indexed_iter() {
            let gray = if m { u8::MAX } else { u8::MIN };
            buf.put_pixel(w as u32, h as u32, Luma([gray]));
        }
        buf.save(path)
    }
}

/// 将掩膜以 `color` 叠加到裁剪图像 `image` 上 (画家算法, 两层透明度均为 0.5).
///
/// 掩膜外的像素同样按前景层的权重变暗, 使楔形区域更加醒目.
///
/// 如果 `image` 与 `mask` 尺寸不符, 则程序 panic.
pub fn overlay(image: &RgbImage, mask: &WedgeMask, color: Rgb<u8>) -> RgbImage {
    const ALPHA1: f32 = 0.5;
    const ALPHA2: f32 = 0.5;
    const NORM: f32 = ALPHA1 + ALPHA2 * (1.0 - ALPHA1);

    let size = mask.size();
    assert_eq!(
        (image.width(), image.height()),
        (size.width, size.height),
        "图像与掩膜尺寸不符"
    );

    let mut out = RgbImage::new(size.width, size.height);
    for ((h, w), &m) in mask.view().indexed_iter() {
        let (x, y) = (w as u32, h as u32);
        let Rgb(src) = *image.get_pixel(x, y);
        let mut mixed = [0u8; 3];
        for c in 0..3 {
            let top = if m { color.0[c] as f32 } else { 0.0 };
            let v = (src[c] as f32 * ALPHA1 + top * ALPHA2 * (1.0 - ALPHA1)) / NORM;
            mixed[c] = v.round().clamp(0.0, 255.0) as u8;
        }
        out.put_pixel(x, y, Rgb(mixed));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::{overlay, ImgWriteVis, WEDGE_GREEN};
    use crate::geom::{Point2d, Size2d};
    use crate::wedge::rasterize;
    use image::{Rgb, RgbImage};

    #[test]
    fn test_overlay_tints_only_wedge() {
        let dims = Size2d::new(30, 30);
        let mask = rasterize(dims, Point2d::new(15, 15), 0.0, 90.0, 0.0, 10.0);
        let image = RgbImage::from_pixel(30, 30, Rgb([150, 150, 150]));
        let out = overlay(&image, &mask, WEDGE_GREEN);

        // 150 * 0.5 / 0.75 = 100
        assert_eq!(*out.get_pixel(0, 0), Rgb([100, 100, 100]));
        // (150 * 0.5 + 128 * 0.25) / 0.75 = 142.67
        assert_eq!(*out.get_pixel(20, 15), Rgb([100, 143, 100]));
    }

    #[test]
    fn test_save_mask_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mask.png");
        let mask = rasterize(Size2d::new(12, 8), Point2d::new(0, 4), 0.0, 60.0, 0.0, 6.0);
        mask.save(&path).unwrap();

        let back = image::open(&path).unwrap().into_luma8();
        assert_eq!(back.dimensions(), (12, 8));
        assert_eq!(back.get_pixel(3, 4).0, [255]);
        assert_eq!(back.get_pixel(11, 0).0, [0]);
    }
}
