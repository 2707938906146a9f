//! 图像的持久化存储.

use super::{DepthBuffer, GraySlice};
use crate::consts::gray::{BLACK, WHITE};
use image::ImageResult;
use std::path::Path;

/// 表明一个可以通过 **可视化友好** 模式持久化存储的图像对象.
///
/// 灰度图像按原样保存; 深度缓冲会被映射为 "越近越亮",
/// 背景像素为黑色.
pub trait ImgWriteVis {
    /// 按照一定的可视化规则将图片保存到 `path` 路径. 格式由扩展名决定.
    fn save<P: AsRef<Path>>(&self, path: P) -> ImageResult<()>;
}

/// 将 `(y, x)` 索引的像素写入灰度图并保存.
fn save_gray<P, I>(path: P, (height, width): (usize, usize), pixels: I) -> ImageResult<()>
where
    P: AsRef<Path>,
    I: IntoIterator<Item = ((usize, usize), u8)>,
{
    let mut buf = image::GrayImage::new(width as u32, height as u32);
    for ((h, w), pix) in pixels {
        buf.put_pixel(w as u32, h as u32, image::Luma([pix]));
    }
    buf.save(path)
}

impl ImgWriteVis for GraySlice {
    fn save<P: AsRef<Path>>(&self, path: P) -> ImageResult<()> {
        save_gray(path, self.shape(), self.indexed_iter().map(|(pos, &g)| (pos, g)))
    }
}

impl DepthBuffer {
    /// 将深度映射为灰度: 第 0 层为白色, 越深越暗, 背景为黑色.
    pub fn pretty(&self, depth: u32) -> u8 {
        if depth == self.no_hit() || self.layers() == 0 {
            return BLACK;
        }
        let ratio = depth as f64 / self.layers() as f64;
        (WHITE as f64 * (1.0 - ratio)).round().clamp(1.0, 255.0) as u8
    }
}

impl ImgWriteVis for DepthBuffer {
    fn save<P: AsRef<Path>>(&self, path: P) -> ImageResult<()> {
        save_gray(
            path,
            self.shape(),
            self.array_view()
                .indexed_iter()
                .map(|(pos, &d)| (pos, self.pretty(d))),
        )
    }
}

#[cfg(test)]
mod tests {
    use crate::config::RenderConfig;
    use crate::VoxelVolume;

    #[test]
    fn test_depth_pretty() {
        let v = VoxelVolume::from_shape_fn((4, 1, 3), |(z, _, x)| if x == 2 || z < x { -1000 } else { 1000 });
        let d = v.depth_buffer(0, &RenderConfig::default()).unwrap();
        assert_eq!(d[(0, 0)], 0);
        assert_eq!(d[(0, 1)], 1);
        assert_eq!(d[(0, 2)], 4);
        assert_eq!(d.pretty(d[(0, 0)]), 255);
        assert_eq!(d.pretty(d[(0, 1)]), 191);
        assert_eq!(d.pretty(d[(0, 2)]), 0);
    }
}
