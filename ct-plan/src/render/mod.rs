//! 深度缓冲提取, 表面着色与灰度图像输出.

mod depth;
mod gray;
mod save;
mod shade;

pub use depth::DepthBuffer;
pub use gray::GraySlice;
pub use save::ImgWriteVis;
pub use shade::{intensity, ShadedImage};
