//! 通用常量.

/// HU 值定义域相关常量.
pub mod hu {
    /// CT 扫描 HU 值的下限 (空气).
    pub const HU_MIN: i32 = -1024;

    /// CT 扫描 HU 值的上限.
    pub const HU_MAX: i32 = 3071;

    /// 窗宽下限.
    pub const WIDTH_MIN: i32 = 1;

    /// 窗宽上限, 即整个 HU 定义域的跨度.
    pub const WIDTH_MAX: i32 = HU_MAX - HU_MIN;

    /// 判断 `v` 是否在 HU 定义域内.
    #[inline]
    pub const fn is_hu(v: i32) -> bool {
        HU_MIN <= v && v <= HU_MAX
    }

    /// 判断 `w` 是否是合法的窗宽.
    #[inline]
    pub const fn is_width(w: i32) -> bool {
        WIDTH_MIN <= w && w <= WIDTH_MAX
    }
}

/// 单通道颜色.
pub mod gray {
    /// 单通道黑色.
    pub const BLACK: u8 = 0b_0000_0000;

    /// 单通道暗灰色.
    pub const DARK_GRAY: u8 = 0b_0100_0000;

    /// 单通道白色.
    pub const WHITE: u8 = 0b_1111_1111;
}

/// 默认阈值 (HU). 与骨骼表面大致对应.
pub const DEFAULT_THRESHOLD: i16 = 300;

/// 默认窗位.
pub const DEFAULT_CENTER: i32 = 0;

/// 默认窗宽.
pub const DEFAULT_WIDTH: i32 = 1200;

/// 表面着色的默认步长.
pub const DEFAULT_SHADING_SCALE: f64 = 2.0;

/// 刚体配准所需的最少点对数.
pub const MIN_CORRESPONDENCES: usize = 3;

/// 退化点集判定的相对容差.
pub const DEGENERACY_EPS: f64 = 1e-9;
