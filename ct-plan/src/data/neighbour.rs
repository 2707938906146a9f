//! 三维邻域.

use crate::Idx3d;

/// 前后上下左右六个方向的偏移量, 按 `(z, y, x)` 排列.
const DIAMOND: [(isize, isize, isize); 6] = [
    (-1, 0, 0),
    (1, 0, 0),
    (0, -1, 0),
    (0, 1, 0),
    (0, 0, -1),
    (0, 0, 1),
];

/// `pos` 的 6-邻域 (钻石型邻域) 索引迭代器.
///
/// 只产出形状 `shape` 内部的索引, 越界的邻居在产出之前就会被过滤掉,
/// 因此调用方可以直接用产出值索引数据.
#[derive(Clone, Debug)]
pub struct Diamond {
    pos: Idx3d,
    shape: Idx3d,
    cur: usize,
}

impl Diamond {
    /// 以 `pos` 为中心, 在形状为 `shape` 的体数据内迭代 6-邻居.
    #[inline]
    pub fn new(pos: Idx3d, shape: Idx3d) -> Self {
        Self { pos, shape, cur: 0 }
    }

    /// 计算 `base + delta`, 若结果不在 `[0, len)` 内则返回 `None`.
    #[inline]
    fn step(base: usize, delta: isize, len: usize) -> Option<usize> {
        base.checked_add_signed(delta).filter(|&v| v < len)
    }

    /// 按第 `i` 个方向偏移中心索引. 越界时返回 `None`.
    #[inline]
    fn offset(&self, i: usize) -> Option<Idx3d> {
        let (z, y, x) = self.pos;
        let (lz, ly, lx) = self.shape;
        let (dz, dy, dx) = DIAMOND[i];
        Some((
            Self::step(z, dz, lz)?,
            Self::step(y, dy, ly)?,
            Self::step(x, dx, lx)?,
        ))
    }
}

impl Iterator for Diamond {
    type Item = Idx3d;

    fn next(&mut self) -> Option<Self::Item> {
        while self.cur < DIAMOND.len() {
            let i = self.cur;
            self.cur += 1;
            if let Some(p) = self.offset(i) {
                return Some(p);
            }
        }
        None
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(DIAMOND.len() - self.cur))
    }
}

/// 获取 `pos` 在 `shape` 内的所有 6-邻居.
#[inline]
pub fn diamond_neighbours(pos: Idx3d, shape: Idx3d) -> Diamond {
    Diamond::new(pos, shape)
}
