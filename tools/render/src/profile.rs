//! 各阶段运行计时.

use std::time::{Duration, Instant};

/// 可累加的计时器.
///
/// 该计时器支持 "中途中断" 与 "结束中断, 继续开始计时".
#[derive(Clone, Debug)]
struct AccTimer {
    consumed: Duration,
    since: Instant,
}

impl AccTimer {
    /// 初始化计时器. 初始化时会视为已经开始计时 (`self.start()`).
    #[inline]
    fn new() -> Self {
        Self {
            consumed: Duration::ZERO,
            since: Instant::now(),
        }
    }

    /// 开始计时.
    #[inline]
    fn start(&mut self) {
        self.since = Instant::now();
    }

    /// 结束计时, 并将这一区间的时间累加. 返回本轮计时时长.
    ///
    /// # 注意
    ///
    /// 上一次调用必须是 `self.start()`, 否则计算时间值无意义.
    #[inline]
    fn elapsed(&mut self) -> Duration {
        let d = self.since.elapsed();
        self.consumed += d;
        d
    }

    /// 获得总共累计下来的时间 (以微秒为单位).
    #[inline]
    fn get_total_us(&self) -> u64 {
        self.consumed.as_micros() as u64
    }
}

/// 渲染流程的计时统计. 按执行顺序记录每个阶段的耗时.
#[derive(Clone, Debug)]
pub struct Profile {
    stages: Vec<(&'static str, Duration)>,
    stage_time: AccTimer,
    real_time: AccTimer,
}

impl Profile {
    /// 初始化. 总计时从此刻开始.
    #[inline]
    pub fn new() -> Self {
        Self {
            stages: Vec::with_capacity(8),
            stage_time: AccTimer::new(),
            real_time: AccTimer::new(),
        }
    }

    /// 执行 `f`, 并以 `name` 为名记录其耗时.
    pub fn time<T, F: FnOnce() -> T>(&mut self, name: &'static str, f: F) -> T {
        self.stage_time.start();
        let ans = f();
        let d = self.stage_time.elapsed();
        log::debug!("stage `{name}` took {} us", d.as_micros());
        self.stages.push((name, d));
        ans
    }

    /// 结束全部计时.
    #[inline]
    pub fn finish(mut self) -> Self {
        self.real_time.elapsed();
        self
    }

    /// 按执行顺序获得所有阶段的耗时.
    #[inline]
    pub fn stages(&self) -> &[(&'static str, Duration)] {
        &self.stages
    }

    /// 以微秒为单位获得所有阶段的耗时总和.
    #[inline]
    pub fn get_stage_time_us(&self) -> u64 {
        self.stage_time.get_total_us()
    }

    /// 以微秒为单位获得从开始到 `finish` 的总自然时间.
    #[inline]
    pub fn get_real_time_us(&self) -> u64 {
        self.real_time.get_total_us()
    }

    /// 获取最耗时的阶段. 如果不存在任何阶段, 则返回 `None`.
    pub fn get_most_time_consuming(&self) -> Option<(&'static str, Duration)> {
        self.stages.iter().copied().max_by_key(|&(_, d)| d)
    }
}

impl Default for Profile {
    fn default() -> Self {
        Self::new()
    }
}
