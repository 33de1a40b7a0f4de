//! DCTCP 标记比例估计
//!
//! - [`MarkedFraction`]：接收端按包更新的 EWMA，每次 CE 观测只会增大、
//!   每次非 CE 观测只会减小。
//! - [`DctcpAlpha`]：发送端按窗口统计被 ECE 回显的字节比例 F，
//!   每个窗口结束时 `alpha = (1 - g) * alpha + g * F`。

/// 按包更新的 CE 标记比例（EWMA）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkedFraction {
    g: f64,
    value: f64,
    observed: u64,
    marked: u64,
}

impl MarkedFraction {
    pub fn new(g: f64) -> Self {
        Self {
            g: g.clamp(0.0, 1.0),
            value: 0.0,
            observed: 0,
            marked: 0,
        }
    }

    pub fn observe(&mut self, ce: bool) {
        let x = if ce { 1.0 } else { 0.0 };
        self.value = (1.0 - self.g) * self.value + self.g * x;
        self.observed = self.observed.saturating_add(1);
        if ce {
            self.marked = self.marked.saturating_add(1);
        }
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn observed(&self) -> u64 {
        self.observed
    }

    pub fn marked(&self) -> u64 {
        self.marked
    }
}

/// 发送端 DCTCP alpha（按 cwnd 窗口统计）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DctcpAlpha {
    g: f64,
    alpha: f64,
    window_end: u64,
    acked_in_window: u64,
    marked_in_window: u64,
    last_frac: f64,
}

impl DctcpAlpha {
    pub fn new(g: f64) -> Self {
        Self {
            g: g.clamp(0.0, 1.0),
            alpha: 0.0,
            window_end: 0,
            acked_in_window: 0,
            marked_in_window: 0,
            last_frac: 0.0,
        }
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// 最近一个窗口的标记比例 F
    pub fn last_fraction(&self) -> f64 {
        self.last_frac
    }

    /// 记录一次 ACK。窗口结束时返回缩减因子 `1 - alpha/2`（仅当窗口内出现过标记）。
    ///
    /// `snd_nxt` 用于确定下一个观测窗口的右边界。
    pub fn on_ack(&mut self, ack: u64, newly_acked: u64, ece: bool, snd_nxt: u64) -> Option<f64> {
        self.acked_in_window = self.acked_in_window.saturating_add(newly_acked);
        if ece {
            self.marked_in_window = self.marked_in_window.saturating_add(newly_acked);
        }
        if ack < self.window_end {
            return None;
        }

        let frac = if self.acked_in_window == 0 {
            0.0
        } else {
            self.marked_in_window as f64 / self.acked_in_window as f64
        };
        self.last_frac = frac;
        self.alpha = (1.0 - self.g) * self.alpha + self.g * frac;
        let marked = self.marked_in_window > 0;
        self.acked_in_window = 0;
        self.marked_in_window = 0;
        self.window_end = snd_nxt.max(ack.saturating_add(1));

        marked.then(|| 1.0 - self.alpha / 2.0)
    }
}
