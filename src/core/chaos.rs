//! 故障注入
//!
//! 每个请求抽取一个 [0,1) 区间的随机数 `r`：
//! - `r < failure_rate`：立即返回模拟的服务器错误
//! - `r < failure_rate + timeout_rate`：永不响应
//! - 其他情况：原样放行

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::Serialize;

pub const DEFAULT_FAILURE_RATE: f64 = 0.10;
pub const DEFAULT_TIMEOUT_RATE: f64 = 0.05;

/// 随机数来源，测试中可替换为确定性实现
pub trait RandomSource: Send + Sync {
    /// 返回 [0,1) 区间内的值
    fn next_unit(&self) -> f64;
}

/// 线程本地随机数
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn next_unit(&self) -> f64 {
        rand::rng().random::<f64>()
    }
}

/// 固定种子的随机数，同一种子产生相同序列
pub struct SeededRandom {
    rng: Mutex<StdRng>,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl RandomSource for SeededRandom {
    fn next_unit(&self) -> f64 {
        self.rng.lock().random::<f64>()
    }
}

/// 始终返回同一个值
#[derive(Debug, Clone, Copy)]
pub struct FixedRandom(pub f64);

impl RandomSource for FixedRandom {
    fn next_unit(&self) -> f64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultDecision {
    Pass,
    Fail,
    Stall,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ChaosStats {
    pub total_requests: u64,
    pub injected_failures: u64,
    pub injected_stalls: u64,
}

pub struct FaultInjector {
    enabled: bool,
    failure_rate: f64,
    timeout_rate: f64,
    exclude_paths: Vec<String>,
    source: Box<dyn RandomSource>,
    total_requests: AtomicU64,
    injected_failures: AtomicU64,
    injected_stalls: AtomicU64,
}

impl FaultInjector {
    pub fn new(failure_rate: f64, timeout_rate: f64, source: impl RandomSource + 'static) -> Self {
        Self {
            enabled: true,
            failure_rate,
            timeout_rate,
            exclude_paths: Vec::new(),
            source: Box::new(source),
            total_requests: AtomicU64::new(0),
            injected_failures: AtomicU64::new(0),
            injected_stalls: AtomicU64::new(0),
        }
    }

    /// 不注入任何故障
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::new(0.0, 0.0, ThreadRandom)
        }
    }

    pub fn with_exclude_paths(mut self, paths: Vec<String>) -> Self {
        self.exclude_paths = paths;
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn failure_rate(&self) -> f64 {
        self.failure_rate
    }

    pub fn timeout_rate(&self) -> f64 {
        self.timeout_rate
    }

    pub fn is_excluded(&self, path: &str) -> bool {
        self.exclude_paths.iter().any(|p| p == path)
    }

    /// 对一个请求做出决定，每次调用最多抽取一次随机数
    pub fn decide(&self) -> FaultDecision {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        if !self.enabled {
            return FaultDecision::Pass;
        }

        let r = self.source.next_unit();
        if r < self.failure_rate {
            self.injected_failures.fetch_add(1, Ordering::Relaxed);
            FaultDecision::Fail
        } else if r < self.failure_rate + self.timeout_rate {
            self.injected_stalls.fetch_add(1, Ordering::Relaxed);
            FaultDecision::Stall
        } else {
            FaultDecision::Pass
        }
    }

    pub fn stats(&self) -> ChaosStats {
        ChaosStats {
            total_requests: self.total_requests.load(Ordering::Relaxed),
            injected_failures: self.injected_failures.load(Ordering::Relaxed),
            injected_stalls: self.injected_stalls.load(Ordering::Relaxed),
        }
    }
}

impl Default for FaultInjector {
    fn default() -> Self {
        Self::new(DEFAULT_FAILURE_RATE, DEFAULT_TIMEOUT_RATE, ThreadRandom)
    }
}
