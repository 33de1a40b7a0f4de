//! 场景配置（JSON）
//!
//! 描述一次两节点实验：链路参数、ECN 模式、应用类型与起止时间。
//! 字符串字段（`"5Mbps"`、`"2ms"`、`"ClassicEcn"`）在构建实验时解析，
//! 解析失败统一报告为 [`ScenarioError`]。

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ecn::EcnError;

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("invalid time value {0:?} (expected e.g. \"2ms\", \"1.1s\")")]
    InvalidTime(String),
    #[error("invalid data rate {0:?} (expected e.g. \"5Mbps\", \"10Gbps\")")]
    InvalidDataRate(String),
    #[error("invalid scenario: {0}")]
    InvalidConfig(String),
    #[error(transparent)]
    Ecn(#[from] EcnError),
    #[error("failed to read scenario: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse scenario JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioSpec {
    /// 两端默认 ECN 模式
    #[serde(default = "default_ecn_mode")]
    pub ecn_mode: String,
    /// 发送端（主动打开）覆盖值
    #[serde(default)]
    pub sender_ecn_mode: Option<String>,
    /// 接收端（被动打开）覆盖值
    #[serde(default)]
    pub receiver_ecn_mode: Option<String>,
    #[serde(default)]
    pub link: LinkSpec,
    #[serde(default)]
    pub app: AppSpec,
    /// 发送端应用启动时间
    #[serde(default = "default_start")]
    pub start: String,
    /// 仿真停止时间
    #[serde(default = "default_stop")]
    pub stop: String,
    /// 在该时刻记录发送端 socket 的 EcnMode
    #[serde(default)]
    pub log_mode_at: Option<String>,
    #[serde(default)]
    pub mss: Option<u32>,
}

impl Default for ScenarioSpec {
    fn default() -> Self {
        Self {
            ecn_mode: default_ecn_mode(),
            sender_ecn_mode: None,
            receiver_ecn_mode: None,
            link: LinkSpec::default(),
            app: AppSpec::default(),
            start: default_start(),
            stop: default_stop(),
            log_mode_at: None,
            mss: None,
        }
    }
}

impl ScenarioSpec {
    pub fn from_json_str(s: &str) -> Result<Self, ScenarioError> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ScenarioError> {
        let raw = fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }
}

/// 点对点链路参数
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkSpec {
    #[serde(default = "default_link_rate")]
    pub data_rate: String,
    #[serde(default = "default_link_delay")]
    pub delay: String,
    /// 每方向发送队列容量（字节）；缺省为几乎无限
    #[serde(default)]
    pub queue_bytes: Option<u64>,
    /// CE 标记阈值（字节）；缺省不标记
    #[serde(default)]
    pub ecn_threshold_bytes: Option<u64>,
}

impl Default for LinkSpec {
    fn default() -> Self {
        Self {
            data_rate: default_link_rate(),
            delay: default_link_delay(),
            queue_bytes: None,
            ecn_threshold_bytes: None,
        }
    }
}

/// 发送端应用
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AppSpec {
    /// 一次性写入 `max_bytes` 字节（BulkSend）
    Bulk {
        #[serde(default = "default_max_bytes")]
        max_bytes: u64,
    },
    /// 恒定速率源（OnOff，始终处于 on）
    OnOff {
        #[serde(default = "default_onoff_rate")]
        data_rate: String,
        #[serde(default = "default_packet_size")]
        packet_size: u32,
    },
}

impl Default for AppSpec {
    fn default() -> Self {
        AppSpec::Bulk {
            max_bytes: default_max_bytes(),
        }
    }
}

fn default_ecn_mode() -> String {
    "ClassicEcn".to_string()
}

fn default_start() -> String {
    "1s".to_string()
}

fn default_stop() -> String {
    "2s".to_string()
}

fn default_link_rate() -> String {
    "5Mbps".to_string()
}

fn default_link_delay() -> String {
    "2ms".to_string()
}

fn default_max_bytes() -> u64 {
    10_000
}

fn default_onoff_rate() -> String {
    "1Mbps".to_string()
}

fn default_packet_size() -> u32 {
    512
}
