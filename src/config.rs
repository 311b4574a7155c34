//! 客户端配置

use crate::error::{Mt5Error, Result};
use std::time::Duration;

/// 默认网关地址
pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";

/// HTTP 请求默认超时
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// 订阅循环的重连与心跳参数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    /// 拨号失败后的初始等待
    pub backoff_floor: Duration,
    /// 拨号失败等待的上限
    pub backoff_ceiling: Duration,
    /// 流中断 (已连接后) 的固定等待
    pub reconnect_pause: Duration,
    /// Ping 心跳周期
    pub heartbeat_interval: Duration,
}

impl ReconnectPolicy {
    /// 校验参数
    pub fn validate(&self) -> Result<()> {
        if self.backoff_floor.is_zero() {
            return Err(Mt5Error::InvalidParams(
                "backoff_floor must be > 0".to_string(),
            ));
        }
        if self.backoff_floor > self.backoff_ceiling {
            return Err(Mt5Error::InvalidParams(format!(
                "backoff_floor {:?} exceeds backoff_ceiling {:?}",
                self.backoff_floor, self.backoff_ceiling
            )));
        }
        if self.reconnect_pause.is_zero() {
            return Err(Mt5Error::InvalidParams(
                "reconnect_pause must be > 0".to_string(),
            ));
        }
        if self.heartbeat_interval.is_zero() {
            return Err(Mt5Error::InvalidParams(
                "heartbeat_interval must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            backoff_floor: Duration::from_secs(1),
            backoff_ceiling: Duration::from_secs(5 * 60),
            reconnect_pause: Duration::from_secs(1),
            heartbeat_interval: Duration::from_secs(30),
        }
    }
}

/// MT5 客户端配置
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// 网关 HTTP 地址 (http:// 或 https://)
    pub base_url: String,
    /// 单次 HTTP 请求超时
    pub request_timeout: Duration,
    /// 订阅循环参数
    pub reconnect: ReconnectPolicy,
}

impl ClientConfig {
    /// 使用指定网关地址创建配置
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            ..Self::default()
        }
    }

    /// 从环境变量读取配置
    ///
    /// - `MT5_API_URL`
    /// - `MT5_REQUEST_TIMEOUT_SECS`
    /// - `MT5_HEARTBEAT_SECS`
    /// - `MT5_BACKOFF_CEILING_SECS`
    pub fn from_env() -> Result<Self> {
        let mut config = match std::env::var("MT5_API_URL") {
            Ok(url) => Self::new(&url),
            Err(_) => Self::default(),
        };

        if let Some(secs) = env_secs("MT5_REQUEST_TIMEOUT_SECS")? {
            config.request_timeout = secs;
        }
        if let Some(secs) = env_secs("MT5_HEARTBEAT_SECS")? {
            config.reconnect.heartbeat_interval = secs;
        }
        if let Some(secs) = env_secs("MT5_BACKOFF_CEILING_SECS")? {
            config.reconnect.backoff_ceiling = secs;
        }

        config.reconnect.validate()?;
        Ok(config)
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_reconnect_policy(mut self, policy: ReconnectPolicy) -> Self {
        self.reconnect = policy;
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            reconnect: ReconnectPolicy::default(),
        }
    }
}

fn env_secs(name: &str) -> Result<Option<Duration>> {
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<u64>()
            .map(|secs| Some(Duration::from_secs(secs)))
            .map_err(|e| Mt5Error::InvalidParams(format!("{}={:?}: {}", name, raw, e))),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy() {
        let policy = ReconnectPolicy::default();
        assert_eq!(policy.backoff_floor, Duration::from_secs(1));
        assert_eq!(policy.backoff_ceiling, Duration::from_secs(300));
        assert_eq!(policy.reconnect_pause, Duration::from_secs(1));
        assert_eq!(policy.heartbeat_interval, Duration::from_secs(30));
        assert!(policy.validate().is_ok());
    }

    #[test]
    fn test_policy_rejects_floor_above_ceiling() {
        let policy = ReconnectPolicy {
            backoff_floor: Duration::from_secs(10),
            backoff_ceiling: Duration::from_secs(5),
            ..ReconnectPolicy::default()
        };
        assert!(matches!(policy.validate(), Err(Mt5Error::InvalidParams(_))));
    }

    #[test]
    fn test_policy_rejects_zero_heartbeat() {
        let policy = ReconnectPolicy {
            heartbeat_interval: Duration::ZERO,
            ..ReconnectPolicy::default()
        };
        assert!(policy.validate().is_err());
    }

    #[test]
    fn test_policy_rejects_zero_pause() {
        let policy = ReconnectPolicy {
            reconnect_pause: Duration::ZERO,
            ..ReconnectPolicy::default()
        };
        assert!(matches!(policy.validate(), Err(Mt5Error::InvalidParams(_))));
    }

    #[test]
    fn test_new_trims_trailing_slash() {
        let config = ClientConfig::new("https://mt5.example.com/");
        assert_eq!(config.base_url, "https://mt5.example.com");
        assert_eq!(config.request_timeout, DEFAULT_REQUEST_TIMEOUT);
    }
}
