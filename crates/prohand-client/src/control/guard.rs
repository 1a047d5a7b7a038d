//! 流式发送容错
//!
//! 流式通道是尽力而为的：偶发的连接类错误只记录日志并跳过本帧，
//! 下一帧会发送更新的命令。连续失败超过阈值，或出现参数类错误时终止循环。

use crate::error::ControlError;
use prohand_driver::DriverError;
use tracing::{error, warn};

/// 允许的最大连续失败帧数
pub const MAX_CONSECUTIVE_FAILURES: u32 = 5;

#[derive(Debug, Default)]
pub(crate) struct StreamGuard {
    consecutive: u32,
}

impl StreamGuard {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record(&mut self, result: Result<(), DriverError>) -> Result<(), ControlError> {
        match result {
            Ok(()) => {
                self.consecutive = 0;
                Ok(())
            },
            Err(e) if !e.is_retryable() => Err(e.into()),
            Err(e) => {
                self.consecutive += 1;
                if self.consecutive > MAX_CONSECUTIVE_FAILURES {
                    error!(
                        "Consecutive streaming failures ({}): {}. Aborting.",
                        self.consecutive, e
                    );
                    return Err(ControlError::ConsecutiveFailures {
                        count: self.consecutive,
                        last_error: Box::new(e),
                    });
                }
                warn!(
                    "Transient streaming error ({}): {}, skipping frame",
                    self.consecutive, e
                );
                Ok(())
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transient() -> Result<(), DriverError> {
        Err(DriverError::Connection("socket busy".to_string()))
    }

    #[test]
    fn test_tolerates_transient_errors() {
        let mut guard = StreamGuard::new();
        for _ in 0..MAX_CONSECUTIVE_FAILURES {
            assert!(guard.record(transient()).is_ok());
        }
        // 成功一帧后计数清零
        assert!(guard.record(Ok(())).is_ok());
        for _ in 0..MAX_CONSECUTIVE_FAILURES {
            assert!(guard.record(transient()).is_ok());
        }
        assert!(matches!(
            guard.record(transient()),
            Err(ControlError::ConsecutiveFailures { count: 6, .. })
        ));
    }

    #[test]
    fn test_argument_errors_fail_immediately() {
        let mut guard = StreamGuard::new();
        let result = guard.record(Err(DriverError::NotConnected("no stream".to_string())));
        assert!(matches!(
            result,
            Err(ControlError::Driver(DriverError::NotConnected(_)))
        ));
    }
}
