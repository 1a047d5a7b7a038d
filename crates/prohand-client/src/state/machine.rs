//! Type State Machine - 编译期状态安全
//!
//! 使用零大小类型（ZST）标记实现状态机：只有握手确认后的 `Hand<Streaming>`
//! 才提供流式发送方法，未确认的客户端在编译期就无法调用它们。

use crate::error::ControlError;
use prohand_driver::{Clock, DriverError, HandshakeConfig, HandshakeState, ProHand, ProHandBuilder};
use prohand_protocol::{HandStatus, JointCommand, WristCommand};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// 待机状态
///
/// 已连接，可以发送可靠命令和读取状态，但不能流式发送。
pub struct Standby;

/// 流式状态
///
/// 驱动已确认运行状态，可以发送流式命令。
pub struct Streaming;

/// ProHand 灵巧手（Type State Pattern）
///
/// 客户端独占底层 [`ProHand`]，不可复制；状态转换消费 `self` 并返回新状态。
///
/// # Drop
///
/// 析构时尽力恢复安全状态：处于流式运行状态时先发送零位命令再关闭流式模式，
/// 握手未完成时只关闭流式模式。错误只记录日志。
pub struct Hand<State = Standby> {
    driver: Option<ProHand>,
    _state: State,
}

/// 握手结果
pub enum StreamingOutcome {
    Confirmed(Hand<Streaming>),
    /// 超时未确认（正常的否定结果），客户端仍处于待机状态
    NotConfirmed {
        hand: Hand<Standby>,
        timeout: Duration,
    },
}

impl StreamingOutcome {
    pub fn is_confirmed(&self) -> bool {
        matches!(self, StreamingOutcome::Confirmed(_))
    }

    /// 未确认视为错误
    pub fn into_result(self) -> Result<Hand<Streaming>, ControlError> {
        match self {
            StreamingOutcome::Confirmed(hand) => Ok(hand),
            StreamingOutcome::NotConfirmed { timeout, .. } => {
                Err(ControlError::not_confirmed(timeout))
            },
        }
    }
}

// ==================== 所有状态 ====================

impl<State> Hand<State> {
    pub fn driver(&self) -> Result<&ProHand, ControlError> {
        self.driver.as_ref().ok_or(ControlError::Released)
    }

    /// 直接访问驱动层（可靠命令、事件回调等）
    pub fn driver_mut(&mut self) -> Result<&mut ProHand, ControlError> {
        self.driver.as_mut().ok_or(ControlError::Released)
    }

    pub fn is_connected(&self) -> bool {
        self.driver.as_ref().is_some_and(ProHand::is_connected)
    }

    /// 客户端使用的时钟
    pub fn clock(&self) -> Result<Arc<dyn Clock>, ControlError> {
        Ok(self.driver()?.clock())
    }

    /// 非阻塞读取状态样本
    pub fn try_recv_status(&mut self) -> Result<Option<HandStatus>, ControlError> {
        Ok(self.driver_mut()?.try_recv_status()?)
    }

    /// 恢复安全状态并释放全部通道
    pub fn close(mut self) {
        if let Some(mut driver) = self.driver.take() {
            release(&mut driver);
            driver.close();
        }
    }

    fn transition<T>(mut self, state: T) -> Hand<T> {
        Hand {
            driver: self.driver.take(),
            _state: state,
        }
    }
}

// ==================== Standby 状态 ====================

impl Hand<Standby> {
    pub fn new(driver: ProHand) -> Self {
        Self {
            driver: Some(driver),
            _state: Standby,
        }
    }

    /// 按 builder 配置创建通道
    pub fn connect(builder: ProHandBuilder) -> Result<Self, ControlError> {
        Ok(Self::new(builder.build()?))
    }

    pub fn ping(&mut self) -> Result<(), ControlError> {
        Ok(self.driver_mut()?.ping()?)
    }

    /// 执行流式模式握手
    ///
    /// # Errors
    /// 首次模式切换请求失败时返回错误；超时未确认不是错误，返回
    /// [`StreamingOutcome::NotConfirmed`]。
    pub fn enable_streaming(
        mut self,
        config: &HandshakeConfig,
    ) -> Result<StreamingOutcome, ControlError> {
        let confirmed = self.driver_mut()?.enable_streaming(config)?;
        if confirmed {
            info!("Hand entered streaming state");
            Ok(StreamingOutcome::Confirmed(self.transition(Streaming)))
        } else {
            Ok(StreamingOutcome::NotConfirmed {
                hand: self,
                timeout: config.timeout,
            })
        }
    }
}

// ==================== Streaming 状态 ====================

impl Hand<Streaming> {
    pub fn stream_hand(&mut self, command: &JointCommand) -> Result<(), DriverError> {
        self.driver
            .as_mut()
            .ok_or(DriverError::NullHandle)?
            .send_hand_stream(command)
    }

    pub fn stream_wrist(&mut self, command: &WristCommand) -> Result<(), DriverError> {
        self.driver
            .as_mut()
            .ok_or(DriverError::NullHandle)?
            .send_wrist_stream(command)
    }

    /// 发送一帧完整姿态：先腕部后手部
    pub fn stream_pose(
        &mut self,
        hand: &JointCommand,
        wrist: &WristCommand,
    ) -> Result<(), DriverError> {
        self.stream_wrist(wrist)?;
        self.stream_hand(hand)
    }

    /// 回到零位并关闭流式模式，返回待机状态
    ///
    /// 顺序：零位腕部 → 零位手部（力矩 0，关闭前的最后一条命令）→ 等待 `settle`
    /// → set-streaming-mode(false)。零位发送失败时仍会尝试关闭流式模式。
    pub fn park(mut self, settle: Duration) -> Result<Hand<Standby>, ControlError> {
        let driver = self.driver_mut()?;
        info!("Returning hand to zero");
        let zeroed = send_zero(driver);
        if zeroed.is_ok() && !settle.is_zero() {
            driver.clock().sleep(settle);
        }
        let disabled = driver.disable_streaming();
        zeroed?;
        disabled?;
        Ok(self.transition(Standby))
    }
}

// ==================== Drop 实现（安全关闭）====================

impl<State> Drop for Hand<State> {
    fn drop(&mut self) {
        if let Some(driver) = self.driver.as_mut() {
            release(driver);
        }
    }
}

/// 零位腕部 + 零位手部（力矩 0）
fn send_zero(driver: &mut ProHand) -> Result<(), DriverError> {
    if driver.endpoints().wrist_stream.is_some() {
        driver.send_wrist_stream(&WristCommand::zero())?;
    }
    driver.send_hand_stream(&JointCommand::zero())
}

fn release(driver: &mut ProHand) {
    if !driver.is_connected() {
        return;
    }
    match driver.handshake_state() {
        HandshakeState::Disabled => {},
        HandshakeState::Running => {
            debug!("Releasing streaming hand: zero + disable");
            if let Err(e) = send_zero(driver) {
                warn!("Failed to send zero command on release: {}", e);
            }
            if let Err(e) = driver.disable_streaming() {
                warn!("Failed to disable streaming mode on release: {}", e);
            }
        },
        HandshakeState::Requesting | HandshakeState::Confirming | HandshakeState::Failed => {
            if let Err(e) = driver.set_streaming_mode(false) {
                warn!("Failed to disable streaming mode on release: {}", e);
            }
        },
    }
}
