//! 引导取消
//!
//! 宿主持有 [`BootstrapCancel`]，编排器持有 [`CancelToken`]。
//! 每次资源请求都与令牌竞争，取消后引导以 `Cancelled` 结束。

use tokio::sync::watch;

/// 宿主一侧的取消句柄
#[derive(Debug)]
pub struct BootstrapCancel {
    sender: watch::Sender<bool>,
}

impl BootstrapCancel {
    pub fn new() -> (Self, CancelToken) {
        let (sender, receiver) = watch::channel(false);
        (Self { sender }, CancelToken { receiver })
    }

    pub fn cancel(&self) {
        // 没有接收者时发送失败，此时也无人需要通知
        let _ = self.sender.send(true);
    }

    pub fn token(&self) -> CancelToken {
        CancelToken {
            receiver: self.sender.subscribe(),
        }
    }
}

/// 编排器一侧的取消令牌
#[derive(Debug, Clone)]
pub struct CancelToken {
    receiver: watch::Receiver<bool>,
}

impl CancelToken {
    /// 永远不会被取消的令牌
    pub fn never() -> Self {
        let (_sender, receiver) = watch::channel(false);
        Self { receiver }
    }

    pub fn is_cancelled(&self) -> bool {
        *self.receiver.borrow()
    }

    /// 等待取消；句柄被丢弃且未取消时永远挂起
    pub async fn cancelled(&self) {
        let mut receiver = self.receiver.clone();
        if receiver.wait_for(|cancelled| *cancelled).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::never()
    }
}
