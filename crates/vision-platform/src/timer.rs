use async_trait::async_trait;
use gloo_timers::future::TimeoutFuture;

use vision_core::ports::TimerPort;

/// `setTimeout`-backed delays
#[derive(Debug, Default, Clone, Copy)]
pub struct GlooTimer;

#[async_trait(?Send)]
impl TimerPort for GlooTimer {
    async fn sleep(&self, ms: u64) {
        TimeoutFuture::new(ms.min(u32::MAX as u64) as u32).await;
    }
}
