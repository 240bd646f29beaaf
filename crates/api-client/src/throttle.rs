use governor::clock::DefaultClock;
use governor::state::direct::NotKeyed;
use governor::state::InMemoryState;
use governor::{Quota, RateLimiter};
use std::sync::Arc;
use std::time::Duration;

type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Enforces a minimum spacing between outgoing requests.
///
/// Each client owns one; clones share the same budget, so a client cloned across tasks
/// still paces all of its calls together.
#[derive(Clone)]
pub struct RequestThrottle {
    limiter: Option<Arc<DirectRateLimiter>>,
    min_interval: Duration,
}

impl RequestThrottle {
    /// One request per `min_interval`, no bursting. A zero interval disables pacing.
    pub fn new(min_interval: Duration) -> Self {
        let limiter = Quota::with_period(min_interval).map(|quota| Arc::new(RateLimiter::direct(quota)));
        Self { limiter, min_interval }
    }

    pub fn unlimited() -> Self {
        Self::new(Duration::ZERO)
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Waits until the next request is allowed.
    pub async fn acquire(&self) {
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }
    }
}

impl std::fmt::Debug for RequestThrottle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestThrottle")
            .field("min_interval", &self.min_interval)
            .finish()
    }
}
