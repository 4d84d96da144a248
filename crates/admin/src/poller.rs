//! Pending-order badge polling.
//!
//! While an admin session is active a background task asks the backend for
//! the number of pending orders on a fixed interval (30 s by default) and
//! publishes it on a watch channel. The "viewed" flag is client-only: it is
//! set when the admin opens the orders list and cleared again as soon as
//! the count rises above what the admin saw.

use std::future::Future;
use std::time::Duration;

use shopfront_client::api::ApiError;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::api::AdminApi;

/// Route prefix of the orders list.
const ORDERS_ROUTE: &str = "/admin/orders";

/// Source of the pending-order count.
pub trait PendingOrderSource: Send + Sync + 'static {
    /// Number of orders awaiting action.
    fn pending_count(&self) -> impl Future<Output = Result<u64, ApiError>> + Send;
}

impl PendingOrderSource for AdminApi {
    fn pending_count(&self) -> impl Future<Output = Result<u64, ApiError>> + Send {
        self.pending_order_count()
    }
}

/// What the badge shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PendingOrders {
    pub count: u64,
    pub viewed: bool,
    count_at_view: u64,
}

impl PendingOrders {
    /// The number to show on the badge, if any.
    #[must_use]
    pub const fn badge(&self) -> Option<u64> {
        if self.viewed || self.count == 0 {
            None
        } else {
            Some(self.count)
        }
    }

    fn record(&mut self, count: u64) {
        if self.viewed && count > self.count_at_view {
            self.viewed = false;
        }
        self.count = count;
    }

    fn mark_viewed(&mut self) {
        self.viewed = true;
        self.count_at_view = self.count;
    }
}

/// Background poller. Dropping it stops polling.
#[derive(Debug)]
pub struct PendingOrderPoller {
    state: watch::Sender<PendingOrders>,
    handle: JoinHandle<()>,
}

impl PendingOrderPoller {
    /// Start polling. The first request goes out immediately.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn<S: PendingOrderSource>(source: S, interval: Duration) -> Self {
        let (state, _) = watch::channel(PendingOrders::default());
        let publisher = state.clone();

        info!(interval_secs = interval.as_secs(), "Starting pending order poller");
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                match source.pending_count().await {
                    Ok(count) => {
                        debug!(count, "Pending orders polled");
                        publisher.send_modify(|s| s.record(count));
                    }
                    Err(e) if e.is_unauthorized() => {
                        warn!("Admin token rejected, stopping pending order poller");
                        break;
                    }
                    Err(e) => {
                        warn!(error = %e, "Failed to fetch pending order count");
                    }
                }
            }
        });

        Self { state, handle }
    }

    /// Latest published state.
    #[must_use]
    pub fn current(&self) -> PendingOrders {
        *self.state.borrow()
    }

    /// Watch the badge state.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<PendingOrders> {
        self.state.subscribe()
    }

    /// The admin looked at the orders list.
    pub fn mark_viewed(&self) {
        self.state.send_modify(PendingOrders::mark_viewed);
    }

    /// Record a navigation; opening the orders list marks the count viewed.
    pub fn on_navigate(&self, path: &str) {
        if path
            .strip_prefix(ORDERS_ROUTE)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
        {
            self.mark_viewed();
        }
    }

    /// Whether the polling task is still alive.
    #[must_use]
    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    /// Stop polling.
    pub fn stop(&self) {
        self.handle.abort();
    }
}

impl Drop for PendingOrderPoller {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use super::*;

    const INTERVAL: Duration = Duration::from_secs(30);

    enum Reply {
        Count(u64),
        Unauthorized,
        Unavailable,
    }

    #[derive(Default)]
    struct FakeSource {
        replies: Mutex<VecDeque<Reply>>,
        calls: AtomicUsize,
    }

    impl FakeSource {
        fn scripted(replies: impl IntoIterator<Item = Reply>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into_iter().collect()),
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl PendingOrderSource for Arc<FakeSource> {
        async fn pending_count(&self) -> Result<u64, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.replies.lock().unwrap().pop_front() {
                Some(Reply::Count(n)) => Ok(n),
                Some(Reply::Unauthorized) => Err(ApiError::Status {
                    status: 401,
                    message: "Token expired".to_string(),
                }),
                Some(Reply::Unavailable) | None => Err(ApiError::Status {
                    status: 503,
                    message: "Service Unavailable".to_string(),
                }),
            }
        }
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_poll_is_immediate() {
        let source = FakeSource::scripted([Reply::Count(4)]);
        let poller = PendingOrderPoller::spawn(source.clone(), INTERVAL);
        settle().await;

        assert_eq!(source.calls(), 1);
        assert_eq!(poller.current().badge(), Some(4));
    }

    #[tokio::test(start_paused = true)]
    async fn test_polls_on_interval() {
        let source = FakeSource::scripted([Reply::Count(1), Reply::Count(2), Reply::Count(3)]);
        let poller = PendingOrderPoller::spawn(source.clone(), INTERVAL);
        settle().await;

        tokio::time::sleep(INTERVAL).await;
        assert_eq!(source.calls(), 2);
        tokio::time::sleep(INTERVAL).await;
        assert_eq!(source.calls(), 3);
        assert_eq!(poller.current().count, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_viewed_hides_badge_until_count_rises() {
        let source = FakeSource::scripted([Reply::Count(2), Reply::Count(2), Reply::Count(1), Reply::Count(3)]);
        let poller = PendingOrderPoller::spawn(source.clone(), INTERVAL);
        settle().await;

        poller.on_navigate("/admin/orders");
        assert!(poller.current().viewed);
        assert_eq!(poller.current().badge(), None);

        tokio::time::sleep(INTERVAL).await;
        assert_eq!(poller.current().badge(), None);

        tokio::time::sleep(INTERVAL).await;
        assert_eq!(poller.current().count, 1);
        assert_eq!(poller.current().badge(), None);

        tokio::time::sleep(INTERVAL).await;
        assert!(!poller.current().viewed);
        assert_eq!(poller.current().badge(), Some(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_other_routes_do_not_mark_viewed() {
        let source = FakeSource::scripted([Reply::Count(2)]);
        let poller = PendingOrderPoller::spawn(source, INTERVAL);
        settle().await;

        poller.on_navigate("/admin/ordersx");
        poller.on_navigate("/admin/inventory");
        assert_eq!(poller.current().badge(), Some(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_errors_keep_polling() {
        let source = FakeSource::scripted([Reply::Unavailable, Reply::Count(5)]);
        let poller = PendingOrderPoller::spawn(source.clone(), INTERVAL);
        settle().await;
        assert_eq!(poller.current().count, 0);

        tokio::time::sleep(INTERVAL).await;
        assert!(poller.is_running());
        assert_eq!(poller.current().count, 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unauthorized_stops_polling() {
        let source = FakeSource::scripted([Reply::Unauthorized, Reply::Count(1)]);
        let poller = PendingOrderPoller::spawn(source.clone(), INTERVAL);
        settle().await;

        tokio::time::sleep(INTERVAL * 3).await;
        assert_eq!(source.calls(), 1);
        assert!(!poller.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_and_drop_abort_task() {
        let source = FakeSource::scripted([Reply::Count(1), Reply::Count(1)]);
        let poller = PendingOrderPoller::spawn(source.clone(), INTERVAL);
        settle().await;
        poller.stop();
        tokio::time::sleep(INTERVAL * 2).await;
        assert_eq!(source.calls(), 1);

        let other = FakeSource::scripted([Reply::Count(1), Reply::Count(1)]);
        drop(PendingOrderPoller::spawn(other.clone(), INTERVAL));
        tokio::time::sleep(INTERVAL * 2).await;
        assert_eq!(other.calls(), 0);
    }
}
