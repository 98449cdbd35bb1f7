//! Latest-wins rate limiting for snapshot streams

use futures::Stream;
use pin_project_lite::pin_project;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::time::{Interval, MissedTickBehavior, interval};

/// Adds [`throttle`](ThrottleExt::throttle) to any stream.
pub trait ThrottleExt: Stream {
    /// Emit at most one item per `period`. Items arriving in between replace the
    /// pending one, so subscribers always see the newest snapshot.
    fn throttle(self, period: Duration) -> Throttle<Self>
    where
        Self: Sized,
    {
        Throttle::new(self, period)
    }
}

impl<T: Stream> ThrottleExt for T {}

pin_project! {
    pub struct Throttle<S: Stream> {
        #[pin]
        stream: S,
        interval: Interval,
        pending: Option<S::Item>,
        finished: bool,
    }
}

impl<S: Stream> Throttle<S> {
    pub fn new(stream: S, period: Duration) -> Self {
        let mut interval = interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        Self { stream, interval, pending: None, finished: false }
    }
}

impl<S: Stream> Stream for Throttle<S> {
    type Item = S::Item;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();

        while !*this.finished {
            match this.stream.as_mut().poll_next(cx) {
                Poll::Ready(Some(item)) => *this.pending = Some(item),
                Poll::Ready(None) => *this.finished = true,
                Poll::Pending => break,
            }
        }

        if this.pending.is_none() {
            return if *this.finished { Poll::Ready(None) } else { Poll::Pending };
        }

        // Flush the last item without waiting once the inner stream is done
        if *this.finished {
            return Poll::Ready(this.pending.take());
        }

        match this.interval.poll_tick(cx) {
            Poll::Ready(_) => Poll::Ready(this.pending.take()),
            Poll::Pending => Poll::Pending,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use tokio::sync::mpsc;
    use tokio_stream::wrappers::UnboundedReceiverStream;

    #[tokio::test(start_paused = true)]
    async fn keeps_only_the_latest_item_per_period() {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut throttled = UnboundedReceiverStream::new(rx).throttle(Duration::from_millis(100));

        tx.send(1).unwrap();
        assert_eq!(throttled.next().await, Some(1));

        for tick in 2..=5 {
            tx.send(tick).unwrap();
        }
        assert_eq!(throttled.next().await, Some(5));

        tx.send(6).unwrap();
        drop(tx);
        assert_eq!(throttled.next().await, Some(6));
        assert_eq!(throttled.next().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn idle_source_does_not_end_the_stream() {
        let (tx, rx) = mpsc::unbounded_channel::<u32>();
        let mut throttled = UnboundedReceiverStream::new(rx).throttle(Duration::from_millis(10));

        let waited =
            tokio::time::timeout(Duration::from_millis(50), throttled.next()).await;
        assert!(waited.is_err());

        tx.send(7).unwrap();
        assert_eq!(throttled.next().await, Some(7));
    }
}
