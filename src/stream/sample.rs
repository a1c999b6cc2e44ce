//! Per-kind sampling of record streams

use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use futures::Stream;
use pin_project_lite::pin_project;
use tokio::time::{Interval, MissedTickBehavior, interval};

use super::RecordEvent;
use crate::types::{RecordKind, Stream as RecordStreamKind};

/// Extension trait adding [`sample_every`](SampleExt::sample_every) to record streams.
pub trait SampleExt: Stream<Item = RecordEvent> {
    /// Emit at most one event per (record kind, stream) each `period`.
    ///
    /// Latest-wins: events arriving within a period replace earlier ones of the same
    /// kind and stream. When the inner stream ends, pending events are flushed.
    fn sample_every(self, period: Duration) -> SampleEvery<Self>
    where
        Self: Sized,
    {
        SampleEvery::new(self, period)
    }
}

impl<T: Stream<Item = RecordEvent>> SampleExt for T {}

pin_project! {
    /// Stream returned by [`SampleExt::sample_every`].
    pub struct SampleEvery<S> {
        #[pin]
        stream: S,
        interval: Interval,
        latest: Vec<((RecordKind, RecordStreamKind), RecordEvent)>,
        ready: VecDeque<RecordEvent>,
        finished: bool,
    }
}

impl<S: Stream<Item = RecordEvent>> SampleEvery<S> {
    /// Must be called within a tokio runtime.
    pub fn new(stream: S, period: Duration) -> Self {
        let mut interval = interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self { stream, interval, latest: Vec::new(), ready: VecDeque::new(), finished: false }
    }
}

impl<S: Stream<Item = RecordEvent>> Stream for SampleEvery<S> {
    type Item = RecordEvent;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();

        loop {
            if let Some(event) = this.ready.pop_front() {
                return Poll::Ready(Some(event));
            }
            if *this.finished {
                return Poll::Ready(None);
            }

            while !*this.finished {
                match this.stream.as_mut().poll_next(cx) {
                    Poll::Ready(Some(event)) => {
                        let key = (event.record.kind(), event.stream);
                        match this.latest.iter_mut().find(|(k, _)| *k == key) {
                            Some(slot) => slot.1 = event,
                            None => this.latest.push((key, event)),
                        }
                    }
                    Poll::Ready(None) => *this.finished = true,
                    Poll::Pending => break,
                }
            }

            if *this.finished {
                this.ready.extend(this.latest.drain(..).map(|(_, event)| event));
                continue;
            }

            match this.interval.poll_tick(cx) {
                Poll::Ready(_) => {
                    this.ready.extend(this.latest.drain(..).map(|(_, event)| event));
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}
