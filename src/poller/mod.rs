//! Fetch, transform and render loop behind the stats panel.
//!
//! A [`StatsPoller`] refreshes once immediately and then once per tick. Ticks
//! are never held back by a slow fetch: fetches overlap and complete in any
//! order. Every fetch is tagged with a sequence number when it is issued and
//! a completion older than the last applied one is dropped, so a slow
//! response can't overwrite a newer render.

pub mod template;
pub mod transform;

use std::pin::pin;

use anyhow::Result;
use dioxus::logger::tracing::{debug, info, warn};
use futures::stream::{FuturesUnordered, Stream, StreamExt};

use crate::shared::types::StatsPayload;

pub const REFRESH_INTERVAL_MS: u32 = 5_000;

#[allow(async_fn_in_trait)]
pub trait StatsSource {
    /// Any transport, status or decode failure is an error.
    async fn fetch(&self) -> Result<StatsPayload>;
}

/// The display container and the alert element.
pub trait StatsView {
    fn set_alert_visible(&mut self, visible: bool);
    /// An error here fails the refresh like a fetch error would.
    fn replace_content(&mut self, html: String) -> Result<()>;
}

#[derive(Debug)]
pub enum RefreshOutcome {
    Rendered { seq: u64 },
    Failed { seq: u64, error: anyhow::Error },
    /// A newer refresh was applied first; nothing was touched.
    Superseded { seq: u64 },
}

impl RefreshOutcome {
    pub fn seq(&self) -> u64 {
        match self {
            RefreshOutcome::Rendered { seq }
            | RefreshOutcome::Failed { seq, .. }
            | RefreshOutcome::Superseded { seq } => *seq,
        }
    }
}

/// View plus the sequence bookkeeping; everything a completion touches.
pub struct RenderState<V> {
    view: V,
    issued: u64,
    last_applied: u64,
}

impl<V: StatsView> RenderState<V> {
    pub fn new(view: V) -> Self {
        Self {
            view,
            issued: 0,
            last_applied: 0,
        }
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    /// Tags a new refresh. Sequence numbers start at 1.
    pub fn issue(&mut self) -> u64 {
        self.issued += 1;
        self.issued
    }

    pub fn apply(&mut self, seq: u64, fetched: Result<StatsPayload>) -> RefreshOutcome {
        if seq < self.last_applied {
            debug!(
                "[poller] dropping refresh #{} (already applied #{})",
                seq, self.last_applied
            );
            return RefreshOutcome::Superseded { seq };
        }
        self.last_applied = seq;

        let shown = fetched
            .and_then(|stats| template::render(&transform::prepare(stats)))
            .and_then(|html| self.view.replace_content(html));
        match shown {
            Ok(()) => {
                self.view.set_alert_visible(false);
                RefreshOutcome::Rendered { seq }
            }
            Err(error) => {
                warn!("[poller] refresh #{} failed: {:#}", seq, error);
                self.view.set_alert_visible(true);
                RefreshOutcome::Failed { seq, error }
            }
        }
    }
}

pub struct StatsPoller<S, V> {
    source: S,
    state: RenderState<V>,
}

impl<S: StatsSource, V: StatsView> StatsPoller<S, V> {
    pub fn new(source: S, view: V) -> Self {
        Self {
            source,
            state: RenderState::new(view),
        }
    }

    pub fn view(&self) -> &V {
        self.state.view()
    }

    /// One complete cycle: fetch, then apply.
    pub async fn refresh(&mut self) -> RefreshOutcome {
        let seq = self.state.issue();
        let fetched = self.source.fetch().await;
        self.state.apply(seq, fetched)
    }

    /// Refreshes now and on every tick. Returns once `ticks` has ended and
    /// every in-flight fetch has completed; with an endless tick stream it
    /// never returns.
    pub async fn run<T>(self, ticks: T) -> RenderState<V>
    where
        T: Stream<Item = ()>,
    {
        let Self { source, mut state } = self;
        let source = &source;
        let mut ticks = pin!(ticks.fuse());
        let mut in_flight = FuturesUnordered::new();

        info!("[poller] started");
        in_flight.push(fetch_tagged(source, state.issue()));
        loop {
            futures::select! {
                tick = ticks.next() => {
                    if tick.is_some() {
                        in_flight.push(fetch_tagged(source, state.issue()));
                    }
                }
                (seq, fetched) = in_flight.select_next_some() => {
                    state.apply(seq, fetched);
                }
                complete => break,
            }
        }
        info!("[poller] stopped after {} refresh(es)", state.issued);
        state
    }
}

async fn fetch_tagged<S: StatsSource>(source: &S, seq: u64) -> (u64, Result<StatsPayload>) {
    (seq, source.fetch().await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use futures::channel::{mpsc, oneshot};
    use futures::executor::block_on;
    use serde_json::json;
    use std::cell::RefCell;
    use std::collections::VecDeque;

    #[derive(Default)]
    struct ScriptedSource {
        replies: RefCell<VecDeque<Result<StatsPayload>>>,
        calls: RefCell<usize>,
    }

    impl ScriptedSource {
        fn with(replies: Vec<Result<StatsPayload>>) -> Self {
            Self {
                replies: RefCell::new(replies.into()),
                calls: RefCell::new(0),
            }
        }
    }

    impl StatsSource for ScriptedSource {
        async fn fetch(&self) -> Result<StatsPayload> {
            *self.calls.borrow_mut() += 1;
            self.replies
                .borrow_mut()
                .pop_front()
                .unwrap_or_else(|| Err(anyhow!("no scripted reply")))
        }
    }

    #[derive(Debug, Default)]
    struct RecordingView {
        alert_visible: bool,
        content: String,
        writes: usize,
        reject: bool,
    }

    impl StatsView for RecordingView {
        fn set_alert_visible(&mut self, visible: bool) {
            self.alert_visible = visible;
        }

        fn replace_content(&mut self, html: String) -> Result<()> {
            if self.reject {
                return Err(anyhow!("disk full"));
            }
            self.content = html;
            self.writes += 1;
            Ok(())
        }
    }

    fn payload(value: serde_json::Value) -> StatsPayload {
        serde_json::from_value(value).unwrap()
    }

    fn expected_html(value: serde_json::Value) -> String {
        template::render(&transform::prepare(payload(value))).unwrap()
    }

    #[test]
    fn success_hides_alert_and_renders() {
        let body = json!({"height": 29999, "now": 1000, "miners": [{"name": "b"}, {"name": "a"}]});
        let source = ScriptedSource::with(vec![Ok(payload(body.clone()))]);
        let view = RecordingView {
            alert_visible: true,
            ..Default::default()
        };
        let mut poller = StatsPoller::new(source, view);

        let outcome = block_on(poller.refresh());
        assert!(matches!(outcome, RefreshOutcome::Rendered { seq: 1 }));
        assert_eq!(*poller.source.calls.borrow(), 1);
        assert!(!poller.view().alert_visible);
        assert_eq!(poller.view().content, expected_html(body));
    }

    #[test]
    fn failure_shows_alert_and_keeps_content() {
        let body = json!({"height": 1, "now": 2});
        let source = ScriptedSource::with(vec![
            Ok(payload(body.clone())),
            Err(anyhow!("connection refused")),
        ]);
        let mut poller = StatsPoller::new(source, RecordingView::default());

        block_on(poller.refresh());
        let before = poller.view().content.clone();
        let outcome = block_on(poller.refresh());

        match outcome {
            RefreshOutcome::Failed { seq, error } => {
                assert_eq!(seq, 2);
                assert!(error.to_string().contains("connection refused"));
            }
            other => panic!("expected failure, got {other:?}"),
        }
        assert!(poller.view().alert_visible);
        assert_eq!(poller.view().content, before);
        assert_eq!(poller.view().writes, 1);
    }

    #[test]
    fn recovery_after_failure_hides_alert() {
        let source = ScriptedSource::with(vec![Err(anyhow!("bad json")), Ok(payload(json!({})))]);
        let mut poller = StatsPoller::new(source, RecordingView::default());

        block_on(poller.refresh());
        assert!(poller.view().alert_visible);
        assert!(poller.view().content.is_empty());

        block_on(poller.refresh());
        assert!(!poller.view().alert_visible);
        assert_eq!(poller.view().content, expected_html(json!({})));
    }

    #[test]
    fn rejected_write_fails_refresh() {
        let source = ScriptedSource::with(vec![Ok(payload(json!({"height": 1})))]);
        let view = RecordingView {
            reject: true,
            ..Default::default()
        };
        let mut poller = StatsPoller::new(source, view);

        match block_on(poller.refresh()) {
            RefreshOutcome::Failed { seq, error } => {
                assert_eq!(seq, 1);
                assert!(error.to_string().contains("disk full"));
            }
            other => panic!("expected failure, got {other:?}"),
        }
        assert!(poller.view().alert_visible);
        assert_eq!(poller.view().writes, 0);
    }

    #[test]
    fn stale_completion_is_dropped() {
        let mut state = RenderState::new(RecordingView::default());
        let older = state.issue();
        let newer = state.issue();

        let outcome = state.apply(newer, Ok(payload(json!({"height": 2}))));
        assert!(matches!(outcome, RefreshOutcome::Rendered { .. }));
        let shown = state.view().content.clone();

        let outcome = state.apply(older, Ok(payload(json!({"height": 1}))));
        assert!(matches!(outcome, RefreshOutcome::Superseded { seq } if seq == older));
        assert_eq!(state.view().content, shown);

        // a stale failure must not raise the alert either
        let outcome = state.apply(older, Err(anyhow!("timeout")));
        assert_eq!(outcome.seq(), older);
        assert!(matches!(outcome, RefreshOutcome::Superseded { .. }));
        assert!(!state.view().alert_visible);
    }

    #[test]
    fn in_order_completions_all_apply() {
        let mut state = RenderState::new(RecordingView::default());
        let first = state.issue();
        let second = state.issue();
        assert!(matches!(
            state.apply(first, Ok(payload(json!({})))),
            RefreshOutcome::Rendered { .. }
        ));
        assert!(matches!(
            state.apply(second, Err(anyhow!("503"))),
            RefreshOutcome::Failed { .. }
        ));
        assert!(state.view().alert_visible);
    }

    #[test]
    fn run_refreshes_immediately_and_per_tick() {
        let body = json!({"height": 30000, "now": 1000, "miners": [{"name": "x"}]});
        let source = ScriptedSource::with(vec![
            Ok(payload(body.clone())),
            Ok(payload(body.clone())),
            Ok(payload(body.clone())),
        ]);
        let poller = StatsPoller::new(source, RecordingView::default());

        let ticks = futures::stream::iter(vec![(), ()]);
        let state = block_on(poller.run(ticks));

        assert_eq!(state.issued, 3);
        assert!(state.view().writes >= 1);
        assert!(!state.view().alert_visible);
        assert_eq!(state.view().content, expected_html(body));
    }

    #[test]
    fn run_keeps_going_after_failures() {
        let source = ScriptedSource::with(vec![
            Err(anyhow!("down")),
            Err(anyhow!("down")),
        ]);
        let poller = StatsPoller::new(source, RecordingView::default());

        let state = block_on(poller.run(futures::stream::iter(vec![()])));
        assert_eq!(state.issued, 2);
        assert!(state.view().alert_visible);
        assert_eq!(state.view().writes, 0);
    }

    enum Reply {
        Ready(StatsPayload),
        Held(oneshot::Receiver<StatsPayload>),
    }

    /// Holds its first reply until the test releases it. Sends one tick once
    /// that held fetch is in flight, then closes the tick stream.
    struct HoldingSource {
        replies: RefCell<VecDeque<Reply>>,
        tick: RefCell<Option<mpsc::UnboundedSender<()>>>,
    }

    impl StatsSource for HoldingSource {
        async fn fetch(&self) -> Result<StatsPayload> {
            let reply = self.replies.borrow_mut().pop_front();
            match reply {
                Some(Reply::Ready(stats)) => Ok(stats),
                Some(Reply::Held(rx)) => {
                    if let Some(tick) = self.tick.borrow_mut().take() {
                        let _ = tick.unbounded_send(());
                    }
                    rx.await.map_err(|_| anyhow!("held reply dropped"))
                }
                None => Err(anyhow!("no scripted reply")),
            }
        }
    }

    /// Releases the held payload right after its first successful write.
    struct ReleasingView {
        inner: RecordingView,
        release: Option<(oneshot::Sender<StatsPayload>, StatsPayload)>,
    }

    impl StatsView for ReleasingView {
        fn set_alert_visible(&mut self, visible: bool) {
            self.inner.set_alert_visible(visible);
        }

        fn replace_content(&mut self, html: String) -> Result<()> {
            self.inner.replace_content(html)?;
            if let Some((tx, held)) = self.release.take() {
                let _ = tx.send(held);
            }
            Ok(())
        }
    }

    #[test]
    fn run_drops_slow_fetch_that_lands_after_newer_one() {
        let older = json!({"height": 1, "now": 1000, "miners": [{"name": "old"}]});
        let newer = json!({"height": 2, "now": 2000, "miners": [{"name": "new"}]});
        let (release, held) = oneshot::channel();
        let (tick, ticks) = mpsc::unbounded();

        let source = HoldingSource {
            replies: RefCell::new(
                vec![Reply::Held(held), Reply::Ready(payload(newer.clone()))].into(),
            ),
            tick: RefCell::new(Some(tick)),
        };
        let view = ReleasingView {
            inner: RecordingView::default(),
            release: Some((release, payload(older))),
        };

        let state = block_on(StatsPoller::new(source, view).run(ticks));

        assert_eq!(state.issued, 2);
        assert!(state.view().release.is_none());
        assert_eq!(state.view().inner.writes, 1);
        assert_eq!(state.view().inner.content, expected_html(newer));
        assert!(!state.view().inner.alert_visible);
    }
}
