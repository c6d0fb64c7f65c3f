use dioxus::prelude::*;

#[allow(non_snake_case)]
#[component]
pub fn StatsPanel() -> Element {
    // rendered fragment for the #stats container
    let content = use_signal(String::new);
    let alert_hidden = use_signal(|| true);

    #[cfg(feature = "web")]
    {
        use crate::api::HttpStatsSource;
        use crate::poller::{StatsPoller, REFRESH_INTERVAL_MS};
        use dioxus::logger::tracing::error;
        use gloo_timers::future::IntervalStream;

        use_future(move || async move {
            let source = match HttpStatsSource::from_page_origin() {
                Ok(source) => source,
                Err(e) => {
                    error!("[stats_panel] cannot resolve stats endpoint: {e:#}");
                    return;
                }
            };
            let view = SignalView {
                content,
                alert_hidden,
            };
            StatsPoller::new(source, view)
                .run(IntervalStream::new(REFRESH_INTERVAL_MS))
                .await;
        });
    }

    let alert_class = if alert_hidden() { "alert hide" } else { "alert" };

    rsx! {
        div { id: "alert", class: "{alert_class}", role: "alert",
            "Stats are temporarily unavailable. Showing the last known values."
        }
        div { id: "stats", dangerous_inner_html: "{content}" }
    }
}

#[cfg(feature = "web")]
struct SignalView {
    content: Signal<String>,
    alert_hidden: Signal<bool>,
}

#[cfg(feature = "web")]
impl crate::poller::StatsView for SignalView {
    fn set_alert_visible(&mut self, visible: bool) {
        self.alert_hidden.set(!visible);
    }

    fn replace_content(&mut self, html: String) -> anyhow::Result<()> {
        self.content.set(html);
        Ok(())
    }
}
