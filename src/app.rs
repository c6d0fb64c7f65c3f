use dioxus::prelude::*;

use crate::components::StatsPanel;
use crate::MAIN_CSS;

#[allow(non_snake_case)]
#[component]
pub fn App() -> Element {
    rsx! {
        document::Stylesheet { href: MAIN_CSS }
        document::Meta { name: "theme-color", content: "#020618" } // slate-950
        document::Meta { name: "color-scheme", content: "dark" }
        document::Title { "Pool stats" }
        div { class: "container",
            StatsPanel {}
        }
    }
}
