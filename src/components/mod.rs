pub mod stats_panel;

pub use stats_panel::StatsPanel;
