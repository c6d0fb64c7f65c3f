use dioxus::prelude::*;

mod app;
mod components;
mod poller;
mod shared;
mod utils;

#[cfg(any(feature = "web", feature = "server"))]
mod api;

#[cfg(feature = "server")]
mod backend;

pub const MAIN_CSS: Asset = asset!("/assets/main.css");

fn main() {
    #[cfg(feature = "server")]
    {
        backend::init_tracing();

        let mut args = std::env::args();
        let _bin = args.next();
        if let Some(cmd) = args.next() {
            if cmd == "watch" {
                // Poll a remote /stats endpoint and keep a rendered fragment on disk
                let cfg = match backend::WatchConfig::from_env() {
                    Ok(cfg) => cfg,
                    Err(e) => {
                        eprintln!("[watch] {e:#}");
                        std::process::exit(2);
                    }
                };
                let rt = tokio::runtime::Runtime::new().expect("rt");
                rt.block_on(async move {
                    if let Err(e) = backend::watch::run_watch(cfg).await {
                        eprintln!("[watch] {e:#}");
                        std::process::exit(1);
                    }
                });
                return;
            }
            if cmd == "render" {
                // Render a saved payload once and print the fragment
                let Some(path) = args.next() else {
                    eprintln!("usage: render <stats.json>");
                    std::process::exit(2);
                };
                match backend::watch::render_file(std::path::Path::new(&path)) {
                    Ok(html) => println!("{html}"),
                    Err(e) => {
                        eprintln!("[render] {e:#}");
                        std::process::exit(1);
                    }
                }
                return;
            }
        }
    }
    dioxus::launch(app::App);
}
