use std::sync::Arc;

use clap::Parser;
use mapmark::{
  EditorState,
  config::Config,
  store::{DocumentStore, HttpStore, MemoryStore},
  ui::MapApp,
};

#[derive(Parser)]
#[command(author, version, about)]
struct Args {
  /// Run with an in-memory document store instead of the configured remote.
  #[arg(long)]
  offline: bool,
}

fn main() -> eframe::Result {
  env_logger::init();
  let args = Args::parse();

  // Tokio runtime for the store traffic.
  let rt = tokio::runtime::Runtime::new().expect("tokio runtime");
  let _enter = rt.enter();

  let config = Config::new();
  if config.map_token.is_none() {
    log::debug!("No map provider token configured");
  }
  let client: Arc<dyn DocumentStore> = match (&config.store_url, args.offline) {
    (Some(url), false) => Arc::new(HttpStore::new(url)),
    _ => {
      log::info!("No store configured or --offline given, using in-memory store");
      Arc::new(MemoryStore::new())
    }
  };

  let options = eframe::NativeOptions {
    viewport: egui::ViewportBuilder {
      inner_size: Some(egui::vec2(1280.0, 900.0)),
      ..Default::default()
    },
    ..Default::default()
  };

  eframe::run_native(
    "mapmark",
    options,
    Box::new(move |cc| {
      egui_extras::install_image_loaders(&cc.egui_ctx);
      let state = EditorState::new(client);
      Ok(Box::new(MapApp::new(state, config)))
    }),
  )
}
