mod app;
mod console;

use anyhow::Result;

use app::{App, AppConfig};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match std::env::args().nth(1) {
        Some(path) => AppConfig::load(std::path::Path::new(&path))?,
        None => AppConfig::default(),
    };

    let app = App::new(config)?;
    app.run()
}
