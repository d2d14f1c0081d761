use std::sync::mpsc;

use nowplaying_epd::{
    AppError, Config, DisplayController, FontStorage, ImageFileDriver, NowPlaying,
    NowPlayingScreen, SpotifyClient,
};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .init();

    log::info!("Starting now-playing display");

    if let Err(e) = run() {
        log::error!("{e}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), AppError> {
    let config = Config::load()?;
    log::debug!("{config:?}");

    let (shutdown_tx, shutdown_rx) = mpsc::channel();
    ctrlc::set_handler(move || {
        // The loop may already be gone.
        let _ = shutdown_tx.send(());
    })?;

    let driver = ImageFileDriver::new(
        config.display.native_size(),
        config.display.output_path.clone(),
    );
    let display = DisplayController::new(driver, config.display.orientation())?;

    let mut storage = FontStorage::new();
    let screen = NowPlayingScreen::load(
        &mut storage,
        config.layout.clone(),
        &config.assets_dir,
        [display.width(), display.height()],
    )?;

    let source = SpotifyClient::new(config.spotify.clone());
    let mut app = NowPlaying::new(source, screen, display, config.display.refresh);

    app.run(config.poll_interval(), &shutdown_rx)?;
    app.close()?;
    Ok(())
}
