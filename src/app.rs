//! The polling loop tying source, screen and panel together.

use std::{
    sync::mpsc::{Receiver, RecvTimeoutError},
    time::Duration,
};

use image::GrayImage;

use crate::{
    artwork,
    display::{DisplayController, EpdDriver, RefreshMode},
    error::{ArtworkError, HardwareError},
    screen::TrackView,
    source::{NowPlayingSource, Track},
};

/// What the loop remembers between polls.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LoopState {
    /// Id of the track currently on the panel.
    pub last_item_id: Option<String>,
}

/// What a single poll did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PollOutcome {
    /// Nothing playing, or the source could not be reached.
    Idle,
    /// The track on the panel is still playing.
    Unchanged,
    /// A new track was drawn and sent to the panel.
    Updated,
    /// A new track was seen but its artwork failed; retried next poll.
    Skipped,
}

pub struct NowPlaying<S, V, D: EpdDriver> {
    source: S,
    view: V,
    display: DisplayController<D>,
    refresh: RefreshMode,
    state: LoopState,
}

impl<S, V, D> NowPlaying<S, V, D>
where
    S: NowPlayingSource,
    V: TrackView,
    D: EpdDriver,
{
    pub fn new(source: S, view: V, display: DisplayController<D>, refresh: RefreshMode) -> Self {
        Self {
            source,
            view,
            display,
            refresh,
            state: LoopState::default(),
        }
    }

    pub fn state(&self) -> &LoopState {
        &self.state
    }

    pub fn display(&self) -> &DisplayController<D> {
        &self.display
    }

    /// Puts the panel to sleep and releases it.
    pub fn close(self) -> Result<(), HardwareError> {
        self.display.close()
    }

    /// Asks the source once and updates the panel if the track changed.
    ///
    /// Only hardware failures are returned; everything else is logged and
    /// reflected in the outcome.
    pub fn poll_once(&mut self) -> Result<PollOutcome, HardwareError> {
        let track = match self.source.currently_playing() {
            Ok(track) => track,
            Err(e) => {
                log::error!("Could not get the current track: {e}");
                return Ok(PollOutcome::Idle);
            }
        };

        let Some(track) = track.filter(|track| track.is_playing) else {
            log::info!("Nothing is playing.");
            return Ok(PollOutcome::Idle);
        };

        if self.state.last_item_id.as_deref() == Some(track.item_id.as_str()) {
            log::info!("Same track is still playing, no update needed.");
            return Ok(PollOutcome::Unchanged);
        }

        log::info!(
            "New track detected: \"{}\" by \"{}\"",
            track.song_name,
            track.artist_name
        );

        let artwork = match self.artwork(&track) {
            Ok(artwork) => artwork,
            Err(e) => {
                log::error!("Skipping update for \"{}\": {e}", track.song_name);
                return Ok(PollOutcome::Skipped);
            }
        };

        let frame = self.view.compose(&track, artwork.as_ref());
        self.display.display(frame, self.refresh)?;
        self.state.last_item_id = Some(track.item_id);
        Ok(PollOutcome::Updated)
    }

    /// Polls every `interval` until `shutdown` receives a message or its
    /// sender is dropped.
    pub fn run(&mut self, interval: Duration, shutdown: &Receiver<()>) -> Result<(), HardwareError> {
        log::info!("Polling every {}s.", interval.as_secs_f32());
        loop {
            self.poll_once()?;

            match shutdown.recv_timeout(interval) {
                Err(RecvTimeoutError::Timeout) => continue,
                Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                    log::warn!("Received interrupt. Quitting...");
                    return Ok(());
                }
            }
        }
    }

    fn artwork(&mut self, track: &Track) -> Result<Option<GrayImage>, ArtworkError> {
        let Some(url) = track.album_art_url.as_deref() else {
            log::info!("\"{}\" has no album art.", track.song_name);
            return Ok(None);
        };

        let bytes = self.source.fetch_artwork(url)?;
        artwork::prepare(&bytes, self.view.artwork_bounds()).map(Some)
    }
}
