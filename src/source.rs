use crate::error::ApiError;

/// The item reported as currently playing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Track {
    /// Opaque key used to detect track changes.
    pub item_id: String,
    pub song_name: String,
    pub album_name: String,
    pub artist_name: String,
    pub album_art_url: Option<String>,
    pub is_playing: bool,
}

/// Where the refresh loop gets its data from.
///
/// Both calls block. Errors are treated as "no data this cycle".
pub trait NowPlayingSource {
    /// `Ok(None)` when the player reports nothing at all.
    fn currently_playing(&mut self) -> Result<Option<Track>, ApiError>;

    /// Raw bytes of the image at `url`.
    fn fetch_artwork(&mut self, url: &str) -> Result<Vec<u8>, ApiError>;
}
