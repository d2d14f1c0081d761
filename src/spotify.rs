//! Blocking client for the Spotify Web API.

use std::{
    io::Read,
    time::{Duration, Instant},
};

use serde::Deserialize;

use crate::{
    config::SpotifyConfig,
    error::ApiError,
    source::{NowPlayingSource, Track},
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
/// Largest artwork download accepted.
const ARTWORK_LIMIT: u64 = 8 * 1024 * 1024;
/// Tokens are renewed this long before they expire.
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

#[derive(Deserialize)]
struct CurrentlyPlaying {
    #[serde(default)]
    is_playing: bool,
    item: Option<Item>,
}

#[derive(Deserialize)]
struct Item {
    name: String,
    id: Option<String>,
    uri: Option<String>,
    album: Album,
    #[serde(default)]
    artists: Vec<Artist>,
}

#[derive(Deserialize)]
struct Album {
    name: String,
    #[serde(default)]
    images: Vec<Image>,
}

#[derive(Deserialize)]
struct Artist {
    name: String,
}

#[derive(Deserialize)]
struct Image {
    url: String,
}

struct AccessToken {
    value: String,
    expires_at: Option<Instant>,
}

impl AccessToken {
    fn is_fresh(&self) -> bool {
        self.expires_at
            .is_some_and(|at| Instant::now() + EXPIRY_MARGIN < at)
    }
}

pub struct SpotifyClient {
    agent: ureq::Agent,
    config: SpotifyConfig,
    token: Option<AccessToken>,
}

impl SpotifyClient {
    pub fn new(config: SpotifyConfig) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(REQUEST_TIMEOUT).build();
        log::info!("Initialized Spotify client.");
        Self {
            agent,
            config,
            token: None,
        }
    }

    /// Exchanges the refresh token for a new access token.
    pub fn refresh_access_token(&mut self) -> Result<&str, ApiError> {
        log::info!("Refreshing Spotify access token.");
        let url = self.config.token_url.as_str();
        let response = self
            .agent
            .post(url)
            .send_form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", self.config.refresh_token.as_str()),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
            ])
            .map_err(|e| ApiError::request(url, e))?;

        let body: TokenResponse = response
            .into_json()
            .map_err(|e| ApiError::decode(url, e))?;

        let token = self.token.insert(AccessToken {
            value: body.access_token,
            expires_at: body
                .expires_in
                .map(|secs| Instant::now() + Duration::from_secs(secs)),
        });
        Ok(&token.value)
    }

    fn access_token(&mut self) -> Result<String, ApiError> {
        if let Some(token) = self.token.as_ref().filter(|token| token.is_fresh()) {
            return Ok(token.value.clone());
        }
        self.refresh_access_token().map(str::to_string)
    }
}

impl NowPlayingSource for SpotifyClient {
    fn currently_playing(&mut self) -> Result<Option<Track>, ApiError> {
        let token = self.access_token()?;
        let url = self.config.currently_playing_url.as_str();
        let result = self
            .agent
            .get(url)
            .set("Accept", "application/json")
            .set("Authorization", &format!("Bearer {token}"))
            .call();

        let response = match result {
            Ok(response) => response,
            Err(ureq::Error::Status(401, response)) => {
                // Revoked early; the next poll fetches a new one.
                self.token = None;
                return Err(ApiError::request(url, ureq::Error::Status(401, response)));
            }
            Err(e) => return Err(ApiError::request(url, e)),
        };

        if response.status() == 204 {
            log::info!("No content returned from Spotify API.");
            return Ok(None);
        }

        let body = response
            .into_string()
            .map_err(|e| ApiError::decode(url, e))?;
        parse_currently_playing(&body).map_err(|e| ApiError::decode(url, e))
    }

    fn fetch_artwork(&mut self, url: &str) -> Result<Vec<u8>, ApiError> {
        let response = self
            .agent
            .get(url)
            .call()
            .map_err(|e| ApiError::request(url, e))?;

        let mut bytes = Vec::new();
        response
            .into_reader()
            .take(ARTWORK_LIMIT)
            .read_to_end(&mut bytes)
            .map_err(|e| ApiError::decode(url, e))?;
        log::debug!("Downloaded {} bytes of artwork from {url}", bytes.len());
        Ok(bytes)
    }
}

/// Decodes a currently-playing response body.
///
/// A missing `item` (an ad, or a private session) reads as nothing playing.
pub fn parse_currently_playing(body: &str) -> Result<Option<Track>, serde_json::Error> {
    let response: CurrentlyPlaying = serde_json::from_str(body)?;
    let Some(item) = response.item else {
        return Ok(None);
    };

    let Some(item_id) = item.id.or(item.uri) else {
        log::warn!("Track \"{}\" has neither id nor uri.", item.name);
        return Ok(None);
    };

    // The medium image is second; some items only carry one.
    let images = item.album.images;
    let album_art_url = images
        .get(1)
        .or_else(|| images.first())
        .map(|image| image.url.clone());

    let artist_name = item
        .artists
        .into_iter()
        .next()
        .map(|artist| artist.name)
        .unwrap_or_default();

    Ok(Some(Track {
        item_id,
        song_name: item.name,
        album_name: item.album.name,
        artist_name,
        album_art_url,
        is_playing: response.is_playing,
    }))
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use super::*;

    const PLAYING: &str = r#"{
        "timestamp": 1700000000000,
        "progress_ms": 44272,
        "is_playing": true,
        "currently_playing_type": "track",
        "item": {
            "id": "6mFkJmJqdDVQ1REhVfGgd1",
            "uri": "spotify:track:6mFkJmJqdDVQ1REhVfGgd1",
            "name": "Wish You Were Here",
            "duration_ms": 334743,
            "album": {
                "name": "Wish You Were Here",
                "images": [
                    {"url": "https://i.scdn.co/image/large", "height": 640, "width": 640},
                    {"url": "https://i.scdn.co/image/medium", "height": 300, "width": 300},
                    {"url": "https://i.scdn.co/image/small", "height": 64, "width": 64}
                ]
            },
            "artists": [
                {"name": "Pink Floyd", "id": "0k17h0D3J5VfsdmQ1iZtE9"},
                {"name": "Someone Else"}
            ]
        }
    }"#;

    #[test]
    fn playing_track_is_decoded() {
        let track = parse_currently_playing(PLAYING).unwrap().unwrap();
        assert_eq!(
            track,
            Track {
                item_id: "6mFkJmJqdDVQ1REhVfGgd1".into(),
                song_name: "Wish You Were Here".into(),
                album_name: "Wish You Were Here".into(),
                artist_name: "Pink Floyd".into(),
                album_art_url: Some("https://i.scdn.co/image/medium".into()),
                is_playing: true,
            }
        );
    }

    #[test]
    fn paused_track_keeps_its_state() {
        let body = PLAYING.replace(r#""is_playing": true"#, r#""is_playing": false"#);
        let track = parse_currently_playing(&body).unwrap().unwrap();
        assert!(!track.is_playing);
    }

    #[test]
    fn null_item_is_nothing_playing() {
        let body = r#"{"is_playing": true, "currently_playing_type": "ad", "item": null}"#;
        assert_eq!(parse_currently_playing(body).unwrap(), None);
    }

    #[test]
    fn local_file_falls_back_to_uri_and_single_image() {
        let body = r#"{
            "is_playing": true,
            "item": {
                "id": null,
                "uri": "spotify:local:Artist:Album:Song:180",
                "name": "Song",
                "album": {"name": "Album", "images": [{"url": "https://img/only"}]},
                "artists": [{"name": "Artist"}]
            }
        }"#;
        let track = parse_currently_playing(body).unwrap().unwrap();
        assert_eq!(track.item_id, "spotify:local:Artist:Album:Song:180");
        assert_eq!(track.album_art_url.as_deref(), Some("https://img/only"));
    }

    #[test]
    fn missing_images_and_artists_are_tolerated() {
        let body = r#"{
            "is_playing": true,
            "item": {"id": "x", "name": "Song", "album": {"name": "Album"}}
        }"#;
        let track = parse_currently_playing(body).unwrap().unwrap();
        assert_eq!(track.album_art_url, None);
        assert_eq!(track.artist_name, "");
    }

    #[test]
    fn malformed_body_is_an_error() {
        assert!(parse_currently_playing("<html>").is_err());
        assert!(parse_currently_playing(r#"{"item": {"id": "x"}}"#).is_err());
    }
}
