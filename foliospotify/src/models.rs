//! Data models: Spotify Web API payloads and the normalized playback status

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Body returned by the accounts service token endpoint
///
/// Every field is optional: a rejected exchange still answers JSON, with
/// `error` / `error_description` instead of a token.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenResponse {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

/// `GET /v1/me/player/currently-playing`
#[derive(Debug, Clone, Deserialize)]
pub struct CurrentlyPlaying {
    #[serde(default)]
    pub is_playing: bool,
    pub progress_ms: Option<u64>,
    pub item: Option<Track>,
}

/// `GET /v1/me/player/recently-played`
#[derive(Debug, Clone, Deserialize)]
pub struct RecentlyPlayed {
    #[serde(default)]
    pub items: Vec<PlayHistory>,
}

/// One entry of the listening history
#[derive(Debug, Clone, Deserialize)]
pub struct PlayHistory {
    pub track: Track,
}

/// A track object, reduced to the fields the site displays
#[derive(Debug, Clone, Deserialize)]
pub struct Track {
    pub name: String,
    #[serde(default)]
    pub artists: Vec<Artist>,
    pub album: Album,
    #[serde(default)]
    pub external_urls: ExternalUrls,
    #[serde(default)]
    pub duration_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Artist {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Album {
    pub name: String,
    #[serde(default)]
    pub images: Vec<Image>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Image {
    pub url: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExternalUrls {
    #[serde(default)]
    pub spotify: String,
}

impl Track {
    /// Artist names joined with `", "`
    pub fn artist_names(&self) -> String {
        self.artists
            .iter()
            .map(|a| a.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// First album image, which Spotify orders largest first
    pub fn album_image_url(&self) -> Option<&str> {
        self.album.images.first().map(|img| img.url.as_str())
    }
}

/// What the site shows in its "now playing" widget
///
/// The track fields are flattened into the JSON object. Without a track the
/// status serializes as exactly `{ "isPlaying": false }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackStatus {
    pub is_playing: bool,
    #[serde(flatten)]
    pub track: Option<PlayingTrack>,
}

/// Track part of a [`PlaybackStatus`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlayingTrack {
    pub title: String,
    /// Artist names joined with `", "`
    pub artist: String,
    pub album: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub album_image_url: Option<String>,
    pub song_url: String,
    /// Track length in milliseconds
    #[serde(rename = "duration")]
    pub duration_ms: u64,
    /// Playback position in milliseconds
    #[serde(rename = "progress")]
    pub progress_ms: u64,
}

impl PlaybackStatus {
    /// Nothing to show
    pub fn idle() -> Self {
        Self {
            is_playing: false,
            track: None,
        }
    }

    /// Status built from the live playback payload
    ///
    /// Returns `None` when the payload has no item (private session, ad,
    /// nothing active).
    pub fn from_live(payload: CurrentlyPlaying) -> Option<Self> {
        let track = payload.item?;
        Some(Self {
            is_playing: payload.is_playing,
            track: Some(PlayingTrack::new(&track, payload.progress_ms.unwrap_or(0))),
        })
    }

    /// Status built from the most recent history entry: never playing, no progress
    pub fn from_recent(track: &Track) -> Self {
        Self {
            is_playing: false,
            track: Some(PlayingTrack::new(track, 0)),
        }
    }
}

impl PlayingTrack {
    fn new(track: &Track, progress_ms: u64) -> Self {
        Self {
            title: track.name.clone(),
            artist: track.artist_names(),
            album: track.album.name.clone(),
            album_image_url: track.album_image_url().map(str::to_string),
            song_url: track.external_urls.spotify.clone(),
            duration_ms: track.duration_ms,
            progress_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_payload() -> serde_json::Value {
        json!({
            "is_playing": true,
            "progress_ms": 50000,
            "item": {
                "name": "Song A",
                "artists": [{"name": "Artist A"}],
                "album": {"name": "Album A", "images": [{"url": "http://x/img.jpg"}]},
                "external_urls": {"spotify": "http://x/track"},
                "duration_ms": 200000
            }
        })
    }

    #[test]
    fn test_live_status_serialization() {
        let payload: CurrentlyPlaying = serde_json::from_value(sample_payload()).unwrap();
        let status = PlaybackStatus::from_live(payload).unwrap();

        assert_eq!(
            serde_json::to_value(&status).unwrap(),
            json!({
                "isPlaying": true,
                "title": "Song A",
                "artist": "Artist A",
                "album": "Album A",
                "albumImageUrl": "http://x/img.jpg",
                "songUrl": "http://x/track",
                "duration": 200000,
                "progress": 50000
            })
        );
    }

    #[test]
    fn test_missing_progress_defaults_to_zero() {
        let mut value = sample_payload();
        value["progress_ms"] = serde_json::Value::Null;
        value["is_playing"] = json!(false);

        let payload: CurrentlyPlaying = serde_json::from_value(value).unwrap();
        let status = PlaybackStatus::from_live(payload).unwrap();
        assert!(!status.is_playing);
        assert_eq!(status.track.unwrap().progress_ms, 0);
    }

    #[test]
    fn test_live_payload_without_item() {
        let payload: CurrentlyPlaying =
            serde_json::from_value(json!({"is_playing": false, "item": null})).unwrap();
        assert!(PlaybackStatus::from_live(payload).is_none());
    }

    #[test]
    fn test_idle_serializes_to_single_key() {
        assert_eq!(
            serde_json::to_value(PlaybackStatus::idle()).unwrap(),
            json!({"isPlaying": false})
        );
    }

    #[test]
    fn test_multiple_artists_and_no_image() {
        let track: Track = serde_json::from_value(json!({
            "name": "Duet",
            "artists": [{"name": "A"}, {"name": "B"}, {"name": "C"}],
            "album": {"name": "Together", "images": []},
            "external_urls": {"spotify": "http://x/duet"},
            "duration_ms": 1000
        }))
        .unwrap();

        let status = PlaybackStatus::from_recent(&track);
        assert!(!status.is_playing);
        let playing = status.track.as_ref().unwrap();
        assert_eq!(playing.artist, "A, B, C");
        assert!(playing.album_image_url.is_none());
        assert_eq!(playing.progress_ms, 0);

        let json = serde_json::to_value(&status).unwrap();
        assert!(json.get("albumImageUrl").is_none());
    }

    #[test]
    fn test_full_spotify_payloads_keep_only_displayed_fields() {
        let token: TokenResponse = serde_json::from_value(json!({
            "access_token": "at",
            "token_type": "Bearer",
            "expires_in": 3600,
            "scope": "user-read-currently-playing"
        }))
        .unwrap();
        assert_eq!(token.access_token.as_deref(), Some("at"));
        assert!(token.refresh_token.is_none());

        let recent: RecentlyPlayed = serde_json::from_value(json!({
            "items": [{
                "played_at": "2024-01-01T00:00:00Z",
                "track": {
                    "name": "Old",
                    "album": {"name": "Album", "images": [{"url": "http://x/640.jpg", "width": 640, "height": 640}]}
                }
            }]
        }))
        .unwrap();
        assert_eq!(recent.items[0].track.album_image_url(), Some("http://x/640.jpg"));
    }
}
