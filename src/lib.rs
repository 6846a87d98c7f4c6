#![warn(missing_docs)]
#![deny(
    missing_debug_implementations,
    missing_copy_implementations,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code,
    unstable_features,
    unused_import_braces,
    unused_qualifications
)]

//!
//! # spotifyctl
//!
//! `spotifyctl` controls Spotify over its MPRIS2 D-Bus interface and renders the current track
//! into a length-bounded line of text, for use in status bars like polybar.
//!
//! ## Getting started
//!
//! 1. Connect with `Spotify::new`.
//! 2. Query the `Metadata` property with `Spotify::query_metadata`.
//! 3. Pull the fields out with `extract_artist` and `extract_title`.
//! 4. Render them with `format` and a `FormatConfig`.
//!

mod format;
mod listener;
mod metadata;
mod player;
mod polybar;
mod proxies;

pub use format::{
    format, truncate, Budget, FormatConfig, FormatError, MarkerTooLong, ARTIST_TOKEN,
    DEFAULT_FORMAT, DEFAULT_TRUNCATION_MARKER, PLACEHOLDER, TITLE_TOKEN,
};
pub use listener::{Listener, ListenerError, PlayerState};
pub use metadata::{
    changed_playback_status, changed_track_id, extract_artist, extract_title, Node, TrackId,
};
pub use player::{Command, Spotify, DEFAULT_TIMEOUT};
pub use polybar::{PolybarIpc, DEFAULT_IPC_DIRECTORY};

/// A player's playback status.
///
/// See: [MPRIS2 specification about
/// `PlaybackStatus`](https://specifications.freedesktop.org/mpris-spec/latest/Player_Interface.html#Enum:Playback_Status)
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
#[allow(missing_docs)]
pub enum PlaybackStatus {
    Playing,
    Paused,
    Stopped,
}

/// `PlaybackStatus` had an invalid string value.
#[derive(thiserror::Error, Debug)]
#[error("PlaybackStatus must be one of Playing, Paused, Stopped, but was {0}")]
pub struct InvalidPlaybackStatus(String);

impl ::std::str::FromStr for PlaybackStatus {
    type Err = InvalidPlaybackStatus;

    fn from_str(string: &str) -> Result<Self, Self::Err> {
        use PlaybackStatus::*;

        match string {
            "Playing" => Ok(Playing),
            "Paused" => Ok(Paused),
            "Stopped" => Ok(Stopped),
            other => Err(InvalidPlaybackStatus(other.to_string())),
        }
    }
}

const SERVICE_UNKNOWN: &str = "org.freedesktop.DBus.Error.ServiceUnknown";
const NAME_HAS_NO_OWNER: &str = "org.freedesktop.DBus.Error.NameHasNoOwner";

/// Something went wrong when talking to Spotify over D-Bus.
#[derive(thiserror::Error, Debug)]
pub enum TransportError {
    /// Spotify does not own its bus name, so it is most likely not running.
    #[error("Spotify is not running: {0}")]
    PlayerNotRunning(String),

    /// No reply arrived in time.
    #[error("D-Bus call timed out after {} seconds", .0.as_secs())]
    Timeout(std::time::Duration),

    /// Any other D-Bus failure, including connecting to the session bus.
    #[error("D-Bus call failed: {0}")]
    DBus(String),
}

impl TransportError {
    /// Errors caused by Spotify not running are expected in a status bar and may be silenced.
    pub fn is_player_not_running(&self) -> bool {
        matches!(self, TransportError::PlayerNotRunning(_))
    }

    fn from_method_error(name: &str, message: Option<&str>) -> Self {
        let message = message.unwrap_or("No error message present").to_string();

        if name == SERVICE_UNKNOWN || name == NAME_HAS_NO_OWNER {
            TransportError::PlayerNotRunning(message)
        } else {
            TransportError::DBus(message)
        }
    }
}

impl From<zbus::Error> for TransportError {
    fn from(error: zbus::Error) -> Self {
        match error {
            zbus::Error::MethodError(ref name, ref message, _) => {
                TransportError::from_method_error(name.as_str(), message.as_deref())
            }
            zbus::Error::FDO(fdo) => TransportError::from(*fdo),
            other => TransportError::DBus(other.to_string()),
        }
    }
}

impl From<zbus::fdo::Error> for TransportError {
    fn from(error: zbus::fdo::Error) -> Self {
        match error {
            zbus::fdo::Error::ServiceUnknown(message) | zbus::fdo::Error::NameHasNoOwner(message) => {
                TransportError::PlayerNotRunning(message)
            }
            zbus::fdo::Error::ZBus(error) => TransportError::from(error),
            other => TransportError::DBus(other.to_string()),
        }
    }
}
