use std::ops::Deref;

const NO_TRACK: &str = "/org/mpris/MediaPlayer2/TrackList/NoTrack";
const SPOTIFY_PREFIX: &str = "spotify";

/// An MPRIS track id, as announced in `mpris:trackid`.
///
/// Empty ids and the special `NoTrack` path are not track ids.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct TrackId(String);

impl TrackId {
    /// Spotify uses `spotify:track:<id>` style ids, which is how its signals are told apart from
    /// other players on the bus.
    pub fn is_spotify(&self) -> bool {
        self.0.starts_with(SPOTIFY_PREFIX)
    }
}

impl TryFrom<&str> for TrackId {
    type Error = ();

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        if value.is_empty() || value == NO_TRACK {
            Err(())
        } else {
            Ok(TrackId(value.to_owned()))
        }
    }
}

impl Deref for TrackId {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
