mod node;
mod track_id;

pub use self::node::Node;
pub use self::track_id::TrackId;

use crate::PlaybackStatus;

pub(crate) const TITLE_KEY: &str = "xesam:title";
pub(crate) const ARTIST_KEY: &str = "xesam:artist";
pub(crate) const TRACK_ID_KEY: &str = "mpris:trackid";
pub(crate) const METADATA_PROPERTY: &str = "Metadata";
pub(crate) const PLAYBACK_STATUS_PROPERTY: &str = "PlaybackStatus";

/*
* A `Properties.Get` reply for `Metadata` looks like this:
*
*   variant array [
*       dict entry(
*           string "xesam:title"
*           variant string "{track title}"
*       )
*       dict entry(
*           string "xesam:artist"
*           variant array [ string "{track artist}" ]
*       )
*       ...
*   ]
*
* Every step below may fail; a mismatch anywhere means "no value", never an error.
*/

/// Looks up `key` in the `Metadata` reply and returns the variant value stored under it.
fn metadata_value<'a>(reply: &'a Node, key: &str) -> Option<&'a Node> {
    reply.as_variant()?.get(key)?.as_variant()
}

/// The name of the track.
///
/// Based on `xesam:title`, path `variant -> array[xesam:title] -> variant -> string`.
pub fn extract_title(reply: &Node) -> Option<String> {
    metadata_value(reply, TITLE_KEY)?
        .as_str()
        .map(String::from)
}

/// The (first) artist of the track.
///
/// Based on `xesam:artist`, which is a list of strings rather than a single string. Path
/// `variant -> array[xesam:artist] -> variant -> array -> string`.
pub fn extract_artist(reply: &Node) -> Option<String> {
    metadata_value(reply, ARTIST_KEY)?
        .first()?
        .as_str()
        .map(String::from)
}

/// Track id announced in the changed-properties dictionary of a `PropertiesChanged` signal, if
/// the `Metadata` property was part of the change.
pub fn changed_track_id(changed: &Node) -> Option<TrackId> {
    changed
        .get(METADATA_PROPERTY)?
        .as_variant()?
        .get(TRACK_ID_KEY)?
        .as_variant()?
        .as_str()?
        .try_into()
        .ok()
}

/// Playback status announced in the changed-properties dictionary of a `PropertiesChanged`
/// signal.
pub fn changed_playback_status(changed: &Node) -> Option<PlaybackStatus> {
    changed
        .get(PLAYBACK_STATUS_PROPERTY)?
        .as_variant()?
        .as_str()?
        .parse()
        .ok()
}
