use std::fmt;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use zbus::blocking::Connection;
use zbus::CacheProperties;

use crate::metadata::Node;
use crate::proxies::SpotifyPlayerProxyBlocking;
use crate::TransportError;

pub(crate) const SPOTIFY_BUS_NAME: &str = "org.mpris.MediaPlayer2.spotify";
pub(crate) const MPRIS2_PATH: &str = "/org/mpris/MediaPlayer2";
pub(crate) const MPRIS2_PLAYER_INTERFACE: &str = "org.mpris.MediaPlayer2.Player";

/// Longest time to wait for Spotify to answer a single D-Bus call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// A transport-control command for the player.
///
/// See: [MPRIS2 Player methods](https://specifications.freedesktop.org/mpris-spec/latest/Player_Interface.html)
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum Command {
    /// Start or resume playback.
    Play,
    /// Pause playback.
    Pause,
    /// Toggle between playing and paused.
    PlayPause,
    /// Skip to the next track.
    Next,
    /// Skip to the previous track.
    Previous,
}

impl Command {
    /// Name of the `org.mpris.MediaPlayer2.Player` method for this command.
    pub fn method_name(self) -> &'static str {
        match self {
            Command::Play => "Play",
            Command::Pause => "Pause",
            Command::PlayPause => "PlayPause",
            Command::Next => "Next",
            Command::Previous => "Previous",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.method_name())
    }
}

/// The Spotify desktop client, reached through the session bus.
#[derive(Debug, Clone)]
pub struct Spotify {
    connection: Connection,
    timeout: Duration,
}

impl Spotify {
    /// Connects to the D-Bus session bus.
    ///
    /// This succeeds even if Spotify is not running; calls will fail with
    /// `TransportError::PlayerNotRunning` instead.
    pub fn new() -> Result<Self, TransportError> {
        Ok(Spotify::for_connection(Connection::session()?))
    }

    /// Uses an existing connection.
    pub fn for_connection(connection: Connection) -> Self {
        Spotify {
            connection,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Returns the current D-Bus communication timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Change the D-Bus communication timeout.
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    pub(crate) fn connection(&self) -> &Connection {
        &self.connection
    }

    /// Query Spotify for the `Metadata` property of the current track.
    ///
    /// The reply is returned as-is, as a variant holding the metadata dictionary. Use
    /// `extract_artist` and `extract_title` to read it.
    pub fn query_metadata(&self) -> Result<Node, TransportError> {
        log::debug!("Querying {} for Metadata", SPOTIFY_BUS_NAME);

        self.call(|proxy| proxy.metadata())
            .map(Node::from_property_map)
    }

    /// Send a transport-control command. Nothing is read from the reply.
    pub fn send_command(&self, command: Command) -> Result<(), TransportError> {
        log::debug!("Calling {} on {}", command, SPOTIFY_BUS_NAME);

        self.call(move |proxy| match command {
            Command::Play => proxy.play(),
            Command::Pause => proxy.pause(),
            Command::PlayPause => proxy.play_pause(),
            Command::Next => proxy.next(),
            Command::Previous => proxy.previous(),
        })
    }

    /// Runs a blocking proxy call on a worker thread, giving up after the timeout.
    fn call<T, F>(&self, f: F) -> Result<T, TransportError>
    where
        T: Send + 'static,
        F: FnOnce(&SpotifyPlayerProxyBlocking<'static>) -> zbus::Result<T> + Send + 'static,
    {
        let connection = self.connection.clone();
        let (sender, receiver) = mpsc::channel();

        thread::spawn(move || {
            let result = SpotifyPlayerProxyBlocking::builder(&connection)
                .cache_properties(CacheProperties::No)
                .build()
                .and_then(|proxy| f(&proxy));
            // The receiver is gone if the call timed out.
            let _ = sender.send(result);
        });

        wait_for_reply(&receiver, self.timeout)
    }
}

fn wait_for_reply<T>(
    receiver: &mpsc::Receiver<zbus::Result<T>>,
    timeout: Duration,
) -> Result<T, TransportError> {
    match receiver.recv_timeout(timeout) {
        Ok(result) => result.map_err(TransportError::from),
        Err(RecvTimeoutError::Timeout) => Err(TransportError::Timeout(timeout)),
        Err(RecvTimeoutError::Disconnected) => Err(TransportError::DBus(String::from(
            "D-Bus worker stopped without a reply",
        ))),
    }
}
