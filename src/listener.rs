use std::collections::HashMap;
use std::sync::mpsc;
use std::thread;

use zbus::blocking::{Connection, MessageIterator};
use zbus::zvariant::OwnedValue;
use zbus::{MatchRule, MessageType};

use crate::metadata::{changed_playback_status, changed_track_id, Node, TrackId};
use crate::player::{MPRIS2_PATH, MPRIS2_PLAYER_INTERFACE, SPOTIFY_BUS_NAME};
use crate::polybar::PolybarIpc;
use crate::{PlaybackStatus, Spotify, TransportError};

const PROPERTIES_INTERFACE: &str = "org.freedesktop.DBus.Properties";
const PROPERTIES_CHANGED: &str = "PropertiesChanged";
const DBUS_INTERFACE: &str = "org.freedesktop.DBus";
const DBUS_PATH: &str = "/org/freedesktop/DBus";
const NAME_OWNER_CHANGED: &str = "NameOwnerChanged";

// Signals waiting to be handled before zbus starts dropping them.
const MAX_QUEUED: usize = 64;

const TRACK_CHANGED_HOOKS: &[&str] = &["hook:module/spotify2"];
const PLAYING_HOOKS: &[&str] = &[
    "hook:module/playpause2",
    "hook:module/previous2",
    "hook:module/next2",
    "hook:module/spotify2",
];
const PAUSED_HOOKS: &[&str] = &[
    "hook:module/playpause3",
    "hook:module/previous2",
    "hook:module/next2",
    "hook:module/spotify2",
];
const EXITED_HOOKS: &[&str] = &[
    "hook:module/playpause1",
    "hook:module/previous1",
    "hook:module/next1",
    "hook:module/spotify1",
];

/// What the bar currently shows about Spotify.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum PlayerState {
    /// A track is playing; the pause button is shown.
    Playing,
    /// Playback is paused; the play button is shown.
    Paused,
    /// Spotify is not running; all modules are hidden.
    Exited,
}

/// Setting up the listener failed.
#[derive(thiserror::Error, Debug)]
pub enum ListenerError {
    /// Could not subscribe to signals on the bus.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Every signal reader stopped.
    #[error("All D-Bus signal readers stopped")]
    Disconnected,
}

impl From<zbus::Error> for ListenerError {
    fn from(error: zbus::Error) -> Self {
        ListenerError::Transport(error.into())
    }
}

/// A signal the listener cares about, decoded from the bus.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Signal {
    /// `org.freedesktop.DBus.Properties.PropertiesChanged` on the MPRIS path.
    PropertiesChanged { interface: String, changed: Node },
    /// `org.freedesktop.DBus.NameOwnerChanged`.
    NameOwnerChanged { name: String, new_owner: String },
}

impl Signal {
    fn from_message(message: &zbus::Message) -> Option<Signal> {
        let member = message.member()?;

        match member.as_str() {
            PROPERTIES_CHANGED => {
                let (interface, changed, _invalidated): (
                    String,
                    HashMap<String, OwnedValue>,
                    Vec<String>,
                ) = message.body().ok()?;

                Some(Signal::PropertiesChanged {
                    interface,
                    changed: Node::from_variant_map(changed),
                })
            }
            NAME_OWNER_CHANGED => {
                let (name, _old_owner, new_owner): (String, String, String) =
                    message.body().ok()?;

                Some(Signal::NameOwnerChanged { name, new_owner })
            }
            _ => None,
        }
    }
}

/// Follows Spotify's signals and tells polybar which modules to show.
///
/// Hooks are only sent when something visible changes: a new track, a switch between playing and
/// paused, or Spotify exiting.
#[derive(Debug)]
pub struct Listener {
    state: PlayerState,
    last_track: Option<TrackId>,
}

impl Default for Listener {
    fn default() -> Self {
        Listener::new()
    }
}

impl Listener {
    /// A listener that assumes Spotify is not running yet.
    pub fn new() -> Self {
        Listener {
            state: PlayerState::Exited,
            last_track: None,
        }
    }

    /// The state last announced to polybar.
    pub fn state(&self) -> PlayerState {
        self.state
    }

    /// Subscribes to Spotify's signals and forwards hooks to polybar until the bus goes away.
    pub fn run(mut self, spotify: &Spotify, ipc: &PolybarIpc) -> Result<(), ListenerError> {
        let (sender, receiver) = mpsc::channel();

        spawn_reader(spotify.connection(), properties_changed_rule()?, sender.clone())?;
        spawn_reader(spotify.connection(), name_owner_changed_rule()?, sender)?;

        log::info!("Listening for Spotify on the session bus");

        for signal in receiver {
            log::debug!("Received {:?}", signal);

            let hooks = self.handle(&signal);
            if hooks.is_empty() {
                continue;
            }

            match ipc.send(hooks) {
                Ok(0) => log::debug!("No polybar found in {}", ipc.directory().display()),
                Ok(_) => {}
                Err(error) => log::warn!(
                    "Could not list polybar queues in {}: {}",
                    ipc.directory().display(),
                    error
                ),
            }
        }

        Err(ListenerError::Disconnected)
    }

    /// Updates the state from a signal and returns the hooks polybar should receive.
    pub(crate) fn handle(&mut self, signal: &Signal) -> &'static [&'static str] {
        match signal {
            Signal::PropertiesChanged { interface, changed } => {
                if interface != MPRIS2_PLAYER_INTERFACE {
                    log::debug!("Ignoring PropertiesChanged for {}", interface);
                    return &[];
                }
                self.properties_changed(changed)
            }
            Signal::NameOwnerChanged { name, new_owner } => {
                if name == SPOTIFY_BUS_NAME && new_owner.is_empty() {
                    log::info!("Spotify disconnected");
                    self.transition(PlayerState::Exited)
                } else {
                    &[]
                }
            }
        }
    }

    fn properties_changed(&mut self, changed: &Node) -> &'static [&'static str] {
        // Other players share the MPRIS path; only Spotify track ids count.
        let track_id = match changed_track_id(changed) {
            Some(track_id) if track_id.is_spotify() => track_id,
            _ => return &[],
        };
        log::debug!("Spotify detected");

        let track_changed = self
            .last_track
            .as_ref()
            .map_or(false, |last| *last != track_id);
        self.last_track = Some(track_id);

        let state_hooks = match changed_playback_status(changed) {
            Some(PlaybackStatus::Playing) => self.transition(PlayerState::Playing),
            Some(PlaybackStatus::Paused) => self.transition(PlayerState::Paused),
            _ => &[],
        };

        // Every state change already refreshes the track module.
        if track_changed && state_hooks.is_empty() {
            log::info!("Track changed");
            TRACK_CHANGED_HOOKS
        } else {
            state_hooks
        }
    }

    fn transition(&mut self, state: PlayerState) -> &'static [&'static str] {
        if self.state == state {
            return &[];
        }
        self.state = state;

        match state {
            PlayerState::Playing => {
                log::info!("Song is playing");
                PLAYING_HOOKS
            }
            PlayerState::Paused => {
                log::info!("Song is paused");
                PAUSED_HOOKS
            }
            PlayerState::Exited => EXITED_HOOKS,
        }
    }
}

fn properties_changed_rule() -> zbus::Result<MatchRule<'static>> {
    Ok(MatchRule::builder()
        .msg_type(MessageType::Signal)
        .interface(PROPERTIES_INTERFACE)?
        .member(PROPERTIES_CHANGED)?
        .path(MPRIS2_PATH)?
        .build())
}

fn name_owner_changed_rule() -> zbus::Result<MatchRule<'static>> {
    Ok(MatchRule::builder()
        .msg_type(MessageType::Signal)
        .interface(DBUS_INTERFACE)?
        .member(NAME_OWNER_CHANGED)?
        .path(DBUS_PATH)?
        .build())
}

/// Reads signals matching `rule` on a background thread and forwards the decoded ones.
fn spawn_reader(
    connection: &Connection,
    rule: MatchRule<'static>,
    sender: mpsc::Sender<Signal>,
) -> Result<(), ListenerError> {
    log::debug!("Adding match rule {}", rule);
    let messages = MessageIterator::for_match_rule(rule, connection, Some(MAX_QUEUED))?;

    thread::spawn(move || {
        for message in messages {
            let message = match message {
                Ok(message) => message,
                Err(error) => {
                    log::warn!("Could not read D-Bus message: {}", error);
                    continue;
                }
            };

            if let Some(signal) = Signal::from_message(&message) {
                if sender.send(signal).is_err() {
                    break;
                }
            }
        }
    });

    Ok(())
}
