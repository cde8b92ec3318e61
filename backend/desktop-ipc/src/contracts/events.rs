use super::channels::EventChannel;
use super::payloads::{SetView, ThemeChange, UpdaterEvent};

use log::warn;
use serde::Serialize;
use serde_json::Value;

/// An event on its way to the UI: a channel plus an opaque payload.
#[derive(Debug, Clone, PartialEq)]
pub struct EventMessage {
    pub channel: EventChannel,
    pub payload: Option<Value>,
}

impl EventMessage {
    pub fn new(channel: EventChannel, payload: Option<Value>) -> Self {
        Self { channel, payload }
    }
}

/// Typed view over the main → UI events the main process emits itself.
///
/// Events relayed from the backend arrive untyped and go straight to
/// [`EventMessage`].
#[derive(Debug, Clone, PartialEq)]
pub enum DesktopEvent {
    SetInitialMessage(String),
    ThemeChanged(ThemeChange),
    UpdaterEvent(UpdaterEvent),
    SetView(SetView),
    FatalError(String),
    NewChat,
    FocusInput,
    FindCommand,
    FindNext,
    FindPrevious,
    UseSelectionFind,
    MouseBackButtonClicked,
}

impl DesktopEvent {
    pub fn channel(&self) -> EventChannel {
        match self {
            DesktopEvent::SetInitialMessage(_) => EventChannel::SetInitialMessage,
            DesktopEvent::ThemeChanged(_) => EventChannel::ThemeChanged,
            DesktopEvent::UpdaterEvent(_) => EventChannel::UpdaterEvent,
            DesktopEvent::SetView(_) => EventChannel::SetView,
            DesktopEvent::FatalError(_) => EventChannel::FatalError,
            DesktopEvent::NewChat => EventChannel::NewChat,
            DesktopEvent::FocusInput => EventChannel::FocusInput,
            DesktopEvent::FindCommand => EventChannel::FindCommand,
            DesktopEvent::FindNext => EventChannel::FindNext,
            DesktopEvent::FindPrevious => EventChannel::FindPrevious,
            DesktopEvent::UseSelectionFind => EventChannel::UseSelectionFind,
            DesktopEvent::MouseBackButtonClicked => EventChannel::MouseBackButtonClicked,
        }
    }
}

impl From<DesktopEvent> for EventMessage {
    fn from(event: DesktopEvent) -> Self {
        let channel = event.channel();
        let payload = match event {
            DesktopEvent::SetInitialMessage(text) | DesktopEvent::FatalError(text) => {
                Some(Value::String(text))
            }
            DesktopEvent::ThemeChanged(theme) => encode_payload(channel, &theme),
            DesktopEvent::UpdaterEvent(update) => encode_payload(channel, &update),
            DesktopEvent::SetView(view) => encode_payload(channel, &view),
            DesktopEvent::NewChat
            | DesktopEvent::FocusInput
            | DesktopEvent::FindCommand
            | DesktopEvent::FindNext
            | DesktopEvent::FindPrevious
            | DesktopEvent::UseSelectionFind
            | DesktopEvent::MouseBackButtonClicked => None,
        };

        EventMessage { channel, payload }
    }
}

fn encode_payload<T: Serialize>(channel: EventChannel, payload: &T) -> Option<Value> {
    match serde_json::to_value(payload) {
        Ok(value) => Some(value),
        Err(error) => {
            warn!("Dropping unencodable payload for {channel}: {error}");
            None
        }
    }
}
