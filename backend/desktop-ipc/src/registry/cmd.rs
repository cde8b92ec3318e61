use super::validation::{parse_create_chat_window, parse_notify, parse_theme_change, parse_web_url};
use super::{CmdEvent, CmdHandler, CmdHandlerMap};
use crate::contracts::{CmdChannel, DesktopEvent, NotifyPayload};
use crate::event_bus::MainEventBus;
use crate::protocol::{ClientTopic, ProtocolError};

use serde_json::{Map, Value};

use std::collections::HashMap;
use std::sync::Arc;

pub trait WindowController: Send + Sync {
    fn show(&self);

    fn focus(&self);

    fn hide(&self);

    fn close(&self);

    fn reload(&self);
}

/// Collaborators behind the implemented CMD channels. Commands never
/// report back to the UI, so every method is synchronous and infallible;
/// slow work is the implementor's to schedule.
pub trait CmdDependencies: Send + Sync + 'static {
    fn notify(&self, payload: NotifyPayload);

    fn log_info(&self, message: &str);

    fn window_for_sender(&self, sender_id: u32) -> Option<Arc<dyn WindowController>>;

    fn ensure_main_window(&self) -> Arc<dyn WindowController>;

    fn restart_app(&self);

    fn open_in_chrome(&self, url: String);

    fn get_app_version(&self) -> String;

    fn dispatch_client_message(&self, topic: ClientTopic, payload: Map<String, Value>);
}

fn log_rejection<D: CmdDependencies>(dependencies: &D, channel: CmdChannel, error: &ProtocolError) {
    let rendered = serde_json::to_string(error).unwrap_or_else(|_| error.to_string());
    dependencies.log_info(&format!("{channel} rejected: {rendered}"));
}

fn handler<D, F>(dependencies: &Arc<D>, run: F) -> CmdHandler
where
    D: CmdDependencies,
    F: Fn(&D, Option<Value>, &mut CmdEvent) + Send + Sync + 'static,
{
    let dependencies = Arc::clone(dependencies);
    Arc::new(move |payload: Option<Value>, event: &mut CmdEvent| {
        run(dependencies.as_ref(), payload, event)
    })
}

/// A handler whose payload failures are logged through `log_info` instead
/// of escaping.
fn guarded<D, F>(dependencies: &Arc<D>, channel: CmdChannel, run: F) -> CmdHandler
where
    D: CmdDependencies,
    F: Fn(&D, Option<Value>) -> Result<(), ProtocolError> + Send + Sync + 'static,
{
    handler(dependencies, move |deps, payload, _event| {
        if let Err(error) = run(deps, payload) {
            log_rejection(deps, channel, &error);
        }
    })
}

pub fn create_cmd_handler_map<D: CmdDependencies>(
    dependencies: Arc<D>,
    event_bus: Arc<MainEventBus>,
) -> CmdHandlerMap {
    let deps = &dependencies;
    let mut implemented: HashMap<CmdChannel, CmdHandler> = HashMap::new();

    let bus = Arc::clone(&event_bus);
    implemented.insert(
        CmdChannel::ReactReady,
        Arc::new(move |_payload: Option<Value>, event: &mut CmdEvent| {
            bus.mark_renderer_ready(event.sender_id)
        }),
    );
    implemented.insert(
        CmdChannel::Notify,
        guarded(deps, CmdChannel::Notify, |deps, payload| {
            deps.notify(parse_notify(payload.as_ref())?);
            Ok(())
        }),
    );
    implemented.insert(
        CmdChannel::LogInfo,
        handler(deps, |deps, payload, _| {
            if let Some(Value::String(message)) = payload {
                deps.log_info(&message);
            }
        }),
    );
    implemented.insert(
        CmdChannel::HideWindow,
        handler(deps, |deps, _, event| {
            if let Some(window) = deps.window_for_sender(event.sender_id) {
                window.hide();
            }
        }),
    );
    implemented.insert(
        CmdChannel::CloseWindow,
        handler(deps, |deps, _, event| {
            if let Some(window) = deps.window_for_sender(event.sender_id) {
                window.close();
            }
        }),
    );
    implemented.insert(
        CmdChannel::ReloadApp,
        handler(deps, |deps, _, event| {
            if let Some(window) = deps.window_for_sender(event.sender_id) {
                window.reload();
            }
        }),
    );
    implemented.insert(
        CmdChannel::RestartApp,
        handler(deps, |deps, _, _| deps.restart_app()),
    );

    let bus = Arc::clone(&event_bus);
    implemented.insert(
        CmdChannel::CreateChatWindow,
        guarded(deps, CmdChannel::CreateChatWindow, move |deps, payload| {
            let input = parse_create_chat_window(payload.as_ref())?;

            let window = deps.ensure_main_window();
            window.show();
            window.focus();

            let mut message = Map::new();
            if let Some(query) = &input.query {
                message.insert("query".to_string(), Value::String(query.clone()));
            }
            deps.dispatch_client_message(ClientTopic::ChatWindowCreate, message);

            if let Some(query) = input.query {
                bus.emit(DesktopEvent::SetInitialMessage(query));
            }
            Ok(())
        }),
    );
    implemented.insert(
        CmdChannel::OpenInChrome,
        guarded(deps, CmdChannel::OpenInChrome, |deps, payload| {
            deps.open_in_chrome(parse_web_url(payload.as_ref())?);
            Ok(())
        }),
    );

    let bus = Arc::clone(&event_bus);
    implemented.insert(
        CmdChannel::BroadcastThemeChange,
        guarded(deps, CmdChannel::BroadcastThemeChange, move |_, payload| {
            bus.emit(DesktopEvent::ThemeChanged(parse_theme_change(payload.as_ref())?));
            Ok(())
        }),
    );
    implemented.insert(
        CmdChannel::GetAppVersion,
        handler(deps, |deps, _, event| {
            event.return_value = Some(Value::String(deps.get_app_version()));
        }),
    );

    CmdHandlerMap::from_implemented(implemented)
}
