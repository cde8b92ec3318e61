use super::MAIN_RENDERER_ID;
use crate::platform::{LogWindow, open_with_system};

use desktop_ipc::bridge::DesktopServerMessageBridge;
use desktop_ipc::contracts::NotifyPayload;
use desktop_ipc::notifications::NotificationTransport;
use desktop_ipc::protocol::{ClientToServerMessage, ClientTopic};
use desktop_ipc::registry::{CmdDependencies, WindowController};

use log::{error, info, warn};
use serde_json::{Map, Value};
use tokio::runtime::Handle;
use tokio::sync::Notify;

use std::sync::Arc;

pub struct HostCmd {
    pub(super) main_window: Arc<LogWindow>,
    pub(super) notifier: Arc<dyn NotificationTransport>,
    pub(super) bridge: Arc<DesktopServerMessageBridge>,
    pub(super) restart: Arc<Notify>,
}

impl CmdDependencies for HostCmd {
    fn notify(&self, payload: NotifyPayload) {
        if !self.notifier.is_supported() {
            warn!("Notifications unsupported, dropping '{}'", payload.title);
            return;
        }
        if let Err(e) = self.notifier.show(&payload) {
            error!("Failed to show notification: {e}");
        }
    }

    fn log_info(&self, message: &str) {
        info!(target: "renderer", "{message}");
    }

    fn window_for_sender(&self, sender_id: u32) -> Option<Arc<dyn WindowController>> {
        (sender_id == MAIN_RENDERER_ID).then(|| self.main_window.clone() as Arc<dyn WindowController>)
    }

    fn ensure_main_window(&self) -> Arc<dyn WindowController> {
        self.main_window.clone()
    }

    fn restart_app(&self) {
        info!("Restart requested by renderer");
        self.restart.notify_one();
    }

    fn open_in_chrome(&self, url: String) {
        if let Err(e) = open_with_system(&url) {
            error!("{e}");
        }
    }

    fn get_app_version(&self) -> String {
        env!("CARGO_PKG_VERSION").to_string()
    }

    fn dispatch_client_message(&self, topic: ClientTopic, payload: Map<String, Value>) {
        let Ok(runtime) = Handle::try_current() else {
            error!("No runtime to dispatch {topic} on");
            return;
        };

        let message = ClientToServerMessage::new(topic, Some(payload));
        let bridge = Arc::clone(&self.bridge);
        runtime.spawn(async move {
            if let Err(error) = bridge.send(&message).await {
                warn!(
                    "Dispatching {} failed: code={} message={}",
                    message.topic, error.code, error.message
                );
            }
        });
    }
}
