//! Main-process wiring: router, event bus, backend bridge and the channel
//! registry, with headless collaborators behind the registry's traits.

mod cmd;
mod rpc;

pub use cmd::HostCmd;
pub use rpc::{HostRpc, RECENT_DIRS_LIMIT};

use crate::backend::{HealthCheck, probe_client, wait_for_health};
use crate::error::HostError;
use crate::platform::{LogNotificationTransport, LogWindow};
use crate::state::BackendState;

use desktop_ipc::bridge::{
    BackendEndpoint, BridgeOptions, DesktopServerMessageBridge, HttpTransport, ReqwestTransport,
};
use desktop_ipc::client::DesktopApi;
use desktop_ipc::config::DesktopConfig;
use desktop_ipc::contracts::{AppDirs, IPC_MESSAGE_EVENT_CHANNEL};
use desktop_ipc::event_bus::{MainEventBus, RendererSink};
use desktop_ipc::notifications::{
    NotificationCode, NotificationEvent, NotificationService, NotificationTransport,
};
use desktop_ipc::protocol::ServerToClientMessage;
use desktop_ipc::registry::register_desktop_ipc;
use desktop_ipc::transport::IpcRouter;

use log::{debug, info, warn};
use tokio::sync::Notify;

use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, Weak};

/// The single in-process renderer.
pub const MAIN_RENDERER_ID: u32 = 1;

pub struct DesktopHost {
    config: DesktopConfig,
    health_check: HealthCheck,
    router: Arc<IpcRouter>,
    event_bus: Arc<MainEventBus>,
    endpoint: BackendEndpoint,
    bridge: Arc<DesktopServerMessageBridge>,
    backend: Arc<BackendState>,
    notifications: Arc<NotificationService>,
    probe: reqwest::Client,
    main_window: Arc<LogWindow>,
    restart: Arc<Notify>,
    rpc: Arc<HostRpc>,
}

/// Forwards every backend message to the renderer's relay channel.
fn relay_to_renderer(router: Weak<IpcRouter>) -> impl Fn(&ServerToClientMessage) + Send + Sync {
    move |message: &ServerToClientMessage| {
        let Some(router) = router.upgrade() else {
            debug!("Renderer gone, dropping message {}", message.id());
            return;
        };
        match serde_json::to_value(message) {
            Ok(value) => RendererSink::send(&*router, IPC_MESSAGE_EVENT_CHANNEL, Some(&value)),
            Err(e) => warn!("Failed to encode message {}: {e}", message.id()),
        }
    }
}

impl DesktopHost {
    /// Builds the host and registers every IPC channel. Nothing touches the
    /// network until [`Self::start`].
    ///
    /// # Errors
    ///
    /// Returns [`HostError`] if an HTTP client cannot be built.
    pub fn build(config: DesktopConfig, app_dirs: Option<AppDirs>) -> Result<Self, HostError> {
        let router = Arc::new(IpcRouter::new(MAIN_RENDERER_ID));

        let sink_router = Arc::downgrade(&router);
        let event_bus = Arc::new(MainEventBus::new(move || {
            sink_router
                .upgrade()
                .map(|router| router as Arc<dyn RendererSink>)
        }));

        let endpoint = BackendEndpoint::default();
        let http: Arc<dyn HttpTransport> = Arc::new(ReqwestTransport::new()?);

        let bridge = Arc::new(DesktopServerMessageBridge::new(
            BridgeOptions::new(endpoint.clone(), Arc::clone(&event_bus), Arc::clone(&http))
                .reconnect_delay(config.reconnect_delay)
                .on_message(relay_to_renderer(Arc::downgrade(&router))),
        ));

        let notifier: Arc<dyn NotificationTransport> = Arc::new(LogNotificationTransport);
        let notifications = Arc::new(
            NotificationService::new(Arc::clone(&notifier))
                .with_dedup_window(config.notification_dedup_window),
        );

        let probe = probe_client()?;
        let backend = Arc::new(BackendState::new());
        let main_window = Arc::new(LogWindow::new("main"));
        let restart = Arc::new(Notify::new());

        let rpc = Arc::new(HostRpc {
            is_dev: config.is_dev,
            app_dirs,
            endpoint: endpoint.clone(),
            backend: Arc::clone(&backend),
            http,
            bridge: Arc::clone(&bridge),
            probe: probe.clone(),
            notifications: Arc::clone(&notifications),
            recent_dirs: Mutex::new(Vec::new()),
            sending_logs: AtomicBool::new(false),
        });

        let cmd = Arc::new(HostCmd {
            main_window: Arc::clone(&main_window),
            notifier,
            bridge: Arc::clone(&bridge),
            restart: Arc::clone(&restart),
        });

        register_desktop_ipc(&*router, Arc::clone(&rpc), cmd, Arc::clone(&event_bus));

        Ok(Self {
            config,
            health_check: HealthCheck::default(),
            router,
            event_bus,
            endpoint,
            bridge,
            backend,
            notifications,
            probe,
            main_window,
            restart,
            rpc,
        })
    }

    pub fn with_health_check(mut self, health_check: HealthCheck) -> Self {
        self.health_check = health_check;
        self
    }

    /// Waits for the backend, publishes its endpoint and starts the bridge.
    ///
    /// A backend that never becomes healthy is not fatal: the failure is
    /// recorded for `desktop:get-state` and notified, and `false` returned.
    pub async fn start(&self) -> bool {
        let base_url = self.config.backend_url.clone();
        info!("Waiting for backend at {base_url}");

        match wait_for_health(&self.probe, &base_url, self.health_check).await {
            Ok(()) => {
                self.backend.clear_error();
                self.endpoint.set(base_url.clone(), self.config.secret_key.clone());
                self.notifications.notify(
                    &NotificationEvent::new(NotificationCode::RuntimeBackendReady)
                        .with_base_url(base_url),
                );
                self.bridge.start();
                true
            }
            Err(error) => {
                self.backend.set_error(error.message());
                self.notifications.notify(
                    &NotificationEvent::new(NotificationCode::RuntimeBackendStartFailed)
                        .with_base_url(base_url)
                        .with_message(error.message()),
                );
                false
            }
        }
    }

    /// The renderer-side adapter bound to this host's router.
    pub fn api(&self) -> DesktopApi<IpcRouter> {
        DesktopApi::new(Arc::clone(&self.router))
    }

    pub fn event_bus(&self) -> &Arc<MainEventBus> {
        &self.event_bus
    }

    pub fn endpoint(&self) -> &BackendEndpoint {
        &self.endpoint
    }

    pub fn bridge(&self) -> &Arc<DesktopServerMessageBridge> {
        &self.bridge
    }

    pub fn main_window(&self) -> &Arc<LogWindow> {
        &self.main_window
    }

    pub fn rpc(&self) -> &Arc<HostRpc> {
        &self.rpc
    }

    /// Resolves once the renderer has asked for a restart.
    pub async fn restart_requested(&self) {
        self.restart.notified().await;
    }

    pub fn shutdown(&self) {
        info!("Shutting down host");
        self.bridge.stop();
        self.router.destroy();
    }
}
