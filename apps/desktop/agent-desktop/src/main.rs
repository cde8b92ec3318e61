use agent_desktop::app_dirs::{create_app_dirs, default_root};
use agent_desktop::error::HostError;
use agent_desktop::host::DesktopHost;
use agent_desktop::logger::initialize as LoggerInitialize;

use desktop_ipc::config::DesktopConfig;

use std::path::Path;

use log::{error, info};

#[tokio::main]
async fn main() -> Result<(), HostError> {
    let app_dirs = create_app_dirs(&default_root()?)?;

    // Initialize logger FIRST
    LoggerInitialize(Path::new(&app_dirs.logs))?;

    info!("Agent desktop starting");
    info!("Data directory: {}", app_dirs.root);

    let config = DesktopConfig::from_env()?;
    info!("Backend URL: {}", config.backend_url);

    loop {
        let host = DesktopHost::build(config.clone(), Some(app_dirs.clone()))?;
        host.start().await;
        host.api().renderer_ready();

        let restart = tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                if let Err(e) = signal {
                    error!("Failed to listen for Ctrl-C: {e}");
                }
                false
            }
            () = host.restart_requested() => true,
        };

        host.shutdown();

        if !restart {
            break;
        }
        info!("Restarting host");
    }

    info!("Agent desktop stopped");
    Ok(())
}
