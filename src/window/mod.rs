//! Lifecycle of the privileged window hosting the tenant's web application.
//!
//! The window is created exactly once, bound to the tenant's session
//! partition, and pinned to the tenant's origin: cross-origin destinations and
//! external targets are handed to the system browser instead of ever loading
//! inside the shell.

pub mod navigation;
pub mod tray;

use std::fs;

use tauri::{AppHandle, WebviewUrl, WebviewWindow, WebviewWindowBuilder, WindowEvent};
use tauri_plugin_opener::OpenerExt;

use crate::arch;
use crate::config::ShellContext;
use crate::session;
use crate::window::navigation::{NavigationDecision, NavigationPolicy};

pub const MAIN_WINDOW: &str = "main";

fn open_in_system_browser(app: &AppHandle, url: &str) {
    if let Err(e) = app.opener().open_url(url, None::<&str>) {
        log::warn!("failed to open {url} in system browser: {e}");
    }
}

/// Create the main window on the tenant's partition and start loading its
/// application URL.
pub fn create_main_window(
    app: &AppHandle,
    ctx: &ShellContext,
) -> Result<WebviewWindow, Box<dyn std::error::Error>> {
    let partitions = arch::paths::partitions_dir(app)?;
    let partition_dir = session::partition_dir(&partitions, &ctx.tenant_id);
    fs::create_dir_all(&partition_dir)?;

    log::info!(
        "binding window to partition {} at {}",
        session::partition_name(&ctx.tenant_id),
        partition_dir.display()
    );

    let policy = NavigationPolicy::for_app_url(&ctx.app_url);
    let handle = app.clone();

    let window = WebviewWindowBuilder::new(app, MAIN_WINDOW, WebviewUrl::External(ctx.app_url.clone()))
        .title(&ctx.tenant_name)
        .inner_size(1280.0, 800.0)
        .data_directory(partition_dir)
        .on_navigation(move |url| match policy.decide(url) {
            NavigationDecision::Allow => true,
            NavigationDecision::OpenExternal => {
                log::info!("redirecting cross-origin navigation to system browser: {url}");
                open_in_system_browser(&handle, url.as_str());
                false
            }
        })
        .build()?;

    attach_close_to_tray(&window);
    Ok(window)
}

/// Keep the process alive behind the tray when the window is closed, where
/// that is the platform convention; elsewhere closing the last window still
/// ends the process.
fn attach_close_to_tray(window: &WebviewWindow) {
    let window_for_close = window.clone();
    window.on_window_event(move |event| {
        if let WindowEvent::CloseRequested { api, .. } = event {
            #[cfg(target_os = "macos")]
            {
                api.prevent_close();
                let _ = window_for_close.hide();
            }
            #[cfg(not(target_os = "macos"))]
            {
                let _ = (api, &window_for_close);
            }
        }
    });
}
