// Learn more about Tauri commands at https://tauri.app/develop/calling-rust/
mod arch;
mod config;
mod session;
mod vault;
mod window;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tauri::{AppHandle, Manager, State, Wry};
use tauri_plugin_clipboard_manager::ClipboardExt;
use tauri_plugin_dialog::{DialogExt, FileDialogBuilder};
use tauri_plugin_notification::NotificationExt;
use tauri_plugin_opener::OpenerExt;

use crate::arch::autolaunch::{AutoLaunch, AutostartPlugin};
use crate::config::ShellContext;
use crate::session::{Permission, PermissionPolicy};
use crate::vault::SecureVault;

/// Everything the capability bridge is allowed to reach, frozen at startup.
pub struct AppState {
    ctx: ShellContext,
    vault: SecureVault,
    auto_launch: AutoLaunch,
    permissions: PermissionPolicy,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShellConfig {
    env: String,
    tenant_id: String,
    app_url: String,
    tenant_name: String,
}

#[tauri::command]
fn get_config(state: State<'_, Arc<AppState>>) -> ShellConfig {
    ShellConfig {
        env: state.ctx.env.clone(),
        tenant_id: state.ctx.tenant_id.clone(),
        app_url: state.ctx.app_url.to_string(),
        tenant_name: state.ctx.tenant_name.clone(),
    }
}

#[tauri::command]
fn notify(
    app: AppHandle,
    state: State<'_, Arc<AppState>>,
    title: String,
    body: String,
) -> Result<(), String> {
    if !state.permissions.allows(Permission::Notifications) {
        log::debug!("notification suppressed by permission policy");
        return Ok(());
    }

    // Display is best-effort: a missing notification daemon must not surface
    // as a bridge failure.
    if let Err(e) = app.notification().builder().title(title).body(body).show() {
        log::warn!("failed to display notification: {e}");
    }
    Ok(())
}

#[tauri::command]
async fn clipboard_read_text(app: AppHandle) -> Result<String, String> {
    app.clipboard().read_text().map_err(|e| e.to_string())
}

#[tauri::command]
async fn clipboard_write_text(app: AppHandle, text: String) -> Result<(), String> {
    app.clipboard().write_text(text).map_err(|e| e.to_string())
}

#[tauri::command]
async fn open_external(app: AppHandle, url: String) -> Result<(), String> {
    app.opener()
        .open_url(url, None::<&str>)
        .map_err(|e| e.to_string())
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileDialogOptions {
    pub title: Option<String>,
    pub default_path: Option<String>,
    #[serde(default)]
    pub filters: Vec<FileDialogFilter>,
    #[serde(default)]
    pub multiple: bool,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileDialogFilter {
    pub name: String,
    pub extensions: Vec<String>,
}

fn file_dialog(app: &AppHandle, options: &FileDialogOptions) -> FileDialogBuilder<Wry> {
    let mut dialog = app.dialog().file();
    if let Some(title) = &options.title {
        dialog = dialog.set_title(title);
    }
    if let Some(path) = &options.default_path {
        dialog = dialog.set_directory(path);
    }
    for filter in &options.filters {
        let extensions: Vec<&str> = filter.extensions.iter().map(String::as_str).collect();
        dialog = dialog.add_filter(&filter.name, &extensions);
    }
    dialog
}

#[tauri::command]
async fn open_file(
    app: AppHandle,
    options: Option<FileDialogOptions>,
) -> Result<Option<Vec<String>>, String> {
    let options = options.unwrap_or_default();
    let dialog = file_dialog(&app, &options);

    // Dismissing the dialog is a cancellation sentinel, never an error.
    let picked = if options.multiple {
        dialog
            .blocking_pick_files()
            .map(|paths| paths.iter().map(|p| p.to_string()).collect())
    } else {
        dialog.blocking_pick_file().map(|p| vec![p.to_string()])
    };
    Ok(picked)
}

#[tauri::command]
async fn save_file(
    app: AppHandle,
    options: Option<FileDialogOptions>,
) -> Result<Option<String>, String> {
    let options = options.unwrap_or_default();
    let dialog = file_dialog(&app, &options);
    Ok(dialog.blocking_save_file().map(|p| p.to_string()))
}

#[tauri::command]
async fn read_file(path: String) -> Result<String, String> {
    std::fs::read_to_string(&path).map_err(|e| format!("failed to read {path}: {e}"))
}

#[tauri::command]
async fn write_file(path: String, contents: String) -> Result<(), String> {
    std::fs::write(&path, contents).map_err(|e| format!("failed to write {path}: {e}"))
}

#[tauri::command]
fn get_secure_store(
    state: State<'_, Arc<AppState>>,
    key: String,
) -> Result<Option<String>, String> {
    state.vault.get(&key).map_err(|e| e.to_string())
}

#[tauri::command]
fn set_secure_store(
    state: State<'_, Arc<AppState>>,
    key: String,
    value: String,
) -> Result<(), String> {
    state.vault.set(&key, &value).map_err(|e| e.to_string())
}

#[tauri::command]
fn delete_secure_store(state: State<'_, Arc<AppState>>, key: String) -> Result<(), String> {
    state.vault.delete(&key).map_err(|e| e.to_string())
}

#[tauri::command]
fn get_auto_launch(state: State<'_, Arc<AppState>>) -> bool {
    state.auto_launch.get()
}

#[tauri::command]
fn set_auto_launch(state: State<'_, Arc<AppState>>, enabled: bool) -> Result<(), String> {
    state.auto_launch.set(enabled);
    Ok(())
}

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    std::panic::set_hook(Box::new(|panic_info| {
        log::error!("application panic: {panic_info}");
    }));

    let env = std::env::var("DESKTOP_ENV").unwrap_or_else(|_| "dev".to_string());
    let tenant_override = std::env::var("DESKTOP_TENANT").ok();

    // Configuration failures are the only errors allowed to end the process;
    // no window may exist before this point.
    let ctx = match config::resolve(&env, tenant_override.as_deref()) {
        Ok(ctx) => ctx,
        Err(e) => {
            log::error!("fatal startup error: {e}");
            std::process::exit(1);
        }
    };

    log::info!(
        "starting shell for tenant {} ({})",
        ctx.tenant_id,
        ctx.app_url
    );

    tauri::Builder::default()
        .plugin(tauri_plugin_notification::init())
        .plugin(tauri_plugin_clipboard_manager::init())
        .plugin(tauri_plugin_dialog::init())
        .plugin(tauri_plugin_fs::init())
        .plugin(tauri_plugin_autostart::init(
            tauri_plugin_autostart::MacosLauncher::LaunchAgent,
            None,
        ))
        .plugin(tauri_plugin_opener::init())
        .setup(move |app| {
            let vault = SecureVault::new(
                arch::paths::secure_store_file(app.handle())?,
                arch::sealer::default_sealer(),
            );
            let auto_launch =
                AutoLaunch::new(Box::new(AutostartPlugin::new(app.handle().clone())));

            let state = Arc::new(AppState {
                ctx,
                vault,
                auto_launch,
                permissions: PermissionPolicy::baseline(),
            });
            app.manage(state.clone());

            window::create_main_window(app.handle(), &state.ctx)?;
            window::tray::setup_tray(app.handle())?;

            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            get_config,
            notify,
            clipboard_read_text,
            clipboard_write_text,
            open_external,
            open_file,
            save_file,
            read_file,
            write_file,
            get_secure_store,
            set_secure_store,
            delete_secure_store,
            get_auto_launch,
            set_auto_launch,
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
