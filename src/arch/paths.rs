use std::path::PathBuf;

use tauri::Manager;

/// All filesystem paths should be resolved via Tauri app directories.
///
/// This keeps storage locations consistent and cross-platform.
pub fn app_data_dir(app: &tauri::AppHandle) -> tauri::Result<PathBuf> {
    app.path().app_data_dir()
}

/// The secure vault's single on-disk document.
pub fn secure_store_file(app: &tauri::AppHandle) -> tauri::Result<PathBuf> {
    Ok(app_data_dir(app)?.join("secure-store.json"))
}

/// Root under which per-tenant webview partitions live.
pub fn partitions_dir(app: &tauri::AppHandle) -> tauri::Result<PathBuf> {
    Ok(app_data_dir(app)?.join("partitions"))
}
