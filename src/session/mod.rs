//! Per-tenant storage isolation and the browser permission policy.
//!
//! Both are pure values derived from the active tenant at startup. Partition
//! placement is a function of tenant id alone, and the permission policy holds
//! no state from the capability bridge: page-requested browser permissions and
//! host capabilities are two independent gates.

use std::path::{Path, PathBuf};

/// Partition name for a tenant. Stable across restarts, never shared.
pub fn partition_name(tenant_id: &str) -> String {
    format!("persist:{tenant_id}")
}

/// On-disk directory backing a tenant's cookies, local storage and cache.
///
/// The escape below is injective, so two distinct tenant ids can never map to
/// the same directory.
pub fn partition_dir(base: &Path, tenant_id: &str) -> PathBuf {
    base.join(escape_component(&partition_name(tenant_id)))
}

/// Byte-wise `%XX` escape of anything outside `[A-Za-z0-9_-]`.
///
/// `%` itself is escaped, which is what makes the mapping injective.
fn escape_component(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for byte in name.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'_' | b'-' => out.push(byte as char),
            other => out.push_str(&format!("%{other:02X}")),
        }
    }
    out
}

/// Browser-originated permission kinds a page can request from the webview.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Permission {
    Notifications,
    Geolocation,
    Camera,
    Microphone,
    ClipboardRead,
    Midi,
    PointerLock,
    Fullscreen,
}

impl Permission {
    pub const ALL: [Permission; 8] = [
        Permission::Notifications,
        Permission::Geolocation,
        Permission::Camera,
        Permission::Microphone,
        Permission::ClipboardRead,
        Permission::Midi,
        Permission::PointerLock,
        Permission::Fullscreen,
    ];
}

/// Default-deny policy attached to the tenant partition.
///
/// Evaluated synchronously per request. The only allow-listed capability in
/// the baseline policy is outbound notification display.
pub struct PermissionPolicy;

impl PermissionPolicy {
    pub fn baseline() -> Self {
        Self
    }

    pub fn allows(&self, permission: Permission) -> bool {
        matches!(permission, Permission::Notifications)
    }
}
