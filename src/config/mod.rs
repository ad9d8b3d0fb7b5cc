//! Per-environment tenant configuration.
//!
//! One JSON file per environment (`config/<env>.json`, resolved next to the
//! executable) is read exactly once at startup. The resolved tenant is frozen
//! into a [`ShellContext`] that every other component receives by value; no
//! component re-reads configuration at call time.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

#[derive(Debug)]
pub enum ConfigError {
    Read { path: PathBuf, message: String },
    Parse { path: PathBuf, message: String },
    NoTenants,
    InvalidAppUrl { tenant_id: String, message: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Read { path, message } => {
                write!(f, "failed to read config file {}: {message}", path.display())
            }
            ConfigError::Parse { path, message } => {
                write!(f, "failed to parse config file {}: {message}", path.display())
            }
            ConfigError::NoTenants => write!(f, "config contains no tenants"),
            ConfigError::InvalidAppUrl { tenant_id, message } => {
                write!(f, "tenant {tenant_id} has an invalid appUrl: {message}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantConfig {
    pub app_url: String,
    pub name: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeycloakConfig {
    pub tenant_claim: Option<String>,
}

/// The full per-environment document, immutable for the process lifetime.
///
/// Tenants are kept in a `BTreeMap` so the "first available" fallback below is
/// deterministic across runs.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DesktopConfig {
    pub env: String,
    pub default_tenant: String,
    pub tenants: BTreeMap<String, TenantConfig>,
    pub keycloak: Option<KeycloakConfig>,
}

/// Everything the rest of the shell needs to know about the active tenant.
///
/// Constructed once by [`resolve`] before any window exists.
#[derive(Clone, Debug)]
pub struct ShellContext {
    pub env: String,
    pub tenant_id: String,
    pub tenant_name: String,
    pub app_url: Url,
}

/// Locate `config/<env>.json` relative to the executable.
pub fn config_path(env: &str) -> PathBuf {
    let base = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|p| p.to_path_buf()))
        .unwrap_or_else(|| PathBuf::from("."));

    base.join("config").join(format!("{env}.json"))
}

pub fn load(path: &Path) -> Result<DesktopConfig, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|e| ConfigError::Read {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    serde_json::from_str(&raw).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Pick the active tenant: requested id, else `defaultTenant`, else the first
/// entry. `defaultTenant` is not required to exist in the map.
pub fn resolve_tenant<'a>(
    config: &'a DesktopConfig,
    requested: Option<&str>,
) -> Result<(String, &'a TenantConfig), ConfigError> {
    if config.tenants.is_empty() {
        return Err(ConfigError::NoTenants);
    }

    let candidates = [requested, Some(config.default_tenant.as_str())];
    for id in candidates.into_iter().flatten() {
        if let Some(tenant) = config.tenants.get(id) {
            return Ok((id.to_string(), tenant));
        }
    }

    let (id, tenant) = config.tenants.iter().next().expect("tenants is non-empty");
    Ok((id.clone(), tenant))
}

fn context_for(
    config: &DesktopConfig,
    tenant_id: String,
    tenant: &TenantConfig,
) -> Result<ShellContext, ConfigError> {
    let app_url = Url::parse(&tenant.app_url).map_err(|e| ConfigError::InvalidAppUrl {
        tenant_id: tenant_id.clone(),
        message: e.to_string(),
    })?;

    Ok(ShellContext {
        env: config.env.clone(),
        tenant_name: tenant.name.clone().unwrap_or_else(|| tenant_id.clone()),
        tenant_id,
        app_url,
    })
}

/// Load the environment's config file and freeze the active tenant.
///
/// Any error here is fatal to startup: the caller must not create a window.
pub fn resolve(env: &str, tenant_override: Option<&str>) -> Result<ShellContext, ConfigError> {
    let config = load(&config_path(env))?;
    let (tenant_id, tenant) = resolve_tenant(&config, tenant_override)?;
    context_for(&config, tenant_id, tenant)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_tenant_config() -> DesktopConfig {
        let mut tenants = BTreeMap::new();
        tenants.insert(
            "a".to_string(),
            TenantConfig {
                app_url: "https://a.example".to_string(),
                name: Some("Tenant A".to_string()),
            },
        );
        tenants.insert(
            "b".to_string(),
            TenantConfig {
                app_url: "https://b.example".to_string(),
                name: None,
            },
        );
        DesktopConfig {
            env: "dev".to_string(),
            default_tenant: "a".to_string(),
            tenants,
            keycloak: None,
        }
    }

    #[test]
    fn resolves_default_tenant_without_override() {
        let config = two_tenant_config();
        let (id, tenant) = resolve_tenant(&config, None).unwrap();
        assert_eq!(id, "a");
        assert_eq!(tenant.app_url, "https://a.example");
    }

    #[test]
    fn override_selects_requested_tenant() {
        let config = two_tenant_config();
        let (id, tenant) = resolve_tenant(&config, Some("b")).unwrap();
        assert_eq!(id, "b");
        assert_eq!(tenant.app_url, "https://b.example");
    }

    #[test]
    fn unknown_override_falls_back_to_default() {
        let config = two_tenant_config();
        let (id, _) = resolve_tenant(&config, Some("missing")).unwrap();
        assert_eq!(id, "a");
    }

    #[test]
    fn unknown_default_falls_back_to_first_entry() {
        let mut config = two_tenant_config();
        config.default_tenant = "gone".to_string();
        let (id, _) = resolve_tenant(&config, None).unwrap();
        assert_eq!(id, "a");
    }

    #[test]
    fn empty_tenant_map_is_fatal() {
        let mut config = two_tenant_config();
        config.tenants.clear();
        assert!(matches!(
            resolve_tenant(&config, None),
            Err(ConfigError::NoTenants)
        ));
    }

    #[test]
    fn loads_camel_case_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dev.json");
        fs::write(
            &path,
            r#"{
                "env": "dev",
                "defaultTenant": "acme",
                "tenants": {
                    "acme": { "appUrl": "https://portal.acme.example", "name": "Acme" }
                },
                "keycloak": { "tenantClaim": "tenant" }
            }"#,
        )
        .unwrap();

        let config = load(&path).unwrap();
        assert_eq!(config.env, "dev");
        assert_eq!(config.default_tenant, "acme");
        assert_eq!(
            config.tenants["acme"].app_url,
            "https://portal.acme.example"
        );
        assert_eq!(
            config.keycloak.unwrap().tenant_claim.as_deref(),
            Some("tenant")
        );
    }

    #[test]
    fn unparseable_document_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dev.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(load(&path), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn missing_document_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.json");
        assert!(matches!(load(&path), Err(ConfigError::Read { .. })));
    }

    #[test]
    fn relative_app_url_is_rejected() {
        let config = two_tenant_config();
        let err = context_for(
            &config,
            "a".to_string(),
            &TenantConfig {
                app_url: "/not-absolute".to_string(),
                name: None,
            },
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidAppUrl { .. }));
    }

    #[test]
    fn tenant_name_defaults_to_tenant_id() {
        let config = two_tenant_config();
        let (id, tenant) = resolve_tenant(&config, Some("b")).unwrap();
        let ctx = context_for(&config, id, tenant).unwrap();
        assert_eq!(ctx.tenant_name, "b");
        assert_eq!(ctx.app_url.as_str(), "https://b.example/");
    }
}
