use quicklaunch_core::settings::keys;
use quicklaunch_core::KeyValueStore;
use serde_json::json;

/// Why the extension's `onInstalled` event fired
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallReason {
    Install,
    Update,
    BrowserUpdate,
    SharedModuleUpdate,
}

impl InstallReason {
    pub fn parse(reason: &str) -> Option<Self> {
        match reason {
            "install" => Some(InstallReason::Install),
            "update" => Some(InstallReason::Update),
            "chrome_update" | "browser_update" => Some(InstallReason::BrowserUpdate),
            "shared_module_update" => Some(InstallReason::SharedModuleUpdate),
            _ => None,
        }
    }
}

/// Seed tutorial mode on first install or update
///
/// Fresh installs start in tutorial mode; existing users who update keep the
/// old behaviour. An already stored value is never overwritten.
pub async fn on_installed(settings: &dyn KeyValueStore, reason: InstallReason) -> crate::Result<()> {
    let seed = match reason {
        InstallReason::Install => true,
        InstallReason::Update => false,
        _ => return Ok(()),
    };

    if settings.get(keys::TUTORIAL_MODE).await?.is_some() {
        tracing::info!("{:?} detected, preserving existing tutorial mode", reason);
        return Ok(());
    }

    tracing::info!("{:?} detected, setting tutorial mode to {}", reason, seed);
    settings.set(keys::TUTORIAL_MODE, json!(seed)).await?;
    Ok(())
}
