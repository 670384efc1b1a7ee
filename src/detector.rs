//! Wallet detection
//!
//! Builds the list of connectable wallets from the injected provider and the
//! user agent. Pure inspection, no requests are sent.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::provider::Eip1193Provider;

pub const WALLET_METAMASK: &str = "metamask";
pub const WALLET_COINBASE: &str = "coinbase";
pub const WALLET_TRUST: &str = "trust";
pub const WALLET_METAMASK_MOBILE: &str = "metamask-mobile";
pub const WALLET_WALLETCONNECT: &str = "walletconnect";

const MOBILE_MARKERS: [&str; 4] = ["iphone", "ipad", "ipod", "android"];

/// What the host page exposes: the injected wallet object, user agent and hostname
#[derive(Clone)]
pub struct BrowserEnvironment {
    pub ethereum: Option<Arc<dyn Eip1193Provider>>,
    pub user_agent: String,
    pub hostname: String,
}

impl fmt::Debug for BrowserEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BrowserEnvironment")
            .field("ethereum", &self.ethereum.is_some())
            .field("user_agent", &self.user_agent)
            .field("hostname", &self.hostname)
            .finish()
    }
}

impl BrowserEnvironment {
    pub fn new(
        ethereum: Option<Arc<dyn Eip1193Provider>>,
        user_agent: impl Into<String>,
        hostname: impl Into<String>,
    ) -> Self {
        Self {
            ethereum,
            user_agent: user_agent.into(),
            hostname: hostname.into(),
        }
    }

    pub fn is_mobile(&self) -> bool {
        is_mobile_device(&self.user_agent)
    }

    /// Deep link into the MetaMask app for this site, `None` on desktop
    pub fn deep_link(&self) -> Option<String> {
        deep_link_for(&self.user_agent, &self.hostname)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectedWallet {
    pub id: String,
    pub name: String,
    pub installed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deep_link: Option<String>,
}

impl DetectedWallet {
    fn installed(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            installed: true,
            deep_link: None,
        }
    }

    fn available(id: &str, name: &str, deep_link: Option<String>) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            installed: false,
            deep_link,
        }
    }
}

pub fn is_mobile_device(user_agent: &str) -> bool {
    let ua = user_agent.to_lowercase();
    MOBILE_MARKERS.iter().any(|marker| ua.contains(marker))
}

/// Name of the wallet whose embedded browser we are running in, if any
pub fn detect_wallet_browser(user_agent: &str) -> Option<&'static str> {
    let ua = user_agent.to_lowercase();
    if ua.contains("metamask") {
        Some("MetaMask")
    } else if ua.contains("trust") {
        Some("Trust Wallet")
    } else if ua.contains("coinbase") {
        Some("Coinbase Wallet")
    } else {
        None
    }
}

/// Android intent URI or universal link opening this site in MetaMask Mobile
pub fn deep_link_for(user_agent: &str, hostname: &str) -> Option<String> {
    if !is_mobile_device(user_agent) {
        return None;
    }
    if user_agent.to_lowercase().contains("android") {
        Some(format!(
            "intent://metamask.app.link/dapp/{}#Intent;scheme=https;package=io.metamask;end",
            hostname
        ))
    } else {
        Some(format!("https://metamask.app.link/dapp/{}", hostname))
    }
}

fn push_unique(detected: &mut Vec<DetectedWallet>, wallet: DetectedWallet) {
    if !detected.iter().any(|w| w.id == wallet.id) {
        detected.push(wallet);
    }
}

/// Enumerate the wallets the user can connect with
pub fn detect_wallets(env: &BrowserEnvironment) -> Vec<DetectedWallet> {
    let mut detected = Vec::new();

    if let Some(ethereum) = &env.ethereum {
        if ethereum.is_metamask() {
            push_unique(&mut detected, DetectedWallet::installed(WALLET_METAMASK, "MetaMask"));
        }
        if ethereum.is_coinbase_wallet() {
            push_unique(
                &mut detected,
                DetectedWallet::installed(WALLET_COINBASE, "Coinbase Wallet"),
            );
        }
        for provider in ethereum.providers() {
            if provider.is_metamask() {
                push_unique(&mut detected, DetectedWallet::installed(WALLET_METAMASK, "MetaMask"));
            }
            if provider.is_coinbase_wallet() {
                push_unique(
                    &mut detected,
                    DetectedWallet::installed(WALLET_COINBASE, "Coinbase Wallet"),
                );
            }
        }
    }

    if env.is_mobile() {
        let ua = env.user_agent.to_lowercase();
        let in_metamask = ua.contains("metamask");

        if in_metamask {
            push_unique(&mut detected, DetectedWallet::installed(WALLET_METAMASK, "MetaMask"));
        }
        if ua.contains("trust") {
            push_unique(&mut detected, DetectedWallet::installed(WALLET_TRUST, "Trust Wallet"));
        }
        if ua.contains("coinbase") {
            push_unique(
                &mut detected,
                DetectedWallet::installed(WALLET_COINBASE, "Coinbase Wallet"),
            );
        }
        if !in_metamask {
            detected.push(DetectedWallet::available(
                WALLET_METAMASK_MOBILE,
                "MetaMask Mobile",
                Some(format!("https://metamask.app.link/dapp/{}", env.hostname)),
            ));
        }
        detected.push(DetectedWallet::available(WALLET_WALLETCONNECT, "WalletConnect", None));
    } else {
        push_unique(
            &mut detected,
            DetectedWallet::available(WALLET_METAMASK, "MetaMask", None),
        );
        detected.push(DetectedWallet::available(WALLET_WALLETCONNECT, "WalletConnect", None));
    }

    log::debug!(
        "Detected wallets: {:?}",
        detected.iter().map(|w| w.id.as_str()).collect::<Vec<_>>()
    );
    detected
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::MockWallet;

    const DESKTOP_UA: &str =
        "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0";
    const IPHONE_UA: &str =
        "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) AppleWebKit/605.1.15 Mobile/15E148";
    const ANDROID_UA: &str = "Mozilla/5.0 (Linux; Android 14; Pixel 8) AppleWebKit/537.36 Mobile";

    fn ids(wallets: &[DetectedWallet]) -> Vec<&str> {
        wallets.iter().map(|w| w.id.as_str()).collect()
    }

    #[test]
    fn test_desktop_without_extension_offers_two_options() {
        let env = BrowserEnvironment::new(None, DESKTOP_UA, "equixtate.app");
        let wallets = detect_wallets(&env);
        assert_eq!(ids(&wallets), vec![WALLET_METAMASK, WALLET_WALLETCONNECT]);
        assert!(wallets.iter().all(|w| !w.installed));
    }

    #[test]
    fn test_multiple_providers_are_deduplicated() {
        let metamask: Arc<dyn Eip1193Provider> = Arc::new(MockWallet::metamask());
        let coinbase: Arc<dyn Eip1193Provider> = Arc::new(MockWallet::coinbase());
        let ethereum: Arc<dyn Eip1193Provider> =
            Arc::new(MockWallet::metamask().with_providers(vec![metamask, coinbase]));
        let env = BrowserEnvironment::new(Some(ethereum), DESKTOP_UA, "equixtate.app");

        let wallets = detect_wallets(&env);
        assert_eq!(
            ids(&wallets),
            vec![WALLET_METAMASK, WALLET_COINBASE, WALLET_WALLETCONNECT]
        );
        assert!(wallets[0].installed && wallets[1].installed);
    }

    #[test]
    fn test_mobile_outside_wallet_gets_deep_link() {
        let env = BrowserEnvironment::new(None, IPHONE_UA, "equixtate.app");
        let wallets = detect_wallets(&env);
        assert_eq!(ids(&wallets), vec![WALLET_METAMASK_MOBILE, WALLET_WALLETCONNECT]);
        assert_eq!(
            wallets[0].deep_link.as_deref(),
            Some("https://metamask.app.link/dapp/equixtate.app")
        );
    }

    #[test]
    fn test_inside_metamask_browser() {
        let ua = format!("{} MetaMaskMobile/7.0", ANDROID_UA);
        let env = BrowserEnvironment::new(None, ua.clone(), "equixtate.app");
        let wallets = detect_wallets(&env);
        assert_eq!(ids(&wallets), vec![WALLET_METAMASK, WALLET_WALLETCONNECT]);
        assert_eq!(detect_wallet_browser(&ua), Some("MetaMask"));
    }

    #[test]
    fn test_deep_link_per_platform() {
        assert_eq!(deep_link_for(DESKTOP_UA, "equixtate.app"), None);
        assert_eq!(
            deep_link_for(ANDROID_UA, "equixtate.app").as_deref(),
            Some("intent://metamask.app.link/dapp/equixtate.app#Intent;scheme=https;package=io.metamask;end")
        );
        assert_eq!(
            deep_link_for(IPHONE_UA, "equixtate.app").as_deref(),
            Some("https://metamask.app.link/dapp/equixtate.app")
        );
        assert!(is_mobile_device(IPHONE_UA));
        assert!(!is_mobile_device(DESKTOP_UA));
        assert_eq!(detect_wallet_browser(DESKTOP_UA), None);
    }
}
