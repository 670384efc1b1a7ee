mod common;

use std::time::Duration;

use common::*;
use equixtate_web3::provider::{Capability, ConnectBehavior};
use equixtate_web3::{
    ConnectError, ConnectionStatus, Eip1193Provider, MockWallet, ProviderEvent, WalletEventKind,
    WalletSignal,
};
use std::sync::Arc;

#[tokio::test]
async fn test_pre_authorized_wallet_reconnects_on_initialize() -> anyhow::Result<()> {
    let env = TestEnvironment::new(metamask_with_alice().pre_authorized())?;
    let mut signals = env.web3.subscribe();

    assert!(env.web3.initialize().await);

    let state = env.web3.connection_state();
    assert_eq!(state.status, ConnectionStatus::Connected);
    assert_eq!(state.address, Some(ALICE));
    assert_eq!(state.provider_type.as_deref(), Some("metamask"));
    assert_eq!(signals.try_recv()?, WalletSignal::Connected(ALICE));
    assert_eq!(
        env.wallet().request_count("eth_requestAccounts"),
        0,
        "initialize must never prompt"
    );
    assert!(env.web3.is_authenticated());
    Ok(())
}

#[tokio::test]
async fn test_silent_connect_tolerates_missing_wallet() -> anyhow::Result<()> {
    let env = TestEnvironment::without_wallet(DESKTOP_UA)?;
    assert!(!env.web3.initialize().await);
    assert!(!env.web3.try_silent_connect().await);
    assert_eq!(env.web3.connection_state().status, ConnectionStatus::Disconnected);
    Ok(())
}

#[tokio::test]
async fn test_address_present_iff_connected_across_cycles() -> anyhow::Result<()> {
    let env = TestEnvironment::new(metamask_with_alice())?;
    env.assert_address_iff_connected();

    for _ in 0..3 {
        assert_eq!(env.web3.connect_wallet("metamask").await?, Some(ALICE));
        env.assert_address_iff_connected();
        assert_eq!(env.web3.address(), Some(ALICE));

        env.web3.disconnect_wallet();
        env.assert_address_iff_connected();
        assert_eq!(env.web3.address(), None);
    }
    Ok(())
}

#[tokio::test]
async fn test_disconnect_is_idempotent() -> anyhow::Result<()> {
    let env = TestEnvironment::new(metamask_with_alice())?;
    env.web3.connect_wallet("metamask").await?;

    env.web3.disconnect_wallet();
    assert_eq!(env.web3.connection_state().status, ConnectionStatus::Disconnected);
    env.web3.disconnect_wallet();
    assert_eq!(env.web3.connection_state().status, ConnectionStatus::Disconnected);

    assert!(!env.web3.connection().contracts().is_initialized());
    assert_eq!(env.web3.connection().events().installed_count(), 0);
    assert_eq!(env.notifier.count("Wallet Disconnected"), 2);
    Ok(())
}

#[tokio::test]
async fn test_empty_accounts_event_always_disconnects() -> anyhow::Result<()> {
    // From CONNECTED
    let env = TestEnvironment::new(metamask_with_alice().pre_authorized())?;
    assert!(env.web3.initialize().await);
    let mut signals = env.web3.subscribe();

    env.wallet().emit(ProviderEvent::AccountsChanged(vec![]));
    assert_eq!(env.web3.process_pending_events().await, 1);
    assert_eq!(env.web3.connection_state().status, ConnectionStatus::Disconnected);
    assert_eq!(signals.try_recv()?, WalletSignal::Disconnected);
    assert_eq!(
        env.notifier.last().unwrap().description,
        "Your wallet has been locked or disconnected."
    );

    // From ERROR
    let env = TestEnvironment::new(metamask_with_alice())?;
    env.wallet().set_connect_behavior(ConnectBehavior::Reject);
    assert!(env.web3.connect_wallet("metamask").await.is_err());
    assert_eq!(env.web3.connection_state().status, ConnectionStatus::Error);

    env.web3
        .connection()
        .handle_event(ProviderEvent::AccountsChanged(vec![]))
        .await;
    assert_eq!(env.web3.connection_state().status, ConnectionStatus::Disconnected);
    Ok(())
}

#[tokio::test]
async fn test_listener_install_is_idempotent() -> anyhow::Result<()> {
    let env = TestEnvironment::new(metamask_with_alice().pre_authorized())?;
    for _ in 0..4 {
        assert!(env.web3.initialize().await);
    }

    for kind in WalletEventKind::ALL {
        assert_eq!(env.wallet().listener_count(kind), 1, "{} listeners", kind);
    }

    let fired = env
        .wallet()
        .emit(ProviderEvent::ChainChanged("0xaa36a7".to_string()));
    assert_eq!(fired, 1);
    assert_eq!(env.web3.process_pending_events().await, 1);
    assert_eq!(env.notifier.count("Network Changed"), 1);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_connect_timeout_moves_to_error() -> anyhow::Result<()> {
    let env = TestEnvironment::new(metamask_with_alice())?;
    env.wallet().set_connect_behavior(ConnectBehavior::Hang);

    let result = env.web3.connect_wallet("metamask").await;

    assert_eq!(result, Err(ConnectError::Timeout(Duration::from_secs(15))));
    assert_eq!(env.web3.connection_state().status, ConnectionStatus::Error);
    let notification = env.notifier.find("Connection Timeout").unwrap();
    assert!(notification.is_error());
    assert_eq!(
        notification.description,
        "Connection request timed out. Please check your wallet extension."
    );
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_settled_connect_leaves_no_timer_behind() -> anyhow::Result<()> {
    let env = TestEnvironment::new(metamask_with_alice())?;
    assert_eq!(env.web3.connect_wallet("metamask").await?, Some(ALICE));
    let before = env.notifier.notifications().len();

    tokio::time::advance(Duration::from_secs(60)).await;
    tokio::task::yield_now().await;

    assert_eq!(env.web3.connection_state().status, ConnectionStatus::Connected);
    assert_eq!(env.notifier.notifications().len(), before);
    assert!(env.notifier.find("Connection Timeout").is_none());
    Ok(())
}

#[tokio::test]
async fn test_rejection_and_pending_have_distinct_messages() -> anyhow::Result<()> {
    let env = TestEnvironment::new(metamask_with_alice())?;

    env.wallet().set_connect_behavior(ConnectBehavior::Reject);
    assert_eq!(
        env.web3.connect_wallet("metamask").await,
        Err(ConnectError::UserRejected)
    );
    let rejected = env.notifier.last().unwrap();

    env.wallet().set_connect_behavior(ConnectBehavior::AlreadyPending);
    assert_eq!(
        env.web3.connect_wallet("metamask").await,
        Err(ConnectError::AlreadyPending)
    );
    let pending = env.notifier.last().unwrap();

    env.wallet()
        .set_connect_behavior(ConnectBehavior::Fail("Extension crashed".to_string()));
    assert!(matches!(
        env.web3.connect_wallet("metamask").await,
        Err(ConnectError::Provider(_))
    ));
    let other = env.notifier.last().unwrap();

    assert_eq!(rejected.title, "Connection Cancelled");
    assert_eq!(pending.title, "Connection Pending");
    assert_eq!(other.title, "Connection Failed");
    assert_eq!(other.description, "Extension crashed");
    Ok(())
}

#[tokio::test]
async fn test_retry_after_error_connects() -> anyhow::Result<()> {
    let env = TestEnvironment::new(metamask_with_alice())?;
    env.wallet().set_connect_behavior(ConnectBehavior::Reject);
    assert!(env.web3.connect_wallet("metamask").await.is_err());
    assert_eq!(env.web3.connection_state().status, ConnectionStatus::Error);

    env.wallet().set_connect_behavior(ConnectBehavior::Approve);
    assert_eq!(env.web3.connect_wallet("metamask").await?, Some(ALICE));
    assert_eq!(env.web3.connection_state().status, ConnectionStatus::Connected);
    assert_eq!(
        env.notifier.last().unwrap().description,
        "Your wallet has been successfully connected."
    );
    Ok(())
}

#[tokio::test]
async fn test_desktop_without_wallet_fails_with_no_provider() -> anyhow::Result<()> {
    let env = TestEnvironment::without_wallet(DESKTOP_UA)?;

    assert_eq!(
        env.web3.connect_wallet("metamask").await,
        Err(ConnectError::NoProvider)
    );
    let state = env.web3.connection_state();
    assert_eq!(state.status, ConnectionStatus::Error);
    assert_eq!(state.address, None);
    assert_eq!(env.notifier.last().unwrap().title, "No Wallet Found");
    assert!(env.navigator.opened().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_iphone_without_wallet_uses_universal_link() -> anyhow::Result<()> {
    let env = TestEnvironment::without_wallet(IPHONE_UA)?;

    assert_eq!(env.web3.connect_wallet("metamask").await, Ok(None));
    assert_eq!(
        env.navigator.opened(),
        vec!["https://metamask.app.link/dapp/equixtate.app".to_string()]
    );
    assert_eq!(env.web3.connection_state().status, ConnectionStatus::Disconnected);
    Ok(())
}

#[tokio::test]
async fn test_multiple_providers_prefer_metamask() -> anyhow::Result<()> {
    let coinbase: Arc<dyn Eip1193Provider> =
        Arc::new(MockWallet::coinbase().with_accounts(vec![BOB]));
    let metamask: Arc<dyn Eip1193Provider> = Arc::new(metamask_with_alice());
    let env = TestEnvironment::new(MockWallet::new().with_providers(vec![coinbase, metamask]))?;

    assert_eq!(env.web3.connect_wallet("metamask").await?, Some(ALICE));
    assert_eq!(
        env.web3.connection_state().provider_type.as_deref(),
        Some("metamask")
    );
    Ok(())
}

#[tokio::test]
async fn test_provider_missing_capability_is_incompatible() -> anyhow::Result<()> {
    let env = TestEnvironment::new(
        metamask_with_alice().without_capability(Capability::RemoveListener),
    )?;

    assert_eq!(
        env.web3.connect_wallet("metamask").await,
        Err(ConnectError::InvalidProvider)
    );
    assert_eq!(env.notifier.last().unwrap().title, "Incompatible Wallet");
    assert_eq!(env.wallet().request_count("eth_requestAccounts"), 0);
    Ok(())
}

#[tokio::test]
async fn test_stale_signer_triggers_silent_reconnect() -> anyhow::Result<()> {
    let env = TestEnvironment::new(MockWallet::metamask().with_accounts(vec![ALICE, BOB]))?;
    env.web3.connect_wallet("metamask").await?;
    assert!(env.web3.is_wallet_connected().await);

    // Extension now exposes only BOB: ALICE's signer is stale, BOB is picked up
    env.wallet().set_accounts(vec![BOB]);
    assert!(env.web3.is_wallet_connected().await);
    assert_eq!(env.web3.address(), Some(BOB));

    // Permission revoked: nothing to reconnect to
    env.wallet().revoke();
    assert!(!env.web3.is_wallet_connected().await);
    assert_eq!(env.web3.connection_state().status, ConnectionStatus::Disconnected);
    Ok(())
}

#[tokio::test]
async fn test_account_switch_rebinds_contracts() -> anyhow::Result<()> {
    let env = TestEnvironment::new(MockWallet::metamask().with_accounts(vec![ALICE, BOB]))?;
    env.web3.connect_wallet("metamask").await?;
    let mut signals = env.web3.subscribe();

    env.wallet().emit(ProviderEvent::AccountsChanged(vec![BOB]));
    env.web3.process_pending_events().await;

    assert_eq!(env.web3.address(), Some(BOB));
    let governance = env
        .web3
        .connection()
        .contracts()
        .get_governance_contract()
        .unwrap();
    assert_eq!(governance.handle().signer_address(), Some(BOB));
    assert_eq!(signals.try_recv()?, WalletSignal::AccountChanged(BOB));
    assert_eq!(env.notifier.last().unwrap().title, "Account Changed");
    Ok(())
}

#[tokio::test]
async fn test_events_queued_before_disconnect_are_discarded() -> anyhow::Result<()> {
    let env = TestEnvironment::new(
        MockWallet::metamask()
            .with_accounts(vec![ALICE, BOB])
            .pre_authorized(),
    )?;
    assert!(env.web3.initialize().await);

    env.wallet().emit(ProviderEvent::AccountsChanged(vec![BOB]));
    env.web3.disconnect_wallet();

    assert_eq!(env.web3.process_pending_events().await, 0);
    let state = env.web3.connection_state();
    assert_eq!(state.status, ConnectionStatus::Disconnected);
    assert_eq!(state.address, None);
    for kind in WalletEventKind::ALL {
        assert_eq!(env.wallet().listener_count(kind), 0);
    }
    Ok(())
}

#[tokio::test]
async fn test_new_connect_discards_events_of_previous_session() -> anyhow::Result<()> {
    let env = TestEnvironment::new(metamask_with_alice())?;
    env.web3.connect_wallet("metamask").await?;

    env.wallet().emit(ProviderEvent::Disconnect(None));
    assert_eq!(env.web3.connect_wallet("metamask").await?, Some(ALICE));

    assert_eq!(env.web3.process_pending_events().await, 0);
    assert_eq!(env.web3.connection_state().status, ConnectionStatus::Connected);
    Ok(())
}

#[tokio::test]
async fn test_wallet_events_without_session_are_ignored() -> anyhow::Result<()> {
    let env = TestEnvironment::new(metamask_with_alice().pre_authorized())?;
    let mut signals = env.web3.subscribe();
    let connection = env.web3.connection();

    connection
        .handle_event(ProviderEvent::AccountsChanged(vec![ALICE]))
        .await;
    connection
        .handle_event(ProviderEvent::ChainChanged("0x89".to_string()))
        .await;

    assert_eq!(env.web3.connection_state().status, ConnectionStatus::Disconnected);
    assert!(env.notifier.notifications().is_empty());
    assert!(signals.try_recv().is_err());
    assert_eq!(env.wallet().request_count("eth_accounts"), 0);
    Ok(())
}

#[tokio::test]
async fn test_connected_check_reconnects_authorized_wallet() -> anyhow::Result<()> {
    let env = TestEnvironment::new(metamask_with_alice().pre_authorized())?;
    assert_eq!(env.web3.connection_state().status, ConnectionStatus::Disconnected);

    assert!(env.web3.is_wallet_connected().await);
    assert_eq!(env.web3.address(), Some(ALICE));

    let env = TestEnvironment::new(metamask_with_alice())?;
    assert!(!env.web3.is_wallet_connected().await);
    assert_eq!(env.wallet().request_count("eth_requestAccounts"), 0);
    Ok(())
}
