mod common;

use alloy_primitives::{Bytes, U256};
use alloy_sol_types::{SolCall, SolValue};
use common::*;
use equixtate_web3::contracts::{IGovernance, IPropertyToken};
use equixtate_web3::{ConnectionStatus, ProviderError, SessionStore, TxOutcome};

fn ether(amount: u64) -> U256 {
    U256::from(amount) * U256::from(10u64).pow(U256::from(18u64))
}

/// Governance answering `count` proposals, reverting from then on
fn with_proposals(env: &TestEnvironment, count: u64) {
    env.wallet()
        .on_call(IGovernance::getProposalDetailsCall::SELECTOR, move |data| {
            let call = IGovernance::getProposalDetailsCall::abi_decode(data)
                .map_err(|e| ProviderError::new(-32602, e.to_string()))?;
            if call.proposalId >= U256::from(count) {
                return Err(ProviderError::new(-32000, "execution reverted"));
            }
            Ok(Bytes::from(
                (
                    call.proposalId,
                    U256::from(1u64),
                    format!("Proposal {}", call.proposalId),
                    "Repaint the lobby".to_string(),
                    ether(10),
                    ether(4),
                    U256::from(1_735_689_600u64),
                    U256::from(1_736_294_400u64),
                    false,
                    false,
                )
                    .abi_encode_params(),
            ))
        });
    env.wallet()
        .on_call(IGovernance::hasVotedCall::SELECTOR, |_| Ok(Bytes::from(true.abi_encode())));
}

async fn connected_env() -> anyhow::Result<TestEnvironment> {
    let env = TestEnvironment::new(metamask_with_alice())?;
    env.web3.connect_wallet("metamask").await?;
    Ok(env)
}

#[tokio::test]
async fn test_buy_scales_amount_and_reports_it() -> anyhow::Result<()> {
    let env = connected_env().await?;

    assert!(env.web3.buy_property_tokens(7, 150.0).await);

    let sent = env.wallet().sent_transactions();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].from, ALICE);
    assert_eq!(sent[0].to, env.web3.connection().config().contracts.token);
    let call = IPropertyToken::purchaseTokensCall::abi_decode(&sent[0].data)?;
    assert_eq!(call.propertyId, U256::from(7u64));
    assert_eq!(call.amount, ether(150));

    let notification = env.notifier.last().unwrap();
    assert_eq!(notification.title, "Purchase Successful");
    assert!(notification.description.contains("150"));
    assert!(notification.description.contains("#7"));
    Ok(())
}

#[tokio::test]
async fn test_reverted_purchase_keeps_connection() -> anyhow::Result<()> {
    let env = connected_env().await?;
    env.wallet()
        .on_transaction(IPropertyToken::purchaseTokensCall::SELECTOR, |_| {
            TxOutcome::Revert
        });

    assert!(!env.web3.buy_property_tokens(1, 2.0).await);

    let notification = env.notifier.last().unwrap();
    assert_eq!(notification.title, "Purchase Failed");
    assert!(notification.is_error());
    assert_eq!(env.web3.connection_state().status, ConnectionStatus::Connected);
    assert_eq!(env.web3.address(), Some(ALICE));
    Ok(())
}

#[tokio::test]
async fn test_operations_without_wallet_fail_softly() -> anyhow::Result<()> {
    let env = TestEnvironment::new(metamask_with_alice())?;

    assert!(!env.web3.buy_property_tokens(1, 1.0).await);
    assert!(env.web3.get_property_details(1).await.is_none());
    assert_eq!(env.web3.get_user_token_balance(1).await, 0.0);
    assert!(env.web3.get_governance_proposals().await.is_empty());
    assert_eq!(env.web3.get_balance().await, "0");
    assert!(env.web3.get_network().await.is_none());

    assert_eq!(env.web3.connection_state().status, ConnectionStatus::Disconnected);
    assert!(env.wallet().sent_transactions().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_proposal_scan_stops_at_first_failure() -> anyhow::Result<()> {
    let env = connected_env().await?;
    with_proposals(&env, 3);

    let proposals = env.web3.get_governance_proposals().await;

    let ids: Vec<u64> = proposals.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![0, 1, 2]);
    assert!(proposals.iter().all(|p| p.has_voted));
    assert_eq!(proposals[0].votes_for, 10.0);
    assert_eq!(proposals[0].votes_against, 4.0);
    Ok(())
}

#[tokio::test]
async fn test_native_buy_pays_price_times_amount() -> anyhow::Result<()> {
    let env = connected_env().await?;
    let price = U256::from(2_500_000_000_000_000u64);
    env.wallet()
        .on_call(IPropertyToken::tokenPriceCall::SELECTOR, move |_| {
            Ok(Bytes::from(price.abi_encode()))
        });

    assert!(env.web3.buy_tokens_with_native(2, 4).await);

    let sent = env.wallet().sent_transactions();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].value, price * U256::from(4u64));
    let call = IPropertyToken::buyTokensCall::abi_decode(&sent[0].data)?;
    assert_eq!(call.amount, U256::from(4u64));
    assert_eq!(
        env.notifier.last().unwrap().description,
        "You have purchased 4 tokens of property #2"
    );
    Ok(())
}

#[tokio::test]
async fn test_session_flag_follows_wallet() -> anyhow::Result<()> {
    let env = connected_env().await?;
    let store = SessionStore::new_with_base_dir(env.temp_dir.path().to_path_buf());
    assert!(store.is_authenticated()?);
    assert!(env.web3.is_authenticated());

    env.web3.disconnect_wallet();
    assert!(!store.is_authenticated()?);
    assert!(!env.web3.is_authenticated());
    Ok(())
}
