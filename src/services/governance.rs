//! Governance proposals: listing, voting, creation, execution, cancellation

use alloy_primitives::{Address, Bytes, U256};
use chrono::{DateTime, Utc};
use serde::Serialize;

use super::ServiceContext;
use crate::contracts::GovernanceContract;
use crate::error::Result;
use crate::units::from_base_units;

/// Votes are token-weighted and reported with the token's 18 decimals
const VOTE_DECIMALS: u8 = 18;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Proposal {
    pub id: u64,
    pub property_id: u64,
    pub title: String,
    pub description: String,
    pub votes_for: f64,
    pub votes_against: f64,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub executed: bool,
    pub canceled: bool,
    pub has_voted: bool,
}

fn timestamp(seconds: U256) -> DateTime<Utc> {
    DateTime::from_timestamp(seconds.saturating_to::<i64>(), 0).unwrap_or_default()
}

pub struct GovernanceService {
    ctx: ServiceContext,
    scan_limit: u64,
}

impl GovernanceService {
    pub fn new(ctx: ServiceContext, scan_limit: u64) -> Self {
        Self { ctx, scan_limit }
    }

    /// List proposals by probing ids `0..scan_limit`
    ///
    /// Ids with an empty title are skipped. The scan stops at the first id
    /// that cannot be read, so only the proposals before it are returned.
    pub async fn get_governance_proposals(&self) -> Vec<Proposal> {
        let contract = match self.ctx.governance() {
            Ok(contract) => contract,
            Err(e) => {
                log::error!("Error getting governance proposals: {}", e);
                return Vec::new();
            }
        };
        let voter = self.ctx.registry.address();

        let mut proposals = Vec::new();
        for index in 0..self.scan_limit {
            match read_proposal(&contract, index, voter).await {
                Ok(Some(proposal)) => proposals.push(proposal),
                Ok(None) => {}
                Err(e) => {
                    log::debug!("Proposal scan stopped at {}: {}", index, e);
                    break;
                }
            }
        }
        proposals
    }

    pub async fn vote_on_proposal(&self, proposal_id: u64, support: bool) -> bool {
        let result: Result<()> = async {
            let contract = self.ctx.governance()?;
            self.ctx.require_signer()?;
            contract.cast_vote(U256::from(proposal_id), support).await?;
            Ok(())
        }
        .await;

        match result {
            Ok(()) => {
                self.ctx.succeed(
                    "Vote Cast Successfully",
                    format!("Your vote has been recorded for proposal #{}", proposal_id),
                );
                true
            }
            Err(e) => {
                self.ctx.fail(
                    "Error voting on proposal",
                    "Voting Failed",
                    "Failed to cast your vote",
                    &e,
                );
                false
            }
        }
    }

    /// Create a proposal
    ///
    /// # Arguments
    ///
    /// * `target` - contract the proposal calls when executed, zero address when `None`
    /// * `call_data` - calldata for `target`, empty when `None`
    ///
    /// # Returns
    ///
    /// The proposal id taken from the `ProposalCreated` event, if emitted.
    pub async fn create_proposal(
        &self,
        property_id: u64,
        title: &str,
        description: &str,
        target: Option<Address>,
        call_data: Option<Bytes>,
    ) -> Option<u64> {
        let result: Result<Option<U256>> = async {
            let contract = self.ctx.governance()?;
            let (_, id) = contract
                .create_proposal(
                    U256::from(property_id),
                    title.to_string(),
                    description.to_string(),
                    target.unwrap_or(Address::ZERO),
                    call_data.unwrap_or_default(),
                )
                .await?;
            Ok(id)
        }
        .await;

        match result {
            Ok(Some(id)) => {
                let id: u64 = id.saturating_to();
                self.ctx.succeed(
                    "Proposal Created",
                    format!("Your proposal \"{}\" has been created with ID: {}", title, id),
                );
                Some(id)
            }
            Ok(None) => {
                self.ctx.succeed(
                    "Proposal Created",
                    format!("Your proposal \"{}\" has been created", title),
                );
                None
            }
            Err(e) => {
                self.ctx.fail(
                    "Error creating proposal",
                    "Proposal Creation Failed",
                    "Failed to create proposal",
                    &e,
                );
                None
            }
        }
    }

    pub async fn execute_proposal(&self, proposal_id: u64) -> bool {
        let result: Result<()> = async {
            let contract = self.ctx.governance()?;
            contract.execute_proposal(U256::from(proposal_id)).await?;
            Ok(())
        }
        .await;

        match result {
            Ok(()) => {
                self.ctx.succeed(
                    "Proposal Executed",
                    format!("Proposal #{} has been executed successfully", proposal_id),
                );
                true
            }
            Err(e) => {
                self.ctx.fail(
                    "Error executing proposal",
                    "Execution Failed",
                    "Failed to execute proposal",
                    &e,
                );
                false
            }
        }
    }

    pub async fn cancel_proposal(&self, proposal_id: u64) -> bool {
        let result: Result<()> = async {
            let contract = self.ctx.governance()?;
            contract.cancel_proposal(U256::from(proposal_id)).await?;
            Ok(())
        }
        .await;

        match result {
            Ok(()) => {
                self.ctx.succeed(
                    "Proposal Canceled",
                    format!("Proposal #{} has been canceled", proposal_id),
                );
                true
            }
            Err(e) => {
                self.ctx.fail(
                    "Error canceling proposal",
                    "Cancellation Failed",
                    "Failed to cancel proposal",
                    &e,
                );
                false
            }
        }
    }
}

/// `None` for an empty slot (blank title)
async fn read_proposal(
    contract: &GovernanceContract,
    index: u64,
    voter: Option<Address>,
) -> Result<Option<Proposal>> {
    let id = U256::from(index);
    let details = contract.get_proposal_details(id).await?;
    if details.title.is_empty() {
        return Ok(None);
    }

    let has_voted = match voter {
        Some(voter) => contract.has_voted(id, voter).await?,
        None => false,
    };

    Ok(Some(Proposal {
        id: details.id.saturating_to(),
        property_id: details.propertyId.saturating_to(),
        title: details.title,
        description: details.description,
        votes_for: from_base_units(details.votesFor, VOTE_DECIMALS),
        votes_against: from_base_units(details.votesAgainst, VOTE_DECIMALS),
        start_time: timestamp(details.startTime),
        end_time: timestamp(details.endTime),
        executed: details.executed,
        canceled: details.canceled,
        has_voted,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contracts::IGovernance;
    use crate::error::ProviderError;
    use crate::provider::mock::MockLog;
    use crate::provider::TxOutcome;
    use crate::services::test_support::{connected, disconnected};
    use alloy_primitives::B256;
    use alloy_sol_types::{SolCall, SolEvent, SolValue};

    fn encode_proposal(index: u64, title: &str) -> Bytes {
        let one_token = U256::from(10u64).pow(U256::from(18u64));
        Bytes::from(
            (
                U256::from(index),
                U256::from(7u64),
                title.to_string(),
                format!("Details of {}", title),
                U256::from(12u64) * one_token,
                U256::from(3u64) * one_token,
                U256::from(1_700_000_000u64),
                U256::from(1_700_604_800u64),
                false,
                false,
            )
                .abi_encode_params(),
        )
    }

    fn proposal_index(calldata: &[u8]) -> u64 {
        IGovernance::getProposalDetailsCall::abi_decode(calldata)
            .map(|call| call.proposalId.saturating_to())
            .unwrap_or(u64::MAX)
    }

    #[tokio::test]
    async fn test_scan_stops_at_first_unreadable_proposal() {
        let fx = connected();
        fx.wallet
            .on_call(IGovernance::getProposalDetailsCall::SELECTOR, |data| {
                match proposal_index(data) {
                    i if i < 3 => Ok(encode_proposal(i, &format!("Proposal {}", i))),
                    3 => Err(ProviderError::new(-32000, "execution reverted")),
                    i => Ok(encode_proposal(i, "Unreachable")),
                }
            });
        fx.wallet.on_call(IGovernance::hasVotedCall::SELECTOR, |_| {
            Ok(Bytes::from(true.abi_encode()))
        });

        let service = GovernanceService::new(fx.ctx.clone(), 10);
        let proposals = service.get_governance_proposals().await;

        assert_eq!(
            proposals.iter().map(|p| p.id).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
        assert!(proposals.iter().all(|p| p.has_voted));
        assert_eq!(proposals[0].votes_for, 12.0);
        assert_eq!(proposals[0].start_time.timestamp(), 1_700_000_000);
        assert_eq!(
            fx.wallet.request_count("eth_call"),
            4 + 3,
            "ids 0..=3 read, hasVoted for 0..=2, nothing past the failure"
        );
    }

    #[tokio::test]
    async fn test_scan_skips_blank_titles_and_honours_limit() {
        let fx = connected();
        fx.wallet
            .on_call(IGovernance::getProposalDetailsCall::SELECTOR, |data| {
                let i = proposal_index(data);
                let title = if i % 2 == 0 { String::new() } else { format!("P{}", i) };
                Ok(encode_proposal(i, &title))
            });
        fx.wallet.on_call(IGovernance::hasVotedCall::SELECTOR, |_| {
            Ok(Bytes::from(false.abi_encode()))
        });

        let service = GovernanceService::new(fx.ctx.clone(), 6);
        let ids: Vec<u64> = service
            .get_governance_proposals()
            .await
            .iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids, vec![1, 3, 5]);
    }

    #[tokio::test]
    async fn test_create_proposal_defaults_and_event_id() {
        let fx = connected();
        let governance = fx.ctx.contracts.addresses().governance;
        fx.wallet
            .on_transaction(IGovernance::createProposalCall::SELECTOR, move |_| {
                TxOutcome::Success(vec![MockLog {
                    address: governance,
                    topics: vec![
                        IGovernance::ProposalCreated::SIGNATURE_HASH,
                        B256::left_padding_from(&5u64.to_be_bytes()),
                        B256::left_padding_from(&7u64.to_be_bytes()),
                    ],
                    data: Bytes::new(),
                }])
            });

        let service = GovernanceService::new(fx.ctx.clone(), 10);
        let id = service
            .create_proposal(7, "Repaint facade", "Exterior works", None, None)
            .await;
        assert_eq!(id, Some(5));

        let sent = fx.wallet.sent_transactions();
        let call = IGovernance::createProposalCall::abi_decode(&sent[0].data).unwrap();
        assert_eq!(call.targetContract, Address::ZERO);
        assert!(call.callData.is_empty());
    }

    #[tokio::test]
    async fn test_vote_requires_connection() {
        let fx = disconnected();
        let service = GovernanceService::new(fx.ctx.clone(), 10);
        assert!(!service.vote_on_proposal(1, true).await);
        assert_eq!(fx.notifier.last().unwrap().title, "Voting Failed");
        assert!(service.get_governance_proposals().await.is_empty());
    }

    #[tokio::test]
    async fn test_execute_and_cancel_notify() {
        let fx = connected();
        let service = GovernanceService::new(fx.ctx.clone(), 10);
        assert!(service.execute_proposal(2).await);
        assert!(service.cancel_proposal(3).await);
        assert_eq!(
            fx.notifier.titles(),
            vec!["Proposal Executed".to_string(), "Proposal Canceled".to_string()]
        );
    }
}
