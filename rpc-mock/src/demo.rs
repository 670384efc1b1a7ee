/// Demo marketplace state served by the mock node
///
/// Contract reads are answered from a small fixed catalogue. Governance has
/// two live proposals; reading any later id reverts, which ends the client's
/// proposal scan.

use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::{SolCall, SolValue};
use equixtate_web3::contracts::{IGovernance, IPropertyToken, PropertyRecord};
use equixtate_web3::{MockWallet, ProviderError};

/// Wei per USD used to price tokens in the native currency
const WEI_PER_USD: u64 = 500_000_000_000_000;

pub struct DemoProperty {
    pub id: u64,
    pub name: &'static str,
    pub property_type: &'static str,
    pub location: &'static str,
    pub total_tokens: u64,
    pub available_tokens: u64,
    pub token_price_usd: u64,
}

pub const DEMO_PROPERTIES: [DemoProperty; 4] = [
    DemoProperty {
        id: 1,
        name: "Cantonments Luxury Apartments",
        property_type: "Fractional",
        location: "Accra, Ghana",
        total_tokens: 10_000,
        available_tokens: 435,
        token_price_usd: 50,
    },
    DemoProperty {
        id: 2,
        name: "Airport Residential Estate",
        property_type: "Buy",
        location: "Accra, Ghana",
        total_tokens: 1_000,
        available_tokens: 278,
        token_price_usd: 35,
    },
    DemoProperty {
        id: 3,
        name: "Labadi Beach Villa",
        property_type: "Auction",
        location: "Accra, Ghana",
        total_tokens: 2_000,
        available_tokens: 782,
        token_price_usd: 60,
    },
    DemoProperty {
        id: 4,
        name: "East Legon Loft",
        property_type: "Rent",
        location: "Accra, Ghana",
        total_tokens: 500,
        available_tokens: 124,
        token_price_usd: 20,
    },
];

struct DemoProposal {
    property_id: u64,
    title: &'static str,
    description: &'static str,
    votes_for: u64,
    votes_against: u64,
}

const DEMO_PROPOSALS: [DemoProposal; 2] = [
    DemoProposal {
        property_id: 1,
        title: "Install rooftop solar array",
        description: "Fund a 40 kW solar installation from the maintenance reserve.",
        votes_for: 1_250,
        votes_against: 310,
    },
    DemoProposal {
        property_id: 3,
        title: "Extend the auction by 7 days",
        description: "Keep the Labadi Beach Villa auction open for another week.",
        votes_for: 420,
        votes_against: 515,
    },
];

/// Proposal voting window start (unix seconds)
const VOTING_START: u64 = 1_735_689_600;
const VOTING_PERIOD: u64 = 7 * 24 * 60 * 60;

fn find_property(id: U256) -> Option<&'static DemoProperty> {
    DEMO_PROPERTIES.iter().find(|p| U256::from(p.id) == id)
}

fn decode_error(err: alloy_sol_types::Error) -> ProviderError {
    ProviderError::new(-32602, format!("invalid calldata: {}", err))
}

fn reverted() -> ProviderError {
    ProviderError::new(-32000, "execution reverted")
}

fn encoded<T: SolValue>(value: T) -> Bytes {
    Bytes::from(value.abi_encode())
}

fn whole_tokens(amount: u64) -> U256 {
    U256::from(amount) * U256::from(10u64).pow(U256::from(18u64))
}

/// A wallet preloaded with the demo catalogue, authorized for `accounts`
pub fn demo_wallet(accounts: Vec<Address>, chain_id: u64) -> MockWallet {
    let owner = accounts.first().copied().unwrap_or(Address::ZERO);
    let wallet = MockWallet::new()
        .with_accounts(accounts)
        .pre_authorized()
        .with_chain_id(chain_id);
    wallet.set_balance(whole_tokens(10));

    wallet.on_call(IPropertyToken::getPropertyCall::SELECTOR, move |data| {
        let call = IPropertyToken::getPropertyCall::abi_decode(data).map_err(decode_error)?;
        let property = find_property(call.propertyId).ok_or_else(reverted)?;
        Ok(encoded(PropertyRecord {
            id: U256::from(property.id),
            name: property.name.to_string(),
            propertyType: property.property_type.to_string(),
            location: property.location.to_string(),
            totalTokens: whole_tokens(property.total_tokens),
            availableTokens: whole_tokens(property.available_tokens),
            pricePerToken: U256::from(property.token_price_usd * 100),
            owner,
            isActive: true,
            metadataURI: format!("ipfs://equixtate/properties/{}", property.id),
        }))
    });

    wallet.on_call(IPropertyToken::tokenPriceCall::SELECTOR, |data| {
        let call = IPropertyToken::tokenPriceCall::abi_decode(data).map_err(decode_error)?;
        let property = find_property(call.propertyId).ok_or_else(reverted)?;
        Ok(encoded(
            U256::from(property.token_price_usd) * U256::from(WEI_PER_USD),
        ))
    });

    wallet.on_call(IPropertyToken::availableTokensCall::SELECTOR, |data| {
        let call = IPropertyToken::availableTokensCall::abi_decode(data).map_err(decode_error)?;
        let property = find_property(call.propertyId).ok_or_else(reverted)?;
        Ok(encoded(U256::from(property.available_tokens)))
    });

    wallet.on_call(IPropertyToken::totalSupplyCall::SELECTOR, |data| {
        let call = IPropertyToken::totalSupplyCall::abi_decode(data).map_err(decode_error)?;
        let property = find_property(call.propertyId).ok_or_else(reverted)?;
        Ok(encoded(U256::from(property.total_tokens)))
    });

    // Every account holds 25 tokens of property 1 and nothing else
    wallet.on_call(IPropertyToken::balanceOfCall::SELECTOR, |data| {
        let call = IPropertyToken::balanceOfCall::abi_decode(data).map_err(decode_error)?;
        let balance = if call.id == U256::from(1u64) {
            whole_tokens(25)
        } else {
            U256::ZERO
        };
        Ok(encoded(balance))
    });

    wallet.on_call(IGovernance::getProposalDetailsCall::SELECTOR, |data| {
        let call = IGovernance::getProposalDetailsCall::abi_decode(data).map_err(decode_error)?;
        let index: usize = call.proposalId.saturating_to();
        let proposal = DEMO_PROPOSALS.get(index).ok_or_else(reverted)?;
        let start = VOTING_START + index as u64 * VOTING_PERIOD;
        Ok(Bytes::from(
            (
                call.proposalId,
                U256::from(proposal.property_id),
                proposal.title.to_string(),
                proposal.description.to_string(),
                whole_tokens(proposal.votes_for),
                whole_tokens(proposal.votes_against),
                U256::from(start),
                U256::from(start + VOTING_PERIOD),
                false,
                false,
            )
                .abi_encode_params(),
        ))
    });

    wallet.on_call(IGovernance::hasVotedCall::SELECTOR, |_| Ok(encoded(false)));

    log::info!(
        "🏠 Demo catalogue: {} properties, {} proposals",
        DEMO_PROPERTIES.len(),
        DEMO_PROPOSALS.len()
    );
    wallet
}
