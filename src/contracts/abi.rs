//! Contract interfaces
//!
//! The marketplace functions live in the property token contract, so the
//! marketplace handle reuses [`IPropertyToken`].

#![allow(missing_docs)]

use alloy_sol_types::sol;

sol! {
    /// On-chain property record
    #[derive(Debug, PartialEq)]
    struct PropertyRecord {
        uint256 id;
        string name;
        string propertyType;
        string location;
        uint256 totalTokens;
        uint256 availableTokens;
        uint256 pricePerToken;
        address owner;
        bool isActive;
        string metadataURI;
    }

    /// EquiX property token (ERC-1155 style, one id per property)
    #[derive(Debug, PartialEq)]
    interface IPropertyToken {
        event PropertyCreated(uint256 indexed propertyId, string name, string propertyType, uint256 totalTokens);
        event TokensPurchased(uint256 indexed propertyId, address buyer, uint256 amount, uint256 cost);
        event RentalIncomeDistributed(uint256 indexed propertyId, uint256 amount);
        event RentalIncomeClaimed(uint256 indexed propertyId, address user, uint256 amount);
        event AuctionCreated(uint256 indexed propertyId, uint256 startingPrice, uint256 endTime);
        event AuctionBid(uint256 indexed propertyId, address bidder, uint256 bidAmount);
        event AuctionEnded(uint256 indexed propertyId, address winner, uint256 bidAmount);

        function balanceOf(address account, uint256 id) external view returns (uint256);
        function getProperty(uint256 propertyId) external view returns (PropertyRecord memory);
        function purchaseTokens(uint256 propertyId, uint256 amount) external;
        function createProperty(string name, string propertyType, string location, uint256 valueUSD, string metadataURI) external returns (uint256);
        function distributeRentalIncome(uint256 propertyId, uint256 amount) external;
        function claimRentalIncome(uint256 propertyId) external;
        function createAuction(uint256 propertyId, uint256 startingPrice, uint256 durationDays) external;
        function placeBid(uint256 propertyId, uint256 bidAmount) external;
        function endAuction(uint256 propertyId) external;

        /// Native-currency price of one token
        function tokenPrice(uint256 propertyId) external view returns (uint256);
        function buyTokens(uint256 propertyId, uint256 amount) external payable;
        function availableTokens(uint256 propertyId) external view returns (uint256);
        function totalSupply(uint256 propertyId) external view returns (uint256);
    }

    /// EquiX governance
    #[derive(Debug, PartialEq)]
    interface IGovernance {
        event ProposalCreated(uint256 indexed proposalId, uint256 indexed propertyId, string title, address proposer);
        event VoteCast(uint256 indexed proposalId, address indexed voter, bool support, uint256 weight);
        event ProposalExecuted(uint256 indexed proposalId);
        event ProposalCanceled(uint256 indexed proposalId);

        function createProposal(uint256 propertyId, string title, string description, address targetContract, bytes callData) external returns (uint256);
        function castVote(uint256 proposalId, bool support) external;
        function executeProposal(uint256 proposalId) external;
        function cancelProposal(uint256 proposalId) external;
        function getProposalDetails(uint256 proposalId) external view returns (
            uint256 id,
            uint256 propertyId,
            string title,
            string description,
            uint256 votesFor,
            uint256 votesAgainst,
            uint256 startTime,
            uint256 endTime,
            bool executed,
            bool canceled
        );
        function hasVoted(uint256 proposalId, address voter) external view returns (bool);
    }
}
