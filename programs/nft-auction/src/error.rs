use anchor_lang::prelude::*;

#[error_code]
pub enum AuctionError {
    #[msg("Seller does not hold the asset")]
    AssetNotOwned,
    #[msg("Mint is not a non-fungible asset")]
    InvalidAsset,
    #[msg("An auction already exists at this address")]
    DuplicateAuction,
    #[msg("Duration must be positive and within the maximum")]
    InvalidDuration,
    #[msg("Cooldown must be non-negative and within the maximum")]
    InvalidCooldown,
    #[msg("Starting bid must be positive")]
    InvalidStartingBid,
    #[msg("Seller cannot bid on their own auction")]
    SelfBid,
    #[msg("Auction is not accepting bids")]
    AuctionClosed,
    #[msg("Bid must exceed the current bid")]
    MustExceedCurrentBid,
    #[msg("Expected previous bidder does not match the current highest bidder")]
    StaleBidderReference,
    #[msg("Previous bidder account is required for the refund")]
    MissingPreviousBidder,
    #[msg("Previous bidder account does not match the highest bidder")]
    InvalidPreviousBidder,
    #[msg("Auction cannot be finalized before end time plus cooldown")]
    TooEarly,
    #[msg("Auction is already finalized")]
    AlreadyFinalized,
    #[msg("Winner token account is missing or does not belong to the highest bidder")]
    InvalidWinnerAccount,
    #[msg("Seller token account is missing or does not belong to the seller")]
    InvalidSellerAccount,
    #[msg("Vault does not hold the auctioned asset")]
    VaultEmpty,
    #[msg("Auction escrow holds less than the highest bid")]
    EscrowShortfall,
    #[msg("Arithmetic overflow or underflow")]
    ArithmeticOverflow,
}

/// Coarse classification of [`AuctionError`] used by clients to decide how to react.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorClass {
    /// Bad static parameters or mismatched accounts.
    Validation,
    /// Caller lacks the right to perform the operation.
    Authorization,
    /// Operation not valid for the current status or time.
    State,
    /// Caller acted on stale state; re-read and resubmit.
    Consistency,
    /// Custody broke an invariant. Fatal, never repaired.
    Invariant,
}

impl AuctionError {
    pub fn class(&self) -> ErrorClass {
        match self {
            AuctionError::InvalidAsset
            | AuctionError::DuplicateAuction
            | AuctionError::InvalidDuration
            | AuctionError::InvalidCooldown
            | AuctionError::InvalidStartingBid
            | AuctionError::MustExceedCurrentBid
            | AuctionError::MissingPreviousBidder
            | AuctionError::InvalidPreviousBidder
            | AuctionError::InvalidWinnerAccount
            | AuctionError::InvalidSellerAccount
            | AuctionError::ArithmeticOverflow => ErrorClass::Validation,
            AuctionError::AssetNotOwned | AuctionError::SelfBid => ErrorClass::Authorization,
            AuctionError::AuctionClosed | AuctionError::TooEarly | AuctionError::AlreadyFinalized => {
                ErrorClass::State
            }
            AuctionError::StaleBidderReference => ErrorClass::Consistency,
            AuctionError::VaultEmpty | AuctionError::EscrowShortfall => ErrorClass::Invariant,
        }
    }

    /// Only a stale view of the leader can succeed on a plain resubmission.
    pub fn is_retryable(&self) -> bool {
        self.class() == ErrorClass::Consistency
    }
}
