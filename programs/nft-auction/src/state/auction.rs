use anchor_lang::prelude::*;

use crate::constants::{
    AUCTION_SEED, MAX_AUCTION_DURATION, MAX_COOLDOWN, MIN_BID_INCREMENT, VAULT_SEED,
};
use crate::error::AuctionError;

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, PartialEq, Eq, Debug, InitSpace)]
pub enum AuctionStatus {
    Open,
    Finalized,
}

/// One auction for one NFT, addressed by `(seller, nft_mint, nonce)`.
///
/// The record's own lamports above its rent-exempt minimum are the escrow of
/// the current highest bid. The asset itself sits in the vault token account.
#[account]
#[derive(InitSpace)]
pub struct Auction {
    pub seller: Pubkey,
    pub nft_mint: Pubkey,
    pub nonce: u64,
    pub vault: Pubkey,
    pub status: AuctionStatus,
    pub start_time: i64,
    pub end_time: i64,
    pub cooldown: i64,
    pub starting_bid: u64,
    pub highest_bid: u64,
    pub highest_bidder: Option<Pubkey>,
    pub bump: u8,
    pub vault_bump: u8,
}

/// Inputs to [`Auction::open`], gathered from the instruction and its accounts.
pub struct AuctionParams {
    pub seller: Pubkey,
    pub nft_mint: Pubkey,
    pub nonce: u64,
    pub vault: Pubkey,
    pub starting_bid: u64,
    /// Rent-exempt minimum of an empty account. Every refund is at least this
    /// much, so crediting a drained bidder account always leaves it rent-exempt.
    pub min_starting_bid: u64,
    pub duration: i64,
    pub cooldown: i64,
    pub bump: u8,
    pub vault_bump: u8,
}

/// Escrow owed back to a displaced leader.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Refund {
    pub bidder: Pubkey,
    pub amount: u64,
}

impl Refund {
    /// The account passed to receive the refund must be the displaced leader's.
    pub fn ensure_recipient(&self, provided: Option<Pubkey>) -> Result<()> {
        let provided = provided.ok_or(AuctionError::MissingPreviousBidder)?;
        require_keys_eq!(provided, self.bidder, AuctionError::InvalidPreviousBidder);
        Ok(())
    }
}

/// Where the asset and the escrow go when the auction closes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Settlement {
    Sold { winner: Pubkey, price: u64 },
    Unsold,
}

impl Settlement {
    /// Checks that the token account about to receive the asset belongs to
    /// the winner, or to the seller when nothing sold. Arguments are the
    /// owners of the optional winner and seller token accounts.
    pub fn ensure_receiver(
        &self,
        seller: &Pubkey,
        winner_account_owner: Option<Pubkey>,
        seller_account_owner: Option<Pubkey>,
    ) -> Result<()> {
        match self {
            Settlement::Sold { winner, .. } => {
                let owner = winner_account_owner.ok_or(AuctionError::InvalidWinnerAccount)?;
                require_keys_eq!(owner, *winner, AuctionError::InvalidWinnerAccount);
            }
            Settlement::Unsold => {
                let owner = seller_account_owner.ok_or(AuctionError::InvalidSellerAccount)?;
                require_keys_eq!(owner, *seller, AuctionError::InvalidSellerAccount);
            }
        }
        Ok(())
    }
}

impl Auction {
    pub fn address(seller: &Pubkey, nft_mint: &Pubkey, nonce: u64) -> (Pubkey, u8) {
        Pubkey::find_program_address(
            &[
                AUCTION_SEED,
                seller.as_ref(),
                nft_mint.as_ref(),
                &nonce.to_le_bytes(),
            ],
            &crate::ID,
        )
    }

    pub fn vault_address(auction: &Pubkey) -> (Pubkey, u8) {
        Pubkey::find_program_address(&[VAULT_SEED, auction.as_ref()], &crate::ID)
    }

    /// A freshly allocated record is all zeroes, so a seller is only ever set by `open`.
    pub fn is_initialized(&self) -> bool {
        self.seller != Pubkey::default()
    }

    pub fn validate_params(
        starting_bid: u64,
        min_starting_bid: u64,
        duration: i64,
        cooldown: i64,
    ) -> Result<()> {
        require!(
            starting_bid > 0 && starting_bid >= min_starting_bid,
            AuctionError::InvalidStartingBid
        );
        require!(
            duration > 0 && duration <= MAX_AUCTION_DURATION,
            AuctionError::InvalidDuration
        );
        require!(
            (0..=MAX_COOLDOWN).contains(&cooldown),
            AuctionError::InvalidCooldown
        );
        Ok(())
    }

    pub fn open(&mut self, params: AuctionParams, now: i64) -> Result<()> {
        require!(!self.is_initialized(), AuctionError::DuplicateAuction);
        Self::validate_params(
            params.starting_bid,
            params.min_starting_bid,
            params.duration,
            params.cooldown,
        )?;

        let end_time = now
            .checked_add(params.duration)
            .ok_or(AuctionError::ArithmeticOverflow)?;

        self.seller = params.seller;
        self.nft_mint = params.nft_mint;
        self.nonce = params.nonce;
        self.vault = params.vault;
        self.status = AuctionStatus::Open;
        self.start_time = now;
        self.end_time = end_time;
        self.cooldown = params.cooldown;
        self.starting_bid = params.starting_bid;
        self.highest_bid = 0;
        self.highest_bidder = None;
        self.bump = params.bump;
        self.vault_bump = params.vault_bump;
        Ok(())
    }

    /// Bidding has ended once `now` reaches `end_time`. Never stored.
    pub fn is_ended(&self, now: i64) -> bool {
        now >= self.end_time
    }

    pub fn is_bidding_open(&self, now: i64) -> bool {
        self.status == AuctionStatus::Open && self.start_time <= now && !self.is_ended(now)
    }

    pub fn finalizable_at(&self) -> Result<i64> {
        self.end_time
            .checked_add(self.cooldown)
            .ok_or_else(|| error!(AuctionError::ArithmeticOverflow))
    }

    pub fn minimum_next_bid(&self) -> Result<u64> {
        self.highest_bid
            .max(self.starting_bid)
            .checked_add(MIN_BID_INCREMENT)
            .ok_or_else(|| error!(AuctionError::ArithmeticOverflow))
    }

    /// Validates a bid against the current record without touching it.
    ///
    /// `expected_previous_bidder` is compared with the recorded leader as a
    /// compare-and-swap: a caller who saw a different leader (or none while
    /// one exists) is rejected and must re-read. Returns the refund owed to
    /// the leader being displaced, if any.
    pub fn check_bid(
        &self,
        bidder: &Pubkey,
        amount: u64,
        expected_previous_bidder: Option<Pubkey>,
        now: i64,
    ) -> Result<Option<Refund>> {
        require!(self.is_bidding_open(now), AuctionError::AuctionClosed);
        require_keys_neq!(*bidder, self.seller, AuctionError::SelfBid);
        require!(
            expected_previous_bidder == self.highest_bidder,
            AuctionError::StaleBidderReference
        );
        require!(
            amount >= self.minimum_next_bid()?,
            AuctionError::MustExceedCurrentBid
        );

        Ok(self.highest_bidder.map(|previous| Refund {
            bidder: previous,
            amount: self.highest_bid,
        }))
    }

    pub fn record_bid(&mut self, bidder: Pubkey, amount: u64) {
        self.highest_bid = amount;
        self.highest_bidder = Some(bidder);
    }

    /// Moves the record to `Finalized` and reports how custody must be released.
    pub fn settle(&mut self, now: i64) -> Result<Settlement> {
        require!(
            self.status == AuctionStatus::Open,
            AuctionError::AlreadyFinalized
        );
        require!(now >= self.finalizable_at()?, AuctionError::TooEarly);

        self.status = AuctionStatus::Finalized;

        Ok(match self.highest_bidder {
            Some(winner) => Settlement::Sold {
                winner,
                price: self.highest_bid,
            },
            None => Settlement::Unsold,
        })
    }
}

#[cfg(test)]
mod tests {
    use anchor_lang::error::Error;
    use std::collections::HashMap;

    use super::*;

    const SELLER: Pubkey = Pubkey::new_from_array([1; 32]);
    const MINT: Pubkey = Pubkey::new_from_array([2; 32]);
    const VAULT: Pubkey = Pubkey::new_from_array([3; 32]);
    const BIDDER_1: Pubkey = Pubkey::new_from_array([11; 32]);
    const BIDDER_2: Pubkey = Pubkey::new_from_array([12; 32]);
    const BIDDER_3: Pubkey = Pubkey::new_from_array([13; 32]);

    const START: i64 = 1_700_000_000;
    const RENT_EXEMPT_EMPTY_ACCOUNT: u64 = 890_880;

    fn blank() -> Auction {
        Auction {
            seller: Pubkey::default(),
            nft_mint: Pubkey::default(),
            nonce: 0,
            vault: Pubkey::default(),
            status: AuctionStatus::Open,
            start_time: 0,
            end_time: 0,
            cooldown: 0,
            starting_bid: 0,
            highest_bid: 0,
            highest_bidder: None,
            bump: 0,
            vault_bump: 0,
        }
    }

    fn params(starting_bid: u64, duration: i64, cooldown: i64) -> AuctionParams {
        AuctionParams {
            seller: SELLER,
            nft_mint: MINT,
            nonce: 7,
            vault: VAULT,
            starting_bid,
            min_starting_bid: 1,
            duration,
            cooldown,
            bump: 254,
            vault_bump: 253,
        }
    }

    fn opened(starting_bid: u64, duration: i64, cooldown: i64) -> Auction {
        let mut auction = blank();
        auction
            .open(params(starting_bid, duration, cooldown), START)
            .unwrap();
        auction
    }

    fn place(
        auction: &mut Auction,
        bidder: Pubkey,
        amount: u64,
        expected: Option<Pubkey>,
        now: i64,
    ) -> Result<Option<Refund>> {
        let refund = auction.check_bid(&bidder, amount, expected, now)?;
        auction.record_bid(bidder, amount);
        Ok(refund)
    }

    fn snapshot(auction: &Auction) -> (AuctionStatus, i64, i64, u64, Option<Pubkey>) {
        (
            auction.status,
            auction.start_time,
            auction.end_time,
            auction.highest_bid,
            auction.highest_bidder,
        )
    }

    #[test]
    fn open_initializes_record() {
        let auction = opened(1_000_000, 5, 10);

        assert!(auction.is_initialized());
        assert_eq!(auction.status, AuctionStatus::Open);
        assert_eq!(auction.highest_bid, 0);
        assert_eq!(auction.highest_bidder, None);
        assert_eq!(auction.start_time, START);
        assert_eq!(auction.end_time, START + 5);
        assert_eq!(auction.cooldown, 10);
        assert_eq!(auction.vault, VAULT);
        assert_eq!(auction.finalizable_at().unwrap(), START + 15);
    }

    #[test]
    fn open_rejects_bad_parameters() {
        assert_eq!(
            blank().open(params(0, 5, 10), START).unwrap_err(),
            Error::from(AuctionError::InvalidStartingBid)
        );
        assert_eq!(
            blank().open(params(1, 0, 10), START).unwrap_err(),
            Error::from(AuctionError::InvalidDuration)
        );
        assert_eq!(
            blank()
                .open(params(1, MAX_AUCTION_DURATION + 1, 10), START)
                .unwrap_err(),
            Error::from(AuctionError::InvalidDuration)
        );
        assert_eq!(
            blank().open(params(1, 5, -1), START).unwrap_err(),
            Error::from(AuctionError::InvalidCooldown)
        );
        assert!(blank().open(params(1, 5, 0), START).is_ok());
    }

    #[test]
    fn starting_bid_must_cover_rent_of_an_empty_account() {
        let mut below = params(RENT_EXEMPT_EMPTY_ACCOUNT - 1, 5, 10);
        below.min_starting_bid = RENT_EXEMPT_EMPTY_ACCOUNT;
        assert_eq!(
            blank().open(below, START).unwrap_err(),
            Error::from(AuctionError::InvalidStartingBid)
        );

        let mut at_floor = params(RENT_EXEMPT_EMPTY_ACCOUNT, 5, 10);
        at_floor.min_starting_bid = RENT_EXEMPT_EMPTY_ACCOUNT;
        let mut auction = blank();
        auction.open(at_floor, START).unwrap();

        // Any refund a displaced leader can receive is above the floor.
        let refund = place(&mut auction, BIDDER_1, RENT_EXEMPT_EMPTY_ACCOUNT + 1, None, START + 1)
            .unwrap();
        assert_eq!(refund, None);
        let refund = place(
            &mut auction,
            BIDDER_2,
            RENT_EXEMPT_EMPTY_ACCOUNT + 2,
            Some(BIDDER_1),
            START + 2,
        )
        .unwrap()
        .unwrap();
        assert!(refund.amount >= RENT_EXEMPT_EMPTY_ACCOUNT);
    }

    #[test]
    fn refund_goes_only_to_the_displaced_leader() {
        let refund = Refund {
            bidder: BIDDER_1,
            amount: 500,
        };

        assert!(refund.ensure_recipient(Some(BIDDER_1)).is_ok());
        assert_eq!(
            refund.ensure_recipient(None).unwrap_err(),
            Error::from(AuctionError::MissingPreviousBidder)
        );
        assert_eq!(
            refund.ensure_recipient(Some(BIDDER_2)).unwrap_err(),
            Error::from(AuctionError::InvalidPreviousBidder)
        );
    }

    #[test]
    fn sold_asset_goes_to_the_winner_account() {
        let sold = Settlement::Sold {
            winner: BIDDER_2,
            price: 2_000_000,
        };

        assert!(sold.ensure_receiver(&SELLER, Some(BIDDER_2), None).is_ok());
        assert_eq!(
            sold.ensure_receiver(&SELLER, None, Some(SELLER)).unwrap_err(),
            Error::from(AuctionError::InvalidWinnerAccount)
        );
        assert_eq!(
            sold.ensure_receiver(&SELLER, Some(BIDDER_1), Some(SELLER))
                .unwrap_err(),
            Error::from(AuctionError::InvalidWinnerAccount)
        );
    }

    #[test]
    fn unsold_asset_goes_back_to_the_seller_account() {
        let unsold = Settlement::Unsold;

        assert!(unsold.ensure_receiver(&SELLER, None, Some(SELLER)).is_ok());
        assert_eq!(
            unsold.ensure_receiver(&SELLER, Some(BIDDER_1), None).unwrap_err(),
            Error::from(AuctionError::InvalidSellerAccount)
        );
        assert_eq!(
            unsold.ensure_receiver(&SELLER, None, Some(BIDDER_1)).unwrap_err(),
            Error::from(AuctionError::InvalidSellerAccount)
        );
    }

    #[test]
    fn open_rejects_existing_record() {
        let mut auction = opened(1_000_000, 5, 10);
        let before = snapshot(&auction);

        assert_eq!(
            auction.open(params(5, 50, 0), START + 1).unwrap_err(),
            Error::from(AuctionError::DuplicateAuction)
        );
        assert_eq!(snapshot(&auction), before);
    }

    #[test]
    fn increasing_bids_refund_the_displaced_bidder() {
        let mut auction = opened(100, 60, 0);
        let bidders: Vec<Pubkey> = (20u8..25).map(|b| Pubkey::new_from_array([b; 32])).collect();
        let mut balances: HashMap<Pubkey, u64> = bidders.iter().map(|b| (*b, 10_000)).collect();
        let mut escrow = 0u64;

        let mut leader = None;
        for (i, bidder) in bidders.iter().enumerate() {
            let amount = 200 + 100 * i as u64;
            let refund = place(&mut auction, *bidder, amount, leader, START + 1 + i as i64).unwrap();

            *balances.get_mut(bidder).unwrap() -= amount;
            escrow += amount;
            if let Some(refund) = refund {
                *balances.get_mut(&refund.bidder).unwrap() += refund.amount;
                escrow -= refund.amount;
            }

            assert_eq!(auction.highest_bid, amount);
            assert_eq!(auction.highest_bidder, Some(*bidder));
            assert_eq!(escrow, amount);
            if let Some(previous) = leader {
                assert_eq!(balances[&previous], 10_000);
            }
            leader = Some(*bidder);
        }
    }

    #[test]
    fn first_bid_has_no_refund_and_must_exceed_starting_bid() {
        let mut auction = opened(1_000, 60, 0);

        assert_eq!(
            auction
                .check_bid(&BIDDER_1, 1_000, None, START + 1)
                .unwrap_err(),
            Error::from(AuctionError::MustExceedCurrentBid)
        );
        assert_eq!(
            place(&mut auction, BIDDER_1, 1_001, None, START + 1).unwrap(),
            None
        );
    }

    #[test]
    fn low_or_equal_bid_leaves_state_unchanged() {
        let mut auction = opened(100, 60, 0);
        place(&mut auction, BIDDER_1, 500, None, START + 1).unwrap();
        let before = snapshot(&auction);

        for amount in [1, 100, 499, 500] {
            assert_eq!(
                auction
                    .check_bid(&BIDDER_2, amount, Some(BIDDER_1), START + 2)
                    .unwrap_err(),
                Error::from(AuctionError::MustExceedCurrentBid)
            );
        }
        assert_eq!(snapshot(&auction), before);
    }

    #[test]
    fn bid_at_or_after_end_time_is_closed() {
        let auction = opened(100, 5, 10);

        for now in [START + 5, START + 6, START + 100] {
            let err = auction
                .check_bid(&BIDDER_1, u64::MAX - 1, None, now)
                .unwrap_err();
            assert_eq!(err, Error::from(AuctionError::AuctionClosed));
        }
        assert!(auction.check_bid(&BIDDER_1, 101, None, START + 4).is_ok());
    }

    #[test]
    fn bid_before_start_is_closed() {
        let auction = opened(100, 5, 10);
        assert_eq!(
            auction
                .check_bid(&BIDDER_1, 101, None, START - 1)
                .unwrap_err(),
            Error::from(AuctionError::AuctionClosed)
        );
    }

    #[test]
    fn seller_cannot_bid() {
        let auction = opened(100, 5, 10);
        assert_eq!(
            auction
                .check_bid(&SELLER, 1_000, None, START + 1)
                .unwrap_err(),
            Error::from(AuctionError::SelfBid)
        );
    }

    #[test]
    fn stale_expected_bidder_is_rejected() {
        let mut auction = opened(1_000_000, 5, 10);
        place(&mut auction, BIDDER_1, 1_500_000, None, START + 1).unwrap();
        place(&mut auction, BIDDER_2, 2_000_000, Some(BIDDER_1), START + 2).unwrap();
        let before = snapshot(&auction);

        let err = auction
            .check_bid(&BIDDER_3, 3_000_000, Some(BIDDER_1), START + 3)
            .unwrap_err();
        assert_eq!(err, Error::from(AuctionError::StaleBidderReference));

        // A caller who never saw the leader is just as stale.
        let err = auction
            .check_bid(&BIDDER_3, 3_000_000, None, START + 3)
            .unwrap_err();
        assert_eq!(err, Error::from(AuctionError::StaleBidderReference));
        assert_eq!(snapshot(&auction), before);

        let refund = auction
            .check_bid(&BIDDER_3, 3_000_000, Some(BIDDER_2), START + 3)
            .unwrap();
        assert_eq!(
            refund,
            Some(Refund {
                bidder: BIDDER_2,
                amount: 2_000_000
            })
        );
    }

    #[test]
    fn expected_bidder_must_be_empty_before_first_bid() {
        let auction = opened(100, 5, 10);
        assert_eq!(
            auction
                .check_bid(&BIDDER_2, 200, Some(BIDDER_1), START + 1)
                .unwrap_err(),
            Error::from(AuctionError::StaleBidderReference)
        );
    }

    #[test]
    fn leader_may_raise_own_bid() {
        let mut auction = opened(100, 60, 0);
        place(&mut auction, BIDDER_1, 200, None, START + 1).unwrap();

        let refund = place(&mut auction, BIDDER_1, 300, Some(BIDDER_1), START + 2).unwrap();
        assert_eq!(
            refund,
            Some(Refund {
                bidder: BIDDER_1,
                amount: 200
            })
        );
        assert_eq!(auction.highest_bid, 300);
    }

    #[test]
    fn finalize_waits_for_cooldown_and_runs_once() {
        let mut auction = opened(100, 5, 10);
        place(&mut auction, BIDDER_1, 150, None, START + 1).unwrap();
        let before = snapshot(&auction);

        for now in [START + 4, START + 5, START + 14] {
            assert_eq!(
                auction.settle(now).unwrap_err(),
                Error::from(AuctionError::TooEarly)
            );
        }
        assert_eq!(snapshot(&auction), before);

        assert_eq!(
            auction.settle(START + 15).unwrap(),
            Settlement::Sold {
                winner: BIDDER_1,
                price: 150
            }
        );
        assert_eq!(auction.status, AuctionStatus::Finalized);

        let after = snapshot(&auction);
        assert_eq!(
            auction.settle(START + 100).unwrap_err(),
            Error::from(AuctionError::AlreadyFinalized)
        );
        assert_eq!(snapshot(&auction), after);
    }

    #[test]
    fn finalized_auction_rejects_bids() {
        let mut auction = opened(100, 5, 0);
        auction.settle(START + 5).unwrap();
        assert_eq!(
            auction
                .check_bid(&BIDDER_1, 1_000, None, START + 6)
                .unwrap_err(),
            Error::from(AuctionError::AuctionClosed)
        );
    }

    #[test]
    fn two_bidder_scenario_settles_to_second_bidder() {
        let mut auction = opened(1_000_000, 5, 10);

        assert_eq!(
            place(&mut auction, BIDDER_1, 1_500_000, None, START + 1).unwrap(),
            None
        );
        let refund = place(&mut auction, BIDDER_2, 2_000_000, Some(BIDDER_1), START + 2).unwrap();
        assert_eq!(
            refund,
            Some(Refund {
                bidder: BIDDER_1,
                amount: 1_500_000
            })
        );

        assert_eq!(
            auction.settle(START + 15).unwrap(),
            Settlement::Sold {
                winner: BIDDER_2,
                price: 2_000_000
            }
        );
        assert_eq!(auction.status, AuctionStatus::Finalized);
    }

    #[test]
    fn auction_without_bids_settles_unsold() {
        let mut auction = opened(1_000_000, 5, 10);
        assert_eq!(auction.settle(START + 15).unwrap(), Settlement::Unsold);
    }

    #[test]
    fn addresses_are_derived_from_seller_mint_and_nonce() {
        let (a, _) = Auction::address(&SELLER, &MINT, 1);
        let (b, _) = Auction::address(&SELLER, &MINT, 2);
        let (c, _) = Auction::address(&BIDDER_1, &MINT, 1);

        assert_eq!(a, Auction::address(&SELLER, &MINT, 1).0);
        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_ne!(Auction::vault_address(&a).0, Auction::vault_address(&b).0);
    }
}
