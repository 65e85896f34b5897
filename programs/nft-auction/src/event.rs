use anchor_lang::prelude::*;

#[event]
pub struct AuctionCreated {
    pub auction: Pubkey,
    pub seller: Pubkey,
    pub nft_mint: Pubkey,
    pub nonce: u64,
    pub starting_bid: u64,
    pub start_time: i64,
    pub end_time: i64,
    pub cooldown: i64,
}

#[event]
pub struct BidPlaced {
    pub auction: Pubkey,
    pub bidder: Pubkey,
    pub amount: u64,
    pub refunded_bidder: Option<Pubkey>,
    pub refunded_amount: u64,
}

#[event]
pub struct AuctionFinalized {
    pub auction: Pubkey,
    pub seller: Pubkey,
    pub winner: Option<Pubkey>,
    pub price: u64,
}
