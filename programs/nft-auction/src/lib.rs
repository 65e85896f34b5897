use anchor_lang::prelude::*;

pub mod constants;
pub mod custody;
pub mod error;
pub mod event;
pub mod instructions;
pub mod state;

use instructions::*;

declare_id!("3MRNiKdY2ihZZMNe7sJtbsQkiaXHaoLysFVg3SAdZD8V");

#[program]
pub mod nft_auction {
    use super::*;

    pub fn create_auction(
        ctx: Context<CreateAuction>,
        nonce: u64,
        starting_bid: u64,
        duration: i64,
        cooldown: i64,
    ) -> Result<()> {
        instructions::create_auction::handler(ctx, nonce, starting_bid, duration, cooldown)
    }

    pub fn place_bid(
        ctx: Context<PlaceBid>,
        amount: u64,
        expected_previous_bidder: Option<Pubkey>,
    ) -> Result<()> {
        instructions::place_bid::handler(ctx, amount, expected_previous_bidder)
    }

    pub fn finalize_auction(ctx: Context<FinalizeAuction>) -> Result<()> {
        instructions::finalize_auction::handler(ctx)
    }
}
