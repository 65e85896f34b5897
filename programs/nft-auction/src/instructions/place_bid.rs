use anchor_lang::prelude::*;
use anchor_lang::system_program;

use crate::constants::AUCTION_SEED;
use crate::custody;
use crate::error::AuctionError;
use crate::event::BidPlaced;
use crate::state::Auction;

#[derive(Accounts)]
pub struct PlaceBid<'info> {
    #[account(
        mut,
        seeds = [AUCTION_SEED, auction.seller.as_ref(), auction.nft_mint.as_ref(), &auction.nonce.to_le_bytes()],
        bump = auction.bump,
    )]
    pub auction: Account<'info, Auction>,
    #[account(mut)]
    pub bidder: Signer<'info>,
    /// CHECK: Only credited with the refund; its key is matched against the recorded leader.
    #[account(mut)]
    pub previous_bidder: Option<UncheckedAccount<'info>>,
    pub system_program: Program<'info, System>,
}

pub fn handler(
    ctx: Context<PlaceBid>,
    amount: u64,
    expected_previous_bidder: Option<Pubkey>,
) -> Result<()> {
    let clock = Clock::get()?;
    let bidder = ctx.accounts.bidder.key();

    let refund = ctx.accounts.auction.check_bid(
        &bidder,
        amount,
        expected_previous_bidder,
        clock.unix_timestamp,
    )?;

    system_program::transfer(
        CpiContext::new(
            ctx.accounts.system_program.to_account_info(),
            system_program::Transfer {
                from: ctx.accounts.bidder.to_account_info(),
                to: ctx.accounts.auction.to_account_info(),
            },
        ),
        amount,
    )?;

    if let Some(refund) = refund {
        refund.ensure_recipient(ctx.accounts.previous_bidder.as_ref().map(|p| p.key()))?;
        let previous = ctx
            .accounts
            .previous_bidder
            .as_ref()
            .ok_or(AuctionError::MissingPreviousBidder)?;

        custody::move_lamports(
            &ctx.accounts.auction.to_account_info(),
            &previous.to_account_info(),
            refund.amount,
        )?;
    }

    ctx.accounts.auction.record_bid(bidder, amount);

    emit!(BidPlaced {
        auction: ctx.accounts.auction.key(),
        bidder,
        amount,
        refunded_bidder: refund.map(|r| r.bidder),
        refunded_amount: refund.map_or(0, |r| r.amount),
    });

    Ok(())
}
