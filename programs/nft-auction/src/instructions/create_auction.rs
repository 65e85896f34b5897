use anchor_lang::prelude::*;
use anchor_spl::token_interface::{Mint, TokenAccount, TokenInterface};

use crate::constants::{AUCTION_SEED, VAULT_SEED};
use crate::custody;
use crate::event::AuctionCreated;
use crate::state::{Auction, AuctionParams};

#[derive(Accounts)]
#[instruction(nonce: u64)]
pub struct CreateAuction<'info> {
    // Existing records are loaded rather than rejected by the runtime so that
    // a reused address surfaces as `DuplicateAuction`.
    #[account(
        init_if_needed,
        payer = seller,
        space = 8 + Auction::INIT_SPACE,
        seeds = [AUCTION_SEED, seller.key().as_ref(), nft_mint.key().as_ref(), &nonce.to_le_bytes()],
        bump,
    )]
    pub auction: Account<'info, Auction>,
    #[account(
        init_if_needed,
        payer = seller,
        token::mint = nft_mint,
        token::authority = auction,
        token::token_program = token_program,
        seeds = [VAULT_SEED, auction.key().as_ref()],
        bump,
    )]
    pub vault: InterfaceAccount<'info, TokenAccount>,
    #[account(mint::token_program = token_program)]
    pub nft_mint: InterfaceAccount<'info, Mint>,
    #[account(mut, token::mint = nft_mint, token::token_program = token_program)]
    pub seller_token_account: InterfaceAccount<'info, TokenAccount>,
    #[account(mut)]
    pub seller: Signer<'info>,
    pub token_program: Interface<'info, TokenInterface>,
    pub system_program: Program<'info, System>,
}

pub fn handler(
    ctx: Context<CreateAuction>,
    nonce: u64,
    starting_bid: u64,
    duration: i64,
    cooldown: i64,
) -> Result<()> {
    let clock = Clock::get()?;
    let seller = ctx.accounts.seller.key();

    let auction = &mut ctx.accounts.auction;
    auction.open(
        AuctionParams {
            seller,
            nft_mint: ctx.accounts.nft_mint.key(),
            nonce,
            vault: ctx.accounts.vault.key(),
            starting_bid,
            min_starting_bid: Rent::get()?.minimum_balance(0),
            duration,
            cooldown,
            bump: ctx.bumps.auction,
            vault_bump: ctx.bumps.vault,
        },
        clock.unix_timestamp,
    )?;

    let mint = &ctx.accounts.nft_mint;
    custody::ensure_is_nft(
        mint.decimals,
        mint.supply,
        mint.freeze_authority.into(),
        &seller,
    )?;
    custody::ensure_seller_holds_asset(
        &ctx.accounts.seller_token_account.owner,
        &seller,
        ctx.accounts.seller_token_account.amount,
    )?;

    custody::deposit_nft(
        &ctx.accounts.token_program,
        &ctx.accounts.seller_token_account,
        &ctx.accounts.vault,
        &ctx.accounts.nft_mint,
        &ctx.accounts.seller,
    )?;

    emit!(AuctionCreated {
        auction: ctx.accounts.auction.key(),
        seller,
        nft_mint: ctx.accounts.nft_mint.key(),
        nonce,
        starting_bid,
        start_time: ctx.accounts.auction.start_time,
        end_time: ctx.accounts.auction.end_time,
        cooldown,
    });

    Ok(())
}
