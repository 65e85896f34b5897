use anchor_lang::prelude::*;
use anchor_spl::token_interface::{Mint, TokenAccount, TokenInterface};

use crate::constants::{AUCTION_SEED, VAULT_SEED};
use crate::custody;
use crate::error::AuctionError;
use crate::event::AuctionFinalized;
use crate::state::{Auction, Settlement};

/// Settles an auction once `end_time + cooldown` has passed. Callable by anyone.
///
/// The record is closed to the seller on success, so a repeated call in a
/// later transaction fails while loading `auction` with Anchor's
/// `AccountNotInitialized` (3012) rather than `AlreadyFinalized`. The closed
/// `(seller, nft_mint, nonce)` address can then host a new auction.
#[derive(Accounts)]
pub struct FinalizeAuction<'info> {
    #[account(
        mut,
        close = seller,
        seeds = [AUCTION_SEED, auction.seller.as_ref(), auction.nft_mint.as_ref(), &auction.nonce.to_le_bytes()],
        bump = auction.bump,
        has_one = seller,
        has_one = nft_mint,
        has_one = vault,
    )]
    pub auction: Account<'info, Auction>,
    /// CHECK: Bound to the record by `has_one`; receives the proceeds and both rent deposits.
    #[account(mut)]
    pub seller: UncheckedAccount<'info>,
    #[account(
        mut,
        seeds = [VAULT_SEED, auction.key().as_ref()],
        bump = auction.vault_bump,
        token::mint = nft_mint,
        token::authority = auction,
        token::token_program = token_program,
    )]
    pub vault: InterfaceAccount<'info, TokenAccount>,
    #[account(mint::token_program = token_program)]
    pub nft_mint: InterfaceAccount<'info, Mint>,
    /// Receives the asset back when no bid was placed, and any surplus units
    /// that were sent into the vault from outside.
    #[account(mut, token::mint = nft_mint, token::token_program = token_program)]
    pub seller_token_account: Option<InterfaceAccount<'info, TokenAccount>>,
    /// Receives the asset when there is a winner. Created by the caller beforehand.
    #[account(mut, token::mint = nft_mint, token::token_program = token_program)]
    pub winner_token_account: Option<InterfaceAccount<'info, TokenAccount>>,
    pub token_program: Interface<'info, TokenInterface>,
}

pub fn handler(ctx: Context<FinalizeAuction>) -> Result<()> {
    let clock = Clock::get()?;

    let settlement = ctx.accounts.auction.settle(clock.unix_timestamp)?;

    let (asset_units, surplus) = custody::split_vault(ctx.accounts.vault.amount)?;

    let auction_info = ctx.accounts.auction.to_account_info();
    let rent_exempt_minimum = Rent::get()?.minimum_balance(auction_info.data_len());
    custody::ensure_escrow_covers(
        custody::escrowed_lamports(auction_info.lamports(), rent_exempt_minimum),
        ctx.accounts.auction.highest_bid,
    )?;

    let auction = &ctx.accounts.auction;
    let winner_account_owner = ctx.accounts.winner_token_account.as_ref().map(|a| a.owner);
    let seller_account_owner = ctx.accounts.seller_token_account.as_ref().map(|a| a.owner);
    settlement.ensure_receiver(&auction.seller, winner_account_owner, seller_account_owner)?;
    custody::ensure_surplus_receiver(surplus, &auction.seller, seller_account_owner)?;

    let nonce_bytes = auction.nonce.to_le_bytes();
    let signer_seeds: &[&[&[u8]]] = &[&[
        AUCTION_SEED,
        auction.seller.as_ref(),
        auction.nft_mint.as_ref(),
        &nonce_bytes,
        &[auction.bump],
    ]];

    let (recipient, winner, price) = match settlement {
        Settlement::Sold { winner, price } => {
            let recipient = ctx
                .accounts
                .winner_token_account
                .as_ref()
                .ok_or(AuctionError::InvalidWinnerAccount)?;
            msg!("Auction sold to {} for {} lamports", winner, price);
            (recipient, Some(winner), price)
        }
        Settlement::Unsold => {
            let recipient = ctx
                .accounts
                .seller_token_account
                .as_ref()
                .ok_or(AuctionError::InvalidSellerAccount)?;
            msg!("Auction closed without bids, returning asset to seller");
            (recipient, None, 0)
        }
    };

    custody::withdraw_from_vault(
        &ctx.accounts.token_program,
        &ctx.accounts.vault,
        recipient,
        &ctx.accounts.nft_mint,
        auction_info.clone(),
        asset_units,
        signer_seeds,
    )?;

    if let Some(seller_token_account) = ctx.accounts.seller_token_account.as_ref() {
        if surplus > 0 {
            msg!("Returning {} surplus vault units to seller", surplus);
            custody::withdraw_from_vault(
                &ctx.accounts.token_program,
                &ctx.accounts.vault,
                seller_token_account,
                &ctx.accounts.nft_mint,
                auction_info.clone(),
                surplus,
                signer_seeds,
            )?;
        }
    }

    custody::close_vault(
        &ctx.accounts.token_program,
        &ctx.accounts.vault,
        auction_info.clone(),
        ctx.accounts.seller.to_account_info(),
        signer_seeds,
    )?;

    // Proceeds leave now; the rent deposit follows when `close = seller` runs on exit.
    custody::move_lamports(&auction_info, &ctx.accounts.seller.to_account_info(), price)?;

    emit!(AuctionFinalized {
        auction: auction_info.key(),
        seller: auction.seller,
        winner,
        price,
    });

    Ok(())
}
