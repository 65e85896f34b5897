//! Movement of the auctioned asset and of escrowed lamports.
//!
//! The vault token account holds the NFT from creation until finalization.
//! Bid funds never touch the vault; they live on the auction record itself.

use anchor_lang::prelude::*;
use anchor_spl::token_interface::{
    self, CloseAccount, Mint, TokenAccount, TokenInterface, TransferChecked,
};

use crate::constants::{NFT_DECIMALS, NFT_SUPPLY};
use crate::error::AuctionError;

/// Accepts a mint with no decimals and a supply of one whose freeze authority
/// is not the seller. A seller able to freeze the vault could block settlement.
pub fn ensure_is_nft(
    decimals: u8,
    supply: u64,
    freeze_authority: Option<Pubkey>,
    seller: &Pubkey,
) -> Result<()> {
    require!(
        decimals == NFT_DECIMALS && supply == NFT_SUPPLY,
        AuctionError::InvalidAsset
    );
    require!(
        freeze_authority != Some(*seller),
        AuctionError::InvalidAsset
    );
    Ok(())
}

/// The seller token account must belong to the seller and hold the asset.
pub fn ensure_seller_holds_asset(
    token_owner: &Pubkey,
    seller: &Pubkey,
    amount: u64,
) -> Result<()> {
    require_keys_eq!(*token_owner, *seller, AuctionError::AssetNotOwned);
    require!(amount >= NFT_SUPPLY, AuctionError::AssetNotOwned);
    Ok(())
}

/// Splits the vault balance into the auctioned unit and any surplus that
/// was sent in from outside. Anyone may transfer into the vault, so extra
/// units are expected and must not block settlement.
pub fn split_vault(vault_amount: u64) -> Result<(u64, u64)> {
    let surplus = vault_amount
        .checked_sub(NFT_SUPPLY)
        .ok_or(AuctionError::VaultEmpty)?;
    Ok((NFT_SUPPLY, surplus))
}

/// Surplus vault units go back to the seller, so a seller token account is
/// needed whenever there is any.
pub fn ensure_surplus_receiver(
    surplus: u64,
    seller: &Pubkey,
    seller_account_owner: Option<Pubkey>,
) -> Result<()> {
    if surplus == 0 {
        return Ok(());
    }
    let owner = seller_account_owner.ok_or(AuctionError::InvalidSellerAccount)?;
    require_keys_eq!(owner, *seller, AuctionError::InvalidSellerAccount);
    Ok(())
}

/// Lamports held on top of the record's rent-exempt minimum.
pub fn escrowed_lamports(lamports: u64, rent_exempt_minimum: u64) -> u64 {
    lamports.saturating_sub(rent_exempt_minimum)
}

/// The record must still carry the full highest bid on top of its rent.
pub fn ensure_escrow_covers(escrowed: u64, owed: u64) -> Result<()> {
    require!(escrowed >= owed, AuctionError::EscrowShortfall);
    Ok(())
}

pub fn deposit_nft<'info>(
    token_program: &Interface<'info, TokenInterface>,
    from: &InterfaceAccount<'info, TokenAccount>,
    vault: &InterfaceAccount<'info, TokenAccount>,
    mint: &InterfaceAccount<'info, Mint>,
    owner: &Signer<'info>,
) -> Result<()> {
    token_interface::transfer_checked(
        CpiContext::new(
            token_program.to_account_info(),
            TransferChecked {
                from: from.to_account_info(),
                to: vault.to_account_info(),
                authority: owner.to_account_info(),
                mint: mint.to_account_info(),
            },
        ),
        NFT_SUPPLY,
        NFT_DECIMALS,
    )
}

/// Sends `amount` units out of the vault with the auction PDA signing.
pub fn withdraw_from_vault<'info>(
    token_program: &Interface<'info, TokenInterface>,
    vault: &InterfaceAccount<'info, TokenAccount>,
    to: &InterfaceAccount<'info, TokenAccount>,
    mint: &InterfaceAccount<'info, Mint>,
    authority: AccountInfo<'info>,
    amount: u64,
    signer_seeds: &[&[&[u8]]],
) -> Result<()> {
    token_interface::transfer_checked(
        CpiContext::new_with_signer(
            token_program.to_account_info(),
            TransferChecked {
                from: vault.to_account_info(),
                to: to.to_account_info(),
                authority,
                mint: mint.to_account_info(),
            },
            signer_seeds,
        ),
        amount,
        NFT_DECIMALS,
    )
}

/// Closes the emptied vault; its rent goes to `rent_receiver`.
pub fn close_vault<'info>(
    token_program: &Interface<'info, TokenInterface>,
    vault: &InterfaceAccount<'info, TokenAccount>,
    authority: AccountInfo<'info>,
    rent_receiver: AccountInfo<'info>,
    signer_seeds: &[&[&[u8]]],
) -> Result<()> {
    token_interface::close_account(CpiContext::new_with_signer(
        token_program.to_account_info(),
        CloseAccount {
            account: vault.to_account_info(),
            destination: rent_receiver,
            authority,
        },
        signer_seeds,
    ))
}

/// Debits a program-owned account and credits `to` directly.
pub fn move_lamports(from: &AccountInfo, to: &AccountInfo, amount: u64) -> Result<()> {
    if amount == 0 {
        return Ok(());
    }

    let debited = from
        .lamports()
        .checked_sub(amount)
        .ok_or(AuctionError::EscrowShortfall)?;
    let credited = to
        .lamports()
        .checked_add(amount)
        .ok_or(AuctionError::ArithmeticOverflow)?;

    **from.try_borrow_mut_lamports()? = debited;
    **to.try_borrow_mut_lamports()? = credited;
    Ok(())
}
