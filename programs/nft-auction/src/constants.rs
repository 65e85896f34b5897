pub const AUCTION_SEED: &[u8] = b"auction";
pub const VAULT_SEED: &[u8] = b"vault";

/// An auctionable asset is a mint with no decimals and a supply of exactly one.
pub const NFT_DECIMALS: u8 = 0;
pub const NFT_SUPPLY: u64 = 1;

/// Smallest step a new bid must add over `max(highest_bid, starting_bid)`.
pub const MIN_BID_INCREMENT: u64 = 1;

pub const MAX_AUCTION_DURATION: i64 = 30 * 24 * 60 * 60; // 30 days
pub const MAX_COOLDOWN: i64 = 7 * 24 * 60 * 60; // 7 days
