pub mod create_auction;
pub mod finalize_auction;
pub mod place_bid;

pub use create_auction::*;
pub use finalize_auction::*;
pub use place_bid::*;
