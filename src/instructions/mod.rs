pub mod initialize_platform;
pub mod initialize_position;
pub mod initialize_vote;
pub mod redeem_winnings;
pub mod update_platform;
pub mod update_position;

pub use initialize_platform::*;
pub use initialize_position::*;
pub use initialize_vote::*;
pub use redeem_winnings::*;
pub use update_platform::*;
pub use update_position::*;
