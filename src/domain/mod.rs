mod currency;
mod money;
mod wallet;

pub use currency::*;
pub use money::*;
pub use wallet::*;
