pub mod feedback;
pub mod media;
pub mod preferences;
pub mod search;
pub mod user;
pub mod watchlist;

pub use feedback::*;
pub use media::*;
pub use preferences::*;
pub use search::*;
pub use user::*;
pub use watchlist::*;
