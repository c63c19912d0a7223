pub mod catalog;
pub mod feedback;
pub mod notifier;
pub mod picker;
pub mod preferences;
pub mod search;
pub mod users;
pub mod watchlists;
