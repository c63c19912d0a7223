use rand::Rng;
use serde::Serialize;

use crate::models::{CatalogConfig, ItemWithStatus, MediaDetails};
use crate::services::catalog::poster_url;

const INVITE_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const INVITE_CODE_LEN: usize = 8;
const PICK_POSTER_SIZE: &str = "w500";
const NOT_AVAILABLE: &str = "N/A";

/// Uniformly random element of `items`, or `None` when empty
pub fn pick<T>(items: &[T]) -> Option<&T> {
    pick_with(items, &mut rand::thread_rng())
}

pub fn pick_with<'a, T, R: Rng + ?Sized>(items: &'a [T], rng: &mut R) -> Option<&'a T> {
    if items.is_empty() {
        return None;
    }
    items.get(rng.gen_range(0..items.len()))
}

/// Eight lowercase base-36 characters
pub fn invite_code() -> String {
    let mut rng = rand::thread_rng();
    (0..INVITE_CODE_LEN)
        .map(|_| INVITE_ALPHABET[rng.gen_range(0..INVITE_ALPHABET.len())] as char)
        .collect()
}

/// A randomly chosen watchlist item ready for display
#[derive(Debug, Serialize)]
pub struct RandomPick {
    pub item: ItemWithStatus,
    pub details: MediaDetails,
    pub poster_url: String,
    pub year: String,
    pub rating: String,
}

impl RandomPick {
    pub fn new(item: ItemWithStatus, details: MediaDetails, config: &CatalogConfig) -> Self {
        Self {
            poster_url: poster_url(details.poster_path.as_deref(), config, PICK_POSTER_SIZE),
            year: release_year(details.release_date.as_deref()),
            rating: rating_display(details.vote_average),
            item,
            details,
        }
    }
}

/// Leading year of an ISO date
pub fn release_year(date: Option<&str>) -> String {
    date.and_then(|d| d.split('-').next())
        .filter(|y| y.len() == 4 && y.chars().all(|c| c.is_ascii_digit()))
        .unwrap_or(NOT_AVAILABLE)
        .to_string()
}

/// One decimal place; unrated titles read `N/A`
pub fn rating_display(vote_average: f64) -> String {
    if vote_average > 0.0 {
        format!("{:.1}", vote_average)
    } else {
        NOT_AVAILABLE.to_string()
    }
}
