//! CSS selectors for listing page parsing.
//!
//! Update this file when the site changes its markup. When extraction
//! starts yielding empty pages, capture an HTML sample, update the
//! selectors, and add a test fixture.

use scraper::Selector;
use std::sync::LazyLock;

/// Embedded linked-data block (JSON payload).
pub static STRUCTURED_DATA: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("script[type='application/ld+json']").unwrap());

/// Selectors for plain-markup listing cards.
pub mod listing {
    use super::*;

    /// Listing card container.
    pub static ITEM: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse(".listing-item").unwrap());

    /// Neighborhood / location line.
    pub static LOCATION: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse(".listing-location").unwrap());

    /// Display price.
    pub static PRICE: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse(".listing-price").unwrap());

    /// Bedroom count.
    pub static ROOMS: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse(".listing-rooms").unwrap());

    /// Bathroom count.
    pub static BATHROOMS: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse(".listing-bathrooms").unwrap());

    /// Floor area.
    pub static AREA: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse(".listing-area").unwrap());
}
