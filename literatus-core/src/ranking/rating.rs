//! Rating projector
//!
//! Pure mapping from ordinal position to a bounded score. Ratings are never
//! persisted; position is ground truth and the projection can be re-derived
//! at any time.

use crate::db::shelf::ShelfStore;
use crate::error::Result;
use crate::tier::Tier;
use serde::Serialize;
use uuid::Uuid;

/// A book with its derived rating and global display rank
#[derive(Debug, Clone, Serialize)]
pub struct RatedBook {
    pub id: Uuid,
    pub title: String,
    pub author: String,
    pub tier: Tier,
    pub position: i64,
    pub rating: f64,
    pub global_rank: i64,
}

/// Rating for 1-based `position` in a tier of `tier_size` ranked books.
///
/// Linear interpolation across the tier's band: position 1 scores the band
/// maximum, position T the band base, a sole book the maximum. Rounded to
/// one decimal place.
pub fn rating_for(tier: Tier, position: i64, tier_size: i64) -> f64 {
    let (base, max) = tier.bounds();
    let span = (tier_size - 1).max(1) as f64;
    let raw = base + (max - base) * (1.0 - (position - 1) as f64 / span);
    (raw * 10.0).round() / 10.0
}

/// Every ranked book of `owner_id` with rating and global rank.
///
/// Global rank concatenates beloved, tolerated, then disliked in position
/// order. Staged books (interview unfinished) are excluded.
pub async fn project_ratings(store: &ShelfStore, owner_id: Uuid) -> Result<Vec<RatedBook>> {
    let mut rated = Vec::new();
    let mut global_rank = 0i64;

    for tier in Tier::ALL {
        let books = store.books_in_tier(owner_id, tier).await?;
        let tier_size = books.len() as i64;
        for book in books {
            global_rank += 1;
            rated.push(RatedBook {
                rating: rating_for(tier, book.position, tier_size),
                id: book.id,
                title: book.title,
                author: book.author,
                tier,
                position: book.position,
                global_rank,
            });
        }
    }

    Ok(rated)
}
