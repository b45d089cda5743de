//! Ordered tier store
//!
//! Holds each user's books grouped by tier, ordered by a dense 1-based
//! `position` column. Position is the single source of truth for ordering;
//! ratings are derived from it on read.
//!
//! Newly added books are staged at position 0 until their comparison
//! interview finishes; staged books are excluded from the ranked sequence
//! and from the density invariant.
//!
//! All multi-row mutations (shift + place) run inside one transaction and
//! finish with a density audit of the touched (user, tier), so readers never
//! observe a gap or a duplicate position.

use crate::error::{Error, Result};
use crate::tier::Tier;
use sqlx::{Pool, Row, Sqlite, Transaction};
use tracing::{debug, error};
use uuid::Uuid;

/// A shelved book
#[derive(Debug, Clone, PartialEq)]
pub struct Book {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub author: String,
    pub tier: Tier,
    /// 1-based rank within (owner, tier); 0 = staged, not yet ranked
    pub position: i64,
}

/// Store for per-user, per-tier ordered book sequences
#[derive(Clone)]
pub struct ShelfStore {
    db: Pool<Sqlite>,
}

impl ShelfStore {
    pub fn new(db: Pool<Sqlite>) -> Self {
        Self { db }
    }

    /// Ranked books of one (owner, tier), position ascending.
    ///
    /// Staged (position 0) books are not part of the ranked sequence.
    pub async fn books_in_tier(&self, owner_id: Uuid, tier: Tier) -> Result<Vec<Book>> {
        let rows = sqlx::query(
            r#"
            SELECT guid, user_id, title, author, tier, position
            FROM books
            WHERE user_id = ? AND tier = ? AND position >= 1
            ORDER BY position ASC
            "#,
        )
        .bind(owner_id.to_string())
        .bind(tier.as_str())
        .fetch_all(&self.db)
        .await?;

        rows.iter().map(book_from_row).collect()
    }

    /// Look up one book by id
    pub async fn book(&self, id: Uuid) -> Result<Book> {
        let row = sqlx::query(
            "SELECT guid, user_id, title, author, tier, position FROM books WHERE guid = ?",
        )
        .bind(id.to_string())
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| Error::NotFound(format!("book {}", id)))?;

        book_from_row(&row)
    }

    /// Add a book staged at position 0 (ranked later by the interview)
    pub async fn add_book(
        &self,
        owner_id: Uuid,
        title: &str,
        author: &str,
        tier: Tier,
    ) -> Result<Book> {
        if title.trim().is_empty() {
            return Err(Error::InvalidInput("title must not be empty".into()));
        }

        let book = Book {
            id: Uuid::new_v4(),
            owner_id,
            title: title.to_string(),
            author: author.to_string(),
            tier,
            position: 0,
        };

        sqlx::query(
            "INSERT INTO books (guid, user_id, title, author, tier, position) VALUES (?, ?, ?, ?, ?, 0)",
        )
        .bind(book.id.to_string())
        .bind(owner_id.to_string())
        .bind(&book.title)
        .bind(&book.author)
        .bind(tier.as_str())
        .execute(&self.db)
        .await?;

        debug!("Staged book {} ({}) in tier {}", book.id, book.title, tier);
        Ok(book)
    }

    /// Insert a staged book at `position`, opening a gap first.
    ///
    /// Every ranked book at or after `position` moves up by one.
    pub async fn commit_insert(&self, book: &Book, position: i64) -> Result<()> {
        let mut tx = self.db.begin().await?;

        // Stale-session guard: the subject must still exist, still staged.
        let current = fetch_book_tx(&mut tx, book.id).await?;
        if current.position != 0 {
            return Err(Error::InvalidState(format!(
                "book {} is already ranked at position {}",
                book.id, current.position
            )));
        }

        sqlx::query(
            "UPDATE books SET position = position + 1 WHERE user_id = ? AND tier = ? AND position >= ?",
        )
        .bind(book.owner_id.to_string())
        .bind(book.tier.as_str())
        .bind(position)
        .execute(&mut *tx)
        .await?;

        place_tx(&mut tx, book.id, position).await?;
        audit_density_tx(&mut tx, book.owner_id, book.tier).await?;
        tx.commit().await?;

        debug!("Inserted book {} at position {} in {}", book.id, position, book.tier);
        Ok(())
    }

    /// Remove a book and close the gap it leaves.
    ///
    /// Staged books (position 0) are simply deleted; no shift needed.
    pub async fn commit_delete(&self, book: &Book) -> Result<()> {
        let mut tx = self.db.begin().await?;

        let current = fetch_book_tx(&mut tx, book.id).await?;

        sqlx::query("DELETE FROM books WHERE guid = ?")
            .bind(book.id.to_string())
            .execute(&mut *tx)
            .await?;

        if current.position >= 1 {
            sqlx::query(
                "UPDATE books SET position = position - 1 WHERE user_id = ? AND tier = ? AND position > ?",
            )
            .bind(book.owner_id.to_string())
            .bind(book.tier.as_str())
            .bind(current.position)
            .execute(&mut *tx)
            .await?;
        }

        audit_density_tx(&mut tx, book.owner_id, book.tier).await?;
        tx.commit().await?;

        debug!("Deleted book {} from {}", book.id, book.tier);
        Ok(())
    }

    /// Move a ranked book to `new_position`, sliding the contiguous block
    /// between the old and new slots by one. Books outside the span are
    /// never touched. No-op when the positions are equal.
    pub async fn commit_move(&self, book: &Book, new_position: i64) -> Result<()> {
        let mut tx = self.db.begin().await?;

        let current = fetch_book_tx(&mut tx, book.id).await?;
        let old = current.position;
        if old < 1 {
            return Err(Error::InvalidState(format!(
                "book {} is staged, not ranked",
                book.id
            )));
        }
        if new_position == old {
            return Ok(());
        }

        if new_position > old {
            // Moving later: the block (old, new] slides down one.
            sqlx::query(
                "UPDATE books SET position = position - 1 WHERE user_id = ? AND tier = ? AND position > ? AND position <= ?",
            )
            .bind(book.owner_id.to_string())
            .bind(book.tier.as_str())
            .bind(old)
            .bind(new_position)
            .execute(&mut *tx)
            .await?;
        } else {
            // Moving earlier: the block [new, old) slides up one.
            sqlx::query(
                "UPDATE books SET position = position + 1 WHERE user_id = ? AND tier = ? AND position >= ? AND position < ?",
            )
            .bind(book.owner_id.to_string())
            .bind(book.tier.as_str())
            .bind(new_position)
            .bind(old)
            .execute(&mut *tx)
            .await?;
        }

        place_tx(&mut tx, book.id, new_position).await?;
        audit_density_tx(&mut tx, book.owner_id, book.tier).await?;
        tx.commit().await?;

        debug!(
            "Moved book {} from position {} to {} in {}",
            book.id, old, new_position, book.tier
        );
        Ok(())
    }
}

fn book_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Book> {
    let guid: String = row.get("guid");
    let user_id: String = row.get("user_id");
    let tier_str: String = row.get("tier");

    let tier = Tier::from_str(&tier_str)
        .ok_or_else(|| Error::InvariantViolation(format!("unknown tier '{}'", tier_str)))?;

    Ok(Book {
        id: Uuid::parse_str(&guid)
            .map_err(|e| Error::InvariantViolation(format!("bad book guid: {}", e)))?,
        owner_id: Uuid::parse_str(&user_id)
            .map_err(|e| Error::InvariantViolation(format!("bad user guid: {}", e)))?,
        title: row.get("title"),
        author: row.get("author"),
        tier,
        position: row.get("position"),
    })
}

async fn fetch_book_tx(tx: &mut Transaction<'_, Sqlite>, id: Uuid) -> Result<Book> {
    let row = sqlx::query(
        "SELECT guid, user_id, title, author, tier, position FROM books WHERE guid = ?",
    )
    .bind(id.to_string())
    .fetch_optional(&mut **tx)
    .await?
    .ok_or_else(|| Error::NotFound(format!("book {}", id)))?;

    book_from_row(&row)
}

async fn place_tx(tx: &mut Transaction<'_, Sqlite>, id: Uuid, position: i64) -> Result<()> {
    sqlx::query("UPDATE books SET position = ? WHERE guid = ?")
        .bind(position)
        .bind(id.to_string())
        .execute(&mut **tx)
        .await?;
    Ok(())
}

/// Verify that ranked positions of (owner, tier) are exactly 1..=N.
///
/// A failure here means an engine bug; the transaction is dropped without
/// committing and the caller sees `InvariantViolation`.
async fn audit_density_tx(
    tx: &mut Transaction<'_, Sqlite>,
    owner_id: Uuid,
    tier: Tier,
) -> Result<()> {
    let positions: Vec<i64> = sqlx::query_scalar(
        "SELECT position FROM books WHERE user_id = ? AND tier = ? AND position >= 1 ORDER BY position ASC",
    )
    .bind(owner_id.to_string())
    .bind(tier.as_str())
    .fetch_all(&mut **tx)
    .await?;

    for (i, pos) in positions.iter().enumerate() {
        let expected = i as i64 + 1;
        if *pos != expected {
            error!(
                "Density violation in {}/{}: expected position {}, found {}",
                owner_id, tier, expected, pos
            );
            return Err(Error::InvariantViolation(format!(
                "tier {} of user {}: expected position {}, found {}",
                tier, owner_id, expected, pos
            )));
        }
    }

    Ok(())
}
