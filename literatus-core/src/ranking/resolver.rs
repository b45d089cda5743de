//! Insertion/reposition resolver
//!
//! Translates a finished interview's `Resolution` into one atomic store
//! transaction, and handles direct deletes. Ownership is verified here
//! before any mutation, independently of what the HTTP layer checked.

use crate::db::shelf::ShelfStore;
use crate::error::{Error, Result};
use crate::ranking::session::Resolution;
use tracing::info;
use uuid::Uuid;

/// Apply a resolution for `subject_id` on behalf of `owner_id`.
///
/// `Insert` expects a staged subject, `Move` a ranked one; a subject that
/// changed state mid-interview surfaces as `InvalidState` or `NotFound`
/// with no mutation.
pub async fn apply(
    store: &ShelfStore,
    owner_id: Uuid,
    subject_id: Uuid,
    resolution: Resolution,
) -> Result<()> {
    let subject = store.book(subject_id).await?;
    if subject.owner_id != owner_id {
        return Err(Error::PermissionDenied(format!(
            "book {} is not owned by {}",
            subject_id, owner_id
        )));
    }

    match resolution {
        Resolution::Insert { position } => {
            store.commit_insert(&subject, position).await?;
            info!("Placed {} at position {} in {}", subject.title, position, subject.tier);
        }
        Resolution::Move { position } => {
            if subject.position < 1 {
                return Err(Error::InvalidState(format!(
                    "book {} is staged, cannot be moved",
                    subject_id
                )));
            }
            store.commit_move(&subject, position).await?;
            info!("Moved {} to position {} in {}", subject.title, position, subject.tier);
        }
        Resolution::AlreadyPlaced => {
            info!("{} stays at position {} in {}", subject.title, subject.position, subject.tier);
        }
    }

    Ok(())
}

/// Delete a book, closing the positional gap it leaves
pub async fn delete(store: &ShelfStore, owner_id: Uuid, book_id: Uuid) -> Result<()> {
    let book = store.book(book_id).await?;
    if book.owner_id != owner_id {
        return Err(Error::PermissionDenied(format!(
            "book {} is not owned by {}",
            book_id, owner_id
        )));
    }

    store.commit_delete(&book).await?;
    info!("Deleted {} from {}", book.title, book.tier);
    Ok(())
}

/// Discard a staged book whose interview was abandoned.
///
/// Ranked books are untouched; discarding one is an `InvalidState` error.
pub async fn discard_staged(store: &ShelfStore, owner_id: Uuid, book_id: Uuid) -> Result<()> {
    let book = store.book(book_id).await?;
    if book.owner_id != owner_id {
        return Err(Error::PermissionDenied(format!(
            "book {} is not owned by {}",
            book_id, owner_id
        )));
    }
    if book.position != 0 {
        return Err(Error::InvalidState(format!(
            "book {} is ranked, not staged",
            book_id
        )));
    }

    store.commit_delete(&book).await?;
    info!("Discarded staged book {}", book.title);
    Ok(())
}
