//! Comparison session
//!
//! Resolves "where does this book belong in its tier?" with one pairwise
//! judgment per round, halving the candidate window each time, so a tier of
//! N books needs at most ceil(log2(N+1)) questions.
//!
//! The session is a plain value owned by the caller between calls: `begin`
//! hands it out, `submit_judgment` advances it in place until it resolves.
//! Dropping it cancels the interview with no store effect.
//!
//! The final insertion point is derived from the last probe's live position
//! and the last judgment only. There is no running low/high interval; the
//! window-halving construction makes the last probe sufficient (see the
//! cross-check against a linear reference in tests/ranking_properties.rs).

use crate::db::shelf::ShelfStore;
use crate::error::{Error, Result};
use crate::tier::Tier;
use tracing::debug;
use uuid::Uuid;

/// What kind of placement this interview resolves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    /// A staged book entering its tier for the first time
    InsertNew,
    /// An already-ranked book being repositioned
    Rerank { old_position: i64 },
}

/// One round's question for the user: subject vs. competitor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingComparison {
    pub subject_id: Uuid,
    pub competitor_id: Uuid,
}

/// Terminal outcome of an interview, to be applied by the resolver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Insert the staged subject at this 1-based position
    Insert { position: i64 },
    /// Move the ranked subject to this 1-based position
    Move { position: i64 },
    /// Rerank landed back on the subject's current slot; nothing to do
    AlreadyPlaced,
}

/// Result of `begin_classification`
#[derive(Debug)]
pub enum ClassificationStep {
    /// Another judgment is needed; the caller holds the session until then
    Pending {
        session: ComparisonSession,
        comparison: PendingComparison,
    },
    /// The interview is over; apply the resolution via the resolver
    Resolved(Resolution),
}

/// Result of `submit_judgment`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JudgmentStep {
    /// Next question; the session stays with the caller
    Pending(PendingComparison),
    /// The interview is over; drop the session and apply the resolution
    Resolved(Resolution),
}

/// In-flight interview state. One per owner at a time; exclusive to the
/// operation that started it.
#[derive(Debug, Clone)]
pub struct ComparisonSession {
    owner_id: Uuid,
    subject_id: Uuid,
    tier: Tier,
    kind: OperationKind,
    /// Candidate competitor ids, best first, narrowing every round
    window: Vec<Uuid>,
    /// Index into `window` of the competitor currently under judgment
    probe: usize,
    rounds: u32,
}

impl ComparisonSession {
    pub fn owner_id(&self) -> Uuid {
        self.owner_id
    }

    pub fn subject_id(&self) -> Uuid {
        self.subject_id
    }

    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    /// Judgments consumed so far
    pub fn rounds(&self) -> u32 {
        self.rounds
    }

    fn current_competitor(&self) -> Uuid {
        self.window[self.probe]
    }

    fn pending(self) -> ClassificationStep {
        let comparison = PendingComparison {
            subject_id: self.subject_id,
            competitor_id: self.current_competitor(),
        };
        ClassificationStep::Pending {
            session: self,
            comparison,
        }
    }
}

/// Start an interview for `subject_id` against its tier's current contents.
///
/// A staged subject (position 0) is inserted as new; a ranked subject is
/// reranked. An empty tier resolves immediately with zero rounds.
pub async fn begin_classification(
    store: &ShelfStore,
    owner_id: Uuid,
    subject_id: Uuid,
) -> Result<ClassificationStep> {
    let subject = store.book(subject_id).await?;
    if subject.owner_id != owner_id {
        return Err(Error::PermissionDenied(format!(
            "book {} is not owned by {}",
            subject_id, owner_id
        )));
    }

    let kind = if subject.position == 0 {
        OperationKind::InsertNew
    } else {
        OperationKind::Rerank {
            old_position: subject.position,
        }
    };

    let window: Vec<Uuid> = store
        .books_in_tier(owner_id, subject.tier)
        .await?
        .into_iter()
        .filter(|b| b.id != subject_id)
        .map(|b| b.id)
        .collect();

    if window.is_empty() {
        // Nothing to compare against: first book of the tier, or the only
        // ranked book reranking itself.
        let resolution = match kind {
            OperationKind::InsertNew => Resolution::Insert { position: 1 },
            OperationKind::Rerank { .. } => Resolution::AlreadyPlaced,
        };
        debug!("Interview for {} resolved immediately: {:?}", subject_id, resolution);
        return Ok(ClassificationStep::Resolved(resolution));
    }

    let probe = window.len() / 2;
    let session = ComparisonSession {
        owner_id,
        subject_id,
        tier: subject.tier,
        kind,
        window,
        probe,
        rounds: 0,
    };
    Ok(session.pending())
}

/// Consume one judgment and either ask the next question or resolve.
///
/// `competitor_id` must be the competitor of the outstanding question;
/// anything else is an `InvalidState` error and the session is left
/// untouched, still pending with the caller.
pub async fn submit_judgment(
    store: &ShelfStore,
    session: &mut ComparisonSession,
    competitor_id: Uuid,
    prefer_subject: bool,
) -> Result<JudgmentStep> {
    if competitor_id != session.current_competitor() {
        return Err(Error::InvalidState(format!(
            "judgment names competitor {} but the outstanding question is about {}",
            competitor_id,
            session.current_competitor()
        )));
    }

    // Stale-session guard: the probe must still be ranked in the same tier.
    let competitor = store.book(competitor_id).await?;
    if competitor.owner_id != session.owner_id
        || competitor.tier != session.tier
        || competitor.position < 1
    {
        return Err(Error::NotFound(format!(
            "competitor {} left the tier mid-interview",
            competitor_id
        )));
    }

    session.rounds += 1;

    if prefer_subject {
        // Subject beats the probe: only better-ranked candidates remain.
        session.window.truncate(session.probe);
    } else {
        // Probe beats the subject: only worse-ranked candidates remain.
        session.window.drain(..=session.probe);
    }

    if !session.window.is_empty() {
        session.probe = session.window.len() / 2;
        return Ok(JudgmentStep::Pending(PendingComparison {
            subject_id: session.subject_id,
            competitor_id: session.current_competitor(),
        }));
    }

    // Window exhausted: the insertion point comes from this last probe.
    let point = if prefer_subject {
        competitor.position
    } else {
        competitor.position + 1
    };

    let resolution = match session.kind {
        OperationKind::InsertNew => Resolution::Insert { position: point },
        OperationKind::Rerank { old_position } => {
            // `point` counts slots with the subject still in place. Landing
            // on the subject's own slot (or just past it) means no move.
            if point == old_position || point == old_position + 1 {
                Resolution::AlreadyPlaced
            } else if point > old_position {
                // The subject vacates its old slot, so targets past it
                // shift back by one.
                Resolution::Move { position: point - 1 }
            } else {
                Resolution::Move { position: point }
            }
        }
    };

    debug!(
        "Interview for {} resolved after {} rounds: {:?}",
        session.subject_id, session.rounds, resolution
    );
    Ok(JudgmentStep::Resolved(resolution))
}
