//! Next-identifier allocation with a timestamp fallback.
//!
//! # Responsibility
//! - Derive `PPJ<max+1>` and `max(sequence, 1000) + 1` from the store.
//! - Produce best-effort timestamp-derived values when the store query fails
//!   or when a sequential pair already lost a race.
//!
//! # Invariants
//! - An empty store yields `PPJ001` / `1001`.
//! - Allocation itself never fails; a query error switches to the fallback
//!   path and is logged as `event=id_allocate status=fallback`.
//! - Fallback values may collide (last 6 / last 4 digits of epoch millis);
//!   callers must still handle `DuplicateKey` from the store.

use crate::model::registration::{format_id, ID_PREFIX};
use crate::repo::registration_repo::{RegistrationRepository, RepoError, RepoResult};
use log::{debug, warn};

/// Sequence numbers start right above this value.
pub const SEQUENCE_BASE: u64 = 1000;

const FALLBACK_ID_MODULUS: u64 = 1_000_000;
const FALLBACK_SEQUENCE_MODULUS: u64 = 10_000;

/// Which path produced an identifier pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllocationSource {
    /// Max-scan over existing records.
    Sequential,
    /// Timestamp-derived, lower-quality uniqueness.
    Fallback,
}

impl AllocationSource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sequential => "sequential",
            Self::Fallback => "fallback",
        }
    }
}

/// Proposed identifier pair for a new registration. Not reserved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocatedIds {
    pub id: String,
    pub sequence_number: String,
    pub source: AllocationSource,
}

/// Proposes the next identifier pair, falling back to timestamp-derived
/// values when the store cannot be queried.
pub fn allocate<R: RegistrationRepository + ?Sized>(repo: &R, now_ms: i64) -> AllocatedIds {
    match next_sequential(repo) {
        Ok(ids) => {
            debug!(
                "event=id_allocate module=allocator status=ok source=sequential id={} sequence_number={}",
                ids.id, ids.sequence_number
            );
            ids
        }
        Err(err) => {
            let ids = fallback_ids(now_ms);
            warn!(
                "event=id_allocate module=allocator status=fallback reason=query_failed id={} sequence_number={} error={}",
                ids.id, ids.sequence_number, err
            );
            ids
        }
    }
}

/// Computes the sequential pair from the current store maxima.
///
/// # Errors
/// - Propagates store query failures.
/// - `InvalidData` when a stored maximum is too large to increment.
pub fn next_sequential<R: RegistrationRepository + ?Sized>(repo: &R) -> RepoResult<AllocatedIds> {
    let next_suffix = repo
        .max_id_suffix()?
        .unwrap_or(0)
        .checked_add(1)
        .ok_or_else(|| RepoError::InvalidData("id suffix overflow".to_string()))?;
    let next_sequence = repo
        .max_sequence_number()?
        .unwrap_or(SEQUENCE_BASE)
        .max(SEQUENCE_BASE)
        .checked_add(1)
        .ok_or_else(|| RepoError::InvalidData("sequence number overflow".to_string()))?;

    Ok(AllocatedIds {
        id: format_id(next_suffix),
        sequence_number: next_sequence.to_string(),
        source: AllocationSource::Sequential,
    })
}

/// Timestamp-derived pair: `PPJ` + last 6 digits and last 4 digits of
/// `now_ms`, zero padded.
pub fn fallback_ids(now_ms: i64) -> AllocatedIds {
    let millis = now_ms.unsigned_abs();
    AllocatedIds {
        id: format!("{ID_PREFIX}{:06}", millis % FALLBACK_ID_MODULUS),
        sequence_number: format!("{:04}", millis % FALLBACK_SEQUENCE_MODULUS),
        source: AllocationSource::Fallback,
    }
}

#[cfg(test)]
mod tests {
    use super::{fallback_ids, AllocationSource};

    #[test]
    fn fallback_takes_trailing_digits_of_epoch_millis() {
        let ids = fallback_ids(1_760_000_123_456);
        assert_eq!(ids.id, "PPJ123456");
        assert_eq!(ids.sequence_number, "3456");
        assert_eq!(ids.source, AllocationSource::Fallback);
    }

    #[test]
    fn fallback_zero_pads_short_remainders() {
        let ids = fallback_ids(1_760_000_000_042);
        assert_eq!(ids.id, "PPJ000042");
        assert_eq!(ids.sequence_number, "0042");
    }
}
