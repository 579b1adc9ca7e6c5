//! Edit leases for tasks
//!
//! An edit lease marks a task as being edited by one user. It is advisory:
//! nothing prevents a write without one, but the conflict detector reports a
//! conflict to anyone else who tries to start editing while it is live.
//!
//! # Lifecycle
//!
//! - acquired by compare-and-set on the task's lease slot
//! - renewed when the holder acquires again
//! - released by the holder, or cleared by an overwrite resolution
//! - expires on its own once `expires_at` has passed

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::user::User;

// =============================================================================
// Edit Lease
// =============================================================================

/// A time-bounded claim on a task's edit form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditLease {
    /// User holding the lease
    pub holder: User,

    /// When the lease was (last) acquired
    pub acquired_at: DateTime<Utc>,

    /// Lease length in seconds
    pub ttl_secs: i64,

    /// Expiration timestamp
    pub expires_at: DateTime<Utc>,
}

impl EditLease {
    /// Create a lease for `holder` starting at `now`
    pub fn new(holder: User, ttl: Duration, now: DateTime<Utc>) -> Self {
        Self {
            holder,
            acquired_at: now,
            ttl_secs: ttl.num_seconds(),
            expires_at: expiry(now, ttl),
        }
    }

    pub fn ttl(&self) -> Duration {
        Duration::try_seconds(self.ttl_secs).unwrap_or(Duration::MAX)
    }

    /// Check liveness at a given timestamp
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }

    pub fn is_held_by(&self, user: &User) -> bool {
        self.holder.id == user.id
    }

    /// Restart the lease clock at `now` keeping the same TTL
    pub fn renew_at(&mut self, now: DateTime<Utc>) {
        self.acquired_at = now;
        self.expires_at = expiry(now, self.ttl());
    }
}

/// `now + ttl`, saturating at the latest representable instant
fn expiry(now: DateTime<Utc>, ttl: Duration) -> DateTime<Utc> {
    now.checked_add_signed(ttl).unwrap_or(DateTime::<Utc>::MAX_UTC)
}

// =============================================================================
// Slot operations
// =============================================================================

/// Compare-and-set acquisition on a lease slot.
///
/// Succeeds when the slot is empty, expired, or already held by `user`
/// (which renews it). Fails with `EditConflict` when another user holds a
/// live lease.
pub fn acquire_at<'a>(
    slot: &'a mut Option<EditLease>,
    user: &User,
    ttl: Duration,
    now: DateTime<Utc>,
) -> Result<&'a EditLease> {
    let live = slot.as_ref().filter(|existing| existing.is_active_at(now));
    if let Some(existing) = live.filter(|existing| !existing.is_held_by(user)) {
        return Err(Error::EditConflict {
            holder: existing.holder.name.clone(),
        });
    }
    if live.is_none() {
        *slot = None;
    }

    let lease = slot.get_or_insert_with(|| EditLease::new(user.clone(), ttl, now));
    lease.renew_at(now);
    Ok(lease)
}

/// Release the lease if `user` holds it. Returns whether anything was cleared.
pub fn release(slot: &mut Option<EditLease>, user: &User) -> bool {
    if slot.as_ref().is_some_and(|existing| existing.is_held_by(user)) {
        *slot = None;
        return true;
    }
    false
}

/// Drop an expired lease from the slot at `now`. Returns the expired lease.
pub fn expire_stale_at(slot: &mut Option<EditLease>, now: DateTime<Utc>) -> Option<EditLease> {
    if slot.as_ref().is_some_and(|lease| !lease.is_active_at(now)) {
        return slot.take();
    }
    None
}

// =============================================================================
// Duration Parsing
// =============================================================================

/// Parse a duration string like "12s", "5m", "2h"
pub fn parse_duration(s: &str) -> Result<Duration> {
    let s = s.trim();
    if s.is_empty() {
        return Err(Error::InvalidArgument("Duration cannot be empty".to_string()));
    }

    let (num_str, unit) = if let Some(pos) = s.find(|c: char| !c.is_ascii_digit()) {
        (&s[..pos], &s[pos..])
    } else {
        // Assume seconds if no unit
        (s, "s")
    };

    let num: i64 = num_str.parse().map_err(|_| {
        Error::InvalidArgument(format!("Invalid duration number: {}", num_str))
    })?;

    let duration = match unit.to_lowercase().as_str() {
        "s" | "sec" | "second" | "seconds" => Duration::try_seconds(num),
        "m" | "min" | "minute" | "minutes" => Duration::try_minutes(num),
        "h" | "hr" | "hour" | "hours" => Duration::try_hours(num),
        "d" | "day" | "days" => Duration::try_days(num),
        "w" | "week" | "weeks" => Duration::try_weeks(num),
        _ => {
            return Err(Error::InvalidArgument(format!(
                "Invalid duration unit '{}'. Expected: s, m, h, d, w",
                unit
            )));
        }
    };

    duration.ok_or_else(|| Error::InvalidArgument(format!("Duration out of range: {}", s)))
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::user::mock_users;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap()
    }

    #[test]
    fn test_duration_parse() {
        assert_eq!(parse_duration("12s").unwrap(), Duration::seconds(12));
        assert_eq!(parse_duration("5m").unwrap(), Duration::minutes(5));
        assert_eq!(parse_duration("2h").unwrap(), Duration::hours(2));
        assert_eq!(parse_duration("1d").unwrap(), Duration::days(1));
        assert_eq!(parse_duration("30").unwrap(), Duration::seconds(30));
        assert!(parse_duration("").is_err());
        assert!(parse_duration("soon").is_err());
        assert!(parse_duration("3y").is_err());
        assert!(parse_duration("99999999999999999s").is_err());
        assert!(parse_duration("9999999999999999w").is_err());
        assert!(parse_duration("99999999999999999999").is_err());
    }

    #[test]
    fn huge_ttl_saturates_expiry() {
        let users = mock_users();
        let ttl = parse_duration("15000000w").unwrap();
        let lease = EditLease::new(users[0].clone(), ttl, t0());
        assert_eq!(lease.expires_at, DateTime::<Utc>::MAX_UTC);
        assert!(lease.is_active_at(t0()));
    }

    #[test]
    fn acquire_empty_slot() {
        let users = mock_users();
        let mut slot = None;
        let lease = acquire_at(&mut slot, &users[0], Duration::minutes(5), t0()).unwrap();
        assert_eq!(lease.holder.id, "1");
        assert_eq!(lease.expires_at, t0() + Duration::minutes(5));
        assert!(slot.is_some());
    }

    #[test]
    fn acquire_held_by_other_conflicts() {
        let users = mock_users();
        let mut slot = Some(EditLease::new(users[1].clone(), Duration::minutes(5), t0()));
        let err = acquire_at(&mut slot, &users[0], Duration::minutes(5), t0()).unwrap_err();
        match err {
            Error::EditConflict { holder } => assert_eq!(holder, "Bob Smith"),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(slot.unwrap().holder.id, "2");
    }

    #[test]
    fn reacquire_by_holder_renews() {
        let users = mock_users();
        let mut slot = Some(EditLease::new(users[0].clone(), Duration::minutes(5), t0()));
        let later = t0() + Duration::minutes(3);
        let lease = acquire_at(&mut slot, &users[0], Duration::minutes(5), later).unwrap();
        assert_eq!(lease.acquired_at, later);
        assert_eq!(lease.expires_at, later + Duration::minutes(5));
    }

    #[test]
    fn expired_lease_can_be_taken_over() {
        let users = mock_users();
        let mut slot = Some(EditLease::new(users[1].clone(), Duration::minutes(5), t0()));
        let later = t0() + Duration::minutes(6);
        let lease = acquire_at(&mut slot, &users[0], Duration::minutes(5), later).unwrap();
        assert_eq!(lease.holder.id, "1");
    }

    #[test]
    fn release_only_by_holder() {
        let users = mock_users();
        let mut slot = Some(EditLease::new(users[1].clone(), Duration::minutes(5), t0()));
        assert!(!release(&mut slot, &users[0]));
        assert!(slot.is_some());
        assert!(release(&mut slot, &users[1]));
        assert!(slot.is_none());
        assert!(!release(&mut slot, &users[1]));
    }

    #[test]
    fn expire_stale_drops_only_dead_leases() {
        let users = mock_users();
        let mut slot = Some(EditLease::new(users[1].clone(), Duration::minutes(5), t0()));
        assert!(expire_stale_at(&mut slot, t0() + Duration::minutes(1)).is_none());
        assert!(slot.is_some());
        let expired = expire_stale_at(&mut slot, t0() + Duration::minutes(5)).unwrap();
        assert_eq!(expired.holder.id, "2");
        assert!(slot.is_none());
    }
}
