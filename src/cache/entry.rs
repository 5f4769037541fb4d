//! Cache Entry Module
//!
//! Defines the persisted cache record and its expiration and refresh rules.
//!
//! An entry falls into one of four classes:
//! - Never: no absolute bound and no sliding window, lives until removed
//! - Absolute: fixed lifetime ending at `expires_at`
//! - Sliding: must be accessed within every sliding window or it expires
//! - Slide-until: sliding window capped by an absolute ceiling, first bound wins

use chrono::{DateTime, Duration, Utc};

use crate::clock::Clock;

// == Entry Options ==
/// Caller-supplied expiration settings for a write.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EntryOptions {
    /// Fixed point in time at which the entry expires
    pub absolute_expiration: Option<DateTime<Utc>>,
    /// Lifetime measured from the moment of the write; wins over `absolute_expiration`
    pub absolute_expiration_relative_to_now: Option<Duration>,
    /// Permitted inactivity before the entry expires
    pub sliding_expiration: Option<Duration>,
}

impl EntryOptions {
    /// Options without any expiration.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_absolute_expiration(mut self, at: DateTime<Utc>) -> Self {
        self.absolute_expiration = Some(at);
        self
    }

    pub fn with_absolute_expiration_relative_to_now(mut self, ttl: Duration) -> Self {
        self.absolute_expiration_relative_to_now = Some(ttl);
        self
    }

    pub fn with_sliding_expiration(mut self, window: Duration) -> Self {
        self.sliding_expiration = Some(window);
        self
    }

    /// Returns true if no expiration of any kind was requested.
    pub fn is_empty(&self) -> bool {
        self.absolute_expiration.is_none()
            && self.absolute_expiration_relative_to_now.is_none()
            && self.sliding_expiration.is_none()
    }
}

// == Sliding Window ==
/// The sliding part of an entry: its window length and where the current window ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlidingWindow {
    pub duration: Duration,
    pub refresh_before: DateTime<Utc>,
}

// == Expiration Class ==
/// The expiration class an entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expiration {
    Never,
    Absolute {
        expires_at: DateTime<Utc>,
    },
    Sliding {
        window: SlidingWindow,
    },
    SlideUntil {
        expires_at: DateTime<Utc>,
        window: SlidingWindow,
    },
}

// == Cache Entry ==
/// A single cache record, the unit persisted by an [`EntryStore`](crate::store::EntryStore).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    /// Unique key, the store's primary identifier
    pub key: String,
    /// Opaque payload
    pub value: Vec<u8>,
    /// Absolute expiration, None = no absolute bound
    pub expires_at: Option<DateTime<Utc>>,
    /// Sliding window, None = no sliding expiration
    pub sliding: Option<SlidingWindow>,
}

impl CacheEntry {
    // == Constructor ==
    /// Builds an entry from caller options relative to the clock's current time.
    ///
    /// When both absolute forms are given, the relative-to-now duration wins.
    pub fn create(
        clock: &dyn Clock,
        key: impl Into<String>,
        value: impl Into<Vec<u8>>,
        options: &EntryOptions,
    ) -> Self {
        let now = clock.now();
        let expires_at = options
            .absolute_expiration_relative_to_now
            .map(|ttl| offset(now, ttl))
            .or(options.absolute_expiration);
        let sliding = options.sliding_expiration.map(|duration| SlidingWindow {
            duration,
            refresh_before: offset(now, duration),
        });

        Self {
            key: key.into(),
            value: value.into(),
            expires_at,
            sliding,
        }
    }

    // == Expiration Class ==
    /// Classifies the entry by which bounds are configured.
    pub fn expiration(&self) -> Expiration {
        match (self.expires_at, self.sliding) {
            (None, None) => Expiration::Never,
            (Some(expires_at), None) => Expiration::Absolute { expires_at },
            (None, Some(window)) => Expiration::Sliding { window },
            (Some(expires_at), Some(window)) => Expiration::SlideUntil { expires_at, window },
        }
    }

    /// Returns the earliest configured bound, or None if the entry never expires.
    pub fn effective_expiration(&self) -> Option<DateTime<Utc>> {
        match self.expiration() {
            Expiration::Never => None,
            Expiration::Absolute { expires_at } => Some(expires_at),
            Expiration::Sliding { window } => Some(window.refresh_before),
            Expiration::SlideUntil { expires_at, window } => {
                Some(expires_at.min(window.refresh_before))
            }
        }
    }

    pub fn sliding_duration(&self) -> Option<Duration> {
        self.sliding.map(|window| window.duration)
    }

    pub fn refresh_before(&self) -> Option<DateTime<Utc>> {
        self.sliding.map(|window| window.refresh_before)
    }

    // == Is Expired ==
    /// Checks if the entry has expired according to `clock`.
    ///
    /// The boundary is inclusive: an entry is expired at exactly its bound.
    pub fn is_expired(&self, clock: &dyn Clock) -> bool {
        self.is_expired_at(clock.now())
    }

    /// Same as [`is_expired`](Self::is_expired) for an explicit instant.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.effective_expiration()
            .is_some_and(|expires| expires <= now)
    }

    // == Refresh ==
    /// Starts a new sliding window at the clock's current time.
    ///
    /// Does nothing for expired entries or entries without a sliding window.
    /// Returns the new end of the window if it moved.
    pub fn refresh(&mut self, clock: &dyn Clock) -> Option<DateTime<Utc>> {
        self.refresh_at(clock.now())
    }

    /// Same as [`refresh`](Self::refresh) for an explicit instant.
    pub fn refresh_at(&mut self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        if self.is_expired_at(now) {
            return None;
        }

        let window = self.sliding.as_mut()?;
        window.refresh_before = offset(now, window.duration);
        Some(window.refresh_before)
    }
}

// == Utility Functions ==
/// Adds a signed duration to an instant, saturating at the representable range.
fn offset(instant: DateTime<Utc>, by: Duration) -> DateTime<Utc> {
    instant.checked_add_signed(by).unwrap_or(if by < Duration::zero() {
        DateTime::<Utc>::MIN_UTC
    } else {
        DateTime::<Utc>::MAX_UTC
    })
}
