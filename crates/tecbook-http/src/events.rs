//! Session lifecycle events.

use std::fmt;

/// Why a session was invalidated without the user asking for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidationReason {
    /// The refresh endpoint rejected the refresh token or could not be reached.
    RefreshFailed,
    /// A 401 arrived and there was no refresh token to recover with.
    NoRefreshToken,
    /// The server still answered 401 with a freshly refreshed token.
    RejectedAfterRefresh,
}

impl fmt::Display for InvalidationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            InvalidationReason::RefreshFailed => "token refresh failed",
            InvalidationReason::NoRefreshToken => "no refresh token available",
            InvalidationReason::RejectedAfterRefresh => "request rejected after refresh",
        };
        f.write_str(s)
    }
}

/// Broadcast whenever the session changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    LoggedIn { user_id: Option<i64> },
    Refreshed,
    LoggedOut,
    Invalidated { reason: InvalidationReason },
}

/// Capacity of the session event channel. Slow subscribers lag rather than
/// block the session.
pub(crate) const EVENT_CAPACITY: usize = 32;
