//! Remote resource slices

use super::actions::Lifecycle;

/// What a failed fetch does to previously loaded data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Back to the empty default (lists)
    Reset,
    /// Keep showing the last good data next to the error (reports, details)
    KeepStale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Loading,
    Loaded,
    Failed,
}

/// One independently tracked piece of server data
#[derive(Debug, Clone, PartialEq)]
pub struct Remote<T> {
    pub data: T,
    pub loading: bool,
    pub error: Option<String>,
    pub phase: Phase,
    /// Sequence number of the latest request issued for this slice
    pub seq: u64,
    pub policy: FailurePolicy,
}

impl<T: Default> Remote<T> {
    pub fn new(policy: FailurePolicy) -> Self {
        Self {
            data: T::default(),
            loading: false,
            error: None,
            phase: Phase::Idle,
            seq: 0,
            policy,
        }
    }

    /// Fold one lifecycle event into the slice
    ///
    /// Outcomes carrying anything but the latest issued sequence number are
    /// dropped, as are `Started` events older than the current request.
    pub fn apply(self, event: Lifecycle<T>) -> Self {
        match event {
            Lifecycle::Started { seq } if seq >= self.seq => Remote {
                loading: true,
                error: None,
                phase: Phase::Loading,
                seq,
                ..self
            },
            Lifecycle::Succeeded { seq, payload } if seq == self.seq => Remote {
                data: payload,
                loading: false,
                error: None,
                phase: Phase::Loaded,
                ..self
            },
            Lifecycle::Failed { seq, error } if seq == self.seq => {
                let data = match self.policy {
                    FailurePolicy::Reset => T::default(),
                    FailurePolicy::KeepStale => self.data,
                };
                Remote {
                    data,
                    loading: false,
                    error: Some(error),
                    phase: Phase::Failed,
                    ..self
                }
            }
            stale => {
                tracing::debug!(
                    seq = stale.seq(),
                    latest = self.seq,
                    "Ignoring outcome of superseded request"
                );
                self
            }
        }
    }

    pub fn clear_error(self) -> Self {
        Remote { error: None, ..self }
    }
}
