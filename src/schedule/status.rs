use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Lifecycle of an appointment.
///
/// `Scheduled` is the only state with outgoing transitions; the other three
/// are terminal and can only be purged.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "kebab-case")]
#[sqlx(rename_all = "kebab-case")]
pub enum AppointmentStatus {
    Scheduled,
    Completed,
    NoShow,
    Cancelled,
}

impl AppointmentStatus {
    pub const ALL: [Self; 4] = [
        Self::Scheduled,
        Self::Completed,
        Self::NoShow,
        Self::Cancelled,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::Completed => "completed",
            Self::NoShow => "no-show",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Scheduled => "Scheduled",
            Self::Completed => "Completed",
            Self::NoShow => "No-show",
            Self::Cancelled => "Cancelled",
        }
    }

    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Scheduled)
    }

    /// Statuses that keep the chair busy for availability purposes.
    pub fn occupies_chair(self) -> bool {
        matches!(self, Self::Scheduled | Self::Completed)
    }

    /// The transition table: which statuses can follow this one.
    pub fn transitions(self) -> &'static [Self] {
        match self {
            Self::Scheduled => &[Self::Completed, Self::NoShow, Self::Cancelled],
            Self::Completed | Self::NoShow | Self::Cancelled => &[],
        }
    }

    pub fn can_transition_to(self, next: Self) -> bool {
        self.transitions().contains(&next)
    }

    pub fn can_purge(self) -> bool {
        self.is_terminal()
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown appointment status `{0}`")]
pub struct UnknownStatus(pub String);

impl FromStr for AppointmentStatus {
    type Err = UnknownStatus;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == value)
            .ok_or_else(|| UnknownStatus(value.to_string()))
    }
}
