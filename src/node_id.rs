use derive_more::{Display, From, Into};
#[cfg(feature = "serialize_serde")]
use serde::{Deserialize, Serialize};

/// The identity of a replica taking part in the experiment.
///
/// Replica identities start at [`ReplicaId::FIRST`] and are handed out
/// sequentially, in host order, by the replica assignment.
#[cfg_attr(feature = "serialize_serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serialize_serde", serde(transparent))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Display, From, Into)]
pub struct ReplicaId(pub u32);

/// The identity of a client driver. Lives in its own identity space,
/// so `ClientId(1)` and `ReplicaId(1)` name different processes.
#[cfg_attr(feature = "serialize_serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serialize_serde", serde(transparent))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Display, From, Into)]
pub struct ClientId(pub u32);

impl ReplicaId {
    pub const FIRST: Self = Self(1);

    #[must_use]
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }

    #[must_use]
    pub fn into_u32(self) -> u32 {
        self.0
    }

    /// The zero based index of this replica in identity indexed lists
    /// (such as the location list).
    pub(crate) fn index(self) -> usize {
        (self.0 as usize).saturating_sub(1)
    }
}

impl ClientId {
    pub const FIRST: Self = Self(1);

    #[must_use]
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }

    #[must_use]
    pub fn into_u32(self) -> u32 {
        self.0
    }
}
