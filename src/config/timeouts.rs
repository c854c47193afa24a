use enum_map::{Enum, EnumMap};
use std::time::Duration;
use strum::{AsRefStr, Display, EnumIter, IntoEnumIterator};

/// The closed set of durations an experiment is configured with.
/// The tree delta is part of the tree shape, not of this set.
#[derive(Enum, EnumIter, Display, AsRefStr, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[strum(serialize_all = "snake_case")]
pub enum TimeoutKind {
    /// Initial connection timeout
    Connect,
    /// Timeout of a client command
    Client,
    /// Duration of the first view
    View,
    /// Upper bound of the view timeout
    Max,
    /// How often clients raise their rate limit
    RateStepInterval,
    /// Time between measurements
    MeasurementInterval,
    /// Duration of the whole experiment
    Experiment,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Timeouts {
    durations: EnumMap<TimeoutKind, Duration>,
}

impl Timeouts {
    #[must_use]
    pub fn new(durations: EnumMap<TimeoutKind, Duration>) -> Self {
        Self { durations }
    }

    #[must_use]
    pub fn with(mut self, kind: TimeoutKind, duration: Duration) -> Self {
        self.durations[kind] = duration;
        self
    }

    #[must_use]
    pub fn get(&self, kind: TimeoutKind) -> Duration {
        self.durations[kind]
    }

    pub fn iter(&self) -> impl Iterator<Item = (TimeoutKind, Duration)> + '_ {
        TimeoutKind::iter().map(|kind| (kind, self.durations[kind]))
    }

    #[must_use]
    pub fn connect(&self) -> Duration {
        self.get(TimeoutKind::Connect)
    }

    #[must_use]
    pub fn client(&self) -> Duration {
        self.get(TimeoutKind::Client)
    }

    #[must_use]
    pub fn view(&self) -> Duration {
        self.get(TimeoutKind::View)
    }

    #[must_use]
    pub fn max(&self) -> Duration {
        self.get(TimeoutKind::Max)
    }

    #[must_use]
    pub fn rate_step_interval(&self) -> Duration {
        self.get(TimeoutKind::RateStepInterval)
    }

    #[must_use]
    pub fn measurement_interval(&self) -> Duration {
        self.get(TimeoutKind::MeasurementInterval)
    }

    #[must_use]
    pub fn experiment(&self) -> Duration {
        self.get(TimeoutKind::Experiment)
    }
}
