use std::fmt;

/// State machine of a single site crawl job
///
/// `Idle -> Running -> {FinishedOk, FinishedError}`; a finished job may be
/// started again, which begins a new run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobState {
    /// Never started
    Idle,

    /// The crawl tree is being traversed
    Running,

    /// The crawl tree completed on its own
    FinishedOk,

    /// The crawl was stopped before completing
    FinishedError,
}

impl JobState {
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }

    pub fn is_finished(&self) -> bool {
        matches!(self, Self::FinishedOk | Self::FinishedError)
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::FinishedOk => "finished_ok",
            Self::FinishedError => "finished_error",
        };
        write!(f, "{}", name)
    }
}
