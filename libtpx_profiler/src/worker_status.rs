use std::sync::mpsc::SendError;

/// The stage of a run the progress refers to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Stage {
    #[default]
    Condensing,
    Reading,
    Rendering,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Condensing => write!(f, "Condensing"),
            Self::Reading => write!(f, "Reading"),
            Self::Rendering => write!(f, "Rendering"),
        }
    }
}

/// Progress message sent from a processing task to whoever is watching it
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WorkerStatus {
    pub progress: f32,
    pub stage: Stage,
}

impl WorkerStatus {
    pub fn new(progress: f32, stage: Stage) -> Self {
        Self { progress, stage }
    }
}

/// Outcome of reporting progress; fails once nothing is receiving it
pub type ProgressResult = Result<(), SendError<WorkerStatus>>;
