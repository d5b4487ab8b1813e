use super::error::Stage;
use crate::core::scoring::afi::AfiScore;

#[derive(Debug, Clone)]
pub enum Progress {
    StageStart { stage: Stage },
    StageFinish { stage: Stage, best_afi: AfiScore },

    BatchStart { candidates: u64 },
    CandidateEvaluated,
    BatchFinish,

    /// Global search found a strictly better sequence.
    Improvement { generation: usize, afi: AfiScore },

    Message(String),
}

pub type ProgressCallback<'a> = Box<dyn Fn(Progress) + Send + Sync + 'a>;

#[derive(Default)]
pub struct ProgressReporter<'a> {
    callback: Option<ProgressCallback<'a>>,
}

impl<'a> ProgressReporter<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_callback(callback: ProgressCallback<'a>) -> Self {
        Self {
            callback: Some(callback),
        }
    }

    #[inline]
    pub fn report(&self, event: Progress) {
        if let Some(cb) = &self.callback {
            cb(event);
        }
    }
}
