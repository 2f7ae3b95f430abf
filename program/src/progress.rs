//! Render progress observation.

use std::fmt;

/// Pipeline stage of a render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Parsing,
    Synthesizing,
    Assembling,
    Mixing,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Parsing => "parsing",
            Stage::Synthesizing => "synthesizing",
            Stage::Assembling => "assembling",
            Stage::Mixing => "mixing",
            Stage::Done => "done",
        };
        f.write_str(name)
    }
}

/// Observer for render progress. All methods default to no-ops.
///
/// Calls may come from several synthesis tasks at once.
pub trait Progress: Send + Sync {
    /// A new stage has started.
    fn stage(&self, _stage: Stage) {}

    /// Synthesis of `total` units is about to start.
    fn start(&self, _total: usize) {}

    /// The unit at `index` has its audio.
    fn advance(&self, _index: usize) {}

    /// Synthesis is over, successfully or not.
    fn finish(&self) {}
}

/// Progress observer that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl Progress for NoProgress {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_display() {
        assert_eq!(Stage::Synthesizing.to_string(), "synthesizing");
        assert_eq!(Stage::Done.to_string(), "done");
    }

    #[test]
    fn test_no_progress_is_inert() {
        let p = NoProgress;
        p.stage(Stage::Parsing);
        p.start(3);
        p.advance(1);
        p.finish();
    }
}
