use std::fmt;

/// The stages of a single token analysis, in the order they run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnalysisStep {
    Search,
    Market,
    OrderBook,
    Analysis,
}

impl AnalysisStep {
    pub const ALL: [AnalysisStep; 4] = [
        AnalysisStep::Search,
        AnalysisStep::Market,
        AnalysisStep::OrderBook,
        AnalysisStep::Analysis,
    ];
}

impl fmt::Display for AnalysisStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            AnalysisStep::Search => "search",
            AnalysisStep::Market => "market",
            AnalysisStep::OrderBook => "orderbook",
            AnalysisStep::Analysis => "analysis",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepUpdate<'a> {
    Started(&'a str),
    Finished,
}

/// Receives progress notifications while a token is analysed.
///
/// Implemented for any `Fn(AnalysisStep, StepUpdate)` closure.
pub trait ProgressObserver: Send + Sync {
    fn on_step(&self, step: AnalysisStep, update: StepUpdate<'_>);
}

impl<F> ProgressObserver for F
where
    F: Fn(AnalysisStep, StepUpdate<'_>) + Send + Sync,
{
    fn on_step(&self, step: AnalysisStep, update: StepUpdate<'_>) {
        self(step, update)
    }
}

/// Observer that ignores every update.
pub struct NoProgress;

impl ProgressObserver for NoProgress {
    fn on_step(&self, _step: AnalysisStep, _update: StepUpdate<'_>) {}
}
