pub mod aligner;

pub use aligner::{AlignedSeries, AlignmentStats, SignalAligner, SignalFlags};
