//! Analysis pipeline: multi-timeframe engine, router, scoring and the
//! end-to-end `AnalyzeAssetPipeline`.

pub mod analyze;
pub mod engine;
pub mod router;
pub mod scoring;

pub use analyze::AnalyzeAssetPipeline;
pub use engine::{
    analyze_timeframe, IndicatorBundle, MultiTimeframeContext, MultiTimeframeEngine, TimeframeAnalysis,
    MA_PERIODS,
};
pub use router::{EnsembleDecision, EnsembleRouter, FeatureBag};
pub use scoring::{calibrate_score, ScoreBreakdown, ScoreInputs};
