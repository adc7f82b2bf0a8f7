#![doc = include_str!("../README.md")]


mod array_stats;

pub mod bls;
pub use bls::{
    BlsConfig, BlsPeriodogram, BlsPower, BlsPowerBinned, BlsPowerDirect, BoxLeastSquares,
    CandidatePeriod, DurationGrid, PeriodGrid,
};

mod data;
pub use data::{DataSample, LightCurve, SortedArray, TimeSeries};

mod error;
pub use error::{ErrorKind, MalformedInputError, NonConvergenceReason, TransitError};

pub mod mcmc;
pub use mcmc::{
    EnsembleChain, LnPrior1D, PosteriorRun, PosteriorSampleSet, PosteriorSampler, SamplerConfig,
    TransitPrior,
};

pub mod pipeline;
pub use pipeline::{
    BatchReport, CatalogSummary, Confidence, Diagnostic, InitialGuessConfig, Pipeline,
    PipelineConfig, PipelineResult, PipelineRun, TransitEstimate,
};

mod poly_fit;

pub mod preprocess;
pub use preprocess::{CleanedSeries, Preprocessor, PreprocessorConfig, SeriesStatistics};

pub mod transit;
pub use transit::{TransitModel, TransitParameters};

pub use ndarray;
