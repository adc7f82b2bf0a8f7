//! Ensemble Markov chain Monte Carlo sampling of transit parameters

mod chain;
pub use chain::{AUTOCORRELATION_WINDOW_C, EnsembleChain};

mod posterior;
pub use posterior::{PosteriorRun, PosteriorSampler, SamplerConfig, TransitPosterior};

mod prior;
pub use prior::{FlatLnPrior1D, LnPrior1D, LnPrior1DTrait, NoneLnPrior1D, TransitPrior};

mod sample_set;
pub use sample_set::PosteriorSampleSet;

mod sampler;
pub use sampler::{EnsembleSampler, LnProbability};
