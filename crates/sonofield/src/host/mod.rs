//! Stand-ins for the audio and display collaborators of the pipeline

pub mod analyser;
pub mod runner;
pub mod wav;

pub use analyser::{AnalyserConfig, SpectrumAnalyser};
pub use runner::{run, RunOptions, RunReport};
pub use wav::Track;
