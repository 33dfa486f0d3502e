pub mod color;
pub mod frame;
pub mod histogram;
pub mod motion_model;
pub mod observation_model;
pub mod particle;
pub mod resampler;
pub mod weighting;
