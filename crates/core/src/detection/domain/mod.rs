pub mod detection;
pub mod detector_config;
pub mod errors;
pub mod inference_model;
pub mod object_detector;
