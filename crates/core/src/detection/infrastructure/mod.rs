pub mod anchor_grid_face_detector;
pub mod annotation;
pub mod color_normalizer;
pub mod detector;
pub mod input_stage;
pub mod math;
pub mod model_resolver;
pub mod ort_model;
pub mod preprocessing;
pub mod registry;
pub mod ssd_face_detector;
