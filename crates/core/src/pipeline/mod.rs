pub mod annotate_frames_use_case;
pub mod pipeline_logger;
