pub mod image_file_sink;
pub mod image_file_source;
pub mod raw_frame_sink;
pub mod raw_frame_source;
