pub const SSD_MODEL_FILE: &str = "res10_300x300_ssd_iter_140000_fp16.onnx";
pub const YOLO_FACE_MODEL_FILE: &str = "yolov5s-face.onnx";

/// System-wide model directory used when nothing else is configured.
pub const SYSTEM_MODEL_DIR: &str = "/usr/share/odetect";

/// Directory name under the platform data dir holding per-user models.
pub const APP_DIR_NAME: &str = "odetect";

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"];
