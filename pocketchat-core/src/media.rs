// Ingestion limits and names shared by the attachment flows.

/// Hard ceiling for an attachment payload. Larger input is rejected, never truncated.
pub const MAX_ATTACHMENT_BYTES: usize = 1024 * 1024;

pub const MAX_IMAGE_WIDTH: u32 = 800;
pub const MAX_IMAGE_HEIGHT: u32 = 600;
pub const JPEG_QUALITY: u8 = 80;

pub const CAMERA_IMAGE_NAME: &str = "camera_image.jpg";
pub const UNKNOWN_FILE_NAME: &str = "unknown_file";

pub const DOCUMENT_MIME_TYPES: &[&str] = &[
    "text/plain",
    "text/csv",
    "application/pdf",
    "application/msword",
    "application/vnd.ms-excel",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
];

pub const IMAGE_MIME_FILTER: &str = "image/*";

pub fn is_document_mime_type(mime: &str) -> bool {
    DOCUMENT_MIME_TYPES
        .iter()
        .any(|m| m.eq_ignore_ascii_case(mime.trim()))
}

/// Best-effort MIME type from a file extension, limited to what the pickers accept.
pub fn mime_type_for_extension(ext: &str) -> Option<&'static str> {
    match ext.to_ascii_lowercase().as_str() {
        "txt" | "text" | "md" => Some("text/plain"),
        "csv" => Some("text/csv"),
        "pdf" => Some("application/pdf"),
        "doc" => Some("application/msword"),
        "xls" => Some("application/vnd.ms-excel"),
        "docx" => {
            Some("application/vnd.openxmlformats-officedocument.wordprocessingml.document")
        }
        "xlsx" => Some("application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"),
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}
