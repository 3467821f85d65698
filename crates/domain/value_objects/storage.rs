#[derive(Debug, Clone, PartialEq)]
pub struct UploadResult {
    pub object_key: String,
    pub size_bytes: i64,
}
