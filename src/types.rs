//! Shared types used by the session, the compressor and the workbench.

use serde::{Serialize, Serializer};
use std::sync::Arc;

/// A named, typed image blob.
///
/// Bytes are shared and immutable, so cloning an `ImageFile` is cheap: the
/// session, the workbench and a preview resource can all hold the same file.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageFile {
    pub name: String,
    pub mime_type: String,
    data: Arc<[u8]>,
}

impl ImageFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    /// Size in bytes.
    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    /// Whether the declared MIME type is an image type.
    pub fn is_image(&self) -> bool {
        self.mime_type.starts_with("image/")
    }
}

impl std::fmt::Debug for ImageFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageFile")
            .field("name", &self.name)
            .field("mime_type", &self.mime_type)
            .field("size", &self.data.len())
            .finish()
    }
}

/// Serialized as metadata only; bytes never end up in JSON output.
impl Serialize for ImageFile {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;
        let mut s = serializer.serialize_struct("ImageFile", 3)?;
        s.serialize_field("name", &self.name)?;
        s.serialize_field("mime_type", &self.mime_type)?;
        s.serialize_field("size", &self.size())?;
        s.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_mime_prefix_is_required() {
        assert!(ImageFile::new("a.png", "image/png", vec![1]).is_image());
        assert!(!ImageFile::new("a.txt", "text/plain", vec![1]).is_image());
        assert!(!ImageFile::new("a", "", vec![1]).is_image());
    }

    #[test]
    fn clone_shares_bytes() {
        let a = ImageFile::new("a.jpg", "image/jpeg", vec![0; 64]);
        let b = a.clone();
        assert_eq!(a.bytes().as_ptr(), b.bytes().as_ptr());
        assert_eq!(b.size(), 64);
    }

    #[test]
    fn serializes_metadata_without_bytes() {
        let file = ImageFile::new("a.jpg", "image/jpeg", vec![0; 10]);
        let json = serde_json::to_value(&file).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"name": "a.jpg", "mime_type": "image/jpeg", "size": 10})
        );
    }
}
