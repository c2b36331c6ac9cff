//! Staging and encoding of file attachments. A file is validated before
//! anything touches the network: the 5 MiB ceiling and the accepted-type
//! filter both reject locally, and only images get a preview.

use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bytes::Bytes;
use tracing::warn;

use crate::error::ChatError;
use crate::model::Attachment;

/// Default attachment ceiling: 5 MiB, checked against the raw byte length.
pub const DEFAULT_MAX_BYTES: u64 = 5 * 1024 * 1024;

/// Non-image extensions the compose box accepts.
const DOC_EXTENSIONS: [&str; 4] = ["pdf", "doc", "docx", "txt"];

/// A local file picked for sending, before any encoding.
#[derive(Debug, Clone)]
pub struct FileInput {
    pub name: String,
    pub mime: String,
    pub bytes: Bytes,
}

impl FileInput {
    pub fn new(name: impl Into<String>, mime: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            mime: mime.into(),
            bytes: bytes.into(),
        }
    }

    /// Read a file from disk, detecting its MIME type from the content
    /// magic first and the file name second.
    pub async fn read(path: &Path) -> Result<Self, ChatError> {
        let bytes = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "file".into());
        let mime = infer::get(&bytes)
            .map(|kind| kind.mime_type().to_string())
            .or_else(|| mime_guess::from_path(path).first().map(|m| m.to_string()))
            .unwrap_or_else(|| "application/octet-stream".into());
        Ok(Self {
            name,
            mime,
            bytes: Bytes::from(bytes),
        })
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn is_image(&self) -> bool {
        self.mime.starts_with("image/")
    }
}

/// Decoded preview of a staged image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preview {
    pub data_url: String,
    pub width: u32,
    pub height: u32,
}

/// The single staged attachment slot. Replaced wholesale when another file
/// is selected; cleared on send.
#[derive(Debug, Clone)]
pub struct Staged {
    pub file: FileInput,
    pub preview: Option<Preview>,
}

/// Check a file against the size ceiling and the accepted-type filter.
pub fn validate(file: &FileInput, max_bytes: u64) -> Result<(), ChatError> {
    if file.size() > max_bytes {
        return Err(ChatError::FileTooLarge {
            size: file.size(),
            limit: max_bytes,
        });
    }
    if file.is_image() {
        return Ok(());
    }
    let ext = file
        .name
        .rsplit_once('.')
        .map(|(_, e)| e.to_ascii_lowercase())
        .unwrap_or_default();
    if DOC_EXTENSIONS.contains(&ext.as_str()) {
        return Ok(());
    }
    Err(ChatError::UnsupportedFileType {
        mime: file.mime.clone(),
    })
}

/// Validate a file and stage it. Images are decoded off the event loop to
/// produce a preview; a file whose image data fails to decode stays
/// attachable, just without a preview.
pub async fn stage(file: FileInput, max_bytes: u64) -> Result<Staged, ChatError> {
    validate(&file, max_bytes)?;
    let preview = if file.is_image() {
        let bytes = file.bytes.clone();
        let mime = file.mime.clone();
        let decoded = tokio::task::spawn_blocking(move || {
            image::load_from_memory(&bytes).map(|img| Preview {
                data_url: data_url(&mime, &bytes),
                width: img.width(),
                height: img.height(),
            })
        })
        .await
        .map_err(|_| ChatError::EncodeFailed)?;
        match decoded {
            Ok(p) => Some(p),
            Err(e) => {
                warn!(name = %file.name, error = %e, "image preview decode failed");
                None
            }
        }
    } else {
        None
    };
    Ok(Staged { file, preview })
}

/// Encode a staged file into its wire form. This is the suspend point a
/// send blocks on before the outbound event is emitted.
pub async fn encode_for_send(file: &FileInput) -> Result<Attachment, ChatError> {
    let bytes = file.bytes.clone();
    let mime = file.mime.clone();
    let data = tokio::task::spawn_blocking(move || data_url(&mime, &bytes))
        .await
        .map_err(|_| ChatError::EncodeFailed)?;
    Ok(Attachment {
        name: file.name.clone(),
        mime: file.mime.clone(),
        data,
        size: file.size(),
    })
}

fn data_url(mime: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime, STANDARD.encode(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(width, height, image::Rgba([1, 2, 3, 255]));
        let mut out = std::io::Cursor::new(Vec::new());
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut out, image::ImageOutputFormat::Png)
            .unwrap();
        out.into_inner()
    }

    #[test]
    fn size_ceiling_is_inclusive() {
        let at_limit = FileInput::new("a.txt", "text/plain", vec![0u8; DEFAULT_MAX_BYTES as usize]);
        assert!(validate(&at_limit, DEFAULT_MAX_BYTES).is_ok());

        let over = FileInput::new(
            "a.txt",
            "text/plain",
            vec![0u8; DEFAULT_MAX_BYTES as usize + 1],
        );
        match validate(&over, DEFAULT_MAX_BYTES) {
            Err(ChatError::FileTooLarge { size, limit }) => {
                assert_eq!(size, DEFAULT_MAX_BYTES + 1);
                assert_eq!(limit, DEFAULT_MAX_BYTES);
            }
            other => panic!("expected FileTooLarge, got {other:?}"),
        }
    }

    #[test]
    fn type_filter_accepts_images_and_documents() {
        assert!(validate(
            &FileInput::new("p.png", "image/png", vec![0u8; 4]),
            DEFAULT_MAX_BYTES
        )
        .is_ok());
        assert!(validate(
            &FileInput::new("Report.PDF", "application/pdf", vec![0u8; 4]),
            DEFAULT_MAX_BYTES
        )
        .is_ok());
        assert!(matches!(
            validate(
                &FileInput::new("tool.exe", "application/octet-stream", vec![0u8; 4]),
                DEFAULT_MAX_BYTES
            ),
            Err(ChatError::UnsupportedFileType { .. })
        ));
    }

    #[tokio::test]
    async fn images_are_staged_with_a_preview() {
        let file = FileInput::new("pic.png", "image/png", png_bytes(3, 2));
        let staged = stage(file, DEFAULT_MAX_BYTES).await.unwrap();
        let preview = staged.preview.expect("image should get a preview");
        assert_eq!((preview.width, preview.height), (3, 2));
        assert!(preview.data_url.starts_with("data:image/png;base64,"));
    }

    #[tokio::test]
    async fn corrupt_image_stages_without_preview() {
        let file = FileInput::new("pic.png", "image/png", b"not a png".to_vec());
        let staged = stage(file, DEFAULT_MAX_BYTES).await.unwrap();
        assert!(staged.preview.is_none());
    }

    #[tokio::test]
    async fn non_images_get_no_preview() {
        let file = FileInput::new("notes.txt", "text/plain", b"hello".to_vec());
        let staged = stage(file, DEFAULT_MAX_BYTES).await.unwrap();
        assert!(staged.preview.is_none());
    }

    #[tokio::test]
    async fn encoding_embeds_mime_and_size() {
        let file = FileInput::new("notes.txt", "text/plain", b"hi".to_vec());
        let att = encode_for_send(&file).await.unwrap();
        assert_eq!(att.data, "data:text/plain;base64,aGk=");
        assert_eq!(att.size, 2);
        assert_eq!(att.mime, "text/plain");
    }
}
