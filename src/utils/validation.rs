use crate::config::UploadConfig;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};

/// Read granularity for section streams
const READ_CHUNK_SIZE: usize = 8192;

/// Magic byte signatures per permitted extension
const FILE_SIGNATURES: &[(&str, &[&[u8]])] = &[
    // Images
    (".jpg", &[&[0xFF, 0xD8, 0xFF]]),
    (".jpeg", &[&[0xFF, 0xD8, 0xFF]]),
    (".png", &[&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]]),
    (".gif", &[b"GIF87a", b"GIF89a"]),
    (".bmp", &[b"BM"]),
    (".tif", &[&[0x49, 0x49, 0x2A, 0x00], &[0x4D, 0x4D, 0x00, 0x2A]]),
    (".tiff", &[&[0x49, 0x49, 0x2A, 0x00], &[0x4D, 0x4D, 0x00, 0x2A]]),
    // Documents
    (".pdf", &[b"%PDF"]),
    // Archives
    (".zip", &[&[0x50, 0x4B, 0x03, 0x04]]),
    (".gz", &[&[0x1F, 0x8B]]),
];

#[derive(Error, Debug)]
pub enum UploadError {
    #[error("File extension '{0}' is not permitted")]
    InvalidExtension(String),

    #[error("File exceeds the maximum allowed size of {limit} bytes")]
    FileTooLarge { limit: usize },

    #[error("File content does not match its '{0}' extension")]
    ContentTypeMismatch(String),

    #[error("File is empty")]
    EmptyFile,

    #[error("Failed to read upload stream: {0}")]
    Stream(#[from] std::io::Error),
}

impl UploadError {
    pub fn code(&self) -> &'static str {
        match self {
            UploadError::InvalidExtension(_) => "INVALID_EXTENSION",
            UploadError::FileTooLarge { .. } => "FILE_TOO_LARGE",
            UploadError::ContentTypeMismatch(_) => "CONTENT_TYPE_MISMATCH",
            UploadError::EmptyFile => "EMPTY_FILE",
            UploadError::Stream(_) => "STREAM_ERROR",
        }
    }
}

/// Bytes of a section that passed every check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedFile {
    pub content: Vec<u8>,
    pub size: usize,
    /// Lower-cased extension with the leading dot
    pub extension: String,
}

/// Extension of an untrusted file name, lower case with the leading dot.
///
/// Only the last path-like segment is considered, so `"a.jpg/evil"` has no
/// extension. The name itself is never used to touch the file system.
pub fn extract_extension(untrusted_name: &str) -> Option<String> {
    let last_segment = untrusted_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(untrusted_name);

    let dot = last_segment.rfind('.')?;
    let ext = &last_segment[dot + 1..];
    if ext.trim().is_empty() {
        return None;
    }
    Some(format!(".{}", ext.to_ascii_lowercase()))
}

/// Checks the claimed extension against the allow-list
pub fn check_extension(untrusted_name: &str, config: &UploadConfig) -> Result<String, UploadError> {
    match extract_extension(untrusted_name) {
        Some(ext) if config.permits(&ext) => Ok(ext),
        Some(ext) => Err(UploadError::InvalidExtension(ext)),
        None => Err(UploadError::InvalidExtension(String::new())),
    }
}

pub fn has_known_signature(extension: &str) -> bool {
    signatures_for(extension).is_some()
}

fn signatures_for(extension: &str) -> Option<&'static [&'static [u8]]> {
    FILE_SIGNATURES
        .iter()
        .find(|(ext, _)| ext.eq_ignore_ascii_case(extension))
        .map(|(_, signatures)| *signatures)
}

/// Checks magic bytes to verify actual content matches the claimed extension
pub fn verify_signature(extension: &str, content: &[u8]) -> Result<(), UploadError> {
    let matches = signatures_for(extension)
        .is_some_and(|signatures| signatures.iter().any(|sig| content.starts_with(sig)));

    if matches {
        Ok(())
    } else {
        Err(UploadError::ContentTypeMismatch(extension.to_string()))
    }
}

/// Reads the whole stream, aborting once more than `max_size` bytes arrive.
/// The partial buffer is dropped on overflow.
pub async fn read_bounded<R>(mut reader: R, max_size: usize) -> Result<Vec<u8>, UploadError>
where
    R: AsyncRead + Unpin,
{
    let mut content = Vec::new();
    let mut chunk = [0u8; READ_CHUNK_SIZE];

    loop {
        let n = reader.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        if content.len() + n > max_size {
            return Err(UploadError::FileTooLarge { limit: max_size });
        }
        content.extend_from_slice(&chunk[..n]);
    }

    Ok(content)
}

/// Full validation pipeline for one file section
pub async fn validate_section<R>(
    untrusted_name: &str,
    reader: R,
    config: &UploadConfig,
) -> Result<ValidatedFile, UploadError>
where
    R: AsyncRead + Unpin,
{
    // 1. Extension check, before touching the stream
    let extension = check_extension(untrusted_name, config)?;

    // 2. Bounded read
    let content = read_bounded(reader, config.max_file_size).await?;

    // 3. Empty check
    if content.is_empty() {
        return Err(UploadError::EmptyFile);
    }

    // 4. Magic bytes verification
    verify_signature(&extension, &content)?;

    let size = content.len();
    Ok(ValidatedFile {
        content,
        size,
        extension,
    })
}

/// Makes an untrusted file name safe to render as HTML text.
/// Control characters are dropped; markup characters are entity-encoded.
pub fn escape_untrusted_name(untrusted_name: &str) -> String {
    let mut escaped = String::with_capacity(untrusted_name.len());
    for c in untrusted_name.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            c if c.is_control() => {}
            c => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::pin::Pin;
    use std::task::{Context, Poll};
    use tokio::io::ReadBuf;

    /// Reader that fails as soon as anyone polls it
    struct UntouchableReader;

    impl AsyncRead for UntouchableReader {
        fn poll_read(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            _buf: &mut ReadBuf<'_>,
        ) -> Poll<io::Result<()>> {
            Poll::Ready(Err(io::Error::other("stream must not be read")))
        }
    }

    fn jpeg(len: usize) -> Vec<u8> {
        let mut data = vec![0xFF, 0xD8, 0xFF, 0xE0];
        data.resize(len, 0x42);
        data
    }

    #[test]
    fn test_extract_extension() {
        assert_eq!(extract_extension("photo.jpg").as_deref(), Some(".jpg"));
        assert_eq!(extract_extension("PHOTO.JPG").as_deref(), Some(".jpg"));
        assert_eq!(extract_extension("archive.tar.gz").as_deref(), Some(".gz"));
        assert_eq!(
            extract_extension("C:\\Users\\me\\photo.jpg").as_deref(),
            Some(".jpg")
        );
        assert_eq!(extract_extension("dir.jpg/photo"), None);
        assert_eq!(extract_extension("photo."), None);
        assert_eq!(extract_extension("photo"), None);
        assert_eq!(extract_extension(""), None);
    }

    #[test]
    fn test_verify_signature() {
        assert!(verify_signature(".jpg", &[0xFF, 0xD8, 0xFF, 0xE0]).is_ok());
        assert!(verify_signature(".gif", b"GIF89a....").is_ok());
        assert!(verify_signature(".pdf", b"%PDF-1.7").is_ok());

        // Executable disguised as image
        assert!(matches!(
            verify_signature(".jpg", b"MZ\x90\x00"),
            Err(UploadError::ContentTypeMismatch(_))
        ));
        // Shorter than the signature
        assert!(verify_signature(".jpg", &[0xFF, 0xD8]).is_err());
        // Unknown extension never matches
        assert!(verify_signature(".exe", b"MZ").is_err());
    }

    #[test]
    fn test_escape_untrusted_name() {
        assert_eq!(escape_untrusted_name("photo.jpg"), "photo.jpg");
        assert_eq!(
            escape_untrusted_name("<img src=x onerror='a'>.jpg"),
            "&lt;img src=x onerror=&#39;a&#39;&gt;.jpg"
        );
        assert_eq!(escape_untrusted_name("a&b\".jpg"), "a&amp;b&quot;.jpg");
        assert_eq!(escape_untrusted_name("line\r\nbreak.jpg"), "linebreak.jpg");
        assert_eq!(escape_untrusted_name("日本語.jpg"), "日本語.jpg");
    }

    #[tokio::test]
    async fn test_accepts_jpeg() {
        let data = jpeg(51200);
        let file = validate_section("photo.jpg", data.as_slice(), &UploadConfig::default())
            .await
            .unwrap();

        assert_eq!(file.size, 51200);
        assert_eq!(file.size, file.content.len());
        assert_eq!(file.content, data);
        assert_eq!(file.extension, ".jpg");
    }

    #[tokio::test]
    async fn test_extension_compare_is_case_insensitive() {
        let data = jpeg(16);
        let file = validate_section("PHOTO.JPG", data.as_slice(), &UploadConfig::default())
            .await
            .unwrap();
        assert_eq!(file.extension, ".jpg");
    }

    #[tokio::test]
    async fn test_rejects_extension_without_reading() {
        let config = UploadConfig::default();

        for name in ["doc.pdf", "noextension", "trailing.", "photo.jpg.exe"] {
            let err = validate_section(name, UntouchableReader, &config)
                .await
                .unwrap_err();
            assert!(
                matches!(err, UploadError::InvalidExtension(_)),
                "{name}: {err}"
            );
        }
    }

    #[tokio::test]
    async fn test_rejects_disguised_executable() {
        let mut data = b"MZ".to_vec();
        data.resize(4096, 0);

        let err = validate_section("virus.jpg", data.as_slice(), &UploadConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::ContentTypeMismatch(ext) if ext == ".jpg"));
    }

    #[tokio::test]
    async fn test_rejects_oversized_stream() {
        let data = jpeg(11 * 1024 * 1024);

        let err = validate_section("big.jpg", data.as_slice(), &UploadConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            UploadError::FileTooLarge { limit } if limit == 10 * 1024 * 1024
        ));
    }

    #[tokio::test]
    async fn test_size_limit_boundary() {
        let config = UploadConfig::new(READ_CHUNK_SIZE + 10, [".jpg"]);

        let exact = jpeg(READ_CHUNK_SIZE + 10);
        let file = validate_section("a.jpg", exact.as_slice(), &config)
            .await
            .unwrap();
        assert_eq!(file.size, config.max_file_size);

        let over = jpeg(READ_CHUNK_SIZE + 11);
        assert!(matches!(
            validate_section("a.jpg", over.as_slice(), &config).await,
            Err(UploadError::FileTooLarge { .. })
        ));
    }

    #[tokio::test]
    async fn test_rejects_empty_file() {
        let err = validate_section("empty.jpg", &b""[..], &UploadConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::EmptyFile));
    }

    #[tokio::test]
    async fn test_stream_failure_is_reported() {
        let err = validate_section("photo.jpg", UntouchableReader, &UploadConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::Stream(_)));
    }

    #[tokio::test]
    async fn test_validation_is_idempotent() {
        let config = UploadConfig::default();
        let data = jpeg(3000);

        let first = validate_section("photo.jpg", data.as_slice(), &config)
            .await
            .unwrap();
        let second = validate_section("photo.jpg", data.as_slice(), &config)
            .await
            .unwrap();
        assert_eq!(first, second);

        let bad = b"not an image".to_vec();
        let first = validate_section("photo.jpg", bad.as_slice(), &config).await;
        let second = validate_section("photo.jpg", bad.as_slice(), &config).await;
        assert_eq!(first.unwrap_err().code(), second.unwrap_err().code());
    }
}
