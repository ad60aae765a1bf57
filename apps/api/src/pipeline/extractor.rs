//! Document Extractor: decodes an uploaded CV into plain text.
//!
//! The format is resolved once into a closed `DocumentKind`; each kind maps to
//! exactly one decoder. Decoder errors never leave this module: they are
//! reclassified as `DecodeFailure` with the original error kept as detail.

use std::any::Any;
use std::panic;

use bytes::Bytes;
use tracing::debug;

use crate::pipeline::docx;
use crate::pipeline::{CvText, ErrorKind, PipelineError};

const MIME_PDF: &str = "application/pdf";
const MIME_DOCX: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
const MIME_DOC: &str = "application/msword";

/// An uploaded CV: raw bytes plus what the client declared about them.
#[derive(Debug, Clone)]
pub struct CvDocument {
    pub content: Bytes,
    pub media_type: String,
    pub filename: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Docx,
    LegacyDoc,
    /// Carries the declared media type for the error message.
    Unsupported(String),
}

impl DocumentKind {
    /// Resolves the format from the declared media type or the filename
    /// extension. PDF wins over DOCX, DOCX over legacy DOC.
    pub fn resolve(media_type: &str, filename: &str) -> Self {
        let mime = media_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        let filename = filename.trim().to_ascii_lowercase();

        if mime == MIME_PDF || filename.ends_with(".pdf") {
            DocumentKind::Pdf
        } else if mime == MIME_DOCX || filename.ends_with(".docx") {
            DocumentKind::Docx
        } else if mime == MIME_DOC || filename.ends_with(".doc") {
            DocumentKind::LegacyDoc
        } else {
            DocumentKind::Unsupported(media_type.trim().to_string())
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentExtractor;

impl DocumentExtractor {
    pub fn extract(&self, doc: &CvDocument) -> Result<CvText, PipelineError> {
        let kind = DocumentKind::resolve(&doc.media_type, &doc.filename);
        debug!(
            filename = %doc.filename,
            media_type = %doc.media_type,
            kind = ?kind,
            bytes = doc.content.len(),
            "Extracting CV text"
        );

        let text = match kind {
            DocumentKind::Pdf => extract_pdf(&doc.content)?,
            DocumentKind::Docx => docx::extract_raw_text(&doc.content)
                .map_err(|e| PipelineError::decode_failure("DOCX", e))?,
            DocumentKind::LegacyDoc => {
                return Err(PipelineError::new(
                    ErrorKind::LegacyFormatUnsupported,
                    "Legacy Word documents (.doc) are not supported. \
                     Please save your CV as PDF or DOCX and upload it again.",
                ))
            }
            DocumentKind::Unsupported(media_type) => {
                let shown = if media_type.is_empty() {
                    "unknown"
                } else {
                    media_type.as_str()
                };
                return Err(PipelineError::new(
                    ErrorKind::UnsupportedFormat,
                    format!(
                        "Unsupported file type '{shown}'. Please upload your CV as PDF or DOCX."
                    ),
                ));
            }
        };

        Ok(CvText::new(text))
    }
}

/// PDF text layer. An image-only PDF has no text layer and yields `""`.
fn extract_pdf(content: &[u8]) -> Result<String, PipelineError> {
    // pdf-extract panics on some malformed inputs instead of returning Err.
    match panic::catch_unwind(|| pdf_extract::extract_text_from_mem(content)) {
        Ok(Ok(text)) => Ok(text),
        Ok(Err(e)) => Err(PipelineError::decode_failure("PDF", e)),
        Err(payload) => Err(PipelineError::decode_failure(
            "PDF",
            format!("decoder panicked: {}", panic_message(payload.as_ref())),
        )),
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::pipeline::docx::tests::build_docx;

    /// Builds a one-page PDF whose text layer contains `text` in Helvetica.
    pub(crate) fn build_pdf(text: &str) -> Vec<u8> {
        let content = format!("BT /F1 24 Tf 72 700 Td ({text}) Tj ET");
        let objects = [
            "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
            "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] \
             /Resources << /Font << /F1 5 0 R >> >> /Contents 4 0 R >>"
                .to_string(),
            format!(
                "<< /Length {} >>\nstream\n{content}\nendstream",
                content.len()
            ),
            "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>"
                .to_string(),
        ];

        let mut pdf = String::from("%PDF-1.4\n");
        let mut offsets = Vec::with_capacity(objects.len());
        for (i, body) in objects.iter().enumerate() {
            offsets.push(pdf.len());
            pdf.push_str(&format!("{} 0 obj\n{body}\nendobj\n", i + 1));
        }

        let xref_offset = pdf.len();
        pdf.push_str(&format!("xref\n0 {}\n", objects.len() + 1));
        pdf.push_str("0000000000 65535 f \n");
        for offset in offsets {
            pdf.push_str(&format!("{offset:010} 00000 n \n"));
        }
        pdf.push_str(&format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref_offset}\n%%EOF\n",
            objects.len() + 1
        ));
        pdf.into_bytes()
    }

    fn doc(content: impl Into<Bytes>, media_type: &str, filename: &str) -> CvDocument {
        CvDocument {
            content: content.into(),
            media_type: media_type.to_string(),
            filename: filename.to_string(),
        }
    }

    #[test]
    fn test_resolve_by_media_type() {
        assert_eq!(DocumentKind::resolve("application/pdf", "cv"), DocumentKind::Pdf);
        assert_eq!(DocumentKind::resolve(MIME_DOCX, "cv"), DocumentKind::Docx);
        assert_eq!(
            DocumentKind::resolve("application/msword", "cv"),
            DocumentKind::LegacyDoc
        );
    }

    #[test]
    fn test_resolve_by_extension() {
        assert_eq!(
            DocumentKind::resolve("application/octet-stream", "CV.PDF"),
            DocumentKind::Pdf
        );
        assert_eq!(
            DocumentKind::resolve("application/octet-stream", "cv.docx"),
            DocumentKind::Docx
        );
        assert_eq!(
            DocumentKind::resolve("application/octet-stream", "cv.doc"),
            DocumentKind::LegacyDoc
        );
    }

    #[test]
    fn test_resolve_ignores_media_type_parameters_and_case() {
        assert_eq!(
            DocumentKind::resolve("Application/PDF; charset=binary", "upload"),
            DocumentKind::Pdf
        );
    }

    #[test]
    fn test_resolve_pdf_takes_priority() {
        assert_eq!(
            DocumentKind::resolve("application/msword", "cv.pdf"),
            DocumentKind::Pdf
        );
        assert_eq!(DocumentKind::resolve(MIME_DOCX, "cv.doc"), DocumentKind::Docx);
    }

    #[test]
    fn test_resolve_unknown_keeps_media_type() {
        assert_eq!(
            DocumentKind::resolve("application/unknown", "cv.txt"),
            DocumentKind::Unsupported("application/unknown".to_string())
        );
    }

    #[test]
    fn test_pdf_text_layer_extracted() {
        let cv = doc(build_pdf("Hello World"), "application/pdf", "cv.pdf");
        let text = DocumentExtractor.extract(&cv).unwrap();
        assert!(
            text.as_str().contains("Hello World"),
            "unexpected PDF text: {:?}",
            text.as_str()
        );
    }

    #[test]
    fn test_corrupt_pdf_is_decode_failure() {
        let cv = doc(&b"%PDF-1.4 garbage without any objects"[..], "application/pdf", "cv.pdf");
        let err = DocumentExtractor.extract(&cv).unwrap_err();
        assert_eq!(err.kind, ErrorKind::DecodeFailure);
        assert!(err.detail.is_some());
    }

    #[test]
    fn test_docx_text_extracted() {
        let cv = doc(
            build_docx(&["Senior Go developer, 6 years experience", "Kubernetes, gRPC"]),
            MIME_DOCX,
            "cv.docx",
        );
        let text = DocumentExtractor.extract(&cv).unwrap();
        assert!(text.as_str().contains("Senior Go developer, 6 years experience"));
        assert!(text.as_str().contains("Kubernetes, gRPC"));
    }

    #[test]
    fn test_corrupt_docx_is_decode_failure() {
        let cv = doc(&b"PK not really a zip"[..], "", "cv.docx");
        let err = DocumentExtractor.extract(&cv).unwrap_err();
        assert_eq!(err.kind, ErrorKind::DecodeFailure);
    }

    #[test]
    fn test_legacy_doc_always_rejected() {
        for cv in [
            doc(&b"\xD0\xCF\x11\xE0 ole compound file"[..], "application/msword", "cv"),
            doc(build_docx(&["valid content"]), "application/octet-stream", "cv.doc"),
            doc(Bytes::new(), "application/msword", "cv.doc"),
        ] {
            let err = DocumentExtractor.extract(&cv).unwrap_err();
            assert_eq!(err.kind, ErrorKind::LegacyFormatUnsupported);
        }
    }

    #[test]
    fn test_unknown_media_type_named_in_message() {
        let cv = doc(&b"plain text cv"[..], "application/unknown", "cv.txt");
        let err = DocumentExtractor.extract(&cv).unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnsupportedFormat);
        assert!(err.message.contains("application/unknown"));
    }

    #[test]
    fn test_panic_message_variants() {
        let static_payload: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(static_payload.as_ref()), "boom");
        let owned_payload: Box<dyn Any + Send> = Box::new(String::from("owned boom"));
        assert_eq!(panic_message(owned_payload.as_ref()), "owned boom");
        let other_payload: Box<dyn Any + Send> = Box::new(42_u8);
        assert_eq!(panic_message(other_payload.as_ref()), "unknown panic");
    }
}
