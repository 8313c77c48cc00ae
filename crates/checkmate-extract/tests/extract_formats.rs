use std::io::{Cursor, Write};

use checkmate_extract::{ExtractError, FileKind, OcrEngine, TextExtractor};
use image::{DynamicImage, ImageFormat, RgbImage};
use tempfile::tempdir;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

fn docx_bytes(document_xml: &str) -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    zip.start_file("[Content_Types].xml", SimpleFileOptions::default())
        .unwrap();
    zip.write_all(b"<Types/>").unwrap();
    zip.start_file("word/document.xml", SimpleFileOptions::default())
        .unwrap();
    zip.write_all(document_xml.as_bytes()).unwrap();
    zip.finish().unwrap().into_inner()
}

fn png_bytes() -> Vec<u8> {
    let mut png = Vec::new();
    DynamicImage::ImageRgb8(RgbImage::new(4, 4))
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .unwrap();
    png
}

struct FixedOcr(&'static str);

impl OcrEngine for FixedOcr {
    fn recognize(&self, image: &RgbImage) -> Result<String, ExtractError> {
        assert_eq!(image.dimensions(), (4, 4));
        Ok(self.0.to_string())
    }

    fn name(&self) -> &str {
        "fixed"
    }
}

#[test]
fn docx_paragraphs_become_lines() {
    let xml = r#"<w:document xmlns:w="urn:w"><w:body>
<w:p><w:r><w:t>세종대왕은 훈민정음을 창제하고</w:t></w:r></w:p>
<w:p><w:r><w:t>측우기를 만들었다.</w:t></w:r></w:p>
</w:body></w:document>"#;

    let text = TextExtractor::new()
        .extract(&docx_bytes(xml), FileKind::Docx)
        .unwrap();

    assert_eq!(text, "세종대왕은 훈민정음을 창제하고\n측우기를 만들었다.");
}

#[test]
fn docx_without_document_part_is_corrupt() {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    zip.start_file("other.xml", SimpleFileOptions::default())
        .unwrap();
    zip.write_all(b"<x/>").unwrap();
    let bytes = zip.finish().unwrap().into_inner();

    let err = TextExtractor::new()
        .extract(&bytes, FileKind::Docx)
        .unwrap_err();
    assert!(err.to_string().contains("word/document.xml"));
}

#[test]
fn text_file_on_disk_is_read_by_extension() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("essay.txt");
    std::fs::write(&path, "대륙이동설은 베게너가 제안했다.").unwrap();

    let text = TextExtractor::new().extract_path(&path).unwrap();
    assert_eq!(text, "대륙이동설은 베게너가 제안했다.");
}

#[test]
fn unsupported_extension_is_rejected_before_reading() {
    let err = TextExtractor::new()
        .extract_path(std::path::Path::new("/nonexistent/slides.pptx"))
        .unwrap_err();
    assert!(matches!(err, ExtractError::UnsupportedFormat(_)));
}

#[test]
fn image_is_decoded_and_passed_to_ocr_engine() {
    let extractor = TextExtractor::new().with_ocr(Box::new(FixedOcr("판 구조론")));

    let text = extractor.extract_named("scan.png", &png_bytes()).unwrap();
    assert_eq!(text, "판 구조론");
}

#[test]
fn corrupt_image_is_reported_before_ocr() {
    let extractor = TextExtractor::new().with_ocr(Box::new(FixedOcr("unused")));

    let err = extractor.extract(b"not an image", FileKind::Image).unwrap_err();
    assert!(matches!(
        err,
        ExtractError::Corrupt {
            kind: FileKind::Image,
            ..
        }
    ));
}
