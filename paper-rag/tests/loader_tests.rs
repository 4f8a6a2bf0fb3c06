//! PDF discovery and extraction against real files in a temporary storage tree.

mod common;

use std::fs;
use std::path::Path;
use std::sync::Arc;

use common::{BagOfWordsEmbedder, RecordingGenerator, paper};
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};
use paper_rag::{
    Chunker, DocumentLoader, ModelParams, PagePolicy, PaperQa, ParagraphChunker, PdfLoader,
    RagError, find_pdf,
};
use tempfile::TempDir;

/// Build a PDF with one page per entry of `pages`, each showing its text.
fn write_pdf(path: &Path, pages: &[&str]) {
    let laid_out: Vec<Vec<(i64, &str)>> = pages.iter().map(|text| vec![(720, *text)]).collect();
    write_pdf_blocks(path, &laid_out);
}

/// Build a PDF whose pages hold text blocks at the given baselines.
///
/// Each `(y, text)` block is its own text object starting at the left margin.
fn write_pdf_blocks(path: &Path, pages: &[Vec<(i64, &str)>]) {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids: Vec<Object> = Vec::new();
    for blocks in pages {
        let mut operations = Vec::new();
        for &(y, text) in blocks {
            operations.extend([
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Td", vec![72.into(), y.into()]),
                Operation::new("Tj", vec![Object::string_literal(text)]),
                Operation::new("ET", vec![]),
            ]);
        }
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.save(path).unwrap();
}

fn storage_with(document_id: &str) -> (TempDir, std::path::PathBuf) {
    let root = TempDir::new().unwrap();
    let dir = root.path().join(document_id);
    fs::create_dir_all(&dir).unwrap();
    (root, dir)
}

#[test]
fn missing_directory_is_not_found() {
    let root = TempDir::new().unwrap();
    let err = PdfLoader::new().load(root.path(), "ABCD1234").unwrap_err();
    assert!(matches!(err, RagError::NotFound { ref document_id, .. } if document_id == "ABCD1234"));
}

#[test]
fn directory_without_pdf_is_not_found() {
    let (root, dir) = storage_with("ABCD1234");
    fs::write(dir.join("notes.txt"), "not a pdf").unwrap();
    fs::write(dir.join(".zotero-ft-cache"), "cached text").unwrap();

    let err = find_pdf(root.path(), "ABCD1234").unwrap_err();
    match err {
        RagError::NotFound { location, .. } => assert!(location.contains("ABCD1234")),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn several_pdfs_pick_the_first_by_name() {
    let (root, dir) = storage_with("ABCD1234");
    for name in ["zeta.pdf", "beta.PDF", "alpha.pdf"] {
        fs::write(dir.join(name), b"%PDF-1.5").unwrap();
    }

    let chosen = find_pdf(root.path(), "ABCD1234").unwrap();
    assert_eq!(chosen.file_name().unwrap(), "alpha.pdf");
}

#[test]
fn corrupt_pdf_is_a_read_error() {
    let (root, dir) = storage_with("ABCD1234");
    fs::write(dir.join("paper.pdf"), b"this is not a pdf at all").unwrap();

    let err = PdfLoader::new().load(root.path(), "ABCD1234").unwrap_err();
    match err {
        RagError::DocumentRead { path, .. } => assert!(path.ends_with("paper.pdf")),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn extracts_text_page_by_page() {
    let (root, dir) = storage_with("ABCD1234");
    write_pdf(&dir.join("paper.pdf"), &["Hello attention", "Goodbye transformer"]);

    let pages = PdfLoader::new()
        .with_page_policy(PagePolicy::SkipUnreadable)
        .load(root.path(), "ABCD1234")
        .unwrap();

    assert_eq!(pages.iter().map(|p| p.page).collect::<Vec<_>>(), vec![1, 2]);
    assert!(pages[0].text.contains("Hello"));
    assert!(pages[1].text.contains("Goodbye"));
}

#[test]
fn separated_text_blocks_become_separate_paragraphs() {
    let (root, dir) = storage_with("ABCD1234");
    write_pdf_blocks(
        &dir.join("paper.pdf"),
        &[vec![
            (720, "Intro paragraph line one."),
            (706, "Intro line two."),
            (560, "Method paragraph."),
        ]],
    );

    let pages = PdfLoader::new().load(root.path(), "ABCD1234").unwrap();
    assert_eq!(pages.len(), 1);

    let chunks = ParagraphChunker::new().chunk(&pages, "Layout", "ABCD1234");
    assert!(chunks.len() >= 2, "page text {:?} gave {} chunk(s)", pages[0].text, chunks.len());
    assert!(chunks[0].text.contains("Intro"));
    assert!(chunks.last().unwrap().text.contains("Method"));
    assert!(!chunks.iter().any(|c| c.text.contains("Intro") && c.text.contains("Method")));
}

#[tokio::test]
async fn answers_from_a_pdf_on_disk() {
    let (root, dir) = storage_with("ABCD1234");
    write_pdf(&dir.join("paper.pdf"), &["Hello attention", "Goodbye transformer"]);

    let generator = Arc::new(RecordingGenerator::answering());
    let pipeline = PaperQa::builder()
        .embedding_provider(Arc::new(BagOfWordsEmbedder::default()))
        .generation_client(generator.clone())
        .build()
        .unwrap();

    let answer = pipeline
        .answer(
            root.path(),
            &[paper("ABCD1234", "Greetings")],
            "What about attention?",
            &ModelParams::default(),
        )
        .await
        .unwrap();

    assert_eq!(answer.sources.len(), 2);
    assert!(answer.sources[0].chunk.text.contains("attention"));
    assert_eq!(answer.sources[0].chunk.page, 1);
    let system = &generator.last_request().messages[0].content;
    assert!(system.contains("The title of the paper is: Greetings"));
}
