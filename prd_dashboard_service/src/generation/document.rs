use std::{
    fs,
    path::{Path, PathBuf},
};

use docx_rs::{DocumentChild, Paragraph, ParagraphChild, Run, RunChild};

use crate::error::DocumentError;

/// Plain text extracted from a `.docx` file.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub path: PathBuf,
    pub text: String,
}

impl Document {
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}

/// Reads the body paragraphs of a `.docx` file. Blank paragraphs are dropped,
/// the rest are joined with `\n`.
pub fn read_document(path: &Path) -> Result<Document, DocumentError> {
    if !path.exists() {
        return Err(DocumentError::NotFound {
            path: path.to_path_buf(),
        });
    }

    let bytes = fs::read(path).map_err(|e| invalid(path, e.to_string()))?;
    let docx = docx_rs::read_docx(&bytes).map_err(|e| invalid(path, format!("{e:?}")))?;

    let paragraphs: Vec<String> = docx
        .document
        .children
        .iter()
        .filter_map(|child| match child {
            DocumentChild::Paragraph(para) => Some(paragraph_text(para)),
            _ => None,
        })
        .filter(|text| !text.trim().is_empty())
        .collect();

    if paragraphs.is_empty() {
        return Err(invalid(path, "document contains no text".to_string()));
    }

    Ok(Document {
        path: path.to_path_buf(),
        text: paragraphs.join("\n"),
    })
}

fn paragraph_text(para: &Paragraph) -> String {
    let mut text = String::new();
    push_children(&para.children, &mut text);
    text
}

/// Runs directly in the paragraph and runs nested in hyperlinks, in order.
fn push_children(children: &[ParagraphChild], text: &mut String) {
    for child in children {
        match child {
            ParagraphChild::Run(run) => push_run(run, text),
            ParagraphChild::Hyperlink(link) => push_children(&link.children, text),
            _ => {}
        }
    }
}

fn push_run(run: &Run, text: &mut String) {
    for item in &run.children {
        match item {
            RunChild::Text(t) => text.push_str(&t.text),
            RunChild::Tab(_) => text.push('\t'),
            RunChild::Break(_) => text.push('\n'),
            _ => {}
        }
    }
}

fn invalid(path: &Path, reason: String) -> DocumentError {
    DocumentError::Invalid {
        path: path.to_path_buf(),
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docx_rs::{Docx, Hyperlink, HyperlinkType};
    use tempfile::tempdir;

    fn write_paragraphs(path: &Path, paragraphs: Vec<Paragraph>) {
        let docx = paragraphs
            .into_iter()
            .fold(Docx::new(), |docx, para| docx.add_paragraph(para));
        let file = fs::File::create(path).expect("create docx");
        docx.build().pack(file).expect("pack docx");
    }

    fn write_docx(path: &Path, paragraphs: &[&str]) {
        write_paragraphs(
            path,
            paragraphs
                .iter()
                .map(|text| Paragraph::new().add_run(Run::new().add_text(*text)))
                .collect(),
        );
    }

    fn link(url: &str, label: &str) -> Hyperlink {
        Hyperlink::new(url, HyperlinkType::External).add_run(Run::new().add_text(label))
    }

    #[test]
    fn joins_non_empty_paragraphs() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("context.docx");
        write_docx(&path, &["Product goal", "", "   ", "Stakeholders"]);

        let doc = read_document(&path).expect("read document");
        assert_eq!(doc.text, "Product goal\nStakeholders");
        assert_eq!(doc.path, path);
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempdir().expect("tempdir");
        let err = read_document(&dir.path().join("nope.docx")).unwrap_err();
        assert!(matches!(err, DocumentError::NotFound { .. }));
    }

    #[test]
    fn whitespace_only_document_is_invalid() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("blank.docx");
        write_docx(&path, &["  ", "\t"]);

        let err = read_document(&path).unwrap_err();
        assert!(matches!(err, DocumentError::Invalid { .. }));
    }

    #[test]
    fn unparseable_file_is_invalid() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("garbage.docx");
        fs::write(&path, b"definitely not a zip archive").expect("write garbage");

        let err = read_document(&path).unwrap_err();
        assert!(matches!(err, DocumentError::Invalid { .. }));
    }

    #[test]
    fn keeps_hyperlink_text_in_order() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("context.docx");
        let para = Paragraph::new()
            .add_run(Run::new().add_text("Spec lives at "))
            .add_hyperlink(link("https://example.com/checkout", "the checkout spec"))
            .add_run(Run::new().add_text("."));
        write_paragraphs(&path, vec![para]);

        let doc = read_document(&path).expect("read document");
        assert_eq!(doc.text, "Spec lives at the checkout spec.");
    }

    #[test]
    fn link_only_document_is_readable() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("transcript.docx");
        let notes = link("https://example.com/notes", "Meeting notes");
        write_paragraphs(&path, vec![Paragraph::new().add_hyperlink(notes)]);

        let doc = read_document(&path).expect("read document");
        assert_eq!(doc.text, "Meeting notes");
    }
}
