//! Document assembly: merge, split and page extraction
//!
//! Merging follows the lopdf merge approach: renumber each source into a
//! shared object space, collect the pages in input order, then hang them off
//! a fresh page tree. Split and extract reuse the same document via a
//! keep-list: clone, delete the complement, prune the orphans.

use std::collections::{BTreeMap, HashSet};
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use lopdf::{Dictionary, Document, Object, ObjectId};

use crate::error::{Error, Result};

/// Merge documents into a single document, in list order.
///
/// Pages keep each source's internal order; the output page sequence is the
/// concatenation of all inputs. An empty input list is an error.
pub fn merge_documents(documents: Vec<Document>) -> Result<Document> {
    if documents.is_empty() {
        return Err(Error::General("No input documents provided".to_string()));
    }

    let mut max_id = 1;
    let mut page_ids: Vec<ObjectId> = Vec::new();
    let mut objects: BTreeMap<ObjectId, Object> = BTreeMap::new();

    for mut doc in documents {
        // Shift this document's objects above everything collected so far.
        doc.renumber_objects_with(max_id);
        max_id = doc.max_id + 1;

        page_ids.extend(doc.get_pages().into_iter().map(|(_, id)| id));
        objects.extend(doc.objects);
    }

    let mut merged = Document::with_version("1.5");
    merged.objects.extend(objects);

    // new_object_id() hands out max_id + 1; without this the fresh page tree
    // would collide with objects we just copied in.
    merged.max_id = max_id - 1;

    let pages_id = merged.new_object_id();
    let kids: Vec<Object> = page_ids.iter().map(|&id| Object::Reference(id)).collect();

    let mut pages_dict = Dictionary::new();
    pages_dict.set("Type", Object::Name(b"Pages".to_vec()));
    pages_dict.set("Count", Object::Integer(page_ids.len() as i64));
    pages_dict.set("Kids", Object::Array(kids));

    let catalog_id = merged.new_object_id();
    let mut catalog = Dictionary::new();
    catalog.set("Type", Object::Name(b"Catalog".to_vec()));
    catalog.set("Pages", Object::Reference(pages_id));

    merged.objects.insert(catalog_id, Object::Dictionary(catalog));
    merged.objects.insert(pages_id, Object::Dictionary(pages_dict));
    merged.trailer.set("Root", Object::Reference(catalog_id));

    // Re-parent every page onto the fresh page tree.
    for &page_id in &page_ids {
        if let Ok(page_object) = merged.get_object_mut(page_id) {
            if let Object::Dictionary(ref mut page_dict) = page_object {
                page_dict.set("Parent", Object::Reference(pages_id));
            }
        }
    }

    // The source catalogs and page-tree nodes are unreachable now.
    merged.prune_objects();

    Ok(merged)
}

/// Merge PDF files into a single output file, in list order.
pub fn merge_files(input_paths: &[PathBuf], output_path: &Path) -> Result<()> {
    if input_paths.is_empty() {
        return Err(Error::General("No input files provided".to_string()));
    }

    for path in input_paths {
        if !path.exists() {
            return Err(Error::FileNotFound(path.clone()));
        }
    }

    let mut documents: Vec<Document> = Vec::new();
    for path in input_paths {
        let doc = Document::load(path)?;
        if doc.get_pages().is_empty() {
            return Err(Error::EmptyPdf(path.clone()));
        }
        documents.push(doc);
    }

    let mut merged = merge_documents(documents)?;
    merged.compress();
    merged.save(output_path)?;

    Ok(())
}

/// Build a new document containing only the given 1-based pages, in
/// ascending page order.
///
/// Indices are expected to come pre-filtered from range parsing; out-of-range
/// values are dropped again here rather than trusted. An empty selection is
/// an error.
pub fn extract_pages(doc: &Document, pages: &[u32]) -> Result<Document> {
    let page_count = doc.get_pages().len() as u32;

    let keep: HashSet<u32> = pages
        .iter()
        .copied()
        .filter(|&n| (1..=page_count).contains(&n))
        .collect();

    if keep.is_empty() {
        return Err(Error::General("No pages selected".to_string()));
    }

    let mut extracted = doc.clone();

    // Delete back to front so earlier page numbers stay stable.
    let mut to_delete: Vec<u32> = (1..=page_count).filter(|n| !keep.contains(n)).collect();
    to_delete.reverse();
    for page_number in to_delete {
        extracted.delete_pages(&[page_number]);
    }

    extracted.prune_objects();
    Ok(extracted)
}

/// Split a document into one single-page document per source page, in
/// source order.
pub fn split_document(doc: &Document) -> Result<Vec<Document>> {
    let page_count = doc.get_pages().len() as u32;
    if page_count == 0 {
        return Err(Error::General("Document has no pages".to_string()));
    }

    (1..=page_count).map(|n| extract_pages(doc, &[n])).collect()
}

/// Deterministic name for page `n` of a split: `{base}_page_{n}.pdf`.
pub fn split_file_name(base_name: &str, page_number: usize) -> String {
    format!("{}_page_{}.pdf", base_name, page_number)
}

/// Write the pages of a split to `output_dir`, named
/// `{base}_page_{n}.pdf` with `n` 1-based, and return the paths in page order.
pub fn split_to_files(doc: &Document, base_name: &str, output_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for (i, mut page_doc) in split_document(doc)?.into_iter().enumerate() {
        let path = output_dir.join(split_file_name(base_name, i + 1));
        page_doc.compress();
        page_doc.save(&path)?;
        paths.push(path);
    }
    Ok(paths)
}

/// Package the pages of a split into an in-memory ZIP archive whose entries
/// carry the same `{base}_page_{n}.pdf` names as [`split_to_files`].
pub fn split_to_zip(doc: &Document, base_name: &str) -> Result<Vec<u8>> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let entry_options = zip::write::SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated);

    for (i, mut page_doc) in split_document(doc)?.into_iter().enumerate() {
        let mut bytes = Vec::new();
        page_doc.compress();
        page_doc.save_to(&mut bytes)?;

        writer.start_file(split_file_name(base_name, i + 1), entry_options)?;
        writer.write_all(&bytes)?;
    }

    Ok(writer.finish()?.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::dictionary;

    /// Fixture with one marker page per width so ordering is observable.
    fn fixture_doc(page_widths: &[i64]) -> Document {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let mut kids: Vec<Object> = Vec::new();
        for &width in page_widths {
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => vec![0.into(), 0.into(), width.into(), 792.into()],
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
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc
    }

    fn page_widths(doc: &Document) -> Vec<i64> {
        doc.get_pages()
            .values()
            .map(|&page_id| {
                let dict = doc.get_object(page_id).unwrap().as_dict().unwrap();
                match dict.get(b"MediaBox").unwrap() {
                    Object::Array(arr) => arr[2].as_i64().unwrap(),
                    other => panic!("expected media box array, got {:?}", other),
                }
            })
            .collect()
    }

    #[test]
    fn test_merge_concatenates_in_order() {
        let a = fixture_doc(&[101, 102]);
        let b = fixture_doc(&[201, 202, 203]);

        let merged = merge_documents(vec![a, b]).unwrap();

        assert_eq!(merged.get_pages().len(), 5);
        assert_eq!(page_widths(&merged), vec![101, 102, 201, 202, 203]);
    }

    #[test]
    fn test_merge_empty_list_is_error() {
        let result = merge_documents(Vec::new());
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("No input documents"));
    }

    #[test]
    fn test_extract_keeps_ascending_subset() {
        let doc = fixture_doc(&[101, 102, 103, 104, 105]);

        let extracted = extract_pages(&doc, &[2, 4]).unwrap();

        assert_eq!(extracted.get_pages().len(), 2);
        assert_eq!(page_widths(&extracted), vec![102, 104]);
    }

    #[test]
    fn test_extract_refilters_out_of_range() {
        let doc = fixture_doc(&[101, 102, 103]);

        let extracted = extract_pages(&doc, &[2, 9]).unwrap();
        assert_eq!(page_widths(&extracted), vec![102]);

        assert!(extract_pages(&doc, &[9]).is_err());
        assert!(extract_pages(&doc, &[]).is_err());
    }

    #[test]
    fn test_split_yields_single_pages_in_order() {
        let doc = fixture_doc(&[101, 102, 103]);

        let parts = split_document(&doc).unwrap();

        assert_eq!(parts.len(), 3);
        for (i, part) in parts.iter().enumerate() {
            assert_eq!(part.get_pages().len(), 1);
            assert_eq!(page_widths(part), vec![101 + i as i64]);
        }
    }

    #[test]
    fn test_split_file_names() {
        assert_eq!(split_file_name("report", 1), "report_page_1.pdf");
        assert_eq!(split_file_name("report", 12), "report_page_12.pdf");
    }

    #[test]
    fn test_split_zip_entry_names() {
        let doc = fixture_doc(&[101, 102]);

        let bytes = split_to_zip(&doc, "report").unwrap();

        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(archive.len(), 2);
        assert!(archive.by_name("report_page_1.pdf").is_ok());
        assert!(archive.by_name("report_page_2.pdf").is_ok());
    }
}
