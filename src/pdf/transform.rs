//! Low-level per-page operations on an in-memory document
//!
//! Two primitives live here: cumulative page rotation and 1:1 overlay
//! compositing. Page numbering and watermarking are both "generate one
//! overlay page per source page, then merge positionally" and share the
//! same compositing path.

use lopdf::{Dictionary, Document, Object, ObjectId};

use crate::error::{Error, Result};

/// Rotate a page in place by adding `degrees` to its current rotation.
///
/// `degrees` must be 90, 180 or 270; the result is kept modulo 360, so
/// rotating by 180 twice returns the page to its original orientation.
/// `page_number` is 1-based and expected to be pre-validated by the caller.
pub fn rotate_page(doc: &mut Document, page_number: u32, degrees: u32) -> Result<()> {
    if !matches!(degrees, 90 | 180 | 270) {
        return Err(Error::InvalidRotation(degrees));
    }

    let pages = doc.get_pages();
    let &page_id = pages
        .get(&page_number)
        .ok_or_else(|| Error::General(format!("Page {} out of range", page_number)))?;

    let page_dict = doc.get_object_mut(page_id)?.as_dict_mut()?;
    let current = page_dict
        .get(b"Rotate")
        .and_then(|obj| obj.as_i64())
        .unwrap_or(0);
    page_dict.set("Rotate", Object::Integer((current + degrees as i64) % 360));

    Ok(())
}

/// Composite an overlay document onto a base document, page by page.
///
/// Overlay page `i` is drawn on top of base page `i`: its content streams are
/// appended after the base page's content and its resources are merged into
/// the base page's resources. Base page dimensions, page count and page order
/// are untouched. The two documents must have the same number of pages.
pub fn overlay_document(base: &mut Document, mut overlay: Document) -> Result<()> {
    let base_pages = base.get_pages();
    let overlay_page_count = overlay.get_pages().len();

    if base_pages.len() != overlay_page_count {
        return Err(Error::PageCountMismatch {
            base: base_pages.len(),
            overlay: overlay_page_count,
        });
    }

    // Renumber the overlay above the base's highest id so the two object
    // spaces can be unioned without collisions.
    overlay.renumber_objects_with(base.max_id + 1);

    // Pull each overlay page's content references and resources, in page
    // order, before the overlay's objects are moved into the base.
    let mut page_overlays: Vec<(Vec<Object>, Option<Dictionary>)> = Vec::new();
    for (_, &overlay_page_id) in overlay.get_pages().iter() {
        let page_dict = overlay.get_object(overlay_page_id)?.as_dict()?;

        let content_refs = match page_dict.get(b"Contents") {
            Ok(Object::Reference(id)) => vec![Object::Reference(*id)],
            Ok(Object::Array(arr)) => arr.clone(),
            _ => Vec::new(),
        };

        let resources = match page_dict.get(b"Resources") {
            Ok(Object::Dictionary(dict)) => Some(dict.clone()),
            Ok(Object::Reference(id)) => match overlay.get_object(*id) {
                Ok(Object::Dictionary(dict)) => Some(dict.clone()),
                _ => None,
            },
            _ => None,
        };

        page_overlays.push((content_refs, resources));
    }

    let overlay_max_id = overlay.max_id;
    base.objects.extend(overlay.objects);
    base.max_id = overlay_max_id;

    for ((_, &base_page_id), (content_refs, resources)) in
        base_pages.iter().zip(page_overlays.into_iter())
    {
        // Resolve the base page's effective resources first; the page may
        // hold a direct dictionary, a reference, or inherit from its parent.
        let mut merged = resolved_resources(base, base_page_id);
        if let Some(overlay_resources) = resources {
            merge_resource_dict(&mut merged, &overlay_resources);
        }

        let page_dict = base.get_object_mut(base_page_id)?.as_dict_mut()?;

        match page_dict.get(b"Contents").ok().cloned() {
            Some(Object::Reference(content_id)) => {
                let mut contents = vec![Object::Reference(content_id)];
                contents.extend(content_refs);
                page_dict.set("Contents", Object::Array(contents));
            }
            Some(Object::Array(mut contents)) => {
                contents.extend(content_refs);
                page_dict.set("Contents", Object::Array(contents));
            }
            _ => {
                page_dict.set("Contents", Object::Array(content_refs));
            }
        }

        page_dict.set("Resources", Object::Dictionary(merged));
    }

    // The overlay's own page tree is now orphaned; drop it.
    base.prune_objects();

    Ok(())
}

/// Width and height of a page's media box, following the Parent chain for
/// inherited values. Falls back to US Letter when no media box is present.
pub fn page_size(doc: &Document, page_id: ObjectId) -> (f32, f32) {
    let mut current = page_id;
    loop {
        let dict = match doc.get_object(current).and_then(|obj| obj.as_dict()) {
            Ok(dict) => dict,
            Err(_) => break,
        };

        if let Ok(Object::Array(arr)) = dict.get(b"MediaBox") {
            if arr.len() == 4 {
                let nums: Vec<f32> = arr.iter().filter_map(object_as_f32).collect();
                if nums.len() == 4 {
                    return (nums[2] - nums[0], nums[3] - nums[1]);
                }
            }
        }

        match dict.get(b"Parent") {
            Ok(Object::Reference(parent_id)) => current = *parent_id,
            _ => break,
        }
    }

    (612.0, 792.0)
}

fn object_as_f32(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(n) => Some(*n as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}

/// The page's effective Resources dictionary: its own entry (dereferenced if
/// needed), or the nearest inherited one from the Parent chain.
fn resolved_resources(doc: &Document, page_id: ObjectId) -> Dictionary {
    let mut current = page_id;
    loop {
        let dict = match doc.get_object(current).and_then(|obj| obj.as_dict()) {
            Ok(dict) => dict,
            Err(_) => break,
        };

        match dict.get(b"Resources") {
            Ok(Object::Dictionary(resources)) => return resources.clone(),
            Ok(Object::Reference(res_id)) => {
                if let Ok(Object::Dictionary(resources)) = doc.get_object(*res_id) {
                    return resources.clone();
                }
            }
            _ => {}
        }

        match dict.get(b"Parent") {
            Ok(Object::Reference(parent_id)) => current = *parent_id,
            _ => break,
        }
    }

    Dictionary::new()
}

/// Merge resource entries from `src` into `dest`, merging the per-type
/// subdictionaries (Font, ExtGState, XObject, ...) key by key.
fn merge_resource_dict(dest: &mut Dictionary, src: &Dictionary) {
    for (key, value) in src.iter() {
        if let Ok(existing) = dest.get(key) {
            if let (Object::Dictionary(existing_subdict), Object::Dictionary(src_subdict)) =
                (existing.clone(), value)
            {
                let mut merged_subdict = existing_subdict;
                for (subkey, subvalue) in src_subdict.iter() {
                    merged_subdict.set(subkey.clone(), subvalue.clone());
                }
                dest.set(key.clone(), Object::Dictionary(merged_subdict));
                continue;
            }
        }
        dest.set(key.clone(), value.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::dictionary;

    fn fixture_doc(page_count: usize) -> Document {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let mut kids: Vec<Object> = Vec::new();
        for _ in 0..page_count {
            let content_id = doc.add_object(lopdf::Stream::new(
                Dictionary::new(),
                b"0 g\n".to_vec(),
            ));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => page_count as i64,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc
    }

    fn rotation_of(doc: &Document, page_number: u32) -> i64 {
        let pages = doc.get_pages();
        let page_id = pages[&page_number];
        doc.get_object(page_id)
            .unwrap()
            .as_dict()
            .unwrap()
            .get(b"Rotate")
            .and_then(|obj| obj.as_i64())
            .unwrap_or(0)
    }

    #[test]
    fn test_rotation_accumulates_modulo_360() {
        let mut doc = fixture_doc(1);

        rotate_page(&mut doc, 1, 90).unwrap();
        assert_eq!(rotation_of(&doc, 1), 90);

        rotate_page(&mut doc, 1, 270).unwrap();
        assert_eq!(rotation_of(&doc, 1), 0);
    }

    #[test]
    fn test_double_half_turn_is_identity() {
        let mut doc = fixture_doc(2);

        rotate_page(&mut doc, 2, 180).unwrap();
        rotate_page(&mut doc, 2, 180).unwrap();

        assert_eq!(rotation_of(&doc, 2), 0);
        // Page 1 was never touched.
        assert_eq!(rotation_of(&doc, 1), 0);
    }

    #[test]
    fn test_rejects_non_cardinal_rotation() {
        let mut doc = fixture_doc(1);
        let result = rotate_page(&mut doc, 1, 45);
        assert!(matches!(result, Err(Error::InvalidRotation(45))));
    }

    #[test]
    fn test_overlay_page_count_mismatch() {
        let mut base = fixture_doc(3);
        let overlay = fixture_doc(2);

        let result = overlay_document(&mut base, overlay);
        assert!(matches!(
            result,
            Err(Error::PageCountMismatch { base: 3, overlay: 2 })
        ));
    }

    #[test]
    fn test_overlay_preserves_page_count_and_appends_content() {
        let mut base = fixture_doc(2);
        let overlay = fixture_doc(2);

        overlay_document(&mut base, overlay).unwrap();

        let pages = base.get_pages();
        assert_eq!(pages.len(), 2);

        for (_, &page_id) in pages.iter() {
            let dict = base.get_object(page_id).unwrap().as_dict().unwrap();
            match dict.get(b"Contents").unwrap() {
                Object::Array(arr) => assert_eq!(arr.len(), 2),
                other => panic!("expected content array, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_page_size_inherited_from_parent() {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![Object::from(page_id)],
                "Count" => 1i64,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        assert_eq!(page_size(&doc, page_id), (595.0, 842.0));
    }
}
