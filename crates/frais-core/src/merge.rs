//! Page-level PDF concatenation
//!
//! Joins the rendered report with each normalized attachment into one
//! document. Pages keep their source order: every input document's pages
//! appear consecutively, documents in the order given.

use std::collections::BTreeMap;

use lopdf::{Dictionary, Document, Object, ObjectId};

use crate::error::{Error, Result};

/// Concatenate the given PDF documents into one.
pub fn merge_documents(parts: &[Vec<u8>]) -> Result<Vec<u8>> {
    if parts.is_empty() {
        return Err(Error::Merge("no documents to merge".to_string()));
    }

    let mut max_id = 1u32;
    // Pages kept as a Vec so within-document page order survives renumbering.
    let mut pages: Vec<(ObjectId, Object)> = Vec::new();
    let mut objects: BTreeMap<ObjectId, Object> = BTreeMap::new();

    for bytes in parts {
        let mut doc = Document::load_mem(bytes)?;
        doc.renumber_objects_with(max_id);
        max_id = doc.max_id + 1;

        for (_page_number, object_id) in doc.get_pages() {
            let object = doc
                .get_object(object_id)
                .map_err(|e| Error::Merge(e.to_string()))?
                .to_owned();
            pages.push((object_id, object));
        }
        objects.extend(doc.objects);
    }

    let mut document = Document::with_version("1.5");
    let mut pages_id: Option<(ObjectId, Dictionary)> = None;
    let mut catalog_id: Option<(ObjectId, Dictionary)> = None;

    for (object_id, object) in objects {
        match object.type_name().unwrap_or("") {
            "Catalog" => {
                // Keep the first catalog, rebuild it below.
                if catalog_id.is_none() {
                    if let Ok(dict) = object.as_dict() {
                        catalog_id = Some((object_id, dict.clone()));
                    }
                }
            }
            "Pages" => match &mut pages_id {
                Some((_, dict)) => {
                    if let Ok(new_dict) = object.as_dict() {
                        dict.extend(new_dict);
                    }
                }
                None => {
                    if let Ok(dict) = object.as_dict() {
                        pages_id = Some((object_id, dict.clone()));
                    }
                }
            },
            // Page objects are re-inserted with a fixed-up Parent below;
            // outlines are dropped outright.
            "Page" | "Outlines" | "Outline" => {}
            _ => {
                document.objects.insert(object_id, object);
            }
        }
    }

    let (pages_object_id, mut pages_dict) =
        pages_id.ok_or_else(|| Error::Merge("no pages tree found".to_string()))?;
    let (catalog_object_id, mut catalog_dict) =
        catalog_id.ok_or_else(|| Error::Merge("no catalog found".to_string()))?;
    if pages.is_empty() {
        return Err(Error::Merge("merged documents contain no pages".to_string()));
    }

    for (object_id, object) in &pages {
        if let Ok(dict) = object.as_dict() {
            let mut dict = dict.clone();
            dict.set("Parent", pages_object_id);
            document
                .objects
                .insert(*object_id, Object::Dictionary(dict));
        }
    }

    pages_dict.set("Count", pages.len() as u32);
    pages_dict.set(
        "Kids",
        pages
            .iter()
            .map(|(object_id, _)| Object::Reference(*object_id))
            .collect::<Vec<_>>(),
    );
    document
        .objects
        .insert(pages_object_id, Object::Dictionary(pages_dict));

    catalog_dict.set("Pages", pages_object_id);
    catalog_dict.remove(b"Outlines");
    document
        .objects
        .insert(catalog_object_id, Object::Dictionary(catalog_dict));

    document.trailer.set("Root", catalog_object_id);
    document.max_id = document.objects.len() as u32;
    document.renumber_objects();
    document.compress();

    let mut out = Vec::new();
    document
        .save_to(&mut out)
        .map_err(|e| Error::Merge(e.to_string()))?;
    Ok(out)
}

/// Number of pages in a PDF byte buffer.
pub fn page_count(bytes: &[u8]) -> Result<usize> {
    let doc = Document::load_mem(bytes)?;
    Ok(doc.get_pages().len())
}
