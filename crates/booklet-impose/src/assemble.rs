//! Output document assembly
//!
//! Composed sheet faces become the pages of a new PDF, in the order given.
//! Each source page is copied once as a Form XObject and the result is
//! written through [`write_atomically`], so the destination either holds
//! the complete booklet or is left as it was.

use crate::compose::ComposedSide;
use crate::source::{PageInfo, SourceDocument, inherited};
use crate::types::*;
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use std::collections::HashMap;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

// =============================================================================
// Public API
// =============================================================================

/// Build the booklet from `sides` and write it to `destination`.
pub async fn assemble(
    source: Arc<SourceDocument>,
    sides: Arc<[ComposedSide]>,
    destination: PathBuf,
) -> Result<PathBuf> {
    tokio::task::spawn_blocking(move || {
        let mut document = build_document(&source, &sides)?;
        let mut bytes = Vec::new();
        document.save_to(&mut bytes)?;

        write_atomically(&destination, |file| file.write_all(&bytes))?;
        log::info!(
            "Wrote {} sheet faces ({} bytes) to {}",
            sides.len(),
            bytes.len(),
            destination.display()
        );
        Ok(destination)
    })
    .await?
}

/// Build an in-memory PDF with one page per composed face
pub fn build_document(source: &SourceDocument, sides: &[ComposedSide]) -> Result<Document> {
    let mut output = Document::with_version("1.7");
    let pages_tree_id = output.new_object_id();
    let mut page_refs = Vec::with_capacity(sides.len());
    let mut xobjects: HashMap<usize, ObjectId> = HashMap::new();
    let mut object_cache: HashMap<ObjectId, ObjectId> = HashMap::new();

    for composed in sides {
        let mut resources = Dictionary::new();
        for placement in &composed.placements {
            let xobject_id = match xobjects.get(&placement.page_number) {
                Some(&id) => id,
                None => {
                    let page = source.page(placement.page_number).ok_or_else(|| {
                        BookletError::Render {
                            page_number: composed.side.page_number,
                            message: format!("source page {} does not exist", placement.page_number),
                        }
                    })?;
                    let id = create_page_xobject(
                        &mut output,
                        &source.document,
                        page,
                        &mut object_cache,
                    )?;
                    xobjects.insert(placement.page_number, id);
                    id
                }
            };
            resources.set(placement.name.as_bytes(), Object::Reference(xobject_id));
        }

        let content_id = output.add_object(Stream::new(Dictionary::new(), composed.content.clone()));
        let page_dict = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(pages_tree_id)),
            (
                "MediaBox",
                Object::Array(vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Real(composed.sheet_size.width),
                    Object::Real(composed.sheet_size.height),
                ]),
            ),
            (
                "Resources",
                Object::Dictionary(Dictionary::from_iter(vec![(
                    "XObject",
                    Object::Dictionary(resources),
                )])),
            ),
            ("Contents", Object::Reference(content_id)),
        ]);
        page_refs.push(Object::Reference(output.add_object(page_dict)));
    }

    finalize_document(&mut output, pages_tree_id, page_refs);
    Ok(output)
}

/// Write a file so that readers only ever see the old or the new content.
///
/// Missing parent directories are created. The data goes to a temporary
/// file next to `destination` which is synced and then renamed over it;
/// if `write` fails the temporary file is removed and `destination` is
/// untouched.
pub fn write_atomically<F>(destination: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut File) -> std::io::Result<()>,
{
    let dir = match destination.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir).map_err(|source| BookletError::PathNotWritable {
        path: dir.clone(),
        source,
    })?;

    let mut temp = tempfile::Builder::new()
        .prefix(".booklet-")
        .suffix(".tmp")
        .tempfile_in(&dir)
        .map_err(|source| BookletError::PathNotWritable {
            path: dir.clone(),
            source,
        })?;

    let write_error = |source: std::io::Error| BookletError::Write {
        path: destination.to_path_buf(),
        source,
    };
    write(temp.as_file_mut()).map_err(write_error)?;
    temp.as_file_mut().sync_all().map_err(write_error)?;
    temp.persist(destination).map_err(|e| write_error(e.error))?;
    Ok(())
}

// =============================================================================
// XObject Creation
// =============================================================================

/// Copy a source page into `output` as a Form XObject.
///
/// The BBox is the page's MediaBox; resources (inherited ones included)
/// are deep-copied through `cache` so shared fonts and images are copied
/// once per output document.
pub fn create_page_xobject(
    output: &mut Document,
    source: &Document,
    page: &PageInfo,
    cache: &mut HashMap<ObjectId, ObjectId>,
) -> Result<ObjectId> {
    let page_dict = source.get_dictionary(page.object_id)?;
    let content_data = get_page_content(source, page_dict)?;

    let (x0, y0) = page.origin;
    let mut xobject_dict = Dictionary::new();
    xobject_dict.set("Type", Object::Name(b"XObject".to_vec()));
    xobject_dict.set("Subtype", Object::Name(b"Form".to_vec()));
    xobject_dict.set(
        "BBox",
        Object::Array(vec![
            Object::Real(x0),
            Object::Real(y0),
            Object::Real(x0 + page.size.width),
            Object::Real(y0 + page.size.height),
        ]),
    );
    xobject_dict.set("FormType", Object::Integer(1));

    if let Some(resources) = inherited(source, page.object_id, b"Resources") {
        xobject_dict.set(
            "Resources",
            copy_object_deep(output, source, &resources, cache)?,
        );
    }

    Ok(output.add_object(Stream::new(xobject_dict, content_data)))
}

/// Decoded content of a page; multiple streams are joined with newlines.
fn get_page_content(doc: &Document, page_dict: &Dictionary) -> Result<Vec<u8>> {
    let contents = match page_dict.get(b"Contents") {
        Ok(c) => c,
        Err(_) => return Ok(Vec::new()),
    };

    let refs: Vec<ObjectId> = match contents {
        Object::Reference(id) => match doc.get_object(*id)? {
            // Contents may point at an array of streams
            Object::Array(arr) => arr.iter().filter_map(|o| o.as_reference().ok()).collect(),
            _ => vec![*id],
        },
        Object::Array(arr) => arr.iter().filter_map(|o| o.as_reference().ok()).collect(),
        _ => Vec::new(),
    };

    let mut result = Vec::new();
    for id in refs {
        if let Ok(stream) = doc.get_object(id)?.as_stream() {
            let content = stream
                .decompressed_content()
                .unwrap_or_else(|_| stream.content.clone());
            result.extend_from_slice(&content);
            result.push(b'\n');
        }
    }
    Ok(result)
}

// =============================================================================
// Deep Copy
// =============================================================================

/// Deep copy an object from `source` into `output`, following references.
///
/// The output id is reserved before recursing, so reference cycles resolve
/// to the copy in progress.
pub fn copy_object_deep(
    output: &mut Document,
    source: &Document,
    obj: &Object,
    cache: &mut HashMap<ObjectId, ObjectId>,
) -> Result<Object> {
    match obj {
        Object::Reference(id) => {
            if let Some(&new_id) = cache.get(id) {
                return Ok(Object::Reference(new_id));
            }

            let new_id = output.new_object_id();
            cache.insert(*id, new_id);

            let copied = match source.get_object(*id) {
                Ok(referenced) => copy_object_deep(output, source, referenced, cache)?,
                // Dangling references are legal and read as null
                Err(_) => Object::Null,
            };
            output.objects.insert(new_id, copied);

            Ok(Object::Reference(new_id))
        }
        Object::Dictionary(dict) => Ok(Object::Dictionary(copy_dictionary(
            output, source, dict, cache,
        )?)),
        Object::Array(arr) => {
            let new_arr: Result<Vec<_>> = arr
                .iter()
                .map(|item| copy_object_deep(output, source, item, cache))
                .collect();
            Ok(Object::Array(new_arr?))
        }
        Object::Stream(stream) => Ok(Object::Stream(Stream {
            dict: copy_dictionary(output, source, &stream.dict, cache)?,
            content: stream.content.clone(),
            allows_compression: stream.allows_compression,
            start_position: None,
        })),
        _ => Ok(obj.clone()),
    }
}

fn copy_dictionary(
    output: &mut Document,
    source: &Document,
    dict: &Dictionary,
    cache: &mut HashMap<ObjectId, ObjectId>,
) -> Result<Dictionary> {
    let mut new_dict = Dictionary::new();
    for (key, value) in dict.iter() {
        new_dict.set(key.clone(), copy_object_deep(output, source, value, cache)?);
    }
    Ok(new_dict)
}

/// Create pages tree and catalog
fn finalize_document(output: &mut Document, pages_tree_id: ObjectId, page_refs: Vec<Object>) {
    let count = page_refs.len() as i64;
    let pages_dict = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Pages".to_vec())),
        ("Kids", Object::Array(page_refs)),
        ("Count", Object::Integer(count)),
    ]);
    output
        .objects
        .insert(pages_tree_id, Object::Dictionary(pages_dict));

    let catalog_id = output.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_tree_id)),
    ]));

    output.trailer.set("Root", catalog_id);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_copy_handles_reference_cycles() {
        let mut source = Document::with_version("1.7");
        let a = source.new_object_id();
        let b = source.new_object_id();
        source.objects.insert(
            a,
            Object::Dictionary(Dictionary::from_iter(vec![("Next", Object::Reference(b))])),
        );
        source.objects.insert(
            b,
            Object::Dictionary(Dictionary::from_iter(vec![("Next", Object::Reference(a))])),
        );

        let mut output = Document::with_version("1.7");
        let mut cache = HashMap::new();
        let copied = copy_object_deep(&mut output, &source, &Object::Reference(a), &mut cache).unwrap();

        assert!(matches!(copied, Object::Reference(_)));
        assert_eq!(cache.len(), 2);
        assert_eq!(output.objects.len(), 2);
    }
}
