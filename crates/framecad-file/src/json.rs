//! JSON 文档格式（便于阅读和版本管理）

use crate::document::Document;
use crate::error::FileError;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

pub fn save_json(document: &Document, path: &Path) -> Result<(), FileError> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, document)?;
    writer.flush()?;
    tracing::info!(
        "Saved {} entities to {}",
        document.entity_count(),
        path.display()
    );
    Ok(())
}

pub fn load_json(path: &Path) -> Result<Document, FileError> {
    let reader = BufReader::new(File::open(path)?);
    let mut document: Document = serde_json::from_reader(reader)?;
    document.prepare()?;
    tracing::info!(
        "Loaded {} entities from {}",
        document.entity_count(),
        path.display()
    );
    Ok(document)
}

/// 按扩展名选择格式：`.json` 为 JSON，其余为二进制
pub fn save_any(document: &Document, path: &Path) -> Result<(), FileError> {
    if is_json(path) {
        save_json(document, path)
    } else {
        crate::native::save(document, path)
    }
}

pub fn load_any(path: &Path) -> Result<Document, FileError> {
    if is_json(path) {
        load_json(path)
    } else {
        crate::native::load(path)
    }
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use framecad_core::catalog::{BuiltinCatalog, PartCatalog};
    use framecad_core::entity::Entity;
    use framecad_core::math::Vector3;

    #[test]
    fn test_json_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.json");

        let mut bar = Entity::from(BuiltinCatalog::new().resolve("2020 Alex", 750.0).unwrap());
        bar.translate(&Vector3::new(10.0, -20.0, 30.0));
        bar.rotate(0.0, 1.0, 3.0);
        let mut doc = Document::with_title("Json frame");
        doc.entities.push(bar);

        save_any(&doc, &path).unwrap();
        let loaded = load_any(&path).unwrap();
        assert_eq!(loaded.metadata.title, "Json frame");
        assert_eq!(loaded.entities, doc.entities);
    }

    #[test]
    fn test_malformed_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ \"metadata\": ").unwrap();
        assert!(matches!(load_json(&path), Err(FileError::Json(_))));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            load_any(&dir.path().join("nope.fcad")),
            Err(FileError::Io(_))
        ));
    }
}
