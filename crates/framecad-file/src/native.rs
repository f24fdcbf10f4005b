//! FrameCAD 二进制格式（.fcad）
//!
//! 16 字节文件头 + Zstd 压缩的 MessagePack 文档内容。

use crate::document::Document;
use crate::error::FileError;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

/// 文件魔数 "FCAD"
const MAGIC: &[u8; 4] = b"FCAD";

/// 当前文件格式版本
const FORMAT_VERSION: u32 = 1;

/// Zstd 压缩级别
const COMPRESSION_LEVEL: i32 = 3;

/// 文件头（16 字节）
#[derive(Debug)]
struct FileHeader {
    magic: [u8; 4],
    version: u32,
    /// 标志位（预留）
    flags: u32,
    /// 压缩后数据长度
    compressed_size: u32,
}

impl FileHeader {
    fn new(compressed_size: u32) -> Self {
        Self {
            magic: *MAGIC,
            version: FORMAT_VERSION,
            flags: 0,
            compressed_size,
        }
    }

    fn write(&self, writer: &mut impl Write) -> Result<(), std::io::Error> {
        writer.write_all(&self.magic)?;
        writer.write_all(&self.version.to_le_bytes())?;
        writer.write_all(&self.flags.to_le_bytes())?;
        writer.write_all(&self.compressed_size.to_le_bytes())?;
        Ok(())
    }

    fn read(reader: &mut impl Read) -> Result<Self, FileError> {
        let mut magic = [0u8; 4];
        reader.read_exact(&mut magic)?;
        if &magic != MAGIC {
            return Err(FileError::InvalidFormat(
                "Invalid magic number, not a FrameCAD file".to_string(),
            ));
        }

        let mut buf = [0u8; 4];
        reader.read_exact(&mut buf)?;
        let version = u32::from_le_bytes(buf);
        reader.read_exact(&mut buf)?;
        let flags = u32::from_le_bytes(buf);
        reader.read_exact(&mut buf)?;
        let compressed_size = u32::from_le_bytes(buf);

        Ok(Self {
            magic,
            version,
            flags,
            compressed_size,
        })
    }
}

/// 保存文档
pub fn save(document: &Document, path: &Path) -> Result<(), FileError> {
    let msgpack_data = rmp_serde::to_vec(document)?;
    let compressed_data = zstd::encode_all(msgpack_data.as_slice(), COMPRESSION_LEVEL)?;
    let compressed_size = u32::try_from(compressed_data.len())
        .map_err(|_| FileError::InvalidFormat("Document too large".to_string()))?;

    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    FileHeader::new(compressed_size).write(&mut writer)?;
    writer.write_all(&compressed_data)?;
    writer.flush()?;

    tracing::info!(
        "Saved {} entities to {} ({} bytes compressed)",
        document.entity_count(),
        path.display(),
        compressed_data.len()
    );
    Ok(())
}

/// 加载文档并校验实体
pub fn load(path: &Path) -> Result<Document, FileError> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);

    let header = FileHeader::read(&mut reader)?;
    if header.version > FORMAT_VERSION {
        return Err(FileError::UnsupportedVersion(format!(
            "File version {} is newer than supported version {}",
            header.version, FORMAT_VERSION
        )));
    }

    let mut compressed_data = vec![0u8; header.compressed_size as usize];
    reader.read_exact(&mut compressed_data)?;
    let msgpack_data = zstd::decode_all(compressed_data.as_slice())?;

    let mut document: Document = rmp_serde::from_slice(&msgpack_data)?;
    document.prepare()?;

    tracing::info!(
        "Loaded {} entities from {}",
        document.entity_count(),
        path.display()
    );
    Ok(document)
}

#[cfg(test)]
mod tests {
    use super::*;
    use framecad_core::catalog::{BuiltinCatalog, PartCatalog};
    use framecad_core::entity::{Entity, Group};
    use framecad_core::math::Vector3;

    fn sample() -> Document {
        let catalog = BuiltinCatalog::new();
        let mut bar = Entity::from(catalog.resolve("2020 Alex", 300.0).unwrap());
        bar.rotate(1.0, 0.0, 0.0);
        let mut corner = Entity::from(catalog.resolve("2020 Corner Three Way", 0.0).unwrap());
        corner.translate(&Vector3::new(0.0, 0.0, 300.0));
        let group = Entity::from(Group::from_children([
            Entity::from(catalog.resolve("3030 Alex", 120.0).unwrap()),
            Entity::from(catalog.resolve("3030 Corner Two Way", 0.0).unwrap()),
        ]));

        let mut doc = Document::with_title("Frame");
        doc.entities = vec![bar, corner, group];
        doc
    }

    #[test]
    fn test_save_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.fcad");
        let doc = sample();
        save(&doc, &path).unwrap();

        let file = File::open(&path).unwrap();
        let header = FileHeader::read(&mut BufReader::new(file)).unwrap();
        assert_eq!(&header.magic, MAGIC);
        assert_eq!(header.version, FORMAT_VERSION);

        let loaded = load(&path).unwrap();
        assert_eq!(loaded.metadata.title, "Frame");
        assert_eq!(loaded.entity_count(), 3);
        assert_eq!(loaded.entities, doc.entities);
    }

    #[test]
    fn test_invalid_magic() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.fcad");
        let mut file = File::create(&path).unwrap();
        file.write_all(b"XXXX").unwrap();
        file.write_all(&[0u8; 12]).unwrap();
        drop(file);

        assert!(matches!(load(&path), Err(FileError::InvalidFormat(_))));
    }

    #[test]
    fn test_newer_version_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("future.fcad");
        let mut file = File::create(&path).unwrap();
        file.write_all(MAGIC).unwrap();
        file.write_all(&(FORMAT_VERSION + 1).to_le_bytes()).unwrap();
        file.write_all(&[0u8; 8]).unwrap();
        drop(file);

        assert!(matches!(load(&path), Err(FileError::UnsupportedVersion(_))));
    }
}
