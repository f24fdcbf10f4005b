//! STL 网格读取
//!
//! 二进制格式：
//! - 80 字节文件头
//! - u32 三角形数量（小端）
//! - 每个三角形 50 字节：法向 3×f32 + 3 个顶点 3×f32 + u16 属性
//!
//! 文件长度恰好等于 `84 + 50 × 三角形数量` 时按二进制解析，
//! 否则以 `solid` 开头的按 ASCII 解析。

use framecad_core::error::{CoreError, CoreResult};
use framecad_core::math::Point3;
use framecad_core::mesh::{MeshData, MeshImport};
use std::path::Path;

const HEADER_LEN: usize = 80;
const TRIANGLE_LEN: usize = 50;
const NORMAL_LEN: usize = 12;

/// 从磁盘读取 STL 文件的网格导入器
#[derive(Debug, Clone, Copy, Default)]
pub struct StlImport;

impl MeshImport for StlImport {
    fn import(&self, path: &Path) -> CoreResult<MeshData> {
        let bytes = std::fs::read(path)
            .map_err(|e| CoreError::InvalidMesh(format!("{}: {}", path.display(), e)))?;
        let vertices = parse_stl(&bytes)?;
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "mesh".to_string());
        tracing::info!(
            "Imported {} triangles from {}",
            vertices.len() / 3,
            path.display()
        );
        Ok(MeshData {
            name,
            file: path.display().to_string(),
            vertices,
        })
    }
}

/// 解析 STL 内容，返回所有三角形顶点（每三个一组）
pub fn parse_stl(bytes: &[u8]) -> CoreResult<Vec<Point3>> {
    if let Some(count) = binary_triangle_count(bytes) {
        return Ok(parse_binary(bytes, count));
    }
    if bytes.starts_with(b"solid") {
        return parse_ascii(bytes);
    }
    Err(CoreError::InvalidMesh("not an STL file".to_string()))
}

fn binary_triangle_count(bytes: &[u8]) -> Option<usize> {
    if bytes.len() < HEADER_LEN + 4 {
        return None;
    }
    let mut buf = [0u8; 4];
    buf.copy_from_slice(&bytes[HEADER_LEN..HEADER_LEN + 4]);
    let count = u32::from_le_bytes(buf) as usize;
    let expected = count.checked_mul(TRIANGLE_LEN)?.checked_add(HEADER_LEN + 4)?;
    (count > 0 && expected == bytes.len()).then_some(count)
}

fn read_f32(bytes: &[u8], at: usize) -> f64 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(&bytes[at..at + 4]);
    f32::from_le_bytes(buf) as f64
}

fn parse_binary(bytes: &[u8], count: usize) -> Vec<Point3> {
    let mut vertices = Vec::with_capacity(count * 3);
    for tri in 0..count {
        let base = HEADER_LEN + 4 + tri * TRIANGLE_LEN + NORMAL_LEN;
        for corner in 0..3 {
            let at = base + corner * 12;
            vertices.push(Point3::new(
                read_f32(bytes, at),
                read_f32(bytes, at + 4),
                read_f32(bytes, at + 8),
            ));
        }
    }
    vertices
}

fn parse_ascii(bytes: &[u8]) -> CoreResult<Vec<Point3>> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| CoreError::InvalidMesh(format!("ASCII STL is not UTF-8: {}", e)))?;
    let mut vertices = Vec::new();
    for (line_no, line) in text.lines().enumerate() {
        let mut fields = line.split_whitespace();
        if fields.next() != Some("vertex") {
            continue;
        }
        let coords: Vec<f64> = fields
            .map(str::parse::<f64>)
            .collect::<Result<_, _>>()
            .map_err(|e| CoreError::InvalidMesh(format!("line {}: {}", line_no + 1, e)))?;
        let &[x, y, z] = coords.as_slice() else {
            return Err(CoreError::InvalidMesh(format!(
                "line {}: expected 3 coordinates",
                line_no + 1
            )));
        };
        vertices.push(Point3::new(x, y, z));
    }
    if vertices.is_empty() || vertices.len() % 3 != 0 {
        return Err(CoreError::InvalidMesh(format!(
            "ASCII STL has {} vertices, expected a positive multiple of 3",
            vertices.len()
        )));
    }
    Ok(vertices)
}
