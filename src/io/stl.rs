use crate::indexed_mesh::IndexedMesh;
use crate::triangulated::Triangulated3D;
use std::fmt::Debug;
use std::io::Cursor;

/// Render any triangulated surface as an **ASCII STL** solid called `name`.
///
/// ```rust
/// # use limbshell::indexed_mesh::IndexedMesh;
/// # use limbshell::primitive::{Primitive, PrimitiveKind, build_primitive};
/// let cube = build_primitive(&Primitive::new("c".into(), PrimitiveKind::Cube), 8);
/// let text = limbshell::io::to_stl_ascii(&cube, "cube");
/// assert!(text.starts_with("solid cube"));
/// ```
pub fn to_stl_ascii<T: Triangulated3D>(shape: &T, name: &str) -> String {
    let mut out = String::new();
    out.push_str(&format!("solid {name}\n"));

    shape.visit_triangles(|tri| {
        let n = tri[0].normal;
        out.push_str(&format!("  facet normal {:.6} {:.6} {:.6}\n", n.x, n.y, n.z));
        out.push_str("    outer loop\n");
        for v in &tri {
            let p = v.pos;
            out.push_str(&format!("      vertex {:.6} {:.6} {:.6}\n", p.x, p.y, p.z));
        }
        out.push_str("    endloop\n");
        out.push_str("  endfacet\n");
    });

    out.push_str(&format!("endsolid {name}\n"));
    out
}

/// Encode any triangulated surface as **binary STL**.
///
/// Binary STL has no room for a solid name, so `_name` is only kept for
/// symmetry with [`to_stl_ascii`].
pub fn to_stl_binary<T: Triangulated3D>(shape: &T, _name: &str) -> std::io::Result<Vec<u8>> {
    use stl_io::{Normal, Triangle, Vertex, write_stl};

    let mut triangles = Vec::<Triangle>::new();

    shape.visit_triangles(|tri| {
        let n = tri[0].normal;
        #[allow(clippy::unnecessary_cast)]
        {
            triangles.push(Triangle {
                normal: Normal::new([n.x as f32, n.y as f32, n.z as f32]),
                vertices: tri.map(|v| Vertex::new([v.pos.x as f32, v.pos.y as f32, v.pos.z as f32])),
            });
        }
    });

    let mut cursor = Cursor::new(Vec::new());
    write_stl(&mut cursor, triangles.iter())?;
    Ok(cursor.into_inner())
}

impl IndexedMesh {
    pub fn to_stl_ascii(&self, name: &str) -> String {
        self::to_stl_ascii(self, name)
    }

    pub fn to_stl_binary(&self, name: &str) -> std::io::Result<Vec<u8>> {
        self::to_stl_binary(self, name)
    }
}

impl<S: Clone + Debug + Send + Sync> crate::mesh::Mesh<S> {
    pub fn to_stl_ascii(&self, name: &str) -> String {
        self::to_stl_ascii(self, name)
    }

    pub fn to_stl_binary(&self, name: &str) -> std::io::Result<Vec<u8>> {
        self::to_stl_binary(self, name)
    }
}
