pub mod triangle;
pub mod triangle_mesh;
