//! Generic containers shared by the scene graph and the spatial index.

pub mod free_list;

pub use free_list::FreeList;
