//! Asset access for the resource caches.

pub mod io;

pub use io::{AssetIo, FileSystemIo, MemoryIo};
