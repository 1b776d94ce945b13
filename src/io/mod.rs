pub mod walker;

pub use walker::{find_python_files, ExclusionSet, FileWalker};
