//! In-memory file tree for Linux Quest.
//!
//! Paths are normalized absolute strings. Every node carries permissions and
//! ownership; directories remember the order their children were created in.

pub mod path;
pub mod permissions;
pub mod seed;
pub mod tree;

pub use path::{join, normalize, parent, resolve_path, split_parent};
pub use permissions::{Access, ModeOp, ModeSpec, Permissions, SymbolicClause, Targets};
pub use seed::{SeedEntry, SeedKind};
pub use tree::{DirectoryNode, FileNode, FileTree, Metadata, Node, WriteMode};
