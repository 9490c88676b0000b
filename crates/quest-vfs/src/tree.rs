//! In-memory file tree.
//!
//! The whole tree lives in a `HashMap<String, Node>` keyed by normalized
//! absolute path. Directories keep their child names in creation order,
//! which is the order `list` reports them in.

use std::collections::HashMap;

use log::warn;

use quest_types::{QuestError, Result, Timestamp};

use crate::path::{join, normalize};
use crate::permissions::{Access, ModeSpec, Permissions};
use crate::seed::{SeedEntry, SeedKind};

/// Size reported for every directory.
pub const DIRECTORY_SIZE: usize = 4096;

/// Permissions and ownership shared by both node kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
    pub permissions: Permissions,
    pub owner: String,
    pub group: String,
}

#[derive(Debug, Clone)]
pub struct DirectoryNode {
    pub meta: Metadata,
    pub created_at: Timestamp,
    pub modified_at: Timestamp,
    children: Vec<String>,
}

impl DirectoryNode {
    /// Child names in creation order.
    pub fn children(&self) -> &[String] {
        &self.children
    }
}

#[derive(Debug, Clone)]
pub struct FileNode {
    pub content: String,
    pub meta: Metadata,
    pub modified_at: Timestamp,
}

impl FileNode {
    /// Size in characters.
    pub fn size(&self) -> usize {
        self.content.chars().count()
    }
}

#[derive(Debug, Clone)]
pub enum Node {
    Directory(DirectoryNode),
    File(FileNode),
}

impl Node {
    pub fn is_dir(&self) -> bool {
        matches!(self, Self::Directory(_))
    }

    pub fn meta(&self) -> &Metadata {
        match self {
            Self::Directory(d) => &d.meta,
            Self::File(f) => &f.meta,
        }
    }

    fn meta_mut(&mut self) -> &mut Metadata {
        match self {
            Self::Directory(d) => &mut d.meta,
            Self::File(f) => &mut f.meta,
        }
    }

    pub fn size(&self) -> usize {
        match self {
            Self::Directory(_) => DIRECTORY_SIZE,
            Self::File(f) => f.size(),
        }
    }

    pub fn modified_at(&self) -> Timestamp {
        match self {
            Self::Directory(d) => d.modified_at,
            Self::File(f) => f.modified_at,
        }
    }

    fn touch(&mut self, now: Timestamp) {
        match self {
            Self::Directory(d) => d.modified_at = now,
            Self::File(f) => f.modified_at = now,
        }
    }

    /// `d` for directories, `-` for files, as in a long listing.
    pub fn type_char(&self) -> char {
        if self.is_dir() { 'd' } else { '-' }
    }
}

/// How `write_file` treats an existing file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    Overwrite,
    /// Add a newline and then the new content.
    Append,
}

/// The simulated filesystem of one session.
#[derive(Debug, Clone)]
pub struct FileTree {
    nodes: HashMap<String, Node>,
    owner: String,
    group: String,
}

/// Reject names that cannot be a single path component.
fn check_name(name: &str) -> Result<()> {
    if name.is_empty() || name == "." || name == ".." || name.contains('/') {
        return Err(QuestError::InvalidArgument(format!("invalid name: '{name}'")));
    }
    Ok(())
}

impl FileTree {
    /// Create a tree holding only the root directory.
    pub fn new(owner: &str, group: &str, now: Timestamp) -> Self {
        let mut tree = Self {
            nodes: HashMap::new(),
            owner: owner.to_string(),
            group: group.to_string(),
        };
        let root = tree.new_directory(now);
        tree.nodes.insert("/".to_string(), root);
        tree
    }

    /// Create a tree whose `home` directory (and its ancestors) exist and
    /// contain `entries`.
    pub fn from_seed(
        home: &str,
        owner: &str,
        group: &str,
        entries: &[SeedEntry],
        now: Timestamp,
    ) -> Result<Self> {
        let mut tree = Self::new(owner, group, now);
        let home = normalize(home).into_owned();
        tree.ensure_directories(&home, now);
        tree.load_entries(&home, entries, now)?;
        Ok(tree)
    }

    /// Default owner of new nodes.
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Default group of new nodes.
    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn get(&self, path: &str) -> Option<&Node> {
        self.nodes.get(normalize(path).as_ref())
    }

    pub fn exists(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    /// Convenience lookup of a file node.
    pub fn file(&self, path: &str) -> Option<&FileNode> {
        match self.get(path) {
            Some(Node::File(f)) => Some(f),
            _ => None,
        }
    }

    pub fn resolve(&self, path: &str) -> Result<&Node> {
        self.get(path)
            .ok_or_else(|| QuestError::NotFound(path.to_string()))
    }

    /// Children of a directory in creation order.
    pub fn list(&self, path: &str) -> Result<Vec<(&str, &Node)>> {
        let path = normalize(path);
        match self.nodes.get(path.as_ref()) {
            Some(Node::Directory(d)) => Ok(d
                .children
                .iter()
                .filter_map(|name| {
                    self.nodes
                        .get(&join(&path, name))
                        .map(|node| (name.as_str(), node))
                })
                .collect()),
            Some(Node::File(_)) => Err(QuestError::NotADirectory(path.into_owned())),
            None => Err(QuestError::NotFound(path.into_owned())),
        }
    }

    /// Create directory `name` inside `dir`.
    pub fn create_directory(&mut self, dir: &str, name: &str, now: Timestamp) -> Result<()> {
        check_name(name)?;
        let dir = normalize(dir).into_owned();
        self.check_parent(&dir)?;
        if self.nodes.contains_key(&join(&dir, name)) {
            return Err(QuestError::AlreadyExists(name.to_string()));
        }
        let node = self.new_directory(now);
        self.insert_child(&dir, name, node, now);
        Ok(())
    }

    /// Create file `name` inside `dir`. If anything already exists under that
    /// name only its modification time is refreshed.
    pub fn create_file(
        &mut self,
        dir: &str,
        name: &str,
        content: &str,
        now: Timestamp,
    ) -> Result<()> {
        check_name(name)?;
        let dir = normalize(dir).into_owned();
        self.check_parent(&dir)?;
        if let Some(node) = self.nodes.get_mut(&join(&dir, name)) {
            node.touch(now);
            return Ok(());
        }
        let node = self.new_file(content, now);
        self.insert_child(&dir, name, node, now);
        Ok(())
    }

    /// Write `content` to file `name` inside `dir`, creating it if needed.
    ///
    /// Appending to an existing file always inserts exactly one newline
    /// before the new content, even when the file is empty. Appending to a
    /// missing file creates it with `content` alone.
    pub fn write_file(
        &mut self,
        dir: &str,
        name: &str,
        content: &str,
        mode: WriteMode,
        now: Timestamp,
    ) -> Result<()> {
        check_name(name)?;
        let dir = normalize(dir).into_owned();
        self.check_parent(&dir)?;
        match self.nodes.get_mut(&join(&dir, name)) {
            Some(Node::Directory(_)) => Err(QuestError::IsADirectory(name.to_string())),
            Some(Node::File(f)) => {
                match mode {
                    WriteMode::Overwrite => f.content = content.to_string(),
                    WriteMode::Append => {
                        f.content.push('\n');
                        f.content.push_str(content);
                    },
                }
                f.modified_at = now;
                Ok(())
            },
            None => {
                let node = self.new_file(content, now);
                self.insert_child(&dir, name, node, now);
                Ok(())
            },
        }
    }

    /// Apply a mode spec to `name` inside `dir` and return the new permissions.
    pub fn change_permissions(
        &mut self,
        dir: &str,
        name: &str,
        spec: &ModeSpec,
    ) -> Result<Permissions> {
        let path = join(&normalize(dir), name);
        let node = self
            .nodes
            .get_mut(&path)
            .ok_or_else(|| QuestError::NotFound(name.to_string()))?;
        let meta = node.meta_mut();
        meta.permissions = meta.permissions.apply(spec);
        Ok(meta.permissions)
    }

    /// Read file `name` inside `dir`. Requires the owner read bit.
    pub fn read_file(&self, dir: &str, name: &str) -> Result<&str> {
        let path = join(&normalize(dir), name);
        match self.nodes.get(&path) {
            None => Err(QuestError::NotFound(name.to_string())),
            Some(Node::Directory(_)) => Err(QuestError::IsADirectory(name.to_string())),
            Some(Node::File(f)) => {
                if !f.meta.permissions.owner.contains(Access::READ) {
                    return Err(QuestError::PermissionDenied(name.to_string()));
                }
                Ok(&f.content)
            },
        }
    }

    // -- internals --

    fn default_meta(&self, permissions: Permissions) -> Metadata {
        Metadata {
            permissions,
            owner: self.owner.clone(),
            group: self.group.clone(),
        }
    }

    fn new_directory(&self, now: Timestamp) -> Node {
        Node::Directory(DirectoryNode {
            meta: self.default_meta(Permissions::DIR_DEFAULT),
            created_at: now,
            modified_at: now,
            children: Vec::new(),
        })
    }

    fn new_file(&self, content: &str, now: Timestamp) -> Node {
        Node::File(FileNode {
            content: content.to_string(),
            meta: self.default_meta(Permissions::FILE_DEFAULT),
            modified_at: now,
        })
    }

    fn check_parent(&self, dir: &str) -> Result<()> {
        match self.nodes.get(dir) {
            Some(Node::Directory(_)) => Ok(()),
            Some(Node::File(_)) => Err(QuestError::NotADirectory(dir.to_string())),
            None => Err(QuestError::NotFound(dir.to_string())),
        }
    }

    /// Insert `node` under `dir`, which must be an existing directory.
    fn insert_child(&mut self, dir: &str, name: &str, node: Node, now: Timestamp) {
        self.nodes.insert(join(dir, name), node);
        if let Some(Node::Directory(parent)) = self.nodes.get_mut(dir) {
            parent.children.push(name.to_string());
            parent.modified_at = now;
        }
    }

    /// Create every missing directory along a normalized path.
    fn ensure_directories(&mut self, path: &str, now: Timestamp) {
        let mut current = "/".to_string();
        for component in path.split('/').filter(|c| !c.is_empty()) {
            let next = join(&current, component);
            if !self.nodes.contains_key(&next) {
                let node = self.new_directory(now);
                self.insert_child(&current, component, node, now);
            }
            current = next;
        }
    }

    fn load_entries(&mut self, dir: &str, entries: &[SeedEntry], now: Timestamp) -> Result<()> {
        for entry in entries {
            if check_name(&entry.name).is_err() {
                warn!("skipping seed entry with invalid name '{}' in {dir}", entry.name);
                continue;
            }
            let path = join(dir, &entry.name);
            if self.nodes.contains_key(&path) {
                return Err(QuestError::AlreadyExists(path));
            }
            let permissions = match (&entry.mode, entry.kind) {
                (Some(mode), _) => Permissions::from_octal(mode)?,
                (None, SeedKind::File) => Permissions::FILE_DEFAULT,
                (None, SeedKind::Directory) => Permissions::DIR_DEFAULT,
            };
            let meta = Metadata {
                permissions,
                owner: entry.owner.clone().unwrap_or_else(|| self.owner.clone()),
                group: entry.group.clone().unwrap_or_else(|| self.group.clone()),
            };
            match entry.kind {
                SeedKind::File => {
                    if !entry.children.is_empty() {
                        warn!("seed file {path} lists children; ignoring them");
                    }
                    let node = Node::File(FileNode {
                        content: entry.content.clone().unwrap_or_default(),
                        meta,
                        modified_at: now,
                    });
                    self.insert_child(dir, &entry.name, node, now);
                },
                SeedKind::Directory => {
                    if entry.content.is_some() {
                        warn!("seed directory {path} has content; ignoring it");
                    }
                    let node = Node::Directory(DirectoryNode {
                        meta,
                        created_at: now,
                        modified_at: now,
                        children: Vec::new(),
                    });
                    self.insert_child(dir, &entry.name, node, now);
                    self.load_entries(&path, &entry.children, now)?;
                },
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::parent;
    use quest_types::{Clock, FixedClock};

    const HOME: &str = "/home/quest";

    fn now() -> Timestamp {
        FixedClock::default().now()
    }

    fn later() -> Timestamp {
        let clock = FixedClock::default();
        clock.advance(600);
        clock.now()
    }

    fn tree() -> FileTree {
        FileTree::from_seed(HOME, "quest", "quest", &[], now()).unwrap()
    }

    fn names(tree: &FileTree, path: &str) -> Vec<String> {
        tree.list(path)
            .unwrap()
            .into_iter()
            .map(|(n, _)| n.to_string())
            .collect()
    }

    /// Every node except the root has a directory parent that lists it.
    fn assert_connected(tree: &FileTree) {
        for path in tree.nodes.keys().filter(|p| p.as_str() != "/") {
            match tree.nodes.get(parent(path)) {
                Some(Node::Directory(d)) => {
                    let name = path.rsplit('/').next().unwrap();
                    assert!(d.children.iter().any(|c| c == name), "{path} not listed");
                },
                other => panic!("parent of {path} is {other:?}"),
            }
        }
    }

    #[test]
    fn home_and_ancestors_exist() {
        let t = tree();
        assert!(t.resolve("/").unwrap().is_dir());
        assert!(t.resolve("/home").unwrap().is_dir());
        assert!(t.resolve(HOME).unwrap().is_dir());
        assert_connected(&t);
    }

    #[test]
    fn resolve_missing_fails() {
        let t = tree();
        assert!(matches!(t.resolve("/nope"), Err(QuestError::NotFound(_))));
    }

    #[test]
    fn list_in_creation_order() {
        let mut t = tree();
        t.create_file(HOME, "zeta.txt", "", now()).unwrap();
        t.create_directory(HOME, "alpha", now()).unwrap();
        t.create_file(HOME, "mid.txt", "", now()).unwrap();
        assert_eq!(names(&t, HOME), ["zeta.txt", "alpha", "mid.txt"]);
    }

    #[test]
    fn list_errors() {
        let mut t = tree();
        t.create_file(HOME, "f", "", now()).unwrap();
        assert!(matches!(t.list("/home/quest/f"), Err(QuestError::NotADirectory(_))));
        assert!(matches!(t.list("/ghost"), Err(QuestError::NotFound(_))));
    }

    #[test]
    fn mkdir_twice_fails_and_leaves_tree_unchanged() {
        let mut t = tree();
        t.create_directory(HOME, "x", now()).unwrap();
        let before = names(&t, HOME);
        let err = t.create_directory(HOME, "x", later()).unwrap_err();
        assert!(matches!(err, QuestError::AlreadyExists(ref n) if n == "x"));
        assert_eq!(names(&t, HOME), before);
    }

    #[test]
    fn mkdir_over_file_fails() {
        let mut t = tree();
        t.create_file(HOME, "x", "", now()).unwrap();
        assert!(matches!(
            t.create_directory(HOME, "x", now()),
            Err(QuestError::AlreadyExists(_))
        ));
    }

    #[test]
    fn mkdir_without_parent_fails() {
        let mut t = tree();
        assert!(matches!(
            t.create_directory("/home/quest/missing", "x", now()),
            Err(QuestError::NotFound(_))
        ));
    }

    #[test]
    fn invalid_names_rejected() {
        let mut t = tree();
        for bad in ["", ".", "..", "a/b"] {
            assert!(t.create_directory(HOME, bad, now()).is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn touch_twice_keeps_content_and_refreshes_time() {
        let mut t = tree();
        t.create_file(HOME, "f", "", now()).unwrap();
        assert_eq!(t.file("/home/quest/f").unwrap().size(), 0);
        t.write_file(HOME, "f", "keep", WriteMode::Overwrite, now())
            .unwrap();
        t.create_file(HOME, "f", "", later()).unwrap();
        let f = t.file("/home/quest/f").unwrap();
        assert_eq!(f.content, "keep");
        assert_eq!(f.modified_at, later());
        assert_eq!(names(&t, HOME), ["f"]);
    }

    #[test]
    fn touch_directory_refreshes_time() {
        let mut t = tree();
        t.create_directory(HOME, "d", now()).unwrap();
        t.create_file(HOME, "d", "", later()).unwrap();
        assert!(t.resolve("/home/quest/d").unwrap().is_dir());
        assert_eq!(t.resolve("/home/quest/d").unwrap().modified_at(), later());
    }

    #[test]
    fn overwrite_then_append() {
        let mut t = tree();
        t.write_file(HOME, "f", "a", WriteMode::Overwrite, now())
            .unwrap();
        t.write_file(HOME, "f", "b", WriteMode::Append, now())
            .unwrap();
        assert_eq!(t.read_file(HOME, "f").unwrap(), "a\nb");
    }

    #[test]
    fn append_to_empty_file_adds_one_newline() {
        let mut t = tree();
        t.create_file(HOME, "f", "", now()).unwrap();
        t.write_file(HOME, "f", "b", WriteMode::Append, now())
            .unwrap();
        assert_eq!(t.read_file(HOME, "f").unwrap(), "\nb");
    }

    #[test]
    fn append_to_missing_file_creates_it() {
        let mut t = tree();
        t.write_file(HOME, "new", "b", WriteMode::Append, now())
            .unwrap();
        assert_eq!(t.read_file(HOME, "new").unwrap(), "b");
    }

    #[test]
    fn write_to_directory_fails() {
        let mut t = tree();
        t.create_directory(HOME, "d", now()).unwrap();
        assert!(matches!(
            t.write_file(HOME, "d", "x", WriteMode::Overwrite, now()),
            Err(QuestError::IsADirectory(_))
        ));
    }

    #[test]
    fn read_errors() {
        let mut t = tree();
        t.create_directory(HOME, "d", now()).unwrap();
        assert!(matches!(t.read_file(HOME, "d"), Err(QuestError::IsADirectory(_))));
        assert!(matches!(t.read_file(HOME, "nope"), Err(QuestError::NotFound(_))));
    }

    #[test]
    fn read_requires_owner_read_bit() {
        let mut t = tree();
        t.write_file(HOME, "s", "hidden", WriteMode::Overwrite, now())
            .unwrap();
        t.change_permissions(HOME, "s", &"u-r".parse().unwrap())
            .unwrap();
        assert!(matches!(
            t.read_file(HOME, "s"),
            Err(QuestError::PermissionDenied(ref n)) if n == "s"
        ));
    }

    #[test]
    fn chmod_returns_new_permissions() {
        let mut t = tree();
        t.create_file(HOME, "run.sh", "", now()).unwrap();
        let p = t
            .change_permissions(HOME, "run.sh", &"u+x".parse().unwrap())
            .unwrap();
        assert_eq!(p.octal(), "744");
        assert_eq!(
            t.resolve("/home/quest/run.sh").unwrap().meta().permissions,
            p
        );
    }

    #[test]
    fn chmod_missing_fails() {
        let mut t = tree();
        assert!(matches!(
            t.change_permissions(HOME, "ghost", &"755".parse().unwrap()),
            Err(QuestError::NotFound(_))
        ));
    }

    #[test]
    fn sizes_and_defaults() {
        let mut t = tree();
        t.write_file(HOME, "f", "héllo", WriteMode::Overwrite, now())
            .unwrap();
        t.create_directory(HOME, "d", now()).unwrap();
        let f = t.resolve("/home/quest/f").unwrap();
        let d = t.resolve("/home/quest/d").unwrap();
        assert_eq!(f.size(), 5);
        assert_eq!(d.size(), DIRECTORY_SIZE);
        assert_eq!(f.meta().permissions.octal(), "644");
        assert_eq!(d.meta().permissions.octal(), "755");
        assert_eq!(f.meta().owner, "quest");
        assert_eq!(f.type_char(), '-');
        assert_eq!(d.type_char(), 'd');
    }

    #[test]
    fn seed_builds_nested_tree() {
        let entries = vec![
            SeedEntry::file("welcome.txt", "hi"),
            SeedEntry::directory(
                "docs",
                vec![SeedEntry::file("secret.txt", "s").with_mode("600")],
            ),
        ];
        let t = FileTree::from_seed(HOME, "quest", "quest", &entries, now()).unwrap();
        assert_eq!(names(&t, HOME), ["welcome.txt", "docs"]);
        let secret = t.resolve("/home/quest/docs/secret.txt").unwrap();
        assert_eq!(secret.meta().permissions.symbolic(), "rw-------");
        assert_connected(&t);
    }

    #[test]
    fn seed_rejects_bad_mode() {
        let entries = vec![SeedEntry::file("a", "").with_mode("9x9")];
        assert!(matches!(
            FileTree::from_seed(HOME, "quest", "quest", &entries, now()),
            Err(QuestError::InvalidArgument(_))
        ));
    }

    #[test]
    fn seed_rejects_duplicates() {
        let entries = vec![SeedEntry::file("a", ""), SeedEntry::file("a", "")];
        assert!(matches!(
            FileTree::from_seed(HOME, "quest", "quest", &entries, now()),
            Err(QuestError::AlreadyExists(_))
        ));
    }

    #[test]
    fn seed_skips_invalid_names() {
        let entries = vec![SeedEntry::file("a/b", ""), SeedEntry::file("ok", "")];
        let t = FileTree::from_seed(HOME, "quest", "quest", &entries, now()).unwrap();
        assert_eq!(names(&t, HOME), ["ok"]);
    }

    #[test]
    fn seed_owner_override() {
        let mut entry = SeedEntry::file("root.txt", "");
        entry.owner = Some("root".into());
        let t = FileTree::from_seed(HOME, "quest", "quest", &[entry], now()).unwrap();
        let node = t.resolve("/home/quest/root.txt").unwrap();
        assert_eq!(node.meta().owner, "root");
        assert_eq!(node.meta().group, "quest");
    }

    #[test]
    fn many_files_in_one_dir() {
        let mut t = tree();
        for i in 0..200 {
            t.create_file(HOME, &format!("file_{i}"), "x", now()).unwrap();
        }
        assert_eq!(t.list(HOME).unwrap().len(), 200);
        assert_eq!(names(&t, HOME)[199], "file_199");
    }

    mod prop {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn created_nodes_stay_connected(
                ops in proptest::collection::vec(("[a-c]{1,2}", any::<bool>()), 1..30),
            ) {
                let mut t = tree();
                for (name, dir) in &ops {
                    let _ = if *dir {
                        t.create_directory(HOME, name, now())
                    } else {
                        t.create_file(HOME, name, "", now())
                    };
                }
                assert_connected(&t);
                let listed = names(&t, HOME);
                let mut dedup = listed.clone();
                dedup.sort();
                dedup.dedup();
                prop_assert_eq!(dedup.len(), listed.len());
            }

            #[test]
            fn write_then_read_roundtrips(name in "[a-z]{1,8}", data in "[ -~\n]{0,64}") {
                let mut t = tree();
                t.write_file(HOME, &name, &data, WriteMode::Overwrite, now()).unwrap();
                prop_assert_eq!(t.read_file(HOME, &name).unwrap(), data.as_str());
            }
        }
    }
}
