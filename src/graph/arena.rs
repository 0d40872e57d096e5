//! Interned file paths
//!
//! Graph algorithms work on dense integer ids; strings are only touched when
//! entering or leaving the graph.

use std::collections::HashMap;

/// Index of an interned path
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FileId(u32);

impl FileId {
    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub(crate) fn from_index(index: usize) -> Self {
        FileId(index as u32)
    }
}

/// Append-only path interner
#[derive(Debug, Default, Clone)]
pub struct PathArena {
    paths: Vec<String>,
    ids: HashMap<String, FileId>,
}

impl PathArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Id for `path`, interning it on first sight
    pub fn intern(&mut self, path: &str) -> FileId {
        if let Some(&id) = self.ids.get(path) {
            return id;
        }
        let id = FileId(self.paths.len() as u32);
        self.paths.push(path.to_string());
        self.ids.insert(path.to_string(), id);
        id
    }

    /// Id of an already interned path
    pub fn get(&self, path: &str) -> Option<FileId> {
        self.ids.get(path).copied()
    }

    /// Path for an id handed out by this arena
    pub fn path(&self, id: FileId) -> &str {
        &self.paths[id.index()]
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// All ids in interning order
    pub fn ids(&self) -> impl Iterator<Item = FileId> + '_ {
        (0..self.paths.len() as u32).map(FileId)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_is_idempotent() {
        let mut arena = PathArena::new();
        let a = arena.intern("a.py");
        let b = arena.intern("b.py");
        assert_ne!(a, b);
        assert_eq!(arena.intern("a.py"), a);
        assert_eq!(arena.len(), 2);
    }

    #[test]
    fn test_round_trip_path() {
        let mut arena = PathArena::new();
        let id = arena.intern("pkg/mod.py");
        assert_eq!(arena.path(id), "pkg/mod.py");
        assert_eq!(arena.get("pkg/mod.py"), Some(id));
        assert_eq!(arena.get("other.py"), None);
    }

    #[test]
    fn test_ids_are_dense() {
        let mut arena = PathArena::new();
        arena.intern("x.py");
        arena.intern("y.py");
        let ids: Vec<usize> = arena.ids().map(FileId::index).collect();
        assert_eq!(ids, vec![0, 1]);
    }
}
