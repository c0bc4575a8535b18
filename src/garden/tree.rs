//! Navigation tree mirroring the garden's directory layout.

use super::Document;

/// A document leaf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeFile {
    pub url: String,
    pub title: String,
}

/// A folder node; the root has no name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tree {
    pub name: Option<String>,
    pub subfolders: Vec<Tree>,
    pub files: Vec<TreeFile>,
}

impl Tree {
    /// One leaf per document, placed under its `dirs`.
    pub fn build<'a>(documents: impl IntoIterator<Item = &'a Document>) -> Self {
        let mut root = Self::default();
        for doc in documents {
            root.insert(
                &doc.dirs,
                TreeFile {
                    url: doc.url.clone(),
                    title: doc.title.clone(),
                },
            );
        }
        root
    }

    /// Walk or create one folder per segment, then append the leaf.
    pub fn insert(&mut self, dirs: &[String], file: TreeFile) {
        let mut node = self;
        for dir in dirs {
            node = node.folder_mut(dir);
        }
        node.files.push(file);
    }

    fn folder_mut(&mut self, name: &str) -> &mut Self {
        let pos = match self
            .subfolders
            .iter()
            .position(|folder| folder.name.as_deref() == Some(name))
        {
            Some(pos) => pos,
            None => {
                self.subfolders.push(Self {
                    name: Some(name.to_owned()),
                    ..Self::default()
                });
                self.subfolders.len() - 1
            }
        };
        &mut self.subfolders[pos]
    }

    /// Total number of leaves below this node.
    pub fn file_count(&self) -> usize {
        self.files.len() + self.subfolders.iter().map(Self::file_count).sum::<usize>()
    }

    pub fn is_empty(&self) -> bool {
        self.file_count() == 0
    }
}
