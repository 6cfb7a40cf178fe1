use std::collections::BTreeMap;
use std::sync::Arc;

use crate::upload::UploadedFile;

/// A node of the uploaded-files tree.
///
/// Form fields like `avatar`, `docs[]` or `profile[photos][0]` nest arbitrarily;
/// the tree keeps that shape, with files at the leaves.
#[derive(Debug, Clone)]
pub enum UploadedFiles {
    File(Arc<UploadedFile>),
    Map(BTreeMap<String, UploadedFiles>),
    List(Vec<UploadedFiles>),
}

impl UploadedFiles {
    pub fn file(file: UploadedFile) -> Self {
        UploadedFiles::File(Arc::new(file))
    }

    pub fn as_file(&self) -> Option<&Arc<UploadedFile>> {
        match self {
            UploadedFiles::File(file) => Some(file),
            _ => None,
        }
    }

    /// Looks up a child: by key in a map, by index in a list.
    pub fn get(&self, key: &str) -> Option<&UploadedFiles> {
        match self {
            UploadedFiles::Map(map) => map.get(key),
            UploadedFiles::List(list) => key.parse::<usize>().ok().and_then(|index| list.get(index)),
            UploadedFiles::File(_) => None,
        }
    }

    /// Follows a path of keys, e.g. `["profile", "photos", "0"]`.
    pub fn get_path<'a, I>(&self, path: I) -> Option<&UploadedFiles>
    where
        I: IntoIterator<Item = &'a str>,
    {
        path.into_iter().try_fold(self, |node, key| node.get(key))
    }

    /// Returns all leaves in depth-first order.
    pub fn files(&self) -> Vec<&Arc<UploadedFile>> {
        let mut files = Vec::new();
        self.collect_files(&mut files);
        files
    }

    fn collect_files<'a>(&'a self, files: &mut Vec<&'a Arc<UploadedFile>>) {
        match self {
            UploadedFiles::File(file) => files.push(file),
            UploadedFiles::Map(map) => map.values().for_each(|node| node.collect_files(files)),
            UploadedFiles::List(list) => list.iter().for_each(|node| node.collect_files(files)),
        }
    }
}

impl From<UploadedFile> for UploadedFiles {
    fn from(file: UploadedFile) -> Self {
        Self::file(file)
    }
}

impl From<Arc<UploadedFile>> for UploadedFiles {
    fn from(file: Arc<UploadedFile>) -> Self {
        UploadedFiles::File(file)
    }
}

impl From<Vec<UploadedFiles>> for UploadedFiles {
    fn from(list: Vec<UploadedFiles>) -> Self {
        UploadedFiles::List(list)
    }
}

impl From<BTreeMap<String, UploadedFiles>> for UploadedFiles {
    fn from(map: BTreeMap<String, UploadedFiles>) -> Self {
        UploadedFiles::Map(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::Stream;
    use crate::upload::UploadError;

    fn named(name: &str) -> UploadedFiles {
        let stream = Stream::temp(name.as_bytes(), 64).unwrap();
        UploadedFile::new(stream, None, UploadError::Ok, Some(name.to_string()), None).unwrap().into()
    }

    #[test]
    fn test_nested_lookup() {
        let photos = UploadedFiles::List(vec![named("a.png"), named("b.png")]);
        let profile = UploadedFiles::Map(BTreeMap::from([("photos".to_string(), photos)]));
        let root = UploadedFiles::Map(BTreeMap::from([
            ("profile".to_string(), profile),
            ("avatar".to_string(), named("me.jpg")),
        ]));

        let second = root.get_path(["profile", "photos", "1"]).and_then(UploadedFiles::as_file).unwrap();
        assert_eq!(second.client_filename(), Some("b.png"));
        assert!(root.get_path(["profile", "photos", "2"]).is_none());
        assert!(root.get_path(["avatar", "x"]).is_none());

        let names: Vec<_> = root.files().iter().filter_map(|file| file.client_filename()).collect();
        assert_eq!(names, ["me.jpg", "a.png", "b.png"]);
    }

    #[test]
    fn test_clones_share_files() {
        let node = named("shared.txt");
        let copy = node.clone();
        let dir = tempfile::tempdir().unwrap();

        node.as_file().unwrap().move_to(dir.path().join("shared.txt")).unwrap();
        assert!(copy.as_file().unwrap().is_moved());
    }
}
