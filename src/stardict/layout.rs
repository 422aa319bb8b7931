//! File naming for the four files of one dictionary.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Paths of the files sharing one dictionary prefix `P`:
/// `P.ifo`, `P.idx`, `P.dict` (or `P.dict.dz`) and `P.syn`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DictionaryPaths {
    prefix: PathBuf,
}

impl DictionaryPaths {
    pub fn new(prefix: impl AsRef<Path>) -> Self {
        Self {
            prefix: prefix.as_ref().to_path_buf(),
        }
    }

    /// `<dir>/<stem>-<from>-<to>`, the naming used for language-pair exports.
    pub fn for_language_pair(dir: impl AsRef<Path>, stem: &str, from: &str, to: &str) -> Self {
        Self::new(dir.as_ref().join(format!("{}-{}-{}", stem, from, to)))
    }

    /// Derives the prefix from any of the dictionary's files, e.g.
    /// `words.idx` or `words.dict.dz` → `words`.
    pub fn from_member(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let stem = [".dict.dz", ".ifo", ".idx", ".dict", ".syn"]
            .iter()
            .find_map(|ext| name.strip_suffix(ext))
            .unwrap_or(&name);
        Self::new(path.with_file_name(stem))
    }

    pub fn prefix(&self) -> &Path {
        &self.prefix
    }

    fn with_extension(&self, ext: &str) -> PathBuf {
        let mut name = OsString::from(self.prefix.as_os_str());
        name.push(ext);
        PathBuf::from(name)
    }

    pub fn ifo(&self) -> PathBuf {
        self.with_extension(".ifo")
    }

    pub fn idx(&self) -> PathBuf {
        self.with_extension(".idx")
    }

    pub fn dict(&self) -> PathBuf {
        self.with_extension(".dict")
    }

    /// Gzip-compressed definitions, as shipped by most published dictionaries.
    pub fn dict_dz(&self) -> PathBuf {
        self.with_extension(".dict.dz")
    }

    pub fn syn(&self) -> PathBuf {
        self.with_extension(".syn")
    }
}

/// `bookname` used when the caller supplies no title.
pub fn default_title(from: &str, to: &str) -> String {
    format!("kaikki.org {} to {} dictionary", from, to)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extensions_are_appended_not_replaced() {
        let paths = DictionaryPaths::new("/tmp/out/dict_v1.2");
        assert_eq!(paths.ifo(), PathBuf::from("/tmp/out/dict_v1.2.ifo"));
        assert_eq!(paths.dict_dz(), PathBuf::from("/tmp/out/dict_v1.2.dict.dz"));
    }

    #[test]
    fn language_pair_and_member_naming() {
        let paths = DictionaryPaths::for_language_pair("/tmp", "kaikki", "cs", "en");
        assert_eq!(paths.idx(), PathBuf::from("/tmp/kaikki-cs-en.idx"));
        assert_eq!(DictionaryPaths::from_member("/tmp/kaikki-cs-en.dict.dz"), paths);
        assert_eq!(DictionaryPaths::from_member(paths.syn()), paths);
        assert_eq!(default_title("cs", "en"), "kaikki.org cs to en dictionary");
    }
}
