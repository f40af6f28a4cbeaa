use std::{
    fs,
    path::{Path, PathBuf},
};

use general::Data;

/// A template fixture and the files that sit next to it
///
/// `name.general` is rendered with the data in `name.json` and must produce
/// the text in `name.txt`.
pub struct Fixture {
    pub path: PathBuf,
    pub source: String,
    pub data: Data,
    pub expected: String,
}

impl Fixture {
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();

        let source = fs::read_to_string(&path).expect("unable to read template fixture");
        let data = fs::read_to_string(path.with_extension("json"))
            .map(|json| Data::from_json(&json).expect("fixture data is valid"))
            .unwrap_or_default();
        let expected =
            fs::read_to_string(path.with_extension("txt")).expect("unable to read expected output");

        Self {
            path,
            source,
            data,
            expected,
        }
    }

    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}
