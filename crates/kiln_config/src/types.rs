//! Configuration types deserialized from `kiln.toml`.

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer};
use indexmap::IndexMap;
use std::collections::BTreeMap;

/// The top-level project configuration parsed from `kiln.toml`.
#[derive(Debug, Deserialize)]
pub struct ProjectConfig {
    /// Optional project metadata, used only for reporting.
    #[serde(default)]
    pub project: ProjectMeta,
    /// Compiler, directory layout and link settings.
    pub build: BuildConfig,
    /// Resource mappings: input path or glob pattern to an output path
    /// relative to the executable directory, in file order.
    #[serde(default)]
    pub resources: IndexMap<String, String>,
    /// Header override table: header path to the sources implementing it.
    #[serde(default)]
    pub depend_mapping: BTreeMap<String, Vec<String>>,
}

/// Descriptive project metadata.
#[derive(Debug, Default, Deserialize)]
pub struct ProjectMeta {
    /// The project name.
    #[serde(default)]
    pub name: String,
    /// The project version string.
    #[serde(default)]
    pub version: String,
}

/// Build settings. Only `compiler` and `source_main` are required.
#[derive(Debug, Deserialize)]
pub struct BuildConfig {
    /// Compiler executable used for dependency listing, compiling and linking.
    #[serde(default)]
    pub compiler: String,
    /// The main source file, relative to `source_dir`. May be a glob pattern.
    #[serde(default)]
    pub source_main: String,
    /// Flags passed to every compile.
    ///
    /// Accepts either a single whitespace-separated string or a list.
    #[serde(default, deserialize_with = "deserialize_flags")]
    pub compiler_flags: Vec<String>,
    /// Flags passed to the link step.
    #[serde(default, deserialize_with = "deserialize_flags")]
    pub linker_flags: Vec<String>,
    /// Root directory of source files.
    #[serde(default = "default_source_dir")]
    pub source_dir: String,
    /// Extension of source files, without the dot.
    #[serde(default = "default_source_ext")]
    pub source_ext: String,
    /// Root directory of header files.
    #[serde(default = "default_header_dir")]
    pub header_dir: String,
    /// Extension of header files, without the dot.
    #[serde(default = "default_header_ext")]
    pub header_ext: String,
    /// Root directory of object files.
    #[serde(default = "default_object_dir")]
    pub object_dir: String,
    /// Extension of object files, without the dot.
    #[serde(default = "default_object_ext")]
    pub object_ext: String,
    /// Directory the executable is linked into.
    #[serde(default = "default_exe_dir")]
    pub exe_dir: String,
    /// File name of the executable.
    #[serde(default = "default_exe_file")]
    pub exe_file: String,
    /// Extra include directories (`-I`).
    #[serde(default)]
    pub include_paths: Vec<String>,
    /// Extra library directories (`-L`).
    #[serde(default)]
    pub lib_paths: Vec<String>,
    /// Whether to write `compile_commands.json`.
    #[serde(default)]
    pub compile_commands: bool,
    /// Whether to skip the link step entirely.
    #[serde(default)]
    pub skip_link: bool,
}

fn default_source_dir() -> String {
    "src".to_string()
}

fn default_source_ext() -> String {
    "cpp".to_string()
}

fn default_header_dir() -> String {
    "include".to_string()
}

fn default_header_ext() -> String {
    "hpp".to_string()
}

fn default_object_dir() -> String {
    "build".to_string()
}

fn default_object_ext() -> String {
    "o".to_string()
}

fn default_exe_dir() -> String {
    "bin".to_string()
}

fn default_exe_file() -> String {
    "a.out".to_string()
}

/// Deserializes a flag field that can be either a single string or a list.
///
/// A single string is split on whitespace, so `compiler_flags = "-O2 -g"`
/// and `compiler_flags = ["-O2", "-g"]` are equivalent.
fn deserialize_flags<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    struct StringOrVec;

    impl<'de> Visitor<'de> for StringOrVec {
        type Value = Vec<String>;

        fn expecting(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            formatter.write_str("a string or a list of strings")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            Ok(v.split_whitespace().map(str::to_string).collect())
        }

        fn visit_seq<A: de::SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
            let mut vec = Vec::new();
            while let Some(val) = seq.next_element::<String>()? {
                vec.push(val);
            }
            Ok(vec)
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(Vec::new())
        }
    }

    deserializer.deserialize_any(StringOrVec)
}
