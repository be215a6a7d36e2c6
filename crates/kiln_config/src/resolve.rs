//! Layout resolution: turning a parsed configuration into normalized paths.

use crate::error::ConfigError;
use crate::types::ProjectConfig;
use kiln_common::{normalize_path, project_relative};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// One configured resource mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceMapping {
    /// Input path or glob pattern, relative to the project root.
    pub input: String,
    /// Output path relative to the executable directory.
    pub output: PathBuf,
}

/// A fully resolved project layout.
///
/// Every directory is normalized and relative to [`root`](Self::root);
/// the override table is keyed by normalized header paths so that it can
/// be matched directly against normalized dependency-listing output.
#[derive(Debug, Clone)]
pub struct ProjectLayout {
    /// Absolute project root. All tool invocations run here.
    pub root: PathBuf,
    /// Compiler executable.
    pub compiler: String,
    /// Compile flags.
    pub compiler_flags: Vec<String>,
    /// Link flags.
    pub linker_flags: Vec<String>,
    /// Main source seed relative to `source_dir`; may contain wildcards.
    pub source_main: String,
    /// Source root.
    pub source_dir: PathBuf,
    /// Source extension, without the dot.
    pub source_ext: String,
    /// Header root.
    pub header_dir: PathBuf,
    /// Header extension, without the dot.
    pub header_ext: String,
    /// Object root.
    pub object_dir: PathBuf,
    /// Object extension, without the dot.
    pub object_ext: String,
    /// Executable directory.
    pub exe_dir: PathBuf,
    /// Executable file name.
    pub exe_file: String,
    /// Extra include directories.
    pub include_paths: Vec<PathBuf>,
    /// Extra library directories.
    pub lib_paths: Vec<PathBuf>,
    /// Header override table.
    pub overrides: BTreeMap<PathBuf, Vec<PathBuf>>,
    /// Resource mappings in configuration order.
    pub resources: Vec<ResourceMapping>,
    /// Whether to write `compile_commands.json`.
    pub compile_commands: bool,
    /// Whether to skip linking.
    pub skip_link: bool,
}

impl ProjectLayout {
    /// Returns the executable path relative to the root.
    pub fn exe_path(&self) -> PathBuf {
        self.exe_dir.join(&self.exe_file)
    }

    /// Returns the seed pattern (`source_dir/source_main`) relative to the root.
    pub fn seed_pattern(&self) -> PathBuf {
        self.source_dir.join(&self.source_main)
    }

    /// Returns `true` if the seed contains glob metacharacters.
    pub fn seed_is_glob(&self) -> bool {
        self.source_main.contains(['*', '?', '['])
    }

    /// Joins a root-relative path onto the project root.
    pub fn absolute(&self, rel: &Path) -> PathBuf {
        if rel.is_absolute() {
            rel.to_path_buf()
        } else {
            self.root.join(rel)
        }
    }

    /// Normalizes an arbitrary path into the root-relative form used as a key.
    pub fn key(&self, path: &Path) -> PathBuf {
        project_relative(&self.root, path)
    }

    /// Returns the absolute path of the compilation database.
    pub fn compile_commands_path(&self) -> PathBuf {
        self.root.join("compile_commands.json")
    }
}

/// Resolves a parsed configuration against the project root.
///
/// `root` is made absolute (relative to the current directory if needed) and
/// every configured path is normalized relative to it.
pub fn resolve_layout(config: &ProjectConfig, root: &Path) -> Result<ProjectLayout, ConfigError> {
    let root = if root.is_absolute() {
        normalize_path(root)
    } else {
        let cwd = std::env::current_dir().map_err(|source| ConfigError::IoError {
            path: root.to_path_buf(),
            source,
        })?;
        normalize_path(&cwd.join(root))
    };

    let b = &config.build;
    let rel = |p: &str| project_relative(&root, Path::new(p));

    let overrides = config
        .depend_mapping
        .iter()
        .map(|(header, sources)| (rel(header), sources.iter().map(|s| rel(s)).collect()))
        .collect();

    let resources = config
        .resources
        .iter()
        .map(|(input, output)| ResourceMapping {
            input: input.clone(),
            output: normalize_path(Path::new(output)),
        })
        .collect();

    Ok(ProjectLayout {
        compiler: b.compiler.clone(),
        compiler_flags: b.compiler_flags.clone(),
        linker_flags: b.linker_flags.clone(),
        source_main: b.source_main.clone(),
        source_dir: rel(&b.source_dir),
        source_ext: b.source_ext.clone(),
        header_dir: rel(&b.header_dir),
        header_ext: b.header_ext.clone(),
        object_dir: rel(&b.object_dir),
        object_ext: b.object_ext.clone(),
        exe_dir: rel(&b.exe_dir),
        exe_file: b.exe_file.clone(),
        include_paths: b.include_paths.iter().map(|p| rel(p)).collect(),
        lib_paths: b.lib_paths.iter().map(|p| rel(p)).collect(),
        overrides,
        resources,
        compile_commands: b.compile_commands,
        skip_link: b.skip_link,
        root,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::load_config_from_str;

    fn layout(toml: &str) -> ProjectLayout {
        let config = load_config_from_str(toml).unwrap();
        resolve_layout(&config, Path::new("/work/proj")).unwrap()
    }

    #[test]
    fn resolve_defaults() {
        let l = layout(
            r#"
[build]
compiler = "g++"
source_main = "main.cpp"
"#,
        );
        assert_eq!(l.root, PathBuf::from("/work/proj"));
        assert_eq!(l.source_dir, PathBuf::from("src"));
        assert_eq!(l.header_dir, PathBuf::from("include"));
        assert_eq!(l.object_dir, PathBuf::from("build"));
        assert_eq!(l.exe_path(), PathBuf::from("bin/a.out"));
        assert_eq!(l.seed_pattern(), PathBuf::from("src/main.cpp"));
        assert!(!l.seed_is_glob());
    }

    #[test]
    fn directories_are_normalized() {
        let l = layout(
            r#"
[build]
compiler = "g++"
source_main = "main.cpp"
source_dir = "./src/"
header_dir = "src/../include"
object_dir = "/work/proj/out/obj"
"#,
        );
        assert_eq!(l.source_dir, PathBuf::from("src"));
        assert_eq!(l.header_dir, PathBuf::from("include"));
        assert_eq!(l.object_dir, PathBuf::from("out/obj"));
    }

    #[test]
    fn override_keys_normalized() {
        let l = layout(
            r#"
[build]
compiler = "g++"
source_main = "main.cpp"

[depend_mapping]
"./include/helper.hpp" = ["src/helper-part1.cpp", "./src/helper-part2.cpp"]
"#,
        );
        let sources = &l.overrides[&PathBuf::from("include/helper.hpp")];
        assert_eq!(
            sources,
            &vec![
                PathBuf::from("src/helper-part1.cpp"),
                PathBuf::from("src/helper-part2.cpp")
            ]
        );
    }

    #[test]
    fn glob_seed_detected() {
        let l = layout(
            r#"
[build]
compiler = "g++"
source_main = "tools/*.cpp"
skip_link = true
"#,
        );
        assert!(l.seed_is_glob());
        assert!(l.skip_link);
    }

    #[test]
    fn resources_preserved() {
        let l = layout(
            r#"
[build]
compiler = "g++"
source_main = "main.cpp"

[resources]
"res/images" = "dir/"
"#,
        );
        assert_eq!(
            l.resources,
            vec![ResourceMapping {
                input: "res/images".to_string(),
                output: PathBuf::from("dir"),
            }]
        );
    }

    #[test]
    fn resources_keep_file_order() {
        let l = layout(
            r#"
[build]
compiler = "g++"
source_main = "main.cpp"

[resources]
"shaders" = "data"
"assets/*.png" = "data"
"config.ini" = "."
"#,
        );
        let inputs: Vec<&str> = l.resources.iter().map(|m| m.input.as_str()).collect();
        assert_eq!(inputs, ["shaders", "assets/*.png", "config.ini"]);
    }

    #[test]
    fn key_strips_root() {
        let l = layout(
            r#"
[build]
compiler = "g++"
source_main = "main.cpp"
"#,
        );
        assert_eq!(
            l.key(Path::new("/work/proj/include/../include/a.hpp")),
            PathBuf::from("include/a.hpp")
        );
        assert_eq!(l.absolute(Path::new("src/a.cpp")), PathBuf::from("/work/proj/src/a.cpp"));
    }
}
