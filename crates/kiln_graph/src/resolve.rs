//! Header-to-source resolution.

use std::path::{Path, PathBuf};

use kiln_config::ProjectLayout;

use crate::error::GraphError;
use crate::object::strip_dir;

/// How a header was mapped to its implementing sources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The header has an entry in the override table.
    Override(Vec<PathBuf>),
    /// The mirrored source under the source root exists.
    Convention(PathBuf),
    /// No implementing source was found.
    ///
    /// `inside_header_root` distinguishes project headers (possibly a
    /// missing override entry) from system and third-party headers.
    Unresolved {
        /// Whether the header lives under the configured header root.
        inside_header_root: bool,
    },
}

impl Resolution {
    /// Returns the implementing sources, empty if unresolved.
    pub fn sources(&self) -> &[PathBuf] {
        match self {
            Resolution::Override(sources) => sources,
            Resolution::Convention(source) => std::slice::from_ref(source),
            Resolution::Unresolved { .. } => &[],
        }
    }

    /// Returns `true` if no source implements the header.
    pub fn is_unresolved(&self) -> bool {
        matches!(self, Resolution::Unresolved { .. })
    }
}

/// Maps headers to the sources that implement them.
///
/// The override table wins; otherwise `include/a/b.hpp` is implemented by
/// `src/a/b.cpp` if that file exists.
#[derive(Clone, Copy, Debug)]
pub struct HeaderResolver<'a> {
    layout: &'a ProjectLayout,
}

impl<'a> HeaderResolver<'a> {
    /// Creates a resolver for the given layout.
    pub fn new(layout: &'a ProjectLayout) -> Self {
        Self { layout }
    }

    /// Resolves a root-relative, normalized header path.
    ///
    /// Fails only when an override entry names a source that does not exist.
    pub fn resolve(&self, header: &Path) -> Result<Resolution, GraphError> {
        if let Some(sources) = self.layout.overrides.get(header) {
            for source in sources {
                if !self.layout.absolute(source).is_file() {
                    return Err(GraphError::MissingOverrideSource {
                        header: header.to_path_buf(),
                        source_file: source.clone(),
                    });
                }
            }
            return Ok(Resolution::Override(sources.clone()));
        }

        let Some(rel) = strip_dir(header, &self.layout.header_dir) else {
            return Ok(Resolution::Unresolved {
                inside_header_root: false,
            });
        };

        match self.conventional_source(&rel) {
            Some(source) if self.layout.absolute(&source).is_file() => {
                Ok(Resolution::Convention(source))
            }
            _ => Ok(Resolution::Unresolved {
                inside_header_root: true,
            }),
        }
    }

    /// `a/b.hpp` under the header root becomes `source_dir/a/b.<source_ext>`.
    ///
    /// Only files carrying `header_ext` take part; `.inl` and similar
    /// fragments have no conventional source.
    fn conventional_source(&self, rel: &Path) -> Option<PathBuf> {
        if rel.extension()? != self.layout.header_ext.as_str() {
            return None;
        }
        let stem = rel.file_stem()?;
        let mut name = stem.to_os_string();
        name.push(".");
        name.push(&self.layout.source_ext);
        let dir = match rel.parent() {
            Some(parent) => self.layout.source_dir.join(parent),
            None => self.layout.source_dir.clone(),
        };
        Some(kiln_common::normalize_path(&dir.join(name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiln_test_helpers::TestProject;

    const CONFIG: &str = r#"
[build]
compiler = "g++"
source_main = "main.cpp"

[depend_mapping]
"include/helper.hpp" = ["src/helper-part1.cpp", "src/helper-part2.cpp"]
"include/broken.hpp" = ["src/missing.cpp"]
"#;

    #[test]
    fn convention_maps_mirrored_source() {
        let p = TestProject::new(CONFIG);
        p.write("src/util.cpp", "");
        p.write("src/net/socket.cpp", "");
        let layout = p.layout();
        let r = HeaderResolver::new(&layout);

        assert_eq!(
            r.resolve(Path::new("include/util.hpp")).unwrap(),
            Resolution::Convention(PathBuf::from("src/util.cpp"))
        );
        assert_eq!(
            r.resolve(Path::new("include/net/socket.hpp")).unwrap().sources(),
            &[PathBuf::from("src/net/socket.cpp")]
        );
    }

    #[test]
    fn override_takes_priority() {
        let p = TestProject::new(CONFIG);
        p.write("src/helper.cpp", "");
        p.write("src/helper-part1.cpp", "");
        p.write("src/helper-part2.cpp", "");
        let layout = p.layout();

        let res = HeaderResolver::new(&layout)
            .resolve(Path::new("include/helper.hpp"))
            .unwrap();
        assert_eq!(
            res,
            Resolution::Override(vec![
                PathBuf::from("src/helper-part1.cpp"),
                PathBuf::from("src/helper-part2.cpp"),
            ])
        );
    }

    #[test]
    fn missing_override_source_is_error() {
        let p = TestProject::new(CONFIG);
        let layout = p.layout();
        let err = HeaderResolver::new(&layout)
            .resolve(Path::new("include/broken.hpp"))
            .unwrap_err();
        assert!(matches!(
            err,
            GraphError::MissingOverrideSource { ref source_file, .. }
                if source_file == Path::new("src/missing.cpp")
        ));
    }

    #[test]
    fn header_only_is_unresolved_inside_root() {
        let p = TestProject::new(CONFIG);
        let layout = p.layout();
        let res = HeaderResolver::new(&layout)
            .resolve(Path::new("include/constants.hpp"))
            .unwrap();
        assert_eq!(
            res,
            Resolution::Unresolved {
                inside_header_root: true
            }
        );
        assert!(res.sources().is_empty());
    }

    #[test]
    fn system_header_is_external() {
        let p = TestProject::new(CONFIG);
        let layout = p.layout();
        let res = HeaderResolver::new(&layout)
            .resolve(Path::new("/usr/include/stdio.h"))
            .unwrap();
        assert_eq!(
            res,
            Resolution::Unresolved {
                inside_header_root: false
            }
        );
    }

    #[test]
    fn other_extension_under_header_root_is_unresolved() {
        let p = TestProject::new(CONFIG);
        p.write("src/util.cpp", "");
        p.write("include/util.cpp", "");
        let layout = p.layout();
        let r = HeaderResolver::new(&layout);

        for header in ["include/util.inl", "include/util.h", "include/util.cpp", "include/util"] {
            assert_eq!(
                r.resolve(Path::new(header)).unwrap(),
                Resolution::Unresolved {
                    inside_header_root: true
                },
                "{header}"
            );
        }
        assert!(matches!(
            r.resolve(Path::new("include/util.hpp")).unwrap(),
            Resolution::Convention(_)
        ));
    }

    #[test]
    fn header_root_equal_to_source_root() {
        let p = TestProject::new(
            "[build]\ncompiler = \"g++\"\nsource_main = \"main.cc\"\nsource_dir = \".\"\nheader_dir = \".\"\nsource_ext = \"cc\"\nobject_dir = \"out\"\n",
        );
        p.write("util.cc", "");
        let layout = p.layout();
        assert_eq!(
            HeaderResolver::new(&layout)
                .resolve(Path::new("util.hpp"))
                .unwrap(),
            Resolution::Convention(PathBuf::from("util.cc"))
        );
    }
}
