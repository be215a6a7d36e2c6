//! Construction of dependency-listing, compile and link command lines.

use std::path::{Path, PathBuf};

use kiln_config::ProjectLayout;

use crate::invocation::{Action, Invocation};

/// Builds invocations from a resolved project layout.
///
/// All paths in the produced arguments are relative to the project root,
/// which is also the working directory of every invocation.
#[derive(Clone, Copy, Debug)]
pub struct CommandBuilder<'a> {
    layout: &'a ProjectLayout,
}

impl<'a> CommandBuilder<'a> {
    /// Creates a builder for the given layout.
    pub fn new(layout: &'a ProjectLayout) -> Self {
        Self { layout }
    }

    /// Include directory arguments: the header root first, then the extra
    /// include paths in configuration order.
    pub fn include_args(&self) -> Vec<String> {
        std::iter::once(&self.layout.header_dir)
            .chain(self.layout.include_paths.iter())
            .map(|dir| format!("-I{}", dir.display()))
            .collect()
    }

    /// Library directory arguments.
    pub fn lib_args(&self) -> Vec<String> {
        self.layout
            .lib_paths
            .iter()
            .map(|dir| format!("-L{}", dir.display()))
            .collect()
    }

    /// `compiler <flags> <includes> -MM <source>`
    ///
    /// Compile flags are included so that defines and language-standard
    /// switches affect header resolution the same way they affect the compile.
    pub fn list_dependencies(&self, source: &Path) -> Invocation {
        let mut args = self.layout.compiler_flags.clone();
        args.extend(self.include_args());
        args.push("-MM".to_string());
        args.push(path_arg(source));
        self.invocation(
            Action::ListDependencies {
                source: source.to_path_buf(),
            },
            args,
        )
    }

    /// `compiler <flags> -c <includes> <source> -o <object>`
    pub fn compile(&self, source: &Path, object: &Path) -> Invocation {
        let mut args = self.layout.compiler_flags.clone();
        args.push("-c".to_string());
        args.extend(self.include_args());
        args.push(path_arg(source));
        args.push("-o".to_string());
        args.push(path_arg(object));
        self.invocation(
            Action::Compile {
                source: source.to_path_buf(),
                object: object.to_path_buf(),
            },
            args,
        )
    }

    /// `compiler -o <target> <objects...> <lib dirs> <linker flags>`
    ///
    /// Linker flags come after the objects so that `-l` libraries resolve
    /// symbols the objects reference.
    pub fn link(&self, objects: &[PathBuf], target: &Path) -> Invocation {
        let mut args = vec!["-o".to_string(), path_arg(target)];
        args.extend(objects.iter().map(|o| path_arg(o)));
        args.extend(self.lib_args());
        args.extend(self.layout.linker_flags.iter().cloned());
        self.invocation(
            Action::Link {
                objects: objects.to_vec(),
                target: target.to_path_buf(),
            },
            args,
        )
    }

    fn invocation(&self, action: Action, args: Vec<String>) -> Invocation {
        Invocation {
            action,
            program: self.layout.compiler.clone(),
            args,
            cwd: self.layout.root.clone(),
        }
    }
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
