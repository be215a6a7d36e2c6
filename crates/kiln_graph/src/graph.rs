//! Dependency Graph Builder.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};

use kiln_config::ProjectLayout;
use kiln_toolchain::Toolchain;
use tracing::{debug, warn};

use crate::discover::Discoverer;
use crate::error::GraphError;
use crate::object::object_path;
use crate::resolve::{HeaderResolver, Resolution};

/// Index of a node in a [`DependencyGraph`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    /// Returns the position of the node in discovery order.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// One translation unit: a source, its object, and every header it includes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildNode {
    /// Root-relative source path.
    pub source: PathBuf,
    /// Root-relative object path.
    pub object: PathBuf,
    /// Transitive header set, in the order the compiler listed it.
    pub headers: Vec<PathBuf>,
    /// Headers this source implements, through the override table or the
    /// naming convention. A change to one of them makes the source stale
    /// even when the source does not include it.
    pub implements: Vec<PathBuf>,
}

/// The set of translation units reachable from the seed.
///
/// Nodes live in an arena in discovery order; each source appears once.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    nodes: Vec<BuildNode>,
    index: HashMap<PathBuf, NodeId>,
    seeds: Vec<NodeId>,
    implemented_by: BTreeMap<PathBuf, Vec<PathBuf>>,
    unresolved_headers: Vec<PathBuf>,
}

impl DependencyGraph {
    /// Returns the nodes in discovery order.
    pub fn nodes(&self) -> &[BuildNode] {
        &self.nodes
    }

    /// Iterates over node ids and nodes in discovery order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &BuildNode)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, node)| (NodeId(i as u32), node))
    }

    /// Returns the number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if the graph has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns the node with the given id.
    pub fn node(&self, id: NodeId) -> &BuildNode {
        &self.nodes[id.index()]
    }

    /// Looks up a node by root-relative source path.
    pub fn find(&self, source: &Path) -> Option<NodeId> {
        self.index.get(source).copied()
    }

    /// Returns the nodes the seed expanded to.
    pub fn seeds(&self) -> &[NodeId] {
        &self.seeds
    }

    /// Returns every object path, in discovery order.
    pub fn objects(&self) -> Vec<PathBuf> {
        self.nodes.iter().map(|n| n.object.clone()).collect()
    }

    /// Returns the sources that implement `header`, if it resolved.
    pub fn implementors(&self, header: &Path) -> &[PathBuf] {
        self.implemented_by
            .get(header)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Returns project headers under the header root that no source implements.
    pub fn unresolved_headers(&self) -> &[PathBuf] {
        &self.unresolved_headers
    }

    fn push(&mut self, node: BuildNode) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.index.insert(node.source.clone(), id);
        self.nodes.push(node);
        id
    }
}

/// Builds a [`DependencyGraph`] by breadth-first discovery from the seed.
///
/// Each source is listed once and each header is resolved once, so mutual
/// inclusion and shared headers cannot cause repeated work or loops.
pub struct GraphBuilder<'a, T> {
    layout: &'a ProjectLayout,
    toolchain: &'a T,
}

impl<'a, T: Toolchain> GraphBuilder<'a, T> {
    /// Creates a builder that discovers dependencies through `toolchain`.
    pub fn new(layout: &'a ProjectLayout, toolchain: &'a T) -> Self {
        Self { layout, toolchain }
    }

    /// Discovers every source reachable from the seed.
    pub fn build(&self) -> Result<DependencyGraph, GraphError> {
        let discoverer = Discoverer::new(self.layout, self.toolchain);
        let resolver = HeaderResolver::new(self.layout);

        let mut graph = DependencyGraph::default();
        let mut queued: HashSet<PathBuf> = HashSet::new();
        let mut resolved: HashSet<PathBuf> = HashSet::new();
        let mut queue: VecDeque<PathBuf> = VecDeque::new();

        let seeds = self.seed_sources()?;
        for seed in &seeds {
            if queued.insert(seed.clone()) {
                queue.push_back(seed.clone());
            }
        }

        while let Some(source) = queue.pop_front() {
            let headers = discoverer.headers(&source)?;

            for header in &headers {
                if !resolved.insert(header.clone()) {
                    continue;
                }
                match resolver.resolve(header)? {
                    Resolution::Unresolved {
                        inside_header_root: true,
                    } => {
                        warn!(header = %header.display(), included_by = %source.display(),
                            "no source implements header; treating it as header-only");
                        graph.unresolved_headers.push(header.clone());
                    }
                    Resolution::Unresolved {
                        inside_header_root: false,
                    } => {
                        debug!(header = %header.display(), "external header");
                    }
                    resolution => {
                        let sources = resolution.sources().to_vec();
                        for implementor in &sources {
                            if queued.insert(implementor.clone()) {
                                debug!(header = %header.display(), source = %implementor.display(),
                                    "discovered source");
                                queue.push_back(implementor.clone());
                            }
                        }
                        graph.implemented_by.insert(header.clone(), sources);
                    }
                }
            }

            let object = object_path(self.layout, &source);
            graph.push(BuildNode {
                source,
                object,
                headers,
                implements: Vec::new(),
            });
        }

        for (header, sources) in &graph.implemented_by {
            for source in sources {
                if let Some(id) = graph.index.get(source) {
                    graph.nodes[id.index()].implements.push(header.clone());
                }
            }
        }

        graph.seeds = seeds.iter().filter_map(|s| graph.find(s)).collect();
        check_objects(&graph)?;
        Ok(graph)
    }

    /// Expands the seed into root-relative source paths, sorted for glob seeds.
    fn seed_sources(&self) -> Result<Vec<PathBuf>, GraphError> {
        let seed = self.layout.seed_pattern();
        if !self.layout.seed_is_glob() {
            return if self.layout.absolute(&seed).is_file() {
                Ok(vec![seed])
            } else {
                Err(GraphError::SeedNotFound(seed))
            };
        }

        let pattern = format!(
            "{}/{}",
            glob::Pattern::escape(&self.layout.root.to_string_lossy()),
            seed.to_string_lossy()
        );
        let entries = glob::glob(&pattern).map_err(|e| GraphError::InvalidSeedPattern {
            pattern: seed.to_string_lossy().into_owned(),
            reason: e.msg.to_string(),
        })?;

        let mut sources: Vec<PathBuf> = entries
            .filter_map(|entry| match entry {
                Ok(path) => Some(path),
                Err(e) => {
                    debug!(error = %e, "skipping unreadable seed match");
                    None
                }
            })
            .filter(|path| path.is_file())
            .map(|path| self.layout.key(&path))
            .collect();
        sources.sort();

        if sources.is_empty() {
            return Err(GraphError::SeedNotFound(seed));
        }
        Ok(sources)
    }
}

/// Fails if two distinct sources map to the same object.
fn check_objects(graph: &DependencyGraph) -> Result<(), GraphError> {
    let mut owners: HashMap<&Path, &Path> = HashMap::new();
    for node in graph.nodes() {
        if let Some(first) = owners.insert(&node.object, &node.source) {
            return Err(GraphError::ObjectCollision {
                object: node.object.clone(),
                first: first.to_path_buf(),
                second: node.source.clone(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiln_test_helpers::{ScriptedToolchain, TestProject};

    const CONFIG: &str = "[build]\ncompiler = \"g++\"\nsource_main = \"main.cpp\"\n";

    fn sources(graph: &DependencyGraph) -> Vec<String> {
        graph
            .nodes()
            .iter()
            .map(|n| n.source.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn single_source_without_headers() {
        let p = TestProject::new(CONFIG);
        p.write("src/main.cpp", "int main() {}\n");
        let layout = p.layout();
        let tc = ScriptedToolchain::new();

        let graph = GraphBuilder::new(&layout, &tc).build().unwrap();
        assert_eq!(sources(&graph), vec!["src/main.cpp"]);
        assert_eq!(graph.nodes()[0].object, PathBuf::from("build/main.o"));
        assert!(graph.nodes()[0].headers.is_empty());
        assert_eq!(graph.seeds().len(), 1);
    }

    #[test]
    fn follows_convention_transitively() {
        let p = TestProject::new(CONFIG);
        p.write("src/main.cpp", "#include \"app.hpp\"\n");
        p.write("include/app.hpp", "");
        p.write("src/app.cpp", "#include \"app.hpp\"\n#include \"log.hpp\"\n");
        p.write("include/log.hpp", "");
        p.write("src/log.cpp", "#include \"log.hpp\"\n");
        let layout = p.layout();
        let tc = ScriptedToolchain::new();

        let graph = GraphBuilder::new(&layout, &tc).build().unwrap();
        assert_eq!(
            sources(&graph),
            vec!["src/main.cpp", "src/app.cpp", "src/log.cpp"]
        );
        assert_eq!(
            graph.implementors(Path::new("include/log.hpp")),
            &[PathBuf::from("src/log.cpp")]
        );
    }

    #[test]
    fn diamond_lists_each_source_once() {
        let p = TestProject::new(CONFIG);
        p.write("src/main.cpp", "#include \"a.hpp\"\n#include \"b.hpp\"\n");
        p.write("include/a.hpp", "#include \"common.hpp\"\n");
        p.write("include/b.hpp", "#include \"common.hpp\"\n");
        p.write("include/common.hpp", "");
        p.write("src/a.cpp", "#include \"a.hpp\"\n");
        p.write("src/b.cpp", "#include \"b.hpp\"\n");
        p.write("src/common.cpp", "#include \"common.hpp\"\n");
        let layout = p.layout();
        let tc = ScriptedToolchain::new();

        let graph = GraphBuilder::new(&layout, &tc).build().unwrap();
        assert_eq!(graph.len(), 4);
        assert_eq!(
            sources(&graph)
                .iter()
                .filter(|s| s.as_str() == "src/common.cpp")
                .count(),
            1
        );
        assert_eq!(tc.listings().len(), 4);
    }

    #[test]
    fn mutual_inclusion_terminates() {
        let p = TestProject::new(CONFIG);
        p.write("src/main.cpp", "#include \"ping.hpp\"\n");
        p.write("include/ping.hpp", "#pragma once\n#include \"pong.hpp\"\n");
        p.write("include/pong.hpp", "#pragma once\n#include \"ping.hpp\"\n");
        p.write("src/ping.cpp", "#include \"ping.hpp\"\n");
        p.write("src/pong.cpp", "#include \"pong.hpp\"\n");
        let layout = p.layout();
        let tc = ScriptedToolchain::new();

        let graph = GraphBuilder::new(&layout, &tc).build().unwrap();
        assert_eq!(
            sources(&graph),
            vec!["src/main.cpp", "src/ping.cpp", "src/pong.cpp"]
        );
        assert_eq!(tc.listings().len(), 3);
    }

    #[test]
    fn override_adds_every_mapped_source() {
        let p = TestProject::new(
            "[build]\ncompiler = \"g++\"\nsource_main = \"main.cpp\"\n\n[depend_mapping]\n\"include/helper.hpp\" = [\"src/helper-part1.cpp\", \"src/helper-part2.cpp\"]\n",
        );
        p.write("src/main.cpp", "#include \"helper.hpp\"\n");
        p.write("include/helper.hpp", "");
        p.write("src/helper-part1.cpp", "#include \"helper.hpp\"\n");
        p.write("src/helper-part2.cpp", "#include \"helper.hpp\"\n");
        let layout = p.layout();
        let tc = ScriptedToolchain::new();

        let graph = GraphBuilder::new(&layout, &tc).build().unwrap();
        assert_eq!(
            sources(&graph),
            vec![
                "src/main.cpp",
                "src/helper-part1.cpp",
                "src/helper-part2.cpp"
            ]
        );
        assert!(graph.unresolved_headers().is_empty());
        let part2 = graph.find(Path::new("src/helper-part2.cpp")).unwrap();
        assert_eq!(
            graph.node(part2).implements,
            vec![PathBuf::from("include/helper.hpp")]
        );
    }

    #[test]
    fn header_only_headers_are_reported() {
        let p = TestProject::new(CONFIG);
        p.write("src/main.cpp", "#include \"constants.hpp\"\n");
        p.write("include/constants.hpp", "");
        let layout = p.layout();
        let tc = ScriptedToolchain::new();

        let graph = GraphBuilder::new(&layout, &tc).build().unwrap();
        assert_eq!(graph.len(), 1);
        assert_eq!(
            graph.unresolved_headers(),
            &[PathBuf::from("include/constants.hpp")]
        );
        assert_eq!(
            graph.nodes()[0].headers,
            vec![PathBuf::from("include/constants.hpp")]
        );
    }

    #[test]
    fn glob_seed_expands_sorted() {
        let p = TestProject::new(
            "[build]\ncompiler = \"g++\"\nsource_main = \"tools/*.cpp\"\nskip_link = true\n",
        );
        p.write("src/tools/zeta.cpp", "");
        p.write("src/tools/alpha.cpp", "");
        p.write("src/tools/readme.txt", "");
        let layout = p.layout();
        let tc = ScriptedToolchain::new();

        let graph = GraphBuilder::new(&layout, &tc).build().unwrap();
        assert_eq!(
            sources(&graph),
            vec!["src/tools/alpha.cpp", "src/tools/zeta.cpp"]
        );
        assert_eq!(graph.seeds().len(), 2);
    }

    #[test]
    fn missing_seed_is_error() {
        let p = TestProject::new(CONFIG);
        let layout = p.layout();
        let tc = ScriptedToolchain::new();
        let err = GraphBuilder::new(&layout, &tc).build().unwrap_err();
        assert!(matches!(err, GraphError::SeedNotFound(ref p) if p == Path::new("src/main.cpp")));
    }

    #[test]
    fn empty_glob_is_error() {
        let p = TestProject::new("[build]\ncompiler = \"g++\"\nsource_main = \"*.cpp\"\n");
        let layout = p.layout();
        let tc = ScriptedToolchain::new();
        let err = GraphBuilder::new(&layout, &tc).build().unwrap_err();
        assert!(matches!(err, GraphError::SeedNotFound(_)));
    }

    #[test]
    fn discovery_failure_aborts() {
        let p = TestProject::new(CONFIG);
        p.write("src/main.cpp", "#include \"gone.hpp\"\n");
        let layout = p.layout();
        let tc = ScriptedToolchain::new();
        let err = GraphBuilder::new(&layout, &tc).build().unwrap_err();
        match err {
            GraphError::DiscoveryFailed { output, .. } => assert!(output.contains("gone.hpp")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn object_collision_detected() {
        let p = TestProject::new(
            "[build]\ncompiler = \"g++\"\nsource_main = \"main.cpp\"\n\n[depend_mapping]\n\"include/x.hpp\" = [\"src/x.c\", \"src/x.c.cpp\"]\n",
        );
        p.write("src/main.cpp", "#include \"x.hpp\"\n");
        p.write("include/x.hpp", "");
        p.write("src/x.c", "");
        p.write("src/x.c.cpp", "");
        let layout = p.layout();
        let tc = ScriptedToolchain::new();

        let err = GraphBuilder::new(&layout, &tc).build().unwrap_err();
        match err {
            GraphError::ObjectCollision {
                object,
                first,
                second,
            } => {
                assert_eq!(object, PathBuf::from("build/x.c.o"));
                assert_eq!(first, PathBuf::from("src/x.c"));
                assert_eq!(second, PathBuf::from("src/x.c.cpp"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
