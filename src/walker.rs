//! Depth-first traversal of the node graph.
//!
//! The walker starts from the root node and lets the plugins build the graph as
//! it goes: a node is resolved, inserted, scanned for children, entered, its
//! children are walked, and finally it is exited.

use crate::error::Result;
use crate::node::{NodeDependencies, NodeId, NodePath, NodeSource, NodeTree};
use crate::plugin::{PluginContext, PluginManager};
use log::{debug, warn};

/// Upper bound on resolve rounds for a single node
const MAX_RESOLVE_ROUNDS: usize = 32;

pub struct Walker<'a> {
    plugins: &'a PluginManager,
    ctx: PluginContext<'a>,
    tree: NodeTree,
    path: NodePath,
}

impl<'a> Walker<'a> {
    pub fn new(plugins: &'a PluginManager, ctx: PluginContext<'a>) -> Self {
        Self {
            plugins,
            ctx,
            tree: NodeTree::new(),
            path: NodePath::new(),
        }
    }

    /// Walks the graph from the root node.
    ///
    /// # Returns
    ///
    /// The tree of all visited nodes. The root node (id 0) holds the document
    /// built by the plugins.
    ///
    /// # Errors
    ///
    /// The first error raised by a plugin aborts the walk.
    pub fn walk(mut self) -> Result<NodeTree> {
        self.visit(NodeSource::Root)?;
        debug!("Walked {} nodes", self.tree.len());
        Ok(self.tree)
    }

    fn visit(&mut self, source: NodeSource) -> Result<()> {
        let source = self.resolve(source)?;
        if self.is_on_path(&source) {
            debug!("Skipping {}: already visited on this path", source);
            return Ok(());
        }

        let id = self.tree.insert(source, self.path.current());
        self.path.push(id);
        let result = self.visit_node(id);
        self.path.pop();
        result
    }

    fn visit_node(&mut self, id: NodeId) -> Result<()> {
        let plugins: &'a PluginManager = self.plugins;

        let mut dependencies = NodeDependencies::new(id);
        for plugin in plugins.plugins() {
            plugin.scan(&mut dependencies, &self.tree, &self.ctx)?;
        }

        for plugin in plugins.plugins() {
            plugin.enter(&self.path, &mut self.tree, &self.ctx)?;
        }

        for child in dependencies.children {
            self.visit(child)?;
        }

        for plugin in plugins.plugins().iter().rev() {
            plugin.exit(&self.path, &mut self.tree, &self.ctx)?;
        }
        Ok(())
    }

    /// Runs all resolve hooks until the source stops changing
    fn resolve(&self, source: NodeSource) -> Result<NodeSource> {
        let mut current = source;
        for _ in 0..MAX_RESOLVE_ROUNDS {
            let mut next = current.clone();
            for plugin in self.plugins.plugins() {
                next = plugin.resolve(next, &self.path, &self.tree, &self.ctx)?;
            }
            if next == current {
                return Ok(current);
            }
            debug!("Resolved {} to {}", current, next);
            current = next;
        }
        warn!(
            "Resolution of {} did not settle after {} rounds",
            current, MAX_RESOLVE_ROUNDS
        );
        Ok(current)
    }

    fn is_on_path(&self, source: &NodeSource) -> bool {
        self.path
            .ids()
            .iter()
            .any(|&id| self.tree.source(id) == Some(source))
    }
}
