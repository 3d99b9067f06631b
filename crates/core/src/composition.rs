//! Composition nodes
//!
//! A [`CompositionNode`] describes how tasks combine for one invocation:
//! a single task, a series group (strict left-to-right order) or a parallel
//! group (children may run concurrently, the group completes when all do).

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompositionNode {
    Task(String),
    Series(Vec<CompositionNode>),
    Parallel(Vec<CompositionNode>),
}

impl CompositionNode {
    pub fn task(name: impl Into<String>) -> Self {
        CompositionNode::Task(name.into())
    }

    pub fn series<I, N>(children: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<CompositionNode>,
    {
        CompositionNode::Series(children.into_iter().map(Into::into).collect())
    }

    pub fn parallel<I, N>(children: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<CompositionNode>,
    {
        CompositionNode::Parallel(children.into_iter().map(Into::into).collect())
    }

    /// Every task name referenced by this node, in first-appearance order
    pub fn task_names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_names(&mut names);
        names
    }

    fn collect_names<'a>(&'a self, names: &mut Vec<&'a str>) {
        match self {
            CompositionNode::Task(name) => {
                if !names.contains(&name.as_str()) {
                    names.push(name);
                }
            }
            CompositionNode::Series(children) | CompositionNode::Parallel(children) => {
                for child in children {
                    child.collect_names(names);
                }
            }
        }
    }
}

impl From<&str> for CompositionNode {
    fn from(name: &str) -> Self {
        CompositionNode::Task(name.to_string())
    }
}

impl From<String> for CompositionNode {
    fn from(name: String) -> Self {
        CompositionNode::Task(name)
    }
}

impl fmt::Display for CompositionNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (label, children) = match self {
            CompositionNode::Task(name) => return f.write_str(name),
            CompositionNode::Series(children) => ("series", children),
            CompositionNode::Parallel(children) => ("parallel", children),
        };
        write!(f, "{}(", label)?;
        for (i, child) in children.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", child)?;
        }
        f.write_str(")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_nested() {
        let node = CompositionNode::series([
            CompositionNode::task("build"),
            CompositionNode::parallel(["watch", "webserver"]),
        ]);
        assert_eq!(node.to_string(), "series(build, parallel(watch, webserver))");
    }

    #[test]
    fn test_task_names_deduplicates() {
        let node = CompositionNode::series([
            CompositionNode::parallel(["a", "b"]),
            CompositionNode::task("a"),
            CompositionNode::task("c"),
        ]);
        assert_eq!(node.task_names(), vec!["a", "b", "c"]);
    }
}
