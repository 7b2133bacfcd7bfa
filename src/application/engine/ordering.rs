//! Dependency ordering - plugins never precede the plugins they depend on

use std::collections::{BTreeSet, HashMap, HashSet};

use crate::application::errors::PluginError;

/// Anything with a name and a list of names it must come after
pub trait Dependent {
    fn name(&self) -> &str;
    fn dependencies(&self) -> &[String];
}

/// Borrowed name/dependencies pair, for ordering without owning the items
#[derive(Debug, Clone, Copy)]
pub struct Node<'a> {
    name: &'a str,
    dependencies: &'a [String],
}

impl<'a> Node<'a> {
    pub fn new(name: &'a str, dependencies: &'a [String]) -> Self {
        Self { name, dependencies }
    }

    pub fn of<T: Dependent>(item: &'a T) -> Self {
        Self::new(item.name(), item.dependencies())
    }
}

impl Dependent for Node<'_> {
    fn name(&self) -> &str {
        self.name
    }

    fn dependencies(&self) -> &[String] {
        self.dependencies
    }
}

/// Topologically sort `items` over their direct dependencies.
///
/// Stable: among items whose dependencies are satisfied, the one given first
/// comes first. Dependencies on names outside `items` are ignored.
pub fn order<T: Dependent>(items: Vec<T>) -> Result<Vec<T>, PluginError> {
    let count = items.len();
    let mut in_degree = vec![0usize; count];
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); count];

    {
        let index: HashMap<&str, usize> = items
            .iter()
            .enumerate()
            .map(|(i, item)| (item.name(), i))
            .collect();

        for (i, item) in items.iter().enumerate() {
            let mut seen = HashSet::new();
            for dependency in item.dependencies() {
                let Some(&j) = index.get(dependency.as_str()) else {
                    continue;
                };
                if seen.insert(j) {
                    in_degree[i] += 1;
                    dependents[j].push(i);
                }
            }
        }
    }

    let mut ready: BTreeSet<usize> = (0..count).filter(|&i| in_degree[i] == 0).collect();
    let mut sorted = Vec::with_capacity(count);

    while let Some(i) = ready.pop_first() {
        sorted.push(i);
        for &dependent in &dependents[i] {
            in_degree[dependent] -= 1;
            if in_degree[dependent] == 0 {
                ready.insert(dependent);
            }
        }
    }

    if sorted.len() < count {
        let cycle = (0..count)
            .filter(|&i| in_degree[i] > 0)
            .map(|i| items[i].name().to_string())
            .collect();
        return Err(PluginError::DependencyCycle(cycle));
    }

    let mut slots: Vec<Option<T>> = items.into_iter().map(Some).collect();
    Ok(sorted.into_iter().filter_map(|i| slots[i].take()).collect())
}
