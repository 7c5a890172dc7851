use std::collections::HashSet;
use std::sync::Arc;

/// Flattening order of a [`DepSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
  /// A node's direct items, then each child's items, left to right.
  Preorder,
  /// Consumers before producers: an item appears after every item that
  /// transitively depends on it.
  Topological,
}

#[derive(Debug)]
struct Node<T> {
  direct: Vec<T>,
  children: Vec<DepSet<T>>,
}

/// Immutable set of items with structural sharing between consumers.
///
/// Cloning is cheap. Two sets built from the same child share that child's
/// node, and [`DepSet::to_list`] visits every shared node once.
#[derive(Debug)]
pub struct DepSet<T> {
  order: Order,
  node: Arc<Node<T>>,
}

impl<T> Clone for DepSet<T> {
  fn clone(&self) -> Self {
    Self {
      order: self.order,
      node: Arc::clone(&self.node),
    }
  }
}

impl<T: Clone + Eq + std::hash::Hash> DepSet<T> {
  pub fn builder(order: Order) -> DepSetBuilder<T> {
    DepSetBuilder {
      order,
      direct: Vec::new(),
      children: Vec::new(),
    }
  }

  pub fn empty(order: Order) -> Self {
    Self::builder(order).build()
  }

  pub fn new(order: Order, direct: Vec<T>, children: Vec<DepSet<T>>) -> Self {
    Self::builder(order).direct(direct).transitive(children).build()
  }

  pub fn order(&self) -> Order {
    self.order
  }

  pub fn is_empty(&self) -> bool {
    self.node.direct.is_empty() && self.node.children.iter().all(|c| c.is_empty())
  }

  /// Flatten into a list with duplicates removed.
  pub fn to_list(&self) -> Vec<T> {
    match self.order {
      Order::Preorder => self.preorder(),
      Order::Topological => self.topological(),
    }
  }

  fn preorder(&self) -> Vec<T> {
    let mut visited: HashSet<*const Node<T>> = HashSet::new();
    let mut seen: HashSet<T> = HashSet::new();
    let mut out = Vec::new();
    preorder_walk(self, &mut visited, &mut seen, &mut out);
    out
  }

  // Postorder over reversed children, pushing direct items reversed, then
  // reverse the whole list. Keeping the first postorder occurrence keeps the
  // deepest position, which becomes the last position after reversal.
  fn topological(&self) -> Vec<T> {
    let mut visited: HashSet<*const Node<T>> = HashSet::new();
    let mut seen: HashSet<T> = HashSet::new();
    let mut post = Vec::new();
    postorder_walk(self, &mut visited, &mut seen, &mut post);
    post.reverse();
    post
  }
}

fn preorder_walk<T: Clone + Eq + std::hash::Hash>(
  set: &DepSet<T>,
  visited: &mut HashSet<*const Node<T>>,
  seen: &mut HashSet<T>,
  out: &mut Vec<T>,
) {
  if !visited.insert(Arc::as_ptr(&set.node)) {
    return;
  }
  for item in &set.node.direct {
    if seen.insert(item.clone()) {
      out.push(item.clone());
    }
  }
  for child in &set.node.children {
    preorder_walk(child, visited, seen, out);
  }
}

fn postorder_walk<T: Clone + Eq + std::hash::Hash>(
  set: &DepSet<T>,
  visited: &mut HashSet<*const Node<T>>,
  seen: &mut HashSet<T>,
  out: &mut Vec<T>,
) {
  if !visited.insert(Arc::as_ptr(&set.node)) {
    return;
  }
  for child in set.node.children.iter().rev() {
    postorder_walk(child, visited, seen, out);
  }
  for item in set.node.direct.iter().rev() {
    if seen.insert(item.clone()) {
      out.push(item.clone());
    }
  }
}

/// Collects direct items and child sets, then freezes them into a [`DepSet`].
pub struct DepSetBuilder<T> {
  order: Order,
  direct: Vec<T>,
  children: Vec<DepSet<T>>,
}

impl<T: Clone + Eq + std::hash::Hash> DepSetBuilder<T> {
  pub fn direct(mut self, items: impl IntoIterator<Item = T>) -> Self {
    self.direct.extend(items);
    self
  }

  pub fn transitive(mut self, children: impl IntoIterator<Item = DepSet<T>>) -> Self {
    for child in children {
      self.add_transitive(child);
    }
    self
  }

  /// Add a child set. Empty children are dropped.
  pub fn add_transitive(&mut self, child: DepSet<T>) -> &mut Self {
    if !child.is_empty() {
      self.children.push(child);
    }
    self
  }

  pub fn build(self) -> DepSet<T> {
    DepSet {
      order: self.order,
      node: Arc::new(Node {
        direct: self.direct,
        children: self.children,
      }),
    }
  }
}
