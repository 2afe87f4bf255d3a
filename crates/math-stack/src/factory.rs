use std::fmt;

use rustc_hash::FxHashMap;

use crate::{
    base_items::register_base_items,
    env::Value,
    error::{StackErrKind, StackError},
    item::{Item, TreeNode},
};

/// Builds an item from positional construction arguments.
pub type ItemBuilder<N> = Box<dyn Fn(Vec<Value<N>>) -> Result<Item<N>, Box<StackError>>>;

/// Registry mapping item kinds to their builders.
///
/// The factory is set up once by the grammar configuration and only read afterwards, so one
/// factory can serve any number of parses, including nested ones.
pub struct ItemFactory<N: TreeNode> {
    builders: FxHashMap<&'static str, ItemBuilder<N>>,
}

impl<N: TreeNode> Default for ItemFactory<N> {
    fn default() -> Self {
        ItemFactory {
            builders: FxHashMap::default(),
        }
    }
}

impl<N: TreeNode> ItemFactory<N> {
    /// An empty factory. A stack needs at least `start` and `mml` to be registered.
    pub fn new() -> Self {
        Self::default()
    }

    /// A factory with `start`, `stop`, `open`, `close` and `mml` registered.
    pub fn with_base_items() -> Self {
        let mut factory = Self::new();
        register_base_items(&mut factory);
        factory
    }

    /// Register `builder` under `kind`, replacing any earlier registration.
    pub fn register<F>(&mut self, kind: &'static str, builder: F)
    where
        F: Fn(Vec<Value<N>>) -> Result<Item<N>, Box<StackError>> + 'static,
    {
        self.builders.insert(kind, Box::new(builder));
    }

    #[inline]
    pub fn contains(&self, kind: &str) -> bool {
        self.builders.contains_key(kind)
    }

    pub fn kinds(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.builders.keys().copied()
    }

    /// Build a new item of the given kind.
    pub fn create(&self, kind: &str, args: Vec<Value<N>>) -> Result<Item<N>, Box<StackError>> {
        let Some(builder) = self.builders.get(kind) else {
            return Err(StackErrKind::UnknownItemKind(kind.into()).into());
        };
        builder(args)
    }
}

impl<N: TreeNode> fmt::Debug for ItemFactory<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds = self.kinds().collect::<Vec<_>>();
        kinds.sort_unstable();
        f.debug_struct("ItemFactory").field("kinds", &kinds).finish()
    }
}
