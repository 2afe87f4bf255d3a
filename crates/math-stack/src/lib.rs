//! The parser stack of a TeX math to node tree converter.
//!
//! TeX grouping is context sensitive: whether a token closes a group, opens a new one, or
//! rewrites several pending constructs into a single node depends on what is currently open.
//! This crate provides the machine that resolves it. A [`Stack`] holds the open constructs
//! ("items"), and every push asks the current top item whether to accept, absorb, or replace
//! the newcomer.
//!
//! # Usage
//!
//! Items are created through an [`ItemFactory`], in which the grammar registers a builder per
//! item kind. The node type of the tree is supplied by the caller through the [`TreeNode`]
//! trait.
//!
//! ```rust
//! use math_stack::{ItemFactory, Stack, TreeNode};
//!
//! #[derive(Debug, Clone, PartialEq)]
//! enum Node {
//!     Char(char),
//!     Row(Vec<Node>),
//! }
//!
//! impl TreeNode for Node {
//!     fn row(children: Vec<Self>) -> Self {
//!         Node::Row(children)
//!     }
//! }
//!
//! let factory = ItemFactory::with_base_items();
//! let mut stack = Stack::new(&factory, None, false).unwrap();
//! stack.push_node(Node::Char('x')).unwrap();
//! stack.push_item(stack.create("open", vec![]).unwrap()).unwrap();
//! stack.push_node(Node::Char('y')).unwrap();
//! stack.push_item(stack.create("close", vec![]).unwrap()).unwrap();
//! let tree = stack.finish().unwrap();
//! assert_eq!(
//!     tree,
//!     Node::Row(vec![Node::Char('x'), Node::Row(vec![Node::Row(vec![Node::Char('y')])])])
//! );
//! ```
//!
//! # Features
//!
//! - `serde`: With this feature, `StackConfig`, `EnvList` and `Value` implement serde's
//!   `Serialize` and `Deserialize`.
//!
pub mod base_items;
mod env;
mod error;
mod factory;
mod item;
mod stack;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub use self::{
    env::{EnvList, Value},
    error::{CloseMismatch, Operation, StackErrKind, StackError},
    factory::{ItemBuilder, ItemFactory},
    item::{
        CheckResult, Entry, Item, ItemBase, StackItem, TreeNode, default_check_item,
        default_close_error,
    },
    stack::{IS_INNER, Stack},
};

/// Configuration object for a [`Stack`].
///
/// # Example usage
///
/// ```rust
/// use math_stack::StackConfig;
///
/// // A stack for a nested parse, e.g. the content of `\text{...$...$...}`.
/// let config = StackConfig {
///     inner: true,
///     ..Default::default()
/// };
/// assert_eq!(config.replacement_limit, 64);
/// ```
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default, rename_all = "kebab-case"))]
pub struct StackConfig {
    /// Whether the stack belongs to a nested parse. Recorded in the global record.
    pub inner: bool,
    /// How many replacements a single push may chain before it is aborted.
    pub replacement_limit: usize,
}

impl Default for StackConfig {
    fn default() -> Self {
        StackConfig {
            inner: false,
            replacement_limit: 64,
        }
    }
}
