use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::{
    env::{EnvList, Value},
    error::{CloseMismatch, StackErrKind, StackError},
};

/// The node tree under construction, as seen by the stack.
///
/// The stack never looks inside a node. It only needs a way to collapse several accumulated
/// nodes into one.
pub trait TreeNode: Clone + fmt::Debug + 'static {
    /// An inferred row holding `children` in order.
    fn row(children: Vec<Self>) -> Self;

    /// The node produced when a brace group closes around `inner`.
    fn group(inner: Self) -> Self {
        Self::row(vec![inner])
    }
}

/// A boxed stack item, as stored on the stack and produced by the factory.
pub type Item<N> = Box<dyn StackItem<N>>;

/// Something that can be pushed onto the stack.
///
/// Raw nodes are wrapped into an `mml` item by the stack before they are checked.
#[derive(Debug)]
pub enum Entry<N: TreeNode> {
    Node(N),
    Item(Item<N>),
}

impl<N: TreeNode> From<Item<N>> for Entry<N> {
    #[inline]
    fn from(item: Item<N>) -> Self {
        Entry::Item(item)
    }
}

/// The answer of a merge check.
#[derive(Debug)]
pub enum CheckResult<N: TreeNode> {
    /// Push the candidate normally.
    Accept,
    /// Drop the candidate; it was absorbed or carried no content.
    Reject,
    /// Pop the checking item and push this entry instead of the candidate.
    Replace(Entry<N>),
    /// Pop the checking item and push every entry in order.
    ReplaceMany(Vec<Entry<N>>),
}

/// State shared by every item variant.
#[derive(Debug)]
pub struct ItemBase<N> {
    nodes: Vec<N>,
    pub(crate) env: Option<Rc<EnvList<N>>>,
    pub(crate) global: Option<Rc<RefCell<EnvList<N>>>>,
    properties: EnvList<N>,
}

impl<N> Default for ItemBase<N> {
    fn default() -> Self {
        ItemBase {
            nodes: Vec::new(),
            env: None,
            global: None,
            properties: EnvList::new(),
        }
    }
}

impl<N> ItemBase<N> {
    pub fn new() -> Self {
        Self::default()
    }

    /// A base that brings its own local environment.
    ///
    /// When pushed, the stack layers the current environment underneath it.
    pub fn with_env(env: EnvList<N>) -> Self {
        ItemBase {
            env: Some(Rc::new(env)),
            ..Self::default()
        }
    }

    pub fn with_nodes(nodes: Vec<N>) -> Self {
        ItemBase {
            nodes,
            ..Self::default()
        }
    }

    /// Item-specific data that is not part of the inherited environment.
    #[inline]
    pub fn properties(&self) -> &EnvList<N> {
        &self.properties
    }

    #[inline]
    pub fn properties_mut(&mut self) -> &mut EnvList<N> {
        &mut self.properties
    }
}

/// Mismatched-close diagnostics shared by all items, keyed by the kind of the closing item.
static BASE_CLOSE_ERRORS: phf::Map<&'static str, CloseMismatch> = phf::phf_map! {
    "end" => CloseMismatch::MissingBeginExtraEnd,
    "close" => CloseMismatch::ExtraCloseMissingOpen,
    "right" => CloseMismatch::MissingLeftExtraRight,
    "middle" => CloseMismatch::ExtraMiddle,
};

/// One pending syntactic construct on the parser stack.
pub trait StackItem<N: TreeNode>: fmt::Debug {
    fn base(&self) -> &ItemBase<N>;

    fn base_mut(&mut self) -> &mut ItemBase<N>;

    /// The discriminator this item was registered under.
    fn kind(&self) -> &'static str;

    /// Whether the item still accepts children. Closed items lose their local environment
    /// when they are popped.
    #[inline]
    fn is_open(&self) -> bool {
        false
    }

    /// Whether the item closes a scope, like `}`, `\end` or `\right`.
    #[inline]
    fn is_close(&self) -> bool {
        false
    }

    /// Whether the item is a finished node that the item below absorbs.
    #[inline]
    fn is_final(&self) -> bool {
        false
    }

    /// Whether a pre-set environment gets the current environment layered underneath it.
    #[inline]
    fn copy_env(&self) -> bool {
        true
    }

    /// The error to raise when an item of kind `closing` tries to close this item.
    fn close_error(&self, closing: &str) -> Option<CloseMismatch> {
        default_close_error(closing)
    }

    /// Decide what happens to `item`, which is about to be pushed on top of `self`.
    fn check_item(
        &mut self,
        item: &mut dyn StackItem<N>,
    ) -> Result<CheckResult<N>, Box<StackError>> {
        default_check_item(self, item)
    }

    #[inline]
    fn is_kind(&self, kind: &str) -> bool {
        self.kind() == kind
    }

    /// The name used in diagnostics: the `name` property if set, otherwise the kind.
    fn name(&self) -> Box<str> {
        match self.property("name").and_then(Value::as_str) {
            Some(name) => name.into(),
            None => self.kind().into(),
        }
    }

    #[inline]
    fn nodes(&self) -> &[N] {
        &self.base().nodes
    }

    #[inline]
    fn push_node(&mut self, node: N) {
        self.base_mut().nodes.push(node);
    }

    /// Remove and return the most recently accumulated node.
    #[inline]
    fn pop_node(&mut self) -> Option<N> {
        self.base_mut().nodes.pop()
    }

    #[inline]
    fn first(&self) -> Option<&N> {
        self.base().nodes.first()
    }

    #[inline]
    fn last(&self) -> Option<&N> {
        self.base().nodes.last()
    }

    #[inline]
    fn take_first(&mut self) -> Option<N> {
        let nodes = &mut self.base_mut().nodes;
        if nodes.is_empty() {
            None
        } else {
            Some(nodes.remove(0))
        }
    }

    #[inline]
    fn clear(&mut self) {
        self.base_mut().nodes.clear();
    }

    /// Collapse the accumulated nodes into one.
    ///
    /// A single node is returned as is unless `force_row` is set; anything else becomes a row.
    fn to_node(&self, force_row: bool) -> N {
        match self.nodes() {
            [node] if !force_row => node.clone(),
            nodes => N::row(nodes.to_vec()),
        }
    }

    /// The local environment, once the item has been pushed or if it brought its own.
    #[inline]
    fn env(&self) -> Option<&EnvList<N>> {
        self.base().env.as_deref()
    }

    #[inline]
    fn env_handle(&self) -> Option<&Rc<EnvList<N>>> {
        self.base().env.as_ref()
    }

    /// The parse-wide record, assigned when the item is pushed.
    #[inline]
    fn global(&self) -> Option<&Rc<RefCell<EnvList<N>>>> {
        self.base().global.as_ref()
    }

    #[inline]
    fn property(&self, key: &str) -> Option<&Value<N>> {
        self.base().properties.get(key)
    }

    #[inline]
    fn set_property(&mut self, key: &str, value: Value<N>) {
        self.base_mut().properties.set(key, value);
    }
}

/// Look up `closing` in the mismatched-close table shared by all items.
#[inline]
pub fn default_close_error(closing: &str) -> Option<CloseMismatch> {
    BASE_CLOSE_ERRORS.get(closing).copied()
}

/// The merge check every item performs unless it overrides [`StackItem::check_item`].
///
/// Overrides that only handle a few kinds themselves fall back to this for the rest.
pub fn default_check_item<N, I>(
    this: &mut I,
    item: &mut dyn StackItem<N>,
) -> Result<CheckResult<N>, Box<StackError>>
where
    N: TreeNode,
    I: StackItem<N> + ?Sized,
{
    if item.is_kind("over") && this.is_open() {
        let numerator = this.to_node(false);
        item.set_property("num", Value::Node(numerator));
        this.clear();
    }
    if item.is_kind("cell") && this.is_open() {
        if item.property("linebreak").is_some_and(Value::is_truthy) {
            return Ok(CheckResult::Reject);
        }
        return Err(StackErrKind::Misplaced(item.name()).into());
    }
    if item.is_close()
        && let Some(id) = this.close_error(item.kind())
    {
        return Err(StackErrKind::MismatchedClose {
            id,
            name: item.name(),
        }
        .into());
    }
    if !item.is_final() {
        return Ok(CheckResult::Accept);
    }
    if let Some(node) = item.take_first() {
        this.push_node(node);
    }
    Ok(CheckResult::Reject)
}

impl<N: TreeNode> fmt::Display for dyn StackItem<N> + '_ {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[", self.kind())?;
        for (i, node) in self.nodes().iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{node:?}")?;
        }
        f.write_str("]")
    }
}
