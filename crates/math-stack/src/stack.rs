use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use log::{debug, trace};

use crate::{
    StackConfig,
    base_items::{MML, START, STOP},
    env::{EnvList, Value},
    error::{Operation, StackErrKind, StackError},
    factory::ItemFactory,
    item::{CheckResult, Entry, Item, StackItem, TreeNode},
};

/// Key of the inner-parse flag in the global record.
pub const IS_INNER: &str = "isInner";

/// The parser stack: the open syntactic scopes of one parse, bottom first.
///
/// The stack also tracks the current environment, which is always the environment of the
/// topmost item, and the global record, which every item pushed during the parse shares.
#[derive(Debug)]
pub struct Stack<'factory, N: TreeNode> {
    factory: &'factory ItemFactory<N>,
    stack: Vec<Item<N>>,
    env: Rc<EnvList<N>>,
    global: Rc<RefCell<EnvList<N>>>,
    replacement_limit: usize,
}

impl<'factory, N: TreeNode> Stack<'factory, N> {
    /// Create a stack holding only the `start` item.
    ///
    /// `initial_env` becomes the start item's own environment. `inner` is recorded in the
    /// global record under [`IS_INNER`], for nested parses.
    pub fn new(
        factory: &'factory ItemFactory<N>,
        initial_env: Option<EnvList<N>>,
        inner: bool,
    ) -> Result<Self, Box<StackError>> {
        let config = StackConfig {
            inner,
            ..Default::default()
        };
        Self::with_config(factory, initial_env, &config)
    }

    pub fn with_config(
        factory: &'factory ItemFactory<N>,
        initial_env: Option<EnvList<N>>,
        config: &StackConfig,
    ) -> Result<Self, Box<StackError>> {
        let mut global = EnvList::new();
        global.set(IS_INNER, config.inner);
        let global = Rc::new(RefCell::new(global));

        let mut start = factory.create(START, Vec::new())?;
        let base = start.base_mut();
        base.global = Some(Rc::clone(&global));
        if let Some(initial_env) = initial_env {
            base.env = Some(Rc::new(initial_env));
        }
        let env = Rc::clone(base.env.get_or_insert_with(|| Rc::new(EnvList::new())));

        debug!("new parser stack (inner: {})", config.inner);
        Ok(Stack {
            factory,
            stack: vec![start],
            env,
            global,
            replacement_limit: config.replacement_limit,
        })
    }

    /// Push one entry, letting the current top decide how it merges.
    #[inline]
    pub fn push(&mut self, entry: Entry<N>) -> Result<(), Box<StackError>> {
        self.push_entry(entry, 0)
    }

    /// Push a finished node. It is wrapped into an `mml` item first.
    #[inline]
    pub fn push_node(&mut self, node: N) -> Result<(), Box<StackError>> {
        self.push_entry(Entry::Node(node), 0)
    }

    #[inline]
    pub fn push_item(&mut self, item: Item<N>) -> Result<(), Box<StackError>> {
        self.push_entry(Entry::Item(item), 0)
    }

    /// Push several entries left to right, skipping `None`.
    ///
    /// Stops at the first error; entries before it stay pushed.
    pub fn push_all<I, E>(&mut self, entries: I) -> Result<(), Box<StackError>>
    where
        I: IntoIterator<Item = E>,
        E: Into<Option<Entry<N>>>,
    {
        for entry in entries {
            if let Some(entry) = entry.into() {
                self.push_entry(entry, 0)?;
            }
        }
        Ok(())
    }

    fn push_entry(&mut self, entry: Entry<N>, depth: usize) -> Result<(), Box<StackError>> {
        if depth > self.replacement_limit {
            return Err(StackErrKind::HardLimitExceeded.into());
        }
        let mut item = match entry {
            Entry::Node(node) => self.factory.create(MML, vec![Value::Node(node)])?,
            Entry::Item(item) => item,
        };
        item.base_mut().global = Some(Rc::clone(&self.global));

        let result = match self.stack.last_mut() {
            Some(top) => top.check_item(item.as_mut())?,
            // Only reachable while a replacement is being pushed in place of the start item.
            None => CheckResult::Accept,
        };
        match result {
            CheckResult::Accept => self.accept(item),
            CheckResult::Reject => {
                trace!("{} consumed by {}", item.kind(), self.top_kind());
            }
            CheckResult::Replace(replacement) => {
                let top = self.pop()?;
                trace!("{} replaced while checking {}", top.kind(), item.kind());
                self.push_entry(replacement, depth + 1)?;
            }
            CheckResult::ReplaceMany(replacements) => {
                // Validate before popping, so a bad result leaves the stack untouched.
                if replacements.is_empty() {
                    return Err(StackErrKind::InvalidMergeResult {
                        kind: self.top_kind().into(),
                    }
                    .into());
                }
                let top = self.pop()?;
                trace!(
                    "{} replaced by {} entries while checking {}",
                    top.kind(),
                    replacements.len(),
                    item.kind()
                );
                for replacement in replacements {
                    self.push_entry(replacement, depth + 1)?;
                }
            }
        }
        Ok(())
    }

    fn accept(&mut self, mut item: Item<N>) {
        let copy_env = item.copy_env();
        let base = item.base_mut();
        match base.env.as_mut() {
            Some(own) => {
                if copy_env {
                    Rc::make_mut(own).overlay(&self.env);
                }
                self.env = Rc::clone(own);
            }
            None => base.env = Some(Rc::clone(&self.env)),
        }
        trace!("push {}", item.kind());
        self.stack.push(item);
    }

    /// Remove and return the top item.
    ///
    /// A closed item loses its environment, and the current environment falls back to the one
    /// of the new top.
    pub fn pop(&mut self) -> Result<Item<N>, Box<StackError>> {
        let Some(mut item) = self.stack.pop() else {
            return Err(StackErrKind::StackUnderflow(Operation::Pop).into());
        };
        if !item.is_open() {
            item.base_mut().env = None;
        }
        self.env = match self.stack.last().and_then(|top| top.env_handle()) {
            Some(env) => Rc::clone(env),
            None => Rc::new(EnvList::new()),
        };
        trace!("pop {}", item.kind());
        Ok(item)
    }

    /// The item `n` positions from the top; `1` is the topmost item.
    pub fn top(&self, n: usize) -> Option<&dyn StackItem<N>> {
        let idx = self.stack.len().checked_sub(n)?;
        self.stack.get(idx).map(|item| &**item)
    }

    pub fn top_mut(&mut self, n: usize) -> Option<&mut (dyn StackItem<N> + 'static)> {
        let idx = self.stack.len().checked_sub(n)?;
        self.stack.get_mut(idx).map(|item| &mut **item)
    }

    /// The most recent node of the top item.
    ///
    /// With `no_pop` the node stays in place; otherwise it is taken out of the item.
    pub fn prev(&mut self, no_pop: bool) -> Result<Option<N>, Box<StackError>> {
        let Some(top) = self.stack.last_mut() else {
            return Err(StackErrKind::StackUnderflow(Operation::Prev).into());
        };
        if no_pop {
            Ok(top.last().cloned())
        } else {
            Ok(top.pop_node())
        }
    }

    #[inline]
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    /// The current environment.
    #[inline]
    pub fn env(&self) -> &EnvList<N> {
        &self.env
    }

    #[inline]
    pub fn env_handle(&self) -> &Rc<EnvList<N>> {
        &self.env
    }

    /// Write to the current environment.
    ///
    /// The record is copied first if scopes further down still hold it, so the write is only
    /// visible until the top item is popped.
    pub fn update_env<R>(&mut self, f: impl FnOnce(&mut EnvList<N>) -> R) -> R {
        // Drop the top's handle so that a record shared only with the top is written in place.
        if let Some(top) = self.stack.last_mut() {
            top.base_mut().env = None;
        }
        let result = f(Rc::make_mut(&mut self.env));
        if let Some(top) = self.stack.last_mut() {
            top.base_mut().env = Some(Rc::clone(&self.env));
        }
        result
    }

    #[inline]
    pub fn global(&self) -> &Rc<RefCell<EnvList<N>>> {
        &self.global
    }

    pub fn is_inner(&self) -> bool {
        self.global.borrow().flag(IS_INNER)
    }

    #[inline]
    pub fn factory(&self) -> &'factory ItemFactory<N> {
        self.factory
    }

    /// Build an item with the stack's factory.
    #[inline]
    pub fn create(&self, kind: &str, args: Vec<Value<N>>) -> Result<Item<N>, Box<StackError>> {
        self.factory.create(kind, args)
    }

    /// Close the parse and return the node the start item collapsed into.
    pub fn finish(mut self) -> Result<N, Box<StackError>> {
        let stop = self.factory.create(STOP, Vec::new())?;
        self.push_entry(Entry::Item(stop), 0)?;
        if let [item] = self.stack.as_mut_slice()
            && item.is_final()
            && let Some(node) = item.take_first()
        {
            debug!("parse finished");
            return Ok(node);
        }
        let kind = self
            .stack
            .iter()
            .rev()
            .find(|item| !item.is_kind(STOP))
            .map_or(STOP, |item| item.kind());
        Err(StackErrKind::Unfinished(kind.into()).into())
    }

    fn top_kind(&self) -> &'static str {
        self.stack.last().map_or("", |top| top.kind())
    }
}

impl<N: TreeNode> fmt::Display for Stack<'_, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("stack[\n")?;
        for item in self.stack.iter() {
            writeln!(f, "  {item}")?;
        }
        f.write_str("]")
    }
}
