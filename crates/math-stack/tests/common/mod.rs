#![allow(dead_code)]

use std::fmt;

use math_stack::{CheckResult, EnvList, Item, ItemBase, StackItem, TreeNode, default_check_item};

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Char(char),
    Row(Vec<Node>),
}

impl TreeNode for Node {
    fn row(children: Vec<Self>) -> Self {
        Node::Row(children)
    }
}

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

type Rule = Box<dyn FnMut(&mut dyn StackItem<Node>) -> Option<CheckResult<Node>>>;

/// An item whose merge check can be scripted per test.
///
/// When the rule returns `None`, the default merge check runs.
pub struct Probe {
    base: ItemBase<Node>,
    kind: &'static str,
    open: bool,
    close: bool,
    copy_env: bool,
    rule: Option<Rule>,
}

pub fn probe(kind: &'static str) -> Probe {
    Probe {
        base: ItemBase::new(),
        kind,
        open: true,
        close: false,
        copy_env: true,
        rule: None,
    }
}

impl Probe {
    pub fn closed(mut self) -> Self {
        self.open = false;
        self
    }

    pub fn closing(mut self) -> Self {
        self.open = false;
        self.close = true;
        self
    }

    pub fn without_env_copy(mut self) -> Self {
        self.copy_env = false;
        self
    }

    pub fn with_env(mut self, env: EnvList<Node>) -> Self {
        self.base = ItemBase::with_env(env);
        self
    }

    pub fn with_rule<F>(mut self, rule: F) -> Self
    where
        F: FnMut(&mut dyn StackItem<Node>) -> Option<CheckResult<Node>> + 'static,
    {
        self.rule = Some(Box::new(rule));
        self
    }

    pub fn boxed(self) -> Item<Node> {
        Box::new(self)
    }
}

impl fmt::Debug for Probe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Probe")
            .field("kind", &self.kind)
            .field("base", &self.base)
            .finish()
    }
}

impl StackItem<Node> for Probe {
    fn base(&self) -> &ItemBase<Node> {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ItemBase<Node> {
        &mut self.base
    }

    fn kind(&self) -> &'static str {
        self.kind
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn is_close(&self) -> bool {
        self.close
    }

    fn copy_env(&self) -> bool {
        self.copy_env
    }

    fn check_item(
        &mut self,
        item: &mut dyn StackItem<Node>,
    ) -> Result<CheckResult<Node>, Box<math_stack::StackError>> {
        if let Some(rule) = self.rule.as_mut()
            && let Some(result) = rule(&mut *item)
        {
            return Ok(result);
        }
        default_check_item(self, item)
    }
}
