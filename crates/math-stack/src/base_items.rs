//! The items every parse needs: the sentinel, the end-of-input marker, brace groups, and the
//! wrapper for finished nodes.
//!
//! Everything else (fractions, arrays, `\left`/`\right`, ...) is registered by the grammar.

use crate::{
    env::Value,
    error::{CloseMismatch, StackErrKind, StackError},
    factory::ItemFactory,
    item::{
        CheckResult, Entry, Item, ItemBase, StackItem, TreeNode, default_check_item,
        default_close_error,
    },
};

pub const START: &str = "start";
pub const STOP: &str = "stop";
pub const OPEN: &str = "open";
pub const CLOSE: &str = "close";
pub const MML: &str = "mml";

pub(crate) fn register_base_items<N: TreeNode>(factory: &mut ItemFactory<N>) {
    factory.register(START, |args| {
        Ok(Box::new(StartItem {
            base: named_base(START, args)?,
        }) as Item<N>)
    });
    factory.register(STOP, |args| {
        Ok(Box::new(StopItem {
            base: named_base(STOP, args)?,
        }) as Item<N>)
    });
    factory.register(OPEN, |args| {
        Ok(Box::new(OpenItem {
            base: named_base(OPEN, args)?,
        }) as Item<N>)
    });
    factory.register(CLOSE, |args| {
        Ok(Box::new(CloseItem {
            base: named_base(CLOSE, args)?,
        }) as Item<N>)
    });
    factory.register(MML, |args| Ok(Box::new(MmlItem::new(args)?) as Item<N>));
}

/// Build a base from the optional leading name argument.
fn named_base<N>(kind: &'static str, args: Vec<Value<N>>) -> Result<ItemBase<N>, Box<StackError>> {
    let mut base = ItemBase::new();
    let mut args = args.into_iter();
    match (args.next(), args.next()) {
        (None, _) => {}
        (Some(Value::Str(name)), None) => {
            base.properties_mut().set("name", Value::Str(name));
        }
        _ => {
            return Err(StackErrKind::InvalidItemArgs {
                kind: kind.into(),
                expected: "at most one name",
            }
            .into());
        }
    }
    Ok(base)
}

/// The permanent bottom of the stack. Its content is the result of the parse.
#[derive(Debug)]
pub struct StartItem<N> {
    base: ItemBase<N>,
}

impl<N: TreeNode> StackItem<N> for StartItem<N> {
    fn base(&self) -> &ItemBase<N> {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ItemBase<N> {
        &mut self.base
    }

    fn kind(&self) -> &'static str {
        START
    }

    #[inline]
    fn is_open(&self) -> bool {
        true
    }

    fn check_item(
        &mut self,
        item: &mut dyn StackItem<N>,
    ) -> Result<CheckResult<N>, Box<StackError>> {
        if item.is_kind(STOP) {
            return Ok(CheckResult::Replace(Entry::Node(self.to_node(false))));
        }
        default_check_item(self, item)
    }
}

/// Marks the end of the input.
#[derive(Debug)]
pub struct StopItem<N> {
    base: ItemBase<N>,
}

impl<N: TreeNode> StackItem<N> for StopItem<N> {
    fn base(&self) -> &ItemBase<N> {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ItemBase<N> {
        &mut self.base
    }

    fn kind(&self) -> &'static str {
        STOP
    }

    #[inline]
    fn is_close(&self) -> bool {
        true
    }
}

/// A brace group, `{ ... }`.
#[derive(Debug)]
pub struct OpenItem<N> {
    base: ItemBase<N>,
}

impl<N: TreeNode> StackItem<N> for OpenItem<N> {
    fn base(&self) -> &ItemBase<N> {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ItemBase<N> {
        &mut self.base
    }

    fn kind(&self) -> &'static str {
        OPEN
    }

    #[inline]
    fn is_open(&self) -> bool {
        true
    }

    fn close_error(&self, closing: &str) -> Option<CloseMismatch> {
        if closing == STOP {
            return Some(CloseMismatch::ExtraOpenMissingClose);
        }
        default_close_error(closing)
    }

    fn check_item(
        &mut self,
        item: &mut dyn StackItem<N>,
    ) -> Result<CheckResult<N>, Box<StackError>> {
        if item.is_kind(CLOSE) {
            let node = N::group(self.to_node(true));
            return Ok(CheckResult::Replace(Entry::Node(node)));
        }
        default_check_item(self, item)
    }
}

/// A closing brace, `}`.
#[derive(Debug)]
pub struct CloseItem<N> {
    base: ItemBase<N>,
}

impl<N: TreeNode> StackItem<N> for CloseItem<N> {
    fn base(&self) -> &ItemBase<N> {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ItemBase<N> {
        &mut self.base
    }

    fn kind(&self) -> &'static str {
        CLOSE
    }

    #[inline]
    fn is_close(&self) -> bool {
        true
    }
}

/// A finished node on its way into the item below.
#[derive(Debug)]
pub struct MmlItem<N> {
    base: ItemBase<N>,
}

impl<N> MmlItem<N> {
    fn new(args: Vec<Value<N>>) -> Result<Self, Box<StackError>> {
        let mut args = args.into_iter();
        match (args.next(), args.next()) {
            (Some(Value::Node(node)), None) => Ok(MmlItem {
                base: ItemBase::with_nodes(vec![node]),
            }),
            _ => Err(StackErrKind::InvalidItemArgs {
                kind: MML.into(),
                expected: "exactly one node",
            }
            .into()),
        }
    }
}

impl<N: TreeNode> StackItem<N> for MmlItem<N> {
    fn base(&self) -> &ItemBase<N> {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ItemBase<N> {
        &mut self.base
    }

    fn kind(&self) -> &'static str {
        MML
    }

    #[inline]
    fn is_final(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::EnvList;

    #[derive(Debug, Clone, PartialEq)]
    enum Node {
        Leaf(&'static str),
        Row(Vec<Node>),
    }

    impl TreeNode for Node {
        fn row(children: Vec<Self>) -> Self {
            Node::Row(children)
        }
    }

    fn factory() -> ItemFactory<Node> {
        ItemFactory::with_base_items()
    }

    #[test]
    fn open_collapses_on_close() {
        let factory = factory();
        let mut open = factory.create(OPEN, vec![]).unwrap();
        open.push_node(Node::Leaf("a"));
        let mut close = factory.create(CLOSE, vec![]).unwrap();
        let Ok(CheckResult::Replace(Entry::Node(node))) = open.check_item(close.as_mut()) else {
            panic!("expected a replacement node");
        };
        assert_eq!(node, Node::Row(vec![Node::Row(vec![Node::Leaf("a")])]));
    }

    #[test]
    fn start_rejects_close() {
        let factory = factory();
        let mut start = factory.create(START, vec![]).unwrap();
        let mut close = factory.create(CLOSE, vec![]).unwrap();
        let err = start.check_item(close.as_mut()).unwrap_err();
        assert_eq!(err.id(), "ExtraCloseMissingOpen");
    }

    #[test]
    fn open_rejects_stop() {
        let factory = factory();
        let mut open = factory.create(OPEN, vec![]).unwrap();
        let mut stop = factory.create(STOP, vec![]).unwrap();
        let err = open.check_item(stop.as_mut()).unwrap_err();
        assert_eq!(err.id(), "ExtraOpenMissingClose");
    }

    #[test]
    fn mml_needs_exactly_one_node() {
        let factory = factory();
        assert!(factory.create(MML, vec![]).is_err());
        assert!(
            factory
                .create(MML, vec![Value::Str("x".into())])
                .is_err()
        );
        let mml = factory
            .create(MML, vec![Value::Node(Node::Leaf("x"))])
            .unwrap();
        assert!(mml.is_final());
        assert_eq!(mml.nodes(), &[Node::Leaf("x")]);
    }

    #[test]
    fn names_come_from_the_first_argument() {
        let factory = factory();
        let close = factory.create(CLOSE, vec![Value::Str("}".into())]).unwrap();
        assert_eq!(&*close.name(), "}");
        let open = factory.create(OPEN, vec![]).unwrap();
        assert_eq!(&*open.name(), "open");
        let err = factory
            .create(OPEN, vec![Value::Record(EnvList::new())])
            .unwrap_err();
        assert_eq!(err.id(), "InvalidItemArgs");
    }

    #[derive(Debug)]
    struct Over(ItemBase<Node>);

    impl StackItem<Node> for Over {
        fn base(&self) -> &ItemBase<Node> {
            &self.0
        }

        fn base_mut(&mut self) -> &mut ItemBase<Node> {
            &mut self.0
        }

        fn kind(&self) -> &'static str {
            "over"
        }
    }

    #[test]
    fn over_takes_the_numerator() {
        let factory = factory();
        let mut open = factory.create(OPEN, vec![]).unwrap();
        open.push_node(Node::Leaf("a"));
        open.push_node(Node::Leaf("b"));
        let mut over = Over(ItemBase::new());
        let result = open.check_item(&mut over).unwrap();
        assert!(matches!(result, CheckResult::Accept));
        assert!(open.nodes().is_empty());
        assert_eq!(
            over.property("num"),
            Some(&Value::Node(Node::Row(vec![Node::Leaf("a"), Node::Leaf("b")])))
        );
    }
}
