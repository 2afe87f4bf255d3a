//! Drive the stack with a toy grammar and print each intermediate stack.
//!
//! Run with `RUST_LOG=trace` to see every merge decision.

use math_stack::{ItemFactory, Stack, StackError, TreeNode, Value};

#[derive(Debug, Clone)]
enum Node {
    Char(char),
    Row(Vec<Node>),
}

impl TreeNode for Node {
    fn row(children: Vec<Self>) -> Self {
        Node::Row(children)
    }
}

fn parse(input: &str, factory: &ItemFactory<Node>) -> Result<Node, Box<StackError>> {
    let mut stack = Stack::new(factory, None, false)?;
    for c in input.chars() {
        match c {
            '{' => {
                let open = stack.create("open", vec![])?;
                stack.push_item(open)?;
            }
            '}' => {
                let close = stack.create("close", vec![Value::Str("}".into())])?;
                stack.push_item(close)?;
            }
            c if c.is_whitespace() => continue,
            c => stack.push_node(Node::Char(c))?,
        }
        println!("after {c:?}: {stack}");
    }
    stack.finish()
}

fn main() {
    env_logger::init();

    let inputs = vec!["x", "a{b}c", "{{x}y}", "{x", "x}"];
    let factory = ItemFactory::with_base_items();
    for input in inputs {
        println!("== {input}");
        match parse(input, &factory) {
            Ok(node) => println!("{node:?}"),
            Err(err) => println!("error: {err}"),
        }
    }
}
