//! Builds a [`Schema`] from the scanner's event stream.
//!
//! Values are assembled on a stack of open objects and arrays. Annotations
//! attach to whatever value they follow on the same line: the last completed
//! child, or the container that was just opened. A new line clears the target.
use std::sync::Arc;

use indexmap::IndexMap;
use tracing::{debug, trace};

use crate::error::{Error, ErrorCode, Result};
use crate::lexeme::{LexEvent, LexEventKind};
use crate::node::{Node, Property};
use crate::scanner::{ScanOptions, Scanner};
use crate::schema::{Schema, Type};
use crate::source::{File, unquote};

mod allof;
mod enums;
mod rules;
mod shortcut;
mod unnamed;

pub(crate) use allof::compile_all_of;
pub(crate) use enums::{load_enum, resolve_enum_rules};
pub(crate) use unnamed::add_unnamed_types;

use rules::{Annotation, RuleBuilder};

/// What the next annotation describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    None,
    /// The innermost open container.
    Top,
    /// The most recently completed child of the innermost container.
    LastChild,
    Root,
}

struct PendingKey {
    name: String,
    event: LexEvent,
    is_shortcut: bool,
}

enum Frame {
    Object { node: Node, key: Option<PendingKey> },
    Array { node: Node },
}

impl Frame {
    fn node_mut(&mut self) -> &mut Node {
        match self {
            Frame::Object { node, .. } | Frame::Array { node } => node,
        }
    }
}

/// Loads `file` into a schema tree. Unnamed types created for `or` members
/// are named `{prefix}#{n}`.
pub fn load(file: Arc<File>, prefix: &str) -> Result<Schema> {
    debug!(file = file.name(), "loading schema");
    let loader = Loader {
        scanner: Scanner::new(file.clone(), ScanOptions::default()),
        file,
        prefix: prefix.to_string(),
        frames: Vec::new(),
        root: None,
        target: Target::None,
        annotation: None,
        types: IndexMap::new(),
    };
    let schema = loader.run()?;
    debug!(unnamed_types = schema.types.len(), "schema loaded");
    Ok(schema)
}

pub(crate) struct Loader {
    scanner: Scanner,
    file: Arc<File>,
    prefix: String,
    frames: Vec<Frame>,
    root: Option<Node>,
    target: Target,
    annotation: Option<RuleBuilder>,
    types: IndexMap<String, Type>,
}

impl Loader {
    fn run(mut self) -> Result<Schema> {
        while let Some(event) = self.scanner.next()? {
            if let Some(builder) = self.annotation.as_mut() {
                if let Some(annotation) = builder.feed(&event)? {
                    self.annotation = None;
                    self.apply_annotation(annotation)?;
                }
                continue;
            }
            self.feed(event)?;
        }
        let root = self.root.ok_or_else(|| Error::new(ErrorCode::EmptySchema, "the schema is empty"))?;
        let mut schema = Schema::new(root);
        schema.types = self.types;
        Ok(schema)
    }

    fn feed(&mut self, event: LexEvent) -> Result<()> {
        trace!(?event, "load");
        match event.kind() {
            LexEventKind::ObjectBegin => {
                self.frames.push(Frame::Object { node: Node::object(event), key: None });
                self.target = Target::Top;
            }
            LexEventKind::ArrayBegin => {
                self.frames.push(Frame::Array { node: Node::array(event) });
                self.target = Target::Top;
            }
            LexEventKind::ObjectEnd | LexEventKind::ArrayEnd => {
                let mut node = match self.frames.pop() {
                    Some(Frame::Object { node, .. } | Frame::Array { node }) => node,
                    None => return Err(Error::internal("container closed twice").at(&event)),
                };
                // the basis of a container spans its whole text
                node.base_mut().basis = event;
                self.attach(node)?;
            }
            LexEventKind::KeyShortcutEnd => {
                if let Some(Frame::Object { key, .. }) = self.frames.last_mut() {
                    *key = Some(PendingKey { name: event.text(), event, is_shortcut: true });
                }
            }
            LexEventKind::ObjectKeyEnd => {
                if let Some(Frame::Object { key, .. }) = self.frames.last_mut() {
                    if key.is_none() {
                        let name = unquote(event.value()).map_err(|e| e.at(&event))?;
                        *key = Some(PendingKey { name, event, is_shortcut: false });
                    }
                }
            }
            LexEventKind::LiteralEnd => self.attach(Node::literal(event))?,
            LexEventKind::MixedValueEnd => {
                let names = shortcut::parse_names(&event)?;
                let mut node = Node::mixed_value(event.clone(), names.clone());
                for (constraint, source) in shortcut::constraints(&event, names) {
                    node.base_mut().constraints.insert(constraint, source)?;
                }
                self.attach(node)?;
            }
            LexEventKind::InlineAnnotationBegin | LexEventKind::MultiLineAnnotationBegin => {
                self.annotation = Some(RuleBuilder::new(event));
            }
            LexEventKind::NewLine => self.target = Target::None,
            _ => {}
        }
        Ok(())
    }

    /// Places a completed value into its parent, or makes it the root.
    fn attach(&mut self, node: Node) -> Result<()> {
        match self.frames.last_mut() {
            None => {
                self.root = Some(node);
                self.target = Target::Root;
            }
            Some(Frame::Array { node: parent }) => {
                if let Node::Array(array) = parent {
                    array.items.push(node);
                }
                self.target = Target::LastChild;
            }
            Some(Frame::Object { node: parent, key }) => {
                let Some(key) = key.take() else {
                    return Err(Error::internal("object value without a key").at(node.basis()));
                };
                if let Node::Object(object) = parent {
                    if object.properties.contains_key(&key.name) {
                        return Err(Error::new(ErrorCode::DuplicateKey, format!("duplicate key \"{}\"", key.name))
                            .at(&key.event));
                    }
                    let property = Property { key_event: key.event, is_shortcut: key.is_shortcut, inherited: false, node };
                    object.properties.insert(key.name, property);
                }
                self.target = Target::LastChild;
            }
        }
        Ok(())
    }

    fn target_node(&mut self, target: Target) -> Option<&mut Node> {
        match target {
            Target::None => None,
            Target::Root => self.root.as_mut(),
            Target::Top => self.frames.last_mut().map(Frame::node_mut),
            Target::LastChild => match self.frames.last_mut()?.node_mut() {
                Node::Object(object) => object.properties.last_mut().map(|(_, p)| &mut p.node),
                Node::Array(array) => array.items.last_mut(),
                _ => None,
            },
        }
    }

    fn apply_annotation(&mut self, annotation: Annotation) -> Result<()> {
        let Annotation { begin, rules, comment } = annotation;
        if rules.is_none() && comment.is_none() {
            return Ok(());
        }
        if self.target == Target::None {
            if rules.is_some() {
                return Err(Error::new(ErrorCode::AnnotationWithoutValue, "the annotation does not follow a value")
                    .at(&begin));
            }
            // a free-standing comment
            return Ok(());
        }

        let built = match &rules {
            Some(object) => self.build_rules(object)?,
            None => Vec::new(),
        };
        let target = self.target;
        let node = self
            .target_node(target)
            .ok_or_else(|| Error::internal("annotation target vanished").at(&begin))?;
        if node.base().annotated {
            return Err(Error::new(ErrorCode::DuplicateAnnotation, "the value already has an annotation").at(&begin));
        }
        node.base_mut().annotated = true;
        node.base_mut().comment = comment;
        rules::apply(node, built)
    }

    /// Registers an unnamed type and returns its name.
    fn register_unnamed(&mut self, node: Node, begin: usize) -> String {
        let name = format!("{}#{}", self.prefix, self.types.len() + 1);
        trace!(name = name.as_str(), "unnamed type");
        self.types.insert(name.clone(), Type::new(Schema::new(node), self.file.clone(), begin));
        name
    }
}
