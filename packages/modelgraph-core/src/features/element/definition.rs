//! Definition phase
//!
//! An [`ElementDef`] is the compile-phase object for one schema node. It is
//! created once and updated on every reparse, keeping its [`Identity`].
//! Update order:
//! 1. refresh attributes and position from the node
//! 2. synchronize the add-on list (registry order, dependencies first)
//! 3. add-on pre-updates, then add-on updates
//! 4. the element kind's own update
//! 5. child definitions, reconciled by node type and `name` attribute
//! 6. the kind's post-update, then add-on post-updates

use indexmap::IndexMap;
use std::any::Any;
use std::convert::Infallible;
use std::fmt;
use tracing::debug;

use super::interpretation::KindInterp;
use super::session::CompileSession;
use crate::errors::{CompileError, CompileResult};
use crate::features::addons::{AddOnDef, AddOnSet};
use crate::features::reconciliation::{synchronize, SyncHandler, SyncStats};
use crate::shared::models::{FilePosition, Identity, SchemaNode};

/// Node data every element kind reads
#[derive(Debug, Clone)]
pub struct DefCore {
    pub identity: Identity,
    pub type_name: String,
    pub position: FilePosition,
    attributes: IndexMap<String, (String, Option<FilePosition>)>,
    text: Option<(String, Option<FilePosition>)>,
}

impl DefCore {
    fn new(identity: Identity, node: &dyn SchemaNode) -> Self {
        let mut core = Self {
            identity,
            type_name: node.type_name().to_string(),
            position: node.position(),
            attributes: IndexMap::new(),
            text: None,
        };
        core.refresh(node);
        core
    }

    fn refresh(&mut self, node: &dyn SchemaNode) {
        self.type_name = node.type_name().to_string();
        self.position = node.position();
        self.attributes = node
            .attribute_names()
            .into_iter()
            .filter_map(|name| {
                let value = node.attribute(name)?.to_string();
                Some((name.to_string(), (value, node.attribute_position(name))))
            })
            .collect();
        self.text = node
            .value()
            .map(|text| (text.to_string(), node.value_position()));
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(|(v, _)| v.as_str())
    }

    /// Position of an attribute value, or of the element
    pub fn attribute_position(&self, name: &str) -> FilePosition {
        self.attributes
            .get(name)
            .and_then(|(_, pos)| pos.clone())
            .unwrap_or_else(|| self.position.clone())
    }

    pub fn require_attribute(&self, name: &str) -> CompileResult<&str> {
        self.attribute(name).ok_or_else(|| {
            CompileError::new(format!("'{}' requires a '{}' attribute", self.type_name, name))
                .at(self.position.clone(), self.type_name.len())
        })
    }

    pub fn bool_attribute(&self, name: &str, default: bool) -> CompileResult<bool> {
        match self.attribute(name) {
            None => Ok(default),
            Some("true") => Ok(true),
            Some("false") => Ok(false),
            Some(other) => Err(CompileError::new(format!(
                "Attribute '{}' must be true or false, not '{}'",
                name, other
            ))
            .at(self.attribute_position(name), other.len())),
        }
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_ref().map(|(t, _)| t.as_str())
    }

    pub fn text_position(&self) -> FilePosition {
        self.text
            .as_ref()
            .and_then(|(_, pos)| pos.clone())
            .unwrap_or_else(|| self.position.clone())
    }

    /// `type 'name'` or just the type, for messages
    pub fn label(&self) -> String {
        match self.attribute("name") {
            Some(name) => format!("{} '{}'", self.type_name, name),
            None => self.type_name.clone(),
        }
    }
}

/// Element-kind logic of the definition phase
pub trait KindDef: fmt::Debug + 'static {
    fn update(
        &mut self,
        core: &DefCore,
        node: &dyn SchemaNode,
        add_ons: &mut AddOnSet<dyn AddOnDef>,
        session: &mut CompileSession,
    ) -> CompileResult<()>;

    /// Runs after the children are updated
    fn post_update(
        &mut self,
        _core: &DefCore,
        _add_ons: &mut AddOnSet<dyn AddOnDef>,
        _children: &mut [ElementDef],
        _session: &mut CompileSession,
    ) -> CompileResult<()> {
        Ok(())
    }

    fn interpret(&self) -> Box<dyn KindInterp>;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

#[derive(Debug)]
pub struct ElementDef {
    core: DefCore,
    kind: Box<dyn KindDef>,
    add_ons: AddOnSet<dyn AddOnDef>,
    children: Vec<ElementDef>,
    last_sync: SyncStats,
}

impl ElementDef {
    /// New definition for `node` with a fresh identity; call [`update`](Self::update) next
    pub fn create(node: &dyn SchemaNode, session: &mut CompileSession) -> CompileResult<Self> {
        let kind = session.registry().create_kind(node.type_name()).map_err(|err| {
            err.at(node.position(), node.type_name().len())
        })?;
        Ok(Self {
            core: DefCore::new(Identity::fresh(), node),
            kind,
            add_ons: AddOnSet::new(),
            children: Vec::new(),
            last_sync: SyncStats::default(),
        })
    }

    pub fn identity(&self) -> Identity {
        self.core.identity
    }

    pub fn type_name(&self) -> &str {
        &self.core.type_name
    }

    pub fn name(&self) -> Option<&str> {
        self.core.attribute("name")
    }

    pub fn core(&self) -> &DefCore {
        &self.core
    }

    pub fn kind(&self) -> &dyn KindDef {
        self.kind.as_ref()
    }

    pub fn kind_as<K: 'static>(&self) -> Option<&K> {
        self.kind.as_any().downcast_ref::<K>()
    }

    pub fn kind_as_mut<K: 'static>(&mut self) -> Option<&mut K> {
        self.kind.as_any_mut().downcast_mut::<K>()
    }

    pub fn add_ons(&self) -> &AddOnSet<dyn AddOnDef> {
        &self.add_ons
    }

    pub fn children(&self) -> &[ElementDef] {
        &self.children
    }

    /// Child reconciliation counts of the last update
    pub fn last_sync(&self) -> SyncStats {
        self.last_sync
    }

    /// Structural key used when reparsing: same node type and `name`
    pub fn matches_node(&self, node: &dyn SchemaNode) -> bool {
        self.core.type_name == node.type_name() && self.name() == node.attribute("name")
    }

    /// Depth-first search by identity
    pub fn find(&self, identity: Identity) -> Option<&ElementDef> {
        if self.identity() == identity {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(identity))
    }

    pub fn update(&mut self, node: &dyn SchemaNode, session: &mut CompileSession) -> CompileResult<()> {
        session.enter(&self.core.label(), &self.core.position)?;
        let frames = session.frame_depth();
        let result = self.update_inner(node, session);
        if result.is_err() {
            session.truncate_frames(frames);
        }
        session.exit();
        result
    }

    fn update_inner(&mut self, node: &dyn SchemaNode, session: &mut CompileSession) -> CompileResult<()> {
        self.core.refresh(node);
        debug!(element = %session.element_path(), identity = %self.core.identity, "definition: update");

        self.sync_add_ons(node, session)?;
        for add_on in self.add_ons.iter_mut() {
            add_on.pre_update(&self.core, node, session)?;
        }
        for add_on in self.add_ons.iter_mut() {
            add_on.update(&self.core, node, session)?;
        }

        self.kind.update(&self.core, node, &mut self.add_ons, session)?;

        let nodes = node.children();
        let mut handler = DefinitionSync { session: &mut *session };
        self.last_sync = match synchronize(&mut self.children, &nodes, |d, n| d.matches_node(n), &mut handler) {
            Ok(stats) => stats,
            Err(never) => match never {},
        };

        self.kind
            .post_update(&self.core, &mut self.add_ons, &mut self.children, session)?;
        for add_on in self.add_ons.iter_mut() {
            add_on.post_update(&self.core, node, session)?;
        }
        Ok(())
    }

    fn sync_add_ons(&mut self, node: &dyn SchemaNode, session: &mut CompileSession) -> CompileResult<()> {
        let registry = session.registry().clone();
        let names = registry
            .add_ons_for(&self.core.type_name, &node.add_ons())
            .map_err(|err| err.at(self.core.position.clone(), 0))?;
        let wanted: Vec<&str> = names.iter().map(String::as_str).collect();

        struct AddOnSync<'a> {
            registry: &'a super::ElementRegistry,
        }
        impl SyncHandler<Box<dyn AddOnDef>, str> for AddOnSync<'_> {
            type Error = CompileError;

            fn left_only(&mut self, left: Box<dyn AddOnDef>) -> CompileResult<()> {
                debug!(add_on = left.add_on_name(), "definition: add-on removed");
                Ok(())
            }

            fn right_only(&mut self, name: &str, _index: usize) -> CompileResult<Option<Box<dyn AddOnDef>>> {
                self.registry.create_add_on(name).map(Some)
            }

            fn common(&mut self, _left: &mut Box<dyn AddOnDef>, _name: &str, _index: usize) -> CompileResult<()> {
                Ok(())
            }
        }

        synchronize(
            self.add_ons.items_mut(),
            &wanted,
            |a, name| a.add_on_name() == name,
            &mut AddOnSync { registry: &registry },
        )?;
        Ok(())
    }
}

/// Reconciles child definitions against child nodes. Failures are reported to
/// the session and the failing child is skipped, so siblings still compile.
pub(crate) struct DefinitionSync<'a> {
    pub(crate) session: &'a mut CompileSession,
}

impl<'n> SyncHandler<ElementDef, dyn SchemaNode + 'n> for DefinitionSync<'_> {
    type Error = Infallible;

    fn left_only(&mut self, left: ElementDef) -> Result<(), Infallible> {
        debug!(identity = %left.identity(), "definition: removed");
        Ok(())
    }

    fn right_only(&mut self, node: &(dyn SchemaNode + 'n), _index: usize) -> Result<Option<ElementDef>, Infallible> {
        let created = ElementDef::create(node, self.session).and_then(|mut def| {
            def.update(node, self.session)?;
            Ok(def)
        });
        match created {
            Ok(def) => Ok(Some(def)),
            Err(err) => {
                self.session.report(err);
                Ok(None)
            }
        }
    }

    fn common(&mut self, left: &mut ElementDef, node: &(dyn SchemaNode + 'n), _index: usize) -> Result<(), Infallible> {
        if let Err(err) = left.update(node, self.session) {
            self.session.report(err);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BuildConfig;
    use crate::features::element::ElementRegistry;
    use crate::features::expression::DefaultExpressionParser;
    use crate::features::placeholder::DeclarationCache;
    use crate::shared::models::ConfigNode;
    use std::sync::Arc;

    fn session() -> CompileSession {
        CompileSession::new(
            Arc::new(ElementRegistry::standard()),
            Arc::new(BuildConfig::default()),
            Arc::new(DefaultExpressionParser),
            Arc::new(DeclarationCache::new()),
        )
    }

    fn document(names: &[&str]) -> ConfigNode {
        names.iter().fold(ConfigNode::new("models"), |root, name| {
            root.child(ConfigNode::new("value").attr("name", *name).attr("type", "int").text("1"))
        })
    }

    #[test]
    fn test_children_follow_reordered_nodes() {
        let mut session = session();
        let first = document(&["a", "b"]);
        let mut def = ElementDef::create(&first, &mut session).unwrap();
        def.update(&first, &mut session).unwrap();
        let a = def.children()[0].identity();
        let b = def.children()[1].identity();

        let second = document(&["b", "c", "a"]);
        def.update(&second, &mut session).unwrap();
        assert!(!session.has_errors());

        let names: Vec<_> = def.children().iter().map(|c| c.name().unwrap_or_default()).collect();
        assert_eq!(names, vec!["b", "c", "a"]);
        assert_eq!(def.children()[0].identity(), b);
        assert_eq!(def.children()[2].identity(), a);
        assert_eq!(
            def.last_sync(),
            SyncStats {
                created: 1,
                updated: 2,
                destroyed: 0
            }
        );
    }
}
