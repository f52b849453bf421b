//! Class registry and message dispatch.
//!
//! Each class owns a local dispatch table mapping selectors to
//! implementations. The table starts empty and only gains an entry when this
//! class (not an ancestor) provides one, so "implemented directly" and
//! "merely inherited" stay distinguishable. Resolution consults the local
//! table first, then walks the superclass chain.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use log::debug;

use crate::error::{Result, SwizzleError};
use crate::selector::{Selector, SelectorTable};
use crate::types::{Imp, Value};

/// Index of a class in its runtime's registry.
///
/// Classes are defined once and never destroyed, so an id obtained from
/// [`Runtime::define_class`] stays valid for the runtime's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClassId(pub(crate) usize);

pub(crate) struct ClassDef {
    pub(crate) name: String,
    pub(crate) superclass: Option<ClassId>,
    pub(crate) methods: RwLock<HashMap<Selector, Imp>>,
}

/// An instance of a registered class.
///
/// Carries no state beyond its class; dispatch goes through the runtime that
/// defined the class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Object {
    class: ClassId,
}

impl Object {
    pub fn class(&self) -> ClassId {
        self.class
    }
}

/// Owns the class registry and the selector intern table.
///
/// An ordinary constructed value rather than a process-wide singleton, so
/// independent runtimes (and independent tests) do not interfere.
pub struct Runtime {
    classes: RwLock<Vec<Arc<ClassDef>>>,
    names: RwLock<HashMap<String, ClassId>>,
    selectors: Mutex<SelectorTable>,
}

impl Runtime {
    pub fn new() -> Self {
        Runtime {
            classes: RwLock::new(Vec::new()),
            names: RwLock::new(HashMap::new()),
            selectors: Mutex::new(SelectorTable::default()),
        }
    }

    /// Intern `name`, returning the selector identifying it in this runtime.
    pub fn selector(&self, name: &str) -> Selector {
        self.selectors
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .intern(name)
    }

    pub(crate) fn selector_name(&self, sel: Selector) -> String {
        self.selectors
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .name(sel)
            .unwrap_or("<unknown selector>")
            .to_string()
    }

    /// Reject selectors this runtime never interned; ids from another
    /// runtime would otherwise resolve to an unrelated name.
    pub(crate) fn check_selector(&self, sel: Selector) -> Result<()> {
        if self
            .selectors
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(sel)
        {
            Ok(())
        } else {
            Err(SwizzleError::ForeignSelector(sel.0))
        }
    }

    /// Register a class. The superclass, if any, must already be defined,
    /// which also rules out cycles in the ancestor chain.
    pub fn define_class(&self, name: &str, superclass: Option<ClassId>) -> Result<ClassId> {
        if let Some(sup) = superclass {
            self.class(sup)?;
        }
        let mut names = self.names.write().unwrap_or_else(|e| e.into_inner());
        if names.contains_key(name) {
            return Err(SwizzleError::DuplicateClass(name.to_string()));
        }
        let mut classes = self.classes.write().unwrap_or_else(|e| e.into_inner());
        let id = ClassId(classes.len());
        classes.push(Arc::new(ClassDef {
            name: name.to_string(),
            superclass,
            methods: RwLock::new(HashMap::new()),
        }));
        names.insert(name.to_string(), id);
        debug!("defined class '{name}' as {id:?} (superclass {superclass:?})");
        Ok(id)
    }

    /// Look up a previously defined class by name.
    pub fn class_named(&self, name: &str) -> Option<ClassId> {
        self.names
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(name)
            .copied()
    }

    pub(crate) fn class(&self, id: ClassId) -> Result<Arc<ClassDef>> {
        self.classes
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(id.0)
            .cloned()
            .ok_or(SwizzleError::UndefinedClass(id.0))
    }

    /// Install `imp` as the local dispatch-table entry for `selector` on
    /// `class`. Redefining an existing local entry replaces it.
    pub fn define_method<F>(&self, class: ClassId, selector: Selector, imp: F) -> Result<()>
    where
        F: Fn(&Object, &[Value]) -> Value + Send + Sync + 'static,
    {
        let def = self.class(class)?;
        self.check_selector(selector)?;
        def.methods
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(selector, Arc::new(imp));
        debug!(
            "defined method '{}' on '{}'",
            self.selector_name(selector),
            def.name
        );
        Ok(())
    }

    /// Resolve `selector` starting at `class`, walking the ancestor chain.
    pub(crate) fn resolve(&self, class: ClassId, selector: Selector) -> Result<Option<Imp>> {
        let mut cursor = Some(class);
        while let Some(id) = cursor {
            let def = self.class(id)?;
            let found = def
                .methods
                .read()
                .unwrap_or_else(|e| e.into_inner())
                .get(&selector)
                .cloned();
            if found.is_some() {
                return Ok(found);
            }
            cursor = def.superclass;
        }
        Ok(None)
    }

    /// Whether `selector` resolves to an implementation from `class`,
    /// directly or via inheritance.
    pub fn responds_to(&self, class: ClassId, selector: Selector) -> Result<bool> {
        Ok(self.resolve(class, selector)?.is_some())
    }

    pub fn instantiate(&self, class: ClassId) -> Result<Object> {
        self.class(class)?;
        Ok(Object { class })
    }

    /// Dispatch `selector` to `receiver` with `args`.
    pub fn send(&self, receiver: &Object, selector: Selector, args: &[Value]) -> Result<Value> {
        self.check_selector(selector)?;
        match self.resolve(receiver.class, selector)? {
            Some(imp) => Ok(imp(receiver, args)),
            None => Err(SwizzleError::UnboundSelector {
                class: self.class(receiver.class)?.name.clone(),
                selector: self.selector_name(selector),
            }),
        }
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Runtime::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatch_hits_local_method() {
        let rt = Runtime::new();
        let animal = rt.define_class("Animal", None).unwrap();
        let speak = rt.selector("speak");
        rt.define_method(animal, speak, |_recv, _args| Value::from("A"))
            .unwrap();

        let pet = rt.instantiate(animal).unwrap();
        assert_eq!(rt.send(&pet, speak, &[]).unwrap(), Value::from("A"));
    }

    #[test]
    fn dispatch_walks_the_ancestor_chain() {
        let rt = Runtime::new();
        let base = rt.define_class("Base", None).unwrap();
        let mid = rt.define_class("Mid", Some(base)).unwrap();
        let leaf = rt.define_class("Leaf", Some(mid)).unwrap();
        let speak = rt.selector("speak");
        rt.define_method(base, speak, |_recv, _args| Value::from("base"))
            .unwrap();

        let obj = rt.instantiate(leaf).unwrap();
        assert_eq!(rt.send(&obj, speak, &[]).unwrap(), Value::from("base"));
    }

    #[test]
    fn local_entry_shadows_inherited_one() {
        let rt = Runtime::new();
        let base = rt.define_class("Base", None).unwrap();
        let leaf = rt.define_class("Leaf", Some(base)).unwrap();
        let speak = rt.selector("speak");
        rt.define_method(base, speak, |_recv, _args| Value::from("base"))
            .unwrap();
        rt.define_method(leaf, speak, |_recv, _args| Value::from("leaf"))
            .unwrap();

        let obj = rt.instantiate(leaf).unwrap();
        assert_eq!(rt.send(&obj, speak, &[]).unwrap(), Value::from("leaf"));

        // The base class is unaffected by the override.
        let parent = rt.instantiate(base).unwrap();
        assert_eq!(rt.send(&parent, speak, &[]).unwrap(), Value::from("base"));
    }

    #[test]
    fn implementations_see_receiver_and_arguments() {
        let rt = Runtime::new();
        let calc = rt.define_class("Calc", None).unwrap();
        let add = rt.selector("add");
        rt.define_method(calc, add, move |recv, args| {
            assert_eq!(recv.class(), calc);
            let sum: i64 = args.iter().filter_map(Value::as_int).sum();
            Value::from(sum)
        })
        .unwrap();

        let obj = rt.instantiate(calc).unwrap();
        let out = rt
            .send(&obj, add, &[Value::from(2), Value::from(40)])
            .unwrap();
        assert_eq!(out, Value::from(42));
    }

    #[test]
    fn unbound_selector_is_an_error_not_a_panic() {
        let rt = Runtime::new();
        let animal = rt.define_class("Animal", None).unwrap();
        let fly = rt.selector("fly");

        let pet = rt.instantiate(animal).unwrap();
        assert_eq!(
            rt.send(&pet, fly, &[]),
            Err(SwizzleError::UnboundSelector {
                class: "Animal".to_string(),
                selector: "fly".to_string(),
            })
        );
    }

    #[test]
    fn duplicate_class_names_are_rejected() {
        let rt = Runtime::new();
        rt.define_class("Animal", None).unwrap();
        assert_eq!(
            rt.define_class("Animal", None),
            Err(SwizzleError::DuplicateClass("Animal".to_string()))
        );
    }

    #[test]
    fn dangling_superclass_is_rejected() {
        let rt = Runtime::new();
        assert_eq!(
            rt.define_class("Orphan", Some(ClassId(9))),
            Err(SwizzleError::UndefinedClass(9))
        );
    }

    #[test]
    fn instantiating_an_unknown_class_fails() {
        let rt = Runtime::new();
        assert_eq!(
            rt.instantiate(ClassId(3)),
            Err(SwizzleError::UndefinedClass(3))
        );
    }

    #[test]
    fn class_lookup_by_name() {
        let rt = Runtime::new();
        let animal = rt.define_class("Animal", None).unwrap();
        assert_eq!(rt.class_named("Animal"), Some(animal));
        assert_eq!(rt.class_named("Plant"), None);
    }

    /// An id minted by another runtime's interner is reported as an error
    /// instead of silently resolving to an unrelated name.
    #[test]
    fn foreign_selector_ids_are_rejected() {
        let rt = Runtime::new();
        let other = Runtime::new();
        let animal = rt.define_class("Animal", None).unwrap();
        other.selector("first");
        let foreign = other.selector("second");

        assert_eq!(
            rt.define_method(animal, foreign, |_recv, _args| Value::Nil),
            Err(SwizzleError::ForeignSelector(1))
        );

        let pet = rt.instantiate(animal).unwrap();
        assert_eq!(
            rt.send(&pet, foreign, &[]),
            Err(SwizzleError::ForeignSelector(1))
        );
    }

    #[test]
    fn selectors_from_different_runtimes_are_independent() {
        let a = Runtime::new();
        let b = Runtime::new();
        a.selector("first");
        let sel_a = a.selector("second");
        let sel_b = b.selector("second");
        // Same name, different intern tables; ids need not agree.
        assert_eq!(a.selector("second"), sel_a);
        assert_eq!(b.selector("second"), sel_b);
    }
}
