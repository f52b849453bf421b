use std::collections::HashMap;

/// Interned message identifier.
///
/// Comparison and dispatch-table lookup go through the interned id, never the
/// name. Selectors are only meaningful within the [`Runtime`](crate::Runtime)
/// that interned them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Selector(pub(crate) u32);

/// String-to-id intern table, owned by a `Runtime`.
#[derive(Debug, Default)]
pub(crate) struct SelectorTable {
    ids: HashMap<String, Selector>,
    names: Vec<String>,
}

impl SelectorTable {
    pub(crate) fn intern(&mut self, name: &str) -> Selector {
        if let Some(&sel) = self.ids.get(name) {
            return sel;
        }
        let id = u32::try_from(self.names.len()).expect("selector intern table full");
        let sel = Selector(id);
        self.names.push(name.to_string());
        self.ids.insert(name.to_string(), sel);
        sel
    }

    pub(crate) fn contains(&self, sel: Selector) -> bool {
        (sel.0 as usize) < self.names.len()
    }

    pub(crate) fn name(&self, sel: Selector) -> Option<&str> {
        self.names.get(sel.0 as usize).map(String::as_str)
    }
}
