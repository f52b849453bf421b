//! Dispatch-table swizzling.

use std::sync::Arc;

use log::{debug, info};

use crate::error::{Result, SwizzleError};
use crate::runtime::{ClassId, Object, Runtime};
use crate::selector::Selector;
use crate::types::{Imp, Value};

impl Runtime {
    /// Redirect `origin` on `class` to the behavior currently reachable via
    /// `replace`, keeping the prior behavior of `origin` invocable.
    ///
    /// When `class` itself defines `origin`, the two dispatch-table entries
    /// are exchanged: `origin` now runs the former `replace` body and
    /// `replace` runs the former `origin` body. When `origin` is absent or
    /// only inherited, the current resolution of `origin` is first bound
    /// under `add` (an explicit no-op when nothing resolves at all), and
    /// `origin` is then bound directly to the implementation reachable via
    /// `replace`. In that branch `add` must name a selector distinct from
    /// both `origin` and `replace`; an alias would immediately overwrite
    /// the entry this operation exists to preserve.
    ///
    /// Validation precedes mutation: on any error the class's dispatch
    /// table is untouched. The whole edit runs under the class's table
    /// lock, so concurrent sends through the affected selectors observe
    /// either the pre-call or the post-call bindings, never an intermediate
    /// state.
    pub fn swizzle_method(
        &self,
        class: ClassId,
        origin: Selector,
        replace: Selector,
        add: Selector,
    ) -> Result<()> {
        let def = self.class(class)?;
        self.check_selector(origin)?;
        self.check_selector(replace)?;
        self.check_selector(add)?;

        if origin == replace {
            return Err(SwizzleError::IdenticalSelectors(self.selector_name(origin)));
        }

        // Single critical section for validation against the table and the
        // edit itself. Ancestor tables are only read-locked, and the chain
        // walks strictly toward earlier-defined classes, so this cannot
        // deadlock with a concurrent swizzle elsewhere in the hierarchy.
        let mut methods = def.methods.write().unwrap_or_else(|e| e.into_inner());

        let replacement = match methods.get(&replace).cloned() {
            Some(imp) => Some(imp),
            None => match def.superclass {
                Some(sup) => self.resolve(sup, replace)?,
                None => None,
            },
        };
        let Some(replacement) = replacement else {
            return Err(SwizzleError::UnresolvedSelector {
                class: def.name.clone(),
                selector: self.selector_name(replace),
            });
        };

        if let Some(origin_imp) = methods.get(&origin).cloned() {
            // `class` implements `origin` directly: symmetric exchange.
            methods.insert(origin, replacement);
            methods.insert(replace, origin_imp);
            info!(
                "swizzled '{}' <-> '{}' on '{}'",
                self.selector_name(origin),
                self.selector_name(replace),
                def.name
            );
        } else {
            // `add` must be a distinct name: aliasing `origin` would clobber
            // the preserved entry on the very next write, and aliasing
            // `replace` would rebind it to its own pre-call resolution.
            if add == origin || add == replace {
                return Err(SwizzleError::AliasedFallback(self.selector_name(add)));
            }
            if methods.contains_key(&add) {
                return Err(SwizzleError::SelectorCollision {
                    class: def.name.clone(),
                    selector: self.selector_name(add),
                });
            }
            let preserved: Imp = match def.superclass {
                Some(sup) => self.resolve(sup, origin)?,
                None => None,
            }
            .unwrap_or_else(|| {
                debug!(
                    "'{}' resolves to nothing from '{}'; preserving it as a no-op",
                    self.selector_name(origin),
                    def.name
                );
                Arc::new(|_recv: &Object, _args: &[Value]| Value::Nil)
            });
            methods.insert(add, preserved);
            methods.insert(origin, replacement);
            info!(
                "rebound '{}' on '{}' to '{}', prior resolution kept under '{}'",
                self.selector_name(origin),
                def.name,
                self.selector_name(replace),
                self.selector_name(add)
            );
        }
        Ok(())
    }
}
