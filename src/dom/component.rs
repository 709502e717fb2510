use crate::css::declaration::StyleDeclaration;
use std::collections::HashMap;

/// The view bound to a node. Rendering lives outside this crate; the style engine only
/// needs to read states and push pseudo styles.
pub trait Component: Send {
    /// Current pseudo-states, e.g. `{"active": true}`.
    fn state_map(&self) -> HashMap<String, bool>;

    /// Whether the underlying view exists yet. Styles for an unrealized component are
    /// buffered on the node until it is bound again.
    fn is_realized(&self) -> bool {
        true
    }

    fn apply_pseudo_styles(&mut self, key: &str, style: &StyleDeclaration);

    fn restore_styles(&mut self);
}

/// Style update waiting for a component to show up.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum PendingStyle {
    #[default]
    None,
    /// Revert to the normal (non-pseudo) styles.
    Normal,
    Pseudo {
        key: String,
        declaration: StyleDeclaration,
    },
}

impl PendingStyle {
    pub fn is_none(&self) -> bool {
        matches!(self, PendingStyle::None)
    }

    /// Hands the buffered update to `component`.
    pub fn deliver(self, component: &mut dyn Component) {
        match self {
            PendingStyle::None => {}
            PendingStyle::Normal => component.restore_styles(),
            PendingStyle::Pseudo { key, declaration } => {
                component.apply_pseudo_styles(&key, &declaration)
            }
        }
    }
}
