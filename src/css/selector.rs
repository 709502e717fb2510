use std::fmt;

pub const ID_SCORE: u64 = 1_000_000;
pub const CLASS_SCORE: u64 = 1_000;
pub const ELEMENT_SCORE: u64 = 1;

/// A selector without combinators, optionally qualified by a state (`.btn:active`).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum SimpleSelector {
    Id(String),
    Class(String),
    Element(String),
    State(Box<SimpleSelector>, String),
}

/// A complete selector. Combinators are left-associated: the right-hand simple selector
/// is the subject and is matched first.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Selector {
    Simple(SimpleSelector),
    Child {
        parent: Box<Selector>,
        child: SimpleSelector,
    },
    Descendant {
        ancestor: Box<Selector>,
        child: SimpleSelector,
    },
}

impl SimpleSelector {
    pub fn specificity(&self) -> u64 {
        match self {
            SimpleSelector::Id(_) => ID_SCORE,
            SimpleSelector::Class(_) => CLASS_SCORE,
            SimpleSelector::Element(_) => ELEMENT_SCORE,
            SimpleSelector::State(inner, _) => inner.specificity(),
        }
    }

    pub fn has_state(&self) -> bool {
        matches!(self, SimpleSelector::State(..))
    }
}

impl Selector {
    pub fn specificity(&self) -> u64 {
        match self {
            Selector::Simple(simple) => simple.specificity(),
            Selector::Child { parent, child } => parent.specificity() + child.specificity(),
            Selector::Descendant { ancestor, child } => {
                ancestor.specificity() + child.specificity()
            }
        }
    }

    /// The subject: the rightmost simple selector.
    pub fn subject(&self) -> &SimpleSelector {
        match self {
            Selector::Simple(simple) => simple,
            Selector::Child { child, .. } | Selector::Descendant { child, .. } => child,
        }
    }

    /// Whether any simple selector in this chain carries a state qualifier.
    pub fn has_state(&self) -> bool {
        match self {
            Selector::Simple(simple) => simple.has_state(),
            Selector::Child { parent: rest, child } | Selector::Descendant { ancestor: rest, child } => {
                child.has_state() || rest.has_state()
            }
        }
    }

    /// A combinator whose ancestor side depends on a pseudo-state, so it can only be
    /// resolved through a pseudo listener.
    pub fn is_stateful_compound(&self) -> bool {
        match self {
            Selector::Simple(_) => false,
            Selector::Child { parent: rest, .. } | Selector::Descendant { ancestor: rest, .. } => {
                rest.has_state()
            }
        }
    }
}

impl From<SimpleSelector> for Selector {
    fn from(simple: SimpleSelector) -> Self {
        Selector::Simple(simple)
    }
}

impl fmt::Display for SimpleSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimpleSelector::Id(id) => write!(f, "#{}", id),
            SimpleSelector::Class(class) => write!(f, ".{}", class),
            SimpleSelector::Element(tag) => write!(f, "{}", tag),
            SimpleSelector::State(inner, state) => write!(f, "{}:{}", inner, state),
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::Simple(simple) => write!(f, "{}", simple),
            Selector::Child { parent, child } => write!(f, "{} > {}", parent, child),
            Selector::Descendant { ancestor, child } => write!(f, "{} {}", ancestor, child),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn class(name: &str) -> SimpleSelector {
        SimpleSelector::Class(name.to_string())
    }

    fn chain(len: usize, make: impl Fn(usize) -> SimpleSelector) -> Selector {
        (1..len).fold(Selector::Simple(make(0)), |acc, i| Selector::Descendant {
            ancestor: Box::new(acc),
            child: make(i),
        })
    }

    #[test]
    fn one_id_outweighs_many_classes() {
        let id = Selector::Simple(SimpleSelector::Id("a".into()));
        let classes = chain(999, |i| class(&format!("c{}", i)));
        let mixed = chain(999, |i| {
            if i % 2 == 0 {
                class(&format!("c{}", i))
            } else {
                SimpleSelector::Element(format!("e{}", i))
            }
        });
        assert_eq!(classes.specificity(), 999 * CLASS_SCORE);
        assert!(id.specificity() > classes.specificity());
        assert!(id.specificity() > mixed.specificity());
    }

    #[test]
    fn state_keeps_inner_specificity() {
        let state = SimpleSelector::State(Box::new(class("btn")), "active".into());
        assert_eq!(state.specificity(), CLASS_SCORE);
        assert_eq!(state.to_string(), ".btn:active");
    }

    #[test]
    fn stateful_compound_detection() {
        let btn_active = SimpleSelector::State(Box::new(class("btn")), "active".into());
        let compound = Selector::Descendant {
            ancestor: Box::new(Selector::Simple(btn_active.clone())),
            child: class("label"),
        };
        assert!(compound.is_stateful_compound());
        assert_eq!(compound.to_string(), ".btn:active .label");

        let subject_state = Selector::Child {
            parent: Box::new(Selector::Simple(class("list"))),
            child: btn_active,
        };
        assert!(!subject_state.is_stateful_compound());
        assert!(subject_state.has_state());
    }
}
