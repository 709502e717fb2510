pub mod calculator;
pub mod declaration;
pub mod error;
pub mod inspector;
pub mod matched;
pub(crate) mod matching;
pub mod media;
pub mod parser;
pub mod property;
pub mod rules;
pub mod selector;
pub mod stylesheet;
#[cfg(test)]
mod test_cases;

// Re-export main types for convenience
pub use declaration::StyleDeclaration;
pub use error::StyleError;
pub use matched::{MatchedRule, MatchedRuleList};
pub use media::{ColorScheme, MediaEnvironment, MediaList, Orientation};
pub use parser::{ParserSession, parse_selector_list, parse_style_text};
pub use property::{Property, PropertyBuilder, PropertyValue};
pub use rules::{CssRule, RuleList, StyleRule};
pub use selector::{Selector, SimpleSelector};
pub use stylesheet::{MatchedStyleSheet, StyleSheet};
