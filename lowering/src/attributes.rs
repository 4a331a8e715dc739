//! Routing of attribute names. The order of the checks matters: an `attr:`
//! prefix wins over the allowlist, which wins over `bind:` and `on:`,
//! which win over options.

pub const SPECIAL_ATTRIBUTES: &[&str] = &[
    "ws-delegates-tabfocus",
    "ws-creates-context",
    "ws-tab-cycling",
    "ws-autofocus",
    "ws-no-focus",
    "tabindex",
    "class",
    "data-access",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeRole {
    Attribute(String),
    /// The bound property name.
    Bind(String),
    /// The lowercased event name.
    Event(String),
    Option(String),
}

/// Classifies an attribute name. Tags that take no options (plain
/// elements) pass `attributes_only`, so what would be an option stays an
/// attribute.
pub fn classify(name: &str, attributes_only: bool) -> AttributeRole {
    if let Some(attribute) = name.strip_prefix("attr:") {
        return AttributeRole::Attribute(attribute.to_string());
    }
    if SPECIAL_ATTRIBUTES.contains(&name) {
        return AttributeRole::Attribute(name.to_string());
    }
    if let Some(property) = name.strip_prefix("bind:") {
        return AttributeRole::Bind(property.to_string());
    }
    if let Some(event) = name.strip_prefix("on:") {
        return AttributeRole::Event(event.to_ascii_lowercase());
    }
    if attributes_only {
        AttributeRole::Attribute(name.to_string())
    } else {
        AttributeRole::Option(name.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_order() {
        assert_eq!(classify("attr:on:click", false), AttributeRole::Attribute("on:click".to_string()));
        assert_eq!(classify("class", false), AttributeRole::Attribute("class".to_string()));
        assert_eq!(classify("bind:value", false), AttributeRole::Bind("value".to_string()));
        assert_eq!(classify("on:MenuItemClick", false), AttributeRole::Event("menuitemclick".to_string()));
        assert_eq!(classify("caption", false), AttributeRole::Option("caption".to_string()));
        assert_eq!(classify("caption", true), AttributeRole::Attribute("caption".to_string()));
        assert_eq!(classify("bind:value", true), AttributeRole::Bind("value".to_string()));
    }
}
