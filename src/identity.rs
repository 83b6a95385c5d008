//! Entity identity: one or more ordered scalar components.

use std::fmt;

/// One component of an identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IdComponent {
    /// Numeric id.
    Int(u64),
    /// Textual key.
    Text(String),
}

impl fmt::Display for IdComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdComponent::Int(n) => write!(f, "{}", n),
            IdComponent::Text(s) => f.write_str(s),
        }
    }
}

impl From<u64> for IdComponent {
    fn from(n: u64) -> Self {
        IdComponent::Int(n)
    }
}

impl From<&str> for IdComponent {
    fn from(s: &str) -> Self {
        IdComponent::Text(s.to_string())
    }
}

impl From<String> for IdComponent {
    fn from(s: String) -> Self {
        IdComponent::Text(s)
    }
}

/// Identity of a persisted entity, parent-first.
///
/// A ticket note is `(ticket_id, note_id)`; a staff group is `(id)`.
/// Equality is component-wise.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identity(Vec<IdComponent>);

impl Identity {
    /// Single numeric id.
    #[must_use]
    pub fn single(id: u64) -> Self {
        Identity(vec![IdComponent::Int(id)])
    }

    /// Parent-first numeric components.
    #[must_use]
    pub fn nested(ids: &[u64]) -> Self {
        Identity(ids.iter().copied().map(IdComponent::Int).collect())
    }

    /// Arbitrary components.
    #[must_use]
    pub fn from_components(components: Vec<IdComponent>) -> Self {
        Identity(components)
    }

    /// The components, parent-first.
    #[must_use]
    pub fn components(&self) -> &[IdComponent] {
        &self.0
    }

    /// The last component as a number, which is the entity's own id.
    #[must_use]
    pub fn own_id(&self) -> Option<u64> {
        match self.0.last() {
            Some(IdComponent::Int(n)) => Some(*n),
            _ => None,
        }
    }

    /// Positional URL parameters.
    #[must_use]
    pub fn to_params(&self) -> Vec<String> {
        self.0.iter().map(ToString::to_string).collect()
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_params().join("/"))
    }
}

impl From<u64> for Identity {
    fn from(id: u64) -> Self {
        Identity::single(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_params_are_parent_first() {
        let id = Identity::nested(&[12, 7]);
        assert_eq!(id.to_params(), vec!["12".to_string(), "7".to_string()]);
        assert_eq!(id.own_id(), Some(7));
        assert_eq!(id.to_string(), "12/7");
    }

    #[test]
    fn test_component_equality() {
        assert_eq!(Identity::nested(&[1, 2]), Identity::nested(&[1, 2]));
        assert_ne!(Identity::nested(&[1, 2]), Identity::nested(&[2, 1]));
        assert_ne!(Identity::single(2), Identity::nested(&[1, 2]));
    }

    #[test]
    fn test_text_component() {
        let id = Identity::from_components(vec!["ListAll".into(), 5u64.into()]);
        assert_eq!(id.to_string(), "ListAll/5");
        assert_eq!(id.own_id(), Some(5));
    }
}
