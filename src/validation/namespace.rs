//! Prefix-to-URI namespace bindings with lexical scoping.
//!
//! Validation of structured documents carries a stack of namespace scopes: each
//! nested element pushes a scope, declares its own bindings, and pops the scope on
//! exit, at which point the outer bindings become visible again. Lookups walk the
//! stack innermost-first, so an inner declaration shadows an outer one for the same
//! prefix.

/// Stack of namespace scopes, innermost last.
#[derive(Debug, Default)]
pub struct NamespaceContext {
    scopes: Vec<Vec<(String, String)>>,
}

impl NamespaceContext {
    /// Create a context with one root scope.
    #[must_use]
    pub fn new() -> Self {
        NamespaceContext {
            scopes: vec![Vec::new()],
        }
    }

    /// Open a nested scope.
    pub fn push_scope(&mut self) {
        self.scopes.push(Vec::new());
    }

    /// Close the innermost scope, discarding its bindings. The root scope is never
    /// popped.
    pub fn pop_scope(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    /// Bind `prefix` to `uri` in the innermost scope, shadowing any outer binding.
    pub fn declare(&mut self, prefix: &str, uri: &str) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.push((prefix.to_string(), uri.to_string()));
        }
    }

    /// Resolve a prefix to its URI, innermost binding first.
    #[must_use]
    pub fn uri_of(&self, prefix: &str) -> Option<&str> {
        self.scopes.iter().rev().find_map(|scope| {
            scope
                .iter()
                .rev()
                .find(|(p, _)| p == prefix)
                .map(|(_, uri)| uri.as_str())
        })
    }

    /// Find a prefix currently bound to `uri`, innermost binding first.
    #[must_use]
    pub fn prefix_of(&self, uri: &str) -> Option<&str> {
        self.scopes.iter().rev().find_map(|scope| {
            scope
                .iter()
                .rev()
                .find(|(_, u)| u == uri)
                .map(|(prefix, _)| prefix.as_str())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inner_scope_shadows_and_unwinds() {
        let mut ns = NamespaceContext::new();
        ns.declare("a", "urn:outer");
        ns.push_scope();
        ns.declare("a", "urn:inner");
        assert_eq!(ns.uri_of("a"), Some("urn:inner"));
        ns.pop_scope();
        assert_eq!(ns.uri_of("a"), Some("urn:outer"));
    }

    #[test]
    fn test_reverse_lookup() {
        let mut ns = NamespaceContext::new();
        ns.declare("a", "urn:one");
        ns.declare("b", "urn:two");
        assert_eq!(ns.prefix_of("urn:two"), Some("b"));
        assert_eq!(ns.prefix_of("urn:missing"), None);
    }

    #[test]
    fn test_root_scope_is_never_popped() {
        let mut ns = NamespaceContext::new();
        ns.declare("a", "urn:root");
        ns.pop_scope();
        assert_eq!(ns.uri_of("a"), Some("urn:root"));
    }
}
