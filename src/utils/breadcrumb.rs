//! Breadcrumb
//!
//! Ordered stack of names tagging the active nesting context.

/// LIFO stack of context names
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Breadcrumb {
    names: Vec<String>,
}

impl Breadcrumb {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: impl Into<String>) {
        self.names.push(name.into());
    }

    /// Remove the most recent name. Popping an empty breadcrumb does nothing.
    pub fn pop(&mut self) -> Option<String> {
        self.names.pop()
    }

    /// Most recently pushed name still present
    pub fn current(&self) -> Option<&str> {
        self.names.last().map(String::as_str)
    }

    /// Visit every name, most recent first
    pub fn walk<F>(&self, mut visitor: F)
    where
        F: FnMut(&str),
    {
        for name in self.names.iter().rev() {
            visitor(name);
        }
    }

    pub fn depth(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Names from oldest to newest joined by `separator`
    pub fn path(&self, separator: &str) -> String {
        self.names.join(separator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_can_drop_empty_breadcrumb() {
        drop(Breadcrumb::new());
    }

    #[test]
    fn test_last_name_pushed_is_current() {
        let mut breadcrumb = Breadcrumb::new();
        breadcrumb.push("Hello");
        assert_eq!(breadcrumb.current(), Some("Hello"));
    }

    #[test]
    fn test_can_push_more_than_one_item() {
        let mut breadcrumb = Breadcrumb::new();
        breadcrumb.push("Hello");
        breadcrumb.push("Goodbye");
        assert_eq!(breadcrumb.current(), Some("Goodbye"));
    }

    #[test]
    fn test_popping_goes_back_to_previous_item() {
        let mut breadcrumb = Breadcrumb::new();
        breadcrumb.push("Hello");
        breadcrumb.push("Goodbye");
        assert_eq!(breadcrumb.pop().as_deref(), Some("Goodbye"));
        assert_eq!(breadcrumb.current(), Some("Hello"));
    }

    #[test]
    fn test_empty_breadcrumb_has_no_current() {
        assert_eq!(Breadcrumb::new().current(), None);
    }

    #[test]
    fn test_popping_last_name_leaves_it_empty() {
        let mut breadcrumb = Breadcrumb::new();
        breadcrumb.push("Hello");
        breadcrumb.pop();
        assert_eq!(breadcrumb.current(), None);
        assert!(breadcrumb.is_empty());
    }

    #[test]
    fn test_pop_on_empty_is_noop() {
        let mut breadcrumb = Breadcrumb::new();
        assert_eq!(breadcrumb.pop(), None);
        assert_eq!(breadcrumb.depth(), 0);
    }

    #[test]
    fn test_empty_breadcrumb_never_visits() {
        let mut visits = 0;
        Breadcrumb::new().walk(|_| visits += 1);
        assert_eq!(visits, 0);
    }

    #[test]
    fn test_single_item_visited_once() {
        let mut breadcrumb = Breadcrumb::new();
        breadcrumb.push("Hello");
        let mut seen = Vec::new();
        breadcrumb.walk(|name| seen.push(name.to_string()));
        assert_eq!(seen, vec!["Hello"]);
    }

    #[test]
    fn test_walk_is_most_recent_first() {
        let mut breadcrumb = Breadcrumb::new();
        breadcrumb.push("suite");
        breadcrumb.push("nested");
        breadcrumb.push("test");
        let mut seen = Vec::new();
        breadcrumb.walk(|name| seen.push(name.to_string()));
        assert_eq!(seen, vec!["test", "nested", "suite"]);
        assert_eq!(breadcrumb.path(" > "), "suite > nested > test");
    }
}
