//! The fixed set of locations the selector offers.

/// Ordered, de-duplicated list of selectable place names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationSet {
    names: Vec<String>,
}

impl LocationSet {
    /// Build from configured names, dropping blanks and duplicates.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut unique: Vec<String> = Vec::new();
        for name in names {
            let name = name.into().trim().to_string();
            if !name.is_empty() && !unique.iter().any(|n| n.eq_ignore_ascii_case(&name)) {
                unique.push(name);
            }
        }
        Self { names: unique }
    }

    /// Canonical spelling of `name` if it is supported (case-insensitive).
    pub fn find(&self, name: &str) -> Option<&str> {
        let name = name.trim();
        self.names
            .iter()
            .find(|n| n.eq_ignore_ascii_case(name))
            .map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn first(&self) -> Option<&str> {
        self.names.first().map(String::as_str)
    }
}

impl Default for LocationSet {
    fn default() -> Self {
        Self::new(["Leeds", "London", "Manchester"])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_set() {
        let set = LocationSet::default();
        assert_eq!(set.names(), ["Leeds", "London", "Manchester"]);
        assert_eq!(set.first(), Some("Leeds"));
    }

    #[test]
    fn test_find_is_case_insensitive() {
        let set = LocationSet::default();
        assert_eq!(set.find("london"), Some("London"));
        assert_eq!(set.find(" MANCHESTER "), Some("Manchester"));
        assert!(!set.contains("Paris"));
    }

    #[test]
    fn test_new_drops_blanks_and_duplicates() {
        let set = LocationSet::new(["York", "", "york", "Hull"]);
        assert_eq!(set.names(), ["York", "Hull"]);
    }
}
