//! URL slugs for classes and products.

use serde::{Deserialize, Serialize};

/// Turn arbitrary text into a URL slug.
///
/// Lower-cases, drops everything except ASCII letters, digits, whitespace
/// and hyphens, then collapses each run of whitespace and hyphens into a
/// single hyphen. Leading and trailing hyphens are kept.
///
/// The output only contains `[a-z0-9-]` without repeated hyphens, so
/// applying the function again changes nothing.
///
/// ```
/// use segishop_core::slug::generate_slug;
///
/// assert_eq!(generate_slug("Oversized & Heavy Items"), "oversized-heavy-items");
/// assert_eq!(generate_slug(&generate_slug("A  b")), generate_slug("A  b"));
/// ```
#[must_use]
pub fn generate_slug(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_separator = false;

    for ch in input.to_lowercase().chars() {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            if pending_separator {
                slug.push('-');
                pending_separator = false;
            }
            slug.push(ch);
        } else if ch == '-' || ch.is_whitespace() {
            pending_separator = true;
        }
    }

    if pending_separator {
        slug.push('-');
    }

    slug
}

/// Slug input that follows the name until the user edits it by hand.
///
/// Typing in the name field regenerates the slug while the field is in auto
/// mode. Any manual edit switches it to manual mode for good; only
/// [`SlugField::reset_auto`] (the "Auto" button) switches back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlugField {
    value: String,
    manual: bool,
}

impl SlugField {
    /// A blank field in auto mode, for create forms.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            value: String::new(),
            manual: false,
        }
    }

    /// A field holding an existing slug.
    ///
    /// A saved slug counts as manually chosen, so renaming an entity does not
    /// silently change its URL.
    #[must_use]
    pub fn existing(slug: &str) -> Self {
        Self {
            value: slug.to_owned(),
            manual: !slug.is_empty(),
        }
    }

    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    #[must_use]
    pub const fn is_manual(&self) -> bool {
        self.manual
    }

    /// The name field changed.
    pub fn name_changed(&mut self, name: &str) {
        if !self.manual {
            self.value = generate_slug(name);
        }
    }

    /// The user typed in the slug field.
    pub fn edited(&mut self, slug: &str) {
        self.value = generate_slug(slug);
        self.manual = true;
    }

    /// The "Auto" button: regenerate from `name` and follow it again.
    pub fn reset_auto(&mut self, name: &str) {
        self.value = generate_slug(name);
        self.manual = false;
    }

    #[must_use]
    pub fn into_value(self) -> String {
        self.value
    }
}

impl Default for SlugField {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_slug_basic() {
        assert_eq!(generate_slug("Heavy Items"), "heavy-items");
        assert_eq!(generate_slug("Fragile / Glass"), "fragile-glass");
        assert_eq!(generate_slug("  Bulky -- Freight  "), "-bulky-freight-");
        assert_eq!(generate_slug("Crème brûlée"), "crme-brle");
        assert_eq!(generate_slug("A\tB\nC"), "a-b-c");
        assert_eq!(generate_slug(""), "");
    }

    #[test]
    fn test_generate_slug_is_idempotent() {
        let samples = [
            "Heavy Items",
            "  leading and trailing  ",
            "multiple---hyphens",
            "MiXeD CaSe 123",
            "émoji 🚚 freight",
            "- - -",
            "Ünïcödé",
            "tabs\tand\nnewlines",
            "İstanbul",
        ];
        for s in samples {
            let once = generate_slug(s);
            assert_eq!(generate_slug(&once), once, "not idempotent for {s:?}");
        }
    }

    #[test]
    fn test_slug_field_follows_name_until_edited() {
        let mut field = SlugField::new();
        field.name_changed("Heavy");
        assert_eq!(field.value(), "heavy");
        field.name_changed("Heavy Items");
        assert_eq!(field.value(), "heavy-items");

        field.edited("bulky");
        assert!(field.is_manual());
        field.name_changed("Something Else");
        field.name_changed("Another Name");
        assert_eq!(field.value(), "bulky");
    }

    #[test]
    fn test_slug_field_reset_auto() {
        let mut field = SlugField::existing("custom");
        field.name_changed("Renamed");
        assert_eq!(field.value(), "custom");

        field.reset_auto("Renamed Class");
        assert_eq!(field.value(), "renamed-class");
        assert!(!field.is_manual());

        field.name_changed("Renamed Again");
        assert_eq!(field.value(), "renamed-again");
    }

    #[test]
    fn test_slug_field_manual_edit_is_normalised() {
        let mut field = SlugField::new();
        field.edited("My Custom Slug");
        assert_eq!(field.value(), "my-custom-slug");
    }
}
