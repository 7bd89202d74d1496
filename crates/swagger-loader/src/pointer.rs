//! JSON-pointer-like source locations carried by every error and warning.

/// A location in the raw document tree, e.g. `#/paths/~1pets/get`.
///
/// Segments are stored unescaped; `~` and `/` are escaped (`~0`, `~1`) on
/// display, per RFC 6901.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Pointer(Vec<String>);

impl Pointer {
    pub fn root() -> Self {
        Self::default()
    }

    /// A new pointer with `segment` appended.
    pub fn child(&self, segment: impl Into<String>) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment.into());
        Self(segments)
    }

    /// A new pointer into the `index`-th element of a sequence.
    pub fn index(&self, index: usize) -> Self {
        self.child(index.to_string())
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for Pointer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("#")?;
        for segment in &self.0 {
            write!(f, "/{}", escape(segment))?;
        }
        Ok(())
    }
}

impl serde::Serialize for Pointer {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl From<&str> for Pointer {
    fn from(s: &str) -> Self {
        let pointer = s.strip_prefix('#').unwrap_or(s);
        let segments = pointer
            .split('/')
            .filter(|segment| !segment.is_empty())
            .map(unescape)
            .collect();
        Self(segments)
    }
}

pub(crate) fn escape(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}

pub(crate) fn unescape(segment: &str) -> String {
    segment.replace("~1", "/").replace("~0", "~")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_escapes_segments() {
        let pointer = Pointer::root()
            .child("paths")
            .child("/pets/{id}")
            .child("get")
            .child("parameters")
            .index(0);

        assert_eq!(
            pointer.to_string(),
            "#/paths/~1pets~1{id}/get/parameters/0"
        );
    }

    #[test]
    fn test_root_displays_bare_hash() {
        assert_eq!(Pointer::root().to_string(), "#");
    }

    #[test]
    fn test_from_str_unescapes() {
        let pointer = Pointer::from("#/paths/~1pets/get");
        assert_eq!(pointer.segments(), ["paths", "/pets", "get"]);
        assert_eq!(pointer.to_string(), "#/paths/~1pets/get");
    }

    #[test]
    fn test_tilde_escaping_order() {
        let pointer = Pointer::root().child("a~/b");
        assert_eq!(pointer.to_string(), "#/a~0~1b");
        assert_eq!(unescape("a~0~1b"), "a~/b");
    }
}
