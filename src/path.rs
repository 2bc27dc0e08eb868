use crate::Key;

/// One step of a [`FieldPath`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// `[]`, appends after the largest integer key of its level
    Auto,
    /// `name` or `[name]`
    Key(Key),
}

/// A flat field name in bracket notation, split into segments.
///
/// `foo[][bar]` becomes `[Key("foo"), Auto, Key("bar")]`. A name starting with
/// `[`, or whose first `[` is never closed, is kept as a plain name. Text after
/// the last complete bracket group is ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath {
    segments: Vec<Segment>,
}

impl FieldPath {
    /// Parses a field name.
    #[must_use]
    pub fn parse(name: &str) -> Self {
        if name.is_empty() {
            return Self {
                segments: Vec::new(),
            };
        }

        let open = match name.find('[') {
            Some(open) if open > 0 => open,
            _ => return Self::plain(name),
        };

        let mut segments = vec![Segment::Key(Key::from_segment(&name[..open]))];
        let mut rest = &name[open..];

        while let Some(inner) = rest.strip_prefix('[') {
            let Some(close) = inner.find(']') else {
                break;
            };
            let group = &inner[..close];
            segments.push(if group.is_empty() {
                Segment::Auto
            } else {
                Segment::Key(Key::from_segment(group))
            });
            rest = &inner[close + 1..];
        }

        if segments.len() == 1 {
            return Self::plain(name);
        }

        Self { segments }
    }

    fn plain(name: &str) -> Self {
        Self {
            segments: vec![Segment::Key(Key::from_segment(name))],
        }
    }

    /// Gets the segments.
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Checks if the path has no segments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}
