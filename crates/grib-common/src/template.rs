//! Provider URL templates with `{long_min}`-style slots.

use crate::bbox::BoundingBox;

/// Placeholders a provider template must carry, each at least once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    LongMin,
    LongMax,
    LatMin,
    LatMax,
    Args,
}

impl Slot {
    const ALL: [Slot; 5] = [
        Slot::LongMin,
        Slot::LongMax,
        Slot::LatMin,
        Slot::LatMax,
        Slot::Args,
    ];

    fn name(self) -> &'static str {
        match self {
            Slot::LongMin => "long_min",
            Slot::LongMax => "long_max",
            Slot::LatMin => "lat_min",
            Slot::LatMax => "lat_max",
            Slot::Args => "args",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|slot| slot.name() == name)
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TemplateError {
    #[error("missing slot {{{0}}}")]
    MissingSlot(&'static str),

    #[error("unknown slot {{{0}}}")]
    UnknownSlot(String),

    #[error("unbalanced brace at byte {0}")]
    UnbalancedBrace(usize),
}

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Literal(String),
    Slot(Slot),
}

/// A validated URL template.
#[derive(Debug, Clone, PartialEq)]
pub struct UrlTemplate {
    segments: Vec<Segment>,
}

impl UrlTemplate {
    /// Parse and validate a template string.
    pub fn parse(raw: &str) -> Result<Self, TemplateError> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = raw.char_indices();

        while let Some((pos, c)) = chars.next() {
            match c {
                '{' => {
                    let mut name = String::new();
                    let mut closed = false;
                    for (_, c) in chars.by_ref() {
                        match c {
                            '}' => {
                                closed = true;
                                break;
                            }
                            '{' => return Err(TemplateError::UnbalancedBrace(pos)),
                            _ => name.push(c),
                        }
                    }
                    if !closed {
                        return Err(TemplateError::UnbalancedBrace(pos));
                    }
                    let slot = Slot::from_name(&name).ok_or(TemplateError::UnknownSlot(name))?;

                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Slot(slot));
                }
                '}' => return Err(TemplateError::UnbalancedBrace(pos)),
                _ => literal.push(c),
            }
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        for slot in Slot::ALL {
            if !segments.contains(&Segment::Slot(slot)) {
                return Err(TemplateError::MissingSlot(slot.name()));
            }
        }

        Ok(Self { segments })
    }

    /// Substitute the bounding box and query arguments into the template.
    pub fn render(&self, bbox: &BoundingBox, args: &str) -> String {
        let mut url = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => url.push_str(text),
                Segment::Slot(Slot::LongMin) => url.push_str(&bbox.long_min.to_string()),
                Segment::Slot(Slot::LongMax) => url.push_str(&bbox.long_max.to_string()),
                Segment::Slot(Slot::LatMin) => url.push_str(&bbox.lat_min.to_string()),
                Segment::Slot(Slot::LatMax) => url.push_str(&bbox.lat_max.to_string()),
                Segment::Slot(Slot::Args) => url.push_str(args),
            }
        }
        url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEMPLATE: &str = "http://x/{lat_min}/{lat_max}/{long_min}/{long_max}/{args}";

    #[test]
    fn test_render() {
        let template = UrlTemplate::parse(TEMPLATE).unwrap();
        let bbox = BoundingBox::new(1.0, 13.0, 45.0, 38.0);
        assert_eq!(template.render(&bbox, "wgtprn"), "http://x/45/38/1/13/wgtprn");
    }

    #[test]
    fn test_render_fractional() {
        let template = UrlTemplate::parse(TEMPLATE).unwrap();
        let bbox = BoundingBox::new(-5.5, 9.25, 41.0, 51.5);
        assert_eq!(template.render(&bbox, "a"), "http://x/41/51.5/-5.5/9.25/a");
    }

    #[test]
    fn test_render_repeated_slots() {
        let template =
            UrlTemplate::parse("http://x/{args}?w={long_min}&e={long_max}&s={lat_min}&n={lat_max}&again={args}")
                .unwrap();
        let bbox = BoundingBox::new(1.0, 13.0, 45.0, 38.0);
        assert_eq!(
            template.render(&bbox, "wgtprn"),
            "http://x/wgtprn?w=1&e=13&s=45&n=38&again=wgtprn"
        );
    }

    #[test]
    fn test_slot_names() {
        for slot in Slot::ALL {
            assert_eq!(Slot::from_name(slot.name()), Some(slot));
        }
        assert_eq!(Slot::from_name("LONG_MIN"), None);
    }

    #[test]
    fn test_missing_slot() {
        let err = UrlTemplate::parse("http://x/{lat_min}/{lat_max}/{long_min}/{args}").unwrap_err();
        assert_eq!(err, TemplateError::MissingSlot("long_max"));
    }

    #[test]
    fn test_unknown_slot() {
        let err = UrlTemplate::parse("http://x/{lat}/{lat_min}/{lat_max}/{long_min}/{long_max}/{args}")
            .unwrap_err();
        assert_eq!(err, TemplateError::UnknownSlot("lat".to_string()));
    }

    #[test]
    fn test_unbalanced() {
        assert!(matches!(
            UrlTemplate::parse("http://x/{lat_min/{lat_max}"),
            Err(TemplateError::UnbalancedBrace(9))
        ));
        assert!(matches!(
            UrlTemplate::parse("http://x/lat_min}"),
            Err(TemplateError::UnbalancedBrace(_))
        ));
    }
}
