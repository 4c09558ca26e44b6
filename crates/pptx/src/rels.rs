//! Part relationships (`_rels/*.rels`) and target resolution.

use crate::numbering::extract_part_number;
use crate::xml::XmlElement;
use std::collections::HashMap;

pub const RT_SLIDE: &str = "/slide";
pub const RT_SLIDE_LAYOUT: &str = "/slideLayout";
pub const RT_NOTES_SLIDE: &str = "/notesSlide";

/// One relationship from a source part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    pub id: String,
    pub rel_type: String,
    /// Target as written in the rels part.
    pub target: String,
    pub external: bool,
    /// Archive part name the target resolves to; `None` for external targets.
    pub part: Option<String>,
}

impl Relationship {
    /// Whether the relationship type ends with the given suffix, e.g. [`RT_SLIDE`].
    pub fn is_type(&self, suffix: &str) -> bool {
        self.rel_type.ends_with(suffix)
    }
}

/// Relationships of one source part, by id.
#[derive(Debug, Clone, Default)]
pub struct Relationships {
    by_id: HashMap<String, Relationship>,
}

impl Relationships {
    /// Read the relationships of `source_part` from its parsed rels part.
    pub fn from_xml(source_part: &str, root: &XmlElement) -> Self {
        let by_id = root
            .children_named("Relationship")
            .filter_map(|rel| {
                let id = rel.attr("Id")?.to_string();
                let target = rel.attr("Target")?.to_string();
                let rel_type = rel.attr("Type").unwrap_or_default().to_string();
                let external = rel.attr("TargetMode") == Some("External");
                let part = (!external).then(|| resolve_target(source_part, &target));
                Some((
                    id.clone(),
                    Relationship {
                        id,
                        rel_type,
                        target,
                        external,
                        part,
                    },
                ))
            })
            .collect();
        Self { by_id }
    }

    pub fn get(&self, id: &str) -> Option<&Relationship> {
        self.by_id.get(id)
    }

    /// Resolved part name of an internal relationship.
    pub fn target_part(&self, id: &str) -> Option<&str> {
        self.get(id).and_then(|r| r.part.as_deref())
    }

    /// First relationship of the given type, by numeric id order.
    ///
    /// `rId2` sorts before `rId10`; ids without a numeric suffix sort last.
    pub fn first_of_type(&self, suffix: &str) -> Option<&Relationship> {
        self.by_id
            .values()
            .filter(|r| r.is_type(suffix))
            .min_by(|a, b| {
                let key = |r: &Relationship| extract_part_number(&r.id).unwrap_or(usize::MAX);
                key(a).cmp(&key(b)).then_with(|| a.id.cmp(&b.id))
            })
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

/// Name of the rels part that describes `part`.
///
/// `ppt/slides/slide1.xml` → `ppt/slides/_rels/slide1.xml.rels`.
pub fn rels_part_for(part: &str) -> String {
    match part.rsplit_once('/') {
        Some((dir, file)) => format!("{}/_rels/{}.rels", dir, file),
        None => format!("_rels/{}.rels", part),
    }
}

/// Resolve a relationship target against the directory of its source part.
///
/// Absolute targets (leading `/`) are package-rooted; `..` and `.` segments
/// are normalised. Part names never carry a leading slash.
pub fn resolve_target(source_part: &str, target: &str) -> String {
    let joined = match target.strip_prefix('/') {
        Some(absolute) => absolute.to_string(),
        None => match source_part.rsplit_once('/') {
            Some((dir, _)) => format!("{}/{}", dir, target),
            None => target.to_string(),
        },
    };

    let mut segments: Vec<&str> = Vec::new();
    for segment in joined.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    segments.join("/")
}
