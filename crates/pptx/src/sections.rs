//! Sections declared in `ppt/presentation.xml` (`p14:sectionLst`).
//!
//! A section lists slide ids. Each id is mapped through `p:sldIdLst` to a
//! relationship id, through the presentation relationships to a slide part,
//! and from the part to its external slide number.

use crate::rels::{Relationships, RT_SLIDE};
use crate::xml::XmlElement;
use deck_core::{ResolutionWarning, Section, WarningKind};
use std::collections::HashMap;

/// Sections in declaration order and the owning section of each slide.
#[derive(Debug, Default)]
pub struct SectionMap {
    pub sections: Vec<Section>,
    pub by_slide: HashMap<usize, String>,
}

pub fn read_sections(
    presentation: &XmlElement,
    rels: &Relationships,
    numbers: &HashMap<String, usize>,
    warnings: &mut Vec<ResolutionWarning>,
) -> SectionMap {
    let slide_ids: HashMap<&str, usize> = presentation
        .child("sldIdLst")
        .map(|list| {
            list.children_named("sldId")
                .filter_map(|sld| {
                    let id = sld.attr("id")?;
                    let rel = rels.get(sld.prefixed_attr("id")?).filter(|r| r.is_type(RT_SLIDE))?;
                    Some((id, *numbers.get(rel.part.as_deref()?)?))
                })
                .collect()
        })
        .unwrap_or_default();

    let mut map = SectionMap::default();
    let Some(list) = presentation.descendants("sectionLst").into_iter().next() else {
        return map;
    };

    for section in list.children_named("section") {
        let name = section.attr("name").unwrap_or_default().to_string();
        let mut slide_numbers = Vec::new();

        let members = section
            .child("sldIdLst")
            .map(|l| l.children_named("sldId").collect::<Vec<_>>())
            .unwrap_or_default();
        for member in members {
            let id = member.attr("id").unwrap_or_default();
            let Some(&number) = slide_ids.get(id) else {
                log::warn!("Section '{}' refers to unknown slide id {}", name, id);
                warnings.push(ResolutionWarning::global(
                    WarningKind::UnknownSectionSlide,
                    format!("Section '{}' refers to unknown slide id '{}'", name, id),
                ));
                continue;
            };
            if let Some(owner) = map.by_slide.get(&number) {
                warnings.push(ResolutionWarning::for_slide(
                    number,
                    WarningKind::DuplicateSectionMembership,
                    format!("Slide already belongs to section '{}'; '{}' ignored", owner, name),
                ));
                continue;
            }
            map.by_slide.insert(number, name.clone());
            slide_numbers.push(number);
        }

        map.sections.push(Section {
            name,
            id: section.attr("id").unwrap_or_default().to_string(),
            slide_numbers,
        });
    }

    log::debug!("Read {} sections", map.sections.len());
    map
}
