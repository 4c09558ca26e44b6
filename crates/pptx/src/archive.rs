//! Read access to the parts of a PPTX package.

use crate::xml::{parse_document, XmlElement};
use deck_core::FormatError;
use std::io::{Read, Seek};
use zip::result::ZipError;
use zip::ZipArchive;

/// A ZIP container of XML parts.
pub struct Package<R: Read + Seek> {
    archive: ZipArchive<R>,
    part_names: Vec<String>,
}

impl<R: Read + Seek> Package<R> {
    /// Open a container.
    pub fn open(reader: R) -> Result<Self, FormatError> {
        let archive = ZipArchive::new(reader)
            .map_err(|e| FormatError::InvalidArchive(format!("Failed to open ZIP: {}", e)))?;
        let part_names = archive.file_names().map(str::to_string).collect();
        Ok(Self { archive, part_names })
    }

    /// Names of every part in the container.
    pub fn part_names(&self) -> &[String] {
        &self.part_names
    }

    pub fn has_part(&self, name: &str) -> bool {
        self.part_names.iter().any(|n| n == name)
    }

    /// Read a part as text, or `None` if the container has no such part.
    pub fn read_part(&mut self, name: &str) -> Result<Option<String>, FormatError> {
        let mut file = match self.archive.by_name(name) {
            Ok(file) => file,
            Err(ZipError::FileNotFound) => return Ok(None),
            Err(e) => {
                return Err(FormatError::InvalidArchive(format!(
                    "Failed to read '{}': {}",
                    name, e
                )))
            }
        };

        let mut content = String::new();
        file.read_to_string(&mut content)
            .map_err(|e| FormatError::MalformedXml {
                part: name.to_string(),
                message: e.to_string(),
            })?;
        log::debug!("Read part {} ({} bytes)", name, content.len());
        Ok(Some(content))
    }

    /// Read and parse an optional XML part.
    pub fn xml_part(&mut self, name: &str) -> Result<Option<XmlElement>, FormatError> {
        self.read_part(name)?
            .map(|xml| parse_document(name, &xml))
            .transpose()
    }

    /// Read and parse a part the presentation cannot be built without.
    pub fn required_xml_part(&mut self, name: &str) -> Result<XmlElement, FormatError> {
        self.xml_part(name)?
            .ok_or_else(|| FormatError::MissingPart(name.to_string()))
    }
}
