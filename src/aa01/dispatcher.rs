use std::path::Path;
use std::sync::Arc;

use crate::error::{Aa01Error, Result};
use crate::io::{BoundedView, LocalFileReader, SharedSource};

use super::parser::RecordDecoder;
use super::structures::*;

/// An AA01 archive over a shared byte source.
///
/// Nothing is read until one of the iterators is pulled; each iterator gets
/// its own view, so several walks over one archive may run side by side.
pub struct Aa01Archive {
    source: SharedSource,
}

impl Aa01Archive {
    pub fn new(source: SharedSource) -> Self {
        Self { source }
    }

    /// Open a local archive file.
    pub fn open(path: &Path) -> Result<Self> {
        let reader = LocalFileReader::new(path)?;
        Ok(Self::new(Arc::new(reader)))
    }

    pub fn source(&self) -> &SharedSource {
        &self.source
    }

    /// The top-level container records only.
    pub fn containers(&self) -> RecordDecoder<ContainerRecord> {
        RecordDecoder::new(BoundedView::whole(Arc::clone(&self.source)))
    }

    /// Every entity in file order: each container followed by the records of
    /// its section.
    pub fn entries(&self) -> Entries {
        Entries::new(self.containers())
    }

    /// Only the data records, with decode errors passed through.
    pub fn data_records(&self) -> impl Iterator<Item = Result<DataRecord>> + use<> {
        self.entries().filter_map(|entity| match entity {
            Ok(Entity::Data(record)) => Some(Ok(record)),
            Ok(_) => None,
            Err(e) => Some(Err(e)),
        })
    }
}

/// Decoder for the section currently being walked.
enum Section {
    Locator(RecordDecoder<LocatorRecord>),
    Metadata(RecordDecoder<MetadataRecord>),
    Data(RecordDecoder<DataRecord>),
}

impl Section {
    /// Pick the decoder for a container, or `None` when it has no section to walk.
    fn open(container: &ContainerRecord) -> Option<Self> {
        let kind = match container.yop {
            Some(SectionKind::Unknown(c)) => {
                log::warn!(
                    "unknown section kind {:?} ({} bytes), skipping",
                    c,
                    container.dat.unwrap_or(0)
                );
                return None;
            }
            Some(kind) => kind,
            None => {
                log::warn!("container without a section kind, skipping");
                return None;
            }
        };

        let view = container.payload.clone()?;
        log::debug!(
            "opening {:?} section at {:#x} ({} bytes)",
            kind,
            view.start(),
            view.len()
        );

        match kind {
            SectionKind::Locator => Some(Section::Locator(RecordDecoder::new(view))),
            SectionKind::Metadata => Some(Section::Metadata(RecordDecoder::new(view))),
            SectionKind::Data => Some(Section::Data(RecordDecoder::new(view))),
            SectionKind::Unknown(_) => None,
        }
    }

    fn next(&mut self) -> Option<Result<Entity>> {
        match self {
            Section::Locator(records) => records.next().map(|r| r.map(Entity::from)),
            Section::Metadata(records) => records.next().map(|r| r.map(Entity::from)),
            Section::Data(records) => records.next().map(|r| r.map(Entity::from)),
        }
    }
}

/// Lazy walk over a whole archive.
///
/// Yields each top-level [`ContainerRecord`] and then, before moving on to
/// the next container, every record of the section it bounds. Containers
/// of an unknown kind are yielded but their section is skipped. A decode
/// error ends the walk.
pub struct Entries {
    containers: RecordDecoder<ContainerRecord>,
    section: Option<Section>,
    failed: bool,
}

impl Entries {
    pub fn new(containers: RecordDecoder<ContainerRecord>) -> Self {
        Self {
            containers,
            section: None,
            failed: false,
        }
    }

    fn fail(&mut self, e: Aa01Error) -> Option<Result<Entity>> {
        self.failed = true;
        self.section = None;
        Some(Err(e))
    }
}

impl Iterator for Entries {
    type Item = Result<Entity>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        if let Some(section) = self.section.as_mut() {
            match section.next() {
                Some(Ok(entity)) => return Some(Ok(entity)),
                Some(Err(e)) => return self.fail(e),
                None => self.section = None,
            }
        }

        match self.containers.next()? {
            Ok(container) => {
                self.section = Section::open(&container);
                Some(Ok(Entity::Container(container)))
            }
            Err(e) => self.fail(e),
        }
    }
}

impl std::iter::FusedIterator for Entries {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::MemoryReader;
    use crate::test_utils::{ArchiveBuilder, RecordBuilder, file_record};

    fn archive(bytes: Vec<u8>) -> Aa01Archive {
        Aa01Archive::new(Arc::new(MemoryReader::new(bytes)))
    }

    #[test]
    fn locator_section_follows_its_container() {
        let locator = RecordBuilder::new()
            .uint("IDX", 0x20)
            .uint("IDZ", 0x10)
            .uint("SIZ", 0x400)
            .build();
        let bytes = ArchiveBuilder::new().locator_section(vec![locator]).build();

        let entities: Vec<_> = archive(bytes).entries().collect::<Result<_>>().unwrap();
        assert_eq!(entities.len(), 2);
        assert!(matches!(
            &entities[0],
            Entity::Container(c) if c.yop == Some(SectionKind::Locator)
        ));
        match &entities[1] {
            Entity::Locator(l) => {
                assert_eq!(l.idx, Some(0x20));
                assert_eq!(l.idz, Some(0x10));
                assert_eq!(l.siz, Some(0x400));
            }
            other => panic!("expected locator, got {other:?}"),
        }
    }

    #[test]
    fn sections_are_walked_in_file_order() {
        let bytes = ArchiveBuilder::new()
            .metadata_section(vec![
                RecordBuilder::new().text("PAT", "a").uint("UID", 0).build(),
            ])
            .data_section(vec![file_record("a", b"hello"), file_record("b", b"!")])
            .build();

        let kinds: Vec<&str> = archive(bytes)
            .entries()
            .map(|e| match e.unwrap() {
                Entity::Container(_) => "container",
                Entity::Locator(_) => "locator",
                Entity::Metadata(_) => "metadata",
                Entity::Data(_) => "data",
            })
            .collect();
        assert_eq!(
            kinds,
            ["container", "metadata", "container", "data", "data"]
        );
    }

    #[test]
    fn unknown_section_is_skipped() {
        let bytes = ArchiveBuilder::new()
            .section('X', "odd", vec![file_record("hidden", b"zz")])
            .raw(
                RecordBuilder::new()
                    .char_field("YOP", 'X')
                    .size("DAT", 0)
                    .build(),
            )
            .data_section(vec![file_record("seen", b"1")])
            .build();

        let entities: Vec<_> = archive(bytes).entries().collect::<Result<_>>().unwrap();
        let paths: Vec<_> = entities
            .iter()
            .filter_map(|e| match e {
                Entity::Data(d) => d.path.as_deref(),
                _ => None,
            })
            .collect();
        assert_eq!(entities.len(), 4);
        assert_eq!(paths, ["seen"]);
    }

    #[test]
    fn nested_error_ends_the_walk() {
        let broken = b"AA01\x0a\x00PATZ".to_vec();
        let bytes = ArchiveBuilder::new()
            .data_section(vec![broken])
            .data_section(vec![file_record("never", b"x")])
            .build();

        let results: Vec<_> = archive(bytes).entries().collect();
        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        assert!(matches!(
            results[1],
            Err(Aa01Error::UnknownFieldType { code: 'Z', .. })
        ));
    }

    #[test]
    fn data_payload_points_into_shared_source() {
        let bytes = ArchiveBuilder::new()
            .data_section(vec![file_record("f", b"contents")])
            .build();
        let archive = archive(bytes.clone());

        let record = archive.data_records().next().unwrap().unwrap();
        let offset = record.payload_offset().unwrap() as usize;
        assert_eq!(&bytes[offset..offset + 8], b"contents");
        assert!(Arc::ptr_eq(
            record.payload.as_ref().unwrap().source(),
            archive.source()
        ));
    }

    #[test]
    fn decoding_twice_gives_identical_entities() {
        let bytes = ArchiveBuilder::new()
            .data_section(vec![file_record("f", b"abc")])
            .build();
        let archive = archive(bytes);

        let first: Vec<_> = archive.entries().collect::<Result<_>>().unwrap();
        let second: Vec<_> = archive.entries().collect::<Result<_>>().unwrap();
        assert_eq!(first, second);
    }
}
