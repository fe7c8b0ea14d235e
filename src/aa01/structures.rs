use std::fmt;

use crate::io::BoundedView;

use super::value::FieldValue;

/// Magic bytes that open every record.
pub const RECORD_MAGIC: &[u8; 4] = b"AA01";

/// Size of the record header: magic plus the 16-bit total length.
pub const RECORD_HEADER_SIZE: u64 = 6;

/// Size of one field tag: three name characters plus a type code.
pub const TAG_SIZE: u64 = 4;

/// Field name that declares trailing payload bytes on any record.
pub const PAYLOAD_FIELD: &str = "dat";

/// Section kind of a top-level container record (`yop` field)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
    /// `M`: nested stream of [`LocatorRecord`]s
    Locator,
    /// `E`: nested stream of [`DataRecord`]s
    Data,
    /// `O`: nested stream of [`MetadataRecord`]s
    Metadata,
    Unknown(char),
}

impl SectionKind {
    pub fn from_char(value: char) -> Self {
        match value {
            'M' => SectionKind::Locator,
            'E' => SectionKind::Data,
            'O' => SectionKind::Metadata,
            _ => SectionKind::Unknown(value),
        }
    }

    pub fn as_char(&self) -> char {
        match self {
            SectionKind::Locator => 'M',
            SectionKind::Data => 'E',
            SectionKind::Metadata => 'O',
            SectionKind::Unknown(c) => *c,
        }
    }
}

/// Entry type discriminator (`typ` field)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryType {
    File,
    Directory,
    Symlink,
    Other(char),
}

impl EntryType {
    pub fn from_char(value: char) -> Self {
        match value {
            'F' => EntryType::File,
            'D' => EntryType::Directory,
            'L' => EntryType::Symlink,
            _ => EntryType::Other(value),
        }
    }

    pub fn as_char(&self) -> char {
        match self {
            EntryType::File => 'F',
            EntryType::Directory => 'D',
            EntryType::Symlink => 'L',
            EntryType::Other(c) => *c,
        }
    }
}

/// Stores one decoded value on a record. Returns `false` when the value's
/// kind does not fit the field.
pub type Setter<T> = fn(&mut T, FieldValue) -> bool;

/// A record variant the generic decoder can populate.
///
/// Each variant lists the field names it accepts together with a setter;
/// any other name is decoded and dropped.
pub trait Record: Default + fmt::Debug + 'static {
    /// Short name used in log output.
    const NAME: &'static str;

    /// Lowercase field name to setter table.
    const FIELDS: &'static [(&'static str, Setter<Self>)];

    /// Look up the setter for a lowercase field name.
    fn setter(name: &str) -> Option<Setter<Self>> {
        Self::FIELDS
            .iter()
            .find(|(field, _)| *field == name)
            .map(|(_, setter)| *setter)
    }

    /// Attach the window holding this record's trailing payload.
    ///
    /// Variants that do not expose a payload ignore it.
    fn attach_payload(&mut self, _payload: BoundedView) {}
}

fn set_entry_type(slot: &mut Option<EntryType>, value: FieldValue) -> bool {
    value
        .as_char()
        .map(|c| *slot = Some(EntryType::from_char(c)))
        .is_some()
}

fn set_integer(slot: &mut Option<u64>, value: FieldValue) -> bool {
    value.as_integer().map(|v| *slot = Some(v)).is_some()
}

fn set_text(slot: &mut Option<String>, value: FieldValue) -> bool {
    value.into_text().map(|v| *slot = Some(v)).is_some()
}

fn set_time(slot: &mut Option<u64>, value: FieldValue) -> bool {
    value.as_timestamp().map(|v| *slot = Some(v)).is_some()
}

/// Top-level archive entry bounding a nested section stream
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContainerRecord {
    pub typ: Option<EntryType>,
    pub yop: Option<SectionKind>,
    pub label: Option<String>,
    pub dat: Option<u64>,
    /// Window over the nested section stream
    pub payload: Option<BoundedView>,
}

impl Record for ContainerRecord {
    const NAME: &'static str = "container";
    const FIELDS: &'static [(&'static str, Setter<Self>)] = &[
        ("typ", |r: &mut Self, v: FieldValue| set_entry_type(&mut r.typ, v)),
        ("yop", |r: &mut Self, v: FieldValue| {
            v.as_char()
                .map(|c| r.yop = Some(SectionKind::from_char(c)))
                .is_some()
        }),
        ("lbl", |r: &mut Self, v: FieldValue| set_text(&mut r.label, v)),
        ("dat", |r: &mut Self, v: FieldValue| set_integer(&mut r.dat, v)),
    ];

    fn attach_payload(&mut self, payload: BoundedView) {
        self.payload = Some(payload);
    }
}

/// Layout information about the other sections (`Info`)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocatorRecord {
    pub idx: Option<u64>,
    pub idz: Option<u64>,
    pub siz: Option<u64>,
    pub typ: Option<EntryType>,
    pub yop: Option<SectionKind>,
    pub label: Option<String>,
}

impl Record for LocatorRecord {
    const NAME: &'static str = "locator";
    const FIELDS: &'static [(&'static str, Setter<Self>)] = &[
        ("idx", |r: &mut Self, v: FieldValue| set_integer(&mut r.idx, v)),
        ("idz", |r: &mut Self, v: FieldValue| set_integer(&mut r.idz, v)),
        ("siz", |r: &mut Self, v: FieldValue| set_integer(&mut r.siz, v)),
        ("typ", |r: &mut Self, v: FieldValue| set_entry_type(&mut r.typ, v)),
        ("yop", |r: &mut Self, v: FieldValue| {
            v.as_char()
                .map(|c| r.yop = Some(SectionKind::from_char(c)))
                .is_some()
        }),
        ("lbl", |r: &mut Self, v: FieldValue| set_text(&mut r.label, v)),
    ];
}

/// Ownership, mode and timestamps of one archive path (`Meta`)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataRecord {
    pub path: Option<String>,
    pub typ: Option<EntryType>,
    pub uid: Option<u64>,
    pub gid: Option<u64>,
    pub mode: Option<u64>,
    pub flags: Option<u64>,
    pub mtime: Option<u64>,
    pub ctime: Option<u64>,
}

impl Record for MetadataRecord {
    const NAME: &'static str = "metadata";
    const FIELDS: &'static [(&'static str, Setter<Self>)] = &[
        ("pat", |r: &mut Self, v: FieldValue| set_text(&mut r.path, v)),
        ("typ", |r: &mut Self, v: FieldValue| set_entry_type(&mut r.typ, v)),
        ("uid", |r: &mut Self, v: FieldValue| set_integer(&mut r.uid, v)),
        ("gid", |r: &mut Self, v: FieldValue| set_integer(&mut r.gid, v)),
        ("mod", |r: &mut Self, v: FieldValue| set_integer(&mut r.mode, v)),
        ("flg", |r: &mut Self, v: FieldValue| set_integer(&mut r.flags, v)),
        ("mtm", |r: &mut Self, v: FieldValue| set_time(&mut r.mtime, v)),
        ("ctm", |r: &mut Self, v: FieldValue| set_time(&mut r.ctime, v)),
    ];
}

/// One archive path and, for files, the location of its contents (`Data`)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataRecord {
    pub path: Option<String>,
    pub typ: Option<EntryType>,
    pub flags: Option<u64>,
    pub dat: Option<u64>,
    /// Window over the file contents in the shared source
    pub payload: Option<BoundedView>,
}

impl DataRecord {
    /// Absolute source offset of the contents, if any were declared.
    pub fn payload_offset(&self) -> Option<u64> {
        self.payload.as_ref().map(BoundedView::start)
    }

    /// Whether this record carries bytes worth writing out.
    pub fn has_content(&self) -> bool {
        self.dat.is_some_and(|size| size > 0) && self.payload.is_some()
    }
}

impl Record for DataRecord {
    const NAME: &'static str = "data";
    const FIELDS: &'static [(&'static str, Setter<Self>)] = &[
        ("pat", |r: &mut Self, v: FieldValue| set_text(&mut r.path, v)),
        ("typ", |r: &mut Self, v: FieldValue| set_entry_type(&mut r.typ, v)),
        ("flg", |r: &mut Self, v: FieldValue| set_integer(&mut r.flags, v)),
        ("dat", |r: &mut Self, v: FieldValue| set_integer(&mut r.dat, v)),
    ];

    fn attach_payload(&mut self, payload: BoundedView) {
        self.payload = Some(payload);
    }
}

/// Any entity produced while walking an archive
#[derive(Debug, Clone, PartialEq)]
pub enum Entity {
    Container(ContainerRecord),
    Locator(LocatorRecord),
    Metadata(MetadataRecord),
    Data(DataRecord),
}

impl From<ContainerRecord> for Entity {
    fn from(record: ContainerRecord) -> Self {
        Entity::Container(record)
    }
}

impl From<LocatorRecord> for Entity {
    fn from(record: LocatorRecord) -> Self {
        Entity::Locator(record)
    }
}

impl From<MetadataRecord> for Entity {
    fn from(record: MetadataRecord) -> Self {
        Entity::Metadata(record)
    }
}

impl From<DataRecord> for Entity {
    fn from(record: DataRecord) -> Self {
        Entity::Data(record)
    }
}

/// Renders an optional field for listings, `-` when unset.
struct Opt<'a, T>(&'a Option<T>);

impl<T: fmt::Display> fmt::Display for Opt<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(v) => v.fmt(f),
            None => f.pad("-"),
        }
    }
}

// Numeric columns keep the dash right-aligned within the field width.
macro_rules! impl_opt_numeric_fmt {
    ($($trait:ident),*) => {$(
        impl<T: fmt::$trait> fmt::$trait for Opt<'_, T> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                match self.0 {
                    Some(v) => fmt::$trait::fmt(v, f),
                    None => write!(f, "{:>width$}", "-", width = f.width().unwrap_or(0)),
                }
            }
        }
    )*};
}

impl_opt_numeric_fmt!(LowerHex, Octal);

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

impl fmt::Display for ContainerRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "t:{} y:{} lbl:{} dsz={:08x}",
            Opt(&self.typ),
            Opt(&self.yop),
            Opt(&self.label),
            Opt(&self.dat)
        )
    }
}

impl fmt::Display for LocatorRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "t:{} y:{} lbl:{} {:010x} {:08x} {:08x}",
            Opt(&self.typ),
            Opt(&self.yop),
            Opt(&self.label),
            Opt(&self.idx),
            Opt(&self.idz),
            Opt(&self.siz)
        )
    }
}

impl fmt::Display for MetadataRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "  t:{} {:07o} {} {} {} {:08x} {:08x}  {}",
            Opt(&self.typ),
            Opt(&self.mode),
            Opt(&self.uid),
            Opt(&self.gid),
            Opt(&self.flags),
            Opt(&self.mtime),
            Opt(&self.ctime),
            Opt(&self.path)
        )
    }
}

impl fmt::Display for DataRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.typ {
            Some(EntryType::File) => write!(
                f,
                "  {} {:08x}  {}",
                Opt(&self.flags),
                Opt(&self.dat),
                Opt(&self.path)
            ),
            Some(EntryType::Directory) => write!(f, "  - ........  {}", Opt(&self.path)),
            _ => write!(
                f,
                "  t:{} {} {:08x}  {}",
                Opt(&self.typ),
                Opt(&self.flags),
                Opt(&self.dat),
                Opt(&self.path)
            ),
        }
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Entity::Container(r) => r.fmt(f),
            Entity::Locator(r) => r.fmt(f),
            Entity::Metadata(r) => r.fmt(f),
            Entity::Data(r) => r.fmt(f),
        }
    }
}
