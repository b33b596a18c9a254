//! Record tag table.
//!
//! Every record starts with one tag byte. Text tags come in pairs: the odd
//! tag of each pair is the `...WithEndElement` variant, which closes the
//! current element after the text.

/// Tag-Konstanten.
pub mod tag {
    pub const END_ELEMENT: u8 = 0x01;
    pub const COMMENT: u8 = 0x02;
    pub const ARRAY: u8 = 0x03;

    pub const SHORT_ATTRIBUTE: u8 = 0x04;
    pub const ATTRIBUTE: u8 = 0x05;
    pub const SHORT_DICTIONARY_ATTRIBUTE: u8 = 0x06;
    pub const DICTIONARY_ATTRIBUTE: u8 = 0x07;
    pub const SHORT_XMLNS_ATTRIBUTE: u8 = 0x08;
    pub const XMLNS_ATTRIBUTE: u8 = 0x09;
    pub const SHORT_DICTIONARY_XMLNS_ATTRIBUTE: u8 = 0x0A;
    pub const DICTIONARY_XMLNS_ATTRIBUTE: u8 = 0x0B;
    pub const PREFIX_DICTIONARY_ATTRIBUTE_A: u8 = 0x0C;
    pub const PREFIX_DICTIONARY_ATTRIBUTE_Z: u8 = 0x25;
    pub const PREFIX_ATTRIBUTE_A: u8 = 0x26;
    pub const PREFIX_ATTRIBUTE_Z: u8 = 0x3F;

    pub const SHORT_ELEMENT: u8 = 0x40;
    pub const ELEMENT: u8 = 0x41;
    pub const SHORT_DICTIONARY_ELEMENT: u8 = 0x42;
    pub const DICTIONARY_ELEMENT: u8 = 0x43;
    pub const PREFIX_DICTIONARY_ELEMENT_A: u8 = 0x44;
    pub const PREFIX_DICTIONARY_ELEMENT_Z: u8 = 0x5D;
    pub const PREFIX_ELEMENT_A: u8 = 0x5E;
    pub const PREFIX_ELEMENT_Z: u8 = 0x77;

    // Text-Records: gerade Tags, +1 = WithEndElement
    pub const ZERO_TEXT: u8 = 0x80;
    pub const ONE_TEXT: u8 = 0x82;
    pub const FALSE_TEXT: u8 = 0x84;
    pub const TRUE_TEXT: u8 = 0x86;
    pub const INT8_TEXT: u8 = 0x88;
    pub const INT16_TEXT: u8 = 0x8A;
    pub const INT32_TEXT: u8 = 0x8C;
    pub const INT64_TEXT: u8 = 0x8E;
    pub const FLOAT_TEXT: u8 = 0x90;
    pub const DOUBLE_TEXT: u8 = 0x92;
    pub const DECIMAL_TEXT: u8 = 0x94;
    pub const DATETIME_TEXT: u8 = 0x96;
    pub const CHARS8_TEXT: u8 = 0x98;
    pub const CHARS16_TEXT: u8 = 0x9A;
    pub const CHARS32_TEXT: u8 = 0x9C;
    pub const BYTES8_TEXT: u8 = 0x9E;
    pub const BYTES16_TEXT: u8 = 0xA0;
    pub const BYTES32_TEXT: u8 = 0xA2;
    pub const START_LIST_TEXT: u8 = 0xA4;
    pub const END_LIST_TEXT: u8 = 0xA6;
    pub const EMPTY_TEXT: u8 = 0xA8;
    pub const DICTIONARY_TEXT: u8 = 0xAA;
    pub const UNIQUE_ID_TEXT: u8 = 0xAC;
    pub const TIMESPAN_TEXT: u8 = 0xAE;
    pub const UUID_TEXT: u8 = 0xB0;
    pub const UINT64_TEXT: u8 = 0xB2;
    pub const BOOL_TEXT: u8 = 0xB4;
    pub const UNICODE_CHARS8_TEXT: u8 = 0xB6;
    pub const UNICODE_CHARS16_TEXT: u8 = 0xB8;
    pub const UNICODE_CHARS32_TEXT: u8 = 0xBA;
    pub const QNAME_DICTIONARY_TEXT: u8 = 0xBC;

    pub const FIRST_TEXT: u8 = ZERO_TEXT;
    pub const LAST_TEXT: u8 = 0xBD;
}

/// Grobe Klassifikation eines Tag-Bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    EndElement,
    Comment,
    Array,
    Attribute,
    Xmlns,
    Element,
    Text,
}

impl RecordKind {
    /// Classifies `tag`; `None` for bytes outside the grammar.
    pub fn of(tag: u8) -> Option<Self> {
        Some(match tag {
            tag::END_ELEMENT => Self::EndElement,
            tag::COMMENT => Self::Comment,
            tag::ARRAY => Self::Array,
            tag::SHORT_XMLNS_ATTRIBUTE..=tag::DICTIONARY_XMLNS_ATTRIBUTE => Self::Xmlns,
            tag::SHORT_ATTRIBUTE..=tag::PREFIX_ATTRIBUTE_Z => Self::Attribute,
            tag::SHORT_ELEMENT..=tag::PREFIX_ELEMENT_Z => Self::Element,
            tag::FIRST_TEXT..=tag::LAST_TEXT => Self::Text,
            _ => return None,
        })
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::EndElement => "EndElement record",
            Self::Comment => "Comment record",
            Self::Array => "Array record",
            Self::Attribute => "attribute record",
            Self::Xmlns => "xmlns record",
            Self::Element => "element record",
            Self::Text => "text record",
        }
    }
}

/// True for text record tags (`0x80..=0xBD`).
#[inline]
pub fn is_text(tag: u8) -> bool {
    (tag::FIRST_TEXT..=tag::LAST_TEXT).contains(&tag)
}

/// True for the `...WithEndElement` variant of a text tag.
#[inline]
pub fn with_end_element(tag: u8) -> bool {
    is_text(tag) && tag & 1 == 1
}

/// Text tag without the end-element flag.
#[inline]
pub fn base_text_tag(tag: u8) -> u8 {
    tag & !1
}

/// Prefix letter index (`a` = 0) of the Prefix*Element / Prefix*Attribute tags.
pub fn prefix_letter(tag: u8) -> Option<u8> {
    match tag {
        tag::PREFIX_DICTIONARY_ATTRIBUTE_A..=tag::PREFIX_DICTIONARY_ATTRIBUTE_Z => {
            Some(tag - tag::PREFIX_DICTIONARY_ATTRIBUTE_A)
        }
        tag::PREFIX_ATTRIBUTE_A..=tag::PREFIX_ATTRIBUTE_Z => Some(tag - tag::PREFIX_ATTRIBUTE_A),
        tag::PREFIX_DICTIONARY_ELEMENT_A..=tag::PREFIX_DICTIONARY_ELEMENT_Z => {
            Some(tag - tag::PREFIX_DICTIONARY_ELEMENT_A)
        }
        tag::PREFIX_ELEMENT_A..=tag::PREFIX_ELEMENT_Z => Some(tag - tag::PREFIX_ELEMENT_A),
        _ => None,
    }
}

/// Item type tags allowed in Array records (always the `WithEndElement` form).
pub fn is_array_item_tag(tag: u8) -> bool {
    with_end_element(tag)
        && matches!(
            base_text_tag(tag),
            tag::BOOL_TEXT
                | tag::INT16_TEXT
                | tag::INT32_TEXT
                | tag::INT64_TEXT
                | tag::FLOAT_TEXT
                | tag::DOUBLE_TEXT
                | tag::DECIMAL_TEXT
                | tag::DATETIME_TEXT
                | tag::TIMESPAN_TEXT
                | tag::UUID_TEXT
        )
}
