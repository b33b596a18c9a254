//! nbfs – .NET Binary XML (MC-NBFX / MC-NBFS) Rust library
//!
//! Codec for the record-tagged binary XML encoding used by WCF/SOAP stacks.
//! Element and attribute names, namespace URIs and common text values are
//! replaced by references into a shared string dictionary.
//!
//! # Beispiel
//!
//! ```
//! use nbfs::{Node, QualifiedName, Value};
//!
//! let nodes = vec![
//!     Node::StartElement(QualifiedName::new("greeting")),
//!     Node::Text(Value::text("Hello")),
//!     Node::EndElement,
//!     Node::EndOfDocument,
//! ];
//! let bytes = nbfs::encode(&nodes).unwrap();
//! assert_eq!(bytes, [0x40, 0x08, b'g', b'r', b'e', b'e', b't', b'i', b'n', b'g',
//!                    0x99, 0x05, b'H', b'e', b'l', b'l', b'o']);
//!
//! let decoded = nbfs::decode(&bytes).unwrap();
//! assert_eq!(decoded, nodes);
//! ```

pub mod bytestream;
pub mod datetime;
pub mod decimal;
pub mod decoder;
pub mod dictionary;
pub mod encoder;
pub mod error;
pub mod multi_byte_int;
pub mod namespace;
pub mod node;
pub mod options;
pub mod qname;
pub mod record;
pub mod static_dictionary;
pub mod string;
pub mod string_table;
pub mod typed_value;
pub mod value;
pub mod xml;
pub mod xml_serializer;

pub use error::{Error, Result};

/// HashMap mit ahash (nicht DoS-resistent, nur für interne Datenstrukturen).
pub(crate) type FastHashMap<K, V> = hashbrown::HashMap<K, V, ahash::RandomState>;

// Public API: Nodes
pub use node::{AttributeNode, NamespaceDecl, Node};

// Public API: Names and values
pub use qname::QualifiedName;
pub use value::{ArrayValue, Value};
pub use datetime::{DateTime, DateTimeKind};
pub use decimal::Decimal;

// Public API: Dictionary
pub use dictionary::{DictRef, Dictionary, SessionDictionary, StaticDictionary};

// Public API: Options
pub use options::{CodecOptions, Limits};

// Public API: Encoder/Decoder
pub use decoder::{
    decode, decode_iter, decode_iter_with_options, decode_session_message, decode_with_options,
    DecodeIter, Decoder,
};
pub use encoder::{encode, encode_with_config, encode_with_options, Encoder, EncoderConfig};

// Public API: XML
pub use xml::parse_xml_nodes;
pub use xml_serializer::{nodes_to_xml, nodes_to_xml_writer, XmlStyle};
