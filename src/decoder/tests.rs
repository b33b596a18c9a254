use super::*;
use crate::dictionary::SessionDictionary;
use crate::error::Error;
use crate::qname::QualifiedName;
use crate::value::ArrayValue;

const SOAP_NS: &str = "http://www.w3.org/2003/05/soap-envelope";
const ADDRESSING_NS: &str = "http://www.w3.org/2005/08/addressing";

fn qn(prefix: &str, local: &str, ns: &str) -> QualifiedName {
    QualifiedName::with_namespace(prefix, local, ns)
}

/// `<s:Envelope xmlns:s="...soap-envelope"><s:Body/></s:Envelope>` nur mit
/// statischen Dictionary-Referenzen.
fn soap_envelope_bytes() -> Vec<u8> {
    vec![
        0x56, 0x02, // PrefixDictionaryElementS "Envelope"
        0x0B, 0x01, b's', 0x04, // DictionaryXmlnsAttribute s = soap-envelope
        0x56, 0x0E, // PrefixDictionaryElementS "Body"
        0x01, // EndElement Body
        0x01, // EndElement Envelope
    ]
}

// ========================================================================
// Grundstruktur
// ========================================================================

/// Minimal document `<a/>`.
#[test]
fn minimal_element() {
    let nodes = decode(&[0x40, 0x01, b'a', 0x01]).unwrap();
    assert_eq!(
        nodes,
        vec![Node::StartElement(QualifiedName::new("a")), Node::EndElement, Node::EndOfDocument]
    );
}

/// Dictionary-Referenzen werden zu den statischen Strings aufgelöst.
#[test]
fn soap_envelope_with_dictionary_strings() {
    let nodes = decode(&soap_envelope_bytes()).unwrap();
    assert_eq!(
        nodes,
        vec![
            Node::StartElement(qn("s", "Envelope", SOAP_NS)),
            Node::Namespace(NamespaceDecl::new("s", SOAP_NS)),
            Node::StartElement(qn("s", "Body", SOAP_NS)),
            Node::EndElement,
            Node::EndElement,
            Node::EndOfDocument,
        ]
    );
}

/// Text mit End-Element-Flag liefert Text + EndElement.
#[test]
fn text_with_end_element() {
    let mut data = vec![0x40, 0x08];
    data.extend_from_slice(b"greeting");
    data.extend_from_slice(&[0x99, 0x05]);
    data.extend_from_slice(b"Hello");
    let nodes = decode(&data).unwrap();
    assert_eq!(
        nodes,
        vec![
            Node::StartElement(QualifiedName::new("greeting")),
            Node::Text(Value::text("Hello")),
            Node::EndElement,
            Node::EndOfDocument,
        ]
    );
}

/// Mehrere Text-Records im selben Element bleiben getrennte Nodes.
#[test]
fn mixed_content() {
    let data = [
        0x40, 0x01, b'p', // <p>
        0x98, 0x01, b'x', // Chars8Text "x"
        0x40, 0x01, b'b', 0x01, // <b/>
        0x83, // OneTextWithEndElement
    ];
    let nodes = decode(&data).unwrap();
    assert_eq!(
        nodes,
        vec![
            Node::StartElement(QualifiedName::new("p")),
            Node::Text(Value::text("x")),
            Node::StartElement(QualifiedName::new("b")),
            Node::EndElement,
            Node::Text(Value::Int(1)),
            Node::EndElement,
            Node::EndOfDocument,
        ]
    );
}

/// Kommentare sind auch auf Top-Level erlaubt.
#[test]
fn comments() {
    let data = [
        0x02, 0x02, b'h', b'i', // <!--hi-->
        0x40, 0x01, b'a', // <a>
        0x02, 0x00, // <!---->
        0x01,
    ];
    let nodes = decode(&data).unwrap();
    assert_eq!(
        nodes,
        vec![
            Node::Comment("hi".into()),
            Node::StartElement(QualifiedName::new("a")),
            Node::Comment("".into()),
            Node::EndElement,
            Node::EndOfDocument,
        ]
    );
}

// ========================================================================
// Attribute und Namespaces
// ========================================================================

/// Attribute mit typisierten Werten: 0 und 300000000000 als gleiche Integer-Werte.
#[test]
fn attributes_with_typed_values() {
    let mut data = vec![0x40, 0x01, b'a'];
    data.extend_from_slice(&[0x04, 0x01, b'x', 0x80]); // x="0" (ZeroText)
    data.extend_from_slice(&[0x04, 0x01, b'y', 0x8E]); // y = Int64Text
    data.extend_from_slice(&300_000_000_000i64.to_le_bytes());
    data.push(0x01);
    let nodes = decode(&data).unwrap();
    assert_eq!(
        nodes[1],
        Node::Attribute(AttributeNode::new(QualifiedName::new("x"), Value::Int(0)))
    );
    assert_eq!(
        nodes[2],
        Node::Attribute(AttributeNode::new(QualifiedName::new("y"), Value::Int(300_000_000_000)))
    );
}

/// Deklaration nach dem Attribut gilt trotzdem für dessen Prefix.
#[test]
fn declaration_after_use_on_same_element() {
    let data = [
        0x41, 0x02, b'p', b'x', 0x01, b'e', // Element px:e
        0x05, 0x02, b'p', b'x', 0x01, b'k', 0x86, // Attribute px:k = TrueText
        0x09, 0x02, b'p', b'x', 0x03, b'u', b':', b'x', // xmlns:px="u:x"
        0x01,
    ];
    let nodes = decode(&data).unwrap();
    assert_eq!(
        nodes,
        vec![
            Node::StartElement(qn("px", "e", "u:x")),
            Node::Attribute(AttributeNode::new(qn("px", "k", "u:x"), Value::Bool(true))),
            Node::Namespace(NamespaceDecl::new("px", "u:x")),
            Node::EndElement,
            Node::EndOfDocument,
        ]
    );
}

/// Default-Namespace gilt für Elemente, nicht für unprefixed Attribute.
#[test]
fn default_namespace_applies_to_elements_only() {
    let data = [
        0x40, 0x01, b'r', // <r>
        0x08, 0x03, b'u', b':', b'd', // xmlns="u:d"
        0x04, 0x01, b'k', 0xA8, // k="" (EmptyText)
        0x40, 0x01, b'c', 0x01, // <c/>
        0x01,
    ];
    let nodes = decode(&data).unwrap();
    assert_eq!(nodes[0], Node::StartElement(qn("", "r", "u:d")));
    assert_eq!(nodes[1], Node::Namespace(NamespaceDecl::new("", "u:d")));
    assert_eq!(nodes[2], Node::Attribute(AttributeNode::new(QualifiedName::new("k"), Value::Empty)));
    assert_eq!(nodes[3], Node::StartElement(qn("", "c", "u:d")));
}

/// Namespace-Bindungen enden mit ihrem Element.
#[test]
fn namespace_scope_ends_with_element() {
    let data = [
        0x40, 0x01, b'r', // <r>
        0x40, 0x01, b'c', // <c xmlns:a="u:a">
        0x09, 0x01, b'a', 0x03, b'u', b':', b'a', //
        0x01, // </c>
        0x5E, 0x01, b'd', // <a:d> ohne Deklaration
        0x01, 0x01,
    ];
    assert_eq!(decode(&data).unwrap_err(), Error::UnresolvedPrefix("a".into()));
}

/// `xml`-Prefix ist immer gebunden.
#[test]
fn xml_prefix_is_predefined() {
    let data = [
        0x40, 0x01, b'r', //
        0x05, 0x03, b'x', b'm', b'l', 0x04, b'l', b'a', b'n', b'g', 0x98, 0x02, b'd', b'e', //
        0x01,
    ];
    let nodes = decode(&data).unwrap();
    assert_eq!(
        nodes[1],
        Node::Attribute(AttributeNode::new(
            qn("xml", "lang", crate::qname::XML_NS),
            Value::text("de")
        ))
    );
}

/// WS-Addressing Header mit Prefix-Dictionary-Attributen.
#[test]
fn prefix_dictionary_attribute() {
    let data = [
        0x56, 0x02, // s:Envelope
        0x0B, 0x01, b's', 0x04, // xmlns:s
        0x0B, 0x01, b'a', 0x06, // xmlns:a = addressing
        0x56, 0x08, // s:Header
        0x44, 0x0A, // a:Action
        0x1E, 0x00, 0x82, // s:mustUnderstand="1" (PrefixDictionaryAttributeS)
        0x99, 0x01, b'x', // Chars8TextWithEndElement "x"
        0x01, // </s:Header>
        0x01, // </s:Envelope>
    ];
    let nodes = decode(&data).unwrap();
    assert_eq!(nodes[4], Node::StartElement(qn("a", "Action", ADDRESSING_NS)));
    assert_eq!(
        nodes[5],
        Node::Attribute(AttributeNode::new(qn("s", "mustUnderstand", SOAP_NS), Value::Int(1)))
    );
    assert_eq!(nodes[6], Node::Text(Value::text("x")));
    assert_eq!(nodes[7], Node::EndElement);
}

// ========================================================================
// Arrays
// ========================================================================

/// Array-Record: StartElement, Attribute, Text(Array), EndElement.
#[test]
fn array_record() {
    let mut data = vec![0x03, 0x40, 0x01, b'v', 0x04, 0x01, b'k', 0x80, 0x01, 0x8D, 0x03];
    for i in [1i32, -2, 3] {
        data.extend_from_slice(&i.to_le_bytes());
    }
    let nodes = decode(&data).unwrap();
    assert_eq!(
        nodes,
        vec![
            Node::StartElement(QualifiedName::new("v")),
            Node::Attribute(AttributeNode::new(QualifiedName::new("k"), Value::Int(0))),
            Node::Text(Value::Array(ArrayValue::Int32(vec![1, -2, 3]))),
            Node::EndElement,
            Node::EndOfDocument,
        ]
    );
}

/// Array-Record als Kind-Element.
#[test]
fn nested_array_record() {
    let data = [0x40, 0x01, b'r', 0x03, 0x40, 0x01, b'b', 0x01, 0xB5, 0x02, 0x01, 0x00, 0x01];
    let nodes = decode(&data).unwrap();
    assert_eq!(nodes[2], Node::Text(Value::Array(ArrayValue::Bool(vec![true, false]))));
    assert_eq!(nodes.len(), 6);
}

/// Array ohne EndElement-Record nach dem Element ist malformed.
#[test]
fn array_requires_end_element_record() {
    let data = [0x03, 0x40, 0x01, b'v', 0x98, 0x00];
    assert!(matches!(decode(&data), Err(Error::MalformedRecordSequence { .. })));
}

/// Array-Anzahl größer als die Eingabe → TruncatedInput ohne Riesen-Allokation.
#[test]
fn array_count_beyond_input() {
    let data = [0x03, 0x40, 0x01, b'v', 0x01, 0x8F, 0xFF, 0xFF, 0x03];
    assert_eq!(decode(&data).unwrap_err(), Error::TruncatedInput);
}

// ========================================================================
// Fehlerfälle
// ========================================================================

/// Einzelnes EndElement ohne Start → UnbalancedElement.
#[test]
fn lone_end_element() {
    assert_eq!(decode(&[0x01]).unwrap_err(), Error::UnbalancedElement);
}

/// Deklarierte Länge über das Stream-Ende hinaus.
#[test]
fn text_length_beyond_input() {
    let data = [0x40, 0x01, b'a', 0x98, 0x05, b'a', b'b'];
    assert_eq!(decode(&data).unwrap_err(), Error::TruncatedInput);
}

/// Unbekannte Tag-Bytes.
#[test]
fn unsupported_record_types() {
    for t in [0x00, 0x78, 0x7F, 0xBE, 0xFF] {
        assert_eq!(decode(&[t]).unwrap_err(), Error::UnsupportedRecordType(t), "0x{t:02X}");
    }
}

/// Stream-Ende mit offenem Element.
#[test]
fn open_element_at_end() {
    assert_eq!(decode(&[0x40, 0x01, b'a']).unwrap_err(), Error::TruncatedDocument);
    assert_eq!(
        decode(&[0x40, 0x01, b'a', 0x40, 0x01, b'b', 0x01]).unwrap_err(),
        Error::TruncatedDocument
    );
}

/// Leere Eingabe enthält kein Root-Element.
#[test]
fn empty_input() {
    assert_eq!(decode(&[]).unwrap_err(), Error::TruncatedDocument);
    assert_eq!(decode(&[0x02, 0x00]).unwrap_err(), Error::TruncatedDocument);
}

/// Zweites Root-Element.
#[test]
fn second_root_element() {
    let data = [0x40, 0x01, b'a', 0x01, 0x40, 0x01, b'b', 0x01];
    assert!(matches!(decode(&data), Err(Error::MalformedRecordSequence { .. })));
}

/// Text auf Top-Level.
#[test]
fn text_at_top_level() {
    let err = decode(&[0x98, 0x01, b'x']).unwrap_err();
    assert!(matches!(err, Error::MalformedRecordSequence { .. }), "{err}");
    assert!(err.to_string().contains("ExpectRootOrEnd"), "{err}");
}

/// Attribut nach Content.
#[test]
fn attribute_after_content() {
    let data = [0x40, 0x01, b'a', 0x98, 0x00, 0x04, 0x01, b'k', 0x80, 0x01];
    let err = decode(&data).unwrap_err();
    assert!(matches!(err, Error::MalformedRecordSequence { .. }), "{err}");
}

/// Attribut auf Top-Level.
#[test]
fn attribute_without_element() {
    let data = [0x04, 0x01, b'k', 0x80];
    assert!(matches!(decode(&data), Err(Error::MalformedRecordSequence { .. })));
}

/// Attributwert mit End-Element-Flag ist nicht erlaubt.
#[test]
fn attribute_value_with_end_element() {
    let data = [0x40, 0x01, b'a', 0x04, 0x01, b'k', 0x81, 0x01];
    assert!(matches!(decode(&data), Err(Error::MalformedRecordSequence { .. })));
}

/// Unbekannte Dictionary-IDs (statisch und Session).
#[test]
fn unknown_dictionary_ids() {
    assert_eq!(decode(&[0x42, 0xC8, 0x7F, 0x01]).unwrap_err(), Error::UnknownDictionaryIndex(16328));
    assert_eq!(decode(&[0x42, 0x01, 0x01]).unwrap_err(), Error::UnknownDictionaryIndex(1));
}

/// MultiByteInt31 mit mehr als 31 Bits.
#[test]
fn varint_overflow_in_name() {
    let data = [0x42, 0xFF, 0xFF, 0xFF, 0xFF, 0x7F, 0x01];
    assert_eq!(decode(&data).unwrap_err(), Error::IntegerOverflow);
}

/// Ungültiges UTF-8 in einem Namen.
#[test]
fn invalid_utf8_name() {
    let data = [0x40, 0x01, 0xFF, 0x01];
    assert!(matches!(decode(&data), Err(Error::InvalidText(_))));
}

// ========================================================================
// Limits
// ========================================================================

#[test]
fn max_depth_limit() {
    let data = [0x40, 0x01, b'a', 0x40, 0x01, b'b', 0x40, 0x01, b'c', 0x01, 0x01, 0x01];
    let options = CodecOptions::default().with_max_depth(2);
    assert_eq!(
        decode_with_options(&data, &options).unwrap_err(),
        Error::ResourceLimitExceeded { limit: "max_depth", max: 2 }
    );
    let options = CodecOptions::default().with_max_depth(3);
    assert!(decode_with_options(&data, &options).is_ok());
}

#[test]
fn max_nodes_limit() {
    let data = [0x40, 0x01, b'a', 0x40, 0x01, b'b', 0x01, 0x01];
    // 5 Nodes inkl. EndOfDocument
    let options = CodecOptions::default().with_max_nodes(4);
    assert_eq!(
        decode_with_options(&data, &options).unwrap_err(),
        Error::ResourceLimitExceeded { limit: "max_nodes", max: 4 }
    );
    let options = CodecOptions::default().with_max_nodes(5);
    assert_eq!(decode_with_options(&data, &options).unwrap().len(), 5);
}

#[test]
fn max_payload_limit() {
    let mut data = vec![0x40, 0x01, b'a', 0x99, 0x10];
    data.extend_from_slice(&[b'z'; 16]);
    let options = CodecOptions::default().with_max_payload_len(8);
    assert_eq!(
        decode_with_options(&data, &options).unwrap_err(),
        Error::ResourceLimitExceeded { limit: "max_payload_len", max: 8 }
    );
}

#[test]
fn invalid_options_rejected() {
    let options = CodecOptions::default().with_max_depth(0);
    assert!(decode_with_options(&[0x40, 0x01, b'a', 0x01], &options).is_err());
}

// ========================================================================
// Session-Dictionary
// ========================================================================

/// String-Table-Block vergibt die Session-IDs 1, 3, ...
#[test]
fn session_message() {
    let data = [
        0x08, // Blockgröße
        0x03, b'F', b'o', b'o', // id 1
        0x03, b'u', b':', b'f', // id 3
        0x42, 0x01, // ShortDictionaryElement id 1
        0x0A, 0x03, // ShortDictionaryXmlnsAttribute id 3
        0xAB, 0x01, // DictionaryTextWithEndElement id 1
    ];
    let nodes = decode_session_message(&data, &CodecOptions::default()).unwrap();
    assert_eq!(
        nodes,
        vec![
            Node::StartElement(qn("", "Foo", "u:f")),
            Node::Namespace(NamespaceDecl::new("", "u:f")),
            Node::Text(Value::text("Foo")),
            Node::EndElement,
            Node::EndOfDocument,
        ]
    );
}

#[test]
fn session_dictionary_limit() {
    let data = [0x04, 0x01, b'a', 0x01, b'b', 0x40, 0x01, b'x', 0x01];
    let options = CodecOptions::default().with_max_dictionary_entries(1);
    assert_eq!(
        decode_session_message(&data, &options).unwrap_err(),
        Error::ResourceLimitExceeded { limit: "max_dictionary_entries", max: 1 }
    );
}

/// Dictionary einer Vor-Nachricht wird weiterverwendet.
#[test]
fn dictionary_carried_across_messages() {
    let session = SessionDictionary::from_strings(["Item"]);
    let dictionary = Dictionary::with_session(session);
    let data = [0x42, 0x01, 0x01];
    let mut decoder =
        Decoder::with_dictionary(&data, &CodecOptions::default(), dictionary).unwrap();
    assert_eq!(decoder.decode_node().unwrap(), Some(Node::StartElement(QualifiedName::new("Item"))));
    assert_eq!(decoder.decode_node().unwrap(), Some(Node::EndElement));
    assert_eq!(decoder.decode_node().unwrap(), Some(Node::EndOfDocument));
    assert_eq!(decoder.decode_node().unwrap(), None);
    assert_eq!(decoder.into_dictionary().session().len(), 1);
}

// ========================================================================
// Iterator
// ========================================================================

#[test]
fn iterator_yields_nodes_then_none() {
    let data = soap_envelope_bytes();
    let mut iter = decode_iter(&data);
    let mut count = 0;
    for node in iter.by_ref() {
        node.unwrap();
        count += 1;
    }
    assert_eq!(count, 6);
    assert!(iter.next().is_none());
}

/// Fehler wird einmal geliefert, danach endet die Iteration.
#[test]
fn iterator_stops_after_error() {
    let data = [0x40, 0x01, b'a', 0x01, 0x01];
    let results: Vec<_> = decode_iter(&data).collect();
    assert_eq!(results.len(), 3);
    assert_eq!(results[2].clone().unwrap_err(), Error::UnbalancedElement);
}

/// finish() gibt Fehler wenn EndOfDocument nicht erreicht wurde.
#[test]
fn finish_rejects_incomplete() {
    let data = soap_envelope_bytes();
    let mut iter = decode_iter(&data);
    iter.next().unwrap().unwrap();
    assert_eq!(iter.finish().unwrap_err(), Error::TruncatedDocument);
}

#[test]
fn decoder_depth_tracks_stack() {
    let data = soap_envelope_bytes();
    let mut decoder = Decoder::new(&data);
    decoder.decode_node().unwrap();
    assert_eq!(decoder.depth(), 1);
    while decoder.decode_node().unwrap().is_some() {}
    assert_eq!(decoder.depth(), 0);
    decoder.finish().unwrap();
}
