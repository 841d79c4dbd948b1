//! Encode integration tests.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, missing_docs)]

use fastcsv_engine::{
    BufferedSink, CsvRecord, CsvValue, DecodeOptions, Decoder, EncodeOptions, Encoder, Error,
    FieldDescriptor, FieldKind, FieldMap, KeyStrategy, LineTerminator, Result, nested_value,
};

#[derive(Debug, Clone, PartialEq)]
struct Person {
    name: String,
    age: i64,
    email: Option<String>,
}

impl CsvRecord for Person {
    fn descriptors() -> &'static [FieldDescriptor] {
        const {
            &[
            FieldDescriptor::required("name", FieldKind::String),
            FieldDescriptor::required("age", FieldKind::Int),
            FieldDescriptor::optional("email", FieldKind::String),
        ]
        }
    }
    fn construct(fields: &mut FieldMap) -> Result<Self> {
        Ok(Self {
            name: fields.take_string("name")?,
            age: fields.take_int("age")?,
            email: fields.take_opt_string("email")?,
        })
    }
    fn destructure(&self) -> Vec<(&'static str, CsvValue)> {
        vec![
            ("name", self.name.as_str().into()),
            ("age", self.age.into()),
            ("email", self.email.clone().into()),
        ]
    }
}

fn people() -> Vec<Person> {
    vec![
        Person {
            name: "Alice".to_owned(),
            age: 30,
            email: Some("alice@example.com".to_owned()),
        },
        Person {
            name: "Bob".to_owned(),
            age: 41,
            email: None,
        },
    ]
}

#[test]
fn test_encode_to_vec_with_header() {
    let bytes = Encoder::new(EncodeOptions::default())
        .encode_to_vec(&people())
        .unwrap();
    assert_eq!(
        bytes,
        b"name,age,email\nAlice,30,alice@example.com\nBob,41,\n"
    );
}

#[test]
fn test_encode_empty_slice_is_empty_output() {
    let bytes = Encoder::new(EncodeOptions::default())
        .encode_to_vec::<Person>(&[])
        .unwrap();
    assert!(bytes.is_empty());
}

#[test]
fn test_encode_without_header() {
    let bytes = Encoder::new(EncodeOptions::new().has_headers(false))
        .encode_to_vec(&people())
        .unwrap();
    assert!(bytes.starts_with(b"Alice,30,"));
}

#[test]
fn test_encode_escapes_structural_fields() {
    let tricky = vec![Person {
        name: "he said \"hi\"\nbye".to_owned(),
        age: 1,
        email: Some("a,b".to_owned()),
    }];
    let bytes = Encoder::new(EncodeOptions::default())
        .encode_to_vec(&tricky)
        .unwrap();
    assert_eq!(
        bytes,
        b"name,age,email\n\"he said \"\"hi\"\"\nbye\",1,\"a,b\"\n"
    );
}

#[test]
fn test_encode_roundtrips_through_decoder() {
    let original = people();
    let bytes = Encoder::new(EncodeOptions::default())
        .encode_to_vec(&original)
        .unwrap();
    let decoded: Vec<Person> = Decoder::new(DecodeOptions::default())
        .decode_slice(&bytes)
        .unwrap();
    assert_eq!(decoded, original);
}

#[test]
fn test_encode_crlf_line_ending() {
    let bytes = Encoder::new(EncodeOptions::new().line_ending(LineTerminator::CrLf))
        .encode_to_vec(&people()[..1])
        .unwrap();
    assert!(bytes.ends_with(b"alice@example.com\r\n"));
}

#[test]
fn test_encode_key_transform_on_header() {
    let bytes = Encoder::new(EncodeOptions::new().key_strategy(KeyStrategy::FromPascal))
        .encode_to_vec(&people()[..1])
        .unwrap();
    assert!(bytes.starts_with(b"Name,Age,Email\n"));
}

#[test]
fn test_encode_nil_repr() {
    let bytes = Encoder::new(EncodeOptions::new().nil_repr("NULL"))
        .encode_to_vec(&people())
        .unwrap();
    assert!(bytes.ends_with(b"Bob,41,NULL\n"));
}

// =============================================================================
// Invalid values
// =============================================================================

#[derive(Debug)]
struct Reading {
    value: f64,
}

impl CsvRecord for Reading {
    fn descriptors() -> &'static [FieldDescriptor] {
        const {
            &[FieldDescriptor::required("value", FieldKind::Float)]
        }
    }
    fn construct(fields: &mut FieldMap) -> Result<Self> {
        Ok(Self {
            value: fields.take_float("value")?,
        })
    }
    fn destructure(&self) -> Vec<(&'static str, CsvValue)> {
        vec![("value", self.value.into())]
    }
}

#[test]
fn test_encode_rejects_nan() {
    let err = Encoder::new(EncodeOptions::default())
        .encode_to_vec(&[Reading { value: f64::NAN }])
        .unwrap_err();
    assert!(matches!(err, Error::InvalidValue(_)));
}

#[test]
fn test_encode_rejects_infinity() {
    let err = Encoder::new(EncodeOptions::default())
        .encode_to_vec(&[Reading {
            value: f64::INFINITY,
        }])
        .unwrap_err();
    assert!(matches!(err, Error::InvalidValue(_)));
}

// =============================================================================
// Nested records
// =============================================================================

#[derive(Debug, PartialEq)]
struct Address {
    city: String,
    zip: i64,
}

impl CsvRecord for Address {
    fn descriptors() -> &'static [FieldDescriptor] {
        const {
            &[
            FieldDescriptor::required("city", FieldKind::String),
            FieldDescriptor::required("zip", FieldKind::Int),
        ]
        }
    }
    fn construct(fields: &mut FieldMap) -> Result<Self> {
        Ok(Self {
            city: fields.take_string("city")?,
            zip: fields.take_int("zip")?,
        })
    }
    fn destructure(&self) -> Vec<(&'static str, CsvValue)> {
        vec![
            ("city", self.city.as_str().into()),
            ("zip", self.zip.into()),
        ]
    }
}

#[derive(Debug)]
struct Customer {
    name: String,
    address: Address,
}

impl CsvRecord for Customer {
    fn descriptors() -> &'static [FieldDescriptor] {
        const {
            &[
            FieldDescriptor::required("name", FieldKind::String),
            FieldDescriptor::required("address", FieldKind::Nested(Address::descriptors)),
        ]
        }
    }
    fn construct(fields: &mut FieldMap) -> Result<Self> {
        Ok(Self {
            name: fields.take_string("name")?,
            address: fields.take_nested("address")?,
        })
    }
    fn destructure(&self) -> Vec<(&'static str, CsvValue)> {
        vec![
            ("name", self.name.as_str().into()),
            ("address", nested_value(&self.address)),
        ]
    }
}

#[test]
fn test_encode_flattens_nested_records() {
    let customers = vec![Customer {
        name: "Alice".to_owned(),
        address: Address {
            city: "Oslo".to_owned(),
            zip: 1234,
        },
    }];
    let bytes = Encoder::new(EncodeOptions::default())
        .encode_to_vec(&customers)
        .unwrap();
    assert_eq!(bytes, b"name,address.city,address.zip\nAlice,Oslo,1234\n");
}

// =============================================================================
// Async paths
// =============================================================================

#[tokio::test]
async fn test_encode_path_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("people.csv");
    Encoder::new(EncodeOptions::default())
        .encode_path(&people(), &path)
        .await
        .unwrap();
    let decoded: Vec<Person> = Decoder::new(DecodeOptions::default())
        .decode_path(&path)
        .unwrap();
    assert_eq!(decoded, people());
}

#[tokio::test]
async fn test_stream_encoder_pull_variant() {
    let sink = BufferedSink::new(Vec::new());
    let mut encoder = Encoder::new(EncodeOptions::default()).stream_writer(sink);
    let stream = futures_util::stream::iter(people());
    encoder.write_stream(stream).await.unwrap();
    assert_eq!(encoder.rows_written(), 2);
    encoder.finish().await.unwrap();
}

#[tokio::test]
async fn test_stream_encoder_header_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("stream.csv");
    let sink = BufferedSink::create(&path).await.unwrap();
    let mut encoder = Encoder::new(EncodeOptions::default()).stream_writer(sink);
    for person in people() {
        encoder.write_record(&person).await.unwrap();
    }
    encoder.finish().await.unwrap();

    let written = std::fs::read(&path).unwrap();
    assert_eq!(
        written,
        b"name,age,email\nAlice,30,alice@example.com\nBob,41,\n"
    );
}
