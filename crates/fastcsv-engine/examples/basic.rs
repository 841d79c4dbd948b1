//! Basic decode and encode example.
//!
//! This example demonstrates binding CSV rows to a record type and
//! writing records back out with RFC-compliant escaping.
//!
//! # Running
//!
//! ```bash
//! cargo run --example basic
//! ```

// Allow common patterns in example code
#![allow(clippy::unwrap_used, clippy::expect_used)]

use fastcsv_engine::{
    CsvRecord, CsvValue, DecodeOptions, Decoder, EncodeOptions, Encoder, Error, FieldDescriptor,
    FieldKind, FieldMap, Result,
};

#[derive(Debug)]
struct Employee {
    name: String,
    department: String,
    salary: i64,
}

impl CsvRecord for Employee {
    fn descriptors() -> &'static [FieldDescriptor] {
        const {
            &[
                FieldDescriptor::required("name", FieldKind::String),
                FieldDescriptor::required("department", FieldKind::String),
                FieldDescriptor::required("salary", FieldKind::Int),
            ]
        }
    }

    fn construct(fields: &mut FieldMap) -> Result<Self> {
        Ok(Self {
            name: fields.take_string("name")?,
            department: fields.take_string("department")?,
            salary: fields.take_int("salary")?,
        })
    }

    fn destructure(&self) -> Vec<(&'static str, CsvValue)> {
        vec![
            ("name", self.name.as_str().into()),
            ("department", self.department.as_str().into()),
            ("salary", self.salary.into()),
        ]
    }
}

fn main() -> std::result::Result<(), Error> {
    // Initialize tracing for logging
    tracing_subscriber::fmt::init();

    let input = b"name,department,salary\n\
                  Alice,Engineering,98000\n\
                  \"Bowen, Bob\",Sales,74000\n";

    // Decode into typed records
    let decoder = Decoder::new(DecodeOptions::default());
    let employees: Vec<Employee> = decoder.decode_slice(input)?;

    for employee in &employees {
        println!(
            "{} ({}) earns {}",
            employee.name, employee.department, employee.salary
        );
    }

    // Encode back to CSV bytes
    let encoder = Encoder::new(EncodeOptions::default());
    let bytes = encoder.encode_to_vec(&employees)?;
    println!("\nRe-encoded:\n{}", String::from_utf8_lossy(&bytes));

    Ok(())
}
