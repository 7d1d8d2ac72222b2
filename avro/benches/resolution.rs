// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

use avro_evolve::{AvroResult, Decoder, Schema, to_avro_datum, types::Value};
use criterion::{Criterion, criterion_group, criterion_main};
use std::time::Duration;

const RAW_WRITER_SCHEMA: &str = r#"
{
  "namespace": "my.example",
  "type": "record",
  "name": "userInfo",
  "fields": [
    {"name": "username", "type": ["null", "string"], "default": null},
    {"name": "age", "type": "int", "default": -1},
    {"name": "phone", "type": ["null", "string"], "default": null},
    {"name": "housenum", "type": ["null", "string"], "default": null},
    {
      "name": "address",
      "type": {
        "type": "record",
        "name": "mailing_address",
        "fields": [
          {"name": "street", "type": "string", "default": "NONE"},
          {"name": "city", "type": "string", "default": "NONE"},
          {"name": "state_prov", "type": "string", "default": "NONE"},
          {"name": "country", "type": "string", "default": "NONE"},
          {"name": "zip", "type": "string", "default": "NONE"}
        ]
      }
    },
    {"name": "history", "type": {"type": "array", "items": "long"}}
  ]
}
"#;

// drops phone and history, promotes age, adds a field with a default
const RAW_READER_SCHEMA: &str = r#"
{
  "namespace": "my.example",
  "type": "record",
  "name": "userInfo",
  "fields": [
    {"name": "username", "type": ["null", "string"], "default": null},
    {"name": "age", "type": "double", "default": -1},
    {"name": "housenum", "type": ["null", "string"], "default": null},
    {
      "name": "address",
      "type": {
        "type": "record",
        "name": "mailing_address",
        "fields": [
          {"name": "street", "type": "string", "default": "NONE"},
          {"name": "city", "type": "string", "default": "NONE"},
          {"name": "zip", "type": "string", "default": "NONE"}
        ]
      }
    },
    {"name": "verified", "type": "boolean", "default": false}
  ]
}
"#;

fn make_record() -> Value {
    let text = |s: &str| Value::Union(1, Box::new(Value::from(s)));
    Value::Record(vec![
        ("username".into(), text("username")),
        ("age".into(), Value::Int(10)),
        ("phone".into(), text("000000000")),
        ("housenum".into(), text("0000")),
        (
            "address".into(),
            Value::Record(vec![
                ("street".into(), Value::from("street")),
                ("city".into(), Value::from("city")),
                ("state_prov".into(), Value::from("state_prov")),
                ("country".into(), Value::from("country")),
                ("zip".into(), Value::from("zip")),
            ]),
        ),
        (
            "history".into(),
            Value::Array((0..32).map(Value::Long).collect()),
        ),
    ])
}

fn write(schema: &Schema, n_records: usize) -> AvroResult<Vec<u8>> {
    let record = make_record();
    let mut bytes = Vec::new();
    for _ in 0..n_records {
        bytes.extend(to_avro_datum(schema, record.clone())?);
    }
    Ok(bytes)
}

fn read(decoder: &Decoder, bytes: &[u8], n_records: usize) -> AvroResult<()> {
    let mut cursor = bytes;
    for _ in 0..n_records {
        let _ = decoder.decode(&mut cursor, None)?;
    }
    Ok(())
}

fn bench_read(c: &mut Criterion, reader: Option<&str>, n_records: usize, name: &str) {
    let writer = Schema::parse_str(RAW_WRITER_SCHEMA).unwrap();
    let bytes = write(&writer, n_records).unwrap();
    let reader = reader.map(|raw| Schema::parse_str(raw).unwrap());
    let decoder = Decoder::builder(writer)
        .maybe_reader(reader)
        .build()
        .unwrap();
    c.bench_function(name, |b| b.iter(|| read(&decoder, &bytes, n_records)));
}

fn bench_same_schema_read_10_000_record(c: &mut Criterion) {
    bench_read(c, None, 10_000, "same schema read 10_000 records");
}

fn bench_evolved_schema_read_10_000_record(c: &mut Criterion) {
    bench_read(
        c,
        Some(RAW_READER_SCHEMA),
        10_000,
        "evolved schema read 10_000 records",
    );
}

fn bench_write_10_000_record(c: &mut Criterion) {
    let writer = Schema::parse_str(RAW_WRITER_SCHEMA).unwrap();
    c.bench_function("write 10_000 records", |b| {
        b.iter(|| write(&writer, 10_000))
    });
}

fn bench_decoder_construction(c: &mut Criterion) {
    let writer = Schema::parse_str(RAW_WRITER_SCHEMA).unwrap();
    let reader = Schema::parse_str(RAW_READER_SCHEMA).unwrap();
    let bytes = write(&writer, 1).unwrap();
    // includes compiling the plans on the first decode
    c.bench_function("decoder construction and first decode", |b| {
        b.iter(|| {
            let decoder = Decoder::new(writer.clone(), reader.clone()).unwrap();
            decoder.decode(&mut bytes.as_slice(), None)
        })
    });
}

criterion_group!(
    benches,
    bench_decoder_construction,
    bench_write_10_000_record
);

criterion_group!(
    name = long_benches;
    config = Criterion::default().sample_size(20).measurement_time(Duration::from_secs(10));
    targets =
        bench_same_schema_read_10_000_record,
        bench_evolved_schema_read_10_000_record,
);

criterion_main!(benches, long_benches);
