use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Float64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use chrono::{Duration, NaiveDate};
use parquet::arrow::ArrowWriter;

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn below(&mut self, n: usize) -> usize {
        (self.next_u64() % n as u64) as usize
    }

    fn pick<'a>(&mut self, items: &[&'a str]) -> &'a str {
        items[self.below(items.len())]
    }

    /// True with probability `p`.
    fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }
}

/// Country name with a rough centre of its coastline.
const COUNTRIES: &[(&str, f64, f64)] = &[
    ("Indonesia", -6.0, 110.0),
    ("Malaysia", 4.0, 103.0),
    ("Philippines", 12.0, 122.0),
    ("Thailand", 10.0, 100.5),
    ("Vietnam", 14.0, 109.0),
];

/// Deliberately messy spellings, as seen in hand-entered survey data.
const POLLUTION_TYPES: &[&str] = &[
    "oil spill", "Oil Spills", " OIL SPILL ", "plastic waste", "Plastic Waste",
    "waste dumped overboard", "ghost nets", "Sewage", "-", "n/a", "No Data", "0", "",
];

const MATERIALS: &[&str] = &["crude oil", "bottles", "fishing net", "bags", "tar balls", ""];
const AWARENESS: &[&str] = &["Yes", "No", "Not sure", ""];

fn main() -> Result<()> {
    let output_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "sample_incidents.parquet".to_string());
    let mut rng = SimpleRng::new(42);
    let start = NaiveDate::from_ymd_opt(2019, 1, 1).context("invalid start date")?;

    let n = 500;
    let mut dates: Vec<Option<String>> = Vec::with_capacity(n);
    let mut qty: Vec<Option<String>> = Vec::with_capacity(n);
    let mut lat: Vec<Option<f64>> = Vec::with_capacity(n);
    let mut lon: Vec<Option<f64>> = Vec::with_capacity(n);
    let mut country: Vec<Option<&str>> = Vec::with_capacity(n);
    let mut ptype: Vec<Option<&str>> = Vec::with_capacity(n);
    let mut material: Vec<Option<&str>> = Vec::with_capacity(n);
    let mut aware: Vec<Option<&str>> = Vec::with_capacity(n);
    let mut note: Vec<Option<String>> = Vec::with_capacity(n);

    for i in 0..n {
        let (name, clat, clon) = COUNTRIES[rng.below(COUNTRIES.len())];
        let day = start + Duration::days(rng.below(5 * 365) as i64);

        dates.push(match rng.below(20) {
            0 => None,
            1 => Some("unknown".to_string()),
            2 => Some(day.format("%m/%d/%Y").to_string()),
            _ => Some(day.format("%Y-%m-%d").to_string()),
        });
        qty.push(if rng.chance(0.1) {
            Some("approx. lots".to_string())
        } else {
            Some(format!("{:.1}", rng.next_f64() * 500.0))
        });

        // About 3% of rows lose a coordinate and get dropped on load.
        let missing_coord = rng.chance(0.03);
        lat.push((!missing_coord).then(|| clat + (rng.next_f64() - 0.5) * 6.0));
        lon.push(Some(clon + (rng.next_f64() - 0.5) * 6.0));

        country.push(Some(name));
        ptype.push(if rng.chance(0.05) {
            None
        } else {
            Some(rng.pick(POLLUTION_TYPES))
        });
        material.push(Some(rng.pick(MATERIALS)).filter(|m| !m.is_empty()));
        aware.push(Some(rng.pick(AWARENESS)).filter(|a| !a.is_empty()));
        note.push(Some(format!("entry #{i} checked by volunteer")));
    }

    let schema = Arc::new(Schema::new(vec![
        Field::new("inc_date", DataType::Utf8, true),
        Field::new("pollution_qty", DataType::Utf8, true),
        Field::new("LAT_1", DataType::Float64, true),
        Field::new("LONG", DataType::Float64, true),
        Field::new("Country", DataType::Utf8, true),
        Field::new("pollution_type", DataType::Utf8, true),
        Field::new("material", DataType::Utf8, true),
        Field::new("aware_ans", DataType::Utf8, true),
        Field::new("Note_Reporter", DataType::Utf8, true),
    ]));

    let columns: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from(dates)),
        Arc::new(StringArray::from(qty)),
        Arc::new(Float64Array::from(lat)),
        Arc::new(Float64Array::from(lon)),
        Arc::new(StringArray::from(country)),
        Arc::new(StringArray::from(ptype)),
        Arc::new(StringArray::from(material)),
        Arc::new(StringArray::from(aware)),
        Arc::new(StringArray::from(note)),
    ];
    let batch = RecordBatch::try_new(schema.clone(), columns).context("building record batch")?;

    let file = std::fs::File::create(&output_path)
        .with_context(|| format!("creating {output_path}"))?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing batch")?;
    writer.close().context("closing parquet writer")?;

    println!("Wrote {n} sample incidents to {output_path}");
    Ok(())
}
