use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::Float64Array;
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

fn gaussian(x: f64, mu: f64, sigma: f64, amplitude: f64) -> f64 {
    amplitude * (-(x - mu).powi(2) / (2.0 * sigma.powi(2))).exp()
}

/// Synthetic dye: excitation and emission peaks as (centre, width).
struct Dye {
    name: &'static str,
    excitation: (f64, f64),
    emission: (f64, f64),
}

/// Excitation and emission columns for `dye`, scaled to `amplitude`.
fn generate_spectra(
    wavelengths: &[f64],
    dye: &Dye,
    amplitude: f64,
    rng: &mut SimpleRng,
) -> (Vec<f64>, Vec<f64>) {
    let noisy = |mu: f64, sigma: f64, rng: &mut SimpleRng| -> Vec<f64> {
        wavelengths
            .iter()
            .map(|&w| {
                let signal = gaussian(w, mu, sigma, amplitude);
                (signal + rng.gauss(0.0, amplitude * 0.002)).clamp(0.0, amplitude)
            })
            .collect()
    };
    let ex = noisy(dye.excitation.0, dye.excitation.1, rng);
    let em = noisy(dye.emission.0, dye.emission.1, rng);
    (ex, em)
}

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

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

fn write_csv(path: &Path, wavelengths: &[f64], ex: &[f64], em: &[f64]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).context("creating CSV")?;
    writer.write_record(["wavelength", "excitation", "emission"])?;
    for ((w, x), m) in wavelengths.iter().zip(ex).zip(em) {
        writer.write_record([w.to_string(), format!("{x:.3}"), format!("{m:.3}")])?;
    }
    writer.flush()?;
    Ok(())
}

fn write_parquet(path: &Path, wavelengths: &[f64], ex: &[f64], em: &[f64]) -> Result<()> {
    let schema = Arc::new(Schema::new(vec![
        Field::new("wavelength", DataType::Float64, false),
        Field::new("excitation", DataType::Float64, false),
        Field::new("emission", DataType::Float64, false),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(Float64Array::from(wavelengths.to_vec())),
            Arc::new(Float64Array::from(ex.to_vec())),
            Arc::new(Float64Array::from(em.to_vec())),
        ],
    )
    .context("building record batch")?;

    let file = std::fs::File::create(path).context("creating parquet file")?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating writer")?;
    writer.write(&batch).context("writing batch")?;
    writer.close().context("closing writer")?;
    Ok(())
}

const SETTINGS: &str = "\
fluo_list: [DyeA, DyeB]
ex_list: [405, 488, 561]
ch_reg:
  ch1: [500, 550]
  ch2: [570, 620]
";

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);

    // 350 → 750 nm, 1 nm steps
    let wavelengths: Vec<f64> = (350..=750).map(f64::from).collect();

    let dye_a = Dye {
        name: "DyeA",
        excitation: (495.0, 18.0),
        emission: (519.0, 16.0),
    };
    let dye_b = Dye {
        name: "DyeB",
        excitation: (555.0, 20.0),
        emission: (580.0, 18.0),
    };

    // Percent scale, CSV
    let (ex, em) = generate_spectra(&wavelengths, &dye_a, 100.0, &mut rng);
    let csv_path = format!("{}.csv", dye_a.name);
    write_csv(Path::new(&csv_path), &wavelengths, &ex, &em)?;

    // Fraction scale, Parquet
    let (ex, em) = generate_spectra(&wavelengths, &dye_b, 1.0, &mut rng);
    let parquet_path = format!("{}.parquet", dye_b.name);
    write_parquet(Path::new(&parquet_path), &wavelengths, &ex, &em)?;

    std::fs::write("settings.yml", SETTINGS).context("writing settings.yml")?;

    println!(
        "Wrote {csv_path}, {parquet_path} ({} wavelengths each) and settings.yml",
        wavelengths.len()
    );
    Ok(())
}
