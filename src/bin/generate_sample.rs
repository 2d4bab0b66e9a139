use anyhow::{Context, Result};
use rust_xlsxwriter::{Format, Workbook};

/// Serial number of 2024-01-01 in the spreadsheet day count.
const FIRST_DAY_SERIAL: f64 = 45292.0;

const HEADERS: [&str; 9] = [
    "DATE",
    "TIME",
    "COMP_NAME",
    "COMP_NUMBER",
    "MP_NAME",
    "OVERALL_VEL",
    "OVERALL_ACC",
    "BEARING_COND",
    "REMARKS",
];

/// Deterministic noise source for the synthetic readings (splitmix64).
struct Noise(u64);

impl Noise {
    fn next(&mut self) -> f64 {
        self.0 = self.0.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.0;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        (z ^ (z >> 31)) as f64 / u64::MAX as f64
    }

    /// Uniform between `lo` and `hi`.
    fn between(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.next()
    }

    /// Roughly normal jitter: sum of four uniforms, rescaled.
    fn jitter(&mut self, spread: f64) -> f64 {
        let sum: f64 = (0..4).map(|_| self.next()).sum();
        (sum - 2.0) * spread * 3f64.sqrt()
    }
}

fn main() -> Result<()> {
    let mut noise = Noise(42);

    // (component, number, measurement points, baseline velocity mm/s)
    let components: [(&str, i64, &[&str], f64); 3] = [
        ("Main Engine", 1, &["DE Horizontal", "NDE Vertical"], 4.5),
        ("Cooling Pump", 2, &["Motor DE", "Pump NDE"], 2.8),
        ("Purifier", 3, &["Bowl"], 6.0),
    ];
    let days = 30;

    let mut workbook = Workbook::new();
    let date_format = Format::new().set_num_format("yyyy-mm-dd");
    let sheet = workbook.add_worksheet();
    sheet.set_name("CBM")?;

    for (col, name) in HEADERS.iter().enumerate() {
        sheet.write_string(0, col as u16, *name)?;
    }

    let mut row: u32 = 1;
    for day in 0..days {
        // Slow upward drift so the chart shows a trend.
        let wear = 1.0 + day as f64 * 0.01;
        for &(comp, number, points, baseline) in &components {
            for &point in points {
                let time = noise.between(0.25, 0.75);
                let vel = (baseline * wear + noise.jitter(0.3)).max(0.1);
                let acc = (vel * 0.8 + noise.jitter(0.2)).max(0.05);

                sheet.write_number_with_format(row, 0, FIRST_DAY_SERIAL + day as f64, &date_format)?;
                sheet.write_number(row, 1, time)?;
                sheet.write_string(row, 2, comp)?;
                sheet.write_number(row, 3, number as f64)?;
                sheet.write_string(row, 4, point)?;
                sheet.write_number(row, 5, (vel * 100.0).round() / 100.0)?;
                // A few readings arrive as text and exercise value coercion.
                if noise.next() < 0.02 {
                    sheet.write_string(row, 6, "n/a")?;
                } else {
                    sheet.write_number(row, 6, (acc * 100.0).round() / 100.0)?;
                }
                sheet.write_string(row, 7, if vel > baseline * 1.2 { "ALERT" } else { "OK" })?;
                // REMARKS stays empty in every row.
                row += 1;
            }
        }
    }

    let output_path = "Sample Vessel CBM Report.xlsx";
    workbook
        .save(output_path)
        .with_context(|| format!("writing {output_path}"))?;

    println!("Wrote {} readings over {days} days to {output_path}", row - 1);
    Ok(())
}
