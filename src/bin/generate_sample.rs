use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_xlsxwriter::{Workbook, XlsxError};

/// Box-Muller transform for normal distribution
fn gauss(rng: &mut StdRng, mean: f64, std_dev: f64) -> f64 {
    let u1: f64 = rng.gen::<f64>().max(1e-15);
    let u2: f64 = rng.gen();
    let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
    mean + std_dev * z
}

fn main() -> Result<(), XlsxError> {
    let mut rng = StdRng::seed_from_u64(42);

    // (code, mean CT in °C, replicates)
    let treatments = [
        ("C", 36.8, 10),
        ("H", 36.1, 9),
        ("HC", 36.4, 10),
        ("HC-H", 35.7, 8),
        ("HT", 35.2, 10),
        ("HT-H", 34.6, 9),
        ("HT-HC", 34.9, 10),
        ("HT-HC-H", 33.8, 1),
    ];

    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name("dt_MO2_messy")?;

    for (col, name) in ["Specimen_ID", "Treat", "CT1", "MO2"].iter().enumerate() {
        sheet.write_string(0, col as u16, *name)?;
    }

    let mut row: u32 = 1;
    let mut specimen = 1;
    let mut blanks = 0;
    for &(code, mean, replicates) in &treatments {
        for rep in 0..replicates {
            // Every few specimens the respirometry chamber ran empty.
            if rep % 4 == 3 {
                sheet.write_string(row, 0, format!("blank_{code}_{rep}"))?;
                sheet.write_string(row, 1, code)?;
                sheet.write_number(row, 2, 0.0)?;
                row += 1;
                blanks += 1;
            }

            // Half of the HT-HC rows carry the data-entry typo.
            let label = if code == "HT-HC" && rep % 2 == 0 { "HT_HC" } else { code };
            sheet.write_string(row, 0, format!("ED{specimen:03}"))?;
            sheet.write_string(row, 1, label)?;
            sheet.write_number(row, 2, (gauss(&mut rng, mean, 0.6) * 10.0).round() / 10.0)?;
            sheet.write_number(row, 3, gauss(&mut rng, 2.4, 0.3).max(0.1))?;
            row += 1;
            specimen += 1;
        }
    }

    let output_path = "CT_deadlytrio.xlsx";
    workbook.save(output_path)?;

    println!(
        "Wrote {} specimens and {blanks} blank rows to {output_path}",
        specimen - 1
    );
    Ok(())
}
