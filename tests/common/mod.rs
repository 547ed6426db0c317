#![allow(dead_code)]

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// A record written into a test input, with whether the loader should accept it
pub struct Planted {
    pub header: String,
    pub sequence: Vec<u8>,
    pub accepted: bool,
}

pub fn random_sequence(rng: &mut SmallRng, len: usize) -> Vec<u8> {
    (0..len).map(|_| b"ACGT"[rng.random_range(0..4)]).collect()
}

/// Builds a mix of accepted, too-short, and ambiguous records
pub fn plant_records(n: usize, seed: u64) -> Vec<Planted> {
    let mut rng = SmallRng::seed_from_u64(seed);
    (0..n)
        .map(|i| {
            let len = rng.random_range(150..700);
            let mut sequence = random_sequence(&mut rng, len);
            let ambiguous = i % 7 == 3;
            if ambiguous {
                let pos = rng.random_range(0..sequence.len());
                sequence[pos] = b'N';
            }
            let accepted = !ambiguous && sequence.len() >= 200;
            Planted {
                header: format!(">transcript_{i} len={}", sequence.len()),
                sequence,
                accepted,
            }
        })
        .collect()
}

/// Writes records with 60-column body lines, preceded by a headerless preamble
pub fn write_input(path: &Path, records: &[Planted]) -> std::io::Result<()> {
    let mut file = fs::File::create(path)?;
    writeln!(file, "ACGTACGTACGT preamble that belongs to no record")?;
    for record in records {
        writeln!(file, "{}", record.header)?;
        for chunk in record.sequence.chunks(60) {
            file.write_all(chunk)?;
            writeln!(file)?;
        }
    }
    Ok(())
}

#[cfg(unix)]
pub fn script(dir: &Path, name: &str, body: &str) -> std::io::Result<PathBuf> {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{body}\n"))?;
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755))?;
    Ok(path)
}

/// `svm-scale -r <range> <input>`: echoes the input unchanged
pub const SCALE_STUB: &str = "[ -f \"$2\" ] || { echo \"missing range $2\" >&2; exit 1; }\ncat \"$3\"";

/// `svm-predict -q <input> <model> <output>`: predicts 1 for every line
pub const PREDICT_STUB: &str = "[ -f \"$3\" ] || { echo \"can not open model $3\" >&2; exit 1; }\nsed 's/.*/1/' \"$2\" > \"$4\"";

/// `java -cp <jar> <classifier> -t <train> -T <relation> -p 0`: one `2:1` row per data line
pub const JAVA_STUB: &str = "n=$(sed -n '/@DATA/,$p' \"$7\" | tail -n +2 | grep -c .)
echo ''
echo '=== Predictions on test data ==='
echo ''
echo ' inst#     actual  predicted error prediction'
i=1
while [ \"$i\" -le \"$n\" ]; do
  echo \"     $i        1:?       2:1       0.9\"
  i=$((i+1))
done";
