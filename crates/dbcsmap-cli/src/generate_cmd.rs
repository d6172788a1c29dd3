use std::path::Path;

use dbcsmap::{GenerateOptions, MapError, generate};

pub fn run(input: &Path, output: &Path) -> Result<(), i32> {
    if !input.exists() {
        eprintln!("Error: file not found: {}", input.display());
        return Err(1);
    }

    generate(input, output, &GenerateOptions::default())
        .map(|_| ())
        .map_err(|e| {
            match &e {
                MapError::MalformedRecord { .. } | MapError::OutOfBand { .. } => {
                    eprintln!("Error: {}: {e}", input.display());
                }
                MapError::Io(_) => {
                    eprintln!(
                        "Error: failed to compile {} into {}: {e}",
                        input.display(),
                        output.display()
                    );
                }
                _ => eprintln!("Error: {e}"),
            }
            1
        })
}
