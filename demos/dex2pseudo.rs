use dexpseudo::disassemble_all;
use dexpseudo::types::DecodeOptions;
use std::env;
use std::error::Error;
use std::fs;

fn main() {
    let args: Vec<String> = env::args().skip(1).collect();
    if args.is_empty() {
        println!("Usage: dex2pseudo <classes.dex>...");
        return;
    }

    // Do everything else with the error trap
    match process_dex(&args) {
        Ok(failed) if failed == 0 => println!("All done"),
        Ok(failed) => println!("Done, {} file(s) could not be decoded", failed),
        Err(e) => println!("Aborted due to error: {:?}", e),
    }
}

/* Decode every file given on the command line and print its classes */
fn process_dex(paths: &[String]) -> Result<usize, Box<dyn Error>> {
    let mut inputs = Vec::with_capacity(paths.len());
    for p in paths {
        inputs.push((p.clone(), fs::read(p)?));
    }

    let report = disassemble_all(inputs, &DecodeOptions::default());

    for (id, dex) in &report.decoded {
        println!("// {} (version {:?})", id, dex.version);
        for class in &dex.classes {
            match &class.superclass {
                Some(sup) => println!("Class: {} extends {} {{", class.name, sup),
                None => println!("Class: {} {{", class.name),
            }
            for line in &class.lines {
                println!("    {}", line);
            }
            println!("}}");
        }
    }
    for (id, e) in &report.failures {
        println!("// {} failed: {}", id, e);
    }

    Ok(report.failures.len())
}
