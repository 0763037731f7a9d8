// demos/detect.rs
//
// Run the edge pipeline on a raster file and write the edge map.
//
// Usage:
//   cargo run --example detect --release -- <input> <output> [backend] [config.json]
//
//   backend: serial | threaded | gpu   (default: serial)
//   config:  optional JSON file with threshold ratios / sigma overrides
//
// Logging goes through env_logger; set RUST_LOG=debug for per-stage
// progress.

use std::env;
use std::path::PathBuf;
use std::process;
use std::time::Instant;

use edgepipe::config::EdgeConfig;
use edgepipe::io::{load_rgb, save_gray};
use edgepipe::pipeline::{detect_edges, Backend};

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        eprintln!("Usage: {} <input> <output> [serial|threaded|gpu] [config.json]", args[0]);
        eprintln!("  e.g.: {} lenna.png edges.png threaded", args[0]);
        process::exit(1);
    }

    let input_path = PathBuf::from(&args[1]);
    let output_path = PathBuf::from(&args[2]);

    let backend = match args.get(3).map(String::as_str) {
        None | Some("serial") => Backend::Serial,
        Some("threaded") => Backend::Threaded,
        Some("gpu") => Backend::Gpu,
        Some(other) => {
            eprintln!("unknown backend '{other}' (expected serial, threaded or gpu)");
            process::exit(1);
        }
    };

    let config = match args.get(4) {
        Some(path) => match EdgeConfig::from_json_file(&PathBuf::from(path)) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("{e}");
                process::exit(1);
            }
        },
        None => EdgeConfig::default(),
    };

    let input = match load_rgb(&input_path) {
        Ok(buf) => buf,
        Err(e) => {
            eprintln!("{e}");
            process::exit(1);
        }
    };
    println!(
        "loaded {} ({}×{}), backend: {backend:?}",
        input_path.display(),
        input.width(),
        input.height()
    );

    let start = Instant::now();
    let edges = match detect_edges(input, &config, backend) {
        Ok(buf) => buf,
        Err(e) => {
            eprintln!("{e}");
            process::exit(1);
        }
    };
    println!("pipeline finished in {:.1} ms", start.elapsed().as_secs_f64() * 1e3);

    if let Err(e) = save_gray(&output_path, &edges) {
        eprintln!("{e}");
        process::exit(1);
    }
    println!("wrote {}", output_path.display());
}
