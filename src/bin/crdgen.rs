//! # CRD Generator
//!
//! Prints the CustomResourceDefinitions of the Tempo owner resources as YAML.
//!
//! ```bash
//! cargo run --bin crdgen | kubectl apply -f -
//! ```

use kube::core::CustomResourceExt;
use tempo_operator::crd::{TempoMonolithic, TempoStack};

fn main() {
    for crd in [TempoStack::crd(), TempoMonolithic::crd()] {
        match serde_yaml::to_string(&crd) {
            Ok(yaml) => print!("---\n{yaml}"),
            Err(e) => {
                eprintln!("Failed to serialize CRD to YAML: {e}");
                std::process::exit(1);
            }
        }
    }
}
