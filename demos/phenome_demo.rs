//! Decode two small genomes, one feedforward and one recurrent, and drive
//! them the way a fitness evaluator would.
//!
//! Run with: `cargo run --example phenome_demo`

use neat_phenome::{decode, Activation, DecodeConfig, Network, NetworkGenome, NetworkKind};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Feedforward: a weighted blend of two inputs through one hidden node.
    // Hidden IDs are arbitrary sparse values, as structural hashing produces.
    let mut feedforward = NetworkGenome::new(NetworkKind::Acyclic, 2, 1, Activation::Tanh);
    feedforward.add_hidden(8_675_309);
    feedforward.connect(0, 8_675_309, 1.5);
    feedforward.connect(1, 8_675_309, -1.5);
    feedforward.connect(8_675_309, 2, 2.0);
    feedforward.connect(0, 2, 0.25);

    let mut net = decode(&feedforward, &DecodeConfig::default())?;
    println!(
        "feedforward network, {} inputs -> {} output:",
        net.input_count(),
        net.output_count()
    );
    for inputs in [[0.0, 0.0], [1.0, 0.0], [0.5, -0.5], [1.0, 1.0]] {
        println!("  {:?} -> {:?}", inputs, net.activate(&inputs));
    }

    // Recurrent: a leaky accumulator. The self-loop keeps a fraction of the
    // previous output, so repeated identical inputs drift toward a steady
    // state instead of repeating one value.
    let mut recurrent = NetworkGenome::new(NetworkKind::Cyclic, 1, 1, Activation::Identity);
    recurrent.connect(0, 1, 0.5);
    recurrent.connect(1, 1, 0.5);

    let config = DecodeConfig {
        cyclic_passes: 1,
        ..DecodeConfig::default()
    };
    let mut memory = decode(&recurrent, &config)?;
    println!("recurrent accumulator, constant input 1.0:");
    for step in 0..6 {
        println!("  step {}: {:?}", step, memory.activate(&[1.0]));
    }

    memory.reset();
    println!("after reset: {:?}", memory.activate(&[1.0]));

    Ok(())
}
