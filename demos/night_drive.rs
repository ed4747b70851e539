//! Learns a tiny lyric in memory and prints a few generated verses.
//!
//! Run with: cargo run --example night_drive

use lyric_markov::core::generator::Generator;
use lyric_markov::core::learner::Learner;
use lyric_markov::tokenizer::WhitespaceTokenizer;
use rand::rngs::StdRng;
use rand::SeedableRng;

const LYRIC: &str = "
the city lights are fading out
we drive into the night
the radio is playing low
and you are holding tight
the night is young and so are we
we drive until the light
";

fn main() {
    let mut learner = Learner::new(1, WhitespaceTokenizer);
    let stats = learner.learn(LYRIC).unwrap_or_else(|e| {
        eprintln!("Error learning lyric: {}", e);
        std::process::exit(1);
    });
    let model = learner.into_model();
    println!(
        "Learned {} lines ({} distinct grams)\n",
        stats.lines,
        model.len()
    );

    let generator = Generator::new(&model);
    for verse in 0..3 {
        let mut rng = StdRng::seed_from_u64(verse);
        match generator.generate(4, &mut rng) {
            Ok(text) => println!("--- verse {} ---\n{}\n", verse + 1, text),
            Err(e) => eprintln!("verse {} failed: {}", verse + 1, e),
        }
    }
}
