/// End-to-end learning and generation through the public API.

use lyric_markov::core::generator::{Generator, GeneratorConfig};
use lyric_markov::core::learner::{LearnError, Learner};
use lyric_markov::core::markov::MarkovModel;
use lyric_markov::schema::token::{BEGIN, END};
use lyric_markov::tokenizer::{TokenizeError, Tokenizer, WhitespaceTokenizer};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn fixture_model(order: usize) -> MarkovModel {
    let corpus = std::fs::read_to_string("tests/fixtures/lyrics.txt").unwrap();
    let mut learner = Learner::new(order, WhitespaceTokenizer);
    learner.learn(&corpus).unwrap();
    learner.into_model()
}

#[test]
fn learns_example_line() {
    let mut learner = Learner::new(2, WhitespaceTokenizer);
    learner.learn("犬 が 吠える").unwrap();
    let model = learner.model();

    assert_eq!(model.get(&[BEGIN, "犬", "が"]).unwrap(), 1);
    assert_eq!(model.get(&["犬", "が", "吠える"]).unwrap(), 1);
    assert_eq!(model.get(&["が", "吠える", END]).unwrap(), 1);
}

#[test]
fn single_line_corpus_is_reproduced() {
    let mut learner = Learner::new(2, WhitespaceTokenizer);
    learner.learn("犬 が 吠える").unwrap();
    let model = learner.into_model();

    let generator = Generator::new(&model);
    for seed in 0..20 {
        let mut rng = StdRng::seed_from_u64(seed);
        assert_eq!(generator.generate(1, &mut rng).unwrap(), "犬 が 吠える");
    }
}

#[test]
fn long_single_line_is_reproduced() {
    let line: Vec<String> = (0..300).map(|i| format!("w{}", i)).collect();
    let line = line.join(" ");
    let mut learner = Learner::new(2, WhitespaceTokenizer);
    learner.learn(&line).unwrap();
    let model = learner.into_model();

    let mut rng = StdRng::seed_from_u64(6);
    assert_eq!(Generator::new(&model).generate(1, &mut rng).unwrap(), line);
}

#[test]
fn hash_words_survive_untagged_learning() {
    let mut learner = Learner::new(2, WhitespaceTokenizer);
    learner.learn("dance all night #i in F#c").unwrap();
    let model = learner.into_model();

    let mut rng = StdRng::seed_from_u64(1);
    assert_eq!(
        Generator::new(&model).generate(1, &mut rng).unwrap(),
        "dance all night #i in F#c"
    );
}

#[test]
fn repeated_lines_of_single_line_corpus() {
    // The second line starts from a dead end ("吠える END" has no
    // continuation) and must recover from BEGIN.
    let mut learner = Learner::new(2, WhitespaceTokenizer);
    learner.learn("犬 が 吠える").unwrap();
    let model = learner.into_model();

    let mut rng = StdRng::seed_from_u64(3);
    let text = Generator::new(&model).generate(3, &mut rng).unwrap();
    assert_eq!(text, "犬 が 吠える\n犬 が 吠える\n犬 が 吠える");
}

#[test]
fn generated_output_never_contains_sentinels() {
    let model = fixture_model(2);
    let generator = Generator::new(&model);

    for seed in 0..50 {
        let mut rng = StdRng::seed_from_u64(seed);
        let text = generator.generate(6, &mut rng).unwrap();
        assert_eq!(text.lines().count(), 6);
        assert!(!text.contains(BEGIN), "seed {}: {}", seed, text);
        assert!(!text.contains(END), "seed {}: {}", seed, text);
    }
}

#[test]
fn generated_words_come_from_the_corpus() {
    let corpus = std::fs::read_to_string("tests/fixtures/lyrics.txt").unwrap();
    let vocabulary: Vec<&str> = corpus.split_whitespace().collect();
    let model = fixture_model(1);
    let generator = Generator::new(&model);

    let mut rng = StdRng::seed_from_u64(99);
    let text = generator.generate(10, &mut rng).unwrap();
    for word in text.split_whitespace() {
        assert!(vocabulary.contains(&word), "unexpected word {:?}", word);
    }
}

#[test]
fn generation_is_reproducible_with_a_seed() {
    let model = fixture_model(2);
    let generator = Generator::new(&model);

    let mut rng1 = StdRng::seed_from_u64(2024);
    let mut rng2 = StdRng::seed_from_u64(2024);
    assert_eq!(
        generator.generate(8, &mut rng1).unwrap(),
        generator.generate(8, &mut rng2).unwrap()
    );
}

#[test]
fn higher_orders_still_terminate() {
    for order in 1..=4 {
        let model = fixture_model(order);
        let generator = Generator::with_config(
            &model,
            GeneratorConfig {
                separator: String::new(),
                ..GeneratorConfig::default()
            },
        );
        let mut rng = StdRng::seed_from_u64(order as u64);
        let text = generator.generate(4, &mut rng).unwrap();
        assert_eq!(text.lines().count(), 4, "order {}", order);
    }
}

#[test]
fn structural_characters_survive_learning() {
    let mut learner = Learner::new(1, WhitespaceTokenizer);
    learner.learn("a:b c*d e\\f END").unwrap();
    let model = learner.into_model();

    let mut rng = StdRng::seed_from_u64(0);
    let text = Generator::new(&model).generate(1, &mut rng).unwrap();
    assert_eq!(text, "a:b c*d e\\f END");
}

struct Broken;

impl Tokenizer for Broken {
    fn tokenize(&self, _line: &str) -> Result<Vec<String>, TokenizeError> {
        Err(TokenizeError::Analyzer("dictionary missing".to_string()))
    }
}

#[test]
fn tokenizer_failure_surfaces() {
    let mut learner = Learner::new(2, Broken);
    let err = learner.learn("犬 が 吠える").unwrap_err();
    assert!(matches!(err, LearnError::Tokenization { .. }));
    assert!(err.to_string().contains("犬 が 吠える"));
    assert!(learner.model().is_empty());
}
