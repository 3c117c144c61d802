use approx::assert_abs_diff_eq;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use rust_linmodels::{Batch, Dataset, Error, Model, Sample, TrainConfig, Verbosity};

/// Two well separated classes spread over several batches.
fn two_class_dataset(seed: u64) -> Dataset {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut batch = |n: usize| {
        let samples = (0..n)
            .map(|i| {
                let label = i % 2;
                let hi = rng.gen_range(0.7..1.0);
                let lo = rng.gen_range(0.0..0.3);
                let features = if label == 0 { vec![hi, lo] } else { vec![lo, hi] };
                Sample::new(label, features)
            })
            .collect();
        Batch::new(samples).unwrap()
    };
    let train = vec![batch(20), batch(20)];
    let test = vec![batch(10)];
    Dataset::new(train, test, 2, vec!["a".to_owned(), "b".to_owned()]).unwrap()
}

fn quiet(epochs: usize) -> TrainConfig {
    TrainConfig::new(epochs).with_verbosity(Verbosity::Quiet)
}

#[test]
fn separable_data_reaches_full_accuracy() {
    let data = two_class_dataset(11);
    let mut model = Model::new_with_seed(2, 2, 0.1, 5).unwrap();

    let report = model.train(&data, &quiet(40)).unwrap();
    assert_eq!(report.epochs.len(), 40);
    assert!(report.epochs.iter().all(|e| e.samples == 40));

    let mut increases = 0;
    for pair in report.epochs.windows(2) {
        if pair[1].avg_loss > pair[0].avg_loss * (1.0 + 1e-6) + 1e-9 {
            increases += 1;
        }
    }
    assert_eq!(increases, 0, "epoch losses: {:?}", report.epochs);

    let first = report.epochs[0].avg_loss;
    let last = report.final_loss().unwrap();
    assert!(last < first);

    let eval = model.test(&data).unwrap();
    assert_eq!(eval.samples, 10);
    assert_eq!(eval.accuracy, 100.0);
    assert_eq!(eval.confusion.get(0, 1), Some(0));
    assert_eq!(eval.confusion.get(1, 0), Some(0));
    assert_eq!(eval.confusion.total(), 10);
}

#[test]
fn training_is_deterministic() {
    let data = two_class_dataset(3);
    let mut a = Model::new_with_seed(2, 2, 0.1, 9).unwrap();
    let mut b = a.clone();
    let ra = a.train(&data, &quiet(5)).unwrap();
    let rb = b.train(&data, &quiet(5)).unwrap();
    assert_eq!(a, b);
    assert_eq!(ra, rb);
}

#[test]
fn predictions_are_probability_distributions() {
    let data = two_class_dataset(4);
    let mut model = Model::new_with_seed(2, 2, 0.1, 1).unwrap();
    model.train(&data, &quiet(3)).unwrap();

    for sample in data.test_batches().iter().flat_map(Batch::iter) {
        let pred = model.predict(sample.features()).unwrap();
        let sum: f64 = pred.probabilities().iter().sum();
        assert_abs_diff_eq!(sum, 1.0, epsilon = 1e-6);
        assert!(pred.probabilities().iter().all(|&p| p > 0.0 && p < 1.0));
    }
}

#[test]
fn trained_model_survives_save_and_load() {
    let data = two_class_dataset(8);
    let mut model = Model::new_with_seed(2, 2, 0.1, 2).unwrap();
    model.train(&data, &quiet(10)).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("classifier.bin");
    model.save(&path).unwrap();
    let loaded = Model::load(&path).unwrap();

    assert_eq!(loaded.feature_size(), model.feature_size());
    assert_eq!(loaded.num_classes(), model.num_classes());
    assert_eq!(
        loaded.learning_rate().to_bits(),
        model.learning_rate().to_bits()
    );
    let bits = |xs: &[f64]| xs.iter().map(|v| v.to_bits()).collect::<Vec<_>>();
    assert_eq!(bits(loaded.weights()), bits(model.weights()));
    assert_eq!(bits(loaded.biases()), bits(model.biases()));

    assert_eq!(model.test(&data).unwrap(), loaded.test(&data).unwrap());
}

#[test]
fn wrong_feature_length_is_rejected_and_model_unchanged() {
    let model = Model::new_with_seed(2, 2, 0.1, 2).unwrap();
    let before = model.clone();
    assert!(matches!(
        model.predict(&[0.1, 0.2, 0.3]),
        Err(Error::ShapeMismatch(_))
    ));
    assert_eq!(model, before);
}

#[test]
fn cifar_style_records_feed_training() {
    // Two 4-pixel records per class; class 1 is bright, class 0 is dark.
    let mut bytes = Vec::new();
    for i in 0..8_u8 {
        let label = i % 2;
        bytes.push(label);
        let px = if label == 1 { 230 } else { 20 };
        bytes.extend_from_slice(&[px, px, px, px]);
    }
    let train = Batch::from_records(&bytes, 4, 8).unwrap();
    let test = Batch::from_records(&bytes, 4, 2).unwrap();
    assert!(Batch::from_records(&bytes, 4, 9).is_err());

    let data = Dataset::new(
        vec![train],
        vec![test],
        2,
        vec!["dark".to_owned(), "bright".to_owned()],
    )
    .unwrap();

    let mut model = Model::new_with_seed(4, 2, 0.5, 0).unwrap();
    model.train(&data, &quiet(60)).unwrap();
    let eval = model.test(&data).unwrap();
    assert_eq!(eval.accuracy, 100.0);

    let pred = model.predict(&[0.9; 4]).unwrap();
    assert_eq!(pred.class_name(&data), Some("bright"));
}
